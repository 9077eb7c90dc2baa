// Copyright 2025 Muvon Un Limited
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Compression level search
//!
//! A [`CompressResult`] walks a codec's quality knob down from the policy's
//! maximum, one step per compressed chunk, while the compressed size stays
//! within `allowed_ratio` of the size reached at full quality. The first
//! step that costs more than that freezes the search one step back.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// How hard a compressor should try
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompressionPolicy {
    BestSpeed,
    Speed,
    #[default]
    Default,
    BestCompression,
}

impl std::str::FromStr for CompressionPolicy {
    type Err = crate::error::CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "BEST_SPEED" => Ok(CompressionPolicy::BestSpeed),
            "SPEED" => Ok(CompressionPolicy::Speed),
            "DEFAULT" => Ok(CompressionPolicy::Default),
            "BEST_COMPRESSION" => Ok(CompressionPolicy::BestCompression),
            _ => Err(crate::error::CodecError::Config(format!(
                "Unknown compression policy '{}'",
                s
            ))),
        }
    }
}

/// Level search state for one logical stream
#[derive(Debug, Clone, PartialEq)]
pub struct CompressResult {
    policy: CompressionPolicy,
    allowed_ratio: f64,
    current_level: i32,
    start_level_data_ratio: Option<f64>,
    is_end: bool,
}

impl CompressResult {
    pub fn new(policy: CompressionPolicy, allowed_ratio: f64) -> Self {
        Self {
            policy,
            allowed_ratio,
            current_level: 0,
            start_level_data_ratio: None,
            is_end: false,
        }
    }

    pub fn policy(&self) -> CompressionPolicy {
        self.policy
    }

    pub fn allowed_ratio(&self) -> f64 {
        self.allowed_ratio
    }

    /// Steps below the policy's maximum quality.
    pub fn current_level(&self) -> i32 {
        self.current_level
    }

    pub fn start_level_data_ratio(&self) -> Option<f64> {
        self.start_level_data_ratio
    }

    pub fn is_end(&self) -> bool {
        self.is_end
    }

    /// Freeze the search on the last level that paid for itself.
    pub fn set_end(&mut self) {
        if self.is_end {
            return;
        }
        self.current_level = (self.current_level - 1).max(0);
        self.is_end = true;
        debug!(
            "Compression level search ended at level {} ({:?})",
            self.current_level, self.policy
        );
    }

    /// Report the sizes of one compression done at [`Self::current_level`].
    pub fn feed_back(&mut self, original_size: usize, compressed_size: usize) {
        if self.is_end || original_size == 0 || compressed_size == 0 {
            return;
        }

        let ratio = compressed_size as f64 / original_size as f64;
        match self.start_level_data_ratio {
            None => {
                self.start_level_data_ratio = Some(ratio);
                self.current_level += 1;
            }
            Some(start) => {
                if ratio / start >= self.allowed_ratio {
                    self.set_end();
                } else {
                    self.current_level += 1;
                }
            }
        }
    }

    /// Quality to use for the next attempt on a codec whose knob spans
    /// `[min_quality, max_quality]`. Running past `min_quality` ends the
    /// search.
    pub fn quality(&mut self, max_quality: i32, min_quality: i32) -> i32 {
        if max_quality - self.current_level < min_quality {
            debug!(
                "Compression quality {} is below minimum {}",
                max_quality - self.current_level,
                min_quality
            );
            self.set_end();
        }
        (max_quality - self.current_level).clamp(min_quality, max_quality)
    }
}

/// Per write session tree of [`CompressResult`]s mirroring column paths
#[derive(Debug, Default)]
pub struct CompressResultNode {
    results: HashMap<(String, String), CompressResult>,
    children: HashMap<String, CompressResultNode>,
}

impl CompressResultNode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Child node for a column name, created on first use.
    pub fn child(&mut self, column_name: &str) -> &mut CompressResultNode {
        self.children.entry(column_name.to_string()).or_default()
    }

    pub fn get_child(&self, column_name: &str) -> Option<&CompressResultNode> {
        self.children.get(column_name)
    }

    /// Search state for `(encoder_id, stream_name)`, created on first use.
    pub fn compress_result(
        &mut self,
        encoder_id: &str,
        stream_name: &str,
        policy: CompressionPolicy,
        allowed_ratio: f64,
    ) -> &mut CompressResult {
        self.results
            .entry((encoder_id.to_string(), stream_name.to_string()))
            .or_insert_with(|| CompressResult::new(policy, allowed_ratio))
    }

    pub fn get_result(&self, encoder_id: &str, stream_name: &str) -> Option<&CompressResult> {
        self.results
            .get(&(encoder_id.to_string(), stream_name.to_string()))
    }
}

#[cfg(test)]
#[path = "compress_test.rs"]
mod compress_test;
