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

//! General purpose compressors wrapped around column payloads
//!
//! Every compressed frame starts with the big endian `i32` length of the
//! uncompressed payload so decompression can size its output up front.

use crate::binary::compress::{CompressResult, CompressionPolicy};
use crate::binary::registry::{Registry, RegistryEntry};
use crate::error::{CodecError, Result};
use std::sync::Arc;

pub const IDENTITY_COMPRESSOR: &str = "colbin::compressor::IdentityCompressor";
pub const ZSTD_COMPRESSOR: &str = "colbin::compressor::ZstdCompressor";
pub const LZ4_COMPRESSOR: &str = "colbin::compressor::Lz4Compressor";
pub const SNAPPY_COMPRESSOR: &str = "colbin::compressor::SnappyCompressor";

const FRAME_HEADER_SIZE: usize = 4;

pub trait Compressor: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &'static str;

    /// Compress `data`. When a search state is given, its level picks the
    /// quality and the achieved sizes are fed back into it.
    fn compress(
        &self,
        data: &[u8],
        policy: CompressionPolicy,
        result: Option<&mut CompressResult>,
    ) -> Result<Vec<u8>>;

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>>;
}

fn frame(original_len: usize, payload: &[u8]) -> Result<Vec<u8>> {
    let len = i32::try_from(original_len).map_err(|_| {
        CodecError::Compression(format!("Payload of {} bytes is too large", original_len))
    })?;
    let mut output = Vec::with_capacity(FRAME_HEADER_SIZE + payload.len());
    output.extend_from_slice(&len.to_be_bytes());
    output.extend_from_slice(payload);
    Ok(output)
}

fn unframe(data: &[u8]) -> Result<(usize, &[u8])> {
    let bytes: [u8; 4] = data
        .get(..FRAME_HEADER_SIZE)
        .and_then(|slice| slice.try_into().ok())
        .ok_or_else(|| CodecError::Compression("Truncated compressed frame".to_string()))?;
    let len = usize::try_from(i32::from_be_bytes(bytes))
        .map_err(|_| CodecError::Compression("Negative compressed frame length".to_string()))?;
    Ok((len, &data[FRAME_HEADER_SIZE..]))
}

fn check_len(decompressed: Vec<u8>, expected: usize, name: &str) -> Result<Vec<u8>> {
    if decompressed.len() != expected {
        return Err(CodecError::Compression(format!(
            "{} produced {} bytes, frame announced {}",
            name,
            decompressed.len(),
            expected
        )));
    }
    Ok(decompressed)
}

/// Stores the payload as is
#[derive(Debug, Default)]
pub struct IdentityCompressor;

impl Compressor for IdentityCompressor {
    fn name(&self) -> &'static str {
        IDENTITY_COMPRESSOR
    }

    fn compress(
        &self,
        data: &[u8],
        _policy: CompressionPolicy,
        result: Option<&mut CompressResult>,
    ) -> Result<Vec<u8>> {
        if let Some(result) = result {
            result.set_end();
        }
        frame(data.len(), data)
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        let (len, payload) = unframe(data)?;
        check_len(payload.to_vec(), len, "identity")
    }
}

/// Zstandard with a searchable compression level
#[derive(Debug, Default)]
pub struct ZstdCompressor;

impl ZstdCompressor {
    const MIN_LEVEL: i32 = 1;

    fn max_level(policy: CompressionPolicy) -> i32 {
        match policy {
            CompressionPolicy::BestSpeed => 1,
            CompressionPolicy::Speed => 3,
            CompressionPolicy::Default => 9,
            CompressionPolicy::BestCompression => 19,
        }
    }
}

impl Compressor for ZstdCompressor {
    fn name(&self) -> &'static str {
        ZSTD_COMPRESSOR
    }

    fn compress(
        &self,
        data: &[u8],
        policy: CompressionPolicy,
        result: Option<&mut CompressResult>,
    ) -> Result<Vec<u8>> {
        let max_level = Self::max_level(policy);
        match result {
            Some(result) => {
                let level = result.quality(max_level, Self::MIN_LEVEL);
                let compressed = zstd::bulk::compress(data, level)?;
                result.feed_back(data.len(), compressed.len());
                frame(data.len(), &compressed)
            }
            None => frame(data.len(), &zstd::bulk::compress(data, max_level)?),
        }
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        let (len, payload) = unframe(data)?;
        if len == 0 {
            return Ok(Vec::new());
        }
        let decompressed = zstd::bulk::decompress(payload, len)?;
        check_len(decompressed, len, "zstd")
    }
}

/// LZ4 block compression; the format has no level to search
#[derive(Debug, Default)]
pub struct Lz4Compressor;

impl Compressor for Lz4Compressor {
    fn name(&self) -> &'static str {
        LZ4_COMPRESSOR
    }

    fn compress(
        &self,
        data: &[u8],
        _policy: CompressionPolicy,
        result: Option<&mut CompressResult>,
    ) -> Result<Vec<u8>> {
        let compressed = lz4_flex::block::compress(data);
        if let Some(result) = result {
            result.set_end();
        }
        frame(data.len(), &compressed)
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        let (len, payload) = unframe(data)?;
        if len == 0 {
            return Ok(Vec::new());
        }
        let decompressed = lz4_flex::block::decompress(payload, len)
            .map_err(|e| CodecError::Compression(format!("LZ4 decompress failed: {}", e)))?;
        check_len(decompressed, len, "lz4")
    }
}

/// Snappy raw format; the format has no level to search
#[derive(Debug, Default)]
pub struct SnappyCompressor;

impl Compressor for SnappyCompressor {
    fn name(&self) -> &'static str {
        SNAPPY_COMPRESSOR
    }

    fn compress(
        &self,
        data: &[u8],
        _policy: CompressionPolicy,
        result: Option<&mut CompressResult>,
    ) -> Result<Vec<u8>> {
        let compressed = snap::raw::Encoder::new()
            .compress_vec(data)
            .map_err(|e| CodecError::Compression(format!("Snappy compress failed: {}", e)))?;
        if let Some(result) = result {
            result.set_end();
        }
        frame(data.len(), &compressed)
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        let (len, payload) = unframe(data)?;
        if len == 0 {
            return Ok(Vec::new());
        }
        let decompressed = snap::raw::Decoder::new()
            .decompress_vec(payload)
            .map_err(|e| CodecError::Compression(format!("Snappy decompress failed: {}", e)))?;
        check_len(decompressed, len, "snappy")
    }
}

fn build_identity() -> Arc<dyn Compressor> {
    Arc::new(IdentityCompressor)
}

fn build_zstd() -> Arc<dyn Compressor> {
    Arc::new(ZstdCompressor)
}

fn build_lz4() -> Arc<dyn Compressor> {
    Arc::new(Lz4Compressor)
}

fn build_snappy() -> Arc<dyn Compressor> {
    Arc::new(SnappyCompressor)
}

static COMPRESSORS: Registry<dyn Compressor> = Registry::new(
    "compressor",
    &[
        RegistryEntry {
            name: IDENTITY_COMPRESSOR,
            shortcut: "c0",
            build: build_identity,
        },
        RegistryEntry {
            name: ZSTD_COMPRESSOR,
            shortcut: "c1",
            build: build_zstd,
        },
        RegistryEntry {
            name: LZ4_COMPRESSOR,
            shortcut: "c2",
            build: build_lz4,
        },
        RegistryEntry {
            name: SNAPPY_COMPRESSOR,
            shortcut: "c3",
            build: build_snappy,
        },
    ],
);

/// Resolves compressor names (full or shortcut) to shared instances
pub struct FindCompressor;

impl FindCompressor {
    pub fn get(name: &str) -> Result<Arc<dyn Compressor>> {
        COMPRESSORS.get(name)
    }

    pub fn shortcut(name: &str) -> &str {
        COMPRESSORS.shortcut(name)
    }

    pub fn from_shortcut(shortcut: &str) -> &str {
        COMPRESSORS.from_shortcut(shortcut)
    }

    pub fn names() -> impl Iterator<Item = &'static str> {
        COMPRESSORS.names()
    }
}

#[cfg(test)]
#[path = "compressor_test.rs"]
mod compressor_test;
