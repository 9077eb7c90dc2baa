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

use crate::binary::column::ColumnType;
use crate::binary::compress::CompressionPolicy;
use crate::binary::compressor::{Compressor, FindCompressor, ZSTD_COMPRESSOR};
use crate::binary::maker::{
    ColumnBinaryMaker, FindColumnBinaryMaker, ARRAY_MAKER, BOOLEAN_MAKER, BYTES_MAKER,
    DOUBLE_MAKER, NULL_MAKER, NUMERIC_MAKER, SPREAD_MAKER, STRING_MAKER, UNION_MAKER,
};
use crate::error::{CodecError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

pub const DEFAULT_ALLOWED_RATIO: f64 = 1.15;

/// Maker per column type slot plus compression settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MakerConfig {
    pub union_maker: String,
    pub array_maker: String,
    pub spread_maker: String,
    pub boolean_maker: String,
    pub byte_maker: String,
    pub bytes_maker: String,
    pub double_maker: String,
    pub float_maker: String,
    pub integer_maker: String,
    pub long_maker: String,
    pub short_maker: String,
    pub string_maker: String,
    pub compressor: String,
    pub compression_policy: CompressionPolicy,
    pub allowed_ratio: f64,
}

impl Default for MakerConfig {
    fn default() -> Self {
        Self {
            union_maker: UNION_MAKER.to_string(),
            array_maker: ARRAY_MAKER.to_string(),
            spread_maker: SPREAD_MAKER.to_string(),
            boolean_maker: BOOLEAN_MAKER.to_string(),
            byte_maker: NUMERIC_MAKER.to_string(),
            bytes_maker: BYTES_MAKER.to_string(),
            double_maker: DOUBLE_MAKER.to_string(),
            float_maker: DOUBLE_MAKER.to_string(),
            integer_maker: NUMERIC_MAKER.to_string(),
            long_maker: NUMERIC_MAKER.to_string(),
            short_maker: NUMERIC_MAKER.to_string(),
            string_maker: STRING_MAKER.to_string(),
            compressor: ZSTD_COMPRESSOR.to_string(),
            compression_policy: CompressionPolicy::Default,
            allowed_ratio: DEFAULT_ALLOWED_RATIO,
        }
    }
}

impl MakerConfig {
    /// Configured maker for a column type. Null columns always use the
    /// null maker; empty nested types share the slot of their full type.
    pub fn maker_name(&self, column_type: ColumnType) -> Option<&str> {
        let name = match column_type {
            ColumnType::Union => &self.union_maker,
            ColumnType::Array | ColumnType::EmptyArray => &self.array_maker,
            ColumnType::Spread | ColumnType::EmptySpread => &self.spread_maker,
            ColumnType::Boolean => &self.boolean_maker,
            ColumnType::Byte => &self.byte_maker,
            ColumnType::Bytes => &self.bytes_maker,
            ColumnType::Double => &self.double_maker,
            ColumnType::Float => &self.float_maker,
            ColumnType::Integer => &self.integer_maker,
            ColumnType::Long => &self.long_maker,
            ColumnType::Short => &self.short_maker,
            ColumnType::String => &self.string_maker,
            ColumnType::Null => return Some(NULL_MAKER),
            ColumnType::Unknown => return None,
        };
        Some(name.as_str())
    }

    pub fn validate(&self) -> Result<()> {
        if !self.allowed_ratio.is_finite() || self.allowed_ratio <= 1.0 {
            return Err(CodecError::Config(format!(
                "allowed_ratio must be a finite number above 1.0, got {}",
                self.allowed_ratio
            )));
        }
        ResolvedMakerConfig::resolve(self).map(|_| ())
    }
}

/// Partial [`MakerConfig`] for one column path; unset fields inherit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigOverride {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub union_maker: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub array_maker: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spread_maker: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boolean_maker: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub byte_maker: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes_maker: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub double_maker: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub float_maker: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub integer_maker: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long_maker: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_maker: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub string_maker: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compressor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compression_policy: Option<CompressionPolicy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_ratio: Option<f64>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub child_column: BTreeMap<String, ConfigOverride>,
}

impl ConfigOverride {
    /// Parse a JSON override tree keyed by top level column name.
    pub fn tree_from_json(text: &str) -> Result<BTreeMap<String, ConfigOverride>> {
        Ok(serde_json::from_str(text)?)
    }

    /// Copy `base` and replace the fields this override sets.
    pub fn apply(&self, base: &MakerConfig) -> MakerConfig {
        fn pick<T: Clone>(value: &Option<T>, fallback: &T) -> T {
            value.clone().unwrap_or_else(|| fallback.clone())
        }

        MakerConfig {
            union_maker: pick(&self.union_maker, &base.union_maker),
            array_maker: pick(&self.array_maker, &base.array_maker),
            spread_maker: pick(&self.spread_maker, &base.spread_maker),
            boolean_maker: pick(&self.boolean_maker, &base.boolean_maker),
            byte_maker: pick(&self.byte_maker, &base.byte_maker),
            bytes_maker: pick(&self.bytes_maker, &base.bytes_maker),
            double_maker: pick(&self.double_maker, &base.double_maker),
            float_maker: pick(&self.float_maker, &base.float_maker),
            integer_maker: pick(&self.integer_maker, &base.integer_maker),
            long_maker: pick(&self.long_maker, &base.long_maker),
            short_maker: pick(&self.short_maker, &base.short_maker),
            string_maker: pick(&self.string_maker, &base.string_maker),
            compressor: pick(&self.compressor, &base.compressor),
            compression_policy: pick(&self.compression_policy, &base.compression_policy),
            allowed_ratio: pick(&self.allowed_ratio, &base.allowed_ratio),
        }
    }
}

/// File level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    #[serde(flatten)]
    pub makers: MakerConfig,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub columns: BTreeMap<String, ConfigOverride>,
}

impl CodecConfig {
    pub fn from_file(path: PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| {
            CodecError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let config: CodecConfig = toml::from_str(&content)
            .map_err(|e| CodecError::Config(format!("Failed to parse config file: {}", e)))?;

        config.validate()?;
        info!(
            "Loaded codec config from {} ({} column overrides)",
            path.display(),
            config.columns.len()
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.makers.validate()?;
        validate_overrides(&self.makers, &self.columns)
    }

    pub fn build_tree(&self) -> Result<MakerConfigTree> {
        MakerConfigTree::build(&self.makers, &self.columns)
    }
}

fn validate_overrides(
    base: &MakerConfig,
    overrides: &BTreeMap<String, ConfigOverride>,
) -> Result<()> {
    for node in overrides.values() {
        let config = node.apply(base);
        config.validate()?;
        validate_overrides(&config, &node.child_column)?;
    }
    Ok(())
}

/// A [`MakerConfig`] with every identifier resolved to an instance
#[derive(Debug)]
pub struct ResolvedMakerConfig {
    config: MakerConfig,
    makers: BTreeMap<ColumnType, Arc<dyn ColumnBinaryMaker>>,
    compressor: Arc<dyn Compressor>,
}

impl ResolvedMakerConfig {
    /// Resolve every slot, failing before any encoding starts when a name
    /// is unknown or a maker cannot encode the slot's type.
    pub fn resolve(config: &MakerConfig) -> Result<Self> {
        let mut makers = BTreeMap::new();
        for column_type in [
            ColumnType::Union,
            ColumnType::Array,
            ColumnType::EmptyArray,
            ColumnType::Spread,
            ColumnType::EmptySpread,
            ColumnType::Boolean,
            ColumnType::Byte,
            ColumnType::Bytes,
            ColumnType::Double,
            ColumnType::Float,
            ColumnType::Integer,
            ColumnType::Long,
            ColumnType::Short,
            ColumnType::String,
            ColumnType::Null,
        ] {
            let Some(name) = config.maker_name(column_type) else {
                continue;
            };
            let maker = FindColumnBinaryMaker::get(name)?;
            if !maker.supports(column_type) {
                return Err(CodecError::Resolution(format!(
                    "Maker '{}' cannot encode {} columns",
                    name, column_type
                )));
            }
            makers.insert(column_type, maker);
        }

        Ok(Self {
            config: config.clone(),
            makers,
            compressor: FindCompressor::get(&config.compressor)?,
        })
    }

    pub fn maker_config(&self) -> &MakerConfig {
        &self.config
    }

    pub fn maker(&self, column_type: ColumnType) -> Result<Arc<dyn ColumnBinaryMaker>> {
        self.makers.get(&column_type).cloned().ok_or_else(|| {
            CodecError::Resolution(format!("No maker configured for {} columns", column_type))
        })
    }

    pub fn compressor(&self) -> &Arc<dyn Compressor> {
        &self.compressor
    }

    pub fn compression_policy(&self) -> CompressionPolicy {
        self.config.compression_policy
    }

    pub fn allowed_ratio(&self) -> f64 {
        self.config.allowed_ratio
    }
}

/// Resolved configuration per column path
///
/// Each node owns the fully resolved config for its path; children only
/// exist where an override names them. Paths without a node inherit the
/// nearest ancestor's config.
#[derive(Debug)]
pub struct MakerConfigTree {
    config: Arc<ResolvedMakerConfig>,
    children: BTreeMap<String, Arc<MakerConfigTree>>,
}

impl MakerConfigTree {
    /// Tree without per column overrides.
    pub fn new(root: &MakerConfig) -> Result<Self> {
        Self::build(root, &BTreeMap::new())
    }

    pub fn build(root: &MakerConfig, overrides: &BTreeMap<String, ConfigOverride>) -> Result<Self> {
        root.validate()?;
        let config = Arc::new(ResolvedMakerConfig::resolve(root)?);
        Self::build_node(config, root, overrides, "")
    }

    fn build_node(
        config: Arc<ResolvedMakerConfig>,
        base: &MakerConfig,
        overrides: &BTreeMap<String, ConfigOverride>,
        path: &str,
    ) -> Result<Self> {
        let mut children = BTreeMap::new();
        for (name, node) in overrides {
            let child_path = if path.is_empty() {
                name.clone()
            } else {
                format!("{}.{}", path, name)
            };
            let merged = node.apply(base);
            merged.validate()?;
            debug!("Column path '{}' overrides maker config", child_path);
            let resolved = Arc::new(ResolvedMakerConfig::resolve(&merged)?);
            let child = Self::build_node(resolved, &merged, &node.child_column, &child_path)?;
            children.insert(name.clone(), Arc::new(child));
        }
        Ok(Self { config, children })
    }

    pub fn config(&self) -> &ResolvedMakerConfig {
        &self.config
    }

    /// Node for a child column; a path without overrides inherits this one.
    pub fn child(&self, column_name: &str) -> Arc<MakerConfigTree> {
        match self.children.get(column_name) {
            Some(child) => Arc::clone(child),
            None => Arc::new(MakerConfigTree {
                config: Arc::clone(&self.config),
                children: BTreeMap::new(),
            }),
        }
    }

    /// Resolved config for a column path.
    pub fn get(&self, path: &[&str]) -> Arc<ResolvedMakerConfig> {
        let mut node = self;
        for segment in path {
            match node.children.get(*segment) {
                Some(child) => node = &**child,
                None => break,
            }
        }
        Arc::clone(&node.config)
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
