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

//! Column binary makers
//!
//! A maker turns one [`Column`] of the types it supports into a
//! [`ColumnBinary`] and back. Leaf payloads are laid out as
//!
//! ```text
//! [i32 null presence length][null presence][value section]
//! ```
//!
//! and then run through the compressor configured for the column path.

mod boolean;
mod composite;
mod double;
mod numeric;
mod variable;

pub use boolean::BooleanColumnBinaryMaker;
pub use composite::{
    ArrayColumnBinaryMaker, NullColumnBinaryMaker, SpreadColumnBinaryMaker,
    UnionColumnBinaryMaker,
};
pub use double::XorDoubleColumnBinaryMaker;
pub use numeric::OptimizeLongColumnBinaryMaker;
pub use variable::{BytesColumnBinaryMaker, StringColumnBinaryMaker};

use crate::binary::column::{Column, ColumnType};
use crate::binary::column_binary::ColumnBinary;
use crate::binary::compress::CompressResultNode;
use crate::binary::compressor::FindCompressor;
use crate::binary::registry::{Registry, RegistryEntry};
use crate::binary::selective::LoadRequest;
use crate::config::{MakerConfigTree, ResolvedMakerConfig};
use crate::error::{CodecError, Result};
use bytes::Bytes;
use std::sync::Arc;

pub const NUMERIC_MAKER: &str = "colbin::maker::OptimizeLongColumnBinaryMaker";
pub const DOUBLE_MAKER: &str = "colbin::maker::XorDoubleColumnBinaryMaker";
pub const BOOLEAN_MAKER: &str = "colbin::maker::BooleanColumnBinaryMaker";
pub const STRING_MAKER: &str = "colbin::maker::StringColumnBinaryMaker";
pub const BYTES_MAKER: &str = "colbin::maker::BytesColumnBinaryMaker";
pub const NULL_MAKER: &str = "colbin::maker::NullColumnBinaryMaker";
pub const ARRAY_MAKER: &str = "colbin::maker::ArrayColumnBinaryMaker";
pub const SPREAD_MAKER: &str = "colbin::maker::SpreadColumnBinaryMaker";
pub const UNION_MAKER: &str = "colbin::maker::UnionColumnBinaryMaker";

/// Logical stream name every leaf payload is compressed under.
pub const VALUES_STREAM: &str = "values";

pub trait ColumnBinaryMaker: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &'static str;

    /// Column types this maker can encode.
    fn supports(&self, column_type: ColumnType) -> bool;

    fn to_binary(
        &self,
        context: &mut ColumnBinaryMakerContext<'_>,
        column: &Column,
    ) -> Result<ColumnBinary>;

    fn to_column(&self, binary: &ColumnBinary) -> Result<Column>;
}

/// Per column path state handed to makers while writing
pub struct ColumnBinaryMakerContext<'a> {
    config: Arc<MakerConfigTree>,
    results: &'a mut CompressResultNode,
}

impl<'a> ColumnBinaryMakerContext<'a> {
    pub fn new(config: Arc<MakerConfigTree>, results: &'a mut CompressResultNode) -> Self {
        Self { config, results }
    }

    pub fn config(&self) -> &ResolvedMakerConfig {
        self.config.config()
    }

    /// Context for a nested column.
    pub fn child(&mut self, column_name: &str) -> ColumnBinaryMakerContext<'_> {
        ColumnBinaryMakerContext {
            config: self.config.child(column_name),
            results: self.results.child(column_name),
        }
    }

    /// Compress a payload with the configured compressor, feeding the level
    /// search kept for `(maker, stream)` on this path.
    pub fn compress(
        &mut self,
        maker: &str,
        stream: &str,
        data: &[u8],
    ) -> Result<CompressedPayload> {
        let config = self.config.config();
        let result = self.results.compress_result(
            maker,
            stream,
            config.compression_policy(),
            config.allowed_ratio(),
        );
        let compressor = config.compressor();
        let binary = compressor.compress(data, config.compression_policy(), Some(result))?;
        Ok(CompressedPayload {
            compressor: compressor.name(),
            binary: Bytes::from(binary),
        })
    }

    /// Encode a column with the maker configured for its type.
    pub fn write(&mut self, column: &Column) -> Result<ColumnBinary> {
        let maker = self.config().maker(column.column_type())?;
        maker.to_binary(self, column)
    }
}

#[derive(Debug)]
pub struct CompressedPayload {
    pub compressor: &'static str,
    pub binary: Bytes,
}

/// Decode a binary with the maker named in its meta.
pub fn read_column(binary: &ColumnBinary) -> Result<Column> {
    FindColumnBinaryMaker::get(binary.maker_name())?.to_column(binary)
}

pub(crate) fn decompress(binary: &ColumnBinary) -> Result<Vec<u8>> {
    FindCompressor::get(binary.compressor_name())?.decompress(binary.binary())
}

pub(crate) fn pack(null_presence: &[u8], values: &[u8]) -> Result<Vec<u8>> {
    let len = i32::try_from(null_presence.len())
        .map_err(|_| CodecError::Range("Null presence section too large".to_string()))?;
    let mut output = Vec::with_capacity(4 + null_presence.len() + values.len());
    output.extend_from_slice(&len.to_be_bytes());
    output.extend_from_slice(null_presence);
    output.extend_from_slice(values);
    Ok(output)
}

/// Split a leaf payload into its null presence and value sections.
pub(crate) fn unpack(payload: &[u8]) -> Result<(&[u8], &[u8])> {
    let header: [u8; 4] = payload
        .get(..4)
        .and_then(|slice| slice.try_into().ok())
        .ok_or_else(|| CodecError::Format("Leaf payload is missing its header".to_string()))?;
    let len = i32::from_be_bytes(header);
    let end = usize::try_from(len)
        .ok()
        .and_then(|len| len.checked_add(4))
        .filter(|end| *end <= payload.len())
        .ok_or_else(|| {
            CodecError::Format(format!("Null presence length {} out of range", len))
        })?;
    Ok((&payload[4..end], &payload[end..]))
}

/// Rows a read should produce for a binary's load index, if it has one.
pub(crate) fn load_request(binary: &ColumnBinary) -> Option<(LoadRequest, usize)> {
    binary.load_index().map(|index| {
        let request = LoadRequest::Index(index.to_vec());
        (request, index.len())
    })
}

pub(crate) fn unexpected_type(maker: &str, column_type: ColumnType) -> CodecError {
    CodecError::Resolution(format!("{} cannot handle {} columns", maker, column_type))
}

fn build_numeric() -> Arc<dyn ColumnBinaryMaker> {
    Arc::new(OptimizeLongColumnBinaryMaker)
}

fn build_double() -> Arc<dyn ColumnBinaryMaker> {
    Arc::new(XorDoubleColumnBinaryMaker)
}

fn build_boolean() -> Arc<dyn ColumnBinaryMaker> {
    Arc::new(BooleanColumnBinaryMaker)
}

fn build_string() -> Arc<dyn ColumnBinaryMaker> {
    Arc::new(StringColumnBinaryMaker)
}

fn build_bytes() -> Arc<dyn ColumnBinaryMaker> {
    Arc::new(BytesColumnBinaryMaker)
}

fn build_null() -> Arc<dyn ColumnBinaryMaker> {
    Arc::new(NullColumnBinaryMaker)
}

fn build_array() -> Arc<dyn ColumnBinaryMaker> {
    Arc::new(ArrayColumnBinaryMaker)
}

fn build_spread() -> Arc<dyn ColumnBinaryMaker> {
    Arc::new(SpreadColumnBinaryMaker)
}

fn build_union() -> Arc<dyn ColumnBinaryMaker> {
    Arc::new(UnionColumnBinaryMaker)
}

static MAKERS: Registry<dyn ColumnBinaryMaker> = Registry::new(
    "column binary maker",
    &[
        RegistryEntry {
            name: NUMERIC_MAKER,
            shortcut: "n0",
            build: build_numeric,
        },
        RegistryEntry {
            name: DOUBLE_MAKER,
            shortcut: "d0",
            build: build_double,
        },
        RegistryEntry {
            name: BOOLEAN_MAKER,
            shortcut: "b0",
            build: build_boolean,
        },
        RegistryEntry {
            name: STRING_MAKER,
            shortcut: "s0",
            build: build_string,
        },
        RegistryEntry {
            name: BYTES_MAKER,
            shortcut: "y0",
            build: build_bytes,
        },
        RegistryEntry {
            name: NULL_MAKER,
            shortcut: "e0",
            build: build_null,
        },
        RegistryEntry {
            name: ARRAY_MAKER,
            shortcut: "a0",
            build: build_array,
        },
        RegistryEntry {
            name: SPREAD_MAKER,
            shortcut: "p0",
            build: build_spread,
        },
        RegistryEntry {
            name: UNION_MAKER,
            shortcut: "u0",
            build: build_union,
        },
    ],
);

/// Resolves maker names (full or shortcut) to shared instances
pub struct FindColumnBinaryMaker;

impl FindColumnBinaryMaker {
    pub fn get(name: &str) -> Result<Arc<dyn ColumnBinaryMaker>> {
        MAKERS.get(name)
    }

    pub fn shortcut(name: &str) -> &str {
        MAKERS.shortcut(name)
    }

    pub fn from_shortcut(shortcut: &str) -> &str {
        MAKERS.from_shortcut(shortcut)
    }

    pub fn names() -> impl Iterator<Item = &'static str> {
        MAKERS.names()
    }
}

#[cfg(test)]
#[path = "maker_test.rs"]
mod maker_test;
