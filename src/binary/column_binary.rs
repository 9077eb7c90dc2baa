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

//! Serialized column value
//!
//! A [`ColumnBinary`] pairs a fixed metadata record with a range of a shared
//! [`Bytes`] buffer and, for nested types, its child binaries. The meta
//! layout (all ints big endian):
//!
//! ```text
//! [i32 len][maker shortcut][i32 len][compressor shortcut][i32 len][column name]
//! [u8 column type][i32 row count][i32 raw size][i32 logical size]
//! [i32 cardinality][i32 binary start][i32 binary length]
//! ```

use crate::binary::column::ColumnType;
use crate::binary::compressor::FindCompressor;
use crate::binary::maker::FindColumnBinaryMaker;
use crate::binary::selective::validate_load_index;
use crate::error::{CodecError, Result};
use bytes::Bytes;
use std::sync::Arc;

/// Fixed part of the meta: nine ints and the column type byte.
pub const META_FIXED_SIZE: usize = 9 * 4 + 1;

/// Size figures rolled up over a column binary tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SummaryStats {
    pub row_count: u64,
    /// Encoded size before compression
    pub raw_data_size: u64,
    /// Bytes actually stored
    pub real_data_size: u64,
    /// Size of the values as the application sees them
    pub logical_data_size: u64,
    /// Distinct values, `None` when any side did not count them
    pub cardinality: Option<u64>,
}

impl SummaryStats {
    pub fn merge(&mut self, other: &SummaryStats) {
        self.row_count += other.row_count;
        self.raw_data_size += other.raw_data_size;
        self.real_data_size += other.real_data_size;
        self.logical_data_size += other.logical_data_size;
        self.cardinality = match (self.cardinality, other.cardinality) {
            (Some(a), Some(b)) => Some(a + b),
            _ => None,
        };
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnBinary {
    maker_name: String,
    compressor_name: String,
    column_name: String,
    column_type: ColumnType,
    row_count: usize,
    raw_data_size: usize,
    logical_data_size: usize,
    cardinality: Option<usize>,
    buffer: Bytes,
    binary_start: usize,
    binary_length: usize,
    children: Arc<[ColumnBinary]>,
    load_index: Option<Arc<[i32]>>,
}

impl ColumnBinary {
    pub fn builder(
        maker_name: impl Into<String>,
        column_name: impl Into<String>,
        column_type: ColumnType,
    ) -> ColumnBinaryBuilder {
        ColumnBinaryBuilder::new(maker_name.into(), column_name.into(), column_type)
    }

    pub fn maker_name(&self) -> &str {
        &self.maker_name
    }

    pub fn compressor_name(&self) -> &str {
        &self.compressor_name
    }

    pub fn column_name(&self) -> &str {
        &self.column_name
    }

    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }

    /// Non-null rows.
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn raw_data_size(&self) -> usize {
        self.raw_data_size
    }

    pub fn logical_data_size(&self) -> usize {
        self.logical_data_size
    }

    pub fn cardinality(&self) -> Option<usize> {
        self.cardinality
    }

    pub fn binary_start(&self) -> usize {
        self.binary_start
    }

    pub fn binary_length(&self) -> usize {
        self.binary_length
    }

    /// The referenced range of the shared buffer.
    pub fn binary(&self) -> &[u8] {
        &self.buffer[self.binary_start..self.binary_start + self.binary_length]
    }

    /// The whole shared buffer the range points into.
    pub fn buffer(&self) -> &Bytes {
        &self.buffer
    }

    pub fn children(&self) -> &[ColumnBinary] {
        &self.children
    }

    pub fn load_index(&self) -> Option<&[i32]> {
        self.load_index.as_deref()
    }

    /// Sibling view that reads only the given rows.
    pub fn with_load_index(&self, load_index: Vec<i32>) -> Result<ColumnBinary> {
        validate_load_index(&load_index)?;
        Ok(ColumnBinary {
            load_index: Some(load_index.into()),
            ..self.clone()
        })
    }

    /// Sibling view under another column name.
    pub fn renamed(&self, column_name: impl Into<String>) -> ColumnBinary {
        ColumnBinary {
            column_name: column_name.into(),
            ..self.clone()
        }
    }

    /// Own range plus every descendant's.
    pub fn binary_size(&self) -> usize {
        self.binary_length + self.children.iter().map(ColumnBinary::binary_size).sum::<usize>()
    }

    pub fn meta_size(&self) -> usize {
        META_FIXED_SIZE
            + FindColumnBinaryMaker::shortcut(&self.maker_name).len()
            + FindCompressor::shortcut(&self.compressor_name).len()
            + self.column_name.len()
    }

    pub fn statistics(&self) -> SummaryStats {
        let mut stats = SummaryStats {
            row_count: self.row_count as u64,
            raw_data_size: self.raw_data_size as u64,
            real_data_size: self.binary_length as u64,
            logical_data_size: self.logical_data_size as u64,
            cardinality: self.cardinality.map(|c| c as u64),
        };
        for child in self.children.iter() {
            stats.merge(&child.statistics());
        }
        stats
    }

    pub fn to_meta_binary(&self) -> Result<Vec<u8>> {
        let mut output = Vec::with_capacity(self.meta_size());
        put_str(&mut output, FindColumnBinaryMaker::shortcut(&self.maker_name))?;
        put_str(&mut output, FindCompressor::shortcut(&self.compressor_name))?;
        put_str(&mut output, &self.column_name)?;
        output.push(self.column_type.to_byte());
        put_i32(&mut output, self.row_count, "row count")?;
        put_i32(&mut output, self.raw_data_size, "raw data size")?;
        put_i32(&mut output, self.logical_data_size, "logical data size")?;
        match self.cardinality {
            Some(cardinality) => put_i32(&mut output, cardinality, "cardinality")?,
            None => output.extend_from_slice(&(-1i32).to_be_bytes()),
        }
        put_i32(&mut output, self.binary_start, "binary start")?;
        put_i32(&mut output, self.binary_length, "binary length")?;
        Ok(output)
    }

    /// Rebuild from a meta record, the buffer its range points into and its
    /// already decoded children.
    pub fn from_meta_binary(
        meta: &[u8],
        data: Bytes,
        children: Vec<ColumnBinary>,
    ) -> Result<ColumnBinary> {
        let mut cursor = MetaCursor { meta, pos: 0 };
        let maker = cursor.string()?;
        let compressor = cursor.string()?;
        let column_name = cursor.string()?;
        let column_type = ColumnType::from_byte(cursor.byte()?)?;
        let row_count = cursor.count("row count")?;
        let raw_data_size = cursor.count("raw data size")?;
        let logical_data_size = cursor.count("logical data size")?;
        let cardinality = cursor.int()?;
        let binary_start = cursor.count("binary start")?;
        let binary_length = cursor.count("binary length")?;

        let mut builder = ColumnBinary::builder(
            FindColumnBinaryMaker::from_shortcut(&maker),
            column_name,
            column_type,
        )
        .compressor(FindCompressor::from_shortcut(&compressor))
        .row_count(row_count)
        .raw_data_size(raw_data_size)
        .logical_data_size(logical_data_size)
        .range(data, binary_start, binary_length)
        .children(children);
        if cardinality >= 0 {
            builder = builder.cardinality(cardinality as usize);
        }
        builder.build()
    }
}

fn put_i32(output: &mut Vec<u8>, value: usize, field: &str) -> Result<()> {
    let value = i32::try_from(value)
        .map_err(|_| CodecError::Range(format!("{} {} does not fit the meta", field, value)))?;
    output.extend_from_slice(&value.to_be_bytes());
    Ok(())
}

fn put_str(output: &mut Vec<u8>, value: &str) -> Result<()> {
    put_i32(output, value.len(), "string length")?;
    output.extend_from_slice(value.as_bytes());
    Ok(())
}

struct MetaCursor<'a> {
    meta: &'a [u8],
    pos: usize,
}

impl MetaCursor<'_> {
    fn take(&mut self, len: usize) -> Result<&[u8]> {
        let slice = self
            .pos
            .checked_add(len)
            .and_then(|end| self.meta.get(self.pos..end))
            .ok_or_else(|| {
                CodecError::Format(format!(
                    "Column meta truncated at {} (needed {} more bytes)",
                    self.pos, len
                ))
            })?;
        self.pos += len;
        Ok(slice)
    }

    fn byte(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn int(&mut self) -> Result<i32> {
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(self.take(4)?);
        Ok(i32::from_be_bytes(bytes))
    }

    fn count(&mut self, field: &str) -> Result<usize> {
        let value = self.int()?;
        usize::try_from(value).map_err(|_| {
            CodecError::Format(format!("Negative {} in column meta: {}", field, value))
        })
    }

    fn string(&mut self) -> Result<String> {
        let len = self.count("string length")?;
        Ok(String::from_utf8(self.take(len)?.to_vec())?)
    }
}

/// Builds a [`ColumnBinary`]; every field but the children is set once.
#[derive(Debug)]
pub struct ColumnBinaryBuilder {
    maker_name: String,
    compressor_name: String,
    column_name: String,
    column_type: ColumnType,
    row_count: usize,
    raw_data_size: usize,
    logical_data_size: usize,
    cardinality: Option<usize>,
    buffer: Bytes,
    binary_start: usize,
    binary_length: usize,
    children: Vec<ColumnBinary>,
}

impl ColumnBinaryBuilder {
    fn new(maker_name: String, column_name: String, column_type: ColumnType) -> Self {
        Self {
            maker_name,
            compressor_name: crate::binary::compressor::IDENTITY_COMPRESSOR.to_string(),
            column_name,
            column_type,
            row_count: 0,
            raw_data_size: 0,
            logical_data_size: 0,
            cardinality: None,
            buffer: Bytes::new(),
            binary_start: 0,
            binary_length: 0,
            children: Vec::new(),
        }
    }

    pub fn compressor(mut self, name: impl Into<String>) -> Self {
        self.compressor_name = name.into();
        self
    }

    pub fn row_count(mut self, rows: usize) -> Self {
        self.row_count = rows;
        self
    }

    pub fn raw_data_size(mut self, size: usize) -> Self {
        self.raw_data_size = size;
        self
    }

    pub fn logical_data_size(mut self, size: usize) -> Self {
        self.logical_data_size = size;
        self
    }

    pub fn cardinality(mut self, cardinality: usize) -> Self {
        self.cardinality = Some(cardinality);
        self
    }

    /// Own the whole of `binary`.
    pub fn binary(self, binary: impl Into<Bytes>) -> Self {
        let binary = binary.into();
        let len = binary.len();
        self.range(binary, 0, len)
    }

    /// Point at `buffer[start..start + length]` without copying.
    pub fn range(mut self, buffer: Bytes, start: usize, length: usize) -> Self {
        self.buffer = buffer;
        self.binary_start = start;
        self.binary_length = length;
        self
    }

    pub fn children(mut self, children: Vec<ColumnBinary>) -> Self {
        self.children = children;
        self
    }

    pub fn build(self) -> Result<ColumnBinary> {
        let in_bounds = self
            .binary_start
            .checked_add(self.binary_length)
            .is_some_and(|end| end <= self.buffer.len());
        if !in_bounds {
            return Err(CodecError::Format(format!(
                "Range {}+{} is outside a buffer of {} bytes",
                self.binary_start,
                self.binary_length,
                self.buffer.len()
            )));
        }

        Ok(ColumnBinary {
            maker_name: self.maker_name,
            compressor_name: self.compressor_name,
            column_name: self.column_name,
            column_type: self.column_type,
            row_count: self.row_count,
            raw_data_size: self.raw_data_size,
            logical_data_size: self.logical_data_size,
            cardinality: self.cardinality,
            buffer: self.buffer,
            binary_start: self.binary_start,
            binary_length: self.binary_length,
            children: self.children.into(),
            load_index: None,
        })
    }
}

#[cfg(test)]
#[path = "column_binary_test.rs"]
mod column_binary_test;
