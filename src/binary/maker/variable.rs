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

//! Variable length values: strings and byte arrays
//!
//! Value section: an `IntWidth` stream with the length of every non-null
//! value, followed by all value bytes back to back.

use super::{
    decompress, load_request, pack, unexpected_type, unpack, ColumnBinaryMaker,
    ColumnBinaryMakerContext, BYTES_MAKER, STRING_MAKER, VALUES_STREAM,
};
use crate::binary::bit_width::IntWidth;
use crate::binary::column::{Column, ColumnType, ColumnValues};
use crate::binary::column_binary::ColumnBinary;
use crate::binary::null_presence;
use crate::binary::selective::{load_dictionary, DictionaryColumn, LoadRequest};
use crate::error::{CodecError, Result};
use std::collections::HashSet;

fn encode_section<'v>(values: impl Iterator<Item = &'v [u8]> + Clone) -> Result<Vec<u8>> {
    let mut lengths = Vec::new();
    let mut total = 0usize;
    for value in values.clone() {
        let len = i32::try_from(value.len()).map_err(|_| {
            CodecError::Range(format!("Value of {} bytes is too long", value.len()))
        })?;
        lengths.push(len);
        total += value.len();
    }

    let min = lengths.iter().copied().min().unwrap_or(0);
    let max = lengths.iter().copied().max().unwrap_or(0);
    let width = IntWidth::select(min, max);
    let mut section = Vec::with_capacity(width.calc_binary_size(lengths.len()) + total);
    section.extend_from_slice(&width.encode(&lengths));
    for value in values {
        section.extend_from_slice(value);
    }
    Ok(section)
}

/// Parsed value section with offsets into the shared value bytes
struct VariableSection<'a> {
    offsets: Vec<usize>,
    data: &'a [u8],
}

impl<'a> VariableSection<'a> {
    fn parse(section: &'a [u8], count: usize) -> Result<Self> {
        let width = IntWidth::from_header(section)?;
        let lengths_size = width.calc_binary_size(count);
        let lengths = section.get(..lengths_size).ok_or_else(|| {
            CodecError::Format("Length stream is truncated".to_string())
        })?;

        let mut offsets = Vec::with_capacity(count + 1);
        offsets.push(0usize);
        for len in width.reader(lengths, count)? {
            let len = usize::try_from(len)
                .map_err(|_| CodecError::InvalidData(format!("Negative value length {}", len)))?;
            offsets.push(offsets[offsets.len() - 1] + len);
        }

        let data = &section[lengths_size..];
        let total = offsets[offsets.len() - 1];
        if total > data.len() {
            return Err(CodecError::Format(format!(
                "Lengths add up to {} bytes, section holds {}",
                total,
                data.len()
            )));
        }
        Ok(Self { offsets, data })
    }

    fn get(&self, k: usize) -> Result<&'a [u8]> {
        match (self.offsets.get(k), self.offsets.get(k + 1)) {
            (Some(&start), Some(&end)) => Ok(&self.data[start..end]),
            _ => Err(CodecError::InvalidData(format!(
                "Value {} is outside of the section",
                k
            ))),
        }
    }
}

fn write_variable<V: AsRef<[u8]>>(
    context: &mut ColumnBinaryMakerContext<'_>,
    maker: &'static str,
    column: &Column,
    values: &[Option<V>],
    logical_size: usize,
) -> Result<ColumnBinary> {
    let mask: Vec<bool> = values.iter().map(Option::is_none).collect();
    let non_null = values.iter().flatten().map(<V as AsRef<[u8]>>::as_ref);
    let row_count = non_null.clone().count();
    let cardinality = non_null.clone().collect::<HashSet<_>>().len();
    let payload = pack(&null_presence::encode(&mask)?, &encode_section(non_null)?)?;
    let compressed = context.compress(maker, VALUES_STREAM, &payload)?;

    ColumnBinary::builder(maker, column.name.as_str(), column.column_type())
        .compressor(compressed.compressor)
        .row_count(row_count)
        .raw_data_size(payload.len())
        .logical_data_size(logical_size)
        .cardinality(cardinality)
        .binary(compressed.binary)
        .build()
}

/// Decode all rows, or the load index rows when the binary carries one.
fn read_variable<T: Clone>(
    binary: &ColumnBinary,
    convert: impl Fn(&[u8]) -> Result<T>,
) -> Result<Vec<Option<T>>> {
    if let Some((request, load_size)) = load_request(binary) {
        return Ok(dictionary_variable(binary, &request, load_size, convert)?.materialize());
    }

    let payload = decompress(binary)?;
    let (nulls, section) = unpack(&payload)?;
    let mask = null_presence::decode(nulls)?;
    let count = mask.iter().filter(|is_null| !**is_null).count();
    let section = VariableSection::parse(section, count)?;

    let mut ordinal = 0usize;
    let mut rows = Vec::with_capacity(mask.len());
    for is_null in mask {
        if is_null {
            rows.push(None);
        } else {
            rows.push(Some(convert(section.get(ordinal)?)?));
            ordinal += 1;
        }
    }
    Ok(rows)
}

fn dictionary_variable<T>(
    binary: &ColumnBinary,
    request: &LoadRequest,
    load_size: usize,
    convert: impl Fn(&[u8]) -> Result<T>,
) -> Result<DictionaryColumn<T>> {
    request.validate()?;
    let payload = decompress(binary)?;
    let (nulls, section) = unpack(&payload)?;
    let mask = null_presence::decode(nulls)?;
    let count = mask.iter().filter(|is_null| !**is_null).count();
    let section = VariableSection::parse(section, count)?;
    load_dictionary(&mask, |k| convert(section.get(k)?), request, load_size)
}

/// UTF-8 strings; logical size counts UTF-16 code units times two
#[derive(Debug, Default)]
pub struct StringColumnBinaryMaker;

fn utf8(bytes: &[u8]) -> Result<String> {
    Ok(String::from_utf8(bytes.to_vec())?)
}

impl StringColumnBinaryMaker {
    pub fn load_dictionary(
        &self,
        binary: &ColumnBinary,
        request: &LoadRequest,
        load_size: usize,
    ) -> Result<DictionaryColumn<String>> {
        dictionary_variable(binary, request, load_size, utf8)
    }
}

impl ColumnBinaryMaker for StringColumnBinaryMaker {
    fn name(&self) -> &'static str {
        STRING_MAKER
    }

    fn supports(&self, column_type: ColumnType) -> bool {
        column_type == ColumnType::String
    }

    fn to_binary(
        &self,
        context: &mut ColumnBinaryMakerContext<'_>,
        column: &Column,
    ) -> Result<ColumnBinary> {
        let ColumnValues::String(values) = &column.values else {
            return Err(unexpected_type(STRING_MAKER, column.column_type()));
        };
        let logical_size = values
            .iter()
            .flatten()
            .map(|v| v.encode_utf16().count() * 2)
            .sum();
        write_variable(context, STRING_MAKER, column, values, logical_size)
    }

    fn to_column(&self, binary: &ColumnBinary) -> Result<Column> {
        if !self.supports(binary.column_type()) {
            return Err(unexpected_type(STRING_MAKER, binary.column_type()));
        }
        Ok(Column::new(
            binary.column_name(),
            ColumnValues::String(read_variable(binary, utf8)?),
        ))
    }
}

/// Opaque byte arrays
#[derive(Debug, Default)]
pub struct BytesColumnBinaryMaker;

fn owned(bytes: &[u8]) -> Result<Vec<u8>> {
    Ok(bytes.to_vec())
}

impl BytesColumnBinaryMaker {
    pub fn load_dictionary(
        &self,
        binary: &ColumnBinary,
        request: &LoadRequest,
        load_size: usize,
    ) -> Result<DictionaryColumn<Vec<u8>>> {
        dictionary_variable(binary, request, load_size, owned)
    }
}

impl ColumnBinaryMaker for BytesColumnBinaryMaker {
    fn name(&self) -> &'static str {
        BYTES_MAKER
    }

    fn supports(&self, column_type: ColumnType) -> bool {
        column_type == ColumnType::Bytes
    }

    fn to_binary(
        &self,
        context: &mut ColumnBinaryMakerContext<'_>,
        column: &Column,
    ) -> Result<ColumnBinary> {
        let ColumnValues::Bytes(values) = &column.values else {
            return Err(unexpected_type(BYTES_MAKER, column.column_type()));
        };
        let logical_size = values.iter().flatten().map(Vec::len).sum();
        write_variable(context, BYTES_MAKER, column, values, logical_size)
    }

    fn to_column(&self, binary: &ColumnBinary) -> Result<Column> {
        if !self.supports(binary.column_type()) {
            return Err(unexpected_type(BYTES_MAKER, binary.column_type()));
        }
        Ok(Column::new(
            binary.column_name(),
            ColumnValues::Bytes(read_variable(binary, owned)?),
        ))
    }
}
