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

//! Nested column makers plus the all-null maker
//!
//! Composite payloads only carry the row structure (null presence, array
//! lengths); the values live in child binaries written with the makers
//! configured for the child paths.

use super::{
    decompress, pack, read_column, unexpected_type, unpack, ColumnBinaryMaker,
    ColumnBinaryMakerContext, ARRAY_MAKER, NULL_MAKER, SPREAD_MAKER, UNION_MAKER, VALUES_STREAM,
};
use crate::binary::bit_width::IntWidth;
use crate::binary::column::{Column, ColumnType, ColumnValues};
use crate::binary::column_binary::ColumnBinary;
use crate::binary::compressor::{FindCompressor, IDENTITY_COMPRESSOR};
use crate::binary::null_presence;
use crate::error::{CodecError, Result};

/// Apply a binary's load index to a fully decoded column.
fn project_loaded(binary: &ColumnBinary, column: Column) -> Column {
    match binary.load_index() {
        Some(index) => {
            let rows: Vec<usize> = index.iter().map(|row| *row as usize).collect();
            column.project(&rows)
        }
        None => column,
    }
}

fn write_children(
    context: &mut ColumnBinaryMakerContext<'_>,
    children: &[Column],
) -> Result<Vec<ColumnBinary>> {
    children
        .iter()
        .map(|child| context.child(&child.name).write(child))
        .collect()
}

fn read_children(binary: &ColumnBinary) -> Result<Vec<Column>> {
    binary.children().iter().map(read_column).collect()
}

/// Decode the null presence section of a structural payload.
fn read_mask(binary: &ColumnBinary) -> Result<(Vec<bool>, Vec<u8>)> {
    let payload = decompress(binary)?;
    let (nulls, section) = unpack(&payload)?;
    Ok((null_presence::decode(nulls)?, section.to_vec()))
}

/// Columns in which every row is null; stores the row count only
#[derive(Debug, Default)]
pub struct NullColumnBinaryMaker;

impl ColumnBinaryMaker for NullColumnBinaryMaker {
    fn name(&self) -> &'static str {
        NULL_MAKER
    }

    fn supports(&self, column_type: ColumnType) -> bool {
        column_type == ColumnType::Null
    }

    fn to_binary(
        &self,
        context: &mut ColumnBinaryMakerContext<'_>,
        column: &Column,
    ) -> Result<ColumnBinary> {
        let ColumnValues::Null(rows) = column.values else {
            return Err(unexpected_type(NULL_MAKER, column.column_type()));
        };
        let rows = i32::try_from(rows)
            .map_err(|_| CodecError::Range(format!("{} rows do not fit a column", rows)))?;
        let identity = FindCompressor::get(IDENTITY_COMPRESSOR)?;
        let binary = identity.compress(
            &rows.to_be_bytes(),
            context.config().compression_policy(),
            None,
        )?;

        ColumnBinary::builder(NULL_MAKER, column.name.as_str(), ColumnType::Null)
            .compressor(identity.name())
            .raw_data_size(4)
            .cardinality(0)
            .binary(binary)
            .build()
    }

    fn to_column(&self, binary: &ColumnBinary) -> Result<Column> {
        let payload = decompress(binary)?;
        let bytes: [u8; 4] = payload
            .as_slice()
            .try_into()
            .map_err(|_| CodecError::Format("Null column payload is not a row count".to_string()))?;
        let rows = usize::try_from(i32::from_be_bytes(bytes))
            .map_err(|_| CodecError::Format("Negative null column row count".to_string()))?;
        let column = Column::new(binary.column_name(), ColumnValues::Null(rows));
        Ok(project_loaded(binary, column))
    }
}

/// Per row element counts; the single child holds every element
#[derive(Debug, Default)]
pub struct ArrayColumnBinaryMaker;

impl ColumnBinaryMaker for ArrayColumnBinaryMaker {
    fn name(&self) -> &'static str {
        ARRAY_MAKER
    }

    fn supports(&self, column_type: ColumnType) -> bool {
        matches!(column_type, ColumnType::Array | ColumnType::EmptyArray)
    }

    fn to_binary(
        &self,
        context: &mut ColumnBinaryMakerContext<'_>,
        column: &Column,
    ) -> Result<ColumnBinary> {
        let ColumnValues::Array { lengths, element } = &column.values else {
            return Err(unexpected_type(ARRAY_MAKER, column.column_type()));
        };
        column.validate()?;

        let mask: Vec<bool> = lengths.iter().map(Option::is_none).collect();
        let counts = lengths
            .iter()
            .flatten()
            .map(|len| {
                i32::try_from(*len).map_err(|_| {
                    CodecError::Range(format!("Array of {} elements is too long", len))
                })
            })
            .collect::<Result<Vec<i32>>>()?;
        let width = IntWidth::select(
            counts.iter().copied().min().unwrap_or(0),
            counts.iter().copied().max().unwrap_or(0),
        );
        let payload = pack(&null_presence::encode(&mask)?, &width.encode(&counts))?;
        let compressed = context.compress(ARRAY_MAKER, VALUES_STREAM, &payload)?;
        let child = context.child(&element.name).write(element)?;

        ColumnBinary::builder(ARRAY_MAKER, column.name.as_str(), column.column_type())
            .compressor(compressed.compressor)
            .row_count(counts.len())
            .raw_data_size(payload.len())
            .logical_data_size(counts.len() * 4)
            .binary(compressed.binary)
            .children(vec![child])
            .build()
    }

    fn to_column(&self, binary: &ColumnBinary) -> Result<Column> {
        let (mask, section) = read_mask(binary)?;
        let [element] = binary.children() else {
            return Err(CodecError::Format(format!(
                "Array column '{}' has {} children, expected 1",
                binary.column_name(),
                binary.children().len()
            )));
        };
        let element = read_column(element)?;

        let non_null = mask.iter().filter(|is_null| !**is_null).count();
        let width = IntWidth::from_header(&section)?;
        let mut counts = width.reader(&section, non_null)?;
        let mut lengths = Vec::with_capacity(mask.len());
        for is_null in mask {
            if is_null {
                lengths.push(None);
                continue;
            }
            let count = counts
                .next()
                .ok_or_else(|| CodecError::Format("Array length stream ended early".to_string()))?;
            let count = u32::try_from(count)
                .map_err(|_| CodecError::InvalidData(format!("Negative array length {}", count)))?;
            lengths.push(Some(count));
        }

        let column = Column::new(
            binary.column_name(),
            ColumnValues::Array {
                lengths,
                element: Box::new(element),
            },
        );
        column.validate()?;
        Ok(project_loaded(binary, column))
    }
}

/// Struct rows; one child per field
#[derive(Debug, Default)]
pub struct SpreadColumnBinaryMaker;

impl ColumnBinaryMaker for SpreadColumnBinaryMaker {
    fn name(&self) -> &'static str {
        SPREAD_MAKER
    }

    fn supports(&self, column_type: ColumnType) -> bool {
        matches!(column_type, ColumnType::Spread | ColumnType::EmptySpread)
    }

    fn to_binary(
        &self,
        context: &mut ColumnBinaryMakerContext<'_>,
        column: &Column,
    ) -> Result<ColumnBinary> {
        let ColumnValues::Spread { present, fields } = &column.values else {
            return Err(unexpected_type(SPREAD_MAKER, column.column_type()));
        };
        column.validate()?;

        let mask: Vec<bool> = present.iter().map(|p| !p).collect();
        let payload = pack(&null_presence::encode(&mask)?, &[])?;
        let compressed = context.compress(SPREAD_MAKER, VALUES_STREAM, &payload)?;
        let children = write_children(context, fields)?;

        ColumnBinary::builder(SPREAD_MAKER, column.name.as_str(), column.column_type())
            .compressor(compressed.compressor)
            .row_count(present.iter().filter(|p| **p).count())
            .raw_data_size(payload.len())
            .binary(compressed.binary)
            .children(children)
            .build()
    }

    fn to_column(&self, binary: &ColumnBinary) -> Result<Column> {
        let (mask, _) = read_mask(binary)?;
        let column = Column::new(
            binary.column_name(),
            ColumnValues::Spread {
                present: mask.iter().map(|is_null| !is_null).collect(),
                fields: read_children(binary)?,
            },
        );
        column.validate()?;
        Ok(project_loaded(binary, column))
    }
}

/// Alternatives of different types; one child per alternative
#[derive(Debug, Default)]
pub struct UnionColumnBinaryMaker;

impl ColumnBinaryMaker for UnionColumnBinaryMaker {
    fn name(&self) -> &'static str {
        UNION_MAKER
    }

    fn supports(&self, column_type: ColumnType) -> bool {
        column_type == ColumnType::Union
    }

    fn to_binary(
        &self,
        context: &mut ColumnBinaryMakerContext<'_>,
        column: &Column,
    ) -> Result<ColumnBinary> {
        let ColumnValues::Union { children, .. } = &column.values else {
            return Err(unexpected_type(UNION_MAKER, column.column_type()));
        };
        column.validate()?;

        let mask = column.null_mask();
        let payload = pack(&null_presence::encode(&mask)?, &[])?;
        let compressed = context.compress(UNION_MAKER, VALUES_STREAM, &payload)?;
        let child_binaries = write_children(context, children)?;

        ColumnBinary::builder(UNION_MAKER, column.name.as_str(), ColumnType::Union)
            .compressor(compressed.compressor)
            .row_count(mask.iter().filter(|is_null| !**is_null).count())
            .raw_data_size(payload.len())
            .binary(compressed.binary)
            .children(child_binaries)
            .build()
    }

    fn to_column(&self, binary: &ColumnBinary) -> Result<Column> {
        let (mask, _) = read_mask(binary)?;
        let column = Column::new(
            binary.column_name(),
            ColumnValues::Union {
                rows: mask.len(),
                children: read_children(binary)?,
            },
        );
        column.validate()?;
        Ok(project_loaded(binary, column))
    }
}
