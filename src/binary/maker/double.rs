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

//! Float and double columns as XOR compressed bit patterns

use super::{
    decompress, load_request, pack, unexpected_type, unpack, ColumnBinaryMaker,
    ColumnBinaryMakerContext, DOUBLE_MAKER, VALUES_STREAM,
};
use crate::binary::column::{Column, ColumnType, ColumnValues};
use crate::binary::column_binary::ColumnBinary;
use crate::binary::null_presence;
use crate::binary::selective::{load_dictionary, DictionaryColumn, LoadRequest};
use crate::binary::xor;
use crate::error::{CodecError, Result};

#[derive(Debug, Default)]
pub struct XorDoubleColumnBinaryMaker;

impl XorDoubleColumnBinaryMaker {
    /// Null mask and raw bit patterns of the non-null values.
    fn bits(column: &Column) -> Result<(Vec<bool>, Vec<u64>)> {
        match &column.values {
            ColumnValues::Double(values) => Ok((
                values.iter().map(Option::is_none).collect(),
                values.iter().flatten().map(|v| v.to_bits()).collect(),
            )),
            ColumnValues::Float(values) => Ok((
                values.iter().map(Option::is_none).collect(),
                values.iter().flatten().map(|v| v.to_bits() as u64).collect(),
            )),
            _ => Err(unexpected_type(DOUBLE_MAKER, column.column_type())),
        }
    }

    fn decode(binary: &ColumnBinary) -> Result<(Vec<bool>, Vec<u64>)> {
        let payload = decompress(binary)?;
        let (nulls, section) = unpack(&payload)?;
        let mask = null_presence::decode(nulls)?;
        let non_null = mask.iter().filter(|is_null| !**is_null).count();
        let bits = xor::decode(section, non_null)?;
        Ok((mask, bits))
    }

    /// Bit patterns of the requested rows; XOR streams are sequential, so
    /// the stream is decoded once and only the needed values are kept.
    pub fn load_dictionary(
        &self,
        binary: &ColumnBinary,
        request: &LoadRequest,
        load_size: usize,
    ) -> Result<DictionaryColumn<f64>> {
        request.validate()?;
        let is_float = binary.column_type() == ColumnType::Float;
        let (mask, bits) = Self::decode(binary)?;
        load_dictionary(
            &mask,
            |k| {
                let raw = bits.get(k).copied().ok_or_else(|| {
                    CodecError::InvalidData(format!("Value {} missing from XOR stream", k))
                })?;
                Ok(if is_float {
                    f32::from_bits(raw as u32) as f64
                } else {
                    f64::from_bits(raw)
                })
            },
            request,
            load_size,
        )
    }
}

impl ColumnBinaryMaker for XorDoubleColumnBinaryMaker {
    fn name(&self) -> &'static str {
        DOUBLE_MAKER
    }

    fn supports(&self, column_type: ColumnType) -> bool {
        matches!(column_type, ColumnType::Double | ColumnType::Float)
    }

    fn to_binary(
        &self,
        context: &mut ColumnBinaryMakerContext<'_>,
        column: &Column,
    ) -> Result<ColumnBinary> {
        let column_type = column.column_type();
        let (mask, bits) = Self::bits(column)?;
        let payload = pack(&null_presence::encode(&mask)?, &xor::encode(&bits))?;
        let compressed = context.compress(DOUBLE_MAKER, VALUES_STREAM, &payload)?;
        let width = column_type.fixed_width().unwrap_or(8);

        ColumnBinary::builder(DOUBLE_MAKER, column.name.as_str(), column_type)
            .compressor(compressed.compressor)
            .row_count(bits.len())
            .raw_data_size(payload.len())
            .logical_data_size(bits.len() * width)
            .binary(compressed.binary)
            .build()
    }

    fn to_column(&self, binary: &ColumnBinary) -> Result<Column> {
        let column_type = binary.column_type();
        if !self.supports(column_type) {
            return Err(unexpected_type(DOUBLE_MAKER, column_type));
        }

        let rows: Vec<Option<u64>> = match load_request(binary) {
            Some((request, load_size)) => {
                let (mask, bits) = Self::decode(binary)?;
                load_dictionary(
                    &mask,
                    |k| {
                        bits.get(k).copied().ok_or_else(|| {
                            CodecError::InvalidData(format!("Value {} missing from XOR stream", k))
                        })
                    },
                    &request,
                    load_size,
                )?
                .materialize()
            }
            None => {
                let (mask, bits) = Self::decode(binary)?;
                let mut values = bits.into_iter();
                mask.iter()
                    .map(|is_null| if *is_null { None } else { values.next() })
                    .collect()
            }
        };

        let values = if column_type == ColumnType::Float {
            ColumnValues::Float(
                rows.into_iter()
                    .map(|raw| raw.map(|r| f32::from_bits(r as u32)))
                    .collect(),
            )
        } else {
            ColumnValues::Double(rows.into_iter().map(|raw| raw.map(f64::from_bits)).collect())
        };
        Ok(Column::new(binary.column_name(), values))
    }
}
