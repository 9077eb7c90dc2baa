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

//! Integer columns of every width through the adaptive numeric encoders
//!
//! Value section: `[i64 be min][i64 be max][NumEncoder stream]` over the
//! non-null values only.

use super::{
    decompress, load_request, pack, unexpected_type, unpack, ColumnBinaryMaker,
    ColumnBinaryMakerContext, NUMERIC_MAKER, VALUES_STREAM,
};
use crate::binary::column::{Column, ColumnType, ColumnValues};
use crate::binary::column_binary::ColumnBinary;
use crate::binary::null_presence;
use crate::binary::numeric::{NumEncoder, NumReader};
use crate::binary::selective::{load_dictionary, DictionaryColumn, LoadRequest};
use crate::error::{CodecError, Result};
use std::collections::HashSet;
use tracing::debug;

const MIN_MAX_SIZE: usize = 16;

#[derive(Debug, Default)]
pub struct OptimizeLongColumnBinaryMaker;

fn widen<T: Copy + Into<i64>>(values: &[Option<T>]) -> Vec<Option<i64>> {
    values.iter().map(|v| v.map(Into::into)).collect()
}

fn narrow<T: TryFrom<i64>>(values: Vec<Option<i64>>, kind: ColumnType) -> Result<Vec<Option<T>>> {
    values
        .into_iter()
        .map(|value| {
            value
                .map(|v| {
                    T::try_from(v).map_err(|_| {
                        CodecError::InvalidData(format!(
                            "Value {} does not fit a {} column",
                            v, kind
                        ))
                    })
                })
                .transpose()
        })
        .collect()
}

impl OptimizeLongColumnBinaryMaker {
    fn values(column: &Column) -> Result<Vec<Option<i64>>> {
        match &column.values {
            ColumnValues::Byte(v) => Ok(widen(v)),
            ColumnValues::Short(v) => Ok(widen(v)),
            ColumnValues::Integer(v) => Ok(widen(v)),
            ColumnValues::Long(v) => Ok(v.clone()),
            _ => Err(unexpected_type(NUMERIC_MAKER, column.column_type())),
        }
    }

    /// Decode the payload and hand the null mask and a random access reader
    /// over the non-null values to `f`.
    fn with_reader<R>(
        binary: &ColumnBinary,
        f: impl FnOnce(&[bool], &NumReader<'_>) -> Result<R>,
    ) -> Result<R> {
        let payload = decompress(binary)?;
        let (nulls, section) = unpack(&payload)?;
        let mask = null_presence::decode(nulls)?;
        let encoded = section.get(MIN_MAX_SIZE..).ok_or_else(|| {
            CodecError::Format("Numeric section is missing its min / max".to_string())
        })?;
        let non_null = mask.iter().filter(|is_null| !**is_null).count();
        let encoder = NumEncoder::from_header(encoded)?;
        let reader = encoder.reader(encoded, non_null)?;
        f(&mask, &reader)
    }

    /// Read only the rows `request` asks for, as distinct consecutive
    /// values plus per row indices.
    pub fn load_dictionary(
        &self,
        binary: &ColumnBinary,
        request: &LoadRequest,
        load_size: usize,
    ) -> Result<DictionaryColumn<i64>> {
        request.validate()?;
        Self::with_reader(binary, |mask, reader| {
            load_dictionary(mask, |k| reader.get(k), request, load_size)
        })
    }
}

impl ColumnBinaryMaker for OptimizeLongColumnBinaryMaker {
    fn name(&self) -> &'static str {
        NUMERIC_MAKER
    }

    fn supports(&self, column_type: ColumnType) -> bool {
        matches!(
            column_type,
            ColumnType::Byte | ColumnType::Short | ColumnType::Integer | ColumnType::Long
        )
    }

    fn to_binary(
        &self,
        context: &mut ColumnBinaryMakerContext<'_>,
        column: &Column,
    ) -> Result<ColumnBinary> {
        let column_type = column.column_type();
        let values = Self::values(column)?;
        let mask: Vec<bool> = values.iter().map(Option::is_none).collect();
        let non_null: Vec<i64> = values.iter().flatten().copied().collect();

        let min = non_null.iter().copied().min().unwrap_or(0);
        let max = non_null.iter().copied().max().unwrap_or(0);
        let encoder = NumEncoder::create(min, max);
        debug!(
            "Column '{}' ({}) encoded as {:?} over [{}, {}]",
            column.name, column_type, encoder, min, max
        );

        let mut section =
            Vec::with_capacity(MIN_MAX_SIZE + encoder.calc_binary_size(non_null.len()));
        section.extend_from_slice(&min.to_be_bytes());
        section.extend_from_slice(&max.to_be_bytes());
        section.extend_from_slice(&encoder.to_binary(&non_null)?);

        let payload = pack(&null_presence::encode(&mask)?, &section)?;
        let compressed = context.compress(NUMERIC_MAKER, VALUES_STREAM, &payload)?;
        let cardinality = non_null.iter().collect::<HashSet<_>>().len();
        let width = column_type.fixed_width().unwrap_or(8);

        ColumnBinary::builder(NUMERIC_MAKER, column.name.as_str(), column_type)
            .compressor(compressed.compressor)
            .row_count(non_null.len())
            .raw_data_size(payload.len())
            .logical_data_size(non_null.len() * width)
            .cardinality(cardinality)
            .binary(compressed.binary)
            .build()
    }

    fn to_column(&self, binary: &ColumnBinary) -> Result<Column> {
        let column_type = binary.column_type();
        if !self.supports(column_type) {
            return Err(unexpected_type(NUMERIC_MAKER, column_type));
        }

        let rows = match load_request(binary) {
            Some((request, load_size)) => self
                .load_dictionary(binary, &request, load_size)?
                .materialize(),
            None => Self::with_reader(binary, |mask, reader| {
                let mut values = reader.iter();
                Ok(mask
                    .iter()
                    .map(|is_null| if *is_null { None } else { values.next() })
                    .collect::<Vec<_>>())
            })?,
        };

        let values = match column_type {
            ColumnType::Byte => ColumnValues::Byte(narrow(rows, column_type)?),
            ColumnType::Short => ColumnValues::Short(narrow(rows, column_type)?),
            ColumnType::Integer => ColumnValues::Integer(narrow(rows, column_type)?),
            _ => ColumnValues::Long(rows),
        };
        Ok(Column::new(binary.column_name(), values))
    }
}
