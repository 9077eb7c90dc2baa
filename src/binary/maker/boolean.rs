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

use super::{
    decompress, load_request, pack, unexpected_type, unpack, ColumnBinaryMaker,
    ColumnBinaryMakerContext, BOOLEAN_MAKER, VALUES_STREAM,
};
use crate::binary::bits::{bit_at, BitWriter};
use crate::binary::column::{Column, ColumnType, ColumnValues};
use crate::binary::column_binary::ColumnBinary;
use crate::binary::null_presence;
use crate::binary::selective::load_dictionary;
use crate::error::Result;

/// One bit per non-null value, MSB first
#[derive(Debug, Default)]
pub struct BooleanColumnBinaryMaker;

impl ColumnBinaryMaker for BooleanColumnBinaryMaker {
    fn name(&self) -> &'static str {
        BOOLEAN_MAKER
    }

    fn supports(&self, column_type: ColumnType) -> bool {
        column_type == ColumnType::Boolean
    }

    fn to_binary(
        &self,
        context: &mut ColumnBinaryMakerContext<'_>,
        column: &Column,
    ) -> Result<ColumnBinary> {
        let ColumnValues::Boolean(values) = &column.values else {
            return Err(unexpected_type(BOOLEAN_MAKER, column.column_type()));
        };

        let mask: Vec<bool> = values.iter().map(Option::is_none).collect();
        let mut writer = BitWriter::with_capacity(values.len());
        let mut seen = [false; 2];
        let mut non_null = 0usize;
        for &value in values.iter().flatten() {
            writer.write_bit(value);
            seen[value as usize] = true;
            non_null += 1;
        }

        let payload = pack(&null_presence::encode(&mask)?, &writer.finish())?;
        let compressed = context.compress(BOOLEAN_MAKER, VALUES_STREAM, &payload)?;

        ColumnBinary::builder(BOOLEAN_MAKER, column.name.as_str(), ColumnType::Boolean)
            .compressor(compressed.compressor)
            .row_count(non_null)
            .raw_data_size(payload.len())
            .logical_data_size(non_null)
            .cardinality(seen.iter().filter(|s| **s).count())
            .binary(compressed.binary)
            .build()
    }

    fn to_column(&self, binary: &ColumnBinary) -> Result<Column> {
        if !self.supports(binary.column_type()) {
            return Err(unexpected_type(BOOLEAN_MAKER, binary.column_type()));
        }

        let payload = decompress(binary)?;
        let (nulls, bits) = unpack(&payload)?;
        let mask = null_presence::decode(nulls)?;

        let values = match load_request(binary) {
            Some((request, load_size)) => {
                load_dictionary(&mask, |k| bit_at(bits, k), &request, load_size)?.materialize()
            }
            None => {
                let mut ordinal = 0usize;
                let mut values = Vec::with_capacity(mask.len());
                for is_null in mask {
                    if is_null {
                        values.push(None);
                    } else {
                        values.push(Some(bit_at(bits, ordinal)?));
                        ordinal += 1;
                    }
                }
                values
            }
        };
        Ok(Column::new(
            binary.column_name(),
            ColumnValues::Boolean(values),
        ))
    }
}
