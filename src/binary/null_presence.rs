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

//! Null presence encoding
//!
//! Records which rows of a column are null, independently of the values.
//! Two layouts exist and the encoder keeps the smaller one:
//!
//! ```text
//! bitmap: [u8 0][i32 rows][ceil(rows / 8) bytes, MSB first, bit set = null]
//! sparse: [u8 1][u8 stored class][i32 rows][i32 count][i32 max index][int stream]
//! ```
//!
//! The sparse layout stores the ascending row indices of the minority class
//! (nulls, or non-nulls when most rows are null) as an [`IntWidth`] stream.

use crate::binary::bit_width::IntWidth;
use crate::binary::bits::{bit_at, BitWriter};
use crate::error::{CodecError, Result};

const STRATEGY_BITMAP: u8 = 0;
const STRATEGY_SPARSE: u8 = 1;

const STORED_NON_NULL: u8 = 0;
const STORED_NULL: u8 = 1;

const BITMAP_HEADER_SIZE: usize = 1 + 4;
const SPARSE_HEADER_SIZE: usize = 1 + 1 + 4 + 4 + 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullStrategy {
    Bitmap,
    Sparse,
}

/// Decoded header of a null presence buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NullPresenceHeader {
    pub strategy: NullStrategy,
    pub rows: usize,
    /// Sparse only: whether the stored indices are the null rows.
    pub stores_nulls: bool,
    /// Sparse only: number of stored indices.
    pub stored_count: usize,
    /// Sparse only: largest stored index, 0 when nothing is stored.
    pub max_index: usize,
}

fn put_i32(output: &mut Vec<u8>, value: usize) -> Result<()> {
    let value = i32::try_from(value).map_err(|_| {
        CodecError::Range(format!("{} does not fit a null presence header", value))
    })?;
    output.extend_from_slice(&value.to_be_bytes());
    Ok(())
}

fn get_i32(buf: &[u8], offset: usize) -> Result<usize> {
    let bytes: [u8; 4] = buf
        .get(offset..offset + 4)
        .and_then(|slice| slice.try_into().ok())
        .ok_or_else(|| CodecError::InvalidData("Truncated null presence header".to_string()))?;
    let value = i32::from_be_bytes(bytes);
    usize::try_from(value).map_err(|_| {
        CodecError::InvalidData(format!("Negative null presence header field {}", value))
    })
}

/// Rows of the minority class, nulls winning ties.
fn minority(is_null: &[bool]) -> (bool, Vec<i32>) {
    let null_count = is_null.iter().filter(|n| **n).count();
    let stores_nulls = null_count <= is_null.len() - null_count;
    let indices = is_null
        .iter()
        .enumerate()
        .filter(|(_, n)| **n == stores_nulls)
        .map(|(i, _)| i as i32)
        .collect();
    (stores_nulls, indices)
}

/// Encode `is_null` with whichever layout has the smaller payload.
pub fn encode(is_null: &[bool]) -> Result<Vec<u8>> {
    let (stores_nulls, indices) = minority(is_null);
    let max_index = indices.last().copied().unwrap_or(0);
    let sparse_payload = indices.len() * IntWidth::select(0, max_index).bytes();
    let bitmap_payload = is_null.len().div_ceil(8);

    if sparse_payload <= bitmap_payload {
        encode_sparse(is_null.len(), stores_nulls, &indices)
    } else {
        encode_bitmap(is_null)
    }
}

/// Encode `is_null` with a fixed layout.
pub fn encode_with(is_null: &[bool], strategy: NullStrategy) -> Result<Vec<u8>> {
    match strategy {
        NullStrategy::Bitmap => encode_bitmap(is_null),
        NullStrategy::Sparse => {
            let (stores_nulls, indices) = minority(is_null);
            encode_sparse(is_null.len(), stores_nulls, &indices)
        }
    }
}

fn encode_bitmap(is_null: &[bool]) -> Result<Vec<u8>> {
    let mut writer = BitWriter::with_capacity(is_null.len());
    for &null in is_null {
        writer.write_bit(null);
    }
    let bits = writer.finish();

    let mut output = Vec::with_capacity(BITMAP_HEADER_SIZE + bits.len());
    output.push(STRATEGY_BITMAP);
    put_i32(&mut output, is_null.len())?;
    output.extend_from_slice(&bits);
    Ok(output)
}

fn encode_sparse(rows: usize, stores_nulls: bool, indices: &[i32]) -> Result<Vec<u8>> {
    let max_index = indices.last().copied().unwrap_or(0);
    let width = IntWidth::select(0, max_index);

    let mut output = Vec::with_capacity(SPARSE_HEADER_SIZE + width.calc_binary_size(indices.len()));
    output.push(STRATEGY_SPARSE);
    output.push(if stores_nulls {
        STORED_NULL
    } else {
        STORED_NON_NULL
    });
    put_i32(&mut output, rows)?;
    put_i32(&mut output, indices.len())?;
    put_i32(&mut output, max_index as usize)?;
    output.extend_from_slice(&width.encode(indices));
    Ok(output)
}

/// Read the header without expanding the mask.
pub fn inspect(buf: &[u8]) -> Result<NullPresenceHeader> {
    match buf.first() {
        Some(&STRATEGY_BITMAP) => Ok(NullPresenceHeader {
            strategy: NullStrategy::Bitmap,
            rows: get_i32(buf, 1)?,
            stores_nulls: true,
            stored_count: 0,
            max_index: 0,
        }),
        Some(&STRATEGY_SPARSE) => {
            let stores_nulls = match buf.get(1) {
                Some(&STORED_NULL) => true,
                Some(&STORED_NON_NULL) => false,
                other => {
                    return Err(CodecError::Format(format!(
                        "Unknown null presence class flag {:?}",
                        other
                    )))
                }
            };
            Ok(NullPresenceHeader {
                strategy: NullStrategy::Sparse,
                rows: get_i32(buf, 2)?,
                stores_nulls,
                stored_count: get_i32(buf, 6)?,
                max_index: get_i32(buf, 10)?,
            })
        }
        other => Err(CodecError::Format(format!(
            "Unknown null presence strategy {:?}",
            other
        ))),
    }
}

/// Expand a null presence buffer back into a per-row mask (`true` = null).
pub fn decode(buf: &[u8]) -> Result<Vec<bool>> {
    let header = inspect(buf)?;
    match header.strategy {
        NullStrategy::Bitmap => {
            let bits = &buf[BITMAP_HEADER_SIZE..];
            if bits.len() < header.rows.div_ceil(8) {
                return Err(CodecError::InvalidData(format!(
                    "Null bitmap holds {} bytes for {} rows",
                    bits.len(),
                    header.rows
                )));
            }
            (0..header.rows).map(|row| bit_at(bits, row)).collect()
        }
        NullStrategy::Sparse => {
            if header.max_index > i32::MAX as usize {
                return Err(CodecError::InvalidData(
                    "Null presence max index overflows".to_string(),
                ));
            }
            let width = IntWidth::select(0, header.max_index as i32);
            let reader = width.reader(&buf[SPARSE_HEADER_SIZE..], header.stored_count)?;

            let mut mask = vec![!header.stores_nulls; header.rows];
            for index in reader {
                let slot = mask.get_mut(index as usize).ok_or_else(|| {
                    CodecError::InvalidData(format!(
                        "Null presence index {} is outside of {} rows",
                        index, header.rows
                    ))
                })?;
                *slot = header.stores_nulls;
            }
            Ok(mask)
        }
    }
}

#[cfg(test)]
#[path = "null_presence_test.rs"]
mod null_presence_test;
