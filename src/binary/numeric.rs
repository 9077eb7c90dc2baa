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

//! Range adaptive encoders for integer segments
//!
//! The encoder is picked from the observed `(min, max)` of the non-null
//! values of a segment:
//!
//! * `Fixed` when every value is equal: one 8-byte value, whatever the row count
//! * `Byte` / `Short` / `Integer` / `Long` store each value at native width
//! * `DiffLong` stores `value - min` at the narrowest [`LongWidth`]

use crate::binary::bit_width::{native_byte_order, LongReader, LongWidth, BIG_ENDIAN, LITTLE_ENDIAN};
use crate::error::{CodecError, Result};

const KIND_FIXED: u8 = 0;
const KIND_BYTE: u8 = 1;
const KIND_SHORT: u8 = 2;
const KIND_INTEGER: u8 = 3;
const KIND_LONG: u8 = 4;
const KIND_DIFF_LONG: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumEncoder {
    /// Every value equals the stored constant
    Fixed(i64),
    Byte,
    Short,
    Integer,
    Long,
    /// Offsets from `min` at the given width
    DiffLong { min: i64, width: LongWidth },
}

impl NumEncoder {
    /// Pick the smallest encoder for values in `[min, max]`.
    ///
    /// A spread that cannot be diffed (`max - min` overflows) falls back to
    /// the full width `Long` encoder.
    pub fn create(min: i64, max: i64) -> Self {
        if min == max {
            return NumEncoder::Fixed(min);
        }

        let native = if min >= i8::MIN as i64 && max <= i8::MAX as i64 {
            NumEncoder::Byte
        } else if min >= i16::MIN as i64 && max <= i16::MAX as i64 {
            NumEncoder::Short
        } else if min >= i32::MIN as i64 && max <= i32::MAX as i64 {
            NumEncoder::Integer
        } else {
            NumEncoder::Long
        };

        match Self::diff(min, max) {
            Ok(diff) if diff.value_width() < native.value_width() => diff,
            _ => native,
        }
    }

    /// Diff encoder for `[min, max]`, failing when the spread overflows.
    pub fn diff(min: i64, max: i64) -> Result<Self> {
        if min > max {
            return Err(CodecError::Range(format!(
                "Empty range: min {} is above max {}",
                min, max
            )));
        }
        let spread = max.checked_sub(min).ok_or_else(|| {
            CodecError::Range(format!(
                "Spread of [{}, {}] does not fit a diff encoding",
                min, max
            ))
        })?;
        Ok(NumEncoder::DiffLong {
            min,
            width: LongWidth::select(0, spread),
        })
    }

    /// Rebuild the encoder described by an encoded buffer.
    pub fn from_header(buf: &[u8]) -> Result<Self> {
        match buf.first() {
            Some(&KIND_FIXED) => Ok(NumEncoder::Fixed(read_i64(buf, 1)?)),
            Some(&KIND_BYTE) => Ok(NumEncoder::Byte),
            Some(&KIND_SHORT) => Ok(NumEncoder::Short),
            Some(&KIND_INTEGER) => Ok(NumEncoder::Integer),
            Some(&KIND_LONG) => Ok(NumEncoder::Long),
            Some(&KIND_DIFF_LONG) => {
                let min = read_i64(buf, 1)?;
                let width = LongWidth::from_header(buf.get(9..).unwrap_or_default())?;
                Ok(NumEncoder::DiffLong { min, width })
            }
            other => Err(CodecError::Format(format!(
                "Unknown numeric encoder kind {:?}",
                other
            ))),
        }
    }

    fn kind(&self) -> u8 {
        match self {
            NumEncoder::Fixed(_) => KIND_FIXED,
            NumEncoder::Byte => KIND_BYTE,
            NumEncoder::Short => KIND_SHORT,
            NumEncoder::Integer => KIND_INTEGER,
            NumEncoder::Long => KIND_LONG,
            NumEncoder::DiffLong { .. } => KIND_DIFF_LONG,
        }
    }

    /// Bytes occupied by one value.
    pub fn value_width(&self) -> usize {
        match self {
            NumEncoder::Fixed(_) => 0,
            NumEncoder::Byte => 1,
            NumEncoder::Short => 2,
            NumEncoder::Integer => 4,
            NumEncoder::Long => 8,
            NumEncoder::DiffLong { width, .. } => width.bytes(),
        }
    }

    pub fn calc_binary_size(&self, rows: usize) -> usize {
        match self {
            NumEncoder::Fixed(_) => 1 + 8,
            NumEncoder::DiffLong { width, .. } => 1 + 8 + width.calc_binary_size(rows),
            native => 2 + rows * native.value_width(),
        }
    }

    pub fn to_binary(&self, values: &[i64]) -> Result<Vec<u8>> {
        let mut output = Vec::with_capacity(self.calc_binary_size(values.len()));
        output.push(self.kind());

        match *self {
            NumEncoder::Fixed(value) => {
                if let Some(other) = values.iter().find(|v| **v != value) {
                    return Err(CodecError::Range(format!(
                        "Value {} differs from fixed value {}",
                        other, value
                    )));
                }
                output.extend_from_slice(&value.to_be_bytes());
            }
            NumEncoder::DiffLong { min, width } => {
                let limit = if width.bytes() == 8 {
                    u64::MAX
                } else {
                    (1u64 << (8 * width.bytes())) - 1
                };
                let mut writer = width.writer(values.len());
                for (index, &value) in values.iter().enumerate() {
                    let offset = value.checked_sub(min).filter(|d| *d >= 0 && *d as u64 <= limit);
                    let offset = offset.ok_or_else(|| {
                        CodecError::Range(format!(
                            "Value {} does not fit {} bytes above {}",
                            value,
                            width.bytes(),
                            min
                        ))
                    })?;
                    writer.put(index, offset);
                }
                output.extend_from_slice(&min.to_be_bytes());
                output.extend_from_slice(&writer.finish());
            }
            NumEncoder::Byte => {
                output.push(native_byte_order());
                for &value in values {
                    let narrow = i8::try_from(value).map_err(|_| out_of_native(value, "byte"))?;
                    output.extend_from_slice(&narrow.to_ne_bytes());
                }
            }
            NumEncoder::Short => {
                output.push(native_byte_order());
                for &value in values {
                    let narrow = i16::try_from(value).map_err(|_| out_of_native(value, "short"))?;
                    output.extend_from_slice(&narrow.to_ne_bytes());
                }
            }
            NumEncoder::Integer => {
                output.push(native_byte_order());
                for &value in values {
                    let narrow =
                        i32::try_from(value).map_err(|_| out_of_native(value, "integer"))?;
                    output.extend_from_slice(&narrow.to_ne_bytes());
                }
            }
            NumEncoder::Long => {
                output.push(native_byte_order());
                for &value in values {
                    output.extend_from_slice(&value.to_ne_bytes());
                }
            }
        }

        Ok(output)
    }

    /// Random access reader over `rows` values encoded by this encoder.
    pub fn reader<'a>(&self, buf: &'a [u8], rows: usize) -> Result<NumReader<'a>> {
        let kind = *buf
            .first()
            .ok_or_else(|| CodecError::Format("Empty numeric stream".to_string()))?;
        if kind != self.kind() {
            return Err(CodecError::Format(format!(
                "Numeric encoder mismatch: expected kind {}, found {}",
                self.kind(),
                kind
            )));
        }

        match *self {
            NumEncoder::Fixed(_) => Ok(NumReader::Fixed {
                value: read_i64(buf, 1)?,
                rows,
            }),
            NumEncoder::DiffLong { width, .. } => {
                let min = read_i64(buf, 1)?;
                let inner = width.reader(&buf[9..], rows)?;
                Ok(NumReader::Diff { min, inner })
            }
            native => {
                let order = *buf.get(1).ok_or_else(|| {
                    CodecError::Format("Numeric stream misses its byte order".to_string())
                })?;
                if order != BIG_ENDIAN && order != LITTLE_ENDIAN {
                    return Err(CodecError::Format(format!("Unknown byte order flag {}", order)));
                }
                let bytes = native.value_width();
                let payload = &buf[2..];
                if payload.len() < rows * bytes {
                    return Err(CodecError::InvalidData(format!(
                        "Numeric stream holds {} bytes, {} rows need {}",
                        payload.len(),
                        rows,
                        rows * bytes
                    )));
                }
                Ok(NumReader::Native {
                    bytes,
                    little_endian: order == LITTLE_ENDIAN,
                    payload,
                    rows,
                })
            }
        }
    }

    pub fn decode(&self, buf: &[u8], rows: usize) -> Result<Vec<i64>> {
        Ok(self.reader(buf, rows)?.iter().collect())
    }
}

fn out_of_native(value: i64, kind: &str) -> CodecError {
    CodecError::Range(format!("Value {} does not fit a {} encoder", value, kind))
}

fn read_i64(buf: &[u8], offset: usize) -> Result<i64> {
    let bytes: [u8; 8] = buf
        .get(offset..offset + 8)
        .and_then(|slice| slice.try_into().ok())
        .ok_or_else(|| CodecError::InvalidData("Truncated numeric header".to_string()))?;
    Ok(i64::from_be_bytes(bytes))
}

/// Reader returned by [`NumEncoder::reader`]
#[derive(Debug, Clone)]
pub enum NumReader<'a> {
    Fixed {
        value: i64,
        rows: usize,
    },
    Native {
        bytes: usize,
        little_endian: bool,
        payload: &'a [u8],
        rows: usize,
    },
    Diff {
        min: i64,
        inner: LongReader<'a>,
    },
}

impl NumReader<'_> {
    pub fn len(&self) -> usize {
        match self {
            NumReader::Fixed { rows, .. } | NumReader::Native { rows, .. } => *rows,
            NumReader::Diff { inner, .. } => inner.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Result<i64> {
        if index >= self.len() {
            return Err(CodecError::InvalidData(format!(
                "Row {} is outside of a {} row numeric stream",
                index,
                self.len()
            )));
        }
        Ok(self.get_unchecked(index))
    }

    fn get_unchecked(&self, index: usize) -> i64 {
        match self {
            NumReader::Fixed { value, .. } => *value,
            NumReader::Diff { min, inner } => {
                min.wrapping_add(inner.get(index).unwrap_or_default())
            }
            NumReader::Native {
                bytes,
                little_endian,
                payload,
                ..
            } => {
                let start = index * bytes;
                let raw = &payload[start..start + bytes];
                macro_rules! native {
                    ($ty:ty, $n:expr) => {{
                        let mut array = [0u8; $n];
                        array.copy_from_slice(raw);
                        if *little_endian {
                            <$ty>::from_le_bytes(array) as i64
                        } else {
                            <$ty>::from_be_bytes(array) as i64
                        }
                    }};
                }
                match bytes {
                    1 => native!(i8, 1),
                    2 => native!(i16, 2),
                    4 => native!(i32, 4),
                    _ => native!(i64, 8),
                }
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = i64> + '_ {
        (0..self.len()).map(move |index| self.get_unchecked(index))
    }
}

#[cfg(test)]
#[path = "numeric_test.rs"]
mod numeric_test;
