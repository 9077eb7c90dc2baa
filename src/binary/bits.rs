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

//! MSB-first bit packing shared by the null bitmap, boolean values and the
//! XOR float stream.

use crate::error::{CodecError, Result};

/// Bit writer for efficient bit-level operations
pub(crate) struct BitWriter {
    data: Vec<u8>,
    current_byte: u8,
    bits_in_current: u8,
}

impl BitWriter {
    pub(crate) fn with_capacity(bits: usize) -> Self {
        Self {
            data: Vec::with_capacity(bits.div_ceil(8)),
            current_byte: 0,
            bits_in_current: 0,
        }
    }

    #[inline]
    pub(crate) fn write_bit(&mut self, bit: bool) {
        self.write_bits(bit as u64, 1);
    }

    pub(crate) fn write_bits(&mut self, value: u64, bits: u8) {
        let mut bits_to_write = bits;

        while bits_to_write > 0 {
            let available = 8 - self.bits_in_current;
            let write_now = bits_to_write.min(available);

            let mask = (1u64 << write_now) - 1;
            let bits_value = ((value >> (bits_to_write - write_now)) & mask) as u8;

            self.current_byte |= bits_value << (available - write_now);
            self.bits_in_current += write_now;

            if self.bits_in_current == 8 {
                self.data.push(self.current_byte);
                self.current_byte = 0;
                self.bits_in_current = 0;
            }

            bits_to_write -= write_now;
        }
    }

    pub(crate) fn finish(mut self) -> Vec<u8> {
        if self.bits_in_current > 0 {
            self.data.push(self.current_byte);
        }
        self.data
    }
}

/// Sequential reader over a [`BitWriter`] stream
pub(crate) struct BitReader<'a> {
    data: &'a [u8],
    byte_pos: usize,
    bit_pos: u8,
}

impl<'a> BitReader<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            byte_pos: 0,
            bit_pos: 0,
        }
    }

    #[inline]
    pub(crate) fn read_bit(&mut self) -> Result<bool> {
        Ok(self.read_bits(1)? == 1)
    }

    pub(crate) fn read_bits(&mut self, bits: u8) -> Result<u64> {
        let mut result = 0u64;
        let mut bits_to_read = bits;

        while bits_to_read > 0 {
            if self.byte_pos >= self.data.len() {
                return Err(CodecError::InvalidData(
                    "Unexpected end of bit stream".to_string(),
                ));
            }

            let available = 8 - self.bit_pos;
            let read_now = bits_to_read.min(available);

            let mask = ((1u16 << read_now) - 1) as u8;
            let bits_value = (self.data[self.byte_pos] >> (available - read_now)) & mask;

            result = (result << read_now) | (bits_value as u64);

            self.bit_pos += read_now;
            if self.bit_pos == 8 {
                self.byte_pos += 1;
                self.bit_pos = 0;
            }

            bits_to_read -= read_now;
        }

        Ok(result)
    }
}

/// Read bit `index` of an MSB-first packed buffer without a cursor.
#[inline]
pub(crate) fn bit_at(data: &[u8], index: usize) -> Result<bool> {
    let byte = data.get(index >> 3).ok_or_else(|| {
        CodecError::InvalidData(format!("Bit {} is outside of the packed buffer", index))
    })?;
    Ok((byte >> (7 - (index & 7))) & 1 == 1)
}
