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

//! XOR compression of floating point bit patterns
//!
//! Based on Facebook's Gorilla paper. Each value is XORed with its
//! predecessor; identical values cost one bit and slowly changing values
//! only store the meaningful window of the XOR.

use crate::binary::bits::{BitReader, BitWriter};
use crate::error::{CodecError, Result};

/// Leading / trailing zero counts need 6 bits to cover 0..=63.
const WINDOW_FIELD_BITS: u8 = 6;

/// Encode raw bit patterns (`f64::to_bits`, or `f32::to_bits` widened).
pub fn encode(values: &[u64]) -> Vec<u8> {
    let mut writer = BitWriter::with_capacity(values.len() * 16);

    let Some((&first, rest)) = values.split_first() else {
        return writer.finish();
    };
    writer.write_bits(first, 64);

    let mut prev_bits = first;
    // No window yet: the first differing value always opens one.
    let mut prev_leading = u8::MAX;
    let mut prev_trailing = u8::MAX;

    for &curr_bits in rest {
        let xor = prev_bits ^ curr_bits;

        if xor == 0 {
            // Same value - just write 1 bit (0)
            writer.write_bit(false);
        } else {
            writer.write_bit(true);

            let leading_zeros = xor.leading_zeros() as u8;
            let trailing_zeros = xor.trailing_zeros() as u8;

            if leading_zeros >= prev_leading && trailing_zeros >= prev_trailing {
                // Control bit 0 = reuse previous window
                writer.write_bit(false);
                let significant_bits = 64 - prev_leading - prev_trailing;
                writer.write_bits(xor >> prev_trailing, significant_bits);
            } else {
                // Control bit 1 = new window
                writer.write_bit(true);
                writer.write_bits(leading_zeros as u64, WINDOW_FIELD_BITS);
                writer.write_bits(trailing_zeros as u64, WINDOW_FIELD_BITS);

                let significant_bits = 64 - leading_zeros - trailing_zeros;
                writer.write_bits(xor >> trailing_zeros, significant_bits);

                prev_leading = leading_zeros;
                prev_trailing = trailing_zeros;
            }
        }

        prev_bits = curr_bits;
    }

    writer.finish()
}

/// Decode `count` bit patterns written by [`encode`].
pub fn decode(data: &[u8], count: usize) -> Result<Vec<u64>> {
    let mut values = Vec::with_capacity(count);
    if count == 0 {
        return Ok(values);
    }

    let mut reader = BitReader::new(data);
    let mut prev_bits = reader.read_bits(64)?;
    values.push(prev_bits);

    let mut prev_leading = 0u8;
    let mut prev_trailing = 0u8;

    for _ in 1..count {
        let curr_bits = if !reader.read_bit()? {
            prev_bits
        } else {
            let xor = if !reader.read_bit()? {
                let significant_bits = 64 - prev_leading - prev_trailing;
                reader.read_bits(significant_bits)? << prev_trailing
            } else {
                let leading_zeros = reader.read_bits(WINDOW_FIELD_BITS)? as u8;
                let trailing_zeros = reader.read_bits(WINDOW_FIELD_BITS)? as u8;
                let significant_bits = 64u8
                    .checked_sub(leading_zeros + trailing_zeros)
                    .filter(|bits| *bits > 0)
                    .ok_or_else(|| {
                        CodecError::InvalidData(format!(
                            "Invalid XOR window {} / {}",
                            leading_zeros, trailing_zeros
                        ))
                    })?;

                prev_leading = leading_zeros;
                prev_trailing = trailing_zeros;
                reader.read_bits(significant_bits)? << trailing_zeros
            };

            prev_bits ^ xor
        };

        values.push(curr_bits);
        prev_bits = curr_bits;
    }

    Ok(values)
}

#[cfg(test)]
#[path = "xor_test.rs"]
mod xor_test;
