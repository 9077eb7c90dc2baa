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

//! Narrowest fixed-width representation for a known value range
//!
//! A width class is the number of bytes each value occupies. Widths that are
//! not a native integer size are split into byte / short / int lanes, and each
//! lane is stored as one contiguous array over all rows:
//!
//! ```text
//! [u8 width class][u8 byte order][lane 0 ...][lane 1 ...][lane 2 ...]
//! ```
//!
//! Lanes are ordered smallest first and the largest lane carries the low
//! bits, so a 3-byte stream is a byte lane (bits 16..24) followed by a short
//! lane (bits 0..16). Values are written in the platform byte order, which is
//! recorded in the header so any reader can decode them.

use crate::error::{CodecError, Result};

pub const BIG_ENDIAN: u8 = 0;
pub const LITTLE_ENDIAN: u8 = 1;

/// Width class byte plus byte order byte
pub const HEADER_SIZE: usize = 2;

#[inline]
pub fn native_byte_order() -> u8 {
    if cfg!(target_endian = "little") {
        LITTLE_ENDIAN
    } else {
        BIG_ENDIAN
    }
}

/// Lane sizes in storage order for each width class
fn lane_sizes(width: u8) -> &'static [usize] {
    match width {
        0 => &[],
        1 => &[1],
        2 => &[2],
        3 => &[1, 2],
        4 => &[4],
        5 => &[1, 4],
        6 => &[2, 4],
        7 => &[1, 2, 4],
        _ => &[8],
    }
}

/// Number of bytes needed to hold the highest set bit of `value`.
#[inline]
fn byte_length(value: u64) -> u8 {
    let bits = 64 - value.leading_zeros();
    bits.div_ceil(8) as u8
}

#[inline]
fn put_lane(dst: &mut [u8], part: u64, order: u8) {
    let size = dst.len();
    if order == BIG_ENDIAN {
        for (k, byte) in dst.iter_mut().enumerate() {
            *byte = (part >> (8 * (size - 1 - k))) as u8;
        }
    } else {
        for (k, byte) in dst.iter_mut().enumerate() {
            *byte = (part >> (8 * k)) as u8;
        }
    }
}

#[inline]
fn get_lane(src: &[u8], order: u8) -> u64 {
    let mut part = 0u64;
    if order == BIG_ENDIAN {
        for &byte in src {
            part = (part << 8) | byte as u64;
        }
    } else {
        for &byte in src.iter().rev() {
            part = (part << 8) | byte as u64;
        }
    }
    part
}

/// Row `index` of a lane payload (header stripped).
#[inline]
fn read_raw(payload: &[u8], width: u8, order: u8, rows: usize, index: usize) -> u64 {
    let lanes = lane_sizes(width);
    let mut lane_start = 0;
    let mut low_bits: u32 = lanes.iter().map(|s| (*s as u32) * 8).sum();
    let mut value = 0u64;
    for &size in lanes {
        low_bits -= size as u32 * 8;
        let offset = lane_start + index * size;
        let part = get_lane(&payload[offset..offset + size], order);
        value |= part << low_bits;
        lane_start += rows * size;
    }
    value
}

#[inline]
fn write_raw(payload: &mut [u8], width: u8, order: u8, rows: usize, index: usize, value: u64) {
    let lanes = lane_sizes(width);
    let mut lane_start = 0;
    let mut low_bits: u32 = lanes.iter().map(|s| (*s as u32) * 8).sum();
    for &size in lanes {
        low_bits -= size as u32 * 8;
        let mask = if size == 8 {
            u64::MAX
        } else {
            (1u64 << (size * 8)) - 1
        };
        let offset = lane_start + index * size;
        put_lane(
            &mut payload[offset..offset + size],
            (value >> low_bits) & mask,
            order,
        );
        lane_start += rows * size;
    }
}

/// Validate a stream header against the expected class and return its
/// byte order together with the lane payload.
fn open_stream(buf: &[u8], width: u8, rows: usize) -> Result<(u8, &[u8])> {
    if buf.len() < HEADER_SIZE {
        return Err(CodecError::Format(format!(
            "Bit width stream of {} bytes is shorter than its header",
            buf.len()
        )));
    }
    if buf[0] != width {
        return Err(CodecError::Format(format!(
            "Width class mismatch: expected {}, found {}",
            width, buf[0]
        )));
    }
    let order = buf[1];
    if order != BIG_ENDIAN && order != LITTLE_ENDIAN {
        return Err(CodecError::Format(format!("Unknown byte order flag {}", order)));
    }
    let payload = &buf[HEADER_SIZE..];
    let needed = rows * width as usize;
    if payload.len() < needed {
        return Err(CodecError::InvalidData(format!(
            "Bit width stream holds {} bytes, {} rows of width {} need {}",
            payload.len(),
            rows,
            width,
            needed
        )));
    }
    Ok((order, payload))
}

/// Width class for 64-bit values: 0..=8 bytes per value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LongWidth(u8);

impl LongWidth {
    pub const ZERO: LongWidth = LongWidth(0);
    pub const FULL: LongWidth = LongWidth(8);

    /// Narrowest width covering `[min, max]`. Any negative bound needs the
    /// full 8 bytes.
    pub fn select(min: i64, max: i64) -> Self {
        if min < 0 || max < 0 {
            return Self::FULL;
        }
        Self(byte_length(max as u64))
    }

    pub fn from_class(class: u8) -> Result<Self> {
        if class > 8 {
            return Err(CodecError::Format(format!(
                "Unknown long width class {}",
                class
            )));
        }
        Ok(Self(class))
    }

    /// Width class announced by a stream header.
    pub fn from_header(buf: &[u8]) -> Result<Self> {
        let class = *buf.first().ok_or_else(|| {
            CodecError::Format("Empty bit width stream".to_string())
        })?;
        Self::from_class(class)
    }

    #[inline]
    pub fn class(self) -> u8 {
        self.0
    }

    #[inline]
    pub fn bytes(self) -> usize {
        self.0 as usize
    }

    pub fn calc_binary_size(self, rows: usize) -> usize {
        HEADER_SIZE + rows * self.bytes()
    }

    pub fn writer(self, rows: usize) -> LongWriter {
        let mut buf = vec![0u8; self.calc_binary_size(rows)];
        buf[0] = self.0;
        buf[1] = native_byte_order();
        LongWriter {
            width: self,
            rows,
            buf,
        }
    }

    pub fn encode(self, values: &[i64]) -> Vec<u8> {
        let mut writer = self.writer(values.len());
        for (index, &value) in values.iter().enumerate() {
            writer.put(index, value);
        }
        writer.finish()
    }

    pub fn reader(self, buf: &[u8], rows: usize) -> Result<LongReader<'_>> {
        let (order, payload) = open_stream(buf, self.0, rows)?;
        Ok(LongReader {
            width: self,
            order,
            payload,
            rows,
            pos: 0,
        })
    }

    pub fn decode(self, buf: &[u8], rows: usize) -> Result<Vec<i64>> {
        Ok(self.reader(buf, rows)?.collect())
    }
}

/// Random access writer over a preallocated long stream
#[derive(Debug)]
pub struct LongWriter {
    width: LongWidth,
    rows: usize,
    buf: Vec<u8>,
}

impl LongWriter {
    /// Store `value` at row `index`. Bits above the width are dropped.
    #[inline]
    pub fn put(&mut self, index: usize, value: i64) {
        debug_assert!(index < self.rows);
        let order = self.buf[1];
        write_raw(
            &mut self.buf[HEADER_SIZE..],
            self.width.0,
            order,
            self.rows,
            index,
            value as u64,
        );
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}

/// Random access and sequential reader over a long stream
#[derive(Debug, Clone)]
pub struct LongReader<'a> {
    width: LongWidth,
    order: u8,
    payload: &'a [u8],
    rows: usize,
    pos: usize,
}

impl LongReader<'_> {
    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn get(&self, index: usize) -> Result<i64> {
        if index >= self.rows {
            return Err(CodecError::InvalidData(format!(
                "Row {} is outside of a {} row stream",
                index, self.rows
            )));
        }
        Ok(self.get_unchecked(index))
    }

    #[inline]
    fn get_unchecked(&self, index: usize) -> i64 {
        read_raw(self.payload, self.width.0, self.order, self.rows, index) as i64
    }
}

impl Iterator for LongReader<'_> {
    type Item = i64;

    fn next(&mut self) -> Option<i64> {
        if self.pos >= self.rows {
            return None;
        }
        let value = self.get_unchecked(self.pos);
        self.pos += 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.rows - self.pos;
        (left, Some(left))
    }
}

impl ExactSizeIterator for LongReader<'_> {}

/// Width class for 32-bit values: 0..=4 bytes per value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntWidth(u8);

impl IntWidth {
    pub const ZERO: IntWidth = IntWidth(0);
    pub const FULL: IntWidth = IntWidth(4);

    pub fn select(min: i32, max: i32) -> Self {
        if min < 0 || max < 0 {
            return Self::FULL;
        }
        Self(byte_length(max as u64))
    }

    pub fn from_class(class: u8) -> Result<Self> {
        if class > 4 {
            return Err(CodecError::Format(format!(
                "Unknown int width class {}",
                class
            )));
        }
        Ok(Self(class))
    }

    pub fn from_header(buf: &[u8]) -> Result<Self> {
        let class = *buf.first().ok_or_else(|| {
            CodecError::Format("Empty bit width stream".to_string())
        })?;
        Self::from_class(class)
    }

    #[inline]
    pub fn class(self) -> u8 {
        self.0
    }

    #[inline]
    pub fn bytes(self) -> usize {
        self.0 as usize
    }

    pub fn calc_binary_size(self, rows: usize) -> usize {
        HEADER_SIZE + rows * self.bytes()
    }

    pub fn writer(self, rows: usize) -> IntWriter {
        let mut buf = vec![0u8; self.calc_binary_size(rows)];
        buf[0] = self.0;
        buf[1] = native_byte_order();
        IntWriter {
            width: self,
            rows,
            buf,
        }
    }

    pub fn encode(self, values: &[i32]) -> Vec<u8> {
        let mut writer = self.writer(values.len());
        for (index, &value) in values.iter().enumerate() {
            writer.put(index, value);
        }
        writer.finish()
    }

    pub fn reader(self, buf: &[u8], rows: usize) -> Result<IntReader<'_>> {
        let (order, payload) = open_stream(buf, self.0, rows)?;
        Ok(IntReader {
            width: self,
            order,
            payload,
            rows,
            pos: 0,
        })
    }

    pub fn decode(self, buf: &[u8], rows: usize) -> Result<Vec<i32>> {
        Ok(self.reader(buf, rows)?.collect())
    }
}

#[derive(Debug)]
pub struct IntWriter {
    width: IntWidth,
    rows: usize,
    buf: Vec<u8>,
}

impl IntWriter {
    #[inline]
    pub fn put(&mut self, index: usize, value: i32) {
        debug_assert!(index < self.rows);
        let order = self.buf[1];
        write_raw(
            &mut self.buf[HEADER_SIZE..],
            self.width.0,
            order,
            self.rows,
            index,
            value as u32 as u64,
        );
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}

#[derive(Debug, Clone)]
pub struct IntReader<'a> {
    width: IntWidth,
    order: u8,
    payload: &'a [u8],
    rows: usize,
    pos: usize,
}

impl IntReader<'_> {
    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn get(&self, index: usize) -> Result<i32> {
        if index >= self.rows {
            return Err(CodecError::InvalidData(format!(
                "Row {} is outside of a {} row stream",
                index, self.rows
            )));
        }
        Ok(self.get_unchecked(index))
    }

    #[inline]
    fn get_unchecked(&self, index: usize) -> i32 {
        read_raw(self.payload, self.width.0, self.order, self.rows, index) as u32 as i32
    }
}

impl Iterator for IntReader<'_> {
    type Item = i32;

    fn next(&mut self) -> Option<i32> {
        if self.pos >= self.rows {
            return None;
        }
        let value = self.get_unchecked(self.pos);
        self.pos += 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.rows - self.pos;
        (left, Some(left))
    }
}

impl ExactSizeIterator for IntReader<'_> {}

#[cfg(test)]
#[path = "bit_width_test.rs"]
mod bit_width_test;
