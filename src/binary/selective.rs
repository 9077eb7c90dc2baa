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

//! Dictionary loading for projected and expanded reads
//!
//! Instead of materializing every source row, the reader builds a dictionary
//! holding one entry per needed source row and a per-target index into it.
//! Consecutive targets that point at the same source row share one entry.

use crate::error::{CodecError, Result};

/// Which source rows a read should materialize
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadRequest {
    /// Target position `i` reads source row `index[i]`; ascending.
    Index(Vec<i32>),
    /// Source row `r` is repeated `repetitions[r]` times.
    Repetitions(Vec<i32>),
}

impl LoadRequest {
    /// Check the ordering contract before any decoding starts.
    pub fn validate(&self) -> Result<()> {
        match self {
            LoadRequest::Index(index) => validate_load_index(index),
            LoadRequest::Repetitions(repetitions) => {
                if let Some((row, count)) = repetitions.iter().enumerate().find(|(_, c)| **c < 0) {
                    return Err(CodecError::Validation(format!(
                        "Repetition of row {} is negative: {}",
                        row, count
                    )));
                }
                Ok(())
            }
        }
    }

    /// Number of target rows the request produces on its own.
    pub fn natural_size(&self) -> usize {
        match self {
            LoadRequest::Index(index) => index.len(),
            LoadRequest::Repetitions(repetitions) => {
                repetitions.iter().map(|c| (*c).max(0) as usize).sum()
            }
        }
    }
}

/// Load indices must be non-negative and non-decreasing.
pub fn validate_load_index(index: &[i32]) -> Result<()> {
    let mut previous = 0i32;
    for (position, &row) in index.iter().enumerate() {
        if row < 0 {
            return Err(CodecError::Validation(format!(
                "Load index at {} is negative: {}",
                position, row
            )));
        }
        if row < previous {
            return Err(CodecError::Validation(format!(
                "Load index at {} goes backwards: {} after {}",
                position, row, previous
            )));
        }
        previous = row;
    }
    Ok(())
}

/// Values plus per-row dictionary indices, `None` meaning null
#[derive(Debug, Clone, PartialEq)]
pub struct DictionaryColumn<T> {
    pub dictionary: Vec<T>,
    pub indices: Vec<Option<u32>>,
}

impl<T: Clone> DictionaryColumn<T> {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn get(&self, row: usize) -> Option<&T> {
        self.indices
            .get(row)
            .copied()
            .flatten()
            .and_then(|k| self.dictionary.get(k as usize))
    }

    pub fn materialize(&self) -> Vec<Option<T>> {
        (0..self.len()).map(|row| self.get(row).cloned()).collect()
    }
}

/// Tracks the non-null ordinal of a forward moving source row.
struct OrdinalCursor<'a> {
    is_null: &'a [bool],
    row: usize,
    ordinal: usize,
}

impl<'a> OrdinalCursor<'a> {
    fn new(is_null: &'a [bool]) -> Self {
        Self {
            is_null,
            row: 0,
            ordinal: 0,
        }
    }

    /// Non-null ordinal of `row`, or `None` when the row is null or past
    /// the source range. Rows must be requested in ascending order.
    fn seek(&mut self, row: usize) -> Option<usize> {
        if row >= self.is_null.len() {
            return None;
        }
        while self.row < row {
            if !self.is_null[self.row] {
                self.ordinal += 1;
            }
            self.row += 1;
        }
        if self.is_null[row] {
            None
        } else {
            Some(self.ordinal)
        }
    }
}

/// Build a [`DictionaryColumn`] of `load_size` rows.
///
/// `is_null` is the source null mask and `fetch(k)` returns the `k`-th
/// non-null source value. Target rows past the request or past the source
/// range are null.
pub fn load_dictionary<T, F>(
    is_null: &[bool],
    mut fetch: F,
    request: &LoadRequest,
    load_size: usize,
) -> Result<DictionaryColumn<T>>
where
    F: FnMut(usize) -> Result<T>,
{
    request.validate()?;

    let mut dictionary = Vec::new();
    let mut indices = Vec::with_capacity(load_size);
    let mut cursor = OrdinalCursor::new(is_null);

    match request {
        LoadRequest::Index(index) => {
            let mut previous: Option<(i32, Option<u32>)> = None;
            for &row in index.iter().take(load_size) {
                let slot = match previous {
                    Some((last_row, last_slot)) if last_row == row => last_slot,
                    _ => match cursor.seek(row as usize) {
                        Some(ordinal) => {
                            dictionary.push(fetch(ordinal)?);
                            Some((dictionary.len() - 1) as u32)
                        }
                        None => None,
                    },
                };
                indices.push(slot);
                previous = Some((row, slot));
            }
        }
        LoadRequest::Repetitions(repetitions) => {
            for (row, &count) in repetitions.iter().enumerate() {
                let remaining = load_size - indices.len();
                if remaining == 0 {
                    break;
                }
                let count = (count as usize).min(remaining);
                if count == 0 {
                    continue;
                }
                let slot = match cursor.seek(row) {
                    Some(ordinal) => {
                        dictionary.push(fetch(ordinal)?);
                        Some((dictionary.len() - 1) as u32)
                    }
                    None => None,
                };
                indices.extend(std::iter::repeat_n(slot, count));
            }
        }
    }

    indices.resize(load_size, None);
    Ok(DictionaryColumn {
        dictionary,
        indices,
    })
}

#[cfg(test)]
#[path = "selective_test.rs"]
mod selective_test;
