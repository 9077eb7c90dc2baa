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

//! In-memory column values handed to and returned from the makers

use crate::error::{CodecError, Result};
use serde::{Deserialize, Serialize};

/// Column type tag stored in every column binary meta
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ColumnType {
    Union,
    Array,
    Spread,
    Boolean,
    Byte,
    Bytes,
    Double,
    Float,
    Integer,
    Long,
    Short,
    String,
    Null,
    EmptyArray,
    EmptySpread,
    Unknown,
}

impl ColumnType {
    const ALL: [ColumnType; 16] = [
        ColumnType::Union,
        ColumnType::Array,
        ColumnType::Spread,
        ColumnType::Boolean,
        ColumnType::Byte,
        ColumnType::Bytes,
        ColumnType::Double,
        ColumnType::Float,
        ColumnType::Integer,
        ColumnType::Long,
        ColumnType::Short,
        ColumnType::String,
        ColumnType::Null,
        ColumnType::EmptyArray,
        ColumnType::EmptySpread,
        ColumnType::Unknown,
    ];

    pub fn to_byte(self) -> u8 {
        self as u8
    }

    pub fn from_byte(code: u8) -> Result<Self> {
        Self::ALL
            .get(code as usize)
            .copied()
            .ok_or_else(|| CodecError::Format(format!("Unknown column type code {}", code)))
    }

    /// Bytes one value occupies before encoding, for fixed width types.
    pub fn fixed_width(self) -> Option<usize> {
        match self {
            ColumnType::Boolean | ColumnType::Byte => Some(1),
            ColumnType::Short => Some(2),
            ColumnType::Integer | ColumnType::Float => Some(4),
            ColumnType::Long | ColumnType::Double => Some(8),
            _ => None,
        }
    }
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Row values of one column
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValues {
    Boolean(Vec<Option<bool>>),
    Byte(Vec<Option<i8>>),
    Short(Vec<Option<i16>>),
    Integer(Vec<Option<i32>>),
    Long(Vec<Option<i64>>),
    Float(Vec<Option<f32>>),
    Double(Vec<Option<f64>>),
    String(Vec<Option<String>>),
    Bytes(Vec<Option<Vec<u8>>>),
    /// Every row is null
    Null(usize),
    /// `lengths[r]` elements of `element` belong to row `r`, back to back.
    Array {
        lengths: Vec<Option<u32>>,
        element: Box<Column>,
    },
    /// Struct rows; every field is row aligned with `present`.
    Spread {
        present: Vec<bool>,
        fields: Vec<Column>,
    },
    /// Row aligned alternatives, at most one non-null per row.
    Union { rows: usize, children: Vec<Column> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: ColumnValues,
}

fn mask_of<T>(values: &[Option<T>]) -> Vec<bool> {
    values.iter().map(Option::is_none).collect()
}

fn pick<T: Clone>(values: &[Option<T>], rows: &[usize]) -> Vec<Option<T>> {
    rows.iter()
        .map(|&row| values.get(row).cloned().flatten())
        .collect()
}

impl Column {
    pub fn new(name: impl Into<String>, values: ColumnValues) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn row_count(&self) -> usize {
        match &self.values {
            ColumnValues::Boolean(v) => v.len(),
            ColumnValues::Byte(v) => v.len(),
            ColumnValues::Short(v) => v.len(),
            ColumnValues::Integer(v) => v.len(),
            ColumnValues::Long(v) => v.len(),
            ColumnValues::Float(v) => v.len(),
            ColumnValues::Double(v) => v.len(),
            ColumnValues::String(v) => v.len(),
            ColumnValues::Bytes(v) => v.len(),
            ColumnValues::Null(rows) => *rows,
            ColumnValues::Array { lengths, .. } => lengths.len(),
            ColumnValues::Spread { present, .. } => present.len(),
            ColumnValues::Union { rows, .. } => *rows,
        }
    }

    pub fn column_type(&self) -> ColumnType {
        match &self.values {
            ColumnValues::Boolean(_) => ColumnType::Boolean,
            ColumnValues::Byte(_) => ColumnType::Byte,
            ColumnValues::Short(_) => ColumnType::Short,
            ColumnValues::Integer(_) => ColumnType::Integer,
            ColumnValues::Long(_) => ColumnType::Long,
            ColumnValues::Float(_) => ColumnType::Float,
            ColumnValues::Double(_) => ColumnType::Double,
            ColumnValues::String(_) => ColumnType::String,
            ColumnValues::Bytes(_) => ColumnType::Bytes,
            ColumnValues::Null(_) => ColumnType::Null,
            ColumnValues::Array { element, .. } if element.row_count() == 0 => {
                ColumnType::EmptyArray
            }
            ColumnValues::Array { .. } => ColumnType::Array,
            ColumnValues::Spread { fields, .. } if fields.is_empty() => ColumnType::EmptySpread,
            ColumnValues::Spread { .. } => ColumnType::Spread,
            ColumnValues::Union { .. } => ColumnType::Union,
        }
    }

    /// Per row null flags.
    pub fn null_mask(&self) -> Vec<bool> {
        match &self.values {
            ColumnValues::Boolean(v) => mask_of(v),
            ColumnValues::Byte(v) => mask_of(v),
            ColumnValues::Short(v) => mask_of(v),
            ColumnValues::Integer(v) => mask_of(v),
            ColumnValues::Long(v) => mask_of(v),
            ColumnValues::Float(v) => mask_of(v),
            ColumnValues::Double(v) => mask_of(v),
            ColumnValues::String(v) => mask_of(v),
            ColumnValues::Bytes(v) => mask_of(v),
            ColumnValues::Null(rows) => vec![true; *rows],
            ColumnValues::Array { lengths, .. } => mask_of(lengths),
            ColumnValues::Spread { present, .. } => present.iter().map(|p| !p).collect(),
            ColumnValues::Union { rows, children } => {
                let mut mask = vec![true; *rows];
                for child in children {
                    for (row, is_null) in child.null_mask().into_iter().enumerate() {
                        if let Some(slot) = mask.get_mut(row) {
                            *slot &= is_null;
                        }
                    }
                }
                mask
            }
        }
    }

    pub fn non_null_count(&self) -> usize {
        self.null_mask().iter().filter(|is_null| !**is_null).count()
    }

    /// Check that nested children line up with this column's rows.
    pub fn validate(&self) -> Result<()> {
        match &self.values {
            ColumnValues::Array { lengths, element } => {
                let expected: u64 = lengths.iter().flatten().map(|l| *l as u64).sum();
                if expected != element.row_count() as u64 {
                    return Err(CodecError::InvalidData(format!(
                        "Array column '{}' declares {} elements, element column has {}",
                        self.name,
                        expected,
                        element.row_count()
                    )));
                }
                element.validate()
            }
            ColumnValues::Spread { present, fields } => {
                self.validate_aligned(present.len(), fields)
            }
            ColumnValues::Union { rows, children } => {
                self.validate_aligned(*rows, children)?;
                let mut taken = vec![false; *rows];
                for child in children {
                    for (row, is_null) in child.null_mask().into_iter().enumerate() {
                        if is_null {
                            continue;
                        }
                        if taken[row] {
                            return Err(CodecError::InvalidData(format!(
                                "Union column '{}' has more than one value in row {}",
                                self.name, row
                            )));
                        }
                        taken[row] = true;
                    }
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn validate_aligned(&self, rows: usize, children: &[Column]) -> Result<()> {
        for child in children {
            if child.row_count() != rows {
                return Err(CodecError::InvalidData(format!(
                    "Child '{}' of '{}' has {} rows, expected {}",
                    child.name,
                    self.name,
                    child.row_count(),
                    rows
                )));
            }
            child.validate()?;
        }
        Ok(())
    }

    /// New column whose row `i` is row `rows[i]` of this one. Rows past the
    /// end read as null.
    pub fn project(&self, rows: &[usize]) -> Column {
        let values = match &self.values {
            ColumnValues::Boolean(v) => ColumnValues::Boolean(pick(v, rows)),
            ColumnValues::Byte(v) => ColumnValues::Byte(pick(v, rows)),
            ColumnValues::Short(v) => ColumnValues::Short(pick(v, rows)),
            ColumnValues::Integer(v) => ColumnValues::Integer(pick(v, rows)),
            ColumnValues::Long(v) => ColumnValues::Long(pick(v, rows)),
            ColumnValues::Float(v) => ColumnValues::Float(pick(v, rows)),
            ColumnValues::Double(v) => ColumnValues::Double(pick(v, rows)),
            ColumnValues::String(v) => ColumnValues::String(pick(v, rows)),
            ColumnValues::Bytes(v) => ColumnValues::Bytes(pick(v, rows)),
            ColumnValues::Null(_) => ColumnValues::Null(rows.len()),
            ColumnValues::Array { lengths, element } => {
                let mut offsets = Vec::with_capacity(lengths.len() + 1);
                offsets.push(0usize);
                for length in lengths {
                    let last = offsets[offsets.len() - 1];
                    offsets.push(last + length.unwrap_or(0) as usize);
                }
                let new_lengths = pick(lengths, rows);
                let element_rows: Vec<usize> = rows
                    .iter()
                    .filter(|&&row| row < lengths.len())
                    .flat_map(|&row| offsets[row]..offsets[row + 1])
                    .collect();
                ColumnValues::Array {
                    lengths: new_lengths,
                    element: Box::new(element.project(&element_rows)),
                }
            }
            ColumnValues::Spread { present, fields } => ColumnValues::Spread {
                present: rows
                    .iter()
                    .map(|&row| present.get(row).copied().unwrap_or(false))
                    .collect(),
                fields: fields.iter().map(|field| field.project(rows)).collect(),
            },
            ColumnValues::Union { children, .. } => ColumnValues::Union {
                rows: rows.len(),
                children: children.iter().map(|child| child.project(rows)).collect(),
            },
        };
        Column::new(self.name.clone(), values)
    }
}

#[cfg(test)]
#[path = "column_test.rs"]
mod column_test;
