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

//! colbin - adaptive columnar binary codec
//!
//! Turns typed columns into compact self-describing byte ranges and back.
//! Numeric ranges pick the narrowest encoder, null masks pick the smaller of
//! a bitmap and a sparse index list, and compression levels are searched
//! per column path while a write session runs.

pub mod binary;
pub mod config;
pub mod error;

pub use binary::{
    Column, ColumnBinary, ColumnBinaryReader, ColumnBinaryWriter, ColumnType, ColumnValues,
    CompressionPolicy, LoadRequest,
};
pub use config::{CodecConfig, ConfigOverride, MakerConfig, MakerConfigTree};
pub use error::{CodecError, Result};
