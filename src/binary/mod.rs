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

//! Column binary codec
//!
//! Leaf primitives first (bit widths, null presence, numeric encoders, XOR,
//! selective loads), then compression, the [`ColumnBinary`] container and
//! the makers that tie them together.

pub(crate) mod bits;
pub mod bit_width;
pub mod column;
pub mod column_binary;
pub mod compress;
pub mod compressor;
pub mod maker;
pub mod null_presence;
pub mod numeric;
mod registry;
pub mod selective;
pub mod writer;
pub mod xor;

pub use column::{Column, ColumnType, ColumnValues};
pub use column_binary::{ColumnBinary, ColumnBinaryBuilder, SummaryStats};
pub use compress::{CompressResult, CompressResultNode, CompressionPolicy};
pub use compressor::{Compressor, FindCompressor};
pub use maker::{read_column, ColumnBinaryMaker, ColumnBinaryMakerContext, FindColumnBinaryMaker};
pub use selective::{DictionaryColumn, LoadRequest};
pub use writer::{ColumnBinaryReader, ColumnBinaryWriter};
