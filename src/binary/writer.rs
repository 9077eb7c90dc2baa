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

//! Write session and reader entry points

use crate::binary::column::Column;
use crate::binary::column_binary::ColumnBinary;
use crate::binary::compress::CompressResultNode;
use crate::binary::maker::{read_column, ColumnBinaryMakerContext};
use crate::config::MakerConfigTree;
use crate::error::Result;
use std::sync::Arc;
use tracing::debug;

/// Encodes columns with one config tree, keeping the compression level
/// search of every column path alive across calls.
pub struct ColumnBinaryWriter {
    config: Arc<MakerConfigTree>,
    results: CompressResultNode,
}

impl ColumnBinaryWriter {
    pub fn new(config: MakerConfigTree) -> Self {
        Self {
            config: Arc::new(config),
            results: CompressResultNode::new(),
        }
    }

    pub fn write(&mut self, column: &Column) -> Result<ColumnBinary> {
        column.validate()?;
        let config = self.config.child(&column.name);
        let results = self.results.child(&column.name);
        let binary = ColumnBinaryMakerContext::new(config, results).write(column)?;
        debug!(
            "Wrote column '{}' ({}): {} bytes, {} rows",
            column.name,
            binary.column_type(),
            binary.binary_size(),
            column.row_count()
        );
        Ok(binary)
    }

    /// Level search state of this session.
    pub fn compress_results(&self) -> &CompressResultNode {
        &self.results
    }
}

/// Decodes binaries with the maker named in their meta
#[derive(Debug, Default)]
pub struct ColumnBinaryReader;

impl ColumnBinaryReader {
    pub fn new() -> Self {
        Self
    }

    pub fn read(&self, binary: &ColumnBinary) -> Result<Column> {
        read_column(binary)
    }
}
