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

use super::*;
use crate::binary::compressor::ZSTD_COMPRESSOR;
use crate::binary::maker::{ARRAY_MAKER, NUMERIC_MAKER, SPREAD_MAKER};

fn leaf(name: &str, buffer: &Bytes, start: usize, length: usize) -> ColumnBinary {
    ColumnBinary::builder(NUMERIC_MAKER, name, ColumnType::Long)
        .compressor(ZSTD_COMPRESSOR)
        .row_count(4)
        .raw_data_size(length * 2)
        .logical_data_size(32)
        .cardinality(3)
        .range(buffer.clone(), start, length)
        .build()
        .unwrap()
}

/// array -> spread -> (long, long)
fn three_levels() -> ColumnBinary {
    let buffer = Bytes::from(vec![7u8; 100]);
    let spread = ColumnBinary::builder(SPREAD_MAKER, "item", ColumnType::Spread)
        .row_count(4)
        .range(buffer.clone(), 30, 5)
        .children(vec![leaf("x", &buffer, 40, 11), leaf("y", &buffer, 60, 13)])
        .build()
        .unwrap();
    ColumnBinary::builder(ARRAY_MAKER, "items", ColumnType::Array)
        .row_count(2)
        .range(buffer, 0, 17)
        .children(vec![spread])
        .build()
        .unwrap()
}

#[test]
fn test_binary_size_sums_descendants() {
    let root = three_levels();
    let spread = &root.children()[0];
    assert_eq!(spread.binary_size(), 5 + 11 + 13);
    assert_eq!(root.binary_size(), 17 + spread.binary_size());
    assert_eq!(spread.children()[0].binary_size(), 11);
}

#[test]
fn test_range_is_shared_not_copied() {
    let root = three_levels();
    let child = &root.children()[0].children()[1];
    assert_eq!(child.binary(), &[7u8; 13][..]);
    assert_eq!(child.buffer().as_ptr(), root.buffer().as_ptr());
}

#[test]
fn test_meta_round_trip() {
    let buffer = Bytes::from((0..64u8).collect::<Vec<_>>());
    let original = leaf("price", &buffer, 9, 20);
    let meta = original.to_meta_binary().unwrap();

    assert_eq!(meta.len(), original.meta_size());
    // "n0" + "c1" + "price" on top of the fixed region
    assert_eq!(meta.len(), META_FIXED_SIZE + 2 + 2 + 5);
    assert_eq!(&meta[..6], &[0, 0, 0, 2, b'n', b'0']);

    let decoded = ColumnBinary::from_meta_binary(&meta, buffer, vec![]).unwrap();
    assert_eq!(decoded, original);
    assert_eq!(decoded.maker_name(), NUMERIC_MAKER);
    assert_eq!(decoded.compressor_name(), ZSTD_COMPRESSOR);
    assert_eq!(decoded.binary(), &(9..29u8).collect::<Vec<_>>()[..]);
}

#[test]
fn test_unknown_names_pass_through_meta() {
    let binary = ColumnBinary::builder("vendor::CustomMaker", "c", ColumnType::Bytes)
        .compressor("vendor::CustomCompressor")
        .binary(vec![1, 2, 3])
        .build()
        .unwrap();
    let meta = binary.to_meta_binary().unwrap();
    let decoded = ColumnBinary::from_meta_binary(&meta, binary.buffer().clone(), vec![]).unwrap();
    assert_eq!(decoded.maker_name(), "vendor::CustomMaker");
    assert_eq!(decoded.compressor_name(), "vendor::CustomCompressor");
    assert_eq!(decoded.cardinality(), None);
}

#[test]
fn test_corrupt_meta() {
    let meta = leaf("p", &Bytes::from(vec![0u8; 8]), 0, 8)
        .to_meta_binary()
        .unwrap();
    let truncated = ColumnBinary::from_meta_binary(&meta[..meta.len() - 1], Bytes::new(), vec![]);
    assert!(matches!(truncated, Err(CodecError::Format(_))));

    // Range points past the supplied buffer.
    let short = ColumnBinary::from_meta_binary(&meta, Bytes::from(vec![0u8; 4]), vec![]);
    assert!(matches!(short, Err(CodecError::Format(_))));

    let mut bad_type = meta.clone();
    let type_offset = 4 + 2 + 4 + 2 + 4 + 1;
    bad_type[type_offset] = 99;
    assert!(matches!(
        ColumnBinary::from_meta_binary(&bad_type, Bytes::from(vec![0u8; 8]), vec![]),
        Err(CodecError::Format(_))
    ));
}

#[test]
fn test_load_index_view() {
    let root = three_levels();
    let view = root.with_load_index(vec![0, 0, 1, 5]).unwrap();
    assert_eq!(view.load_index(), Some(&[0, 0, 1, 5][..]));
    assert!(root.load_index().is_none());
    assert_eq!(view.binary_size(), root.binary_size());

    assert!(matches!(
        root.with_load_index(vec![2, 1]),
        Err(CodecError::Validation(_))
    ));
    assert!(matches!(
        root.with_load_index(vec![-1]),
        Err(CodecError::Validation(_))
    ));
}

#[test]
fn test_renamed_keeps_payload() {
    let root = three_levels();
    let renamed = root.renamed("other");
    assert_eq!(renamed.column_name(), "other");
    assert_eq!(renamed.binary(), root.binary());
    assert_eq!(renamed.children().len(), 1);
}

#[test]
fn test_statistics_roll_up() {
    let stats = three_levels().statistics();
    assert_eq!(stats.row_count, 2 + 4 + 4 + 4);
    assert_eq!(stats.real_data_size, 17 + 5 + 11 + 13);
    assert_eq!(stats.raw_data_size, 22 + 26);
    assert_eq!(stats.logical_data_size, 64);
    // Composite nodes do not count distinct values.
    assert_eq!(stats.cardinality, None);

    let buffer = Bytes::from(vec![0u8; 8]);
    let mut leaf_stats = leaf("a", &buffer, 0, 4).statistics();
    leaf_stats.merge(&leaf("b", &buffer, 4, 4).statistics());
    assert_eq!(leaf_stats.cardinality, Some(6));
}
