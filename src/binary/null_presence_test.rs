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
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[test]
fn test_single_leading_null_selects_sparse() {
    let mut mask = vec![false; 10];
    mask[0] = true;

    let encoded = encode(&mask).unwrap();
    let header = inspect(&encoded).unwrap();

    assert_eq!(header.strategy, NullStrategy::Sparse);
    assert!(header.stores_nulls);
    assert_eq!(header.rows, 10);
    assert_eq!(header.stored_count, 1);
    assert_eq!(header.max_index, 0);
    assert_eq!(decode(&encoded).unwrap(), mask);
}

#[test]
fn test_roundtrip_forced_strategies() {
    let mut rng = StdRng::seed_from_u64(7);

    for len in 0..200usize {
        let density: f64 = rng.gen_range(0.0..1.0);
        let mask: Vec<bool> = (0..len).map(|_| rng.gen_bool(density)).collect();

        for strategy in [NullStrategy::Bitmap, NullStrategy::Sparse] {
            let encoded = encode_with(&mask, strategy).unwrap();
            assert_eq!(inspect(&encoded).unwrap().strategy, strategy);
            assert_eq!(
                decode(&encoded).unwrap(),
                mask,
                "Round trip failed for len {} with {:?}",
                len,
                strategy
            );
        }

        assert_eq!(decode(&encode(&mask).unwrap()).unwrap(), mask);
    }
}

#[test]
fn test_mostly_null_stores_non_null_rows() {
    let mut mask = vec![true; 1000];
    mask[10] = false;
    mask[900] = false;

    let encoded = encode(&mask).unwrap();
    let header = inspect(&encoded).unwrap();

    assert_eq!(header.strategy, NullStrategy::Sparse);
    assert!(!header.stores_nulls);
    assert_eq!(header.stored_count, 2);
    assert_eq!(header.max_index, 900);
    assert_eq!(decode(&encoded).unwrap(), mask);
}

#[test]
fn test_dense_alternating_mask_selects_bitmap() {
    let mask: Vec<bool> = (0..1000).map(|i| i % 2 == 0).collect();

    let encoded = encode(&mask).unwrap();
    assert_eq!(inspect(&encoded).unwrap().strategy, NullStrategy::Bitmap);
    assert_eq!(encoded.len(), 1 + 4 + 125);
    assert_eq!(decode(&encoded).unwrap(), mask);
}

#[test]
fn test_bitmap_is_msb_first() {
    let mut mask = vec![false; 9];
    mask[0] = true;
    mask[8] = true;

    let encoded = encode_with(&mask, NullStrategy::Bitmap).unwrap();
    assert_eq!(&encoded[5..], &[0b1000_0000, 0b1000_0000]);
}

#[test]
fn test_empty_mask() {
    let encoded = encode(&[]).unwrap();
    assert_eq!(decode(&encoded).unwrap(), Vec::<bool>::new());
}

#[test]
fn test_unknown_strategy_is_format_error() {
    let err = decode(&[9, 0, 0, 0, 0]).unwrap_err();
    assert!(matches!(err, CodecError::Format(_)));

    let err = decode(&[]).unwrap_err();
    assert!(matches!(err, CodecError::Format(_)));
}

#[test]
fn test_out_of_range_sparse_index_is_rejected() {
    let mut encoded = vec![1u8, 1];
    encoded.extend_from_slice(&1i32.to_be_bytes());
    encoded.extend_from_slice(&1i32.to_be_bytes());
    encoded.extend_from_slice(&5i32.to_be_bytes());
    encoded.extend_from_slice(&IntWidth::select(0, 5).encode(&[5]));

    let err = decode(&encoded).unwrap_err();
    assert!(matches!(err, CodecError::InvalidData(_)));
}
