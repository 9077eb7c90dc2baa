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

use colbin::binary::bit_width::{IntWidth, LongWidth};
use colbin::binary::null_presence::{self, NullStrategy};
use colbin::binary::numeric::NumEncoder;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[test]
fn test_null_presence_picks_the_smaller_layout() {
    let mut rng = StdRng::seed_from_u64(99);

    for _ in 0..200 {
        let rows = rng.gen_range(0..2_000);
        let density = rng.gen_range(0.0..1.0);
        let mask: Vec<bool> = (0..rows).map(|_| rng.gen_bool(density)).collect();

        let chosen = null_presence::encode(&mask).unwrap();
        let bitmap = null_presence::encode_with(&mask, NullStrategy::Bitmap).unwrap();
        let sparse = null_presence::encode_with(&mask, NullStrategy::Sparse).unwrap();
        assert!(chosen == bitmap || chosen == sparse);

        for buf in [&chosen, &bitmap, &sparse] {
            assert_eq!(null_presence::decode(buf).unwrap(), mask);
        }
    }
}

#[test]
fn test_single_null_in_ten_rows() {
    let mut mask = vec![false; 10];
    mask[0] = true;

    let buf = null_presence::encode(&mask).unwrap();
    let header = null_presence::inspect(&buf).unwrap();
    assert_eq!(header.strategy, NullStrategy::Sparse);
    assert!(header.stores_nulls);
    assert_eq!(header.stored_count, 1);
    assert_eq!(header.max_index, 0);
    assert_eq!(null_presence::decode(&buf).unwrap(), mask);
}

#[test]
fn test_widths_hold_their_range() {
    let mut rng = StdRng::seed_from_u64(5);

    for _ in 0..200 {
        let spread = 1i64 << rng.gen_range(0..40);
        let values: Vec<i64> = (0..rng.gen_range(1..100))
            .map(|_| rng.gen_range(0..spread))
            .collect();
        let max = *values.iter().max().unwrap();
        let width = LongWidth::select(0, max);
        assert!(width.bytes() == 8 || (max as u64) < 1u64 << (8 * width.bytes()));
        assert_eq!(width.decode(&width.encode(&values), values.len()).unwrap(), values);
    }

    let lengths = vec![0, 255, 256, 70_000];
    let width = IntWidth::select(0, 70_000);
    assert_eq!(width.bytes(), 3);
    assert_eq!(width.decode(&width.encode(&lengths), 4).unwrap(), lengths);
}

#[test]
fn test_numeric_encoder_round_trips_offset_ranges() {
    let mut rng = StdRng::seed_from_u64(11);

    for _ in 0..100 {
        let base = rng.gen_range(i64::MIN / 2..i64::MAX / 2);
        let values: Vec<i64> = (0..64).map(|_| base + rng.gen_range(0..1_000_000)).collect();
        let min = *values.iter().min().unwrap();
        let max = *values.iter().max().unwrap();
        let encoder = NumEncoder::create(min, max);
        assert!(encoder.value_width() <= 8);

        let binary = encoder.to_binary(&values).unwrap();
        assert_eq!(binary.len(), encoder.calc_binary_size(values.len()));
        let decoded = NumEncoder::from_header(&binary).unwrap().decode(&binary, 64).unwrap();
        assert_eq!(decoded, values);
    }
}
