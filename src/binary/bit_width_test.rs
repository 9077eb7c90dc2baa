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

#[test]
fn test_int_width_boundaries() {
    let cases = [
        (0, 0u8),
        (1, 1),
        (255, 1),
        (256, 2),
        (65535, 2),
        (65536, 3),
        (16777215, 3),
        (16777216, 4),
        (i32::MAX, 4),
    ];

    for (max, expected) in cases {
        assert_eq!(
            IntWidth::select(0, max).class(),
            expected,
            "Wrong int width for max {}",
            max
        );
    }
}

#[test]
fn test_long_width_boundaries() {
    let mut cases = vec![(0i64, 0u8), (1, 1)];
    for bytes in 1..8u8 {
        let boundary = 1i64 << (8 * bytes as u32);
        cases.push((boundary - 1, bytes));
        cases.push((boundary, bytes + 1));
    }
    cases.push((i64::MAX, 8));

    for (max, expected) in cases {
        assert_eq!(
            LongWidth::select(0, max).class(),
            expected,
            "Wrong long width for max {}",
            max
        );
    }
}

#[test]
fn test_negative_min_selects_full_width() {
    assert_eq!(LongWidth::select(-1, 0), LongWidth::FULL);
    assert_eq!(LongWidth::select(i64::MIN, 1), LongWidth::FULL);
    assert_eq!(IntWidth::select(-1, 3), IntWidth::FULL);
}

#[test]
fn test_long_roundtrip_every_width() {
    for class in 0..=8u8 {
        let width = LongWidth::from_class(class).unwrap();
        let max = if class == 8 {
            i64::MAX
        } else if class == 0 {
            0
        } else {
            ((1u64 << (8 * class as u32)) - 1) as i64
        };
        let values = vec![0, max, max / 2, max / 3, 1.min(max), max];

        let encoded = width.encode(&values);
        assert_eq!(encoded.len(), width.calc_binary_size(values.len()));
        assert_eq!(encoded[0], class);
        assert_eq!(width.decode(&encoded, values.len()).unwrap(), values);
    }
}

#[test]
fn test_full_width_keeps_negative_values() {
    let values = vec![i64::MIN, -1, 0, 1, i64::MAX];
    let encoded = LongWidth::FULL.encode(&values);
    assert_eq!(LongWidth::FULL.decode(&encoded, values.len()).unwrap(), values);

    let ints = vec![i32::MIN, -7, 0, 7, i32::MAX];
    let encoded = IntWidth::FULL.encode(&ints);
    assert_eq!(IntWidth::FULL.decode(&encoded, ints.len()).unwrap(), ints);
}

#[test]
fn test_three_byte_lanes_are_not_interleaved() {
    let width = LongWidth::select(0, 0x01_0203);
    assert_eq!(width.class(), 3);

    let encoded = width.encode(&[0x01_0203, 0x04_0506]);
    // Header, then the byte lane for both rows, then the short lane.
    assert_eq!(&encoded[2..4], &[0x01, 0x04]);
    let shorts = &encoded[4..8];
    if encoded[1] == BIG_ENDIAN {
        assert_eq!(shorts, &[0x02, 0x03, 0x05, 0x06]);
    } else {
        assert_eq!(shorts, &[0x03, 0x02, 0x06, 0x05]);
    }
}

#[test]
fn test_zero_width_stores_only_header() {
    let encoded = LongWidth::ZERO.encode(&[0; 100]);
    assert_eq!(encoded.len(), HEADER_SIZE);
    let decoded = LongWidth::ZERO.decode(&encoded, 100).unwrap();
    assert!(decoded.iter().all(|v| *v == 0));
    assert_eq!(decoded.len(), 100);
}

#[test]
fn test_foreign_byte_order_is_honoured() {
    // A big endian 2-byte stream written by hand.
    let buf = [2u8, BIG_ENDIAN, 0x01, 0x00, 0xFF, 0xFF];
    let decoded = IntWidth::from_class(2).unwrap().decode(&buf, 2).unwrap();
    assert_eq!(decoded, vec![256, 65535]);

    let buf = [2u8, LITTLE_ENDIAN, 0x00, 0x01, 0xFF, 0xFF];
    let decoded = IntWidth::from_class(2).unwrap().decode(&buf, 2).unwrap();
    assert_eq!(decoded, vec![256, 65535]);
}

#[test]
fn test_class_mismatch_is_format_error() {
    let encoded = LongWidth::select(0, 300).encode(&[1, 2, 300]);
    let err = LongWidth::select(0, 70000).reader(&encoded, 3).unwrap_err();
    assert!(matches!(err, CodecError::Format(_)));

    let err = IntWidth::from_class(9).unwrap_err();
    assert!(matches!(err, CodecError::Format(_)));
}

#[test]
fn test_truncated_stream_is_rejected() {
    let encoded = IntWidth::FULL.encode(&[1, 2, 3]);
    assert!(IntWidth::FULL.reader(&encoded[..encoded.len() - 1], 3).is_err());
    assert!(IntWidth::FULL.reader(&encoded[..1], 0).is_err());
}

#[test]
fn test_reader_random_access() {
    let values: Vec<i64> = (0..1000).map(|i| i * 977 % 65_000).collect();
    let width = LongWidth::select(0, 65_000);
    let encoded = width.encode(&values);
    let reader = width.reader(&encoded, values.len()).unwrap();

    assert_eq!(reader.len(), 1000);
    for index in [0usize, 1, 499, 998, 999] {
        assert_eq!(reader.get(index).unwrap(), values[index]);
    }
    assert!(reader.get(1000).is_err());
}

#[test]
fn test_from_header() {
    let encoded = LongWidth::select(0, 1 << 40).encode(&[1 << 40]);
    let width = LongWidth::from_header(&encoded).unwrap();
    assert_eq!(width.class(), 6);
    assert_eq!(width.decode(&encoded, 1).unwrap(), vec![1 << 40]);
}
