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
use crate::binary::column::ColumnValues;
use crate::binary::compressor::ZSTD_COMPRESSOR;
use crate::config::MakerConfig;

fn tree() -> Arc<MakerConfigTree> {
    Arc::new(MakerConfigTree::new(&MakerConfig::default()).unwrap())
}

fn write(column: &Column) -> ColumnBinary {
    let mut results = CompressResultNode::new();
    let mut context = ColumnBinaryMakerContext::new(tree(), &mut results);
    context.write(column).unwrap()
}

fn round_trip(column: &Column) -> Column {
    read_column(&write(column)).unwrap()
}

fn longs(name: &str, values: Vec<Option<i64>>) -> Column {
    Column::new(name, ColumnValues::Long(values))
}

#[test]
fn test_numeric_widths_round_trip() {
    let columns = [
        Column::new("b", ColumnValues::Byte(vec![Some(-3), None, Some(100)])),
        Column::new("s", ColumnValues::Short(vec![Some(i16::MIN), Some(0), None])),
        Column::new("i", ColumnValues::Integer(vec![None, Some(70_000), Some(-1)])),
        longs("l", vec![Some(i64::MIN), Some(i64::MAX), None, Some(0)]),
        longs("offsets", vec![Some(1_000_000_000_000), Some(1_000_000_000_255), None]),
    ];
    for column in &columns {
        assert_eq!(&round_trip(column), column);
    }
}

#[test]
fn test_numeric_meta_figures() {
    let column = Column::new(
        "v",
        ColumnValues::Integer(vec![Some(5), Some(7), None, Some(5), Some(9)]),
    );
    let binary = write(&column);
    assert_eq!(binary.maker_name(), NUMERIC_MAKER);
    assert_eq!(binary.compressor_name(), ZSTD_COMPRESSOR);
    assert_eq!(binary.column_type(), ColumnType::Integer);
    assert_eq!(binary.row_count(), 4);
    assert_eq!(binary.cardinality(), Some(3));
    assert_eq!(binary.logical_data_size(), 16);
    assert!(binary.raw_data_size() > 0);
}

#[test]
fn test_fixed_values_cost_the_same_for_any_row_count() {
    let small = write(&longs("c", vec![Some(42); 10]));
    let large = write(&longs("c", vec![Some(42); 10_000]));
    assert_eq!(small.raw_data_size(), large.raw_data_size());
    assert_eq!(large.row_count(), 10_000);
}

#[test]
fn test_all_null_numeric() {
    let column = longs("n", vec![None; 5]);
    assert_eq!(round_trip(&column), column);
    assert_eq!(write(&column).row_count(), 0);
}

#[test]
fn test_numeric_load_dictionary_matches_projection() {
    let values: Vec<Option<i64>> = (0..50)
        .map(|i| if i % 7 == 3 { None } else { Some((i / 3) * 11) })
        .collect();
    let column = longs("v", values.clone());
    let binary = write(&column);
    let maker = OptimizeLongColumnBinaryMaker;

    let index = vec![0, 1, 1, 3, 10, 10, 49, 60];
    let loaded = maker
        .load_dictionary(&binary, &LoadRequest::Index(index.clone()), index.len())
        .unwrap();
    let expected: Vec<Option<i64>> = index
        .iter()
        .map(|&row| values.get(row as usize).copied().flatten())
        .collect();
    assert_eq!(loaded.materialize(), expected);
    // Repeated rows share one entry; null rows have none.
    assert_eq!(loaded.dictionary.len(), 3);

    let repetitions = vec![2, 0, 1, 3];
    let loaded = maker
        .load_dictionary(&binary, &LoadRequest::Repetitions(repetitions), 8)
        .unwrap();
    assert_eq!(
        loaded.materialize(),
        vec![
            values[0], values[0], values[2], values[3], values[3], values[3], None, None
        ]
    );
}

#[test]
fn test_load_dictionary_rejects_bad_requests() {
    let binary = write(&longs("v", vec![Some(1), Some(2)]));
    let maker = OptimizeLongColumnBinaryMaker;
    assert!(matches!(
        maker.load_dictionary(&binary, &LoadRequest::Index(vec![1, 0]), 2),
        Err(CodecError::Validation(_))
    ));
    assert!(matches!(
        maker.load_dictionary(&binary, &LoadRequest::Repetitions(vec![1, -1]), 2),
        Err(CodecError::Validation(_))
    ));
}

#[test]
fn test_load_index_on_read() {
    let column = longs("v", vec![Some(10), None, Some(30), Some(40)]);
    let binary = write(&column).with_load_index(vec![0, 2, 2, 3, 7]).unwrap();
    let read = read_column(&binary).unwrap();
    assert_eq!(
        read,
        longs("v", vec![Some(10), Some(30), Some(30), Some(40), None])
    );
}

#[test]
fn test_doubles_and_floats() {
    let doubles = Column::new(
        "d",
        ColumnValues::Double(vec![
            Some(1.5),
            Some(1.5),
            None,
            Some(-0.0),
            Some(f64::MAX),
            Some(3.25),
        ]),
    );
    assert_eq!(round_trip(&doubles), doubles);

    let floats = Column::new(
        "f",
        ColumnValues::Float(vec![None, Some(0.1), Some(0.2), Some(f32::MIN_POSITIVE)]),
    );
    let binary = write(&floats);
    assert_eq!(binary.logical_data_size(), 12);
    assert_eq!(read_column(&binary).unwrap(), floats);

    let loaded = XorDoubleColumnBinaryMaker
        .load_dictionary(&binary, &LoadRequest::Index(vec![1, 3]), 2)
        .unwrap();
    assert_eq!(
        loaded.materialize(),
        vec![Some(0.1f32 as f64), Some(f32::MIN_POSITIVE as f64)]
    );
}

#[test]
fn test_booleans() {
    let column = Column::new(
        "flag",
        ColumnValues::Boolean(vec![Some(true), None, Some(false), Some(true), None]),
    );
    let binary = write(&column);
    assert_eq!(binary.cardinality(), Some(2));
    assert_eq!(binary.row_count(), 3);
    assert_eq!(read_column(&binary).unwrap(), column);

    let projected = read_column(&binary.with_load_index(vec![1, 3]).unwrap()).unwrap();
    assert_eq!(projected.values, ColumnValues::Boolean(vec![None, Some(true)]));
}

#[test]
fn test_strings_count_utf16_units() {
    let column = Column::new(
        "s",
        ColumnValues::String(vec![
            Some("héllo".to_string()),
            None,
            Some("😀".to_string()),
            Some(String::new()),
        ]),
    );
    let binary = write(&column);
    // 5 + 2 + 0 UTF-16 units
    assert_eq!(binary.logical_data_size(), 14);
    assert_eq!(read_column(&binary).unwrap(), column);

    let loaded = StringColumnBinaryMaker
        .load_dictionary(&binary, &LoadRequest::Repetitions(vec![0, 1, 2]), 3)
        .unwrap();
    assert_eq!(
        loaded.materialize(),
        vec![None, Some("😀".to_string()), Some("😀".to_string())]
    );
    assert_eq!(loaded.dictionary.len(), 1);
}

#[test]
fn test_bytes() {
    let column = Column::new(
        "raw",
        ColumnValues::Bytes(vec![Some(vec![0, 1, 2]), Some(vec![]), None, Some(vec![255; 300])]),
    );
    let binary = write(&column);
    assert_eq!(binary.logical_data_size(), 303);
    assert_eq!(read_column(&binary).unwrap(), column);

    let loaded = BytesColumnBinaryMaker
        .load_dictionary(&binary, &LoadRequest::Index(vec![3]), 1)
        .unwrap();
    assert_eq!(loaded.get(0), Some(&vec![255; 300]));
}

#[test]
fn test_null_column() {
    let column = Column::new("nothing", ColumnValues::Null(7));
    let binary = write(&column);
    assert_eq!(binary.maker_name(), NULL_MAKER);
    assert_eq!(binary.row_count(), 0);
    assert_eq!(read_column(&binary).unwrap(), column);
}

fn points() -> Column {
    // Three rows: [{x: 1, y: 2}, {x: 3, y: null}], null, [null]
    let spread = Column::new(
        "point",
        ColumnValues::Spread {
            present: vec![true, true, false],
            fields: vec![
                longs("x", vec![Some(1), Some(3), None]),
                longs("y", vec![Some(2), None, None]),
            ],
        },
    );
    Column::new(
        "points",
        ColumnValues::Array {
            lengths: vec![Some(2), None, Some(1)],
            element: Box::new(spread),
        },
    )
}

#[test]
fn test_array_of_spread_round_trip() {
    let column = points();
    let binary = write(&column);
    assert_eq!(binary.maker_name(), ARRAY_MAKER);
    assert_eq!(binary.children().len(), 1);
    assert_eq!(binary.children()[0].maker_name(), SPREAD_MAKER);
    assert_eq!(binary.children()[0].children().len(), 2);
    assert_eq!(read_column(&binary).unwrap(), column);

    let projected = read_column(&binary.with_load_index(vec![2, 2]).unwrap()).unwrap();
    assert_eq!(projected, column.project(&[2, 2]));
}

#[test]
fn test_union_round_trip() {
    let column = Column::new(
        "value",
        ColumnValues::Union {
            rows: 4,
            children: vec![
                longs("long", vec![Some(1), None, None, None]),
                Column::new(
                    "string",
                    ColumnValues::String(vec![None, Some("two".into()), None, None]),
                ),
                Column::new("double", ColumnValues::Double(vec![None, None, Some(3.0), None])),
            ],
        },
    );
    let binary = write(&column);
    assert_eq!(binary.row_count(), 3);
    assert_eq!(binary.children().len(), 3);
    assert_eq!(read_column(&binary).unwrap(), column);
}

#[test]
fn test_union_rejects_two_values_in_one_row() {
    let column = Column::new(
        "value",
        ColumnValues::Union {
            rows: 2,
            children: vec![
                longs("long", vec![Some(1), Some(2)]),
                Column::new("double", ColumnValues::Double(vec![None, Some(2.0)])),
            ],
        },
    );
    let mut results = CompressResultNode::new();
    let mut context = ColumnBinaryMakerContext::new(tree(), &mut results);
    assert!(matches!(
        context.write(&column),
        Err(CodecError::InvalidData(_))
    ));
}

#[test]
fn test_empty_nested_columns() {
    let empty_array = Column::new(
        "tags",
        ColumnValues::Array {
            lengths: vec![Some(0), None],
            element: Box::new(Column::new("tags", ColumnValues::String(vec![]))),
        },
    );
    let binary = write(&empty_array);
    assert_eq!(binary.column_type(), ColumnType::EmptyArray);
    assert_eq!(read_column(&binary).unwrap(), empty_array);

    let empty_spread = Column::new(
        "meta",
        ColumnValues::Spread {
            present: vec![true, false],
            fields: vec![],
        },
    );
    assert_eq!(round_trip(&empty_spread), empty_spread);
}

#[test]
fn test_maker_rejects_other_types() {
    let mut results = CompressResultNode::new();
    let mut context = ColumnBinaryMakerContext::new(tree(), &mut results);
    let strings = Column::new("s", ColumnValues::String(vec![Some("x".into())]));
    let err = OptimizeLongColumnBinaryMaker
        .to_binary(&mut context, &strings)
        .unwrap_err();
    assert!(matches!(err, CodecError::Resolution(_)));
}

#[test]
fn test_misaligned_spread_is_rejected() {
    let column = Column::new(
        "s",
        ColumnValues::Spread {
            present: vec![true, true],
            fields: vec![longs("x", vec![Some(1)])],
        },
    );
    let mut results = CompressResultNode::new();
    let mut context = ColumnBinaryMakerContext::new(tree(), &mut results);
    assert!(matches!(
        context.write(&column),
        Err(CodecError::InvalidData(_))
    ));
}

#[test]
fn test_compress_results_follow_column_paths() {
    let mut results = CompressResultNode::new();
    {
        let mut context = ColumnBinaryMakerContext::new(tree(), &mut results);
        context.write(&points()).unwrap();
        context.write(&points()).unwrap();
    }

    let array = results.get_result(ARRAY_MAKER, VALUES_STREAM).unwrap();
    assert!(array.start_level_data_ratio().is_some());
    let x = results
        .get_child("point")
        .and_then(|point| point.get_child("x"))
        .and_then(|x| x.get_result(NUMERIC_MAKER, VALUES_STREAM))
        .unwrap();
    assert!(x.start_level_data_ratio().is_some());
    assert!(results.get_child("x").is_none());
}

#[test]
fn test_registry_shortcuts() {
    assert_eq!(FindColumnBinaryMaker::shortcut(NUMERIC_MAKER), "n0");
    assert_eq!(FindColumnBinaryMaker::from_shortcut("a0"), ARRAY_MAKER);
    assert_eq!(FindColumnBinaryMaker::shortcut("custom"), "custom");
    for name in FindColumnBinaryMaker::names() {
        let maker = FindColumnBinaryMaker::get(name).unwrap();
        assert_eq!(maker.name(), name);
        let by_shortcut =
            FindColumnBinaryMaker::get(FindColumnBinaryMaker::shortcut(name)).unwrap();
        assert!(Arc::ptr_eq(&maker, &by_shortcut));
    }
    assert!(matches!(
        FindColumnBinaryMaker::get("x::Missing"),
        Err(CodecError::Resolution(_))
    ));
}

#[test]
fn test_corrupt_payload() {
    let binary = write(&longs("v", vec![Some(1), Some(2)]));
    let broken = ColumnBinary::builder(NUMERIC_MAKER, "v", ColumnType::Long)
        .compressor(binary.compressor_name())
        .binary(binary.binary()[..binary.binary().len() / 2].to_vec())
        .build()
        .unwrap();
    assert!(read_column(&broken).is_err());

    let wrong_type = ColumnBinary::builder(NUMERIC_MAKER, "v", ColumnType::String)
        .compressor(binary.compressor_name())
        .binary(binary.binary().to_vec())
        .build()
        .unwrap();
    assert!(matches!(
        read_column(&wrong_type),
        Err(CodecError::Resolution(_))
    ));
}
