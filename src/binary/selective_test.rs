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

/// Source rows with every third row null; non-null rows hold `row * 10`.
fn fixture(rows: usize) -> (Vec<bool>, Vec<i64>, Vec<Option<i64>>) {
    let is_null: Vec<bool> = (0..rows).map(|r| r % 3 == 1).collect();
    let dense: Vec<i64> = (0..rows)
        .filter(|r| r % 3 != 1)
        .map(|r| r as i64 * 10)
        .collect();
    let full = (0..rows)
        .map(|r| if r % 3 == 1 { None } else { Some(r as i64 * 10) })
        .collect();
    (is_null, dense, full)
}

#[test]
fn test_index_load_matches_projection() {
    let (is_null, dense, full) = fixture(50);
    let mut rng = StdRng::seed_from_u64(3);

    for _ in 0..50 {
        let mut index: Vec<i32> = (0..rng.gen_range(0..80))
            .map(|_| rng.gen_range(0..60))
            .collect();
        index.sort();

        let request = LoadRequest::Index(index.clone());
        let loaded = load_dictionary(&is_null, |k| Ok(dense[k]), &request, index.len()).unwrap();

        let expected: Vec<Option<i64>> = index
            .iter()
            .map(|row| full.get(*row as usize).copied().flatten())
            .collect();
        assert_eq!(loaded.materialize(), expected);
    }
}

#[test]
fn test_repetitions_match_manual_duplication() {
    let (is_null, dense, full) = fixture(20);
    let repetitions: Vec<i32> = (0..20).map(|r| (r % 4) as i32).collect();

    let request = LoadRequest::Repetitions(repetitions.clone());
    let load_size = request.natural_size();
    let loaded = load_dictionary(&is_null, |k| Ok(dense[k]), &request, load_size).unwrap();

    let mut expected = Vec::new();
    for (row, count) in repetitions.iter().enumerate() {
        for _ in 0..*count {
            expected.push(full[row]);
        }
    }
    assert_eq!(loaded.materialize(), expected);
}

#[test]
fn test_consecutive_rows_share_dictionary_entry() {
    let is_null = vec![false, false, true, false];
    let dense = vec![7i64, 8, 9];
    let request = LoadRequest::Index(vec![0, 0, 0, 2, 2, 3, 3]);

    let loaded = load_dictionary(&is_null, |k| Ok(dense[k]), &request, 7).unwrap();

    assert_eq!(loaded.dictionary, vec![7, 9]);
    assert_eq!(
        loaded.indices,
        vec![Some(0), Some(0), Some(0), None, None, Some(1), Some(1)]
    );
}

#[test]
fn test_only_needed_values_are_fetched() {
    let is_null = vec![false; 1000];
    let mut fetched = Vec::new();
    let request = LoadRequest::Index(vec![5, 500, 999]);

    let loaded = load_dictionary(
        &is_null,
        |k| {
            fetched.push(k);
            Ok(k as i64)
        },
        &request,
        3,
    )
    .unwrap();

    assert_eq!(fetched, vec![5, 500, 999]);
    assert_eq!(loaded.dictionary.len(), 3);
}

#[test]
fn test_positions_past_source_are_null() {
    let is_null = vec![false, false];
    let dense = vec![1i64, 2];

    let request = LoadRequest::Index(vec![1, 5]);
    let loaded = load_dictionary(&is_null, |k| Ok(dense[k]), &request, 4).unwrap();
    assert_eq!(loaded.materialize(), vec![Some(2), None, None, None]);

    let request = LoadRequest::Repetitions(vec![1, 1, 2]);
    let loaded = load_dictionary(&is_null, |k| Ok(dense[k]), &request, 6).unwrap();
    assert_eq!(
        loaded.materialize(),
        vec![Some(1), Some(2), None, None, None, None]
    );
}

#[test]
fn test_load_size_truncates_repetitions() {
    let is_null = vec![false, false];
    let dense = vec![1i64, 2];
    let request = LoadRequest::Repetitions(vec![3, 3]);

    let loaded = load_dictionary(&is_null, |k| Ok(dense[k]), &request, 4).unwrap();
    assert_eq!(loaded.materialize(), vec![Some(1), Some(1), Some(1), Some(2)]);
}

#[test]
fn test_invalid_requests_are_rejected() {
    let is_null = vec![false; 4];
    let fetch = |k: usize| Ok(k as i64);

    for request in [
        LoadRequest::Index(vec![0, 2, 1]),
        LoadRequest::Index(vec![-1, 0]),
        LoadRequest::Repetitions(vec![1, -1]),
    ] {
        let err = load_dictionary(&is_null, fetch, &request, 4).unwrap_err();
        assert!(matches!(err, CodecError::Validation(_)));
    }
}
