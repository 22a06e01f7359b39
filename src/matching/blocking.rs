// src/matching/blocking.rs - Candidate pair generation by blocking key
use log::debug;
use std::collections::HashMap;

use crate::models::RecordSet;

/// A (source row, reference row) association selected for detailed comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CandidatePair {
    pub source_idx: usize,
    pub reference_idx: usize,
}

#[derive(Debug, Default)]
pub struct CandidatePairs {
    pub pairs: Vec<CandidatePair>,
    /// Number of key values shared by both sides.
    pub shared_buckets: usize,
    /// Set when the blocking key was missing and the full cross product was used.
    pub degraded: bool,
}

impl CandidatePairs {
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Pairs every source row with every reference row that shares its value of
/// `key`. Source keys are visited in first-seen order, and rows inside a
/// bucket in ascending order, so the output order is stable.
///
/// Rows whose key is empty are not paired. Key values that never appear on
/// the reference side contribute nothing. When `key` is missing from either
/// set this degrades to the full cross product, which is O(|source| × |reference|).
pub fn generate_candidate_pairs(
    source: &RecordSet,
    reference: &RecordSet,
    key: &str,
) -> CandidatePairs {
    let (source_col, reference_col) = match (source.column_index(key), reference.column_index(key)) {
        (Some(s), Some(r)) => (s, r),
        _ => return full_cross_product(source, reference),
    };

    let (source_keys, source_buckets) = bucket_rows(source, source_col);
    let (_, reference_buckets) = bucket_rows(reference, reference_col);

    let mut result = CandidatePairs::default();
    for key_value in source_keys {
        let Some(reference_rows) = reference_buckets.get(key_value) else {
            continue;
        };
        result.shared_buckets += 1;
        for &source_idx in &source_buckets[key_value] {
            for &reference_idx in reference_rows {
                result.pairs.push(CandidatePair {
                    source_idx,
                    reference_idx,
                });
            }
        }
    }

    debug!(
        "Blocking on '{}': {} shared buckets, {} candidate pairs",
        key,
        result.shared_buckets,
        result.pairs.len()
    );
    result
}

fn bucket_rows(set: &RecordSet, col: usize) -> (Vec<&str>, HashMap<&str, Vec<usize>>) {
    let mut order = Vec::new();
    let mut buckets: HashMap<&str, Vec<usize>> = HashMap::new();
    for row in 0..set.len() {
        let value = set.value(row, col);
        if value.is_empty() {
            continue;
        }
        buckets
            .entry(value)
            .or_insert_with(|| {
                order.push(value);
                Vec::new()
            })
            .push(row);
    }
    (order, buckets)
}

fn full_cross_product(source: &RecordSet, reference: &RecordSet) -> CandidatePairs {
    let pairs = (0..source.len())
        .flat_map(|source_idx| {
            (0..reference.len()).map(move |reference_idx| CandidatePair {
                source_idx,
                reference_idx,
            })
        })
        .collect();
    CandidatePairs {
        pairs,
        shared_buckets: 0,
        degraded: true,
    }
}
