// src/matching/selector.rs - Score filtering and per-source best match selection
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::matching::comparator::PairFeatures;
use crate::models::MatchResult;

pub const DEFAULT_MIN_SCORE: i32 = 2;

/// How to choose between reference matches with the same `TotalScore`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TieBreak {
    /// Lowest `MatchedEntityID` (by value when both ids are integers),
    /// then lowest reference row.
    #[default]
    LowestEntityId,
    /// Whichever pair blocking generated first.
    FirstGenerated,
}

impl FromStr for TieBreak {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lowest_entity_id" | "lowest-entity-id" => Ok(TieBreak::LowestEntityId),
            "first_generated" | "first-generated" => Ok(TieBreak::FirstGenerated),
            other => Err(format!("unknown tie-break '{}'", other)),
        }
    }
}

impl fmt::Display for TieBreak {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TieBreak::LowestEntityId => write!(f, "lowest_entity_id"),
            TieBreak::FirstGenerated => write!(f, "first_generated"),
        }
    }
}

/// Reference-side values the selector attaches to a kept match.
pub struct ReferenceKeys<'a> {
    pub entity_ids: Vec<&'a str>,
    pub practice_names: Vec<&'a str>,
}

#[derive(Debug, Default)]
pub struct Selection {
    /// Best match per `SourceID`.
    pub best: HashMap<String, MatchResult>,
    /// Pairs whose score reached `min_score`.
    pub surviving_pairs: usize,
}

/// Keeps, for each `SourceID`, the single highest-scoring pair whose total
/// is at least `min_score`. Source rows sharing a `SourceID` share one match.
pub fn select_best_matches(
    features: &[PairFeatures],
    source_ids: &[&str],
    reference: &ReferenceKeys<'_>,
    min_score: i32,
    tie_break: TieBreak,
) -> Selection {
    let threshold = f64::from(min_score);
    let mut kept: HashMap<&str, (f64, usize)> = HashMap::new();
    let mut surviving_pairs = 0;

    for (position, candidate) in features.iter().enumerate() {
        let total = candidate.indicators.total();
        if total < threshold {
            continue;
        }
        surviving_pairs += 1;

        let source_id = source_ids[candidate.pair.source_idx];
        let replace = match kept.get(source_id) {
            Some(&(best_total, best_position)) => outranks(
                (total, candidate),
                (best_total, &features[best_position]),
                reference,
                tie_break,
            ),
            None => true,
        };
        if replace {
            kept.insert(source_id, (total, position));
        }
    }

    let best = kept
        .into_iter()
        .map(|(source_id, (total, position))| {
            let features = &features[position];
            let reference_idx = features.pair.reference_idx;
            let indicators = features.indicators;
            let result = MatchResult {
                source_id: source_id.to_string(),
                matched_name: indicators.name.unwrap_or(0.0),
                matched_emails: indicators.emails.unwrap_or(0.0),
                matched_address: indicators.address.unwrap_or(0.0),
                matched_doctors: indicators.doctors.unwrap_or(0.0),
                total_score: total,
                matched_entity_id: reference.entity_ids[reference_idx].to_string(),
                matched_practice_name: reference.practice_names[reference_idx].to_string(),
            };
            (source_id.to_string(), result)
        })
        .collect();

    Selection {
        best,
        surviving_pairs,
    }
}

fn outranks(
    (total, candidate): (f64, &PairFeatures),
    (best_total, incumbent): (f64, &PairFeatures),
    reference: &ReferenceKeys<'_>,
    tie_break: TieBreak,
) -> bool {
    if total != best_total {
        return total > best_total;
    }
    match tie_break {
        TieBreak::FirstGenerated => false,
        TieBreak::LowestEntityId => {
            let c = candidate.pair.reference_idx;
            let i = incumbent.pair.reference_idx;
            compare_entity_ids(reference.entity_ids[c], reference.entity_ids[i])
                .then(c.cmp(&i))
                .is_lt()
        }
    }
}

/// Numeric ids order by value; anything else falls back to text order.
fn compare_entity_ids(a: &str, b: &str) -> Ordering {
    match (a.trim().parse::<u64>(), b.trim().parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        _ => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::blocking::CandidatePair;
    use crate::matching::comparator::FieldIndicators;

    fn scored(source_idx: usize, reference_idx: usize, flags: [f64; 4]) -> PairFeatures {
        PairFeatures {
            pair: CandidatePair {
                source_idx,
                reference_idx,
            },
            indicators: FieldIndicators {
                name: Some(flags[0]),
                emails: Some(flags[1]),
                address: Some(flags[2]),
                doctors: Some(flags[3]),
            },
        }
    }

    fn registry() -> ReferenceKeys<'static> {
        ReferenceKeys {
            entity_ids: vec!["P-300", "P-100", "P-200"],
            practice_names: vec!["Bright Smiles", "Acme Dental", "Acme Dental West"],
        }
    }

    #[test]
    fn test_min_score_boundary() {
        let features = vec![
            scored(0, 0, [1.0, 1.0, 0.0, 0.0]),
            scored(1, 1, [1.0, 0.0, 0.0, 0.0]),
        ];
        let selection =
            select_best_matches(&features, &["a", "b"], &registry(), 2, TieBreak::default());

        assert_eq!(selection.surviving_pairs, 1);
        assert_eq!(selection.best["a"].total_score, 2.0);
        assert_eq!(selection.best["a"].matched_entity_id, "P-300");
        assert!(!selection.best.contains_key("b"));
    }

    #[test]
    fn test_highest_score_wins() {
        let features = vec![
            scored(0, 0, [1.0, 1.0, 1.0, 0.0]),
            scored(0, 1, [1.0, 1.0, 1.0, 1.0]),
        ];
        let selection = select_best_matches(&features, &["a"], &registry(), 2, TieBreak::default());

        let best = &selection.best["a"];
        assert_eq!(best.total_score, 4.0);
        assert_eq!(best.matched_entity_id, "P-100");
        assert_eq!(best.matched_practice_name, "Acme Dental");
        assert_eq!(best.matched_doctors, 1.0);
    }

    #[test]
    fn test_ties_prefer_lowest_entity_id() {
        let features = vec![
            scored(0, 0, [1.0, 1.0, 0.0, 0.0]),
            scored(0, 2, [1.0, 0.0, 1.0, 0.0]),
            scored(0, 1, [0.0, 1.0, 1.0, 0.0]),
        ];
        let selection = select_best_matches(&features, &["a"], &registry(), 2, TieBreak::LowestEntityId);
        assert_eq!(selection.best["a"].matched_entity_id, "P-100");

        let selection = select_best_matches(&features, &["a"], &registry(), 2, TieBreak::FirstGenerated);
        assert_eq!(selection.best["a"].matched_entity_id, "P-300");
    }

    #[test]
    fn test_numeric_entity_ids_tie_break_by_value() {
        let numeric = ReferenceKeys {
            entity_ids: vec!["10", "9"],
            practice_names: vec!["Acme Dental", "Acme Dental"],
        };
        let features = vec![
            scored(0, 0, [1.0, 1.0, 0.0, 0.0]),
            scored(0, 1, [1.0, 0.0, 1.0, 0.0]),
        ];

        let selection = select_best_matches(&features, &["a"], &numeric, 2, TieBreak::LowestEntityId);
        assert_eq!(selection.best["a"].matched_entity_id, "9");

        assert_eq!(compare_entity_ids("P-10", "P-9"), Ordering::Less);
        assert_eq!(compare_entity_ids("007", "7"), Ordering::Less);
    }

    #[test]
    fn test_out_of_range_min_score() {
        let features = vec![scored(0, 0, [0.0, 0.0, 0.0, 0.0])];

        let everything = select_best_matches(&features, &["a"], &registry(), -1, TieBreak::default());
        assert_eq!(everything.best["a"].total_score, 0.0);

        let all_four = vec![scored(0, 0, [1.0, 1.0, 1.0, 1.0])];
        let nothing = select_best_matches(&all_four, &["a"], &registry(), 5, TieBreak::default());
        assert!(nothing.best.is_empty());
    }

    #[test]
    fn test_duplicate_source_ids_collapse_to_one_match() {
        let features = vec![
            scored(0, 0, [1.0, 1.0, 0.0, 0.0]),
            scored(1, 1, [1.0, 1.0, 1.0, 0.0]),
        ];
        let selection = select_best_matches(&features, &["dup", "dup"], &registry(), 2, TieBreak::default());

        assert_eq!(selection.best.len(), 1);
        assert_eq!(selection.best["dup"].matched_entity_id, "P-100");
    }

    #[test]
    fn test_tie_break_parsing() {
        assert_eq!("first_generated".parse::<TieBreak>(), Ok(TieBreak::FirstGenerated));
        assert_eq!(" Lowest-Entity-ID ".parse::<TieBreak>(), Ok(TieBreak::LowestEntityId));
        assert!("random".parse::<TieBreak>().is_err());
    }
}
