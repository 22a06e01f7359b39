// src/matching/comparator.rs - Per-field Jaro-Winkler indicators for candidate pairs
use indicatif::ProgressBar;
use log::debug;
use rayon::prelude::*;
use strsim::jaro_winkler;

use crate::error::{RecordSide, ResolveError};
use crate::matching::blocking::CandidatePair;
use crate::models::{columns, RecordSet};

pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.85;

/// The fixed set of fields that contribute to a pair's score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparedField {
    Name,
    Emails,
    Address,
    Doctors,
}

impl ComparedField {
    pub const ALL: [ComparedField; 4] = [
        ComparedField::Name,
        ComparedField::Emails,
        ComparedField::Address,
        ComparedField::Doctors,
    ];

    pub fn column(&self) -> &'static str {
        match self {
            ComparedField::Name => columns::NAME,
            ComparedField::Emails => columns::EMAILS,
            ComparedField::Address => columns::ADDRESS,
            ComparedField::Doctors => columns::DOCTORS,
        }
    }

    pub fn indicator_column(&self) -> &'static str {
        match self {
            ComparedField::Name => columns::MATCHED_NAME,
            ComparedField::Emails => columns::MATCHED_EMAILS,
            ComparedField::Address => columns::MATCHED_ADDRESS,
            ComparedField::Doctors => columns::MATCHED_DOCTORS,
        }
    }
}

/// What to do when a compared field's column is absent from an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingFieldPolicy {
    /// Produce no indicator for the field on any pair.
    Skip,
    /// Reject the batch with `ResolveError::MissingColumn`.
    Fail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRule {
    pub field: ComparedField,
    pub on_missing: MissingFieldPolicy,
}

/// `Name` is required on both sides; the other fields are skipped when absent.
pub fn default_field_rules() -> Vec<FieldRule> {
    ComparedField::ALL
        .iter()
        .map(|&field| FieldRule {
            field,
            on_missing: if field == ComparedField::Name {
                MissingFieldPolicy::Fail
            } else {
                MissingFieldPolicy::Skip
            },
        })
        .collect()
}

/// Indicators for one pair. `None` means the field was skipped.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FieldIndicators {
    pub name: Option<f64>,
    pub emails: Option<f64>,
    pub address: Option<f64>,
    pub doctors: Option<f64>,
}

impl FieldIndicators {
    pub fn get(&self, field: ComparedField) -> Option<f64> {
        match field {
            ComparedField::Name => self.name,
            ComparedField::Emails => self.emails,
            ComparedField::Address => self.address,
            ComparedField::Doctors => self.doctors,
        }
    }

    pub fn set(&mut self, field: ComparedField, value: f64) {
        let slot = match field {
            ComparedField::Name => &mut self.name,
            ComparedField::Emails => &mut self.emails,
            ComparedField::Address => &mut self.address,
            ComparedField::Doctors => &mut self.doctors,
        };
        *slot = Some(value);
    }

    pub fn total(&self) -> f64 {
        ComparedField::ALL
            .iter()
            .filter_map(|&f| self.get(f))
            .sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairFeatures {
    pub pair: CandidatePair,
    pub indicators: FieldIndicators,
}

/// Jaro-Winkler similarity of two normalized values. An empty value on
/// either side is a missing value and scores 0.
pub fn field_similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    jaro_winkler(a, b)
}

/// 1.0 when `similarity` meets or exceeds `threshold`.
pub fn indicator(similarity: f64, threshold: f64) -> f64 {
    if similarity >= threshold {
        1.0
    } else {
        0.0
    }
}

/// Resolved column positions for the fields compared on this batch.
#[derive(Debug, Clone)]
pub struct FieldComparator {
    fields: Vec<(ComparedField, usize, usize)>,
    threshold: f64,
}

impl FieldComparator {
    /// Applies each rule's missing-field policy against both inputs.
    pub fn new(
        rules: &[FieldRule],
        source: &RecordSet,
        reference: &RecordSet,
        threshold: f64,
    ) -> Result<Self, ResolveError> {
        let mut fields = Vec::with_capacity(rules.len());
        for rule in rules {
            let column = rule.field.column();
            match (source.column_index(column), reference.column_index(column)) {
                (Some(s), Some(r)) => fields.push((rule.field, s, r)),
                (source_col, _) => {
                    if rule.on_missing == MissingFieldPolicy::Fail {
                        let side = if source_col.is_none() {
                            RecordSide::Source
                        } else {
                            RecordSide::Reference
                        };
                        return Err(ResolveError::MissingColumn {
                            side,
                            column: column.to_string(),
                        });
                    }
                    debug!("Field '{}' absent from input; skipping its comparator", column);
                }
            }
        }
        Ok(Self { fields, threshold })
    }

    pub fn compared_fields(&self) -> Vec<ComparedField> {
        self.fields.iter().map(|(f, _, _)| *f).collect()
    }

    pub fn compare(
        &self,
        pair: CandidatePair,
        source: &RecordSet,
        reference: &RecordSet,
    ) -> PairFeatures {
        let mut indicators = FieldIndicators::default();
        for &(field, source_col, reference_col) in &self.fields {
            let similarity = field_similarity(
                source.value(pair.source_idx, source_col),
                reference.value(pair.reference_idx, reference_col),
            );
            indicators.set(field, indicator(similarity, self.threshold));
        }
        PairFeatures { pair, indicators }
    }

    /// Scores every pair in parallel. Output order matches `pairs`.
    pub fn compare_all(
        &self,
        pairs: &[CandidatePair],
        source: &RecordSet,
        reference: &RecordSet,
        progress: Option<&ProgressBar>,
    ) -> Vec<PairFeatures> {
        pairs
            .par_iter()
            .map(|&pair| {
                let features = self.compare(pair, source, reference);
                if let Some(pb) = progress {
                    pb.inc(1);
                }
                features
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_row(columns: &[&str], values: &[&str]) -> RecordSet {
        RecordSet::from_rows(
            columns.iter().copied(),
            vec![values.iter().map(|v| v.to_string()).collect()],
        )
    }

    const PAIR: CandidatePair = CandidatePair {
        source_idx: 0,
        reference_idx: 0,
    };

    #[test]
    fn test_threshold_is_inclusive() {
        assert_eq!(indicator(0.85, DEFAULT_SIMILARITY_THRESHOLD), 1.0);
        assert_eq!(indicator(0.849_999, DEFAULT_SIMILARITY_THRESHOLD), 0.0);
        assert_eq!(indicator(1.0, DEFAULT_SIMILARITY_THRESHOLD), 1.0);
    }

    #[test]
    fn test_similarity_properties() {
        assert_eq!(field_similarity("acme dental", "acme dental"), 1.0);
        assert_eq!(
            field_similarity("martha", "marhta"),
            field_similarity("marhta", "martha")
        );
        assert!(field_similarity("martha", "marhta") > 0.95);
        assert!(field_similarity("acme dental", "zenith orthodontics") < 0.7);
        assert_eq!(field_similarity("", ""), 0.0);
        assert_eq!(field_similarity("acme", ""), 0.0);
    }

    #[test]
    fn test_prefix_agreement_weighs_more() {
        let shared_prefix = field_similarity("dental smiles", "dental smyles");
        let shared_suffix = field_similarity("dental smiles", "lental smiles");
        assert!(shared_prefix > shared_suffix);
    }

    #[test]
    fn test_compare_sets_indicator_per_present_field() {
        let source = one_row(&["Name", "Emails", "Address"], &["acme dental", "front@acme.com", "1 main st"]);
        let reference = one_row(&["Name", "Emails", "Doctors"], &["acme dentall", "billing@zenith.org", "jane doe"]);

        let comparator =
            FieldComparator::new(&default_field_rules(), &source, &reference, DEFAULT_SIMILARITY_THRESHOLD)
                .unwrap();
        assert_eq!(
            comparator.compared_fields(),
            vec![ComparedField::Name, ComparedField::Emails]
        );

        let features = comparator.compare(PAIR, &source, &reference);
        assert_eq!(features.indicators.name, Some(1.0));
        assert_eq!(features.indicators.emails, Some(0.0));
        assert_eq!(features.indicators.address, None);
        assert_eq!(features.indicators.doctors, None);
        assert_eq!(features.indicators.total(), 1.0);
    }

    #[test]
    fn test_fail_policy_rejects_missing_column() {
        let source = one_row(&["Emails"], &["a@x.com"]);
        let reference = one_row(&["Name", "Emails"], &["acme", "a@x.com"]);

        let err = FieldComparator::new(&default_field_rules(), &source, &reference, 0.85).unwrap_err();
        assert_eq!(
            err,
            ResolveError::MissingColumn {
                side: RecordSide::Source,
                column: "Name".to_string()
            }
        );
    }

    #[test]
    fn test_compare_all_preserves_pair_order() {
        let source = RecordSet::from_rows(
            ["Name"],
            vec![vec!["acme".to_string()], vec!["zenith".to_string()]],
        );
        let reference = one_row(&["Name"], &["acme"]);
        let comparator =
            FieldComparator::new(&default_field_rules(), &source, &reference, 0.85).unwrap();
        let pairs = vec![
            CandidatePair { source_idx: 1, reference_idx: 0 },
            CandidatePair { source_idx: 0, reference_idx: 0 },
        ];

        let features = comparator.compare_all(&pairs, &source, &reference, None);

        assert_eq!(features[0].pair, pairs[0]);
        assert_eq!(features[0].indicators.name, Some(0.0));
        assert_eq!(features[1].indicators.name, Some(1.0));
    }
}
