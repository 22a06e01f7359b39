// src/matching/assembler.rs
use std::collections::HashMap;

use crate::models::columns::{self, RESULT_COLUMNS};
use crate::models::{MatchResult, RecordSet};

/// The augmented source batch: `table` rows and `results` are index-aligned
/// and both have exactly one entry per source row.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedBatch {
    pub table: RecordSet,
    pub results: Vec<MatchResult>,
}

impl ResolvedBatch {
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn matched_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_matched()).count()
    }

    pub fn average_matched_score(&self) -> f64 {
        let matched: Vec<f64> = self
            .results
            .iter()
            .filter(|r| r.is_matched())
            .map(|r| r.total_score)
            .collect();
        if matched.is_empty() {
            0.0
        } else {
            matched.iter().sum::<f64>() / matched.len() as f64
        }
    }
}

/// Left-merges `best` onto every row of the original source set by `SourceID`.
/// Rows without a kept match get zero indicators and empty identifiers.
pub fn assemble(original_source: &RecordSet, best: &HashMap<String, MatchResult>) -> ResolvedBatch {
    let id_col = original_source.column_index(columns::SOURCE_ID);

    let mut table = RecordSet::new(
        original_source
            .columns()
            .iter()
            .map(String::as_str)
            .chain(RESULT_COLUMNS),
    );
    let mut results = Vec::with_capacity(original_source.len());

    for (row_idx, row) in original_source.rows().iter().enumerate() {
        let source_id = id_col.map_or("", |col| original_source.value(row_idx, col));
        let result = best
            .get(source_id)
            .cloned()
            .unwrap_or_else(|| MatchResult::unmatched(source_id));

        let mut cells = row.clone();
        cells.extend(result.to_cells());
        table.push_row(cells);
        results.push(result);
    }

    table.dedup_columns();
    ResolvedBatch { table, results }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> RecordSet {
        RecordSet::from_rows(
            ["SourceID", "Name"],
            vec![
                vec!["1".to_string(), "Acme Dental".to_string()],
                vec!["2".to_string(), "Bright Smiles".to_string()],
            ],
        )
    }

    #[test]
    fn test_unmatched_rows_get_defaults() {
        let mut best = HashMap::new();
        best.insert(
            "1".to_string(),
            MatchResult {
                source_id: "1".to_string(),
                matched_name: 1.0,
                matched_emails: 1.0,
                matched_address: 0.0,
                matched_doctors: 1.0,
                total_score: 3.0,
                matched_entity_id: "P-1".to_string(),
                matched_practice_name: "ACME DENTAL".to_string(),
            },
        );

        let batch = assemble(&source(), &best);

        assert_eq!(batch.len(), 2);
        assert_eq!(batch.matched_count(), 1);
        assert_eq!(batch.average_matched_score(), 3.0);
        assert_eq!(batch.table.get(0, "TotalScore"), Some("3.0"));
        assert_eq!(batch.table.get(0, "MatchedPracticeName"), Some("ACME DENTAL"));
        assert_eq!(batch.table.get(1, "TotalScore"), Some("0.0"));
        assert_eq!(batch.table.get(1, "MatchedEntityID"), Some(""));
        assert_eq!(batch.results[1], MatchResult::unmatched("2"));
    }

    #[test]
    fn test_repeated_output_columns_collapse() {
        let mut original = source();
        original.ensure_column("TotalScore", "stale");

        let batch = assemble(&original, &HashMap::new());

        let score_columns = batch
            .table
            .columns()
            .iter()
            .filter(|c| c.as_str() == "TotalScore")
            .count();
        assert_eq!(score_columns, 1);
        assert_eq!(batch.table.columns().len(), 2 + 1 + RESULT_COLUMNS.len() - 1);
        assert_eq!(batch.table.get(0, "TotalScore"), Some("stale"));
    }
}
