// src/models/match_result.rs

use serde::{Deserialize, Serialize};

/// The best reference match kept for one source record. Unmatched records
/// carry [`MatchResult::unmatched`] defaults so every source row has exactly one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MatchResult {
    #[serde(rename = "SourceID")]
    pub source_id: String,
    pub matched_name: f64,
    pub matched_emails: f64,
    pub matched_address: f64,
    pub matched_doctors: f64,
    pub total_score: f64,
    #[serde(rename = "MatchedEntityID")]
    pub matched_entity_id: String,
    pub matched_practice_name: String,
}

impl MatchResult {
    pub fn unmatched(source_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            matched_name: 0.0,
            matched_emails: 0.0,
            matched_address: 0.0,
            matched_doctors: 0.0,
            total_score: 0.0,
            matched_entity_id: String::new(),
            matched_practice_name: String::new(),
        }
    }

    pub fn is_matched(&self) -> bool {
        !self.matched_entity_id.is_empty()
    }

    /// Cells in `columns::RESULT_COLUMNS` order.
    pub fn to_cells(&self) -> Vec<String> {
        vec![
            format_score(self.matched_name),
            format_score(self.matched_emails),
            format_score(self.matched_address),
            format_score(self.matched_doctors),
            format_score(self.total_score),
            self.matched_entity_id.clone(),
            self.matched_practice_name.clone(),
        ]
    }
}

pub fn format_score(value: f64) -> String {
    format!("{:.1}", value)
}
