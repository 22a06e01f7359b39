// src/models/record.rs

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::models::columns;

/// An ordered, string-celled table. Both the submitted roster and the
/// reference registry travel through the engine in this shape.
///
/// Every row is kept at exactly `columns.len()` cells; short rows are padded
/// with empty strings and long rows are truncated on insert.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RecordSetParts")]
pub struct RecordSet {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

/// Deserialized form, re-shaped through `from_rows` so row widths hold.
#[derive(Deserialize)]
struct RecordSetParts {
    columns: Vec<String>,
    #[serde(default)]
    rows: Vec<Vec<String>>,
}

impl From<RecordSetParts> for RecordSet {
    fn from(parts: RecordSetParts) -> Self {
        RecordSet::from_rows(parts.columns, parts.rows)
    }
}

impl RecordSet {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn from_rows<S: Into<String>>(
        columns: impl IntoIterator<Item = S>,
        rows: impl IntoIterator<Item = Vec<String>>,
    ) -> Self {
        let mut set = Self::new(columns);
        for row in rows {
            set.push_row(row);
        }
        set
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Index of the first column called `name`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn push_row(&mut self, mut row: Vec<String>) {
        row.resize(self.columns.len(), String::new());
        self.rows.push(row);
    }

    /// Cell at `row`/`col`; out-of-range lookups read as empty.
    pub fn value(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        self.column_index(column).map(|col| self.value(row, col))
    }

    /// All values of a column in row order, or `None` if the column is absent.
    pub fn column_values(&self, column: &str) -> Option<Vec<&str>> {
        let col = self.column_index(column)?;
        Some((0..self.rows.len()).map(|row| self.value(row, col)).collect())
    }

    /// Appends `name` filled with `default` unless it already exists.
    pub fn ensure_column(&mut self, name: &str, default: &str) {
        if self.has_column(name) {
            return;
        }
        self.columns.push(name.to_string());
        for row in &mut self.rows {
            row.push(default.to_string());
        }
    }

    /// Overwrites every cell of `name` (appending the column if needed).
    pub fn fill_column(&mut self, name: &str, value: &str) {
        self.ensure_column(name, value);
        if let Some(col) = self.column_index(name) {
            for row in &mut self.rows {
                row[col] = value.to_string();
            }
        }
    }

    /// Rewrites each cell of `name` in place. Absent columns are left alone.
    pub fn map_column<F>(&mut self, name: &str, f: F)
    where
        F: Fn(&str) -> String,
    {
        if let Some(col) = self.column_index(name) {
            for row in &mut self.rows {
                row[col] = f(&row[col]);
            }
        }
    }

    /// Collapses repeated column names down to their first occurrence.
    pub fn dedup_columns(&mut self) {
        let mut seen = HashSet::new();
        let keep: Vec<bool> = self
            .columns
            .iter()
            .map(|c| seen.insert(c.clone()))
            .collect();
        if keep.iter().all(|k| *k) {
            return;
        }

        let retain = |cells: &mut Vec<String>| {
            let mut i = 0;
            cells.retain(|_| {
                let kept = keep[i];
                i += 1;
                kept
            });
        };
        retain(&mut self.columns);
        for row in &mut self.rows {
            retain(row);
        }
    }
}

/// One submitted organization row, as built in code by upstream callers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SourceRecord {
    #[serde(rename = "SourceID")]
    pub source_id: String,
    pub name: String,
    pub address: String,
    pub state: String,
    pub zip: String,
    pub city: String,
    pub emails: String,
    pub doctors: String,
    pub source: String,
}

impl SourceRecord {
    pub const COLUMNS: [&'static str; 9] = [
        columns::SOURCE_ID,
        columns::NAME,
        columns::ADDRESS,
        columns::STATE,
        columns::ZIP,
        columns::CITY,
        columns::EMAILS,
        columns::DOCTORS,
        columns::SOURCE,
    ];

    fn into_cells(self) -> Vec<String> {
        vec![
            self.source_id,
            self.name,
            self.address,
            self.state,
            self.zip,
            self.city,
            self.emails,
            self.doctors,
            self.source,
        ]
    }
}

/// One canonical registry entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReferenceRecord {
    pub name: String,
    pub address: String,
    pub state: String,
    pub zip: String,
    pub city: String,
    pub emails: String,
    pub doctors: String,
    #[serde(rename = "MatchedEntityID")]
    pub matched_entity_id: String,
}

impl ReferenceRecord {
    pub const COLUMNS: [&'static str; 8] = [
        columns::NAME,
        columns::ADDRESS,
        columns::STATE,
        columns::ZIP,
        columns::CITY,
        columns::EMAILS,
        columns::DOCTORS,
        columns::MATCHED_ENTITY_ID,
    ];

    fn into_cells(self) -> Vec<String> {
        vec![
            self.name,
            self.address,
            self.state,
            self.zip,
            self.city,
            self.emails,
            self.doctors,
            self.matched_entity_id,
        ]
    }
}

impl FromIterator<SourceRecord> for RecordSet {
    fn from_iter<I: IntoIterator<Item = SourceRecord>>(iter: I) -> Self {
        RecordSet::from_rows(SourceRecord::COLUMNS, iter.into_iter().map(SourceRecord::into_cells))
    }
}

impl FromIterator<ReferenceRecord> for RecordSet {
    fn from_iter<I: IntoIterator<Item = ReferenceRecord>>(iter: I) -> Self {
        RecordSet::from_rows(
            ReferenceRecord::COLUMNS,
            iter.into_iter().map(ReferenceRecord::into_cells),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_rows_are_padded_and_truncated() {
        let set = RecordSet::from_rows(["A", "B"], vec![cells(&["1"]), cells(&["1", "2", "3"])]);
        assert_eq!(set.rows()[0], cells(&["1", ""]));
        assert_eq!(set.rows()[1], cells(&["1", "2"]));
    }

    #[test]
    fn test_deserialized_rows_keep_column_width() {
        let set: RecordSet = serde_json::from_str(
            r#"{"columns": ["SourceID", "Name", "State"], "rows": [["1"], ["2", "Acme", "CA", "extra"]]}"#,
        )
        .unwrap();

        assert_eq!(set.column_values("State"), Some(vec!["", "CA"]));
        assert_eq!(set.rows()[1], cells(&["2", "Acme", "CA"]));
    }

    #[test]
    fn test_dedup_columns_keeps_first_occurrence() {
        let mut set = RecordSet::from_rows(
            ["Name", "TotalScore", "Name"],
            vec![cells(&["first", "4.0", "second"])],
        );
        set.dedup_columns();
        assert_eq!(set.columns(), &["Name".to_string(), "TotalScore".to_string()]);
        assert_eq!(set.rows()[0], cells(&["first", "4.0"]));
    }

    #[test]
    fn test_typed_records_collect_into_record_set() {
        let set: RecordSet = vec![SourceRecord {
            source_id: "7".into(),
            name: "Acme Dental".into(),
            ..Default::default()
        }]
        .into_iter()
        .collect();

        assert_eq!(set.len(), 1);
        assert_eq!(set.get(0, columns::SOURCE_ID), Some("7"));
        assert_eq!(set.get(0, columns::NAME), Some("Acme Dental"));
        assert_eq!(set.get(0, columns::MATCHED_ENTITY_ID), None);
    }

    #[test]
    fn test_map_and_fill_column() {
        let mut set = RecordSet::from_rows(["State"], vec![cells(&["ca"]), cells(&["ny"])]);
        set.map_column("State", |s| s.to_uppercase());
        set.fill_column("Source", "Smile Partners");
        assert_eq!(set.column_values("State"), Some(vec!["CA", "NY"]));
        assert_eq!(set.get(1, "Source"), Some("Smile Partners"));
        // missing columns are ignored
        set.map_column("Zip", |_| "x".to_string());
        assert!(!set.has_column("Zip"));
    }
}
