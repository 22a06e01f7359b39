// src/ingest/column_mapping.rs - Maps uploaded roster headers onto canonical source columns
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use crate::models::columns;
use crate::models::RecordSet;

/// Mapping target that drops an uploaded column.
pub const IGNORE_COLUMN: &str = "(Ignore this column)";

/// Older uploads carry the registry's name for the row identifier.
const SOURCE_ID_ALIAS: &str = "ExternalID";

pub const UPLOAD_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Canonical source columns kept after mapping, in output order.
pub const CANONICAL_SOURCE_COLUMNS: [&str; 8] = [
    columns::NAME,
    columns::ADDRESS,
    columns::STATE,
    columns::ZIP,
    columns::CITY,
    columns::EMAILS,
    columns::DOCTORS,
    columns::SOURCE_ID,
];

/// Uploaded header -> canonical column name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnMapping {
    renames: HashMap<String, String>,
}

impl ColumnMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read column mapping {}", path.display()))?;
        let mapping: ColumnMapping = serde_json::from_str(&text)
            .with_context(|| format!("Column mapping {} is not a JSON object of strings", path.display()))?;
        debug!("Loaded {} column mapping entries", mapping.renames.len());
        Ok(mapping)
    }

    pub fn with_rename(mut self, header: impl Into<String>, canonical: impl Into<String>) -> Self {
        self.renames.insert(header.into(), canonical.into());
        self
    }

    /// Canonical name for an uploaded header, or `None` when it is dropped.
    fn target_for<'a>(&'a self, header: &'a str) -> Option<&'a str> {
        let target = self
            .renames
            .get(header)
            .map(|t| t.trim())
            .unwrap_or(header);
        match target {
            "" | IGNORE_COLUMN => None,
            SOURCE_ID_ALIAS => Some(columns::SOURCE_ID),
            other => Some(other),
        }
    }

    /// Builds the source record set for one submission: canonical columns
    /// only, a `SourceID` on every row, and `Source` set to `source_name`.
    pub fn apply(&self, upload: &RecordSet, source_name: &str) -> RecordSet {
        let mut positions: Vec<Option<usize>> = vec![None; CANONICAL_SOURCE_COLUMNS.len()];
        let mut dropped = Vec::new();

        for (col, header) in upload.columns().iter().enumerate() {
            let target = self.target_for(header);
            match target.and_then(|t| CANONICAL_SOURCE_COLUMNS.iter().position(|c| *c == t)) {
                Some(slot) if positions[slot].is_none() => positions[slot] = Some(col),
                Some(_) => warn!(
                    "Column '{}' maps onto an already mapped column; keeping the first",
                    header
                ),
                None => dropped.push(header.as_str()),
            }
        }
        if !dropped.is_empty() {
            debug!("Dropping unmapped columns: {}", dropped.join(", "));
        }

        let id_slot = CANONICAL_SOURCE_COLUMNS.len() - 1;
        let mut taken_ids: HashSet<String> = match positions[id_slot] {
            Some(col) => (0..upload.len())
                .map(|row| upload.value(row, col).trim().to_string())
                .filter(|id| !id.is_empty())
                .collect(),
            None => HashSet::new(),
        };
        let mut synthesized = 0usize;
        let mut collisions = 0usize;
        let mut mapped = RecordSet::new(
            CANONICAL_SOURCE_COLUMNS
                .iter()
                .copied()
                .chain(std::iter::once(columns::SOURCE)),
        );

        for row in 0..upload.len() {
            let mut cells: Vec<String> = positions
                .iter()
                .map(|pos| pos.map(|col| upload.value(row, col).to_string()).unwrap_or_default())
                .collect();
            if cells[id_slot].trim().is_empty() {
                let mut id = (row + 1).to_string();
                let mut suffix = 1;
                while taken_ids.contains(&id) {
                    suffix += 1;
                    id = format!("{}-{}", row + 1, suffix);
                }
                if suffix > 1 {
                    collisions += 1;
                }
                taken_ids.insert(id.clone());
                cells[id_slot] = id;
                synthesized += 1;
            }
            cells.push(source_name.to_string());
            mapped.push_row(cells);
        }

        let missing: Vec<&str> = CANONICAL_SOURCE_COLUMNS
            .iter()
            .zip(&positions)
            .filter(|(_, pos)| pos.is_none())
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            info!("Upload has no {} column(s); filled with empty values", missing.join(", "));
        }
        if synthesized > 0 {
            info!("Assigned row-number SourceIDs to {} records", synthesized);
        }
        if collisions > 0 {
            warn!(
                "{} row-number SourceIDs were already used by the upload; suffixed to stay unique",
                collisions
            );
        }
        mapped
    }
}

/// Appends the upload's file name and timestamp to every row.
pub fn stamp_upload(batch: &mut RecordSet, file_name: &str, uploaded_at: DateTime<Utc>) {
    batch.fill_column(columns::FILE_NAME, file_name);
    batch.fill_column(
        columns::UPLOADED_DATE,
        &uploaded_at.format(UPLOAD_DATE_FORMAT).to_string(),
    );
}
