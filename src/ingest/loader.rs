// src/ingest/loader.rs - Reads uploaded rosters and registry extracts into record sets
use anyhow::{anyhow, bail, Context, Result};
use log::{debug, info, warn};
use serde_json::Value;
use std::fs;
use std::path::Path;

use crate::models::RecordSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadFormat {
    Csv,
    Json,
}

impl UploadFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "csv" => Ok(UploadFormat::Csv),
            "json" => Ok(UploadFormat::Json),
            "xlsx" | "xls" => bail!(
                "Excel uploads are not supported for {}; export the sheet to CSV first",
                path.display()
            ),
            other => bail!("Unsupported file type '{}' for {}", other, path.display()),
        }
    }
}

/// Loads a `.csv` or `.json` file with every cell read as text.
pub fn load_records(path: &Path) -> Result<RecordSet> {
    let format = UploadFormat::from_path(path)?;
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let records = match format {
        UploadFormat::Csv => parse_csv(&decode_text(&bytes)),
        UploadFormat::Json => parse_json(&decode_text(&bytes)),
    }
    .with_context(|| format!("Error reading file {}", path.display()))?;

    info!(
        "📄 Loaded {} rows with {} columns from {}",
        records.len(),
        records.columns().len(),
        path.display()
    );
    Ok(records)
}

/// UTF-8 first; anything else is read as ISO-8859-1, where every byte is
/// the code point of the same value.
fn decode_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.trim_start_matches('\u{feff}').to_string(),
        Err(_) => {
            debug!("Input is not valid UTF-8; decoding as ISO-8859-1");
            bytes.iter().map(|&b| b as char).collect()
        }
    }
}

fn parse_csv(text: &str) -> Result<RecordSet> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers: Vec<String> = reader
        .headers()
        .context("Failed to read CSV header row")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut records = RecordSet::new(headers);
    for (line, row) in reader.records().enumerate() {
        let row = row.with_context(|| format!("Malformed CSV record at data row {}", line + 1))?;
        records.push_row(row.iter().map(str::to_string).collect());
    }
    Ok(records)
}

/// Accepts an array of objects or a column map of `{column: {row: value}}`.
fn parse_json(text: &str) -> Result<RecordSet> {
    let value: Value = serde_json::from_str(text).context("Invalid JSON")?;
    match value {
        Value::Array(items) => records_from_objects(items),
        Value::Object(columns) => records_from_column_map(columns),
        _ => Err(anyhow!("Expected a JSON array of records or an object of columns")),
    }
}

fn records_from_objects(items: Vec<Value>) -> Result<RecordSet> {
    let mut columns: Vec<String> = Vec::new();
    for item in &items {
        let object = item
            .as_object()
            .ok_or_else(|| anyhow!("Expected every JSON record to be an object"))?;
        for key in object.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }

    let mut records = RecordSet::new(columns.clone());
    for item in &items {
        let row = columns
            .iter()
            .map(|c| item.get(c).map(cell_text).unwrap_or_default())
            .collect();
        records.push_row(row);
    }
    Ok(records)
}

fn records_from_column_map(columns: serde_json::Map<String, Value>) -> Result<RecordSet> {
    let mut row_keys: Vec<String> = Vec::new();
    for (name, cells) in &columns {
        let cells = cells
            .as_object()
            .ok_or_else(|| anyhow!("Column '{}' is not an object of row values", name))?;
        for key in cells.keys() {
            if !row_keys.contains(key) {
                row_keys.push(key.clone());
            }
        }
    }
    row_keys.sort_by(|a, b| match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        _ => a.cmp(b),
    });

    let mut records = RecordSet::new(columns.keys().cloned());
    for key in &row_keys {
        let row = columns
            .values()
            .map(|cells| cells.get(key).map(cell_text).unwrap_or_default())
            .collect();
        records.push_row(row);
    }
    Ok(records)
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => {
            warn!("Flattening nested JSON value into text: {}", other);
            other.to_string()
        }
    }
}

/// Writes `records` as CSV with a header row.
pub fn write_csv(records: &RecordSet, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    writer
        .write_record(records.columns())
        .context("Failed to write CSV header")?;
    for row in records.rows() {
        writer.write_record(row).context("Failed to write CSV row")?;
    }
    writer.flush().context("Failed to flush CSV output")?;
    info!("💾 Wrote {} rows to {}", records.len(), path.display());
    Ok(())
}
