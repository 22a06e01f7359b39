// src/warehouse/sink.rs - Writes resolved batches into dso_recon.matched_data
use anyhow::{Context, Result};
use chrono::{NaiveDateTime, Utc};
use log::{info, warn};
use serde::Serialize;
use tokio_postgres::types::ToSql;

use super::WarehouseClient;
use crate::ingest::column_mapping::UPLOAD_DATE_FORMAT;
use crate::models::columns;
use crate::models::RecordSet;

const INSERT_MATCHED_DATA: &str = r#"
    INSERT INTO dso_recon.matched_data (
        "MatchedName", "MatchedEmails", "MatchedAddress", "MatchedDoctors", "Total_Score",
        "Name", "Address", "State", "Zip", "Emails", "Doctors", "ExternalID",
        "Source", "MatchedEntityID", "MatchedPracticeName", "UploadedDate", "FileName"
    )
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
"#;

/// One row of `dso_recon.matched_data`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct MatchedDataRow {
    pub matched_name: f64,
    pub matched_emails: f64,
    pub matched_address: f64,
    pub matched_doctors: f64,
    #[serde(rename = "Total_Score")]
    pub total_score: f64,
    pub name: String,
    pub address: String,
    pub state: String,
    pub zip: String,
    pub emails: String,
    pub doctors: String,
    #[serde(rename = "ExternalID")]
    pub external_id: String,
    pub source: String,
    #[serde(rename = "MatchedEntityID")]
    pub matched_entity_id: String,
    pub matched_practice_name: String,
    pub uploaded_date: NaiveDateTime,
    pub file_name: String,
}

impl MatchedDataRow {
    /// Builds one insert row per output row. Absent text columns read as
    /// empty and absent or non-numeric scores as 0.
    pub fn from_table(table: &RecordSet) -> Vec<MatchedDataRow> {
        let now = Utc::now().naive_utc();
        let cell = |row: usize, name: &str| table.get(row, name).unwrap_or("").to_string();
        let mut bad_scores = 0usize;
        let mut score = |row: usize, names: &[&str]| -> f64 {
            let text = names
                .iter()
                .find_map(|name| table.get(row, name))
                .unwrap_or("");
            match text.trim() {
                "" => 0.0,
                s => s.parse::<f64>().unwrap_or_else(|_| {
                    bad_scores += 1;
                    0.0
                }),
            }
        };

        let rows: Vec<MatchedDataRow> = (0..table.len())
            .map(|row| {
                let uploaded_date = table
                    .get(row, columns::UPLOADED_DATE)
                    .and_then(|d| NaiveDateTime::parse_from_str(d.trim(), UPLOAD_DATE_FORMAT).ok())
                    .unwrap_or(now);

                MatchedDataRow {
                    matched_name: score(row, &[columns::MATCHED_NAME]),
                    matched_emails: score(row, &[columns::MATCHED_EMAILS]),
                    matched_address: score(row, &[columns::MATCHED_ADDRESS]),
                    matched_doctors: score(row, &[columns::MATCHED_DOCTORS]),
                    total_score: score(row, &[columns::TOTAL_SCORE, "Total_Score"]),
                    name: cell(row, columns::NAME),
                    address: cell(row, columns::ADDRESS),
                    state: cell(row, columns::STATE),
                    zip: cell(row, columns::ZIP),
                    emails: cell(row, columns::EMAILS),
                    doctors: cell(row, columns::DOCTORS),
                    external_id: cell(row, columns::SOURCE_ID),
                    source: cell(row, columns::SOURCE),
                    matched_entity_id: cell(row, columns::MATCHED_ENTITY_ID),
                    matched_practice_name: cell(row, columns::MATCHED_PRACTICE_NAME),
                    uploaded_date,
                    file_name: cell(row, columns::FILE_NAME),
                }
            })
            .collect();

        if bad_scores > 0 {
            warn!("Warehouse: {} score cells were non-numeric; stored as 0", bad_scores);
        }
        rows
    }

    fn params(&self) -> [&(dyn ToSql + Sync); 17] {
        [
            &self.matched_name,
            &self.matched_emails,
            &self.matched_address,
            &self.matched_doctors,
            &self.total_score,
            &self.name,
            &self.address,
            &self.state,
            &self.zip,
            &self.emails,
            &self.doctors,
            &self.external_id,
            &self.source,
            &self.matched_entity_id,
            &self.matched_practice_name,
            &self.uploaded_date,
            &self.file_name,
        ]
    }
}

impl WarehouseClient {
    /// Inserts every output row in a single transaction. Nothing is written
    /// if any insert fails.
    pub async fn insert_matched_rows(&self, table: &RecordSet) -> Result<u64> {
        let rows = MatchedDataRow::from_table(table);
        if rows.is_empty() {
            info!("Warehouse: no rows to upload");
            return Ok(0);
        }

        let mut conn = self.conn("matched data upload").await?;
        let tx = conn.transaction().await.context("Warehouse: Start TX")?;
        let statement = tx
            .prepare(INSERT_MATCHED_DATA)
            .await
            .context("Warehouse: Prepare matched_data insert")?;

        let mut inserted = 0u64;
        for (idx, row) in rows.iter().enumerate() {
            inserted += tx
                .execute(&statement, &row.params())
                .await
                .with_context(|| format!("Warehouse: Insert row {} (ExternalID '{}')", idx + 1, row.external_id))?;
        }

        tx.commit().await.context("Warehouse: Commit matched_data TX")?;
        info!("Warehouse: uploaded {} rows to dso_recon.matched_data", inserted);
        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn output_table() -> RecordSet {
        let columns = [
            "SourceID", "Name", "State", "Source", "MatchedName", "MatchedEmails",
            "MatchedAddress", "TotalScore", "MatchedEntityID", "FileName", "UploadedDate",
        ];
        let rows = vec![
            vec!["S1", "Acme Dental", "CA", "Smile Group", "1.0", "1.0", "0.0", "3.0", "R1", "roster.csv", "2024-03-05 14:07:09"],
            vec!["S2", "Bright Smiles", "NY", "Smile Group", "0.0", "0.0", "0.0", "0.0", "", "roster.csv", "not a date"],
            vec!["S3", "Zenith", "TX", "Smile Group", "yes", "", "", "n/a", "", "roster.csv", ""],
        ];
        RecordSet::from_rows(
            columns,
            rows.into_iter().map(|r| r.into_iter().map(String::from).collect()),
        )
    }

    #[test]
    fn test_rows_map_output_columns() {
        let rows = MatchedDataRow::from_table(&output_table());

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].external_id, "S1");
        assert_eq!(rows[0].matched_entity_id, "R1");
        assert_eq!(rows[0].matched_name, 1.0);
        assert_eq!(rows[0].matched_emails, 1.0);
        assert_eq!(rows[0].matched_address, 0.0);
        assert_eq!(rows[0].matched_doctors, 0.0);
        assert_eq!(rows[0].total_score, 3.0);
        assert_eq!(rows[0].address, "");
        assert_eq!(
            rows[0].uploaded_date,
            NaiveDate::from_ymd_opt(2024, 3, 5).unwrap().and_hms_opt(14, 7, 9).unwrap()
        );
    }

    #[test]
    fn test_unparseable_values_fall_back() {
        let before = Utc::now().naive_utc();
        let rows = MatchedDataRow::from_table(&output_table());

        assert_eq!(rows[2].total_score, 0.0);
        assert_eq!(rows[2].matched_name, 0.0);
        assert!(rows[1].uploaded_date >= before);
        assert!(rows[2].uploaded_date >= before);
    }

    #[test]
    fn test_serialized_names_match_warehouse_columns() {
        let rows = MatchedDataRow::from_table(&output_table());
        let value = serde_json::to_value(&rows[0]).unwrap();

        assert_eq!(value["ExternalID"], "S1");
        assert_eq!(value["Total_Score"], 3.0);
        assert_eq!(value["MatchedName"], 1.0);
        assert_eq!(value["MatchedPracticeName"], "");
    }

    #[test]
    fn test_insert_binds_every_column() {
        let placeholders = INSERT_MATCHED_DATA.matches('$').count();
        let rows = MatchedDataRow::from_table(&output_table());
        assert_eq!(rows[0].params().len(), placeholders);
    }
}
