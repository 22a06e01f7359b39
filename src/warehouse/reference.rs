// src/warehouse/reference.rs - Loads the customer registry and submitting organizations
use anyhow::{Context, Result};
use log::info;
use std::time::Instant;
use tokio_postgres::Row;

use super::WarehouseClient;
use crate::models::{RecordSet, ReferenceRecord};

const REFERENCE_QUERY: &str = r#"
    SELECT
        p."CompanyName" AS name,
        p."ShipAddr1" AS address,
        p."ShipState" AS state,
        p."ShipZip" AS zip,
        p."ShipCity" AS city,
        concat_ws(', ', p."Email", p."PaymentNotificationEmail",
                  p."AdditionalBillingEmail", p."CustInvoiceEmail") AS emails,
        string_agg(NULLIF(concat_ws(' ', d."FirstName", d."LastName"), ''), ', ') AS doctors,
        p."PracticeId"::TEXT AS matched_entity_id
    FROM netsuite.customer_practices p
    LEFT OUTER JOIN netsuite.customer_doctors d ON p."PracticeId" = d."ParentID"
    GROUP BY p."PracticeId", p."CompanyName", p."ShipAddr1", p."ShipState", p."ShipZip",
             p."ShipCity", p."Email", p."PaymentNotificationEmail",
             p."AdditionalBillingEmail", p."CustInvoiceEmail"
    ORDER BY p."PracticeId"
"#;

const SOURCE_ORGANIZATIONS_QUERY: &str =
    r#"SELECT "CompanyName", "DSOId"::TEXT FROM netsuite.customer_dso ORDER BY "CompanyName""#;

fn text(row: &Row, column: &str) -> String {
    row.get::<_, Option<String>>(column).unwrap_or_default()
}

fn reference_from_row(row: &Row) -> ReferenceRecord {
    ReferenceRecord {
        name: text(row, "name"),
        address: text(row, "address"),
        state: text(row, "state"),
        zip: text(row, "zip"),
        city: text(row, "city"),
        emails: text(row, "emails"),
        doctors: text(row, "doctors"),
        matched_entity_id: text(row, "matched_entity_id"),
    }
}

/// Display label used when choosing which organization submitted an upload.
pub fn source_organization_label(company_name: &str, dso_id: &str) -> String {
    format!("{} | {}", company_name, dso_id)
}

impl WarehouseClient {
    /// Practices left-joined to their doctors, one record per practice.
    pub async fn fetch_reference_records(&self) -> Result<RecordSet> {
        let start = Instant::now();
        let conn = self.conn("reference records").await?;
        let rows = conn
            .query(REFERENCE_QUERY, &[])
            .await
            .context("Warehouse: Query customer practices")?;

        let records: RecordSet = rows.iter().map(reference_from_row).collect();
        info!(
            "Warehouse: loaded {} reference records in {:.2?}",
            records.len(),
            start.elapsed()
        );
        Ok(records)
    }

    pub async fn list_source_organizations(&self) -> Result<Vec<String>> {
        let conn = self.conn("source organizations").await?;
        let rows = conn
            .query(SOURCE_ORGANIZATIONS_QUERY, &[])
            .await
            .context("Warehouse: Query DSO list")?;

        Ok(rows
            .iter()
            .map(|row| {
                let name: Option<String> = row.get(0);
                let id: Option<String> = row.get(1);
                source_organization_label(&name.unwrap_or_default(), &id.unwrap_or_default())
            })
            .collect())
    }
}
