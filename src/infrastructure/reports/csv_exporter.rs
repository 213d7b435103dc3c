use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::domain::closure::{ClosureError, FiscalClosure, ReportArtifacts, ReportExporter};
use crate::domain::document::Document;

const LEDGER_HEADER: &[&str] = &[
  "number",
  "issue_date",
  "issuer_tax_id",
  "class_code",
  "taxable_base",
  "tax_total",
  "surcharge_total",
  "withholding",
  "grand_total",
  "chain_position",
  "fingerprint",
  "sent_at",
];

const VAT_SUMMARY_HEADER: &[&str] = &[
  "vat_percentage",
  "surcharge_percentage",
  "line_count",
  "taxable_base",
  "vat_amount",
  "surcharge_amount",
];

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct VatBucket {
  line_count: u64,
  taxable_base: Decimal,
  vat_amount: Decimal,
  surcharge_amount: Decimal,
}

fn csv_error(e: impl std::fmt::Display) -> ClosureError {
  ClosureError::ReportExport(format!("CSV write error: {}", e))
}

/// Invoice ledger of a closed year, one row per invoice in chain order.
pub fn render_ledger(invoices: &[Document]) -> Result<Vec<u8>, ClosureError> {
  let mut sorted: Vec<&Document> = invoices.iter().collect();
  sorted.sort_by_key(|invoice| invoice.seal.as_ref().map(|seal| seal.chain_position));

  let mut csv = csv::WriterBuilder::new()
    .terminator(csv::Terminator::Any(b'\n'))
    .from_writer(Vec::new());
  csv.write_record(LEDGER_HEADER).map_err(csv_error)?;

  for invoice in sorted {
    let seal = invoice.seal.as_ref();
    csv
      .write_record([
        invoice.number.value().to_string(),
        invoice.issue_date.format("%Y-%m-%d").to_string(),
        invoice.issuer_tax_id.value().to_string(),
        seal.map(|s| s.class_code.clone()).unwrap_or_default(),
        format!("{:.2}", invoice.totals.taxable_base),
        format!("{:.2}", invoice.totals.tax_total),
        format!("{:.2}", invoice.totals.surcharge_total),
        format!("{:.2}", invoice.totals.withholding),
        format!("{:.2}", invoice.totals.grand_total),
        seal.map(|s| s.chain_position.to_string()).unwrap_or_default(),
        seal.map(|s| s.fingerprint.value().to_string()).unwrap_or_default(),
        invoice.sent_at.map(|at| at.to_rfc3339()).unwrap_or_default(),
      ])
      .map_err(csv_error)?;
  }

  csv.into_inner().map_err(csv_error)
}

/// Line amounts grouped by (VAT %, surcharge %), lowest rate first.
pub fn render_vat_summary(invoices: &[Document]) -> Result<Vec<u8>, ClosureError> {
  let mut buckets: BTreeMap<(Decimal, Decimal), VatBucket> = BTreeMap::new();
  for line in invoices.iter().flat_map(|invoice| invoice.lines.iter()) {
    let key = (
      line.tax.vat_percentage.value(),
      line.tax.surcharge_or_zero().value(),
    );
    let bucket = buckets.entry(key).or_default();
    bucket.line_count += 1;
    bucket.taxable_base += line.amounts.taxable_base;
    bucket.vat_amount += line.amounts.tax_amount;
    bucket.surcharge_amount += line.amounts.surcharge_amount;
  }

  let mut csv = csv::WriterBuilder::new()
    .terminator(csv::Terminator::Any(b'\n'))
    .from_writer(Vec::new());
  csv.write_record(VAT_SUMMARY_HEADER).map_err(csv_error)?;

  for ((vat, surcharge), bucket) in &buckets {
    csv
      .write_record([
        format!("{:.2}", vat),
        format!("{:.2}", surcharge),
        bucket.line_count.to_string(),
        format!("{:.2}", bucket.taxable_base),
        format!("{:.2}", bucket.vat_amount),
        format!("{:.2}", bucket.surcharge_amount),
      ])
      .map_err(csv_error)?;
  }

  csv.into_inner().map_err(csv_error)
}

/// Writes closure reports under `<output_dir>/<tenant_id>/`.
pub struct CsvReportExporter {
  output_dir: PathBuf,
}

impl CsvReportExporter {
  pub fn new(output_dir: impl Into<PathBuf>) -> Self {
    Self {
      output_dir: output_dir.into(),
    }
  }
}

#[async_trait]
impl ReportExporter for CsvReportExporter {
  async fn export(
    &self,
    closure: &FiscalClosure,
    invoices: &[Document],
  ) -> Result<ReportArtifacts, ClosureError> {
    let dir = self.output_dir.join(closure.tenant_id.to_string());
    tokio::fs::create_dir_all(&dir)
      .await
      .map_err(|e| ClosureError::ReportExport(format!("Cannot create {}: {}", dir.display(), e)))?;

    let prefix = format!("{}-{}", closure.fiscal_year, closure.sequence);
    let ledger_path = dir.join(format!("{}-ledger.csv", prefix));
    let vat_summary_path = dir.join(format!("{}-vat-summary.csv", prefix));

    for (path, contents) in [
      (&ledger_path, render_ledger(invoices)?),
      (&vat_summary_path, render_vat_summary(invoices)?),
    ] {
      tokio::fs::write(path, contents)
        .await
        .map_err(|e| ClosureError::ReportExport(format!("Cannot write {}: {}", path.display(), e)))?;
    }

    tracing::debug!(
      closure_id = %closure.id,
      ledger = %ledger_path.display(),
      vat_summary = %vat_summary_path.display(),
      "Closure reports written"
    );

    Ok(ReportArtifacts {
      ledger_path: ledger_path.to_string_lossy().into_owned(),
      vat_summary_path: vat_summary_path.to_string_lossy().into_owned(),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::closure::ClosureTotals;
  use crate::domain::document::{
    DocumentHeader, DocumentNumber, DocumentType, LineDescription, PricedLine, Quantity, UnitPrice,
  };
  use crate::domain::integrity::Fingerprint;
  use crate::domain::tax::{Percentage, TaxRateSnapshot};
  use crate::domain::tenant::TaxId;
  use chrono::NaiveDate;
  use rust_decimal_macros::dec;
  use uuid::Uuid;

  fn line(price: Decimal, vat: Decimal, surcharge: Option<Decimal>) -> PricedLine {
    PricedLine {
      description: LineDescription::new("Consulting").unwrap(),
      quantity: Quantity::new(dec!(1)).unwrap(),
      unit_price: UnitPrice::new(price).unwrap(),
      discount: Percentage::zero(),
      tax: TaxRateSnapshot {
        tax_rate_id: Uuid::new_v4(),
        vat_percentage: Percentage::new(vat).unwrap(),
        surcharge_percentage: surcharge.map(|s| Percentage::new(s).unwrap()),
      },
    }
  }

  fn invoice(number: &str, lines: Vec<PricedLine>) -> Document {
    Document::new(
      DocumentHeader {
        tenant_id: Uuid::new_v4(),
        series_id: Uuid::new_v4(),
        customer_id: Uuid::new_v4(),
        document_type: DocumentType::Invoice,
        sequence_number: 1,
        number: DocumentNumber::new(number).unwrap(),
        issuer_tax_id: TaxId::new("B12345678").unwrap(),
        issue_date: NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
        rectifies: None,
      },
      lines,
      Percentage::zero(),
    )
    .unwrap()
  }

  #[test]
  fn test_vat_summary_groups_by_rate_pair() {
    let invoices = vec![
      invoice(
        "F-00001/2024",
        vec![line(dec!(100), dec!(21), None), line(dec!(50), dec!(10), None)],
      ),
      invoice(
        "F-00002/2024",
        vec![line(dec!(200), dec!(21), None), line(dec!(10), dec!(21), Some(dec!(5.2)))],
      ),
    ];

    let summary = String::from_utf8(render_vat_summary(&invoices).unwrap()).unwrap();
    let rows: Vec<&str> = summary.lines().collect();

    assert_eq!(rows.len(), 4);
    assert_eq!(rows[1], "10.00,0.00,1,50.00,5.00,0.00");
    assert_eq!(rows[2], "21.00,0.00,2,300.00,63.00,0.00");
    assert_eq!(rows[3], "21.00,5.20,1,10.00,2.10,0.52");
  }

  #[test]
  fn test_ledger_has_one_row_per_invoice() {
    let invoices = vec![
      invoice("F-00001/2024", vec![line(dec!(100), dec!(21), None)]),
      invoice("F-00002/2024", vec![line(dec!(10), dec!(21), None)]),
    ];

    let ledger = String::from_utf8(render_ledger(&invoices).unwrap()).unwrap();
    assert_eq!(ledger.lines().count(), 3);
    assert!(ledger.starts_with("number,issue_date,issuer_tax_id"));
    assert!(ledger.contains("F-00001/2024,2024-03-10,B12345678,,100.00,21.00,0.00,0.00,121.00"));
  }

  #[tokio::test]
  async fn test_export_writes_both_files() {
    let dir = tempfile::tempdir().unwrap();
    let exporter = CsvReportExporter::new(dir.path());
    let invoices = vec![invoice("F-00001/2024", vec![line(dec!(100), dec!(21), None)])];
    let mut closure = FiscalClosure::new(
      invoices[0].tenant_id,
      2024,
      ClosureTotals::from_documents(&invoices),
      Fingerprint::digest("closure"),
      None,
      Uuid::new_v4(),
    );
    closure.sequence = 7;

    let artifacts = exporter.export(&closure, &invoices).await.unwrap();

    assert!(artifacts.ledger_path.ends_with("2024-7-ledger.csv"));
    assert!(artifacts.vat_summary_path.ends_with("2024-7-vat-summary.csv"));
    let ledger = std::fs::read_to_string(&artifacts.ledger_path).unwrap();
    assert!(ledger.contains("F-00001/2024"));
    assert!(std::path::Path::new(&artifacts.vat_summary_path).exists());
  }
}
