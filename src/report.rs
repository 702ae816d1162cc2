// Report assembly and the file sinks (csv / json / colored xlsx).

use rust_xlsxwriter::{Color, Format, FormatBorder, Workbook};
use serde::{Serialize, Serializer};
use std::path::Path;
use tracing::info;

use crate::decision::{Decision, ErrorCode};
use crate::error::{Result, VerifyError};
use crate::heuristics::VehicleNumber;
use crate::reconcile::Reconciled;

/// Column headers, in output order.
pub const HEADERS: [&str; 8] = [
    "Chassis number",
    "Customer name",
    "Registration date",
    "Vehicle Num",
    "Certificate Attached",
    "RTO status",
    "Specific Error",
    "Remarks",
];

/// Index of the "RTO status" column, the one the xlsx sink colors.
const STATUS_COLUMN: u16 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    #[serde(rename = "Chassis number")]
    pub chassis_number: String,
    #[serde(rename = "Customer name")]
    pub customer_name: String,
    #[serde(rename = "Registration date")]
    pub registration_date: Option<String>,
    #[serde(rename = "Vehicle Num")]
    pub vehicle_number: String,
    #[serde(rename = "Certificate Attached", serialize_with = "yes_no")]
    pub certificate_attached: bool,
    #[serde(rename = "RTO status")]
    pub decision: Decision,
    #[serde(rename = "Specific Error")]
    pub error_code: ErrorCode,
    #[serde(rename = "Remarks")]
    pub remark: String,
}

fn yes_no<S: Serializer>(value: &bool, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(if *value { "Yes" } else { "No" })
}

impl ReportRow {
    fn cells(&self) -> [String; 8] {
        [
            self.chassis_number.clone(),
            self.customer_name.clone(),
            self.registration_date.clone().unwrap_or_default(),
            self.vehicle_number.clone(),
            if self.certificate_attached { "Yes" } else { "No" }.to_string(),
            self.decision.to_string(),
            self.error_code.to_string(),
            self.remark.clone(),
        ]
    }
}

/// Build one output row per reconciled record, preserving order.
pub fn assemble(reconciled: &[Reconciled<'_>]) -> Vec<ReportRow> {
    reconciled
        .iter()
        .map(|r| ReportRow {
            chassis_number: r.record.chassis_number.clone(),
            customer_name: r.record.customer_name.clone(),
            registration_date: r.document.and_then(|d| d.resolved_date()).map(str::to_string),
            vehicle_number: r
                .document
                .map(|d| d.vehicle_number.to_string())
                .unwrap_or_else(|| VehicleNumber::NotFound.to_string()),
            certificate_attached: r.document.is_some_and(|d| d.is_joinable()),
            decision: r.verdict.decision,
            error_code: r.verdict.error_code,
            remark: r.verdict.remark.clone(),
        })
        .collect()
}

/// Decision counts for the run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub approve: usize,
    pub hold: usize,
    pub reject: usize,
    pub ineligible: usize,
}

impl Summary {
    pub fn from_rows(rows: &[ReportRow]) -> Self {
        let mut summary = Self::default();
        for row in rows {
            match row.decision {
                Decision::Approve => summary.approve += 1,
                Decision::Hold => summary.hold += 1,
                Decision::Reject => summary.reject += 1,
                Decision::Ineligible => summary.ineligible += 1,
            }
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.approve + self.hold + self.reject + self.ineligible
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Csv,
    Json,
    Xlsx,
}

impl ReportFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("csv") => Ok(Self::Csv),
            Some("json") => Ok(Self::Json),
            Some("xlsx") => Ok(Self::Xlsx),
            _ => Err(VerifyError::UnsupportedReport(path.to_path_buf())),
        }
    }
}

/// Write the report, picking the sink from the file extension.
pub fn write_report(rows: &[ReportRow], path: &Path) -> Result<()> {
    match ReportFormat::from_path(path)? {
        ReportFormat::Csv => write_csv(rows, path)?,
        ReportFormat::Json => std::fs::write(path, serde_json::to_string_pretty(rows)?)?,
        ReportFormat::Xlsx => write_xlsx(rows, path)?,
    }
    info!(path = %path.display(), rows = rows.len(), "Report written");
    Ok(())
}

fn write_csv(rows: &[ReportRow], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Fill color for the status cell: failures red, holds amber, approvals green.
pub fn status_color(decision: Decision) -> Color {
    match decision {
        Decision::Reject | Decision::Ineligible => Color::RGB(0xFFC7CE),
        Decision::Hold => Color::RGB(0xFFEB9C),
        Decision::Approve => Color::RGB(0xC6EFCE),
    }
}

fn write_xlsx(rows: &[ReportRow], path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Verification")?;

    let header = Format::new().set_bold().set_border_bottom(FormatBorder::Thin);
    for (col, title) in HEADERS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *title, &header)?;
    }

    for (i, row) in rows.iter().enumerate() {
        let r = (i + 1) as u32;
        for (col, value) in row.cells().iter().enumerate() {
            let col = col as u16;
            if col == STATUS_COLUMN {
                let fill = Format::new().set_background_color(status_color(row.decision));
                sheet.write_string_with_format(r, col, value, &fill)?;
            } else {
                sheet.write_string(r, col, value)?;
            }
        }
    }
    sheet.autofit();

    workbook.save(path)?;
    Ok(())
}
