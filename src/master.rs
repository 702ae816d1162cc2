// Master record source: the authoritative chassis / customer sheet.

use calamine::{Data, Reader, open_workbook_auto};
use std::path::Path;
use tracing::{info, warn};

use crate::error::{Result, VerifyError};

pub const CHASSIS_COLUMN: &str = "Chassis number";
pub const NAME_COLUMN: &str = "Customer Name";

/// One row of the master sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasterRecord {
    /// 1-based data row (header excluded), for log context.
    pub row: usize,
    pub chassis_number: String,
    pub customer_name: String,
}

/// Load master records from a CSV file or a spreadsheet workbook (first sheet).
pub fn load_master(path: &Path) -> Result<Vec<MasterRecord>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let (headers, rows) = match ext.as_str() {
        "csv" => read_csv(path)?,
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => read_workbook(path)?,
        _ => return Err(VerifyError::UnsupportedMaster(path.to_path_buf())),
    };

    let records = records_from_table(&headers, rows)?;
    info!(path = %path.display(), records = records.len(), "Loaded master records");
    Ok(records)
}

fn read_csv(path: &Path) -> Result<(Vec<String>, Vec<Vec<String>>)> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers = reader.headers()?.iter().map(str::to_string).collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        rows.push(record?.iter().map(str::to_string).collect());
    }
    Ok((headers, rows))
}

fn read_workbook(path: &Path) -> Result<(Vec<String>, Vec<Vec<String>>)> {
    let mut workbook = open_workbook_auto(path)?;
    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| VerifyError::EmptyWorkbook(path.to_path_buf()))?;
    let range = workbook.worksheet_range(&sheet)?;

    let mut rows = range.rows().map(|row| row.iter().map(cell_text).collect::<Vec<_>>());
    let headers = rows.next().unwrap_or_default();
    Ok((headers, rows.collect()))
}

/// Spreadsheet cells arrive typed; the reconciliation works on text.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        // Whole numbers are stored as floats; drop the trailing ".0".
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        other => other.to_string(),
    }
}

/// Resolve the required columns (header names compared after trimming) and
/// build records. Rows with neither a chassis number nor a name are skipped.
pub fn records_from_table(headers: &[String], rows: Vec<Vec<String>>) -> Result<Vec<MasterRecord>> {
    let position = |name: &str| headers.iter().position(|h| h.trim() == name);

    let (Some(chassis_idx), Some(name_idx)) = (position(CHASSIS_COLUMN), position(NAME_COLUMN))
    else {
        let missing = [CHASSIS_COLUMN, NAME_COLUMN]
            .into_iter()
            .filter(|col| position(col).is_none())
            .map(str::to_string)
            .collect();
        return Err(VerifyError::MissingColumns(missing));
    };

    let mut records = Vec::with_capacity(rows.len());
    for (i, row) in rows.into_iter().enumerate() {
        let cell = |idx: usize| row.get(idx).map(|v| v.trim().to_string()).unwrap_or_default();
        let chassis_number = cell(chassis_idx);
        let customer_name = cell(name_idx);
        if chassis_number.is_empty() && customer_name.is_empty() {
            continue;
        }
        if chassis_number.is_empty() {
            warn!(row = i + 1, "Master row has no chassis number");
        }
        records.push(MasterRecord {
            row: i + 1,
            chassis_number,
            customer_name,
        });
    }
    Ok(records)
}
