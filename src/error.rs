use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VerifyError {
    /// The master sheet lacks one or more columns the reconciliation needs.
    #[error("master sheet must contain column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("unsupported master record file: {0}")]
    UnsupportedMaster(PathBuf),

    #[error("unsupported report format: {0}")]
    UnsupportedReport(PathBuf),

    #[error("master sheet has no worksheets: {0}")]
    EmptyWorkbook(PathBuf),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("xlsx write error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("document cache error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("config parse error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, VerifyError>;
