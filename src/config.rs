use serde::Deserialize;
use std::{fs, path::Path};
use tracing::info;

use crate::error::Result;
use crate::reconcile::DuplicatePolicy;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: String,
    #[serde(default)]
    pub extraction: ExtractionSection,
    #[serde(default)]
    pub ocr: OcrSection,
    #[serde(default)]
    pub join: JoinSection,
}

fn default_db_path() -> String {
    "cache/documents.db".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionSection {
    /// Fewer non-whitespace characters than this and the PDF counts as scanned.
    #[serde(default = "default_min_text_chars")]
    pub min_text_chars: usize,
    /// Share of image-only pages at which the whole PDF counts as scanned.
    #[serde(default = "default_scanned_page_ratio")]
    pub scanned_page_ratio: f64,
    /// Upper bound on documents acquired in parallel.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

fn default_min_text_chars() -> usize {
    20
}

fn default_scanned_page_ratio() -> f64 {
    0.8
}

fn default_concurrency() -> usize {
    4
}

impl Default for ExtractionSection {
    fn default() -> Self {
        Self {
            min_text_chars: default_min_text_chars(),
            scanned_page_ratio: default_scanned_page_ratio(),
            concurrency: default_concurrency(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OcrSection {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_dpi")]
    pub dpi: u32,
}

fn default_language() -> String {
    "eng".to_string()
}

fn default_dpi() -> u32 {
    300
}

impl Default for OcrSection {
    fn default() -> Self {
        Self {
            enabled: false,
            language: default_language(),
            dpi: default_dpi(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JoinSection {
    #[serde(default)]
    pub duplicate_policy: DuplicatePolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            extraction: ExtractionSection::default(),
            ocr: OcrSection::default(),
            join: JoinSection::default(),
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load the config file, falling back to defaults when it does not exist.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            info!(path = %path.display(), "Loading config");
            Self::load(path)
        } else {
            info!(path = %path.display(), "No config file, using defaults");
            Ok(Self::default())
        }
    }
}
