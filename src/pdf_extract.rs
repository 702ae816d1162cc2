// src/pdf_extract.rs

use crate::config::{Config, ExtractionSection};
use crate::ocr;
use lopdf::Document;
use std::any::Any;
use std::panic;
use std::path::Path;
use tracing::{info, warn};

/// Result of attempting to extract text from a PDF.
#[derive(Debug)]
pub enum PdfContent {
    /// The PDF contains extractable text.
    Text(String),
    /// The PDF appears to be scanned / image-only — needs OCR.
    ScannedImage,
    /// Something went wrong during extraction.
    Error(String),
}

/// Takes raw PDF bytes and returns `PdfContent`.
pub fn extract_text_from_pdf(pdf_bytes: &[u8], cfg: &ExtractionSection) -> PdfContent {
    // --- Phase 1: structural check with lopdf ---
    let doc = match Document::load_mem(pdf_bytes) {
        Ok(d) => d,
        Err(e) => return PdfContent::Error(format!("Failed to parse PDF: {e}")),
    };

    if looks_like_scanned(&doc, cfg.scanned_page_ratio) {
        info!("PDF structural check: likely scanned / image-only");
        return PdfContent::ScannedImage;
    }

    // --- Phase 2: attempt full text extraction ---
    // pdf-extract panics on some malformed fonts and encodings.
    let extracted = match panic::catch_unwind(|| pdf_extract::extract_text_from_mem(pdf_bytes)) {
        Ok(result) => result,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            warn!(error = %message, "pdf-extract panicked");
            return PdfContent::Error(format!("pdf-extract panicked: {message}"));
        }
    };

    match extracted {
        Ok(text) => {
            let meaningful = text.chars().filter(|c| !c.is_whitespace()).count();
            if meaningful < cfg.min_text_chars {
                info!(chars = meaningful, "Extracted text too short — treating as scanned");
                PdfContent::ScannedImage
            } else {
                info!(chars = meaningful, "Text extracted successfully");
                PdfContent::Text(text)
            }
        }
        Err(e) => {
            warn!(error = %e, "pdf-extract failed — may be scanned or corrupted");
            PdfContent::ScannedImage
        }
    }
}

/// Text of a panic payload, for the common `&str` and `String` cases.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

/// Heuristic: a page with XObject images but no Font resources is a
/// scanned page. The PDF is scanned once `threshold` of its pages are.
fn looks_like_scanned(doc: &Document, threshold: f64) -> bool {
    let pages = doc.get_pages();
    if pages.is_empty() {
        return false; // Can't tell — let text extraction try
    }

    let mut image_only_pages = 0;

    for object_id in pages.values() {
        let Ok(page_obj) = doc.get_object(*object_id) else {
            continue;
        };
        let Ok(page_dict) = page_obj.as_dict() else {
            continue;
        };

        let resources = page_dict
            .get(b"Resources")
            .ok()
            .and_then(|r| doc.dereference(r).ok())
            .and_then(|(_, resolved)| resolved.as_dict().ok());

        let has_entries = |key: &[u8]| {
            resources
                .and_then(|res| res.get(key).ok())
                .and_then(|v| doc.dereference(v).ok())
                .and_then(|(_, resolved)| resolved.as_dict().ok())
                .is_some_and(|dict| !dict.is_empty())
        };

        if has_entries(b"XObject") && !has_entries(b"Font") {
            image_only_pages += 1;
        }
    }

    let total = pages.len();
    let ratio = image_only_pages as f64 / total as f64;
    info!(
        total_pages = total,
        image_only = image_only_pages,
        ratio = format!("{ratio:.2}"),
        "Scanned-page analysis"
    );

    ratio >= threshold
}

/// How a document's text was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// Digital text layer, or a pre-extracted `.txt` document.
    Text,
    /// Recognized by the external OCR tools.
    Ocr,
    /// Image-only and not recognized.
    Scanned,
    Error,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Ocr => "ocr",
            Self::Scanned => "scanned",
            Self::Error => "error",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "text" => Some(Self::Text),
            "ocr" => Some(Self::Ocr),
            "scanned" => Some(Self::Scanned),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    /// Whether the acquired text is worth handing to the field extractor.
    pub fn is_usable(&self) -> bool {
        matches!(self, Self::Text | Self::Ocr)
    }
}

/// Text acquired for one document. An empty `text` means acquisition failed;
/// `note` then says why.
#[derive(Debug, Clone)]
pub struct Acquired {
    pub text: String,
    pub kind: ContentKind,
    pub note: Option<String>,
}

impl Acquired {
    pub fn failed(kind: ContentKind, note: impl Into<String>) -> Self {
        Self {
            text: String::new(),
            kind,
            note: Some(note.into()),
        }
    }
}

/// Acquire the text of one document. `.txt` files are taken as already
/// extracted text; anything else is parsed as a PDF, with OCR as the
/// fallback for scanned pages when enabled. Never fails.
pub fn acquire_text(path: &Path, bytes: &[u8], cfg: &Config) -> Acquired {
    let is_text_file = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("txt"));

    if is_text_file {
        let text = String::from_utf8_lossy(bytes).into_owned();
        if text.trim().is_empty() {
            return Acquired::failed(ContentKind::Error, "empty text document");
        }
        return Acquired {
            text,
            kind: ContentKind::Text,
            note: None,
        };
    }

    match extract_text_from_pdf(bytes, &cfg.extraction) {
        PdfContent::Text(text) => Acquired {
            text,
            kind: ContentKind::Text,
            note: None,
        },
        PdfContent::ScannedImage if cfg.ocr.enabled => match ocr::ocr_pdf(path, &cfg.ocr) {
            Ok(text) if !text.trim().is_empty() => Acquired {
                text,
                kind: ContentKind::Ocr,
                note: None,
            },
            Ok(_) => Acquired::failed(ContentKind::Scanned, "OCR produced no text"),
            Err(e) => {
                warn!(error = %e, "OCR failed");
                Acquired::failed(ContentKind::Scanned, format!("OCR failed: {e}"))
            }
        },
        PdfContent::ScannedImage => {
            Acquired::failed(ContentKind::Scanned, "scanned document and OCR is disabled")
        }
        PdfContent::Error(e) => Acquired::failed(ContentKind::Error, e),
    }
}
