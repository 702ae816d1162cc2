// OCR fallback for scanned PDFs: render pages with `pdftoppm`, recognize
// each page image with `tesseract`. Both tools must be on PATH.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Output};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::OcrSection;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("failed to run {tool}: {source}")]
    Spawn {
        tool: &'static str,
        source: io::Error,
    },

    #[error("{tool} exited with {status}: {stderr}")]
    Failed {
        tool: &'static str,
        status: ExitStatus,
        stderr: String,
    },

    #[error("pdftoppm produced no page images")]
    NoPages,

    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Recognize every page of the PDF at `path`; pages are joined with newlines.
pub fn ocr_pdf(path: &Path, cfg: &OcrSection) -> Result<String, OcrError> {
    let workdir = tempfile::tempdir()?;
    let prefix = workdir.path().join("page");

    run(
        "pdftoppm",
        Command::new("pdftoppm")
            .arg("-r")
            .arg(cfg.dpi.to_string())
            .arg("-png")
            .arg(path)
            .arg(&prefix),
    )?;

    // pdftoppm zero-pads page numbers, so name order is page order.
    let mut pages: Vec<PathBuf> = fs::read_dir(workdir.path())?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|e| e == "png"))
        .collect();
    pages.sort();
    if pages.is_empty() {
        return Err(OcrError::NoPages);
    }

    let mut texts = Vec::with_capacity(pages.len());
    for page in &pages {
        let out = run(
            "tesseract",
            Command::new("tesseract")
                .arg(page)
                .arg("stdout")
                .arg("-l")
                .arg(&cfg.language),
        )?;
        let text = String::from_utf8_lossy(&out.stdout).into_owned();
        debug!(page = %page.display(), chars = text.len(), "Page recognized");
        texts.push(text);
    }

    info!(pages = pages.len(), language = %cfg.language, "OCR complete");
    Ok(texts.join("\n"))
}

fn run(tool: &'static str, cmd: &mut Command) -> Result<Output, OcrError> {
    let out = cmd.output().map_err(|source| OcrError::Spawn { tool, source })?;
    if !out.status.success() {
        return Err(OcrError::Failed {
            tool,
            status: out.status,
            stderr: String::from_utf8_lossy(&out.stderr).trim().to_string(),
        });
    }
    Ok(out)
}
