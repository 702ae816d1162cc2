//! Batch driver: master sheet + document folder in, verdict rows out.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{info, info_span, warn};

use crate::config::Config;
use crate::document_store::{DocumentStore, StoredDocument};
use crate::error::Result;
use crate::heuristics::{ExtractedDocument, extract_document};
use crate::master::load_master;
use crate::pdf_extract::{Acquired, ContentKind, acquire_text};
use crate::reconcile::{DocumentIndex, reconcile};
use crate::report::{ReportRow, Summary, assemble, write_report};

const DOCUMENT_EXTENSIONS: [&str; 2] = ["pdf", "txt"];

/// A document that could not contribute to the reconciliation, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentNote {
    pub file: PathBuf,
    pub reason: String,
}

#[derive(Debug)]
pub struct RunOutcome {
    pub rows: Vec<ReportRow>,
    pub notes: Vec<DocumentNote>,
    pub summary: Summary,
}

/// Documents in `dir`, sorted by path so input order is stable across runs.
pub fn list_documents(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| DOCUMENT_EXTENSIONS.iter().any(|x| e.eq_ignore_ascii_case(x)))
        })
        .collect();
    paths.sort();
    Ok(paths)
}

struct PendingDocument {
    index: usize,
    path: PathBuf,
    hash: String,
}

/// Acquire text for every path, in input order. Cached text is reused;
/// everything else runs on the blocking pool, at most
/// `extraction.concurrency` documents at a time. Per-document failures,
/// including a panicking extractor or an unwritable cache, end up in that
/// document's `Acquired` and never fail the batch.
pub async fn acquire_documents(
    paths: &[PathBuf],
    cfg: &Config,
    store: &DocumentStore,
) -> Vec<Acquired> {
    let mut results: Vec<Option<Acquired>> = vec![None; paths.len()];
    let mut pending = Vec::new();

    for (index, path) in paths.iter().enumerate() {
        // Only the hash is kept here; the blocking task reads the file again.
        let hash = match fs::read(path) {
            Ok(bytes) => DocumentStore::hash_bytes(&bytes),
            Err(e) => {
                warn!(file = %path.display(), error = %e, "Cannot read document");
                results[index] = Some(unreadable(&e));
                continue;
            }
        };
        match store.get(&hash) {
            Ok(Some(cached)) => {
                if let Some(text) = cached.usable_text() {
                    info!(file = %path.display(), "Using cached text");
                    results[index] = Some(Acquired {
                        text: text.to_string(),
                        kind: ContentKind::parse(&cached.content_type)
                            .unwrap_or(ContentKind::Text),
                        note: None,
                    });
                    continue;
                }
            }
            Ok(None) => {}
            Err(e) => warn!(file = %path.display(), error = %e, "Cache lookup failed"),
        }
        pending.push(PendingDocument {
            index,
            path: path.clone(),
            hash,
        });
    }

    info!(
        total = paths.len(),
        to_acquire = pending.len(),
        "Acquiring document text"
    );

    let cfg = Arc::new(cfg.clone());
    let batch = cfg.extraction.concurrency.max(1);
    let mut pending = pending.into_iter().peekable();
    while pending.peek().is_some() {
        let jobs: Vec<PendingDocument> = pending.by_ref().take(batch).collect();
        let mut tasks = JoinSet::new();
        for (slot, job) in jobs.iter().enumerate() {
            let cfg = Arc::clone(&cfg);
            let path = job.path.clone();
            tasks.spawn_blocking(move || {
                let span = info_span!("acquire", file = %path.display());
                let _guard = span.enter();
                let acquired = match fs::read(&path) {
                    Ok(bytes) => acquire_text(&path, &bytes, &cfg),
                    Err(e) => unreadable(&e),
                };
                (slot, acquired)
            });
        }

        let mut done: Vec<Option<Acquired>> = vec![None; jobs.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((slot, acquired)) => done[slot] = Some(acquired),
                Err(e) => warn!(error = %e, "Acquisition task failed"),
            }
        }

        for (job, acquired) in jobs.into_iter().zip(done) {
            let acquired = acquired.unwrap_or_else(|| {
                Acquired::failed(ContentKind::Error, "text acquisition task failed")
            });
            let entry = StoredDocument {
                hash: job.hash,
                filename: file_name(&job.path),
                content_type: acquired.kind.as_str().to_string(),
                extracted_text: acquired.kind.is_usable().then(|| acquired.text.clone()),
            };
            if let Err(e) = store.upsert(&entry) {
                warn!(file = %job.path.display(), error = %e, "Cannot cache document text");
            }
            results[job.index] = Some(acquired);
        }
    }

    results
        .into_iter()
        .map(|r| r.unwrap_or_else(|| Acquired::failed(ContentKind::Error, "not acquired")))
        .collect()
}

fn unreadable(e: &std::io::Error) -> Acquired {
    Acquired::failed(ContentKind::Error, format!("cannot read file: {e}"))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Acquire and extract a single document.
pub async fn extract_single(path: &Path, cfg: &Config) -> Result<(Acquired, ExtractedDocument)> {
    let bytes = fs::read(path)?;
    let owned_path = path.to_path_buf();
    let cfg = cfg.clone();
    let acquired =
        tokio::task::spawn_blocking(move || acquire_text(&owned_path, &bytes, &cfg)).await?;
    let document = extract_document(&acquired.text);
    Ok((acquired, document))
}

/// Full verification run. The master sheet is loaded and validated before
/// any document is touched; per-document problems become notes.
pub async fn run(
    cfg: &Config,
    master_path: &Path,
    documents_dir: &Path,
    output: Option<&Path>,
) -> Result<RunOutcome> {
    let records = load_master(master_path)?;

    let db_path = Path::new(&cfg.db_path);
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let store = DocumentStore::new(db_path)?;

    let paths = list_documents(documents_dir)?;
    let acquired = acquire_documents(&paths, cfg, &store).await;

    let mut notes = Vec::new();
    let mut documents = Vec::new();
    let mut sources = Vec::new();
    for (path, acq) in paths.iter().zip(acquired) {
        let span = info_span!("document", file = %path.display());
        let _guard = span.enter();

        if let Some(note) = acq.note {
            warn!(kind = acq.kind.as_str(), note = %note, "Document text unavailable");
            notes.push(DocumentNote {
                file: path.clone(),
                reason: note,
            });
        }

        let doc = extract_document(&acq.text);
        let (filled, total) = doc.coverage();
        info!(
            filled,
            total,
            chassis = ?doc.chassis_number,
            vehicle = %doc.vehicle_number,
            registration = ?doc.registration_type,
            name = ?doc.customer_name,
            "Extraction result"
        );

        if !doc.is_joinable() {
            if acq.kind.is_usable() {
                warn!("No chassis number found");
                notes.push(DocumentNote {
                    file: path.clone(),
                    reason: "no chassis number found".to_string(),
                });
            }
            continue;
        }
        documents.push(doc);
        sources.push(path.clone());
    }

    let index = DocumentIndex::build(&documents, cfg.join.duplicate_policy);
    if index.is_empty() && !records.is_empty() {
        warn!("No document carries a usable chassis number; every record will be ineligible");
    }
    for (doc, file) in documents.iter().zip(&sources) {
        let superseded = doc
            .chassis_number
            .as_deref()
            .and_then(|c| index.get(c))
            .is_some_and(|chosen| !std::ptr::eq(chosen, doc));
        if superseded {
            notes.push(DocumentNote {
                file: file.clone(),
                reason: format!(
                    "duplicate chassis id, another document was used ({:?} wins)",
                    cfg.join.duplicate_policy
                ),
            });
        }
    }

    let reconciled = reconcile(&records, &index);
    let rows = assemble(&reconciled);
    let summary = Summary::from_rows(&rows);

    info!(
        records = records.len(),
        documents = paths.len(),
        joinable = index.len(),
        duplicates = index.duplicates.len(),
        approve = summary.approve,
        hold = summary.hold,
        reject = summary.reject,
        ineligible = summary.ineligible,
        "Verification complete"
    );

    if let Some(output) = output {
        write_report(&rows, output)?;
    }

    Ok(RunOutcome {
        rows,
        notes,
        summary,
    })
}
