use rusqlite::{Connection, OptionalExtension, Result as SqliteResult, params};
use sha2::{Digest, Sha256};
use std::path::Path;
use tracing::info;

use crate::pdf_extract::ContentKind;

/// SQLite cache of acquired document text, keyed by the SHA-256 of the
/// document bytes, so slow extraction and OCR run once per distinct file.
pub struct DocumentStore {
    conn: Connection,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDocument {
    pub hash: String,
    pub filename: String,
    /// "text", "ocr", "scanned" or "error"
    pub content_type: String,
    /// Acquired text (populated only for usable content types)
    pub extracted_text: Option<String>,
}

impl StoredDocument {
    /// Cached text, if the entry is one the extractor can use.
    pub fn usable_text(&self) -> Option<&str> {
        ContentKind::parse(&self.content_type)
            .filter(ContentKind::is_usable)
            .and(self.extracted_text.as_deref())
    }
}

/// Counts of cached documents by content type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCounts {
    pub total: usize,
    pub text: usize,
    pub ocr: usize,
    pub scanned: usize,
    pub error: usize,
}

impl DocumentStore {
    /// Create a new document store with SQLite backend
    pub fn new<P: AsRef<Path>>(db_path: P) -> SqliteResult<Self> {
        let conn = Connection::open(db_path)?;
        Self::init(conn)
    }

    pub fn in_memory() -> SqliteResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> SqliteResult<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS documents (
                hash TEXT PRIMARY KEY,
                filename TEXT NOT NULL,
                content_type TEXT NOT NULL DEFAULT 'unknown',
                extracted_text TEXT,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_documents_content_type ON documents(content_type)",
            [],
        )?;

        info!("Document cache initialized");
        Ok(Self { conn })
    }

    /// Content hash used as the cache key.
    pub fn hash_bytes(bytes: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        format!("{:x}", hasher.finalize())
    }

    /// Insert or replace the acquisition result for a document.
    pub fn upsert(&self, doc: &StoredDocument) -> SqliteResult<()> {
        self.conn.execute(
            "INSERT INTO documents (hash, filename, content_type, extracted_text)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(hash) DO UPDATE SET
                filename = excluded.filename,
                content_type = excluded.content_type,
                extracted_text = excluded.extracted_text",
            params![doc.hash, doc.filename, doc.content_type, doc.extracted_text],
        )?;
        info!(hash = %doc.hash, content_type = %doc.content_type, "Document cached");
        Ok(())
    }

    pub fn get(&self, hash: &str) -> SqliteResult<Option<StoredDocument>> {
        self.conn
            .query_row(
                "SELECT hash, filename, content_type, extracted_text
                 FROM documents
                 WHERE hash = ?1",
                params![hash],
                |row| {
                    Ok(StoredDocument {
                        hash: row.get(0)?,
                        filename: row.get(1)?,
                        content_type: row.get(2)?,
                        extracted_text: row.get(3)?,
                    })
                },
            )
            .optional()
    }

    /// Get count of cached documents by content type
    pub fn get_counts(&self) -> SqliteResult<StoreCounts> {
        let mut stmt = self
            .conn
            .prepare("SELECT content_type, COUNT(*) FROM documents GROUP BY content_type")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, usize>(1)?))
        })?;

        let mut counts = StoreCounts::default();
        for row in rows {
            let (content_type, n) = row?;
            counts.total += n;
            match ContentKind::parse(&content_type) {
                Some(ContentKind::Text) => counts.text += n,
                Some(ContentKind::Ocr) => counts.ocr += n,
                Some(ContentKind::Scanned) => counts.scanned += n,
                Some(ContentKind::Error) => counts.error += n,
                None => {}
            }
        }
        Ok(counts)
    }
}
