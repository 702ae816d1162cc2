//! `rto_verifier` — reconcile a vehicle master sheet against registration
//! documents and decide each record.
//!
//! Pipeline: acquire document text ([`pdf_extract`], [`ocr`], cached in
//! [`document_store`]) → extract fields ([`heuristics`]) → join by chassis id
//! and decide ([`reconcile`], [`decision`]) → assemble the report ([`report`]).

pub mod config;
pub mod decision;
pub mod document_store;
pub mod error;
pub mod heuristics;
pub mod master;
pub mod matcher;
pub mod normalize;
pub mod ocr;
pub mod pdf_extract;
pub mod pipeline;
pub mod reconcile;
pub mod report;

pub use config::Config;
pub use error::{Result, VerifyError};
