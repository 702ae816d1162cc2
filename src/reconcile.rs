use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::decision::{Evidence, Verdict, deciding_rule, evaluate};
use crate::heuristics::ExtractedDocument;
use crate::master::MasterRecord;

/// Which document a chassis id resolves to when several documents carry it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// The first document in input order.
    #[default]
    First,
    /// The last document in input order.
    Last,
}

/// Joinable documents keyed by trimmed chassis id.
#[derive(Debug)]
pub struct DocumentIndex<'a> {
    by_chassis: HashMap<&'a str, &'a ExtractedDocument>,
    /// Chassis ids seen on more than one document, in first-seen order.
    pub duplicates: Vec<String>,
}

impl<'a> DocumentIndex<'a> {
    pub fn build(documents: &'a [ExtractedDocument], policy: DuplicatePolicy) -> Self {
        let mut by_chassis = HashMap::new();
        let mut duplicates = Vec::new();

        for doc in documents {
            let Some(chassis) = doc.chassis_number.as_deref().map(str::trim) else {
                continue;
            };
            if !by_chassis.contains_key(chassis) {
                by_chassis.insert(chassis, doc);
                continue;
            }
            if !duplicates.iter().any(|d| d == chassis) {
                warn!(chassis = %chassis, ?policy, "Several documents share a chassis id");
                duplicates.push(chassis.to_string());
            }
            if policy == DuplicatePolicy::Last {
                by_chassis.insert(chassis, doc);
            }
        }

        Self {
            by_chassis,
            duplicates,
        }
    }

    pub fn get(&self, chassis: &str) -> Option<&'a ExtractedDocument> {
        self.by_chassis.get(chassis.trim()).copied()
    }

    pub fn len(&self) -> usize {
        self.by_chassis.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_chassis.is_empty()
    }
}

/// One master record with the document it joined to and the resulting verdict.
#[derive(Debug, Clone)]
pub struct Reconciled<'a> {
    pub record: &'a MasterRecord,
    pub document: Option<&'a ExtractedDocument>,
    pub verdict: Verdict,
}

/// Join every master record to its document by chassis id and decide it.
/// Output follows master order, one entry per record.
pub fn reconcile<'a>(
    records: &'a [MasterRecord],
    index: &DocumentIndex<'a>,
) -> Vec<Reconciled<'a>> {
    records
        .iter()
        .map(|record| {
            let document = index.get(&record.chassis_number);
            let evidence = Evidence::gather(record, document);
            let verdict = evaluate(&evidence);
            debug!(
                row = record.row,
                rule = deciding_rule(&evidence).unwrap_or("fallback"),
                chassis = %record.chassis_number,
                decision = %verdict.decision,
                code = %verdict.error_code,
                "Record decided"
            );
            Reconciled {
                record,
                document,
                verdict,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::{Decision, ErrorCode};
    use crate::heuristics::extract_document;

    fn record(row: usize, chassis: &str, name: &str) -> MasterRecord {
        MasterRecord {
            row,
            chassis_number: chassis.to_string(),
            customer_name: name.to_string(),
        }
    }

    fn duplicate_docs() -> Vec<ExtractedDocument> {
        vec![
            extract_document("Name: John Smith 1HGCM82633A004352 MH12AB1234"),
            extract_document("Name: Ravi Kumar 1HGCM82633A004352 MH12AB9999"),
        ]
    }

    #[test]
    fn first_document_wins_by_default() {
        let docs = duplicate_docs();
        let index = DocumentIndex::build(&docs, DuplicatePolicy::default());
        assert_eq!(index.len(), 1);
        assert_eq!(index.duplicates, vec!["1HGCM82633A004352".to_string()]);

        let records = vec![record(1, "1HGCM82633A004352", "John Smith")];
        let rows = reconcile(&records, &index);
        assert_eq!(rows[0].verdict.decision, Decision::Approve);
        assert_eq!(
            rows[0].document.unwrap().vehicle_number.to_string(),
            "MH12AB1234"
        );
    }

    #[test]
    fn last_document_wins_when_configured() {
        let docs = duplicate_docs();
        let index = DocumentIndex::build(&docs, DuplicatePolicy::Last);
        let records = vec![record(1, "1HGCM82633A004352", "John Smith")];
        let rows = reconcile(&records, &index);
        assert_eq!(rows[0].verdict.error_code, ErrorCode::NameMismatch);
    }

    #[test]
    fn one_verdict_per_record_in_master_order() {
        let docs = vec![extract_document(
            "Customer Name: Priya Sharma MA3ERLF1S00123456 KA01M5678",
        )];
        let index = DocumentIndex::build(&docs, DuplicatePolicy::First);
        let records = vec![
            record(1, "1HGCM82633A004352", "John Smith"),
            record(2, " MA3ERLF1S00123456 ", "Priya Sharma"),
            record(3, "1HGCM82633A004352", "John Smith"),
        ];
        let rows = reconcile(&records, &index);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].verdict.error_code, ErrorCode::MissingDocument);
        assert_eq!(rows[1].verdict.decision, Decision::Approve);
        assert_eq!(rows[1].record.row, 2);
        assert_eq!(rows[2].verdict.error_code, ErrorCode::MissingDocument);
    }

    #[test]
    fn unjoinable_documents_are_not_indexed() {
        let docs = vec![extract_document("no chassis here"), ExtractedDocument::default()];
        let index = DocumentIndex::build(&docs, DuplicatePolicy::First);
        assert_eq!(index.len(), 0);
        assert!(index.is_empty());
        assert!(index.duplicates.is_empty());
    }

    #[test]
    fn policy_names_deserialize_lowercase() {
        let p: DuplicatePolicy = serde_json::from_str("\"last\"").unwrap();
        assert_eq!(p, DuplicatePolicy::Last);
    }
}
