//! Per-record verdicts: an ordered rule table over the evidence gathered
//! from one master record and its (possibly absent) document.

use serde::Serialize;
use std::fmt;
use tracing::error;

use crate::heuristics::ExtractedDocument;
use crate::master::MasterRecord;
use crate::matcher::names_match;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Decision {
    Approve,
    Hold,
    Reject,
    Ineligible,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Approve => "Approve",
            Self::Hold => "Hold",
            Self::Reject => "Reject",
            Self::Ineligible => "Ineligible",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    None,
    MissingDocument,
    TempRegistration,
    NameMismatch,
    ChassisMismatch,
    UnknownError,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "NONE",
            Self::MissingDocument => "MISSING_DOCUMENT",
            Self::TempRegistration => "TEMP_REGISTRATION",
            Self::NameMismatch => "NAME_MISMATCH",
            Self::ChassisMismatch => "CHASSIS_MISMATCH",
            Self::UnknownError => "UNKNOWN_ERROR",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub remark: String,
    pub decision: Decision,
    pub error_code: ErrorCode,
}

impl Verdict {
    fn new(decision: Decision, error_code: ErrorCode, remark: impl Into<String>) -> Self {
        Self {
            remark: remark.into(),
            decision,
            error_code,
        }
    }
}

/// The boolean facts the rule table is evaluated over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evidence<'a> {
    /// A document with a chassis id was found for the record.
    pub document_present: bool,
    pub chassis_equal: bool,
    pub name_match: bool,
    pub permanent: bool,
    /// Name as printed on the document, quoted in mismatch remarks.
    pub document_name: Option<&'a str>,
}

impl<'a> Evidence<'a> {
    pub fn gather(record: &MasterRecord, document: Option<&'a ExtractedDocument>) -> Self {
        let Some((doc, chassis)) =
            document.and_then(|d| d.chassis_number.as_deref().map(|c| (d, c)))
        else {
            return Self {
                document_present: false,
                chassis_equal: false,
                name_match: false,
                permanent: false,
                document_name: None,
            };
        };

        Self {
            document_present: true,
            chassis_equal: record.chassis_number.trim() == chassis.trim(),
            name_match: names_match(Some(&record.customer_name), doc.customer_name.as_deref()),
            permanent: doc.is_permanent(),
            document_name: doc.customer_name.as_deref(),
        }
    }
}

struct Rule {
    name: &'static str,
    applies: fn(&Evidence) -> bool,
    verdict: fn(&Evidence) -> Verdict,
}

/// Evaluated top to bottom; the first rule that applies decides.
static RULES: &[Rule] = &[
    Rule {
        name: "missing_document",
        applies: |e| !e.document_present,
        verdict: |_| {
            Verdict::new(Decision::Ineligible, ErrorCode::MissingDocument, "No document found")
        },
    },
    Rule {
        name: "approved",
        applies: |e| e.chassis_equal && e.name_match && e.permanent,
        verdict: |_| Verdict::new(Decision::Approve, ErrorCode::None, "Approved"),
    },
    Rule {
        name: "temporary_registration",
        applies: |e| e.chassis_equal && e.name_match && !e.permanent,
        verdict: |_| {
            Verdict::new(
                Decision::Hold,
                ErrorCode::TempRegistration,
                "temporary registration, upload official copy",
            )
        },
    },
    Rule {
        name: "name_mismatch",
        applies: |e| e.chassis_equal && !e.name_match && e.permanent,
        verdict: |e| {
            Verdict::new(
                Decision::Hold,
                ErrorCode::NameMismatch,
                format!(
                    "Name mismatch, found: {}, provide relationship proof",
                    e.document_name.unwrap_or("Unknown")
                ),
            )
        },
    },
    Rule {
        name: "chassis_mismatch",
        applies: |e| !e.chassis_equal,
        verdict: |_| {
            Verdict::new(Decision::Reject, ErrorCode::ChassisMismatch, "Chassis number mismatch")
        },
    },
];

/// Run the rule table. Falls through to `UNKNOWN_ERROR` when no rule applies,
/// which happens for a matching chassis with neither a name match nor a
/// permanent registration.
pub fn evaluate(evidence: &Evidence) -> Verdict {
    RULES
        .iter()
        .find(|rule| (rule.applies)(evidence))
        .map(|rule| (rule.verdict)(evidence))
        .unwrap_or_else(|| {
            error!(?evidence, "No decision rule applied");
            Verdict::new(Decision::Reject, ErrorCode::UnknownError, "Verification failed")
        })
}

/// Name of the rule that decides `evidence`, if any.
pub fn deciding_rule(evidence: &Evidence) -> Option<&'static str> {
    RULES.iter().find(|rule| (rule.applies)(evidence)).map(|rule| rule.name)
}

pub fn decide(record: &MasterRecord, document: Option<&ExtractedDocument>) -> Verdict {
    evaluate(&Evidence::gather(record, document))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heuristics::extract_document;

    fn record(chassis: &str, name: &str) -> MasterRecord {
        MasterRecord {
            row: 1,
            chassis_number: chassis.to_string(),
            customer_name: name.to_string(),
        }
    }

    fn evidence(chassis_equal: bool, name_match: bool, permanent: bool) -> Evidence<'static> {
        Evidence {
            document_present: true,
            chassis_equal,
            name_match,
            permanent,
            document_name: Some("R Kumar"),
        }
    }

    #[test]
    fn approves_matching_permanent_document() {
        let rec = record("1HGCM82633A004352", "John A Smith");
        let doc = extract_document(
            "Customer Name: John A. Smith\nChassis 1HGCM82633A004352\n\
             MH12AB1234\nRegistration Date: 01-02-2023",
        );
        let verdict = decide(&rec, Some(&doc));
        assert_eq!(verdict.decision, Decision::Approve);
        assert_eq!(verdict.error_code, ErrorCode::None);
        assert_eq!(verdict.remark, "Approved");
        assert_eq!(doc.resolved_date(), Some("01-02-2023"));
    }

    #[test]
    fn no_document_is_ineligible() {
        let rec = record("1HGCM82633A004352", "John A Smith");
        let verdict = decide(&rec, None);
        assert_eq!(verdict.decision, Decision::Ineligible);
        assert_eq!(verdict.error_code, ErrorCode::MissingDocument);
        assert_eq!(verdict.remark, "No document found");

        let unjoinable = extract_document("Customer Name: John A Smith, MH12AB1234");
        let verdict = decide(&rec, Some(&unjoinable));
        assert_eq!(verdict.error_code, ErrorCode::MissingDocument);
    }

    #[test]
    fn temporary_registration_is_held() {
        let rec = record("1HGCM82633A004352", "John Smith");
        let doc = extract_document(
            "temporary registration issued\nName: John Smith\n1HGCM82633A004352",
        );
        let verdict = decide(&rec, Some(&doc));
        assert_eq!(verdict.decision, Decision::Hold);
        assert_eq!(verdict.error_code, ErrorCode::TempRegistration);
    }

    #[test]
    fn initials_still_approve() {
        let rec = record("1HGCM82633A004352", "John Smith");
        let doc = extract_document("Name: J Smith\n1HGCM82633A004352 KA01M5678");
        assert_eq!(doc.customer_name.as_deref(), Some("J Smith"));
        assert_eq!(decide(&rec, Some(&doc)).decision, Decision::Approve);
    }

    #[test]
    fn name_mismatch_quotes_document_name() {
        let rec = record("1HGCM82633A004352", "John Smith");
        let doc = extract_document("Name: Ravi Kumar\n1HGCM82633A004352 KA01M5678");
        let verdict = decide(&rec, Some(&doc));
        assert_eq!(verdict.decision, Decision::Hold);
        assert_eq!(verdict.error_code, ErrorCode::NameMismatch);
        assert_eq!(
            verdict.remark,
            "Name mismatch, found: Ravi Kumar, provide relationship proof"
        );
    }

    #[test]
    fn name_mismatch_without_document_name() {
        let e = Evidence {
            document_name: None,
            ..evidence(true, false, true)
        };
        assert!(evaluate(&e).remark.contains("found: Unknown"));
    }

    #[test]
    fn chassis_mismatch_rejects_regardless_of_rest() {
        for (name, permanent) in [(true, true), (true, false), (false, true), (false, false)] {
            let verdict = evaluate(&evidence(false, name, permanent));
            assert_eq!(verdict.decision, Decision::Reject);
            assert_eq!(verdict.error_code, ErrorCode::ChassisMismatch);
        }

        let rec = record("MA3ERLF1S00123456", "John Smith");
        let doc = extract_document("Name: John Smith 1HGCM82633A004352 KA01M5678");
        assert_eq!(decide(&rec, Some(&doc)).error_code, ErrorCode::ChassisMismatch);
    }

    #[test]
    fn chassis_comparison_trims_whitespace() {
        let rec = record("  1HGCM82633A004352 ", "John Smith");
        let doc = extract_document("Name: John Smith 1HGCM82633A004352 KA01M5678");
        assert_eq!(decide(&rec, Some(&doc)).decision, Decision::Approve);
    }

    #[test]
    fn fall_through_is_unknown_error() {
        let e = evidence(true, false, false);
        assert_eq!(deciding_rule(&e), None);
        let verdict = evaluate(&e);
        assert_eq!(verdict.decision, Decision::Reject);
        assert_eq!(verdict.error_code, ErrorCode::UnknownError);
        assert_eq!(verdict.remark, "Verification failed");
    }

    #[test]
    fn table_is_total_and_ordered() {
        for present in [false, true] {
            for chassis in [false, true] {
                for name in [false, true] {
                    for permanent in [false, true] {
                        let e = Evidence {
                            document_present: present,
                            ..evidence(chassis, name, permanent)
                        };
                        let rule = deciding_rule(&e);
                        if !present {
                            assert_eq!(rule, Some("missing_document"));
                        }
                        // Every combination yields exactly one verdict.
                        let _ = evaluate(&e);
                    }
                }
            }
        }
    }

    #[test]
    fn codes_render_in_screaming_case() {
        assert_eq!(ErrorCode::MissingDocument.to_string(), "MISSING_DOCUMENT");
        assert_eq!(serde_json::to_value(ErrorCode::None).unwrap(), "NONE");
        assert_eq!(Decision::Ineligible.to_string(), "Ineligible");
    }
}
