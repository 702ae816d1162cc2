use super::{ExtractedDocument, PlateSeries, RegistrationType, VehicleNumber};
use regex::Regex;
use std::sync::LazyLock;

const TEMPORARY_KEYWORD: &str = "temporary";
const NEW_KEYWORD: &str = "new";
const NAME_MAX_TOKENS: usize = 4;

/// `DD-MM-YYYY` / `DD/MM/YYYY`, or `D Mon YYYY` / `D-Mon-YYYY`.
const DATE_PATTERN: &str = r"(?:\d{2}[-/]\d{2}[-/]\d{4}|\d{1,2}[-\s][A-Za-z]{3}[-\s]\d{4})";

// 17 characters, VIN alphabet (no I, O or Q).
static CHASSIS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-HJ-NPR-Z0-9]{17}\b").expect("chassis pattern is valid"));

/// Plate patterns in precedence order: a standard plate anywhere in the text
/// beats a Bharat-series plate.
static PLATE_RULES: LazyLock<Vec<(Regex, PlateSeries)>> = LazyLock::new(|| {
    vec![
        (
            Regex::new(r"\b[A-Z]{2}[0-9]{1,2}[A-Z]{1,3}[0-9]{4}\b")
                .expect("plate pattern is valid"),
            PlateSeries::Standard,
        ),
        (
            Regex::new(r"\b[0-9]{2}BH[0-9]{4}[A-Z]{1,2}\b").expect("bharat pattern is valid"),
            PlateSeries::Bharat,
        ),
    ]
});

static NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:Received From|Customer Name|Name|Mr\.|Ms\.)[:\s.]*([A-Za-z\s.]+)")
        .expect("name pattern is valid")
});

static REGISTRATION_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)(?:Registration|Regn|Reg\.)\s*Date[:\s]*({DATE_PATTERN})"
    ))
    .expect("registration date pattern is valid")
});

static RECEIPT_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)Receipt\s*date[:\s]*({DATE_PATTERN})"))
        .expect("receipt date pattern is valid")
});

static ANY_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(DATE_PATTERN).expect("date pattern is valid"));

/// Main extraction entry point — keyword checks first, then anchored regex patterns.
pub fn extract(text: &str) -> ExtractedDocument {
    let lowered = text.to_lowercase();

    let (registration_type, vehicle_number, plate_series) = if lowered.contains(TEMPORARY_KEYWORD)
    {
        // A temporary document never reports a plate, even if one is printed on it.
        (RegistrationType::Temporary, VehicleNumber::Temp, None)
    } else {
        classify_plate(text, &lowered)
    };

    let registration_date = extract_labeled_date(&REGISTRATION_DATE_RE, text);
    let receipt_date = extract_labeled_date(&RECEIPT_DATE_RE, text);
    let fallback_date = if registration_date.is_none() && receipt_date.is_none() {
        extract_any_date(text)
    } else {
        None
    };

    ExtractedDocument {
        registration_type,
        vehicle_number,
        plate_series,
        chassis_number: extract_chassis(text),
        customer_name: extract_customer_name(text),
        registration_date,
        receipt_date,
        fallback_date,
    }
}

// ---------------------------------------------------------------------------
// Field extractors
// ---------------------------------------------------------------------------

fn extract_chassis(text: &str) -> Option<String> {
    CHASSIS_RE.find(text).map(|m| m.as_str().to_string())
}

fn classify_plate(
    text: &str,
    lowered: &str,
) -> (RegistrationType, VehicleNumber, Option<PlateSeries>) {
    for (re, series) in PLATE_RULES.iter() {
        if let Some(m) = re.find(text) {
            return (
                RegistrationType::Permanent,
                VehicleNumber::Plate(m.as_str().to_string()),
                Some(*series),
            );
        }
    }

    if lowered.contains(NEW_KEYWORD) {
        (RegistrationType::Temporary, VehicleNumber::New, None)
    } else {
        (RegistrationType::Temporary, VehicleNumber::NotFound, None)
    }
}

fn extract_customer_name(text: &str) -> Option<String> {
    let cap = NAME_RE.captures(text)?;
    let name = cap[1]
        .split_whitespace()
        .take(NAME_MAX_TOKENS)
        .collect::<Vec<_>>()
        .join(" ");
    (!name.is_empty()).then_some(name)
}

fn extract_labeled_date(re: &Regex, text: &str) -> Option<String> {
    re.captures(text).map(|c| c[1].to_string())
}

fn extract_any_date(text: &str) -> Option<String> {
    ANY_DATE_RE.find(text).map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PERMANENT_DOC: &str = "FORM 23 CERTIFICATE OF REGISTRATION\n\
        Customer Name: John A. Smith\n\
        Chassis No: 1HGCM82633A004352\n\
        Registration No: MH12AB1234\n\
        Registration Date: 01-02-2023\n";

    #[test]
    fn permanent_certificate() {
        let doc = extract(PERMANENT_DOC);
        assert_eq!(doc.chassis_number.as_deref(), Some("1HGCM82633A004352"));
        assert_eq!(doc.vehicle_number, VehicleNumber::Plate("MH12AB1234".into()));
        assert_eq!(doc.registration_type, RegistrationType::Permanent);
        assert_eq!(doc.plate_series, Some(PlateSeries::Standard));
        assert_eq!(doc.registration_date.as_deref(), Some("01-02-2023"));
        assert_eq!(doc.fallback_date, None);

        let name = doc.customer_name.unwrap();
        assert!(name.starts_with("John A. Smith"), "got {name}");
        assert!(name.split_whitespace().count() <= NAME_MAX_TOKENS);
    }

    #[test]
    fn temporary_keyword_overrides_plate() {
        let text = "TEMPORARY REGISTRATION issued\nMH12AB1234\nChassis 1HGCM82633A004352";
        let doc = extract(text);
        assert_eq!(doc.registration_type, RegistrationType::Temporary);
        assert_eq!(doc.vehicle_number, VehicleNumber::Temp);
        assert_eq!(doc.plate_series, None);
        assert_eq!(doc.chassis_number.as_deref(), Some("1HGCM82633A004352"));
    }

    #[test]
    fn temporary_in_any_case() {
        for text in ["temporary", "Temporary", "a TeMpOrArY permit 22BH1234AB"] {
            let doc = extract(text);
            assert_eq!(doc.registration_type, RegistrationType::Temporary, "{text}");
            assert_eq!(doc.vehicle_number, VehicleNumber::Temp, "{text}");
        }
    }

    #[test]
    fn bharat_series_plate() {
        let doc = extract("Regd. number 22BH1234AB for chassis MA3ERLF1S00123456");
        assert_eq!(doc.registration_type, RegistrationType::Permanent);
        assert_eq!(doc.vehicle_number, VehicleNumber::Plate("22BH1234AB".into()));
        assert_eq!(doc.plate_series, Some(PlateSeries::Bharat));
    }

    #[test]
    fn standard_plate_preferred_over_bharat() {
        // The bharat plate comes first in the text but the standard rule ranks higher.
        let doc = extract("22BH1234AB and later KA01M5678");
        assert_eq!(doc.vehicle_number, VehicleNumber::Plate("KA01M5678".into()));
        assert_eq!(doc.plate_series, Some(PlateSeries::Standard));
    }

    #[test]
    fn no_plate_with_new_keyword() {
        let doc = extract("Sale of New vehicle, chassis MA3ERLF1S00123456");
        assert_eq!(doc.vehicle_number, VehicleNumber::New);
        assert_eq!(doc.registration_type, RegistrationType::Temporary);
    }

    #[test]
    fn no_plate_at_all() {
        let doc = extract("Invoice for chassis MA3ERLF1S00123456");
        assert_eq!(doc.vehicle_number, VehicleNumber::NotFound);
        assert_eq!(doc.registration_type, RegistrationType::Temporary);
    }

    #[test]
    fn lowercase_plate_is_ignored() {
        let doc = extract("plate mh12ab1234");
        assert_eq!(doc.vehicle_number, VehicleNumber::NotFound);
    }

    #[test]
    fn chassis_excludes_i_o_q() {
        assert_eq!(extract("VIN 1HGCM82633A00435I").chassis_number, None);
        assert_eq!(extract("VIN 1HGCM82633A00435O").chassis_number, None);
        assert_eq!(extract("VIN 1HGCM82633A00435Q").chassis_number, None);
    }

    #[test]
    fn chassis_must_be_whole_word() {
        assert_eq!(extract("X1HGCM82633A004352").chassis_number, None);
        assert_eq!(extract("1HGCM82633A0043521").chassis_number, None);
        assert_eq!(
            extract("Chassis:1HGCM82633A004352.").chassis_number.as_deref(),
            Some("1HGCM82633A004352")
        );
    }

    #[test]
    fn first_chassis_wins() {
        let doc = extract("MA3ERLF1S00123456 then 1HGCM82633A004352");
        assert_eq!(doc.chassis_number.as_deref(), Some("MA3ERLF1S00123456"));
    }

    #[test]
    fn name_from_received_from() {
        let doc = extract("Received From: Ms. Priya Sharma\n12 Main Road");
        assert_eq!(doc.customer_name.as_deref(), Some("Ms. Priya Sharma"));
    }

    #[test]
    fn name_is_capped_at_four_tokens() {
        let doc = extract("Name: Venkata Ramana Rao Subramanya Iyer 42");
        assert_eq!(doc.customer_name.as_deref(), Some("Venkata Ramana Rao Subramanya"));
    }

    #[test]
    fn label_without_name_is_absent() {
        assert_eq!(extract("Name: 12345").customer_name, None);
        assert_eq!(extract("no label here").customer_name, None);
    }

    #[test]
    fn receipt_date_without_registration_date() {
        let doc = extract("Receipt date: 15/03/2024 printed 01-01-2020");
        assert_eq!(doc.registration_date, None);
        assert_eq!(doc.receipt_date.as_deref(), Some("15/03/2024"));
        assert_eq!(doc.fallback_date, None);
        assert_eq!(doc.resolved_date(), Some("15/03/2024"));
    }

    #[test]
    fn labeled_textual_month_dates() {
        let doc = extract("Regn Date 7-Jan-2022\nReceipt Date: 9 Feb 2022");
        assert_eq!(doc.registration_date.as_deref(), Some("7-Jan-2022"));
        assert_eq!(doc.receipt_date.as_deref(), Some("9 Feb 2022"));
        assert_eq!(doc.fallback_date, None);
    }

    #[test]
    fn fallback_date_when_no_label() {
        let doc = extract("Issued on 3 Mar 2021 and valid till 02/03/2036");
        assert_eq!(doc.registration_date, None);
        assert_eq!(doc.receipt_date, None);
        assert_eq!(doc.fallback_date.as_deref(), Some("3 Mar 2021"));
    }

    #[test]
    fn empty_text_yields_unjoinable_record() {
        let doc = extract("");
        assert!(!doc.is_joinable());
        assert_eq!(doc.customer_name, None);
        assert_eq!(doc.resolved_date(), None);
    }

    #[test]
    fn extraction_is_idempotent() {
        assert_eq!(extract(PERMANENT_DOC), extract(PERMANENT_DOC));
    }
}
