// src/heuristics/mod.rs

mod registration;

use serde::{Serialize, Serializer};
use std::fmt;

/// How the document classifies the vehicle's registration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum RegistrationType {
    Permanent,
    Temporary,
    #[default]
    Unknown,
}

/// Which numbering scheme a permanent plate follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PlateSeries {
    /// State-coded plate, e.g. `MH12AB1234`.
    Standard,
    /// Bharat-series plate, e.g. `22BH1234AB`.
    Bharat,
}

/// Vehicle number as read from a document, or the sentinel explaining its absence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum VehicleNumber {
    Plate(String),
    /// The document declares itself a temporary registration.
    Temp,
    /// No plate yet; the document mentions a new vehicle.
    New,
    #[default]
    NotFound,
}

impl fmt::Display for VehicleNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plate(plate) => f.write_str(plate),
            Self::Temp => f.write_str("TEMP"),
            Self::New => f.write_str("NEW"),
            Self::NotFound => f.write_str("Not Found"),
        }
    }
}

impl Serialize for VehicleNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// All structured data we can extract from one registration document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractedDocument {
    pub registration_type: RegistrationType,
    pub vehicle_number: VehicleNumber,
    pub plate_series: Option<PlateSeries>,
    pub chassis_number: Option<String>,
    pub customer_name: Option<String>,
    pub registration_date: Option<String>,
    pub receipt_date: Option<String>,
    pub fallback_date: Option<String>,
}

impl ExtractedDocument {
    /// Documents without a chassis id cannot be joined to a master record.
    pub fn is_joinable(&self) -> bool {
        self.chassis_number.is_some()
    }

    pub fn is_permanent(&self) -> bool {
        self.registration_type == RegistrationType::Permanent
    }

    /// Registration date, else receipt date, else the unlabeled fallback.
    pub fn resolved_date(&self) -> Option<&str> {
        self.registration_date
            .as_deref()
            .or(self.receipt_date.as_deref())
            .or(self.fallback_date.as_deref())
    }

    /// How many fields were successfully extracted (out of the scalar ones).
    pub fn coverage(&self) -> (usize, usize) {
        let total = 5;
        let filled = [
            self.chassis_number.is_some(),
            matches!(self.vehicle_number, VehicleNumber::Plate(_)),
            self.registration_type != RegistrationType::Unknown,
            self.customer_name.is_some(),
            self.resolved_date().is_some(),
        ]
        .iter()
        .filter(|&&v| v)
        .count();
        (filled, total)
    }
}

/// Extract structured registration data from raw document text.
pub fn extract_document(text: &str) -> ExtractedDocument {
    registration::extract(text)
}
