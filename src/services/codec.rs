use serde::{Deserialize, Serialize};

use crate::models::VisitorPass;

/// The compact structure embedded in a pass QR image. Wire field names stay
/// short (`nom`, `loc`, `val`) to keep the code scannable at small sizes;
/// only `id` is load-bearing for validation, the rest is display text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanPayload {
    pub id: String,

    /// Visitor full name.
    #[serde(rename = "nom")]
    pub display_name: String,

    /// Composed location label, e.g. `B2-A402`.
    #[serde(rename = "loc")]
    pub location_label: String,

    /// Composed validity label, e.g. `2024-01-01 09:00 a 2024-01-01 18:00`.
    #[serde(rename = "val")]
    pub validity_label: String,
}

#[derive(thiserror::Error, Debug, PartialEq)]
#[error("scanned text is not a recognized pass payload")]
pub struct MalformedPayload;

impl ScanPayload {
    pub fn from_pass(pass: &VisitorPass) -> Self {
        Self {
            id: pass.id.clone(),
            display_name: pass.full_name(),
            location_label: format!("B{}-A{}", pass.block, pass.unit),
            validity_label: format!(
                "{} a {}",
                pass.start_date_time.format("%Y-%m-%d %H:%M"),
                pass.end_date_time.format("%Y-%m-%d %H:%M")
            ),
        }
    }
}

/// Serializes a pass into the string rendered as its QR code.
pub fn encode(pass: &VisitorPass) -> String {
    serde_json::to_string(&ScanPayload::from_pass(pass))
        .expect("string-only payload serializes")
}

/// Parses raw scanned text back into a [`ScanPayload`]. Foreign QR codes
/// (arbitrary URLs, other apps' JSON) are an expected input and yield
/// `MalformedPayload`, never a panic.
pub fn decode(raw_text: &str) -> Result<ScanPayload, MalformedPayload> {
    serde_json::from_str(raw_text).map_err(|_| MalformedPayload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn pass() -> VisitorPass {
        VisitorPass {
            id: "PA-1704100000000".to_string(),
            first_name: "Juan".to_string(),
            last_name: "Perez".to_string(),
            unit: "402".to_string(),
            block: "B".to_string(),
            start_date_time: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
            end_date_time: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(18, 0, 0)
                .unwrap(),
            issued_at: Utc::now(),
        }
    }

    #[test]
    fn round_trip_recovers_the_id() {
        let pass = pass();
        let encoded = encode(&pass);
        assert!(!encoded.is_empty());

        let decoded = decode(&encoded).unwrap();
        assert_eq!(decoded.id, pass.id);
    }

    #[test]
    fn composes_display_labels() {
        let payload = ScanPayload::from_pass(&pass());
        assert_eq!(payload.display_name, "Juan Perez");
        assert_eq!(payload.location_label, "BB-A402");
        assert_eq!(
            payload.validity_label,
            "2024-01-01 09:00 a 2024-01-01 18:00"
        );
    }

    #[test]
    fn foreign_text_is_malformed() {
        assert_eq!(decode("not a valid payload"), Err(MalformedPayload));
        assert_eq!(decode("https://example.com/menu"), Err(MalformedPayload));
        assert_eq!(decode("{\"unrelated\":true}"), Err(MalformedPayload));
        assert_eq!(decode(""), Err(MalformedPayload));
    }
}
