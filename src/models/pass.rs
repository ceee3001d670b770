use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// A visitor authorization record with a bounded validity window.
/// Immutable once issued; never updated or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitorPass {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub unit: String,
    pub block: String,
    /// Validity window, wall-clock time at the condominium.
    pub start_date_time: NaiveDateTime,
    pub end_date_time: NaiveDateTime,
    /// Creation instant, used for record ordering only.
    pub issued_at: DateTime<Utc>,
}

impl VisitorPass {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Issuance form fields as submitted by the resident UI. Date-times arrive
/// as strings and are validated during `PassRegistry::create`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuePassRequest {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub block: String,
    #[serde(default)]
    pub start_date_time: String,
    #[serde(default)]
    pub end_date_time: String,
}

/// Parses a submitted date-time: the HTML `datetime-local` forms only
/// (`2024-01-01T09:00`, with or without seconds). Values carry no zone and
/// are taken as condominium wall-clock time; zoned forms are rejected rather
/// than silently renormalized.
pub fn parse_date_time(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
        .ok()
}
