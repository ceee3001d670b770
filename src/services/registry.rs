use std::sync::{Arc, Mutex};

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::models::pass::{parse_date_time, IssuePassRequest, VisitorPass};
use crate::storage::{KeyValueStore, StorageError};

/// Storage key holding the full serialized pass collection.
pub const PASSES_KEY: &str = "registered_pases";

#[derive(thiserror::Error, Debug)]
pub enum RegistryError {
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    #[error("{field} is not a valid date-time: '{value}'")]
    InvalidDateTime { field: &'static str, value: String },

    #[error("validity window ends before it starts")]
    InvertedWindow,

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("JSON serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RegistryError {
    /// True for user-correctable issuance input problems, as opposed to
    /// storage or serialization failures.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            RegistryError::MissingFields(_)
                | RegistryError::InvalidDateTime { .. }
                | RegistryError::InvertedWindow
        )
    }
}

/// Owns the durable pass collection behind [`PASSES_KEY`]. Every mutation
/// follows the read-all, append, write-all discipline: the whole collection
/// is re-serialized on each create, and readers always snapshot the full
/// stored array.
#[derive(Clone)]
pub struct PassRegistry {
    store: Arc<dyn KeyValueStore>,
    /// Serializes the read-append-write cycle. Handlers run concurrently, so
    /// without this two simultaneous creates would each rewrite the
    /// collection from their own snapshot and drop the other's pass.
    write_lock: Arc<Mutex<()>>,
}

impl PassRegistry {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Issues a new pass. Validates that every field is present, that both
    /// date-times parse, and that the window is not inverted; on success the
    /// record is appended to storage and returned with its assigned id.
    pub fn create(
        &self,
        request: &IssuePassRequest,
        now: DateTime<Utc>,
    ) -> Result<VisitorPass, RegistryError> {
        let (start, end) = validate_request(request)?;

        let _guard = self.write_lock.lock().expect("registry mutex poisoned");
        let mut passes = self.load_collection()?;
        let id = next_pass_id(&passes, now);

        let pass = VisitorPass {
            id,
            first_name: request.first_name.trim().to_string(),
            last_name: request.last_name.trim().to_string(),
            unit: request.unit.trim().to_string(),
            block: request.block.trim().to_string(),
            start_date_time: start,
            end_date_time: end,
            issued_at: now,
        };

        passes.push(pass.clone());
        self.store.set(PASSES_KEY, &serde_json::to_string(&passes)?)?;

        tracing::info!(pass_id = %pass.id, unit = %pass.unit, block = %pass.block, "Visitor pass issued");

        Ok(pass)
    }

    /// Linear scan of the stored collection for an exact id match.
    pub fn lookup_by_id(&self, id: &str) -> Result<Option<VisitorPass>, RegistryError> {
        let passes = self.load_collection()?;
        Ok(passes.into_iter().find(|p| p.id == id))
    }

    /// Full collection in insertion order, oldest first.
    pub fn list_all(&self) -> Result<Vec<VisitorPass>, RegistryError> {
        self.load_collection()
    }

    fn load_collection(&self) -> Result<Vec<VisitorPass>, RegistryError> {
        match self.store.get(PASSES_KEY)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }
}

fn validate_request(
    request: &IssuePassRequest,
) -> Result<(NaiveDateTime, NaiveDateTime), RegistryError> {
    let required = [
        ("firstName", &request.first_name),
        ("lastName", &request.last_name),
        ("unit", &request.unit),
        ("block", &request.block),
        ("startDateTime", &request.start_date_time),
        ("endDateTime", &request.end_date_time),
    ];

    let missing: Vec<String> = required
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name.to_string())
        .collect();

    if !missing.is_empty() {
        return Err(RegistryError::MissingFields(missing));
    }

    let start =
        parse_date_time(&request.start_date_time).ok_or_else(|| RegistryError::InvalidDateTime {
            field: "startDateTime",
            value: request.start_date_time.clone(),
        })?;
    let end =
        parse_date_time(&request.end_date_time).ok_or_else(|| RegistryError::InvalidDateTime {
            field: "endDateTime",
            value: request.end_date_time.clone(),
        })?;

    if end < start {
        return Err(RegistryError::InvertedWindow);
    }

    Ok((start, end))
}

/// Pass ids are `PA-{unix_millis}` tokens derived from the issuance instant.
/// Uniqueness is the only hard requirement, so a colliding millisecond value
/// (rapid sequential issuance) is bumped until the id is free.
fn next_pass_id(existing: &[VisitorPass], now: DateTime<Utc>) -> String {
    let mut millis = now.timestamp_millis();
    loop {
        let candidate = format!("PA-{millis}");
        if !existing.iter().any(|p| p.id == candidate) {
            return candidate;
        }
        millis += 1;
    }
}
