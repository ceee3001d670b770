use std::fmt;

use chrono::{Duration, NaiveDateTime};

use crate::models::VisitorPass;
use crate::services::codec;
use crate::services::registry::{PassRegistry, RegistryError};

/// Classification of one scanned payload. Transient, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    Valid(VisitorPass),
    Expired(VisitorPass),
    NotFound,
    Malformed,
}

/// Maps raw scanned text to a [`ValidationOutcome`]: decode, look the id up
/// in the registry, then compare `now` against the validity window end.
/// A pass is still valid at exactly its end instant; one moment past it is
/// expired. Synchronous, no side effects; only storage failures are errors.
pub fn classify(
    registry: &PassRegistry,
    raw_text: &str,
    now: NaiveDateTime,
) -> Result<ValidationOutcome, RegistryError> {
    let payload = match codec::decode(raw_text) {
        Ok(payload) => payload,
        Err(_) => return Ok(ValidationOutcome::Malformed),
    };

    let Some(pass) = registry.lookup_by_id(&payload.id)? else {
        return Ok(ValidationOutcome::NotFound);
    };

    if now > pass.end_date_time {
        Ok(ValidationOutcome::Expired(pass))
    } else {
        Ok(ValidationOutcome::Valid(pass))
    }
}

/// Time left until a pass's validity window closes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RemainingTime {
    Expired,
    Until { days: i64, hours: i64, minutes: i64 },
}

impl fmt::Display for RemainingTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemainingTime::Expired => write!(f, "expired"),
            RemainingTime::Until {
                days,
                hours,
                minutes,
            } => write!(f, "{days}d {hours}h {minutes}m"),
        }
    }
}

/// Breaks `end - now` into days/hours/minutes, or `Expired` when the
/// difference is non-positive. Pure.
pub fn remaining_time(end: NaiveDateTime, now: NaiveDateTime) -> RemainingTime {
    let diff = end - now;
    if diff <= Duration::zero() {
        return RemainingTime::Expired;
    }

    let days = diff.num_days();
    let hours = (diff - Duration::days(days)).num_hours();
    let minutes = (diff - Duration::days(days) - Duration::hours(hours)).num_minutes();

    RemainingTime::Until {
        days,
        hours,
        minutes,
    }
}

/// Gatekeeper scanning session: `Idle → Scanning → Done → Idle`.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanState {
    Idle,
    Scanning,
    Done(ValidationOutcome),
}

/// Drives one scanning station. The frame producer (camera loop on the
/// client) submits each decoded string; malformed frames keep the session
/// scanning, while the first conclusive classification ends it. Frames
/// arriving after that are not reprocessed.
#[derive(Debug)]
pub struct ScanSession {
    state: ScanState,
}

#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    #[error("no scanning session is active")]
    NoActiveScan,

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl ScanSession {
    pub fn new() -> Self {
        Self {
            state: ScanState::Idle,
        }
    }

    pub fn state(&self) -> &ScanState {
        &self.state
    }

    /// Begins scanning, discarding any previous result.
    pub fn start(&mut self) {
        self.state = ScanState::Scanning;
    }

    /// Ends the session without a result, releasing the station.
    pub fn cancel(&mut self) {
        self.state = ScanState::Idle;
    }

    /// Classifies one decoded frame. Returns this frame's outcome; the
    /// session itself only settles on `Valid`/`Expired`/`NotFound`. Once
    /// settled, the prior outcome is returned unchanged for any further
    /// frames.
    pub fn submit(
        &mut self,
        registry: &PassRegistry,
        raw_text: &str,
        now: NaiveDateTime,
    ) -> Result<ValidationOutcome, ScanError> {
        match &self.state {
            ScanState::Idle => Err(ScanError::NoActiveScan),
            ScanState::Done(outcome) => Ok(outcome.clone()),
            ScanState::Scanning => {
                let outcome = classify(registry, raw_text, now)?;
                if outcome != ValidationOutcome::Malformed {
                    self.state = ScanState::Done(outcome.clone());
                }
                Ok(outcome)
            }
        }
    }
}

impl Default for ScanSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::IssuePassRequest;
    use crate::services::codec::ScanPayload;
    use crate::storage::MemoryStore;
    use chrono::{NaiveDate, Utc};
    use std::sync::Arc;

    fn registry() -> PassRegistry {
        PassRegistry::new(Arc::new(MemoryStore::new()))
    }

    fn issue(registry: &PassRegistry) -> VisitorPass {
        registry
            .create(
                &IssuePassRequest {
                    first_name: "Juan".to_string(),
                    last_name: "Perez".to_string(),
                    unit: "402".to_string(),
                    block: "B".to_string(),
                    start_date_time: "2024-01-01T09:00".to_string(),
                    end_date_time: "2024-01-01T18:00".to_string(),
                },
                Utc::now(),
            )
            .unwrap()
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn valid_inside_the_window() {
        let registry = registry();
        let pass = issue(&registry);
        let payload = codec::encode(&pass);

        let outcome = classify(&registry, &payload, at(12, 0)).unwrap();
        assert_eq!(outcome, ValidationOutcome::Valid(pass));
    }

    #[test]
    fn still_valid_at_exactly_the_end_instant() {
        let registry = registry();
        let pass = issue(&registry);
        let payload = codec::encode(&pass);

        let outcome = classify(&registry, &payload, pass.end_date_time).unwrap();
        assert_eq!(outcome, ValidationOutcome::Valid(pass));
    }

    #[test]
    fn expired_one_millisecond_past_the_end() {
        let registry = registry();
        let pass = issue(&registry);
        let payload = codec::encode(&pass);
        let just_after = pass.end_date_time + Duration::milliseconds(1);

        let outcome = classify(&registry, &payload, just_after).unwrap();
        assert_eq!(outcome, ValidationOutcome::Expired(pass));
    }

    #[test]
    fn expired_the_next_day() {
        let registry = registry();
        let pass = issue(&registry);
        let payload = codec::encode(&pass);
        let next_midnight = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();

        let outcome = classify(&registry, &payload, next_midnight).unwrap();
        assert_eq!(outcome, ValidationOutcome::Expired(pass));
    }

    #[test]
    fn unknown_id_is_not_found_for_any_clock() {
        let registry = registry();
        issue(&registry);

        let payload = serde_json::to_string(&ScanPayload {
            id: "PA-nonexistent".to_string(),
            display_name: "Ghost Visitor".to_string(),
            location_label: "BZ-A999".to_string(),
            validity_label: "2024-01-01 09:00 a 2024-01-01 18:00".to_string(),
        })
        .unwrap();

        for now in [at(9, 0), at(12, 0), at(23, 59)] {
            let outcome = classify(&registry, &payload, now).unwrap();
            assert_eq!(outcome, ValidationOutcome::NotFound);
        }
    }

    #[test]
    fn arbitrary_text_is_malformed_not_a_panic() {
        let registry = registry();
        let outcome = classify(&registry, "not a valid payload", at(12, 0)).unwrap();
        assert_eq!(outcome, ValidationOutcome::Malformed);
    }

    #[test]
    fn remaining_time_breakdown() {
        let end = at(18, 0);
        assert_eq!(
            remaining_time(end, at(12, 30)),
            RemainingTime::Until {
                days: 0,
                hours: 5,
                minutes: 30
            }
        );

        let far_end = NaiveDate::from_ymd_opt(2024, 1, 3)
            .unwrap()
            .and_hms_opt(19, 45, 0)
            .unwrap();
        let remaining = remaining_time(far_end, at(18, 0));
        assert_eq!(
            remaining,
            RemainingTime::Until {
                days: 2,
                hours: 1,
                minutes: 45
            }
        );
        assert_eq!(remaining.to_string(), "2d 1h 45m");
    }

    #[test]
    fn remaining_time_is_expired_at_and_past_the_end() {
        let end = at(18, 0);
        assert_eq!(remaining_time(end, end), RemainingTime::Expired);
        assert_eq!(
            remaining_time(end, end + Duration::minutes(1)),
            RemainingTime::Expired
        );
    }

    #[test]
    fn session_requires_start_before_frames() {
        let registry = registry();
        let mut session = ScanSession::new();

        let err = session.submit(&registry, "{}", at(12, 0)).unwrap_err();
        assert!(matches!(err, ScanError::NoActiveScan));
        assert_eq!(*session.state(), ScanState::Idle);
    }

    #[test]
    fn malformed_frames_keep_the_session_scanning() {
        let registry = registry();
        let mut session = ScanSession::new();
        session.start();

        let outcome = session
            .submit(&registry, "restaurant menu QR", at(12, 0))
            .unwrap();
        assert_eq!(outcome, ValidationOutcome::Malformed);
        assert_eq!(*session.state(), ScanState::Scanning);
    }

    #[test]
    fn session_settles_on_first_conclusive_outcome() {
        let registry = registry();
        let pass = issue(&registry);
        let payload = codec::encode(&pass);
        let mut session = ScanSession::new();
        session.start();

        let outcome = session.submit(&registry, &payload, at(12, 0)).unwrap();
        assert_eq!(outcome, ValidationOutcome::Valid(pass.clone()));
        assert_eq!(*session.state(), ScanState::Done(outcome));

        // later frames are not reprocessed, even expired ones
        let replay = session.submit(&registry, &payload, at(23, 0)).unwrap();
        assert_eq!(replay, ValidationOutcome::Valid(pass));
    }

    #[test]
    fn cancel_returns_to_idle_and_restart_clears_result() {
        let registry = registry();
        let pass = issue(&registry);
        let payload = codec::encode(&pass);
        let mut session = ScanSession::new();

        session.start();
        session.submit(&registry, &payload, at(12, 0)).unwrap();
        session.cancel();
        assert_eq!(*session.state(), ScanState::Idle);

        session.start();
        assert_eq!(*session.state(), ScanState::Scanning);
    }
}
