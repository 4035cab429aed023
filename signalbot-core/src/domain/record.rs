use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{SignalDescriptor, UserId};

/// Per-user entitlement state.
///
/// Serialized field names follow the persisted table layout: the free-use
/// counter is stored as `signals` (legacy files used `free_signals_used`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(rename = "signals", alias = "free_signals_used", default)]
    pub free_uses_consumed: u32,

    #[serde(with = "crate::timefmt::option", default)]
    pub paid_until: Option<NaiveDateTime>,

    /// Most recent issued signals, oldest first.
    #[serde(default)]
    pub history: Vec<SignalDescriptor>,
}

/// The whole in-memory user table.
pub type UserTable = BTreeMap<UserId, UserRecord>;

impl UserRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Paid iff a subscription end is set and lies strictly after `now`.
    pub fn is_paid(&self, now: NaiveDateTime) -> bool {
        self.paid_until.is_some_and(|until| until > now)
    }

    /// Append an issued signal, keeping at most `retention` entries.
    pub fn push_history(&mut self, signal: SignalDescriptor, retention: usize) {
        self.history.push(signal);
        if self.history.len() > retention {
            let excess = self.history.len() - retention;
            self.history.drain(..excess);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Direction;
    use chrono::{Duration, NaiveDate};

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, 10)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn sig(instrument: &str) -> SignalDescriptor {
        SignalDescriptor::new(instrument, Direction::Buy, now())
    }

    #[test]
    fn fresh_record_is_unpaid_and_empty() {
        let record = UserRecord::new();
        assert_eq!(record.free_uses_consumed, 0);
        assert!(record.paid_until.is_none());
        assert!(record.history.is_empty());
        assert!(!record.is_paid(now()));
    }

    #[test]
    fn paid_is_strictly_after_now() {
        let mut record = UserRecord::new();
        record.paid_until = Some(now());
        assert!(!record.is_paid(now()));
        record.paid_until = Some(now() + Duration::seconds(1));
        assert!(record.is_paid(now()));
    }

    #[test]
    fn history_drops_oldest_beyond_retention() {
        let mut record = UserRecord::new();
        for name in ["A", "B", "C", "D", "E"] {
            record.push_history(sig(name), 3);
        }
        let kept: Vec<&str> = record.history.iter().map(|s| s.instrument.as_str()).collect();
        assert_eq!(kept, vec!["C", "D", "E"]);
    }

    #[test]
    fn accepts_legacy_counter_key() {
        let record: UserRecord =
            serde_json::from_str(r#"{"free_signals_used": 4, "paid_until": null}"#).unwrap();
        assert_eq!(record.free_uses_consumed, 4);
        assert!(record.history.is_empty());
    }
}
