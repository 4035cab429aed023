//! Engine-owned state and the values returned to the command layer.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};

use crate::domain::{SignalDescriptor, UserId, UserTable};
use crate::policy::Entitlement;

/// Everything the engine mutates, guarded by one lock.
#[derive(Debug)]
pub struct EngineState<R> {
    pub table: UserTable,
    pub rng: R,
}

/// Status line appended to an issued signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFooter {
    Subscribed { until: NaiveDate },
    Remaining { remaining: u32 },
}

impl fmt::Display for StatusFooter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusFooter::Subscribed { until } => write!(
                f,
                "(Subscription: Unlimited signals until {})",
                until.format("%Y-%m-%d")
            ),
            StatusFooter::Remaining { remaining } => {
                write!(f, "(Free signals remaining: {remaining})")
            }
        }
    }
}

/// A successfully issued signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedSignal {
    pub signal: SignalDescriptor,
    pub footer: StatusFooter,
}

/// Result of an administrative subscription grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grant {
    pub user: UserId,
    pub days: i64,
    pub paid_until: NaiveDateTime,
}

/// Read-only view of a user's standing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserStatus {
    pub user: UserId,
    pub entitlement: Entitlement,
    pub free_uses_consumed: u32,
    pub paid_until: Option<NaiveDateTime>,
}
