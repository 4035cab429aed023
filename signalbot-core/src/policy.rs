//! Entitlement policy — may this user receive a signal right now?
//!
//! Pure function of `(record, now)`. Subscription status is always derived
//! from `paid_until` against the supplied clock reading, never cached.

use std::fmt;

use chrono::NaiveDateTime;

use crate::config::EngineConfig;
use crate::domain::UserRecord;

/// Derived status of a user at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entitlement {
    /// Active subscription ending at `until`.
    Subscribed { until: NaiveDateTime },
    /// Unsubscribed with `remaining` free signals left.
    FreeTier { remaining: u32 },
    /// Unsubscribed and the free quota is used up.
    Exhausted,
}

impl Entitlement {
    pub fn is_subscribed(&self) -> bool {
        matches!(self, Entitlement::Subscribed { .. })
    }
}

/// Compute the entitlement of `record` at `now` under a free-use `limit`.
pub fn entitlement(record: &UserRecord, now: NaiveDateTime, limit: u32) -> Entitlement {
    match record.paid_until {
        Some(until) if record.is_paid(now) => Entitlement::Subscribed { until },
        _ if record.free_uses_consumed >= limit => Entitlement::Exhausted,
        _ => Entitlement::FreeTier {
            remaining: limit - record.free_uses_consumed,
        },
    }
}

/// Why a request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    /// Never subscribed and the free quota is used up.
    FreeLimitReached { limit: u32 },
    /// A subscription existed but ended at `expired_at`, and the free quota is used up.
    SubscriptionExpired { expired_at: NaiveDateTime },
}

/// A refused signal request. An expected outcome, not a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Denial {
    pub reason: DenialReason,
    /// Admin username to contact for an upgrade, without `@`.
    pub contact: String,
}

impl Denial {
    pub fn headline(&self) -> String {
        match self.reason {
            DenialReason::FreeLimitReached { limit } => format!(
                "All {limit} free signals used. Please subscribe to continue."
            ),
            DenialReason::SubscriptionExpired { expired_at } => format!(
                "Subscription expired on {}. Please subscribe to continue.",
                expired_at.format("%Y-%m-%d")
            ),
        }
    }

    pub fn contact_line(&self) -> String {
        format!("Contact admin: @{}", self.contact)
    }
}

impl fmt::Display for Denial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n{}", self.headline(), self.contact_line())
    }
}

/// Outcome of evaluating the policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Issue a signal; `charge_free_use` says whether the free counter advances.
    Allow { charge_free_use: bool },
    Deny(Denial),
}

/// Free-use limit plus the contact handed out with denials.
#[derive(Debug, Clone)]
pub struct EntitlementPolicy {
    free_signal_limit: u32,
    contact: String,
}

impl EntitlementPolicy {
    pub fn new(free_signal_limit: u32, contact: impl Into<String>) -> Self {
        Self {
            free_signal_limit,
            contact: contact.into(),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.free_signal_limit, config.admin_handle())
    }

    pub fn free_signal_limit(&self) -> u32 {
        self.free_signal_limit
    }

    pub fn entitlement(&self, record: &UserRecord, now: NaiveDateTime) -> Entitlement {
        entitlement(record, now, self.free_signal_limit)
    }

    /// Deny iff unpaid and the free quota is used up; otherwise allow, charging
    /// the free counter iff unpaid.
    pub fn evaluate(&self, record: &UserRecord, now: NaiveDateTime) -> Verdict {
        match self.entitlement(record, now) {
            Entitlement::Subscribed { .. } => Verdict::Allow {
                charge_free_use: false,
            },
            Entitlement::FreeTier { .. } => Verdict::Allow {
                charge_free_use: true,
            },
            Entitlement::Exhausted => {
                let reason = match record.paid_until {
                    Some(expired_at) => DenialReason::SubscriptionExpired { expired_at },
                    None => DenialReason::FreeLimitReached {
                        limit: self.free_signal_limit,
                    },
                };
                Verdict::Deny(Denial {
                    reason,
                    contact: self.contact.clone(),
                })
            }
        }
    }
}
