//! Signalbot Core — entitlement policy, signal generation, and user-record storage.
//!
//! This crate contains everything behind the chat commands:
//! - Domain types (user ids, user records, signal descriptors)
//! - Entitlement policy (free-use quota and time-limited subscriptions)
//! - Signal generator with a non-repetition window over recent instruments
//! - Record store (whole-table JSON persistence, in-memory backend)
//! - Engine facade that serializes read → decide → mutate → persist per request

pub mod clock;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod generator;
pub mod policy;
pub mod rng;
pub mod store;
pub mod timefmt;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::EngineConfig;
pub use domain::{Direction, SignalDescriptor, UserId, UserRecord, UserTable};
pub use engine::{Engine, Grant, IssuedSignal, StatusFooter, UserStatus};
pub use error::{parse_days, parse_user_id, ConfigError, StoreError, ValidationError};
pub use generator::SignalGenerator;
pub use policy::{Denial, DenialReason, Entitlement, EntitlementPolicy, Verdict};
pub use store::{JsonFileStore, MemoryStore, RecordStore};
