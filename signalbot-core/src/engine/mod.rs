//! Engine facade — one call per inbound request.
//!
//! Every mutating operation runs its whole read → decide → mutate → persist
//! sequence under a single lock, so two concurrent requests from the same user
//! can never both observe the same counter value.

pub mod state;

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Duration;
use rand::Rng;
use tracing::{debug, error, info};

use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::domain::{UserId, UserRecord, UserTable};
use crate::error::{ConfigError, ValidationError};
use crate::generator::SignalGenerator;
use crate::policy::{Denial, EntitlementPolicy, Verdict};
use crate::rng::{self, SignalRng};
use crate::store::{JsonFileStore, RecordStore};

pub use state::{EngineState, Grant, IssuedSignal, StatusFooter, UserStatus};

/// The entitlement-and-generation engine.
pub struct Engine<S, C = SystemClock, R = SignalRng> {
    config: EngineConfig,
    policy: EntitlementPolicy,
    generator: SignalGenerator,
    store: S,
    clock: C,
    state: Mutex<EngineState<R>>,
}

impl Engine<JsonFileStore> {
    /// Production wiring: JSON file at `config.data_file`, local clock, entropy RNG.
    pub fn open(config: EngineConfig) -> Result<Self, ConfigError> {
        let store = JsonFileStore::new(config.data_file.clone());
        Self::with_parts(config, store, SystemClock, rng::from_entropy())
    }
}

impl<S, C, R> Engine<S, C, R>
where
    S: RecordStore,
    C: Clock,
    R: Rng,
{
    /// Build an engine from explicit parts and load the table from `store`.
    pub fn with_parts(
        config: EngineConfig,
        store: S,
        clock: C,
        rng: R,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let policy = EntitlementPolicy::from_config(&config);
        let generator = SignalGenerator::from_config(&config)?;
        let table = store.load();
        info!(
            users = table.len(),
            free_signal_limit = config.free_signal_limit,
            instruments = config.instruments.len(),
            "engine ready"
        );
        Ok(Self {
            config,
            policy,
            generator,
            store,
            clock,
            state: Mutex::new(EngineState { table, rng }),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn lock(&self) -> MutexGuard<'_, EngineState<R>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, table: &UserTable) {
        if let Err(err) = self.store.save_all(table) {
            error!(error = %err, "failed to persist user table, in-memory state kept");
        }
    }

    /// Issue a signal to `user`, or explain why not.
    ///
    /// A denial leaves the record untouched and triggers no write.
    pub fn request_signal(&self, user: UserId) -> Result<IssuedSignal, Denial> {
        let mut guard = self.lock();
        let state = &mut *guard;

        let record = state.table.entry(user).or_insert_with(|| {
            info!(%user, "creating user record");
            UserRecord::new()
        });
        let now = self.clock.now();

        let charge_free_use = match self.policy.evaluate(record, now) {
            Verdict::Allow { charge_free_use } => charge_free_use,
            Verdict::Deny(denial) => {
                info!(%user, used = record.free_uses_consumed, "signal denied");
                return Err(denial);
            }
        };

        let signal = self.generator.generate(&record.history, now, &mut state.rng);
        record.push_history(signal.clone(), self.config.history_retention);
        if charge_free_use {
            record.free_uses_consumed += 1;
        }

        let footer = match record.paid_until {
            Some(until) if !charge_free_use => StatusFooter::Subscribed { until: until.date() },
            _ => StatusFooter::Remaining {
                remaining: self
                    .policy
                    .free_signal_limit()
                    .saturating_sub(record.free_uses_consumed),
            },
        };
        info!(
            %user,
            instrument = %signal.instrument,
            direction = %signal.direction,
            execute_at = %signal.execute_at,
            charged = charge_free_use,
            "signal issued"
        );

        self.persist(&state.table);
        Ok(IssuedSignal { signal, footer })
    }

    /// Subscribe `user` for `days` (default from config) starting now.
    ///
    /// Resets the free-use counter and persists immediately. Authorization is
    /// the caller's responsibility.
    pub fn grant_subscription(
        &self,
        user: UserId,
        days: Option<i64>,
    ) -> Result<Grant, ValidationError> {
        let days = days.unwrap_or(self.config.default_subscription_days);
        if days <= 0 {
            return Err(ValidationError::NonPositiveDays(days));
        }
        let length = Duration::try_days(days).ok_or(ValidationError::DaysOutOfRange(days))?;

        let mut guard = self.lock();
        let now = self.clock.now();
        let paid_until = now
            .checked_add_signed(length)
            .ok_or(ValidationError::DaysOutOfRange(days))?;

        let record = guard.table.entry(user).or_default();
        record.paid_until = Some(paid_until);
        record.free_uses_consumed = 0;
        info!(%user, days, %paid_until, "subscription granted");

        self.persist(&guard.table);
        Ok(Grant {
            user,
            days,
            paid_until,
        })
    }

    /// Current standing of `user`, without creating a record.
    pub fn status(&self, user: UserId) -> Option<UserStatus> {
        let guard = self.lock();
        let now = self.clock.now();
        let record = guard.table.get(&user)?;
        debug!(%user, "status lookup");
        Some(UserStatus {
            user,
            entitlement: self.policy.entitlement(record, now),
            free_uses_consumed: record.free_uses_consumed,
            paid_until: record.paid_until,
        })
    }

    /// Snapshot of one user's record.
    pub fn record(&self, user: UserId) -> Option<UserRecord> {
        self.lock().table.get(&user).cloned()
    }

    pub fn user_count(&self) -> usize {
        self.lock().table.len()
    }
}
