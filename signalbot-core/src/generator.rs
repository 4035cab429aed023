//! Signal generator — randomized (instrument, direction, execution slot).
//!
//! Instrument draws avoid anything issued in the last `window` signals. When
//! that exclusion covers the whole catalog the draw falls back to the full
//! catalog instead of failing.

use chrono::{Duration, NaiveDateTime, Timelike};
use rand::Rng;

use crate::config::EngineConfig;
use crate::domain::{Direction, SignalDescriptor};
use crate::error::ConfigError;

/// Builds signal descriptors from a fixed catalog.
#[derive(Debug, Clone)]
pub struct SignalGenerator {
    catalog: Vec<String>,
    window: usize,
    base_offset: Duration,
}

impl SignalGenerator {
    pub fn new(
        catalog: Vec<String>,
        window: usize,
        base_offset_minutes: i64,
    ) -> Result<Self, ConfigError> {
        if catalog.is_empty() {
            return Err(ConfigError::Invalid("instrument catalog is empty".into()));
        }
        let base_offset = Duration::try_minutes(base_offset_minutes).ok_or_else(|| {
            ConfigError::Invalid(format!(
                "base_offset_minutes {base_offset_minutes} is out of range"
            ))
        })?;
        Ok(Self {
            catalog,
            window,
            base_offset,
        })
    }

    pub fn from_config(config: &EngineConfig) -> Result<Self, ConfigError> {
        Self::new(
            config.instruments.clone(),
            config.non_repetition_window,
            config.base_offset_minutes,
        )
    }

    /// Instruments eligible for the next draw given `history` (oldest first).
    pub fn candidates<'a>(&'a self, history: &[SignalDescriptor]) -> Vec<&'a str> {
        let start = history.len().saturating_sub(self.window);
        let recent = &history[start..];
        let fresh: Vec<&str> = self
            .catalog
            .iter()
            .map(String::as_str)
            .filter(|name| !recent.iter().any(|s| s.instrument == *name))
            .collect();
        if fresh.is_empty() {
            self.catalog.iter().map(String::as_str).collect()
        } else {
            fresh
        }
    }

    pub fn pick_instrument<R: Rng + ?Sized>(
        &self,
        history: &[SignalDescriptor],
        rng: &mut R,
    ) -> String {
        let candidates = self.candidates(history);
        // never empty: the catalog is non-empty and is the fallback
        candidates[rng.gen_range(0..candidates.len())].to_string()
    }

    pub fn pick_direction<R: Rng + ?Sized>(rng: &mut R) -> Direction {
        if rng.gen_bool(0.5) {
            Direction::Buy
        } else {
            Direction::Sell
        }
    }

    pub fn generate<R: Rng + ?Sized>(
        &self,
        history: &[SignalDescriptor],
        now: NaiveDateTime,
        rng: &mut R,
    ) -> SignalDescriptor {
        let instrument = self.pick_instrument(history, rng);
        let direction = Self::pick_direction(rng);
        SignalDescriptor::new(instrument, direction, execution_slot(now, self.base_offset))
    }
}

/// `now + base_offset`, bumped to the next even minute, seconds truncated.
pub fn execution_slot(now: NaiveDateTime, base_offset: Duration) -> NaiveDateTime {
    let mut slot = now + base_offset;
    if slot.minute() % 2 != 0 {
        slot += Duration::minutes(1);
    }
    slot - Duration::seconds(i64::from(slot.second()))
        - Duration::nanoseconds(i64::from(slot.nanosecond()))
}
