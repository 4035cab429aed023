use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Directional action of a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Buy,
    Sell,
}

impl Direction {
    pub fn label(self) -> &'static str {
        match self {
            Direction::Buy => "BUY",
            Direction::Sell => "SELL",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One issued signal: instrument, direction and execution slot.
///
/// A value object; never mutated after the generator builds it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalDescriptor {
    pub instrument: String,
    pub direction: Direction,
    #[serde(with = "crate::timefmt")]
    pub execute_at: NaiveDateTime,
}

impl SignalDescriptor {
    pub fn new(
        instrument: impl Into<String>,
        direction: Direction,
        execute_at: NaiveDateTime,
    ) -> Self {
        Self {
            instrument: instrument.into(),
            direction,
            execute_at,
        }
    }

    /// Hour and minute of the execution slot, e.g. `16:04`.
    pub fn slot_label(&self) -> String {
        self.execute_at.format("%H:%M").to_string()
    }
}

impl fmt::Display for SignalDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {} | 2min Candle | Time: {}",
            self.instrument,
            self.direction,
            self.slot_label()
        )
    }
}
