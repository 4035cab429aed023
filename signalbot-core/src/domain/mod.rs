//! Domain types: user identifiers, user records, signal descriptors.

pub mod ids;
pub mod record;
pub mod signal;

pub use ids::UserId;
pub use record::{UserRecord, UserTable};
pub use signal::{Direction, SignalDescriptor};
