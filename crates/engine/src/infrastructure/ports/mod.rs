//! Port traits for infrastructure boundaries.
//!
//! These are the only abstractions in the engine. Ports exist for:
//! - Narrative generation (could swap a replay directory for a live model)
//! - Clock/Random (for testing)

mod error;
mod external;
mod testing;

pub use error::NarrativeError;
pub use external::{NarrativePort, NarrativeRequest};
pub use testing::{ClockPort, RandomPort};

#[cfg(test)]
pub use external::MockNarrativePort;
#[cfg(test)]
pub use testing::MockClockPort;
