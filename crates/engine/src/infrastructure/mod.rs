//! Infrastructure layer - ports and their adapters.

pub mod clock;
pub mod ports;
pub mod replay;
