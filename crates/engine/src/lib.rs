//! Statecraft Engine library.
//!
//! Turn engine for a narrative political simulation. The engine owns the
//! canonical game state; an external narrative collaborator only proposes
//! changes, which are sanitized and merged here.
//!
//! ## Structure
//!
//! - `use_cases/` - Check resolution, turn merging, save repair
//! - `infrastructure/` - Ports and their adapters (clock, random, replay)
//! - `session` - One live game and its mutating entry points
//! - `config` - Environment-driven engine settings

pub mod config;
pub mod infrastructure;
pub mod session;
pub mod use_cases;

pub use config::EngineConfig;
pub use infrastructure::clock::{SystemClock, SystemRandom};
pub use infrastructure::ports::{
    ClockPort, NarrativeError, NarrativePort, NarrativeRequest, RandomPort,
};
pub use infrastructure::replay::ReplayNarrative;
pub use session::{GameSession, SessionError, SessionPorts};
pub use use_cases::{
    export_state, import_document, import_json, Anomaly, CheckError, CheckState, CheckStep,
    ExportDocument, RepairError, ResolvedAction, Sanitized, TurnError,
};
