//! Use cases - Turn engine orchestration.
//!
//! Each module covers one area of a turn: resolving the player's check,
//! merging the narrative proposal, and repairing saved games.

pub mod check;
pub mod coerce;
pub mod persistence;
pub mod turn;

pub use check::{CheckError, CheckResolver, CheckState, CheckStep, ResolvedAction};
pub use coerce::{Anomaly, Sanitized};
pub use persistence::{export_state, import_document, import_json, ExportDocument, RepairError};
pub use turn::{ResolveTurn, SuccessorError, TurnError, TurnResult};
