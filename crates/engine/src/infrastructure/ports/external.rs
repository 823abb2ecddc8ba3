//! External service port: the narrative-generation collaborator.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use statecraft_domain::{
    AttributeSet, Background, Faction, GameDate, HistoryEntry, SupremeLeader, Trait, Vitals,
};

use super::NarrativeError;

// =============================================================================
// Narrative Types
// =============================================================================

/// Everything the collaborator needs to write the next turn.
///
/// Built from the prior canonical state and the resolved action; the
/// collaborator answers with a document shaped like `schema`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NarrativeRequest {
    pub date: GameDate,
    pub background: Background,
    pub player_name: String,
    pub vitals: Vitals,
    pub fate_points: u32,
    pub power_points: u32,
    pub faction: String,
    pub is_leader: bool,
    pub inventory: Vec<String>,
    pub effective_attributes: AttributeSet,
    pub traits: Vec<Trait>,
    pub factions: Vec<Faction>,
    pub supreme_leader: SupremeLeader,
    pub recent_history: Vec<HistoryEntry>,
    pub action: String,
    /// Outcome tag as narrated (an accepted critical is narrated as `SUCCESS`).
    pub outcome: String,
    pub critical: bool,
    pub schema: Value,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NarrativePort: Send + Sync {
    /// Returns the raw proposal document text.
    async fn generate(&self, request: NarrativeRequest) -> Result<String, NarrativeError>;
}
