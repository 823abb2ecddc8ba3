//! Statecraft domain.
//!
//! Pure types and ledgers for the turn engine: attributes and traits,
//! factions, check arithmetic, calendar, and the canonical game state.
//! Nothing here performs I/O or draws random numbers.

pub mod entities;
pub mod error;
pub mod ids;
pub mod value_objects;

pub use entities::{
    baseline_roster, decay_durations, effective_attributes, infer_negative_rarity, merge_traits,
    reconcile_changes, resolve_theme_color, sanitize_proposed_traits, sync_leadership_flag,
    validate_roster, Background, Choice, ChoiceKind, Faction, FactionChange, GameState,
    HistoryEntry, NewGame, PlayerStats, RosterRejection, SupremeLeader, Trait, TraitCandidate,
    TraitChange, TraitChangeKind, TraitDecay, TraitRarity, TraitRules, CUSTOM_CHOICE_ID,
    DEFAULT_DIFFICULTY, DEFAULT_THEME_COLOR, FOUNDING_LEADER, INTERVENE_CHOICE_ID,
    INTERVENE_POWER_COST, PITY_CHOICE_ID, STARTING_FATE_POINTS,
};
pub use error::DomainError;
pub use ids::{SessionId, TraitId};
pub use value_objects::{
    Attribute, AttributeModifiers, AttributeSet, CheckOutcome, CheckThresholds, GameDate,
    StatDeltas, Vitals,
};
