//! Domain entities - Core business objects with identity

mod character_trait;
mod choice;
mod faction;
mod game_state;

pub use character_trait::{
    decay_durations, effective_attributes, infer_negative_rarity, merge_traits,
    reconcile_changes, sanitize_proposed_traits, Trait, TraitCandidate, TraitChange,
    TraitChangeKind, TraitDecay, TraitRarity, TraitRules,
};
pub use choice::{
    Choice, ChoiceKind, CUSTOM_CHOICE_ID, DEFAULT_DIFFICULTY, INTERVENE_CHOICE_ID,
    INTERVENE_POWER_COST, PITY_CHOICE_ID,
};
pub use faction::{
    baseline_roster, resolve_theme_color, sync_leadership_flag, validate_roster, Faction,
    RosterRejection, DEFAULT_THEME_COLOR, TOTAL_SHARE,
};
pub use game_state::{
    Background, FactionChange, GameState, HistoryEntry, NewGame, PlayerStats, SupremeLeader,
    FOUNDING_LEADER, FOUNDING_SLOGAN, FOUNDING_SYMBOL, STARTING_FATE_POINTS,
};
