//! Narrative request construction.

use serde_json::{json, Value};
use statecraft_domain::{CheckOutcome, GameState};

use crate::infrastructure::ports::NarrativeRequest;
use crate::use_cases::check::ResolvedAction;

pub fn build_request(state: &GameState, action: &ResolvedAction, history_len: usize) -> NarrativeRequest {
    let stats = &state.stats;
    NarrativeRequest {
        date: state.date,
        background: state.background,
        player_name: state.player_name.clone(),
        vitals: stats.vitals,
        fate_points: stats.fate_points,
        power_points: stats.power_points,
        faction: stats.faction.clone(),
        is_leader: stats.is_leader,
        inventory: stats.inventory.clone(),
        effective_attributes: stats.effective_attributes(),
        traits: stats.traits.clone(),
        factions: state.factions.clone(),
        supreme_leader: state.supreme_leader.clone(),
        recent_history: state.recent_history(history_len).to_vec(),
        action: action.text.clone(),
        outcome: action.narrated_outcome().as_tag().to_string(),
        critical: action.outcome == CheckOutcome::CriticalSuccess,
        schema: proposal_schema(),
    }
}

/// JSON schema of the document the collaborator must return.
pub fn proposal_schema() -> Value {
    let string_list = json!({"type": "array", "items": {"type": "string"}});
    let attribute = json!({
        "type": "string",
        "enum": ["physique", "intellect", "willpower", "agility", "charisma", "politics"]
    });

    json!({
        "type": "object",
        "required": ["narrative"],
        "properties": {
            "date": {
                "type": "object",
                "properties": {
                    "year": {"type": "integer"},
                    "month": {"type": "integer", "minimum": 1, "maximum": 12}
                }
            },
            "narrative": {"type": "string"},
            "stat_changes": {
                "type": "object",
                "properties": {
                    "political_standing": {"type": "integer"},
                    "health": {"type": "integer"},
                    "mental": {"type": "integer"},
                    "power_points": {"type": "integer", "maximum": 1}
                }
            },
            "choices": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["id", "text"],
                    "properties": {
                        "id": {"type": "string"},
                        "text": {"type": "string"},
                        "intent": {"type": "string"},
                        "attribute": attribute,
                        "difficulty": {"type": "integer", "minimum": 0, "maximum": 100}
                    }
                }
            },
            "game_over": {"type": "boolean"},
            "game_over_reason": {"type": "string"},
            "inventory": {
                "type": "object",
                "properties": {"add": string_list, "remove": string_list}
            },
            "traits": {
                "type": "object",
                "properties": {
                    "add": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "required": ["name"],
                            "properties": {
                                "id": {"type": "string"},
                                "name": {"type": "string"},
                                "description": {"type": "string"},
                                "rarity": {
                                    "type": "string",
                                    "enum": ["COMMON", "UNCOMMON", "RARE", "EPIC", "LEGENDARY", "NEGATIVE", "CURSED"]
                                },
                                "modifiers": {
                                    "type": "object",
                                    "additionalProperties": {"type": "integer", "minimum": -20, "maximum": 20}
                                },
                                "duration_months": {"type": "integer", "minimum": 1}
                            }
                        }
                    },
                    "remove": string_list
                }
            },
            "factions": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["name", "share", "color"],
                    "properties": {
                        "name": {"type": "string"},
                        "share": {"type": "integer", "minimum": 0, "maximum": 100},
                        "leaders": string_list,
                        "color": {"type": "string"},
                        "alliance": {"type": "string"},
                        "description": {"type": "string"}
                    }
                }
            },
            "supreme_leader": {
                "type": "object",
                "properties": {
                    "name": {"type": "string"},
                    "slogan": {"type": "string"},
                    "symbol": {"type": "string"}
                }
            },
            "player_faction": {
                "type": "object",
                "properties": {
                    "name": {"type": "string"},
                    "is_leader": {"type": "boolean"}
                }
            },
            "successor_candidates": string_list,
            "designated_successor": {"type": "string"},
            "suggested_heirs": string_list
        }
    })
}
