//! Narrative proposal parsing.
//!
//! The collaborator's document is untrusted. Only structural failure is
//! fatal (not JSON, not an object, no narrative text). Every other field is
//! coerced on its own; a bad field falls back to "absent" and is recorded
//! as an anomaly.

use serde_json::{Map, Value};
use statecraft_domain::{
    Attribute, Choice, ChoiceKind, Faction, GameDate, RosterRejection, StatDeltas, TraitCandidate,
    TraitId,
};

use crate::use_cases::coerce::{
    coerce_bool, coerce_date, coerce_i32, coerce_string, coerce_string_list, coerce_trait_list,
    field, json_kind, parse_roster, AnomalySink, Sanitized,
};

/// Outcome of the proposal's faction roster field.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RosterUpdate {
    #[default]
    Absent,
    Replace(Vec<Faction>),
    Rejected(RosterRejection),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LeaderUpdate {
    pub name: Option<String>,
    pub slogan: Option<String>,
    pub symbol: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PlayerFactionUpdate {
    pub name: Option<String>,
    pub is_leader: Option<bool>,
}

/// A coerced proposal. `None` always means "the proposal did not say";
/// the merge keeps the prior value for those fields.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NarrativeProposal {
    pub date: Option<GameDate>,
    pub narrative: String,
    pub deltas: StatDeltas,
    pub choices: Vec<Choice>,
    pub game_over: bool,
    pub game_over_reason: Option<String>,
    pub inventory_add: Vec<String>,
    pub inventory_remove: Vec<String>,
    pub trait_additions: Vec<TraitCandidate>,
    pub trait_removals: Vec<TraitId>,
    pub factions: RosterUpdate,
    pub supreme_leader: Option<LeaderUpdate>,
    pub player_faction: Option<PlayerFactionUpdate>,
    pub successor_candidates: Option<Vec<String>>,
    pub designated_successor: Option<String>,
    pub suggested_heirs: Option<Vec<String>>,
}

/// Structural failure; the turn cannot be merged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProposalError {
    #[error("Proposal is not valid JSON: {0}")]
    NotJson(String),
    #[error("Proposal must be a JSON object, got {0}")]
    NotAnObject(&'static str),
    #[error("Proposal has no narrative text")]
    MissingNarrative,
}

/// Parses raw collaborator output.
pub fn parse_proposal(raw: &str) -> Result<Sanitized<NarrativeProposal>, ProposalError> {
    let body = extract_json_body(raw);
    let value: Value =
        serde_json::from_str(body).map_err(|e| ProposalError::NotJson(e.to_string()))?;
    coerce_proposal(&value)
}

/// Coerces an already parsed document.
pub fn coerce_proposal(value: &Value) -> Result<Sanitized<NarrativeProposal>, ProposalError> {
    let obj = value
        .as_object()
        .ok_or_else(|| ProposalError::NotAnObject(json_kind(value)))?;
    let narrative = field(obj, &["narrative", "story"])
        .and_then(coerce_string)
        .ok_or(ProposalError::MissingNarrative)?;

    let mut sink = AnomalySink::default();
    let (inventory_add, inventory_remove) = coerce_inventory(obj, &mut sink);
    let (trait_additions, trait_removals) = coerce_trait_updates(obj, &mut sink);

    let proposal = NarrativeProposal {
        date: coerce_proposal_date(obj, &mut sink),
        narrative,
        deltas: coerce_deltas(obj, &mut sink),
        choices: coerce_choices(obj, &mut sink),
        game_over: coerce_game_over(obj, &mut sink),
        game_over_reason: field(obj, &["game_over_reason"]).and_then(coerce_string),
        inventory_add,
        inventory_remove,
        trait_additions,
        trait_removals,
        factions: coerce_roster_update(obj, &mut sink),
        supreme_leader: coerce_leader_update(obj, &mut sink),
        player_faction: coerce_player_faction(obj, &mut sink),
        successor_candidates: optional_list(obj, "successor_candidates", &mut sink),
        designated_successor: field(obj, &["designated_successor"]).and_then(coerce_string),
        suggested_heirs: optional_list(obj, "suggested_heirs", &mut sink),
    };

    Ok(Sanitized {
        value: proposal,
        anomalies: sink.anomalies,
    })
}

/// Strips markdown code fences and any prose around the outermost object.
fn extract_json_body(raw: &str) -> &str {
    let trimmed = raw.trim();
    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => &trimmed[start..=end],
        _ => trimmed,
    }
}

/// Missing or invalid: `None`, the merge keeps the prior date.
fn coerce_proposal_date(obj: &Map<String, Value>, sink: &mut AnomalySink) -> Option<GameDate> {
    if let Some(raw) = field(obj, &["date"]) {
        let date = coerce_date(raw);
        if date.is_none() {
            sink.push("date", "not a valid {year, month}, keeping prior date");
        }
        return date;
    }
    // flat year/month at the top level
    if obj.contains_key("year") {
        let date = coerce_date(&Value::Object(obj.clone()));
        if date.is_none() {
            sink.push("year/month", "not a valid date, keeping prior date");
        }
        return date;
    }
    None
}

/// Missing: all zero. Non-numeric entries count as zero.
fn coerce_deltas(obj: &Map<String, Value>, sink: &mut AnomalySink) -> StatDeltas {
    let Some(raw) = field(obj, &["stat_changes", "stats", "deltas"]) else {
        return StatDeltas::default();
    };
    let Some(changes) = raw.as_object() else {
        sink.push("stat_changes", "not an object, ignored");
        return StatDeltas::default();
    };

    let mut delta = |name: &str, keys: &[&str]| -> i32 {
        match field(changes, keys) {
            None => 0,
            Some(value) => coerce_i32(value).unwrap_or_else(|| {
                sink.push(format!("stat_changes.{}", name), "non-numeric, treated as 0");
                0
            }),
        }
    };

    StatDeltas {
        political_standing: delta(
            "political_standing",
            &["political_standing", "political", "standing"],
        ),
        health: delta("health", &["health"]),
        mental: delta("mental", &["mental", "mental_resilience", "sanity"]),
        power_points: delta("power_points", &["power_points", "power"]),
    }
}

/// Missing: empty (the session then offers a free custom action).
fn coerce_choices(obj: &Map<String, Value>, sink: &mut AnomalySink) -> Vec<Choice> {
    let Some(raw) = field(obj, &["choices", "options"]) else {
        return Vec::new();
    };
    let Value::Array(items) = raw else {
        sink.push("choices", "not a list, ignored");
        return Vec::new();
    };

    items
        .iter()
        .enumerate()
        .filter_map(|(i, item)| coerce_choice(item, i, sink))
        .collect()
}

fn coerce_choice(value: &Value, index: usize, sink: &mut AnomalySink) -> Option<Choice> {
    let name = format!("choices[{}]", index);
    // a bare string is a choice with only text
    if let Some(text) = value.as_str().map(str::trim).filter(|s| !s.is_empty()) {
        return Some(Choice::standard(format!("choice_{}", index + 1), text));
    }
    let Some(obj) = value.as_object() else {
        sink.push(name, "not an object, skipped");
        return None;
    };
    let Some(text) = field(obj, &["text", "label"]).and_then(coerce_string) else {
        sink.push(name, "no text, skipped");
        return None;
    };

    let attribute = match field(obj, &["attribute", "stat"]) {
        None => None,
        Some(raw) => {
            let parsed = coerce_string(raw).and_then(|s| s.parse::<Attribute>().ok());
            if parsed.is_none() {
                sink.push(format!("{}.attribute", name), "unknown attribute, ignored");
            }
            parsed
        }
    };
    let difficulty = match field(obj, &["difficulty"]) {
        None => None,
        Some(raw) => {
            let parsed = coerce_i32(raw);
            if parsed.is_none() {
                sink.push(format!("{}.difficulty", name), "non-numeric, using default");
            }
            parsed
        }
    };

    Some(Choice {
        id: field(obj, &["id"])
            .and_then(coerce_string)
            .unwrap_or_else(|| format!("choice_{}", index + 1)),
        text,
        intent: field(obj, &["intent"]).and_then(coerce_string).unwrap_or_default(),
        attribute,
        difficulty,
        kind: ChoiceKind::Standard,
        power_cost: 0,
    })
}

/// Missing or unreadable: false.
fn coerce_game_over(obj: &Map<String, Value>, sink: &mut AnomalySink) -> bool {
    match field(obj, &["game_over"]) {
        None => false,
        Some(raw) => coerce_bool(raw).unwrap_or_else(|| {
            sink.push("game_over", "not a boolean, treated as false");
            false
        }),
    }
}

/// Missing: nothing added or removed.
fn coerce_inventory(obj: &Map<String, Value>, sink: &mut AnomalySink) -> (Vec<String>, Vec<String>) {
    let list = |keys: &[&str], name: &str, source: &Map<String, Value>, sink: &mut AnomalySink| {
        field(source, keys)
            .and_then(|raw| coerce_string_list(raw, name, sink))
            .unwrap_or_default()
    };

    match field(obj, &["inventory"]) {
        Some(Value::Object(inventory)) => (
            list(&["add"], "inventory.add", inventory, sink),
            list(&["remove"], "inventory.remove", inventory, sink),
        ),
        Some(_) => {
            sink.push("inventory", "not an object, ignored");
            (Vec::new(), Vec::new())
        }
        None => (
            list(&["inventory_add"], "inventory_add", obj, sink),
            list(&["inventory_remove"], "inventory_remove", obj, sink),
        ),
    }
}

/// Missing: no trait changes.
fn coerce_trait_updates(
    obj: &Map<String, Value>,
    sink: &mut AnomalySink,
) -> (Vec<TraitCandidate>, Vec<TraitId>) {
    let ids = |raw: Option<&Value>, name: &str, sink: &mut AnomalySink| -> Vec<TraitId> {
        raw.and_then(|raw| coerce_string_list(raw, name, sink))
            .unwrap_or_default()
            .into_iter()
            .map(TraitId::new)
            .collect()
    };

    match field(obj, &["traits"]) {
        Some(Value::Object(traits)) => (
            field(traits, &["add"])
                .map(|raw| coerce_trait_list(raw, "traits.add", sink))
                .unwrap_or_default(),
            ids(field(traits, &["remove"]), "traits.remove", sink),
        ),
        Some(_) => {
            sink.push("traits", "not an object, ignored");
            (Vec::new(), Vec::new())
        }
        None => (
            field(obj, &["new_traits"])
                .map(|raw| coerce_trait_list(raw, "new_traits", sink))
                .unwrap_or_default(),
            ids(field(obj, &["removed_trait_ids"]), "removed_trait_ids", sink),
        ),
    }
}

/// Missing: `Absent`. Anything that is not a valid roster rejects the
/// whole replacement.
fn coerce_roster_update(obj: &Map<String, Value>, sink: &mut AnomalySink) -> RosterUpdate {
    match field(obj, &["factions"]) {
        None => RosterUpdate::Absent,
        Some(raw) => match parse_roster(raw) {
            Ok(roster) => RosterUpdate::Replace(roster),
            Err(rejection) => {
                sink.push("factions", format!("roster rejected: {}", rejection));
                RosterUpdate::Rejected(rejection)
            }
        },
    }
}

/// Missing fields stay `None` and keep the prior value.
fn coerce_leader_update(obj: &Map<String, Value>, sink: &mut AnomalySink) -> Option<LeaderUpdate> {
    let raw = field(obj, &["supreme_leader"])?;
    if let Some(name) = raw.as_str() {
        return Some(LeaderUpdate {
            name: Some(name.trim().to_string()).filter(|s| !s.is_empty()),
            ..LeaderUpdate::default()
        });
    }
    let Some(leader) = raw.as_object() else {
        sink.push("supreme_leader", "not an object, ignored");
        return None;
    };
    let update = LeaderUpdate {
        name: field(leader, &["name"]).and_then(coerce_string),
        slogan: field(leader, &["slogan"]).and_then(coerce_string),
        symbol: field(leader, &["symbol"]).and_then(coerce_string),
    };
    Some(update).filter(|u| *u != LeaderUpdate::default())
}

fn coerce_player_faction(
    obj: &Map<String, Value>,
    sink: &mut AnomalySink,
) -> Option<PlayerFactionUpdate> {
    let raw = field(obj, &["player_faction"])?;
    let Some(update) = raw.as_object() else {
        sink.push("player_faction", "not an object, ignored");
        return None;
    };
    let is_leader = match field(update, &["is_leader", "leader"]) {
        None => None,
        Some(flag) => {
            let parsed = coerce_bool(flag);
            if parsed.is_none() {
                sink.push("player_faction.is_leader", "not a boolean, ignored");
            }
            parsed
        }
    };
    let update = PlayerFactionUpdate {
        name: field(update, &["name", "faction"]).and_then(coerce_string),
        is_leader,
    };
    Some(update).filter(|u| *u != PlayerFactionUpdate::default())
}

fn optional_list(obj: &Map<String, Value>, key: &str, sink: &mut AnomalySink) -> Option<Vec<String>> {
    field(obj, &[key]).and_then(|raw| coerce_string_list(raw, key, sink))
}
