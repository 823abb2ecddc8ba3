//! Save export and import.
//!
//! Documents produced by this engine round-trip verbatim. Anything else
//! (older formats, foreign saves, hand-edited files) goes through the
//! sanitizer, which rebuilds a canonical state field by field and only
//! gives up when the player's identity is missing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use statecraft_domain::{
    baseline_roster, merge_traits, sanitize_proposed_traits, sync_leadership_flag, Attribute,
    AttributeSet, Background, GameDate, GameState, HistoryEntry, PlayerStats, SupremeLeader,
    Vitals, STARTING_FATE_POINTS,
};
use statecraft_domain::value_objects::{BALANCED_ATTRIBUTE_VALUE, VITAL_MAX, VITAL_MIN};

use crate::infrastructure::ports::ClockPort;
use crate::use_cases::coerce::{
    coerce_bool, coerce_date, coerce_int, coerce_string, coerce_string_list, coerce_trait_list,
    field, json_kind, parse_roster, AnomalySink, Sanitized,
};
use crate::use_cases::turn::MergeRules;

pub const EXPORT_FORMAT: &str = "statecraft-save";
pub const EXPORT_VERSION: u32 = 1;
pub const RECOVERED_HISTORY_NARRATIVE: &str =
    "Records of earlier years were lost. This account resumes from recovered files.";
/// Assumed age when a save carries no birth year.
const ASSUMED_AGE: i32 = 30;

/// Self-describing save document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportDocument {
    pub format: String,
    pub version: u32,
    pub exported_at: DateTime<Utc>,
    pub state: GameState,
}

pub fn export_state(state: &GameState, clock: &dyn ClockPort) -> ExportDocument {
    ExportDocument {
        format: EXPORT_FORMAT.to_string(),
        version: EXPORT_VERSION,
        exported_at: clock.now(),
        state: state.clone(),
    }
}

/// Parses and imports save text.
pub fn import_json(
    text: &str,
    target: GameDate,
    rules: &MergeRules,
) -> Result<Sanitized<GameState>, RepairError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| RepairError::Unrecoverable(e.to_string()))?;
    import_document(&value, target, rules)
}

/// Accepts this engine's own documents verbatim and routes everything else
/// through [`sanitize_state`]. `target` is the calendar context used when
/// the save does not carry a usable date.
pub fn import_document(
    value: &Value,
    target: GameDate,
    rules: &MergeRules,
) -> Result<Sanitized<GameState>, RepairError> {
    let obj = value
        .as_object()
        .ok_or_else(|| RepairError::NotAnObject(json_kind(value)))?;

    let is_native = obj.get("format").and_then(Value::as_str) == Some(EXPORT_FORMAT)
        && obj.get("version").and_then(Value::as_u64) == Some(u64::from(EXPORT_VERSION));
    if is_native {
        match serde_json::from_value::<ExportDocument>(value.clone()) {
            Ok(document) => {
                tracing::debug!(exported_at = %document.exported_at, "Imported native save");
                return Ok(Sanitized::clean(document.state));
            }
            Err(e) => {
                tracing::warn!(error = %e, "Native save failed strict parsing, sanitizing");
            }
        }
    }

    let inner = match obj.get("state") {
        Some(state @ Value::Object(_)) => state,
        _ => value,
    };
    let sanitized = sanitize_state(inner, target, rules)?;
    sanitized.log_anomalies("import");
    Ok(sanitized)
}

/// Rebuilds a canonical state from a partial record.
pub fn sanitize_state(
    raw: &Value,
    target: GameDate,
    rules: &MergeRules,
) -> Result<Sanitized<GameState>, RepairError> {
    let obj = raw
        .as_object()
        .ok_or_else(|| RepairError::NotAnObject(json_kind(raw)))?;
    let player_name = field(obj, &["player_name", "name"])
        .and_then(coerce_string)
        .ok_or(RepairError::MissingIdentity("player_name"))?;

    let mut sink = AnomalySink::default();
    let date = repair_date(obj, target, &mut sink);

    let factions = match field(obj, &["factions"]) {
        Some(raw_roster) => parse_roster(raw_roster).unwrap_or_else(|rejection| {
            sink.push("factions", format!("{}, using baseline roster", rejection));
            baseline_roster(date.year)
        }),
        None => {
            sink.push("factions", "missing, using baseline roster");
            baseline_roster(date.year)
        }
    };

    let empty = Map::new();
    let stats_obj = match field(obj, &["stats"]) {
        Some(Value::Object(stats)) => stats,
        Some(_) => {
            sink.push("stats", "not an object, rebuilding from defaults");
            &empty
        }
        None => &empty,
    };
    let stats = repair_stats(stats_obj, date, &factions, rules, &mut sink);
    let stats = sync_leadership_flag(stats, &player_name, &factions);

    let history = repair_history(obj, date, &mut sink);

    let state = GameState {
        date,
        background: field(obj, &["background"])
            .and_then(coerce_string)
            .and_then(|s| serde_json::from_value::<Background>(Value::String(s.to_lowercase())).ok())
            .unwrap_or_default(),
        player_name,
        stats,
        factions,
        supreme_leader: repair_leader(obj),
        history,
        game_over: field(obj, &["game_over"]).and_then(coerce_bool).unwrap_or(false),
        game_over_reason: field(obj, &["game_over_reason"]).and_then(coerce_string),
        backstory: field(obj, &["backstory"]).and_then(coerce_string).unwrap_or_default(),
        turns_since_critical: int_field(obj, &["turns_since_critical"], "turns_since_critical", &mut sink)
            .map(|n| u32::try_from(n.max(0)).unwrap_or(u32::MAX))
            .unwrap_or(0),
        designated_successor: field(obj, &["designated_successor"]).and_then(coerce_string),
        suggested_heirs: string_list(obj, "suggested_heirs", &mut sink),
        successor_candidates: string_list(obj, "successor_candidates", &mut sink),
        last_power_grant: field(obj, &["last_power_grant"]).and_then(coerce_date),
    };

    Ok(Sanitized {
        value: state,
        anomalies: sink.anomalies,
    })
}

fn repair_date(obj: &Map<String, Value>, target: GameDate, sink: &mut AnomalySink) -> GameDate {
    let parsed = match field(obj, &["date"]) {
        Some(raw) => coerce_date(raw),
        None => coerce_date(&Value::Object(obj.clone())),
    };
    parsed.unwrap_or_else(|| {
        sink.push("date", format!("missing or invalid, using {}", target));
        target
    })
}

fn repair_stats(
    stats: &Map<String, Value>,
    date: GameDate,
    factions: &[statecraft_domain::Faction],
    rules: &MergeRules,
    sink: &mut AnomalySink,
) -> PlayerStats {
    let vitals_obj = match field(stats, &["vitals"]) {
        Some(Value::Object(vitals)) => vitals,
        _ => stats,
    };
    let baseline = Vitals::baseline();
    let mut vital = |keys: &[&str], name: &str, default: i32| {
        int_field(vitals_obj, keys, name, sink)
            .map(|n| n.clamp(i64::from(VITAL_MIN), i64::from(VITAL_MAX)) as i32)
            .unwrap_or(default)
    };
    let vitals = Vitals {
        political_standing: vital(
            &["political_standing", "political"],
            "political_standing",
            baseline.political_standing,
        ),
        health: vital(&["health"], "health", baseline.health),
        mental: vital(&["mental", "mental_resilience"], "mental", baseline.mental),
    };

    let fate_points = match rules.debug_fate {
        Some(pinned) => pinned,
        None => int_field(stats, &["fate_points", "red_stars"], "fate_points", sink)
            .map(|n| n.clamp(0, i64::from(rules.fate_point_cap)) as u32)
            .unwrap_or(STARTING_FATE_POINTS),
    };

    let faction = field(stats, &["faction"])
        .and_then(coerce_string)
        .unwrap_or_else(|| {
            sink.push("stats.faction", "missing, joining the largest faction");
            factions
                .iter()
                .max_by_key(|f| f.share)
                .map(|f| f.name.clone())
                .unwrap_or_default()
        });

    let traits = field(stats, &["traits"])
        .map(|raw| coerce_trait_list(raw, "stats.traits", sink))
        .unwrap_or_default();
    let traits = sanitize_proposed_traits(traits, &rules.trait_rules);
    // duplicate names collapse to the last occurrence
    let (traits, _) = merge_traits(&[], traits, &[]);

    PlayerStats {
        birth_year: int_field(stats, &["birth_year"], "stats.birth_year", sink)
            .and_then(|n| i32::try_from(n).ok())
            .unwrap_or_else(|| {
                sink.push("stats.birth_year", "missing, estimated from date");
                date.year - ASSUMED_AGE
            }),
        vitals,
        fate_points,
        power_points: int_field(stats, &["power_points", "power"], "stats.power_points", sink)
            .map(|n| u32::try_from(n.max(0)).unwrap_or(u32::MAX))
            .unwrap_or(0),
        faction,
        is_leader: field(stats, &["is_leader"]).and_then(coerce_bool).unwrap_or(false),
        inventory: string_list(stats, "inventory", sink),
        attributes: repair_attributes(stats, sink),
        traits,
    }
}

/// Missing attributes take the balanced value; all are clamped.
fn repair_attributes(stats: &Map<String, Value>, sink: &mut AnomalySink) -> AttributeSet {
    let Some(Value::Object(raw)) = field(stats, &["attributes"]) else {
        sink.push("stats.attributes", "missing, using balanced defaults");
        return AttributeSet::balanced();
    };
    let mut attributes = AttributeSet::balanced();
    for attribute in Attribute::all() {
        let value = raw
            .iter()
            .find(|(key, _)| key.parse::<Attribute>().ok() == Some(attribute))
            .and_then(|(_, value)| coerce_int(value))
            .map(|n| n.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32)
            .unwrap_or(BALANCED_ATTRIBUTE_VALUE);
        attributes.set(attribute, value);
    }
    attributes.clamped()
}

fn repair_leader(obj: &Map<String, Value>) -> SupremeLeader {
    let founding = SupremeLeader::founding();
    match field(obj, &["supreme_leader"]) {
        Some(Value::Object(leader)) => SupremeLeader {
            name: field(leader, &["name"]).and_then(coerce_string).unwrap_or(founding.name),
            slogan: field(leader, &["slogan"]).and_then(coerce_string).unwrap_or(founding.slogan),
            symbol: field(leader, &["symbol"]).and_then(coerce_string).unwrap_or(founding.symbol),
        },
        Some(Value::String(name)) if !name.trim().is_empty() => SupremeLeader {
            name: name.trim().to_string(),
            ..founding
        },
        _ => founding,
    }
}

/// Keeps every entry that deserializes; an empty result becomes a single
/// recovered entry.
fn repair_history(obj: &Map<String, Value>, date: GameDate, sink: &mut AnomalySink) -> Vec<HistoryEntry> {
    let mut history = Vec::new();
    match field(obj, &["history"]) {
        Some(Value::Array(entries)) => {
            for (i, entry) in entries.iter().enumerate() {
                match serde_json::from_value::<HistoryEntry>(entry.clone()) {
                    Ok(entry) => history.push(entry),
                    Err(e) => sink.push(format!("history[{}]", i), format!("dropped: {}", e)),
                }
            }
        }
        Some(other) => sink.push("history", format!("expected a list, got {}", json_kind(other))),
        None => {}
    }
    if history.is_empty() {
        sink.push("history", "no usable entries, starting a recovered record");
        history.push(HistoryEntry::narrative_only(date, RECOVERED_HISTORY_NARRATIVE));
    }
    history
}

fn int_field(obj: &Map<String, Value>, keys: &[&str], name: &str, sink: &mut AnomalySink) -> Option<i64> {
    let raw = field(obj, keys)?;
    let parsed = coerce_int(raw);
    if parsed.is_none() {
        sink.push(name, "non-numeric, using default");
    }
    parsed
}

fn string_list(obj: &Map<String, Value>, key: &str, sink: &mut AnomalySink) -> Vec<String> {
    field(obj, &[key])
        .and_then(|raw| coerce_string_list(raw, key, sink))
        .unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepairError {
    #[error("Save must be a JSON object, got {0}")]
    NotAnObject(&'static str),
    #[error("Save is missing required identity field `{0}`")]
    MissingIdentity(&'static str),
    #[error("Save cannot be reconstructed: {0}")]
    Unrecoverable(String),
}
