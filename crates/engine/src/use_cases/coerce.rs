//! Per-field coercion of loosely typed JSON.
//!
//! Narrative proposals and foreign saves arrive as JSON written by parties
//! that do not reliably respect types: numbers come back as strings, single
//! values stand in for lists, keys use near-miss spellings. Each helper here
//! turns one field into its typed form or reports why it could not, so the
//! caller can fall back to a documented default and record an [`Anomaly`].

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};
use statecraft_domain::{Attribute, Faction, GameDate, RosterRejection, TraitCandidate};

/// A soft defect that was suppressed by falling back to a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Anomaly {
    pub field: String,
    pub detail: String,
}

impl Anomaly {
    pub fn new(field: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            detail: detail.into(),
        }
    }
}

/// A fully defaulted value plus the anomalies suppressed while building it.
#[derive(Debug, Clone)]
pub struct Sanitized<T> {
    pub value: T,
    pub anomalies: Vec<Anomaly>,
}

impl<T> Sanitized<T> {
    pub fn clean(value: T) -> Self {
        Self {
            value,
            anomalies: Vec::new(),
        }
    }

    pub fn log_anomalies(&self, context: &'static str) {
        for anomaly in &self.anomalies {
            tracing::warn!(
                context,
                field = %anomaly.field,
                detail = %anomaly.detail,
                "Suppressed data anomaly"
            );
        }
    }
}

/// Collects anomalies while a record is being coerced field by field.
#[derive(Debug, Default)]
pub(crate) struct AnomalySink {
    pub(crate) anomalies: Vec<Anomaly>,
}

impl AnomalySink {
    pub(crate) fn push(&mut self, field: impl Into<String>, detail: impl Into<String>) {
        self.anomalies.push(Anomaly::new(field, detail));
    }
}

/// First present, non-null value among `keys`.
pub(crate) fn field<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| obj.get(*key))
        .find(|value| !value.is_null())
}

/// Integers, floats (rounded), and numeric strings.
pub(crate) fn coerce_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.round() as i64)),
        Value::String(s) => {
            let trimmed = s.trim().trim_start_matches('+');
            trimmed.parse::<i64>().ok().or_else(|| {
                trimmed
                    .parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(|f| f.round() as i64)
            })
        }
        _ => None,
    }
}

pub(crate) fn coerce_i32(value: &Value) -> Option<i32> {
    coerce_int(value).map(|n| n.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32)
}

/// Booleans, `"true"`/`"false"`/`"yes"`/`"no"`, and `0`/`1`.
pub(crate) fn coerce_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|n| n != 0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Non-blank strings; numbers are rendered as text.
pub(crate) fn coerce_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// A list of strings. A lone string is treated as a one-element list;
/// non-string elements are skipped and reported.
pub(crate) fn coerce_string_list(
    value: &Value,
    name: &str,
    sink: &mut AnomalySink,
) -> Option<Vec<String>> {
    match value {
        Value::Array(items) => Some(
            items
                .iter()
                .enumerate()
                .filter_map(|(i, item)| {
                    let coerced = coerce_string(item);
                    if coerced.is_none() {
                        sink.push(format!("{}[{}]", name, i), "not a string, skipped");
                    }
                    coerced
                })
                .collect(),
        ),
        Value::String(_) => coerce_string(value).map(|s| vec![s]),
        _ => {
            sink.push(name, "expected a list of strings");
            None
        }
    }
}

/// `{"year": .., "month": ..}` with a valid month.
pub(crate) fn coerce_date(value: &Value) -> Option<GameDate> {
    let obj = value.as_object()?;
    let year = field(obj, &["year"]).and_then(coerce_int)?;
    let month = field(obj, &["month"]).and_then(coerce_int)?;
    let year = i32::try_from(year).ok()?;
    let month = u8::try_from(month).ok()?;
    GameDate::new(year, month).ok()
}

/// Coerces one proposed trait. Returns `None` only when there is no usable
/// name; every other field falls back to a default.
pub(crate) fn coerce_trait_candidate(
    value: &Value,
    name: &str,
    sink: &mut AnomalySink,
) -> Option<TraitCandidate> {
    let Some(obj) = value.as_object() else {
        sink.push(name, "trait is not an object, skipped");
        return None;
    };
    let Some(trait_name) = field(obj, &["name"]).and_then(coerce_string) else {
        sink.push(name, "trait has no name, skipped");
        return None;
    };

    let mut modifiers = BTreeMap::new();
    match field(obj, &["modifiers", "modifier"]) {
        None => {}
        Some(Value::Object(raw_mods)) => {
            for (key, raw) in raw_mods {
                let attribute = match key.parse::<Attribute>() {
                    Ok(attribute) => attribute,
                    Err(_) => {
                        sink.push(format!("{}.modifiers.{}", name, key), "unknown attribute, dropped");
                        continue;
                    }
                };
                let amount = coerce_int(raw).unwrap_or_else(|| {
                    sink.push(format!("{}.modifiers.{}", name, key), "non-numeric, treated as 0");
                    0
                });
                modifiers.insert(attribute, amount);
            }
        }
        Some(_) => sink.push(format!("{}.modifiers", name), "not an object, ignored"),
    }

    let duration_months = match field(obj, &["duration_months", "duration"]) {
        None => None,
        Some(raw) => {
            let coerced = coerce_int(raw);
            if coerced.is_none() {
                sink.push(format!("{}.duration_months", name), "non-numeric, treated as permanent");
            }
            coerced
        }
    };

    Some(TraitCandidate {
        id: field(obj, &["id"]).and_then(coerce_string),
        name: trait_name,
        description: field(obj, &["description"])
            .and_then(coerce_string)
            .unwrap_or_default(),
        rarity: field(obj, &["rarity"]).and_then(coerce_string),
        modifiers,
        duration_months,
    })
}

pub(crate) fn coerce_trait_list(value: &Value, name: &str, sink: &mut AnomalySink) -> Vec<TraitCandidate> {
    match value {
        Value::Array(items) => items
            .iter()
            .enumerate()
            .filter_map(|(i, item)| coerce_trait_candidate(item, &format!("{}[{}]", name, i), sink))
            .collect(),
        _ => {
            sink.push(name, "expected a list of traits");
            Vec::new()
        }
    }
}

/// Strict roster parsing: any entry that does not deserialize rejects the
/// whole roster. Shares and names are then checked by the faction ledger.
pub(crate) fn parse_roster(value: &Value) -> Result<Vec<Faction>, RosterRejection> {
    let Value::Array(items) = value else {
        return Err(RosterRejection::NotAList(json_kind(value).to_string()));
    };
    let factions = items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value::<Faction>(item.clone()).map_err(|e| {
                RosterRejection::MalformedEntry {
                    index,
                    reason: e.to_string(),
                }
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    statecraft_domain::validate_roster(factions)
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
