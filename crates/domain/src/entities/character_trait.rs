//! Character traits and the trait ledger.
//!
//! Traits arrive from an untrusted narrative generator. Everything in this
//! module degrades bad input to safe defaults instead of failing:
//! - modifier values are clamped to `[-20, 20]` and zero entries dropped
//! - unknown rarity tags fall back to `Common`
//! - purely negative modifier patterns have their rarity re-derived, no
//!   matter what the generator claimed
//!
//! Active traits are unique by name. Adding a trait whose name is already
//! active evicts the old one; the eviction is logged as a removal and
//! [`reconcile_changes`] later folds the pair into a single update.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::ids::TraitId;
use crate::value_objects::{Attribute, AttributeModifiers, AttributeSet};

// =============================================================================
// Rarity
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TraitRarity {
    #[default]
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
    /// Ordinary negative trait.
    Negative,
    /// Most severe negative trait.
    Cursed,
}

impl TraitRarity {
    pub fn as_tag(&self) -> &'static str {
        match self {
            TraitRarity::Common => "COMMON",
            TraitRarity::Uncommon => "UNCOMMON",
            TraitRarity::Rare => "RARE",
            TraitRarity::Epic => "EPIC",
            TraitRarity::Legendary => "LEGENDARY",
            TraitRarity::Negative => "NEGATIVE",
            TraitRarity::Cursed => "CURSED",
        }
    }
}

impl fmt::Display for TraitRarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

impl FromStr for TraitRarity {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "COMMON" => Ok(TraitRarity::Common),
            "UNCOMMON" => Ok(TraitRarity::Uncommon),
            "RARE" => Ok(TraitRarity::Rare),
            "EPIC" => Ok(TraitRarity::Epic),
            "LEGENDARY" => Ok(TraitRarity::Legendary),
            "NEGATIVE" => Ok(TraitRarity::Negative),
            "CURSED" => Ok(TraitRarity::Cursed),
            _ => Err(DomainError::parse(format!("Unknown trait rarity: {}", s))),
        }
    }
}

// =============================================================================
// Rules
// =============================================================================

/// Tunable constants for trait validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraitRules {
    /// Modifier values are clamped to `[-modifier_bound, modifier_bound]`.
    pub modifier_bound: i32,
    /// A purely negative trait whose modifier sum is below this (and which
    /// lowers politics) is `Cursed`.
    pub severe_sum_threshold: i32,
}

impl Default for TraitRules {
    fn default() -> Self {
        Self {
            modifier_bound: 20,
            severe_sum_threshold: -15,
        }
    }
}

// =============================================================================
// Trait
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trait {
    pub id: TraitId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub rarity: TraitRarity,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub modifiers: AttributeModifiers,
    /// Remaining months; `None` means permanent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_months: Option<u32>,
}

impl Trait {
    pub fn is_permanent(&self) -> bool {
        self.duration_months.is_none()
    }
}

/// A trait as proposed, after per-field coercion but before validation.
///
/// Field coercion (stringified numbers, unknown attribute keys) happens at
/// the proposal boundary; this type only carries values that already have
/// the right shape.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraitCandidate {
    pub id: Option<String>,
    pub name: String,
    pub description: String,
    pub rarity: Option<String>,
    pub modifiers: BTreeMap<Attribute, i64>,
    pub duration_months: Option<i64>,
}

/// Derived values: base plus every active trait's modifiers, exactly.
pub fn effective_attributes(base: &AttributeSet, traits: &[Trait]) -> AttributeSet {
    let mut effective = *base;
    for t in traits {
        effective.apply_modifiers(&t.modifiers);
    }
    effective
}

/// Re-derives rarity for purely negative modifier patterns.
///
/// Returns `None` when the pattern is not purely negative, in which case
/// the proposed tag stands (or `Common` if it is unknown).
pub fn infer_negative_rarity(
    modifiers: &AttributeModifiers,
    rules: &TraitRules,
) -> Option<TraitRarity> {
    if modifiers.is_empty() || modifiers.values().any(|v| *v >= 0) {
        return None;
    }
    let sum: i32 = modifiers.values().sum();
    let lowers_politics = modifiers
        .get(&Attribute::Politics)
        .is_some_and(|v| *v < 0);
    if sum < rules.severe_sum_threshold && lowers_politics {
        Some(TraitRarity::Cursed)
    } else {
        Some(TraitRarity::Negative)
    }
}

fn sanitize_one(candidate: TraitCandidate, rules: &TraitRules) -> Option<Trait> {
    let name = candidate.name.trim().to_string();
    if name.is_empty() {
        return None;
    }
    // already expired on arrival
    if candidate.duration_months.is_some_and(|months| months <= 0) {
        return None;
    }

    let bound = i64::from(rules.modifier_bound);
    let modifiers: AttributeModifiers = candidate
        .modifiers
        .into_iter()
        .map(|(attribute, value)| (attribute, value.clamp(-bound, bound) as i32))
        .filter(|(_, value)| *value != 0)
        .collect();

    let id = candidate
        .id
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
        .map(TraitId::new)
        .unwrap_or_else(TraitId::generate);

    let proposed = candidate
        .rarity
        .as_deref()
        .and_then(|tag| tag.parse::<TraitRarity>().ok())
        .unwrap_or_default();
    let rarity = infer_negative_rarity(&modifiers, rules).unwrap_or(proposed);

    let duration_months = candidate
        .duration_months
        .map(|months| u32::try_from(months).unwrap_or(u32::MAX));

    Some(Trait {
        id,
        name,
        description: candidate.description.trim().to_string(),
        rarity,
        modifiers,
        duration_months,
    })
}

/// Validates proposed traits. Never fails: nameless and already-expired
/// candidates are dropped and every other defect is replaced by a safe
/// default.
pub fn sanitize_proposed_traits(candidates: Vec<TraitCandidate>, rules: &TraitRules) -> Vec<Trait> {
    candidates
        .into_iter()
        .filter_map(|candidate| sanitize_one(candidate, rules))
        .collect()
}

// =============================================================================
// Change log
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TraitChangeKind {
    Added,
    Removed,
    Updated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraitChange {
    pub kind: TraitChangeKind,
    pub trait_id: TraitId,
    pub name: String,
    /// Rarity at the time of the change.
    pub rarity: TraitRarity,
}

impl TraitChange {
    pub fn of(kind: TraitChangeKind, t: &Trait) -> Self {
        Self {
            kind,
            trait_id: t.id.clone(),
            name: t.name.clone(),
            rarity: t.rarity,
        }
    }
}

/// Applies removals (by id) and then additions (by name).
pub fn merge_traits(
    active: &[Trait],
    additions: Vec<Trait>,
    removal_ids: &[TraitId],
) -> (Vec<Trait>, Vec<TraitChange>) {
    let mut log = Vec::new();
    let mut next: Vec<Trait> = Vec::with_capacity(active.len() + additions.len());

    for t in active {
        if removal_ids.contains(&t.id) {
            log.push(TraitChange::of(TraitChangeKind::Removed, t));
        } else {
            next.push(t.clone());
        }
    }

    for mut addition in additions {
        if let Some(pos) = next.iter().position(|t| t.name == addition.name) {
            let evicted = next.remove(pos);
            log.push(TraitChange::of(TraitChangeKind::Removed, &evicted));
        }
        // ids must stay unique among active traits
        if next.iter().any(|t| t.id == addition.id) {
            addition.id = TraitId::generate();
        }
        log.push(TraitChange::of(TraitChangeKind::Added, &addition));
        next.push(addition);
    }

    (next, log)
}

/// Collapses a `Removed` + `Added` pair sharing a name into one `Updated`
/// entry carrying the new trait's id and rarity.
pub fn reconcile_changes(changes: Vec<TraitChange>) -> Vec<TraitChange> {
    let added_names: Vec<String> = changes
        .iter()
        .filter(|c| c.kind == TraitChangeKind::Added)
        .map(|c| c.name.clone())
        .collect();
    let removed_names: Vec<String> = changes
        .iter()
        .filter(|c| c.kind == TraitChangeKind::Removed)
        .map(|c| c.name.clone())
        .collect();

    changes
        .into_iter()
        .filter_map(|mut change| {
            let paired = match change.kind {
                TraitChangeKind::Added => removed_names.contains(&change.name),
                TraitChangeKind::Removed => added_names.contains(&change.name),
                TraitChangeKind::Updated => false,
            };
            match (paired, change.kind) {
                (true, TraitChangeKind::Removed) => None,
                (true, TraitChangeKind::Added) => {
                    change.kind = TraitChangeKind::Updated;
                    Some(change)
                }
                _ => Some(change),
            }
        })
        .collect()
}

/// Result of ageing the active trait list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraitDecay {
    pub remaining: Vec<Trait>,
    pub expired: Vec<Trait>,
}

/// Reduces every timed trait by `months_elapsed`; traits reaching zero are
/// dropped. Permanent traits are untouched.
pub fn decay_durations(active: &[Trait], months_elapsed: u32) -> TraitDecay {
    let mut decay = TraitDecay::default();
    for t in active {
        match t.duration_months {
            Some(months) => {
                let left = months.saturating_sub(months_elapsed);
                if left == 0 {
                    decay.expired.push(t.clone());
                } else {
                    let mut aged = t.clone();
                    aged.duration_months = Some(left);
                    decay.remaining.push(aged);
                }
            }
            None => decay.remaining.push(t.clone()),
        }
    }
    decay
}
