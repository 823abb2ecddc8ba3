//! Turn merge: prior state + resolved action + proposal -> next state.
//!
//! Pure and deterministic. Every invariant of the canonical state is
//! re-established here regardless of what the proposal claims.

use statecraft_domain::{
    decay_durations, merge_traits, reconcile_changes, sanitize_proposed_traits,
    sync_leadership_flag, CheckOutcome, ChoiceKind, FactionChange, GameDate, GameState,
    HistoryEntry, PlayerStats, RosterRejection, TraitChange, TraitChangeKind, TraitDecay,
    TraitRules,
};

use super::proposal::{NarrativeProposal, RosterUpdate};
use crate::use_cases::check::ResolvedAction;

pub const HEALTH_DEATH_REASON: &str =
    "Your health gave out. You died before your work was finished.";
pub const POLITICAL_PURGE_REASON: &str =
    "Your political standing collapsed. You were purged from the Party.";
pub const MENTAL_COLLAPSE_REASON: &str =
    "The pressure broke you. You withdrew from public life for good.";
pub const GENERIC_ENDING_REASON: &str = "Your story has come to an end.";

/// Tunables of the merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeRules {
    pub fate_point_cap: u32,
    /// When set, fate points are pinned to this value every turn.
    pub debug_fate: Option<u32>,
    pub grant_cooldown_months: u32,
    pub trait_rules: TraitRules,
}

impl Default for MergeRules {
    fn default() -> Self {
        Self {
            fate_point_cap: 5,
            debug_fate: None,
            grant_cooldown_months: 3,
            trait_rules: TraitRules::default(),
        }
    }
}

/// What happened to the proposal's power-point request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerGrant {
    /// No gain was requested; losses pass through unchanged.
    NotRequested,
    Granted,
    RejectedNotLeader,
    RejectedCooldown { months_remaining: i64 },
}

/// Decisions taken while merging, for logging and callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeReport {
    pub elapsed_months: u32,
    /// The proposal's date ran backwards and was replaced by the prior date.
    pub date_clamped: bool,
    pub roster_rejection: Option<RosterRejection>,
    pub power_grant: PowerGrant,
    /// Game over was forced by a depleted vital.
    pub forced_game_over: bool,
    pub leadership_ended: bool,
}

#[derive(Debug, Clone)]
pub struct MergedTurn {
    pub state: GameState,
    pub report: MergeReport,
}

pub fn merge_turn(
    prior: &GameState,
    action: &ResolvedAction,
    proposal: NarrativeProposal,
    rules: &MergeRules,
) -> MergedTurn {
    // 1. calendar
    let (date, date_clamped) = match proposal.date {
        Some(proposed) if proposed < prior.date => (prior.date, true),
        Some(proposed) => (proposed, false),
        None => (prior.date, false),
    };
    let elapsed_months = prior.date.elapsed_until(&date);

    // 2. traits
    let decay = if elapsed_months > 0 {
        decay_durations(&prior.stats.traits, elapsed_months)
    } else {
        TraitDecay {
            remaining: prior.stats.traits.clone(),
            expired: Vec::new(),
        }
    };
    let additions = sanitize_proposed_traits(proposal.trait_additions, &rules.trait_rules);
    let (traits, merge_log) = merge_traits(&decay.remaining, additions, &proposal.trait_removals);
    let mut trait_log: Vec<TraitChange> = decay
        .expired
        .iter()
        .map(|t| TraitChange::of(TraitChangeKind::Removed, t))
        .collect();
    trait_log.extend(merge_log);
    let trait_changes = reconcile_changes(trait_log);

    // 3. inventory
    let mut inventory: Vec<String> = prior
        .stats
        .inventory
        .iter()
        .filter(|item| !proposal.inventory_remove.contains(item))
        .cloned()
        .collect();
    inventory.extend(proposal.inventory_add);

    // 4. roster
    let (factions, roster_rejection) = match proposal.factions {
        RosterUpdate::Absent => (prior.factions.clone(), None),
        RosterUpdate::Replace(roster) => (roster, None),
        RosterUpdate::Rejected(rejection) => (prior.factions.clone(), Some(rejection)),
    };

    // 5. player faction
    let mut stats = PlayerStats {
        inventory,
        traits,
        ..prior.stats.clone()
    };
    let mut faction_change = None;
    let explicit_leadership = match &proposal.player_faction {
        Some(update) => {
            if let Some(name) = update.name.as_ref().filter(|n| **n != stats.faction) {
                faction_change = Some(FactionChange {
                    from: stats.faction.clone(),
                    to: name.clone(),
                });
                stats.faction = name.clone();
            }
            if let Some(is_leader) = update.is_leader {
                stats.is_leader = is_leader;
            }
            update.is_leader.is_some()
        }
        None => false,
    };
    if !explicit_leadership {
        stats = sync_leadership_flag(stats, &prior.player_name, &factions);
    }

    // 6. supreme leader
    let mut supreme_leader = prior.supreme_leader.clone();
    if let Some(update) = proposal.supreme_leader {
        if let Some(name) = update.name {
            supreme_leader.name = name;
        }
        if let Some(slogan) = update.slogan {
            supreme_leader.slogan = slogan;
        }
        if let Some(symbol) = update.symbol {
            supreme_leader.symbol = symbol;
        }
    }

    // 7. vitals
    stats.vitals = prior.stats.vitals.apply(&proposal.deltas);

    // 8. power
    let (power_delta, power_grant) = resolve_power_request(
        proposal.deltas.power_points,
        stats.is_leader,
        prior.last_power_grant,
        date,
        rules.grant_cooldown_months,
    );
    let after_gain = (i64::from(prior.stats.power_points) + power_delta).max(0);
    let after_cost = (after_gain - i64::from(action.power_cost)).max(0);
    stats.power_points = u32::try_from(after_cost).unwrap_or(u32::MAX);
    let last_power_grant = match power_grant {
        PowerGrant::Granted => Some(date),
        _ => prior.last_power_grant,
    };

    // 9. fate
    stats.fate_points = match rules.debug_fate {
        Some(pinned) => pinned,
        None => prior
            .stats
            .fate_points
            .saturating_add(u32::from(action.outcome == CheckOutcome::CriticalSuccess))
            .saturating_sub(action.fate_points_consumed)
            .min(rules.fate_point_cap),
    };
    let turns_since_critical = if action.natural_critical || action.choice_kind == ChoiceKind::Pity {
        0
    } else {
        prior.turns_since_critical.saturating_add(1)
    };

    // 10. game over
    let forced_reason = if stats.vitals.health == 0 {
        Some(HEALTH_DEATH_REASON)
    } else if stats.vitals.political_standing == 0 {
        Some(POLITICAL_PURGE_REASON)
    } else if stats.vitals.mental == 0 {
        Some(MENTAL_COLLAPSE_REASON)
    } else {
        None
    };
    let game_over = proposal.game_over || forced_reason.is_some();
    let game_over_reason = if game_over {
        Some(
            proposal
                .game_over_reason
                .or_else(|| forced_reason.map(str::to_string))
                .unwrap_or_else(|| GENERIC_ENDING_REASON.to_string()),
        )
    } else {
        None
    };

    // 11. succession
    let leadership_ended = game_over && (prior.stats.is_leader || stats.is_leader);
    let successor_candidates = if leadership_ended {
        dedup_names(proposal.successor_candidates.unwrap_or_default())
    } else {
        Vec::new()
    };
    let designated_successor = proposal
        .designated_successor
        .or_else(|| prior.designated_successor.clone());
    let suggested_heirs = proposal
        .suggested_heirs
        .map(dedup_names)
        .unwrap_or_else(|| prior.suggested_heirs.clone());

    // 12. history
    let entry = HistoryEntry {
        date,
        narrative: proposal.narrative,
        action: Some(action.text.clone()),
        outcome: Some(action.outcome),
        trait_changes,
        fate_delta: nonzero_delta(prior.stats.fate_points, stats.fate_points),
        power_delta: nonzero_delta(prior.stats.power_points, stats.power_points),
        faction_change,
    };
    let mut history = prior.history.clone();
    history.push(entry);

    let state = GameState {
        date,
        background: prior.background,
        player_name: prior.player_name.clone(),
        stats,
        factions,
        supreme_leader,
        history,
        game_over,
        game_over_reason,
        backstory: prior.backstory.clone(),
        turns_since_critical,
        designated_successor,
        suggested_heirs,
        successor_candidates,
        last_power_grant,
    };

    MergedTurn {
        state,
        report: MergeReport {
            elapsed_months,
            date_clamped,
            roster_rejection,
            power_grant,
            forced_game_over: forced_reason.is_some() && !proposal.game_over,
            leadership_ended,
        },
    }
}

/// Caps the request at +1 and gates gains on leadership and cooldown.
/// Returns the delta to apply and the decision taken.
fn resolve_power_request(
    requested: i32,
    is_leader: bool,
    last_grant: Option<GameDate>,
    date: GameDate,
    cooldown_months: u32,
) -> (i64, PowerGrant) {
    let requested = i64::from(requested.min(1));
    if requested <= 0 {
        return (requested, PowerGrant::NotRequested);
    }
    if !is_leader {
        return (0, PowerGrant::RejectedNotLeader);
    }
    if let Some(last) = last_grant {
        let since = date.months_since(&last);
        let cooldown = i64::from(cooldown_months);
        if since < cooldown {
            return (
                0,
                PowerGrant::RejectedCooldown {
                    months_remaining: cooldown - since,
                },
            );
        }
    }
    (1, PowerGrant::Granted)
}

fn nonzero_delta(before: u32, after: u32) -> Option<i32> {
    let delta = i64::from(after) - i64::from(before);
    (delta != 0).then(|| i32::try_from(delta).unwrap_or(i32::MAX))
}

fn dedup_names(names: Vec<String>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        let name = name.trim().to_string();
        if !name.is_empty() && !unique.contains(&name) {
            unique.push(name);
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::use_cases::turn::proposal::{LeaderUpdate, PlayerFactionUpdate};
    use statecraft_domain::{
        Attribute, AttributeSet, Background, CheckOutcome, Faction, NewGame, StatDeltas, Trait,
        TraitCandidate, TraitId, TraitRarity, FOUNDING_LEADER,
    };
    use std::collections::BTreeMap;

    fn date(year: i32, month: u8) -> GameDate {
        GameDate::new(year, month).unwrap()
    }

    fn prior() -> GameState {
        GameState::new_game(NewGame {
            start: date(1950, 1),
            background: Background::Cadre,
            player_name: "Wei".to_string(),
            birth_year: 1920,
            faction: "Vanguard".to_string(),
            attributes: AttributeSet::balanced(),
            backstory: String::new(),
        })
        .unwrap()
    }

    fn leader() -> GameState {
        let mut state = prior();
        state.stats.is_leader = true;
        state
    }

    fn action(outcome: CheckOutcome) -> ResolvedAction {
        ResolvedAction::direct("Speak at the plenum", ChoiceKind::Standard, outcome)
    }

    fn proposal(narrative: &str) -> NarrativeProposal {
        NarrativeProposal {
            narrative: narrative.to_string(),
            ..NarrativeProposal::default()
        }
    }

    fn merge(prior: &GameState, proposal: NarrativeProposal) -> MergedTurn {
        merge_turn(prior, &action(CheckOutcome::Success), proposal, &MergeRules::default())
    }

    fn timed_trait(id: &str, name: &str, months: u32) -> Trait {
        Trait {
            id: TraitId::new(id),
            name: name.to_string(),
            description: String::new(),
            rarity: TraitRarity::Common,
            modifiers: BTreeMap::new(),
            duration_months: Some(months),
        }
    }

    #[test]
    fn appends_exactly_one_history_entry() {
        let before = prior();
        let merged = merge(&before, proposal("The meeting ends."));
        assert_eq!(merged.state.history.len(), before.history.len() + 1);
        let entry = merged.state.history.last().unwrap();
        assert_eq!(entry.narrative, "The meeting ends.");
        assert_eq!(entry.action.as_deref(), Some("Speak at the plenum"));
        assert_eq!(entry.outcome, Some(CheckOutcome::Success));
        assert_eq!(entry.date, before.date);
    }

    #[test]
    fn time_never_runs_backwards() {
        let mut before = prior();
        before.date = date(1952, 6);
        let merged = merge(
            &before,
            NarrativeProposal {
                date: Some(date(1951, 1)),
                ..proposal("x")
            },
        );
        assert_eq!(merged.state.date, date(1952, 6));
        assert_eq!(merged.report.elapsed_months, 0);
        assert!(merged.report.date_clamped);
    }

    #[test]
    fn vitals_are_clamped() {
        let mut before = prior();
        before.stats.vitals.health = 10;
        before.stats.vitals.mental = 90;
        let merged = merge(
            &before,
            NarrativeProposal {
                deltas: StatDeltas {
                    health: -500,
                    mental: 500,
                    ..StatDeltas::default()
                },
                ..proposal("x")
            },
        );
        assert_eq!(merged.state.stats.vitals.health, 0);
        assert_eq!(merged.state.stats.vitals.mental, 100);
    }

    #[test]
    fn game_over_priority_prefers_health() {
        let merged = merge(
            &prior(),
            NarrativeProposal {
                deltas: StatDeltas {
                    health: -100,
                    political_standing: -100,
                    ..StatDeltas::default()
                },
                ..proposal("x")
            },
        );
        assert!(merged.state.game_over);
        assert_eq!(merged.state.game_over_reason.as_deref(), Some(HEALTH_DEATH_REASON));
        assert!(merged.report.forced_game_over);
    }

    #[test]
    fn proposal_reason_wins_over_canned_reason() {
        let merged = merge(
            &prior(),
            NarrativeProposal {
                deltas: StatDeltas {
                    mental: -100,
                    ..StatDeltas::default()
                },
                game_over: true,
                game_over_reason: Some("Exiled to a re-education camp.".to_string()),
                ..proposal("x")
            },
        );
        assert_eq!(
            merged.state.game_over_reason.as_deref(),
            Some("Exiled to a re-education camp.")
        );
        assert!(!merged.report.forced_game_over);
    }

    #[test]
    fn reason_without_flag_is_ignored() {
        let merged = merge(
            &prior(),
            NarrativeProposal {
                game_over_reason: Some("stray".to_string()),
                ..proposal("x")
            },
        );
        assert!(!merged.state.game_over);
        assert_eq!(merged.state.game_over_reason, None);
    }

    #[test]
    fn proposal_reason_explains_forced_game_over() {
        let merged = merge(
            &prior(),
            NarrativeProposal {
                deltas: StatDeltas {
                    health: -200,
                    ..StatDeltas::default()
                },
                game_over_reason: Some("Executed by firing squad.".to_string()),
                ..proposal("x")
            },
        );
        assert!(merged.state.game_over);
        assert_eq!(
            merged.state.game_over_reason.as_deref(),
            Some("Executed by firing squad.")
        );
        assert!(merged.report.forced_game_over);
    }

    #[test]
    fn power_grant_respects_cooldown() {
        let mut before = leader();
        before.date = date(1950, 1);
        let request = |month: u8| NarrativeProposal {
            date: Some(date(1950, month)),
            deltas: StatDeltas {
                power_points: 1,
                ..StatDeltas::default()
            },
            ..proposal("x")
        };

        let first = merge(&before, request(1));
        assert_eq!(first.report.power_grant, PowerGrant::Granted);
        assert_eq!(first.state.stats.power_points, 1);
        assert_eq!(first.state.last_power_grant, Some(date(1950, 1)));

        let second = merge(&first.state, request(2));
        assert_eq!(
            second.report.power_grant,
            PowerGrant::RejectedCooldown { months_remaining: 2 }
        );
        assert_eq!(second.state.stats.power_points, 1);
        assert_eq!(second.state.last_power_grant, Some(date(1950, 1)));

        let fourth = merge(&second.state, request(4));
        assert_eq!(fourth.report.power_grant, PowerGrant::Granted);
        assert_eq!(fourth.state.stats.power_points, 2);
    }

    #[test]
    fn power_gain_is_capped_and_leader_only() {
        let oversized = NarrativeProposal {
            deltas: StatDeltas {
                power_points: 7,
                ..StatDeltas::default()
            },
            ..proposal("x")
        };
        let merged = merge(&leader(), oversized.clone());
        assert_eq!(merged.state.stats.power_points, 1);

        let merged = merge(&prior(), oversized);
        assert_eq!(merged.report.power_grant, PowerGrant::RejectedNotLeader);
        assert_eq!(merged.state.stats.power_points, 0);
    }

    #[test]
    fn power_losses_and_costs_floor_at_zero() {
        let mut before = leader();
        before.stats.power_points = 2;
        let mut spend = action(CheckOutcome::Success);
        spend.power_cost = 1;
        let merged = merge_turn(
            &before,
            &spend,
            NarrativeProposal {
                deltas: StatDeltas {
                    power_points: -3,
                    ..StatDeltas::default()
                },
                ..proposal("x")
            },
            &MergeRules::default(),
        );
        assert_eq!(merged.state.stats.power_points, 0);
        assert_eq!(merged.state.history.last().unwrap().power_delta, Some(-2));
    }

    #[test]
    fn fate_points_gain_on_critical_and_respect_cap() {
        let mut before = prior();
        before.stats.fate_points = 5;
        let critical = action(CheckOutcome::CriticalSuccess);
        let merged = merge_turn(&before, &critical, proposal("x"), &MergeRules::default());
        assert_eq!(merged.state.stats.fate_points, 5);
        assert_eq!(merged.state.turns_since_critical, 0);

        let mut rerolled = action(CheckOutcome::Failure);
        rerolled.fate_points_consumed = 2;
        before.stats.fate_points = 1;
        before.turns_since_critical = 4;
        let merged = merge_turn(&before, &rerolled, proposal("x"), &MergeRules::default());
        assert_eq!(merged.state.stats.fate_points, 0);
        assert_eq!(merged.state.turns_since_critical, 5);
        assert_eq!(merged.state.history.last().unwrap().fate_delta, Some(-1));
    }

    #[test]
    fn customized_critical_that_fails_still_costs_a_fate_point() {
        let before = prior();
        let customized = ResolvedAction {
            natural_critical: true,
            fate_points_consumed: 1,
            draws: vec![97, 30],
            ..action(CheckOutcome::Failure)
        };
        let merged = merge_turn(&before, &customized, proposal("x"), &MergeRules::default());
        assert_eq!(merged.state.stats.fate_points, before.stats.fate_points - 1);
        assert_eq!(merged.state.history.last().unwrap().fate_delta, Some(-1));
        assert_eq!(merged.state.turns_since_critical, 0);
    }

    #[test]
    fn debug_override_pins_fate_points() {
        let rules = MergeRules {
            debug_fate: Some(99),
            ..MergeRules::default()
        };
        let merged = merge_turn(&prior(), &action(CheckOutcome::Failure), proposal("x"), &rules);
        assert_eq!(merged.state.stats.fate_points, 99);
    }

    #[test]
    fn traits_decay_then_merge_with_update_presentation() {
        let mut before = prior();
        before.stats.traits = vec![
            timed_trait("t_fever", "Fever", 1),
            timed_trait("t_fame", "Famous", 12),
        ];
        let merged = merge(
            &before,
            NarrativeProposal {
                date: Some(date(1950, 3)),
                trait_additions: vec![TraitCandidate {
                    name: "Famous".to_string(),
                    rarity: Some("RARE".to_string()),
                    modifiers: BTreeMap::from([(Attribute::Charisma, 3)]),
                    ..TraitCandidate::default()
                }],
                ..proposal("x")
            },
        );

        let names: Vec<&str> = merged.state.stats.traits.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Famous"]);
        assert_eq!(merged.state.stats.traits[0].rarity, TraitRarity::Rare);

        let log = &merged.state.history.last().unwrap().trait_changes;
        assert!(log.iter().any(|c| c.name == "Fever" && c.kind == TraitChangeKind::Removed));
        assert!(log.iter().any(|c| c.name == "Famous" && c.kind == TraitChangeKind::Updated));
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn inventory_removes_then_adds() {
        let mut before = prior();
        before.stats.inventory = vec!["Badge".to_string(), "Letter".to_string()];
        let merged = merge(
            &before,
            NarrativeProposal {
                inventory_add: vec!["Pistol".to_string()],
                inventory_remove: vec!["Letter".to_string()],
                ..proposal("x")
            },
        );
        assert_eq!(merged.state.stats.inventory, vec!["Badge".to_string(), "Pistol".to_string()]);
    }

    #[test]
    fn rejected_roster_keeps_prior() {
        let before = prior();
        let merged = merge(
            &before,
            NarrativeProposal {
                factions: RosterUpdate::Rejected(RosterRejection::NotAList("object".to_string())),
                ..proposal("x")
            },
        );
        assert_eq!(merged.state.factions, before.factions);
        assert!(merged.report.roster_rejection.is_some());
    }

    #[test]
    fn roster_replacement_promotes_listed_player() {
        let roster = vec![
            Faction::new("Vanguard", 50, "red").with_leaders(&["Comrade Wei"]),
            Faction::new("Army", 50, "olive"),
        ];
        let merged = merge(
            &prior(),
            NarrativeProposal {
                factions: RosterUpdate::Replace(roster.clone()),
                ..proposal("x")
            },
        );
        assert_eq!(merged.state.factions, roster);
        assert!(merged.state.stats.is_leader);
    }

    #[test]
    fn explicit_demotion_is_not_undone_by_roster() {
        let mut before = leader();
        before.factions = vec![Faction::new("Vanguard", 100, "red").with_leaders(&["Wei"])];
        let merged = merge(
            &before,
            NarrativeProposal {
                player_faction: Some(PlayerFactionUpdate {
                    name: Some("Army".to_string()),
                    is_leader: Some(false),
                }),
                ..proposal("x")
            },
        );
        assert!(!merged.state.stats.is_leader);
        assert_eq!(merged.state.stats.faction, "Army");
        assert_eq!(
            merged.state.history.last().unwrap().faction_change,
            Some(FactionChange {
                from: "Vanguard".to_string(),
                to: "Army".to_string()
            })
        );
    }

    #[test]
    fn supreme_leader_fields_update_independently() {
        let merged = merge(
            &prior(),
            NarrativeProposal {
                supreme_leader: Some(LeaderUpdate {
                    slogan: Some("Seek truth from facts".to_string()),
                    ..LeaderUpdate::default()
                }),
                ..proposal("x")
            },
        );
        assert_eq!(merged.state.supreme_leader.name, FOUNDING_LEADER);
        assert_eq!(merged.state.supreme_leader.slogan, "Seek truth from facts");
    }

    #[test]
    fn succession_candidates_only_when_leadership_ends() {
        let candidates = Some(vec!["Li".to_string(), "Zhao".to_string(), "Li".to_string()]);
        let ending = NarrativeProposal {
            game_over: true,
            game_over_reason: Some("Assassinated.".to_string()),
            successor_candidates: candidates.clone(),
            ..proposal("x")
        };

        let merged = merge(&leader(), ending.clone());
        assert!(merged.report.leadership_ended);
        assert_eq!(merged.state.successor_candidates, vec!["Li".to_string(), "Zhao".to_string()]);

        let merged = merge(&prior(), ending);
        assert!(!merged.report.leadership_ended);
        assert!(merged.state.successor_candidates.is_empty());

        let merged = merge(
            &leader(),
            NarrativeProposal {
                successor_candidates: candidates,
                ..proposal("x")
            },
        );
        assert!(merged.state.successor_candidates.is_empty());
    }

    #[test]
    fn testament_persists_across_turns() {
        let first = merge(
            &leader(),
            NarrativeProposal {
                designated_successor: Some("Zhao".to_string()),
                suggested_heirs: Some(vec!["Zhao".to_string(), "Li".to_string()]),
                ..proposal("x")
            },
        );
        let second = merge(&first.state, proposal("y"));
        assert_eq!(second.state.designated_successor.as_deref(), Some("Zhao"));
        assert_eq!(second.state.suggested_heirs.len(), 2);
    }

    #[test]
    fn pity_action_resets_drought() {
        let mut before = prior();
        before.turns_since_critical = 10;
        let pity = ResolvedAction::direct("Lie low", ChoiceKind::Pity, CheckOutcome::Success);
        let merged = merge_turn(&before, &pity, proposal("x"), &MergeRules::default());
        assert_eq!(merged.state.turns_since_critical, 0);
    }
}
