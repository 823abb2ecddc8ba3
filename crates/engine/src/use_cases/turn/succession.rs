//! Succession hand-off after a leadership-ending game over.

use statecraft_domain::{AttributeSet, GameState, HistoryEntry, Vitals};

/// Hands the played character over to `successor`, one of the candidates
/// offered when leadership ended.
pub fn hand_off(prior: &GameState, successor: &str) -> Result<GameState, SuccessorError> {
    if !prior.is_awaiting_succession() {
        return Err(SuccessorError::NotAwaitingSuccession);
    }
    let successor = successor.trim();
    if !prior.successor_candidates.iter().any(|c| c == successor) {
        return Err(SuccessorError::UnknownCandidate(successor.to_string()));
    }

    let mut next = prior.clone();
    next.player_name = successor.to_string();
    next.supreme_leader.name = successor.to_string();

    next.stats.is_leader = true;
    next.stats.vitals = Vitals::baseline();
    next.stats.traits.clear();
    next.stats.attributes = AttributeSet::balanced();
    next.stats.power_points = 0;
    next.last_power_grant = None;

    next.successor_candidates.clear();
    next.designated_successor = None;
    next.suggested_heirs.clear();
    next.game_over = false;
    next.game_over_reason = None;

    next.history.push(HistoryEntry::narrative_only(
        prior.date,
        format!(
            "{} succeeds {} and takes up the leadership.",
            successor, prior.player_name
        ),
    ));

    tracing::info!(
        predecessor = %prior.player_name,
        successor = %successor,
        date = %prior.date,
        "Succession confirmed"
    );
    Ok(next)
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SuccessorError {
    #[error("No succession is pending")]
    NotAwaitingSuccession,
    #[error("{0} is not among the successor candidates")]
    UnknownCandidate(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use statecraft_domain::{Background, GameDate, NewGame, Trait, TraitId, TraitRarity};

    fn ended_reign() -> GameState {
        let mut state = GameState::new_game(NewGame {
            start: GameDate::new(1976, 9).unwrap(),
            background: Background::Cadre,
            player_name: "Wei".to_string(),
            birth_year: 1910,
            faction: "Vanguard".to_string(),
            attributes: AttributeSet::uniform(15),
            backstory: String::new(),
        })
        .unwrap();
        state.stats.is_leader = true;
        state.stats.fate_points = 3;
        state.stats.power_points = 4;
        state.stats.vitals.health = 0;
        state.stats.traits.push(Trait {
            id: TraitId::new("t1"),
            name: "Frail".to_string(),
            description: String::new(),
            rarity: TraitRarity::Negative,
            modifiers: Default::default(),
            duration_months: None,
        });
        state.game_over = true;
        state.game_over_reason = Some("Died in office.".to_string());
        state.successor_candidates = vec!["Hua".to_string(), "Deng".to_string()];
        state.designated_successor = Some("Hua".to_string());
        state.last_power_grant = Some(GameDate::new(1976, 6).unwrap());
        state
    }

    #[test]
    fn successor_inherits_fate_but_starts_fresh() {
        let prior = ended_reign();
        let next = hand_off(&prior, "Deng").unwrap();

        assert_eq!(next.player_name, "Deng");
        assert_eq!(next.supreme_leader.name, "Deng");
        assert!(next.stats.is_leader);
        assert_eq!(next.stats.vitals, Vitals::baseline());
        assert!(next.stats.traits.is_empty());
        assert_eq!(next.stats.attributes, AttributeSet::balanced());
        assert_eq!(next.stats.power_points, 0);
        assert_eq!(next.last_power_grant, None);
        assert_eq!(next.stats.fate_points, 3);
        assert!(!next.game_over);
        assert!(next.successor_candidates.is_empty());
        assert_eq!(next.designated_successor, None);
        assert_eq!(next.history.len(), prior.history.len() + 1);
    }

    #[test]
    fn only_listed_candidates_may_succeed() {
        assert_eq!(
            hand_off(&ended_reign(), "Lin"),
            Err(SuccessorError::UnknownCandidate("Lin".to_string()))
        );
        let mut ongoing = ended_reign();
        ongoing.game_over = false;
        assert_eq!(hand_off(&ongoing, "Hua"), Err(SuccessorError::NotAwaitingSuccession));
    }
}
