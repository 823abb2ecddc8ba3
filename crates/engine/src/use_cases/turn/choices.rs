//! Choices offered after a turn, including engine-injected actions.

use statecraft_domain::{Choice, GameState, INTERVENE_POWER_COST};

/// The proposal's choices plus the pity, intervene and fallback custom
/// actions when their conditions hold. Nothing is offered once the game is
/// over.
pub fn offered_choices(state: &GameState, proposed: Vec<Choice>, pity_threshold: u32) -> Vec<Choice> {
    if state.game_over {
        return Vec::new();
    }

    let mut choices = proposed;
    if choices.is_empty() {
        choices.push(Choice::custom());
    }
    if state.turns_since_critical >= pity_threshold {
        choices.push(Choice::pity());
    }
    if state.stats.is_leader && state.stats.power_points >= INTERVENE_POWER_COST {
        choices.push(Choice::intervene());
    }
    choices
}

#[cfg(test)]
mod tests {
    use super::*;
    use statecraft_domain::{
        AttributeSet, Background, ChoiceKind, GameDate, NewGame, CUSTOM_CHOICE_ID,
    };

    fn state() -> GameState {
        GameState::new_game(NewGame {
            start: GameDate::new(1956, 5).unwrap(),
            background: Background::Soldier,
            player_name: "Wei".to_string(),
            birth_year: 1930,
            faction: "Army".to_string(),
            attributes: AttributeSet::balanced(),
            backstory: String::new(),
        })
        .unwrap()
    }

    fn kinds(choices: &[Choice]) -> Vec<ChoiceKind> {
        choices.iter().map(|c| c.kind).collect()
    }

    #[test]
    fn empty_proposal_falls_back_to_custom_action() {
        let choices = offered_choices(&state(), Vec::new(), 10);
        assert_eq!(choices.len(), 1);
        assert_eq!(choices[0].id, CUSTOM_CHOICE_ID);
        assert_eq!(choices[0].difficulty_or_default(), 50);
    }

    #[test]
    fn drought_injects_pity_action() {
        let mut state = state();
        state.turns_since_critical = 9;
        let proposed = vec![Choice::standard("a", "Write a report")];
        assert_eq!(kinds(&offered_choices(&state, proposed.clone(), 10)), vec![ChoiceKind::Standard]);

        state.turns_since_critical = 10;
        assert_eq!(
            kinds(&offered_choices(&state, proposed, 10)),
            vec![ChoiceKind::Standard, ChoiceKind::Pity]
        );
    }

    #[test]
    fn leaders_with_power_may_intervene() {
        let mut state = state();
        state.stats.is_leader = true;
        let proposed = vec![Choice::standard("a", "Write a report")];
        assert_eq!(offered_choices(&state, proposed.clone(), 10).len(), 1);

        state.stats.power_points = 1;
        let choices = offered_choices(&state, proposed, 10);
        assert_eq!(choices.last().map(|c| c.kind), Some(ChoiceKind::Intervene));
        assert_eq!(choices.last().map(|c| c.power_cost), Some(1));
    }

    #[test]
    fn nothing_is_offered_after_game_over() {
        let mut state = state();
        state.game_over = true;
        assert!(offered_choices(&state, vec![Choice::standard("a", "x")], 10).is_empty());
    }
}
