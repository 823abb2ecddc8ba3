//! End-to-end session flows against scripted collaborators.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;
use statecraft_domain::{
    AttributeSet, Background, CheckOutcome, GameDate, GameState, NewGame, RosterRejection,
    CUSTOM_CHOICE_ID, STARTING_FATE_POINTS,
};
use statecraft_engine::use_cases::turn::merge::HEALTH_DEATH_REASON;
use statecraft_engine::use_cases::turn::PowerGrant;
use statecraft_engine::{
    import_json, CheckStep, ClockPort, EngineConfig, GameSession, NarrativeError, NarrativePort,
    NarrativeRequest, RandomPort, SessionError, SessionPorts, TurnError,
};
use uuid::Uuid;

struct ScriptedDraws(Mutex<VecDeque<i32>>);

impl RandomPort for ScriptedDraws {
    fn gen_range(&self, min: i32, max: i32) -> i32 {
        let next = self.0.lock().unwrap().pop_front().unwrap_or(60);
        next.clamp(min, max)
    }

    fn gen_uuid(&self) -> Uuid {
        Uuid::nil()
    }
}

#[derive(Default)]
struct ScriptedNarrative {
    replies: Mutex<VecDeque<Result<String, NarrativeError>>>,
    requests: Mutex<Vec<NarrativeRequest>>,
}

impl ScriptedNarrative {
    fn replying(replies: Vec<Result<serde_json::Value, NarrativeError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(
                replies
                    .into_iter()
                    .map(|r| r.map(|value| value.to_string()))
                    .collect(),
            ),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<NarrativeRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl NarrativePort for ScriptedNarrative {
    async fn generate(&self, request: NarrativeRequest) -> Result<String, NarrativeError> {
        self.requests.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(NarrativeError::Transport("script exhausted".to_string())))
    }
}

struct FrozenClock(DateTime<Utc>);

impl ClockPort for FrozenClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

fn new_game() -> GameState {
    GameState::new_game(NewGame {
        start: GameDate::new(1950, 1).unwrap(),
        background: Background::Intellectual,
        player_name: "Wei".to_string(),
        birth_year: 1922,
        faction: "Vanguard".to_string(),
        attributes: AttributeSet::balanced(),
        backstory: "A translator from Shanghai.".to_string(),
    })
    .unwrap()
}

fn leader_game() -> GameState {
    let mut state = new_game();
    state.stats.is_leader = true;
    state
}

fn start(state: GameState, narrative: Arc<ScriptedNarrative>, draws: &[i32]) -> GameSession {
    let ports = SessionPorts {
        narrative,
        random: Arc::new(ScriptedDraws(Mutex::new(draws.iter().copied().collect()))),
        clock: Arc::new(FrozenClock(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap())),
    };
    GameSession::new(state, ports, &EngineConfig::default())
}

fn month(year: i32, month: u8, extra: serde_json::Value) -> serde_json::Value {
    let mut proposal = json!({
        "narrative": format!("News from {}-{:02}.", year, month),
        "date": {"year": year, "month": month},
    });
    if let (Some(target), Some(extra)) = (proposal.as_object_mut(), extra.as_object()) {
        for (key, value) in extra {
            target.insert(key.clone(), value.clone());
        }
    }
    proposal
}

async fn play_custom(session: &mut GameSession, text: &str) -> Result<(), SessionError> {
    let step = session.submit_action(CUSTOM_CHOICE_ID, Some(text))?;
    assert!(matches!(step, CheckStep::Resolved(_)), "unexpected interrupt: {:?}", step);
    session.resolve_turn().await.map(|_| ())
}

#[tokio::test]
async fn failed_check_rerolled_with_fate_point() {
    let narrative = ScriptedNarrative::replying(vec![Ok(month(1950, 2, json!({})))]);
    let mut session = start(new_game(), narrative.clone(), &[30, 80]);

    let step = session.submit_action(CUSTOM_CHOICE_ID, Some("Petition the county")).unwrap();
    let CheckStep::FailureInterrupt(view) = step else {
        panic!("expected failure interrupt, got {:?}", step);
    };
    assert_eq!(view.thresholds.threshold, 50);

    let step = session.reroll().unwrap();
    assert!(matches!(step, CheckStep::Resolved(ref a) if a.outcome == CheckOutcome::Success));

    session.resolve_turn().await.unwrap();
    let last = session.state().history.last().unwrap();
    assert_eq!(last.outcome, Some(CheckOutcome::Success));
    assert_eq!(last.fate_delta, Some(-1));
    assert_eq!(session.state().stats.fate_points, STARTING_FATE_POINTS - 1);
    assert_eq!(narrative.requests()[0].outcome, "SUCCESS");
}

#[tokio::test]
async fn natural_critical_is_narrated_as_success_and_earns_fate() {
    let narrative = ScriptedNarrative::replying(vec![Ok(month(1950, 3, json!({})))]);
    let mut state = new_game();
    state.turns_since_critical = 4;
    let mut session = start(state, narrative.clone(), &[97]);

    let step = session.submit_action(CUSTOM_CHOICE_ID, Some("Publish an essay")).unwrap();
    assert!(matches!(step, CheckStep::CriticalInterrupt(_)));
    session.accept_critical().unwrap();
    session.resolve_turn().await.unwrap();

    let request = &narrative.requests()[0];
    assert_eq!(request.outcome, "SUCCESS");
    assert!(request.critical);

    let state = session.state();
    assert_eq!(state.history.last().unwrap().outcome, Some(CheckOutcome::CriticalSuccess));
    assert_eq!(state.stats.fate_points, STARTING_FATE_POINTS + 1);
    assert_eq!(state.turns_since_critical, 0);
}

#[tokio::test]
async fn power_grants_respect_cooldown() {
    let grant = json!({"stat_changes": {"power": 5}});
    let narrative = ScriptedNarrative::replying(vec![
        Ok(month(1950, 2, grant.clone())),
        Ok(month(1950, 3, grant.clone())),
        Ok(month(1950, 5, grant)),
    ]);
    let mut session = start(leader_game(), narrative, &[60, 60, 60]);

    session.submit_action(CUSTOM_CHOICE_ID, Some("Chair the committee")).unwrap();
    let report = session.resolve_turn().await.unwrap();
    assert_eq!(report.power_grant, PowerGrant::Granted);
    assert_eq!(session.state().stats.power_points, 1);

    session.submit_action(CUSTOM_CHOICE_ID, Some("Chair it again")).unwrap();
    let report = session.resolve_turn().await.unwrap();
    assert_eq!(report.power_grant, PowerGrant::RejectedCooldown { months_remaining: 2 });
    assert_eq!(session.state().stats.power_points, 1);

    session.submit_action(CUSTOM_CHOICE_ID, Some("Tour the provinces")).unwrap();
    let report = session.resolve_turn().await.unwrap();
    assert_eq!(report.power_grant, PowerGrant::Granted);
    assert_eq!(session.state().stats.power_points, 2);
    assert_eq!(session.state().last_power_grant, Some(GameDate::new(1950, 5).unwrap()));
}

#[tokio::test]
async fn depleted_health_forces_game_over() {
    let narrative = ScriptedNarrative::replying(vec![Ok(month(
        1950,
        2,
        json!({"stat_changes": {"health": -150, "political_standing": -80}}),
    ))]);
    let mut session = start(new_game(), narrative, &[60]);

    play_custom(&mut session, "Work through the winter").await.unwrap();
    let state = session.state();
    assert!(state.game_over);
    assert_eq!(state.game_over_reason.as_deref(), Some(HEALTH_DEATH_REASON));
    assert!(session.choices().is_empty());

    assert!(matches!(
        session.submit_action(CUSTOM_CHOICE_ID, Some("Rise again")),
        Err(SessionError::Turn(TurnError::GameOver))
    ));
}

#[tokio::test]
async fn malformed_roster_keeps_prior_factions() {
    let narrative = ScriptedNarrative::replying(vec![Ok(month(
        1950,
        2,
        json!({"factions": "everyone is a reformer now"}),
    ))]);
    let prior = new_game();
    let mut session = start(prior.clone(), narrative, &[60]);

    session.submit_action(CUSTOM_CHOICE_ID, Some("Attend the plenum")).unwrap();
    let report = session.resolve_turn().await.unwrap();

    assert_eq!(session.state().factions, prior.factions);
    assert!(matches!(report.roster_rejection, Some(RosterRejection::NotAList(_))));
    assert!(session.anomalies().iter().any(|a| a.field == "factions"));
}

#[tokio::test]
async fn transport_failure_then_retry_appends_one_entry() {
    let narrative = ScriptedNarrative::replying(vec![
        Err(NarrativeError::Transport("connection reset".to_string())),
        Ok(month(1950, 2, json!({}))),
    ]);
    let mut session = start(new_game(), narrative.clone(), &[60]);
    let history_before = session.state().history.len();

    session.submit_action(CUSTOM_CHOICE_ID, Some("Write a report")).unwrap();
    let err = session.resolve_turn().await.unwrap_err();
    assert!(matches!(err, SessionError::Turn(ref e) if e.is_retryable()));
    assert_eq!(session.state().history.len(), history_before);

    session.retry_turn().await.unwrap();
    assert_eq!(session.state().history.len(), history_before + 1);

    let requests = narrative.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0], requests[1]);
}

#[tokio::test]
async fn leader_death_hands_off_to_designated_successor() {
    let narrative = ScriptedNarrative::replying(vec![Ok(month(
        1950,
        4,
        json!({
            "game_over": true,
            "game_over_reason": "Died at the podium.",
            "successor_candidates": ["Hua", "Deng", "Hua"],
            "designated_successor": "Deng",
        }),
    ))]);
    let mut session = start(leader_game(), narrative, &[60]);

    play_custom(&mut session, "Deliver the anniversary speech").await.unwrap();
    let state = session.state();
    assert!(state.is_awaiting_succession());
    assert_eq!(state.successor_candidates, vec!["Hua".to_string(), "Deng".to_string()]);
    assert_eq!(state.game_over_reason.as_deref(), Some("Died at the podium."));

    let heir = state.preferred_successor().unwrap().to_string();
    assert_eq!(heir, "Deng");
    session.confirm_successor(&heir).unwrap();

    let state = session.state();
    assert_eq!(state.player_name, "Deng");
    assert!(state.stats.is_leader);
    assert!(!state.game_over);
    assert_eq!(session.choices()[0].id, CUSTOM_CHOICE_ID);
}

#[tokio::test]
async fn exported_save_imports_unchanged() {
    let narrative = ScriptedNarrative::replying(vec![Ok(month(
        1950,
        2,
        json!({"inventory": {"add": ["Party card"]}}),
    ))]);
    let mut session = start(new_game(), narrative, &[60]);
    play_custom(&mut session, "Join the study group").await.unwrap();

    let text = serde_json::to_string(&session.export()).unwrap();
    let config = EngineConfig::default();
    let imported = import_json(&text, GameDate::new(1949, 10).unwrap(), &config.merge_rules()).unwrap();

    assert!(imported.anomalies.is_empty());
    assert_eq!(&imported.value, session.state());
}

#[test]
fn partial_save_is_repaired_to_a_playable_state() {
    let config = EngineConfig::default();
    let raw = json!({
        "player_name": "Wei",
        "date": {"year": 1962, "month": 7},
        "stats": {"health": 140, "fate_points": 40, "traits": "none"},
    })
    .to_string();

    let imported = import_json(&raw, GameDate::new(1949, 10).unwrap(), &config.merge_rules()).unwrap();
    let state = imported.value;

    assert_eq!(state.player_name, "Wei");
    assert_eq!(state.date, GameDate::new(1962, 7).unwrap());
    assert_eq!(state.stats.vitals.health, 100);
    assert_eq!(state.stats.fate_points, config.fate_point_cap);
    assert!(state.stats.traits.is_empty());
    assert!(!state.factions.is_empty());
    assert!(!state.history.is_empty());
    assert!(!imported.anomalies.is_empty());

    let session = start(state, ScriptedNarrative::replying(Vec::new()), &[]);
    assert_eq!(session.choices()[0].id, CUSTOM_CHOICE_ID);
}
