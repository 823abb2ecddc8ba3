//! Game session: the single owner of a live canonical state.
//!
//! Exposes the mutating entry points of the presentation boundary: submit an
//! action, answer a check interrupt (spend or decline a fate point), run the
//! turn, and confirm a successor. One turn is in flight at a time; a new
//! action is refused while a check interrupt or an unmerged action is
//! pending.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use statecraft_domain::{Choice, GameState, SessionId};

use crate::config::EngineConfig;
use crate::infrastructure::ports::{ClockPort, NarrativePort, RandomPort};
use crate::use_cases::check::{
    CheckError, CheckInteraction, CheckRequest, CheckResolver, CheckState, CheckStep,
    ResolvedAction,
};
use crate::use_cases::coerce::Anomaly;
use crate::use_cases::persistence::{export_state, ExportDocument};
use crate::use_cases::turn::{
    hand_off, offered_choices, MergeReport, ResolveTurn, SuccessorError, TurnError,
};

/// Adapters a session runs against.
#[derive(Clone)]
pub struct SessionPorts {
    pub narrative: Arc<dyn NarrativePort>,
    pub random: Arc<dyn RandomPort>,
    pub clock: Arc<dyn ClockPort>,
}

pub struct GameSession {
    id: SessionId,
    started_at: DateTime<Utc>,
    state: GameState,
    narrative: String,
    choices: Vec<Choice>,
    check: Option<CheckInteraction>,
    pending_action: Option<ResolvedAction>,
    anomalies: Vec<Anomaly>,
    resolver: CheckResolver,
    turn: ResolveTurn,
    clock: Arc<dyn ClockPort>,
    pity_threshold: u32,
}

impl GameSession {
    pub fn new(state: GameState, ports: SessionPorts, config: &EngineConfig) -> Self {
        let id = SessionId::from_uuid(ports.random.gen_uuid());
        let started_at = ports.clock.now();
        let narrative = state
            .history
            .last()
            .map(|entry| entry.narrative.clone())
            .unwrap_or_default();
        let choices = offered_choices(&state, Vec::new(), config.pity_threshold);

        tracing::info!(session_id = %id, player = %state.player_name, date = %state.date, "Session started");

        Self {
            id,
            started_at,
            state,
            narrative,
            choices,
            check: None,
            pending_action: None,
            anomalies: Vec::new(),
            resolver: CheckResolver::new(ports.random, config.reroll_step),
            turn: ResolveTurn::new(
                ports.narrative,
                config.merge_rules(),
                config.narrative_timeout,
                config.history_context,
            ),
            clock: ports.clock,
            pity_threshold: config.pity_threshold,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn narrative(&self) -> &str {
        &self.narrative
    }

    /// Choices on offer, including injected pity/intervene/custom actions.
    pub fn choices(&self) -> &[Choice] {
        &self.choices
    }

    /// Anomalies suppressed while merging the latest turn.
    pub fn anomalies(&self) -> &[Anomaly] {
        &self.anomalies
    }

    pub fn check_state(&self) -> CheckState {
        self.check
            .as_ref()
            .map(CheckInteraction::state)
            .unwrap_or(CheckState::Idle)
    }

    /// The resolved action waiting to be merged (kept across failed turns).
    pub fn pending_action(&self) -> Option<&ResolvedAction> {
        self.pending_action.as_ref()
    }

    /// Power points after the pending action's cost, without touching
    /// canonical state.
    pub fn projected_power_points(&self) -> u32 {
        let cost = self
            .pending_action
            .as_ref()
            .map(|action| action.power_cost)
            .unwrap_or(0);
        self.state.stats.power_points.saturating_sub(cost)
    }

    /// Starts a check for one of the offered choices. Free-text choices take
    /// their action from `custom_text`.
    pub fn submit_action(
        &mut self,
        choice_id: &str,
        custom_text: Option<&str>,
    ) -> Result<CheckStep, SessionError> {
        self.ensure_idle()?;
        if self.state.game_over {
            return Err(TurnError::GameOver.into());
        }

        let choice = self
            .choices
            .iter()
            .find(|c| c.id == choice_id)
            .ok_or_else(|| SessionError::UnknownChoice(choice_id.to_string()))?;

        let action_text = if choice.kind.takes_free_text() {
            custom_text
                .map(str::trim)
                .filter(|text| !text.is_empty())
                .ok_or(CheckError::EmptyCustomAction)?
                .to_string()
        } else {
            choice.text.clone()
        };

        let available = self.state.stats.power_points;
        if choice.power_cost > available {
            return Err(SessionError::InsufficientPower {
                needed: choice.power_cost,
                available,
            });
        }

        let request =
            CheckRequest::from_choice(choice, action_text, &self.state.stats.effective_attributes());
        tracing::debug!(
            session_id = %self.id,
            choice = %choice.id,
            difficulty = request.difficulty,
            attribute_value = request.attribute_value,
            "Action submitted"
        );

        let (interaction, step) = self.resolver.begin(request, self.state.stats.fate_points);
        self.absorb(interaction, &step);
        Ok(step)
    }

    pub fn accept_critical(&mut self) -> Result<CheckStep, SessionError> {
        let interaction = Self::active_check(&mut self.check, "accept a critical")?;
        let action = self.resolver.accept_critical(interaction)?;
        let step = CheckStep::Resolved(action);
        self.settle(&step);
        Ok(step)
    }

    pub fn customize_critical(&mut self, custom_text: &str) -> Result<CheckStep, SessionError> {
        let interaction = Self::active_check(&mut self.check, "customize a critical")?;
        let step = self.resolver.customize_critical(interaction, custom_text)?;
        self.settle(&step);
        Ok(step)
    }

    pub fn reroll(&mut self) -> Result<CheckStep, SessionError> {
        let interaction = Self::active_check(&mut self.check, "reroll")?;
        let step = self.resolver.reroll(interaction)?;
        self.settle(&step);
        Ok(step)
    }

    pub fn decline_reroll(&mut self) -> Result<CheckStep, SessionError> {
        let interaction = Self::active_check(&mut self.check, "decline a reroll")?;
        let action = self.resolver.decline_reroll(interaction)?;
        let step = CheckStep::Resolved(action);
        self.settle(&step);
        Ok(step)
    }

    /// Spends one fate point on the current interrupt: a reroll after a
    /// failure, or a custom action after a critical.
    pub fn consume_fate_point(&mut self, custom_text: Option<&str>) -> Result<CheckStep, SessionError> {
        match self.check_state() {
            CheckState::CriticalInterrupt => {
                self.customize_critical(custom_text.unwrap_or_default())
            }
            _ => self.reroll(),
        }
    }

    /// Requests and merges the turn for the pending action. On failure the
    /// canonical state is untouched and the same action stays pending.
    pub async fn resolve_turn(&mut self) -> Result<MergeReport, SessionError> {
        self.ensure_no_interrupt()?;
        let action = self
            .pending_action
            .as_ref()
            .ok_or(TurnError::NoPendingAction)?;

        let result = match self.turn.execute(&self.state, action).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(
                    session_id = %self.id,
                    error = %e,
                    retryable = e.is_retryable(),
                    "Turn failed, canonical state unchanged"
                );
                return Err(e.into());
            }
        };

        let outcome = action.outcome;
        self.pending_action = None;
        self.choices = offered_choices(&result.state, result.proposed_choices, self.pity_threshold);
        self.state = result.state;
        self.narrative = result.narrative;
        self.anomalies = result.anomalies;

        tracing::info!(
            session_id = %self.id,
            date = %self.state.date,
            outcome = %outcome,
            choices = self.choices.len(),
            anomalies = self.anomalies.len(),
            "Turn applied"
        );
        Ok(result.report)
    }

    /// Resubmits the pending action verbatim, without a new draw.
    pub async fn retry_turn(&mut self) -> Result<MergeReport, SessionError> {
        self.resolve_turn().await
    }

    pub fn confirm_successor(&mut self, name: &str) -> Result<(), SessionError> {
        self.ensure_idle()?;
        let next = hand_off(&self.state, name)?;
        self.narrative = next
            .history
            .last()
            .map(|entry| entry.narrative.clone())
            .unwrap_or_default();
        self.choices = offered_choices(&next, Vec::new(), self.pity_threshold);
        self.anomalies.clear();
        self.state = next;
        Ok(())
    }

    pub fn export(&self) -> ExportDocument {
        export_state(&self.state, self.clock.as_ref())
    }

    fn ensure_no_interrupt(&self) -> Result<(), SessionError> {
        if self.check.is_some() {
            return Err(SessionError::Busy);
        }
        Ok(())
    }

    fn ensure_idle(&self) -> Result<(), SessionError> {
        self.ensure_no_interrupt()?;
        if self.pending_action.is_some() {
            return Err(SessionError::Busy);
        }
        Ok(())
    }

    fn active_check<'a>(
        check: &'a mut Option<CheckInteraction>,
        action: &'static str,
    ) -> Result<&'a mut CheckInteraction, SessionError> {
        check.as_mut().ok_or(SessionError::Check(CheckError::InvalidTransition {
            action,
            state: CheckState::Idle,
        }))
    }

    fn absorb(&mut self, interaction: CheckInteraction, step: &CheckStep) {
        match step {
            CheckStep::Resolved(action) => self.pending_action = Some(action.clone()),
            _ => self.check = Some(interaction),
        }
    }

    fn settle(&mut self, step: &CheckStep) {
        if let CheckStep::Resolved(action) = step {
            tracing::debug!(
                session_id = %self.id,
                outcome = %action.outcome,
                fate_consumed = action.fate_points_consumed,
                "Check resolved"
            );
            self.check = None;
            self.pending_action = Some(action.clone());
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("A check interrupt or an unmerged action is pending")]
    Busy,
    #[error("Unknown choice: {0}")]
    UnknownChoice(String),
    #[error("Not enough political power: need {needed}, have {available}")]
    InsufficientPower { needed: u32, available: u32 },
    #[error(transparent)]
    Check(#[from] CheckError),
    #[error(transparent)]
    Turn(#[from] TurnError),
    #[error(transparent)]
    Successor(#[from] SuccessorError),
}
