//! Check resolution use cases.
//!
//! Turns a chosen action into an outcome. The flow is:
//! 1. Thresholds are derived from the action's difficulty and the governing
//!    effective attribute
//! 2. A draw in [1,100] is classified
//! 3. A natural critical success interrupts: accept as authored, or spend a
//!    fate point to substitute a custom action and draw again
//! 4. A failure interrupts while fate points remain: reroll at a lowered
//!    threshold, or accept the failure
//! 5. The terminal outcome is reported once, with the fate points consumed
//!    over the whole interaction

use std::sync::Arc;

use serde::Serialize;
use statecraft_domain::value_objects::{DRAW_MAX, DRAW_MIN};
use statecraft_domain::{AttributeSet, CheckOutcome, CheckThresholds, Choice, ChoiceKind};

use crate::infrastructure::ports::RandomPort;

/// What the player is attempting, with difficulty already resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckRequest {
    pub action_text: String,
    pub choice_kind: ChoiceKind,
    pub difficulty: i32,
    /// Effective value of the governing attribute; 0 when none was named.
    pub attribute_value: i32,
    pub power_cost: u32,
}

impl CheckRequest {
    pub fn from_choice(choice: &Choice, action_text: String, effective: &AttributeSet) -> Self {
        Self {
            action_text,
            choice_kind: choice.kind,
            difficulty: choice.difficulty_or_default(),
            attribute_value: choice.attribute.map(|a| effective.get(a)).unwrap_or(0),
            power_cost: choice.power_cost,
        }
    }
}

/// Observable state of the check state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckState {
    Idle,
    CriticalInterrupt,
    FailureInterrupt,
    Resolved,
}

/// Terminal result of one check interaction, handed to the turn merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedAction {
    pub text: String,
    pub choice_kind: ChoiceKind,
    pub outcome: CheckOutcome,
    /// A critical success was drawn at some point in the interaction.
    pub natural_critical: bool,
    pub fate_points_consumed: u32,
    pub power_cost: u32,
    pub draws: Vec<i32>,
}

impl ResolvedAction {
    /// An outcome decided without a draw (replays, scripted turns).
    pub fn direct(text: impl Into<String>, choice_kind: ChoiceKind, outcome: CheckOutcome) -> Self {
        Self {
            text: text.into(),
            choice_kind,
            outcome,
            natural_critical: outcome == CheckOutcome::CriticalSuccess,
            fate_points_consumed: 0,
            power_cost: 0,
            draws: Vec::new(),
        }
    }

    /// An accepted critical is narrated as a plain success.
    pub fn narrated_outcome(&self) -> CheckOutcome {
        match self.outcome {
            CheckOutcome::CriticalSuccess => CheckOutcome::Success,
            other => other,
        }
    }
}

/// Snapshot of an interrupt for the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InterruptView {
    pub draw: i32,
    pub outcome: CheckOutcome,
    pub thresholds: CheckThresholds,
    pub fate_points_left: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStep {
    Resolved(ResolvedAction),
    CriticalInterrupt(InterruptView),
    FailureInterrupt(InterruptView),
}

impl CheckStep {
    pub fn state(&self) -> CheckState {
        match self {
            CheckStep::Resolved(_) => CheckState::Resolved,
            CheckStep::CriticalInterrupt(_) => CheckState::CriticalInterrupt,
            CheckStep::FailureInterrupt(_) => CheckState::FailureInterrupt,
        }
    }
}

/// One in-flight check, from the first draw to the reported outcome.
#[derive(Debug, Clone)]
pub struct CheckInteraction {
    request: CheckRequest,
    thresholds: CheckThresholds,
    state: CheckState,
    outcome: CheckOutcome,
    draws: Vec<i32>,
    fate_available: u32,
    fate_consumed: u32,
    natural_critical: bool,
}

impl CheckInteraction {
    fn new(request: CheckRequest, fate_available: u32) -> Self {
        let thresholds = CheckThresholds::compute(request.difficulty, request.attribute_value);
        Self {
            request,
            thresholds,
            state: CheckState::Idle,
            outcome: CheckOutcome::Failure,
            draws: Vec::new(),
            fate_available,
            fate_consumed: 0,
            natural_critical: false,
        }
    }

    pub fn state(&self) -> CheckState {
        self.state
    }

    pub fn thresholds(&self) -> CheckThresholds {
        self.thresholds
    }

    pub fn action_text(&self) -> &str {
        &self.request.action_text
    }

    pub fn fate_points_consumed(&self) -> u32 {
        self.fate_consumed
    }

    pub fn fate_points_left(&self) -> u32 {
        self.fate_available.saturating_sub(self.fate_consumed)
    }

    fn view(&self) -> InterruptView {
        InterruptView {
            draw: self.draws.last().copied().unwrap_or(0),
            outcome: self.outcome,
            thresholds: self.thresholds,
            fate_points_left: self.fate_points_left(),
        }
    }

    fn require(&self, expected: CheckState, action: &'static str) -> Result<(), CheckError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(CheckError::InvalidTransition {
                action,
                state: self.state,
            })
        }
    }

    fn spend_fate_point(&mut self) -> Result<(), CheckError> {
        if self.fate_points_left() == 0 {
            return Err(CheckError::NoFatePoints);
        }
        self.fate_consumed += 1;
        Ok(())
    }

    fn finish(&mut self, outcome: CheckOutcome) -> ResolvedAction {
        self.state = CheckState::Resolved;
        ResolvedAction {
            text: self.request.action_text.clone(),
            choice_kind: self.request.choice_kind,
            outcome,
            natural_critical: self.natural_critical,
            fate_points_consumed: self.fate_consumed,
            power_cost: self.request.power_cost,
            draws: self.draws.clone(),
        }
    }
}

/// Drives check interactions with an injected draw source.
pub struct CheckResolver {
    random: Arc<dyn RandomPort>,
    reroll_step: i32,
}

impl CheckResolver {
    pub fn new(random: Arc<dyn RandomPort>, reroll_step: i32) -> Self {
        Self {
            random,
            reroll_step,
        }
    }

    /// Performs the first draw. When the result is an interrupt, the
    /// returned interaction must be kept and passed back to the interrupt
    /// handlers.
    pub fn begin(&self, request: CheckRequest, fate_available: u32) -> (CheckInteraction, CheckStep) {
        let mut interaction = CheckInteraction::new(request, fate_available);
        let step = self.roll(&mut interaction);
        (interaction, step)
    }

    /// Accepts a critical success as authored.
    pub fn accept_critical(&self, interaction: &mut CheckInteraction) -> Result<ResolvedAction, CheckError> {
        interaction.require(CheckState::CriticalInterrupt, "accept a critical")?;
        Ok(interaction.finish(CheckOutcome::CriticalSuccess))
    }

    /// Spends a fate point to replace the action with `custom_text` and draws
    /// again against the same thresholds.
    pub fn customize_critical(
        &self,
        interaction: &mut CheckInteraction,
        custom_text: &str,
    ) -> Result<CheckStep, CheckError> {
        interaction.require(CheckState::CriticalInterrupt, "customize a critical")?;
        let custom_text = custom_text.trim();
        if custom_text.is_empty() {
            return Err(CheckError::EmptyCustomAction);
        }
        interaction.spend_fate_point()?;
        interaction.request.action_text = custom_text.to_string();
        tracing::debug!(
            fate_consumed = interaction.fate_consumed,
            "Critical success customized"
        );
        Ok(self.roll(interaction))
    }

    /// Spends a fate point, lowers the threshold by the reroll step, and
    /// draws again.
    pub fn reroll(&self, interaction: &mut CheckInteraction) -> Result<CheckStep, CheckError> {
        interaction.require(CheckState::FailureInterrupt, "reroll")?;
        interaction.spend_fate_point()?;
        interaction.thresholds = interaction.thresholds.lowered_by(self.reroll_step);
        tracing::debug!(
            threshold = interaction.thresholds.threshold,
            fate_consumed = interaction.fate_consumed,
            "Rerolling failed check"
        );
        Ok(self.roll(interaction))
    }

    /// Accepts the latest failure.
    pub fn decline_reroll(&self, interaction: &mut CheckInteraction) -> Result<ResolvedAction, CheckError> {
        interaction.require(CheckState::FailureInterrupt, "decline a reroll")?;
        let outcome = interaction.outcome;
        Ok(interaction.finish(outcome))
    }

    fn roll(&self, interaction: &mut CheckInteraction) -> CheckStep {
        let draw = self.random.gen_range(DRAW_MIN, DRAW_MAX);
        let outcome = interaction.thresholds.classify(draw);
        interaction.draws.push(draw);
        interaction.outcome = outcome;

        tracing::debug!(
            draw,
            threshold = interaction.thresholds.threshold,
            critical_floor = interaction.thresholds.critical_floor,
            outcome = %outcome,
            "Check drawn"
        );

        match outcome {
            CheckOutcome::CriticalSuccess => {
                interaction.natural_critical = true;
                interaction.state = CheckState::CriticalInterrupt;
                CheckStep::CriticalInterrupt(interaction.view())
            }
            CheckOutcome::Failure | CheckOutcome::CriticalFailure
                if interaction.fate_points_left() > 0 =>
            {
                interaction.state = CheckState::FailureInterrupt;
                CheckStep::FailureInterrupt(interaction.view())
            }
            other => CheckStep::Resolved(interaction.finish(other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CheckError {
    #[error("Cannot {action} while the check is {state:?}")]
    InvalidTransition {
        action: &'static str,
        state: CheckState,
    },
    #[error("No fate points left")]
    NoFatePoints,
    #[error("Custom action text is empty")]
    EmptyCustomAction,
}
