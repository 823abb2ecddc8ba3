//! Turn use cases.
//!
//! A turn takes the prior canonical state and a resolved action, asks the
//! narrative collaborator for a proposal, and merges it. Canonical state is
//! never touched until the proposal is in hand and parsed; transport and
//! parse failures leave the caller free to resubmit the same action.

use std::sync::Arc;
use std::time::Duration;

use statecraft_domain::{Choice, GameState};

pub mod choices;
pub mod merge;
pub mod proposal;
pub mod request;
pub mod succession;

pub use choices::offered_choices;
pub use merge::{merge_turn, MergeReport, MergeRules, MergedTurn, PowerGrant};
pub use proposal::{parse_proposal, NarrativeProposal, ProposalError};
pub use request::{build_request, proposal_schema};
pub use succession::{hand_off, SuccessorError};

use crate::infrastructure::ports::{NarrativeError, NarrativePort};
use crate::use_cases::check::ResolvedAction;
use crate::use_cases::coerce::Anomaly;

/// Result of a merged turn.
#[derive(Debug, Clone)]
pub struct TurnResult {
    pub state: GameState,
    pub narrative: String,
    /// The proposal's own choices, before engine injections.
    pub proposed_choices: Vec<Choice>,
    pub anomalies: Vec<Anomaly>,
    pub report: MergeReport,
}

/// Requests, parses and merges one turn.
pub struct ResolveTurn {
    narrative: Arc<dyn NarrativePort>,
    rules: MergeRules,
    timeout: Duration,
    history_context: usize,
}

impl ResolveTurn {
    pub fn new(
        narrative: Arc<dyn NarrativePort>,
        rules: MergeRules,
        timeout: Duration,
        history_context: usize,
    ) -> Self {
        Self {
            narrative,
            rules,
            timeout,
            history_context,
        }
    }

    pub fn rules(&self) -> &MergeRules {
        &self.rules
    }

    pub async fn execute(
        &self,
        prior: &GameState,
        action: &ResolvedAction,
    ) -> Result<TurnResult, TurnError> {
        if prior.game_over {
            return Err(TurnError::GameOver);
        }

        let request = build_request(prior, action, self.history_context);
        let raw = match tokio::time::timeout(self.timeout, self.narrative.generate(request)).await {
            Ok(result) => result?,
            Err(_) => return Err(TurnError::Timeout(self.timeout.as_secs())),
        };

        let sanitized = parse_proposal(&raw).map_err(|e| {
            tracing::warn!(error = %e, "Failed to parse narrative proposal");
            TurnError::MalformedProposal(e.to_string())
        })?;
        sanitized.log_anomalies("narrative_proposal");

        let mut proposal = sanitized.value;
        let proposed_choices = std::mem::take(&mut proposal.choices);
        let narrative = proposal.narrative.clone();
        let merged = merge_turn(prior, action, proposal, &self.rules);

        log_report(&merged);
        tracing::info!(
            date = %merged.state.date,
            outcome = %action.outcome,
            game_over = merged.state.game_over,
            "Turn merged"
        );

        Ok(TurnResult {
            state: merged.state,
            narrative,
            proposed_choices,
            anomalies: sanitized.anomalies,
            report: merged.report,
        })
    }
}

fn log_report(merged: &MergedTurn) {
    let report = &merged.report;
    if report.date_clamped {
        tracing::warn!("Proposal date ran backwards, keeping prior date");
    }
    if let Some(rejection) = &report.roster_rejection {
        tracing::warn!(error = %rejection, "Faction roster rejected, keeping prior roster");
    }
    match report.power_grant {
        PowerGrant::RejectedNotLeader => {
            tracing::debug!("Power grant ignored: player is not a faction leader")
        }
        PowerGrant::RejectedCooldown { months_remaining } => {
            tracing::debug!(months_remaining, "Power grant ignored: cooldown active")
        }
        PowerGrant::Granted | PowerGrant::NotRequested => {}
    }
    if report.forced_game_over {
        tracing::info!(
            reason = merged.state.game_over_reason.as_deref().unwrap_or_default(),
            "Game over forced by depleted vital"
        );
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum TurnError {
    #[error("Narrative transport failed: {0}")]
    Transport(String),
    #[error("Narrative request timed out after {0}s")]
    Timeout(u64),
    #[error("Malformed narrative proposal: {0}")]
    MalformedProposal(String),
    #[error("No resolved action is waiting for a turn")]
    NoPendingAction,
    #[error("The game is over")]
    GameOver,
}

impl TurnError {
    /// The same action may be resubmitted verbatim.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TurnError::Transport(_) | TurnError::Timeout(_) | TurnError::MalformedProposal(_)
        )
    }
}

impl From<NarrativeError> for TurnError {
    fn from(err: NarrativeError) -> Self {
        match err {
            NarrativeError::Transport(msg) => TurnError::Transport(msg),
            NarrativeError::Timeout(secs) => TurnError::Timeout(secs),
            NarrativeError::InvalidResponse(msg) => TurnError::MalformedProposal(msg),
        }
    }
}
