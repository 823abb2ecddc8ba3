//! Statecraft Engine - replay runner.
//!
//! Plays a saved game forward against a directory of recorded narrative
//! proposals and prints the final state as JSON.
//!
//! Usage: `statecraft-engine <save.json> <proposal-dir> [choice-index]`

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use statecraft_domain::GameDate;
use statecraft_engine::{
    import_json, CheckStep, EngineConfig, GameSession, ReplayNarrative, SessionPorts,
    SystemClock, SystemRandom,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Calendar context for saves without a usable date.
const FALLBACK_START: (i32, u8) = (1949, 10);
const REPLAY_CUSTOM_ACTION: &str = "Follow the prevailing line";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv_from_repo_root();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "statecraft_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut args = std::env::args().skip(1);
    let save_path = PathBuf::from(args.next().context("missing <save.json> argument")?);
    let proposal_dir = PathBuf::from(args.next().context("missing <proposal-dir> argument")?);
    let choice_index: usize = match args.next() {
        Some(raw) => raw.parse().context("choice index must be a non-negative integer")?,
        None => 0,
    };

    let config = EngineConfig::from_env();
    tracing::info!(save = %save_path.display(), proposals = %proposal_dir.display(), "Starting replay");

    let text = tokio::fs::read_to_string(&save_path)
        .await
        .with_context(|| format!("reading {}", save_path.display()))?;
    let fallback = GameDate::new(FALLBACK_START.0, FALLBACK_START.1)?;
    let imported = import_json(&text, fallback, &config.merge_rules())?;
    if !imported.anomalies.is_empty() {
        tracing::warn!(count = imported.anomalies.len(), "Save repaired during import");
    }

    let narrative = Arc::new(
        ReplayNarrative::from_dir(&proposal_dir)
            .with_context(|| format!("reading {}", proposal_dir.display()))?,
    );
    let ports = SessionPorts {
        narrative: narrative.clone(),
        random: Arc::new(SystemRandom::new()),
        clock: Arc::new(SystemClock::new()),
    };
    let mut session = GameSession::new(imported.value, ports, &config);

    while narrative.remaining() > 0 && !session.state().game_over {
        let Some(choice) = session
            .choices()
            .get(choice_index.min(session.choices().len().saturating_sub(1)))
            .cloned()
        else {
            break;
        };

        let custom = choice.kind.takes_free_text().then_some(REPLAY_CUSTOM_ACTION);
        let mut step = session.submit_action(&choice.id, custom)?;
        loop {
            step = match step {
                CheckStep::Resolved(_) => break,
                CheckStep::CriticalInterrupt(_) => session.accept_critical()?,
                CheckStep::FailureInterrupt(_) => session.decline_reroll()?,
            };
        }

        let report = session.resolve_turn().await?;
        tracing::info!(
            date = %session.state().date,
            elapsed_months = report.elapsed_months,
            "Replayed turn"
        );
    }

    if session.state().is_awaiting_succession() {
        if let Some(successor) = session.state().preferred_successor().map(str::to_string) {
            session.confirm_successor(&successor)?;
        }
    }

    println!("{}", serde_json::to_string_pretty(&session.export())?);
    Ok(())
}

fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}
