//! Desktop host for the vocabulary session engine.
//!
//! Wires the engine to SQLite persistence, Azure speech services and a tokio
//! event loop.

pub mod config;
pub mod db;
pub mod logging;
pub mod runner;
pub mod speech;
pub mod state;

use config::AppConfig;
use state::AppState;

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    logging::init();

    let config = AppConfig::from_env();
    let state = AppState::open(config)?;

    tracing::info!(
        categories = state.catalog.categories().len(),
        speech = state.speech.is_configured(),
        "Synora ready"
    );
    for (category, stats) in state.category_stats() {
        tracing::info!(
            category = %category,
            total = stats.total_words,
            learned = stats.learned_words,
            mastered = stats.mastered_words,
            average_mastery = stats.average_mastery,
            "category progress"
        );
    }

    Ok(())
}
