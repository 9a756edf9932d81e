//! Application state.

use anyhow::Context;
use std::sync::Arc;
use vocab_core::{
    CategoryStats, JsonCatalog, ProgressStore, SessionConfig, SessionContext, WordCatalog,
};

use crate::config::AppConfig;
use crate::db::SqliteStore;
use crate::runner::{SessionRunner, SpeechServices};
use crate::speech::{
    AudioOutput, AudioRecorder, AzureSpeechClient, AzureSynthesis, SpeechSynthesis,
};

/// Global application state.
pub struct AppState {
    pub config: AppConfig,
    pub progress: Arc<ProgressStore<SqliteStore>>,
    pub catalog: Arc<JsonCatalog>,
    pub speech: AzureSpeechClient,
}

impl AppState {
    /// Open the progress database and load the word catalog.
    pub fn open(config: AppConfig) -> anyhow::Result<Self> {
        std::fs::create_dir_all(&config.data_dir).with_context(|| {
            format!("failed to create data directory {}", config.data_dir.display())
        })?;

        let db_path = config.db_path();
        tracing::info!(path = %db_path.display(), "Opening progress database...");
        let store = SqliteStore::open(&db_path)
            .with_context(|| format!("failed to open database {}", db_path.display()))?;

        let catalog = match &config.catalog_dir {
            Some(dir) => JsonCatalog::from_dir(dir)
                .with_context(|| format!("failed to load word catalog from {}", dir.display()))?,
            None => {
                tracing::warn!("SYNORA_CATALOG_DIR not set, starting with an empty catalog");
                JsonCatalog::new()
            }
        };

        Ok(Self::new(config, store, catalog))
    }

    pub fn new(config: AppConfig, store: SqliteStore, catalog: JsonCatalog) -> Self {
        let speech = AzureSpeechClient::from_config(&config);
        if !speech.is_configured() {
            tracing::warn!("AZURE_SPEECH_KEY not set, speech and pronunciation scoring disabled");
        }

        Self {
            config,
            progress: Arc::new(ProgressStore::new(store)),
            catalog: Arc::new(catalog),
            speech,
        }
    }

    /// Speech collaborators backed by Azure. Playback and capture are device concerns.
    pub fn speech_services(
        &self,
        output: Option<Arc<dyn AudioOutput>>,
        recorder: Option<Arc<dyn AudioRecorder>>,
    ) -> SpeechServices {
        if !self.speech.is_configured() {
            return SpeechServices {
                recorder,
                ..SpeechServices::default()
            };
        }

        SpeechServices {
            synthesis: output.map(|output| {
                Arc::new(AzureSynthesis::new(self.speech.clone(), output)) as Arc<dyn SpeechSynthesis>
            }),
            scoring: Some(Arc::new(self.speech.clone())),
            recorder,
        }
    }

    /// Start a session over the catalog words of `context`.
    pub fn start_session(
        &self,
        context: SessionContext,
        services: SpeechServices,
    ) -> SessionRunner<SqliteStore> {
        let words = self.catalog.words(
            &context.category,
            &context.learning_language,
            &context.native_language,
            context.level,
        );
        let config = SessionConfig {
            scoring_enabled: services.scoring.is_some(),
            ..SessionConfig::default()
        };
        SessionRunner::new(context, words, config, self.progress.clone(), services)
    }

    /// Mastery statistics for every catalog category.
    pub fn category_stats(&self) -> Vec<(String, CategoryStats)> {
        self.catalog
            .categories()
            .into_iter()
            .map(|category| {
                let total = self.catalog.category_size(category);
                (category.to_string(), self.progress.category_stats(category, total))
            })
            .collect()
    }
}
