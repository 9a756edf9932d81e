//! Tokio host loop for a learning session.
//!
//! [`SessionRunner`] feeds events into the controller and carries out the
//! effects it returns. Timers and speech work run as tokio tasks that report
//! back through a channel, so the controller itself never blocks or awaits.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use vocab_core::{
    Effect, Event, KeyValueStore, ProgressStore, Scheduler, SessionConfig, SessionContext,
    SessionController, SessionSummarizer, Timer, Word,
};

use crate::speech::{AudioRecorder, PronunciationScoring, SpeechSynthesis};

/// Delivers timers as `Event::TimerFired` on the runner's channel.
#[derive(Clone)]
pub struct TokioScheduler {
    events: mpsc::UnboundedSender<Event>,
}

impl TokioScheduler {
    pub fn new(events: mpsc::UnboundedSender<Event>) -> Self {
        Self { events }
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&mut self, delay: Duration, timer: Timer) {
        let events = self.events.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // The runner may already be gone.
            let _ = events.send(Event::TimerFired(timer));
        });
    }
}

/// Optional device and cloud collaborators. Missing ones resolve their
/// effects immediately as if the work had failed.
#[derive(Clone, Default)]
pub struct SpeechServices {
    pub synthesis: Option<Arc<dyn SpeechSynthesis>>,
    pub scoring: Option<Arc<dyn PronunciationScoring>>,
    pub recorder: Option<Arc<dyn AudioRecorder>>,
}

pub type RunnerController = SessionController<TokioScheduler>;

/// Runs one session against a progress store.
pub struct SessionRunner<S: KeyValueStore> {
    controller: RunnerController,
    progress: Arc<ProgressStore<S>>,
    services: SpeechServices,
    events_tx: mpsc::UnboundedSender<Event>,
    events_rx: mpsc::UnboundedReceiver<Event>,
}

impl<S: KeyValueStore> SessionRunner<S> {
    /// Start a session. Must be called from within a tokio runtime.
    pub fn new(
        context: SessionContext,
        words: Vec<Word>,
        config: SessionConfig,
        progress: Arc<ProgressStore<S>>,
        services: SpeechServices,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let mastered = progress.mastered_words(&context.learning_language, &context.category);
        let scheduler = TokioScheduler::new(events_tx.clone());
        let controller = SessionController::new(context, words, &mastered, config, scheduler);

        Self {
            controller,
            progress,
            services,
            events_tx,
            events_rx,
        }
    }

    pub fn controller(&self) -> &RunnerController {
        &self.controller
    }

    pub fn progress(&self) -> &ProgressStore<S> {
        &self.progress
    }

    /// Handle one event and execute the resulting effects.
    pub fn dispatch(&mut self, event: Event) -> Vec<Effect> {
        let effects = self.controller.handle(event);
        for effect in &effects {
            self.execute(effect.clone());
        }
        effects
    }

    /// Wait for the next timer or service completion and dispatch it.
    pub async fn step(&mut self) -> Vec<Effect> {
        match self.events_rx.recv().await {
            Some(event) => self.dispatch(event),
            None => Vec::new(),
        }
    }

    /// Dispatch internal events until `done` holds.
    pub async fn run_until<F>(&mut self, mut done: F) -> Vec<Effect>
    where
        F: FnMut(&RunnerController) -> bool,
    {
        let mut effects = Vec::new();
        while !done(&self.controller) {
            effects.extend(self.step().await);
        }
        effects
    }

    /// Dispatch every event already queued without waiting.
    pub fn drain(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        while let Ok(event) = self.events_rx.try_recv() {
            effects.extend(self.dispatch(event));
        }
        effects
    }

    fn execute(&self, effect: Effect) {
        let context = self.controller.context();
        match effect {
            Effect::MarkKnown { word_id } => self.progress.mark_mastered(
                &context.learning_language,
                &context.category,
                &[word_id],
                false,
            ),
            Effect::SessionCompleted(summary) => {
                SessionSummarizer::persist(&summary, self.progress.as_ref());
            }
            Effect::Speak { text, language } => {
                let synthesis = self.services.synthesis.clone();
                self.spawn(async move {
                    if let Some(synthesis) = synthesis {
                        if let Err(e) = synthesis.speak(&text, &language).await {
                            tracing::warn!(error = %e, "speech failed");
                        }
                    }
                    Some(Event::SpeechFinished)
                });
            }
            Effect::StartRecording { attempt } => {
                let recorder = self.services.recorder.clone();
                self.spawn(async move {
                    let Some(recorder) = recorder else {
                        tracing::warn!("no audio recorder available");
                        return Some(Event::RecordingFailed { attempt });
                    };
                    match recorder.start().await {
                        Ok(()) => None,
                        Err(e) => {
                            tracing::warn!(error = %e, attempt, "failed to start recording");
                            Some(Event::RecordingFailed { attempt })
                        }
                    }
                });
            }
            Effect::StopRecording { attempt } => {
                let recorder = self.services.recorder.clone();
                self.spawn(async move {
                    let Some(recorder) = recorder else {
                        return Some(Event::RecordingFailed { attempt });
                    };
                    match recorder.stop().await {
                        Ok(audio_uri) => Some(Event::RecordingStopped { attempt, audio_uri }),
                        Err(e) => {
                            tracing::warn!(error = %e, attempt, "failed to stop recording");
                            Some(Event::RecordingFailed { attempt })
                        }
                    }
                });
            }
            Effect::AssessPronunciation {
                word_id,
                audio_uri,
                reference_text,
                language,
            } => {
                let scoring = self.services.scoring.clone();
                self.spawn(async move {
                    let result = match scoring {
                        Some(scoring) => scoring
                            .assess(&audio_uri, &reference_text, &language)
                            .await
                            .map_err(|e| {
                                tracing::warn!(error = %e, word_id = %word_id, "pronunciation assessment failed")
                            })
                            .ok(),
                        None => None,
                    };
                    Some(Event::AnalysisResolved { word_id, result })
                });
            }
        }
    }

    fn spawn<F>(&self, task: F)
    where
        F: std::future::Future<Output = Option<Event>> + Send + 'static,
    {
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            if let Some(event) = task.await {
                let _ = events.send(event);
            }
        });
    }
}
