//! Speech services: neural text-to-speech and pronunciation assessment.
//!
//! The session controller only emits effects. The traits here are what the
//! runner calls to carry them out; [`AzureSpeechClient`] implements them
//! against the Azure Speech REST endpoints.

use async_trait::async_trait;
use base64::Engine;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use vocab_core::language::{azure_locale, azure_voice};
use vocab_core::types::WordAssessment;
use vocab_core::PronunciationResult;

use crate::config::AppConfig;

const OUTPUT_FORMAT: &str = "audio-16khz-32kbitrate-mono-mp3";
const WAV_CONTENT_TYPE: &str = "audio/wav; codecs=audio/pcm; samplerate=16000";
const SUCCESS: &str = "Success";

/// Speech errors.
#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Backend error: {status} - {message}")]
    Backend { status: u16, message: String },

    #[error("Azure Speech is not configured")]
    NotConfigured,

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Audio error: {0}")]
    Audio(String),
}

pub type SpeechResult<T> = std::result::Result<T, SpeechError>;

/// Speaks text aloud. Returns once playback has finished.
#[async_trait]
pub trait SpeechSynthesis: Send + Sync {
    async fn speak(&self, text: &str, language: &str) -> SpeechResult<()>;
}

/// Scores a recording against the text the learner was asked to say.
#[async_trait]
pub trait PronunciationScoring: Send + Sync {
    async fn assess(
        &self,
        audio_uri: &str,
        reference_text: &str,
        language: &str,
    ) -> SpeechResult<PronunciationResult>;
}

/// Microphone capture. `stop` returns the URI of the recorded file.
#[async_trait]
pub trait AudioRecorder: Send + Sync {
    async fn start(&self) -> SpeechResult<()>;
    async fn stop(&self) -> SpeechResult<String>;
}

/// Plays encoded audio to completion.
#[async_trait]
pub trait AudioOutput: Send + Sync {
    async fn play(&self, audio: Vec<u8>) -> SpeechResult<()>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct AssessmentConfig<'a> {
    reference_text: &'a str,
    grading_system: &'static str,
    granularity: &'static str,
    enable_miscue: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RecognitionResponse {
    recognition_status: String,
    #[serde(default, rename = "NBest")]
    n_best: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Candidate {
    confidence: Option<f64>,
    display: Option<String>,
    accuracy_score: Option<f64>,
    pronunciation_assessment: Option<CandidateScores>,
    #[serde(default)]
    words: Vec<RecognizedWord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CandidateScores {
    accuracy_score: Option<f64>,
    fluency_score: Option<f64>,
    completeness_score: Option<f64>,
    pron_score: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RecognizedWord {
    word: String,
    accuracy_score: Option<f64>,
    pronunciation_assessment: Option<WordScores>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WordScores {
    accuracy_score: Option<f64>,
    error_type: Option<String>,
}

/// Inner state shared across clones.
struct AzureSpeechInner {
    client: Client,
    key: Option<String>,
    region: String,
}

/// Azure Speech REST client.
#[derive(Clone)]
pub struct AzureSpeechClient {
    inner: Arc<AzureSpeechInner>,
}

impl AzureSpeechClient {
    pub fn new(key: Option<String>, region: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(AzureSpeechInner {
                client: Client::new(),
                key: key.filter(|k| !k.is_empty()),
                region: region.into(),
            }),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.azure_speech_key.clone(), config.azure_speech_region.clone())
    }

    pub fn is_configured(&self) -> bool {
        self.inner.key.is_some()
    }

    fn key(&self) -> SpeechResult<&str> {
        self.inner.key.as_deref().ok_or(SpeechError::NotConfigured)
    }

    /// Exchange the subscription key for a short-lived bearer token.
    async fn access_token(&self) -> SpeechResult<String> {
        let key = self.key()?;
        let url = format!(
            "https://{}.api.cognitive.microsoft.com/sts/v1.0/issueToken",
            self.inner.region
        );

        let resp = self
            .inner
            .client
            .post(&url)
            .header("Ocp-Apim-Subscription-Key", key)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .header("Content-Length", "0")
            .send()
            .await
            .map_err(|e| SpeechError::Network(e.to_string()))?;

        check_status(resp)
            .await?
            .text()
            .await
            .map_err(|e| SpeechError::Parse(e.to_string()))
    }

    /// Synthesize `text` with the neural voice for `language`. Returns MP3 bytes.
    pub async fn synthesize(&self, text: &str, language: &str) -> SpeechResult<Vec<u8>> {
        let token = self.access_token().await?;
        let url = format!(
            "https://{}.tts.speech.microsoft.com/cognitiveservices/v1",
            self.inner.region
        );

        let resp = self
            .inner
            .client
            .post(&url)
            .bearer_auth(token)
            .header("Content-Type", "application/ssml+xml")
            .header("X-Microsoft-OutputFormat", OUTPUT_FORMAT)
            .body(build_ssml(text, language))
            .send()
            .await
            .map_err(|e| SpeechError::Network(e.to_string()))?;

        let bytes = check_status(resp)
            .await?
            .bytes()
            .await
            .map_err(|e| SpeechError::Network(e.to_string()))?;

        tracing::debug!(language, bytes = bytes.len(), "speech synthesized");
        Ok(bytes.to_vec())
    }

    /// Score 16 kHz mono WAV audio against `reference_text`.
    pub async fn assess_audio(
        &self,
        audio: Vec<u8>,
        reference_text: &str,
        language: &str,
    ) -> SpeechResult<PronunciationResult> {
        let header = assessment_header(reference_text)?;
        let token = self.access_token().await?;
        let url = format!(
            "https://{}.stt.speech.microsoft.com/speech/recognition/conversation/cognitiveservices/v1",
            self.inner.region
        );

        let resp = self
            .inner
            .client
            .post(&url)
            .query(&[("language", azure_locale(language)), ("format", "detailed")])
            .bearer_auth(token)
            .header("Content-Type", WAV_CONTENT_TYPE)
            .header("Pronunciation-Assessment", header)
            .header("Accept", "application/json")
            .body(audio)
            .send()
            .await
            .map_err(|e| SpeechError::Network(e.to_string()))?;

        let response: RecognitionResponse = check_status(resp)
            .await?
            .json()
            .await
            .map_err(|e| SpeechError::Parse(e.to_string()))?;

        let result = to_pronunciation_result(response);
        tracing::info!(
            language,
            score = result.pronunciation_score,
            recognized = %result.recognized_text,
            "pronunciation assessed"
        );
        Ok(result)
    }
}

#[async_trait]
impl PronunciationScoring for AzureSpeechClient {
    async fn assess(
        &self,
        audio_uri: &str,
        reference_text: &str,
        language: &str,
    ) -> SpeechResult<PronunciationResult> {
        self.key()?;
        let audio = tokio::fs::read(audio_path(audio_uri))
            .await
            .map_err(|e| SpeechError::Audio(format!("{audio_uri}: {e}")))?;
        self.assess_audio(audio, reference_text, language).await
    }
}

/// Azure voices played through a local audio output.
pub struct AzureSynthesis {
    client: AzureSpeechClient,
    output: Arc<dyn AudioOutput>,
}

impl AzureSynthesis {
    pub fn new(client: AzureSpeechClient, output: Arc<dyn AudioOutput>) -> Self {
        Self { client, output }
    }
}

#[async_trait]
impl SpeechSynthesis for AzureSynthesis {
    async fn speak(&self, text: &str, language: &str) -> SpeechResult<()> {
        let audio = self.client.synthesize(text, language).await?;
        self.output.play(audio).await
    }
}

async fn check_status(resp: Response) -> SpeechResult<Response> {
    if !resp.status().is_success() {
        let status = resp.status().as_u16();
        let message = resp.text().await.unwrap_or_default();
        return Err(SpeechError::Backend { status, message });
    }
    Ok(resp)
}

/// SSML document for `text`, spoken slightly slower than normal.
pub fn build_ssml(text: &str, language: &str) -> String {
    format!(
        "<speak version='1.0' xmlns='http://www.w3.org/2001/10/synthesis' xml:lang='{}'>\
         <voice name='{}'><prosody rate='0.9' pitch='0%'>{}</prosody></voice></speak>",
        azure_locale(language),
        azure_voice(language),
        escape_xml(text)
    )
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\'' => out.push_str("&apos;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Base64 JSON value of the `Pronunciation-Assessment` header.
pub fn assessment_header(reference_text: &str) -> SpeechResult<String> {
    let config = AssessmentConfig {
        reference_text,
        grading_system: "HundredMark",
        granularity: "FullText",
        enable_miscue: true,
    };
    let json = serde_json::to_vec(&config).map_err(|e| SpeechError::Parse(e.to_string()))?;
    Ok(base64::engine::general_purpose::STANDARD.encode(json))
}

/// Local filesystem path for a recorder URI.
pub fn audio_path(uri: &str) -> &str {
    uri.strip_prefix("file://").unwrap_or(uri)
}

fn to_pronunciation_result(response: RecognitionResponse) -> PronunciationResult {
    if response.recognition_status != SUCCESS {
        tracing::debug!(status = %response.recognition_status, "no speech recognised");
        return PronunciationResult::empty();
    }
    let Some(best) = response.n_best.into_iter().next() else {
        return PronunciationResult::empty();
    };

    let scores = best.pronunciation_assessment.as_ref();
    let accuracy_score = scores
        .and_then(|s| s.accuracy_score)
        .or(best.accuracy_score)
        .unwrap_or(0.0);
    // The REST endpoint often omits fluency and completeness.
    let confidence = best.confidence.unwrap_or(1.0);
    let display = best.display.unwrap_or_default();

    let fluency_score = scores
        .and_then(|s| s.fluency_score)
        .unwrap_or_else(|| (accuracy_score * confidence).round());
    let completeness_score = scores
        .and_then(|s| s.completeness_score)
        .unwrap_or(if display.is_empty() { 0.0 } else { 100.0 });
    let pronunciation_score = scores.and_then(|s| s.pron_score).unwrap_or(accuracy_score);

    let words = best
        .words
        .into_iter()
        .map(|w| {
            let detail = w.pronunciation_assessment;
            WordAssessment {
                word: w.word,
                accuracy_score: detail
                    .as_ref()
                    .and_then(|d| d.accuracy_score)
                    .or(w.accuracy_score)
                    .unwrap_or(0.0),
                error_type: detail
                    .and_then(|d| d.error_type)
                    .filter(|e| !e.is_empty())
                    .unwrap_or_else(|| "None".to_string()),
            }
        })
        .collect();

    PronunciationResult {
        accuracy_score,
        fluency_score,
        completeness_score,
        pronunciation_score,
        recognized_text: display,
        words,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(json: &str) -> PronunciationResult {
        to_pronunciation_result(serde_json::from_str(json).unwrap())
    }

    #[test]
    fn test_full_assessment() {
        let result = parse(
            r#"{
                "RecognitionStatus": "Success",
                "NBest": [{
                    "Confidence": 0.9,
                    "Display": "Merhaba.",
                    "PronunciationAssessment": {
                        "AccuracyScore": 88.0,
                        "FluencyScore": 92.0,
                        "CompletenessScore": 100.0,
                        "PronScore": 90.5
                    },
                    "Words": [{
                        "Word": "merhaba",
                        "PronunciationAssessment": { "AccuracyScore": 88.0, "ErrorType": "None" }
                    }]
                }]
            }"#,
        );
        assert_eq!(result.accuracy_score, 88.0);
        assert_eq!(result.fluency_score, 92.0);
        assert_eq!(result.pronunciation_score, 90.5);
        assert_eq!(result.recognized_text, "Merhaba.");
        assert_eq!(
            result.words,
            vec![WordAssessment {
                word: "merhaba".into(),
                accuracy_score: 88.0,
                error_type: "None".into(),
            }]
        );
    }

    #[test]
    fn test_missing_scores_are_estimated() {
        let result = parse(
            r#"{
                "RecognitionStatus": "Success",
                "NBest": [{
                    "Confidence": 0.5,
                    "Display": "Kedi",
                    "AccuracyScore": 71.0,
                    "Words": [{ "Word": "kedi", "AccuracyScore": 64.0 }]
                }]
            }"#,
        );
        assert_eq!(result.accuracy_score, 71.0);
        assert_eq!(result.fluency_score, 36.0);
        assert_eq!(result.completeness_score, 100.0);
        assert_eq!(result.pronunciation_score, 71.0);
        assert_eq!(result.words[0].accuracy_score, 64.0);
        assert_eq!(result.words[0].error_type, "None");
    }

    #[test]
    fn test_no_display_means_incomplete() {
        let result = parse(
            r#"{ "RecognitionStatus": "Success", "NBest": [{ "AccuracyScore": 40.0 }] }"#,
        );
        assert_eq!(result.completeness_score, 0.0);
        assert_eq!(result.fluency_score, 40.0);
        assert_eq!(result.recognized_text, "");
    }

    #[test]
    fn test_no_match_is_zero_result() {
        assert_eq!(
            parse(r#"{ "RecognitionStatus": "NoMatch" }"#),
            PronunciationResult::empty()
        );
        assert_eq!(
            parse(r#"{ "RecognitionStatus": "Success", "NBest": [] }"#),
            PronunciationResult::empty()
        );
    }

    #[test]
    fn test_assessment_header() {
        let header = assessment_header("çay").unwrap();
        let decoded = base64::engine::general_purpose::STANDARD.decode(header).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&decoded).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "ReferenceText": "çay",
                "GradingSystem": "HundredMark",
                "Granularity": "FullText",
                "EnableMiscue": true
            })
        );
    }

    #[test]
    fn test_ssml() {
        let ssml = build_ssml("süt & ekmek", "tr");
        assert!(ssml.contains("xml:lang='tr-TR'"));
        assert!(ssml.contains("<voice name='tr-TR-EmelNeural'>"));
        assert!(ssml.contains("<prosody rate='0.9' pitch='0%'>süt &amp; ekmek</prosody>"));

        let fallback = build_ssml("hello", "xx");
        assert!(fallback.contains("en-US-JennyNeural"));
    }

    #[test]
    fn test_audio_path() {
        assert_eq!(audio_path("file:///tmp/a.wav"), "/tmp/a.wav");
        assert_eq!(audio_path("/tmp/b.wav"), "/tmp/b.wav");
    }

    #[tokio::test]
    async fn test_unconfigured_client() {
        let client = AzureSpeechClient::new(None, "westeurope");
        assert!(!client.is_configured());
        assert!(matches!(
            client.synthesize("merhaba", "tr").await,
            Err(SpeechError::NotConfigured)
        ));
        assert!(matches!(
            client.assess("file:///missing.wav", "merhaba", "tr").await,
            Err(SpeechError::NotConfigured)
        ));
        assert!(!AzureSpeechClient::new(Some(String::new()), "westeurope").is_configured());
    }
}
