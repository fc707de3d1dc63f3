use std::{sync::Arc, time::Instant};

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderName},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use tts_core::{
    codec, model, pipeline::DEFAULT_TRIM_MS, resolve_speaker, speakers::DEFAULT_SPEAKER,
    SpeakerInfo, SynthesisJob, SynthesisParameters, TtsError, SPEAKERS,
};

use crate::error::ApiError;
use crate::metrics::MetricsResponse;
use crate::validation::validate_tts_request;
use crate::AppState;

pub const AUDIO_DURATION_HEADER: HeaderName = HeaderName::from_static("x-audio-duration");
pub const SAMPLE_RATE_HEADER: HeaderName = HeaderName::from_static("x-sample-rate");

fn default_speaker() -> String {
    DEFAULT_SPEAKER.to_string()
}
fn default_language() -> String {
    "Japanese".to_string()
}
fn default_temperature() -> f32 {
    model::DEFAULT_TEMPERATURE
}
fn default_top_p() -> f32 {
    model::DEFAULT_TOP_P
}
fn default_top_k() -> u32 {
    model::DEFAULT_TOP_K
}
fn default_max_new_tokens() -> u32 {
    model::DEFAULT_MAX_NEW_TOKENS
}
fn default_speed() -> f32 {
    model::DEFAULT_SPEED
}
fn default_format() -> String {
    "wav".to_string()
}
fn default_stabilize() -> bool {
    true
}
fn default_trim_ms() -> u64 {
    DEFAULT_TRIM_MS
}

#[derive(Debug, Clone, Deserialize)]
pub struct TtsRequest {
    pub text: String,
    #[serde(default = "default_speaker")]
    pub speaker: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub instruct: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    #[serde(default = "default_top_k")]
    pub top_k: u32,
    #[serde(default = "default_max_new_tokens")]
    pub max_new_tokens: u32,
    #[serde(default = "default_speed")]
    pub speed: f32,
    #[serde(default = "default_format")]
    pub format: String,
    #[serde(default = "default_stabilize")]
    pub stabilize: bool,
    #[serde(default = "default_trim_ms")]
    pub trim_ms: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ServerStatus {
    pub status: String,
    pub model_loaded: bool,
    pub model_id: Option<String>,
    pub device: Option<String>,
    pub speakers: Vec<String>,
    pub loaded_at: Option<f64>,
}

pub async fn health_check() -> &'static str {
    "ok"
}

pub async fn status_endpoint(State(state): State<AppState>) -> Json<ServerStatus> {
    let status = state.models.status();
    Json(ServerStatus {
        status: "ok".to_string(),
        model_loaded: status.model_id.is_some(),
        model_id: status.model_id,
        device: status.device,
        speakers: status.speakers,
        loaded_at: status.loaded_at,
    })
}

pub async fn list_speakers() -> Json<&'static [SpeakerInfo]> {
    Json(&SPEAKERS[..])
}

pub async fn metrics_endpoint(State(state): State<AppState>) -> Json<MetricsResponse> {
    Json(state.metrics.snapshot())
}

pub async fn tts_endpoint(
    State(state): State<AppState>,
    payload: Result<Json<TtsRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let started = Instant::now();
    let result = synthesize_request(&state, payload).await;

    state
        .metrics
        .tts
        .record_request(started.elapsed().as_millis() as u64);
    if result.is_err() {
        state.metrics.tts.record_error();
    }
    result
}

async fn synthesize_request(
    state: &AppState,
    payload: Result<Json<TtsRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::Validation(e.body_text()))?;
    let format = validate_tts_request(&req)?;

    let loaded = state.models.get_or_load().await.inspect_err(|_| {
        state.metrics.synthesis.record_load_failure();
    })?;

    // the model may report ids in a different case than the request
    let speaker = resolve_speaker(&req.speaker, &loaded.speakers)?;

    let mut job = SynthesisJob::new(req.text, speaker);
    job.language = req.language;
    job.instruct = req.instruct;
    job.params = SynthesisParameters {
        temperature: req.temperature,
        top_p: req.top_p,
        top_k: req.top_k,
        max_new_tokens: req.max_new_tokens,
        speed: req.speed,
    };
    job.stabilize = req.stabilize;
    job.trim_ms = req.trim_ms;

    let model = Arc::clone(&loaded.model);
    let synth_started = Instant::now();
    let (audio, synthesized) = tokio::task::spawn_blocking(move || {
        let out = tts_core::synthesize(model.as_ref(), &job)?;
        let bytes = codec::encode(&out.waveform, format).map_err(TtsError::synthesis)?;
        Ok::<_, TtsError>((bytes, out))
    })
    .await
    .map_err(|e| ApiError::Synthesis(format!("Task join error: {e}")))??;

    let waveform = &synthesized.waveform;
    let duration = waveform.duration_secs();
    let synth_ms = synth_started.elapsed().as_millis() as u64;
    state
        .metrics
        .synthesis
        .record_synthesis(synth_ms, synthesized.chunks, duration);
    info!(
        chunks = synthesized.chunks,
        duration_secs = duration,
        sample_rate = waveform.sample_rate,
        bytes = audio.len(),
        elapsed_ms = synth_ms,
        "Synthesized speech"
    );

    Ok((
        [
            (header::CONTENT_TYPE, format.mime_type().to_string()),
            (AUDIO_DURATION_HEADER, format!("{duration:.2}")),
            (SAMPLE_RATE_HEADER, waveform.sample_rate.to_string()),
        ],
        audio,
    )
        .into_response())
}
