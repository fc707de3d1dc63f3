//! Common utilities for integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    body::{to_bytes, Body},
    http::{Request, Response},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use server::{build_router, config::ServerConfig, AppState};
use tts_core::{ModelLoader, ModelOutput, OneOrMany, SpeechModel, SynthesisInput};

pub const TEST_SAMPLE_RATE: u32 = 24_000;

/// Counters shared between a test and the fake model it serves.
#[derive(Debug, Default)]
pub struct Calls {
    pub loads: AtomicUsize,
    pub invocations: AtomicUsize,
    pub last_speaker: Mutex<Option<OneOrMany<String>>>,
}

impl Calls {
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }

    /// Speaker argument of the most recent model call.
    pub fn last_speaker(&self) -> Option<OneOrMany<String>> {
        self.last_speaker.lock().unwrap().clone()
    }
}

/// Produces one second of constant signal per input text.
pub struct FakeModel {
    calls: Arc<Calls>,
}

impl SpeechModel for FakeModel {
    fn supported_speakers(&self) -> Option<Vec<String>> {
        Some(vec!["Ono_Anna".to_string(), "Ryan".to_string()])
    }

    fn device(&self) -> String {
        "cpu".to_string()
    }

    fn generate_custom_voice(&self, input: &SynthesisInput) -> anyhow::Result<ModelOutput> {
        self.calls.invocations.fetch_add(1, Ordering::SeqCst);
        *self.calls.last_speaker.lock().unwrap() = Some(input.speaker.clone());
        let wavs = input
            .text
            .clone()
            .map(|_| vec![0.25_f32; TEST_SAMPLE_RATE as usize]);
        Ok(ModelOutput {
            wavs,
            sample_rate: TEST_SAMPLE_RATE,
        })
    }
}

pub struct FakeLoader {
    calls: Arc<Calls>,
    fail: bool,
}

impl ModelLoader for FakeLoader {
    fn load(&self, model_id: &str) -> anyhow::Result<Arc<dyn SpeechModel>> {
        self.calls.loads.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            anyhow::bail!("weights for {model_id} not found");
        }
        Ok(Arc::new(FakeModel {
            calls: Arc::clone(&self.calls),
        }))
    }
}

pub fn test_config() -> ServerConfig {
    ServerConfig {
        model_id: "test/fake-voice".to_string(),
        preload: false,
        ..ServerConfig::default()
    }
}

/// Create a test app whose model loads successfully.
pub fn create_test_app() -> (Router, Arc<Calls>) {
    create_app_with(false)
}

/// Create a test app whose model never loads.
pub fn create_failing_app() -> (Router, Arc<Calls>) {
    create_app_with(true)
}

fn create_app_with(fail: bool) -> (Router, Arc<Calls>) {
    let calls = Arc::new(Calls::default());
    let loader = Arc::new(FakeLoader {
        calls: Arc::clone(&calls),
        fail,
    });
    let state = AppState::new(loader, test_config());
    (build_router(state), calls)
}

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    app.clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn post_json(app: &Router, uri: &str, body: &Value) -> Response<Body> {
    post_raw(app, uri, body.to_string()).await
}

pub async fn post_raw(app: &Router, uri: &str, body: String) -> Response<Body> {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

pub fn header<'a>(response: &'a Response<Body>, name: &str) -> &'a str {
    response
        .headers()
        .get(name)
        .unwrap_or_else(|| panic!("missing header {name}"))
        .to_str()
        .unwrap()
}
