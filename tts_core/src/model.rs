//! The seam between the pipeline and whatever actually runs the speech model.

use std::sync::Arc;

use crate::batch::OneOrMany;

pub const DEFAULT_TEMPERATURE: f32 = 1.0;
pub const DEFAULT_TOP_P: f32 = 0.9;
pub const DEFAULT_TOP_K: u32 = 50;
pub const DEFAULT_MAX_NEW_TOKENS: u32 = 2048;
pub const DEFAULT_SPEED: f32 = 1.0;

/// Sampling and pacing knobs, passed through to the model untouched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynthesisParameters {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_new_tokens: u32,
    pub speed: f32,
}

impl Default for SynthesisParameters {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            top_p: DEFAULT_TOP_P,
            top_k: DEFAULT_TOP_K,
            max_new_tokens: DEFAULT_MAX_NEW_TOKENS,
            speed: DEFAULT_SPEED,
        }
    }
}

/// One model call. All per-chunk fields share the shape of `text`.
#[derive(Debug, Clone)]
pub struct SynthesisInput {
    pub text: OneOrMany<String>,
    pub language: OneOrMany<String>,
    pub speaker: OneOrMany<String>,
    pub instruct: OneOrMany<String>,
    pub params: SynthesisParameters,
}

impl SynthesisInput {
    /// Build an input for `text`, repeating the scalar arguments to its shape.
    pub fn new(
        text: OneOrMany<String>,
        language: &str,
        speaker: &str,
        instruct: &str,
        params: SynthesisParameters,
    ) -> Self {
        Self {
            language: text.broadcast(language.to_string()),
            speaker: text.broadcast(speaker.to_string()),
            instruct: text.broadcast(instruct.to_string()),
            text,
            params,
        }
    }
}

/// Raw model output: one waveform per input text, all at `sample_rate`.
#[derive(Debug, Clone)]
pub struct ModelOutput {
    pub wavs: OneOrMany<Vec<f32>>,
    pub sample_rate: u32,
}

/// A loaded speech model.
///
/// Calls block for as long as inference takes; callers run them on the
/// blocking thread pool.
pub trait SpeechModel: Send + Sync {
    /// Speaker ids the model knows, in its own spelling. `None` when the
    /// model does not report any.
    fn supported_speakers(&self) -> Option<Vec<String>>;

    /// Label of the device the model runs on, e.g. `cpu` or `cuda:0`.
    fn device(&self) -> String;

    fn generate_custom_voice(&self, input: &SynthesisInput) -> anyhow::Result<ModelOutput>;
}

/// Creates a [`SpeechModel`] from a model identifier. Loading blocks.
pub trait ModelLoader: Send + Sync {
    fn load(&self, model_id: &str) -> anyhow::Result<Arc<dyn SpeechModel>>;
}
