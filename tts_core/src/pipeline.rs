//! Chunk → stabilize → synthesize → trim → stitch.

use tracing::debug;

use crate::audio::{concatenate_audio, trim_all, Waveform};
use crate::batch::OneOrMany;
use crate::error::{TtsError, TtsResult};
use crate::model::{SpeechModel, SynthesisInput, SynthesisParameters};
use crate::text::{add_stabilize_prefix, resolve_language, split_long_text, AUTO_SPLIT_THRESHOLD};

/// Default lead-in trimmed after stabilized synthesis, in milliseconds.
pub const DEFAULT_TRIM_MS: u64 = 300;

/// Everything needed to turn one request's text into a waveform.
/// `speaker` must already be resolved against the model's speaker list.
#[derive(Debug, Clone)]
pub struct SynthesisJob {
    pub text: String,
    pub speaker: String,
    pub language: String,
    pub instruct: String,
    pub params: SynthesisParameters,
    pub stabilize: bool,
    pub trim_ms: u64,
    pub max_chars: usize,
}

impl SynthesisJob {
    pub fn new(text: impl Into<String>, speaker: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            speaker: speaker.into(),
            language: "Japanese".to_string(),
            instruct: String::new(),
            params: SynthesisParameters::default(),
            stabilize: true,
            trim_ms: DEFAULT_TRIM_MS,
            max_chars: AUTO_SPLIT_THRESHOLD,
        }
    }
}

/// Result of a pipeline run.
#[derive(Debug, Clone)]
pub struct Synthesized {
    pub waveform: Waveform,
    pub chunks: usize,
}

/// Run the whole pipeline for `job` on `model`. Blocks for the model call.
pub fn synthesize(model: &dyn SpeechModel, job: &SynthesisJob) -> TtsResult<Synthesized> {
    if job.text.is_empty() {
        return Err(TtsError::InvalidInput("text is empty".to_string()));
    }

    let chunks = OneOrMany::from_vec(split_long_text(&job.text, job.max_chars));
    let chunk_count = chunks.len();
    let texts = if job.stabilize {
        add_stabilize_prefix(chunks)
    } else {
        chunks
    };
    debug!(chunks = chunk_count, stabilize = job.stabilize, "Synthesizing");

    let input = SynthesisInput::new(
        texts,
        resolve_language(&job.language),
        &job.speaker,
        &job.instruct,
        job.params,
    );

    let output = model
        .generate_custom_voice(&input)
        .map_err(TtsError::synthesis)?;
    if !output.wavs.same_shape(&input.text) {
        return Err(TtsError::Synthesis(format!(
            "model returned {} waveform(s) for {} text(s)",
            output.wavs.len(),
            input.text.len()
        )));
    }
    if output.sample_rate == 0 {
        return Err(TtsError::synthesis("model reported a sample rate of 0"));
    }

    let sample_rate = output.sample_rate;
    let wavs = if job.stabilize && job.trim_ms > 0 {
        trim_all(output.wavs, sample_rate, job.trim_ms)
    } else {
        output.wavs
    };

    Ok(Synthesized {
        waveform: Waveform::new(concatenate_audio(wavs.into_vec(), sample_rate), sample_rate),
        chunks: chunk_count,
    })
}
