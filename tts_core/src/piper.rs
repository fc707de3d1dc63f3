//! Piper (ONNX) voices as a [`SpeechModel`] backend.
//!
//! A model identifier is resolved to a Piper voice config (`*.onnx.json`)
//! through a JSON map file:
//!
//! ```json
//! {
//!   "Qwen/Qwen3-TTS-12Hz-0.6B-CustomVoice": "models/ja_JP/voice.onnx.json",
//!   "other-voice": { "config": "models/other/voice.onnx.json" }
//! }
//! ```
//!
//! Piper has no sampling controls, so the sampling parameters, speed and
//! instruction of a request are accepted but do not change the audio.
//! Multi-speaker voices report the names in their `speaker_id_map` and switch
//! to the requested one before each chunk.

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard},
};

use anyhow::Context;
use piper_rs::synth::{PiperSpeechStreamParallel, PiperSpeechSynthesizer};
use tracing::debug;

use crate::batch::OneOrMany;
use crate::model::{ModelLoader, ModelOutput, SpeechModel, SynthesisInput};

/// Resolves model identifiers to Piper voices and loads them.
#[derive(Debug, Clone)]
pub struct PiperLoader {
    map_path: PathBuf,
}

impl PiperLoader {
    pub fn new<P: Into<PathBuf>>(map_path: P) -> Self {
        Self {
            map_path: map_path.into(),
        }
    }

    /// Find the voice config for `model_id`, either through the map file or
    /// because the identifier is itself a config path.
    pub fn resolve_config(&self, model_id: &str) -> anyhow::Result<PathBuf> {
        if let Ok(text) = fs::read_to_string(&self.map_path) {
            let map = parse_model_map(&text)
                .with_context(|| format!("Invalid model map {}", self.map_path.display()))?;
            if let Some(path) = map.get(model_id) {
                return Ok(path.clone());
            }
        }

        let direct = Path::new(model_id);
        if direct.is_file() {
            return Ok(direct.to_path_buf());
        }

        Err(anyhow::anyhow!(
            "No voice config for model '{}' (checked {} and the identifier as a path)",
            model_id,
            self.map_path.display()
        ))
    }
}

impl ModelLoader for PiperLoader {
    fn load(&self, model_id: &str) -> anyhow::Result<Arc<dyn SpeechModel>> {
        let cfg_path = self.resolve_config(model_id)?;
        let voice = VoiceConfig::read(&cfg_path)?;

        let model = piper_rs::from_config_path(&cfg_path)
            .map_err(|e| anyhow::anyhow!("piper load error: {e}"))?;
        let synth = PiperSpeechSynthesizer::new(model)?;

        Ok(Arc::new(PiperVoice {
            synth: Mutex::new(synth),
            sample_rate: voice.sample_rate,
            speaker_ids: voice.speakers,
        }))
    }
}

/// Parse the model map. Values are a config path or `{ "config": path }`.
pub fn parse_model_map(text: &str) -> anyhow::Result<HashMap<String, PathBuf>> {
    let json: serde_json::Value =
        serde_json::from_str(text).with_context(|| "model map is not valid JSON")?;
    let obj = json
        .as_object()
        .ok_or_else(|| anyhow::anyhow!("model map must be a JSON object"))?;

    let mut map = HashMap::new();
    for (model_id, v) in obj {
        let config = match v {
            serde_json::Value::String(path) => path.clone(),
            serde_json::Value::Object(o) => o
                .get("config")
                .and_then(|x| x.as_str())
                .ok_or_else(|| anyhow::anyhow!("missing 'config' for model {}", model_id))?
                .to_string(),
            _ => {
                return Err(anyhow::anyhow!(
                    "invalid entry for model {} (expected string or object)",
                    model_id
                ))
            }
        };
        map.insert(model_id.clone(), PathBuf::from(config));
    }
    Ok(map)
}

/// The parts of a Piper voice config this backend needs.
#[derive(Debug, Clone, PartialEq)]
struct VoiceConfig {
    sample_rate: u32,
    /// `(name, id)` pairs from `speaker_id_map`, in id order.
    speakers: Vec<(String, i64)>,
}

impl VoiceConfig {
    fn read(cfg_path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(cfg_path)
            .with_context(|| format!("Failed to read config file: {}", cfg_path.display()))?;
        Self::parse(&text)
    }

    fn parse(text: &str) -> anyhow::Result<Self> {
        let json: serde_json::Value =
            serde_json::from_str(text).with_context(|| "Config file is not valid JSON")?;

        let sample_rate = json
            .get("audio")
            .and_then(|a| a.get("sample_rate"))
            .and_then(|sr| sr.as_u64())
            .ok_or_else(|| anyhow::anyhow!("Missing or invalid 'audio.sample_rate' in config"))?;

        let mut speakers: Vec<(String, i64)> = json
            .get("speaker_id_map")
            .and_then(|m| m.as_object())
            .map(|m| {
                m.iter()
                    .filter_map(|(name, id)| Some((name.clone(), id.as_i64()?)))
                    .collect()
            })
            .unwrap_or_default();
        speakers.sort_by_key(|(name, id)| (*id, name.clone()));

        Ok(Self {
            sample_rate: sample_rate as u32,
            speakers,
        })
    }
}

struct PiperVoice {
    synth: Mutex<PiperSpeechSynthesizer>,
    sample_rate: u32,
    speaker_ids: Vec<(String, i64)>,
}

/// Lock the synthesizer even if an earlier synthesis panicked while holding it.
fn lock_recovering<T>(lock: &Mutex<T>) -> MutexGuard<'_, T> {
    lock.lock().unwrap_or_else(|e| e.into_inner())
}

/// Piper id for `name`. Single-speaker voices have no ids and return `None`.
fn speaker_id(speaker_ids: &[(String, i64)], name: &str) -> anyhow::Result<Option<i64>> {
    if speaker_ids.is_empty() {
        return Ok(None);
    }
    speaker_ids
        .iter()
        .find(|(n, _)| n == name)
        .map(|(_, id)| Some(*id))
        .ok_or_else(|| anyhow::anyhow!("voice has no speaker '{name}'"))
}

impl PiperVoice {
    fn synthesize_one(
        &self,
        synth: &PiperSpeechSynthesizer,
        text: &str,
        speaker: &str,
    ) -> anyhow::Result<Vec<f32>> {
        if let Some(sid) = speaker_id(&self.speaker_ids, speaker)? {
            if let Some(e) = synth.clone_model().set_speaker(sid) {
                return Err(anyhow::anyhow!("piper speaker error: {e}"));
            }
        }

        let iter: PiperSpeechStreamParallel = synth
            .synthesize_parallel(text.to_string(), None)
            .map_err(|e| anyhow::anyhow!("piper synth error: {e}"))?;

        let mut samples: Vec<f32> = Vec::new();
        for part in iter {
            samples.extend(
                part.map_err(|e| anyhow::anyhow!("chunk error: {e}"))?
                    .into_vec(),
            );
        }
        Ok(samples)
    }
}

impl SpeechModel for PiperVoice {
    fn supported_speakers(&self) -> Option<Vec<String>> {
        if self.speaker_ids.is_empty() {
            return None;
        }
        Some(self.speaker_ids.iter().map(|(name, _)| name.clone()).collect())
    }

    fn device(&self) -> String {
        "cpu".to_string()
    }

    fn generate_custom_voice(&self, input: &SynthesisInput) -> anyhow::Result<ModelOutput> {
        debug!(
            chunks = input.text.len(),
            params = ?input.params,
            "piper ignores sampling parameters"
        );
        let synth = lock_recovering(&self.synth);

        let wavs = match (&input.text, &input.speaker) {
            (OneOrMany::Single(text), OneOrMany::Single(speaker)) => {
                OneOrMany::Single(self.synthesize_one(&synth, text, speaker)?)
            }
            (OneOrMany::Batch(texts), OneOrMany::Batch(speakers))
                if texts.len() == speakers.len() =>
            {
                OneOrMany::Batch(
                    texts
                        .iter()
                        .zip(speakers)
                        .map(|(t, s)| self.synthesize_one(&synth, t, s))
                        .collect::<anyhow::Result<Vec<_>>>()?,
                )
            }
            _ => anyhow::bail!("speaker list does not match the text batch"),
        };

        Ok(ModelOutput {
            wavs,
            sample_rate: self.sample_rate,
        })
    }
}
