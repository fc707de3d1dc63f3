//! Speech synthesis core: text chunking, stabilization, model invocation,
//! trimming, stitching and encoding.

pub mod audio;
pub mod batch;
pub mod cache;
pub mod codec;
pub mod error;
pub mod model;
pub mod piper;
pub mod pipeline;
pub mod speakers;
pub mod text;

pub use audio::{concatenate_audio, trim_audio_start, Waveform};
pub use batch::OneOrMany;
pub use cache::{CacheState, CacheStatus, LoadedModel, ModelCache};
pub use codec::AudioFormat;
pub use error::{TtsError, TtsResult};
pub use model::{ModelLoader, ModelOutput, SpeechModel, SynthesisInput, SynthesisParameters};
pub use piper::PiperLoader;
pub use pipeline::{synthesize, SynthesisJob, Synthesized};
pub use speakers::{resolve_speaker, SpeakerInfo, SPEAKERS};
pub use text::{add_stabilize_prefix, split_long_text, STABILIZE_PREFIX};

/// Model served when `QWEN_TTS_MODEL` is not set.
pub const DEFAULT_MODEL_ID: &str = "Qwen/Qwen3-TTS-12Hz-0.6B-CustomVoice";
