//! Post-processing of synthesized audio: lead-in trimming and stitching.

use crate::batch::OneOrMany;

/// Silence inserted between stitched chunks, in milliseconds.
pub const CHUNK_GAP_MS: u64 = 300;

/// Mono PCM samples in [-1.0, 1.0] with their sample rate.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl Waveform {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Number of samples covering `ms` milliseconds, rounded down.
pub fn samples_for_ms(sample_rate: u32, ms: u64) -> usize {
    (sample_rate as u64 * ms / 1000) as usize
}

/// Drop the first `trim_ms` of audio.
///
/// Audio that is not longer than the trim length is returned untouched rather
/// than emptied.
pub fn trim_audio_start(mut audio: Vec<f32>, sample_rate: u32, trim_ms: u64) -> Vec<f32> {
    let trim_samples = samples_for_ms(sample_rate, trim_ms);
    if audio.len() > trim_samples {
        audio.drain(..trim_samples);
    }
    audio
}

/// [`trim_audio_start`] applied to every waveform of a single or batched result.
pub fn trim_all(audio: OneOrMany<Vec<f32>>, sample_rate: u32, trim_ms: u64) -> OneOrMany<Vec<f32>> {
    audio.map(|a| trim_audio_start(a, sample_rate, trim_ms))
}

/// Join waveforms in order with [`CHUNK_GAP_MS`] of silence between neighbours.
pub fn concatenate_audio(mut audio_list: Vec<Vec<f32>>, sample_rate: u32) -> Vec<f32> {
    if audio_list.len() <= 1 {
        return audio_list.pop().unwrap_or_default();
    }

    let gap = samples_for_ms(sample_rate, CHUNK_GAP_MS);
    let total = audio_list.iter().map(Vec::len).sum::<usize>() + gap * (audio_list.len() - 1);

    let mut out = Vec::with_capacity(total);
    for (i, audio) in audio_list.iter().enumerate() {
        if i > 0 {
            out.resize(out.len() + gap, 0.0);
        }
        out.extend_from_slice(audio);
    }
    out
}
