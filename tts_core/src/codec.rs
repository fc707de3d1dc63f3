//! Audio container encoding for HTTP responses.

use std::io::Cursor;
use std::num::{NonZeroU32, NonZeroU8};

use vorbis_rs::VorbisEncoderBuilder;

use crate::audio::Waveform;

/// Samples handed to the Vorbis encoder per call.
const VORBIS_BLOCK: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Wav,
    Ogg,
}

impl AudioFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "wav" => Some(Self::Wav),
            "ogg" => Some(Self::Ogg),
            _ => None,
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Wav => "audio/wav",
            Self::Ogg => "audio/ogg",
        }
    }
}

/// Encode a waveform in the requested container.
pub fn encode(waveform: &Waveform, format: AudioFormat) -> anyhow::Result<Vec<u8>> {
    match format {
        AudioFormat::Wav => encode_wav(&waveform.samples, waveform.sample_rate),
        AudioFormat::Ogg => encode_ogg(&waveform.samples, waveform.sample_rate),
    }
}

/// 16-bit PCM mono WAV.
pub fn encode_wav(samples: &[f32], sample_rate: u32) -> anyhow::Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    // WAV header (44 bytes) + 2 bytes per sample
    let mut cursor = Cursor::new(Vec::<u8>::with_capacity(44 + samples.len() * 2));
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)
            .map_err(|e| anyhow::anyhow!("wav write err: {e}"))?;

        const I16_MAX_F32: f32 = i16::MAX as f32;
        for &s in samples {
            let v = (s.clamp(-1.0, 1.0) * I16_MAX_F32) as i16;
            writer
                .write_sample(v)
                .map_err(|e| anyhow::anyhow!("wav sample err: {e}"))?;
        }
        writer
            .finalize()
            .map_err(|e| anyhow::anyhow!("wav finalize err: {e}"))?;
    }

    Ok(cursor.into_inner())
}

/// Ogg Vorbis mono at the encoder's default quality.
pub fn encode_ogg(samples: &[f32], sample_rate: u32) -> anyhow::Result<Vec<u8>> {
    let rate = NonZeroU32::new(sample_rate)
        .ok_or_else(|| anyhow::anyhow!("ogg encoding needs a non-zero sample rate"))?;

    let mut out = Vec::new();
    let mut encoder = VorbisEncoderBuilder::new(rate, NonZeroU8::MIN, &mut out)?.build()?;
    for block in samples.chunks(VORBIS_BLOCK) {
        encoder.encode_audio_block([block])?;
    }
    encoder.finish()?;

    Ok(out)
}
