use std::ops::RangeInclusive;

use tts_core::AudioFormat;

use crate::error::ApiError;
use crate::handlers::TtsRequest;

/// Maximum text length for TTS requests, in characters
const MAX_TEXT_LENGTH: usize = 2000;
/// Minimum text length for TTS requests, in characters
const MIN_TEXT_LENGTH: usize = 1;

const TEMPERATURE_RANGE: RangeInclusive<f32> = 0.5..=2.0;
const TOP_P_RANGE: RangeInclusive<f32> = 0.1..=1.0;
const TOP_K_RANGE: RangeInclusive<u32> = 1..=100;
const MAX_NEW_TOKENS_RANGE: RangeInclusive<u32> = 256..=4096;
const SPEED_RANGE: RangeInclusive<f32> = 0.5..=2.0;
const TRIM_MS_RANGE: RangeInclusive<u64> = 0..=800;

fn check_range<T>(field: &str, value: T, range: &RangeInclusive<T>) -> Result<(), ApiError>
where
    T: PartialOrd + std::fmt::Display,
{
    if range.contains(&value) {
        Ok(())
    } else {
        Err(ApiError::Validation(format!(
            "{field} must be between {} and {} (got {value})",
            range.start(),
            range.end()
        )))
    }
}

/// Validate TTS request and return the requested output format.
pub fn validate_tts_request(req: &TtsRequest) -> Result<AudioFormat, ApiError> {
    let len = req.text.chars().count();
    if len < MIN_TEXT_LENGTH {
        return Err(ApiError::Validation("Text cannot be empty".to_string()));
    }
    if len > MAX_TEXT_LENGTH {
        return Err(ApiError::Validation(format!(
            "Text too long (max {} characters, got {})",
            MAX_TEXT_LENGTH, len
        )));
    }

    check_range("temperature", req.temperature, &TEMPERATURE_RANGE)?;
    check_range("top_p", req.top_p, &TOP_P_RANGE)?;
    check_range("top_k", req.top_k, &TOP_K_RANGE)?;
    check_range("max_new_tokens", req.max_new_tokens, &MAX_NEW_TOKENS_RANGE)?;
    check_range("speed", req.speed, &SPEED_RANGE)?;
    check_range("trim_ms", req.trim_ms, &TRIM_MS_RANGE)?;

    AudioFormat::parse(&req.format).ok_or_else(|| {
        ApiError::Validation(format!(
            "Invalid format: {}. Expected one of: wav, ogg",
            req.format
        ))
    })
}
