//! Inbound bridge: raw bytes → canonical i16 samples at 24 kHz.

use crate::decode::decode_samples;
use crate::resample::resample_linear;
use crate::types::DecodeError;

/// Sample rate required by the voice execution pipeline.
pub const CANONICAL_SAMPLE_RATE: u32 = 24_000;

/// Convert a raw audio byte buffer at `source_rate` into canonical
/// 16-bit signed samples at 24 kHz.
///
/// Deterministic and pure: decode (format fallback) → resample (skipped
/// when already canonical) → scale by 32767 and truncate toward zero.
pub fn to_canonical(bytes: &[u8], source_rate: u32) -> Result<Vec<i16>, DecodeError> {
    let samples = decode_samples(bytes)?;
    let samples = if source_rate == CANONICAL_SAMPLE_RATE {
        samples
    } else {
        resample_linear(&samples, source_rate, CANONICAL_SAMPLE_RATE)
    };
    Ok(samples.iter().map(|s| (s * 32767.0) as i16).collect())
}
