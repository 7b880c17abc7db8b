//! Sample-format detection and decoding.
//!
//! Inbound buffers arrive with no format metadata (browser VAD capture sends
//! float32, native clients send int16, some telephony paths send unsigned
//! 8-bit). Formats are tried in a fixed order; the first parse that accepts
//! the buffer wins. An attempt fails only when the buffer length is not a
//! whole number of samples for that width.

use tracing::debug;

use crate::types::{DecodeError, FormatMismatch};

type Parser = fn(&[u8]) -> Result<Vec<f32>, FormatMismatch>;

/// Ordered decoder table. Order is load-bearing: f32le must be attempted
/// before i16le, and i16le before u8.
const DECODERS: &[(&str, Parser)] = &[
    ("f32le", parse_f32le),
    ("i16le", parse_i16le),
    ("u8", parse_u8),
];

/// Decode a raw byte buffer into normalized f32 samples in `[-1.0, 1.0]`.
///
/// Tries each format in [`DECODERS`] order and returns the first success.
/// If every attempt rejects the buffer, the error carries the innermost
/// (last attempted) mismatch.
pub fn decode_samples(bytes: &[u8]) -> Result<Vec<f32>, DecodeError> {
    let mut last = FormatMismatch {
        format: "f32le",
        len: bytes.len(),
    };
    for (format, parse) in DECODERS {
        match parse(bytes) {
            Ok(samples) => {
                debug!(format, samples = samples.len(), "decoded audio buffer");
                return Ok(samples);
            }
            Err(mismatch) => last = mismatch,
        }
    }
    Err(DecodeError::UnknownFormat(last))
}

fn parse_f32le(bytes: &[u8]) -> Result<Vec<f32>, FormatMismatch> {
    if bytes.len() % 4 != 0 {
        return Err(FormatMismatch {
            format: "f32le",
            len: bytes.len(),
        });
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

fn parse_i16le(bytes: &[u8]) -> Result<Vec<f32>, FormatMismatch> {
    if bytes.len() % 2 != 0 {
        return Err(FormatMismatch {
            format: "i16le",
            len: bytes.len(),
        });
    }
    Ok(bytes
        .chunks_exact(2)
        .map(|c| f32::from(i16::from_le_bytes([c[0], c[1]])) / 32767.0)
        .collect())
}

fn parse_u8(bytes: &[u8]) -> Result<Vec<f32>, FormatMismatch> {
    // Single-byte samples: any length is valid. Recenter around zero.
    Ok(bytes.iter().map(|&b| (f32::from(b) - 128.0) / 128.0).collect())
}
