//! Error types for the audio bridge.

/// A single decoder attempt that rejected the buffer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{format}: buffer of {len} bytes is not a whole number of samples")]
pub struct FormatMismatch {
    /// Format label (`f32le`, `i16le`, `u8`).
    pub format: &'static str,
    /// Length of the rejected buffer.
    pub len: usize,
}

/// Errors from the inbound decode path.
///
/// Fails the voice-mode call entirely; there is no per-chunk recovery on
/// the inbound side.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// Every decoder in the fallback chain rejected the buffer.
    #[error("unable to parse audio data")]
    UnknownFormat(#[source] FormatMismatch),
}

/// Errors from outbound payload conversion.
///
/// Per-chunk: the caller drops the offending chunk and the stream continues.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChunkError {
    /// The payload's byte conversion failed.
    #[error("byte conversion failed: {0}")]
    Convert(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_mismatch_display() {
        let e = FormatMismatch {
            format: "f32le",
            len: 7,
        };
        assert_eq!(
            e.to_string(),
            "f32le: buffer of 7 bytes is not a whole number of samples"
        );
    }

    #[test]
    fn decode_error_carries_source() {
        let e = DecodeError::UnknownFormat(FormatMismatch {
            format: "i16le",
            len: 3,
        });
        let source = std::error::Error::source(&e).unwrap();
        assert!(source.to_string().contains("i16le"));
    }

    #[test]
    fn chunk_error_display() {
        let e = ChunkError::Convert("not byte-like".into());
        assert!(e.to_string().contains("not byte-like"));
    }
}
