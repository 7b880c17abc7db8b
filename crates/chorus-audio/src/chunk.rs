//! Outbound audio payload normalization.
//!
//! The voice pipeline hands back audio in whichever shape its TTS stage
//! produced: an already-flat byte buffer, a native sample array, or an
//! opaque object that knows how to serialize itself. The payload is a
//! closed variant set with one conversion function per variant; there is
//! no structural probing of unknown types.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;

use crate::types::ChunkError;

/// An object with a fallible to-bytes conversion.
///
/// Implemented by adapter types that wrap pipeline-specific audio buffers.
pub trait ByteConvertible: Send + Sync {
    /// Serialize the payload into a flat byte sequence.
    fn to_bytes(&self) -> Result<Bytes, ChunkError>;
}

/// One chunk of outgoing audio from the voice pipeline.
#[derive(Clone)]
pub enum AudioPayload {
    /// Already a flat byte buffer.
    Raw(Bytes),
    /// Native i16 sample array; reinterpreted as raw bytes in native order.
    Samples(Vec<i16>),
    /// Opaque object with its own byte conversion.
    Convertible(Arc<dyn ByteConvertible>),
}

impl AudioPayload {
    /// Convert the payload into a flat byte sequence.
    ///
    /// Failure is per-chunk: callers drop the chunk and continue the
    /// stream rather than aborting it.
    pub fn into_bytes(self) -> Result<Bytes, ChunkError> {
        match self {
            Self::Raw(bytes) => Ok(bytes),
            Self::Samples(samples) => Ok(Bytes::copy_from_slice(bytemuck::cast_slice(&samples))),
            Self::Convertible(inner) => inner.to_bytes(),
        }
    }

    /// Variant tag, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Raw(_) => "raw",
            Self::Samples(_) => "samples",
            Self::Convertible(_) => "convertible",
        }
    }
}

impl fmt::Debug for AudioPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Raw(bytes) => f.debug_tuple("Raw").field(&bytes.len()).finish(),
            Self::Samples(samples) => f.debug_tuple("Samples").field(&samples.len()).finish(),
            Self::Convertible(_) => f.debug_tuple("Convertible").finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct GoodConvertible;

    impl ByteConvertible for GoodConvertible {
        fn to_bytes(&self) -> Result<Bytes, ChunkError> {
            Ok(Bytes::from_static(&[1, 2, 3]))
        }
    }

    struct BadConvertible;

    impl ByteConvertible for BadConvertible {
        fn to_bytes(&self) -> Result<Bytes, ChunkError> {
            Err(ChunkError::Convert("opaque buffer refused".into()))
        }
    }

    #[test]
    fn raw_passes_through() {
        let payload = AudioPayload::Raw(Bytes::from_static(&[9, 8, 7]));
        assert_eq!(payload.into_bytes().unwrap(), Bytes::from_static(&[9, 8, 7]));
    }

    #[test]
    fn samples_flatten_to_two_bytes_each() {
        let payload = AudioPayload::Samples(vec![0x0102, -1]);
        let bytes = payload.into_bytes().unwrap();
        assert_eq!(bytes.len(), 4);
        #[cfg(target_endian = "little")]
        assert_eq!(&bytes[..], &[0x02, 0x01, 0xFF, 0xFF]);
    }

    #[test]
    fn convertible_delegates() {
        let payload = AudioPayload::Convertible(Arc::new(GoodConvertible));
        assert_eq!(payload.into_bytes().unwrap(), Bytes::from_static(&[1, 2, 3]));
    }

    #[test]
    fn convertible_failure_is_chunk_error() {
        let payload = AudioPayload::Convertible(Arc::new(BadConvertible));
        let err = payload.into_bytes().unwrap_err();
        assert!(err.to_string().contains("opaque buffer refused"));
    }

    #[test]
    fn kind_labels() {
        assert_eq!(AudioPayload::Raw(Bytes::new()).kind(), "raw");
        assert_eq!(AudioPayload::Samples(vec![]).kind(), "samples");
        assert_eq!(
            AudioPayload::Convertible(Arc::new(GoodConvertible)).kind(),
            "convertible"
        );
    }

    #[test]
    fn debug_does_not_dump_contents() {
        let payload = AudioPayload::Samples(vec![0; 4096]);
        assert_eq!(format!("{payload:?}"), "Samples(4096)");
    }
}
