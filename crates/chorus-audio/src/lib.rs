//! Audio bridge for the voice execution pipeline.
//!
//! Converts arbitrary raw audio byte buffers into the canonical format the
//! voice pipeline requires (16-bit signed integer samples at 24 kHz), and
//! normalizes outgoing audio payloads into flat byte sequences.
//!
//! # Architecture
//!
//! ```text
//! raw bytes → format detection (f32le → i16le → u8) → f32 samples
//! → linear-interpolation resample to 24 kHz → scale by 32767 → i16
//! ```
//!
//! Decoding is an explicit ordered list of attempts; the first format whose
//! parse succeeds wins. The whole inbound path is pure and deterministic.
//! The outbound path ([`AudioPayload`]) is lossy-tolerant: a chunk that
//! cannot be converted to bytes is reported per-chunk, not per-stream.
//!
//! ## Crate Position
//!
//! Standalone (no chorus crate dependencies).
//! Depended on by: chorus-core, chorus-runtime.

pub mod bridge;
pub mod chunk;
pub mod decode;
pub mod resample;
pub mod types;

pub use bridge::{CANONICAL_SAMPLE_RATE, to_canonical};
pub use chunk::{AudioPayload, ByteConvertible};
pub use types::{ChunkError, DecodeError, FormatMismatch};
