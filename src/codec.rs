//! Framing between the byte stream and [`Envelope`] values.
//!
//! Frames are length-delimited (`u32` big-endian prefix) and carry one
//! bincode-encoded envelope each. Encoding is pure: the same envelope always
//! produces the same bytes. A frame that fails to decode is fatal to the
//! connection; the session reports the error and tears down rather than
//! attempting to resynchronize mid-stream.

use bincode::config;
use bytes::Bytes;
use tokio_util::codec::LengthDelimitedCodec;

use crate::message::Envelope;

/// Errors produced while converting between frames and envelopes.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Failed to encode an outbound envelope.
    #[error("failed to encode envelope: {0}")]
    Encode(#[source] bincode::error::EncodeError),
    /// Inbound frame did not decode to an envelope.
    #[error("malformed frame: {0}")]
    Decode(#[source] bincode::error::DecodeError),
    /// Inbound frame decoded but carried bytes past the envelope boundary.
    #[error("frame carries {extra} bytes beyond the envelope")]
    TrailingBytes { extra: usize },
}

/// Encode one envelope into the payload of a single frame.
///
/// # Errors
///
/// Returns [`CodecError::Encode`] if serialization fails.
pub fn encode(envelope: &Envelope) -> Result<Bytes, CodecError> {
    bincode::serde::encode_to_vec(envelope, config::standard())
        .map(Bytes::from)
        .map_err(CodecError::Encode)
}

/// Decode one frame payload into an envelope.
///
/// The payload must contain exactly one envelope; trailing bytes indicate a
/// framing bug on the peer and are treated the same as a decode failure.
///
/// # Errors
///
/// Returns [`CodecError::Decode`] or [`CodecError::TrailingBytes`] on
/// malformed input. Both are fatal to the connection.
pub fn decode(payload: &[u8]) -> Result<Envelope, CodecError> {
    let (envelope, consumed) =
        bincode::serde::decode_from_slice(payload, config::standard()).map_err(CodecError::Decode)?;
    if consumed != payload.len() {
        return Err(CodecError::TrailingBytes {
            extra: payload.len() - consumed,
        });
    }
    Ok(envelope)
}

/// Build the length-delimited codec used on both directions of the stream.
#[must_use]
pub fn frame_codec(max_frame_length: usize) -> LengthDelimitedCodec {
    LengthDelimitedCodec::builder()
        .max_frame_length(max_frame_length)
        .new_codec()
}
