//! Codec error taxonomy.

/// Errors that can occur while encoding or decoding a wire frame.
///
/// Decode failures are always recoverable at the transport boundary: the
/// engine logs the offending frame and drops it without disturbing any
/// pending correlation.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The leading 4-byte header does not match any known message type.
    #[error("unknown message type header: {0}")]
    UnknownMessageType(i32),
    /// The buffer ran out before all declared fields were read.
    #[error("frame truncated: needed {needed} more byte(s) at offset {offset}")]
    UnexpectedEof { offset: usize, needed: usize },
    /// A length-prefixed string field did not contain valid UTF-8.
    #[error("invalid UTF-8 in string field at offset {offset}")]
    InvalidUtf8 { offset: usize },
    /// A string field exceeds the u16 length prefix on encode.
    #[error("string field of {len} bytes exceeds the {max}-byte frame limit")]
    StringTooLong { len: usize, max: usize },
}
