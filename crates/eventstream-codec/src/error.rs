use std::fmt;

/// Which checksum of a message failed verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumKind {
    /// CRC32 over the 8 prelude length bytes.
    Prelude,
    /// CRC32 over everything preceding the trailing 4 bytes of the message.
    Message,
}

impl fmt::Display for ChecksumKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChecksumKind::Prelude => f.write_str("prelude"),
            ChecksumKind::Message => f.write_str("message"),
        }
    }
}

/// Errors that can occur while decoding (or encoding) event-stream messages.
#[derive(Debug, thiserror::Error)]
pub enum EventStreamError {
    /// A prelude or message CRC does not match the bytes it covers.
    #[error("{kind} checksum mismatch: expected 0x{expected:08x}, computed 0x{computed:08x}")]
    ChecksumMismatch {
        kind: ChecksumKind,
        expected: u32,
        computed: u32,
    },

    /// The prelude declares a header region outside the accepted bounds.
    #[error("illegal headers length: {length} (max {max})")]
    IllegalHeaderLength { length: u64, max: u32 },

    /// The payload length derived from the prelude is negative or too large.
    #[error("illegal payload size: {size} (max {max})")]
    IllegalPayloadSize { size: i64, max: u32 },

    /// A header carries a type tag outside 0..=9.
    #[error("unknown header value type: {0}")]
    UnknownHeaderType(u8),

    /// A structure claims more bytes than the buffer holds.
    #[error("truncated {context}: need {needed} bytes, have {available}")]
    Truncated {
        context: &'static str,
        needed: usize,
        available: usize,
    },

    /// A header name or string value is not valid UTF-8.
    #[error("invalid UTF-8 in {context}")]
    InvalidUtf8 {
        context: &'static str,
        #[source]
        source: std::str::Utf8Error,
    },

    /// Header names are prefixed by a single length byte.
    #[error("header name too long ({len} bytes, max 255)")]
    HeaderNameTooLong { len: usize },

    /// Byte-array and string values are prefixed by a 16-bit length.
    #[error("header value too long ({len} bytes, max 65535)")]
    HeaderValueTooLong { len: usize },

    /// The stream ended while a message was only partially buffered.
    #[error("stream ended mid-message ({buffered} of {expected} bytes buffered)")]
    UnexpectedEof { buffered: usize, expected: usize },

    /// A previous decode error left the decoder without trustworthy frame boundaries.
    #[error("decoder poisoned by an earlier decode error")]
    Poisoned,

    /// An I/O error occurred while reading from the underlying stream.
    #[error("event-stream I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EventStreamError {
    /// True for errors caused by malformed or corrupted wire data.
    pub fn is_data_error(&self) -> bool {
        !matches!(
            self,
            EventStreamError::Io(_) | EventStreamError::Poisoned
        )
    }
}

pub type Result<T> = std::result::Result<T, EventStreamError>;
