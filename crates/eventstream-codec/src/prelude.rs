use crate::config::Limits;
use crate::error::{ChecksumKind, EventStreamError, Result};

/// Total length (4) + headers length (4).
pub const PRELUDE_LENGTH: usize = 8;

/// Prelude plus its own CRC32.
pub const PRELUDE_LENGTH_WITH_CRC: usize = PRELUDE_LENGTH + 4;

/// Framing bytes not counted as headers or payload: prelude, prelude CRC, message CRC.
pub const MESSAGE_OVERHEAD: usize = PRELUDE_LENGTH_WITH_CRC + 4;

/// Largest accepted header region.
pub const MAX_HEADERS_LENGTH: u32 = 128 * 1024;

/// Largest accepted payload.
///
/// Deliberately looser than the 16 MiB payload cap published for the format;
/// see [`Limits`] to tighten it.
pub const MAX_PAYLOAD_LENGTH: u32 = 24 * 1024 * 1024;

/// The fixed-size, checksummed head of every message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prelude {
    total_length: u32,
    headers_length: u32,
}

impl Prelude {
    /// Decode and validate a prelude using the default [`Limits`].
    ///
    /// `buf` must start at the first prelude byte; only the first
    /// [`PRELUDE_LENGTH_WITH_CRC`] bytes are read.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        Self::decode_with_limits(buf, &Limits::default())
    }

    /// Decode and validate a prelude against explicit bounds.
    ///
    /// Checks run in wire order: checksum first, then the header bound, then
    /// the derived payload bound.
    pub fn decode_with_limits(buf: &[u8], limits: &Limits) -> Result<Self> {
        if buf.len() < PRELUDE_LENGTH_WITH_CRC {
            return Err(EventStreamError::Truncated {
                context: "prelude",
                needed: PRELUDE_LENGTH_WITH_CRC,
                available: buf.len(),
            });
        }

        let computed = crc32fast::hash(&buf[..PRELUDE_LENGTH]);
        let total_length = read_u32(buf, 0);
        let headers_length = read_u32(buf, 4);
        let expected = read_u32(buf, PRELUDE_LENGTH);

        if computed != expected {
            return Err(EventStreamError::ChecksumMismatch {
                kind: ChecksumKind::Prelude,
                expected,
                computed,
            });
        }

        if headers_length > limits.max_headers_length {
            return Err(EventStreamError::IllegalHeaderLength {
                length: u64::from(headers_length),
                max: limits.max_headers_length,
            });
        }

        let payload_length =
            i64::from(total_length) - i64::from(headers_length) - MESSAGE_OVERHEAD as i64;
        if payload_length < 0 || payload_length > i64::from(limits.max_payload_length) {
            return Err(EventStreamError::IllegalPayloadSize {
                size: payload_length,
                max: limits.max_payload_length,
            });
        }

        tracing::trace!(total_length, headers_length, "decoded prelude");

        Ok(Self {
            total_length,
            headers_length,
        })
    }

    /// Length of the whole message, prelude and trailing CRC included.
    pub fn total_length(&self) -> u32 {
        self.total_length
    }

    /// Length of the header region.
    pub fn headers_length(&self) -> u32 {
        self.headers_length
    }

    /// Length of the payload, derived from the two wire lengths.
    pub fn payload_length(&self) -> u32 {
        self.total_length - self.headers_length - MESSAGE_OVERHEAD as u32
    }
}

pub(crate) fn read_u32(buf: &[u8], offset: usize) -> u32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&buf[offset..offset + 4]);
    u32::from_be_bytes(raw)
}
