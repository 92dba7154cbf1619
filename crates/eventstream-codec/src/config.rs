use crate::prelude::{MAX_HEADERS_LENGTH, MAX_PAYLOAD_LENGTH};

/// Default initial capacity of a decoder's frame buffer: 2 MiB.
pub const DEFAULT_INITIAL_BUFFER_CAPACITY: usize = 2 * 1024 * 1024;

/// Default size of a single read from the underlying stream: 8 KiB.
pub const DEFAULT_READ_CHUNK_SIZE: usize = 8 * 1024;

/// Bounds enforced when a prelude is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Maximum header region length in bytes. Default: 128 KiB.
    pub max_headers_length: u32,
    /// Maximum payload length in bytes. Default: 24 MiB.
    pub max_payload_length: u32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_headers_length: MAX_HEADERS_LENGTH,
            max_payload_length: MAX_PAYLOAD_LENGTH,
        }
    }
}

/// Configuration for [`MessageDecoder`](crate::MessageDecoder).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderConfig {
    /// Capacity the frame buffer starts with. It still grows to fit any
    /// message whose prelude passes [`Limits`].
    pub initial_buffer_capacity: usize,
    /// Prelude bounds.
    pub limits: Limits,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            initial_buffer_capacity: DEFAULT_INITIAL_BUFFER_CAPACITY,
            limits: Limits::default(),
        }
    }
}

/// Configuration for [`MessageReader`](crate::MessageReader).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderConfig {
    /// Decoder settings.
    pub decoder: DecoderConfig,
    /// Bytes requested from the stream per read. Default: 8 KiB.
    pub read_chunk_size: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            decoder: DecoderConfig::default(),
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
        }
    }
}
