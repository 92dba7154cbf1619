//! Event-stream message decoding.
//!
//! eventstream decodes the length-prefixed, CRC32-protected binary message
//! format used by streaming API responses: typed headers and an opaque
//! payload per message, multiplexed over one byte stream.
//!
//! # Crate Structure
//!
//! - [`codec`]: header values, preludes, messages and the incremental decoder
//!
//! The `eventstream` binary (behind the `cli` feature) decodes and inspects
//! captured streams from files or stdin.

/// Re-export codec types.
pub mod codec {
    pub use eventstream_codec::*;
}

pub use eventstream_codec::{EventStreamError, Message, MessageDecoder, MessageReader};
