//! Incremental decoding of the event-stream binary message format.
//!
//! Streaming responses multiplex typed headers and binary payloads over a
//! single byte stream. Every message is framed with:
//! - A 12-byte prelude: total length, headers length (4-byte big-endian each)
//!   and a CRC32 over those 8 bytes
//! - A header region of `name_len`/`name`/`type`/`value` entries
//! - An opaque payload
//! - A CRC32 over everything before it
//!
//! Feed arbitrarily chunked bytes into a [`MessageDecoder`] (or wrap a
//! `Read` in a [`MessageReader`]) and get validated [`Message`]s back.

pub mod builder;
#[cfg(feature = "async")]
pub mod codec;
pub mod config;
pub mod decoder;
pub mod error;
pub mod header;
pub mod message;
pub mod prelude;
pub mod reader;

pub use builder::{DefaultMessageBuilder, HeaderInjectingBuilder, MessageBuilder};
#[cfg(feature = "async")]
pub use codec::EventStreamCodec;
pub use config::{
    DecoderConfig, Limits, ReaderConfig, DEFAULT_INITIAL_BUFFER_CAPACITY, DEFAULT_READ_CHUNK_SIZE,
};
pub use decoder::{FnSink, MessageDecoder, MessageSink};
pub use error::{ChecksumKind, EventStreamError, Result};
pub use header::{HeaderType, HeaderValue};
pub use message::{names, Headers, Message};
pub use prelude::{
    Prelude, MAX_HEADERS_LENGTH, MAX_PAYLOAD_LENGTH, MESSAGE_OVERHEAD, PRELUDE_LENGTH,
    PRELUDE_LENGTH_WITH_CRC,
};
pub use reader::MessageReader;
