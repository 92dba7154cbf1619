use std::collections::VecDeque;
use std::io::{ErrorKind, Read};

use crate::builder::{DefaultMessageBuilder, MessageBuilder};
use crate::config::ReaderConfig;
use crate::decoder::MessageDecoder;
use crate::error::{EventStreamError, Result};
use crate::message::Message;

/// Reads complete messages from any `Read` stream, such as an HTTP response body.
///
/// Handles partial reads internally, so callers always get complete messages.
pub struct MessageReader<T, B = DefaultMessageBuilder> {
    inner: T,
    decoder: MessageDecoder<B>,
    ready: VecDeque<Message>,
    chunk: Vec<u8>,
    failed: Option<EventStreamError>,
    eof: bool,
}

impl<T: Read> MessageReader<T> {
    /// Create a message reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, ReaderConfig::default())
    }

    /// Create a message reader with explicit configuration.
    pub fn with_config(inner: T, config: ReaderConfig) -> Self {
        Self::with_builder(inner, config, DefaultMessageBuilder)
    }
}

impl<T: Read, B: MessageBuilder> MessageReader<T, B> {
    /// Create a message reader whose decoder builds messages through `builder`.
    pub fn with_builder(inner: T, config: ReaderConfig, builder: B) -> Self {
        Self {
            inner,
            decoder: MessageDecoder::with_builder(config.decoder, builder),
            ready: VecDeque::new(),
            chunk: vec![0u8; config.read_chunk_size.max(1)],
            failed: None,
            eof: false,
        }
    }

    /// Read the next complete message (blocking).
    ///
    /// Returns `Ok(None)` when the stream ends on a message boundary and
    /// `Err(EventStreamError::UnexpectedEof)` when it ends mid-message.
    /// Messages that precede a corrupt frame are returned before its error;
    /// after a decode error the reader yields `Ok(None)`.
    pub fn read_message(&mut self) -> Result<Option<Message>> {
        loop {
            if let Some(message) = self.ready.pop_front() {
                return Ok(Some(message));
            }
            if let Some(err) = self.failed.take() {
                return Err(err);
            }
            if self.eof {
                return Ok(None);
            }

            let read = match self.inner.read(&mut self.chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(EventStreamError::Io(err)),
            };

            if read == 0 {
                self.eof = true;
                self.decoder.finish()?;
                continue;
            }

            if let Err(err) = self.decoder.feed_with(&self.chunk[..read], &mut self.ready) {
                self.eof = true;
                self.failed = Some(err);
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    ///
    /// Buffered bytes of a partially read message are discarded.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// The decoder driving this reader.
    pub fn decoder(&self) -> &MessageDecoder<B> {
        &self.decoder
    }
}

impl<T: Read, B: MessageBuilder> Iterator for MessageReader<T, B> {
    type Item = Result<Message>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_message().transpose()
    }
}
