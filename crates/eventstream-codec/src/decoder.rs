use std::collections::VecDeque;

use bytes::BytesMut;

use crate::builder::{DefaultMessageBuilder, MessageBuilder};
use crate::config::DecoderConfig;
use crate::error::{EventStreamError, Result};
use crate::message::Message;
use crate::prelude::{Prelude, PRELUDE_LENGTH_WITH_CRC};

/// Receives messages as the decoder completes them.
pub trait MessageSink {
    fn accept(&mut self, message: Message);
}

impl MessageSink for Vec<Message> {
    fn accept(&mut self, message: Message) {
        self.push(message);
    }
}

impl MessageSink for VecDeque<Message> {
    fn accept(&mut self, message: Message) {
        self.push_back(message);
    }
}

impl<S: MessageSink + ?Sized> MessageSink for &mut S {
    fn accept(&mut self, message: Message) {
        (**self).accept(message);
    }
}

/// Adapts a closure into a [`MessageSink`].
pub struct FnSink<F>(pub F);

impl<F: FnMut(Message)> MessageSink for FnSink<F> {
    fn accept(&mut self, message: Message) {
        (self.0)(message);
    }
}

/// Incrementally assembles messages from arbitrarily chunked bytes.
///
/// The decoder alternates between two states: awaiting a prelude (fewer than
/// 12 bytes buffered) and awaiting the rest of a message whose prelude is
/// known. Input is copied only as far as the current state needs, so the
/// buffer never holds more than one frame. Once a prelude is decoded the
/// buffer grows to fit the advertised total length.
///
/// Any decode error poisons the decoder: frame boundaries can no longer be
/// trusted, so every later `feed` fails with [`EventStreamError::Poisoned`]
/// until [`reset`](Self::reset) is called.
#[derive(Debug)]
pub struct MessageDecoder<B = DefaultMessageBuilder> {
    buf: BytesMut,
    prelude: Option<Prelude>,
    config: DecoderConfig,
    builder: B,
    poisoned: bool,
}

impl MessageDecoder {
    /// Create a decoder with default configuration.
    pub fn new() -> Self {
        Self::with_config(DecoderConfig::default())
    }

    /// Create a decoder with explicit configuration.
    pub fn with_config(config: DecoderConfig) -> Self {
        Self::with_builder(config, DefaultMessageBuilder)
    }
}

impl Default for MessageDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: MessageBuilder> MessageDecoder<B> {
    /// Create a decoder that constructs messages through `builder`.
    pub fn with_builder(config: DecoderConfig, builder: B) -> Self {
        Self {
            buf: BytesMut::with_capacity(config.initial_buffer_capacity),
            prelude: None,
            config,
            builder,
            poisoned: false,
        }
    }

    /// Feed bytes and return the messages they complete, in stream order.
    ///
    /// Messages completed earlier in the same call are dropped if a later
    /// frame fails to decode; use [`feed_with`](Self::feed_with) to observe
    /// them.
    pub fn feed(&mut self, bytes: &[u8]) -> Result<Vec<Message>> {
        let mut decoded = Vec::new();
        self.feed_with(bytes, &mut decoded)?;
        Ok(decoded)
    }

    /// Feed bytes, handing each completed message to `sink` as soon as its
    /// last byte arrives. Returns the number of messages emitted.
    pub fn feed_with<S>(&mut self, mut bytes: &[u8], sink: &mut S) -> Result<usize>
    where
        S: MessageSink + ?Sized,
    {
        if self.poisoned {
            return Err(EventStreamError::Poisoned);
        }

        let mut emitted = 0usize;
        while !bytes.is_empty() {
            match self.step(&mut bytes) {
                Ok(Some(message)) => {
                    sink.accept(message);
                    emitted += 1;
                }
                Ok(None) => {}
                Err(err) => {
                    self.poisoned = true;
                    tracing::warn!(error = %err, "event-stream decode failed");
                    return Err(err);
                }
            }
        }
        Ok(emitted)
    }

    /// Advance the state machine with as much of `input` as the current frame needs.
    fn step(&mut self, input: &mut &[u8]) -> Result<Option<Message>> {
        let prelude = match self.prelude {
            Some(prelude) => prelude,
            None => {
                self.fill(input, PRELUDE_LENGTH_WITH_CRC);
                if self.buf.len() < PRELUDE_LENGTH_WITH_CRC {
                    return Ok(None);
                }
                let prelude = Prelude::decode_with_limits(&self.buf, &self.config.limits)?;
                self.ensure_capacity(prelude.total_length() as usize);
                self.prelude = Some(prelude);
                prelude
            }
        };

        let total = prelude.total_length() as usize;
        self.fill(input, total);
        if self.buf.len() < total {
            return Ok(None);
        }

        let message = Message::decode_with(&prelude, &self.buf, &self.builder)?;
        self.buf.clear();
        self.prelude = None;

        tracing::debug!(
            total_length = total,
            headers = message.headers().len(),
            payload_size = message.payload().len(),
            "decoded event-stream message"
        );
        Ok(Some(message))
    }

    fn fill(&mut self, input: &mut &[u8], target: usize) {
        let wanted = target.saturating_sub(self.buf.len()).min(input.len());
        self.buf.extend_from_slice(&input[..wanted]);
        *input = &input[wanted..];
    }

    fn ensure_capacity(&mut self, total: usize) {
        if self.buf.capacity() < total {
            tracing::debug!(
                capacity = self.buf.capacity(),
                required = total,
                "growing event-stream buffer"
            );
            self.buf.reserve(total - self.buf.len());
        }
    }

    /// Signal end of stream. Fails if a message is only partially buffered.
    pub fn finish(&self) -> Result<()> {
        if self.poisoned {
            return Err(EventStreamError::Poisoned);
        }
        if self.buf.is_empty() {
            return Ok(());
        }
        let expected = self
            .prelude
            .map(|prelude| prelude.total_length() as usize)
            .unwrap_or(PRELUDE_LENGTH_WITH_CRC);
        Err(EventStreamError::UnexpectedEof {
            buffered: self.buf.len(),
            expected,
        })
    }

    /// Drop any buffered bytes and clear a poisoned state.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.prelude = None;
        self.poisoned = false;
    }

    /// True when no partial frame is buffered.
    pub fn is_idle(&self) -> bool {
        self.buf.is_empty()
    }

    /// True after a decode error, until [`reset`](Self::reset).
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// Bytes of the in-flight frame buffered so far.
    pub fn buffered_len(&self) -> usize {
        self.buf.len()
    }

    /// Current capacity of the frame buffer.
    pub fn buffer_capacity(&self) -> usize {
        self.buf.capacity()
    }

    /// Prelude of the in-flight frame, once decoded.
    pub fn current_prelude(&self) -> Option<&Prelude> {
        self.prelude.as_ref()
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    pub fn builder(&self) -> &B {
        &self.builder
    }
}
