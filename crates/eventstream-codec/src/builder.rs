use bytes::Bytes;

use crate::header::HeaderValue;
use crate::message::{Headers, Message};

/// Constructs the [`Message`] for each decoded frame.
///
/// The decoder hands every validated frame to its builder, which is the place
/// to decorate messages (inject headers, wrap payloads) without touching the
/// decoding logic.
pub trait MessageBuilder {
    fn build(&self, headers: Headers, payload: Bytes) -> Message;
}

/// Builds messages exactly as they appeared on the wire.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultMessageBuilder;

impl MessageBuilder for DefaultMessageBuilder {
    fn build(&self, headers: Headers, payload: Bytes) -> Message {
        Message::new(headers, payload)
    }
}

/// Adds a fixed set of headers to every message. Headers present on the wire win.
#[derive(Debug, Clone, Default)]
pub struct HeaderInjectingBuilder {
    injected: Headers,
}

impl HeaderInjectingBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a header to inject.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<HeaderValue>) -> Self {
        self.injected.insert(name.into(), value.into());
        self
    }
}

impl MessageBuilder for HeaderInjectingBuilder {
    fn build(&self, mut headers: Headers, payload: Bytes) -> Message {
        for (name, value) in &self.injected {
            headers
                .entry(name.clone())
                .or_insert_with(|| value.clone());
        }
        Message::new(headers, payload)
    }
}

impl<B: MessageBuilder + ?Sized> MessageBuilder for &B {
    fn build(&self, headers: Headers, payload: Bytes) -> Message {
        (**self).build(headers, payload)
    }
}

impl<B: MessageBuilder + ?Sized> MessageBuilder for Box<B> {
    fn build(&self, headers: Headers, payload: Bytes) -> Message {
        (**self).build(headers, payload)
    }
}
