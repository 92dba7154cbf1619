//! `tokio_util::codec::Decoder` for event streams (requires the `async` feature).

use bytes::BytesMut;
use tokio_util::codec::Decoder;

use crate::builder::{DefaultMessageBuilder, MessageBuilder};
use crate::config::Limits;
use crate::error::{EventStreamError, Result};
use crate::message::Message;
use crate::prelude::{Prelude, PRELUDE_LENGTH_WITH_CRC};

/// Decodes messages out of a `FramedRead` buffer.
///
/// The prelude of a partially received message is cached so its checksum is
/// verified once, and the read buffer is reserved up to the advertised total
/// length.
#[derive(Debug, Clone, Default)]
pub struct EventStreamCodec<B = DefaultMessageBuilder> {
    limits: Limits,
    builder: B,
    prelude: Option<Prelude>,
}

impl EventStreamCodec {
    pub fn new() -> Self {
        Self::with_limits(Limits::default())
    }

    pub fn with_limits(limits: Limits) -> Self {
        Self::with_builder(limits, DefaultMessageBuilder)
    }
}

impl<B: MessageBuilder> EventStreamCodec<B> {
    pub fn with_builder(limits: Limits, builder: B) -> Self {
        Self {
            limits,
            builder,
            prelude: None,
        }
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }
}

impl<B: MessageBuilder> Decoder for EventStreamCodec<B> {
    type Item = Message;
    type Error = EventStreamError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Message>> {
        let prelude = match self.prelude {
            Some(prelude) => prelude,
            None => {
                if src.len() < PRELUDE_LENGTH_WITH_CRC {
                    return Ok(None);
                }
                let prelude = Prelude::decode_with_limits(&src[..], &self.limits)?;
                self.prelude = Some(prelude);
                prelude
            }
        };

        let total = prelude.total_length() as usize;
        if src.len() < total {
            src.reserve(total - src.len());
            return Ok(None);
        }

        let frame = src.split_to(total);
        self.prelude = None;
        Message::decode_with(&prelude, &frame, &self.builder).map(Some)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Message>> {
        match self.decode(src)? {
            Some(message) => Ok(Some(message)),
            None if src.is_empty() => Ok(None),
            None => Err(EventStreamError::UnexpectedEof {
                buffered: src.len(),
                expected: self
                    .prelude
                    .map(|prelude| prelude.total_length() as usize)
                    .unwrap_or(PRELUDE_LENGTH_WITH_CRC),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use futures_util::StreamExt;
    use tokio_util::codec::FramedRead;

    use super::*;
    use crate::header::HeaderValue;
    use crate::message::Headers;

    fn message(event: &str, payload: &[u8]) -> Message {
        let mut headers = Headers::new();
        headers.insert(":event-type".into(), HeaderValue::from(event));
        Message::new(headers, Bytes::copy_from_slice(payload))
    }

    fn wire(messages: &[Message]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        for message in messages {
            message.encode_to(&mut buf).unwrap();
        }
        buf.to_vec()
    }

    #[tokio::test]
    async fn framed_read_yields_messages_in_order() {
        let messages = vec![message("a", b"1"), message("b", b""), message("c", &[7; 4096])];
        let bytes = wire(&messages);
        let mut framed = FramedRead::new(&bytes[..], EventStreamCodec::new());

        let mut decoded = Vec::new();
        while let Some(message) = framed.next().await {
            decoded.push(message.unwrap());
        }
        assert_eq!(decoded, messages);
    }

    #[tokio::test]
    async fn framed_read_handles_split_reads() {
        let messages = vec![message("first", b"payload-one"), message("second", b"two")];
        let bytes = wire(&messages);
        let mock = tokio_test::io::Builder::new()
            .read(&bytes[..5])
            .read(&bytes[5..30])
            .read(&bytes[30..])
            .build();
        let mut framed = FramedRead::new(mock, EventStreamCodec::new());

        assert_eq!(framed.next().await.unwrap().unwrap(), messages[0]);
        assert_eq!(framed.next().await.unwrap().unwrap(), messages[1]);
        assert!(framed.next().await.is_none());
    }

    #[tokio::test]
    async fn truncated_stream_reports_unexpected_eof() {
        let bytes = wire(&[message("a", b"hello")]);
        let mut framed = FramedRead::new(&bytes[..bytes.len() - 2], EventStreamCodec::new());

        let err = framed.next().await.unwrap().unwrap_err();
        assert!(matches!(err, EventStreamError::UnexpectedEof { .. }));
    }

    #[test]
    fn decode_reserves_for_advertised_length() {
        let bytes = wire(&[message("a", &[0u8; 10_000])]);
        let mut codec = EventStreamCodec::new();
        let mut src = BytesMut::from(&bytes[..PRELUDE_LENGTH_WITH_CRC]);

        assert!(codec.decode(&mut src).unwrap().is_none());
        assert!(src.capacity() >= bytes.len());

        src.extend_from_slice(&bytes[PRELUDE_LENGTH_WITH_CRC..]);
        assert!(codec.decode(&mut src).unwrap().is_some());
        assert!(src.is_empty());
    }

    #[test]
    fn corrupted_prelude_is_an_error() {
        let mut bytes = wire(&[message("a", b"x")]);
        bytes[0] ^= 0x80;
        let mut codec = EventStreamCodec::new();
        let mut src = BytesMut::from(&bytes[..]);

        assert!(matches!(
            codec.decode(&mut src),
            Err(EventStreamError::ChecksumMismatch { .. })
        ));
    }
}
