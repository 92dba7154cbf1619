use std::collections::BTreeMap;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::builder::{DefaultMessageBuilder, MessageBuilder};
use crate::config::Limits;
use crate::error::{ChecksumKind, EventStreamError, Result};
use crate::header::HeaderValue;
use crate::prelude::{read_u32, Prelude, MESSAGE_OVERHEAD, PRELUDE_LENGTH, PRELUDE_LENGTH_WITH_CRC};

/// Header map of a message. A name repeated on the wire keeps its last value.
pub type Headers = BTreeMap<String, HeaderValue>;

/// Header names with a fixed meaning in event-stream APIs.
pub mod names {
    /// `event`, `exception` or `error`.
    pub const MESSAGE_TYPE: &str = ":message-type";
    /// Event name for `event` messages (e.g. `initial-response`).
    pub const EVENT_TYPE: &str = ":event-type";
    /// Exception name for `exception` messages.
    pub const EXCEPTION_TYPE: &str = ":exception-type";
    /// Error code for `error` messages.
    pub const ERROR_CODE: &str = ":error-code";
    /// Human-readable text for `error` messages.
    pub const ERROR_MESSAGE: &str = ":error-message";
    /// MIME type of the payload.
    pub const CONTENT_TYPE: &str = ":content-type";
}

/// One complete event-stream frame: typed headers and an opaque payload.
///
/// Wire format (big-endian):
/// ```text
/// ┌──────────────┬───────────────┬──────────────┐
/// │ Total (4B)   │ Headers (4B)  │ Prelude CRC  │
/// ├──────────────┴───────────────┴──────────────┤
/// │ Headers: name_len(1B) name tag(1B) value    │
/// ├─────────────────────────────────────────────┤
/// │ Payload (total - headers - 16 bytes)        │
/// ├──────────────┬──────────────────────────────┘
/// │ Message CRC  │
/// └──────────────┘
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    headers: Headers,
    payload: Bytes,
}

impl Message {
    /// Create a message.
    pub fn new(headers: Headers, payload: impl Into<Bytes>) -> Self {
        Self {
            headers,
            payload: payload.into(),
        }
    }

    /// Decode the message that `prelude` describes.
    ///
    /// `buf` must start at the first prelude byte and hold at least
    /// `prelude.total_length()` bytes.
    pub fn decode(prelude: &Prelude, buf: &[u8]) -> Result<Self> {
        Self::decode_with(prelude, buf, &DefaultMessageBuilder)
    }

    /// Decode the message that `prelude` describes, constructing it through `builder`.
    pub fn decode_with<B>(prelude: &Prelude, buf: &[u8], builder: &B) -> Result<Self>
    where
        B: MessageBuilder + ?Sized,
    {
        let total = prelude.total_length() as usize;
        if buf.len() < total {
            return Err(EventStreamError::Truncated {
                context: "message",
                needed: total,
                available: buf.len(),
            });
        }

        let frame = &buf[..total];
        let crc_offset = total - 4;
        let expected = read_u32(frame, crc_offset);
        let computed = crc32fast::hash(&frame[..crc_offset]);
        if computed != expected {
            return Err(EventStreamError::ChecksumMismatch {
                kind: ChecksumKind::Message,
                expected,
                computed,
            });
        }

        let headers_end = PRELUDE_LENGTH_WITH_CRC + prelude.headers_length() as usize;
        let headers = decode_headers(&frame[PRELUDE_LENGTH_WITH_CRC..headers_end])?;
        let payload = Bytes::copy_from_slice(&frame[headers_end..crc_offset]);

        Ok(builder.build(headers, payload))
    }

    /// Encode into a fresh buffer.
    pub fn encode(&self) -> Result<Bytes> {
        let mut dst = BytesMut::new();
        self.encode_to(&mut dst)?;
        Ok(dst.freeze())
    }

    /// Append the wire form of this message to `dst`.
    ///
    /// Fails without writing anything when a header name exceeds 255 bytes or
    /// the header region or payload exceed the default [`Limits`].
    pub fn encode_to(&self, dst: &mut BytesMut) -> Result<()> {
        let headers_length = self.headers_len()?;
        let limits = Limits::default();
        if headers_length > limits.max_headers_length as usize {
            return Err(EventStreamError::IllegalHeaderLength {
                length: headers_length as u64,
                max: limits.max_headers_length,
            });
        }
        if self.payload.len() > limits.max_payload_length as usize {
            return Err(EventStreamError::IllegalPayloadSize {
                size: self.payload.len() as i64,
                max: limits.max_payload_length,
            });
        }
        let total = MESSAGE_OVERHEAD + headers_length + self.payload.len();

        dst.reserve(total);
        let start = dst.len();
        dst.put_u32(total as u32);
        dst.put_u32(headers_length as u32);
        let prelude_crc = crc32fast::hash(&dst[start..start + PRELUDE_LENGTH]);
        dst.put_u32(prelude_crc);

        for (name, value) in &self.headers {
            dst.put_u8(name.len() as u8);
            dst.put_slice(name.as_bytes());
            value.encode(dst)?;
        }
        dst.put_slice(&self.payload);

        let message_crc = crc32fast::hash(&dst[start..]);
        dst.put_u32(message_crc);
        Ok(())
    }

    /// Size of the wire form, or an error if a header cannot be encoded.
    pub fn encoded_len(&self) -> Result<usize> {
        Ok(MESSAGE_OVERHEAD + self.headers_len()? + self.payload.len())
    }

    fn headers_len(&self) -> Result<usize> {
        let mut len = 0usize;
        for (name, value) in &self.headers {
            if name.len() > u8::MAX as usize {
                return Err(EventStreamError::HeaderNameTooLong { len: name.len() });
            }
            if let HeaderValue::ByteArray(raw) = value {
                if raw.len() > u16::MAX as usize {
                    return Err(EventStreamError::HeaderValueTooLong { len: raw.len() });
                }
            }
            if let HeaderValue::String(text) = value {
                if text.len() > u16::MAX as usize {
                    return Err(EventStreamError::HeaderValueTooLong { len: text.len() });
                }
            }
            len += 1 + name.len() + value.encoded_len();
        }
        Ok(len)
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Look up a single header.
    pub fn header(&self, name: &str) -> Option<&HeaderValue> {
        self.headers.get(name)
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// The `:message-type` header, when it is a string.
    pub fn message_type(&self) -> Option<&str> {
        self.header(names::MESSAGE_TYPE).and_then(HeaderValue::as_str)
    }

    /// The `:event-type` header, when it is a string.
    pub fn event_type(&self) -> Option<&str> {
        self.header(names::EVENT_TYPE).and_then(HeaderValue::as_str)
    }

    pub fn into_parts(self) -> (Headers, Bytes) {
        (self.headers, self.payload)
    }
}

fn decode_headers(mut region: &[u8]) -> Result<Headers> {
    let mut headers = Headers::new();
    while region.has_remaining() {
        let name_len = region.get_u8() as usize;
        if region.remaining() < name_len + 1 {
            return Err(EventStreamError::Truncated {
                context: "header name",
                needed: name_len + 1,
                available: region.remaining(),
            });
        }
        let name = std::str::from_utf8(&region[..name_len])
            .map_err(|source| EventStreamError::InvalidUtf8 {
                context: "header name",
                source,
            })?
            .to_owned();
        region.advance(name_len);

        let tag = region.get_u8();
        let value = HeaderValue::decode(tag, &mut region)?;
        headers.insert(name, value);
    }
    Ok(headers)
}
