//! Typed header values and their wire encoding.
//!
//! Every header value on the wire is a one-byte type tag followed by a
//! type-specific body:
//!
//! | tag | type       | body                                  |
//! |-----|------------|---------------------------------------|
//! | 0   | bool true  | none                                  |
//! | 1   | bool false | none                                  |
//! | 2   | byte       | 1 byte                                |
//! | 3   | short      | 2 bytes BE                            |
//! | 4   | integer    | 4 bytes BE                            |
//! | 5   | long       | 8 bytes BE                            |
//! | 6   | byte array | u16 BE length + bytes                 |
//! | 7   | string     | u16 BE length + UTF-8 bytes           |
//! | 8   | timestamp  | i64 BE milliseconds since the epoch   |
//! | 9   | uuid       | 16 bytes (high 64 bits, low 64 bits)  |

use std::fmt;

use bytes::{Buf, BufMut, Bytes};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{EventStreamError, Result};

/// Wire type tag of a header value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum HeaderType {
    BoolTrue = 0,
    BoolFalse = 1,
    Byte = 2,
    Short = 3,
    Integer = 4,
    Long = 5,
    ByteArray = 6,
    String = 7,
    Timestamp = 8,
    Uuid = 9,
}

impl HeaderType {
    /// The tag byte written on the wire.
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Lower-case name used in diagnostics and CLI output.
    pub fn name(self) -> &'static str {
        match self {
            HeaderType::BoolTrue | HeaderType::BoolFalse => "bool",
            HeaderType::Byte => "byte",
            HeaderType::Short => "short",
            HeaderType::Integer => "integer",
            HeaderType::Long => "long",
            HeaderType::ByteArray => "byte_array",
            HeaderType::String => "string",
            HeaderType::Timestamp => "timestamp",
            HeaderType::Uuid => "uuid",
        }
    }
}

impl TryFrom<u8> for HeaderType {
    type Error = EventStreamError;

    fn try_from(tag: u8) -> Result<Self> {
        Ok(match tag {
            0 => HeaderType::BoolTrue,
            1 => HeaderType::BoolFalse,
            2 => HeaderType::Byte,
            3 => HeaderType::Short,
            4 => HeaderType::Integer,
            5 => HeaderType::Long,
            6 => HeaderType::ByteArray,
            7 => HeaderType::String,
            8 => HeaderType::Timestamp,
            9 => HeaderType::Uuid,
            other => return Err(EventStreamError::UnknownHeaderType(other)),
        })
    }
}

/// A typed header value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HeaderValue {
    Bool(bool),
    Byte(i8),
    Short(i16),
    Integer(i32),
    Long(i64),
    ByteArray(Bytes),
    String(String),
    /// Milliseconds since the Unix epoch.
    Timestamp(i64),
    Uuid(Uuid),
}

impl HeaderValue {
    /// Build a timestamp value from a UTC date-time (millisecond precision).
    pub fn timestamp(at: DateTime<Utc>) -> Self {
        HeaderValue::Timestamp(at.timestamp_millis())
    }

    /// The wire type of this value.
    pub fn header_type(&self) -> HeaderType {
        match self {
            HeaderValue::Bool(true) => HeaderType::BoolTrue,
            HeaderValue::Bool(false) => HeaderType::BoolFalse,
            HeaderValue::Byte(_) => HeaderType::Byte,
            HeaderValue::Short(_) => HeaderType::Short,
            HeaderValue::Integer(_) => HeaderType::Integer,
            HeaderValue::Long(_) => HeaderType::Long,
            HeaderValue::ByteArray(_) => HeaderType::ByteArray,
            HeaderValue::String(_) => HeaderType::String,
            HeaderValue::Timestamp(_) => HeaderType::Timestamp,
            HeaderValue::Uuid(_) => HeaderType::Uuid,
        }
    }

    /// Decode the body of a value whose tag byte has already been consumed.
    pub fn decode<B: Buf>(type_tag: u8, reader: &mut B) -> Result<Self> {
        let value = match HeaderType::try_from(type_tag)? {
            HeaderType::BoolTrue => HeaderValue::Bool(true),
            HeaderType::BoolFalse => HeaderValue::Bool(false),
            HeaderType::Byte => {
                ensure(reader, 1, "byte header value")?;
                HeaderValue::Byte(reader.get_i8())
            }
            HeaderType::Short => {
                ensure(reader, 2, "short header value")?;
                HeaderValue::Short(reader.get_i16())
            }
            HeaderType::Integer => {
                ensure(reader, 4, "integer header value")?;
                HeaderValue::Integer(reader.get_i32())
            }
            HeaderType::Long => {
                ensure(reader, 8, "long header value")?;
                HeaderValue::Long(reader.get_i64())
            }
            HeaderType::ByteArray => {
                let len = read_value_len(reader, "byte array header value")?;
                HeaderValue::ByteArray(reader.copy_to_bytes(len))
            }
            HeaderType::String => {
                let len = read_value_len(reader, "string header value")?;
                let raw = reader.copy_to_bytes(len);
                let text = std::str::from_utf8(&raw).map_err(|source| {
                    EventStreamError::InvalidUtf8 {
                        context: "string header value",
                        source,
                    }
                })?;
                HeaderValue::String(text.to_owned())
            }
            HeaderType::Timestamp => {
                ensure(reader, 8, "timestamp header value")?;
                HeaderValue::Timestamp(reader.get_i64())
            }
            HeaderType::Uuid => {
                ensure(reader, 16, "uuid header value")?;
                let mut raw = [0u8; 16];
                reader.copy_to_slice(&mut raw);
                HeaderValue::Uuid(Uuid::from_bytes(raw))
            }
        };
        Ok(value)
    }

    /// Encode the tag byte followed by the value body.
    pub fn encode<B: BufMut>(&self, writer: &mut B) -> Result<()> {
        match self {
            HeaderValue::ByteArray(raw) => check_value_len(raw.len())?,
            HeaderValue::String(text) => check_value_len(text.len())?,
            _ => {}
        }

        writer.put_u8(self.header_type().tag());
        match self {
            HeaderValue::Bool(_) => {}
            HeaderValue::Byte(v) => writer.put_i8(*v),
            HeaderValue::Short(v) => writer.put_i16(*v),
            HeaderValue::Integer(v) => writer.put_i32(*v),
            HeaderValue::Long(v) => writer.put_i64(*v),
            HeaderValue::ByteArray(raw) => {
                writer.put_u16(raw.len() as u16);
                writer.put_slice(raw);
            }
            HeaderValue::String(text) => {
                writer.put_u16(text.len() as u16);
                writer.put_slice(text.as_bytes());
            }
            HeaderValue::Timestamp(millis) => writer.put_i64(*millis),
            HeaderValue::Uuid(id) => writer.put_slice(id.as_bytes()),
        }
        Ok(())
    }

    /// Number of bytes `encode` writes, tag included.
    pub fn encoded_len(&self) -> usize {
        1 + match self {
            HeaderValue::Bool(_) => 0,
            HeaderValue::Byte(_) => 1,
            HeaderValue::Short(_) => 2,
            HeaderValue::Integer(_) => 4,
            HeaderValue::Long(_) | HeaderValue::Timestamp(_) => 8,
            HeaderValue::ByteArray(raw) => 2 + raw.len(),
            HeaderValue::String(text) => 2 + text.len(),
            HeaderValue::Uuid(_) => 16,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            HeaderValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_byte(&self) -> Option<i8> {
        match self {
            HeaderValue::Byte(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_short(&self) -> Option<i16> {
        match self {
            HeaderValue::Short(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            HeaderValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_long(&self) -> Option<i64> {
        match self {
            HeaderValue::Long(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            HeaderValue::ByteArray(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            HeaderValue::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_timestamp_millis(&self) -> Option<i64> {
        match self {
            HeaderValue::Timestamp(v) => Some(*v),
            _ => None,
        }
    }

    /// Timestamp as a UTC date-time; `None` for other types or out-of-range instants.
    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        self.as_timestamp_millis()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
    }

    pub fn as_uuid(&self) -> Option<Uuid> {
        match self {
            HeaderValue::Uuid(v) => Some(*v),
            _ => None,
        }
    }
}

fn ensure<B: Buf>(reader: &B, needed: usize, context: &'static str) -> Result<()> {
    if reader.remaining() < needed {
        return Err(EventStreamError::Truncated {
            context,
            needed,
            available: reader.remaining(),
        });
    }
    Ok(())
}

fn read_value_len<B: Buf>(reader: &mut B, context: &'static str) -> Result<usize> {
    ensure(reader, 2, context)?;
    let len = reader.get_u16() as usize;
    ensure(reader, len, context)?;
    Ok(len)
}

fn check_value_len(len: usize) -> Result<()> {
    if len > u16::MAX as usize {
        return Err(EventStreamError::HeaderValueTooLong { len });
    }
    Ok(())
}

impl fmt::Display for HeaderValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderValue::Bool(v) => write!(f, "{v}"),
            HeaderValue::Byte(v) => write!(f, "{v}"),
            HeaderValue::Short(v) => write!(f, "{v}"),
            HeaderValue::Integer(v) => write!(f, "{v}"),
            HeaderValue::Long(v) => write!(f, "{v}"),
            HeaderValue::ByteArray(raw) => {
                for b in raw.iter() {
                    write!(f, "{b:02x}")?;
                }
                Ok(())
            }
            HeaderValue::String(v) => f.write_str(v),
            HeaderValue::Timestamp(millis) => match self.as_datetime() {
                Some(at) => write!(f, "{}", at.to_rfc3339()),
                None => write!(f, "{millis}ms"),
            },
            HeaderValue::Uuid(id) => write!(f, "{id}"),
        }
    }
}

impl From<bool> for HeaderValue {
    fn from(v: bool) -> Self {
        HeaderValue::Bool(v)
    }
}

impl From<i8> for HeaderValue {
    fn from(v: i8) -> Self {
        HeaderValue::Byte(v)
    }
}

impl From<i16> for HeaderValue {
    fn from(v: i16) -> Self {
        HeaderValue::Short(v)
    }
}

impl From<i32> for HeaderValue {
    fn from(v: i32) -> Self {
        HeaderValue::Integer(v)
    }
}

impl From<i64> for HeaderValue {
    fn from(v: i64) -> Self {
        HeaderValue::Long(v)
    }
}

impl From<Bytes> for HeaderValue {
    fn from(v: Bytes) -> Self {
        HeaderValue::ByteArray(v)
    }
}

impl From<Vec<u8>> for HeaderValue {
    fn from(v: Vec<u8>) -> Self {
        HeaderValue::ByteArray(Bytes::from(v))
    }
}

impl From<String> for HeaderValue {
    fn from(v: String) -> Self {
        HeaderValue::String(v)
    }
}

impl From<&str> for HeaderValue {
    fn from(v: &str) -> Self {
        HeaderValue::String(v.to_owned())
    }
}

impl From<DateTime<Utc>> for HeaderValue {
    fn from(v: DateTime<Utc>) -> Self {
        HeaderValue::timestamp(v)
    }
}

impl From<Uuid> for HeaderValue {
    fn from(v: Uuid) -> Self {
        HeaderValue::Uuid(v)
    }
}

#[cfg(test)]
mod tests {
    use bytes::BytesMut;

    use super::*;

    fn encoded(value: &HeaderValue) -> BytesMut {
        let mut buf = BytesMut::new();
        value.encode(&mut buf).unwrap();
        buf
    }

    #[test]
    fn bools_have_no_body() {
        assert_eq!(encoded(&HeaderValue::Bool(true)).as_ref(), &[0]);
        assert_eq!(encoded(&HeaderValue::Bool(false)).as_ref(), &[1]);

        let mut empty: &[u8] = &[];
        assert_eq!(
            HeaderValue::decode(0, &mut empty).unwrap(),
            HeaderValue::Bool(true)
        );
        assert_eq!(
            HeaderValue::decode(1, &mut empty).unwrap(),
            HeaderValue::Bool(false)
        );
    }

    #[test]
    fn integers_are_big_endian() {
        assert_eq!(encoded(&HeaderValue::Byte(-1)).as_ref(), &[2, 0xff]);
        assert_eq!(
            encoded(&HeaderValue::Short(0x0102)).as_ref(),
            &[3, 0x01, 0x02]
        );
        assert_eq!(
            encoded(&HeaderValue::Integer(0x0102_0304)).as_ref(),
            &[4, 0x01, 0x02, 0x03, 0x04]
        );
        assert_eq!(
            encoded(&HeaderValue::Long(1)).as_ref(),
            &[5, 0, 0, 0, 0, 0, 0, 0, 1]
        );
    }

    #[test]
    fn string_is_length_prefixed() {
        let wire = encoded(&HeaderValue::from("abc"));
        assert_eq!(wire.as_ref(), &[7, 0, 3, b'a', b'b', b'c']);

        let mut body = &wire[1..];
        let value = HeaderValue::decode(wire[0], &mut body).unwrap();
        assert_eq!(value.as_str(), Some("abc"));
        assert!(body.is_empty());
    }

    #[test]
    fn uuid_uses_sixteen_raw_bytes() {
        let id = Uuid::from_u128(0x0011_2233_4455_6677_8899_aabb_ccdd_eeff);
        let wire = encoded(&HeaderValue::Uuid(id));
        assert_eq!(wire.len(), 17);
        assert_eq!(&wire[1..9], &0x0011_2233_4455_6677u64.to_be_bytes());
        assert_eq!(&wire[9..], &0x8899_aabb_ccdd_eeffu64.to_be_bytes());

        let mut body = &wire[1..];
        assert_eq!(
            HeaderValue::decode(9, &mut body).unwrap().as_uuid(),
            Some(id)
        );
    }

    #[test]
    fn timestamp_roundtrips_through_datetime() {
        let at = DateTime::<Utc>::from_timestamp_millis(1_700_000_000_123).unwrap();
        let value = HeaderValue::from(at);
        assert_eq!(value.as_timestamp_millis(), Some(1_700_000_000_123));
        assert_eq!(value.as_datetime(), Some(at));

        let wire = encoded(&value);
        let mut body = &wire[1..];
        assert_eq!(HeaderValue::decode(8, &mut body).unwrap(), value);
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let mut body: &[u8] = &[0, 0, 0, 0];
        let err = HeaderValue::decode(10, &mut body).unwrap_err();
        assert!(matches!(err, EventStreamError::UnknownHeaderType(10)));
    }

    #[test]
    fn truncated_value_is_rejected() {
        let mut body: &[u8] = &[0, 0];
        let err = HeaderValue::decode(4, &mut body).unwrap_err();
        assert!(matches!(
            err,
            EventStreamError::Truncated {
                needed: 4,
                available: 2,
                ..
            }
        ));

        let mut short_string: &[u8] = &[0, 5, b'a', b'b'];
        let err = HeaderValue::decode(7, &mut short_string).unwrap_err();
        assert!(matches!(err, EventStreamError::Truncated { .. }));
    }

    #[test]
    fn invalid_utf8_string_is_rejected() {
        let mut body: &[u8] = &[0, 2, 0xc3, 0x28];
        let err = HeaderValue::decode(7, &mut body).unwrap_err();
        assert!(matches!(err, EventStreamError::InvalidUtf8 { .. }));
    }

    #[test]
    fn oversized_byte_array_is_rejected() {
        let value = HeaderValue::from(vec![0u8; u16::MAX as usize + 1]);
        let mut buf = BytesMut::new();
        let err = value.encode(&mut buf).unwrap_err();
        assert!(matches!(err, EventStreamError::HeaderValueTooLong { .. }));
        assert!(buf.is_empty());
    }

    #[test]
    fn encoded_len_matches_encode() {
        let values = [
            HeaderValue::Bool(true),
            HeaderValue::Byte(7),
            HeaderValue::Short(7),
            HeaderValue::Integer(7),
            HeaderValue::Long(7),
            HeaderValue::from(vec![1u8, 2, 3]),
            HeaderValue::from("seven"),
            HeaderValue::Timestamp(7),
            HeaderValue::Uuid(Uuid::nil()),
        ];
        for value in values {
            assert_eq!(value.encoded_len(), encoded(&value).len(), "{value:?}");
        }
    }

    #[test]
    fn equality_includes_type() {
        assert_ne!(HeaderValue::Long(5), HeaderValue::Timestamp(5));
        assert_ne!(HeaderValue::Integer(5), HeaderValue::Long(5));
        assert_eq!(HeaderValue::from("x"), HeaderValue::String("x".into()));
    }
}
