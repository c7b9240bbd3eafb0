use thiserror::Error;

/// A failure while decoding bytes off the wire into a typed record.
///
/// Encoding never fails: every message type has a statically known size and
/// every field type can represent any in-range value, so there is nothing to
/// reject on the way out.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ProtocolError {
    #[error("unexpected end of buffer: needed {needed} more byte(s)")]
    UnexpectedEof { needed: usize },

    #[error("invalid value {value} for enum field `{field}`")]
    InvalidEnumValue { field: &'static str, value: u32 },

    #[error("invalid boolean byte {value:#04x}, expected 0x00 or 0x01")]
    InvalidBool { value: u8 },

    #[error("field `{field}` is not valid UTF-8")]
    InvalidUtf8 { field: &'static str },

    #[error("unknown message type byte {value:#04x}")]
    UnknownMessageType { value: u8 },

    #[error("expected message type {expected:#04x}, got {actual:#04x}")]
    UnexpectedMessageType { expected: u8, actual: u8 },
}
