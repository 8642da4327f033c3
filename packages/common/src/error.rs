use thiserror::Error;

/// Errors raised while encoding or decoding wire messages.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CodecError {
    #[error("unexpected end of input: needed {needed} more byte(s)")]
    UnexpectedEof { needed: usize },

    #[error("{count} trailing byte(s) after payload")]
    TrailingBytes { count: usize },

    #[error("invalid chain id: {0}")]
    InvalidChainId(u8),

    #[error("invalid message type: {0}")]
    InvalidMessageType(u8),

    #[error("invalid bool byte: {0}")]
    InvalidBool(u8),

    #[error("invalid emergency op type: {0}")]
    InvalidEmergencyOpType(u8),

    #[error("invalid blocklist type: {0}")]
    InvalidBlocklistType(u8),

    #[error("type name is not valid utf-8")]
    InvalidUtf8,

    #[error("length prefix overflow")]
    LengthOverflow,

    #[error("field too long: {len} bytes (max 255)")]
    FieldTooLong { len: usize },

    #[error("payload does not belong to a {expected} message")]
    WrongMessageType { expected: &'static str },
}
