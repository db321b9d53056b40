use thiserror::Error;

/// 解码边界上的协议错误：字段缺失、字段类型错误、未知消息类型等。
/// 这类错误会被报告给界面层，但会话继续。
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("malformed message: {0}")]
    Malformed(String),
    #[error("message is not an object or has no string `type` field")]
    MissingType,
    #[error("unknown message type `{0}`")]
    UnknownType(String),
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    #[error("invalid field `{field}`: {reason}")]
    InvalidField { field: &'static str, reason: String },
    #[error("`{field}` has {actual} entries but there are {seats} seats")]
    LengthMismatch {
        field: &'static str,
        seats: usize,
        actual: usize,
    },
    #[error("`{field}` refers to seat {seat} but there are {seats} seats")]
    SeatOutOfRange {
        field: &'static str,
        seat: i64,
        seats: usize,
    },
    #[error("card value {0} is outside 0..=51")]
    CardOutOfRange(i64),
    #[error("`{field}` holds {count} cards, at most {max} allowed")]
    TooManyCards {
        field: &'static str,
        count: usize,
        max: usize,
    },
}

impl ProtocolError {
    pub fn invalid(field: &'static str, reason: impl ToString) -> Self {
        Self::InvalidField {
            field,
            reason: reason.to_string(),
        }
    }
}

/// 消息顺序违规。之后到来的完整快照可以重新同步，所以不是致命错误。
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("`{0}` arrived before any game state snapshot")]
    NoSnapshot(&'static str),
    #[error("`{0}` arrived after the game already ended")]
    SessionEnded(&'static str),
}

/// 传输层错误，只由外部传输实现产生，核心只负责转发。
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connection closed")]
    Closed,
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("bad frame: {0}")]
    Framing(String),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}
