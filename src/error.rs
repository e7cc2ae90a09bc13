//! Error taxonomy
//!
//! None of these errors is fatal: validation failures remove a slot,
//! persistence failures degrade to an empty state, protocol failures drop
//! the message.

use thiserror::Error;

/// Why a raw field value could not be used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationReason {
    /// Field absent and no usable default
    MissingRequired,
    /// Raw value has the wrong type for the field kind
    TypeMismatch,
    /// Number outside `[min, max]` or not finite, color channel outside 0-255
    OutOfRange,
    /// Number not on the `min + k * step` grid
    NotOnStep,
    /// Text does not name any enum option
    UnknownOption,
    /// Text length outside `[min_len, max_len]`
    LengthBounds,
}

impl ValidationReason {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MissingRequired => "missing required value",
            Self::TypeMismatch => "type mismatch",
            Self::OutOfRange => "out of range",
            Self::NotOnStep => "not on step",
            Self::UnknownOption => "unknown option",
            Self::LengthBounds => "length out of bounds",
        }
    }
}

/// Rejection of a whole parameter set, naming the first failing field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("field `{field}`: {}", reason.as_str())]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: ValidationReason,
}

/// Outcome of one decode attempt with a fixed scratch capacity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("document needs more than {capacity} bytes of scratch")]
    NoMemory { capacity: usize },
    #[error("malformed document")]
    Malformed,
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("storage unreadable: {0}")]
    Unreadable(String),
    #[error("document decode failed")]
    DecodeFailed,
    #[error("decode buffer exceeded {cap} bytes")]
    BufferCapExceeded { cap: usize },
    #[error("storage write failed: {0}")]
    WriteFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("message is not a decodable map")]
    Malformed,
    #[error("unknown message type `{0}`")]
    UnknownMessageType(String),
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    #[error("unknown strip `{0}`")]
    UnknownStrip(String),
    #[error("unknown effect `{0}`")]
    UnknownEffect(String),
}

/// Failure of a slot update
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpdateError {
    #[error("strip index {0} is not configured")]
    UnknownStrip(usize),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("encode failed: {0}")]
    Encode(#[from] rmp_serde::encode::Error),
}
