//! Error types
//!
//! [`Error`] values are fatal to the message being decoded: they travel up through `?` to the
//! [`Layer`][`crate::layer::Layer`] boundary and abort decoding of that message only. Findings
//! that do not prevent decoding the rest of a message are reported as [`Note`]s attached to the
//! field that produced them.

use core::fmt;

use serde::Serialize;

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Error {
    /// A read went past the end of the available bytes.
    TooShort {
        required: usize,
        available: usize,
        data: String,
    },
    /// The bytes violate the wire format in a way that makes further decoding meaningless.
    ParseError(String),
    /// A dissector was registered twice for the same key.
    RegisterError(String),
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::TooShort {
                required,
                available,
                data,
            } => write!(
                f,
                "too short: required {} bytes, available {} ({})",
                required, available, data
            ),
            Error::ParseError(what) => write!(f, "parse error: {}", what),
            Error::RegisterError(what) => write!(f, "register error: {}", what),
        }
    }
}

/// A recoverable finding attached to a decoded field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum Note {
    /// The value was decoded but violates a documented constraint.
    MalformedField(String),
    /// No decoder is known for this type code; the raw bytes are kept.
    UnknownType(String),
    /// A compressed name pointer chain visited more bytes than the message holds.
    CompressionLoop,
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Note::MalformedField(what) => write!(f, "malformed: {}", what),
            Note::UnknownType(what) => write!(f, "not implemented: {}", what),
            Note::CompressionLoop => write!(f, "name contains a pointer that loops"),
        }
    }
}
