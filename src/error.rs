//! Error type shared by the strategies and containers.

use core::fmt;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Why a batch entry could not be given a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameConflict {
    /// The entry carries no name.
    MissingName,
    /// The batch supplied `names` names for `values` values.
    LengthMismatch { names: usize, values: usize },
}

impl fmt::Display for NameConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameConflict::MissingName => f.write_str("has no name"),
            NameConflict::LengthMismatch { names, values } if names < values => write!(
                f,
                "has no corresponding name ({names} names for {values} values)"
            ),
            NameConflict::LengthMismatch { names, values } => write!(
                f,
                "has no corresponding value ({names} names for {values} values)"
            ),
        }
    }
}

/// Prefix naming the offending element of a bulk call, if any.
struct Position(Option<usize>);

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(i) => write!(f, "element at index {i}: "),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum Error {
    /// A map batch is missing a name, or names and values differ in count.
    #[error("element at index {index} {conflict}")]
    NameConflict { index: usize, conflict: NameConflict },

    /// The value has no representation as the strategy's scalar type.
    #[error("{}cannot convert {found} to {expected}", Position(*.index))]
    TypeConversion {
        index: Option<usize>,
        expected: &'static str,
        found: &'static str,
    },

    /// The serializer could not produce canonical bytes for the value.
    #[error("{}serialization failed: {message}", Position(*.index))]
    Serialization {
        index: Option<usize>,
        message: String,
    },
}

impl Error {
    pub(crate) fn type_conversion(expected: &'static str, found: &'static str) -> Self {
        Error::TypeConversion {
            index: None,
            expected,
            found,
        }
    }

    pub fn serialization(message: impl fmt::Display) -> Self {
        Error::Serialization {
            index: None,
            message: message.to_string(),
        }
    }

    /// Attach the position of the offending element in a bulk call.
    pub fn at(self, position: usize) -> Self {
        match self {
            Error::TypeConversion {
                expected, found, ..
            } => Error::TypeConversion {
                index: Some(position),
                expected,
                found,
            },
            Error::Serialization { message, .. } => Error::Serialization {
                index: Some(position),
                message,
            },
            Error::NameConflict { conflict, .. } => Error::NameConflict {
                index: position,
                conflict,
            },
        }
    }

    /// Position of the offending element, when the error came from a bulk call.
    pub fn index(&self) -> Option<usize> {
        match self {
            Error::NameConflict { index, .. } => Some(*index),
            Error::TypeConversion { index, .. } | Error::Serialization { index, .. } => *index,
        }
    }
}
