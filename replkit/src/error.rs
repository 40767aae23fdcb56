//! Error handling for replkit.

use std::fmt;

/// The main error type for replkit operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Malformed declaration: bad short/long shape, empty help, duplicate names.
    Config(String),
    /// A flag token is a prefix of more than one long name.
    AmbiguousFlag {
        token: String,
        first: String,
        second: String,
    },
    /// A command word is a prefix of more than one sibling command.
    AmbiguousCommand {
        word: String,
        first: String,
        second: String,
    },
    /// The flag needs a value but the input ran out.
    MissingValue { flag: String, kind: &'static str },
    /// The supplied value failed coercion.
    InvalidValue { flag: String, kind: &'static str },
    BadIp(String),
    BadMask(String),
    BadCidr(String),
    /// A resolved flag name that no registered flag accepted.
    InvalidFlag(String),
    /// The first word of a line names no command.
    UnknownCommand(String),
    /// Lookup of a flag absent from a result map.
    UnknownFlag(String),
    /// Typed lookup on a value of another kind.
    KindMismatch {
        flag: String,
        expected: &'static str,
        found: &'static str,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(msg) => write!(f, "{}", msg),
            Error::AmbiguousFlag {
                token,
                first,
                second,
            } => write!(
                f,
                "ambiguous command flags: {} could mean {} or {}",
                token, first, second
            ),
            Error::AmbiguousCommand {
                word,
                first,
                second,
            } => write!(
                f,
                "ambiguous command: {} could mean {} or {}",
                word, first, second
            ),
            Error::MissingValue { flag, kind } => {
                write!(f, "missing {} value for flag: {}", kind, flag)
            }
            Error::InvalidValue { flag, kind } => {
                write!(f, "invalid {} value for flag: {}", kind, flag)
            }
            Error::BadIp(flag) => write!(f, "bad ip value for {}", flag),
            Error::BadMask(flag) => write!(f, "bad mask value for {}", flag),
            Error::BadCidr(flag) => write!(f, "bad cidr value for {}", flag),
            Error::InvalidFlag(flag) => write!(f, "invalid flag: {}", flag),
            Error::UnknownCommand(word) => write!(f, "unknown command: {}", word),
            Error::UnknownFlag(flag) => write!(f, "unknown flag: {}", flag),
            Error::KindMismatch {
                flag,
                expected,
                found,
            } => write!(
                f,
                "flag {} holds a {} value, not {}",
                flag, found, expected
            ),
        }
    }
}

impl std::error::Error for Error {}

/// A Result type alias for replkit operations.
pub type Result<T> = std::result::Result<T, Error>;
