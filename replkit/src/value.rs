//! Typed flag values and the conversions used by result-map accessors.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize, Serializer};

use crate::duration::{format_duration, parse_duration};
use crate::error::{Error, Result};
use crate::ipmask::IpAndMask;

/// The value kinds a flag can be declared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlagKind {
    String,
    Bool,
    Int,
    Int64,
    Uint,
    Uint64,
    Float64,
    Duration,
    #[serde(rename = "ipmask")]
    IpMask,
}

impl FlagKind {
    /// Word used in value-related error messages.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            FlagKind::String => "string",
            FlagKind::Bool => "boolean",
            FlagKind::Int | FlagKind::Int64 => "int",
            FlagKind::Uint | FlagKind::Uint64 => "uint",
            FlagKind::Float64 => "float",
            FlagKind::Duration => "duration",
            FlagKind::IpMask => "ip",
        }
    }

    /// Placeholder shown after the flag name in help output; empty for booleans.
    #[must_use]
    pub fn help_args(self) -> &'static str {
        match self {
            FlagKind::Bool => "",
            other => other.name(),
        }
    }

    /// Booleans never print their default.
    #[must_use]
    pub fn shows_default(self) -> bool {
        self != FlagKind::Bool
    }

    /// The value used when a declaration omits its default.
    #[must_use]
    pub fn zero_value(self) -> FlagValue {
        match self {
            FlagKind::String => FlagValue::String(String::new()),
            FlagKind::Bool => FlagValue::Bool(false),
            FlagKind::Int | FlagKind::Int64 => FlagValue::Int(0),
            FlagKind::Uint | FlagKind::Uint64 => FlagValue::Uint(0),
            FlagKind::Float64 => FlagValue::Float(0.0),
            FlagKind::Duration => FlagValue::Duration(Duration::ZERO),
            FlagKind::IpMask => FlagValue::IpMask(IpAndMask::default()),
        }
    }

    /// Coerces one textual value. Address+mask input may hold the two halves
    /// separated by whitespace.
    pub fn parse_value(self, flag: &str, raw: &str) -> Result<FlagValue> {
        let invalid = || Error::InvalidValue {
            flag: flag.to_string(),
            kind: self.name(),
        };
        let value = match self {
            FlagKind::String => FlagValue::String(raw.to_string()),
            FlagKind::Bool => FlagValue::Bool(parse_bool(raw).ok_or_else(invalid)?),
            FlagKind::Int => {
                let v: isize = raw.parse().map_err(|_| invalid())?;
                FlagValue::Int(i64::try_from(v).map_err(|_| invalid())?)
            }
            FlagKind::Int64 => FlagValue::Int(raw.parse().map_err(|_| invalid())?),
            FlagKind::Uint => {
                let v: usize = raw.parse().map_err(|_| invalid())?;
                FlagValue::Uint(u64::try_from(v).map_err(|_| invalid())?)
            }
            FlagKind::Uint64 => FlagValue::Uint(raw.parse().map_err(|_| invalid())?),
            FlagKind::Float64 => FlagValue::Float(raw.parse().map_err(|_| invalid())?),
            FlagKind::Duration => FlagValue::Duration(parse_duration(raw).ok_or_else(invalid)?),
            FlagKind::IpMask => {
                let mut parts = raw.split_whitespace();
                let first = parts.next().ok_or_else(|| Error::BadIp(flag.to_string()))?;
                let (v, _) = crate::ipmask::parse_ip_and_mask(flag, first, parts.next())?;
                FlagValue::IpMask(v)
            }
        };
        Ok(value)
    }
}

/// Accepts the literals `1 t T TRUE true True 0 f F FALSE false False`.
#[must_use]
pub fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

/// A parsed flag value.
#[derive(Debug, Clone, PartialEq)]
pub enum FlagValue {
    String(String),
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Duration(Duration),
    IpMask(IpAndMask),
}

impl FlagValue {
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            FlagValue::String(_) => "string",
            FlagValue::Bool(_) => "bool",
            FlagValue::Int(_) => "int",
            FlagValue::Uint(_) => "uint",
            FlagValue::Float(_) => "float",
            FlagValue::Duration(_) => "duration",
            FlagValue::IpMask(_) => "ip",
        }
    }
}

impl fmt::Display for FlagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlagValue::String(s) => write!(f, "{}", s),
            FlagValue::Bool(b) => write!(f, "{}", b),
            FlagValue::Int(i) => write!(f, "{}", i),
            FlagValue::Uint(u) => write!(f, "{}", u),
            FlagValue::Float(v) => write!(f, "{}", v),
            FlagValue::Duration(d) => write!(f, "{}", format_duration(*d)),
            FlagValue::IpMask(v) => write!(f, "{}", v),
        }
    }
}

impl Serialize for FlagValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            FlagValue::String(s) => serializer.serialize_str(s),
            FlagValue::Bool(b) => serializer.serialize_bool(*b),
            FlagValue::Int(i) => serializer.serialize_i64(*i),
            FlagValue::Uint(u) => serializer.serialize_u64(*u),
            FlagValue::Float(v) => serializer.serialize_f64(*v),
            FlagValue::Duration(d) => serializer.collect_str(&format_duration(*d)),
            FlagValue::IpMask(v) => v.serialize(serializer),
        }
    }
}

/// Conversion from a stored value into a concrete Rust type.
pub trait FromFlagValue: Sized {
    const EXPECTED: &'static str;

    fn from_flag_value(value: &FlagValue) -> Option<Self>;
}

macro_rules! from_flag_value {
    ($ty:ty, $expected:literal, $($pat:pat => $conv:expr),+ $(,)?) => {
        impl FromFlagValue for $ty {
            const EXPECTED: &'static str = $expected;

            fn from_flag_value(value: &FlagValue) -> Option<Self> {
                match value {
                    $($pat => $conv,)+
                    _ => None,
                }
            }
        }
    };
}

from_flag_value!(String, "string", FlagValue::String(s) => Some(s.clone()));
from_flag_value!(bool, "bool", FlagValue::Bool(b) => Some(*b));
from_flag_value!(i64, "int", FlagValue::Int(i) => Some(*i));
from_flag_value!(i32, "int", FlagValue::Int(i) => i32::try_from(*i).ok());
from_flag_value!(isize, "int", FlagValue::Int(i) => isize::try_from(*i).ok());
from_flag_value!(u64, "uint", FlagValue::Uint(u) => Some(*u));
from_flag_value!(u32, "uint", FlagValue::Uint(u) => u32::try_from(*u).ok());
from_flag_value!(usize, "uint", FlagValue::Uint(u) => usize::try_from(*u).ok());
from_flag_value!(f64, "float", FlagValue::Float(v) => Some(*v));
from_flag_value!(Duration, "duration", FlagValue::Duration(d) => Some(*d));
from_flag_value!(IpAndMask, "ip", FlagValue::IpMask(v) => Some(*v));
