//! Per-command flag registry and the token parser built on it.
//!
//! Flags are written bare (`mtu 9000`), with dashes (`--mtu 9000`) or with an
//! inline value (`mtu=9000`). Any unique prefix of a long name selects that
//! flag, so `mt 9000` works as long as no other flag starts with `mt`.
//! Parsing stops at the first token that names no flag; that token and
//! everything after it are handed back as positional arguments.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::ipmask::{parse_ip_and_mask, IpAndMask};
use crate::value::{FlagKind, FlagValue, FromFlagValue};

/// One declared flag.
#[derive(Debug, Clone, PartialEq)]
pub struct FlagSpec {
    /// Empty or a single character.
    pub short: String,
    pub long: String,
    pub help: String,
    pub help_args: String,
    pub help_show_default: bool,
    pub kind: FlagKind,
    pub default: FlagValue,
}

impl FlagSpec {
    /// Builds a declaration whose help hints follow from `kind`.
    #[must_use]
    pub fn new(kind: FlagKind, short: &str, long: &str, default: FlagValue, help: &str) -> Self {
        Self {
            short: short.to_string(),
            long: long.to_string(),
            help: help.to_string(),
            help_args: kind.help_args().to_string(),
            help_show_default: kind.shows_default(),
            kind,
            default,
        }
    }

    fn validate(&self) -> Result<()> {
        let config = |msg: String| Err(Error::Config(msg));
        if self.short.chars().count() > 1 {
            return config(format!(
                "invalid short flag: '{}': must be a single character",
                self.short
            ));
        }
        if self.short.starts_with('-') {
            return config(format!(
                "invalid short flag: '{}': must not start with a '-'",
                self.short
            ));
        }
        if self.long.is_empty() {
            return config(format!("empty long flag: short='{}'", self.short));
        }
        if self.long.starts_with('-') {
            return config(format!(
                "invalid long flag: '{}': must not start with a '-'",
                self.long
            ));
        }
        if self.long.contains('=') || self.long.contains(char::is_whitespace) {
            return config(format!(
                "invalid long flag: '{}': must not contain '=' or whitespace",
                self.long
            ));
        }
        if self.help.is_empty() {
            return config(format!(
                "empty flag help message for flag: '{}'",
                self.long
            ));
        }
        if std::mem::discriminant(&self.default) != std::mem::discriminant(&self.kind.zero_value()) {
            return config(format!(
                "default value for flag '{}' is a {} value, expected {}",
                self.long,
                self.default.type_name(),
                self.kind.name()
            ));
        }
        Ok(())
    }

    /// Reads this flag's value from the inline part or the following tokens.
    /// Returns the value and the number of tokens taken from `rest`.
    fn take_value(&self, inline: Option<&str>, rest: &[String]) -> Result<(FlagValue, usize)> {
        let missing = || Error::MissingValue {
            flag: self.long.clone(),
            kind: self.kind.name(),
        };
        match self.kind {
            FlagKind::Bool => match inline {
                Some(raw) => Ok((self.kind.parse_value(&self.long, raw)?, 0)),
                None => Ok((FlagValue::Bool(true), 0)),
            },
            FlagKind::IpMask => match inline {
                // An inline value is self-contained; both halves live in it.
                Some(raw) => Ok((self.kind.parse_value(&self.long, raw)?, 0)),
                None => {
                    let first = rest.first().ok_or_else(missing)?;
                    let (value, used_second) = parse_ip_and_mask(
                        &self.long,
                        first,
                        rest.get(1).map(String::as_str),
                    )?;
                    Ok((FlagValue::IpMask(value), 1 + usize::from(used_second)))
                }
            },
            kind => match (inline, rest.first()) {
                (Some(raw), _) => Ok((kind.parse_value(&self.long, raw)?, 0)),
                (None, Some(raw)) => Ok((kind.parse_value(&self.long, raw)?, 1)),
                (None, None) => Err(missing()),
            },
        }
    }
}

/// Value stored for one flag after parsing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlagMapItem {
    pub value: FlagValue,
    pub is_default: bool,
}

/// Result of one parse: long flag name to value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FlagMap {
    items: BTreeMap<String, FlagMapItem>,
}

impl FlagMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, long: &str, item: FlagMapItem) {
        self.items.insert(long.to_string(), item);
    }

    #[must_use]
    pub fn item(&self, long: &str) -> Option<&FlagMapItem> {
        self.items.get(long)
    }

    #[must_use]
    pub fn contains(&self, long: &str) -> bool {
        self.items.contains_key(long)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FlagMapItem)> {
        self.items.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Typed lookup; fails on an absent flag or a value of another kind.
    ///
    /// # Errors
    ///
    /// `Error::UnknownFlag` or `Error::KindMismatch`.
    pub fn get<T: FromFlagValue>(&self, long: &str) -> Result<T> {
        let item = self
            .items
            .get(long)
            .ok_or_else(|| Error::UnknownFlag(long.to_string()))?;
        T::from_flag_value(&item.value).ok_or_else(|| Error::KindMismatch {
            flag: long.to_string(),
            expected: T::EXPECTED,
            found: item.value.type_name(),
        })
    }

    pub fn is_default(&self, long: &str) -> Result<bool> {
        self.items
            .get(long)
            .map(|item| item.is_default)
            .ok_or_else(|| Error::UnknownFlag(long.to_string()))
    }
}

/// The flags declared for one command level.
#[derive(Debug, Clone, Default)]
pub struct Flags {
    list: Vec<FlagSpec>,
}

macro_rules! shorthands {
    ($($name:ident, $name_l:ident, $ty:ty, $kind:ident, |$v:ident| $conv:expr;)+) => {
        impl Flags {
            $(
                #[doc = concat!("Registers a `", stringify!($kind), "` flag with a shorthand.")]
                ///
                /// # Panics
                ///
                /// Panics on a malformed or duplicate declaration.
                pub fn $name(&mut self, short: char, long: &str, default: $ty, help: &str) {
                    let $v = default;
                    self.register(FlagSpec::new(FlagKind::$kind, &short.to_string(), long, $conv, help));
                }

                #[doc = concat!("Same as [`Flags::", stringify!($name), "`], but without a shorthand.")]
                pub fn $name_l(&mut self, long: &str, default: $ty, help: &str) {
                    let $v = default;
                    self.register(FlagSpec::new(FlagKind::$kind, "", long, $conv, help));
                }
            )+
        }
    };
}

shorthands! {
    string, string_l, &str, String, |v| FlagValue::String(v.to_string());
    bool, bool_l, bool, Bool, |v| FlagValue::Bool(v);
    int, int_l, isize, Int, |v| FlagValue::Int(v as i64);
    int64, int64_l, i64, Int64, |v| FlagValue::Int(v);
    uint, uint_l, usize, Uint, |v| FlagValue::Uint(v as u64);
    uint64, uint64_l, u64, Uint64, |v| FlagValue::Uint(v);
    float64, float64_l, f64, Float64, |v| FlagValue::Float(v);
    duration, duration_l, Duration, Duration, |v| FlagValue::Duration(v);
    ip_mask, ip_mask_l, IpAndMask, IpMask, |v| FlagValue::IpMask(v);
}

impl Flags {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a flag, rejecting malformed shapes and duplicate names.
    ///
    /// # Errors
    ///
    /// `Error::Config` describing the first problem found.
    pub fn try_register(&mut self, spec: FlagSpec) -> Result<()> {
        spec.validate()?;
        if self.list.iter().any(|f| f.long == spec.long) {
            return Err(Error::Config(format!(
                "duplicate long flag: '{}'",
                spec.long
            )));
        }
        if !spec.short.is_empty() && self.list.iter().any(|f| f.short == spec.short) {
            return Err(Error::Config(format!(
                "duplicate short flag: '{}' for '{}'",
                spec.short, spec.long
            )));
        }
        self.list.push(spec);
        Ok(())
    }

    /// Adds a flag declared in code.
    ///
    /// # Panics
    ///
    /// Panics on a malformed or duplicate declaration.
    pub fn register(&mut self, spec: FlagSpec) {
        if let Err(err) = self.try_register(spec) {
            panic!("{}", err);
        }
    }

    /// Orders the flags by long name.
    pub fn sort(&mut self) {
        self.list.sort_by(|a, b| a.long.cmp(&b.long));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.list.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FlagSpec> {
        self.list.iter()
    }

    /// Resolves a typed name to a registered long name.
    ///
    /// Every long name the token prefixes is a candidate, an exact match
    /// included; two candidates make the token ambiguous. A short name is
    /// only consulted when no long name matched. `None` means the name is no
    /// flag at all.
    fn expand(&self, name: &str) -> Result<Option<&str>> {
        if name.is_empty() {
            return Ok(None);
        }

        let mut found: Option<&str> = None;
        for f in &self.list {
            if !f.long.starts_with(name) {
                continue;
            }
            if let Some(first) = found {
                return Err(Error::AmbiguousFlag {
                    token: name.to_string(),
                    first: first.to_string(),
                    second: f.long.clone(),
                });
            }
            found = Some(&f.long);
        }
        if let Some(long) = found {
            if long != name {
                debug!(abbrev = name, flag = long, "expanded flag abbreviation");
            }
            return Ok(Some(long));
        }
        Ok(self
            .list
            .iter()
            .find(|f| f.short == name)
            .map(|f| f.long.as_str()))
    }

    /// Consumes leading flag tokens from `args` into `res`, then installs the
    /// default of every flag that was not given. Returns the positional rest.
    ///
    /// On error, values committed by earlier flags of the same call stay in
    /// `res`; the failing flag writes nothing.
    ///
    /// # Errors
    ///
    /// Ambiguous abbreviations, missing values and failed coercions.
    pub fn parse(&self, args: &[String], res: &mut FlagMap) -> Result<Vec<String>> {
        let mut rest = args;
        while let Some((token, tail)) = rest.split_first() {
            if token == "--" {
                rest = tail;
                break;
            }
            let (name, inline) = split_token(token);
            let Some(long) = self.expand(name)? else {
                debug!(token = token.as_str(), "positional arguments begin");
                break;
            };
            rest = tail;

            let spec = self
                .list
                .iter()
                .find(|f| f.long == long)
                .ok_or_else(|| Error::InvalidFlag(long.to_string()))?;
            let (value, taken) = spec.take_value(inline, rest)?;
            rest = &rest[taken..];
            res.insert(
                &spec.long,
                FlagMapItem {
                    value,
                    is_default: false,
                },
            );
        }

        self.fill_defaults(res);
        Ok(rest.to_vec())
    }

    /// Parses into a fresh map.
    ///
    /// # Errors
    ///
    /// Same as [`Flags::parse`].
    pub fn parse_new(&self, args: &[String]) -> Result<(FlagMap, Vec<String>)> {
        let mut res = FlagMap::new();
        let rest = self.parse(args, &mut res)?;
        Ok((res, rest))
    }

    fn fill_defaults(&self, res: &mut FlagMap) {
        for f in &self.list {
            if res.contains(&f.long) {
                continue;
            }
            res.insert(
                &f.long,
                FlagMapItem {
                    value: f.default.clone(),
                    is_default: true,
                },
            );
        }
    }

    /// One `(names, help)` row per flag, e.g. `("m, mtu int", "MTU (default: 1500)")`.
    #[must_use]
    pub fn help_lines(&self) -> Vec<(String, String)> {
        self.list
            .iter()
            .map(|f| {
                let mut names = String::new();
                if !f.short.is_empty() {
                    names.push_str(&f.short);
                    names.push_str(", ");
                }
                names.push_str(&f.long);
                if !f.help_args.is_empty() {
                    names.push(' ');
                    names.push_str(&f.help_args);
                }

                let default = f.default.to_string();
                let help = if f.help_show_default && !default.is_empty() {
                    format!("{} (default: {})", f.help, default)
                } else {
                    f.help.clone()
                };
                (names, help)
            })
            .collect()
    }
}

/// Splits `--name=value` into the bare name and the inline value.
fn split_token(token: &str) -> (&str, Option<&str>) {
    let body = token
        .strip_prefix("--")
        .or_else(|| token.strip_prefix('-'))
        .unwrap_or(token);
    match body.find('=') {
        Some(pos) if pos > 0 => (&body[..pos], Some(trim_quotes(&body[pos + 1..]))),
        _ => (body, None),
    }
}

fn trim_quotes(s: &str) -> &str {
    if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
        &s[1..s.len() - 1]
    } else {
        s
    }
}
