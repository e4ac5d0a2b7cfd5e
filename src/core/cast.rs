// src/core/cast.rs

//! Conversion of raw flag input into typed [`FlagValue`]s.
//!
//! Input arrives either natively typed (a `--verbose` switch, a declared
//! default) or as text from the command line or the environment. Each flag
//! kind has its own casting function; all of them report failures as
//! [`UsageError`]s naming the flag.

use crate::{
    constants::LIST_SEPARATOR,
    core::flags::{Flag, FlagKind, FlagValue},
    errors::UsageError,
};
use lazy_static::lazy_static;
use regex::Regex;
use std::time::Duration;

lazy_static! {
    static ref DURATION_SEGMENT_RE: Regex =
        Regex::new(r"^(\d*)(?:\.(\d*))?(ns|us|µs|μs|ms|s|m|h)").unwrap();
}

const NANOS_PER_MICRO: u128 = 1_000;
const NANOS_PER_MILLI: u128 = 1_000_000;
const NANOS_PER_SEC: u128 = 1_000_000_000;
const MAX_FRACTION_DIGITS: usize = 18;

/// A flag value before casting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue<'a> {
    /// Already typed, e.g. a boolean switch or a declared default.
    Native(FlagValue),
    /// Text from the command line or an environment variable.
    Text(&'a str),
}

/// Casts `raw` to the kind declared by `flag`, applying its allowed-value set
/// and custom validator where the kind supports them.
pub fn cast(flag: &Flag, raw: RawValue<'_>) -> Result<FlagValue, UsageError> {
    match flag.kind() {
        FlagKind::Bool => cast_bool(flag, raw),
        FlagKind::String => cast_string(flag, raw),
        FlagKind::Int => cast_int(flag, raw),
        FlagKind::Duration => cast_duration(flag, raw),
        FlagKind::StringList => cast_string_list(flag, raw),
        FlagKind::IntList => cast_int_list(flag, raw),
    }
}

fn wrong_kind(flag: &Flag) -> UsageError {
    UsageError::WrongKind {
        flag: flag.name().to_string(),
        kind: flag.kind().label(),
    }
}

fn invalid(flag: &Flag, value: &str) -> UsageError {
    UsageError::InvalidValue {
        flag: flag.name().to_string(),
        kind: flag.kind().label(),
        value: value.to_string(),
    }
}

fn run_validator(flag: &Flag, value: FlagValue) -> Result<FlagValue, UsageError> {
    if let Some(validate) = flag.custom_validator() {
        validate(&value).map_err(|message| UsageError::Rejected {
            flag: flag.name().to_string(),
            message,
        })?;
    }
    Ok(value)
}

fn cast_bool(flag: &Flag, raw: RawValue<'_>) -> Result<FlagValue, UsageError> {
    match raw {
        RawValue::Native(FlagValue::Bool(b)) => Ok(FlagValue::Bool(b)),
        RawValue::Text(text) => match text.trim().to_lowercase().as_str() {
            "" | "true" | "1" | "yes" | "on" => Ok(FlagValue::Bool(true)),
            "false" | "0" | "no" | "off" => Ok(FlagValue::Bool(false)),
            _ => Err(invalid(flag, text)),
        },
        RawValue::Native(_) => Err(wrong_kind(flag)),
    }
}

fn cast_string(flag: &Flag, raw: RawValue<'_>) -> Result<FlagValue, UsageError> {
    let value = match raw {
        RawValue::Native(FlagValue::String(s)) => s,
        RawValue::Text(text) => text.to_string(),
        RawValue::Native(_) => return Err(wrong_kind(flag)),
    };

    let allowed = flag.allowed_values();
    if !allowed.is_empty() && !allowed.contains(&value) {
        return Err(UsageError::NotAllowed {
            flag: flag.name().to_string(),
            allowed: allowed.to_vec(),
        });
    }
    run_validator(flag, FlagValue::String(value))
}

fn cast_int(flag: &Flag, raw: RawValue<'_>) -> Result<FlagValue, UsageError> {
    let value = match raw {
        RawValue::Native(FlagValue::Int(i)) => i,
        RawValue::Text(text) => text
            .trim()
            .parse::<i64>()
            .map_err(|_| invalid(flag, text))?,
        RawValue::Native(_) => return Err(wrong_kind(flag)),
    };
    run_validator(flag, FlagValue::Int(value))
}

fn cast_duration(flag: &Flag, raw: RawValue<'_>) -> Result<FlagValue, UsageError> {
    match raw {
        RawValue::Native(FlagValue::Duration(d)) => Ok(FlagValue::Duration(d)),
        RawValue::Text(text) => parse_duration(text.trim())
            .map(FlagValue::Duration)
            .ok_or_else(|| invalid(flag, text)),
        RawValue::Native(_) => Err(wrong_kind(flag)),
    }
}

fn cast_string_list(flag: &Flag, raw: RawValue<'_>) -> Result<FlagValue, UsageError> {
    match raw {
        RawValue::Native(FlagValue::StringList(v)) => Ok(FlagValue::StringList(v)),
        RawValue::Text(text) => Ok(FlagValue::StringList(split_list(text))),
        RawValue::Native(_) => Err(wrong_kind(flag)),
    }
}

fn cast_int_list(flag: &Flag, raw: RawValue<'_>) -> Result<FlagValue, UsageError> {
    match raw {
        RawValue::Native(FlagValue::IntList(v)) => Ok(FlagValue::IntList(v)),
        RawValue::Text(text) => split_list(text)
            .into_iter()
            .map(|item| {
                item.parse::<i64>()
                    .map_err(|_| UsageError::InvalidListElement {
                        flag: flag.name().to_string(),
                        value: item.clone(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(FlagValue::IntList),
        RawValue::Native(_) => Err(wrong_kind(flag)),
    }
}

/// Splits a comma-separated value, trimming each element. Blank input yields no elements.
pub fn split_list(text: &str) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }
    text.split(LIST_SEPARATOR)
        .map(|part| part.trim().to_string())
        .collect()
}

/// Parses a duration literal: a sequence of decimal numbers, each with an
/// optional fraction and a unit suffix (`ns`, `us`/`µs`, `ms`, `s`, `m`, `h`),
/// such as `300ms`, `1.5h` or `2h45m`. A bare `0` is accepted. Negative
/// durations are rejected.
pub fn parse_duration(text: &str) -> Option<Duration> {
    let unsigned = text.strip_prefix('+').unwrap_or(text);
    if unsigned == "0" {
        return Some(Duration::ZERO);
    }
    if unsigned.is_empty() {
        return None;
    }

    let mut total: u128 = 0;
    let mut rest = unsigned;
    while !rest.is_empty() {
        let caps = DURATION_SEGMENT_RE.captures(rest)?;
        let whole = caps.get(1).map_or("", |m| m.as_str());
        let fraction = caps.get(2).map_or("", |m| m.as_str());
        if whole.is_empty() && fraction.is_empty() {
            return None;
        }
        let unit = unit_nanos(caps.get(3).map_or("", |m| m.as_str()))?;

        let whole_value: u128 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
        let mut nanos = whole_value.checked_mul(unit)?;
        if !fraction.is_empty() {
            let digits = fraction.get(..MAX_FRACTION_DIGITS).unwrap_or(fraction);
            let numerator: u128 = digits.parse().ok()?;
            let scale = 10u128.checked_pow(u32::try_from(digits.len()).ok()?)?;
            nanos = nanos.checked_add(numerator.checked_mul(unit)? / scale)?;
        }
        total = total.checked_add(nanos)?;

        let consumed = caps.get(0).map_or(0, |m| m.end());
        rest = rest.get(consumed..)?;
    }

    Some(Duration::from_nanos(u64::try_from(total).ok()?))
}

fn unit_nanos(unit: &str) -> Option<u128> {
    match unit {
        "ns" => Some(1),
        "us" | "µs" | "μs" => Some(NANOS_PER_MICRO),
        "ms" => Some(NANOS_PER_MILLI),
        "s" => Some(NANOS_PER_SEC),
        "m" => Some(60 * NANOS_PER_SEC),
        "h" => Some(3_600 * NANOS_PER_SEC),
        _ => None,
    }
}
