//! Duration literals such as `300ms`, `1h30m` or `1.5s`.

use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;

const NANOS_PER_MICRO: u64 = 1_000;
const NANOS_PER_MILLI: u64 = 1_000_000;
const NANOS_PER_SEC: u64 = 1_000_000_000;

// "ms" must precede "m" and "s" in the alternation.
static SEGMENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([0-9]*)(?:\.([0-9]*))?(ns|us|\x{b5}s|\x{3bc}s|ms|s|m|h)").expect("valid regex")
});

fn unit_nanos(unit: &str) -> u64 {
    match unit {
        "ns" => 1,
        "ms" => NANOS_PER_MILLI,
        "s" => NANOS_PER_SEC,
        "m" => 60 * NANOS_PER_SEC,
        "h" => 3_600 * NANOS_PER_SEC,
        // us, µs and μs
        _ => NANOS_PER_MICRO,
    }
}

/// Parses a sequence of decimal numbers, each with an optional fraction and a
/// unit suffix. A bare `0` is accepted; negative values are not.
pub fn parse_duration(input: &str) -> Option<Duration> {
    let s = input.strip_prefix('+').unwrap_or(input);
    if s == "0" {
        return Some(Duration::ZERO);
    }
    if s.is_empty() {
        return None;
    }

    let mut rest = s;
    let mut total: u64 = 0;
    while !rest.is_empty() {
        let caps = SEGMENT_RE.captures(rest)?;
        let whole = caps.get(1).map_or("", |m| m.as_str());
        let frac = caps.get(2).map_or("", |m| m.as_str());
        if whole.is_empty() && frac.is_empty() {
            return None;
        }
        let unit = unit_nanos(caps.get(3).map_or("", |m| m.as_str()));

        let whole_val: u64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
        let mut nanos = whole_val.checked_mul(unit)?;
        if !frac.is_empty() {
            // Digits beyond nanosecond precision carry no weight.
            let digits = &frac[..frac.len().min(18)];
            let frac_val: u128 = digits.parse().ok()?;
            let scale = 10u128.pow(u32::try_from(digits.len()).ok()?);
            let frac_nanos = u64::try_from(frac_val * u128::from(unit) / scale).ok()?;
            nanos = nanos.checked_add(frac_nanos)?;
        }
        total = total.checked_add(nanos)?;
        rest = &rest[caps.get(0)?.end()..];
    }
    Some(Duration::from_nanos(total))
}

fn format_fraction(value: u64, unit: u64) -> String {
    let whole = value / unit;
    let rem = value % unit;
    if rem == 0 {
        return whole.to_string();
    }
    let width = unit.to_string().len() - 1;
    let digits = format!("{:0width$}", rem, width = width);
    format!("{}.{}", whole, digits.trim_end_matches('0'))
}

/// Renders a duration the way `parse_duration` reads it back, e.g. `1m30s`.
pub fn format_duration(d: Duration) -> String {
    let nanos = u64::try_from(d.as_nanos()).unwrap_or(u64::MAX);
    if nanos == 0 {
        return "0s".to_string();
    }
    if nanos < NANOS_PER_MICRO {
        return format!("{}ns", nanos);
    }
    if nanos < NANOS_PER_MILLI {
        return format!("{}\u{b5}s", format_fraction(nanos, NANOS_PER_MICRO));
    }
    if nanos < NANOS_PER_SEC {
        return format!("{}ms", format_fraction(nanos, NANOS_PER_MILLI));
    }

    let secs = nanos / NANOS_PER_SEC;
    let hours = secs / 3_600;
    let minutes = (secs % 3_600) / 60;
    let seconds = format_fraction(nanos % (60 * NANOS_PER_SEC), NANOS_PER_SEC);
    let mut out = String::new();
    if hours > 0 {
        out.push_str(&format!("{}h", hours));
    }
    if hours > 0 || minutes > 0 {
        out.push_str(&format!("{}m", minutes));
    }
    out.push_str(&seconds);
    out.push('s');
    out
}
