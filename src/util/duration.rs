use std::time::Duration;
use thiserror::Error;

/// Errors produced while parsing an interval such as `"1m30s"`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DurationError {
    #[error("empty duration")]
    Empty,
    /// A leading `-`; the scrape interval must move forward in time.
    #[error("negative duration: {0}")]
    Negative(String),
    #[error("invalid number in duration: {0}")]
    InvalidNumber(String),
    #[error("missing unit in duration: {0} (expected one of ns, us, ms, s, m, h)")]
    MissingUnit(String),
    #[error("unknown unit '{unit}' in duration: {input}")]
    UnknownUnit { unit: String, input: String },
    #[error("duration must be greater than zero: {0}")]
    Zero(String),
    #[error("duration out of range: {0}")]
    Overflow(String),
}

const NANOS_PER_MICRO: u128 = 1_000;
const NANOS_PER_MILLI: u128 = 1_000_000;
const NANOS_PER_SEC: u128 = 1_000_000_000;

fn unit_nanos(unit: &str) -> Option<u128> {
    match unit {
        "ns" => Some(1),
        "us" | "µs" | "μs" => Some(NANOS_PER_MICRO),
        "ms" => Some(NANOS_PER_MILLI),
        "s" => Some(NANOS_PER_SEC),
        "m" => Some(60 * NANOS_PER_SEC),
        "h" => Some(3600 * NANOS_PER_SEC),
        _ => None,
    }
}

/// Parses a duration string made of number/unit pairs: `"30s"`, `"1m"`,
/// `"1h30m"`, `"1.5h"`, `"250ms"`.
///
/// Accepted units are `ns`, `us` (`µs`), `ms`, `s`, `m` and `h`. Numbers may
/// carry a decimal fraction. A unit is required after every number. An optional
/// leading `+` is accepted; zero and negative durations are rejected because a
/// ticker cannot run on them.
///
/// # Examples
///
/// ```
/// use gator::util::parse_duration;
/// use std::time::Duration;
///
/// assert_eq!(parse_duration("1m").unwrap(), Duration::from_secs(60));
/// assert_eq!(parse_duration("1h30m").unwrap(), Duration::from_secs(5400));
/// assert!(parse_duration("10").is_err());
/// ```
pub fn parse_duration(input: &str) -> Result<Duration, DurationError> {
    let s = input.trim();
    if s.is_empty() {
        return Err(DurationError::Empty);
    }
    if s.starts_with('-') {
        return Err(DurationError::Negative(input.to_owned()));
    }
    let mut rest = s.strip_prefix('+').unwrap_or(s);
    if rest.is_empty() {
        return Err(DurationError::InvalidNumber(input.to_owned()));
    }

    let overflow = || DurationError::Overflow(input.to_owned());
    let mut total: u128 = 0;

    while !rest.is_empty() {
        // Integer part
        let int_len = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        let (int_digits, after_int) = rest.split_at(int_len);

        // Optional fraction
        let (frac_digits, after_frac) = match after_int.strip_prefix('.') {
            Some(frac) => {
                let frac_len = frac.find(|c: char| !c.is_ascii_digit()).unwrap_or(frac.len());
                frac.split_at(frac_len)
            }
            None => ("", after_int),
        };
        if int_digits.is_empty() && frac_digits.is_empty() {
            return Err(DurationError::InvalidNumber(input.to_owned()));
        }

        // Unit runs until the next digit or '.'
        let unit_len = after_frac
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(after_frac.len());
        let (unit, next) = after_frac.split_at(unit_len);
        if unit.is_empty() {
            return Err(DurationError::MissingUnit(input.to_owned()));
        }
        let scale = unit_nanos(unit).ok_or_else(|| DurationError::UnknownUnit {
            unit: unit.to_owned(),
            input: input.to_owned(),
        })?;

        let whole: u128 = if int_digits.is_empty() {
            0
        } else {
            int_digits.parse().map_err(|_| overflow())?
        };
        let mut nanos = whole.checked_mul(scale).ok_or_else(overflow)?;

        if !frac_digits.is_empty() {
            // Digits beyond nanosecond precision cannot change the result
            let kept = &frac_digits[..frac_digits.len().min(18)];
            let numerator: u128 = kept.parse().map_err(|_| overflow())?;
            let denominator = 10u128.pow(kept.len() as u32);
            nanos = nanos
                .checked_add(numerator * scale / denominator)
                .ok_or_else(overflow)?;
        }

        total = total.checked_add(nanos).ok_or_else(overflow)?;
        rest = next;
    }

    if total == 0 {
        return Err(DurationError::Zero(input.to_owned()));
    }
    let total = u64::try_from(total).map_err(|_| overflow())?;
    Ok(Duration::from_nanos(total))
}

/// Formats a duration the way [`parse_duration`] reads it, e.g. `1h30m0s`,
/// `1m0s`, `250ms`.
pub fn format_duration(d: Duration) -> String {
    if d.is_zero() {
        return "0s".to_string();
    }
    if d < Duration::from_secs(1) {
        let nanos = d.subsec_nanos();
        return if nanos % 1_000_000 == 0 {
            format!("{}ms", nanos / 1_000_000)
        } else if nanos % 1_000 == 0 {
            format!("{}us", nanos / 1_000)
        } else {
            format!("{}ns", nanos)
        };
    }

    let secs = d.as_secs();
    let (hours, minutes, seconds) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    let subsec = d.subsec_nanos();
    let seconds = if subsec == 0 {
        format!("{}s", seconds)
    } else {
        let frac = format!("{:09}", subsec);
        format!("{}.{}s", seconds, frac.trim_end_matches('0'))
    };

    match (hours, minutes) {
        (0, 0) => seconds,
        (0, m) => format!("{}m{}", m, seconds),
        (h, m) => format!("{}h{}m{}", h, m, seconds),
    }
}
