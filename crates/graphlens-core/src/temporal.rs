//! # Temporal Values
//!
//! Date, time, datetime and duration values as returned by the graph store,
//! together with their canonical ISO-8601 text form.
//!
//! The canonical text is what the value serializer emits. Parsing the
//! canonical text of a value with [`TemporalValue::parse`] yields an equal
//! value.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat};
use std::fmt;
use thiserror::Error;

const NANOS_PER_SECOND: i128 = 1_000_000_000;
const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S%.f";
const LOCAL_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Failure to parse temporal text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {kind} value '{text}'")]
pub struct TemporalParseError {
    pub kind: TemporalKind,
    pub text: String,
}

impl TemporalParseError {
    fn new(kind: TemporalKind, text: &str) -> Self {
        Self {
            kind,
            text: text.to_string(),
        }
    }
}

/// The temporal type families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemporalKind {
    Date,
    Time,
    LocalTime,
    DateTime,
    LocalDateTime,
    Duration,
}

impl fmt::Display for TemporalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Date => "date",
            Self::Time => "time",
            Self::LocalTime => "local time",
            Self::DateTime => "datetime",
            Self::LocalDateTime => "local datetime",
            Self::Duration => "duration",
        };
        f.write_str(name)
    }
}

// =============================================================================
// TEMPORAL VALUE
// =============================================================================

/// A temporal value.
#[derive(Debug, Clone, PartialEq)]
pub enum TemporalValue {
    Date(NaiveDate),
    /// Time of day with a UTC offset.
    Time {
        time: NaiveTime,
        offset: FixedOffset,
    },
    LocalTime(NaiveTime),
    /// Instant with offset, optionally carrying the named zone it was created in.
    DateTime {
        value: DateTime<FixedOffset>,
        zone: Option<String>,
    },
    LocalDateTime(NaiveDateTime),
    Duration(IsoDuration),
}

impl TemporalValue {
    #[must_use]
    pub fn kind(&self) -> TemporalKind {
        match self {
            Self::Date(_) => TemporalKind::Date,
            Self::Time { .. } => TemporalKind::Time,
            Self::LocalTime(_) => TemporalKind::LocalTime,
            Self::DateTime { .. } => TemporalKind::DateTime,
            Self::LocalDateTime(_) => TemporalKind::LocalDateTime,
            Self::Duration(_) => TemporalKind::Duration,
        }
    }

    /// Canonical ISO-8601 text of the value.
    #[must_use]
    pub fn to_canonical(&self) -> String {
        match self {
            Self::Date(d) => d.format(DATE_FORMAT).to_string(),
            Self::Time { time, offset } => {
                format!("{}{}", time.format(TIME_FORMAT), format_offset(*offset))
            }
            Self::LocalTime(t) => t.format(TIME_FORMAT).to_string(),
            Self::DateTime { value, zone } => {
                let base = value.to_rfc3339_opts(SecondsFormat::AutoSi, false);
                match zone {
                    Some(zone) => format!("{base}[{zone}]"),
                    None => base,
                }
            }
            Self::LocalDateTime(dt) => dt.format(LOCAL_DATETIME_FORMAT).to_string(),
            Self::Duration(d) => d.to_canonical(),
        }
    }

    /// Parse ISO-8601 text of the given kind.
    pub fn parse(kind: TemporalKind, text: &str) -> Result<Self, TemporalParseError> {
        let err = || TemporalParseError::new(kind, text);
        match kind {
            TemporalKind::Date => NaiveDate::parse_from_str(text, DATE_FORMAT)
                .map(Self::Date)
                .map_err(|_| err()),
            TemporalKind::LocalTime => NaiveTime::parse_from_str(text, TIME_FORMAT)
                .map(Self::LocalTime)
                .map_err(|_| err()),
            TemporalKind::Time => {
                let split = text.rfind(['+', '-', 'Z']).ok_or_else(err)?;
                let (time_part, offset_part) = text.split_at(split);
                let time = NaiveTime::parse_from_str(time_part, TIME_FORMAT).map_err(|_| err())?;
                let offset = parse_offset(offset_part).ok_or_else(err)?;
                Ok(Self::Time { time, offset })
            }
            TemporalKind::DateTime => {
                let (instant, zone) = match text.split_once('[') {
                    Some((instant, rest)) => {
                        let zone = rest.strip_suffix(']').ok_or_else(err)?;
                        (instant, Some(zone.to_string()))
                    }
                    None => (text, None),
                };
                let value = DateTime::parse_from_rfc3339(instant).map_err(|_| err())?;
                Ok(Self::DateTime { value, zone })
            }
            TemporalKind::LocalDateTime => {
                NaiveDateTime::parse_from_str(text, LOCAL_DATETIME_FORMAT)
                    .map(Self::LocalDateTime)
                    .map_err(|_| err())
            }
            TemporalKind::Duration => IsoDuration::parse(text).map(Self::Duration),
        }
    }
}

impl fmt::Display for TemporalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_canonical())
    }
}

fn format_offset(offset: FixedOffset) -> String {
    let total = offset.local_minus_utc();
    let sign = if total < 0 { '-' } else { '+' };
    let abs = total.unsigned_abs();
    let (hours, minutes, seconds) = (abs / 3600, (abs % 3600) / 60, abs % 60);
    if seconds == 0 {
        format!("{sign}{hours:02}:{minutes:02}")
    } else {
        format!("{sign}{hours:02}:{minutes:02}:{seconds:02}")
    }
}

fn parse_offset(text: &str) -> Option<FixedOffset> {
    if text == "Z" {
        return FixedOffset::east_opt(0);
    }
    let (sign, rest) = match text.as_bytes().first()? {
        b'+' => (1, &text[1..]),
        b'-' => (-1, &text[1..]),
        _ => return None,
    };
    let mut parts = rest.split(':');
    let hours: i32 = parts.next()?.parse().ok()?;
    let minutes: i32 = parts.next().map_or(Some(0), |m| m.parse().ok())?;
    let seconds: i32 = parts.next().map_or(Some(0), |s| s.parse().ok())?;
    if parts.next().is_some() {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60 + seconds))
}

// =============================================================================
// DURATION
// =============================================================================

/// A calendar duration as modelled by graph stores: months, days, seconds and
/// nanoseconds kept apart because months and days have no fixed length.
///
/// `nanoseconds` is always normalized into `0..1_000_000_000`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct IsoDuration {
    pub months: i64,
    pub days: i64,
    pub seconds: i64,
    pub nanoseconds: i32,
}

impl IsoDuration {
    /// Create a duration, carrying excess or negative nanoseconds into seconds.
    #[must_use]
    pub fn new(months: i64, days: i64, seconds: i64, nanoseconds: i64) -> Self {
        let total = i128::from(seconds) * NANOS_PER_SECOND + i128::from(nanoseconds);
        Self::from_parts(months, days, total)
    }

    fn from_parts(months: i64, days: i64, total_nanos: i128) -> Self {
        Self {
            months,
            days,
            seconds: total_nanos.div_euclid(NANOS_PER_SECOND) as i64,
            nanoseconds: total_nanos.rem_euclid(NANOS_PER_SECOND) as i32,
        }
    }

    fn total_nanos(&self) -> i128 {
        i128::from(self.seconds) * NANOS_PER_SECOND + i128::from(self.nanoseconds)
    }

    /// Canonical form: `P[nY][nM][nD][T[nH][nM][n[.f]S]]`, `PT0S` for zero.
    #[must_use]
    pub fn to_canonical(&self) -> String {
        let mut out = String::from("P");
        let (years, months) = (self.months / 12, self.months % 12);
        if years != 0 {
            out.push_str(&format!("{years}Y"));
        }
        if months != 0 {
            out.push_str(&format!("{months}M"));
        }
        if self.days != 0 {
            out.push_str(&format!("{}D", self.days));
        }

        let total = self.total_nanos();
        if total == 0 && out.len() > 1 {
            return out;
        }

        out.push('T');
        let sign = if total < 0 { "-" } else { "" };
        let abs = total.unsigned_abs();
        let secs = abs / NANOS_PER_SECOND.unsigned_abs();
        let frac = abs % NANOS_PER_SECOND.unsigned_abs();
        let (hours, minutes, seconds) = (secs / 3600, (secs % 3600) / 60, secs % 60);
        if hours != 0 {
            out.push_str(&format!("{sign}{hours}H"));
        }
        if minutes != 0 {
            out.push_str(&format!("{sign}{minutes}M"));
        }
        if seconds != 0 || frac != 0 || (hours == 0 && minutes == 0) {
            out.push_str(&format!("{sign}{seconds}"));
            if frac != 0 {
                let digits = format!("{frac:09}");
                out.push('.');
                out.push_str(digits.trim_end_matches('0'));
            }
            out.push('S');
        }
        out
    }

    /// Parse an ISO-8601 duration (`PnYnMnWnDTnHnMn.nS`, signed components allowed).
    pub fn parse(text: &str) -> Result<Self, TemporalParseError> {
        let err = || TemporalParseError::new(TemporalKind::Duration, text);
        let body = text.strip_prefix('P').ok_or_else(err)?;
        if body.is_empty() {
            return Err(err());
        }

        let (date_part, time_part) = match body.split_once('T') {
            Some((date, time)) if !time.is_empty() => (date, Some(time)),
            Some(_) => return Err(err()),
            None => (body, None),
        };

        let mut months: i64 = 0;
        let mut days: i64 = 0;
        let mut nanos: i128 = 0;

        for (number, designator) in components(date_part).ok_or_else(err)? {
            if number.fraction.is_some() {
                return Err(err());
            }
            let value = number.whole_signed();
            match designator {
                'Y' => months = months.checked_add(value.checked_mul(12).ok_or_else(err)?).ok_or_else(err)?,
                'M' => months = months.checked_add(value).ok_or_else(err)?,
                'W' => days = days.checked_add(value.checked_mul(7).ok_or_else(err)?).ok_or_else(err)?,
                'D' => days = days.checked_add(value).ok_or_else(err)?,
                _ => return Err(err()),
            }
        }

        if let Some(time_part) = time_part {
            for (number, designator) in components(time_part).ok_or_else(err)? {
                let unit: i128 = match designator {
                    'H' => 3600,
                    'M' => 60,
                    'S' => 1,
                    _ => return Err(err()),
                };
                if number.fraction.is_some() && designator != 'S' {
                    return Err(err());
                }
                nanos += number.nanos_signed() * unit;
            }
        }

        Ok(Self::from_parts(months, days, nanos))
    }
}

/// One signed numeric component of a duration.
struct DurationNumber {
    negative: bool,
    whole: i64,
    /// Fraction already scaled to nanoseconds.
    fraction: Option<i128>,
}

impl DurationNumber {
    fn whole_signed(&self) -> i64 {
        if self.negative { -self.whole } else { self.whole }
    }

    fn nanos_signed(&self) -> i128 {
        let magnitude = i128::from(self.whole) * NANOS_PER_SECOND + self.fraction.unwrap_or(0);
        if self.negative { -magnitude } else { magnitude }
    }
}

/// Split `1Y-2M3D` into `[(1,'Y'), (-2,'M'), (3,'D')]`.
fn components(text: &str) -> Option<Vec<(DurationNumber, char)>> {
    let mut out = Vec::new();
    let mut rest = text;
    while !rest.is_empty() {
        let end = rest.find(|c: char| c.is_ascii_alphabetic())?;
        let (number, tail) = rest.split_at(end);
        let designator = tail.chars().next()?;
        out.push((parse_number(number)?, designator));
        rest = &tail[designator.len_utf8()..];
    }
    Some(out)
}

fn parse_number(text: &str) -> Option<DurationNumber> {
    let (negative, unsigned) = match text.as_bytes().first()? {
        b'-' => (true, &text[1..]),
        b'+' => (false, &text[1..]),
        _ => (false, text),
    };
    let (whole, fraction) = match unsigned.split_once(['.', ',']) {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (unsigned, None),
    };
    if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let whole: i64 = whole.parse().ok()?;
    let fraction = match fraction {
        Some(f) if !f.is_empty() && f.bytes().all(|b| b.is_ascii_digit()) => {
            let digits: String = f.chars().chain(std::iter::repeat('0')).take(9).collect();
            Some(digits.parse::<i128>().ok()?)
        }
        Some(_) => return None,
        None => None,
    };
    Some(DurationNumber {
        negative,
        whole,
        fraction,
    })
}

// =============================================================================
// TESTS
// =============================================================================
