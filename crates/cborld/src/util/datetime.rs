//! XML Schema date and dateTime parsing and formatting.
//!
//! Only the canonical UTC forms are handled, since only those can be
//! compressed to epoch seconds and restored byte-for-byte:
//! - Date: `YYYY-MM-DD`, as days since Unix epoch
//! - DateTime: `YYYY-MM-DDTHH:MM:SSZ` or `YYYY-MM-DDTHH:MM:SS.mmmZ`, as
//!   seconds since Unix epoch plus optional milliseconds

const SECONDS_PER_MINUTE: i64 = 60;
const SECONDS_PER_HOUR: i64 = 60 * SECONDS_PER_MINUTE;
pub const SECONDS_PER_DAY: i64 = 24 * SECONDS_PER_HOUR;

/// Error type for date/time parsing failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateTimeParseError {
    pub message: String,
}

impl std::fmt::Display for DateTimeParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for DateTimeParseError {}

fn parse_error(kind: &str, input: &str) -> DateTimeParseError {
    DateTimeParseError {
        message: format!("Invalid {}: {}", kind, input),
    }
}

/// Returns true if the given year is a leap year.
fn is_leap_year(year: i64) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}

/// Returns the number of days in a given month (1-indexed).
fn days_in_month(year: i64, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        _ => 0,
    }
}

/// Calculates days since Unix epoch for a given date.
fn date_to_days(year: i64, month: u32, day: u32) -> i64 {
    // Howard Hinnant's days_from_civil
    let y = if month <= 2 { year - 1 } else { year };
    let m = if month <= 2 {
        month as i64 + 9
    } else {
        month as i64 - 3
    };

    let era = if y >= 0 { y } else { y - 399 } / 400;
    let yoe = y - era * 400; // year of era
    let doy = (153 * m + 2) / 5 + day as i64 - 1; // day of year
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy; // day of era

    era * 146097 + doe - 719468
}

/// Converts days since Unix epoch to (year, month, day).
fn days_to_date(days: i64) -> (i64, u32, u32) {
    let z = days + 719468;
    let era = if z >= 0 { z } else { z - 146096 } / 146097;
    let doe = z - era * 146097; // day of era
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365; // year of era
    let y = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100); // day of year
    let mp = (5 * doy + 2) / 153; // month index
    let d = (doy - (153 * mp + 2) / 5 + 1) as u32; // day
    let m = if mp < 10 { mp + 3 } else { mp - 9 } as u32; // month

    let year = if m <= 2 { y + 1 } else { y };
    (year, m, d)
}

fn parse_digits(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Parses `YYYY-MM-DD` into days since Unix epoch.
fn parse_date_part(s: &str) -> Option<i64> {
    if !s.is_ascii() || s.len() != 10 || s.as_bytes()[4] != b'-' || s.as_bytes()[7] != b'-' {
        return None;
    }
    let year = parse_digits(&s[..4])? as i64;
    let month = parse_digits(&s[5..7])?;
    let day = parse_digits(&s[8..10])?;
    if !(1..=12).contains(&month) || day < 1 || day > days_in_month(year, month) {
        return None;
    }
    Some(date_to_days(year, month, day))
}

fn format_date_part(days: i64) -> Option<String> {
    let (year, month, day) = days_to_date(days);
    if !(0..=9999).contains(&year) {
        return None;
    }
    Some(format!("{:04}-{:02}-{:02}", year, month, day))
}

// =====================
// DATE functions
// =====================

/// Parses a canonical `xsd:date` (`YYYY-MM-DD`, no timezone) and returns
/// days since Unix epoch.
pub fn parse_xsd_date(date_str: &str) -> Result<i64, DateTimeParseError> {
    parse_date_part(date_str).ok_or_else(|| parse_error("xsd:date", date_str))
}

/// Formats days since Unix epoch as `YYYY-MM-DD`. Years outside 0000-9999
/// have no canonical four-digit form and yield `None`.
pub fn format_xsd_date(days: i64) -> Option<String> {
    format_date_part(days)
}

// =====================
// DATETIME functions
// =====================

/// A UTC instant with optional millisecond precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UtcDateTime {
    /// Seconds since Unix epoch.
    pub seconds: i64,
    /// Milliseconds within the second, when written in the source string.
    pub millis: Option<u16>,
}

/// Parses a canonical UTC `xsd:dateTime`.
pub fn parse_xsd_datetime(datetime_str: &str) -> Result<UtcDateTime, DateTimeParseError> {
    let err = || parse_error("xsd:dateTime", datetime_str);

    let body = datetime_str.strip_suffix('Z').ok_or_else(err)?;
    if !body.is_ascii() || body.len() < 19 || body.as_bytes()[10] != b'T' {
        return Err(err());
    }
    let days = parse_date_part(&body[..10]).ok_or_else(err)?;

    let time = &body[11..19];
    if time.as_bytes()[2] != b':' || time.as_bytes()[5] != b':' {
        return Err(err());
    }
    let hours = parse_digits(&time[..2]).ok_or_else(err)? as i64;
    let minutes = parse_digits(&time[3..5]).ok_or_else(err)? as i64;
    let seconds = parse_digits(&time[6..8]).ok_or_else(err)? as i64;
    if hours > 23 || minutes > 59 || seconds > 59 {
        return Err(err());
    }

    let millis = match &body[19..] {
        "" => None,
        frac => {
            let digits = frac.strip_prefix('.').ok_or_else(err)?;
            if digits.len() != 3 {
                return Err(err());
            }
            Some(parse_digits(digits).ok_or_else(err)? as u16)
        }
    };

    Ok(UtcDateTime {
        seconds: days * SECONDS_PER_DAY + hours * SECONDS_PER_HOUR + minutes * SECONDS_PER_MINUTE + seconds,
        millis,
    })
}

/// Formats a UTC instant as `YYYY-MM-DDTHH:MM:SS[.mmm]Z`.
pub fn format_xsd_datetime(datetime: UtcDateTime) -> Option<String> {
    if datetime.millis.is_some_and(|ms| ms > 999) {
        return None;
    }
    let days = datetime.seconds.div_euclid(SECONDS_PER_DAY);
    let secs_of_day = datetime.seconds.rem_euclid(SECONDS_PER_DAY);
    let date = format_date_part(days)?;

    let hours = secs_of_day / SECONDS_PER_HOUR;
    let minutes = (secs_of_day % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE;
    let seconds = secs_of_day % SECONDS_PER_MINUTE;
    let frac = match datetime.millis {
        Some(ms) => format!(".{:03}", ms),
        None => String::new(),
    };
    Some(format!("{}T{:02}:{:02}:{:02}{}Z", date, hours, minutes, seconds, frac))
}
