//! DateTime encoding (Spec 7.1.8).
//!
//! Supports all eight XML Schema date-time types as defined in Table 7-4.
//! Each type encodes a subset of the components Year, MonthDay, Time,
//! FractionalSecs, and TimeZone according to Table 7-3:
//! - Year: Integer, offset from 2000
//! - MonthDay: 9-bit unsigned, month * 32 + day
//! - Time: 17-bit unsigned, ((hour * 64) + minute) * 64 + second
//! - FractionalSecs: presence Boolean, then Unsigned Integer with the
//!   digits in reverse order (preserves leading zeros)
//! - TimeZone: presence Boolean, then 11-bit unsigned offset from -14:00,
//!   hours * 64 + minutes + 896

use std::cell::OnceCell;
use std::fmt;

use crate::bitstream::{BitReader, BitWriter};
use crate::{Error, Result, boolean, integer, n_bit_unsigned_integer, unsigned_integer};

/// The XML Schema date-time type that selects the encoded components.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateTimeKind {
    GYear,
    GYearMonth,
    Date,
    DateTime,
    GMonth,
    GMonthDay,
    GDay,
    Time,
}

impl DateTimeKind {
    fn has_year(self) -> bool {
        matches!(
            self,
            Self::GYear | Self::GYearMonth | Self::Date | Self::DateTime
        )
    }

    fn has_month_day(self) -> bool {
        matches!(
            self,
            Self::GYearMonth
                | Self::Date
                | Self::DateTime
                | Self::GMonth
                | Self::GMonthDay
                | Self::GDay
        )
    }

    fn has_time(self) -> bool {
        matches!(self, Self::DateTime | Self::Time)
    }
}

/// An EXI date-time value (Spec 7.1.8).
///
/// One struct covers all eight kinds; components not carried by the kind
/// hold their sentinel (0). The year is absolute, the wire format stores it
/// as an offset from 2000. Two values compare equal when their fields match
/// or when they denote the same instant after timezone normalization.
#[derive(Debug, Clone)]
pub struct DateTime {
    kind: DateTimeKind,
    year: i64,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,
    /// Sekundenbruchteile mit Ziffern in umgekehrter Reihenfolge, nie Some(0).
    fractional_secs: Option<u64>,
    timezone_minutes: Option<i16>,
    lexical: OnceCell<Box<str>>,
}

/// Days per month with Gregorian leap handling; `year` None means the
/// year-less types (gMonthDay), where February 29 is always admissible.
fn days_in_month(year: Option<i64>, month: u8) -> u8 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => match year {
            Some(y) if !(y % 4 == 0 && (y % 100 != 0 || y % 400 == 0)) => 28,
            _ => 29,
        },
        _ => 0,
    }
}

fn check_month(month: u8) -> Result<()> {
    if (1..=12).contains(&month) {
        Ok(())
    } else {
        Err(Error::invalid_value(format!("month {month} out of range 1-12")))
    }
}

fn check_day(year: Option<i64>, month: u8, day: u8) -> Result<()> {
    let max = days_in_month(year, month);
    if (1..=max).contains(&day) {
        Ok(())
    } else {
        Err(Error::invalid_value(format!(
            "day {day} out of range 1-{max} for month {month}"
        )))
    }
}

fn check_time(hour: u8, minute: u8, second: u8, fractional_secs: Option<u64>) -> Result<()> {
    if hour > 24 {
        return Err(Error::invalid_value(format!("hour {hour} out of range 0-24")));
    }
    if minute > 59 {
        return Err(Error::invalid_value(format!("minute {minute} out of range 0-59")));
    }
    if second > 60 {
        return Err(Error::invalid_value(format!("second {second} out of range 0-60")));
    }
    if hour == 24 && (minute != 0 || second != 0 || fractional_secs.is_some()) {
        return Err(Error::invalid_value("24:00:00 is the only valid hour-24 time"));
    }
    Ok(())
}

fn check_timezone(tz: Option<i16>) -> Result<()> {
    match tz {
        Some(offset) if !(-840..=840).contains(&offset) => Err(Error::invalid_value(format!(
            "timezone offset {offset} minutes out of range -840..840"
        ))),
        _ => Ok(()),
    }
}

impl DateTime {
    #[allow(clippy::too_many_arguments)]
    fn build(
        kind: DateTimeKind,
        year: i64,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
        fractional_secs: Option<u64>,
        timezone_minutes: Option<i16>,
    ) -> Self {
        Self {
            kind,
            year,
            month,
            day,
            hour,
            minute,
            second,
            fractional_secs: fractional_secs.filter(|&f| f != 0),
            timezone_minutes,
            lexical: OnceCell::new(),
        }
    }

    /// xsd:gYear.
    pub fn g_year(year: i64, timezone_minutes: Option<i16>) -> Result<Self> {
        check_timezone(timezone_minutes)?;
        Ok(Self::build(
            DateTimeKind::GYear,
            year,
            0,
            0,
            0,
            0,
            0,
            None,
            timezone_minutes,
        ))
    }

    /// xsd:gYearMonth. The wire MonthDay component carries day 1.
    pub fn g_year_month(year: i64, month: u8, timezone_minutes: Option<i16>) -> Result<Self> {
        check_month(month)?;
        check_timezone(timezone_minutes)?;
        Ok(Self::build(
            DateTimeKind::GYearMonth,
            year,
            month,
            1,
            0,
            0,
            0,
            None,
            timezone_minutes,
        ))
    }

    /// xsd:date, with calendar validation (leap years included).
    pub fn date(year: i64, month: u8, day: u8, timezone_minutes: Option<i16>) -> Result<Self> {
        check_month(month)?;
        check_day(Some(year), month, day)?;
        check_timezone(timezone_minutes)?;
        Ok(Self::build(
            DateTimeKind::Date,
            year,
            month,
            day,
            0,
            0,
            0,
            None,
            timezone_minutes,
        ))
    }

    /// xsd:dateTime. `fractional_secs` carries the digits reversed; 0 means
    /// no fraction.
    #[allow(clippy::too_many_arguments)]
    pub fn date_time(
        year: i64,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
        fractional_secs: Option<u64>,
        timezone_minutes: Option<i16>,
    ) -> Result<Self> {
        check_month(month)?;
        check_day(Some(year), month, day)?;
        check_time(hour, minute, second, fractional_secs.filter(|&f| f != 0))?;
        check_timezone(timezone_minutes)?;
        Ok(Self::build(
            DateTimeKind::DateTime,
            year,
            month,
            day,
            hour,
            minute,
            second,
            fractional_secs,
            timezone_minutes,
        ))
    }

    /// xsd:gMonth.
    pub fn g_month(month: u8, timezone_minutes: Option<i16>) -> Result<Self> {
        check_month(month)?;
        check_timezone(timezone_minutes)?;
        Ok(Self::build(
            DateTimeKind::GMonth,
            0,
            month,
            0,
            0,
            0,
            0,
            None,
            timezone_minutes,
        ))
    }

    /// xsd:gMonthDay. February 29 is admissible (no year to contradict it).
    pub fn g_month_day(month: u8, day: u8, timezone_minutes: Option<i16>) -> Result<Self> {
        check_month(month)?;
        check_day(None, month, day)?;
        check_timezone(timezone_minutes)?;
        Ok(Self::build(
            DateTimeKind::GMonthDay,
            0,
            month,
            day,
            0,
            0,
            0,
            None,
            timezone_minutes,
        ))
    }

    /// xsd:gDay.
    pub fn g_day(day: u8, timezone_minutes: Option<i16>) -> Result<Self> {
        if !(1..=31).contains(&day) {
            return Err(Error::invalid_value(format!("day {day} out of range 1-31")));
        }
        check_timezone(timezone_minutes)?;
        Ok(Self::build(
            DateTimeKind::GDay,
            0,
            0,
            day,
            0,
            0,
            0,
            None,
            timezone_minutes,
        ))
    }

    /// xsd:time.
    pub fn time(
        hour: u8,
        minute: u8,
        second: u8,
        fractional_secs: Option<u64>,
        timezone_minutes: Option<i16>,
    ) -> Result<Self> {
        check_time(hour, minute, second, fractional_secs.filter(|&f| f != 0))?;
        check_timezone(timezone_minutes)?;
        Ok(Self::build(
            DateTimeKind::Time,
            0,
            0,
            0,
            hour,
            minute,
            second,
            fractional_secs,
            timezone_minutes,
        ))
    }

    #[inline]
    pub fn kind(&self) -> DateTimeKind {
        self.kind
    }

    pub fn year(&self) -> Option<i64> {
        self.kind.has_year().then_some(self.year)
    }

    pub fn month(&self) -> Option<u8> {
        (self.month != 0).then_some(self.month)
    }

    pub fn day(&self) -> Option<u8> {
        (self.day != 0).then_some(self.day)
    }

    pub fn hour(&self) -> Option<u8> {
        self.kind.has_time().then_some(self.hour)
    }

    pub fn minute(&self) -> Option<u8> {
        self.kind.has_time().then_some(self.minute)
    }

    pub fn second(&self) -> Option<u8> {
        self.kind.has_time().then_some(self.second)
    }

    /// Reversed-digit fraction, `None` when there is none.
    #[inline]
    pub fn fractional_secs(&self) -> Option<u64> {
        self.fractional_secs
    }

    #[inline]
    pub fn timezone_minutes(&self) -> Option<i16> {
        self.timezone_minutes
    }

    fn clone_fields(&self) -> Self {
        Self {
            lexical: OnceCell::new(),
            ..self.clone()
        }
    }

    fn same_fields(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.year == other.year
            && self.month == other.month
            && self.day == other.day
            && self.hour == other.hour
            && self.minute == other.minute
            && self.second == other.second
            && self.fractional_secs == other.fractional_secs
            && self.timezone_minutes == other.timezone_minutes
    }

    /// UTC-normalized copy: timezone offsets are folded into the time and
    /// date components, hour 24 becomes 00:00 of the next day. Only the
    /// kinds carrying a time component change.
    pub fn normalized(&self) -> Self {
        let mut dt = self.clone_fields();
        match dt.kind {
            DateTimeKind::DateTime => {
                if dt.hour == 24 {
                    dt.hour = 0;
                    dt.add_days(1);
                }
                if let Some(tz) = dt.timezone_minutes.filter(|&t| t != 0) {
                    let total = dt.hour as i64 * 60 + dt.minute as i64 - tz as i64;
                    dt.hour = (total.rem_euclid(1440) / 60) as u8;
                    dt.minute = (total.rem_euclid(1440) % 60) as u8;
                    dt.add_days(total.div_euclid(1440));
                    dt.timezone_minutes = Some(0);
                }
            }
            DateTimeKind::Time => {
                if dt.hour == 24 {
                    dt.hour = 0;
                }
                if let Some(tz) = dt.timezone_minutes.filter(|&t| t != 0) {
                    let total = dt.hour as i64 * 60 + dt.minute as i64 - tz as i64;
                    let rem = total.rem_euclid(1440);
                    dt.hour = (rem / 60) as u8;
                    dt.minute = (rem % 60) as u8;
                    dt.timezone_minutes = Some(0);
                }
            }
            _ => {}
        }
        dt
    }

    /// Shifts the date by `offset` days with month and year carries.
    fn add_days(&mut self, offset: i64) {
        let mut year = self.year;
        let mut month = self.month;
        let mut day = self.day as i64 + offset;
        while day < 1 {
            month -= 1;
            if month < 1 {
                month = 12;
                year -= 1;
            }
            day += days_in_month(Some(year), month) as i64;
        }
        while day > days_in_month(Some(year), month) as i64 {
            day -= days_in_month(Some(year), month) as i64;
            month += 1;
            if month > 12 {
                month = 1;
                year += 1;
            }
        }
        self.year = year;
        self.month = month;
        self.day = day as u8;
    }

    /// Parses the xsd lexical form of the given kind.
    pub fn from_lexical(kind: DateTimeKind, s: &str) -> Option<Self> {
        let (body, tz) = split_timezone(s)?;
        let dt = match kind {
            DateTimeKind::GYear => Self::g_year(parse_year(body)?, tz),
            DateTimeKind::GYearMonth => {
                let (y, m) = body.rsplit_once('-')?;
                Self::g_year_month(parse_year(y)?, parse_two_digits(m)?, tz)
            }
            DateTimeKind::Date => {
                let (year, month, day) = parse_date(body)?;
                Self::date(year, month, day, tz)
            }
            DateTimeKind::DateTime => {
                let (date_part, time_part) = body.split_once('T')?;
                let (year, month, day) = parse_date(date_part)?;
                let (hour, minute, second, frac) = parse_time(time_part)?;
                Self::date_time(year, month, day, hour, minute, second, frac, tz)
            }
            DateTimeKind::GMonth => Self::g_month(parse_two_digits(body.strip_prefix("--")?)?, tz),
            DateTimeKind::GMonthDay => {
                let (m, d) = body.strip_prefix("--")?.split_once('-')?;
                Self::g_month_day(parse_two_digits(m)?, parse_two_digits(d)?, tz)
            }
            DateTimeKind::GDay => Self::g_day(parse_two_digits(body.strip_prefix("---")?)?, tz),
            DateTimeKind::Time => {
                let (hour, minute, second, frac) = parse_time(body)?;
                Self::time(hour, minute, second, frac, tz)
            }
        };
        dt.ok()
    }

    /// Canonical lexical form, built once and memoized.
    pub fn lexical(&self) -> &str {
        self.lexical.get_or_init(|| {
            let mut s = String::new();
            match self.kind {
                DateTimeKind::GYear => push_year(&mut s, self.year),
                DateTimeKind::GYearMonth => {
                    push_year(&mut s, self.year);
                    s.push_str(&format!("-{:02}", self.month));
                }
                DateTimeKind::Date => self.push_date(&mut s),
                DateTimeKind::DateTime => {
                    self.push_date(&mut s);
                    s.push('T');
                    self.push_time(&mut s);
                }
                DateTimeKind::GMonth => s.push_str(&format!("--{:02}", self.month)),
                DateTimeKind::GMonthDay => {
                    s.push_str(&format!("--{:02}-{:02}", self.month, self.day));
                }
                DateTimeKind::GDay => s.push_str(&format!("---{:02}", self.day)),
                DateTimeKind::Time => self.push_time(&mut s),
            }
            match self.timezone_minutes {
                None => {}
                Some(0) => s.push('Z'),
                Some(tz) => {
                    let sign = if tz < 0 { '-' } else { '+' };
                    let abs = tz.unsigned_abs();
                    s.push_str(&format!("{sign}{:02}:{:02}", abs / 60, abs % 60));
                }
            }
            s.into_boxed_str()
        })
    }

    fn push_date(&self, s: &mut String) {
        push_year(s, self.year);
        s.push_str(&format!("-{:02}-{:02}", self.month, self.day));
    }

    fn push_time(&self, s: &mut String) {
        s.push_str(&format!(
            "{:02}:{:02}:{:02}",
            self.hour, self.minute, self.second
        ));
        if let Some(frac) = self.fractional_secs {
            s.push('.');
            s.extend(frac.to_string().chars().rev());
        }
    }
}

impl PartialEq for DateTime {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && (self.same_fields(other) || self.normalized().same_fields(&other.normalized()))
    }
}

impl Eq for DateTime {}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.lexical())
    }
}

fn push_year(s: &mut String, year: i64) {
    if year < 0 {
        s.push('-');
    }
    s.push_str(&format!("{:04}", year.unsigned_abs()));
}

/// At least four digits with an optional leading minus.
fn parse_year(s: &str) -> Option<i64> {
    let digits = s.strip_prefix('-').unwrap_or(s);
    if digits.len() < 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

fn parse_two_digits(s: &str) -> Option<u8> {
    if s.len() != 2 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

fn parse_date(s: &str) -> Option<(i64, u8, u8)> {
    let (ym, d) = s.rsplit_once('-')?;
    let (y, m) = ym.rsplit_once('-')?;
    Some((parse_year(y)?, parse_two_digits(m)?, parse_two_digits(d)?))
}

/// `HH:MM:SS` with an optional `.fff` fraction; digits of the fraction come
/// back reversed, trailing zeros dropped.
fn parse_time(s: &str) -> Option<(u8, u8, u8, Option<u64>)> {
    let bytes = s.as_bytes();
    if bytes.len() < 8 || bytes[2] != b':' || bytes[5] != b':' {
        return None;
    }
    let hour = parse_two_digits(&s[0..2])?;
    let minute = parse_two_digits(&s[3..5])?;
    let (sec_str, frac) = match s[6..].split_once('.') {
        Some((sec, frac_digits)) => {
            if frac_digits.is_empty() || !frac_digits.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            let trimmed = frac_digits.trim_end_matches('0');
            let frac = if trimmed.is_empty() {
                None
            } else {
                let reversed: String = trimmed.chars().rev().collect();
                Some(reversed.parse().ok()?)
            };
            (sec, frac)
        }
        None => (&s[6..], None),
    };
    Some((hour, minute, parse_two_digits(sec_str)?, frac))
}

/// Splits a trailing `Z` or `±hh:mm` timezone designator.
fn split_timezone(s: &str) -> Option<(&str, Option<i16>)> {
    if let Some(rest) = s.strip_suffix('Z') {
        return Some((rest, Some(0)));
    }
    if s.len() >= 6 && s.is_char_boundary(s.len() - 6) {
        let (head, tail) = s.split_at(s.len() - 6);
        let b = tail.as_bytes();
        if (b[0] == b'+' || b[0] == b'-') && b[3] == b':' {
            let hours: i16 = parse_two_digits(&tail[1..3])?.into();
            let minutes: i16 = parse_two_digits(&tail[4..6])?.into();
            if hours > 14 || minutes > 59 || (hours == 14 && minutes != 0) {
                return None;
            }
            let mut tz = hours * 60 + minutes;
            if b[0] == b'-' {
                tz = -tz;
            }
            return Some((head, Some(tz)));
        }
    }
    Some((s, None))
}

/// Encodes a date-time value (Spec 7.1.8, Table 7-3).
pub fn encode(writer: &mut BitWriter, value: &DateTime) {
    let kind = value.kind();
    if kind.has_year() {
        integer::encode(writer, value.year - 2000);
    }
    if kind.has_month_day() {
        let month_day = value.month as u64 * 32 + value.day as u64;
        n_bit_unsigned_integer::encode(writer, month_day, 9);
    }
    if kind.has_time() {
        let time =
            ((value.hour as u64) * 64 + value.minute as u64) * 64 + value.second as u64;
        n_bit_unsigned_integer::encode(writer, time, 17);
        boolean::encode(writer, value.fractional_secs.is_some());
        if let Some(frac) = value.fractional_secs {
            unsigned_integer::encode(writer, frac);
        }
    }
    boolean::encode(writer, value.timezone_minutes.is_some());
    if let Some(tz) = value.timezone_minutes {
        let raw = ((tz / 60) as i32 * 64 + (tz % 60) as i32 + 896) as u64;
        n_bit_unsigned_integer::encode(writer, raw, 11);
    }
}

/// Decodes a date-time value of the given kind (Spec 7.1.8, Table 7-3).
pub fn decode(reader: &mut BitReader, kind: DateTimeKind) -> Result<DateTime> {
    let year = if kind.has_year() {
        integer::decode(reader)?
            .checked_add(2000)
            .ok_or(Error::IntegerOverflow)?
    } else {
        0
    };

    let (month, day) = if kind.has_month_day() {
        let value = n_bit_unsigned_integer::decode(reader, 9)?;
        let month = (value / 32) as u8;
        let day = (value % 32) as u8;
        match kind {
            DateTimeKind::GDay if (1..=31).contains(&day) && month == 0 => (0, day),
            DateTimeKind::GMonth if (1..=12).contains(&month) && day == 0 => (month, 0),
            DateTimeKind::GMonthDay
                if (1..=12).contains(&month) && (1..=days_in_month(None, month)).contains(&day) =>
            {
                (month, day)
            }
            DateTimeKind::GYearMonth | DateTimeKind::Date | DateTimeKind::DateTime
                if (1..=12).contains(&month)
                    && (1..=days_in_month(Some(year), month)).contains(&day) =>
            {
                (month, day)
            }
            _ => {
                return Err(Error::invalid_value(format!(
                    "MonthDay component {value} invalid for {kind:?}"
                )));
            }
        }
    } else {
        (0, 0)
    };

    let (hour, minute, second, fractional_secs) = if kind.has_time() {
        let value = n_bit_unsigned_integer::decode(reader, 17)?;
        let second = (value % 64) as u8;
        let minute = ((value / 64) % 64) as u8;
        let hour = (value / 4096) as u8;
        if hour > 24 || minute > 59 || second > 60 || (hour == 24 && (minute != 0 || second != 0)) {
            return Err(Error::invalid_value(format!(
                "Time component {value} out of range"
            )));
        }
        let frac = if boolean::decode(reader)? {
            Some(unsigned_integer::decode(reader)?)
        } else {
            None
        };
        if hour == 24 && frac.is_some_and(|f| f != 0) {
            return Err(Error::invalid_value("fractional seconds past hour 24"));
        }
        (hour, minute, second, frac)
    } else {
        (0, 0, 0, None)
    };

    let timezone_minutes = if boolean::decode(reader)? {
        let raw = n_bit_unsigned_integer::decode(reader, 11)? as i32 - 896;
        let hours = raw / 64;
        let minutes = raw % 64;
        if !(-14..=14).contains(&hours) || !(-59..=59).contains(&minutes) {
            return Err(Error::invalid_value(format!(
                "TimeZone offset {raw} out of range"
            )));
        }
        Some((hours * 60 + minutes) as i16)
    } else {
        None
    };

    Ok(DateTime::build(
        kind,
        year,
        month,
        day,
        hour,
        minute,
        second,
        fractional_secs,
        timezone_minutes,
    ))
}
