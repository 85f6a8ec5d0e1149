//! Calendar date codec.
//!
//! [`Date`] is a plain year/month/day value with no time-of-day or zone. Its only
//! textual form is the zero-padded `YYYY-MM-DD` string, used verbatim on the wire
//! (JSON strings and query parameters) and when handing dates to the database.
//! Parsing is strict: `2023-1-2`, `2023/01/02` or surrounding whitespace are
//! rejected instead of being coerced.

use std::{borrow::Cow, fmt, str::FromStr};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use snafu::{OptionExt, Snafu, ensure};

/// Text that is not a zero-padded `YYYY-MM-DD` calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(display("invalid date {input:?}: expected a zero-padded YYYY-MM-DD calendar date"))]
pub struct DateFormatError {
    input: String,
}

impl DateFormatError {
    /// The rejected input.
    pub fn input(&self) -> &str {
        &self.input
    }
}

/// A calendar date in the range `0000-01-01..=9999-12-31`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Date(NaiveDate);

impl Date {
    /// Builds a date from its components, `None` if the combination does not exist
    /// or the year does not fit in four digits.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        if !(0..=9999).contains(&year) {
            return None;
        }
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// Parses exactly `YYYY-MM-DD`.
    pub fn parse(text: &str) -> Result<Self, DateFormatError> {
        let bytes = text.as_bytes();
        let well_formed = bytes.len() == 10
            && bytes[4] == b'-'
            && bytes[7] == b'-'
            && bytes
                .iter()
                .enumerate()
                .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
        ensure!(well_formed, DateFormatSnafu { input: text });

        // All slices are ASCII digits at this point.
        let year = digits(&bytes[0..4]) as i32;
        let month = digits(&bytes[5..7]);
        let day = digits(&bytes[8..10]);

        Self::from_ymd(year, month, day).context(DateFormatSnafu { input: text })
    }

    /// Canonical `YYYY-MM-DD` text.
    pub fn format(&self) -> String {
        self.to_string()
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }

    /// The same day as a chrono date, for storage layers.
    pub fn as_naive(&self) -> NaiveDate {
        self.0
    }
}

fn digits(ascii: &[u8]) -> u32 {
    ascii
        .iter()
        .fold(0, |acc, b| acc * 10 + u32::from(b - b'0'))
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02}",
            self.0.year(),
            self.0.month(),
            self.0.day()
        )
    }
}

impl FromStr for Date {
    type Err = DateFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<NaiveDate> for Date {
    type Error = DateFormatError;

    fn try_from(value: NaiveDate) -> Result<Self, Self::Error> {
        Self::from_ymd(value.year(), value.month(), value.day())
            .context(DateFormatSnafu { input: value.to_string() })
    }
}

impl From<Date> for NaiveDate {
    fn from(value: Date) -> Self {
        value.0
    }
}

impl Serialize for Date {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Date {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = Cow::<'de, str>::deserialize(deserializer)?;
        Date::parse(&text).map_err(de::Error::custom)
    }
}
