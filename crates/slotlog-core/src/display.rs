//! Timestamp display and ordering
//!
//! Client timestamps are stored verbatim as `YYYY-MM-DD HH:mm:ss[.sss]`
//! strings. They are parsed here only for presentation: listings are
//! ordered by them and the visit view shows them shifted back by a fixed
//! offset. Anything that does not parse is shown unchanged.

use chrono::{NaiveDateTime, TimeDelta};

use crate::config::DisplayConfig;
use crate::record::Timestamped;

/// Output format of [`TimeDisplay::format`]
pub const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Accepted layouts for the whole-seconds part of a timestamp
const INPUT_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parse a timestamp including any fractional seconds
///
/// Returns `None` for anything that is not a valid date-time, including a
/// fraction that is not made of digits.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    match raw.split_once('.') {
        None => parse_whole_seconds(raw),
        Some((base, fraction)) => {
            let nanos = fraction_nanos(fraction)?;
            parse_whole_seconds(base)?.checked_add_signed(TimeDelta::nanoseconds(nanos))
        }
    }
}

fn parse_whole_seconds(raw: &str) -> Option<NaiveDateTime> {
    INPUT_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
}

/// `"5"` -> 500ms, `"123456789123"` -> truncated to nanoseconds
fn fraction_nanos(fraction: &str) -> Option<i64> {
    if fraction.is_empty() || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let digits: String = fraction.chars().chain(std::iter::repeat('0')).take(9).collect();
    digits.parse().ok()
}

/// Reformats stored timestamps for the visit view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeDisplay {
    offset: TimeDelta,
}

impl TimeDisplay {
    /// Display that subtracts `offset_secs` from every parsed timestamp
    pub fn new(offset_secs: u32) -> Self {
        Self {
            offset: TimeDelta::seconds(i64::from(offset_secs)),
        }
    }

    /// Build from configuration
    pub fn from_config(config: &DisplayConfig) -> Self {
        Self::new(config.offset_secs)
    }

    /// Format one stored timestamp
    ///
    /// 1. Drop everything from the first `.` (fractional seconds)
    /// 2. Parse as a naive local date-time
    /// 3. Subtract the offset
    /// 4. Print as zero-padded `YYYY-MM-DD HH:mm:ss`
    ///
    /// Unparseable input comes back unchanged.
    pub fn format(&self, raw: &str) -> String {
        let whole = raw.split('.').next().unwrap_or(raw).trim();

        parse_whole_seconds(whole)
            .and_then(|parsed| parsed.checked_sub_signed(self.offset))
            .map(|shifted| shifted.format(DISPLAY_FORMAT).to_string())
            .unwrap_or_else(|| raw.to_string())
    }
}

impl Default for TimeDisplay {
    fn default() -> Self {
        Self::from_config(&DisplayConfig::default())
    }
}

/// Order records ascending by timestamp
///
/// Records with a parseable timestamp are stably sorted among themselves.
/// Records whose timestamp does not parse stay at the position they held.
pub fn sorted_by_timestamp<T: Timestamped>(items: Vec<T>) -> Vec<T> {
    let parsed: Vec<Option<NaiveDateTime>> =
        items.iter().map(|item| parse_timestamp(item.timestamp())).collect();

    let mut order: Vec<usize> = (0..items.len()).filter(|&i| parsed[i].is_some()).collect();
    order.sort_by_key(|&i| parsed[i]);

    let mut slots: Vec<Option<T>> = items.into_iter().map(Some).collect();
    let mut sorted_sources = order.into_iter();
    let mut out = Vec::with_capacity(slots.len());

    for position in 0..slots.len() {
        let source = if parsed[position].is_some() {
            sorted_sources.next().unwrap_or(position)
        } else {
            position
        };
        out.extend(slots[source].take());
    }

    out
}
