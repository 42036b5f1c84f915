//! Display timestamps for messages and conversations.
//!
//! Message identifiers come in two shapes: client-side millisecond
//! clocks for messages still in flight, and 24 hex character object ids
//! for persisted ones, whose first 8 hex digits are the creation time
//! in Unix seconds.

use chrono::{DateTime, Utc};

const MS_PER_DAY: i64 = 1000 * 60 * 60 * 24;
const OBJECT_ID_LEN: usize = 24;

/// Anything a timestamp can be derived from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimestampKey<'a> {
    Millis(i64),
    Text(&'a str),
}

impl From<i64> for TimestampKey<'_> {
    fn from(ms: i64) -> Self {
        TimestampKey::Millis(ms)
    }
}

impl<'a> From<&'a str> for TimestampKey<'a> {
    fn from(text: &'a str) -> Self {
        TimestampKey::Text(text)
    }
}

pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Resolve `key` to a millisecond epoch timestamp, degrading to `now`
/// for anything that can't be read. Shapes are checked in order:
/// number, digit-only string, object id, anything else.
pub fn resolve_timestamp(key: Option<TimestampKey<'_>>, now: i64) -> i64 {
    match key {
        None | Some(TimestampKey::Millis(0)) | Some(TimestampKey::Text("")) => now,
        Some(TimestampKey::Millis(ms)) => ms,
        Some(TimestampKey::Text(text)) if text.bytes().all(|b| b.is_ascii_digit()) => {
            text.parse::<i64>().unwrap_or(now)
        }
        Some(TimestampKey::Text(text)) if text.len() == OBJECT_ID_LEN => text
            .get(..8)
            .and_then(|secs| u32::from_str_radix(secs, 16).ok())
            .map(|secs| i64::from(secs) * 1000)
            .unwrap_or(now),
        Some(TimestampKey::Text(_)) => now,
    }
}

/// Coarse relative time: "Today", "1 day ago", "N days ago" within a
/// week, otherwise the calendar date. Timestamps in the future count
/// as today.
pub fn format_timestamp(key: Option<TimestampKey<'_>>, now: i64) -> String {
    let ts = resolve_timestamp(key, now);
    let days = now.saturating_sub(ts).div_euclid(MS_PER_DAY).max(0);

    match days {
        0 => "Today".to_string(),
        1 => "1 day ago".to_string(),
        2..=6 => format!("{} days ago", days),
        _ => {
            let date = DateTime::<Utc>::from_timestamp_millis(ts).unwrap_or_default();
            date.format("%-m/%-d/%Y").to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000_000;

    #[test]
    fn it_falls_back_to_now_when_absent() {
        assert_eq!(resolve_timestamp(None, NOW), NOW);
        assert_eq!(resolve_timestamp(Some(TimestampKey::Millis(0)), NOW), NOW);
        assert_eq!(resolve_timestamp(Some("".into()), NOW), NOW);
    }

    #[test]
    fn it_passes_numbers_through() {
        assert_eq!(resolve_timestamp(Some(TimestampKey::Millis(1234)), NOW), 1234);
        assert_eq!(resolve_timestamp(Some(TimestampKey::Millis(-5)), NOW), -5);
    }

    #[test]
    fn it_parses_digit_strings() {
        assert_eq!(
            resolve_timestamp(Some("1699999999999".into()), NOW),
            1_699_999_999_999
        );
        // Digit strings win over the object id shape
        assert_eq!(
            resolve_timestamp(Some("000000000000000000000042".into()), NOW),
            42
        );
        // Too large for an i64
        assert_eq!(
            resolve_timestamp(Some("99999999999999999999999".into()), NOW),
            NOW
        );
    }

    #[test]
    fn it_reads_seconds_from_object_ids() {
        assert_eq!(
            resolve_timestamp(Some("000000055f000000abcdef12".into()), NOW),
            5_000
        );
        assert_eq!(
            resolve_timestamp(Some("6553f100aaaaaaaaaaaaaaaa".into()), NOW),
            0x6553f100_i64 * 1000
        );
    }

    #[test]
    fn it_falls_back_on_malformed_input() {
        assert_eq!(
            resolve_timestamp(Some("zzzzzzzz5f000000abcdef12".into()), NOW),
            NOW
        );
        assert_eq!(resolve_timestamp(Some("conv1".into()), NOW), NOW);
        // 24 bytes, but byte 8 falls inside a multi-byte character
        assert_eq!(
            resolve_timestamp(Some("0000000\u{e9}000000000000000".into()), NOW),
            NOW
        );
    }

    #[test]
    fn it_formats_relative_days() {
        assert_eq!(format_timestamp(Some(NOW.into()), NOW), "Today");
        assert_eq!(format_timestamp(Some((NOW - 1).into()), NOW), "Today");
        assert_eq!(
            format_timestamp(Some((NOW - MS_PER_DAY).into()), NOW),
            "1 day ago"
        );
        assert_eq!(
            format_timestamp(Some((NOW - 2 * MS_PER_DAY - 5).into()), NOW),
            "2 days ago"
        );
        assert_eq!(
            format_timestamp(Some((NOW - 6 * MS_PER_DAY).into()), NOW),
            "6 days ago"
        );
    }

    #[test]
    fn it_formats_calendar_date_after_a_week() {
        // 2023-11-07T22:13:20Z
        let ts = NOW - 7 * MS_PER_DAY;
        assert_eq!(format_timestamp(Some(ts.into()), NOW), "11/7/2023");
        assert_eq!(
            format_timestamp(Some("000000055f000000abcdef12".into()), NOW),
            "1/1/1970"
        );
    }

    #[test]
    fn it_treats_future_timestamps_as_today() {
        assert_eq!(format_timestamp(Some((NOW + 1).into()), NOW), "Today");
        assert_eq!(
            format_timestamp(Some((NOW + 3 * MS_PER_DAY).into()), NOW),
            "Today"
        );
    }

    #[test]
    fn it_never_fails_on_extreme_values() {
        assert_eq!(format_timestamp(Some(i64::MIN.into()), NOW), "1/1/1970");
        assert_eq!(format_timestamp(Some(i64::MAX.into()), NOW), "Today");
    }
}
