//! Human-readable sizes and timestamps for listings.

use std::time::SystemTime;

use humansize::{format_size, FormatSizeOptions, DECIMAL};

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;
const WEEK: u64 = 7 * DAY;
const MONTH: u64 = 30 * DAY;
const YEAR: u64 = 12 * MONTH;
const LONG_TIME: u64 = 37 * YEAR;

/// Source of "now" for relative timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Clock {
    /// The system wall clock.
    #[default]
    System,
    /// A fixed instant, for reproducible output.
    Fixed(SystemTime),
}

impl Clock {
    pub fn now(&self) -> SystemTime {
        match self {
            Clock::System => SystemTime::now(),
            Clock::Fixed(at) => *at,
        }
    }
}

/// Format a byte count with SI units and one decimal, e.g. `1.2 kB`.
pub fn human_size(bytes: u64) -> String {
    let options = FormatSizeOptions::from(DECIMAL).decimal_places(1);
    format_size(bytes, options)
}

/// Format `then` relative to `now`, e.g. `3 days ago` or `2 hours from now`.
pub fn human_time(then: SystemTime, now: SystemTime) -> String {
    let (secs, suffix) = match now.duration_since(then) {
        Ok(elapsed) => (elapsed.as_secs(), "ago"),
        Err(e) => (e.duration().as_secs(), "from now"),
    };

    let amount = match secs {
        0 => return "now".to_string(),
        1 => "1 second".to_string(),
        s if s < MINUTE => format!("{s} seconds"),
        s if s < 2 * MINUTE => "1 minute".to_string(),
        s if s < HOUR => format!("{} minutes", s / MINUTE),
        s if s < 2 * HOUR => "1 hour".to_string(),
        s if s < DAY => format!("{} hours", s / HOUR),
        s if s < 2 * DAY => "1 day".to_string(),
        s if s < WEEK => format!("{} days", s / DAY),
        s if s < 2 * WEEK => "1 week".to_string(),
        s if s < MONTH => format!("{} weeks", s / WEEK),
        s if s < 2 * MONTH => "1 month".to_string(),
        s if s < YEAR => format!("{} months", s / MONTH),
        s if s < 18 * MONTH => "1 year".to_string(),
        s if s < 2 * YEAR => "2 years".to_string(),
        s if s < LONG_TIME => format!("{} years", s / YEAR),
        _ => return "a long while ago".to_string(),
    };

    format!("{amount} {suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    fn at(secs: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(secs)
    }

    #[test]
    fn test_human_size() {
        assert_eq!(human_size(0), "0 B");
        assert_eq!(human_size(5), "5 B");
        assert_eq!(human_size(1_500), "1.5 kB");
        assert_eq!(human_size(2_500_000), "2.5 MB");
    }

    #[test]
    fn test_human_time_past() {
        let now = at(2_000_000_000);

        assert_eq!(human_time(now, now), "now");
        assert_eq!(human_time(at(2_000_000_000 - 1), now), "1 second ago");
        assert_eq!(human_time(at(2_000_000_000 - 45), now), "45 seconds ago");
        assert_eq!(human_time(at(2_000_000_000 - 90), now), "1 minute ago");
        assert_eq!(human_time(at(2_000_000_000 - 5 * MINUTE), now), "5 minutes ago");
        assert_eq!(human_time(at(2_000_000_000 - 3 * HOUR), now), "3 hours ago");
        assert_eq!(human_time(at(2_000_000_000 - 3 * DAY), now), "3 days ago");
        assert_eq!(human_time(at(2_000_000_000 - 10 * DAY), now), "1 week ago");
        assert_eq!(human_time(at(2_000_000_000 - 3 * WEEK), now), "3 weeks ago");
        assert_eq!(human_time(at(2_000_000_000 - 4 * MONTH), now), "4 months ago");
        assert_eq!(human_time(at(2_000_000_000 - 13 * MONTH), now), "1 year ago");
        assert_eq!(human_time(at(2_000_000_000 - 5 * YEAR), now), "5 years ago");
    }

    #[test]
    fn test_human_time_epoch_is_long_ago() {
        assert_eq!(human_time(UNIX_EPOCH, at(2_000_000_000)), "a long while ago");
    }

    #[test]
    fn test_human_time_future() {
        let now = at(1_000_000);
        assert_eq!(human_time(at(1_000_000 + 2 * HOUR + 5), now), "2 hours from now");
    }

    #[test]
    fn test_fixed_clock() {
        let clock = Clock::Fixed(at(42));
        assert_eq!(clock.now(), at(42));
        assert_eq!(Clock::default(), Clock::System);
    }
}
