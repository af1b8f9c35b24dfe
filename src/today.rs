use crate::weather::{WeatherLookup, WeatherStatus};
use std::time::{Duration, Instant};
use time::{OffsetDateTime, UtcOffset};

/// How long the panel stays up after being shown
pub(crate) const SHOW_FOR: Duration = Duration::from_secs(6);

/// India Standard Time, UTC+05:30, in minutes
const IST_OFFSET_MINUTES: i32 = 330;

pub(crate) fn local_time(now: OffsetDateTime) -> String {
    format!("{:02}:{:02}", now.hour(), now.minute())
}

/// Hours to add to local time to get the time in India, e.g. "+5.5h" from
/// UTC or "-3h" from Japan
pub(crate) fn offset_from_india(offset: UtcOffset) -> String {
    let diff = IST_OFFSET_MINUTES - i32::from(offset.whole_minutes());
    let sign = if diff < 0 { "-" } else { "+" };
    let minutes = diff.unsigned_abs();
    if minutes % 60 == 0 {
        format!("{sign}{}h", minutes / 60)
    } else {
        // Tenths of an hour, halves rounding away from zero
        let tenths = (minutes * 10 + 30) / 60;
        format!("{sign}{}.{}h", tenths / 10, tenths % 10)
    }
}

#[derive(Debug)]
pub(crate) struct TodayInfo {
    pub(crate) local_time: String,
    pub(crate) from_india: String,
    weather: WeatherLookup,
    shown_at: Instant,
}

impl TodayInfo {
    pub(crate) fn new(now: OffsetDateTime, weather: WeatherLookup, shown_at: Instant) -> Self {
        TodayInfo {
            local_time: local_time(now),
            from_india: offset_from_india(now.offset()),
            weather,
            shown_at,
        }
    }

    pub(crate) fn expired(&self, now: Instant) -> bool {
        self.remaining(now).is_zero()
    }

    pub(crate) fn remaining(&self, now: Instant) -> Duration {
        SHOW_FOR.saturating_sub(now.saturating_duration_since(self.shown_at))
    }

    pub(crate) fn weather(&mut self) -> &WeatherStatus {
        self.weather.poll()
    }

    pub(crate) fn weather_pending(&self) -> bool {
        self.weather.is_pending()
    }
}
