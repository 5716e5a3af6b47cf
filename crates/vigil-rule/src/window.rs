use chrono::{DateTime, Days, Duration, Timelike, Utc};
use chrono_tz::Tz;
use vigil_types::CalendarDay;

/// Calendar-aligned day boundaries and trailing cutoffs in one configured zone.
///
/// Every method takes the instant explicitly. A run reads its clock once and
/// passes that reading everywhere, so "today" and "yesterday" always come from
/// the same local date even when the run straddles midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    zone: Tz,
}

impl TimeWindow {
    pub fn new(zone: Tz) -> Self {
        Self { zone }
    }

    pub fn utc() -> Self {
        Self::new(chrono_tz::UTC)
    }

    pub fn zone(&self) -> Tz {
        self.zone
    }

    pub fn today(&self, now: DateTime<Utc>) -> CalendarDay {
        now.with_timezone(&self.zone).date_naive().into()
    }

    /// The local calendar day `n` days before today.
    pub fn days_ago(&self, now: DateTime<Utc>, n: u32) -> CalendarDay {
        let today = now.with_timezone(&self.zone).date_naive();
        today
            .checked_sub_days(Days::new(u64::from(n)))
            .unwrap_or(today)
            .into()
    }

    /// Whether `now` falls in `hour` of the local day.
    pub fn is_local_hour(&self, now: DateTime<Utc>, hour: u32) -> bool {
        now.with_timezone(&self.zone).hour() == hour
    }

    /// (today, yesterday) from a single reading.
    pub fn today_and_yesterday(&self, now: DateTime<Utc>) -> (CalendarDay, CalendarDay) {
        (self.today(now), self.days_ago(now, 1))
    }

    /// Instant `window_secs` before `now`. Events must be first seen strictly after it.
    pub fn recent_cutoff(&self, now: DateTime<Utc>, window_secs: i64) -> DateTime<Utc> {
        now - Duration::seconds(window_secs.max(0))
    }
}

impl Default for TimeWindow {
    fn default() -> Self {
        Self::utc()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_today_and_yesterday_utc() {
        let window = TimeWindow::utc();
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap();
        assert_eq!(window.today(now), CalendarDay::new(2026, 10, 19));
        assert_eq!(window.days_ago(now, 1), CalendarDay::new(2026, 10, 18));
        assert_eq!(window.days_ago(now, 0), window.today(now));
    }

    #[test]
    fn test_month_and_year_boundaries() {
        let window = TimeWindow::utc();
        let now = Utc.with_ymd_and_hms(2027, 1, 1, 0, 0, 1).unwrap();
        assert_eq!(window.days_ago(now, 1), CalendarDay::new(2026, 12, 31));

        let leap = Utc.with_ymd_and_hms(2028, 3, 1, 8, 0, 0).unwrap();
        assert_eq!(window.days_ago(leap, 1), CalendarDay::new(2028, 2, 29));
    }

    #[test]
    fn test_near_midnight_days_never_collide() {
        let window = TimeWindow::utc();
        for secs in [0, 1, 59, 86_399] {
            let now = Utc.with_ymd_and_hms(2026, 10, 19, 0, 0, 0).unwrap() + Duration::seconds(secs);
            let (today, yesterday) = window.today_and_yesterday(now);
            assert_ne!(today, yesterday);
            assert_eq!(today, CalendarDay::new(2026, 10, 19));
        }
    }

    #[test]
    fn test_configured_zone_shifts_the_date() {
        let window = TimeWindow::new(chrono_tz::Asia::Tokyo);
        // 2026-10-19 20:00 UTC is already 2026-10-20 05:00 in Tokyo
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 20, 0, 0).unwrap();
        assert_eq!(window.today(now), CalendarDay::new(2026, 10, 20));
        assert_eq!(window.days_ago(now, 1), CalendarDay::new(2026, 10, 19));
    }

    #[test]
    fn test_local_hour_and_day_agree() {
        let window = TimeWindow::new(chrono_tz::America::Los_Angeles);
        // 2026-10-20 06:30 UTC is 2026-10-19 23:30 PDT
        let now = Utc.with_ymd_and_hms(2026, 10, 20, 6, 30, 0).unwrap();
        assert!(window.is_local_hour(now, 23));
        assert!(!TimeWindow::utc().is_local_hour(now, 23));
        assert_eq!(
            window.today_and_yesterday(now),
            (CalendarDay::new(2026, 10, 19), CalendarDay::new(2026, 10, 18))
        );
    }

    #[test]
    fn test_recent_cutoff() {
        let window = TimeWindow::utc();
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap();
        assert_eq!(window.recent_cutoff(now, 300), now - Duration::seconds(300));
        assert_eq!(window.recent_cutoff(now, -5), now);
    }
}
