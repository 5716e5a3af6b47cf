use chrono::{DateTime, Utc};
use vigil_types::EventRecord;

pub const DEFAULT_LIMIT: usize = vigil_core::alert::DEFAULT_EVENT_LIMIT;

/// New events first seen strictly after `cutoff`, newest `last_seen` first, at most `limit`.
///
/// Read-only: nothing is marked as seen. Ties on `last_seen` keep feed order.
pub fn detect(
    events: impl IntoIterator<Item = EventRecord>,
    cutoff: DateTime<Utc>,
    limit: usize,
) -> Vec<EventRecord> {
    let mut fresh: Vec<EventRecord> = events
        .into_iter()
        .filter(|event| event.is_new && event.first_seen > cutoff)
        .collect();

    fresh.sort_by(|a, b| b.last_seen.cmp(&a.last_seen));
    fresh.truncate(limit);
    fresh
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()
    }

    fn event(id: &str, first_seen_ago: i64) -> EventRecord {
        EventRecord::new(id, "app", now() - Duration::seconds(first_seen_ago), "trace")
    }

    #[test]
    fn test_window_filter_and_order() {
        let cutoff = now() - Duration::seconds(300);
        let events = vec![event("e1", 100), event("e2", 400), event("e3", 10)];

        let found = detect(events, cutoff, DEFAULT_LIMIT);
        let ids: Vec<_> = found.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["e3", "e1"]);
    }

    #[test]
    fn test_cutoff_is_exclusive() {
        let cutoff = now() - Duration::seconds(300);
        assert!(detect(vec![event("edge", 300)], cutoff, 10).is_empty());
    }

    #[test]
    fn test_not_new_is_ignored() {
        let cutoff = now() - Duration::seconds(300);
        let events = vec![event("seen", 5).with_new(false), event("fresh", 6)];
        let found = detect(events, cutoff, 10);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "fresh");
    }

    #[test]
    fn test_orders_by_last_seen_not_first_seen() {
        let cutoff = now() - Duration::seconds(300);
        let events = vec![
            event("old-but-active", 200).with_last_seen(now()),
            event("young-quiet", 20),
        ];
        let found = detect(events, cutoff, 10);
        assert_eq!(found[0].id, "old-but-active");
    }

    #[test]
    fn test_limit_and_invariants() {
        let cutoff = now() - Duration::seconds(300);
        let events: Vec<_> = (0..120)
            .map(|i| event(&format!("e{}", i), (i * 7) % 600).with_new(i % 5 != 0))
            .collect();

        for limit in [0, 1, 3, 50, 500] {
            let found = detect(events.clone(), cutoff, limit);
            assert!(found.len() <= limit);
            assert!(found.iter().all(|e| e.is_new && e.first_seen > cutoff));
            assert!(found.windows(2).all(|w| w[0].last_seen >= w[1].last_seen));
        }
    }

    #[test]
    fn test_empty_feed() {
        assert!(detect(Vec::new(), now(), DEFAULT_LIMIT).is_empty());
    }
}
