use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// A calendar day in some time zone. Month and day are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CalendarDay {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl CalendarDay {
    pub fn new(year: i32, month: u32, day: u32) -> Self {
        Self { year, month, day }
    }
}

impl From<NaiveDate> for CalendarDay {
    fn from(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
            day: date.day(),
        }
    }
}

impl fmt::Display for CalendarDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// How much history a metric series request covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodSpec {
    pub days: u32,
}

impl PeriodSpec {
    pub fn last_days(days: u32) -> Self {
        Self { days }
    }
}

impl Default for PeriodSpec {
    fn default() -> Self {
        Self::last_days(7)
    }
}

/// One scalar value keyed by entity, day and field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricPoint {
    pub entity_id: String,
    pub day: CalendarDay,
    pub field: String,
    pub value: f64,
}

impl MetricPoint {
    pub fn new(entity_id: impl Into<String>, day: CalendarDay, field: impl Into<String>, value: f64) -> Self {
        Self {
            entity_id: entity_id.into(),
            day,
            field: field.into(),
            value,
        }
    }
}

/// Values nested by year → month → day → field, the shape the metric store returns.
///
/// Serializes as `{"2026": {"10": {"19": {"cr": 12.0}}}}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricSeries {
    years: BTreeMap<i32, BTreeMap<u32, BTreeMap<u32, HashMap<String, f64>>>>,
}

impl MetricSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a MetricPoint>) -> Self {
        let mut series = Self::new();
        for point in points {
            series.insert(point.day, &point.field, point.value);
        }
        series
    }

    pub fn insert(&mut self, day: CalendarDay, field: &str, value: f64) {
        self.years
            .entry(day.year)
            .or_default()
            .entry(day.month)
            .or_default()
            .entry(day.day)
            .or_default()
            .insert(field.to_string(), value);
    }

    pub fn with(mut self, day: CalendarDay, field: &str, value: f64) -> Self {
        self.insert(day, field, value);
        self
    }

    /// Value recorded for `field` on `day`, if any.
    pub fn value(&self, day: CalendarDay, field: &str) -> Option<f64> {
        self.years
            .get(&day.year)?
            .get(&day.month)?
            .get(&day.day)?
            .get(field)
            .copied()
    }
}
