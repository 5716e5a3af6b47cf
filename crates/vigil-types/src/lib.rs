pub mod entity;
pub mod event;
pub mod metric;
pub mod recipient;
pub mod result;

pub use entity::EntityInfo;
pub use event::EventRecord;
pub use metric::{CalendarDay, MetricPoint, MetricSeries, PeriodSpec};
pub use recipient::{DeliveryChannel, Recipient};
pub use result::{EvaluationResult, FiredAlert};
