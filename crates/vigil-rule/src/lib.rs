pub mod aggregator;
pub mod comparator;
pub mod detector;
pub mod engine;
pub mod evaluator;
pub mod execution;
pub mod ledger;
pub mod source;
pub mod storage;
pub mod timezone;
pub mod trigger;
pub mod window;

pub use aggregator::{AlertAggregator, RunStats};
pub use comparator::{compare, percent_change, Comparison};
pub use detector::{detect, DEFAULT_LIMIT};
pub use engine::{AlertEngine, EngineSettings};
pub use evaluator::EntityEvaluator;
pub use execution::{AlertExecution, ExecutionStatus};
pub use ledger::{FiringLedger, MemoryFiringLedger};
pub use source::{DataSnapshot, MemoryDataSource, SnapshotEvent, SnapshotMetric};
pub use storage::AlertStorage;
pub use timezone::EntityTimezoneOracle;
pub use trigger::{ScheduleSettings, TriggerManager};
pub use window::TimeWindow;
