pub mod alert;
pub mod clock;
pub mod error;
pub mod traits;

pub use alert::{
    AlertConfig, AlertConfigRecord, AlertMode, BaselineSpec, Direction, NewEventSpec,
    RecipientSelector, ThresholdValue,
};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{Result, VigilError};
pub use traits::{AlertDataSource, RecipientResolver, TimezoneOracle};
