pub mod alerts;
pub mod global;
pub mod loader;

pub use alerts::AlertsFile;
pub use global::{
    ApiConfig, DataConfig, EngineConfig, GlobalConfig, NotifyConfig, ScheduleConfig, SystemConfig,
};
pub use loader::ConfigLoader;
