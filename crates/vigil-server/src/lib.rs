pub mod api;
pub mod app;
pub mod signal;
pub mod snapshot;

pub use api::{create_router, ApiState};
pub use app::VigilApp;
pub use signal::{shutdown_signal, ShutdownSignal};
