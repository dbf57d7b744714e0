pub mod audio;
pub mod config;
pub mod control;
mod lock;
mod logging;
pub mod session;
mod telemetry;
pub mod terminal_restore;
pub mod vox;

pub(crate) use lock::lock_or_recover;
pub use logging::{crash_log_path, init_logging, log_debug, log_file_path, log_panic};
pub use session::Session;
pub use telemetry::init_tracing;
