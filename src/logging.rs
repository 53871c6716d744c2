//! Logger bootstrap.
//!
//! The framework itself only talks to the `log` facade. Applications and
//! demos that want to see diagnostics (reserved-name warnings, state sync
//! traces) call [`init_logging`] once at startup.
//!
//! # Invariants
//! - Initialization happens at most once per process; later calls are no-ops.
//! - An invalid level string is reported, never panics.

use flexi_logger::{Logger, LoggerHandle};
use log::info;
use once_cell::sync::OnceCell;

use crate::error::Result;

static LOGGER: OnceCell<LoggerHandle> = OnceCell::new();

/// Start a stderr logger with the given level spec (e.g. `"info"`,
/// `"spark_mina=debug"`).
///
/// Returns `Ok(())` if logging is already active.
pub fn init_logging(level: &str) -> Result<()> {
    LOGGER.get_or_try_init(|| -> Result<LoggerHandle> {
        let handle = Logger::try_with_str(level)?
            .log_to_stderr()
            .format(flexi_logger::default_format)
            .start()?;
        info!(
            "event=logging_start level={} version={}",
            level,
            env!("CARGO_PKG_VERSION")
        );
        Ok(handle)
    })?;
    Ok(())
}

/// Whether [`init_logging`] has succeeded in this process.
pub fn is_initialized() -> bool {
    LOGGER.get().is_some()
}
