//! # Runtime
//!
//! Builds the server's multi-threaded [Tokio](https://tokio.rs) runtime from a
//! [`RuntimeConfig`] section, clamping every knob to safe bounds.
//!
//! ## Example
//!
//! ```rust
//! use keeper_domain::config::RuntimeConfig;
//!
//! let runtime = keeper_runtime::build(&RuntimeConfig::default())?;
//! runtime.block_on(async {});
//! # Ok::<(), anyhow::Error>(())
//! ```

pub use anyhow::Result;

use anyhow::anyhow;
use keeper_domain::config::RuntimeConfig;
use std::thread::available_parallelism;
use std::time::Duration;
use tokio::runtime::{Builder, Runtime};
use tracing::debug;

/// Worker count when parallelism cannot be detected.
const FALLBACK_WORKER_THREADS: usize = 4;
const MAX_WORKER_THREADS: usize = 1024;
/// 1 `MiB`
const MIN_STACK_SIZE: usize = 1024 * 1024;
/// 16 `MiB`
const MAX_STACK_SIZE: usize = 16 * 1024 * 1024;
const DEFAULT_THREAD_NAME: &str = "keeper-worker";
const THREAD_KEEP_ALIVE: Duration = Duration::from_secs(60);

/// Runtime settings after clamping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeSettings {
    pub worker_threads: usize,
    pub stack_size: usize,
    pub thread_name: String,
}

impl From<&RuntimeConfig> for RuntimeSettings {
    fn from(config: &RuntimeConfig) -> Self {
        let worker_threads = match config.worker_threads {
            0 => available_parallelism().map_or(FALLBACK_WORKER_THREADS, std::num::NonZero::get),
            n => n.min(MAX_WORKER_THREADS),
        };
        let thread_name = if config.thread_name.trim().is_empty() {
            DEFAULT_THREAD_NAME.to_owned()
        } else {
            config.thread_name.clone()
        };

        Self {
            worker_threads,
            stack_size: config.stack_size.clamp(MIN_STACK_SIZE, MAX_STACK_SIZE),
            thread_name,
        }
    }
}

/// Builds a multi-threaded runtime with I/O and timers enabled.
///
/// # Errors
/// Fails when the OS refuses to spawn the worker threads.
pub fn build(config: &RuntimeConfig) -> Result<Runtime> {
    let settings = RuntimeSettings::from(config);
    debug!(?settings, "Building tokio runtime");

    Builder::new_multi_thread()
        .worker_threads(settings.worker_threads)
        .thread_name(&settings.thread_name)
        .thread_stack_size(settings.stack_size)
        .thread_keep_alive(THREAD_KEEP_ALIVE)
        .enable_all()
        .build()
        .map_err(|e| anyhow!("Failed to initialize runtime: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_workers_uses_detected_parallelism() {
        let settings = RuntimeSettings::from(&RuntimeConfig::default());
        assert!(settings.worker_threads >= 1);
        assert_eq!(settings.thread_name, "keeper-worker");
    }

    #[test]
    fn values_are_clamped() {
        let config = RuntimeConfig {
            worker_threads: 5000,
            stack_size: 100,
            thread_name: "   ".to_owned(),
        };
        let settings = RuntimeSettings::from(&config);
        assert_eq!(settings.worker_threads, MAX_WORKER_THREADS);
        assert_eq!(settings.stack_size, MIN_STACK_SIZE);
        assert_eq!(settings.thread_name, DEFAULT_THREAD_NAME);

        let config = RuntimeConfig { stack_size: 100 * 1024 * 1024, ..RuntimeConfig::default() };
        assert_eq!(RuntimeSettings::from(&config).stack_size, MAX_STACK_SIZE);
    }

    #[test]
    fn built_runtime_executes_futures() {
        let config = RuntimeConfig { worker_threads: 2, ..RuntimeConfig::default() };
        let runtime = build(&config).expect("runtime");
        assert_eq!(runtime.block_on(async { 40 + 2 }), 42);
    }
}
