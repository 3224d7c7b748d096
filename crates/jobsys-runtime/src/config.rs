//! Scheduler configuration
//!
//! Library defaults with runtime environment overrides.
//!
//! # Configuration Priority (highest wins)
//!
//! 1. Builder calls
//! 2. Environment variables (`from_env`)
//! 3. Library defaults
//!
//! # Example
//!
//! ```rust,ignore
//! use jobsys_runtime::config::SchedulerConfig;
//!
//! let config = SchedulerConfig::from_env()
//!     .queue_capacity(4096)
//!     .use_logical_cores(true);
//! ```

use jobsys_core::constants::{DEFAULT_QUEUE_CAPACITY, MAX_WORKERS};
use jobsys_core::env::{env_get, env_get_bool, env_get_opt, env_get_str};
use jobsys_core::ConfigError;

/// Library defaults
pub mod defaults {
    pub const QUEUE_CAPACITY: usize = super::DEFAULT_QUEUE_CAPACITY;
    pub const USE_LOGICAL_CORES: bool = false;
    pub const PIN_WORKERS: bool = true;
    pub const THREAD_NAME_PREFIX: &str = "jobsys-worker";
    pub const MIN_STACK_SIZE: usize = 64 * 1024;
}

/// Scheduler configuration with builder pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Ring slots in the job queue; one slot is always kept empty
    pub queue_capacity: usize,
    /// Explicit worker count; `None` derives it from the CPU topology
    pub num_workers: Option<usize>,
    /// Size the pool from logical threads instead of physical cores
    pub use_logical_cores: bool,
    /// Pin each worker to its own CPU
    pub pin_workers: bool,
    /// Worker threads are named `<prefix>-<index>`
    pub thread_name_prefix: String,
    /// Worker stack size; `None` keeps the platform default
    pub stack_size: Option<usize>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

impl SchedulerConfig {
    /// Create config from library defaults with environment overrides.
    ///
    /// Environment variables (all optional):
    /// - `JOBSYS_QUEUE_CAPACITY` - Ring slots in the job queue
    /// - `JOBSYS_NUM_WORKERS` - Worker count (0 = derive from topology)
    /// - `JOBSYS_USE_LOGICAL_CORES` - Count hyperthreads as cores (0/1)
    /// - `JOBSYS_PIN_WORKERS` - Pin workers to CPUs (0/1)
    /// - `JOBSYS_THREAD_PREFIX` - Worker thread name prefix
    /// - `JOBSYS_STACK_SIZE` - Worker stack size in bytes (0 = default)
    pub fn from_env() -> Self {
        Self {
            queue_capacity: env_get("JOBSYS_QUEUE_CAPACITY", defaults::QUEUE_CAPACITY),
            num_workers: env_get_opt::<usize>("JOBSYS_NUM_WORKERS").filter(|&n| n != 0),
            use_logical_cores: env_get_bool(
                "JOBSYS_USE_LOGICAL_CORES",
                defaults::USE_LOGICAL_CORES,
            ),
            pin_workers: env_get_bool("JOBSYS_PIN_WORKERS", defaults::PIN_WORKERS),
            thread_name_prefix: env_get_str("JOBSYS_THREAD_PREFIX", defaults::THREAD_NAME_PREFIX),
            stack_size: env_get_opt::<usize>("JOBSYS_STACK_SIZE").filter(|&n| n != 0),
        }
    }

    /// Create config with explicit defaults (no env override).
    /// Useful for testing or when you want full control.
    pub fn new() -> Self {
        Self {
            queue_capacity: defaults::QUEUE_CAPACITY,
            num_workers: None,
            use_logical_cores: defaults::USE_LOGICAL_CORES,
            pin_workers: defaults::PIN_WORKERS,
            thread_name_prefix: defaults::THREAD_NAME_PREFIX.to_string(),
            stack_size: None,
        }
    }

    // Builder methods

    pub fn queue_capacity(mut self, slots: usize) -> Self {
        self.queue_capacity = slots;
        self
    }

    pub fn num_workers(mut self, n: usize) -> Self {
        self.num_workers = Some(n);
        self
    }

    pub fn use_logical_cores(mut self, enable: bool) -> Self {
        self.use_logical_cores = enable;
        self
    }

    pub fn pin_workers(mut self, enable: bool) -> Self {
        self.pin_workers = enable;
        self
    }

    pub fn thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    pub fn stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = Some(bytes);
        self
    }

    /// Validate configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue_capacity < 2 {
            return Err(ConfigError::InvalidValue("queue_capacity must be >= 2"));
        }
        if let Some(n) = self.num_workers {
            if n == 0 {
                return Err(ConfigError::InvalidValue("num_workers must be > 0"));
            }
            if n > MAX_WORKERS {
                return Err(ConfigError::InvalidValue("num_workers must be <= 256"));
            }
        }
        if let Some(size) = self.stack_size {
            if size < defaults::MIN_STACK_SIZE {
                return Err(ConfigError::InvalidValue("stack_size must be >= 64KB"));
            }
        }
        if self.thread_name_prefix.is_empty() {
            return Err(ConfigError::InvalidValue("thread_name_prefix must not be empty"));
        }
        Ok(())
    }

    /// Log the configuration at debug level
    pub fn log(&self) {
        log::debug!("jobsys configuration:");
        log::debug!("  queue_capacity:     {}", self.queue_capacity);
        log::debug!("  num_workers:        {:?}", self.num_workers);
        log::debug!("  use_logical_cores:  {}", self.use_logical_cores);
        log::debug!("  pin_workers:        {}", self.pin_workers);
        log::debug!("  thread_name_prefix: {}", self.thread_name_prefix);
        log::debug!("  stack_size:         {:?}", self.stack_size);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SchedulerConfig::new();
        assert_eq!(config.queue_capacity, 1000);
        assert_eq!(config.num_workers, None);
        assert!(!config.use_logical_cores);
        assert!(config.pin_workers);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = SchedulerConfig::new()
            .queue_capacity(64)
            .num_workers(3)
            .use_logical_cores(true)
            .pin_workers(false)
            .thread_name_prefix("render-job")
            .stack_size(256 * 1024);

        assert_eq!(config.queue_capacity, 64);
        assert_eq!(config.num_workers, Some(3));
        assert!(config.use_logical_cores);
        assert!(!config.pin_workers);
        assert_eq!(config.thread_name_prefix, "render-job");
        assert_eq!(config.stack_size, Some(256 * 1024));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        assert!(SchedulerConfig::new().queue_capacity(1).validate().is_err());
        assert!(SchedulerConfig::new().num_workers(0).validate().is_err());
        assert!(SchedulerConfig::new().num_workers(1000).validate().is_err());
        assert!(SchedulerConfig::new().stack_size(4096).validate().is_err());
        assert!(SchedulerConfig::new().thread_name_prefix("").validate().is_err());
    }

    #[test]
    fn test_from_env_reads_overrides() {
        // Only this test touches these variables.
        std::env::set_var("JOBSYS_QUEUE_CAPACITY", "256");
        std::env::set_var("JOBSYS_NUM_WORKERS", "0");
        std::env::set_var("JOBSYS_USE_LOGICAL_CORES", "1");
        let config = SchedulerConfig::from_env();
        std::env::remove_var("JOBSYS_QUEUE_CAPACITY");
        std::env::remove_var("JOBSYS_NUM_WORKERS");
        std::env::remove_var("JOBSYS_USE_LOGICAL_CORES");

        assert_eq!(config.queue_capacity, 256);
        assert_eq!(config.num_workers, None);
        assert!(config.use_logical_cores);
    }
}
