//! Platform configuration.

use std::time::Duration;

/// Configuration for opening a platform data directory.
#[derive(Debug, Clone)]
pub struct Config {
    /// Whether to create the data directory if it doesn't exist.
    pub create_if_missing: bool,

    /// Whether to error if the data directory already exists.
    pub error_if_exists: bool,

    /// Keep all stores in memory instead of on disk. For tests.
    pub in_memory: bool,

    /// How long the write consumer sleeps when the queue is empty.
    pub consumer_poll_interval: Duration,

    /// Whether to flush backing stores after every applied write.
    pub flush_on_write: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            error_if_exists: false,
            in_memory: false,
            consumer_poll_interval: Duration::from_secs(1),
            flush_on_write: false,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether to create the data directory if missing.
    #[must_use]
    pub const fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }

    /// Sets whether to error if the data directory exists.
    #[must_use]
    pub const fn error_if_exists(mut self, value: bool) -> Self {
        self.error_if_exists = value;
        self
    }

    /// Sets whether all stores live in memory.
    #[must_use]
    pub const fn in_memory(mut self, value: bool) -> Self {
        self.in_memory = value;
        self
    }

    /// Sets the consumer's idle poll interval.
    #[must_use]
    pub const fn consumer_poll_interval(mut self, interval: Duration) -> Self {
        self.consumer_poll_interval = interval;
        self
    }

    /// Sets whether to flush stores after every applied write.
    #[must_use]
    pub const fn flush_on_write(mut self, value: bool) -> Self {
        self.flush_on_write = value;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = Config::default();
        assert!(config.create_if_missing);
        assert!(!config.error_if_exists);
        assert!(!config.in_memory);
        assert_eq!(config.consumer_poll_interval, Duration::from_secs(1));
    }

    #[test]
    fn config_builder_chains() {
        let config = Config::new()
            .in_memory(true)
            .flush_on_write(true)
            .consumer_poll_interval(Duration::from_millis(10));
        assert!(config.in_memory);
        assert!(config.flush_on_write);
        assert_eq!(config.consumer_poll_interval, Duration::from_millis(10));
    }
}
