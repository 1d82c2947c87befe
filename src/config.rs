//! Session configuration.

use std::time::Duration;

/// Tunable parameters for a [`crate::Session`].
///
/// The defaults mirror the keep-alive constants the protocol was deployed
/// with: a ping after 30 seconds of write inactivity and connection death
/// after 60 seconds without inbound traffic. The idle timeout must always
/// exceed the ping interval so at least one ping round-trip fits before the
/// connection is declared dead; [`SessionConfig::validate`] enforces this.
#[derive(Clone, Copy, Debug)]
pub struct SessionConfig {
    /// Write inactivity after which a ping is emitted.
    pub ping_interval: Duration,
    /// Read inactivity after which the connection is declared dead.
    pub idle_timeout: Duration,
    /// Bound on establishing the TCP connection.
    pub connect_timeout: Duration,
    /// Bound on waiting for teardown during [`crate::Session::disconnect`].
    pub disconnect_timeout: Duration,
    /// Largest accepted frame, in bytes. Oversized frames fail the connection.
    pub max_frame_length: usize,
    /// Entries retained in the server broadcast log before the oldest are
    /// evicted.
    pub broadcast_log_cap: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ping_interval: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(10),
            disconnect_timeout: Duration::from_secs(5),
            max_frame_length: 1024 * 1024,
            broadcast_log_cap: 256,
        }
    }
}

impl SessionConfig {
    /// Replace the ping interval.
    #[must_use]
    pub fn with_ping_interval(mut self, interval: Duration) -> Self {
        self.ping_interval = interval;
        self
    }

    /// Replace the idle timeout.
    #[must_use]
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Replace the broadcast log capacity.
    #[must_use]
    pub fn with_broadcast_log_cap(mut self, cap: usize) -> Self {
        self.broadcast_log_cap = cap;
        self
    }

    /// Check the configuration for internally inconsistent values.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when any duration is zero or when the idle
    /// timeout does not exceed the ping interval.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("ping_interval", self.ping_interval),
            ("idle_timeout", self.idle_timeout),
            ("connect_timeout", self.connect_timeout),
            ("disconnect_timeout", self.disconnect_timeout),
        ] {
            if value.is_zero() {
                return Err(ConfigError::ZeroDuration { name });
            }
        }
        if self.idle_timeout <= self.ping_interval {
            return Err(ConfigError::TimeoutNotAboveInterval {
                interval: self.ping_interval,
                timeout: self.idle_timeout,
            });
        }
        Ok(())
    }
}

/// Rejected [`SessionConfig`] values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The idle timeout must leave room for a ping round-trip.
    #[error("idle timeout ({timeout:?}) must exceed the ping interval ({interval:?})")]
    TimeoutNotAboveInterval { interval: Duration, timeout: Duration },
    /// Durations of zero would busy-loop or never fire.
    #[error("{name} must be non-zero")]
    ZeroDuration { name: &'static str },
}
