//! Idle detection and ping scheduling.
//!
//! One [`IdleMonitor`] exists per connection, owned by the I/O task. The
//! task records read and write activity as it happens and polls the monitor
//! from a timer tick. Write inactivity past the ping interval asks for a
//! ping; read inactivity past the idle timeout declares the connection dead.
//! Death is latched: it is reported exactly once, after which the monitor
//! stays silent.

use std::time::Duration;

use tokio::time::Instant;

/// Action requested by [`IdleMonitor::poll`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IdleEvent {
    /// Recent traffic in both directions; nothing to do.
    None,
    /// Write inactivity reached the ping interval; emit a ping.
    SendPing,
    /// Read inactivity reached the idle timeout; tear the connection down.
    Dead,
}

/// Tracks read/write inactivity for one connection.
///
/// The idle timeout must exceed the ping interval (enforced by
/// [`crate::SessionConfig::validate`]) so a ping round-trip can complete
/// before death is declared.
#[derive(Debug)]
pub struct IdleMonitor {
    ping_interval: Duration,
    idle_timeout: Duration,
    last_read: Instant,
    last_write: Instant,
    dead: bool,
}

impl IdleMonitor {
    /// Create a monitor with both activity marks set to `now`.
    #[must_use]
    pub fn new(ping_interval: Duration, idle_timeout: Duration, now: Instant) -> Self {
        Self {
            ping_interval,
            idle_timeout,
            last_read: now,
            last_write: now,
            dead: false,
        }
    }

    /// Record inbound traffic. Every received frame counts, pings included.
    pub fn record_read(&mut self, now: Instant) { self.last_read = now; }

    /// Record outbound traffic. Every written frame counts, pings included.
    pub fn record_write(&mut self, now: Instant) { self.last_write = now; }

    /// Evaluate inactivity at `now`.
    ///
    /// Read-timeout takes precedence over ping emission: a connection that
    /// has heard nothing for the full timeout is dead even if a ping is also
    /// due. [`IdleEvent::Dead`] is returned at most once.
    pub fn poll(&mut self, now: Instant) -> IdleEvent {
        if self.dead {
            return IdleEvent::None;
        }
        if now.duration_since(self.last_read) >= self.idle_timeout {
            self.dead = true;
            return IdleEvent::Dead;
        }
        if now.duration_since(self.last_write) >= self.ping_interval {
            return IdleEvent::SendPing;
        }
        IdleEvent::None
    }

    /// Whether death has been declared.
    #[must_use]
    pub fn is_dead(&self) -> bool { self.dead }

    /// The configured ping interval.
    #[must_use]
    pub fn ping_interval(&self) -> Duration { self.ping_interval }

    /// The configured idle timeout.
    #[must_use]
    pub fn idle_timeout(&self) -> Duration { self.idle_timeout }
}
