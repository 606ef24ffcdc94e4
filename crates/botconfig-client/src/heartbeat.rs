//! Heartbeat timer and ack staleness check.
//!
//! The monitor arms a repeating timer once `HELLO` arrives, or at the default
//! interval when `READY` comes first. Each tick is
//! reported through a callback; the owner then asks [`HeartbeatMonitor::is_stale`]
//! and either sends a `HEARTBEAT` or forces a reconnect. The link counts as
//! stale when no ack arrived for longer than two intervals plus a grace
//! period, so a single lost ack is tolerated.

use std::time::Duration;

use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Heartbeat state for the current transport.
#[derive(Debug)]
pub struct HeartbeatMonitor {
    default_interval: Duration,
    grace: Duration,
    interval: Duration,
    last_ack: Instant,
    cancel: Option<CancellationToken>,
}

impl HeartbeatMonitor {
    /// Create a stopped monitor.
    pub fn new(default_interval: Duration, grace: Duration) -> Self {
        Self {
            default_interval,
            grace,
            interval: default_interval,
            last_ack: Instant::now(),
            cancel: None,
        }
    }

    /// Cancel any running timer, reset the ack clock and arm a new timer.
    ///
    /// `on_tick` runs once per interval, first after one full interval. A
    /// late tick pushes the following ones back instead of bursting. The
    /// timer stops when `on_tick` returns `false` or [`stop`](Self::stop) is
    /// called.
    pub fn start<F>(&mut self, interval: Duration, on_tick: F)
    where
        F: Fn() -> bool + Send + 'static,
    {
        self.stop();
        self.interval = interval;
        self.last_ack = Instant::now();

        let mut ticker = time::interval_at(self.last_ack + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        drop(tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if !on_tick() {
                            break;
                        }
                    }
                    () = token.cancelled() => break,
                }
            }
        }));
        self.cancel = Some(cancel);
    }

    /// Cancel the timer. No-op when stopped.
    pub fn stop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel.cancel();
        }
    }

    /// Whether a timer is armed.
    pub fn is_active(&self) -> bool {
        self.cancel.is_some()
    }

    /// Record an ack received at `now`.
    pub fn record_ack(&mut self, now: Instant) {
        self.last_ack = now;
    }

    /// Current interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Interval used when the server did not announce one.
    pub fn default_interval(&self) -> Duration {
        self.default_interval
    }

    /// Longest tolerated gap between acks.
    pub fn stale_after(&self) -> Duration {
        self.interval * 2 + self.grace
    }

    /// Whether the last ack is older than [`stale_after`](Self::stale_after).
    pub fn is_stale(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.last_ack) > self.stale_after()
    }
}

impl Drop for HeartbeatMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}
