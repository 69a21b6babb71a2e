//! Cycle pacing for the detection loop.

use std::time::Duration;

use orangeface_common::clock::frame_interval;
use tokio::sync::mpsc;
use tokio::time::{interval, Interval, MissedTickBehavior};

/// Source of "run the next cycle" signals.
///
/// The loop awaits one tick per cycle, only after the previous cycle has
/// finished, so a scheduler never causes cycles to overlap.
#[async_trait::async_trait]
pub trait TickScheduler: Send {
    /// Wait for the next tick. Returns `false` once no more ticks will come.
    async fn next_tick(&mut self) -> bool;
}

/// Fixed-rate ticks from a tokio interval.
///
/// Ticks missed while a cycle overran are skipped, so a slow detector
/// drops frames instead of building a backlog. Must be created inside a
/// tokio runtime.
#[derive(Debug)]
pub struct IntervalScheduler {
    interval: Interval,
    limit: Option<u64>,
    issued: u64,
}

impl IntervalScheduler {
    pub fn new(target_fps: u32) -> Self {
        Self::with_period(frame_interval(target_fps))
    }

    pub fn with_period(period: Duration) -> Self {
        let mut interval = interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self {
            interval,
            limit: None,
            issued: 0,
        }
    }

    /// Stop after `ticks` ticks.
    pub fn with_limit(mut self, ticks: u64) -> Self {
        self.limit = Some(ticks);
        self
    }

    pub fn period(&self) -> Duration {
        self.interval.period()
    }
}

#[async_trait::async_trait]
impl TickScheduler for IntervalScheduler {
    async fn next_tick(&mut self) -> bool {
        if self.limit.is_some_and(|limit| self.issued >= limit) {
            return false;
        }
        self.interval.tick().await;
        self.issued += 1;
        true
    }
}

/// Create a connected ticker/scheduler pair for manual pacing.
pub fn manual_scheduler() -> (ManualTicker, ManualScheduler) {
    let (tx, rx) = mpsc::channel(1);
    (ManualTicker { tx }, ManualScheduler { rx })
}

/// Test driver: ticks are injected by the caller.
#[derive(Debug)]
pub struct ManualScheduler {
    rx: mpsc::Receiver<()>,
}

/// Handle that injects ticks into a [`ManualScheduler`].
///
/// At most one tick is pending at a time; extra ticks sent while one is
/// pending are merged into it.
#[derive(Debug, Clone)]
pub struct ManualTicker {
    tx: mpsc::Sender<()>,
}

impl ManualTicker {
    /// Request a cycle. Returns `false` if the scheduler is gone.
    pub fn tick(&self) -> bool {
        match self.tx.try_send(()) {
            Ok(()) | Err(mpsc::error::TrySendError::Full(())) => true,
            Err(mpsc::error::TrySendError::Closed(())) => false,
        }
    }
}

#[async_trait::async_trait]
impl TickScheduler for ManualScheduler {
    async fn next_tick(&mut self) -> bool {
        self.rx.recv().await.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_manual_ticks_coalesce() {
        let (ticker, mut scheduler) = manual_scheduler();
        assert!(ticker.tick());
        assert!(ticker.tick());
        assert!(ticker.tick());
        assert!(scheduler.next_tick().await);

        drop(ticker);
        assert!(!scheduler.next_tick().await);
    }

    #[tokio::test]
    async fn test_ticker_reports_closed_scheduler() {
        let (ticker, scheduler) = manual_scheduler();
        drop(scheduler);
        assert!(!ticker.tick());
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_limit() {
        let mut scheduler = IntervalScheduler::new(30).with_limit(2);
        assert!(scheduler.next_tick().await);
        assert!(scheduler.next_tick().await);
        assert!(!scheduler.next_tick().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_skips_missed_ticks() {
        let mut scheduler = IntervalScheduler::with_period(Duration::from_millis(10));
        let start = tokio::time::Instant::now();
        assert!(scheduler.next_tick().await);
        tokio::time::sleep(Duration::from_millis(55)).await;
        // one overdue tick fires immediately, then the schedule realigns
        assert!(scheduler.next_tick().await);
        assert!(scheduler.next_tick().await);
        assert_eq!(start.elapsed(), Duration::from_millis(60));
    }
}
