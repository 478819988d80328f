use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeDelta};
use tokio::sync::watch;

/// Time source for everything in the simulation that waits or stamps.
#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;

    async fn sleep(&self, duration: Duration);
}

/// Wall clock backed by tokio timers.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Clock that only moves when `advance` is called. Sleepers wake once the
/// virtual elapsed time reaches their deadline.
#[derive(Debug)]
#[cfg_attr(not(test), allow(dead_code))]
pub struct VirtualClock {
    start: DateTime<Local>,
    elapsed: watch::Sender<Duration>,
}

#[cfg_attr(not(test), allow(dead_code))]
impl VirtualClock {
    pub fn new(start: DateTime<Local>) -> Self {
        let (elapsed, _) = watch::channel(Duration::ZERO);
        Self { start, elapsed }
    }

    pub fn advance(&self, by: Duration) {
        self.elapsed.send_modify(|elapsed| *elapsed += by);
    }

    pub fn elapsed(&self) -> Duration {
        *self.elapsed.borrow()
    }
}

#[async_trait]
impl Clock for VirtualClock {
    fn now(&self) -> DateTime<Local> {
        let offset = TimeDelta::from_std(self.elapsed()).unwrap_or_else(|_| TimeDelta::zero());
        self.start + offset
    }

    async fn sleep(&self, duration: Duration) {
        let mut rx = self.elapsed.subscribe();
        let deadline = *rx.borrow_and_update() + duration;

        while *rx.borrow_and_update() < deadline {
            // the sender lives in `self`, so this only fails if the clock is gone
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}

/// Chart axis label, e.g. `14:32`.
pub fn minute_label(at: DateTime<Local>) -> String {
    at.format("%H:%M").to_string()
}
