use std::sync::Arc;
use std::time::Duration;

use super::MarketStore;
use crate::clock::Clock;

/// Drives `MarketStore::advance_tick` on a fixed cadence.
pub struct Ticker {
    store: MarketStore,
    clock: Arc<dyn Clock>,
    interval: Duration,
}

impl Ticker {
    pub fn new(store: MarketStore, clock: Arc<dyn Clock>, interval: Duration) -> Self {
        Self {
            store,
            clock,
            interval,
        }
    }

    /// Runs until the task is dropped.
    pub async fn run(self) {
        tracing::info!("market ticker started, every {:?}", self.interval);
        loop {
            self.clock.sleep(self.interval).await;
            self.store.advance_tick();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::store::tests::virtual_store;
    use crate::models::MarketEvent;

    #[tokio::test]
    async fn ticks_follow_virtual_time() {
        let (store, clock) = virtual_store();
        let mut events = store.subscribe();
        let ticker = Ticker::new(store.clone(), clock.clone(), Duration::from_secs(5));
        let handle = tokio::spawn(ticker.run());

        tokio::task::yield_now().await;
        clock.advance(Duration::from_secs(4));
        tokio::task::yield_now().await;
        assert!(events.try_recv().is_err());

        clock.advance(Duration::from_secs(1));
        assert!(matches!(events.recv().await.unwrap(), MarketEvent::Tick { .. }));

        clock.advance(Duration::from_secs(5));
        assert!(matches!(events.recv().await.unwrap(), MarketEvent::Tick { .. }));

        handle.abort();
    }
}
