use std::{sync::Arc, time::Duration};

use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tracing::{info, warn};

use super::repo::SessionStore;

const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Periodically delete expired session rows. Reads check expiry on their
/// own, so a late sweep never resurrects a session.
pub fn spawn_cleanup(store: Arc<dyn SessionStore>, every: Duration) -> JoinHandle<()> {
    // tokio::time::interval panics on a zero period
    let every = every.max(MIN_INTERVAL);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match store.cleanup_expired().await {
                Ok(0) => {}
                Ok(removed) => info!(removed, "expired sessions removed"),
                Err(e) => warn!(error = %e, "session cleanup failed"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sessions::memory::MemorySessionStore;

    #[tokio::test]
    async fn sweeper_deletes_expired_rows() {
        let store = Arc::new(MemorySessionStore::default());
        let live = store.insert(1).await.unwrap();
        let dead = store.insert(2).await.unwrap();
        store.expire(&dead);

        let handle = spawn_cleanup(store.clone(), Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.abort();

        assert!(store.contains(&live));
        assert!(!store.contains(&dead));
    }

    #[tokio::test]
    async fn zero_interval_still_sweeps() {
        let store = Arc::new(MemorySessionStore::default());
        let dead = store.insert(1).await.unwrap();
        store.expire(&dead);

        let handle = spawn_cleanup(store.clone(), Duration::ZERO);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!handle.is_finished(), "sweeper task died");
        handle.abort();

        assert!(!store.contains(&dead));
    }
}
