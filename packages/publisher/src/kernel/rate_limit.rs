//! In-process fixed-window rate limit counters.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::Mutex;

use super::BaseRateLimitStore;

struct Window {
    count: u32,
    expires_at: Instant,
}

/// Counters held in memory. Fine for one instance; a shared deployment
/// plugs in a shared store behind the same trait.
#[derive(Default)]
pub struct InMemoryRateLimitStore {
    windows: Mutex<HashMap<String, Window>>,
}

impl InMemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BaseRateLimitStore for InMemoryRateLimitStore {
    async fn get(&self, key: &str) -> Result<Option<u32>> {
        let windows = self.windows.lock().await;
        Ok(windows
            .get(key)
            .filter(|w| w.expires_at > Instant::now())
            .map(|w| w.count))
    }

    async fn increment(&self, key: &str, window: Duration) -> Result<u32> {
        let now = Instant::now();
        let mut windows = self.windows.lock().await;

        let entry = windows.entry(key.to_string()).or_insert(Window {
            count: 0,
            expires_at: now + window,
        });
        if entry.expires_at <= now {
            entry.count = 0;
            entry.expires_at = now + window;
        }
        entry.count += 1;

        Ok(entry.count)
    }

    async fn expire(&self, key: &str) -> Result<()> {
        self.windows.lock().await.remove(key);
        Ok(())
    }

    async fn purge_expired(&self) -> Result<usize> {
        let now = Instant::now();
        let mut windows = self.windows.lock().await;
        let before = windows.len();
        windows.retain(|_, w| w.expires_at > now);
        Ok(before - windows.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_increment_counts_within_window() {
        let store = InMemoryRateLimitStore::new();
        let window = Duration::from_secs(60);

        assert_eq!(store.increment("1.2.3.4", window).await.unwrap(), 1);
        assert_eq!(store.increment("1.2.3.4", window).await.unwrap(), 2);
        assert_eq!(store.increment("5.6.7.8", window).await.unwrap(), 1);
        assert_eq!(store.get("1.2.3.4").await.unwrap(), Some(2));
    }

    #[tokio::test]
    async fn test_elapsed_window_restarts() {
        let store = InMemoryRateLimitStore::new();

        store.increment("ip", Duration::from_millis(5)).await.unwrap();
        store.increment("ip", Duration::from_millis(5)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(store.get("ip").await.unwrap(), None);
        assert_eq!(
            store.increment("ip", Duration::from_secs(60)).await.unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn test_expire_and_purge() {
        let store = InMemoryRateLimitStore::new();

        store.increment("a", Duration::from_secs(60)).await.unwrap();
        store.expire("a").await.unwrap();
        assert_eq!(store.get("a").await.unwrap(), None);

        store.increment("b", Duration::from_millis(1)).await.unwrap();
        store.increment("c", Duration::from_secs(60)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(store.purge_expired().await.unwrap(), 1);
        assert_eq!(store.get("c").await.unwrap(), Some(1));
    }
}
