// 2022-2026 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//

use async_trait::async_trait;
use parking_lot::RwLock;

use super::models::Address;
use super::models::Page;
use super::models::WatchedAddress;
use super::StorageResult;

/// Read/write set of addresses a client asked to follow.
#[async_trait]
pub trait WatchlistStore: Send + Sync {
    /// Entries in the order they were first watched.
    async fn list(&self, limit: usize, offset: usize) -> StorageResult<Page<WatchedAddress>>;

    /// Adds `address`, or relabels it when already watched.
    async fn watch(&self, address: Address, label: Option<String>)
        -> StorageResult<WatchedAddress>;

    /// `false` when `address` was not watched.
    async fn unwatch(&self, address: &Address) -> StorageResult<bool>;
}

#[derive(Debug, Default)]
pub struct MemoryWatchlist {
    entries: RwLock<Vec<WatchedAddress>>,
}

#[async_trait]
impl WatchlistStore for MemoryWatchlist {
    async fn list(&self, limit: usize, offset: usize) -> StorageResult<Page<WatchedAddress>> {
        let entries = self.entries.read();
        Ok(Page {
            items: entries.iter().skip(offset).take(limit).cloned().collect(),
            total_count: Some(entries.len() as u64),
        })
    }

    async fn watch(
        &self,
        address: Address,
        label: Option<String>,
    ) -> StorageResult<WatchedAddress> {
        let mut entries = self.entries.write();
        if let Some(entry) = entries.iter_mut().find(|entry| entry.address == address) {
            entry.label = label;
            return Ok(entry.clone());
        }
        let entry = WatchedAddress {
            address,
            label,
            added_at: chrono::Utc::now().timestamp().max(0) as u64,
        };
        entries.push(entry.clone());
        tracing::debug!("watching {address}");
        Ok(entry)
    }

    async fn unwatch(&self, address: &Address) -> StorageResult<bool> {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|entry| entry.address != *address);
        let removed = entries.len() < before;
        if removed {
            tracing::debug!("unwatched {address}");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_watch_relabels_in_place() {
        let watchlist = MemoryWatchlist::default();
        let first = Address::from_low_u64(1);
        let second = Address::from_low_u64(2);

        let added = watchlist.watch(first, Some("cold wallet".into())).await.unwrap();
        watchlist.watch(second, None).await.unwrap();
        let relabeled = watchlist.watch(first, Some("treasury".into())).await.unwrap();
        assert_eq!(relabeled.added_at, added.added_at);

        let page = watchlist.list(10, 0).await.unwrap();
        assert_eq!(page.total_count, Some(2));
        assert_eq!(page.items[0].address, first);
        assert_eq!(page.items[0].label.as_deref(), Some("treasury"));
    }

    #[tokio::test]
    async fn test_unwatch() {
        let watchlist = MemoryWatchlist::default();
        let address = Address::from_low_u64(7);
        watchlist.watch(address, None).await.unwrap();

        assert!(watchlist.unwatch(&address).await.unwrap());
        assert!(!watchlist.unwatch(&address).await.unwrap());
        assert_eq!(watchlist.list(10, 0).await.unwrap().total_count, Some(0));
    }
}
