//! Cache-mutation notifications and the diagnostic consumer that observes
//! them.
//!
//! The observer only logs. It is the attachment point for a future cache
//! maintenance policy and intentionally performs no eviction, resizing, or
//! any other corrective action of its own.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Emitted after a station's records are written into the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheUpdate {
    /// Station whose records were stored or replaced.
    pub station_id: String,
    /// Number of live cache entries right after the write.
    pub entries: usize,
}

/// Spawns the low-priority consumer of cache-update events.
///
/// The task runs until every sender is dropped. Pair it with a bounded
/// [`mpsc::channel`]; producers send with `try_send` and drop events on a
/// full buffer, so a slow observer never backs up the request path.
pub fn spawn_update_observer(mut updates: mpsc::Receiver<CacheUpdate>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(update) = updates.recv().await {
            log::debug!(
                "cache holds {} entries after update for station {}",
                update.entries,
                update.station_id
            );
        }
        log::debug!("cache update channel closed, observer exiting");
    })
}
