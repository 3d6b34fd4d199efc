//! This module provides the main entry point for the crate: the client that
//! gates station weather lookups behind bearer-token sessions, resolves
//! record runs through the bounded cache, and reduces them to per-period
//! summaries. It calls out to an injected persistence collaborator on cache
//! misses and never touches a database or the network itself.

use crate::aggregate::channel::Channel;
use crate::aggregate::summarize::{summarize, SummaryItem};
use crate::cache::lru::RecordCache;
use crate::cache::updates::CacheUpdate;
use crate::error::ClimacacheError;
use crate::records::source::{RecordFilter, RecordSource};
use crate::session::store::SessionStore;
use crate::types::period::Period;
use crate::types::record::DailyRecord;
use bon::bon;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Stations cached at once unless the builder overrides it.
pub const DEFAULT_CACHE_CAPACITY: usize = 15;

/// The session-gated weather lookup core.
///
/// One `Climacache` is constructed at process start and shared by reference
/// with every request handler; all of its state lives behind internal locks,
/// so `&self` methods may be called concurrently. The generic parameter is
/// the persistence collaborator consulted on cache misses.
///
/// Create an instance with [`Climacache::builder`].
///
/// # Examples
///
/// ```
/// use climacache::{Climacache, DailyRecord, RecordFilter, RecordSource, SourceError};
///
/// struct ArchiveDb;
///
/// impl RecordSource for ArchiveDb {
///     async fn fetch_records(
///         &self,
///         _station_id: &str,
///         _filter: &RecordFilter,
///     ) -> Result<Vec<DailyRecord>, SourceError> {
///         Ok(Vec::new())
///     }
/// }
///
/// # async fn run() -> Result<(), climacache::ClimacacheError> {
/// let gate = Climacache::builder().source(ArchiveDb).build()?;
/// let token = gate.open_session().station_id("724940").call().await?;
/// assert_eq!(gate.station_for(&token).await.as_deref(), Some("724940"));
/// # Ok(())
/// # }
/// ```
pub struct Climacache<S: RecordSource> {
    cache: RecordCache,
    sessions: SessionStore,
    source: S,
    update_notifier: Option<mpsc::Sender<CacheUpdate>>,
}

#[bon]
impl<S: RecordSource> Climacache<S> {
    /// Creates a new `Climacache` client.
    ///
    /// This method uses a builder pattern.
    ///
    /// # Arguments
    ///
    /// * `.source(S)`: **Required.** The persistence collaborator fetched
    ///   from on cache misses.
    /// * `.cache_capacity(Option<usize>)`: Optional. Maximum number of
    ///   stations cached at once. Defaults to [`DEFAULT_CACHE_CAPACITY`].
    ///   Fixed for the life of the client.
    /// * `.update_notifier(Option<Sender<CacheUpdate>>)`: Optional. Receives
    ///   a [`CacheUpdate`] after every cache write, for a diagnostic
    ///   observer such as
    ///   [`spawn_update_observer`](crate::spawn_update_observer). Events are
    ///   dropped rather than awaited when the channel is full.
    ///
    /// # Errors
    ///
    /// Returns [`ClimacacheError::InvalidCacheCapacity`] when the requested
    /// capacity is zero.
    #[builder]
    pub fn new(
        source: S,
        cache_capacity: Option<usize>,
        update_notifier: Option<mpsc::Sender<CacheUpdate>>,
    ) -> Result<Self, ClimacacheError> {
        let capacity = cache_capacity.unwrap_or(DEFAULT_CACHE_CAPACITY);
        let capacity =
            NonZeroUsize::new(capacity).ok_or(ClimacacheError::InvalidCacheCapacity)?;

        Ok(Self {
            cache: RecordCache::new(capacity),
            sessions: SessionStore::new(),
            source,
            update_notifier,
        })
    }

    /// Opens a session for a resolved station and returns its bearer token.
    ///
    /// The station's records are resolved through the cache first (fetching
    /// from the collaborator on a miss), so the summaries the new session
    /// will request are served from memory. When the request carries a prior
    /// token that still maps to a live session, that session is destroyed
    /// before the new token is minted — a refresh invalidates the old
    /// credential rather than leaving two live ones.
    ///
    /// This method uses a builder pattern.
    ///
    /// # Arguments
    ///
    /// * `.station_id(&str)`: **Required.** The station the session may read.
    /// * `.prior_token(Option<&str>)`: Optional. The token the request
    ///   already carried, if any.
    ///
    /// # Errors
    ///
    /// Returns [`ClimacacheError::Source`] when the collaborator fetch
    /// fails; in that case no session is created or destroyed and nothing is
    /// cached. Returns [`ClimacacheError::Session`] when the entropy source
    /// fails while minting the token.
    #[builder]
    pub async fn open_session(
        &self,
        station_id: &str,
        prior_token: Option<&str>,
    ) -> Result<String, ClimacacheError> {
        self.records_for(station_id).await?;

        if let Some(prior) = prior_token {
            if self.sessions.get(prior).await.is_some() {
                self.sessions.destroy(prior).await;
                log::debug!("destroyed prior session before refresh");
            }
        }

        let token = self.sessions.generate(station_id).await?;
        log::info!("opened session for station {station_id}");
        Ok(token)
    }

    /// Returns the station id a token is allowed to read, or `None` when the
    /// token carries no live session. A miss is a normal outcome, not an
    /// error.
    pub async fn station_for(&self, token: &str) -> Option<String> {
        self.sessions.get(token).await
    }

    /// Resolves the record run for a station, consulting the cache first.
    ///
    /// On a miss the persistence collaborator is called exactly once and the
    /// result cached before being returned; there is no retry loop.
    /// Concurrent misses for the same station may each fetch independently,
    /// and the cache converges on whichever write lands last. The returned
    /// sequence is a shared read-only snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`ClimacacheError::Source`] when the collaborator fails; the
    /// cache is left untouched.
    pub async fn records_for(
        &self,
        station_id: &str,
    ) -> Result<Arc<[DailyRecord]>, ClimacacheError> {
        if let Some(records) = self.cache.get(station_id).await {
            log::debug!("cache hit for station {station_id}");
            return Ok(records);
        }

        log::info!("cache miss for station {station_id}, fetching from source");
        let fetched = self
            .source
            .fetch_records(station_id, &RecordFilter::All)
            .await?;
        let records: Arc<[DailyRecord]> = fetched.into();

        if let Some((evicted, _)) = self.cache.insert(station_id, Arc::clone(&records)).await {
            log::debug!("evicted cached records for station {evicted}");
        }
        self.log_recency_order().await;
        self.notify_update(station_id).await;

        Ok(records)
    }

    /// Produces per-period summaries of one measurement channel for the
    /// station a token is entitled to.
    ///
    /// Returns `Ok(None)` when the token carries no live session — the
    /// caller decides how to send the client back through station
    /// resolution. Otherwise the station's records are resolved through the
    /// cache (see [`records_for`](Self::records_for)) and reduced with
    /// [`summarize`].
    ///
    /// # Errors
    ///
    /// Returns [`ClimacacheError::Source`] when a cache miss's fetch fails.
    pub async fn summaries_for(
        &self,
        token: &str,
        channel: Channel,
        period: Period,
    ) -> Result<Option<Vec<SummaryItem>>, ClimacacheError> {
        let Some(station_id) = self.sessions.get(token).await else {
            return Ok(None);
        };

        let records = self.records_for(&station_id).await?;
        Ok(Some(summarize(&records, channel, period)))
    }

    /// Walks the cache from most- to least-recently-used at debug level.
    async fn log_recency_order(&self) {
        if !log::log_enabled!(log::Level::Debug) {
            return;
        }
        let mut order = Vec::new();
        self.cache
            .range(|key, records| {
                order.push(format!("{key}({})", records.len()));
                true
            })
            .await;
        log::debug!("cache recency order: {}", order.join(" > "));
    }

    async fn notify_update(&self, station_id: &str) {
        let Some(notifier) = self.update_notifier.as_ref() else {
            return;
        };
        let update = CacheUpdate {
            station_id: station_id.to_owned(),
            entries: self.cache.len().await,
        };
        if notifier.try_send(update).is_err() {
            log::debug!("cache update channel full or closed, dropping diagnostic event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::error::SourceError;
    use crate::types::record::{IntMeasurement, Measurement};
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn record(station_id: &str, year: i32, month: u32, day: u32, speed_avg: f64) -> DailyRecord {
        DailyRecord {
            station_id: station_id.to_owned(),
            date: NaiveDate::from_ymd_opt(year, month, day).unwrap(),
            wind_direction: 180,
            wind_speed: Measurement::new(speed_avg + 2.0, speed_avg - 2.0, speed_avg),
            cloud_height: Measurement::new(1000.0, 200.0, 500.0),
            visibility: IntMeasurement::new(16, 2, 9),
            air_temperature: Measurement::from_tenths(250.0, 100.0, 180.0),
            dew_temperature: Measurement::from_tenths(150.0, 50.0, 90.0),
            air_pressure: Measurement::new(1020.0, 1000.0, 1010.0),
        }
    }

    /// Collaborator double that counts fetches and can be scripted to fail.
    struct ScriptedSource {
        calls: AtomicUsize,
        fail: bool,
    }

    impl ScriptedSource {
        fn ok() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: true,
            }
        }

        fn fetches(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl RecordSource for ScriptedSource {
        async fn fetch_records(
            &self,
            station_id: &str,
            _filter: &RecordFilter,
        ) -> Result<Vec<DailyRecord>, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(SourceError::new(station_id, "connection refused"));
            }
            Ok(vec![
                record(station_id, 2009, 1, 1, 10.0),
                record(station_id, 2009, 2, 15, 20.0),
                record(station_id, 2010, 6, 1, 30.0),
            ])
        }
    }

    fn gate(source: ScriptedSource) -> Climacache<ScriptedSource> {
        Climacache::builder().source(source).build().unwrap()
    }

    #[test]
    fn zero_capacity_is_rejected_at_construction() {
        let result = Climacache::builder()
            .source(ScriptedSource::ok())
            .cache_capacity(0)
            .build();
        assert!(matches!(
            result,
            Err(ClimacacheError::InvalidCacheCapacity)
        ));
    }

    #[tokio::test]
    async fn miss_fetches_once_then_serves_from_cache() {
        let gate = gate(ScriptedSource::ok());

        let first = gate.records_for("724940").await.unwrap();
        let second = gate.records_for("724940").await.unwrap();

        assert_eq!(gate.source.fetches(), 1);
        assert_eq!(first.len(), 3);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn distinct_stations_fetch_independently() {
        let gate = gate(ScriptedSource::ok());

        gate.records_for("724940").await.unwrap();
        gate.records_for("703810").await.unwrap();

        assert_eq!(gate.source.fetches(), 2);
        assert_eq!(gate.cache.len().await, 2);
    }

    #[tokio::test]
    async fn upstream_failure_propagates_and_caches_nothing() {
        let gate = gate(ScriptedSource::failing());

        let result = gate.records_for("724940").await;
        assert!(matches!(result, Err(ClimacacheError::Source(_))));
        assert!(gate.cache.is_empty().await);
        assert!(gate.sessions.is_empty().await);
    }

    #[tokio::test]
    async fn open_session_warms_the_cache_and_mints_a_token() {
        let gate = gate(ScriptedSource::ok());

        let token = gate
            .open_session()
            .station_id("724940")
            .call()
            .await
            .unwrap();

        assert_eq!(gate.station_for(&token).await.as_deref(), Some("724940"));
        assert_eq!(gate.source.fetches(), 1);
        assert_eq!(gate.cache.len().await, 1);
    }

    #[tokio::test]
    async fn refresh_destroys_the_prior_session() {
        let gate = gate(ScriptedSource::ok());

        let first = gate
            .open_session()
            .station_id("724940")
            .call()
            .await
            .unwrap();
        let second = gate
            .open_session()
            .station_id("703810")
            .prior_token(&first)
            .call()
            .await
            .unwrap();

        assert_eq!(gate.station_for(&first).await, None);
        assert_eq!(gate.station_for(&second).await.as_deref(), Some("703810"));
        assert_eq!(gate.sessions.len().await, 1);
    }

    #[tokio::test]
    async fn stale_prior_token_is_ignored_on_refresh() {
        let gate = gate(ScriptedSource::ok());

        let token = gate
            .open_session()
            .station_id("724940")
            .prior_token("left-over-cookie")
            .call()
            .await
            .unwrap();

        assert_eq!(gate.station_for(&token).await.as_deref(), Some("724940"));
        assert_eq!(gate.sessions.len().await, 1);
    }

    #[tokio::test]
    async fn failed_warmup_leaves_sessions_untouched() {
        let gate = gate(ScriptedSource::failing());

        let result = gate
            .open_session()
            .station_id("724940")
            .call()
            .await;

        assert!(matches!(result, Err(ClimacacheError::Source(_))));
        assert!(gate.sessions.is_empty().await);
    }

    #[tokio::test]
    async fn summaries_for_unknown_token_is_a_normal_miss() {
        let gate = gate(ScriptedSource::ok());

        let result = gate
            .summaries_for("no-such-token", Channel::WindSpeed, Period::Yearly)
            .await
            .unwrap();
        assert!(result.is_none());
        assert_eq!(gate.source.fetches(), 0);
    }

    #[tokio::test]
    async fn summaries_flow_from_session_to_aggregation() {
        let gate = gate(ScriptedSource::ok());
        let token = gate
            .open_session()
            .station_id("724940")
            .call()
            .await
            .unwrap();

        let items = gate
            .summaries_for(&token, Channel::WindSpeed, Period::Yearly)
            .await
            .unwrap()
            .unwrap();

        let keys: Vec<&str> = items.iter().map(|item| item.period.as_str()).collect();
        assert_eq!(keys, ["2009", "2010"]);
        assert_eq!(items[0].average, 15);
        // Warmed by open_session, so no further fetch happened.
        assert_eq!(gate.source.fetches(), 1);
    }

    #[tokio::test]
    async fn cache_writes_emit_update_events() {
        let (tx, mut rx) = mpsc::channel(4);
        let gate = Climacache::builder()
            .source(ScriptedSource::ok())
            .update_notifier(tx)
            .build()
            .unwrap();

        gate.records_for("724940").await.unwrap();

        let update = rx.recv().await.unwrap();
        assert_eq!(update.station_id, "724940");
        assert_eq!(update.entries, 1);
    }
}
