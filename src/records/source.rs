//! The seam between the core and the persistence layer that actually owns
//! the weather archive.

use crate::records::error::SourceError;
use crate::types::record::DailyRecord;
use std::future::Future;

/// Narrows a fetch to part of a station's archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RecordFilter {
    /// The station's full record run.
    #[default]
    All,
    /// Only observations from the given calendar year.
    Year(i32),
}

/// The persistence collaborator the core calls on a cache miss.
///
/// Implementations wrap whatever actually stores the archive (a SQL
/// database in the system this crate serves). They must return records in
/// ascending date order and already unit-normalized — channels the source
/// stores in tenths go through
/// [`Measurement::from_tenths`](crate::Measurement::from_tenths) on the way
/// out.
///
/// The core treats a fetch failure as fatal to the request: the error is
/// propagated unchanged and nothing is cached.
pub trait RecordSource {
    /// Fetches the daily records for one station.
    fn fetch_records(
        &self,
        station_id: &str,
        filter: &RecordFilter,
    ) -> impl Future<Output = Result<Vec<DailyRecord>, SourceError>> + Send;
}
