use thiserror::Error;

/// Failure reported by the persistence collaborator while fetching a
/// station's records. Propagated to the caller unchanged; the cache is never
/// populated from a failed fetch.
#[derive(Debug, Error)]
#[error("record source failed for station '{station}'")]
pub struct SourceError {
    station: String,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
}

impl SourceError {
    /// Wraps a collaborator failure for `station`.
    pub fn new(
        station: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self {
            station: station.into(),
            source: source.into(),
        }
    }

    /// The station whose fetch failed.
    pub fn station(&self) -> &str {
        &self.station
    }
}
