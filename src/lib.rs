mod aggregate;
mod cache;
mod climacache;
mod error;
mod records;
mod session;
mod types;

pub use error::ClimacacheError;
pub use climacache::*;

pub use aggregate::channel::Channel;
pub use aggregate::summarize::{summarize, SummaryItem};

pub use cache::lru::RecordCache;
pub use cache::updates::{spawn_update_observer, CacheUpdate};

pub use records::error::SourceError;
pub use records::source::{RecordFilter, RecordSource};

pub use session::error::SessionError;
pub use session::store::SessionStore;

pub use types::period::Period;
pub use types::record::{DailyRecord, IntMeasurement, Measurement};
