//! The temporal reduction: folds a station's daily records into one
//! max/min/avg summary per period for a selected measurement channel.

use crate::aggregate::channel::Channel;
use crate::types::period::Period;
use crate::types::record::DailyRecord;
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Seed for the running maximum; any real observation replaces it.
const MAX_SEED: f64 = -1000.0;
/// Seed for the running minimum; any real observation replaces it.
const MIN_SEED: f64 = 1000.0;

/// One aggregated period for one channel.
///
/// Serialized with the wire field names the front-end charts expect:
/// `category`, `max`, `min`, `average`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryItem {
    /// The period key, e.g. `"2009"` or `"200908"`.
    #[serde(rename = "category")]
    pub period: String,
    /// Largest per-record maximum seen in the period.
    pub max: f64,
    /// Smallest per-record minimum seen in the period.
    pub min: f64,
    /// Truncated mean of the per-record averages in the period.
    pub average: i32,
}

/// A period bucket being folded. Kept in discovery order so the final sort,
/// which compares years only, leaves same-year buckets where they first
/// appeared.
struct Bucket {
    key: String,
    year: i32,
    max: f64,
    min: f64,
    sum: f64,
    count: usize,
}

impl Bucket {
    fn new(key: String, year: i32) -> Self {
        Self {
            key,
            year,
            max: MAX_SEED,
            min: MIN_SEED,
            sum: 0.0,
            count: 0,
        }
    }
}

/// Reduces `records` to per-period summaries of one measurement channel.
///
/// Records are grouped by their date truncated to `period`; within each
/// group the summary takes the largest per-record `max`, the smallest
/// per-record `min`, and the integer-truncated mean of the per-record `avg`
/// values. The result is ordered by ascending year; groups sharing a year
/// keep the order in which they were first encountered.
///
/// A station with no records yields an empty vector. Buckets are created
/// only when a record lands in them, so a summary never describes an empty
/// group.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use climacache::{summarize, Channel, DailyRecord, IntMeasurement, Measurement, Period};
///
/// let record = DailyRecord {
///     station_id: "724940".to_owned(),
///     date: NaiveDate::from_ymd_opt(2009, 8, 1).unwrap(),
///     wind_direction: 270,
///     wind_speed: Measurement::new(14.0, 3.0, 8.0),
///     cloud_height: Measurement::new(1200.0, 300.0, 700.0),
///     visibility: IntMeasurement::new(16, 2, 9),
///     air_temperature: Measurement::from_tenths(251.0, 119.0, 183.0),
///     dew_temperature: Measurement::from_tenths(142.0, 61.0, 101.0),
///     air_pressure: Measurement::new(1021.0, 1008.0, 1014.0),
/// };
///
/// let items = summarize(&[record], Channel::AirTemperature, Period::Yearly);
/// assert_eq!(items.len(), 1);
/// assert_eq!(items[0].period, "2009");
/// assert_eq!(items[0].max, 25.1);
/// ```
pub fn summarize(records: &[DailyRecord], channel: Channel, period: Period) -> Vec<SummaryItem> {
    let mut buckets: Vec<Bucket> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for record in records {
        let key = period.key_for(record.date);
        let slot = match index.get(&key) {
            Some(&slot) => slot,
            None => {
                let slot = buckets.len();
                index.insert(key.clone(), slot);
                buckets.push(Bucket::new(key, record.date.year()));
                slot
            }
        };

        let values = channel.values(record);
        let bucket = &mut buckets[slot];
        if values.max > bucket.max {
            bucket.max = values.max;
        }
        if values.min < bucket.min {
            bucket.min = values.min;
        }
        bucket.sum += values.avg;
        bucket.count += 1;
    }

    buckets.sort_by_key(|bucket| bucket.year);

    log::debug!(
        "summarized {} records into {} {} {} buckets",
        records.len(),
        buckets.len(),
        period,
        channel,
    );

    buckets
        .into_iter()
        .map(|bucket| SummaryItem {
            period: bucket.key,
            max: bucket.max,
            min: bucket.min,
            average: (bucket.sum / bucket.count as f64) as i32,
        })
        .collect()
}
