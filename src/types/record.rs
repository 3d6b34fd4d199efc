//! Defines the data structures representing a single station-day weather
//! observation as retrieved from the persistence layer: the observation
//! itself and the per-channel max/min/avg measurement groups it carries.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A max/min/avg group for one measurement channel of one observation day.
///
/// All values are in the channel's natural unit (km/h, meters, degrees
/// Celsius, hPa). Sources that report a channel in tenths of a unit must go
/// through [`Measurement::from_tenths`] so that aggregation always sees
/// natural units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Largest value observed during the day.
    pub max: f64,
    /// Smallest value observed during the day.
    pub min: f64,
    /// Mean value over the day's readings.
    pub avg: f64,
}

impl Measurement {
    /// Creates a measurement group already expressed in natural units.
    pub const fn new(max: f64, min: f64, avg: f64) -> Self {
        Self { max, min, avg }
    }

    /// Creates a measurement group from values stored in tenths of a unit.
    ///
    /// The upstream archive stores air and dew-point temperature in tenths
    /// of a degree Celsius; dividing here keeps that conversion at the data
    /// boundary so every consumer downstream sees degrees.
    pub fn from_tenths(max: f64, min: f64, avg: f64) -> Self {
        Self {
            max: max / 10.0,
            min: min / 10.0,
            avg: avg / 10.0,
        }
    }
}

/// A max/min/avg group for an integer-valued channel (visibility).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntMeasurement {
    /// Largest value observed during the day.
    pub max: i32,
    /// Smallest value observed during the day.
    pub min: i32,
    /// Mean value over the day's readings.
    pub avg: i32,
}

impl IntMeasurement {
    /// Creates an integer measurement group.
    pub const fn new(max: i32, min: i32, avg: i32) -> Self {
        Self { max, min, avg }
    }
}

impl From<IntMeasurement> for Measurement {
    fn from(value: IntMeasurement) -> Self {
        Measurement::new(value.max as f64, value.min as f64, value.avg as f64)
    }
}

/// One day's weather observation for one station.
///
/// Records are immutable once constructed and are held by value in the cache
/// entry that owns them; callers receive them back as shared read-only
/// snapshots. The persistence layer is responsible for producing records in
/// date order with all channels already unit-normalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    /// Identifier of the station that produced the observation.
    pub station_id: String,
    /// Calendar day of the observation.
    pub date: NaiveDate,
    /// Prevailing wind direction in degrees.
    pub wind_direction: i32,
    /// Wind speed over the day (km/h).
    pub wind_speed: Measurement,
    /// Cloud base height over the day (meters).
    pub cloud_height: Measurement,
    /// Visibility over the day (integer channel at the source).
    pub visibility: IntMeasurement,
    /// Air temperature over the day (degrees Celsius; tenths at the source).
    pub air_temperature: Measurement,
    /// Dew-point temperature over the day (degrees Celsius; tenths at the source).
    pub dew_temperature: Measurement,
    /// Air pressure over the day (hPa).
    pub air_pressure: Measurement,
}
