//! Defines the measurement channel selector used to pick one max/min/avg
//! group out of a record when aggregating.

use crate::types::record::{DailyRecord, Measurement};
use std::fmt;

/// One of the six measurement families carried by every daily record.
///
/// The aggregation routine is written once and parameterized by `Channel`;
/// the variant only decides which measurement group of each record feeds the
/// fold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Wind speed in km/h.
    WindSpeed,
    /// Cloud base height in meters.
    CloudHeight,
    /// Visibility (integer-valued at the source).
    Visibility,
    /// Air temperature in degrees Celsius.
    AirTemperature,
    /// Dew-point temperature in degrees Celsius.
    DewTemperature,
    /// Air pressure in hPa.
    AirPressure,
}

impl Channel {
    /// Every channel, in record field order.
    pub const ALL: [Channel; 6] = [
        Channel::WindSpeed,
        Channel::CloudHeight,
        Channel::Visibility,
        Channel::AirTemperature,
        Channel::DewTemperature,
        Channel::AirPressure,
    ];

    /// Selects this channel's measurement group from a record.
    ///
    /// The integer visibility channel is widened to the common float group
    /// so the fold works on one representation.
    pub(crate) fn values(self, record: &DailyRecord) -> Measurement {
        match self {
            Channel::WindSpeed => record.wind_speed,
            Channel::CloudHeight => record.cloud_height,
            Channel::Visibility => record.visibility.into(),
            Channel::AirTemperature => record.air_temperature,
            Channel::DewTemperature => record.dew_temperature,
            Channel::AirPressure => record.air_pressure,
        }
    }

    pub(crate) fn label(self) -> &'static str {
        match self {
            Channel::WindSpeed => "wind_speed",
            Channel::CloudHeight => "cloud_height",
            Channel::Visibility => "visibility",
            Channel::AirTemperature => "air_temperature",
            Channel::DewTemperature => "dew_temperature",
            Channel::AirPressure => "air_pressure",
        }
    }
}

/// Allows formatting a `Channel` variant using its label.
///
/// # Examples
///
/// ```
/// use climacache::Channel;
///
/// assert_eq!(format!("{}", Channel::WindSpeed), "wind_speed");
/// assert_eq!(Channel::AirPressure.to_string(), "air_pressure");
/// ```
impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
