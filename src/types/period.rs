//! Defines the time granularity used when reducing a station's record run
//! into per-period summaries.

use chrono::{Datelike, NaiveDate};
use std::fmt;

/// The bucket width used when grouping observations for aggregation.
///
/// A record's period key is its date truncated to the selected width:
/// `"2009"` for [`Period::Yearly`], `"200908"` for [`Period::Monthly`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Period {
    /// One bucket per calendar year.
    Yearly,
    /// One bucket per calendar month.
    Monthly,
}

impl Period {
    /// Derives the period key for an observation date.
    pub(crate) fn key_for(self, date: NaiveDate) -> String {
        match self {
            Period::Yearly => format!("{:04}", date.year()),
            Period::Monthly => format!("{:04}{:02}", date.year(), date.month()),
        }
    }

    pub(crate) fn label(self) -> &'static str {
        match self {
            Period::Yearly => "yearly",
            Period::Monthly => "monthly",
        }
    }
}

/// Allows formatting a `Period` variant using its label.
///
/// # Examples
///
/// ```
/// use climacache::Period;
///
/// assert_eq!(format!("{}", Period::Yearly), "yearly");
/// assert_eq!(Period::Monthly.to_string(), "monthly");
/// ```
impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
