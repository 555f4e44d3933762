use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{AsRefStr, Display as StrumDisplay, EnumIter, EnumString};

use crate::domain::errors::TimelineError;

/// Value Object - bucket size tier
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    PartialOrd,
    Ord,
    StrumDisplay,
    EnumIter,
    EnumString,
    AsRefStr,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Granularity {
    Daily,
    Weekly,
    #[default]
    Monthly,
    Quarterly,
}

impl Granularity {
    /// Wire name used by the aggregation backend (`granularity=` query parameter).
    pub fn as_query(&self) -> &str {
        self.as_ref()
    }

    /// Parse a host-supplied name, reporting unknown tiers as an error.
    pub fn parse(name: &str) -> Result<Self, TimelineError> {
        Granularity::from_str(name.trim())
            .map_err(|_| TimelineError::UnknownGranularity(name.to_string()))
    }

    /// Built-in viewport width table.
    pub fn bounds(&self) -> GranularityBounds {
        match self {
            Granularity::Daily => GranularityBounds::new(3, 120, 14, 1, 7),
            Granularity::Weekly => GranularityBounds::new(4, 52, 12, 1, 2),
            Granularity::Monthly => GranularityBounds::new(3, 24, 6, 1, 1),
            Granularity::Quarterly => GranularityBounds::new(2, 12, 4, 1, 1),
        }
    }
}

/// `boundsFor` by name, for hosts that pass granularities as strings.
pub fn bounds_for(name: &str) -> Result<GranularityBounds, TimelineError> {
    Granularity::parse(name).map(|granularity| granularity.bounds())
}

/// Value Object - width limits and step sizes of one granularity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GranularityBounds {
    pub min_width: usize,
    pub max_width: usize,
    pub default_width: usize,
    /// Buckets moved by one prev/next activation.
    pub step: usize,
    /// Width change applied by one wheel tick.
    pub zoom_step: usize,
}

impl GranularityBounds {
    pub const fn new(
        min_width: usize,
        max_width: usize,
        default_width: usize,
        step: usize,
        zoom_step: usize,
    ) -> Self {
        Self { min_width, max_width, default_width, step, zoom_step }
    }

    pub fn validate(&self) -> Result<(), TimelineError> {
        if self.min_width == 0 {
            return Err(TimelineError::InvalidConfig("min_width must be at least 1".into()));
        }
        if !(self.min_width <= self.default_width && self.default_width <= self.max_width) {
            return Err(TimelineError::InvalidConfig(format!(
                "expected min <= default <= max, got {} / {} / {}",
                self.min_width, self.default_width, self.max_width
            )));
        }
        if self.step == 0 || self.zoom_step == 0 {
            return Err(TimelineError::InvalidConfig("step and zoom_step must be at least 1".into()));
        }
        Ok(())
    }
}

/// Value Object - addressable bucket range of one granularity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetBounds {
    pub granularity: Granularity,
    /// Period start of bucket 0.
    pub origin: chrono::NaiveDate,
    pub earliest_index: usize,
    /// The "present" bucket.
    pub latest_index: usize,
    pub total_buckets: usize,
}

/// Prev/next direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NavDirection {
    Prev,
    Next,
}

impl NavDirection {
    pub fn signum(&self) -> i64 {
        match self {
            NavDirection::Prev => -1,
            NavDirection::Next => 1,
        }
    }
}

/// Value Object - the visible window
///
/// Replaced on every transition, never mutated in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewportState {
    pub granularity: Granularity,
    pub start_index: usize,
    pub width: usize,
}

impl ViewportState {
    pub fn new(granularity: Granularity, start_index: usize, width: usize) -> Self {
        Self { granularity, start_index, width }
    }

    /// Last visible bucket (inclusive).
    pub fn end_index(&self) -> usize {
        self.start_index + self.width.saturating_sub(1)
    }

    pub fn contains(&self, index: usize) -> bool {
        index >= self.start_index && index <= self.end_index()
    }

    pub fn indices(&self) -> std::ops::RangeInclusive<usize> {
        self.start_index..=self.end_index()
    }
}

/// Monotonic stamp used to discard superseded responses
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Display, From, Into,
    Serialize, Deserialize,
)]
#[display(fmt = "v{}", _0)]
pub struct RequestVersion(u64);

impl RequestVersion {
    pub fn value(&self) -> u64 {
        self.0
    }

    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}
