//! Host-supplied engine configuration.
//!
//! Every field has a default, so `{}` is a valid configuration document.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::errors::TimelineError;
use crate::domain::timeline::{Granularity, GranularityBounds, MinimapMapper};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    pub default_granularity: Granularity,
    /// Replaces the built-in width table for the listed tiers.
    pub granularity_overrides: HashMap<Granularity, GranularityBounds>,
    pub minimap: MinimapConfig,
    pub api: ApiConfig,
    pub labels: AriaLabels,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_granularity: Granularity::Monthly,
            granularity_overrides: HashMap::new(),
            minimap: MinimapConfig::default(),
            api: ApiConfig::default(),
            labels: AriaLabels::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_json(raw: &str) -> Result<Self, TimelineError> {
        let config: EngineConfig = serde_json::from_str(raw)
            .map_err(|e| TimelineError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), TimelineError> {
        for bounds in self.granularity_overrides.values() {
            bounds.validate()?;
        }
        self.minimap.validate()
    }

    pub fn bounds_for(&self, granularity: Granularity) -> GranularityBounds {
        self.granularity_overrides
            .get(&granularity)
            .copied()
            .unwrap_or_else(|| granularity.bounds())
    }

    pub fn minimap_mapper(&self) -> MinimapMapper {
        MinimapMapper::new(self.minimap.min_thumb_ratio, self.minimap.max_thumb_ratio)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MinimapConfig {
    pub min_thumb_ratio: f64,
    pub max_thumb_ratio: f64,
}

impl Default for MinimapConfig {
    fn default() -> Self {
        let mapper = MinimapMapper::default();
        Self { min_thumb_ratio: mapper.min_thumb_ratio, max_thumb_ratio: mapper.max_thumb_ratio }
    }
}

impl MinimapConfig {
    fn validate(&self) -> Result<(), TimelineError> {
        let valid = self.min_thumb_ratio > 0.0
            && self.min_thumb_ratio <= self.max_thumb_ratio
            && self.max_thumb_ratio < 1.0;
        if valid {
            Ok(())
        } else {
            Err(TimelineError::InvalidConfig(format!(
                "minimap thumb ratios must satisfy 0 < min <= max < 1, got {} / {}",
                self.min_thumb_ratio, self.max_thumb_ratio
            )))
        }
    }
}

/// Aggregation backend endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ApiConfig {
    pub base_url: String,
    pub buckets_path: String,
    pub bounds_path: String,
    pub summary_path: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            buckets_path: "/api/analytics/buckets".to_string(),
            bounds_path: "/api/analytics/bounds".to_string(),
            summary_path: "/api/transactions/summary".to_string(),
        }
    }
}

/// Localized accessible names; the host translates, the engine only places them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AriaLabels {
    pub region: String,
    pub description: String,
    pub prev: String,
    pub next: String,
    pub reset: String,
    pub minimap: String,
    pub loading: String,
    pub loaded: String,
    pub error: String,
    pub retry: String,
    pub dialog: String,
    pub close: String,
    pub view_all: String,
    pub empty: String,
}

impl Default for AriaLabels {
    fn default() -> Self {
        Self {
            region: "Income and expenses over time".to_string(),
            description: "Use the arrow keys to move through periods, Home and End to jump.".to_string(),
            prev: "Previous period".to_string(),
            next: "Next period".to_string(),
            reset: "Back to present".to_string(),
            minimap: "Timeline overview".to_string(),
            loading: "Loading data".to_string(),
            loaded: "Showing".to_string(),
            error: "Could not load data".to_string(),
            retry: "Retry".to_string(),
            dialog: "Period details".to_string(),
            close: "Close".to_string(),
            view_all: "View all transactions".to_string(),
            empty: "No transactions in this period".to_string(),
        }
    }
}
