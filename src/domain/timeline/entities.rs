use chrono::NaiveDate;
use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};

use super::calendar::BucketCalendar;
use crate::domain::logging::LogComponent;
use crate::log_warn;

/// Value Object - category identifier shared with the transaction screens
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From, Into, Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct CategoryId(u64);

impl CategoryId {
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// One donut segment of a bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryAmount {
    #[serde(alias = "category_id")]
    pub category_id: CategoryId,
    pub amount: f64,
}

/// Domain entity - one aggregated period
///
/// A period without transactions still exists with zero totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeBucket {
    pub index: usize,
    pub period_start: NaiveDate,
    pub period_label: String,
    pub income: f64,
    pub expenses: f64,
    pub categories: Vec<CategoryAmount>,
}

impl TimeBucket {
    pub fn zero(index: usize, period_start: NaiveDate, period_label: String) -> Self {
        Self { index, period_start, period_label, income: 0.0, expenses: 0.0, categories: Vec::new() }
    }

    /// Zero bucket with the calendar's default label.
    pub fn empty_at(calendar: &BucketCalendar, index: usize) -> Option<Self> {
        let start = calendar.period_start(index)?;
        Some(Self::zero(index, start, calendar.granularity.label(start)))
    }

    pub fn balance(&self) -> f64 {
        self.income - self.expenses
    }

    pub fn is_empty(&self) -> bool {
        self.income == 0.0 && self.expenses == 0.0 && self.categories.is_empty()
    }
}

/// Bucket as delivered by the aggregation collaborator; any field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BucketPayload {
    #[serde(default)]
    pub period_start: Option<NaiveDate>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub income: Option<f64>,
    #[serde(default)]
    pub expenses: Option<f64>,
    #[serde(default)]
    pub categories: Option<Vec<CategoryAmount>>,
}

/// Place payloads on the calendar and fill every index of `start..start + width`.
///
/// Malformed entries are logged and degrade to zero values; nothing here fails.
pub fn normalize_buckets(
    calendar: &BucketCalendar,
    start_index: usize,
    width: usize,
    payloads: Vec<BucketPayload>,
) -> Vec<TimeBucket> {
    let end = start_index + width;
    let mut slots: Vec<Option<TimeBucket>> = vec![None; width];

    for payload in payloads {
        let Some(period_start) = payload.period_start else {
            log_warn!(
                LogComponent::Domain("Buckets"),
                "Dropping {} bucket without period_start",
                calendar.granularity
            );
            continue;
        };
        let Some(index) = calendar.index_of(period_start) else {
            log_warn!(
                LogComponent::Domain("Buckets"),
                "Dropping bucket {} before dataset origin {}",
                period_start,
                calendar.origin
            );
            continue;
        };
        if index < start_index || index >= end {
            continue;
        }

        let aligned = calendar.granularity.period_start(period_start);
        let malformed = !payload.income.is_some_and(f64::is_finite)
            || !payload.expenses.is_some_and(f64::is_finite);
        if malformed {
            log_warn!(
                LogComponent::Domain("Buckets"),
                "Bucket {} has missing or invalid totals, using zero",
                aligned
            );
        }

        slots[index - start_index] = Some(TimeBucket {
            index,
            period_start: aligned,
            period_label: payload
                .label
                .filter(|label| !label.trim().is_empty())
                .unwrap_or_else(|| calendar.granularity.label(aligned)),
            income: finite_or_zero(payload.income),
            expenses: finite_or_zero(payload.expenses),
            categories: payload
                .categories
                .unwrap_or_default()
                .into_iter()
                .filter(|segment| segment.amount.is_finite())
                .collect(),
        });
    }

    slots
        .into_iter()
        .enumerate()
        .filter_map(|(offset, slot)| {
            slot.or_else(|| TimeBucket::empty_at(calendar, start_index + offset))
        })
        .collect()
}

fn finite_or_zero(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(0.0)
}
