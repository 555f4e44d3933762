use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::timeline::{CategoryId, PeriodRange, RequestVersion};

/// What the user activated: a data point, or one category segment of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrillTarget {
    pub bucket_index: usize,
    pub category_id: Option<CategoryId>,
}

impl DrillTarget {
    pub fn point(bucket_index: usize) -> Self {
        Self { bucket_index, category_id: None }
    }

    pub fn segment(bucket_index: usize, category_id: CategoryId) -> Self {
        Self { bucket_index, category_id: Some(category_id) }
    }
}

/// Element that opened the modal; focus goes back to it on close.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FocusTarget(pub String);

impl From<&str> for FocusTarget {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Request sent to the transaction-summary collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRequest {
    pub version: RequestVersion,
    pub period_start: NaiveDate,
    /// Inclusive.
    pub period_end: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<CategoryId>,
}

impl SummaryRequest {
    pub fn period(&self) -> PeriodRange {
        PeriodRange::new(self.period_start, self.period_end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub id: u64,
    pub date: NaiveDate,
    pub description: String,
    pub amount: f64,
    pub kind: TransactionKind,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
}

/// Totals and rows for one drilled-down period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodSummary {
    pub income: f64,
    pub expenses: f64,
    pub balance: f64,
    pub transactions: Vec<TransactionRecord>,
}

impl PeriodSummary {
    pub fn new(income: f64, expenses: f64, transactions: Vec<TransactionRecord>) -> Self {
        Self { income, expenses, balance: income - expenses, transactions }
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

/// The single message handed to the host transaction screen ("View all").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationIntent {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<CategoryId>,
}
