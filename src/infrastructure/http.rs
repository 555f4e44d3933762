//! REST adapter for the aggregation backend and the transaction-summary service.

use chrono::NaiveDate;
use gloo::net::http::Request;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::application::{FetchRequest, TimelineDataSource};
use crate::config::ApiConfig;
use crate::domain::drill_down::{PeriodSummary, SummaryRequest, TransactionRecord};
use crate::domain::errors::{FetchError, FetchResult};
use crate::domain::logging::{get_logger, LogComponent};
use crate::domain::timeline::{BucketPayload, DatasetBounds, Granularity};

/// Bucket response; the backend may wrap the array or send it bare.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum BucketsResponse {
    Wrapped { buckets: Vec<BucketPayload> },
    Bare(Vec<BucketPayload>),
}

impl BucketsResponse {
    pub fn into_payloads(self) -> Vec<BucketPayload> {
        match self {
            BucketsResponse::Wrapped { buckets } | BucketsResponse::Bare(buckets) => buckets,
        }
    }
}

/// Oldest and newest transaction dates; both absent for an empty ledger.
#[derive(Debug, Deserialize)]
pub struct BoundsResponse {
    #[serde(default)]
    pub oldest_date: Option<NaiveDate>,
    #[serde(default)]
    pub newest_date: Option<NaiveDate>,
}

impl BoundsResponse {
    pub fn into_bounds(self, granularity: Granularity, today: NaiveDate) -> DatasetBounds {
        match (self.oldest_date, self.newest_date) {
            (Some(oldest), Some(newest)) => {
                DatasetBounds::from_transaction_dates(granularity, oldest, newest.max(oldest))
            }
            (Some(date), None) | (None, Some(date)) => {
                DatasetBounds::from_transaction_dates(granularity, date, date)
            }
            (None, None) => DatasetBounds::single(granularity, today),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SummaryResponse {
    #[serde(default)]
    pub income: f64,
    #[serde(default)]
    pub expenses: f64,
    #[serde(default)]
    pub transactions: Vec<TransactionRecord>,
}

impl From<SummaryResponse> for PeriodSummary {
    fn from(response: SummaryResponse) -> Self {
        PeriodSummary::new(response.income, response.expenses, response.transactions)
    }
}

pub fn buckets_url(api: &ApiConfig, request: &FetchRequest) -> String {
    let (start_date, end_date) = request.period.to_query_dates();
    format!(
        "{}{}?start_date={}&end_date={}&granularity={}",
        api.base_url.trim_end_matches('/'),
        api.buckets_path,
        start_date,
        end_date,
        request.granularity.as_query()
    )
}

pub fn bounds_url(api: &ApiConfig, granularity: Granularity) -> String {
    format!(
        "{}{}?granularity={}",
        api.base_url.trim_end_matches('/'),
        api.bounds_path,
        granularity.as_query()
    )
}

pub fn summary_url(api: &ApiConfig, request: &SummaryRequest) -> String {
    let (start_date, end_date) = request.period().to_query_dates();
    let mut url = format!(
        "{}{}?start_date={}&end_date={}",
        api.base_url.trim_end_matches('/'),
        api.summary_path,
        start_date,
        end_date
    );
    if let Some(category) = request.category_id {
        url.push_str(&format!("&category_id={}", category));
    }
    url
}

/// `TimelineDataSource` over `gloo::net::http`.
#[derive(Debug, Clone)]
pub struct RestTimelineSource {
    api: ApiConfig,
}

impl RestTimelineSource {
    pub fn new(api: ApiConfig) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &ApiConfig {
        &self.api
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> FetchResult<T> {
        get_logger().debug(LogComponent::Infrastructure("RestTimelineSource"), &format!("GET {}", url));

        let response = Request::get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| FetchError::network(format!("Request failed: {}", e)))?;

        if !response.ok() {
            let status = response.status();
            get_logger().warn(
                LogComponent::Infrastructure("RestTimelineSource"),
                &format!("HTTP {} {} for {}", status, response.status_text(), url),
            );
            return Err(FetchError::http(status, response.status_text()));
        }

        let text = response
            .text()
            .await
            .map_err(|e| FetchError::network(format!("Failed to read response: {}", e)))?;
        serde_json::from_str(&text).map_err(|e| FetchError::parse(e.to_string()))
    }
}

impl TimelineDataSource for RestTimelineSource {
    async fn fetch_buckets(&self, request: &FetchRequest) -> FetchResult<Vec<BucketPayload>> {
        let response: BucketsResponse = self.get_json(&buckets_url(&self.api, request)).await?;
        Ok(response.into_payloads())
    }

    async fn dataset_bounds(&self, granularity: Granularity) -> FetchResult<DatasetBounds> {
        let response: BoundsResponse = self.get_json(&bounds_url(&self.api, granularity)).await?;
        Ok(response.into_bounds(granularity, chrono::Utc::now().date_naive()))
    }

    async fn period_summary(&self, request: &SummaryRequest) -> FetchResult<PeriodSummary> {
        let response: SummaryResponse = self.get_json(&summary_url(&self.api, request)).await?;
        Ok(response.into())
    }
}
