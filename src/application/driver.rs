use futures::future::join_all;
use std::cell::RefCell;
use std::rc::Rc;
use strum::IntoEnumIterator;

use super::engine::{Effects, TimelineEngine, ViewportAction};
use super::fetch_orchestrator::{FetchOutcome, FetchRequest};
use crate::config::EngineConfig;
use crate::domain::drill_down::{PeriodSummary, SummaryRequest};
use crate::domain::errors::{FetchResult, TimelineError, TimelineResult};
use crate::domain::logging::{get_logger, LogComponent, LogLevel};
use crate::domain::timeline::{BucketPayload, DatasetBounds, Granularity};
use crate::log_warn;

/// Data collaborators of the engine: the aggregation backend and the
/// transaction-summary service.
#[allow(async_fn_in_trait)]
pub trait TimelineDataSource {
    async fn fetch_buckets(&self, request: &FetchRequest) -> FetchResult<Vec<BucketPayload>>;
    async fn dataset_bounds(&self, granularity: Granularity) -> FetchResult<DatasetBounds>;
    async fn period_summary(&self, request: &SummaryRequest) -> FetchResult<PeriodSummary>;
}

/// Runs the engine's `Effects` against a data source.
///
/// The engine borrow is never held across an `.await`, so events fired by a
/// completion may safely dispatch again.
pub struct TimelineDriver<S> {
    engine: Rc<RefCell<TimelineEngine>>,
    source: Rc<S>,
}

impl<S> Clone for TimelineDriver<S> {
    fn clone(&self) -> Self {
        Self { engine: Rc::clone(&self.engine), source: Rc::clone(&self.source) }
    }
}

impl<S: TimelineDataSource> TimelineDriver<S> {
    /// Load bounds for every granularity and build the engine.
    ///
    /// Only the default granularity is required; the others are skipped with a
    /// warning when their bounds fail to load.
    pub async fn mount(config: EngineConfig, source: S) -> TimelineResult<Self> {
        let loaded = load_bounds(&source).await;
        let default = config.default_granularity;
        if let Some((_, Err(error))) = loaded.iter().find(|(g, _)| *g == default) {
            return Err(TimelineError::Fetch(error.clone()));
        }
        let bounds: Vec<DatasetBounds> =
            loaded.into_iter().filter_map(|(_, result)| result.ok()).collect();
        let metadata = serde_json::to_string(&bounds).unwrap_or_default();
        let engine = TimelineEngine::new(config, bounds)?;

        get_logger().log_with_metadata(
            LogLevel::Info,
            LogComponent::Application("TimelineDriver"),
            "Timeline mounted",
            &metadata,
        );
        Ok(Self { engine: Rc::new(RefCell::new(engine)), source: Rc::new(source) })
    }

    pub fn engine(&self) -> Rc<RefCell<TimelineEngine>> {
        Rc::clone(&self.engine)
    }

    pub fn start(&self) -> Effects {
        self.engine.borrow_mut().start()
    }

    pub fn dispatch(&self, action: ViewportAction) -> Effects {
        self.engine.borrow_mut().dispatch(action)
    }

    pub fn animation_frame(&self) -> Effects {
        self.engine.borrow_mut().on_animation_frame()
    }

    /// Perform the I/O in `effects`. `request_frame` is left to the caller,
    /// who owns the frame scheduler.
    ///
    /// Returns the effects produced by a bounds refresh, if any.
    pub async fn run(&self, effects: Effects) -> Effects {
        let fetch = async {
            if let Some(request) = effects.fetch {
                self.execute_fetch(request).await;
            }
        };
        let summary = async {
            if let Some(request) = effects.summary {
                self.execute_summary(request).await;
            }
        };
        let bounds = async {
            if effects.refresh_bounds {
                self.refresh_bounds().await
            } else {
                Effects::none()
            }
        };
        let ((), (), follow_up) = futures::join!(fetch, summary, bounds);
        follow_up
    }

    pub async fn execute_fetch(&self, request: FetchRequest) -> FetchOutcome {
        let result = self.source.fetch_buckets(&request).await;
        self.engine.borrow_mut().complete_fetch(request.version, result)
    }

    pub async fn execute_summary(&self, request: SummaryRequest) -> FetchOutcome {
        let result = self.source.period_summary(&request).await;
        self.engine.borrow_mut().complete_summary(request.version, result)
    }

    /// Reload bounds after a transaction mutation and re-fit the viewport.
    pub async fn refresh_bounds(&self) -> Effects {
        let fresh: Vec<DatasetBounds> = load_bounds(self.source.as_ref())
            .await
            .into_iter()
            .filter_map(|(_, result)| result.ok())
            .collect();
        self.dispatch(ViewportAction::BoundsRefreshed(fresh))
    }
}

async fn load_bounds<S: TimelineDataSource>(
    source: &S,
) -> Vec<(Granularity, FetchResult<DatasetBounds>)> {
    let results = join_all(Granularity::iter().map(|g| source.dataset_bounds(g))).await;
    Granularity::iter()
        .zip(results)
        .inspect(|(granularity, result)| {
            if let Err(error) = result {
                log_warn!(
                    LogComponent::Application("TimelineDriver"),
                    "Bounds for {} unavailable: {}",
                    granularity,
                    error
                );
            }
        })
        .collect()
}
