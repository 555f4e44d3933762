//! Fetch Orchestrator.
//!
//! Sans-IO: viewport changes go in through `request`, at most one `FetchRequest`
//! comes out per `flush` (once per animation frame), and transport results come
//! back through `complete`. Only a response stamped with the current version is
//! applied; anything older is dropped without surfacing an error.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::domain::errors::{ErrorKind, FetchError};
use crate::domain::logging::LogComponent;
use crate::domain::timeline::{
    normalize_buckets, BucketCalendar, BucketPayload, Granularity, PeriodRange, RequestVersion,
    TimeBucket, ViewportState,
};
use crate::{log_debug, log_warn};

/// One `fetchBuckets(granularity, startIndex, width)` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchRequest {
    pub version: RequestVersion,
    pub granularity: Granularity,
    pub start_index: usize,
    pub width: usize,
    /// `start_date` / `end_date` resolved from the index range.
    pub period: PeriodRange,
}

/// What happened to a completed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied,
    /// Superseded by a newer request; discarded.
    Stale,
    Failed(ErrorKind),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchStatus {
    pub loading: bool,
    pub error: Option<ErrorKind>,
}

/// Data currently handed to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedWindow {
    pub viewport: ViewportState,
    pub buckets: Vec<TimeBucket>,
}

/// Buckets of one granularity, keyed by index.
#[derive(Debug, Clone, Default)]
pub struct BucketCache {
    buckets: BTreeMap<usize, TimeBucket>,
}

impl BucketCache {
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn insert_all(&mut self, buckets: Vec<TimeBucket>) {
        for bucket in buckets {
            self.buckets.insert(bucket.index, bucket);
        }
    }

    /// Smallest contiguous `(start, width)` covering every missing index of the window.
    pub fn missing_span(&self, start: usize, width: usize) -> Option<(usize, usize)> {
        let end = start + width;
        let first = (start..end).find(|index| !self.buckets.contains_key(index))?;
        let last = (start..end).rev().find(|index| !self.buckets.contains_key(index))?;
        Some((first, last - first + 1))
    }

    pub fn window(&self, start: usize, width: usize) -> Option<Vec<TimeBucket>> {
        (start..start + width).map(|index| self.buckets.get(&index).cloned()).collect()
    }
}

#[derive(Debug, Clone, Copy)]
struct Target {
    viewport: ViewportState,
    calendar: BucketCalendar,
}

#[derive(Debug, Default)]
pub struct FetchOrchestrator {
    current_version: RequestVersion,
    caches: HashMap<Granularity, BucketCache>,
    /// Latest viewport asked for, not yet flushed.
    pending: Option<Target>,
    /// Viewport served by `current_version`.
    wanted: Option<Target>,
    in_flight: Option<FetchRequest>,
    status: FetchStatus,
    rendered: Option<RenderedWindow>,
}

impl FetchOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_version(&self) -> RequestVersion {
        self.current_version
    }

    pub fn status(&self) -> FetchStatus {
        self.status
    }

    pub fn rendered(&self) -> Option<&RenderedWindow> {
        self.rendered.as_ref()
    }

    pub fn in_flight(&self) -> Option<&FetchRequest> {
        self.in_flight.as_ref()
    }

    pub fn cache(&self, granularity: Granularity) -> Option<&BucketCache> {
        self.caches.get(&granularity)
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Record the viewport to load. Calls between two flushes coalesce.
    pub fn request(&mut self, viewport: ViewportState, calendar: BucketCalendar) {
        self.pending = Some(Target { viewport, calendar });
    }

    /// Settle the pending viewport: serve it from cache or issue one request.
    ///
    /// Either way the version moves forward, so responses to anything issued
    /// earlier are stale from here on.
    pub fn flush(&mut self) -> Option<FetchRequest> {
        let target = self.pending.take()?;
        self.current_version = self.current_version.next();
        self.wanted = Some(target);
        self.in_flight = None;
        self.issue(target)
    }

    fn issue(&mut self, target: Target) -> Option<FetchRequest> {
        let viewport = target.viewport;
        let cache = self.caches.entry(viewport.granularity).or_default();

        let Some((start_index, width)) = cache.missing_span(viewport.start_index, viewport.width)
        else {
            let buckets = cache.window(viewport.start_index, viewport.width).unwrap_or_default();
            log_debug!(
                LogComponent::Application("FetchOrchestrator"),
                "{} served {} {}..={} from cache",
                self.current_version,
                viewport.granularity,
                viewport.start_index,
                viewport.end_index()
            );
            self.rendered = Some(RenderedWindow { viewport, buckets });
            self.status = FetchStatus { loading: false, error: None };
            return None;
        };

        let Some(period) = target.calendar.span(start_index, width) else {
            log_warn!(
                LogComponent::Application("FetchOrchestrator"),
                "Index range {}+{} has no calendar period, skipping fetch",
                start_index,
                width
            );
            return None;
        };

        let request = FetchRequest {
            version: self.current_version,
            granularity: viewport.granularity,
            start_index,
            width,
            period,
        };
        log_debug!(
            LogComponent::Application("FetchOrchestrator"),
            "{} fetching {} {}+{} ({} .. {})",
            request.version,
            request.granularity,
            start_index,
            width,
            period.start,
            period.end
        );
        self.in_flight = Some(request);
        self.status.loading = true;
        Some(request)
    }

    /// Apply a transport result if it is still the current request.
    pub fn complete(
        &mut self,
        version: RequestVersion,
        result: Result<Vec<BucketPayload>, FetchError>,
    ) -> FetchOutcome {
        let current = match self.in_flight {
            Some(request) if request.version == version && version == self.current_version => request,
            _ => {
                log_debug!(
                    LogComponent::Application("FetchOrchestrator"),
                    "Discarding stale response {} (current {})",
                    version,
                    self.current_version
                );
                return FetchOutcome::Stale;
            }
        };
        self.in_flight = None;
        self.status.loading = false;

        let Some(target) = self.wanted else {
            return FetchOutcome::Stale;
        };

        match result {
            Ok(payloads) => {
                let buckets =
                    normalize_buckets(&target.calendar, current.start_index, current.width, payloads);
                let cache = self.caches.entry(current.granularity).or_default();
                cache.insert_all(buckets);

                let viewport = target.viewport;
                let buckets = cache
                    .window(viewport.start_index, viewport.width)
                    .unwrap_or_else(|| {
                        normalize_buckets(&target.calendar, viewport.start_index, viewport.width, Vec::new())
                    });
                self.rendered = Some(RenderedWindow { viewport, buckets });
                self.status.error = None;
                FetchOutcome::Applied
            }
            Err(error) => {
                log_warn!(
                    LogComponent::Application("FetchOrchestrator"),
                    "Fetch {} failed: {}",
                    version,
                    error
                );
                self.status.error = Some(error.kind);
                FetchOutcome::Failed(error.kind)
            }
        }
    }

    /// Re-issue the current viewport after a failure. Only explicit user action calls this.
    pub fn retry(&mut self) -> Option<FetchRequest> {
        if self.status.error.is_none() || self.in_flight.is_some() {
            return None;
        }
        self.pending = self.pending.or(self.wanted);
        self.flush()
    }

    /// Make every in-flight response stale (e.g. on a granularity switch).
    pub fn cancel_in_flight(&mut self) {
        if self.in_flight.take().is_some() {
            self.current_version = self.current_version.next();
            self.status.loading = false;
        }
    }

    pub fn invalidate(&mut self, granularity: Granularity) {
        self.caches.remove(&granularity);
    }

    /// Drop every cached bucket; transaction data changed underneath.
    pub fn invalidate_all(&mut self) {
        self.caches.clear();
        self.cancel_in_flight();
    }
}
