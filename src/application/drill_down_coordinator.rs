use crate::domain::drill_down::{
    CloseReason, DrillTarget, FocusTarget, ModalContext, ModalState, NavigationIntent,
    PeriodSummary, SummaryRequest,
};
use crate::domain::errors::FetchError;
use crate::domain::logging::LogComponent;
use crate::domain::timeline::{DatasetBounds, RequestVersion};
use crate::{log_debug, log_info, log_warn};

use super::fetch_orchestrator::FetchOutcome;

/// Drill-Down Coordinator: owns the modal and its own request versioning.
///
/// Opening a second target while a summary is loading makes the first response
/// stale, exactly like the bucket fetches.
#[derive(Debug, Default)]
pub struct DrillDownCoordinator {
    modal: ModalState,
    version: RequestVersion,
}

impl DrillDownCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn modal(&self) -> &ModalState {
        &self.modal
    }

    pub fn current_version(&self) -> RequestVersion {
        self.version
    }

    /// Open the modal for `target`. Targets outside the dataset are ignored.
    pub fn activate(
        &mut self,
        target: DrillTarget,
        trigger: FocusTarget,
        dataset: &DatasetBounds,
    ) -> Option<SummaryRequest> {
        if !dataset.contains(target.bucket_index) {
            log_warn!(
                LogComponent::Application("DrillDown"),
                "Ignoring activation of bucket {} outside {}..={}",
                target.bucket_index,
                dataset.earliest_index,
                dataset.latest_index
            );
            return None;
        }
        let period = dataset.calendar().period(target.bucket_index)?;

        self.version = self.version.next();
        let request = SummaryRequest {
            version: self.version,
            period_start: period.start,
            period_end: period.end,
            category_id: target.category_id,
        };
        log_info!(
            LogComponent::Application("DrillDown"),
            "Opening {} summary {} .. {}",
            request.version,
            period.start,
            period.end
        );
        self.modal = ModalState::opened(ModalContext { target, request, trigger });
        Some(request)
    }

    pub fn complete(
        &mut self,
        version: RequestVersion,
        result: Result<PeriodSummary, FetchError>,
    ) -> FetchOutcome {
        if version != self.version || !self.modal.is_loading() {
            log_debug!(
                LogComponent::Application("DrillDown"),
                "Discarding stale summary {} (current {})",
                version,
                self.version
            );
            return FetchOutcome::Stale;
        }

        let modal = std::mem::take(&mut self.modal);
        match result {
            Ok(summary) => {
                self.modal = modal.resolved(summary);
                FetchOutcome::Applied
            }
            Err(error) => {
                log_warn!(LogComponent::Application("DrillDown"), "Summary {} failed: {}", version, error);
                self.modal = modal.failed(error.kind);
                FetchOutcome::Failed(error.kind)
            }
        }
    }

    /// Re-request a failed summary under a fresh version.
    pub fn retry(&mut self) -> Option<SummaryRequest> {
        let ModalState::Failed { context, .. } = &self.modal else {
            return None;
        };
        let mut context = context.clone();
        self.version = self.version.next();
        context.request.version = self.version;
        let request = context.request;
        self.modal = ModalState::opened(context);
        Some(request)
    }

    /// Close the modal; returns the trigger that should get focus back.
    pub fn close(&mut self, reason: CloseReason) -> Option<FocusTarget> {
        if !self.modal.is_open() {
            return None;
        }
        log_debug!(LogComponent::Application("DrillDown"), "Closing modal ({:?})", reason);
        let (closed, trigger) = std::mem::take(&mut self.modal).close();
        self.modal = closed;
        // A late summary for the closed modal must not reopen anything.
        self.version = self.version.next();
        trigger
    }

    /// "View all": hand the period (and category) to the transaction screen and close.
    pub fn view_all(&mut self) -> Option<NavigationIntent> {
        let request = self.modal.context()?.request;
        let intent = NavigationIntent {
            start_date: request.period_start,
            end_date: request.period_end,
            category_id: request.category_id,
        };
        self.modal = ModalState::Closed;
        self.version = self.version.next();
        Some(intent)
    }
}
