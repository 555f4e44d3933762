pub mod drill_down_coordinator;
pub mod driver;
pub mod engine;
pub mod fetch_orchestrator;

pub use drill_down_coordinator::DrillDownCoordinator;
pub use driver::{TimelineDataSource, TimelineDriver};
pub use engine::{Effects, TimelineEngine, TimelineViewModel, ViewportAction};
pub use fetch_orchestrator::{FetchOrchestrator, FetchOutcome, FetchRequest, FetchStatus, RenderedWindow};
