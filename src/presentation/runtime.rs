//! Browser scheduling around `TimelineDriver`: animation frames for the
//! coalesced fetch, `spawn_local` for I/O, and a view-model sink per host.

use leptos::{request_animation_frame, spawn_local};
use std::rc::Rc;

use crate::application::{Effects, TimelineDataSource, TimelineDriver, TimelineViewModel, ViewportAction};

/// Receives a fresh view model after every state change.
pub type ViewModelSink = Rc<dyn Fn(TimelineViewModel)>;

pub struct TimelineRuntime<S> {
    driver: TimelineDriver<S>,
    sink: ViewModelSink,
    track_px: f64,
}

impl<S> Clone for TimelineRuntime<S> {
    fn clone(&self) -> Self {
        Self { driver: self.driver.clone(), sink: Rc::clone(&self.sink), track_px: self.track_px }
    }
}

impl<S: TimelineDataSource + 'static> TimelineRuntime<S> {
    pub fn new(driver: TimelineDriver<S>, sink: ViewModelSink, track_px: f64) -> Self {
        Self { driver, sink, track_px }
    }

    pub fn driver(&self) -> &TimelineDriver<S> {
        &self.driver
    }

    pub fn track_px(&self) -> f64 {
        self.track_px
    }

    pub fn set_track_px(&mut self, track_px: f64) {
        self.track_px = track_px;
    }

    pub fn start(&self) {
        let effects = self.driver.start();
        self.refresh();
        self.perform(effects);
    }

    /// Continuous input (drag moves, wheel) only repaints from the frame
    /// callback; every change it makes also schedules a frame.
    pub fn dispatch(&self, action: ViewportAction) {
        let continuous = action.is_continuous();
        let effects = self.driver.dispatch(action);
        if !continuous {
            self.refresh();
        }
        self.perform(effects);
    }

    pub fn view_model(&self) -> TimelineViewModel {
        self.driver.engine().borrow().view_model(self.track_px)
    }

    /// Push the current view model to the sink. The engine is not borrowed
    /// while the sink runs, so it may dispatch again.
    pub fn refresh(&self) {
        let model = self.view_model();
        (self.sink)(model);
    }

    fn perform(&self, effects: Effects) {
        if effects.request_frame {
            let runtime = self.clone();
            request_animation_frame(move || {
                let effects = runtime.driver.animation_frame();
                runtime.refresh();
                runtime.perform(effects);
            });
        }

        let io = Effects { request_frame: false, ..effects };
        if io.is_empty() {
            return;
        }
        let runtime = self.clone();
        spawn_local(async move {
            let follow_up = runtime.driver.run(io).await;
            runtime.refresh();
            runtime.perform(follow_up);
        });
    }
}
