use std::sync::{Arc, Mutex};

use tracing::{debug, error, info, warn};

use crate::{
    foundation::core::{Fps, TICKS_PER_MILLISECOND},
    foundation::error::{RenderTestError, RenderTestResult},
    foundation::sync::lock,
    schedule::worker::{Activity, ActivityId, Executor},
    trace::SCHEDULE,
};

/// Timing of one activation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameTiming {
    /// Tick the activation was invoked at.
    pub scheduled: u64,
    /// Ticks since the previous activation (or since start, for the first one).
    pub since_last: u64,
    /// 0-based index of this frame since the last start.
    pub number: u64,
}

impl FrameTiming {
    pub fn since_last_ms(&self) -> u64 {
        self.since_last / TICKS_PER_MILLISECOND
    }
}

/// Work executed once per activation while the scheduler is running.
pub trait FramePass: Send {
    fn render_frame(&mut self, timing: &FrameTiming) -> RenderTestResult<()>;
}

struct SchedulerState<P> {
    /// 0 while stopped; otherwise the tick of the last activation (or of the start).
    last_frame: u64,
    activation: Option<ActivityId>,
    frames: u64,
    last_error: Option<RenderTestError>,
    pass: P,
}

struct SchedulerCore<P> {
    state: Mutex<SchedulerState<P>>,
    interval: u64,
}

impl<P: FramePass> Activity for SchedulerCore<P> {
    fn activity(&self, scheduled: u64) -> u64 {
        let mut state = lock(&self.state);

        if state.last_frame == 0 {
            info!(target: SCHEDULE, "canceling render attempt");
            return 0;
        }

        let timing = FrameTiming {
            scheduled,
            since_last: scheduled.saturating_sub(state.last_frame),
            number: state.frames,
        };
        debug!(
            target: SCHEDULE,
            frame = timing.number,
            since_last_ms = timing.since_last_ms(),
            "new frame"
        );

        match state.pass.render_frame(&timing) {
            Ok(()) => {}
            Err(err) if err.is_recoverable() => {
                warn!(
                    target: SCHEDULE,
                    frame = timing.number,
                    error = %err,
                    "frame failed, retrying next frame"
                );
            }
            Err(err) => {
                error!(
                    target: SCHEDULE,
                    frame = timing.number,
                    error = %err,
                    "frame failed, stopping"
                );
                state.last_frame = 0;
                state.activation = None;
                state.last_error = Some(err);
                return 0;
            }
        }

        state.last_frame = scheduled.max(1);
        state.frames += 1;
        scheduled + self.interval
    }
}

/// Re-arms a [`FramePass`] with an [`Executor`] at a fixed frame rate.
///
/// One lock orders `start`, `stop` and every activation. The last-frame timestamp is the only
/// record of whether the scheduler runs: 0 means stopped. An activation that was dispatched
/// before `stop` but takes the lock after it sees 0 and does nothing.
pub struct FrameScheduler<P: FramePass + 'static> {
    core: Arc<SchedulerCore<P>>,
    executor: Arc<dyn Executor>,
}

impl<P: FramePass + 'static> FrameScheduler<P> {
    pub fn new(executor: Arc<dyn Executor>, fps: Fps, pass: P) -> Self {
        Self {
            core: Arc::new(SchedulerCore {
                state: Mutex::new(SchedulerState {
                    last_frame: 0,
                    activation: None,
                    frames: 0,
                    last_error: None,
                    pass,
                }),
                interval: fps.interval_ticks(),
            }),
            executor,
        }
    }

    /// Ticks between two activations.
    pub fn interval(&self) -> u64 {
        self.core.interval
    }

    /// Arm the scheduler. Starting while running re-arms and resets the frame timestamp.
    pub fn start(&self) {
        let mut state = lock(&self.core.state);
        if let Some(previous) = state.activation.take() {
            self.executor.revoke(previous);
        }
        state.last_frame = self.executor.now().max(1);
        state.frames = 0;
        state.last_error = None;

        let activity: Arc<dyn Activity> = self.core.clone();
        state.activation = Some(self.executor.submit(activity));
    }

    /// Disarm the scheduler. No activation renders after this returns. Safe when stopped.
    pub fn stop(&self) {
        let mut state = lock(&self.core.state);
        if let Some(activation) = state.activation.take() {
            self.executor.revoke(activation);
        }
        state.last_frame = 0;
    }

    pub fn running(&self) -> bool {
        lock(&self.core.state).last_frame != 0
    }

    /// Frames rendered since the last start.
    pub fn frames(&self) -> u64 {
        lock(&self.core.state).frames
    }

    /// The error that stopped the scheduler, if any.
    pub fn take_error(&self) -> Option<RenderTestError> {
        lock(&self.core.state).last_error.take()
    }

    /// Run `f` on the pass under the scheduler lock.
    pub fn with_pass<R>(&self, f: impl FnOnce(&mut P) -> R) -> R {
        f(&mut lock(&self.core.state).pass)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/schedule/scheduler.rs"]
mod tests;
