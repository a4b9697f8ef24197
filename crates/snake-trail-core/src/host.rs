//! Wires an animator to a host's surface, frame scheduler and input source.
//!
//! Hosts forward raw events here; this type decides which frames to request
//! or cancel and when listeners come off.

use glam::DVec2;
use snake_trail_platform::{DrawSurface, FrameHandle, FrameScheduler, InputSource, Viewport};
use tracing::{info, warn};

use crate::animator::TrailAnimator;
use crate::lifecycle::{FrameAction, LifecycleState};

pub struct TrailHost<S, F, I> {
    animator: TrailAnimator,
    surface: S,
    scheduler: F,
    input: I,
    pending: Option<FrameHandle>,
}

impl<S, F, I> TrailHost<S, F, I>
where
    S: DrawSurface,
    F: FrameScheduler,
    I: InputSource,
{
    pub fn new(animator: TrailAnimator, surface: S, scheduler: F, input: I) -> Self {
        Self {
            animator,
            surface,
            scheduler,
            input,
            pending: None,
        }
    }

    pub fn animator(&self) -> &TrailAnimator {
        &self.animator
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn scheduler(&self) -> &F {
        &self.scheduler
    }

    pub fn input(&self) -> &I {
        &self.input
    }

    /// Frame requested and not yet delivered.
    pub fn pending_frame(&self) -> Option<FrameHandle> {
        self.pending
    }

    /// Attaches input and queues the first frame.
    pub fn start(&mut self) -> snake_trail_platform::Result<()> {
        self.input.start()?;
        let action = self.animator.start();
        self.apply(action);
        Ok(())
    }

    /// Frame callback from the host.
    pub fn frame(&mut self, now_ms: f64) {
        self.pending = None;
        let viewport = self.surface.viewport();
        if self.animator.tick(now_ms, &mut self.surface, viewport) {
            self.request();
        }
    }

    pub fn pointer_moved(&mut self, position: DVec2, now_ms: f64) {
        self.animator.pointer_moved(position, now_ms);
    }

    /// Touch start or move with the first touch point, if any. Returns whether
    /// the host should suppress the browser default (scrolling).
    pub fn touch_moved(&mut self, first_touch: Option<DVec2>, now_ms: f64) -> bool {
        if self.animator.state() == LifecycleState::Destroyed {
            return false;
        }
        if let Some(position) = first_touch {
            self.animator.pointer_moved(position, now_ms);
        }
        true
    }

    /// Resizes the surface only; the chain and pointer stay where they are.
    pub fn resize(&mut self, viewport: Viewport) -> snake_trail_platform::Result<()> {
        if self.animator.state() == LifecycleState::Destroyed {
            return Ok(());
        }
        self.surface.resize(viewport)
    }

    pub fn visibility_changed(&mut self, hidden: bool) {
        if hidden {
            self.pause();
        } else {
            self.resume();
        }
    }

    pub fn pause(&mut self) {
        let action = self.animator.pause();
        self.apply(action);
    }

    pub fn resume(&mut self) {
        let action = self.animator.resume();
        self.apply(action);
    }

    /// Cancels any pending frame, detaches input and clears the surface.
    /// Safe while paused; later calls do nothing.
    pub fn destroy(&mut self) {
        if self.animator.state() == LifecycleState::Destroyed {
            return;
        }
        let action = self.animator.destroy();
        self.apply(action);
        self.cancel();
        if let Err(err) = self.input.stop() {
            warn!("failed to detach snake trail input: {err}");
        }
        let viewport = self.surface.viewport();
        self.surface.clear(0.0, 0.0, viewport.width, viewport.height);
        info!("snake trail host torn down");
    }

    fn apply(&mut self, action: FrameAction) {
        match action {
            FrameAction::Schedule => self.request(),
            FrameAction::Cancel => self.cancel(),
            FrameAction::Nothing => {}
        }
    }

    fn request(&mut self) {
        if self.pending.is_some() {
            return;
        }
        match self.scheduler.request_frame() {
            Ok(handle) => self.pending = Some(handle),
            Err(err) => warn!("frame request failed: {err}"),
        }
    }

    fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            if let Err(err) = self.scheduler.cancel_frame(handle) {
                warn!("frame cancel failed: {err}");
            }
        }
    }
}
