//! In-memory host doubles used by tests: a canvas that logs drawing order,
//! a frame scheduler and an input source that count their calls.

use crate::{Canvas, DrawSurface, FrameHandle, FrameScheduler, InputSource, Paint, Result, Viewport};

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Clear { width: f64, height: f64 },
    Save,
    Restore,
    Translate(f64, f64),
    Rotate(f64),
    Fill(Paint),
    Stroke(Paint),
    LineWidth(f64),
    BeginPath,
    MoveTo(f64, f64),
    LineTo(f64, f64),
    Arc { x: f64, y: f64, radius: f64 },
    Ellipse { x: f64, y: f64, radius_x: f64, radius_y: f64, rotation: f64 },
    FillPath,
    StrokePath,
}

#[derive(Debug)]
pub struct RecordingCanvas {
    pub ops: Vec<DrawOp>,
    viewport: Viewport,
    pub resizes: usize,
}

impl RecordingCanvas {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            ops: Vec::new(),
            viewport,
            resizes: 0,
        }
    }

    pub fn take(&mut self) -> Vec<DrawOp> {
        std::mem::take(&mut self.ops)
    }
}

impl Canvas for RecordingCanvas {
    fn clear(&mut self, _x: f64, _y: f64, width: f64, height: f64) {
        self.ops.push(DrawOp::Clear { width, height });
    }
    fn save(&mut self) {
        self.ops.push(DrawOp::Save);
    }
    fn restore(&mut self) {
        self.ops.push(DrawOp::Restore);
    }
    fn translate(&mut self, x: f64, y: f64) {
        self.ops.push(DrawOp::Translate(x, y));
    }
    fn rotate(&mut self, angle: f64) {
        self.ops.push(DrawOp::Rotate(angle));
    }
    fn set_fill(&mut self, paint: &Paint) {
        self.ops.push(DrawOp::Fill(paint.clone()));
    }
    fn set_stroke(&mut self, paint: &Paint) {
        self.ops.push(DrawOp::Stroke(paint.clone()));
    }
    fn set_line_width(&mut self, width: f64) {
        self.ops.push(DrawOp::LineWidth(width));
    }
    fn begin_path(&mut self) {
        self.ops.push(DrawOp::BeginPath);
    }
    fn move_to(&mut self, x: f64, y: f64) {
        self.ops.push(DrawOp::MoveTo(x, y));
    }
    fn line_to(&mut self, x: f64, y: f64) {
        self.ops.push(DrawOp::LineTo(x, y));
    }
    fn arc(&mut self, x: f64, y: f64, radius: f64) {
        self.ops.push(DrawOp::Arc { x, y, radius });
    }
    fn ellipse(&mut self, x: f64, y: f64, radius_x: f64, radius_y: f64, rotation: f64) {
        self.ops.push(DrawOp::Ellipse {
            x,
            y,
            radius_x,
            radius_y,
            rotation,
        });
    }
    fn fill(&mut self) {
        self.ops.push(DrawOp::FillPath);
    }
    fn stroke(&mut self) {
        self.ops.push(DrawOp::StrokePath);
    }
}

impl DrawSurface for RecordingCanvas {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn resize(&mut self, viewport: Viewport) -> Result<()> {
        self.viewport = viewport;
        self.resizes += 1;
        Ok(())
    }
}

/// Hands out increasing handles and remembers which are still queued.
#[derive(Debug, Default)]
pub struct RecordingScheduler {
    next: FrameHandle,
    pub queued: Vec<FrameHandle>,
    pub requested: usize,
    pub cancelled: Vec<FrameHandle>,
}

impl FrameScheduler for RecordingScheduler {
    fn request_frame(&mut self) -> Result<FrameHandle> {
        self.next += 1;
        self.requested += 1;
        self.queued.push(self.next);
        Ok(self.next)
    }

    fn cancel_frame(&mut self, handle: FrameHandle) -> Result<()> {
        self.queued.retain(|queued| *queued != handle);
        self.cancelled.push(handle);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct RecordingInput {
    pub attached: bool,
    pub starts: usize,
    pub stops: usize,
}

impl InputSource for RecordingInput {
    fn start(&mut self) -> Result<()> {
        self.attached = true;
        self.starts += 1;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.attached = false;
        self.stops += 1;
        Ok(())
    }
}
