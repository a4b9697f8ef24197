//! Platform abstraction traits so `snake-trail-core` stays host-agnostic.

use serde::{Deserialize, Serialize};

#[cfg(any(test, feature = "testing"))]
pub mod recording;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Visible drawing area in CSS pixels plus the device pixel ratio.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub device_pixel_ratio: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64, device_pixel_ratio: f64) -> Self {
        let device_pixel_ratio = if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
            device_pixel_ratio
        } else {
            1.0
        };
        Self {
            width,
            height,
            device_pixel_ratio,
        }
    }

    pub fn center(&self) -> (f64, f64) {
        (self.width / 2.0, self.height / 2.0)
    }

    /// Backing store size in device pixels.
    pub fn pixel_size(&self) -> (u32, u32) {
        (
            (self.width * self.device_pixel_ratio).round().max(0.0) as u32,
            (self.height * self.device_pixel_ratio).round().max(0.0) as u32,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0.0);
    pub const BLACK: Rgba = Rgba::new(0, 0, 0, 1.0);

    pub const fn new(r: u8, g: u8, b: u8, a: f64) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 1.0)
    }

    pub fn with_alpha(self, a: f64) -> Self {
        Self {
            a: a.clamp(0.0, 1.0),
            ..self
        }
    }

    /// CSS `rgba(...)` form understood by canvas style setters.
    pub fn to_css(&self) -> String {
        format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorStop {
    pub offset: f64,
    pub color: Rgba,
}

impl ColorStop {
    pub fn new(offset: f64, color: Rgba) -> Self {
        Self { offset, color }
    }
}

/// Fill or stroke style.
#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    Solid(Rgba),
    Linear {
        from: (f64, f64),
        to: (f64, f64),
        stops: Vec<ColorStop>,
    },
    Radial {
        inner: (f64, f64, f64),
        outer: (f64, f64, f64),
        stops: Vec<ColorStop>,
    },
}

/// Immediate-mode 2D drawing, modelled on the HTML canvas context.
/// Strokes use round caps and joins.
pub trait Canvas {
    fn clear(&mut self, x: f64, y: f64, width: f64, height: f64);
    fn save(&mut self);
    fn restore(&mut self);
    fn translate(&mut self, x: f64, y: f64);
    fn rotate(&mut self, angle: f64);
    fn set_fill(&mut self, paint: &Paint);
    fn set_stroke(&mut self, paint: &Paint);
    fn set_line_width(&mut self, width: f64);
    fn begin_path(&mut self);
    fn move_to(&mut self, x: f64, y: f64);
    fn line_to(&mut self, x: f64, y: f64);
    fn arc(&mut self, x: f64, y: f64, radius: f64);
    fn ellipse(&mut self, x: f64, y: f64, radius_x: f64, radius_y: f64, rotation: f64);
    fn fill(&mut self);
    fn stroke(&mut self);
}

/// A canvas sized to the viewport, owned by one animator.
pub trait DrawSurface: Canvas {
    fn viewport(&self) -> Viewport;
    fn resize(&mut self, viewport: Viewport) -> Result<()>;
}

/// Millisecond wall clock.
pub trait Clock {
    fn now_ms(&self) -> f64;
}

/// Source of pointer, resize and visibility events for one trail.
pub trait InputSource {
    fn start(&mut self) -> Result<()>;
    fn stop(&mut self) -> Result<()>;
}

/// Handle returned by a host when it queues a frame callback.
pub type FrameHandle = i32;

/// Per-refresh frame callbacks, e.g. `requestAnimationFrame`.
pub trait FrameScheduler {
    fn request_frame(&mut self) -> Result<FrameHandle>;
    fn cancel_frame(&mut self, handle: FrameHandle) -> Result<()>;
}
