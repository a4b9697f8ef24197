use std::f64::consts::TAU;

use snake_trail_platform::{Canvas, Clock, DrawSurface, Paint, Result, Viewport};
use tracing::{info, trace};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasGradient, CanvasRenderingContext2d, HtmlCanvasElement, Window};

use crate::WebError;

/// Full-viewport `<canvas>` with its 2D context, exclusively owned by one trail.
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    context: CanvasRenderingContext2d,
    viewport: Viewport,
}

impl CanvasSurface {
    pub fn attach(canvas: HtmlCanvasElement, viewport: Viewport) -> std::result::Result<Self, WebError> {
        let context = canvas
            .get_context("2d")?
            .ok_or(WebError::NoContext)?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| WebError::NoContext)?;
        let mut surface = Self {
            canvas,
            context,
            viewport,
        };
        surface.apply_viewport(viewport)?;
        Ok(surface)
    }

    pub fn log_current_layout(&self, reason: &str) {
        let (width, height) = self.viewport.pixel_size();
        info!(
            "Canvas layout ({}) -> css {}x{}, backing {}x{}, dpr {}",
            reason,
            self.viewport.width,
            self.viewport.height,
            width,
            height,
            self.viewport.device_pixel_ratio
        );
    }

    fn apply_viewport(&mut self, viewport: Viewport) -> std::result::Result<(), WebError> {
        let (width, height) = viewport.pixel_size();
        self.canvas.set_width(width);
        self.canvas.set_height(height);
        let style = self.canvas.style();
        style.set_property("width", &css_px(viewport.width))?;
        style.set_property("height", &css_px(viewport.height))?;
        // Resizing the backing store resets the context, so the scale is set absolutely.
        let ratio = viewport.device_pixel_ratio;
        self.context.set_transform(ratio, 0.0, 0.0, ratio, 0.0, 0.0)?;
        self.context.set_line_cap("round");
        self.context.set_line_join("round");
        self.viewport = viewport;
        Ok(())
    }

    fn gradient(&self, paint: &Paint) -> Option<CanvasGradient> {
        let (gradient, stops) = match paint {
            Paint::Solid(_) => return None,
            Paint::Linear { from, to, stops } => (
                self.context.create_linear_gradient(from.0, from.1, to.0, to.1),
                stops,
            ),
            Paint::Radial {
                inner,
                outer,
                stops,
            } => (
                self.context
                    .create_radial_gradient(inner.0, inner.1, inner.2, outer.0, outer.1, outer.2)
                    .ok()?,
                stops,
            ),
        };
        for stop in stops {
            if let Err(err) = gradient.add_color_stop(stop.offset as f32, &stop.color.to_css()) {
                trace!("color stop rejected: {err:?}");
            }
        }
        Some(gradient)
    }
}

pub fn css_px(value: f64) -> String {
    format!("{value}px")
}

/// Reads CSS viewport size and device pixel ratio from the window.
pub fn window_viewport(window: &Window) -> std::result::Result<Viewport, WebError> {
    let dimension = |value: JsValue| value.as_f64().ok_or_else(|| WebError::Js("non-numeric viewport size".into()));
    Ok(Viewport::new(
        dimension(window.inner_width()?)?,
        dimension(window.inner_height()?)?,
        window.device_pixel_ratio(),
    ))
}

fn best_effort(result: std::result::Result<(), JsValue>) {
    if let Err(err) = result {
        trace!("canvas call failed: {err:?}");
    }
}

impl Canvas for CanvasSurface {
    fn clear(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.context.clear_rect(x, y, width, height);
    }
    fn save(&mut self) {
        self.context.save();
    }
    fn restore(&mut self) {
        self.context.restore();
    }
    fn translate(&mut self, x: f64, y: f64) {
        best_effort(self.context.translate(x, y));
    }
    fn rotate(&mut self, angle: f64) {
        best_effort(self.context.rotate(angle));
    }
    fn set_fill(&mut self, paint: &Paint) {
        match (paint, self.gradient(paint)) {
            (Paint::Solid(color), _) => self.context.set_fill_style_str(&color.to_css()),
            (_, Some(gradient)) => self.context.set_fill_style_canvas_gradient(&gradient),
            (_, None) => {}
        }
    }
    fn set_stroke(&mut self, paint: &Paint) {
        match (paint, self.gradient(paint)) {
            (Paint::Solid(color), _) => self.context.set_stroke_style_str(&color.to_css()),
            (_, Some(gradient)) => self.context.set_stroke_style_canvas_gradient(&gradient),
            (_, None) => {}
        }
    }
    fn set_line_width(&mut self, width: f64) {
        self.context.set_line_width(width);
    }
    fn begin_path(&mut self) {
        self.context.begin_path();
    }
    fn move_to(&mut self, x: f64, y: f64) {
        self.context.move_to(x, y);
    }
    fn line_to(&mut self, x: f64, y: f64) {
        self.context.line_to(x, y);
    }
    fn arc(&mut self, x: f64, y: f64, radius: f64) {
        // A new subpath per circle so several circles can share one fill.
        self.context.move_to(x + radius, y);
        best_effort(self.context.arc(x, y, radius.max(0.0), 0.0, TAU));
    }
    fn ellipse(&mut self, x: f64, y: f64, radius_x: f64, radius_y: f64, rotation: f64) {
        self.context.move_to(
            x + radius_x * rotation.cos(),
            y + radius_x * rotation.sin(),
        );
        best_effort(self.context.ellipse(
            x,
            y,
            radius_x.max(0.0),
            radius_y.max(0.0),
            rotation,
            0.0,
            TAU,
        ));
    }
    fn fill(&mut self) {
        self.context.fill();
    }
    fn stroke(&mut self) {
        self.context.stroke();
    }
}

impl DrawSurface for CanvasSurface {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn resize(&mut self, viewport: Viewport) -> Result<()> {
        self.apply_viewport(viewport)?;
        self.log_current_layout("resize");
        Ok(())
    }
}

pub struct WebClock;

impl Clock for WebClock {
    fn now_ms(&self) -> f64 {
        js_sys::Date::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn css_px_formats_whole_and_fractional() {
        assert_eq!(css_px(800.0), "800px");
        assert_eq!(css_px(412.5), "412.5px");
    }
}
