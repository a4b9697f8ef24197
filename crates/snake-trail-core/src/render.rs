//! Layered procedural drawing of the chain, back to front.

use std::f64::consts::PI;

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use snake_trail_platform::{Canvas, ColorStop, Paint, Rgba, Viewport};

use crate::animator::Phases;
use crate::chain::{facing, Chain, Segment};
use crate::config::TrailConfig;

const SHADOW_OFFSET: f64 = 3.0;
const GLOW_REFERENCE: f64 = 15.0;

/// Head decorations in head-local space: (x, y, size), scaled by head size.
const HEAD_SPOTS: [(f64, f64, f64); 4] = [
    (-0.2, -0.3, 0.15),
    (0.1, -0.4, 0.12),
    (-0.4, 0.1, 0.18),
    (0.2, 0.2, 0.14),
];

pub(crate) struct Painter<'a, C: Canvas> {
    pub canvas: &'a mut C,
    pub config: &'a TrailConfig,
    pub phases: Phases,
    pub jitter: &'a mut ChaCha8Rng,
}

impl<C: Canvas> Painter<'_, C> {
    pub fn paint(&mut self, chain: &Chain, viewport: Viewport) {
        self.canvas.clear(0.0, 0.0, viewport.width, viewport.height);
        if chain.len() < 2 {
            return;
        }
        self.shadow(chain);
        self.glow(chain);
        self.body(chain);
        self.belly(chain);
        self.spots(chain);
        self.head(chain);
    }

    fn stroke_link(&mut self, from: &Segment, to: &Segment, offset: f64) {
        self.canvas.begin_path();
        self.canvas
            .move_to(from.position.x + offset, from.position.y + offset);
        self.canvas.line_to(to.position.x + offset, to.position.y + offset);
        self.canvas.stroke();
    }

    fn shadow(&mut self, chain: &Chain) {
        let paint = Paint::Solid(Rgba::BLACK.with_alpha(0.4));
        for (_, previous, segment) in chain.links() {
            self.canvas.set_stroke(&paint);
            self.canvas
                .set_line_width(segment.size * segment.breathing_scale * 1.1);
            self.stroke_link(previous, segment, SHADOW_OFFSET);
        }
    }

    fn glow(&mut self, chain: &Chain) {
        let palette = &self.config.palette;
        let strength = 0.2 + (self.phases.breathing * 1.5).sin() * 0.05;
        let scale = self.config.glow_intensity / GLOW_REFERENCE;
        for (i, segment) in chain.segments().iter().enumerate() {
            let intensity = if i < 3 { 0.8 } else { 0.4 };
            let (x, y) = (segment.position.x, segment.position.y);
            let radius = segment.size * 2.5;
            let paint = Paint::Radial {
                inner: (x, y, 0.0),
                outer: (x, y, radius),
                stops: vec![
                    ColorStop::new(
                        0.0,
                        palette
                            .primary
                            .alpha(segment.opacity * strength * intensity * scale),
                    ),
                    ColorStop::new(0.7, palette.secondary.alpha(segment.opacity * 0.1)),
                    ColorStop::new(1.0, Rgba::TRANSPARENT),
                ],
            };
            self.canvas.set_fill(&paint);
            self.canvas.begin_path();
            self.canvas.arc(x, y, radius);
            self.canvas.fill();
        }
    }

    fn body(&mut self, chain: &Chain) {
        let palette = &self.config.palette;
        let (primary, secondary) = (palette.primary.rgba(), palette.secondary.rgba());
        for (_, previous, segment) in chain.links() {
            let (x, y, s) = (segment.position.x, segment.position.y, segment.size);
            let paint = Paint::Linear {
                from: (x - s, y - s),
                to: (x + s, y + s),
                stops: vec![
                    ColorStop::new(0.0, secondary),
                    ColorStop::new(0.3, primary),
                    ColorStop::new(0.7, primary),
                    ColorStop::new(1.0, secondary),
                ],
            };
            self.canvas.set_stroke(&paint);
            self.canvas.set_line_width(s * segment.breathing_scale);
            self.stroke_link(previous, segment, 0.0);
        }
    }

    fn belly(&mut self, chain: &Chain) {
        let paint = Paint::Solid(self.config.palette.belly.rgba());
        for (_, previous, segment) in chain.links() {
            self.canvas.set_stroke(&paint);
            self.canvas
                .set_line_width(segment.size * 0.6 * segment.breathing_scale);
            self.stroke_link(previous, segment, 0.0);
        }
    }

    fn spots(&mut self, chain: &Chain) {
        let palette = &self.config.palette;
        for (i, segment) in chain.segments().iter().enumerate() {
            let index = i as f64;
            let (x, y, s) = (segment.position.x, segment.position.y, segment.size);
            let pattern = (index * 0.8 + self.phases.pattern * 0.5).sin();
            if pattern.abs() > 0.3 {
                let spot = s * (0.3 + pattern.abs() * 0.4);
                let spot_x = x + (index * 1.2).sin() * s * 0.3;
                let spot_y = y + (index * 0.9).cos() * s * 0.2;

                self.canvas
                    .set_fill(&Paint::Solid(palette.spot.alpha(segment.opacity * 0.8)));
                self.canvas.begin_path();
                self.canvas
                    .ellipse(spot_x, spot_y, spot, spot * 0.8, segment.angle);
                self.canvas.fill();

                self.canvas.set_fill(&Paint::Solid(
                    palette.spot_center.alpha(segment.opacity * 0.5),
                ));
                self.canvas.begin_path();
                self.canvas.ellipse(
                    spot_x - spot * 0.2,
                    spot_y - spot * 0.2,
                    spot * 0.6,
                    spot * 0.5,
                    segment.angle,
                );
                self.canvas.fill();
            }

            if i % 3 == 0 {
                self.canvas
                    .set_fill(&Paint::Solid(palette.spot.alpha(segment.opacity * 0.6)));
                self.canvas.begin_path();
                self.canvas.arc(
                    x + (index * 2.1).cos() * s * 0.4,
                    y + (index * 1.7).sin() * s * 0.3,
                    s * 0.15,
                );
                self.canvas.fill();
            }
        }
    }

    fn head(&mut self, chain: &Chain) {
        let segments = chain.segments();
        let (head, neck) = (&segments[0], &segments[1]);
        let palette = &self.config.palette;
        let size = head.size * head.breathing_scale;

        self.canvas.save();
        self.canvas.translate(head.position.x, head.position.y);
        self.canvas.rotate(facing(head.position - neck.position));

        self.canvas
            .set_fill(&Paint::Solid(Rgba::BLACK.with_alpha(0.2)));
        self.canvas.begin_path();
        self.canvas.ellipse(2.0, 2.0, size * 0.9, size * 0.7, 0.0);
        self.canvas.fill();

        self.canvas.set_fill(&Paint::Radial {
            inner: (0.0, 0.0, 0.0),
            outer: (0.0, 0.0, size),
            stops: vec![
                ColorStop::new(0.0, palette.primary.rgba()),
                ColorStop::new(0.6, palette.secondary.rgba()),
                ColorStop::new(1.0, palette.accent.rgba()),
            ],
        });
        self.canvas.begin_path();
        self.canvas.ellipse(0.0, 0.0, size * 0.9, size * 0.7, 0.0);
        self.canvas.fill();

        // snout
        self.canvas.set_fill(&Paint::Radial {
            inner: (size * 0.3, 0.0, 0.0),
            outer: (size * 0.3, 0.0, size * 0.4),
            stops: vec![
                ColorStop::new(0.0, palette.primary.rgba()),
                ColorStop::new(1.0, palette.secondary.rgba()),
            ],
        });
        self.canvas.begin_path();
        self.canvas.ellipse(size * 0.3, 0.0, size * 0.4, size * 0.3, 0.0);
        self.canvas.fill();

        for (sx, sy, spot) in HEAD_SPOTS {
            let (x, y, r) = (sx * size, sy * size, spot * size);
            self.canvas.set_fill(&Paint::Solid(palette.spot.alpha(0.8)));
            self.canvas.begin_path();
            self.canvas
                .ellipse(x, y, r, r * 0.8, self.jitter.gen::<f64>() * PI);
            self.canvas.fill();

            self.canvas
                .set_fill(&Paint::Solid(palette.spot_center.alpha(0.4)));
            self.canvas.begin_path();
            self.canvas.ellipse(
                x - r * 0.3,
                y - r * 0.3,
                r * 0.5,
                r * 0.4,
                self.jitter.gen::<f64>() * PI,
            );
            self.canvas.fill();
        }

        self.eyes(size);

        if (self.phases.breathing * 2.0).sin() > 0.9 {
            self.canvas
                .set_stroke(&Paint::Solid(self.config.palette.tongue.rgba()));
            self.canvas.set_line_width(1.5);
            self.canvas.begin_path();
            self.canvas.move_to(size * 0.7, 0.0);
            self.canvas.line_to(size * 1.1, -2.0);
            self.canvas.move_to(size * 0.7, 0.0);
            self.canvas.line_to(size * 1.1, 2.0);
            self.canvas.stroke();
        }

        self.canvas.restore();
    }

    fn eyes(&mut self, size: f64) {
        let palette = &self.config.palette;
        let offset = size * 0.25;
        let eye = (size * 0.12).max(2.0);
        let y = -offset * 0.6;
        let sides = [-offset, offset];

        self.canvas.set_fill(&Paint::Solid(palette.eye_base.rgba()));
        self.canvas.begin_path();
        for x in sides {
            self.canvas.arc(x, y, eye);
        }
        self.canvas.fill();

        self.canvas.set_fill(&Paint::Solid(palette.eye.rgba()));
        self.canvas.begin_path();
        for x in sides {
            self.canvas.arc(x, y, eye * 0.7);
        }
        self.canvas.fill();

        // slit pupils
        self.canvas.set_fill(&Paint::Solid(Rgba::BLACK));
        self.canvas.begin_path();
        for x in sides {
            self.canvas.ellipse(x, y, eye * 0.2, eye * 0.6, 0.0);
        }
        self.canvas.fill();

        self.canvas
            .set_fill(&Paint::Solid(Rgba::new(255, 255, 255, 0.8)));
        self.canvas.begin_path();
        for x in sides {
            self.canvas.arc(x - eye * 0.3, y - eye * 0.3, eye * 0.15);
        }
        self.canvas.fill();
    }
}
