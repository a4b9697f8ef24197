use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::config::TrailConfig;

/// One link of the follower chain. Pure data; the animator mutates it in place.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub position: DVec2,
    pub size: f64,
    pub opacity: f64,
    pub angle: f64,
    pub breathing_scale: f64,
}

/// Fixed-length head-to-tail sequence of segments.
#[derive(Debug, Clone, PartialEq)]
pub struct Chain {
    segments: Vec<Segment>,
}

impl Chain {
    /// Seeds `config.length` segments at `origin`.
    pub fn new(config: &TrailConfig, origin: DVec2) -> Self {
        let segments = (0..config.length)
            .map(|index| Segment {
                position: origin,
                size: config.segment_size_at(index),
                opacity: config.segment_opacity_at(index),
                angle: 0.0,
                breathing_scale: 1.0,
            })
            .collect();
        Self { segments }
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn head(&self) -> Option<&Segment> {
        self.segments.first()
    }

    pub fn head_mut(&mut self) -> Option<&mut Segment> {
        self.segments.first_mut()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Mutable view; the slice cannot change the chain length.
    pub fn segments_mut(&mut self) -> &mut [Segment] {
        &mut self.segments
    }

    /// Consecutive `(previous, current)` pairs from head to tail.
    pub fn links(&self) -> impl Iterator<Item = (usize, &Segment, &Segment)> {
        self.segments
            .windows(2)
            .enumerate()
            .map(|(i, pair)| (i + 1, &pair[0], &pair[1]))
    }
}

/// Facing angle of `delta`, 0 for a zero vector.
pub fn facing(delta: DVec2) -> f64 {
    if delta == DVec2::ZERO {
        0.0
    } else {
        delta.y.atan2(delta.x)
    }
}
