use glam::DVec2;

/// Latest pointer sample. Written by input handlers, read by the frame tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerState {
    pub current: DVec2,
    pub previous: DVec2,
    pub last_update_ms: f64,
}

impl PointerState {
    pub fn new(position: DVec2, now_ms: f64) -> Self {
        Self {
            current: position,
            previous: position,
            last_update_ms: now_ms,
        }
    }

    pub fn record(&mut self, position: DVec2, now_ms: f64) {
        self.previous = self.current;
        self.current = position;
        self.last_update_ms = now_ms;
    }

    pub fn elapsed_ms(&self, now_ms: f64) -> f64 {
        now_ms - self.last_update_ms
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IdleState {
    pub idle: bool,
    /// Only advances while idle; never reset.
    pub wander_angle: f64,
}

impl IdleState {
    /// Recomputes the idle flag for this tick and advances the wander angle when idle.
    pub fn observe(&mut self, elapsed_ms: f64, threshold_ms: f64, wander_speed: f64) -> bool {
        self.idle = elapsed_ms > threshold_ms;
        if self.idle {
            self.wander_angle += wander_speed;
        }
        self.idle
    }

    /// Offset of the wander point from the head. The vertical axis runs at
    /// 0.7 of the horizontal frequency, so the length stays within `radius × √2`.
    pub fn wander_offset(&self, radius: f64) -> DVec2 {
        DVec2::new(
            self.wander_angle.cos() * radius,
            (self.wander_angle * 0.7).sin() * radius,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_shifts_previous() {
        let mut pointer = PointerState::new(DVec2::new(1.0, 1.0), 0.0);
        pointer.record(DVec2::new(5.0, 6.0), 42.0);
        assert_eq!(pointer.previous, DVec2::new(1.0, 1.0));
        assert_eq!(pointer.current, DVec2::new(5.0, 6.0));
        assert_eq!(pointer.elapsed_ms(100.0), 58.0);
    }

    #[test]
    fn idle_only_past_threshold() {
        let mut idle = IdleState::default();
        assert!(!idle.observe(500.0, 500.0, 0.01));
        assert_eq!(idle.wander_angle, 0.0);
        assert!(idle.observe(500.1, 500.0, 0.01));
        assert!(idle.observe(900.0, 500.0, 0.01));
        assert!((idle.wander_angle - 0.02).abs() < 1e-12);
        assert!(!idle.observe(0.0, 500.0, 0.01));
        assert!((idle.wander_angle - 0.02).abs() < 1e-12, "angle is kept");
    }

    #[test]
    fn wander_offset_stays_within_one_and_a_half_radii() {
        let mut idle = IdleState::default();
        let mut longest = 0.0_f64;
        for _ in 0..10_000 {
            idle.observe(1000.0, 500.0, 0.01);
            let offset = idle.wander_offset(40.0);
            assert!(offset.x.abs() <= 40.0 + 1e-9);
            assert!(offset.y.abs() <= 40.0 + 1e-9);
            longest = longest.max(offset.length());
        }
        assert!(longest <= 60.0, "{longest}");

        // Angle where both axes sit near their peaks.
        let corner = IdleState {
            idle: true,
            wander_angle: std::f64::consts::TAU,
        };
        assert!(corner.wander_offset(40.0).length() <= 60.0);
    }
}
