//! The follower-chain animator: pointer input, per-frame physics, lifecycle.

use glam::DVec2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use snake_trail_platform::{Canvas, Viewport};
use tracing::{debug, info};

use crate::chain::{facing, Chain};
use crate::config::TrailConfig;
use crate::lifecycle::{FrameAction, LifecycleEvent, LifecycleState};
use crate::pointer::{IdleState, PointerState};
use crate::render::Painter;
use crate::ConfigError;

/// Oscillator accumulators, independent of pointer activity.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Phases {
    pub breathing: f64,
    pub pattern: f64,
}

pub struct TrailAnimator {
    config: TrailConfig,
    chain: Chain,
    pointer: PointerState,
    idle: IdleState,
    phases: Phases,
    head_target: DVec2,
    state: LifecycleState,
    jitter: ChaCha8Rng,
}

impl TrailAnimator {
    pub fn new(config: TrailConfig, viewport: Viewport, now_ms: f64) -> Result<Self, ConfigError> {
        config.validate()?;
        let (cx, cy) = viewport.center();
        let center = DVec2::new(cx, cy);
        let jitter = match config.jitter_seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let chain = Chain::new(&config, center);
        info!(
            "snake trail ready: {} segments at ({:.0}, {:.0})",
            chain.len(),
            cx,
            cy
        );
        Ok(Self {
            chain,
            pointer: PointerState::new(center, now_ms),
            idle: IdleState::default(),
            phases: Phases::default(),
            head_target: center,
            state: LifecycleState::Uninitialized,
            jitter,
            config,
        })
    }

    pub fn config(&self) -> &TrailConfig {
        &self.config
    }

    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    pub fn pointer(&self) -> &PointerState {
        &self.pointer
    }

    pub fn is_idle(&self) -> bool {
        self.idle.idle
    }

    pub fn idle_state(&self) -> &IdleState {
        &self.idle
    }

    pub fn phases(&self) -> Phases {
        self.phases
    }

    /// Target the head chased on the most recent update.
    pub fn head_target(&self) -> DVec2 {
        self.head_target
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Mouse move, touch start or touch move.
    pub fn pointer_moved(&mut self, position: DVec2, now_ms: f64) {
        if self.state == LifecycleState::Destroyed {
            return;
        }
        self.pointer.record(position, now_ms);
        self.idle.idle = false;
    }

    pub fn start(&mut self) -> FrameAction {
        self.transition(LifecycleEvent::Start)
    }

    pub fn pause(&mut self) -> FrameAction {
        self.transition(LifecycleEvent::Pause)
    }

    pub fn resume(&mut self) -> FrameAction {
        self.transition(LifecycleEvent::Resume)
    }

    pub fn destroy(&mut self) -> FrameAction {
        let was_destroyed = self.state == LifecycleState::Destroyed;
        let action = self.transition(LifecycleEvent::Destroy);
        if !was_destroyed {
            info!("snake trail destroyed");
        }
        action
    }

    fn transition(&mut self, event: LifecycleEvent) -> FrameAction {
        let (next, action) = self.state.apply(event);
        self.state = next;
        action
    }

    /// One display refresh: update then render. Returns whether another frame is wanted.
    pub fn tick(&mut self, now_ms: f64, canvas: &mut impl Canvas, viewport: Viewport) -> bool {
        if !self.state.is_running() {
            return false;
        }
        self.update(now_ms);
        self.render(canvas, viewport);
        true
    }

    pub fn update(&mut self, now_ms: f64) {
        let config = &self.config;
        self.phases.breathing += config.breathing_step;
        self.phases.pattern += config.pattern_step;

        let was_idle = self.idle.idle;
        let idle = self.idle.observe(
            self.pointer.elapsed_ms(now_ms),
            config.idle_threshold_ms,
            config.wander_speed,
        );
        if idle && !was_idle {
            debug!("pointer idle, wandering");
        }

        let Some(head) = self.chain.head_mut() else {
            return;
        };
        let target = if idle {
            head.position + self.idle.wander_offset(config.wander_radius)
        } else {
            self.pointer.current
        };
        self.head_target = target;
        head.position += (target - head.position) * config.follow_speed * config.head_boost;

        let segments = self.chain.segments_mut();
        for i in 1..segments.len() {
            let leader = segments[i - 1].position;
            let segment = &mut segments[i];
            let delta = leader - segment.position;
            let distance = delta.length();
            let angle = facing(delta);
            segment.angle = angle;
            segment.breathing_scale = 1.0
                + (self.phases.breathing + i as f64 * config.breathing_index_phase).sin()
                    * config.breathing_amplitude;

            let gap = segment.size * config.slack_ratio;
            if distance > gap {
                let undulation = (now_ms * config.undulation_time_scale
                    + i as f64 * config.undulation_index_phase)
                    .sin()
                    * segment.size
                    * config.undulation_ratio;
                let target = leader - DVec2::new(angle.cos(), angle.sin()) * gap
                    + DVec2::new(0.0, undulation);
                segment.position += (target - segment.position) * config.tail_follow_at(i);
            }
        }
    }

    pub fn render(&mut self, canvas: &mut impl Canvas, viewport: Viewport) {
        Painter {
            canvas,
            config: &self.config,
            phases: self.phases,
            jitter: &mut self.jitter,
        }
        .paint(&self.chain, viewport);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snake_trail_platform::recording::{DrawOp, RecordingCanvas};
    use snake_trail_platform::DrawSurface;

    fn viewport() -> Viewport {
        Viewport::new(800.0, 600.0, 1.0)
    }

    fn animator(config: TrailConfig) -> TrailAnimator {
        TrailAnimator::new(
            TrailConfig {
                jitter_seed: Some(1),
                ..config
            },
            viewport(),
            0.0,
        )
        .unwrap()
    }

    #[test]
    fn length_never_changes() {
        for length in [2, 3, 7, 20] {
            let mut snake = animator(TrailConfig {
                length,
                ..TrailConfig::default()
            });
            let mut canvas = RecordingCanvas::new(viewport());
            snake.start();
            for tick in 0..300 {
                let now = tick as f64 * 16.0;
                if tick % 50 == 0 {
                    snake.pointer_moved(DVec2::new(tick as f64, 600.0 - tick as f64), now);
                }
                snake.tick(now, &mut canvas, viewport());
                assert_eq!(snake.chain().len(), length);
            }
        }
    }

    #[test]
    fn head_converges_geometrically() {
        let f = 0.03;
        let mut snake = animator(TrailConfig {
            length: 7,
            follow_speed: f,
            ..TrailConfig::default()
        });
        let target = DVec2::new(100.0, 100.0);
        snake.pointer_moved(target, 0.0);
        let initial = snake.chain().head().unwrap().position.distance(target);
        let ratio = 1.0 - 2.5 * f;
        let mut previous = initial;
        for k in 1..=1000 {
            // The clock stays at the input time so the pointer never goes idle.
            snake.update(0.0);
            assert!(!snake.is_idle());
            let error = snake.chain().head().unwrap().position.distance(target);
            if previous > 1e-9 {
                assert!(error < previous, "tick {k}: {error} !< {previous}");
            } else {
                assert!(error <= previous);
            }
            if k <= 200 {
                let expected = initial * ratio.powi(k);
                assert!(
                    (error - expected).abs() <= expected * 1e-9 + 1e-12,
                    "tick {k}: {error} vs {expected}"
                );
            }
            previous = error;
        }
        assert!(previous < 1e-9);
    }

    #[test]
    fn idle_tracks_threshold_and_clears_on_input() {
        let mut snake = animator(TrailConfig::default());
        snake.pointer_moved(DVec2::new(10.0, 10.0), 1000.0);
        snake.update(1500.0);
        assert!(!snake.is_idle(), "exactly at threshold is not idle");
        snake.update(1500.5);
        assert!(snake.is_idle());
        let angle = snake.idle_state().wander_angle;
        assert!(angle > 0.0);

        snake.pointer_moved(DVec2::new(20.0, 20.0), 1501.0);
        assert!(!snake.is_idle());
        // Long gap before the next tick is still measured from the new input.
        snake.update(1900.0);
        assert!(!snake.is_idle());
        assert_eq!(snake.idle_state().wander_angle, angle);
        assert_eq!(snake.head_target(), DVec2::new(20.0, 20.0));
    }

    #[test]
    fn wander_target_stays_within_one_and_a_half_radii() {
        let config = TrailConfig::default();
        let bound = config.wander_radius * 1.5;
        let mut snake = animator(config);
        let mut now = 0.0;
        for _ in 0..3000 {
            now += 16.0;
            let head_before = snake.chain().head().unwrap().position;
            snake.update(now);
            if now > 500.0 {
                assert!(snake.is_idle());
                let offset = snake.head_target().distance(head_before);
                assert!(offset <= bound + 1e-9, "{offset} > {bound}");
            }
        }
    }

    #[test]
    fn trailing_segments_face_their_leader_and_lag() {
        let mut snake = animator(TrailConfig::default());
        snake.pointer_moved(DVec2::new(700.0, 300.0), 0.0);
        for _ in 0..30 {
            snake.update(0.0);
        }
        let segments = snake.chain().segments();
        for pair in segments.windows(2) {
            assert!(pair[1].position.x <= pair[0].position.x + 1e-9);
        }
        assert!(segments[1].angle.abs() < 0.5, "faces right: {}", segments[1].angle);
        assert_ne!(segments[1].breathing_scale, 1.0);
    }

    #[test]
    fn bunched_segments_do_not_move() {
        let mut snake = animator(TrailConfig::default());
        let before: Vec<DVec2> = snake.chain().segments().iter().map(|s| s.position).collect();
        snake.update(0.0);
        let after: Vec<DVec2> = snake.chain().segments().iter().map(|s| s.position).collect();
        assert_eq!(before, after);
        assert!(snake.chain().segments().iter().all(|s| s.angle == 0.0));
    }

    #[test]
    fn long_chain_tail_follows_the_head() {
        let mut snake = animator(TrailConfig {
            length: 150,
            ..TrailConfig::default()
        });
        let seed = snake.chain().segments()[149].position;
        snake.pointer_moved(DVec2::new(5000.0, 300.0), 0.0);
        for _ in 0..20_000 {
            snake.update(0.0);
        }
        let segments = snake.chain().segments();
        assert!(segments.iter().all(|s| s.position.is_finite() && s.size > 0.0));
        for index in [120, 149] {
            let moved = segments[index].position.distance(seed);
            assert!(moved > 1.0, "segment {index} stalled at {:?}", segments[index].position);
        }
    }

    #[test]
    fn resize_leaves_chain_untouched() {
        let mut snake = animator(TrailConfig::default());
        let mut canvas = RecordingCanvas::new(viewport());
        snake.start();
        snake.pointer_moved(DVec2::new(50.0, 80.0), 0.0);
        for _ in 0..10 {
            snake.tick(0.0, &mut canvas, viewport());
        }
        let chain = snake.chain().clone();
        let resized = Viewport::new(1024.0, 768.0, 2.0);
        canvas.resize(resized).unwrap();
        assert_eq!(canvas.viewport().pixel_size(), (2048, 1536));
        assert_eq!(snake.chain(), &chain);
    }

    #[test]
    fn pause_resume_keeps_state() {
        let mut snake = animator(TrailConfig::default());
        let mut canvas = RecordingCanvas::new(viewport());
        assert_eq!(snake.start(), FrameAction::Schedule);
        snake.pointer_moved(DVec2::new(200.0, 200.0), 0.0);
        snake.tick(0.0, &mut canvas, viewport());

        assert_eq!(snake.pause(), FrameAction::Cancel);
        assert_eq!(snake.pause(), FrameAction::Nothing);
        let chain = snake.chain().clone();
        let pointer = *snake.pointer();
        let phases = snake.phases();
        assert!(!snake.tick(16.0, &mut canvas, viewport()));
        assert_eq!(snake.chain(), &chain);

        assert_eq!(snake.resume(), FrameAction::Schedule);
        assert_eq!(snake.resume(), FrameAction::Nothing);
        assert_eq!(snake.state(), LifecycleState::Running);
        assert_eq!(snake.chain(), &chain);
        assert_eq!(snake.pointer(), &pointer);
        assert_eq!(snake.phases(), phases);
        assert!(snake.tick(16.0, &mut canvas, viewport()));
    }

    #[test]
    fn destroy_stops_everything() {
        let mut snake = animator(TrailConfig::default());
        let mut canvas = RecordingCanvas::new(viewport());
        snake.start();
        snake.pause();
        assert_eq!(snake.destroy(), FrameAction::Nothing);
        assert_eq!(snake.resume(), FrameAction::Nothing);
        assert!(!snake.tick(0.0, &mut canvas, viewport()));
        assert!(canvas.ops.is_empty());
        let pointer = *snake.pointer();
        snake.pointer_moved(DVec2::new(1.0, 1.0), 5.0);
        assert_eq!(snake.pointer(), &pointer);
    }

    #[test]
    fn rejects_invalid_config() {
        let result = TrailAnimator::new(
            TrailConfig {
                length: 0,
                ..TrailConfig::default()
            },
            viewport(),
            0.0,
        );
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn single_segment_chain_updates_but_skips_render() {
        let mut snake = animator(TrailConfig {
            length: 1,
            ..TrailConfig::default()
        });
        let mut canvas = RecordingCanvas::new(viewport());
        snake.start();
        snake.pointer_moved(DVec2::new(0.0, 0.0), 0.0);
        assert!(snake.tick(0.0, &mut canvas, viewport()));
        assert!(snake.chain().head().unwrap().position.x < 400.0);
        assert_eq!(canvas.ops, vec![DrawOp::Clear { width: 800.0, height: 600.0 }]);
    }
}
