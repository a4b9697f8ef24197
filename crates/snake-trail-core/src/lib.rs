//! Snake trail core: platform-agnostic follower chain, idle wander and layered renderer.

use thiserror::Error;

pub mod animator;
pub mod chain;
pub mod config;
pub mod host;
pub mod lifecycle;
pub mod pointer;
mod render;

pub use animator::TrailAnimator;
pub use chain::{Chain, Segment};
pub use config::{HexColor, Palette, TrailConfig};
pub use host::TrailHost;
pub use lifecycle::{FrameAction, LifecycleEvent, LifecycleState};
pub use pointer::{IdleState, PointerState};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid colour {0:?}, expected #RRGGBB")]
    InvalidColor(String),
    #[error("invalid config: {0}")]
    Invalid(String),
}
