//! Animation loop lifecycle: Uninitialized -> Running <-> Paused -> Destroyed.

use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifecycleState {
    #[default]
    Uninitialized,
    Running,
    Paused,
    Destroyed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    Start,
    Pause,
    Resume,
    Destroy,
}

/// What the host should do with its pending frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameAction {
    Schedule,
    Cancel,
    Nothing,
}

impl LifecycleState {
    pub fn apply(self, event: LifecycleEvent) -> (LifecycleState, FrameAction) {
        use LifecycleEvent::*;
        use LifecycleState::*;
        let next = match (self, event) {
            (Destroyed, _) => (Destroyed, FrameAction::Nothing),
            (Running, Destroy) => (Destroyed, FrameAction::Cancel),
            (_, Destroy) => (Destroyed, FrameAction::Nothing),
            (Uninitialized, Start) => (Running, FrameAction::Schedule),
            (Running, Pause) => (Paused, FrameAction::Cancel),
            (Paused, Resume | Start) => (Running, FrameAction::Schedule),
            (state, _) => (state, FrameAction::Nothing),
        };
        if next.0 != self {
            debug!("lifecycle {:?} --{:?}--> {:?}", self, event, next.0);
        }
        next
    }

    pub fn is_running(&self) -> bool {
        matches!(self, LifecycleState::Running)
    }
}

#[cfg(test)]
mod tests {
    use super::LifecycleEvent::*;
    use super::LifecycleState::*;
    use super::*;

    #[test]
    fn start_pause_resume() {
        assert_eq!(Uninitialized.apply(Start), (Running, FrameAction::Schedule));
        assert_eq!(Running.apply(Pause), (Paused, FrameAction::Cancel));
        assert_eq!(Paused.apply(Resume), (Running, FrameAction::Schedule));
    }

    #[test]
    fn repeated_pause_and_resume_are_noops() {
        assert_eq!(Paused.apply(Pause), (Paused, FrameAction::Nothing));
        assert_eq!(Running.apply(Resume), (Running, FrameAction::Nothing));
        assert_eq!(Running.apply(Start), (Running, FrameAction::Nothing));
    }

    #[test]
    fn uninitialized_cannot_pause_or_resume() {
        assert_eq!(Uninitialized.apply(Pause), (Uninitialized, FrameAction::Nothing));
        assert_eq!(Uninitialized.apply(Resume), (Uninitialized, FrameAction::Nothing));
    }

    #[test]
    fn destroy_is_terminal() {
        assert_eq!(Running.apply(Destroy), (Destroyed, FrameAction::Cancel));
        assert_eq!(Paused.apply(Destroy), (Destroyed, FrameAction::Nothing));
        for event in [Start, Pause, Resume, Destroy] {
            assert_eq!(Destroyed.apply(event), (Destroyed, FrameAction::Nothing));
        }
    }
}
