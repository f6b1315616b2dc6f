use crate::error::Result;

use super::command::{Command, CommandRecorder};

/// How a backbuffer is about to be accessed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResourceState {
    #[default]
    Present,
    RenderTarget,
}

impl ResourceState {
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Present => Self::RenderTarget,
            Self::RenderTarget => Self::Present,
        }
    }
}

/// Appends a barrier moving `image` out of `state` and returns the state it
/// ends up in. Callers pair every call before drawing with one after.
pub fn transition(
    state: ResourceState,
    recorder: &mut CommandRecorder,
    image: usize,
) -> Result<ResourceState> {
    let after = state.toggled();
    recorder.record(Command::Barrier {
        image,
        before: state,
        after,
    })?;
    Ok(after)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn even_number_of_transitions_is_identity() {
        for start in [ResourceState::Present, ResourceState::RenderTarget] {
            for pairs in 0..8 {
                let mut recorder = CommandRecorder::new();
                let mut state = start;
                for _ in 0..pairs * 2 {
                    state = transition(state, &mut recorder, 0).unwrap();
                }
                assert_eq!(state, start);
                assert_eq!(recorder.len(), pairs * 2);
            }
        }
    }

    #[test]
    fn records_a_barrier_per_call() {
        let mut recorder = CommandRecorder::new();
        let state = transition(ResourceState::Present, &mut recorder, 1).unwrap();
        let state = transition(state, &mut recorder, 1).unwrap();

        assert_eq!(state, ResourceState::Present);
        assert_eq!(
            recorder.commands(),
            &[
                Command::Barrier {
                    image: 1,
                    before: ResourceState::Present,
                    after: ResourceState::RenderTarget,
                },
                Command::Barrier {
                    image: 1,
                    before: ResourceState::RenderTarget,
                    after: ResourceState::Present,
                },
            ]
        );
    }

    #[test]
    fn fails_on_a_closed_recorder() {
        let mut recorder = CommandRecorder::new();
        recorder.close().unwrap();
        assert!(transition(ResourceState::Present, &mut recorder, 0).is_err());
    }
}
