// SPDX-License-Identifier: MIT OR Apache-2.0
//! Player lifecycle state.

/// Lifecycle state of a player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayerState {
    /// No source was ever supplied
    #[default]
    Initial,
    /// A source is being loaded
    Loading,
    /// A project is loaded and can be stepped
    Ready,
    /// Loading or stepping failed; a new source is needed
    Error,
}

impl PlayerState {
    /// Whether the project can be stepped
    pub fn is_ready(&self) -> bool {
        matches!(self, PlayerState::Ready)
    }

    /// Whether a transition to `next` is allowed
    pub fn can_transition_to(&self, next: PlayerState) -> bool {
        use PlayerState::{Error, Loading, Ready};
        // A new source restarts loading from anywhere
        matches!(
            (*self, next),
            (_, Loading) | (Loading | Ready, Error) | (Loading, Ready)
        )
    }

    /// Display name
    pub fn name(&self) -> &'static str {
        match self {
            PlayerState::Initial => "initial",
            PlayerState::Loading => "loading",
            PlayerState::Ready => "ready",
            PlayerState::Error => "error",
        }
    }
}

impl std::fmt::Display for PlayerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
