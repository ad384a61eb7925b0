//! Viewer phase state machine
//!
//! The recipient-facing experience moves through a fixed sequence of
//! narrative phases. The transition table lives here so that illegal
//! transitions (e.g. jumping from `gallery` straight to `accepted`) are
//! rejected in one place rather than by scattered boolean checks.

use serde::{Deserialize, Serialize};

/// Narrative phase of a viewer session
///
/// `Accepted` is terminal and reachable only from `Proposal`. The decline
/// path never leaves `Proposal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Warming assets; nothing rendered beyond the progress indicator
    Loading,
    /// Passcode gate
    Splash,
    /// Title card with the partner's name, auto-advances
    Hero,
    /// Timed media gallery
    Gallery,
    /// Auto-scrolled how-we-met text
    Story,
    /// Love-reasons carousel
    Reasons,
    /// The question, with accept/decline controls
    Proposal,
    /// Terminal celebratory state
    Accepted,
}

impl Phase {
    /// Whether a transition from `self` to `to` is legal
    pub fn permits(self, to: Phase) -> bool {
        use Phase::*;
        matches!(
            (self, to),
            (Loading, Splash)
                | (Splash, Hero)
                | (Hero, Gallery)
                | (Gallery, Story)
                | (Story, Reasons)
                | (Reasons, Proposal)
                | (Proposal, Accepted)
        )
    }

    /// Terminal phases admit no further transitions
    pub fn is_terminal(self) -> bool {
        self == Phase::Accepted
    }

    /// Phases past the passcode gate suppress the lock UI and expose the
    /// music toggle
    pub fn is_unlocked(self) -> bool {
        !matches!(self, Phase::Loading | Phase::Splash)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Phase::Loading => "loading",
            Phase::Splash => "splash",
            Phase::Hero => "hero",
            Phase::Gallery => "gallery",
            Phase::Story => "story",
            Phase::Reasons => "reasons",
            Phase::Proposal => "proposal",
            Phase::Accepted => "accepted",
        };
        write!(f, "{}", name)
    }
}
