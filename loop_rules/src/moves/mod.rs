//! Typed outcomes of move validation, backtracking, and completion checks.
//!
//! All of these are returned values, never panics: the state machine defends
//! its invariants even against moves the UI should have filtered out.

use serde::{Deserialize, Serialize};

use crate::path::ArticleTitle;

/// Verdict on a proposed move, before any content has been fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveDecision {
    /// The move is legal and may be fetched and committed.
    Accepted,
    /// The move is illegal; the reason carries the exact counts to surface.
    Rejected(MoveRejection),
}

/// Why a proposed move was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum MoveRejection {
    /// The clicked article is the one currently displayed.
    #[error("you are already on this article")]
    NoOpMove,

    /// The clicked article is in the path and is not the starting article.
    #[error("you've already visited \"{title}\"; only the starting article can be revisited to close the loop")]
    AlreadyVisited { title: ArticleTitle },

    /// Returning to the start too early.
    #[error("this would be step {next_step} of {target}; take {needed} more step(s) before returning")]
    TooFewSteps {
        next_step: u32,
        target: u32,
        needed: u32,
    },

    /// Returning to the start too late.
    #[error("this would be step {next_step} but the loop had to close in exactly {target} steps")]
    TooManySteps {
        next_step: u32,
        target: u32,
        excess: u32,
    },
}

/// Result of the completion check run after every committed move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompletionStatus {
    /// The level continues.
    Ongoing,

    /// Loop closed in exactly the target number of steps.
    Perfect { level: u32, steps: u32, score: u32 },

    /// Loop closed, but with more steps than the target.
    Imperfect { message: String },

    /// The step budget ran out without closing the loop.
    Failed { message: String },
}

/// What a backtrack cost the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BacktrackOutcome {
    /// Points deducted from the level score.
    pub penalty: u32,
    /// How many path entries were rewound.
    pub steps_back: u32,
}
