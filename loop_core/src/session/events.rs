//! The closed intent/command vocabulary between the UI shell and the session.
//!
//! The shell translates raw input into `PlayerIntent` values and applies the
//! returned `UiCommand` list to its render surface; nothing else crosses the
//! boundary.

use serde::{Deserialize, Serialize};

use loop_rules::ArticleTitle;

/// What the player just did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerIntent {
    /// Start over at level 1.
    NewGame,
    /// Restart the current level with the same starting article.
    ResetLevel,
    /// Advance after completing a level.
    NextLevel,
    /// A link inside the displayed article was clicked.
    LinkClicked(ArticleTitle),
    /// A link inside the displayed article was hovered.
    LinkHovered(ArticleTitle),
    /// An entry in the displayed path was clicked.
    PathEntryClicked { index: usize },
}

/// How prominent a message should be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageKind {
    Info,
    Penalty,
    Error,
}

/// What the render surface should do in response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UiCommand {
    /// Show an article's content.
    DisplayArticle {
        title: ArticleTitle,
        content: String,
    },
    /// Refresh the level/score header.
    UpdateStatus {
        level: u32,
        target_steps: u32,
        steps: u32,
        starting_article: Option<ArticleTitle>,
        global_score: u32,
        level_score: u32,
    },
    /// Refresh the visited-path sidebar.
    ShowPath {
        path: Vec<ArticleTitle>,
        current_index: usize,
    },
    /// Show a transient message.
    ShowMessage { text: String, kind: MessageKind },
    /// Celebrate a perfectly closed loop.
    ShowCompletionModal {
        level: u32,
        steps: u32,
        score: u32,
        global_score: u32,
    },
}
