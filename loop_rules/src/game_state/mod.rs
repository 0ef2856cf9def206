//! Game state - the level/score state machine at the heart of Wikiloop.
//!
//! A level is won by returning to the starting article in exactly
//! `target_steps` link clicks, where `target_steps` doubles the level number.
//! Overshooting the target, or running past twice the target without closing
//! the loop, ends the level in failure.

use serde::{Deserialize, Serialize};

use crate::moves::{BacktrackOutcome, CompletionStatus, MoveDecision, MoveRejection};
use crate::path::{ArticleTitle, NavigationPath};

/// Score a fresh level starts with.
pub const LEVEL_MAX_SCORE: u32 = 100;

/// Points lost per path entry rewound when backtracking.
pub const BACKTRACK_UNIT_PENALTY: u32 = 10;

/// Steps required to close the loop at a given level.
pub const fn target_steps_for(level: u32) -> u32 {
    level * 2
}

/// The complete state of one game session: current level, step target, the
/// path walked so far, and both scores.
///
/// Invariants: `target_steps == level * 2`; `level_score <= 100`; `started`
/// is set only once the path holds more than the starting article;
/// `current_article` equals the last path entry while a level is in play.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    level: u32,
    target_steps: u32,
    starting_article: Option<ArticleTitle>,
    current_article: Option<ArticleTitle>,
    started: bool,
    completed: bool,
    global_score: u32,
    level_score: u32,
    path: NavigationPath,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState {
    /// Create the state for a brand-new game at level 1.
    pub fn new() -> Self {
        Self {
            level: 1,
            target_steps: target_steps_for(1),
            starting_article: None,
            current_article: None,
            started: false,
            completed: false,
            global_score: 0,
            level_score: LEVEL_MAX_SCORE,
            path: NavigationPath::new(),
        }
    }

    /// Reset everything back to a fresh level-1 game, global score included.
    pub fn initialize_game(&mut self) {
        *self = Self::new();
    }

    /// Record the level's anchor article. Must be set before the first move.
    pub fn set_starting_article(&mut self, title: ArticleTitle) {
        self.starting_article = Some(title);
    }

    /// Record which article is currently displayed.
    pub fn set_current_article(&mut self, title: ArticleTitle) {
        self.current_article = Some(title);
    }

    /// Steps taken so far this level.
    pub fn current_steps(&self) -> u32 {
        self.path.steps()
    }

    /// Validate a move against the path as it stands.
    ///
    /// The title checked here is the one the player clicked; redirect
    /// resolution happens later, and the resolved title is validated again
    /// before it is committed.
    pub fn propose_move(&self, title: &ArticleTitle) -> MoveDecision {
        if self.path.last() == Some(title) {
            return MoveDecision::Rejected(MoveRejection::NoOpMove);
        }

        if self.path.contains(title) {
            // Only the starting article may be revisited, and only as the
            // loop-closing step.
            if self.starting_article.as_ref() == Some(title) {
                let next_step = self.current_steps() + 1;
                return if next_step == self.target_steps {
                    MoveDecision::Accepted
                } else if next_step < self.target_steps {
                    MoveDecision::Rejected(MoveRejection::TooFewSteps {
                        next_step,
                        target: self.target_steps,
                        needed: self.target_steps - next_step,
                    })
                } else {
                    MoveDecision::Rejected(MoveRejection::TooManySteps {
                        next_step,
                        target: self.target_steps,
                        excess: next_step - self.target_steps,
                    })
                };
            }
            return MoveDecision::Rejected(MoveRejection::AlreadyVisited {
                title: title.clone(),
            });
        }

        MoveDecision::Accepted
    }

    /// Append a resolved title to the path and make it current.
    ///
    /// Returns `false` when the title equals the last path entry, in which
    /// case nothing changes. The level counts as started once the path holds
    /// anything beyond the starting article.
    pub fn commit_move(&mut self, resolved: ArticleTitle) -> bool {
        if !self.path.push(resolved.clone()) {
            return false;
        }
        self.current_article = Some(resolved);
        if self.path.len() > 1 {
            self.started = true;
        }
        true
    }

    /// Evaluate the win/loss condition against the post-move path.
    ///
    /// Must run strictly after `commit_move`. Only a loop closed in exactly
    /// `target_steps` wins and banks the level score into the global score.
    pub fn check_completion(&mut self) -> CompletionStatus {
        if !self.started || self.completed {
            return CompletionStatus::Ongoing;
        }

        let steps = self.current_steps();
        let at_start =
            self.current_article.is_some() && self.current_article == self.starting_article;

        if at_start && steps > 0 {
            if steps == self.target_steps {
                self.completed = true;
                self.global_score += self.level_score;
                return CompletionStatus::Perfect {
                    level: self.level,
                    steps,
                    score: self.level_score,
                };
            }
            if steps > self.target_steps {
                self.completed = true;
                return CompletionStatus::Imperfect {
                    message: format!(
                        "You closed the loop in {steps} steps, but level {level} required exactly {target}.",
                        level = self.level,
                        target = self.target_steps,
                    ),
                };
            }
            // Back at the start early: only reachable when a redirect was
            // committed without validation. The level keeps going.
        }

        if steps >= self.target_steps * 2 {
            self.completed = true;
            return CompletionStatus::Failed {
                message: format!(
                    "Too many steps: {steps} taken without closing the loop in {target}.",
                    target = self.target_steps,
                ),
            };
        }

        CompletionStatus::Ongoing
    }

    /// Rewind the path to `index`, paying the backtrack penalty.
    ///
    /// Returns `None` - touching neither score nor path - when `index` is the
    /// current entry or out of range, when the level has not started, or when
    /// it is already over. The penalty is `steps_back * 10`, floored at a
    /// level score of zero.
    pub fn navigate_back(&mut self, index: usize) -> Option<BacktrackOutcome> {
        if self.path.is_empty() || index >= self.path.len() - 1 {
            return None;
        }
        if !self.started || self.completed {
            return None;
        }

        let steps_back = (self.path.len() - 1 - index) as u32;
        let penalty = steps_back * BACKTRACK_UNIT_PENALTY;
        self.level_score = self.level_score.saturating_sub(penalty);
        self.path.truncate_to(index);
        self.current_article = self.path.last().cloned();

        Some(BacktrackOutcome {
            penalty,
            steps_back,
        })
    }

    /// Advance to the next level with a fresh path and level score.
    pub fn next_level(&mut self) {
        self.level += 1;
        self.target_steps = target_steps_for(self.level);
        self.reset_level();
    }

    /// Restart the current level: fresh path and level score, same level,
    /// same step target. The global score is untouched.
    pub fn reset_level(&mut self) {
        self.completed = false;
        self.started = false;
        self.level_score = LEVEL_MAX_SCORE;
        self.current_article = None;
        self.path.clear();
    }

    /// Current level number, starting at 1.
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Steps required to close this level's loop.
    pub fn target_steps(&self) -> u32 {
        self.target_steps
    }

    /// The level's anchor article, if one has been chosen.
    pub fn starting_article(&self) -> Option<&ArticleTitle> {
        self.starting_article.as_ref()
    }

    /// The article currently displayed.
    pub fn current_article(&self) -> Option<&ArticleTitle> {
        self.current_article.as_ref()
    }

    /// Whether at least one move beyond the starting article was made.
    pub fn started(&self) -> bool {
        self.started
    }

    /// Whether the level has ended, in victory or defeat.
    pub fn completed(&self) -> bool {
        self.completed
    }

    /// Points banked across completed levels.
    pub fn global_score(&self) -> u32 {
        self.global_score
    }

    /// Points still attached to the level in play.
    pub fn level_score(&self) -> u32 {
        self.level_score
    }

    /// The articles visited this level, in order.
    pub fn path(&self) -> &NavigationPath {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with_path(titles: &[&str]) -> GameState {
        let mut state = GameState::new();
        state.set_starting_article(titles[0].into());
        for title in titles {
            state.commit_move((*title).into());
        }
        state
    }

    #[test]
    fn test_new_game_defaults() {
        let state = GameState::new();
        assert_eq!(state.level(), 1);
        assert_eq!(state.target_steps(), 2);
        assert_eq!(state.global_score(), 0);
        assert_eq!(state.level_score(), LEVEL_MAX_SCORE);
        assert!(!state.started());
        assert!(!state.completed());
        assert!(state.path().is_empty());
    }

    #[test]
    fn test_steps_track_path_length() {
        let state = state_with_path(&["Science", "Physics", "Chemistry"]);
        assert_eq!(state.current_steps(), state.path().len() as u32 - 1);
        assert_eq!(state.current_steps(), 2);
    }

    #[test]
    fn test_perfect_loop_on_level_one() {
        let mut state = GameState::new();
        state.set_starting_article("Science".into());
        state.commit_move("Science".into());

        assert_eq!(state.propose_move(&"Physics".into()), MoveDecision::Accepted);
        state.commit_move("Physics".into());
        assert_eq!(state.current_steps(), 1);
        assert!(state.started());

        // Returning now is step 2 of 2: the winning move.
        assert_eq!(state.propose_move(&"Science".into()), MoveDecision::Accepted);
        state.commit_move("Science".into());

        let status = state.check_completion();
        assert_eq!(
            status,
            CompletionStatus::Perfect {
                level: 1,
                steps: 2,
                score: 100,
            }
        );
        assert!(state.completed());
        assert_eq!(state.global_score(), 100);
    }

    #[test]
    fn test_global_score_only_grows_on_perfect() {
        let mut state = state_with_path(&["Science", "Physics", "Chemistry"]);
        // Force an overshot return to start, bypassing validation.
        state.commit_move("Science".into());

        assert!(matches!(
            state.check_completion(),
            CompletionStatus::Imperfect { .. }
        ));
        assert!(state.completed());
        assert_eq!(state.global_score(), 0);
    }

    #[test]
    fn test_no_op_move_rejected() {
        let state = state_with_path(&["Science", "Physics"]);
        assert_eq!(
            state.propose_move(&"Physics".into()),
            MoveDecision::Rejected(MoveRejection::NoOpMove)
        );
    }

    #[test]
    fn test_revisiting_intermediate_article_rejected() {
        let state = state_with_path(&["Science", "Physics", "Chemistry"]);
        assert_eq!(
            state.propose_move(&"Physics".into()),
            MoveDecision::Rejected(MoveRejection::AlreadyVisited {
                title: "Physics".into()
            })
        );
    }

    #[test]
    fn test_returning_early_rejected_with_needed_count() {
        let mut state = GameState::new();
        state.next_level(); // level 2, target 4
        state.set_starting_article("Science".into());
        state.commit_move("Science".into());
        state.commit_move("Physics".into());

        assert_eq!(
            state.propose_move(&"Science".into()),
            MoveDecision::Rejected(MoveRejection::TooFewSteps {
                next_step: 2,
                target: 4,
                needed: 2,
            })
        );
    }

    #[test]
    fn test_returning_late_rejected_with_excess_count() {
        let state = state_with_path(&["Science", "Physics", "Chemistry"]);
        assert_eq!(
            state.propose_move(&"Science".into()),
            MoveDecision::Rejected(MoveRejection::TooManySteps {
                next_step: 3,
                target: 2,
                excess: 1,
            })
        );
    }

    #[test]
    fn test_first_move_onto_start_is_accepted() {
        let mut state = GameState::new();
        state.set_starting_article("Science".into());
        assert_eq!(state.propose_move(&"Science".into()), MoveDecision::Accepted);
    }

    #[test]
    fn test_level_fails_at_twice_the_target() {
        let mut state = GameState::new();
        state.set_starting_article("Science".into());
        for title in ["Science", "Physics", "Chemistry", "Biology", "Geology"] {
            state.commit_move(title.into());
        }

        // 4 steps taken on a target of 2.
        assert!(matches!(
            state.check_completion(),
            CompletionStatus::Failed { .. }
        ));
        assert!(state.completed());
    }

    #[test]
    fn test_backtrack_penalty_and_truncation() {
        let mut state = state_with_path(&["Science", "Physics", "Chemistry", "Biology"]);

        let outcome = state.navigate_back(1).expect("backtrack should apply");
        assert_eq!(outcome.steps_back, 2);
        assert_eq!(outcome.penalty, 20);
        assert_eq!(state.level_score(), 80);
        assert_eq!(state.path().len(), 2);
        assert_eq!(state.current_article(), Some(&"Physics".into()));
    }

    #[test]
    fn test_backtrack_to_current_entry_rejected() {
        let mut state = state_with_path(&["Science", "Physics", "Chemistry"]);
        assert!(state.navigate_back(2).is_none());
        assert!(state.navigate_back(5).is_none());
        assert_eq!(state.level_score(), LEVEL_MAX_SCORE);
        assert_eq!(state.path().len(), 3);
    }

    #[test]
    fn test_backtrack_score_floors_at_zero() {
        let mut state = state_with_path(&[
            "Science", "A", "B", "C", "D", "E", "F", "G", "H", "I", "J", "K",
        ]);

        // 11 entries back: the 110-point penalty is capped by the 100 held.
        let outcome = state.navigate_back(0).expect("backtrack should apply");
        assert_eq!(outcome.penalty, 110);
        assert_eq!(state.level_score(), 0);
        assert_eq!(state.path().len(), 1);
    }

    #[test]
    fn test_backtrack_before_start_touches_nothing() {
        let mut state = GameState::new();
        state.set_starting_article("Science".into());
        state.commit_move("Science".into());

        assert!(state.navigate_back(0).is_none());
        assert_eq!(state.level_score(), LEVEL_MAX_SCORE);
    }

    #[test]
    fn test_backtrack_after_completion_touches_nothing() {
        let mut state = state_with_path(&["Science", "Physics"]);
        state.commit_move("Science".into());
        assert!(matches!(
            state.check_completion(),
            CompletionStatus::Perfect { .. }
        ));

        assert!(state.navigate_back(0).is_none());
        assert_eq!(state.path().len(), 3);
        assert_eq!(state.level_score(), LEVEL_MAX_SCORE);
    }

    #[test]
    fn test_commit_skips_consecutive_duplicate() {
        let mut state = GameState::new();
        state.set_starting_article("Science".into());
        state.commit_move("Science".into());

        assert!(!state.commit_move("Science".into()));
        assert_eq!(state.path().len(), 1);
        assert!(!state.started());
    }

    #[test]
    fn test_early_return_to_start_keeps_level_ongoing() {
        let mut state = GameState::new();
        state.next_level(); // target 4
        state.set_starting_article("Science".into());
        state.commit_move("Science".into());
        state.commit_move("Physics".into());
        // A redirect committed without validation lands us back early.
        state.commit_move("Science".into());

        assert_eq!(state.check_completion(), CompletionStatus::Ongoing);
        assert!(!state.completed());
    }

    #[test]
    fn test_next_level_advances_and_preserves_global_score() {
        let mut state = state_with_path(&["Science", "Physics"]);
        state.commit_move("Science".into());
        state.check_completion();
        assert_eq!(state.global_score(), 100);

        state.next_level();
        assert_eq!(state.level(), 2);
        assert_eq!(state.target_steps(), 4);
        assert_eq!(state.global_score(), 100);
        assert_eq!(state.level_score(), LEVEL_MAX_SCORE);
        assert!(state.path().is_empty());
        assert!(!state.started());
        assert!(!state.completed());
    }

    #[test]
    fn test_reset_level_keeps_level_and_target() {
        let mut state = GameState::new();
        state.next_level();
        state.set_starting_article("Science".into());
        state.commit_move("Science".into());
        state.commit_move("Physics".into());
        state.navigate_back(0);

        state.reset_level();
        assert_eq!(state.level(), 2);
        assert_eq!(state.target_steps(), 4);
        assert_eq!(state.level_score(), LEVEL_MAX_SCORE);
        assert!(state.path().is_empty());
    }

    #[test]
    fn test_initialize_game_resets_everything() {
        let mut state = state_with_path(&["Science", "Physics"]);
        state.commit_move("Science".into());
        state.check_completion();
        state.next_level();

        state.initialize_game();
        assert_eq!(state.level(), 1);
        assert_eq!(state.global_score(), 0);
        assert!(state.starting_article().is_none());
    }
}
