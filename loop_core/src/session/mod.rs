//! The game session - one owned context object per running game.
//!
//! The session receives player intents, consults the rules crate for
//! move legality, resolves content through the provider, and answers with
//! the UI commands the shell should apply. Data flows one way: intent in,
//! commands out.

mod events;

pub use events::*;

use tracing::{debug, warn};

use loop_rules::{ArticleTitle, CompletionStatus, GameState, MoveDecision, MoveRejection};

use crate::config::GameConfig;
use crate::provider::ContentProvider;

/// One running game: the state machine plus its collaborators.
pub struct GameSession {
    state: GameState,
    provider: ContentProvider,
    config: GameConfig,
}

impl GameSession {
    /// Create a session. No level is running until a `NewGame` intent
    /// arrives.
    pub fn new(provider: ContentProvider, config: GameConfig) -> Self {
        Self {
            state: GameState::new(),
            provider,
            config,
        }
    }

    /// Dispatch one player intent and collect the resulting UI commands.
    pub async fn handle(&mut self, intent: PlayerIntent) -> Vec<UiCommand> {
        let mut commands = Vec::new();
        match intent {
            PlayerIntent::NewGame => {
                self.state.initialize_game();
                self.start_level(&mut commands).await;
            }
            PlayerIntent::NextLevel => {
                self.state.next_level();
                self.start_level(&mut commands).await;
            }
            PlayerIntent::ResetLevel => {
                self.state.reset_level();
                match self.state.starting_article().cloned() {
                    Some(start) => {
                        self.push_status(&mut commands);
                        self.navigate_to(start, true, &mut commands).await;
                    }
                    // Reset before any game began: start fresh instead.
                    None => self.start_level(&mut commands).await,
                }
            }
            PlayerIntent::LinkHovered(title) => {
                self.provider.preload(&title).await;
            }
            PlayerIntent::LinkClicked(title) => {
                self.link_clicked(title, &mut commands).await;
            }
            PlayerIntent::PathEntryClicked { index } => {
                self.path_entry_clicked(index, &mut commands).await;
            }
        }
        commands
    }

    /// The state machine, read-only.
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// The content provider, for shells that spawn preloads themselves.
    pub fn provider(&self) -> &ContentProvider {
        &self.provider
    }

    /// Pick a starting article and open the level on it.
    async fn start_level(&mut self, commands: &mut Vec<UiCommand>) {
        let Some(start) = self.config.random_starting_article() else {
            commands.push(UiCommand::ShowMessage {
                text: "No starting articles are configured.".to_string(),
                kind: MessageKind::Error,
            });
            return;
        };
        self.state.set_starting_article(start.clone());
        self.push_status(commands);
        self.navigate_to(start, true, commands).await;
    }

    /// Validate a clicked link and navigate when it is legal.
    async fn link_clicked(&mut self, title: ArticleTitle, commands: &mut Vec<UiCommand>) {
        match self.state.propose_move(&title) {
            MoveDecision::Rejected(rejection) => {
                debug!(%title, %rejection, "move rejected");
                commands.push(UiCommand::ShowMessage {
                    text: rejection.to_string(),
                    kind: MessageKind::Error,
                });
            }
            MoveDecision::Accepted => self.navigate_to(title, true, commands).await,
        }
    }

    /// Jump back to an earlier path entry, paying the penalty while the
    /// level is live. The article is re-displayed without rejoining the
    /// path.
    async fn path_entry_clicked(&mut self, index: usize, commands: &mut Vec<UiCommand>) {
        let len = self.state.path().len();
        if len == 0 || index >= len - 1 {
            return;
        }
        let Some(target) = self.state.path().get(index).cloned() else {
            return;
        };

        if let Some(outcome) = self.state.navigate_back(index) {
            commands.push(UiCommand::ShowMessage {
                text: format!(
                    "-{} points for going back {} step(s)",
                    outcome.penalty, outcome.steps_back
                ),
                kind: MessageKind::Penalty,
            });
        }

        self.navigate_to(target, false, commands).await;
    }

    /// Resolve content for `title` and display it, committing the resolved
    /// title to the path when `add_to_path` is set.
    async fn navigate_to(
        &mut self,
        title: ArticleTitle,
        add_to_path: bool,
        commands: &mut Vec<UiCommand>,
    ) {
        match self.provider.get_content(&title).await {
            Err(error) => {
                warn!(%title, %error, "failed to load article");
                commands.push(UiCommand::ShowMessage {
                    text: format!(
                        "Failed to load \"{title}\". Please try again or follow a different link."
                    ),
                    kind: MessageKind::Error,
                });
            }
            Ok(None) => {
                commands.push(UiCommand::ShowMessage {
                    text: format!("Article \"{title}\" was not found. Try a different link."),
                    kind: MessageKind::Error,
                });
            }
            Ok(Some(article)) => {
                commands.push(UiCommand::DisplayArticle {
                    title: article.resolved_title.clone(),
                    content: article.content,
                });
                if add_to_path {
                    self.record_move(title, article.resolved_title, commands);
                } else {
                    self.state.set_current_article(article.resolved_title);
                    self.push_path(commands);
                    self.push_status(commands);
                }
            }
        }
    }

    /// Commit a resolved title and run the completion check on the post-move
    /// path.
    fn record_move(
        &mut self,
        clicked: ArticleTitle,
        resolved: ArticleTitle,
        commands: &mut Vec<UiCommand>,
    ) {
        // A redirect can land on a title the click was never validated
        // against; validate the resolved title before it joins the path.
        if resolved != clicked {
            if let MoveDecision::Rejected(rejection) = self.state.propose_move(&resolved) {
                match rejection {
                    MoveRejection::NoOpMove => {
                        debug!(%resolved, "redirect resolved to the current article, not committed")
                    }
                    other => commands.push(UiCommand::ShowMessage {
                        text: other.to_string(),
                        kind: MessageKind::Error,
                    }),
                }
                self.push_path(commands);
                self.push_status(commands);
                return;
            }
        }

        if !self.state.commit_move(resolved) {
            self.push_path(commands);
            self.push_status(commands);
            return;
        }

        self.push_path(commands);
        match self.state.check_completion() {
            CompletionStatus::Perfect {
                level,
                steps,
                score,
            } => {
                commands.push(UiCommand::ShowCompletionModal {
                    level,
                    steps,
                    score,
                    global_score: self.state.global_score(),
                });
            }
            CompletionStatus::Imperfect { message } | CompletionStatus::Failed { message } => {
                commands.push(UiCommand::ShowMessage {
                    text: message,
                    kind: MessageKind::Error,
                });
            }
            CompletionStatus::Ongoing => {}
        }
        self.push_status(commands);
    }

    fn push_status(&self, commands: &mut Vec<UiCommand>) {
        commands.push(UiCommand::UpdateStatus {
            level: self.state.level(),
            target_steps: self.state.target_steps(),
            steps: self.state.current_steps(),
            starting_article: self.state.starting_article().cloned(),
            global_score: self.state.global_score(),
            level_score: self.state.level_score(),
        });
    }

    fn push_path(&self, commands: &mut Vec<UiCommand>) {
        let path: Vec<ArticleTitle> = self.state.path().iter().cloned().collect();
        let current_index = path.len().saturating_sub(1);
        commands.push(UiCommand::ShowPath {
            path,
            current_index,
        });
    }
}
