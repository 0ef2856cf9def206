//! Session configuration: the starting-article pool and cache capacity.

use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use loop_rules::ArticleTitle;

use crate::cache::DEFAULT_MAX_SIZE;

/// Configuration for one game session.
///
/// Loadable from TOML; omitted fields fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Articles a level may start from.
    pub starting_articles: Vec<String>,
    /// Maximum number of keys the article cache holds.
    pub max_cache_size: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            starting_articles: [
                "History",
                "Science",
                "Mathematics",
                "Geography",
                "Philosophy",
                "Technology",
                "Music",
                "Art",
                "Literature",
                "Biology",
                "Physics",
                "Chemistry",
                "Astronomy",
                "Computer",
                "Language",
                "Culture",
                "Religion",
                "Economy",
                "Politics",
                "Education",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            max_cache_size: DEFAULT_MAX_SIZE,
        }
    }
}

/// Why a configuration was rejected.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("starting article list is empty")]
    NoStartingArticles,
}

impl GameConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        if config.starting_articles.is_empty() {
            return Err(ConfigError::NoStartingArticles);
        }
        Ok(config)
    }

    /// Pick a random article from the starting pool.
    pub fn random_starting_article(&self) -> Option<ArticleTitle> {
        self.starting_articles
            .choose(&mut rand::rng())
            .map(|title| ArticleTitle::new(title.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GameConfig::default();
        assert_eq!(config.starting_articles.len(), 20);
        assert_eq!(config.max_cache_size, 50);
    }

    #[test]
    fn test_from_toml_with_defaults_filled_in() {
        let config = GameConfig::from_toml_str("starting_articles = [\"Science\"]\n").unwrap();
        assert_eq!(config.starting_articles, vec!["Science".to_string()]);
        assert_eq!(config.max_cache_size, 50);
    }

    #[test]
    fn test_from_toml_full() {
        let text = "starting_articles = [\"History\", \"Art\"]\nmax_cache_size = 10\n";
        let config = GameConfig::from_toml_str(text).unwrap();
        assert_eq!(config.max_cache_size, 10);
    }

    #[test]
    fn test_empty_starting_pool_rejected() {
        let result = GameConfig::from_toml_str("starting_articles = []\n");
        assert!(matches!(result, Err(ConfigError::NoStartingArticles)));
    }

    #[test]
    fn test_invalid_toml_rejected() {
        assert!(matches!(
            GameConfig::from_toml_str("max_cache_size = \"many\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_random_pick_comes_from_pool() {
        let config = GameConfig {
            starting_articles: vec!["Science".to_string()],
            ..GameConfig::default()
        };
        assert_eq!(
            config.random_starting_article(),
            Some(ArticleTitle::new("Science"))
        );

        let empty = GameConfig {
            starting_articles: Vec::new(),
            ..GameConfig::default()
        };
        assert_eq!(empty.random_starting_article(), None);
    }
}
