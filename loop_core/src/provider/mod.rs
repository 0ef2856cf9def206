//! Content resolution - cache-first article lookup over an abstract fetch
//! collaborator, plus speculative preloading.

use std::sync::Arc;

use tracing::{debug, warn};

use loop_rules::ArticleTitle;

use crate::cache::ArticleCache;

/// A fetched article together with its canonical title.
///
/// The resolved title may differ from the requested one when the transport
/// followed a redirect or the document declared its own title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedArticle {
    pub content: String,
    pub resolved_title: ArticleTitle,
}

/// Why a fetch failed.
///
/// `NotFound` is a semantic outcome the player can correct by following a
/// different link; everything else is a transport problem.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("article not found")]
    NotFound,

    #[error("transport failure: {0}")]
    Transport(String),
}

/// The external collaborator that retrieves article content by title.
#[async_trait::async_trait]
pub trait ArticleFetcher: Send + Sync {
    async fn fetch_by_title(&self, title: &ArticleTitle) -> Result<FetchedArticle, FetchError>;
}

/// Resolves "content for title X", consulting the cache before the network.
pub struct ContentProvider {
    cache: Arc<ArticleCache>,
    fetcher: Arc<dyn ArticleFetcher>,
}

impl ContentProvider {
    pub fn new(cache: Arc<ArticleCache>, fetcher: Arc<dyn ArticleFetcher>) -> Self {
        Self { cache, fetcher }
    }

    /// Get an article's content, from the cache when possible.
    ///
    /// `Ok(None)` means the article does not exist - the caller owns the
    /// user-visible messaging. `Err` is reserved for transport failures. A
    /// successful fetch is stored under both the requested and the resolved
    /// title before returning.
    pub async fn get_content(
        &self,
        title: &ArticleTitle,
    ) -> Result<Option<FetchedArticle>, FetchError> {
        if let Some(cached) = self.cache.get(title).await {
            debug!(%title, "article loaded from cache");
            return Ok(Some(FetchedArticle {
                content: cached.content,
                resolved_title: cached.canonical_title,
            }));
        }

        let fetched = match self.fetcher.fetch_by_title(title).await {
            Ok(fetched) => fetched,
            Err(FetchError::NotFound) => return Ok(None),
            Err(error) => return Err(error),
        };

        debug!(%title, resolved = %fetched.resolved_title, "article fetched and cached");
        self.cache
            .put(
                title.clone(),
                fetched.content.clone(),
                Some(fetched.resolved_title.clone()),
            )
            .await;

        Ok(Some(fetched))
    }

    /// Speculatively fetch an article the player may visit next.
    ///
    /// A no-op when the title is already cached or already being preloaded;
    /// failures are logged and swallowed. The in-flight mark is cleared
    /// whatever the outcome.
    pub async fn preload(&self, title: &ArticleTitle) {
        if !self.cache.begin_preload(title) {
            return;
        }
        debug!(%title, "preloading article");

        match self.get_content(title).await {
            Ok(Some(_)) => debug!(%title, "preloaded and cached"),
            Ok(None) => debug!(%title, "preload target not found"),
            Err(error) => warn!(%title, %error, "failed to preload article"),
        }

        self.cache.finish_preload(title);
    }

    /// The cache behind this provider.
    pub fn cache(&self) -> &ArticleCache {
        &self.cache
    }
}
