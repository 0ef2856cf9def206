//! # Loop Core (the Wikiloop engine)
//!
//! The engine side of Wikiloop. This crate interfaces with `loop_rules`,
//! caches fetched articles, resolves content through an abstract fetch
//! collaborator, and drives one game session from player intents to UI
//! commands.
//!
//! ## Core Components
//!
//! - **cache**: Bounded article cache with alias entries for canonical
//!   titles and best-effort persistence to a key-value store
//! - **provider**: Cache-first content resolution and speculative preloading
//! - **session**: The controller turning player intents into UI commands
//! - **config**: Session configuration (starting articles, cache capacity)
//!
//! ## Design Philosophy
//!
//! - **One owned context per session**: no globals; the session owns the
//!   state machine and is handed its collaborators at construction
//! - **Unidirectional flow**: a closed set of intents in, a closed set of
//!   UI commands out
//! - **Failure-tolerant persistence**: the in-memory cache is authoritative;
//!   the persisted blob is a best-effort copy that never blocks play

pub mod cache;
pub mod config;
pub mod provider;
pub mod session;

pub use cache::*;
pub use config::*;
pub use provider::*;
pub use session::*;
