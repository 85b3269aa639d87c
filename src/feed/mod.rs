//! Community feed
//!
//! Topics and articles, plus the form used to publish new ones.
//!
//! ```no_run
//! use safar::feed::{ArticleDraft, FeedController};
//! use safar::{AuthUser, DataStore};
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(DataStore::in_memory()?);
//! let mut feed = FeedController::new(store);
//! feed.load().await?;
//!
//! let user = AuthUser::new("u1", "asha@example.com");
//! let mut draft = ArticleDraft::write("Season 3 recap", "Twelve deals closed...");
//! feed.submit(Some(&user), &mut draft).await?;
//! # Ok(())
//! # }
//! ```

mod controller;
mod draft;

pub use controller::{ArticleAction, FeedController};
pub use draft::{ArticleDraft, ArticleMode};

use crate::store::StoreError;
use thiserror::Error;

/// Feed errors
#[derive(Debug, Error)]
pub enum FeedError {
    /// The action needs a signed-in user
    #[error("{0}")]
    LoginRequired(&'static str),

    /// Missing or malformed form fields
    #[error("{0}")]
    Validation(String),

    #[error("Article not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}
