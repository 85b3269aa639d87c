//! Article submission form
//!
//! A draft is either a link import or a written article. Validation happens
//! here, before anything reaches the data service.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use super::FeedError;
use crate::auth::AuthUser;
use crate::store::{ArticleLink, NewArticle, INTERNAL_SCHEME};

/// How the article's content is supplied
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleMode {
    /// Import from an external URL
    #[default]
    Link,
    /// Write the article in place
    Write,
}

/// Article form state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleDraft {
    #[serde(default)]
    pub mode: ArticleMode,
    #[serde(default)]
    pub title: String,
    /// External URL (link mode)
    #[serde(default)]
    pub link: String,
    /// Short description; in write mode it falls back to the content
    #[serde(default)]
    pub summary: String,
    /// Full text (write mode)
    #[serde(default)]
    pub content: String,
}

impl ArticleDraft {
    /// A link-mode draft
    pub fn link(title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            mode: ArticleMode::Link,
            title: title.into(),
            link: link.into(),
            ..Default::default()
        }
    }

    /// A write-mode draft
    pub fn write(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            mode: ArticleMode::Write,
            title: title.into(),
            content: content.into(),
            ..Default::default()
        }
    }

    /// Builder method: set the summary
    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    /// Switch mode; switching always starts from an empty form
    pub fn set_mode(&mut self, mode: ArticleMode) {
        self.mode = mode;
        self.clear();
    }

    /// Empty every field, keeping the mode
    pub fn clear(&mut self) {
        self.title.clear();
        self.link.clear();
        self.summary.clear();
        self.content.clear();
    }

    /// Check required fields for the current mode
    pub fn validate(&self) -> Result<(), FeedError> {
        match self.mode {
            ArticleMode::Link => {
                if self.title.trim().is_empty() || self.link.trim().is_empty() {
                    return Err(FeedError::Validation(
                        "Title and Link are required".to_string(),
                    ));
                }
                let link = self.link.trim();
                if link.starts_with(INTERNAL_SCHEME) || !url_pattern().is_match(link) {
                    return Err(FeedError::Validation(format!(
                        "Link must be an http(s) URL: {}",
                        link
                    )));
                }
            }
            ArticleMode::Write => {
                if self.title.trim().is_empty() || self.content.trim().is_empty() {
                    return Err(FeedError::Validation(
                        "Title and content are required".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Build the insert payload, stamping authorship from the session
    ///
    /// Write mode mints a fresh internal link for every call.
    pub fn to_new_article(&self, author: &AuthUser) -> Result<NewArticle, FeedError> {
        self.validate()?;

        let summary = non_empty(self.summary.trim());
        let (description, link) = match self.mode {
            ArticleMode::Link => (
                summary,
                ArticleLink::External(self.link.trim().to_string()),
            ),
            ArticleMode::Write => (
                summary.or_else(|| non_empty(self.content.trim())),
                ArticleLink::new_internal(),
            ),
        };

        Ok(NewArticle {
            title: self.title.trim().to_string(),
            description,
            link,
            author_id: author.id.clone(),
            author_name: author.display_name().to_string(),
        })
    }
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

fn url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^https?://[^\s/$.?#][^\s]*$").expect("link pattern is a valid regex")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::INTERNAL_ARTICLE_PREFIX;

    fn author() -> AuthUser {
        AuthUser::new("u1", "asha@example.com").full_name("Asha")
    }

    #[test]
    fn test_link_draft() {
        let new = ArticleDraft::link("  Test ", " https://example.com ")
            .to_new_article(&author())
            .unwrap();

        assert_eq!(new.title, "Test");
        assert_eq!(new.link, ArticleLink::External("https://example.com".to_string()));
        assert_eq!(new.description, None);
        assert_eq!(new.author_id, "u1");
        assert_eq!(new.author_name, "Asha");
    }

    #[test]
    fn test_write_draft_uses_content_when_no_summary() {
        let new = ArticleDraft::write("Lessons", "  Long form text  ")
            .to_new_article(&author())
            .unwrap();

        assert_eq!(new.description.as_deref(), Some("Long form text"));
        assert!(new.link.to_stored().starts_with(INTERNAL_ARTICLE_PREFIX));
    }

    #[test]
    fn test_write_draft_prefers_summary() {
        let new = ArticleDraft::write("Lessons", "Long form text")
            .summary("Short")
            .to_new_article(&author())
            .unwrap();

        assert_eq!(new.description.as_deref(), Some("Short"));
    }

    #[test]
    fn test_required_fields() {
        let err = ArticleDraft::link("", "https://example.com")
            .validate()
            .unwrap_err();
        assert_eq!(err.to_string(), "Title and Link are required");

        let err = ArticleDraft::write("Title", "   ").validate().unwrap_err();
        assert_eq!(err.to_string(), "Title and content are required");
    }

    #[test]
    fn test_rejects_non_http_links() {
        assert!(ArticleDraft::link("T", "ftp://example.com").validate().is_err());
        assert!(ArticleDraft::link("T", "internal://article/x")
            .validate()
            .is_err());
        assert!(ArticleDraft::link("T", "http://localhost:8080/a").validate().is_ok());
    }

    #[test]
    fn test_set_mode_clears_form() {
        let mut draft = ArticleDraft::link("Title", "https://example.com");
        draft.set_mode(ArticleMode::Write);

        assert_eq!(draft.mode, ArticleMode::Write);
        assert!(draft.title.is_empty());
        assert!(draft.link.is_empty());
    }

    #[test]
    fn test_mode_deserializes_lowercase() {
        let draft: ArticleDraft =
            serde_json::from_str(r#"{"mode": "write", "title": "T", "content": "Body"}"#).unwrap();
        assert_eq!(draft.mode, ArticleMode::Write);
        assert!(draft.link.is_empty());
    }
}
