//! Core record types for the Safar data service
//!
//! This module defines the rows the store persists and publishes:
//! - `Article`: a community feed entry, either an external link or internal long-form text
//! - `FeedTopic`: a curated topic shown on the feed page
//! - `ChatMessage`: an append-only community chat line
//! - `Table`, `Row` and `RowEvent`: insert notifications for live subscribers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Scheme reserved for internally authored articles
pub const INTERNAL_SCHEME: &str = "internal://";

/// Prefix written for every internal article link
pub const INTERNAL_ARTICLE_PREFIX: &str = "internal://article/";

/// Where an article's content lives
///
/// Stored as a single string column; parsed once when a row is read so the
/// rest of the crate never sniffs prefixes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ArticleLink {
    /// Conventional URL pointing outside the site
    External(String),
    /// Community-written article, body kept in `description`
    Internal(String),
}

impl ArticleLink {
    /// Parse a stored link value
    pub fn parse(raw: &str) -> Self {
        match raw.strip_prefix(INTERNAL_SCHEME) {
            Some(rest) => {
                let id = rest.strip_prefix("article/").unwrap_or(rest);
                ArticleLink::Internal(id.to_string())
            }
            None => ArticleLink::External(raw.to_string()),
        }
    }

    /// Mint a fresh internal link with a unique id
    pub fn new_internal() -> Self {
        ArticleLink::Internal(uuid::Uuid::new_v4().to_string())
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, ArticleLink::Internal(_))
    }

    /// The value persisted in the `link` column
    pub fn to_stored(&self) -> String {
        match self {
            ArticleLink::External(url) => url.clone(),
            ArticleLink::Internal(id) => format!("{}{}", INTERNAL_ARTICLE_PREFIX, id),
        }
    }
}

impl From<String> for ArticleLink {
    fn from(raw: String) -> Self {
        ArticleLink::parse(&raw)
    }
}

impl From<ArticleLink> for String {
    fn from(link: ArticleLink) -> Self {
        link.to_stored()
    }
}

impl std::fmt::Display for ArticleLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_stored())
    }
}

/// A feed article
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub link: ArticleLink,
    pub author_id: String,
    pub author_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Article {
    pub fn is_internal(&self) -> bool {
        self.link.is_internal()
    }

    /// Resolve what a reader gets when opening this article
    pub fn content(&self) -> ArticleContent {
        match &self.link {
            ArticleLink::External(url) => ArticleContent::External { url: url.clone() },
            ArticleLink::Internal(id) => ArticleContent::Internal {
                id: id.clone(),
                body: self.description.clone().unwrap_or_default(),
            },
        }
    }
}

/// Readable form of an article
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ArticleContent {
    /// Open `url` in a new browsing context
    External { url: String },
    /// Render `body` inline
    Internal { id: String, body: String },
}

/// Insert payload for an article; id and timestamps are stamped by the store
#[derive(Debug, Clone, PartialEq)]
pub struct NewArticle {
    pub title: String,
    pub description: Option<String>,
    pub link: ArticleLink,
    pub author_id: String,
    pub author_name: String,
}

/// A curated feed topic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedTopic {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub icon: String,
    pub category: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a topic (also the shape of `[[feed.topics]]` seeds)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTopic {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub icon: String,
    pub category: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// One line of community chat
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub user_id: String,
    pub user_name: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a chat message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewChatMessage {
    pub user_id: String,
    pub user_name: String,
    pub message: String,
}

/// Tables exposed by the data service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Articles,
    ChatMessages,
    FeedTopics,
}

impl Table {
    pub fn all() -> &'static [Table] {
        &[Table::Articles, Table::ChatMessages, Table::FeedTopics]
    }

    /// Table name, also used as the live channel name
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Articles => "articles",
            Table::ChatMessages => "chat_messages",
            Table::FeedTopics => "feed_topics",
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Table {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Table::all()
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown table: {}", s))
    }
}

/// A freshly inserted row of any table
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Row {
    Article(Article),
    ChatMessage(ChatMessage),
    FeedTopic(FeedTopic),
}

impl Row {
    pub fn table(&self) -> Table {
        match self {
            Row::Article(_) => Table::Articles,
            Row::ChatMessage(_) => Table::ChatMessages,
            Row::FeedTopic(_) => Table::FeedTopics,
        }
    }
}

/// Insert notification delivered to channel subscribers
#[derive(Debug, Clone, PartialEq)]
pub struct RowEvent {
    pub table: Table,
    pub record: Row,
}

impl RowEvent {
    pub fn insert(record: Row) -> Self {
        Self {
            table: record.table(),
            record,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_external_link() {
        let link = ArticleLink::parse("https://example.com/post");
        assert_eq!(link, ArticleLink::External("https://example.com/post".to_string()));
        assert!(!link.is_internal());
    }

    #[test]
    fn test_parse_internal_link() {
        let link = ArticleLink::parse("internal://article/abc-123");
        assert_eq!(link, ArticleLink::Internal("abc-123".to_string()));
        assert_eq!(link.to_stored(), "internal://article/abc-123");

        // Any internal:// value counts as internal
        assert!(ArticleLink::parse("internal://1699000000000").is_internal());
    }

    #[test]
    fn test_new_internal_links_are_unique() {
        let a = ArticleLink::new_internal();
        let b = ArticleLink::new_internal();
        assert_ne!(a, b);
        assert!(a.to_stored().starts_with(INTERNAL_ARTICLE_PREFIX));
    }

    #[test]
    fn test_article_link_serializes_as_string() {
        let article = Article {
            id: "a1".to_string(),
            title: "Test".to_string(),
            description: Some("Body".to_string()),
            link: ArticleLink::Internal("x".to_string()),
            author_id: "u1".to_string(),
            author_name: "Asha".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&article).unwrap();
        assert_eq!(json["link"], "internal://article/x");

        let back: Article = serde_json::from_value(json).unwrap();
        assert_eq!(back.link, article.link);
    }

    #[test]
    fn test_article_content() {
        let mut article = Article {
            id: "a1".to_string(),
            title: "Test".to_string(),
            description: Some("Long form".to_string()),
            link: ArticleLink::Internal("x".to_string()),
            author_id: "u1".to_string(),
            author_name: "Asha".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(
            article.content(),
            ArticleContent::Internal {
                id: "x".to_string(),
                body: "Long form".to_string()
            }
        );

        article.link = ArticleLink::External("https://example.com".to_string());
        assert_eq!(
            article.content(),
            ArticleContent::External {
                url: "https://example.com".to_string()
            }
        );
    }

    #[test]
    fn test_table_names() {
        assert_eq!(Table::ChatMessages.as_str(), "chat_messages");
        assert_eq!("articles".parse::<Table>().unwrap(), Table::Articles);
        assert!("users".parse::<Table>().is_err());
    }
}
