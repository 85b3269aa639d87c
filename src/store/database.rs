//! SQLite-backed tables for the data service
//!
//! Holds the three relational tables (`articles`, `chat_messages`,
//! `feed_topics`). Every table carries an autoincrement `seq` column so rows
//! inserted within the same millisecond keep their insertion order.
//!
//! Timestamps are stored as Unix milliseconds.

use crate::store::error::{StoreError, StoreResult};
use crate::store::types::{
    Article, ArticleLink, ChatMessage, FeedTopic, NewArticle, NewChatMessage, NewTopic,
};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use std::path::{Path, PathBuf};

const ARTICLE_COLUMNS: &str =
    "id, title, description, link, author_id, author_name, created_at, updated_at";
const TOPIC_COLUMNS: &str = "id, title, description, icon, category, is_active, created_at";
const MESSAGE_COLUMNS: &str = "id, user_id, user_name, message, created_at";

/// Row counts per table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableCounts {
    pub articles: usize,
    pub chat_messages: usize,
    pub feed_topics: usize,
}

/// SQLite database holding all service tables
pub struct Database {
    conn: Connection,
    path: Option<PathBuf>,
}

impl Database {
    /// Create or open the database file under `data_dir`
    pub fn open(data_dir: &Path) -> StoreResult<Self> {
        let path = data_dir.join("safar.db");

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
            ",
        )?;

        let db = Self {
            conn,
            path: Some(path),
        };
        db.create_schema()?;
        Ok(db)
    }

    /// Open a throwaway database that lives only in memory
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn, path: None };
        db.create_schema()?;
        Ok(db)
    }

    fn create_schema(&self) -> StoreResult<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS articles (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                title TEXT NOT NULL,
                description TEXT,
                link TEXT NOT NULL,
                author_id TEXT NOT NULL,
                author_name TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_articles_created ON articles(created_at);

            CREATE TABLE IF NOT EXISTS chat_messages (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                user_id TEXT NOT NULL,
                user_name TEXT NOT NULL,
                message TEXT NOT NULL,
                created_at INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_chat_created ON chat_messages(created_at);

            CREATE TABLE IF NOT EXISTS feed_topics (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                title TEXT NOT NULL,
                description TEXT,
                icon TEXT NOT NULL,
                category TEXT NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at INTEGER NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    /// Path of the database file, `None` for in-memory databases
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    // ============================================
    // ARTICLES
    // ============================================

    /// Insert an article and return the stored row
    pub fn insert_article(
        &mut self,
        new: &NewArticle,
        now: DateTime<Utc>,
    ) -> StoreResult<Article> {
        let now = truncate_millis(now);
        let article = Article {
            id: uuid::Uuid::new_v4().to_string(),
            title: new.title.clone(),
            description: new.description.clone(),
            link: new.link.clone(),
            author_id: new.author_id.clone(),
            author_name: new.author_name.clone(),
            created_at: now,
            updated_at: now,
        };

        self.conn.execute(
            "INSERT INTO articles (id, title, description, link, author_id, author_name, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                article.id,
                article.title,
                article.description,
                article.link.to_stored(),
                article.author_id,
                article.author_name,
                article.created_at.timestamp_millis(),
                article.updated_at.timestamp_millis(),
            ],
        )?;

        Ok(article)
    }

    /// All articles, newest first
    pub fn list_articles(&self) -> StoreResult<Vec<Article>> {
        let mut stmt = self.conn.prepare_cached(&format!(
            "SELECT {} FROM articles ORDER BY created_at DESC, seq DESC",
            ARTICLE_COLUMNS
        ))?;

        let rows = stmt.query_map([], article_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Look up a single article
    pub fn get_article(&self, id: &str) -> StoreResult<Article> {
        let mut stmt = self.conn.prepare_cached(&format!(
            "SELECT {} FROM articles WHERE id = ?",
            ARTICLE_COLUMNS
        ))?;

        stmt.query_row(params![id], article_from_row)
            .optional()?
            .ok_or_else(|| StoreError::NotFound {
                table: "articles",
                id: id.to_string(),
            })
    }

    // ============================================
    // FEED TOPICS
    // ============================================

    /// Insert a topic and return the stored row
    pub fn insert_topic(&mut self, new: &NewTopic, now: DateTime<Utc>) -> StoreResult<FeedTopic> {
        let topic = FeedTopic {
            id: uuid::Uuid::new_v4().to_string(),
            title: new.title.clone(),
            description: new.description.clone(),
            icon: new.icon.clone(),
            category: new.category.clone(),
            is_active: new.is_active,
            created_at: truncate_millis(now),
        };

        self.conn.execute(
            "INSERT INTO feed_topics (id, title, description, icon, category, is_active, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            params![
                topic.id,
                topic.title,
                topic.description,
                topic.icon,
                topic.category,
                topic.is_active,
                topic.created_at.timestamp_millis(),
            ],
        )?;

        Ok(topic)
    }

    /// Topics, newest first
    pub fn list_topics(&self, active_only: bool) -> StoreResult<Vec<FeedTopic>> {
        let sql = if active_only {
            format!(
                "SELECT {} FROM feed_topics WHERE is_active = 1 ORDER BY created_at DESC, seq DESC",
                TOPIC_COLUMNS
            )
        } else {
            format!(
                "SELECT {} FROM feed_topics ORDER BY created_at DESC, seq DESC",
                TOPIC_COLUMNS
            )
        };

        let mut stmt = self.conn.prepare_cached(&sql)?;
        let rows = stmt.query_map([], topic_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    // ============================================
    // CHAT MESSAGES
    // ============================================

    /// Insert a chat message and return the stored row
    pub fn insert_message(
        &mut self,
        new: &NewChatMessage,
        now: DateTime<Utc>,
    ) -> StoreResult<ChatMessage> {
        let message = ChatMessage {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: new.user_id.clone(),
            user_name: new.user_name.clone(),
            message: new.message.clone(),
            created_at: truncate_millis(now),
        };

        self.conn.execute(
            "INSERT INTO chat_messages (id, user_id, user_name, message, created_at)
             VALUES (?, ?, ?, ?, ?)",
            params![
                message.id,
                message.user_id,
                message.user_name,
                message.message,
                message.created_at.timestamp_millis(),
            ],
        )?;

        Ok(message)
    }

    /// The most recent `limit` messages, returned oldest first
    pub fn recent_messages(&self, limit: usize) -> StoreResult<Vec<ChatMessage>> {
        let mut stmt = self.conn.prepare_cached(&format!(
            "SELECT {cols} FROM (
                SELECT seq, {cols} FROM chat_messages
                ORDER BY created_at DESC, seq DESC
                LIMIT ?
             ) ORDER BY created_at ASC, seq ASC",
            cols = MESSAGE_COLUMNS
        ))?;

        let rows = stmt.query_map(params![limit as i64], message_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Delete messages created strictly before `cutoff`
    ///
    /// Returns the number of deleted rows.
    pub fn purge_messages_before(&mut self, cutoff: DateTime<Utc>) -> StoreResult<usize> {
        let deleted = self.conn.execute(
            "DELETE FROM chat_messages WHERE created_at < ?",
            params![cutoff.timestamp_millis()],
        )?;
        Ok(deleted)
    }

    /// Row counts for every table
    pub fn counts(&self) -> StoreResult<TableCounts> {
        let count = |table: &str| -> StoreResult<usize> {
            let n: i64 = self.conn.query_row(
                &format!("SELECT COUNT(*) FROM {}", table),
                [],
                |row| row.get(0),
            )?;
            Ok(n as usize)
        };

        Ok(TableCounts {
            articles: count("articles")?,
            chat_messages: count("chat_messages")?,
            feed_topics: count("feed_topics")?,
        })
    }
}

fn truncate_millis(ts: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ts.timestamp_millis()).unwrap_or(ts)
}

fn millis_column(row: &rusqlite::Row<'_>, column: &str) -> rusqlite::Result<DateTime<Utc>> {
    let ms: i64 = row.get(column)?;
    DateTime::from_timestamp_millis(ms).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Integer,
            Box::new(StoreError::InvalidRecord(format!(
                "{} out of range: {}",
                column, ms
            ))),
        )
    })
}

fn article_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Article> {
    let link: String = row.get("link")?;
    Ok(Article {
        id: row.get("id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        link: ArticleLink::parse(&link),
        author_id: row.get("author_id")?,
        author_name: row.get("author_name")?,
        created_at: millis_column(row, "created_at")?,
        updated_at: millis_column(row, "updated_at")?,
    })
}

fn topic_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<FeedTopic> {
    Ok(FeedTopic {
        id: row.get("id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        icon: row.get("icon")?,
        category: row.get("category")?,
        is_active: row.get("is_active")?,
        created_at: millis_column(row, "created_at")?,
    })
}

fn message_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ChatMessage> {
    Ok(ChatMessage {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        user_name: row.get("user_name")?,
        message: row.get("message")?,
        created_at: millis_column(row, "created_at")?,
    })
}
