//! `SQLite` implementation of [`ChatStore`].
//!
//! Uses [`sqlx`] with runtime query construction (not compile-time
//! checked) to avoid requiring a live database at build time. All queries
//! are parameterized. The schema lives in `migrations/` and is applied on
//! connect.

use std::time::Duration;

use async_trait::async_trait;
use parlor_types::{ChatMessage, ChatMetadata, MessageId, RegisteredRoom};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::error::StoreError;
use crate::store::ChatStore;

/// Default maximum number of connections in the pool.
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Default connection acquire timeout in seconds.
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Default idle timeout in seconds.
const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 300;

/// Insert or update chat metadata, keeping the newest activity time and
/// an existing name when the update carries none.
const UPSERT_CHAT_SQL: &str = r"INSERT INTO chats (jid, name, last_message_time, channel, is_group)
    VALUES (?, ?, ?, ?, ?)
    ON CONFLICT(jid) DO UPDATE SET
        name = COALESCE(excluded.name, chats.name),
        last_message_time = MAX(chats.last_message_time, excluded.last_message_time),
        channel = excluded.channel,
        is_group = excluded.is_group";

/// Insert a registry entry unless its address or folder is taken.
const REGISTER_ROOM_SQL: &str = r"INSERT INTO registered_rooms
        (jid, name, folder, trigger_pattern, added_at, requires_trigger)
    VALUES (?, ?, ?, ?, ?, ?)
    ON CONFLICT DO NOTHING";

/// Configuration for the `SQLite` connection pool.
#[derive(Debug, Clone)]
pub struct SqliteConfig {
    /// `SQLite` connection URL.
    ///
    /// Format: `sqlite://path/to/file.db` or `sqlite::memory:`
    pub url: String,
    /// Maximum number of connections in the pool.
    pub max_connections: u32,
    /// Connection acquire timeout.
    pub connect_timeout: Duration,
    /// Idle connection timeout.
    pub idle_timeout: Duration,
}

impl SqliteConfig {
    /// Create a new configuration from a database URL.
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_owned(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            idle_timeout: Duration::from_secs(DEFAULT_IDLE_TIMEOUT_SECS),
        }
    }

    /// Set the maximum number of connections.
    #[must_use]
    pub const fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Set the connection acquire timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the idle connection timeout.
    #[must_use]
    pub const fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }
}

/// [`ChatStore`] backed by a `SQLite` database file.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if missing) the database and apply migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Config`] if the URL cannot be parsed,
    /// [`StoreError::Sqlite`] if the connection fails, or
    /// [`StoreError::Migration`] if the schema cannot be applied.
    pub async fn connect(config: &SqliteConfig) -> Result<Self, StoreError> {
        let connect_options: SqliteConnectOptions = config
            .url
            .parse()
            .map_err(|e: sqlx::Error| StoreError::Config(format!("Invalid database URL: {e}")))?;

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(config.idle_timeout)
            .connect_with(connect_options.create_if_missing(true))
            .await?;

        let store = Self { pool };
        store.run_migrations().await?;

        tracing::info!(
            url = config.url,
            max_connections = config.max_connections,
            "Connected to SQLite"
        );

        Ok(store)
    }

    /// Open a private in-memory database.
    ///
    /// The pool holds exactly one connection that is never recycled, since
    /// every `SQLite` in-memory connection is its own database.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let connect_options: SqliteConnectOptions = "sqlite::memory:"
            .parse()
            .map_err(|e: sqlx::Error| StoreError::Config(format!("Invalid database URL: {e}")))?;

        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(connect_options)
            .await?;

        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    /// Apply all pending migrations from the `migrations/` directory.
    pub async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        tracing::debug!("Database migrations completed");
        Ok(())
    }

    /// Return a reference to the underlying [`SqlitePool`].
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close all connections in the pool gracefully.
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("SQLite pool closed");
    }
}

impl core::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("pool_size", &self.pool.size())
            .finish()
    }
}

#[async_trait]
impl ChatStore for SqliteStore {
    async fn append_message(&self, message: &ChatMessage) -> Result<(), StoreError> {
        sqlx::query(
            r"INSERT OR IGNORE INTO messages
                (id, chat_jid, sender, sender_name, content, timestamp, is_from_me, is_bot_message)
              VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(message.id.as_str())
        .bind(&message.chat_jid)
        .bind(&message.sender)
        .bind(&message.sender_name)
        .bind(&message.content)
        .bind(&message.timestamp)
        .bind(message.is_from_me)
        .bind(message.is_bot_message)
        .execute(&self.pool)
        .await?;

        tracing::debug!(room = %message.chat_jid, message_id = %message.id, "Stored message");
        Ok(())
    }

    async fn recent_messages(
        &self,
        jid: &str,
        limit: u32,
    ) -> Result<Vec<ChatMessage>, StoreError> {
        // Newest N first in the inner query, flipped back to chronological.
        let rows = sqlx::query_as::<_, MessageRow>(
            r"SELECT id, chat_jid, sender, sender_name, content, timestamp, is_from_me, is_bot_message
              FROM (
                  SELECT rowid AS seq, * FROM messages
                  WHERE chat_jid = ?
                  ORDER BY timestamp DESC, seq DESC
                  LIMIT ?
              )
              ORDER BY timestamp ASC, seq ASC",
        )
        .bind(jid)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ChatMessage::from).collect())
    }

    async fn upsert_chat(&self, metadata: &ChatMetadata) -> Result<(), StoreError> {
        sqlx::query(UPSERT_CHAT_SQL)
        .bind(&metadata.jid)
        .bind(metadata.name.as_deref())
        .bind(&metadata.last_message_time)
        .bind(&metadata.channel)
        .bind(metadata.is_group)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn chat(&self, jid: &str) -> Result<Option<ChatMetadata>, StoreError> {
        let row = sqlx::query_as::<_, ChatRow>(
            r"SELECT jid, name, last_message_time, channel, is_group
              FROM chats
              WHERE jid = ?",
        )
        .bind(jid)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(ChatMetadata::from))
    }

    async fn room(&self, jid: &str) -> Result<Option<RegisteredRoom>, StoreError> {
        let row = sqlx::query_as::<_, RoomRow>(
            r"SELECT jid, name, folder, trigger_pattern, added_at, requires_trigger
              FROM registered_rooms
              WHERE jid = ?",
        )
        .bind(jid)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(RegisteredRoom::from))
    }

    async fn rooms(&self) -> Result<Vec<RegisteredRoom>, StoreError> {
        let rows = sqlx::query_as::<_, RoomRow>(
            r"SELECT jid, name, folder, trigger_pattern, added_at, requires_trigger
              FROM registered_rooms
              ORDER BY added_at, jid",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(RegisteredRoom::from).collect())
    }

    async fn register_room(&self, room: &RegisteredRoom) -> Result<bool, StoreError> {
        let result = sqlx::query(REGISTER_ROOM_SQL)
        .bind(&room.jid)
        .bind(&room.name)
        .bind(&room.folder)
        .bind(&room.trigger)
        .bind(&room.added_at)
        .bind(room.requires_trigger)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn register_room_with_chat(
        &self,
        room: &RegisteredRoom,
        metadata: &ChatMetadata,
    ) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(REGISTER_ROOM_SQL)
            .bind(&room.jid)
            .bind(&room.name)
            .bind(&room.folder)
            .bind(&room.trigger)
            .bind(&room.added_at)
            .bind(room.requires_trigger)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() != 1 {
            // Dropping the transaction rolls it back.
            return Ok(false);
        }

        sqlx::query(UPSERT_CHAT_SQL)
            .bind(&metadata.jid)
            .bind(metadata.name.as_deref())
            .bind(&metadata.last_message_time)
            .bind(&metadata.channel)
            .bind(metadata.is_group)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }
}

/// A row from the `messages` table.
#[derive(Debug, Clone, sqlx::FromRow)]
struct MessageRow {
    id: String,
    chat_jid: String,
    sender: String,
    sender_name: String,
    content: String,
    timestamp: String,
    is_from_me: bool,
    is_bot_message: bool,
}

impl From<MessageRow> for ChatMessage {
    fn from(row: MessageRow) -> Self {
        Self {
            id: MessageId::from(row.id),
            chat_jid: row.chat_jid,
            sender: row.sender,
            sender_name: row.sender_name,
            content: row.content,
            timestamp: row.timestamp,
            is_from_me: row.is_from_me,
            is_bot_message: row.is_bot_message,
        }
    }
}

/// A row from the `chats` table.
#[derive(Debug, Clone, sqlx::FromRow)]
struct ChatRow {
    jid: String,
    name: Option<String>,
    last_message_time: String,
    channel: String,
    is_group: bool,
}

impl From<ChatRow> for ChatMetadata {
    fn from(row: ChatRow) -> Self {
        Self {
            jid: row.jid,
            name: row.name,
            last_message_time: row.last_message_time,
            channel: row.channel,
            is_group: row.is_group,
        }
    }
}

/// A row from the `registered_rooms` table.
#[derive(Debug, Clone, sqlx::FromRow)]
struct RoomRow {
    jid: String,
    name: String,
    folder: String,
    trigger_pattern: String,
    added_at: String,
    requires_trigger: bool,
}

impl From<RoomRow> for RegisteredRoom {
    fn from(row: RoomRow) -> Self {
        Self {
            jid: row.jid,
            name: row.name,
            folder: row.folder,
            trigger: row.trigger_pattern,
            added_at: row.added_at,
            requires_trigger: row.requires_trigger,
        }
    }
}
