use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use bchat::{AssistantMessage, UsageEntry, UsageKind};
use bcommon::{BoxFuture, SessionId};
use bprovider::UsageRecord;
use rusqlite::{Connection, OptionalExtension, params};
use serde_json::Value;

use crate::backend::MemoryBackend;
use crate::error::MemoryError;

/// SQLite persistence with one row per payload sent and a matching token usage row.
#[derive(Debug)]
pub struct SqliteMemoryBackend {
    connection: Mutex<Connection>,
}

impl SqliteMemoryBackend {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, MemoryError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|error| {
                MemoryError::storage(format!(
                    "failed to create sqlite parent directory: {error}"
                ))
            })?;
        }

        let connection = Connection::open(path)
            .map_err(|error| MemoryError::from(error).context("failed to open sqlite database"))?;
        tracing::debug!(path = %path.display(), "opened sqlite memory backend");
        Self::from_connection(connection)
    }

    pub fn new_in_memory() -> Result<Self, MemoryError> {
        let connection = Connection::open_in_memory().map_err(|error| {
            MemoryError::from(error).context("failed to open in-memory sqlite database")
        })?;
        Self::from_connection(connection)
    }

    fn from_connection(connection: Connection) -> Result<Self, MemoryError> {
        connection
            .busy_timeout(Duration::from_secs(5))
            .map_err(|error| {
                MemoryError::from(error).context("failed to configure sqlite busy timeout")
            })?;
        let backend = Self {
            connection: Mutex::new(connection),
        };
        backend.initialize_schema()?;
        Ok(backend)
    }

    fn connection(&self) -> Result<std::sync::MutexGuard<'_, Connection>, MemoryError> {
        self.connection
            .lock()
            .map_err(|_| MemoryError::storage("sqlite backend lock poisoned"))
    }

    fn initialize_schema(&self) -> Result<(), MemoryError> {
        let conn = self.connection()?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;

            CREATE TABLE IF NOT EXISTS conversations (
                conversation_id TEXT PRIMARY KEY,
                title TEXT
            );

            CREATE TABLE IF NOT EXISTS assistant_messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                conversation_id TEXT NOT NULL,
                raw_text TEXT NOT NULL,
                rendered TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_assistant_messages_conversation
            ON assistant_messages(conversation_id, id);

            CREATE TABLE IF NOT EXISTS payloads_sent (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                conversation_id TEXT NOT NULL,
                round INTEGER NOT NULL,
                kind TEXT NOT NULL,
                payload_json TEXT NOT NULL,
                response_json TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_payloads_sent_conversation
            ON payloads_sent(conversation_id, id);

            CREATE TABLE IF NOT EXISTS token_usage (
                payload_id INTEGER PRIMARY KEY REFERENCES payloads_sent(id),
                prompt_tokens INTEGER,
                completion_tokens INTEGER,
                total_tokens INTEGER,
                prompt_tokens_details_json TEXT,
                completion_tokens_details_json TEXT
            );
            ",
        )
        .map_err(|error| MemoryError::from(error).context("failed to initialize sqlite schema"))?;

        Ok(())
    }

    fn ensure_conversation(conn: &Connection, conversation_id: &SessionId) -> Result<(), MemoryError> {
        conn.execute(
            "INSERT OR IGNORE INTO conversations (conversation_id) VALUES (?1)",
            params![conversation_id.as_str()],
        )
        .map_err(|error| MemoryError::from(error).context("failed to register conversation"))?;
        Ok(())
    }
}

impl MemoryBackend for SqliteMemoryBackend {
    fn save_assistant_message<'a>(
        &'a self,
        message: AssistantMessage,
    ) -> BoxFuture<'a, Result<(), MemoryError>> {
        Box::pin(async move {
            let conn = self.connection()?;
            Self::ensure_conversation(&conn, &message.conversation_id)?;
            conn.execute(
                "
                INSERT INTO assistant_messages (conversation_id, raw_text, rendered)
                VALUES (?1, ?2, ?3)
                ",
                params![
                    message.conversation_id.as_str(),
                    message.raw_text,
                    message.rendered
                ],
            )
            .map_err(|error| MemoryError::from(error).context("failed to save assistant message"))?;
            Ok(())
        })
    }

    fn load_assistant_messages<'a>(
        &'a self,
        conversation_id: &'a SessionId,
    ) -> BoxFuture<'a, Result<Vec<AssistantMessage>, MemoryError>> {
        Box::pin(async move {
            let conn = self.connection()?;
            let mut stmt = conn
                .prepare(
                    "
                    SELECT raw_text, rendered
                    FROM assistant_messages
                    WHERE conversation_id = ?1
                    ORDER BY id ASC
                    ",
                )
                .map_err(|error| {
                    MemoryError::from(error).context("failed to prepare assistant message query")
                })?;
            let rows = stmt
                .query_map(params![conversation_id.as_str()], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                })
                .map_err(|error| {
                    MemoryError::from(error).context("failed to query assistant messages")
                })?;

            let mut messages = Vec::new();
            for row in rows {
                let (raw_text, rendered) = row.map_err(|error| {
                    MemoryError::from(error).context("failed to read assistant message row")
                })?;
                messages.push(AssistantMessage {
                    conversation_id: conversation_id.clone(),
                    raw_text,
                    rendered,
                });
            }
            Ok(messages)
        })
    }

    fn load_title<'a>(
        &'a self,
        conversation_id: &'a SessionId,
    ) -> BoxFuture<'a, Result<Option<String>, MemoryError>> {
        Box::pin(async move {
            let conn = self.connection()?;
            let title = conn
                .query_row(
                    "SELECT title FROM conversations WHERE conversation_id = ?1",
                    params![conversation_id.as_str()],
                    |row| row.get::<_, Option<String>>(0),
                )
                .optional()
                .map_err(|error| MemoryError::from(error).context("failed to load title"))?;
            Ok(title.flatten())
        })
    }

    fn save_title<'a>(
        &'a self,
        conversation_id: &'a SessionId,
        title: String,
    ) -> BoxFuture<'a, Result<(), MemoryError>> {
        Box::pin(async move {
            if title.trim().is_empty() {
                return Err(MemoryError::invalid_request("title must not be empty"));
            }

            let conn = self.connection()?;
            conn.execute(
                "
                INSERT INTO conversations (conversation_id, title)
                VALUES (?1, ?2)
                ON CONFLICT(conversation_id) DO UPDATE SET title = excluded.title
                ",
                params![conversation_id.as_str(), title],
            )
            .map_err(|error| MemoryError::from(error).context("failed to save title"))?;
            Ok(())
        })
    }

    fn append_usage_entry<'a>(
        &'a self,
        entry: UsageEntry,
    ) -> BoxFuture<'a, Result<(), MemoryError>> {
        Box::pin(async move {
            let payload_json = serde_json::to_string(&entry.payload)?;
            let response_json = serde_json::to_string(&entry.response)?;
            let usage = entry.usage.unwrap_or_default();
            let prompt_details = usage
                .prompt_tokens_details
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?;
            let completion_details = usage
                .completion_tokens_details
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?;

            let mut conn = self.connection()?;
            let tx = conn
                .transaction()
                .map_err(|error| MemoryError::from(error).context("failed to begin transaction"))?;
            Self::ensure_conversation(&tx, &entry.conversation_id)?;

            tx.execute(
                "
                INSERT INTO payloads_sent (conversation_id, round, kind, payload_json, response_json)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ",
                params![
                    entry.conversation_id.as_str(),
                    i64::from(entry.round),
                    entry.kind.as_str(),
                    payload_json,
                    response_json
                ],
            )
            .map_err(|error| MemoryError::from(error).context("failed to record payload"))?;
            let payload_id = tx.last_insert_rowid();

            tx.execute(
                "
                INSERT INTO token_usage (
                    payload_id,
                    prompt_tokens,
                    completion_tokens,
                    total_tokens,
                    prompt_tokens_details_json,
                    completion_tokens_details_json
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ",
                params![
                    payload_id,
                    usage.prompt_tokens.map(to_sql_count).transpose()?,
                    usage.completion_tokens.map(to_sql_count).transpose()?,
                    usage.total_tokens.map(to_sql_count).transpose()?,
                    prompt_details,
                    completion_details
                ],
            )
            .map_err(|error| MemoryError::from(error).context("failed to record token usage"))?;

            tx.commit()
                .map_err(|error| MemoryError::from(error).context("failed to commit usage"))?;
            Ok(())
        })
    }

    fn load_usage_entries<'a>(
        &'a self,
        conversation_id: &'a SessionId,
    ) -> BoxFuture<'a, Result<Vec<UsageEntry>, MemoryError>> {
        Box::pin(async move {
            let conn = self.connection()?;
            let mut stmt = conn
                .prepare(
                    "
                    SELECT
                        p.round,
                        p.kind,
                        p.payload_json,
                        p.response_json,
                        u.prompt_tokens,
                        u.completion_tokens,
                        u.total_tokens,
                        u.prompt_tokens_details_json,
                        u.completion_tokens_details_json
                    FROM payloads_sent p
                    LEFT JOIN token_usage u ON u.payload_id = p.id
                    WHERE p.conversation_id = ?1
                    ORDER BY p.id ASC
                    ",
                )
                .map_err(|error| MemoryError::from(error).context("failed to prepare usage query"))?;
            let rows = stmt
                .query_map(params![conversation_id.as_str()], |row| {
                    Ok(StoredUsageRow {
                        round: row.get(0)?,
                        kind: row.get(1)?,
                        payload_json: row.get(2)?,
                        response_json: row.get(3)?,
                        prompt_tokens: row.get(4)?,
                        completion_tokens: row.get(5)?,
                        total_tokens: row.get(6)?,
                        prompt_details_json: row.get(7)?,
                        completion_details_json: row.get(8)?,
                    })
                })
                .map_err(|error| MemoryError::from(error).context("failed to query usage rows"))?;

            let mut entries = Vec::new();
            for row in rows {
                let row = row
                    .map_err(|error| MemoryError::from(error).context("failed to read usage row"))?;
                entries.push(row.into_entry(conversation_id)?);
            }
            Ok(entries)
        })
    }
}

struct StoredUsageRow {
    round: i64,
    kind: String,
    payload_json: String,
    response_json: String,
    prompt_tokens: Option<i64>,
    completion_tokens: Option<i64>,
    total_tokens: Option<i64>,
    prompt_details_json: Option<String>,
    completion_details_json: Option<String>,
}

impl StoredUsageRow {
    fn into_entry(self, conversation_id: &SessionId) -> Result<UsageEntry, MemoryError> {
        let usage = UsageRecord {
            prompt_tokens: self.prompt_tokens.map(from_sql_count).transpose()?,
            completion_tokens: self.completion_tokens.map(from_sql_count).transpose()?,
            total_tokens: self.total_tokens.map(from_sql_count).transpose()?,
            prompt_tokens_details: parse_optional_json(self.prompt_details_json)?,
            completion_tokens_details: parse_optional_json(self.completion_details_json)?,
        };

        Ok(UsageEntry {
            conversation_id: conversation_id.clone(),
            round: u32::try_from(self.round).map_err(|_| {
                MemoryError::storage(format!("stored round {} is out of range", self.round))
            })?,
            kind: usage_kind_from_str(&self.kind)?,
            payload: serde_json::from_str(&self.payload_json)?,
            response: serde_json::from_str(&self.response_json)?,
            usage: (!usage.is_empty()).then_some(usage),
        })
    }
}

fn parse_optional_json(value: Option<String>) -> Result<Option<Value>, MemoryError> {
    value
        .map(|json| serde_json::from_str(&json))
        .transpose()
        .map_err(MemoryError::from)
}

fn to_sql_count(value: u64) -> Result<i64, MemoryError> {
    i64::try_from(value)
        .map_err(|_| MemoryError::invalid_request(format!("token count {value} is out of range")))
}

fn from_sql_count(value: i64) -> Result<u64, MemoryError> {
    u64::try_from(value)
        .map_err(|_| MemoryError::storage(format!("stored token count {value} is negative")))
}

fn usage_kind_from_str(value: &str) -> Result<UsageKind, MemoryError> {
    match value {
        "round" => Ok(UsageKind::Round),
        "title" => Ok(UsageKind::Title),
        _ => Err(MemoryError::storage(format!(
            "unknown usage kind value '{value}'"
        ))),
    }
}

pub(crate) fn default_sqlite_path() -> PathBuf {
    if let Some(explicit) = std::env::var_os("BROOK_SQLITE_PATH") {
        return PathBuf::from(explicit);
    }

    if let Some(home) = std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE")) {
        return PathBuf::from(home).join(".brook").join("brook.sqlite3");
    }

    PathBuf::from(".brook").join("brook.sqlite3")
}
