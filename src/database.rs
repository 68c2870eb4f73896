//! # Database
//!
//! SQLite persistence for conversation records, label corrections and reminders.
//! One connection guarded by an async mutex; every statement binds its values.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.0.0: Conversation, labeled conversation and reminder tables only
//! - 1.1.0: Channel-set pruning of reminders inside one transaction
//! - 1.0.0: Initial schema

use anyhow::Result;
use chrono::{DateTime, Utc};
use log::{debug, info};
use sqlite::{Connection, ConnectionThreadSafe, State, Statement};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Format used for reminder due times
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
/// Conversation timestamps keep milliseconds so eviction order is stable
const CREATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS conversations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    actor TEXT NOT NULL,
    input_text TEXT NOT NULL,
    handler_label TEXT,
    output_text TEXT,
    channel_id TEXT,
    channel_name TEXT,
    classified_as TEXT,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_conversations_channel ON conversations (channel_id, id);

CREATE TABLE IF NOT EXISTS labeled_conversations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    conversation_id INTEGER NOT NULL,
    actor TEXT NOT NULL,
    input_text TEXT NOT NULL,
    handler_label TEXT,
    output_text TEXT,
    channel_id TEXT,
    channel_name TEXT,
    classified_as TEXT,
    created_at TEXT NOT NULL,
    corrected_label TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS reminders (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    owner TEXT NOT NULL,
    body_text TEXT NOT NULL,
    channel_id TEXT NOT NULL,
    channel_name TEXT NOT NULL,
    due_at TEXT
);
CREATE INDEX IF NOT EXISTS idx_reminders_owner ON reminders (owner);
";

/// A stored dispatch outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationRecord {
    pub id: i64,
    pub actor: String,
    pub input_text: String,
    pub handler_label: String,
    pub output_text: String,
    pub channel_id: String,
    pub channel_name: String,
    pub classified_as: String,
    pub created_at: String,
}

/// A dispatch outcome about to be written
#[derive(Debug, Clone)]
pub struct NewConversation {
    pub actor: String,
    pub input_text: String,
    pub handler_label: String,
    pub output_text: String,
    pub channel_id: String,
    pub channel_name: String,
    pub classified_as: String,
    pub created_at: DateTime<Utc>,
}

/// A pending reminder.
///
/// `due_at` is kept as stored so the scheduler can discard rows it cannot parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    pub id: i64,
    pub owner: String,
    pub body_text: String,
    pub channel_id: String,
    pub channel_name: String,
    pub due_at: String,
}

#[derive(Debug, Clone)]
pub struct NewReminder {
    pub owner: String,
    pub body_text: String,
    pub channel_id: String,
    pub channel_name: String,
    pub due_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct Database {
    connection: Arc<Mutex<ConnectionThreadSafe>>,
}

impl Database {
    /// Open (or create) the database at `path`; `:memory:` gives a private in-memory store
    pub async fn new(path: &str) -> Result<Self> {
        let connection = Connection::open_thread_safe(path)?;
        connection.execute(SCHEMA)?;
        info!("Database ready at {path}");
        Ok(Database {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    // ------------------------------------------------------------------
    // Conversations
    // ------------------------------------------------------------------

    pub async fn insert_conversation(&self, record: &NewConversation) -> Result<i64> {
        let conn = self.connection.lock().await;
        let created_at = record.created_at.format(CREATED_AT_FORMAT).to_string();

        let mut statement = conn.prepare(
            "INSERT INTO conversations
             (actor, input_text, handler_label, output_text, channel_id, channel_name, classified_as, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )?;
        statement.bind((1, record.actor.as_str()))?;
        statement.bind((2, record.input_text.as_str()))?;
        statement.bind((3, record.handler_label.as_str()))?;
        statement.bind((4, record.output_text.as_str()))?;
        statement.bind((5, record.channel_id.as_str()))?;
        statement.bind((6, record.channel_name.as_str()))?;
        statement.bind((7, record.classified_as.as_str()))?;
        statement.bind((8, created_at.as_str()))?;
        statement.next()?;

        last_insert_id(&conn)
    }

    /// Most recent records for a channel, newest first
    pub async fn recent_conversations(
        &self,
        channel_id: &str,
        limit: usize,
    ) -> Result<Vec<ConversationRecord>> {
        let conn = self.connection.lock().await;
        let mut statement = conn.prepare(format!(
            "SELECT {CONVERSATION_COLUMNS} FROM conversations
             WHERE channel_id = ?
             ORDER BY created_at DESC, id DESC
             LIMIT ?"
        ))?;
        statement.bind((1, channel_id))?;
        statement.bind((2, clamp_limit(limit)))?;
        read_conversations(&mut statement)
    }

    /// The caller's latest record in a channel, used for label corrections
    pub async fn latest_conversation_for(
        &self,
        channel_id: &str,
        actor: &str,
    ) -> Result<Option<ConversationRecord>> {
        let conn = self.connection.lock().await;
        let mut statement = conn.prepare(format!(
            "SELECT {CONVERSATION_COLUMNS} FROM conversations
             WHERE channel_id = ? AND actor = ?
             ORDER BY id DESC
             LIMIT 1"
        ))?;
        statement.bind((1, channel_id))?;
        statement.bind((2, actor))?;
        Ok(read_conversations(&mut statement)?.into_iter().next())
    }

    pub async fn count_conversations(&self) -> Result<i64> {
        let conn = self.connection.lock().await;
        count(&conn, "SELECT COUNT(*) FROM conversations")
    }

    /// Ids of every stored conversation, oldest first
    #[cfg(test)]
    pub(crate) async fn conversation_ids(&self) -> Result<Vec<i64>> {
        let conn = self.connection.lock().await;
        let mut statement =
            conn.prepare("SELECT id FROM conversations ORDER BY created_at ASC, id ASC")?;
        let mut ids = Vec::new();
        while statement.next()? == State::Row {
            ids.push(statement.read::<i64, _>(0)?);
        }
        Ok(ids)
    }

    /// Delete the `n` oldest conversations by timestamp
    pub async fn delete_oldest_conversations(&self, n: i64) -> Result<usize> {
        if n <= 0 {
            return Ok(0);
        }
        let conn = self.connection.lock().await;
        let mut statement = conn.prepare(
            "DELETE FROM conversations WHERE id IN
             (SELECT id FROM conversations ORDER BY created_at ASC, id ASC LIMIT ?)",
        )?;
        statement.bind((1, n))?;
        statement.next()?;
        changes(&conn)
    }

    // ------------------------------------------------------------------
    // Label corrections
    // ------------------------------------------------------------------

    pub async fn insert_labeled_conversation(
        &self,
        record: &ConversationRecord,
        corrected_label: &str,
    ) -> Result<i64> {
        let conn = self.connection.lock().await;
        let mut statement = conn.prepare(
            "INSERT INTO labeled_conversations
             (conversation_id, actor, input_text, handler_label, output_text, channel_id,
              channel_name, classified_as, created_at, corrected_label)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )?;
        statement.bind((1, record.id))?;
        statement.bind((2, record.actor.as_str()))?;
        statement.bind((3, record.input_text.as_str()))?;
        statement.bind((4, record.handler_label.as_str()))?;
        statement.bind((5, record.output_text.as_str()))?;
        statement.bind((6, record.channel_id.as_str()))?;
        statement.bind((7, record.channel_name.as_str()))?;
        statement.bind((8, record.classified_as.as_str()))?;
        statement.bind((9, record.created_at.as_str()))?;
        statement.bind((10, corrected_label))?;
        statement.next()?;

        last_insert_id(&conn)
    }

    /// Every (input_text, corrected_label) pair, in insertion order
    pub async fn corrected_examples(&self) -> Result<Vec<(String, String)>> {
        let conn = self.connection.lock().await;
        let mut statement = conn.prepare(
            "SELECT input_text, corrected_label FROM labeled_conversations ORDER BY id ASC",
        )?;
        let mut examples = Vec::new();
        while statement.next()? == State::Row {
            examples.push((
                statement.read::<String, _>(0)?,
                statement.read::<String, _>(1)?,
            ));
        }
        Ok(examples)
    }

    pub async fn count_labeled_conversations(&self) -> Result<i64> {
        let conn = self.connection.lock().await;
        count(&conn, "SELECT COUNT(*) FROM labeled_conversations")
    }

    // ------------------------------------------------------------------
    // Reminders
    // ------------------------------------------------------------------

    pub async fn add_reminder(&self, reminder: &NewReminder) -> Result<i64> {
        let conn = self.connection.lock().await;
        let due_at = reminder.due_at.format(TIMESTAMP_FORMAT).to_string();

        let mut statement = conn.prepare(
            "INSERT INTO reminders (owner, body_text, channel_id, channel_name, due_at)
             VALUES (?, ?, ?, ?, ?)",
        )?;
        statement.bind((1, reminder.owner.as_str()))?;
        statement.bind((2, reminder.body_text.as_str()))?;
        statement.bind((3, reminder.channel_id.as_str()))?;
        statement.bind((4, reminder.channel_name.as_str()))?;
        statement.bind((5, due_at.as_str()))?;
        statement.next()?;

        let id = last_insert_id(&conn)?;
        debug!("Stored reminder #{id} for {} due {due_at}", reminder.owner);
        Ok(id)
    }

    /// Remove rows that were stored without a due time
    pub async fn delete_unscheduled_reminders(&self) -> Result<usize> {
        let conn = self.connection.lock().await;
        conn.execute("DELETE FROM reminders WHERE due_at IS NULL")?;
        changes(&conn)
    }

    /// Delete every reminder whose channel name is not in `live_channels`.
    ///
    /// Runs as one transaction so a concurrent insert never observes a half-pruned table.
    pub async fn prune_reminders_outside(&self, live_channels: &HashSet<String>) -> Result<usize> {
        let conn = self.connection.lock().await;
        in_transaction(&conn, |conn| {
            let mut stale = Vec::new();
            {
                let mut statement = conn.prepare("SELECT DISTINCT channel_name FROM reminders")?;
                while statement.next()? == State::Row {
                    let name = statement.read::<String, _>(0)?;
                    if !live_channels.contains(&name) {
                        stale.push(name);
                    }
                }
            }

            let mut removed = 0;
            for name in &stale {
                let mut statement = conn.prepare("DELETE FROM reminders WHERE channel_name = ?")?;
                statement.bind((1, name.as_str()))?;
                statement.next()?;
                removed += changes(conn)?;
            }
            if !stale.is_empty() {
                debug!("Pruned reminders for vanished channels: {stale:?}");
            }
            Ok(removed)
        })
    }

    /// All reminders that have a due time, soonest first
    pub async fn scheduled_reminders(&self) -> Result<Vec<Reminder>> {
        let conn = self.connection.lock().await;
        let mut statement = conn.prepare(format!(
            "SELECT {REMINDER_COLUMNS} FROM reminders WHERE due_at IS NOT NULL ORDER BY due_at ASC, id ASC"
        ))?;
        read_reminders(&mut statement)
    }

    pub async fn reminders_for_owner(&self, owner: &str) -> Result<Vec<Reminder>> {
        let conn = self.connection.lock().await;
        let mut statement = conn.prepare(format!(
            "SELECT {REMINDER_COLUMNS} FROM reminders
             WHERE owner = ? AND due_at IS NOT NULL
             ORDER BY due_at ASC, id ASC"
        ))?;
        statement.bind((1, owner))?;
        read_reminders(&mut statement)
    }

    /// Returns true when a row was removed
    pub async fn delete_reminder(&self, id: i64) -> Result<bool> {
        let conn = self.connection.lock().await;
        let mut statement = conn.prepare("DELETE FROM reminders WHERE id = ?")?;
        statement.bind((1, id))?;
        statement.next()?;
        Ok(changes(&conn)? > 0)
    }

    pub async fn delete_reminders_for_owner(&self, owner: &str) -> Result<usize> {
        let conn = self.connection.lock().await;
        let mut statement = conn.prepare("DELETE FROM reminders WHERE owner = ?")?;
        statement.bind((1, owner))?;
        statement.next()?;
        changes(&conn)
    }

    pub async fn delete_all_reminders(&self) -> Result<usize> {
        let conn = self.connection.lock().await;
        conn.execute("DELETE FROM reminders")?;
        changes(&conn)
    }

    pub async fn count_reminders(&self) -> Result<i64> {
        let conn = self.connection.lock().await;
        count(&conn, "SELECT COUNT(*) FROM reminders")
    }

    /// Raw statement access for maintenance paths and tests
    #[cfg(test)]
    pub(crate) async fn execute_raw(&self, sql: &str) -> Result<()> {
        let conn = self.connection.lock().await;
        conn.execute(sql)?;
        Ok(())
    }
}

const CONVERSATION_COLUMNS: &str = "id, actor, input_text, COALESCE(handler_label, ''), \
     COALESCE(output_text, ''), COALESCE(channel_id, ''), COALESCE(channel_name, ''), \
     COALESCE(classified_as, ''), created_at";

const REMINDER_COLUMNS: &str = "id, owner, body_text, channel_id, channel_name, COALESCE(due_at, '')";

fn read_conversations(statement: &mut Statement<'_>) -> Result<Vec<ConversationRecord>> {
    let mut records = Vec::new();
    while statement.next()? == State::Row {
        records.push(ConversationRecord {
            id: statement.read::<i64, _>(0)?,
            actor: statement.read::<String, _>(1)?,
            input_text: statement.read::<String, _>(2)?,
            handler_label: statement.read::<String, _>(3)?,
            output_text: statement.read::<String, _>(4)?,
            channel_id: statement.read::<String, _>(5)?,
            channel_name: statement.read::<String, _>(6)?,
            classified_as: statement.read::<String, _>(7)?,
            created_at: statement.read::<String, _>(8)?,
        });
    }
    Ok(records)
}

fn read_reminders(statement: &mut Statement<'_>) -> Result<Vec<Reminder>> {
    let mut reminders = Vec::new();
    while statement.next()? == State::Row {
        reminders.push(Reminder {
            id: statement.read::<i64, _>(0)?,
            owner: statement.read::<String, _>(1)?,
            body_text: statement.read::<String, _>(2)?,
            channel_id: statement.read::<String, _>(3)?,
            channel_name: statement.read::<String, _>(4)?,
            due_at: statement.read::<String, _>(5)?,
        });
    }
    Ok(reminders)
}

fn clamp_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

fn count(conn: &Connection, sql: &str) -> Result<i64> {
    let mut statement = conn.prepare(sql)?;
    statement.next()?;
    Ok(statement.read::<i64, _>(0)?)
}

fn changes(conn: &Connection) -> Result<usize> {
    let changed = count(conn, "SELECT changes()")?;
    Ok(usize::try_from(changed).unwrap_or(0))
}

fn last_insert_id(conn: &Connection) -> Result<i64> {
    count(conn, "SELECT last_insert_rowid()")
}

fn in_transaction<T>(conn: &Connection, body: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
    conn.execute("BEGIN IMMEDIATE")?;
    match body(conn) {
        Ok(value) => {
            conn.execute("COMMIT")?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback) = conn.execute("ROLLBACK") {
                log::error!("Rollback failed after {e}: {rollback}");
            }
            Err(e)
        }
    }
}
