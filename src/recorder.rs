use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::interval;

/// Per-invocation record handed to the recorder by the execution engine.
/// The recorder is a sink: whatever happens to this record, the reply has
/// already been decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRecord {
    pub user_id: String,
    pub user_name: String,
    pub channel_id: String,
    pub command: String,
    pub args: Vec<String>,
    pub success: bool,
    pub result: String,
}

/// Outbound recording boundary. Failures are logged, never surfaced.
pub trait Recorder: Send + Sync {
    fn record(&self, record: ExecutionRecord);
}

/// Recorder that discards everything. Used by `--test-config` and demo runs
/// that should not touch the database.
#[derive(Debug, Default)]
pub struct NullRecorder;

impl Recorder for NullRecorder {
    fn record(&self, _record: ExecutionRecord) {}
}

#[derive(Debug, Clone)]
struct StampedRecord {
    record: ExecutionRecord,
    executed_at: DateTime<Utc>,
}

/// Aggregated per-channel view: how many commands the channel has handled.
#[derive(Debug, Clone)]
pub struct ChannelStats {
    pub channel_id: String,
    pub commands_handled: u64,
}

/// Aggregated per-command view.
#[derive(Debug, Clone)]
pub struct CommandStats {
    pub command: String,
    pub executions: u64,
    pub failures: u64,
    pub last_executed: Option<DateTime<Utc>>,
}

/// Buffering sqlite recorder: records go over a channel to a worker task
/// which batches them and flushes on an interval, so the pipeline never
/// waits on the database.
pub struct SqliteRecorder {
    db_path: String,
    sender: mpsc::UnboundedSender<StampedRecord>,
    _handle: tokio::task::JoinHandle<()>,
}

impl SqliteRecorder {
    pub fn new(db_path: String, flush_interval_seconds: u64) -> Result<Self> {
        if let Some(parent) = Path::new(&db_path).parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create recorder directory: {}", parent.display())
            })?;
        }

        let (sender, receiver) = mpsc::unbounded_channel();

        let db_path_clone = db_path.clone();
        let handle = tokio::spawn(async move {
            if let Err(e) = Self::worker(db_path_clone, receiver, flush_interval_seconds).await {
                log::error!("Execution recorder worker error: {e}");
            }
        });

        Ok(Self {
            db_path,
            sender,
            _handle: handle,
        })
    }

    async fn worker(
        db_path: String,
        mut receiver: mpsc::UnboundedReceiver<StampedRecord>,
        flush_interval_seconds: u64,
    ) -> Result<()> {
        let conn = Self::init_database(&db_path)?;
        let mut buffer: Vec<StampedRecord> = Vec::new();

        let mut flush_timer = interval(Duration::from_secs(flush_interval_seconds.max(1)));

        loop {
            tokio::select! {
                record = receiver.recv() => {
                    match record {
                        Some(record) => buffer.push(record),
                        None => {
                            // Channel closed, flush and exit
                            Self::flush(&conn, &buffer)?;
                            break;
                        }
                    }
                }
                _ = flush_timer.tick() => {
                    if buffer.is_empty() {
                        continue;
                    }
                    match Self::flush(&conn, &buffer) {
                        Ok(()) => buffer.clear(),
                        Err(e) => log::error!("Failed to flush execution records: {e}"),
                    }
                }
            }
        }

        Ok(())
    }

    fn init_database(db_path: &str) -> Result<Connection> {
        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open recorder database: {db_path}"))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS executions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                username TEXT NOT NULL,
                channel TEXT NOT NULL,
                command TEXT NOT NULL,
                args TEXT NOT NULL,
                success INTEGER NOT NULL,
                result TEXT NOT NULL,
                executed_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS channel_stats (
                channel TEXT PRIMARY KEY,
                commands_handled INTEGER NOT NULL DEFAULT 0
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS command_stats (
                command TEXT PRIMARY KEY,
                executions INTEGER NOT NULL DEFAULT 0,
                failures INTEGER NOT NULL DEFAULT 0,
                last_executed TEXT
            )",
            [],
        )?;

        Ok(conn)
    }

    fn flush(conn: &Connection, buffer: &[StampedRecord]) -> Result<()> {
        if buffer.is_empty() {
            return Ok(());
        }

        let tx = conn.unchecked_transaction()?;

        for stamped in buffer {
            let record = &stamped.record;
            let args = serde_json::to_string(&record.args).unwrap_or_else(|_| "[]".to_string());

            tx.execute(
                "INSERT INTO executions
                 (user_id, username, channel, command, args, success, result, executed_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
                params![
                    record.user_id,
                    record.user_name,
                    record.channel_id,
                    record.command,
                    args,
                    record.success as i64,
                    record.result,
                    stamped.executed_at.to_rfc3339(),
                ],
            )?;

            tx.execute(
                "INSERT INTO channel_stats (channel, commands_handled) VALUES (?, 1)
                 ON CONFLICT(channel) DO UPDATE SET commands_handled = commands_handled + 1",
                params![record.channel_id],
            )?;

            tx.execute(
                "INSERT INTO command_stats (command, executions, failures, last_executed)
                 VALUES (?, 1, ?, ?)
                 ON CONFLICT(command) DO UPDATE SET
                     executions = executions + 1,
                     failures = failures + excluded.failures,
                     last_executed = excluded.last_executed",
                params![
                    record.command,
                    if record.success { 0 } else { 1 },
                    stamped.executed_at.to_rfc3339(),
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    pub fn get_stats(&self) -> Result<(Vec<ChannelStats>, Vec<CommandStats>)> {
        read_stats(&self.db_path)
    }

    pub fn reset_stats(&self) -> Result<()> {
        reset_stats(&self.db_path)
    }
}

impl Recorder for SqliteRecorder {
    fn record(&self, record: ExecutionRecord) {
        let stamped = StampedRecord {
            record,
            executed_at: Utc::now(),
        };
        if let Err(e) = self.sender.send(stamped) {
            log::warn!("Failed to queue execution record: {e}");
        }
    }
}

/// Read aggregated stats straight from the database file.
pub fn read_stats(db_path: &str) -> Result<(Vec<ChannelStats>, Vec<CommandStats>)> {
    let conn = SqliteRecorder::init_database(db_path)?;

    let mut stmt = conn.prepare(
        "SELECT channel, commands_handled FROM channel_stats ORDER BY commands_handled DESC",
    )?;
    let channels = stmt
        .query_map([], |row| {
            Ok(ChannelStats {
                channel_id: row.get(0)?,
                commands_handled: row.get(1)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut stmt = conn.prepare(
        "SELECT command, executions, failures, last_executed
         FROM command_stats ORDER BY executions DESC",
    )?;
    let commands = stmt
        .query_map([], |row| {
            Ok(CommandStats {
                command: row.get(0)?,
                executions: row.get(1)?,
                failures: row.get(2)?,
                last_executed: row
                    .get::<_, Option<String>>(3)?
                    .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
                    .map(|t| t.with_timezone(&Utc)),
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok((channels, commands))
}

/// Wipe all recorded executions and aggregates.
pub fn reset_stats(db_path: &str) -> Result<()> {
    let conn = SqliteRecorder::init_database(db_path)?;
    conn.execute("DELETE FROM executions", [])?;
    conn.execute("DELETE FROM channel_stats", [])?;
    conn.execute("DELETE FROM command_stats", [])?;
    Ok(())
}
