use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::config::PricingTable;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A Vertex AI usage session with its running totals.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRow {
    pub id: String,
    pub started_at: String,
    pub ended_at: Option<String>,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub total_cost: f64,
    pub model: String,
}

/// A completed request to be written to the ledger.
#[derive(Debug, Clone)]
pub struct NewRequest {
    pub model: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub prompt_preview: String,
}

/// Request count and cost for a single model.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelUsage {
    pub requests: u64,
    pub cost: f64,
}

/// Usage aggregated over one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyUsage {
    pub date: String,
    pub sessions: u64,
    pub requests: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cost: f64,
}

/// Usage aggregated over a date range.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageStats {
    pub total_sessions: u64,
    pub total_requests: u64,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub total_cost: f64,
    pub by_model: BTreeMap<String, ModelUsage>,
    pub daily_breakdown: Vec<DailyUsage>,
}

// ---------------------------------------------------------------------------
// UsageLedger
// ---------------------------------------------------------------------------

const SESSION_COLUMNS: &str = "id, started_at, ended_at, total_input_tokens, \
                               total_output_tokens, total_cost, model";

/// SQLite ledger of sessions and the requests made within them.
pub struct UsageLedger {
    conn: Connection,
}

impl UsageLedger {
    /// Opens (or creates) the ledger at the given path.
    pub fn open_at(path: PathBuf) -> Result<Self> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        }

        let conn = Connection::open(&path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;

        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        let ledger = Self { conn };
        ledger.init_schema()?;
        info!("Usage ledger opened at {}", path.display());
        Ok(ledger)
    }

    /// Opens an in-memory ledger (for tests).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;

        conn.pragma_update(None, "foreign_keys", "ON")?;

        let ledger = Self { conn };
        ledger.init_schema()?;
        Ok(ledger)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                started_at TEXT NOT NULL DEFAULT (datetime('now')),
                ended_at TEXT,
                total_input_tokens INTEGER NOT NULL DEFAULT 0,
                total_output_tokens INTEGER NOT NULL DEFAULT 0,
                total_cost REAL NOT NULL DEFAULT 0,
                model TEXT NOT NULL DEFAULT ''
            );

            CREATE TABLE IF NOT EXISTS requests (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id TEXT REFERENCES sessions(id),
                timestamp TEXT NOT NULL DEFAULT (datetime('now')),
                model TEXT NOT NULL,
                input_tokens INTEGER NOT NULL,
                output_tokens INTEGER NOT NULL,
                cost REAL NOT NULL,
                prompt_preview TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_requests_session
                ON requests(session_id);
            CREATE INDEX IF NOT EXISTS idx_requests_timestamp
                ON requests(timestamp);
            ",
        )?;
        Ok(())
    }

    fn map_session(row: &rusqlite::Row<'_>) -> rusqlite::Result<SessionRow> {
        Ok(SessionRow {
            id: row.get(0)?,
            started_at: row.get(1)?,
            ended_at: row.get(2)?,
            total_input_tokens: row.get::<_, i64>(3)? as u64,
            total_output_tokens: row.get::<_, i64>(4)? as u64,
            total_cost: row.get(5)?,
            model: row.get(6)?,
        })
    }

    // -----------------------------------------------------------------------
    // Sessions
    // -----------------------------------------------------------------------

    /// Creates a session with a fresh UUID and zeroed totals.
    pub fn create_session(&self, model: &str) -> Result<SessionRow> {
        let id = uuid::Uuid::new_v4().to_string();
        self.conn.execute(
            "INSERT INTO sessions (id, model) VALUES (?1, ?2)",
            params![id, model],
        )?;
        debug!(session_id = %id, model, "Session created");
        self.get_session(&id)?
            .context("Session missing immediately after insert")
    }

    pub fn get_session(&self, id: &str) -> Result<Option<SessionRow>> {
        let sql = format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?1");
        let row = self
            .conn
            .query_row(&sql, params![id], Self::map_session)
            .optional()?;
        Ok(row)
    }

    /// Stamps the session's end time.
    pub fn end_session(&self, id: &str) -> Result<()> {
        self.conn.execute(
            "UPDATE sessions SET ended_at = datetime('now') WHERE id = ?1",
            params![id],
        )?;
        debug!(session_id = %id, "Session ended");
        Ok(())
    }

    /// The most recently started session that has not ended.
    pub fn current_session(&self) -> Result<Option<SessionRow>> {
        let sql = format!(
            "SELECT {SESSION_COLUMNS} FROM sessions
             WHERE ended_at IS NULL
             ORDER BY started_at DESC, rowid DESC
             LIMIT 1"
        );
        let row = self
            .conn
            .query_row(&sql, [], Self::map_session)
            .optional()?;
        Ok(row)
    }

    // -----------------------------------------------------------------------
    // Requests
    // -----------------------------------------------------------------------

    /// Records a request and adds its usage to the owning session. Returns
    /// the cost charged for it.
    pub fn log_request(
        &self,
        session_id: &str,
        request: &NewRequest,
        pricing: &PricingTable,
    ) -> Result<f64> {
        let input_tokens =
            i64::try_from(request.input_tokens).context("Input token count out of range")?;
        let output_tokens =
            i64::try_from(request.output_tokens).context("Output token count out of range")?;
        let cost = pricing.cost_for(&request.model, request.input_tokens, request.output_tokens);

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO requests
                 (session_id, model, input_tokens, output_tokens, cost, prompt_preview)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                session_id,
                request.model,
                input_tokens,
                output_tokens,
                cost,
                request.prompt_preview
            ],
        )?;
        tx.execute(
            "UPDATE sessions SET
                 total_input_tokens = total_input_tokens + ?1,
                 total_output_tokens = total_output_tokens + ?2,
                 total_cost = total_cost + ?3
             WHERE id = ?4",
            params![input_tokens, output_tokens, cost, session_id],
        )?;
        tx.commit()?;

        Ok(cost)
    }

    // -----------------------------------------------------------------------
    // Reporting
    // -----------------------------------------------------------------------

    /// Aggregates usage for sessions started and requests made between
    /// `from` and `to` (inclusive).
    pub fn usage_stats(&self, from: NaiveDate, to: NaiveDate) -> Result<UsageStats> {
        let from = from.format("%Y-%m-%d").to_string();
        let to = to.format("%Y-%m-%d").to_string();

        let (total_sessions, total_input_tokens, total_output_tokens, total_cost) =
            self.conn.query_row(
                "SELECT COUNT(*),
                        COALESCE(SUM(total_input_tokens), 0),
                        COALESCE(SUM(total_output_tokens), 0),
                        COALESCE(SUM(total_cost), 0.0)
                 FROM sessions
                 WHERE date(started_at) BETWEEN ?1 AND ?2",
                params![from, to],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)? as u64,
                        row.get::<_, i64>(1)? as u64,
                        row.get::<_, i64>(2)? as u64,
                        row.get::<_, f64>(3)?,
                    ))
                },
            )?;

        let total_requests: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM requests
             WHERE date(timestamp) BETWEEN ?1 AND ?2",
            params![from, to],
            |row| row.get(0),
        )?;

        let mut by_model = BTreeMap::new();
        {
            let mut stmt = self.conn.prepare(
                "SELECT model, COUNT(*), COALESCE(SUM(cost), 0.0)
                 FROM requests
                 WHERE date(timestamp) BETWEEN ?1 AND ?2
                 GROUP BY model",
            )?;
            let rows = stmt.query_map(params![from, to], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    ModelUsage {
                        requests: row.get::<_, i64>(1)? as u64,
                        cost: row.get(2)?,
                    },
                ))
            })?;
            for row in rows {
                let (model, usage) = row.context("Failed to read model usage row")?;
                by_model.insert(model, usage);
            }
        }

        let mut daily_breakdown = Vec::new();
        {
            let mut stmt = self.conn.prepare(
                "SELECT date(timestamp) AS day,
                        COUNT(DISTINCT session_id),
                        COUNT(*),
                        COALESCE(SUM(input_tokens), 0),
                        COALESCE(SUM(output_tokens), 0),
                        COALESCE(SUM(cost), 0.0)
                 FROM requests
                 WHERE date(timestamp) BETWEEN ?1 AND ?2
                 GROUP BY day
                 ORDER BY day",
            )?;
            let rows = stmt.query_map(params![from, to], |row| {
                Ok(DailyUsage {
                    date: row.get(0)?,
                    sessions: row.get::<_, i64>(1)? as u64,
                    requests: row.get::<_, i64>(2)? as u64,
                    input_tokens: row.get::<_, i64>(3)? as u64,
                    output_tokens: row.get::<_, i64>(4)? as u64,
                    cost: row.get(5)?,
                })
            })?;
            for row in rows {
                daily_breakdown.push(row.context("Failed to read daily usage row")?);
            }
        }

        Ok(UsageStats {
            total_sessions,
            total_requests: total_requests as u64,
            total_input_tokens,
            total_output_tokens,
            total_cost,
            by_model,
            daily_breakdown,
        })
    }
}

// ===========================================================================
// Tests
// ===========================================================================
