use crate::error::{LocboardError, Result};
use crate::model::{
    AggregateStats, TimeWindow, UserStatsDocument, LEADERBOARD_YEAR, SCHEMA_VERSION,
};
use chrono::{TimeZone, Utc};
use rusqlite::{params, Connection, Row};
use std::path::Path;

/// One row per username, replaced whole on every analysis run.
pub struct LeaderboardStore {
    conn: Connection,
}

impl LeaderboardStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        let mut store = Self { conn };
        store.initialize()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let mut store = Self { conn };
        store.initialize()?;
        Ok(store)
    }

    fn initialize(&mut self) -> Result<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS users (
                username TEXT PRIMARY KEY,
                all_time_added INTEGER NOT NULL,
                all_time_deleted INTEGER NOT NULL,
                all_time_net INTEGER NOT NULL,
                year_2024_added INTEGER NOT NULL,
                year_2024_deleted INTEGER NOT NULL,
                year_2024_net INTEGER NOT NULL,
                avatar_url TEXT,
                last_updated INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_users_all_time_net
                ON users(all_time_net DESC);
            CREATE INDEX IF NOT EXISTS idx_users_year_2024_net
                ON users(year_2024_net DESC);
            ",
        )?;
        self.check_schema_version()?;
        Ok(())
    }

    fn check_schema_version(&mut self) -> Result<()> {
        let user_version: i64 = self
            .conn
            .query_row("PRAGMA user_version;", [], |row| row.get(0))?;

        if user_version == 0 {
            let set_stmt = format!("PRAGMA user_version = {SCHEMA_VERSION};");
            self.conn.execute_batch(&set_stmt)?;
        } else if user_version != SCHEMA_VERSION as i64 {
            return Err(LocboardError::Store(format!(
                "Schema version mismatch: expected {}, found {}",
                SCHEMA_VERSION, user_version
            )));
        }

        Ok(())
    }

    /// Replace the stored document for `username`, creating it if absent.
    /// Last write wins; nothing is merged.
    pub fn upsert(
        &mut self,
        username: &str,
        all_time: &AggregateStats,
        year_2024: &AggregateStats,
        avatar_url: Option<&str>,
    ) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO users (
                username,
                all_time_added, all_time_deleted, all_time_net,
                year_2024_added, year_2024_deleted, year_2024_net,
                avatar_url, last_updated
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                username,
                all_time.total_added,
                all_time.total_deleted,
                all_time.total_net,
                year_2024.total_added,
                year_2024.total_deleted,
                year_2024.total_net,
                avatar_url,
                Utc::now().timestamp(),
            ],
        )?;
        Ok(())
    }

    /// Up to `limit` documents, ranked by the window's net lines descending.
    /// Ties fall back to storage order.
    pub fn top_n(&self, window: TimeWindow, limit: u32) -> Result<Vec<UserStatsDocument>> {
        let order_column = net_column(window)?;
        let query = format!(
            "SELECT username,
                    all_time_added, all_time_deleted, all_time_net,
                    year_2024_added, year_2024_deleted, year_2024_net,
                    avatar_url, last_updated
             FROM users
             ORDER BY {order_column} DESC
             LIMIT ?"
        );
        let mut stmt = self.conn.prepare(&query)?;
        let rows = stmt.query_map(params![limit], row_to_document)?;
        let mut documents = Vec::new();
        for row in rows {
            documents.push(row?);
        }
        Ok(documents)
    }

    /// Exact lookup, case-insensitive.
    pub fn find_by_username(&self, username: &str) -> Result<Option<UserStatsDocument>> {
        let result = self.conn.query_row(
            "SELECT username,
                    all_time_added, all_time_deleted, all_time_net,
                    year_2024_added, year_2024_deleted, year_2024_net,
                    avatar_url, last_updated
             FROM users
             WHERE username = ? COLLATE NOCASE",
            params![username],
            row_to_document,
        );
        match result {
            Ok(document) => Ok(Some(document)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Case-insensitive exact-or-prefix match on the username.
    pub fn search_by_username(&self, pattern: &str) -> Result<Vec<UserStatsDocument>> {
        let mut stmt = self.conn.prepare(
            "SELECT username,
                    all_time_added, all_time_deleted, all_time_net,
                    year_2024_added, year_2024_deleted, year_2024_net,
                    avatar_url, last_updated
             FROM users
             WHERE username LIKE ? || '%' COLLATE NOCASE
             ORDER BY username",
        )?;
        let rows = stmt.query_map(params![pattern], row_to_document)?;
        let mut documents = Vec::new();
        for row in rows {
            documents.push(row?);
        }
        Ok(documents)
    }
}

fn net_column(window: TimeWindow) -> Result<&'static str> {
    match window {
        TimeWindow::AllTime => Ok("all_time_net"),
        TimeWindow::Year(LEADERBOARD_YEAR) => Ok("year_2024_net"),
        TimeWindow::Year(year) => Err(LocboardError::Store(format!(
            "no stored window for year {year}"
        ))),
    }
}

fn row_to_document(row: &Row<'_>) -> rusqlite::Result<UserStatsDocument> {
    let ts: i64 = row.get(8)?;
    let last_updated = Utc.timestamp_opt(ts, 0).single().ok_or_else(|| {
        rusqlite::Error::InvalidColumnType(
            8,
            "last_updated".to_string(),
            rusqlite::types::Type::Integer,
        )
    })?;

    Ok(UserStatsDocument {
        username: row.get(0)?,
        all_time: AggregateStats {
            total_added: row.get(1)?,
            total_deleted: row.get(2)?,
            total_net: row.get(3)?,
        },
        year_2024: AggregateStats {
            total_added: row.get(4)?,
            total_deleted: row.get(5)?,
            total_net: row.get(6)?,
        },
        avatar_url: row.get(7)?,
        last_updated,
    })
}
