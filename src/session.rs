use crate::error::{LocboardError, Result};
use chrono::Utc;
use rand::RngCore;
use rusqlite::{params, Connection};
use std::path::Path;

/// Everything a request needs to act on behalf of a user. Built once per
/// invocation and passed down explicitly; nothing global.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub token: Option<String>,
    pub username: String,
    pub name: Option<String>,
    pub emails: Vec<String>,
    pub avatar_url: Option<String>,
}

/// Persists tokens across invocations, keyed by a server-issued session id.
pub struct SessionStore {
    conn: Connection,
}

impl SessionStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.initialize()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.initialize()?;
        Ok(store)
    }

    fn initialize(&self) -> Result<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                token TEXT NOT NULL,
                username TEXT NOT NULL,
                name TEXT,
                emails TEXT NOT NULL,
                avatar_url TEXT,
                created_at INTEGER NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    /// Store the context under a fresh random id and return the id.
    pub fn issue(&mut self, ctx: &AuthContext) -> Result<String> {
        let token = ctx.token.as_deref().ok_or_else(|| {
            LocboardError::Session("cannot issue a session without a token".to_string())
        })?;
        let id = new_session_id();
        self.conn.execute(
            "INSERT INTO sessions (id, token, username, name, emails, avatar_url, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            params![
                id,
                token,
                ctx.username,
                ctx.name,
                serde_json::to_string(&ctx.emails)?,
                ctx.avatar_url,
                Utc::now().timestamp(),
            ],
        )?;
        Ok(id)
    }

    pub fn lookup(&self, id: &str) -> Result<Option<AuthContext>> {
        let result = self.conn.query_row(
            "SELECT token, username, name, emails, avatar_url FROM sessions WHERE id = ?",
            params![id],
            |row| {
                let emails_json: String = row.get(3)?;
                let emails: Vec<String> =
                    serde_json::from_str(&emails_json).map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(
                            emails_json.len(),
                            rusqlite::types::Type::Text,
                            Box::new(e),
                        )
                    })?;
                Ok(AuthContext {
                    token: Some(row.get(0)?),
                    username: row.get(1)?,
                    name: row.get(2)?,
                    emails,
                    avatar_url: row.get(4)?,
                })
            },
        );
        match result {
            Ok(ctx) => Ok(Some(ctx)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove a session; returns whether it existed.
    pub fn revoke(&mut self, id: &str) -> Result<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM sessions WHERE id = ?", params![id])?;
        Ok(removed > 0)
    }
}

fn new_session_id() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
