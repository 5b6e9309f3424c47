use rusqlite::params;

use crate::db::DbPool;
use crate::models::user::User;

/// Server-side half of a login session. Only the SHA-256 of the cookie
/// token is stored.
pub struct Session;

impl Session {
    pub fn create(
        pool: &DbPool,
        user_id: i64,
        token_hash: &str,
        expires_at: &str,
    ) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "INSERT INTO sessions (token_hash, user_id, created_at, expires_at)
             VALUES (?1, ?2, CURRENT_TIMESTAMP, ?3)",
            params![token_hash, user_id, expires_at],
        )
        .map_err(|e| e.to_string())?;
        Ok(())
    }

    pub fn get_user(pool: &DbPool, token_hash: &str) -> Option<User> {
        let user_id: i64 = {
            let conn = pool.get().ok()?;
            conn.query_row(
                "SELECT user_id FROM sessions
                 WHERE token_hash = ?1 AND expires_at > datetime('now')",
                params![token_hash],
                |row| row.get(0),
            )
            .ok()?
        };
        User::get_by_id(pool, user_id)
    }

    pub fn delete(pool: &DbPool, token_hash: &str) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "DELETE FROM sessions WHERE token_hash = ?1",
            params![token_hash],
        )
        .map_err(|e| e.to_string())?;
        Ok(())
    }

    pub fn cleanup_expired(pool: &DbPool) -> usize {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return 0,
        };
        conn.execute(
            "DELETE FROM sessions WHERE expires_at <= datetime('now')",
            [],
        )
        .unwrap_or(0)
    }
}
