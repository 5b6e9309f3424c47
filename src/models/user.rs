use chrono::NaiveDateTime;
use rocket::http::RawStr;
use rusqlite::params;
use serde::{Deserialize, Serialize};

use crate::db::DbPool;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub bio: Option<String>,
    pub is_blogger: bool,
    pub is_admin: bool,
    pub created_at: NaiveDateTime,
}

impl User {
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(User {
            id: row.get(0)?,
            username: row.get(1)?,
            password_hash: row.get(2)?,
            bio: row.get(3)?,
            is_blogger: row.get(4)?,
            is_admin: row.get(5)?,
            created_at: row.get(6)?,
        })
    }

    const SELECT_COLS: &'static str =
        "id, username, password_hash, bio, is_blogger, is_admin, created_at";

    // ── Lookups ──

    pub fn get_by_id(pool: &DbPool, id: i64) -> Option<User> {
        let conn = pool.get().ok()?;
        conn.query_row(
            &format!("SELECT {} FROM users WHERE id = ?1", Self::SELECT_COLS),
            params![id],
            Self::from_row,
        )
        .ok()
    }

    pub fn get_by_username(pool: &DbPool, username: &str) -> Option<User> {
        let conn = pool.get().ok()?;
        conn.query_row(
            &format!("SELECT {} FROM users WHERE username = ?1", Self::SELECT_COLS),
            params![username],
            Self::from_row,
        )
        .ok()
    }

    /// Blogger directory, alphabetical.
    pub fn list_bloggers(pool: &DbPool, limit: i64, offset: i64) -> Vec<User> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };
        let mut stmt = match conn.prepare(&format!(
            "SELECT {} FROM users WHERE is_blogger = 1 ORDER BY username ASC LIMIT ?1 OFFSET ?2",
            Self::SELECT_COLS
        )) {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        stmt.query_map(params![limit, offset], Self::from_row)
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default()
    }

    pub fn count_bloggers(pool: &DbPool) -> i64 {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return 0,
        };
        conn.query_row(
            "SELECT COUNT(*) FROM users WHERE is_blogger = 1",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0)
    }

    // ── Create ──

    /// The first account ever created is promoted to admin and blogger.
    /// The check and the insert are one statement, so two concurrent
    /// signups on an empty table cannot both be promoted.
    pub fn create(pool: &DbPool, username: &str, password_hash: &str) -> Result<i64, String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "INSERT INTO users (username, password_hash, bio, is_blogger, is_admin)
             SELECT ?1, ?2, CASE WHEN f.first THEN ?3 END, f.first, f.first
             FROM (SELECT NOT EXISTS (SELECT 1 FROM users) AS first) f",
            params![username, password_hash, blogger_bio(username)],
        )
        .map_err(|e| e.to_string())?;
        Ok(conn.last_insert_rowid())
    }

    // ── Update ──

    /// Grant or revoke the blogger flag. Granting fills an empty bio.
    pub fn set_blogger(pool: &DbPool, id: i64, is_blogger: bool) -> Result<(), String> {
        let user = Self::get_by_id(pool, id).ok_or_else(|| "User not found".to_string())?;
        let bio = match (&user.bio, is_blogger) {
            (None, true) => Some(blogger_bio(&user.username)),
            (bio, _) => bio.clone(),
        };

        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "UPDATE users SET is_blogger = ?1, bio = ?2 WHERE id = ?3",
            params![is_blogger, bio, id],
        )
        .map_err(|e| e.to_string())?;
        Ok(())
    }

    pub fn update_bio(pool: &DbPool, id: i64, bio: Option<&str>) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "UPDATE users SET bio = ?1 WHERE id = ?2",
            params![bio, id],
        )
        .map_err(|e| e.to_string())?;
        Ok(())
    }

    // ── Helpers ──

    /// Profile page path, percent-encoded so it is a valid redirect target
    /// for any username signup accepts.
    pub fn url(&self) -> String {
        profile_url(&self.username)
    }

    /// Return a safe version without password_hash for template contexts
    pub fn safe_json(&self) -> serde_json::Value {
        serde_json::json!({
            "id": self.id,
            "username": self.username,
            "bio": self.bio,
            "is_blogger": self.is_blogger,
            "is_admin": self.is_admin,
            "created_at": self.created_at,
        })
    }
}

fn profile_url(username: &str) -> String {
    format!("/users/{}", RawStr::new(username).percent_encode())
}

fn blogger_bio(username: &str) -> String {
    format!("{} is a blogger.", username)
}
