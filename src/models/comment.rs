use std::fmt;

use chrono::NaiveDateTime;
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbPool;

/// Characters shown when a comment is displayed as a one-line summary.
const SUMMARY_CHARS: usize = 25;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Comment {
    pub id: i64,
    pub content: String,
    pub user_id: i64,
    pub username: String,
    pub blog_id: i64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Cleaned input for creating or updating a comment.
#[derive(Debug, Deserialize, Clone)]
pub struct CommentForm {
    pub content: String,
}

const SELECT_COMMENTS: &str = "SELECT c.id, c.content, c.user_id, u.username AS username,
    c.blog_id, c.created_at, c.updated_at
    FROM comments c JOIN users u ON u.id = c.user_id";

impl Comment {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Comment {
            id: row.get("id")?,
            content: row.get("content")?,
            user_id: row.get("user_id")?,
            username: row.get("username")?,
            blog_id: row.get("blog_id")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    pub fn summary(&self) -> String {
        self.content.chars().take(SUMMARY_CHARS).collect()
    }

    pub fn find_by_id(pool: &DbPool, id: i64) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row(
            &format!("{} WHERE c.id = ?1", SELECT_COMMENTS),
            params![id],
            Self::from_row,
        )
        .ok()
    }

    /// Newest first.
    pub fn for_blog(pool: &DbPool, blog_id: i64) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };
        let mut stmt = match conn.prepare(&format!(
            "{} WHERE c.blog_id = ?1 ORDER BY c.created_at DESC, c.id DESC",
            SELECT_COMMENTS
        )) {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        stmt.query_map(params![blog_id], Self::from_row)
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default()
    }

    pub fn count_for_blog(pool: &DbPool, blog_id: i64) -> i64 {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return 0,
        };
        conn.query_row(
            "SELECT COUNT(*) FROM comments WHERE blog_id = ?1",
            params![blog_id],
            |row| row.get(0),
        )
        .unwrap_or(0)
    }

    pub fn create(
        pool: &DbPool,
        blog_id: i64,
        user_id: i64,
        form: &CommentForm,
    ) -> Result<i64, String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "INSERT INTO comments (content, user_id, blog_id) VALUES (?1, ?2, ?3)",
            params![form.content, user_id, blog_id],
        )
        .map_err(|e| e.to_string())?;

        Ok(conn.last_insert_rowid())
    }

    pub fn update(pool: &DbPool, id: i64, form: &CommentForm) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "UPDATE comments SET content = ?1, updated_at = CURRENT_TIMESTAMP WHERE id = ?2",
            params![form.content, id],
        )
        .map_err(|e| e.to_string())?;
        Ok(())
    }

    pub fn delete(pool: &DbPool, id: i64) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute("DELETE FROM comments WHERE id = ?1", params![id])
            .map_err(|e| e.to_string())?;
        Ok(())
    }
}

impl fmt::Display for Comment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}
