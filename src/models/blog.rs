use std::fmt;

use chrono::NaiveDateTime;
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbPool;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Blog {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub blogger_id: i64,
    pub blogger_username: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Cleaned input for creating or updating a blog.
#[derive(Debug, Deserialize, Clone)]
pub struct BlogForm {
    pub title: String,
    pub content: String,
}

const SELECT_BLOGS: &str = "SELECT b.id, b.title, b.slug, b.content, b.blogger_id,
    u.username AS blogger_username, b.created_at, b.updated_at
    FROM blogs b JOIN users u ON u.id = b.blogger_id";

impl Blog {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Blog {
            id: row.get("id")?,
            title: row.get("title")?,
            slug: row.get("slug")?,
            content: row.get("content")?,
            blogger_id: row.get("blogger_id")?,
            blogger_username: row.get("blogger_username")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    pub fn url(&self) -> String {
        format!("/blog/{}", self.slug)
    }

    pub fn find_by_id(pool: &DbPool, id: i64) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row(
            &format!("{} WHERE b.id = ?1", SELECT_BLOGS),
            params![id],
            Self::from_row,
        )
        .ok()
    }

    /// Slugs are not unique; the newest blog wins.
    pub fn find_by_slug(pool: &DbPool, slug: &str) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row(
            &format!(
                "{} WHERE b.slug = ?1 ORDER BY b.created_at DESC, b.id DESC LIMIT 1",
                SELECT_BLOGS
            ),
            params![slug],
            Self::from_row,
        )
        .ok()
    }

    pub fn list(pool: &DbPool, blogger_id: Option<i64>, limit: i64, offset: i64) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };

        let (sql, params_vec): (String, Vec<Box<dyn rusqlite::types::ToSql>>) = match blogger_id {
            Some(uid) => (
                format!(
                    "{} WHERE b.blogger_id = ?1 ORDER BY b.created_at DESC, b.id DESC LIMIT ?2 OFFSET ?3",
                    SELECT_BLOGS
                ),
                vec![Box::new(uid), Box::new(limit), Box::new(offset)],
            ),
            None => (
                format!(
                    "{} ORDER BY b.created_at DESC, b.id DESC LIMIT ?1 OFFSET ?2",
                    SELECT_BLOGS
                ),
                vec![Box::new(limit), Box::new(offset)],
            ),
        };

        let mut stmt = match conn.prepare(&sql) {
            Ok(s) => s,
            Err(_) => return vec![],
        };

        let params_refs: Vec<&dyn rusqlite::types::ToSql> =
            params_vec.iter().map(|p| p.as_ref()).collect();

        stmt.query_map(params_refs.as_slice(), Self::from_row)
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default()
    }

    pub fn count(pool: &DbPool, blogger_id: Option<i64>) -> i64 {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return 0,
        };

        match blogger_id {
            Some(uid) => conn
                .query_row(
                    "SELECT COUNT(*) FROM blogs WHERE blogger_id = ?1",
                    params![uid],
                    |row| row.get(0),
                )
                .unwrap_or(0),
            None => conn
                .query_row("SELECT COUNT(*) FROM blogs", [], |row| row.get(0))
                .unwrap_or(0),
        }
    }

    /// Insert a blog owned by `blogger_id`; the slug is derived from the title.
    pub fn create(pool: &DbPool, blogger_id: i64, form: &BlogForm) -> Result<i64, String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        let slug = crate::slug::slugify_title(&form.title);

        conn.execute(
            "INSERT INTO blogs (title, slug, content, blogger_id) VALUES (?1, ?2, ?3, ?4)",
            params![form.title, slug, form.content, blogger_id],
        )
        .map_err(|e| e.to_string())?;

        Ok(conn.last_insert_rowid())
    }

    /// Save new title/content. The slug is recomputed on every save.
    pub fn update(pool: &DbPool, id: i64, form: &BlogForm) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        let slug = crate::slug::slugify_title(&form.title);

        conn.execute(
            "UPDATE blogs SET title = ?1, slug = ?2, content = ?3,
             updated_at = CURRENT_TIMESTAMP WHERE id = ?4",
            params![form.title, slug, form.content, id],
        )
        .map_err(|e| e.to_string())?;

        Ok(())
    }

    pub fn delete(pool: &DbPool, id: i64) -> Result<(), String> {
        let mut conn = pool.get().map_err(|e| e.to_string())?;
        let tx = conn.transaction().map_err(|e| e.to_string())?;
        tx.execute("DELETE FROM comments WHERE blog_id = ?1", params![id])
            .map_err(|e| e.to_string())?;
        tx.execute("DELETE FROM blogs WHERE id = ?1", params![id])
            .map_err(|e| e.to_string())?;
        tx.commit().map_err(|e| e.to_string())?;
        Ok(())
    }
}

impl fmt::Display for Blog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}
