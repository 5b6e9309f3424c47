use std::collections::HashMap;

use crate::models::blog::{Blog, BlogForm};
use crate::models::comment::{Comment, CommentForm};
use crate::models::user::User;

pub mod sqlite;

/// Unified data-access trait. Every database operation goes through here.
/// Implementation: `SqliteStore` (wraps rusqlite/r2d2).
pub trait Store: Send + Sync {
    // ── Lifecycle ───────────────────────────────────────────────────
    fn run_migrations(&self) -> Result<(), String>;
    fn seed_defaults(&self) -> Result<(), String>;

    // ── Settings ────────────────────────────────────────────────────
    fn setting_get(&self, key: &str) -> Option<String>;
    fn setting_get_i64(&self, key: &str) -> i64 {
        self.setting_get(key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
    }
    fn setting_all(&self) -> HashMap<String, String>;

    // ── Users ───────────────────────────────────────────────────────
    fn user_get_by_id(&self, id: i64) -> Option<User>;
    fn user_get_by_username(&self, username: &str) -> Option<User>;
    fn user_create(&self, username: &str, password_hash: &str) -> Result<i64, String>;
    fn user_set_blogger(&self, id: i64, is_blogger: bool) -> Result<(), String>;
    fn user_update_bio(&self, id: i64, bio: Option<&str>) -> Result<(), String>;
    fn user_list_bloggers(&self, limit: i64, offset: i64) -> Vec<User>;
    fn user_count_bloggers(&self) -> i64;

    // ── Blogs ───────────────────────────────────────────────────────
    fn blog_find_by_id(&self, id: i64) -> Option<Blog>;
    fn blog_find_by_slug(&self, slug: &str) -> Option<Blog>;
    fn blog_list(&self, blogger_id: Option<i64>, limit: i64, offset: i64) -> Vec<Blog>;
    fn blog_count(&self, blogger_id: Option<i64>) -> i64;
    fn blog_create(&self, blogger_id: i64, form: &BlogForm) -> Result<i64, String>;
    fn blog_update(&self, id: i64, form: &BlogForm) -> Result<(), String>;
    fn blog_delete(&self, id: i64) -> Result<(), String>;

    // ── Comments ────────────────────────────────────────────────────
    fn comment_find_by_id(&self, id: i64) -> Option<Comment>;
    fn comment_for_blog(&self, blog_id: i64) -> Vec<Comment>;
    fn comment_count_for_blog(&self, blog_id: i64) -> i64;
    fn comment_create(&self, blog_id: i64, user_id: i64, form: &CommentForm)
        -> Result<i64, String>;
    fn comment_update(&self, id: i64, form: &CommentForm) -> Result<(), String>;
    fn comment_delete(&self, id: i64) -> Result<(), String>;

    // ── Sessions ────────────────────────────────────────────────────
    fn session_create(&self, user_id: i64, token_hash: &str, expires_at: &str)
        -> Result<(), String>;
    fn session_get_user(&self, token_hash: &str) -> Option<User>;
    fn session_delete(&self, token_hash: &str) -> Result<(), String>;
    fn session_cleanup_expired(&self) -> usize;
}
