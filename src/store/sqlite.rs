use std::collections::HashMap;

use crate::db::DbPool;
use crate::models::blog::{Blog, BlogForm};
use crate::models::comment::{Comment, CommentForm};
use crate::models::session::Session;
use crate::models::settings::Setting;
use crate::models::user::User;

use super::Store;

/// SQLite-backed implementation of the Store trait.
/// Wraps the r2d2 connection pool and delegates to model methods.
pub struct SqliteStore {
    pub pool: DbPool,
}

impl SqliteStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl Store for SqliteStore {
    // ── Lifecycle ───────────────────────────────────────────────────

    fn run_migrations(&self) -> Result<(), String> {
        crate::db::run_migrations(&self.pool).map_err(|e| e.to_string())
    }

    fn seed_defaults(&self) -> Result<(), String> {
        crate::db::seed_defaults(&self.pool).map_err(|e| e.to_string())
    }

    // ── Settings ────────────────────────────────────────────────────

    fn setting_get(&self, key: &str) -> Option<String> {
        Setting::get(&self.pool, key)
    }

    fn setting_all(&self) -> HashMap<String, String> {
        Setting::all(&self.pool)
    }

    // ── Users ───────────────────────────────────────────────────────

    fn user_get_by_id(&self, id: i64) -> Option<User> {
        User::get_by_id(&self.pool, id)
    }

    fn user_get_by_username(&self, username: &str) -> Option<User> {
        User::get_by_username(&self.pool, username)
    }

    fn user_create(&self, username: &str, password_hash: &str) -> Result<i64, String> {
        User::create(&self.pool, username, password_hash)
    }

    fn user_set_blogger(&self, id: i64, is_blogger: bool) -> Result<(), String> {
        User::set_blogger(&self.pool, id, is_blogger)
    }

    fn user_update_bio(&self, id: i64, bio: Option<&str>) -> Result<(), String> {
        User::update_bio(&self.pool, id, bio)
    }

    fn user_list_bloggers(&self, limit: i64, offset: i64) -> Vec<User> {
        User::list_bloggers(&self.pool, limit, offset)
    }

    fn user_count_bloggers(&self) -> i64 {
        User::count_bloggers(&self.pool)
    }

    // ── Blogs ───────────────────────────────────────────────────────

    fn blog_find_by_id(&self, id: i64) -> Option<Blog> {
        Blog::find_by_id(&self.pool, id)
    }

    fn blog_find_by_slug(&self, slug: &str) -> Option<Blog> {
        Blog::find_by_slug(&self.pool, slug)
    }

    fn blog_list(&self, blogger_id: Option<i64>, limit: i64, offset: i64) -> Vec<Blog> {
        Blog::list(&self.pool, blogger_id, limit, offset)
    }

    fn blog_count(&self, blogger_id: Option<i64>) -> i64 {
        Blog::count(&self.pool, blogger_id)
    }

    fn blog_create(&self, blogger_id: i64, form: &BlogForm) -> Result<i64, String> {
        Blog::create(&self.pool, blogger_id, form)
    }

    fn blog_update(&self, id: i64, form: &BlogForm) -> Result<(), String> {
        Blog::update(&self.pool, id, form)
    }

    fn blog_delete(&self, id: i64) -> Result<(), String> {
        Blog::delete(&self.pool, id)
    }

    // ── Comments ────────────────────────────────────────────────────

    fn comment_find_by_id(&self, id: i64) -> Option<Comment> {
        Comment::find_by_id(&self.pool, id)
    }

    fn comment_for_blog(&self, blog_id: i64) -> Vec<Comment> {
        Comment::for_blog(&self.pool, blog_id)
    }

    fn comment_count_for_blog(&self, blog_id: i64) -> i64 {
        Comment::count_for_blog(&self.pool, blog_id)
    }

    fn comment_create(
        &self,
        blog_id: i64,
        user_id: i64,
        form: &CommentForm,
    ) -> Result<i64, String> {
        Comment::create(&self.pool, blog_id, user_id, form)
    }

    fn comment_update(&self, id: i64, form: &CommentForm) -> Result<(), String> {
        Comment::update(&self.pool, id, form)
    }

    fn comment_delete(&self, id: i64) -> Result<(), String> {
        Comment::delete(&self.pool, id)
    }

    // ── Sessions ────────────────────────────────────────────────────

    fn session_create(
        &self,
        user_id: i64,
        token_hash: &str,
        expires_at: &str,
    ) -> Result<(), String> {
        Session::create(&self.pool, user_id, token_hash, expires_at)
    }

    fn session_get_user(&self, token_hash: &str) -> Option<User> {
        Session::get_user(&self.pool, token_hash)
    }

    fn session_delete(&self, token_hash: &str) -> Result<(), String> {
        Session::delete(&self.pool, token_hash)
    }

    fn session_cleanup_expired(&self) -> usize {
        Session::cleanup_expired(&self.pool)
    }
}
