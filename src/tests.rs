#![cfg(test)]

use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rocket::http::{ContentType, Header, Status};
use rocket::local::blocking::{Client, LocalResponse};

use crate::db::{run_migrations, seed_defaults, DbPool};
use crate::models::blog::{Blog, BlogForm};
use crate::models::comment::{Comment, CommentForm};
use crate::models::session::Session;
use crate::models::settings::Setting;
use crate::models::user::User;
use crate::security::auth;
use crate::store::sqlite::SqliteStore;
use crate::store::Store;

/// Atomic counter for unique shared-cache DB names so parallel tests don't collide.
static TEST_DB_COUNTER: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(0);

/// Fresh in-memory SQLite pool with migrations and default settings applied.
/// Named shared-cache DB so every pooled connection sees the same data.
fn test_pool() -> DbPool {
    let id = TEST_DB_COUNTER.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    let uri = format!("file:testdb_{}?mode=memory&cache=shared", id);
    let manager = SqliteConnectionManager::file(uri)
        .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys=ON;"));
    let pool = Pool::builder()
        .max_size(4)
        .build(manager)
        .expect("Failed to create test pool");
    run_migrations(&pool).expect("Failed to run migrations");
    seed_defaults(&pool).expect("Failed to seed defaults");
    pool
}

/// Fast bcrypt hash for tests (cost=4 instead of DEFAULT_COST=12).
fn fast_hash(password: &str) -> String {
    bcrypt::hash(password, 4).unwrap()
}

const PASSWORD: &str = "correct-horse";

fn make_user(pool: &DbPool, username: &str) -> User {
    let id = User::create(pool, username, &fast_hash(PASSWORD)).unwrap();
    User::get_by_id(pool, id).unwrap()
}

fn make_blogger(pool: &DbPool, username: &str) -> User {
    let user = make_user(pool, username);
    User::set_blogger(pool, user.id, true).unwrap();
    User::get_by_id(pool, user.id).unwrap()
}

fn blog_form(title: &str, content: &str) -> BlogForm {
    BlogForm {
        title: title.to_string(),
        content: content.to_string(),
    }
}

fn make_blog(pool: &DbPool, blogger: &User, title: &str) -> Blog {
    let id = Blog::create(pool, blogger.id, &blog_form(title, "Some content.")).unwrap();
    Blog::find_by_id(pool, id).unwrap()
}

fn count_users(pool: &DbPool) -> i64 {
    pool.get()
        .unwrap()
        .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
        .unwrap()
}

fn make_comment(pool: &DbPool, blog: &Blog, user: &User, content: &str) -> Comment {
    let form = CommentForm {
        content: content.to_string(),
    };
    let id = Comment::create(pool, blog.id, user.id, &form).unwrap();
    Comment::find_by_id(pool, id).unwrap()
}

// ═══════════════════════════════════════════════════════════
// Settings
// ═══════════════════════════════════════════════════════════

#[test]
fn settings_defaults_are_seeded() {
    let pool = test_pool();
    assert_eq!(Setting::get(&pool, "blog_posts_per_page"), Some("5".to_string()));
    assert_eq!(Setting::get(&pool, "dashboard_posts_per_page"), Some("5".to_string()));
    assert_eq!(Setting::get(&pool, "site_name"), Some("DIY Blog".to_string()));
}

#[test]
fn settings_seed_does_not_overwrite() {
    let pool = test_pool();
    pool.get()
        .unwrap()
        .execute("UPDATE settings SET value = 'My Blog' WHERE key = 'site_name'", [])
        .unwrap();
    seed_defaults(&pool).unwrap();
    assert_eq!(Setting::get(&pool, "site_name"), Some("My Blog".to_string()));
}

// ═══════════════════════════════════════════════════════════
// Users
// ═══════════════════════════════════════════════════════════

#[test]
fn first_user_is_admin_and_blogger() {
    let pool = test_pool();
    let first = make_user(&pool, "alice");
    let second = make_user(&pool, "bob");

    assert!(first.is_admin && first.is_blogger);
    assert_eq!(first.bio.as_deref(), Some("alice is a blogger."));
    assert!(!second.is_admin && !second.is_blogger);
    assert_eq!(second.bio, None);
}

#[test]
fn concurrent_first_signups_promote_one_admin() {
    let pool = test_pool();
    let hash = fast_hash(PASSWORD);
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let pool = pool.clone();
            let hash = hash.clone();
            std::thread::spawn(move || User::create(&pool, &format!("user{}", i), &hash).is_ok())
        })
        .collect();
    let created = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|ok| *ok)
        .count();
    assert!(created >= 1);

    let admins: i64 = pool
        .get()
        .unwrap()
        .query_row("SELECT COUNT(*) FROM users WHERE is_admin = 1", [], |row| row.get(0))
        .unwrap();
    assert_eq!(admins, 1);
}

#[test]
fn duplicate_username_is_rejected() {
    let pool = test_pool();
    make_user(&pool, "alice");
    assert!(User::create(&pool, "alice", "hash").is_err());
}

#[test]
fn granting_blogger_fills_missing_bio_only() {
    let pool = test_pool();
    make_user(&pool, "admin");
    let bob = make_user(&pool, "bob");
    User::set_blogger(&pool, bob.id, true).unwrap();
    let bob = User::get_by_id(&pool, bob.id).unwrap();
    assert!(bob.is_blogger);
    assert_eq!(bob.bio.as_deref(), Some("bob is a blogger."));

    let carol = make_user(&pool, "carol");
    User::update_bio(&pool, carol.id, Some("Writes about bees.")).unwrap();
    User::set_blogger(&pool, carol.id, true).unwrap();
    let carol = User::get_by_id(&pool, carol.id).unwrap();
    assert_eq!(carol.bio.as_deref(), Some("Writes about bees."));
}

#[test]
fn revoking_blogger_keeps_bio() {
    let pool = test_pool();
    make_user(&pool, "admin");
    let bob = make_blogger(&pool, "bob");
    User::set_blogger(&pool, bob.id, false).unwrap();
    let bob = User::get_by_id(&pool, bob.id).unwrap();
    assert!(!bob.is_blogger);
    assert_eq!(bob.bio.as_deref(), Some("bob is a blogger."));
}

#[test]
fn blogger_directory_lists_only_bloggers_alphabetically() {
    let pool = test_pool();
    make_user(&pool, "zed");
    make_user(&pool, "reader");
    make_blogger(&pool, "amy");

    let names: Vec<String> = User::list_bloggers(&pool, 10, 0)
        .into_iter()
        .map(|u| u.username)
        .collect();
    assert_eq!(names, vec!["amy", "zed"]);
    assert_eq!(User::count_bloggers(&pool), 2);
}

#[test]
fn safe_json_omits_password_hash() {
    let pool = test_pool();
    let user = make_user(&pool, "alice");
    let json = user.safe_json();
    assert!(json.get("password_hash").is_none());
    assert_eq!(json["username"], "alice");
}

// ═══════════════════════════════════════════════════════════
// Blogs
// ═══════════════════════════════════════════════════════════

#[test]
fn blog_slug_is_derived_on_create() {
    let pool = test_pool();
    let author = make_user(&pool, "alice");
    let blog = make_blog(&pool, &author, "Blog Post");
    assert_eq!(blog.slug, "blog-post");
    assert_eq!(blog.url(), "/blog/blog-post");
    assert_eq!(blog.blogger_username, "alice");
    assert_eq!(blog.to_string(), "Blog Post");
}

#[test]
fn blog_slug_is_recomputed_on_update() {
    let pool = test_pool();
    let author = make_user(&pool, "alice");
    let blog = make_blog(&pool, &author, "Blog Post");

    Blog::update(&pool, blog.id, &blog_form("Renamed Post", "New body")).unwrap();

    let updated = Blog::find_by_id(&pool, blog.id).unwrap();
    assert_eq!(updated.slug, "renamed-post");
    assert_eq!(updated.content, "New body");
    assert!(Blog::find_by_slug(&pool, "blog-post").is_none());
    assert_eq!(Blog::find_by_slug(&pool, "renamed-post").unwrap().id, blog.id);
}

#[test]
fn duplicate_slug_resolves_to_newest_blog() {
    let pool = test_pool();
    let author = make_user(&pool, "alice");
    let older = make_blog(&pool, &author, "Same Title");
    let newer = make_blog(&pool, &author, "Same Title");
    assert_ne!(older.id, newer.id);
    assert_eq!(Blog::find_by_slug(&pool, "same-title").unwrap().id, newer.id);
}

#[test]
fn blog_listing_paginates_newest_first() {
    let pool = test_pool();
    let author = make_user(&pool, "alice");
    for i in 1..=7 {
        make_blog(&pool, &author, &format!("Post {}", i));
    }

    assert_eq!(Blog::count(&pool, None), 7);
    let first = Blog::list(&pool, None, 5, 0);
    let second = Blog::list(&pool, None, 5, 5);
    assert_eq!(first.len(), 5);
    assert_eq!(second.len(), 2);
    assert_eq!(first[0].title, "Post 7");
    assert_eq!(second[1].title, "Post 1");
}

#[test]
fn blog_listing_filters_by_blogger() {
    let pool = test_pool();
    let alice = make_user(&pool, "alice");
    let bob = make_blogger(&pool, "bob");
    make_blog(&pool, &alice, "A1");
    make_blog(&pool, &bob, "B1");
    make_blog(&pool, &bob, "B2");

    assert_eq!(Blog::count(&pool, Some(bob.id)), 2);
    assert!(Blog::list(&pool, Some(bob.id), 5, 0)
        .iter()
        .all(|b| b.blogger_id == bob.id));
}

#[test]
fn deleting_blog_removes_its_comments() {
    let pool = test_pool();
    let author = make_user(&pool, "alice");
    let reader = make_user(&pool, "bob");
    let blog = make_blog(&pool, &author, "Doomed");
    let keep = make_blog(&pool, &author, "Kept");
    make_comment(&pool, &blog, &reader, "first");
    make_comment(&pool, &blog, &reader, "second");
    let survivor = make_comment(&pool, &keep, &reader, "stays");

    Blog::delete(&pool, blog.id).unwrap();

    assert!(Blog::find_by_id(&pool, blog.id).is_none());
    assert_eq!(Comment::count_for_blog(&pool, blog.id), 0);
    assert!(Comment::find_by_id(&pool, survivor.id).is_some());
}

// ═══════════════════════════════════════════════════════════
// Comments
// ═══════════════════════════════════════════════════════════

#[test]
fn comment_summary_is_first_25_chars() {
    let pool = test_pool();
    let author = make_user(&pool, "alice");
    let blog = make_blog(&pool, &author, "Post");
    let comment = make_comment(&pool, &blog, &author, &"c".repeat(40));
    assert_eq!(comment.summary(), "c".repeat(25));
    assert_eq!(comment.to_string(), "c".repeat(25));
    assert_eq!(comment.username, "alice");
}

#[test]
fn comment_update_and_delete() {
    let pool = test_pool();
    let author = make_user(&pool, "alice");
    let blog = make_blog(&pool, &author, "Post");
    let comment = make_comment(&pool, &blog, &author, "typo");

    let form = CommentForm {
        content: "fixed".to_string(),
    };
    Comment::update(&pool, comment.id, &form).unwrap();
    assert_eq!(Comment::find_by_id(&pool, comment.id).unwrap().content, "fixed");

    Comment::delete(&pool, comment.id).unwrap();
    assert!(Comment::for_blog(&pool, blog.id).is_empty());
}

#[test]
fn deleting_user_cascades_to_content() {
    let pool = test_pool();
    let author = make_user(&pool, "alice");
    let blog = make_blog(&pool, &author, "Post");
    make_comment(&pool, &blog, &author, "hi");

    let conn = pool.get().unwrap();
    conn.execute("DELETE FROM users WHERE id = ?1", rusqlite::params![author.id])
        .unwrap();
    drop(conn);

    assert_eq!(Blog::count(&pool, None), 0);
    assert_eq!(Comment::count_for_blog(&pool, blog.id), 0);
}

// ═══════════════════════════════════════════════════════════
// Sessions
// ═══════════════════════════════════════════════════════════

#[test]
fn session_resolves_user_until_deleted() {
    let pool = test_pool();
    let store = SqliteStore::new(pool.clone());
    let user = make_user(&pool, "alice");

    let token = auth::create_session(&store, user.id).unwrap();
    let resolved = Session::get_user(&pool, &auth::hash_token(&token)).unwrap();
    assert_eq!(resolved.id, user.id);

    // The raw token is never stored
    assert!(Session::get_user(&pool, &token).is_none());

    auth::destroy_session(&store, &token).unwrap();
    assert!(Session::get_user(&pool, &auth::hash_token(&token)).is_none());
}

#[test]
fn expired_sessions_are_ignored_and_purged() {
    let pool = test_pool();
    let user = make_user(&pool, "alice");
    Session::create(&pool, user.id, "stale", "2000-01-01 00:00:00").unwrap();

    assert!(Session::get_user(&pool, "stale").is_none());
    assert_eq!(Session::cleanup_expired(&pool), 1);
    assert_eq!(Session::cleanup_expired(&pool), 0);
}

#[test]
fn password_hash_round_trip() {
    let hash = auth::hash_password(PASSWORD).unwrap();
    assert!(auth::verify_password(PASSWORD, &hash));
    assert!(!auth::verify_password("wrong", &hash));
    assert!(!auth::verify_password(PASSWORD, "not-a-hash"));
}

// ═══════════════════════════════════════════════════════════
// HTTP
// ═══════════════════════════════════════════════════════════

/// Local client over a fresh database; the returned pool shares its data.
fn test_client() -> (Client, DbPool) {
    let pool = test_pool();
    let store: Arc<dyn Store> = Arc::new(SqliteStore::new(pool.clone()));
    let figment = rocket::Config::figment()
        .merge(("template_dir", "website/templates"))
        .merge(("log_level", "off"));
    let client = Client::tracked(crate::build(store, figment)).expect("valid rocket instance");
    (client, pool)
}

fn login(client: &Client, username: &str) {
    let response = client
        .post("/accounts/login")
        .header(ContentType::Form)
        .body(format!("username={}&password={}", username, PASSWORD))
        .dispatch();
    assert_eq!(response.status(), Status::SeeOther, "login as {}", username);
}

fn post_form<'c>(client: &'c Client, uri: &str, body: &str) -> LocalResponse<'c> {
    client
        .post(uri.to_string())
        .header(ContentType::Form)
        .body(body.to_string())
        .dispatch()
}

fn location(response: &LocalResponse<'_>) -> String {
    response.headers().get_one("Location").unwrap_or_default().to_string()
}

#[test]
fn public_pages_render() {
    let (client, pool) = test_client();
    let author = make_user(&pool, "alice");
    make_blog(&pool, &author, "Hello World");

    for uri in ["/", "/blog", "/blog/hello-world", "/users", "/users/alice", "/accounts/login"] {
        let response = client.get(uri).dispatch();
        assert_eq!(response.status(), Status::Ok, "GET {}", uri);
    }

    let body = client.get("/").dispatch().into_string().unwrap();
    assert!(body.contains("All Bloggers"));
    assert!(body.contains("Log In"));
    assert!(body.contains("Hello World"));
}

#[test]
fn unknown_blog_and_user_are_not_found() {
    let (client, _pool) = test_client();
    assert_eq!(client.get("/blog/missing").dispatch().status(), Status::NotFound);
    assert_eq!(client.get("/users/nobody").dispatch().status(), Status::NotFound);
}

#[test]
fn blog_listing_pagination_over_http() {
    let (client, pool) = test_client();
    let author = make_user(&pool, "alice");
    for i in 1..=7 {
        make_blog(&pool, &author, &format!("Post {}", i));
    }

    let page1 = client.get("/blog").dispatch().into_string().unwrap();
    assert!(page1.contains("Page 1 of 2."));
    assert!(page1.contains("Post 7"));
    assert!(!page1.contains("Post 2<"));

    let page2 = client.get("/blog?page=2").dispatch().into_string().unwrap();
    assert!(page2.contains("Page 2 of 2."));
    assert!(page2.contains("Post 1"));

    assert_eq!(client.get("/blog?page=3").dispatch().status(), Status::NotFound);
    assert_eq!(client.get("/blog?page=0").dispatch().status(), Status::NotFound);
}

#[test]
fn empty_blog_listing_is_ok() {
    let (client, _pool) = test_client();
    let response = client.get("/blog").dispatch();
    assert_eq!(response.status(), Status::Ok);
    assert!(response.into_string().unwrap().contains("There are no blogs."));
}

#[test]
fn anonymous_dashboard_redirects_to_login() {
    let (client, _pool) = test_client();
    let response = client.get("/dashboard").dispatch();
    assert_eq!(response.status(), Status::SeeOther);
    let to = location(&response);
    assert!(to.starts_with("/accounts/login?next="), "{}", to);
    assert!(to.contains("dashboard"));
}

#[test]
fn non_blogger_cannot_create_blogs() {
    let (client, pool) = test_client();
    make_user(&pool, "admin");
    make_user(&pool, "reader");
    login(&client, "reader");

    assert_eq!(client.get("/dashboard/new").dispatch().status(), Status::Forbidden);
    let response = post_form(&client, "/dashboard/new", "title=Nope&content=Body");
    assert_eq!(response.status(), Status::Forbidden);
    assert_eq!(Blog::count(&pool, None), 0);
}

#[test]
fn blogger_creates_blog_owned_by_self() {
    let (client, pool) = test_client();
    let alice = make_user(&pool, "alice");
    login(&client, "alice");

    let response = post_form(&client, "/dashboard/new", "title=My+First+Post&content=Hello");
    assert_eq!(response.status(), Status::SeeOther);
    assert_eq!(location(&response), "/blog/my-first-post");

    let blog = Blog::find_by_slug(&pool, "my-first-post").unwrap();
    assert_eq!(blog.blogger_id, alice.id);

    let body = client.get("/blog/my-first-post").dispatch().into_string().unwrap();
    assert!(body.contains("Your blog was published."));

    let dashboard = client.get("/dashboard").dispatch();
    assert_eq!(dashboard.status(), Status::Ok);
    assert!(dashboard.into_string().unwrap().contains("My First Post"));
}

#[test]
fn invalid_blog_form_rerenders_with_errors() {
    let (client, pool) = test_client();
    make_user(&pool, "alice");
    login(&client, "alice");

    let body = format!("title=Long&content={}", "x".repeat(3001));
    let response = post_form(&client, "/dashboard/new", &body);
    assert_eq!(response.status(), Status::Ok);
    assert!(response.into_string().unwrap().contains("The field is too long."));
    assert_eq!(Blog::count(&pool, None), 0);
}

#[test]
fn owner_updates_blog_and_slug_follows_title() {
    let (client, pool) = test_client();
    let alice = make_user(&pool, "alice");
    let blog = make_blog(&pool, &alice, "Old Title");
    login(&client, "alice");

    assert_eq!(client.get("/dashboard/old-title/update").dispatch().status(), Status::Ok);
    let response = post_form(&client, "/dashboard/old-title/update", "title=New+Title&content=Changed");
    assert_eq!(response.status(), Status::SeeOther);
    assert_eq!(location(&response), "/dashboard");

    let updated = Blog::find_by_id(&pool, blog.id).unwrap();
    assert_eq!(updated.slug, "new-title");
    assert_eq!(updated.content, "Changed");
}

#[test]
fn non_owner_cannot_update_or_delete_blog() {
    let (client, pool) = test_client();
    let alice = make_user(&pool, "alice");
    make_blogger(&pool, "bob");
    let blog = make_blog(&pool, &alice, "Alice Post");
    login(&client, "bob");

    assert_eq!(
        client.get("/dashboard/alice-post/update").dispatch().status(),
        Status::Forbidden
    );
    let response = post_form(&client, "/dashboard/alice-post/update", "title=Hijack&content=x");
    assert_eq!(response.status(), Status::Forbidden);
    assert_eq!(client.post("/dashboard/alice-post/delete").dispatch().status(), Status::Forbidden);
    assert_eq!(Blog::find_by_id(&pool, blog.id).unwrap().title, "Alice Post");
}

#[test]
fn anonymous_blog_update_is_forbidden() {
    let (client, pool) = test_client();
    let alice = make_user(&pool, "alice");
    make_blog(&pool, &alice, "Post");
    assert_eq!(client.get("/dashboard/post/update").dispatch().status(), Status::Forbidden);
    assert_eq!(client.post("/dashboard/post/delete").dispatch().status(), Status::Forbidden);
}

#[test]
fn owner_deletes_blog_with_comments() {
    let (client, pool) = test_client();
    let alice = make_user(&pool, "alice");
    let reader = make_user(&pool, "bob");
    let blog = make_blog(&pool, &alice, "Short Lived");
    make_comment(&pool, &blog, &reader, "nice");
    login(&client, "alice");

    let response = client.post("/dashboard/short-lived/delete").dispatch();
    assert_eq!(response.status(), Status::SeeOther);
    assert_eq!(location(&response), "/dashboard");
    assert!(Blog::find_by_id(&pool, blog.id).is_none());
    assert_eq!(Comment::count_for_blog(&pool, blog.id), 0);
}

#[test]
fn delete_requires_post() {
    let (client, pool) = test_client();
    let alice = make_user(&pool, "alice");
    make_blog(&pool, &alice, "Post");
    login(&client, "alice");
    assert_eq!(client.get("/dashboard/post/delete").dispatch().status(), Status::NotFound);
}

#[test]
fn anonymous_comment_redirects_to_login() {
    let (client, pool) = test_client();
    let alice = make_user(&pool, "alice");
    let blog = make_blog(&pool, &alice, "Post");

    let response = post_form(&client, "/blog/post/comments", "content=hello");
    assert_eq!(response.status(), Status::SeeOther);
    assert!(location(&response).starts_with("/accounts/login?next="));
    assert_eq!(Comment::count_for_blog(&pool, blog.id), 0);
}

#[test]
fn comment_on_missing_blog_is_not_found() {
    let (client, pool) = test_client();
    make_user(&pool, "alice");
    login(&client, "alice");
    let response = post_form(&client, "/blog/missing/comments", "content=hello");
    assert_eq!(response.status(), Status::NotFound);
}

#[test]
fn logged_in_user_comments_on_blog() {
    let (client, pool) = test_client();
    let alice = make_user(&pool, "alice");
    let bob = make_user(&pool, "bob");
    let blog = make_blog(&pool, &alice, "Post");
    login(&client, "bob");

    let response = post_form(&client, "/blog/post/comments", "content=Great+read");
    assert_eq!(response.status(), Status::SeeOther);
    assert_eq!(location(&response), "/blog/post");

    let comments = Comment::for_blog(&pool, blog.id);
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].user_id, bob.id);
    assert_eq!(comments[0].content, "Great read");

    let body = client.get("/blog/post").dispatch().into_string().unwrap();
    assert!(body.contains("Your comment was posted."));
    assert!(body.contains("Great read"));
    assert!(body.contains("Description"));
    assert!(body.contains("Comments (1)"));
}

#[test]
fn overlong_comment_rerenders_detail_with_error() {
    let (client, pool) = test_client();
    let alice = make_user(&pool, "alice");
    let blog = make_blog(&pool, &alice, "Post");
    login(&client, "alice");

    let body = format!("content={}", "z".repeat(1025));
    let response = post_form(&client, "/blog/post/comments", &body);
    assert_eq!(response.status(), Status::Ok);
    assert!(response.into_string().unwrap().contains("The comment is too long."));
    assert_eq!(Comment::count_for_blog(&pool, blog.id), 0);
}

#[test]
fn comment_edit_is_owner_only() {
    let (client, pool) = test_client();
    let alice = make_user(&pool, "alice");
    let bob = make_user(&pool, "bob");
    let blog = make_blog(&pool, &alice, "Post");
    let comment = make_comment(&pool, &blog, &bob, "original");
    let edit = format!("/comments/{}/edit", comment.id);
    let delete = format!("/comments/{}/delete", comment.id);

    // Anonymous: forbidden, not redirected
    assert_eq!(client.get(edit.clone()).dispatch().status(), Status::Forbidden);
    assert_eq!(post_form(&client, &edit, "content=x").status(), Status::Forbidden);

    // The blog owner does not own the comment
    login(&client, "alice");
    assert_eq!(post_form(&client, &edit, "content=x").status(), Status::Forbidden);
    assert_eq!(client.post(delete.clone()).dispatch().status(), Status::Forbidden);
    assert_eq!(Comment::find_by_id(&pool, comment.id).unwrap().content, "original");
}

#[test]
fn comment_owner_edits_and_deletes() {
    let (client, pool) = test_client();
    let alice = make_user(&pool, "alice");
    let bob = make_user(&pool, "bob");
    let blog = make_blog(&pool, &alice, "Post");
    let comment = make_comment(&pool, &blog, &bob, "original");
    login(&client, "bob");

    let edit = format!("/comments/{}/edit", comment.id);
    assert_eq!(client.get(edit.clone()).dispatch().status(), Status::Ok);
    let response = post_form(&client, &edit, "content=revised");
    assert_eq!(response.status(), Status::SeeOther);
    assert_eq!(location(&response), "/blog/post");
    assert_eq!(Comment::find_by_id(&pool, comment.id).unwrap().content, "revised");

    let response = client.post(format!("/comments/{}/delete", comment.id)).dispatch();
    assert_eq!(response.status(), Status::SeeOther);
    assert!(Comment::find_by_id(&pool, comment.id).is_none());
}

#[test]
fn missing_comment_is_not_found_before_ownership() {
    let (client, _pool) = test_client();
    assert_eq!(client.get("/comments/999/edit").dispatch().status(), Status::NotFound);
}

#[test]
fn signup_first_user_becomes_admin_and_is_logged_in() {
    let (client, pool) = test_client();
    let response = post_form(
        &client,
        "/accounts/signup",
        "username=founder&password=longenough&password_confirm=longenough",
    );
    assert_eq!(response.status(), Status::SeeOther);

    let founder = User::get_by_username(&pool, "founder").unwrap();
    assert!(founder.is_admin && founder.is_blogger);
    // Signed in straight away
    assert_eq!(client.get("/dashboard").dispatch().status(), Status::Ok);
}

#[test]
fn signup_validation_errors_rerender() {
    let (client, pool) = test_client();
    make_user(&pool, "taken");
    let response = post_form(
        &client,
        "/accounts/signup",
        "username=taken&password=short&password_confirm=other",
    );
    assert_eq!(response.status(), Status::Ok);
    let body = response.into_string().unwrap();
    assert!(body.contains("A user with that username already exists."));
    assert!(body.contains("This password is too short."));
    assert_eq!(count_users(&pool), 1);
}

#[test]
fn login_failure_rerenders_form() {
    let (client, pool) = test_client();
    make_user(&pool, "alice");
    let response = post_form(&client, "/accounts/login", "username=alice&password=wrong-password");
    assert_eq!(response.status(), Status::Ok);
    assert!(response
        .into_string()
        .unwrap()
        .contains("Please enter a correct username and password."));
    assert!(location_is_login(&client.get("/dashboard").dispatch()));
}

fn location_is_login(response: &LocalResponse<'_>) -> bool {
    response.status() == Status::SeeOther && location(response).starts_with("/accounts/login")
}

#[test]
fn login_honours_local_next_only() {
    let (client, pool) = test_client();
    make_user(&pool, "alice");

    let response = post_form(
        &client,
        "/accounts/login?next=/dashboard",
        &format!("username=alice&password={}", PASSWORD),
    );
    assert_eq!(location(&response), "/dashboard");

    let response = post_form(
        &client,
        "/accounts/login?next=https://evil.example",
        &format!("username=alice&password={}", PASSWORD),
    );
    assert_eq!(location(&response), "/");
}

#[test]
fn logout_ends_session() {
    let (client, pool) = test_client();
    make_user(&pool, "alice");
    login(&client, "alice");
    assert_eq!(client.get("/dashboard").dispatch().status(), Status::Ok);

    let response = client.post("/accounts/logout").dispatch();
    assert_eq!(response.status(), Status::SeeOther);
    assert_eq!(location(&response), "/");
    assert!(location_is_login(&client.get("/dashboard").dispatch()));
}

#[test]
fn admin_grants_and_revokes_blogger() {
    let (client, pool) = test_client();
    make_user(&pool, "admin");
    let bob = make_user(&pool, "bob");
    login(&client, "admin");

    let response = client.post("/users/bob/blogger").dispatch();
    assert_eq!(response.status(), Status::SeeOther);
    assert_eq!(location(&response), "/users/bob");
    let granted = User::get_by_id(&pool, bob.id).unwrap();
    assert!(granted.is_blogger);
    assert_eq!(granted.bio.as_deref(), Some("bob is a blogger."));

    client.post("/users/bob/blogger/revoke").dispatch();
    assert!(!User::get_by_id(&pool, bob.id).unwrap().is_blogger);
}

#[test]
fn non_admin_cannot_grant_blogger() {
    let (client, pool) = test_client();
    make_user(&pool, "admin");
    let bob = make_user(&pool, "bob");

    let response = client.post("/users/bob/blogger").dispatch();
    assert_eq!(response.status(), Status::SeeOther);

    login(&client, "bob");
    assert_eq!(client.post("/users/bob/blogger").dispatch().status(), Status::Forbidden);
    assert!(!User::get_by_id(&pool, bob.id).unwrap().is_blogger);
}

#[test]
fn profile_edits_own_bio() {
    let (client, pool) = test_client();
    let alice = make_user(&pool, "alice");

    assert!(location_is_login(&client.get("/accounts/profile").dispatch()));

    login(&client, "alice");
    let response = post_form(&client, "/accounts/profile", "bio=Writes+about+rust");
    assert_eq!(response.status(), Status::SeeOther);
    assert_eq!(location(&response), "/users/alice");
    assert_eq!(
        User::get_by_id(&pool, alice.id).unwrap().bio.as_deref(),
        Some("Writes about rust")
    );
}

#[test]
fn non_ascii_username_redirects_are_valid() {
    let (client, pool) = test_client();
    make_user(&pool, "admin");
    let jose = make_user(&pool, "josé");
    let profile = jose.url();
    assert!(profile.is_ascii(), "{}", profile);

    login(&client, "jos%C3%A9");
    let response = post_form(&client, "/accounts/profile", "bio=hola");
    assert_eq!(response.status(), Status::SeeOther);
    assert_eq!(location(&response), profile);
    assert_eq!(client.get(profile.clone()).dispatch().status(), Status::Ok);
    client.post("/accounts/logout").dispatch();

    login(&client, "admin");
    let response = client.post(format!("{}/blogger", profile)).dispatch();
    assert_eq!(response.status(), Status::SeeOther);
    assert_eq!(location(&response), profile);
    assert!(User::get_by_id(&pool, jose.id).unwrap().is_blogger);

    let response = client.post(format!("{}/blogger/revoke", profile)).dispatch();
    assert_eq!(response.status(), Status::SeeOther);
    assert_eq!(location(&response), profile);
}

#[test]
fn login_next_with_non_ascii_path_redirects() {
    let (client, pool) = test_client();
    make_user(&pool, "alice");
    let response = post_form(
        &client,
        "/accounts/login?next=%2Fusers%2Fjos%C3%A9",
        &format!("username=alice&password={}", PASSWORD),
    );
    assert_eq!(response.status(), Status::SeeOther);
    assert_eq!(location(&response), "/users/jos%C3%A9");
}

#[test]
fn private_pages_are_not_cached() {
    let (client, pool) = test_client();
    make_user(&pool, "alice");

    let response = client.get("/accounts/login").dispatch();
    assert_eq!(
        response.headers().get_one("Cache-Control"),
        Some("no-store, no-cache, must-revalidate, max-age=0")
    );
    let response = client.get("/blog").dispatch();
    assert!(response.headers().get_one("Cache-Control").is_none());
}

#[test]
fn session_cookie_is_ignored_when_tampered() {
    let (client, pool) = test_client();
    make_user(&pool, "alice");
    let response = client
        .get("/dashboard")
        .header(Header::new("Cookie", format!("{}=forged", auth::SESSION_COOKIE)))
        .dispatch();
    assert!(location_is_login(&response));
}
