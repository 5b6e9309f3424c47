use chrono::{Duration, Utc};
use rocket::http::{Cookie, CookieJar, SameSite, Status};
use rocket::request::{FromRequest, Outcome, Request};
use rocket::State;
use sha2::{Digest, Sha256};
use std::sync::Arc;

use crate::models::user::User;
use crate::store::Store;

pub const SESSION_COOKIE: &str = "diyblog_session";

// ── Authenticated user guard ──

/// Guard: any user with a valid session. Take it as
/// `Option<AuthenticatedUser>` to let anonymous requests through.
pub struct AuthenticatedUser {
    pub user: User,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthenticatedUser {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match resolve_session_user(request).await {
            Some(user) => Outcome::Success(AuthenticatedUser { user }),
            None => Outcome::Forward(Status::Unauthorized),
        }
    }
}

async fn resolve_session_user(request: &Request<'_>) -> Option<User> {
    let store = request
        .guard::<&State<Arc<dyn Store>>>()
        .await
        .succeeded()?;
    let cookies = request.cookies();
    let token = cookies.get_private(SESSION_COOKIE)?.value().to_string();

    match store.session_get_user(&hash_token(&token)) {
        Some(user) => Some(user),
        None => {
            cookies.remove_private(Cookie::from(SESSION_COOKIE));
            None
        }
    }
}

// ── Password utilities ──

#[cfg(not(test))]
const PASSWORD_COST: u32 = bcrypt::DEFAULT_COST;
#[cfg(test)]
const PASSWORD_COST: u32 = 4;

pub fn hash_password(password: &str) -> Result<String, String> {
    bcrypt::hash(password, PASSWORD_COST).map_err(|e| e.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

// ── Session management ──

pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Create a session for `user_id` and return the raw cookie token.
pub fn create_session(store: &dyn Store, user_id: i64) -> Result<String, String> {
    let expiry_hours = store.setting_get_i64("session_expiry_hours").max(1);
    let token = uuid::Uuid::new_v4().to_string();
    let expires = Utc::now().naive_utc() + Duration::hours(expiry_hours);
    let expires_str = expires.format("%Y-%m-%d %H:%M:%S").to_string();

    store.session_create(user_id, &hash_token(&token), &expires_str)?;

    Ok(token)
}

pub fn destroy_session(store: &dyn Store, token: &str) -> Result<(), String> {
    store.session_delete(&hash_token(token))
}

/// Log `user` in: persist a fresh session and set the private cookie.
pub fn login(store: &dyn Store, cookies: &CookieJar<'_>, user: &User) -> Result<(), String> {
    let purged = store.session_cleanup_expired();
    if purged > 0 {
        log::debug!("Purged {} expired sessions", purged);
    }
    let token = create_session(store, user.id)?;
    set_session_cookie(cookies, &token);
    Ok(())
}

pub fn set_session_cookie(cookies: &CookieJar<'_>, token: &str) {
    let mut cookie = Cookie::new(SESSION_COOKIE, token.to_string());
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Strict);
    cookie.set_path("/");
    cookies.add_private(cookie);
}

pub fn clear_session_cookie(cookies: &CookieJar<'_>) {
    cookies.remove_private(Cookie::from(SESSION_COOKIE));
}

/// Only same-site absolute paths are honoured as post-login targets. The
/// result is always a valid redirect URI: bytes outside the path and query
/// character set are percent-encoded, existing escapes are kept.
pub fn safe_next(next: Option<&str>) -> String {
    match next {
        Some(n) if n.starts_with('/') && !n.starts_with("//") && !n.contains('\\') => {
            encode_target(n)
        }
        _ => "/".to_string(),
    }
}

fn encode_target(target: &str) -> String {
    let bytes = target.as_bytes();
    let mut out = String::with_capacity(bytes.len());
    for (i, &b) in bytes.iter().enumerate() {
        let escape = b == b'%'
            && bytes.len() > i + 2
            && bytes[i + 1].is_ascii_hexdigit()
            && bytes[i + 2].is_ascii_hexdigit();
        if escape || b.is_ascii_alphanumeric() || b"-._~!$&'()*+,;=:@/?".contains(&b) {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{:02X}", b));
        }
    }
    out
}
