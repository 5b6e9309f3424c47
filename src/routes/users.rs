use std::sync::Arc;

use rocket::request::FlashMessage;
use rocket::response::{Flash, Redirect};
use rocket::State;
use rocket_dyn_templates::Template;
use serde_json::json;

use super::{base_context, flash_result, per_page, principal};
use crate::pagination::Page;
use crate::security::access::{require_admin, Rejection};
use crate::security::auth::AuthenticatedUser;
use crate::store::Store;

// ── Blogger directory ──────────────────────────────────

#[get("/users?<page>")]
pub fn bloggers_list(
    store: &State<Arc<dyn Store>>,
    user: Option<AuthenticatedUser>,
    flash: Option<FlashMessage<'_>>,
    page: Option<i64>,
) -> Result<Template, Rejection> {
    let s: &dyn Store = &**store.inner();
    let total = s.user_count_bloggers();
    let page = Page::resolve(page, total, per_page(s, "bloggers_per_page", 10))
        .ok_or(Rejection::NotFound)?;
    let bloggers: Vec<_> = s
        .user_list_bloggers(page.limit(), page.offset())
        .iter()
        .map(|u| u.safe_json())
        .collect();

    let mut context = base_context(s, principal(&user), flash);
    context["page_title"] = json!("All Bloggers");
    context["bloggers"] = json!(bloggers);
    context["page"] = json!(page);

    Ok(Template::render("users/index", &context))
}

#[get("/users/<username>?<page>")]
pub fn user_detail(
    store: &State<Arc<dyn Store>>,
    user: Option<AuthenticatedUser>,
    flash: Option<FlashMessage<'_>>,
    username: &str,
    page: Option<i64>,
) -> Result<Template, Rejection> {
    let s: &dyn Store = &**store.inner();
    let profile = s.user_get_by_username(username).ok_or(Rejection::NotFound)?;

    let total = s.blog_count(Some(profile.id));
    let page = Page::resolve(page, total, per_page(s, "blog_posts_per_page", 5))
        .ok_or(Rejection::NotFound)?;
    let blogs = s.blog_list(Some(profile.id), page.limit(), page.offset());

    let viewer = principal(&user);
    let mut context = base_context(s, viewer, flash);
    context["page_title"] = json!(profile.username);
    context["profile"] = profile.safe_json();
    context["blogs"] = json!(blogs);
    context["page"] = json!(page);
    context["can_manage"] = json!(viewer.map(|u| u.is_admin).unwrap_or(false));

    Ok(Template::render("users/detail", &context))
}

// ── Blogger permission ─────────────────────────────────

fn set_blogger(
    store: &dyn Store,
    user: Option<AuthenticatedUser>,
    username: &str,
    is_blogger: bool,
) -> Result<Flash<Redirect>, Rejection> {
    let admin = require_admin(principal(&user), &format!("/users/{}", username))?;
    let subject = store
        .user_get_by_username(username)
        .ok_or(Rejection::NotFound)?;

    let result = store.user_set_blogger(subject.id, is_blogger);
    if result.is_ok() {
        log::info!(
            "{} {} the blogger permission for {}",
            admin.username,
            if is_blogger { "granted" } else { "revoked" },
            subject.username
        );
    }
    let (success, what) = if is_blogger {
        (
            format!("{} is now a blogger.", subject.username),
            "grant the blogger permission",
        )
    } else {
        (
            format!("{} is no longer a blogger.", subject.username),
            "revoke the blogger permission",
        )
    };
    Ok(flash_result(result, subject.url(), &success, what))
}

#[post("/users/<username>/blogger")]
pub fn grant_blogger(
    store: &State<Arc<dyn Store>>,
    user: Option<AuthenticatedUser>,
    username: &str,
) -> Result<Flash<Redirect>, Rejection> {
    set_blogger(&**store.inner(), user, username, true)
}

#[post("/users/<username>/blogger/revoke")]
pub fn revoke_blogger(
    store: &State<Arc<dyn Store>>,
    user: Option<AuthenticatedUser>,
    username: &str,
) -> Result<Flash<Redirect>, Rejection> {
    set_blogger(&**store.inner(), user, username, false)
}
