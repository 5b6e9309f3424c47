use std::sync::Arc;

use rocket::form::Form;
use rocket::request::FlashMessage;
use rocket::response::{Flash, Redirect};
use rocket::State;
use rocket_dyn_templates::Template;
use serde_json::json;

use super::{base_context, flash_result, per_page, principal, Submitted};
use crate::forms::{self, FieldErrors};
use crate::models::blog::Blog;
use crate::models::user::User;
use crate::pagination::Page;
use crate::security::access::{require_blogger, require_owner, Rejection};
use crate::security::auth::AuthenticatedUser;
use crate::store::Store;

#[derive(FromForm)]
pub struct BlogFormData {
    #[field(default = String::new())]
    pub title: String,
    #[field(default = String::new())]
    pub content: String,
}

// ── Own blogs ──────────────────────────────────────────

#[get("/dashboard?<page>")]
pub fn dashboard(
    store: &State<Arc<dyn Store>>,
    user: Option<AuthenticatedUser>,
    flash: Option<FlashMessage<'_>>,
    page: Option<i64>,
) -> Result<Template, Rejection> {
    let s: &dyn Store = &**store.inner();
    let me = require_blogger(principal(&user), "/dashboard")?;

    let total = s.blog_count(Some(me.id));
    let page = Page::resolve(page, total, per_page(s, "dashboard_posts_per_page", 5))
        .ok_or(Rejection::NotFound)?;
    let blogs = s.blog_list(Some(me.id), page.limit(), page.offset());

    let mut context = base_context(s, Some(me), flash);
    context["page_title"] = json!("Dashboard");
    context["blogs"] = json!(blogs);
    context["page"] = json!(page);

    Ok(Template::render("dashboard/index", &context))
}

/// Create and update share one form template; `blog` is `None` when creating.
fn render_form(
    store: &dyn Store,
    user: &User,
    blog: Option<&Blog>,
    title: &str,
    content: &str,
    errors: &FieldErrors,
) -> Template {
    let mut context = base_context(store, Some(user), None);
    context["page_title"] = json!(if blog.is_some() { "Edit blog" } else { "New blog" });
    context["blog"] = json!(blog);
    context["title"] = json!(title);
    context["content"] = json!(content);
    context["errors"] = json!(errors);
    context["action"] = json!(match blog {
        Some(b) => format!("/dashboard/{}/update", b.slug),
        None => "/dashboard/new".to_string(),
    });
    Template::render("dashboard/form", &context)
}

// ── Create ─────────────────────────────────────────────

#[get("/dashboard/new")]
pub fn blog_new(
    store: &State<Arc<dyn Store>>,
    user: Option<AuthenticatedUser>,
) -> Result<Template, Rejection> {
    let s: &dyn Store = &**store.inner();
    let me = require_blogger(principal(&user), "/dashboard/new")?;
    Ok(render_form(s, me, None, "", "", &FieldErrors::new()))
}

#[post("/dashboard/new", data = "<form>")]
pub fn blog_create(
    store: &State<Arc<dyn Store>>,
    user: Option<AuthenticatedUser>,
    form: Form<BlogFormData>,
) -> Result<Submitted, Rejection> {
    let s: &dyn Store = &**store.inner();
    let me = require_blogger(principal(&user), "/dashboard/new")?;

    let cleaned = match forms::clean_blog(&form.title, &form.content) {
        Ok(c) => c,
        Err(errors) => {
            return Ok(Submitted::Invalid(render_form(
                s,
                me,
                None,
                &form.title,
                &form.content,
                &errors,
            )))
        }
    };

    let flash = match s.blog_create(me.id, &cleaned) {
        Ok(id) => {
            let target = s
                .blog_find_by_id(id)
                .map(|b| b.url())
                .unwrap_or_else(|| "/dashboard".to_string());
            log::info!("{} published '{}' (blog #{})", me.username, cleaned.title, id);
            Flash::success(Redirect::to(target), "Your blog was published.")
        }
        Err(e) => {
            log::error!("Failed to publish the blog: {}", e);
            Flash::error(Redirect::to("/dashboard"), "Could not publish the blog.")
        }
    };
    Ok(Submitted::Done(flash))
}

// ── Update ─────────────────────────────────────────────

fn owned_blog<'u>(
    store: &dyn Store,
    user: Option<&'u User>,
    slug: &str,
) -> Result<(Blog, &'u User), Rejection> {
    let blog = store.blog_find_by_slug(slug).ok_or(Rejection::NotFound)?;
    let me = require_owner(user, blog.blogger_id)?;
    Ok((blog, me))
}

#[get("/dashboard/<slug>/update")]
pub fn blog_edit(
    store: &State<Arc<dyn Store>>,
    user: Option<AuthenticatedUser>,
    slug: &str,
) -> Result<Template, Rejection> {
    let s: &dyn Store = &**store.inner();
    let (blog, me) = owned_blog(s, principal(&user), slug)?;
    Ok(render_form(
        s,
        me,
        Some(&blog),
        &blog.title,
        &blog.content,
        &FieldErrors::new(),
    ))
}

#[post("/dashboard/<slug>/update", data = "<form>")]
pub fn blog_update(
    store: &State<Arc<dyn Store>>,
    user: Option<AuthenticatedUser>,
    slug: &str,
    form: Form<BlogFormData>,
) -> Result<Submitted, Rejection> {
    let s: &dyn Store = &**store.inner();
    let (blog, me) = owned_blog(s, principal(&user), slug)?;

    match forms::clean_blog(&form.title, &form.content) {
        Ok(cleaned) => {
            let result = s.blog_update(blog.id, &cleaned);
            if result.is_ok() {
                log::info!("{} updated blog #{}", me.username, blog.id);
            }
            Ok(Submitted::Done(flash_result(
                result,
                "/dashboard".to_string(),
                "Your blog was updated.",
                "update the blog",
            )))
        }
        Err(errors) => Ok(Submitted::Invalid(render_form(
            s,
            me,
            Some(&blog),
            &form.title,
            &form.content,
            &errors,
        ))),
    }
}

// ── Delete ─────────────────────────────────────────────

#[post("/dashboard/<slug>/delete")]
pub fn blog_delete(
    store: &State<Arc<dyn Store>>,
    user: Option<AuthenticatedUser>,
    slug: &str,
) -> Result<Flash<Redirect>, Rejection> {
    let s: &dyn Store = &**store.inner();
    let (blog, me) = owned_blog(s, principal(&user), slug)?;

    let result = s.blog_delete(blog.id);
    if result.is_ok() {
        log::info!("{} deleted '{}' (blog #{})", me.username, blog, blog.id);
    }
    Ok(flash_result(
        result,
        "/dashboard".to_string(),
        "Your blog was deleted.",
        "delete the blog",
    ))
}
