use std::sync::Arc;

use rocket::request::FlashMessage;
use rocket::State;
use rocket_dyn_templates::Template;
use serde_json::json;

use super::{base_context, per_page, principal};
use crate::forms::FieldErrors;
use crate::models::blog::Blog;
use crate::models::user::User;
use crate::pagination::Page;
use crate::security::access::Rejection;
use crate::security::auth::AuthenticatedUser;
use crate::store::Store;

// ── Listing ────────────────────────────────────────────

#[get("/blog?<page>")]
pub fn blog_list(
    store: &State<Arc<dyn Store>>,
    user: Option<AuthenticatedUser>,
    flash: Option<FlashMessage<'_>>,
    page: Option<i64>,
) -> Result<Template, Rejection> {
    let s: &dyn Store = &**store.inner();
    let total = s.blog_count(None);
    let page = Page::resolve(page, total, per_page(s, "blog_posts_per_page", 5))
        .ok_or(Rejection::NotFound)?;
    let blogs = s.blog_list(None, page.limit(), page.offset());

    let mut context = base_context(s, principal(&user), flash);
    context["page_title"] = json!("Blog");
    context["blogs"] = json!(blogs);
    context["page"] = json!(page);

    Ok(Template::render("blog/index", &context))
}

// ── Detail ─────────────────────────────────────────────

#[get("/blog/<slug>")]
pub fn blog_detail(
    store: &State<Arc<dyn Store>>,
    user: Option<AuthenticatedUser>,
    flash: Option<FlashMessage<'_>>,
    slug: &str,
) -> Result<Template, Rejection> {
    let s: &dyn Store = &**store.inner();
    let blog = s.blog_find_by_slug(slug).ok_or(Rejection::NotFound)?;
    Ok(render_detail(
        s,
        &blog,
        principal(&user),
        flash,
        "",
        &FieldErrors::new(),
    ))
}

/// Blog page with its comments; also used to redisplay a rejected comment.
pub(crate) fn render_detail(
    store: &dyn Store,
    blog: &Blog,
    user: Option<&User>,
    flash: Option<FlashMessage<'_>>,
    comment_draft: &str,
    errors: &FieldErrors,
) -> Template {
    let comments = store.comment_for_blog(blog.id);
    let is_owner = user.map(|u| u.id == blog.blogger_id).unwrap_or(false);

    let mut context = base_context(store, user, flash);
    context["page_title"] = json!(blog.to_string());
    context["blog"] = json!(blog);
    context["comments"] = json!(comments);
    context["comment_count"] = json!(store.comment_count_for_blog(blog.id));
    context["is_owner"] = json!(is_owner);
    context["comment_draft"] = json!(comment_draft);
    context["errors"] = json!(errors);

    Template::render("blog/detail", &context)
}
