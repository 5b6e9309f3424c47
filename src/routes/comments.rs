use std::sync::Arc;

use rocket::form::Form;
use rocket::response::{Flash, Redirect};
use rocket::State;
use rocket_dyn_templates::Template;
use serde_json::json;

use super::blog::render_detail;
use super::{base_context, flash_result, principal, Submitted};
use crate::forms::{self, FieldErrors};
use crate::models::blog::Blog;
use crate::models::comment::Comment;
use crate::models::user::User;
use crate::security::access::{require_login, require_owner, Rejection};
use crate::security::auth::AuthenticatedUser;
use crate::store::Store;

#[derive(FromForm)]
pub struct CommentFormData {
    #[field(default = String::new())]
    pub content: String,
}

// ── Create ─────────────────────────────────────────────

#[post("/blog/<slug>/comments", data = "<form>")]
pub fn comment_create(
    store: &State<Arc<dyn Store>>,
    user: Option<AuthenticatedUser>,
    slug: &str,
    form: Form<CommentFormData>,
) -> Result<Submitted, Rejection> {
    let s: &dyn Store = &**store.inner();
    let blog = s.blog_find_by_slug(slug).ok_or(Rejection::NotFound)?;
    let me = require_login(principal(&user), &blog.url())?;

    let cleaned = match forms::clean_comment(&form.content) {
        Ok(c) => c,
        Err(errors) => {
            return Ok(Submitted::Invalid(render_detail(
                s,
                &blog,
                Some(me),
                None,
                &form.content,
                &errors,
            )))
        }
    };

    let result = s.comment_create(blog.id, me.id, &cleaned).map(|id| {
        log::info!("{} commented on '{}' (comment #{})", me.username, blog, id);
    });
    Ok(Submitted::Done(flash_result(
        result,
        blog.url(),
        "Your comment was posted.",
        "post the comment",
    )))
}

// ── Edit ───────────────────────────────────────────────

/// The comment, its blog and the owning principal, or why access is refused.
fn owned_comment<'u>(
    store: &dyn Store,
    user: Option<&'u User>,
    id: i64,
) -> Result<(Comment, Blog, &'u User), Rejection> {
    let comment = store.comment_find_by_id(id).ok_or(Rejection::NotFound)?;
    let me = require_owner(user, comment.user_id)?;
    let blog = store
        .blog_find_by_id(comment.blog_id)
        .ok_or(Rejection::NotFound)?;
    Ok((comment, blog, me))
}

fn render_edit(
    store: &dyn Store,
    user: &User,
    comment: &Comment,
    blog: &Blog,
    draft: &str,
    errors: &FieldErrors,
) -> Template {
    let mut context = base_context(store, Some(user), None);
    context["page_title"] = json!("Edit comment");
    context["comment"] = json!(comment);
    context["blog"] = json!(blog);
    context["content"] = json!(draft);
    context["errors"] = json!(errors);
    Template::render("comments/edit", &context)
}

#[get("/comments/<id>/edit")]
pub fn comment_edit(
    store: &State<Arc<dyn Store>>,
    user: Option<AuthenticatedUser>,
    id: i64,
) -> Result<Template, Rejection> {
    let s: &dyn Store = &**store.inner();
    let (comment, blog, me) = owned_comment(s, principal(&user), id)?;
    Ok(render_edit(
        s,
        me,
        &comment,
        &blog,
        &comment.content,
        &FieldErrors::new(),
    ))
}

#[post("/comments/<id>/edit", data = "<form>")]
pub fn comment_update(
    store: &State<Arc<dyn Store>>,
    user: Option<AuthenticatedUser>,
    id: i64,
    form: Form<CommentFormData>,
) -> Result<Submitted, Rejection> {
    let s: &dyn Store = &**store.inner();
    let (comment, blog, me) = owned_comment(s, principal(&user), id)?;

    match forms::clean_comment(&form.content) {
        Ok(cleaned) => {
            let result = s.comment_update(comment.id, &cleaned);
            if result.is_ok() {
                log::info!("{} edited comment #{}", me.username, comment.id);
            }
            Ok(Submitted::Done(flash_result(
                result,
                blog.url(),
                "Your comment was updated.",
                "update the comment",
            )))
        }
        Err(errors) => Ok(Submitted::Invalid(render_edit(
            s,
            me,
            &comment,
            &blog,
            &form.content,
            &errors,
        ))),
    }
}

// ── Delete ─────────────────────────────────────────────

#[post("/comments/<id>/delete")]
pub fn comment_delete(
    store: &State<Arc<dyn Store>>,
    user: Option<AuthenticatedUser>,
    id: i64,
) -> Result<Flash<Redirect>, Rejection> {
    let s: &dyn Store = &**store.inner();
    let (comment, blog, me) = owned_comment(s, principal(&user), id)?;

    let result = s.comment_delete(comment.id);
    if result.is_ok() {
        log::info!("{} deleted comment #{}", me.username, comment.id);
    }
    Ok(flash_result(
        result,
        blog.url(),
        "Your comment was deleted.",
        "delete the comment",
    ))
}
