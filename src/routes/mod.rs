use rocket::request::FlashMessage;
use rocket::response::{Flash, Redirect};
use rocket_dyn_templates::Template;
use serde_json::json;

use crate::models::user::User;
use crate::security::auth::AuthenticatedUser;
use crate::store::Store;

pub mod accounts;
pub mod blog;
pub mod comments;
pub mod dashboard;
pub mod pages;
pub mod users;

/// Outcome of a form submission: redirect on success, re-render on
/// validation errors.
#[derive(Responder)]
pub enum Submitted {
    Done(Flash<Redirect>),
    Invalid(Template),
}

pub(crate) fn principal(user: &Option<AuthenticatedUser>) -> Option<&User> {
    user.as_ref().map(|u| &u.user)
}

/// Context shared by every page: settings, the logged-in user and any
/// pending flash message.
pub(crate) fn base_context(
    store: &dyn Store,
    user: Option<&User>,
    flash: Option<FlashMessage<'_>>,
) -> serde_json::Value {
    let mut context = json!({
        "settings": store.setting_all(),
        "current_user": user.map(User::safe_json),
        "errors": {},
    });

    if let Some(ref f) = flash {
        context["flash_kind"] = json!(f.kind());
        context["flash_msg"] = json!(f.message());
    }

    context
}

/// Page size setting, falling back to `default` when unset or invalid.
pub(crate) fn per_page(store: &dyn Store, key: &str, default: i64) -> i64 {
    store
        .setting_get(key)
        .and_then(|v| v.parse::<i64>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(default)
}

/// Flash after a mutation, logging storage failures.
pub(crate) fn flash_result(
    result: Result<(), String>,
    to: String,
    success: &str,
    what: &str,
) -> Flash<Redirect> {
    match result {
        Ok(()) => Flash::success(Redirect::to(to), success),
        Err(e) => {
            log::error!("Failed to {}: {}", what, e);
            Flash::error(Redirect::to(to), format!("Could not {}.", what))
        }
    }
}

pub fn routes() -> Vec<rocket::Route> {
    routes![
        pages::home,
        blog::blog_list,
        blog::blog_detail,
        comments::comment_create,
        comments::comment_edit,
        comments::comment_update,
        comments::comment_delete,
        dashboard::dashboard,
        dashboard::blog_new,
        dashboard::blog_create,
        dashboard::blog_edit,
        dashboard::blog_update,
        dashboard::blog_delete,
        users::bloggers_list,
        users::user_detail,
        users::grant_blogger,
        users::revoke_blogger,
        accounts::login_page,
        accounts::login_submit,
        accounts::signup_page,
        accounts::signup_submit,
        accounts::logout,
        accounts::profile_page,
        accounts::profile_submit,
    ]
}
