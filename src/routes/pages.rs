use std::sync::Arc;

use rocket::request::FlashMessage;
use rocket::State;
use rocket_dyn_templates::Template;
use serde_json::json;

use super::{base_context, per_page, principal};
use crate::security::auth::AuthenticatedUser;
use crate::store::Store;

// ── Home ───────────────────────────────────────────────

#[get("/")]
pub fn home(
    store: &State<Arc<dyn Store>>,
    user: Option<AuthenticatedUser>,
    flash: Option<FlashMessage<'_>>,
) -> Template {
    let s: &dyn Store = &**store.inner();
    let latest = s.blog_list(None, per_page(s, "blog_posts_per_page", 5), 0);

    let mut context = base_context(s, principal(&user), flash);
    context["page_title"] = json!("Home");
    context["latest"] = json!(latest);
    context["blog_count"] = json!(s.blog_count(None));
    context["blogger_count"] = json!(s.user_count_bloggers());

    Template::render("pages/index", &context)
}
