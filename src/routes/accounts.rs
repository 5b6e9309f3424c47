use std::sync::Arc;

use rocket::form::Form;
use rocket::http::{CookieJar, RawStr};
use rocket::request::FlashMessage;
use rocket::response::{Flash, Redirect};
use rocket::State;
use rocket_dyn_templates::Template;
use serde_json::json;

use super::{base_context, flash_result, principal, Submitted};
use crate::forms::{self, FieldErrors};
use crate::models::user::User;
use crate::security::access::{require_login, Rejection};
use crate::security::auth::{self, AuthenticatedUser, SESSION_COOKIE};
use crate::store::Store;

#[derive(Debug, FromForm)]
pub struct LoginForm {
    #[field(default = String::new())]
    pub username: String,
    #[field(default = String::new())]
    pub password: String,
}

#[derive(Debug, FromForm)]
pub struct SignupForm {
    #[field(default = String::new())]
    pub username: String,
    #[field(default = String::new())]
    pub password: String,
    #[field(default = String::new())]
    pub password_confirm: String,
}

#[derive(Debug, FromForm)]
pub struct ProfileForm {
    #[field(default = String::new())]
    pub bio: String,
}

// ── Login ──────────────────────────────────────────────

fn render_login(
    store: &dyn Store,
    flash: Option<FlashMessage<'_>>,
    next: &str,
    username: &str,
    error: Option<&str>,
) -> Template {
    let mut context = base_context(store, None, flash);
    context["page_title"] = json!("Log In");
    context["next"] = json!(next);
    context["action"] = json!(format!(
        "/accounts/login?next={}",
        RawStr::new(next).percent_encode()
    ));
    context["username"] = json!(username);
    context["error"] = json!(error);
    Template::render("accounts/login", &context)
}

#[get("/accounts/login?<next>")]
pub fn login_page(
    store: &State<Arc<dyn Store>>,
    flash: Option<FlashMessage<'_>>,
    next: Option<&str>,
) -> Template {
    render_login(&**store.inner(), flash, &auth::safe_next(next), "", None)
}

#[post("/accounts/login?<next>", data = "<form>")]
pub fn login_submit(
    store: &State<Arc<dyn Store>>,
    cookies: &CookieJar<'_>,
    next: Option<&str>,
    form: Form<LoginForm>,
) -> Submitted {
    let s: &dyn Store = &**store.inner();
    let next = auth::safe_next(next);
    let username = form.username.trim();

    let user = s
        .user_get_by_username(username)
        .filter(|u| auth::verify_password(&form.password, &u.password_hash));

    let Some(user) = user else {
        log::warn!("Failed login attempt for '{}'", username);
        return Submitted::Invalid(render_login(
            s,
            None,
            &next,
            username,
            Some("Please enter a correct username and password."),
        ));
    };

    match auth::login(s, cookies, &user) {
        Ok(()) => {
            log::info!("{} logged in", user.username);
            Submitted::Done(Flash::success(
                Redirect::to(next),
                format!("Welcome back, {}.", user.username),
            ))
        }
        Err(e) => {
            log::error!("Failed to create session for {}: {}", user.username, e);
            Submitted::Invalid(render_login(
                s,
                None,
                &next,
                username,
                Some("Could not log you in. Please try again."),
            ))
        }
    }
}

#[post("/accounts/logout")]
pub fn logout(store: &State<Arc<dyn Store>>, cookies: &CookieJar<'_>) -> Flash<Redirect> {
    if let Some(cookie) = cookies.get_private(SESSION_COOKIE) {
        if let Err(e) = auth::destroy_session(&**store.inner(), cookie.value()) {
            log::error!("Failed to destroy session: {}", e);
        }
    }
    auth::clear_session_cookie(cookies);
    Flash::success(Redirect::to("/"), "You have been logged out.")
}

// ── Signup ─────────────────────────────────────────────

fn render_signup(store: &dyn Store, username: &str, errors: &FieldErrors) -> Template {
    let mut context = base_context(store, None, None);
    context["page_title"] = json!("Sign Up");
    context["username"] = json!(username);
    context["errors"] = json!(errors);
    Template::render("accounts/signup", &context)
}

#[get("/accounts/signup")]
pub fn signup_page(store: &State<Arc<dyn Store>>) -> Template {
    render_signup(&**store.inner(), "", &FieldErrors::new())
}

#[post("/accounts/signup", data = "<form>")]
pub fn signup_submit(
    store: &State<Arc<dyn Store>>,
    cookies: &CookieJar<'_>,
    form: Form<SignupForm>,
) -> Submitted {
    let s: &dyn Store = &**store.inner();

    let username = match forms::clean_signup(
        &form.username,
        &form.password,
        &form.password_confirm,
        |name| s.user_get_by_username(name).is_some(),
    ) {
        Ok(name) => name,
        Err(errors) => return Submitted::Invalid(render_signup(s, &form.username, &errors)),
    };

    let created = auth::hash_password(&form.password)
        .and_then(|hash| s.user_create(&username, &hash))
        .and_then(|id| {
            s.user_get_by_id(id)
                .ok_or_else(|| "User vanished after insert".to_string())
        });
    let user = match created {
        Ok(user) => user,
        Err(e) => {
            log::error!("Failed to create account '{}': {}", username, e);
            let mut errors = FieldErrors::new();
            errors.add("username", "Could not create the account. Please try again.");
            return Submitted::Invalid(render_signup(s, &username, &errors));
        }
    };

    log::info!(
        "New account {} (blogger: {}, admin: {})",
        user.username,
        user.is_blogger,
        user.is_admin
    );
    if let Err(e) = auth::login(s, cookies, &user) {
        log::error!("Failed to log in new account {}: {}", user.username, e);
        return Submitted::Done(Flash::success(
            Redirect::to("/accounts/login"),
            "Your account was created. Please log in.",
        ));
    }
    Submitted::Done(Flash::success(
        Redirect::to("/"),
        format!("Welcome, {}.", user.username),
    ))
}

// ── Profile ────────────────────────────────────────────

fn render_profile(
    store: &dyn Store,
    user: &User,
    flash: Option<FlashMessage<'_>>,
    bio: &str,
    errors: &FieldErrors,
) -> Template {
    let mut context = base_context(store, Some(user), flash);
    context["page_title"] = json!("Your profile");
    context["bio"] = json!(bio);
    context["errors"] = json!(errors);
    Template::render("accounts/profile", &context)
}

#[get("/accounts/profile")]
pub fn profile_page(
    store: &State<Arc<dyn Store>>,
    user: Option<AuthenticatedUser>,
    flash: Option<FlashMessage<'_>>,
) -> Result<Template, Rejection> {
    let me = require_login(principal(&user), "/accounts/profile")?;
    let bio = me.bio.clone().unwrap_or_default();
    Ok(render_profile(
        &**store.inner(),
        me,
        flash,
        &bio,
        &FieldErrors::new(),
    ))
}

#[post("/accounts/profile", data = "<form>")]
pub fn profile_submit(
    store: &State<Arc<dyn Store>>,
    user: Option<AuthenticatedUser>,
    form: Form<ProfileForm>,
) -> Result<Submitted, Rejection> {
    let s: &dyn Store = &**store.inner();
    let me = require_login(principal(&user), "/accounts/profile")?;

    match forms::clean_bio(&form.bio) {
        Ok(bio) => {
            let result = s.user_update_bio(me.id, bio.as_deref());
            if result.is_ok() {
                log::info!("{} updated their bio", me.username);
            }
            Ok(Submitted::Done(flash_result(
                result,
                me.url(),
                "Your profile was updated.",
                "update the profile",
            )))
        }
        Err(errors) => Ok(Submitted::Invalid(render_profile(
            s, me, None, &form.bio, &errors,
        ))),
    }
}
