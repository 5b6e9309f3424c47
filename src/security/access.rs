//! Request authorization.
//!
//! Two tiers: capabilities are global flags on the account (`is_blogger`,
//! `is_admin`) and gate creation; ownership compares the principal with the
//! owner id stored on a blog or comment and gates update and delete.
//!
//! Capability failures distinguish anonymous principals (sent to the login
//! page) from authenticated ones (forbidden). Ownership failures are always
//! forbidden, whether or not anyone is logged in.

use rocket::http::Status;
use rocket::request::Request;
use rocket::response::{self, Redirect, Responder};

use crate::models::user::User;

/// Why a request was not served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    NotFound,
    Forbidden,
    /// Anonymous principal; `next` is the path to return to after login.
    LoginRequired { next: String },
}

impl<'r> Responder<'r, 'static> for Rejection {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        match self {
            Rejection::NotFound => Err(Status::NotFound),
            Rejection::Forbidden => Err(Status::Forbidden),
            Rejection::LoginRequired { next } => {
                let target = format!(
                    "/accounts/login?next={}",
                    rocket::http::RawStr::new(&next).percent_encode()
                );
                Redirect::to(target).respond_to(req)
            }
        }
    }
}

fn login_required(next: &str) -> Rejection {
    Rejection::LoginRequired {
        next: next.to_string(),
    }
}

/// Any logged-in user.
pub fn require_login<'u>(principal: Option<&'u User>, next: &str) -> Result<&'u User, Rejection> {
    principal.ok_or_else(|| login_required(next))
}

/// Users holding the global blogger permission.
pub fn require_blogger<'u>(
    principal: Option<&'u User>,
    next: &str,
) -> Result<&'u User, Rejection> {
    let user = require_login(principal, next)?;
    if user.is_blogger {
        Ok(user)
    } else {
        log::warn!("User {} lacks the blogger permission for {}", user.username, next);
        Err(Rejection::Forbidden)
    }
}

pub fn require_admin<'u>(principal: Option<&'u User>, next: &str) -> Result<&'u User, Rejection> {
    let user = require_login(principal, next)?;
    if user.is_admin {
        Ok(user)
    } else {
        log::warn!("User {} is not an admin ({})", user.username, next);
        Err(Rejection::Forbidden)
    }
}

/// The principal must be the resource owner.
pub fn require_owner(principal: Option<&User>, owner_id: i64) -> Result<&User, Rejection> {
    match principal {
        Some(user) if user.id == owner_id => Ok(user),
        Some(user) => {
            log::warn!(
                "User {} denied access to a resource owned by user #{}",
                user.username,
                owner_id
            );
            Err(Rejection::Forbidden)
        }
        None => Err(Rejection::Forbidden),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn user(id: i64, is_blogger: bool, is_admin: bool) -> User {
        User {
            id,
            username: format!("user{}", id),
            password_hash: String::new(),
            bio: None,
            is_blogger,
            is_admin,
            created_at: NaiveDateTime::default(),
        }
    }

    #[test]
    fn owner_passes_ownership_check() {
        let owner = user(1, true, false);
        assert_eq!(require_owner(Some(&owner), 1).unwrap().id, 1);
    }

    #[test]
    fn other_user_is_forbidden() {
        let other = user(2, true, true);
        assert_eq!(require_owner(Some(&other), 1), Err(Rejection::Forbidden));
    }

    #[test]
    fn anonymous_is_forbidden_not_redirected_for_ownership() {
        assert_eq!(require_owner(None, 1), Err(Rejection::Forbidden));
    }

    #[test]
    fn anonymous_author_is_sent_to_login() {
        assert_eq!(
            require_blogger(None, "/dashboard/new").unwrap_err(),
            Rejection::LoginRequired {
                next: "/dashboard/new".to_string()
            }
        );
    }

    #[test]
    fn non_blogger_cannot_author() {
        let reader = user(3, false, false);
        assert_eq!(
            require_blogger(Some(&reader), "/dashboard/new").unwrap_err(),
            Rejection::Forbidden
        );
        let blogger = user(4, true, false);
        assert!(require_blogger(Some(&blogger), "/dashboard/new").is_ok());
    }

    #[test]
    fn blogger_flag_does_not_grant_ownership() {
        let blogger = user(4, true, false);
        assert_eq!(require_owner(Some(&blogger), 5), Err(Rejection::Forbidden));
    }

    #[test]
    fn admin_check() {
        assert!(require_admin(Some(&user(1, true, true)), "/users").is_ok());
        assert_eq!(
            require_admin(Some(&user(2, true, false)), "/users").unwrap_err(),
            Rejection::Forbidden
        );
        assert!(matches!(
            require_admin(None, "/users"),
            Err(Rejection::LoginRequired { .. })
        ));
    }
}
