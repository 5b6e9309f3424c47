//! Form validation.
//!
//! Raw form fields come in as strings; each `clean_*` function trims them,
//! applies the length and format rules, and either returns the cleaned
//! model input or a [`FieldErrors`] map that templates render next to the
//! offending fields. Lengths are counted in characters, not bytes.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::blog::BlogForm;
use crate::models::comment::CommentForm;

pub const REQUIRED: &str = "This field is required.";

pub const COMMENT_MAX_CHARS: usize = 1024;
pub const BLOG_CONTENT_MAX_CHARS: usize = 3000;
pub const BLOG_TITLE_MAX_CHARS: usize = 64;
pub const USERNAME_MAX_CHARS: usize = 150;
pub const PASSWORD_MIN_CHARS: usize = 8;
pub const BIO_MAX_CHARS: usize = 1024;

/// Validation messages keyed by form field name.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[cfg(test)]
    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    fn finish<T>(self, cleaned: T) -> Result<T, FieldErrors> {
        if self.is_empty() {
            Ok(cleaned)
        } else {
            Err(self)
        }
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Trim and require a value; records the error and returns `None` when blank.
fn required<'a>(errors: &mut FieldErrors, field: &str, raw: &'a str) -> Option<&'a str> {
    let value = raw.trim();
    if value.is_empty() {
        errors.add(field, REQUIRED);
        None
    } else {
        Some(value)
    }
}

fn at_most(n: usize, has: usize) -> String {
    format!(
        "Ensure this value has at most {} characters (it has {}).",
        n, has
    )
}

pub fn clean_comment(content: &str) -> Result<CommentForm, FieldErrors> {
    let mut errors = FieldErrors::new();
    let content = required(&mut errors, "content", content).unwrap_or_default();
    if char_len(content) > COMMENT_MAX_CHARS {
        errors.add("content", "The comment is too long.");
    }
    errors.finish(CommentForm {
        content: content.to_string(),
    })
}

pub fn clean_blog(title: &str, content: &str) -> Result<BlogForm, FieldErrors> {
    let mut errors = FieldErrors::new();

    let title = required(&mut errors, "title", title).unwrap_or_default();
    let title_len = char_len(title);
    if title_len > BLOG_TITLE_MAX_CHARS {
        errors.add("title", at_most(BLOG_TITLE_MAX_CHARS, title_len));
    }

    let content = required(&mut errors, "content", content).unwrap_or_default();
    if char_len(content) > BLOG_CONTENT_MAX_CHARS {
        errors.add("content", "The field is too long.");
    }

    errors.finish(BlogForm {
        title: title.to_string(),
        content: content.to_string(),
    })
}

/// Returns the cleaned username. `is_taken` is consulted only for
/// usernames that are otherwise valid.
pub fn clean_signup(
    username: &str,
    password: &str,
    password_confirm: &str,
    is_taken: impl Fn(&str) -> bool,
) -> Result<String, FieldErrors> {
    let mut errors = FieldErrors::new();

    if let Some(name) = required(&mut errors, "username", username) {
        let len = char_len(name);
        if len > USERNAME_MAX_CHARS {
            errors.add("username", at_most(USERNAME_MAX_CHARS, len));
        } else if !name
            .chars()
            .all(|c| c.is_alphanumeric() || "@.+-_".contains(c))
        {
            errors.add(
                "username",
                "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
            );
        } else if is_taken(name) {
            errors.add("username", "A user with that username already exists.");
        }
    }

    // Passwords are not trimmed
    if password.is_empty() {
        errors.add("password", REQUIRED);
    } else if char_len(password) < PASSWORD_MIN_CHARS {
        errors.add(
            "password",
            format!(
                "This password is too short. It must contain at least {} characters.",
                PASSWORD_MIN_CHARS
            ),
        );
    }
    if password_confirm != password {
        errors.add("password_confirm", "The two password fields didn't match.");
    }

    errors.finish(username.trim().to_string())
}

/// A blank bio clears it.
pub fn clean_bio(bio: &str) -> Result<Option<String>, FieldErrors> {
    let mut errors = FieldErrors::new();
    let bio = bio.trim();
    let len = char_len(bio);
    if len > BIO_MAX_CHARS {
        errors.add("bio", at_most(BIO_MAX_CHARS, len));
    }
    errors.finish((!bio.is_empty()).then(|| bio.to_string()))
}
