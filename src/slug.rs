//! URL slugs for blog titles.

/// Used when a title has no characters that survive slugification.
const FALLBACK_SLUG: &str = "untitled";

/// Derive the look-up slug for a blog title.
///
/// Lowercases, transliterates to ASCII and collapses every run of
/// whitespace or punctuation into a single hyphen. Uniqueness is not
/// guaranteed: two blogs with the same title share a slug.
pub fn slugify_title(title: &str) -> String {
    let slug = ::slug::slugify(title);
    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}
