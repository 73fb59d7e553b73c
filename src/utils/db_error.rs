//! Database error classification helpers.

/// Name of the unique constraint on `short_links.code`.
pub const SHORT_LINKS_CODE_KEY: &str = "short_links_code_key";

/// Returns true if `e` is a unique violation of the short code constraint.
pub fn is_unique_violation_on_code(e: &sqlx::Error) -> bool {
    let Some(db_err) = e.as_database_error() else {
        return false;
    };

    if !db_err.is_unique_violation() {
        return false;
    }

    matches!(db_err.constraint(), Some(SHORT_LINKS_CODE_KEY))
}
