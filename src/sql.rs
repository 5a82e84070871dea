//! SQL detection for free-text search input.
//!
//! This is a prefix heuristic, not a parser: any text starting with one of
//! the statement keywords is routed to the SQL path, including names such as
//! `select_something`.

/// Statement keywords that mark search text as SQL.
const SQL_KEYWORDS: [&str; 6] = ["select", "with", "insert", "update", "delete", "merge"];

/// Explicit prefix that forces search text onto the SQL path.
pub const SQL_PREFIX: &str = "sql:";

/// Maximum number of characters shown in a SQL preview.
pub const PREVIEW_CHARS: usize = 60;

/// Returns true if the search text should be treated as SQL.
pub fn is_sql(text: &str) -> bool {
    let stripped = text.trim_start().to_lowercase();
    stripped.starts_with(SQL_PREFIX) || SQL_KEYWORDS.iter().any(|kw| stripped.starts_with(kw))
}

/// Strips an optional `sql:` prefix (any case) and surrounding whitespace.
pub fn normalize_sql(text: &str) -> String {
    let trimmed = text.trim();
    match trimmed.get(..SQL_PREFIX.len()) {
        Some(head) if head.eq_ignore_ascii_case(SQL_PREFIX) => {
            trimmed[SQL_PREFIX.len()..].trim().to_string()
        }
        _ => trimmed.to_string(),
    }
}

/// Truncates `sql` to [`PREVIEW_CHARS`] characters, adding an ellipsis when cut.
pub fn preview(sql: &str) -> String {
    if sql.chars().count() > PREVIEW_CHARS {
        let mut short: String = sql.chars().take(PREVIEW_CHARS).collect();
        short.push('…');
        short
    } else {
        sql.to_string()
    }
}
