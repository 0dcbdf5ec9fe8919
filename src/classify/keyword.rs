//! Leading-keyword classification.
//!
//! Only the first whitespace-delimited token is inspected; the rest of the
//! statement is never parsed.

use super::{CommandKind, StatementType};

/// Returns the recognized leading keyword of `sql`, if any.
pub fn leading_keyword(sql: &str) -> Option<StatementType> {
    let token = sql.split_whitespace().next()?;
    StatementType::parse(&token.to_ascii_uppercase())
}

/// Classifies a SQL statement by its leading keyword.
///
/// Unrecognized or empty input maps to [`CommandKind::Unsupported`]; this
/// function never fails.
pub fn classify_sql(sql: &str) -> CommandKind {
    leading_keyword(sql)
        .map(|stmt| stmt.kind())
        .unwrap_or(CommandKind::Unsupported)
}
