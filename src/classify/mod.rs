//! Statement classification module.
//!
//! Looks at the leading keyword of a SQL statement and decides whether it
//! mutates data, reads data, or is not supported by the executor.

mod keyword;

pub use keyword::{classify_sql, leading_keyword};

use std::fmt;

/// How the executor should run a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// Executed without a result cursor (UPDATE, CREATE, INSERT, DELETE, DROP).
    Mutating,
    /// Executed as a query whose rows are decoded (SELECT).
    Reading,
    /// Anything else; never sent to the connection.
    Unsupported,
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mutating => write!(f, "Mutating"),
            Self::Reading => write!(f, "Reading"),
            Self::Unsupported => write!(f, "Unsupported"),
        }
    }
}

/// The recognized leading keyword of a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementType {
    Select,
    Insert,
    Update,
    Delete,
    Create,
    Drop,
}

impl StatementType {
    /// Parses an already uppercased keyword.
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "SELECT" => Some(Self::Select),
            "INSERT" => Some(Self::Insert),
            "UPDATE" => Some(Self::Update),
            "DELETE" => Some(Self::Delete),
            "CREATE" => Some(Self::Create),
            "DROP" => Some(Self::Drop),
            _ => None,
        }
    }

    /// Returns the command kind this keyword maps to.
    pub fn kind(&self) -> CommandKind {
        match self {
            Self::Select => CommandKind::Reading,
            Self::Insert | Self::Update | Self::Delete | Self::Create | Self::Drop => {
                CommandKind::Mutating
            }
        }
    }

    /// Returns the keyword as written in SQL.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Select => "SELECT",
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::Create => "CREATE",
            Self::Drop => "DROP",
        }
    }
}

impl fmt::Display for StatementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
