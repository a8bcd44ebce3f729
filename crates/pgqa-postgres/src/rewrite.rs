//! Statement classification and DML-to-SELECT rewriting
//!
//! EXPLAIN on INSERT/UPDATE/DELETE needs write permission and plans the
//! modification itself. To stay read-only the statement is rewritten into a
//! SELECT that reads the same rows:
//!
//! - `UPDATE t SET ... WHERE c` becomes `SELECT * FROM t WHERE c`
//! - `DELETE FROM t WHERE c` becomes `SELECT * FROM t WHERE c`
//! - `INSERT INTO t ... SELECT x` becomes `SELECT x`
//! - `INSERT INTO t ... VALUES ...` becomes `SELECT * FROM t WHERE 1=0`
//!
//! A missing WHERE clause becomes `1=1`. The matching is regex based and
//! does not understand nested statements.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

static UPDATE_TABLE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)UPDATE\s+(\w+)").expect("valid regex"));

static DELETE_TABLE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)DELETE\s+FROM\s+(\w+)").expect("valid regex"));

static INSERT_TABLE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)INSERT\s+INTO\s+(\w+)").expect("valid regex"));

static INSERT_SELECT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)INSERT\s+INTO\s+\w+.*?SELECT\s+(.+?)(?:\s+ORDER\s+BY|\s+LIMIT|$)")
        .expect("valid regex")
});

static WHERE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)WHERE\s+(.+?)(?:\s+ORDER\s+BY|\s+LIMIT|$)").expect("valid regex")
});

/// Kind of SQL statement, decided by its leading keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    /// `SELECT` or `WITH`
    Select,
    Insert,
    Update,
    Delete,
    Create,
    Drop,
    Alter,
    Explain,
    Unknown,
}

impl QueryKind {
    pub fn classify(query: &str) -> Self {
        let upper = query.trim_start().to_uppercase();
        let starts = |keyword: &str| upper.starts_with(keyword);

        if starts("SELECT") || starts("WITH") {
            Self::Select
        } else if starts("INSERT") {
            Self::Insert
        } else if starts("UPDATE") {
            Self::Update
        } else if starts("DELETE") {
            Self::Delete
        } else if starts("CREATE") {
            Self::Create
        } else if starts("DROP") {
            Self::Drop
        } else if starts("ALTER") {
            Self::Alter
        } else if starts("EXPLAIN") {
            Self::Explain
        } else {
            Self::Unknown
        }
    }

    /// Upper-case name stored in the plan's `Query Type` field
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Select => "SELECT",
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::Create => "CREATE",
            Self::Drop => "DROP",
            Self::Alter => "ALTER",
            Self::Explain => "EXPLAIN",
            Self::Unknown => "UNKNOWN",
        }
    }

    pub fn is_dml(&self) -> bool {
        matches!(self, Self::Insert | Self::Update | Self::Delete)
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rewrites a DML statement into a SELECT reading the same rows.
///
/// Returns `None` for non-DML statements and when the table cannot be found.
pub fn dml_to_select(query: &str) -> Option<String> {
    match QueryKind::classify(query) {
        QueryKind::Update => filtered_select(&UPDATE_TABLE_REGEX, query),
        QueryKind::Delete => filtered_select(&DELETE_TABLE_REGEX, query),
        QueryKind::Insert => {
            if let Some(caps) = INSERT_SELECT_REGEX.captures(query) {
                return Some(format!("SELECT {}", caps[1].trim()));
            }
            let table = capture_table(&INSERT_TABLE_REGEX, query)?;
            Some(format!("SELECT * FROM {} WHERE 1=0", table))
        }
        _ => None,
    }
}

fn filtered_select(table_regex: &Regex, query: &str) -> Option<String> {
    let table = capture_table(table_regex, query)?;
    let condition = WHERE_REGEX
        .captures(query)
        .map(|caps| caps[1].trim().to_string())
        .unwrap_or_else(|| "1=1".to_string());
    Some(format!("SELECT * FROM {} WHERE {}", table, condition))
}

fn capture_table<'a>(regex: &Regex, query: &'a str) -> Option<&'a str> {
    regex
        .captures(query)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Best-effort target table of a DML statement, `"unknown_table"` if none
pub fn dml_table_name(query: &str) -> String {
    let words: Vec<&str> = query.split_whitespace().collect();
    let keyword = |i: usize, expected: &str| {
        words
            .get(i)
            .is_some_and(|w| w.eq_ignore_ascii_case(expected))
    };

    let table = match QueryKind::classify(query) {
        QueryKind::Update => words.get(1),
        QueryKind::Insert if keyword(1, "INTO") => words.get(2),
        QueryKind::Delete if keyword(1, "FROM") => words.get(2),
        _ => None,
    };
    table.map_or_else(|| "unknown_table".to_string(), |t| t.to_string())
}

/// First 100 characters of a statement, with `...` when truncated
pub fn statement_preview(query: &str) -> String {
    const LIMIT: usize = 100;
    if query.chars().count() > LIMIT {
        let head: String = query.chars().take(LIMIT).collect();
        format!("{}...", head)
    } else {
        query.to_string()
    }
}
