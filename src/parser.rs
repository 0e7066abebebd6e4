//! SQL inspection used to name spans: the leading verb and the primary table.

use once_cell::sync::Lazy;
use regex::Regex;

/// SQL operation types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlOperation {
    Select,
    Insert,
    Update,
    Delete,
    Create,
    Drop,
    Alter,
    Truncate,
    Begin,
    Commit,
    Rollback,
    Set,
    Other,
}

impl SqlOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            SqlOperation::Select => "SELECT",
            SqlOperation::Insert => "INSERT",
            SqlOperation::Update => "UPDATE",
            SqlOperation::Delete => "DELETE",
            SqlOperation::Create => "CREATE",
            SqlOperation::Drop => "DROP",
            SqlOperation::Alter => "ALTER",
            SqlOperation::Truncate => "TRUNCATE",
            SqlOperation::Begin => "BEGIN",
            SqlOperation::Commit => "COMMIT",
            SqlOperation::Rollback => "ROLLBACK",
            SqlOperation::Set => "SET",
            SqlOperation::Other => "QUERY",
        }
    }

    fn from_keyword(keyword: &str) -> Self {
        match keyword.to_ascii_uppercase().as_str() {
            "SELECT" | "WITH" | "VALUES" => SqlOperation::Select,
            "INSERT" | "REPLACE" => SqlOperation::Insert,
            "UPDATE" => SqlOperation::Update,
            "DELETE" => SqlOperation::Delete,
            "CREATE" => SqlOperation::Create,
            "DROP" => SqlOperation::Drop,
            "ALTER" => SqlOperation::Alter,
            "TRUNCATE" => SqlOperation::Truncate,
            "BEGIN" | "START" => SqlOperation::Begin,
            "COMMIT" | "END" => SqlOperation::Commit,
            "ROLLBACK" | "ABORT" => SqlOperation::Rollback,
            "SET" => SqlOperation::Set,
            _ => SqlOperation::Other,
        }
    }

    fn table_regex(&self) -> Option<&'static Regex> {
        let regex = match self {
            SqlOperation::Select => &SELECT_TABLE,
            SqlOperation::Insert => &INSERT_TABLE,
            SqlOperation::Update => &UPDATE_TABLE,
            SqlOperation::Delete => &DELETE_TABLE,
            SqlOperation::Create => &CREATE_TABLE,
            SqlOperation::Drop => &DROP_TABLE,
            SqlOperation::Alter => &ALTER_TABLE,
            SqlOperation::Truncate => &TRUNCATE_TABLE,
            _ => return None,
        };
        Some(Lazy::force(regex))
    }
}

impl std::fmt::Display for SqlOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// Optional quoting around an optionally schema-qualified identifier.
macro_rules! table_pattern {
    ($prefix:literal) => {
        concat!(
            "(?i)",
            $prefix,
            r#"\s+(?:[`"\[]?\w+[`"\]]?\.)?[`"\[]?(\w+)[`"\]]?"#
        )
    };
}

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("table pattern is a valid regex")
}

// Leading `--` and `/* */` comments are skipped before the verb.
static LEADING_KEYWORD: Lazy<Regex> =
    Lazy::new(|| compile(r"^(?:\s|--[^\n]*(?:\n|$)|/\*(?s:.*?)\*/)*\(*\s*([A-Za-z]+)"));

static SELECT_TABLE: Lazy<Regex> = Lazy::new(|| compile(table_pattern!(r"\bFROM")));
static INSERT_TABLE: Lazy<Regex> =
    Lazy::new(|| compile(table_pattern!(r"\b(?:INSERT|REPLACE)(?:\s+IGNORE)?\s+INTO")));
static UPDATE_TABLE: Lazy<Regex> = Lazy::new(|| compile(table_pattern!(r"\bUPDATE(?:\s+ONLY)?")));
static DELETE_TABLE: Lazy<Regex> = Lazy::new(|| compile(table_pattern!(r"\bDELETE\s+FROM")));
static CREATE_TABLE: Lazy<Regex> = Lazy::new(|| {
    compile(table_pattern!(
        r"\bCREATE\s+(?:TEMP(?:ORARY)?\s+)?TABLE(?:\s+IF\s+NOT\s+EXISTS)?"
    ))
});
static DROP_TABLE: Lazy<Regex> =
    Lazy::new(|| compile(table_pattern!(r"\bDROP\s+TABLE(?:\s+IF\s+EXISTS)?")));
static ALTER_TABLE: Lazy<Regex> = Lazy::new(|| compile(table_pattern!(r"\bALTER\s+TABLE")));
static TRUNCATE_TABLE: Lazy<Regex> =
    Lazy::new(|| compile(table_pattern!(r"\bTRUNCATE(?:\s+TABLE)?")));

/// Parse the SQL operation type from a query string.
pub fn parse_operation(sql: &str) -> SqlOperation {
    LEADING_KEYWORD
        .captures(sql)
        .and_then(|caps| caps.get(1))
        .map_or(SqlOperation::Other, |m| SqlOperation::from_keyword(m.as_str()))
}

/// Extract the primary table name from a SQL query, lowercased and without
/// its schema.
pub fn extract_table(sql: &str) -> Option<String> {
    table_for(parse_operation(sql), sql)
}

fn table_for(operation: SqlOperation, sql: &str) -> Option<String> {
    operation
        .table_regex()?
        .captures(sql)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_lowercase())
}

/// Parsed SQL information for span creation.
#[derive(Debug)]
pub struct ParsedSql {
    pub operation: SqlOperation,
    pub table: Option<String>,
}

impl ParsedSql {
    pub fn parse(sql: &str) -> Self {
        let operation = parse_operation(sql);
        let table = table_for(operation, sql);
        Self { operation, table }
    }

    /// `"{OPERATION} {table}"`, or just the operation when no table is known.
    pub fn span_name(&self) -> String {
        match &self.table {
            Some(table) => format!("{} {}", self.operation, table),
            None => self.operation.to_string(),
        }
    }
}
