//! SQL dialects - per-engine quoting and syntax rules.
//!
//! A [`Dialect`] is the connection-independent half of a driver backend: how string
//! literals are escaped, which characters quote identifiers, and which portable
//! function names must be rewritten. Every [`Server`](crate::driver::Server) is also
//! a `Dialect`, so the compiler can be handed either.

use regex::Regex;
use std::sync::LazyLock;

/// Quoting and syntax rules consumed by the query compiler.
pub trait Dialect {
    /// Escape `value` and wrap it in the engine's string-literal delimiters.
    fn quote_value(&self, value: &str) -> String;

    /// Opening and closing identifier quote characters.
    fn quote_chars(&self) -> (char, char) {
        ('`', '`')
    }

    /// Rewrite portable function names into this engine's spelling.
    fn change_query_syntax(&self, query: &str) -> String {
        query.to_string()
    }

    /// Quote a single identifier (column, table or database name).
    fn quote_identifier(&self, name: &str) -> String {
        let (open, close) = self.quote_chars();
        format!("{open}{name}{close}")
    }

    /// Quote a possibly qualified table reference (`db.table` → `` `db`.`table` ``).
    fn quote_table(&self, table: &str) -> String {
        table
            .split('.')
            .map(|part| self.quote_identifier(part))
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Whether `LIMIT n` is understood (SQL Server uses `TOP n` instead).
    fn supports_limit(&self) -> bool {
        true
    }

    /// Whether `TRUNCATE TABLE` is available.
    fn can_truncate_tables(&self) -> bool {
        true
    }
}

/// The dialect a backend speaks, for constructing a rule set without a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DialectKind {
    Mysql,
    Postgres,
    Mssql,
    Sqlite,
}

impl DialectKind {
    pub fn rules(self) -> Box<dyn Dialect + Send + Sync> {
        match self {
            DialectKind::Mysql => Box::new(MysqlDialect),
            DialectKind::Postgres => Box::new(PostgresDialect),
            DialectKind::Mssql => Box::new(MssqlDialect),
            DialectKind::Sqlite => Box::new(SqliteDialect),
        }
    }
}

/// Wrap in single quotes, doubling embedded single quotes (ANSI escaping).
fn ansi_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

// ════════════════════════════════════════════
// MySQL
// ════════════════════════════════════════════

#[derive(Debug, Clone, Copy, Default)]
pub struct MysqlDialect;

impl Dialect for MysqlDialect {
    fn quote_value(&self, value: &str) -> String {
        let mut out = String::with_capacity(value.len() + 2);
        out.push('\'');
        for ch in value.chars() {
            match ch {
                '\0' => out.push_str("\\0"),
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\\' => out.push_str("\\\\"),
                '\'' => out.push_str("\\'"),
                '"' => out.push_str("\\\""),
                '\x1a' => out.push_str("\\Z"),
                other => out.push(other),
            }
        }
        out.push('\'');
        out
    }
}

// ════════════════════════════════════════════
// PostgreSQL
// ════════════════════════════════════════════

static PG_IFNULL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bIFNULL\(").expect("static regex"));

#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl Dialect for PostgresDialect {
    fn quote_value(&self, value: &str) -> String {
        let doubled = value.replace('\'', "''");
        if doubled.contains('\\') {
            format!("E'{}'", doubled.replace('\\', "\\\\"))
        } else {
            format!("'{doubled}'")
        }
    }

    fn quote_chars(&self) -> (char, char) {
        ('"', '"')
    }

    fn change_query_syntax(&self, query: &str) -> String {
        PG_IFNULL.replace_all(query, "COALESCE(").into_owned()
    }
}

// ════════════════════════════════════════════
// SQL Server
// ════════════════════════════════════════════

static MSSQL_IFNULL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bIFNULL\(").expect("static regex"));
static MSSQL_SUBSTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bSUBSTR\(").expect("static regex"));

#[derive(Debug, Clone, Copy, Default)]
pub struct MssqlDialect;

impl Dialect for MssqlDialect {
    fn quote_value(&self, value: &str) -> String {
        ansi_quote(value)
    }

    fn quote_chars(&self) -> (char, char) {
        ('[', ']')
    }

    fn change_query_syntax(&self, query: &str) -> String {
        let query = MSSQL_IFNULL.replace_all(query, "ISNULL(");
        MSSQL_SUBSTR.replace_all(&query, "SUBSTRING(").into_owned()
    }

    fn supports_limit(&self) -> bool {
        false
    }
}

// ════════════════════════════════════════════
// SQLite
// ════════════════════════════════════════════

#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl Dialect for SqliteDialect {
    fn quote_value(&self, value: &str) -> String {
        ansi_quote(value)
    }

    fn can_truncate_tables(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mysql_escaping() {
        assert_eq!(MysqlDialect.quote_value("O'Brien"), r"'O\'Brien'");
        assert_eq!(MysqlDialect.quote_value("a\\b\n"), r"'a\\b\n'");
    }

    #[test]
    fn test_postgres_escaping() {
        assert_eq!(PostgresDialect.quote_value("O'Brien"), "'O''Brien'");
        assert_eq!(PostgresDialect.quote_value(r"C:\tmp"), r"E'C:\\tmp'");
    }

    #[test]
    fn test_ansi_escaping() {
        // SQL injection 방어: single quote → 이스케이프
        assert_eq!(SqliteDialect.quote_value("x' OR '1'='1"), "'x'' OR ''1''=''1'");
        assert_eq!(MssqlDialect.quote_value("it's"), "'it''s'");
    }

    #[test]
    fn test_identifier_quoting() {
        assert_eq!(MysqlDialect.quote_table("db.orders"), "`db`.`orders`");
        assert_eq!(PostgresDialect.quote_identifier("name"), "\"name\"");
        assert_eq!(MssqlDialect.quote_table("orders"), "[orders]");
    }

    #[test]
    fn test_mssql_syntax_rewrite() {
        let sql = "SELECT IFNULL(a, 0), substr(b, 1, 2), MYIFNULL(c) FROM t";
        assert_eq!(
            MssqlDialect.change_query_syntax(sql),
            "SELECT ISNULL(a, 0), SUBSTRING(b, 1, 2), MYIFNULL(c) FROM t"
        );
    }

    #[test]
    fn test_postgres_syntax_rewrite() {
        assert_eq!(
            PostgresDialect.change_query_syntax("SELECT IFNULL(a, 'x')"),
            "SELECT COALESCE(a, 'x')"
        );
        assert_eq!(MysqlDialect.change_query_syntax("SELECT IFNULL(a)"), "SELECT IFNULL(a)");
    }

    #[test]
    fn test_dialect_kind_rules() {
        assert_eq!(DialectKind::Mssql.rules().quote_chars(), ('[', ']'));
        assert!(!DialectKind::Mssql.rules().supports_limit());
        assert!(!DialectKind::Sqlite.rules().can_truncate_tables());
    }
}
