//! SQL 템플릿 처리
//!
//! - [`scanner`] - quote-aware splitting into code and literal spans
//! - [`dialect`] - per-engine quoting and syntax rules
//! - [`compiler`] - template + parameters → rendered SQL
//! - [`where_clause`] - WHERE clause builder

pub mod compiler;
pub mod dialect;
pub mod scanner;
pub mod where_clause;

pub use compiler::{CompileOptions, CompiledQuery, NullPolicy, QueryCompiler, TableMap, compile};
pub use dialect::{
    Dialect, DialectKind, MssqlDialect, MysqlDialect, PostgresDialect, SqliteDialect,
};
pub use where_clause::{Condition, IntoCondition, Where};
