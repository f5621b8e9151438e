//! SQLite backend (rusqlite)
//!
//! Parameters are bound natively over the `?`-marker query; the rendered SQL is only
//! used for error messages.

use super::{BufferedResult, DriverResult, Server};
use crate::api::{Row, ScalarValue};
use crate::error::{DbalError, DbalResult};
use crate::sql::{Dialect, SqliteDialect};
use rusqlite::types::{Value, ValueRef};
use rusqlite::{Connection, params_from_iter};
use std::path::Path;

pub struct SqliteServer {
    path: String,
    conn: Option<Connection>,
    last_error: Option<(String, String)>,
}

impl SqliteServer {
    /// Backend for a database file. Nothing is opened until [`Server::connect`].
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            conn: None,
            last_error: None,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(":memory:")
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    /// `ATTACH DATABASE` another file. The alias defaults to the file stem.
    pub fn attach_database(&mut self, file: &str, alias: Option<&str>) -> DbalResult<()> {
        let alias = match alias {
            Some(alias) => alias.to_string(),
            None => Path::new(file)
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .ok_or_else(|| DbalError::InvalidOperation {
                    message: format!("cannot derive an alias from '{file}'"),
                    context: "SqliteServer::attach_database".to_string(),
                })?,
        };

        if !self.connect() {
            return Err(DbalError::Connection {
                code: self.error_code(),
                message: self.error_message(),
            });
        }

        let sql = format!("ATTACH DATABASE ? AS {}", self.quote_identifier(&alias));
        let outcome = match self.conn.as_ref() {
            Some(conn) => conn.execute(&sql, [file]).map(|_| ()),
            None => return Err(not_connected()),
        };

        outcome.map_err(|e| {
            self.record(&e);
            DbalError::Query {
                code: self.error_code(),
                message: self.error_message(),
                sql,
            }
        })
    }

    fn record(&mut self, err: &rusqlite::Error) {
        let code = match err {
            rusqlite::Error::SqliteFailure(inner, _) => inner.extended_code.to_string(),
            _ => "0".to_string(),
        };
        self.last_error = Some((code, err.to_string()));
    }
}

fn not_connected() -> DbalError {
    DbalError::Connection {
        code: "0".to_string(),
        message: "not connected".to_string(),
    }
}

fn to_sql_value(value: &ScalarValue) -> Value {
    match value {
        ScalarValue::Null => Value::Null,
        ScalarValue::Boolean(v) => Value::Integer(i64::from(*v)),
        ScalarValue::Int64(v) => Value::Integer(*v),
        ScalarValue::Float64(v) => Value::Real(*v),
        ScalarValue::Utf8(v) => Value::Text(v.clone()),
    }
}

fn from_value_ref(value: ValueRef<'_>) -> ScalarValue {
    match value {
        ValueRef::Null => ScalarValue::Null,
        ValueRef::Integer(v) => ScalarValue::Int64(v),
        ValueRef::Real(v) => ScalarValue::Float64(v),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            ScalarValue::Utf8(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}

fn run(conn: &Connection, query: &str, params: &[ScalarValue]) -> rusqlite::Result<BufferedResult> {
    let mut stmt = conn.prepare(query)?;
    let columns: Vec<String> = stmt
        .column_names()
        .into_iter()
        .map(String::from)
        .collect();
    let values: Vec<Value> = params.iter().map(to_sql_value).collect();

    if columns.is_empty() {
        stmt.execute(params_from_iter(values.iter()))?;
        return Ok(BufferedResult::empty());
    }

    let mut rows = stmt.query(params_from_iter(values.iter()))?;
    let mut buffered = Vec::new();
    while let Some(row) = rows.next()? {
        let mut out = Row::with_capacity(columns.len());
        for (idx, name) in columns.iter().enumerate() {
            out.push(name.clone(), from_value_ref(row.get_ref(idx)?));
        }
        buffered.push(out);
    }

    Ok(BufferedResult::new(columns, buffered))
}

impl Dialect for SqliteServer {
    fn quote_value(&self, value: &str) -> String {
        SqliteDialect.quote_value(value)
    }

    fn can_truncate_tables(&self) -> bool {
        SqliteDialect.can_truncate_tables()
    }
}

impl Server for SqliteServer {
    fn connect(&mut self) -> bool {
        if self.conn.is_some() {
            return true;
        }
        match Connection::open(&self.path) {
            Ok(conn) => {
                tracing::info!(path = %self.path, "sqlite connection opened");
                self.conn = Some(conn);
                true
            }
            Err(e) => {
                self.record(&e);
                false
            }
        }
    }

    fn query(
        &mut self,
        query: &str,
        params: &[ScalarValue],
        rendered: &str,
    ) -> Option<Box<dyn DriverResult>> {
        let outcome = match self.conn.as_ref() {
            Some(conn) => run(conn, query, params),
            None => {
                self.last_error = Some(("0".to_string(), "not connected".to_string()));
                return None;
            }
        };

        match outcome {
            Ok(result) => Some(Box::new(result)),
            Err(e) => {
                tracing::debug!(sql = %rendered, error = %e, "sqlite query failed");
                self.record(&e);
                None
            }
        }
    }

    fn error_code(&self) -> String {
        self.last_error
            .as_ref()
            .map_or_else(|| "0".to_string(), |(code, _)| code.clone())
    }

    fn error_message(&self) -> String {
        self.last_error
            .as_ref()
            .map_or_else(String::new, |(_, message)| message.clone())
    }

    fn disconnect(&mut self) -> bool {
        let Some(conn) = self.conn.take() else {
            return true;
        };
        match conn.close() {
            Ok(()) => {
                tracing::info!(path = %self.path, "sqlite connection closed");
                true
            }
            Err((conn, e)) => {
                self.record(&e);
                self.conn = Some(conn);
                false
            }
        }
    }

    fn start_transaction(&mut self) -> bool {
        self.query("BEGIN TRANSACTION", &[], "BEGIN TRANSACTION").is_some()
    }
}
