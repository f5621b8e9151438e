//! Driver backends
//!
//! A backend owns one blocking connection. It receives every query twice: the
//! `?`-marker form with its positional values (for engines that bind natively) and the
//! fully rendered SQL (for engines that only accept text).

#[cfg(feature = "sqlite")]
pub mod sqlite;

use crate::api::{Row, ScalarValue};
use crate::error::{DbalError, DbalResult};
use crate::sql::Dialect;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteServer;

/// One engine connection.
///
/// Failures are reported through `false` / `None` plus [`Server::error_code`] and
/// [`Server::error_message`]; the [`Sql`](crate::Sql) facade turns them into errors.
pub trait Server: Dialect + Send {
    fn connect(&mut self) -> bool;

    fn query(
        &mut self,
        query: &str,
        params: &[ScalarValue],
        rendered: &str,
    ) -> Option<Box<dyn DriverResult>>;

    fn error_code(&self) -> String;

    fn error_message(&self) -> String;

    fn disconnect(&mut self) -> bool;

    fn start_transaction(&mut self) -> bool {
        self.query("START TRANSACTION", &[], "START TRANSACTION").is_some()
    }

    fn commit(&mut self) -> bool {
        self.query("COMMIT", &[], "COMMIT").is_some()
    }

    fn rollback(&mut self) -> bool {
        self.query("ROLLBACK", &[], "ROLLBACK").is_some()
    }
}

/// Native result handle returned by a backend.
pub trait DriverResult: Send {
    /// Next row, or `None` past the end.
    fn next_row(&mut self) -> DbalResult<Option<Row>>;

    fn seek(&mut self, position: usize) -> DbalResult<()>;

    /// Row count as reported by the engine. May be negative when unknown.
    fn count(&self) -> DbalResult<i64>;

    fn column_count(&self) -> DbalResult<i64>;

    fn free(&mut self);
}

/// Fully buffered rows. Backends that read everything up front return this.
#[derive(Debug, Clone, Default)]
pub struct BufferedResult {
    columns: Vec<String>,
    rows: Vec<Row>,
    position: usize,
    freed: bool,
}

impl BufferedResult {
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self {
            columns,
            rows,
            position: 0,
            freed: false,
        }
    }

    /// Result of a statement that produced no rows (INSERT, UPDATE, DDL).
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_freed(&self) -> bool {
        self.freed
    }
}

impl DriverResult for BufferedResult {
    fn next_row(&mut self) -> DbalResult<Option<Row>> {
        if self.freed {
            return Ok(None);
        }
        let row = self.rows.get(self.position).cloned();
        if row.is_some() {
            self.position += 1;
        }
        Ok(row)
    }

    fn seek(&mut self, position: usize) -> DbalResult<()> {
        if position > self.rows.len() {
            return Err(DbalError::ResultSet(format!(
                "seek to row {position} past the end ({} rows)",
                self.rows.len()
            )));
        }
        self.position = position;
        Ok(())
    }

    fn count(&self) -> DbalResult<i64> {
        i64::try_from(self.rows.len()).map_err(|_| DbalError::ResultSet("row count overflow".into()))
    }

    fn column_count(&self) -> DbalResult<i64> {
        i64::try_from(self.columns.len())
            .map_err(|_| DbalError::ResultSet("column count overflow".into()))
    }

    fn free(&mut self) {
        self.rows.clear();
        self.freed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> BufferedResult {
        let rows = (0..3)
            .map(|i| Row::new().with("id", ScalarValue::Int64(i)))
            .collect();
        BufferedResult::new(vec!["id".into()], rows)
    }

    #[test]
    fn test_buffered_cursor() {
        let mut result = sample();
        assert_eq!(result.count().unwrap(), 3);
        assert_eq!(result.column_count().unwrap(), 1);

        let first = result.next_row().unwrap().unwrap();
        assert_eq!(first.get("id"), Some(&ScalarValue::Int64(0)));

        result.seek(2).unwrap();
        assert!(result.next_row().unwrap().is_some());
        assert!(result.next_row().unwrap().is_none());
        assert!(result.seek(4).is_err());
    }

    #[test]
    fn test_buffered_free() {
        let mut result = sample();
        result.free();
        assert!(result.is_freed());
        assert!(result.next_row().unwrap().is_none());
    }
}
