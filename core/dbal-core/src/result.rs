//! Result Set - one cursor API over live and cached results
//!
//! `fetch` strips trailing whitespace from string fields; `fetch_raw` does not (the
//! cache stores raw rows). The handle is released exactly once, on [`ResultSet::free`]
//! or on drop.

use crate::api::{FromRow, Row, ScalarValue};
use crate::cache::CachedResult;
use crate::driver::DriverResult;
use crate::error::{DbalError, DbalResult};

/// Driver result wrapper that frees the native handle once.
pub struct LiveResult {
    inner: Box<dyn DriverResult>,
    freed: bool,
}

impl LiveResult {
    pub fn new(inner: Box<dyn DriverResult>) -> Self {
        Self {
            inner,
            freed: false,
        }
    }

    fn next_row(&mut self) -> DbalResult<Option<Row>> {
        if self.freed {
            return Ok(None);
        }
        self.inner.next_row()
    }

    fn free(&mut self) {
        if !self.freed {
            self.inner.free();
            self.freed = true;
        }
    }
}

impl Drop for LiveResult {
    fn drop(&mut self) {
        self.free();
    }
}

impl std::fmt::Debug for LiveResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveResult").field("freed", &self.freed).finish()
    }
}

/// Result of one query.
#[derive(Debug)]
pub enum ResultSet {
    Live(LiveResult),
    Cached(CachedResult),
}

fn non_negative(value: i64, what: &str) -> DbalResult<usize> {
    usize::try_from(value)
        .map_err(|_| DbalError::ResultSet(format!("backend reported an invalid {what}: {value}")))
}

impl ResultSet {
    pub fn live(inner: Box<dyn DriverResult>) -> Self {
        ResultSet::Live(LiveResult::new(inner))
    }

    pub fn is_cached(&self) -> bool {
        matches!(self, ResultSet::Cached(_))
    }

    /// Next row with trailing whitespace trimmed, or `None` at the end.
    pub fn fetch(&mut self) -> DbalResult<Option<Row>> {
        Ok(self.fetch_raw()?.map(|mut row| {
            row.trim_strings();
            row
        }))
    }

    /// Next row exactly as the backend or cache returned it.
    pub fn fetch_raw(&mut self) -> DbalResult<Option<Row>> {
        match self {
            Self::Live(result) => result.next_row(),
            Self::Cached(result) => result.next_row(),
        }
    }

    pub fn fetch_as<T: FromRow>(&mut self) -> DbalResult<Option<T>> {
        match self.fetch()? {
            Some(row) => Ok(Some(T::from_row(&row)?)),
            None => Ok(None),
        }
    }

    /// Remaining rows.
    pub fn fetch_all(&mut self) -> DbalResult<Vec<Row>> {
        let mut rows = Vec::new();
        while let Some(row) = self.fetch()? {
            rows.push(row);
        }
        Ok(rows)
    }

    pub fn fetch_all_as<T: FromRow>(&mut self) -> DbalResult<Vec<T>> {
        let mut out = Vec::new();
        while let Some(item) = self.fetch_as()? {
            out.push(item);
        }
        Ok(out)
    }

    pub fn seek(&mut self, position: usize) -> DbalResult<()> {
        match self {
            Self::Live(result) => result.inner.seek(position),
            Self::Cached(result) => {
                result.seek(position);
                Ok(())
            }
        }
    }

    pub fn count(&self) -> DbalResult<usize> {
        match self {
            Self::Live(result) => non_negative(result.inner.count()?, "row count"),
            Self::Cached(result) => Ok(result.count()),
        }
    }

    pub fn column_count(&self) -> DbalResult<usize> {
        match self {
            Self::Live(result) => non_negative(result.inner.column_count()?, "column count"),
            Self::Cached(result) => Ok(result.column_count()),
        }
    }

    /// Single value at (`row`, `col`), both zero-based. Moves the cursor past `row`.
    pub fn result(&mut self, row: usize, col: usize) -> DbalResult<Option<ScalarValue>> {
        self.seek(row)?;
        Ok(self.fetch()?.and_then(|r| r.get_index(col).cloned()))
    }

    /// Sort the remaining reads by `column`. Only cached results can be reordered.
    pub fn order_by(&mut self, column: &str, descending: bool) -> DbalResult<()> {
        match self {
            Self::Live(_) => Err(DbalError::NotSupported(
                "order_by requires a cached result".to_string(),
            )),
            Self::Cached(result) => result.order_by(column, descending),
        }
    }

    /// Iterate the remaining rows (trimmed) without consuming the result.
    pub fn rows(&mut self) -> Rows<'_> {
        Rows { result: self }
    }

    /// Release the backend handle. Safe to call more than once.
    pub fn free(&mut self) {
        if let Self::Live(result) = self {
            result.free();
        }
    }
}

/// Borrowing row iterator over a [`ResultSet`], yielding trimmed rows.
///
/// Kept apart from `ResultSet` so `count()` always reaches the row-count operation.
#[derive(Debug)]
pub struct Rows<'a> {
    result: &'a mut ResultSet,
}

impl Iterator for Rows<'_> {
    type Item = DbalResult<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        self.result.fetch().transpose()
    }
}

impl<'a> IntoIterator for &'a mut ResultSet {
    type Item = DbalResult<Row>;
    type IntoIter = Rows<'a>;

    fn into_iter(self) -> Rows<'a> {
        self.rows()
    }
}
