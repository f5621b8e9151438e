//! Result cursor over a cache entry.

use crate::api::Row;
use crate::cache::store::CacheStore;
use crate::error::{DbalError, DbalResult};

#[derive(Debug)]
pub struct CachedResult {
    store: CacheStore,
    key: String,
    total_rows: usize,
    column_count: usize,
    position: usize,
    /// Cursor position → original row position, once sorted
    index_map: Option<Vec<usize>>,
}

impl CachedResult {
    /// Open a materialized entry.
    pub fn open(store: CacheStore, key: impl Into<String>) -> DbalResult<Self> {
        let key = key.into();
        let status = store.status(&key)?;
        Ok(Self {
            store,
            key,
            total_rows: status.total_rows,
            column_count: status.column_count,
            position: 0,
            index_map: None,
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn next_row(&mut self) -> DbalResult<Option<Row>> {
        if self.position >= self.total_rows {
            return Ok(None);
        }

        let index = match &self.index_map {
            Some(map) => *map.get(self.position).ok_or_else(|| {
                DbalError::ResultSet(format!("sort index has no entry for row {}", self.position))
            })?,
            None => self.position,
        };

        let row = self.store.read_row(&self.key, index)?;
        self.position += 1;
        Ok(Some(row))
    }

    pub fn seek(&mut self, position: usize) {
        self.position = position;
    }

    pub fn count(&self) -> usize {
        self.total_rows
    }

    pub fn column_count(&self) -> usize {
        self.column_count
    }

    /// Reorder subsequent reads by `column`. The cursor position is kept.
    pub fn order_by(&mut self, column: &str, descending: bool) -> DbalResult<()> {
        let position = self.position;
        let map = self.store.order_by(&self.key, column, descending)?;
        self.index_map = Some(map);
        self.position = position;
        Ok(())
    }

    pub fn is_sorted(&self) -> bool {
        self.index_map.is_some()
    }
}
