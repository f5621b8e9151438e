//! Cache Store - sharded on-disk query results
//!
//! # Layout
//!
//! ```text
//! <root>/<k0>/<k1>/<k2>/<key>/
//!     .data       {"totalRows": n, "columnCount": c}   (written last)
//!     .sorted     {"<column>": [original positions in ascending order], ...}
//!     0.row ...   one JSON object per row
//! ```
//!
//! The status file is the commit marker: it is removed before a rebuild starts and
//! written only after every row file is in place, so an interrupted materialization
//! never looks fresh. Its mtime is the entry's creation time.

use crate::api::{Params, Row};
use crate::cache::filesystem::Filesystem;
use crate::cache::options::CacheOptions;
use crate::error::{DbalError, DbalResult};
use crate::logging::CACHE_TARGET;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

const STATUS_FILE: &str = ".data";
const SORTED_FILE: &str = ".sorted";

type SortIndices = BTreeMap<String, Vec<usize>>;

/// Status record of a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatus {
    pub total_rows: usize,
    pub column_count: usize,
}

fn row_file(index: usize) -> String {
    format!("{index}.row")
}

#[derive(Debug, Clone)]
pub struct CacheStore {
    root: PathBuf,
    directories: usize,
    limit: usize,
    /// Row files read so far, shared between clones
    row_reads: Arc<AtomicU64>,
}

impl CacheStore {
    pub fn new(options: &CacheOptions) -> Self {
        Self {
            root: options.directory().to_path_buf(),
            directories: options.directories(),
            limit: options.limit(),
            row_reads: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Cache key of a query: SHA-256 over the template and its serialized parameters.
    pub fn key_for(template: &str, params: &Params) -> DbalResult<String> {
        let mut hasher = Sha256::new();
        hasher.update(template.as_bytes());
        hasher.update(params.to_key_string()?.as_bytes());
        Ok(hasher
            .finalize()
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect())
    }

    /// Directory of one entry: shard directories from the key prefix, then the key.
    pub fn entry_path(&self, key: &str) -> PathBuf {
        let mut path = self.root.clone();
        for shard in key.chars().take(self.directories) {
            path.push(shard.to_string());
        }
        path.push(key);
        path
    }

    fn entry(&self, key: &str) -> Filesystem {
        Filesystem::new(self.entry_path(key))
    }

    /// Whether the entry exists and is younger than `timeout`.
    pub fn is_fresh(&self, key: &str, timeout: Duration) -> bool {
        let entry = self.entry(key);
        tracing::debug!(target: CACHE_TARGET, path = %entry.path().display(), "checking the cache");

        let created = match entry.modified(STATUS_FILE) {
            Ok(created) => created,
            Err(_) => {
                tracing::debug!(target: CACHE_TARGET, "no status file found");
                return false;
            }
        };

        match created.elapsed() {
            Ok(age) if age >= timeout => {
                tracing::debug!(target: CACHE_TARGET, age_secs = age.as_secs(), "cache is too old to use");
                false
            }
            Ok(_) => true,
            // mtime ahead of the local clock
            Err(_) => true,
        }
    }

    /// Drain `rows` into a fresh entry, replacing whatever was there.
    ///
    /// At most `limit` rows are captured (0 = unlimited). An error from the producer
    /// aborts the build and leaves the entry without a status record.
    pub fn materialize<I>(&self, key: &str, rows: I) -> DbalResult<CacheStatus>
    where
        I: IntoIterator<Item = DbalResult<Row>>,
    {
        let entry = self.entry(key);

        entry.remove(STATUS_FILE)?;
        entry.put_json(SORTED_FILE, &SortIndices::new())?;

        let mut total_rows = 0;
        let mut column_count = 0;
        let mut truncated = false;

        for row in rows {
            if self.limit > 0 && total_rows >= self.limit {
                truncated = true;
                break;
            }
            let row = row?;
            if total_rows == 0 {
                column_count = row.len();
            }
            entry.put_json(&row_file(total_rows), &row)?;
            total_rows += 1;
        }

        if truncated {
            tracing::warn!(target: CACHE_TARGET, key, limit = self.limit, "row limit reached, remaining rows are not cached");
        }

        // 이전 빌드에서 남은 row 파일 정리
        for name in entry.list()? {
            let stale = name
                .strip_suffix(".row")
                .and_then(|n| n.parse::<usize>().ok())
                .is_some_and(|n| n >= total_rows);
            if stale {
                entry.remove(&name)?;
            }
        }

        let status = CacheStatus {
            total_rows,
            column_count,
        };
        entry.put_json(STATUS_FILE, &status)?;

        tracing::debug!(target: CACHE_TARGET, key, total_rows, column_count, "cache entry created");
        Ok(status)
    }

    pub fn status(&self, key: &str) -> DbalResult<CacheStatus> {
        let entry = self.entry(key);
        if !entry.has(STATUS_FILE) {
            return Err(DbalError::InvalidOperation {
                message: "cache entry has no status record".to_string(),
                context: entry.path().display().to_string(),
            });
        }
        entry.get_json(STATUS_FILE)
    }

    pub fn read_row(&self, key: &str, index: usize) -> DbalResult<Row> {
        let entry = self.entry(key);
        let name = row_file(index);
        if !entry.has(&name) {
            return Err(DbalError::MissingCacheRow {
                index,
                path: entry.file(&name).display().to_string(),
            });
        }
        self.row_reads.fetch_add(1, Ordering::Relaxed);
        entry.get_json(&name)
    }

    /// Sort index for `column`: original row positions in sorted order.
    ///
    /// Built on first use by reading every row once, then persisted (ascending only).
    pub fn order_by(&self, key: &str, column: &str, descending: bool) -> DbalResult<Vec<usize>> {
        let entry = self.entry(key);
        let mut sorted: SortIndices = if entry.has(SORTED_FILE) {
            entry.get_json(SORTED_FILE)?
        } else {
            SortIndices::new()
        };

        let mut index = match sorted.get(column) {
            Some(index) => index.clone(),
            None => {
                let status = self.status(key)?;
                let mut keyed = Vec::with_capacity(status.total_rows);
                for position in 0..status.total_rows {
                    let row = self.read_row(key, position)?;
                    keyed.push((position, row.value(column)?.clone()));
                }

                // sort_by는 stable: 같은 값은 원래 순서 유지
                keyed.sort_by(|a, b| a.1.sort_cmp(&b.1));
                let index: Vec<usize> = keyed.into_iter().map(|(position, _)| position).collect();

                sorted.insert(column.to_string(), index.clone());
                entry.put_json(SORTED_FILE, &sorted)?;
                tracing::debug!(target: CACHE_TARGET, key, column, rows = index.len(), "sort index built");
                index
            }
        };

        if descending {
            index.reverse();
        }
        Ok(index)
    }

    /// Number of row files read through this store and its clones.
    pub fn row_reads(&self) -> u64 {
        self.row_reads.load(Ordering::Relaxed)
    }
}
