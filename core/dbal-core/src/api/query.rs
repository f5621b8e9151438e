//! Query Builder - Fluent 스타일 API
//!
//! ```rust,ignore
//! let users: Vec<User> = sql
//!     .query_as::<User>("SELECT * FROM {users} WHERE age > ?")
//!     .bind(18)
//!     .fetch_all()?;
//! ```
//!
//! Positional (`bind`) and named (`param`) bindings cannot be mixed; the first misuse
//! is kept and reported when the query runs.

use crate::api::{FromRow, IntoParam, Params};
use crate::cache::{CacheOptions, CacheTime};
use crate::connection::Sql;
use crate::error::{DbalError, DbalResult};
use crate::result::ResultSet;
use std::marker::PhantomData;

pub struct Query<'a, T> {
    sql: &'a mut Sql,
    template: String,
    params: Params,
    cache: Option<CacheOptions>,
    error: Option<DbalError>,
    _marker: PhantomData<T>,
}

impl<'a, T: FromRow> Query<'a, T> {
    pub fn new(sql: &'a mut Sql, template: impl Into<String>) -> Self {
        Self {
            sql,
            template: template.into(),
            params: Params::new(),
            cache: None,
            error: None,
            _marker: PhantomData,
        }
    }

    /// Positional 파라미터 바인딩 (`?`)
    pub fn bind<V: IntoParam>(mut self, value: V) -> Self {
        if let Err(e) = self.params.push(value) {
            self.error.get_or_insert(e);
        }
        self
    }

    /// Named 파라미터 바인딩 (`?name`)
    pub fn param<V: IntoParam>(mut self, name: &str, value: V) -> Self {
        if let Err(e) = self.params.insert(name, value) {
            self.error.get_or_insert(e);
        }
        self
    }

    /// Serve from the cache for `time`, using the connection's cache options.
    pub fn cache(mut self, time: CacheTime) -> Self {
        self.cache = Some(self.sql.cache_options().with_time(time));
        self
    }

    pub fn cache_with(mut self, options: CacheOptions) -> Self {
        self.cache = Some(options);
        self
    }

    /// Run and return the raw result set.
    pub fn run(self) -> DbalResult<ResultSet> {
        if let Some(e) = self.error {
            return Err(e);
        }
        self.sql
            .query_with(&self.template, &self.params, self.cache.as_ref())
    }

    /// 모든 행 반환
    pub fn fetch_all(self) -> DbalResult<Vec<T>> {
        self.run()?.fetch_all_as()
    }

    /// 첫 번째 행만 반환 (나머지 무시)
    pub fn fetch_first(self) -> DbalResult<Option<T>> {
        self.run()?.fetch_as()
    }

    /// 정확히 1개 행 반환 (없으면 에러)
    pub fn fetch_one(self) -> DbalResult<T> {
        self.fetch_first()?.ok_or_else(|| DbalError::ResultSet("query returned no rows".into()))
    }
}
