//! Sql - the connection facade
//!
//! Owns one driver backend and routes every query either to it or through the cache:
//!
//! ```text
//! query(template, params)           compile → connect (lazy) → backend → ResultSet::Live
//! cache(template, params, options)  compile → key → fresh?  ─yes─▶ ResultSet::Cached
//!                                                    └─no──▶ backend → materialize ─┘
//! ```

use crate::api::query::Query;
use crate::api::{FromRow, Params};
use crate::cache::{CacheOptions, CacheStore, CachedResult};
use crate::driver::{DriverResult, Server};
use crate::error::{DbalError, DbalResult};
use crate::result::ResultSet;
use crate::sql::{CompiledQuery, NullPolicy, QueryCompiler, TableMap};
use crate::table::Table;

pub struct Sql {
    server: Box<dyn Server>,
    connected: bool,
    in_transaction: bool,
    compiler: QueryCompiler,
    /// Used by `Table::cache` and the fluent query builder
    cache_options: CacheOptions,
}

impl Sql {
    pub fn new<S: Server + 'static>(server: S) -> Self {
        Self::from_boxed(Box::new(server))
    }

    pub fn from_boxed(server: Box<dyn Server>) -> Self {
        Self {
            server,
            connected: false,
            in_transaction: false,
            compiler: QueryCompiler::new(),
            cache_options: CacheOptions::default(),
        }
    }

    pub fn with_tables(mut self, tables: TableMap) -> Self {
        *self.compiler.tables_mut() = tables;
        self
    }

    pub fn with_null_policy(mut self, policy: NullPolicy) -> Self {
        self.compiler.set_null_policy(policy);
        self
    }

    pub fn with_cache_options(mut self, options: CacheOptions) -> Self {
        self.cache_options = options;
        self
    }

    /// Map a `{name}` token to a (possibly `database.table`) reference.
    pub fn define_table(&mut self, name: impl Into<String>, target: impl Into<String>) {
        self.compiler.tables_mut().insert(name, target);
    }

    pub fn compiler(&self) -> &QueryCompiler {
        &self.compiler
    }

    pub fn cache_options(&self) -> &CacheOptions {
        &self.cache_options
    }

    pub fn server(&self) -> &dyn Server {
        &*self.server
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    /// Connect the backend if it isn't already.
    pub fn connect(&mut self) -> DbalResult<()> {
        if self.connected {
            return Ok(());
        }
        if !self.server.connect() {
            return Err(DbalError::Connection {
                code: self.server.error_code(),
                message: self.server.error_message(),
            });
        }
        tracing::info!("connected");
        self.connected = true;
        Ok(())
    }

    /// Close the connection. Returns `true` when nothing is left open.
    pub fn disconnect(&mut self) -> bool {
        if !self.connected {
            return true;
        }
        if !self.server.disconnect() {
            tracing::warn!(
                code = %self.server.error_code(),
                message = %self.server.error_message(),
                "disconnect failed"
            );
            return false;
        }
        tracing::info!("disconnected");
        self.connected = false;
        self.in_transaction = false;
        true
    }

    pub fn error_code(&self) -> String {
        self.server.error_code()
    }

    pub fn error_message(&self) -> String {
        self.server.error_message()
    }

    /// Compile `template` for this backend without running it.
    pub fn compile(&self, template: &str, params: &Params) -> DbalResult<CompiledQuery> {
        self.compiler.compile(template, params, &*self.server)
    }

    /// Run a query against the backend.
    pub fn query(&mut self, template: &str, params: &Params) -> DbalResult<ResultSet> {
        self.query_with(template, params, None)
    }

    /// Serve a query from the cache, running it first if the entry is absent or stale.
    pub fn cache(
        &mut self,
        template: &str,
        params: &Params,
        options: &CacheOptions,
    ) -> DbalResult<ResultSet> {
        self.query_with(template, params, Some(options))
    }

    pub fn query_with(
        &mut self,
        template: &str,
        params: &Params,
        cache: Option<&CacheOptions>,
    ) -> DbalResult<ResultSet> {
        // 컴파일 에러는 I/O 전에 보고
        let compiled = self.compile(template, params)?;

        let Some(options) = cache else {
            return Ok(ResultSet::live(self.execute(&compiled)?));
        };

        let store = CacheStore::new(options);
        let key = CacheStore::key_for(template, params)?;

        if !store.is_fresh(&key, options.time().as_duration()) {
            let mut live = ResultSet::live(self.execute(&compiled)?);
            store.materialize(&key, std::iter::from_fn(|| live.fetch_raw().transpose()))?;
        }

        Ok(ResultSet::Cached(CachedResult::open(store, key)?))
    }

    /// Fluent builder over [`Sql::query`] mapping rows into `T`.
    pub fn query_as<T: FromRow>(&mut self, template: impl Into<String>) -> Query<'_, T> {
        Query::new(self, template)
    }

    pub fn table(&mut self, name: impl Into<String>) -> Table<'_> {
        Table::new(self, name)
    }

    fn execute(&mut self, compiled: &CompiledQuery) -> DbalResult<Box<dyn DriverResult>> {
        self.connect()?;
        tracing::debug!(sql = %compiled.rendered, "executing query");

        self.server
            .query(&compiled.query, &compiled.params, &compiled.rendered)
            .ok_or_else(|| DbalError::Query {
                code: self.server.error_code(),
                message: self.server.error_message(),
                sql: compiled.rendered.clone(),
            })
    }

    fn transaction_step(
        &mut self,
        sql: &str,
        step: fn(&mut dyn Server) -> bool,
    ) -> DbalResult<()> {
        self.connect()?;
        if step(&mut *self.server) {
            Ok(())
        } else {
            Err(DbalError::Query {
                code: self.server.error_code(),
                message: self.server.error_message(),
                sql: sql.to_string(),
            })
        }
    }

    pub fn start_transaction(&mut self) -> DbalResult<()> {
        self.transaction_step("START TRANSACTION", |s| s.start_transaction())?;
        self.in_transaction = true;
        Ok(())
    }

    pub fn commit(&mut self) -> DbalResult<()> {
        self.transaction_step("COMMIT", |s| s.commit())?;
        self.in_transaction = false;
        Ok(())
    }

    pub fn rollback(&mut self) -> DbalResult<()> {
        self.transaction_step("ROLLBACK", |s| s.rollback())?;
        self.in_transaction = false;
        Ok(())
    }
}

impl Drop for Sql {
    fn drop(&mut self) {
        self.disconnect();
    }
}

impl std::fmt::Debug for Sql {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sql")
            .field("connected", &self.connected)
            .field("in_transaction", &self.in_transaction)
            .field("compiler", &self.compiler)
            .finish()
    }
}
