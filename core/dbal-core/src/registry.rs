//! Server registry
//!
//! Named connection factories plus one shared [`Sql`] per name. The registry is an
//! ordinary value: create one at startup and pass it to whatever needs connections.

use crate::connection::Sql;
use crate::error::{DbalError, DbalResult};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

pub type ServerFactory = Box<dyn Fn() -> Sql + Send + Sync>;

/// Shared connection handle returned by [`ServerRegistry::get_instance`].
pub type SharedSql = Arc<Mutex<Sql>>;

#[derive(Default)]
pub struct ServerRegistry {
    factories: HashMap<String, ServerFactory>,
    /// 첫 번째로 등록된 서버
    default: Option<String>,
    instances: Mutex<HashMap<String, SharedSql>>,
}

impl ServerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under `name`. The first registered server becomes the default.
    pub fn add_server<F>(&mut self, name: &str, factory: F) -> DbalResult<()>
    where
        F: Fn() -> Sql + Send + Sync + 'static,
    {
        if name.is_empty() {
            return Err(DbalError::Registry("server name must not be empty".to_string()));
        }
        if self.factories.contains_key(name) {
            return Err(DbalError::Registry(format!("server '{name}' is already defined")));
        }

        self.factories.insert(name.to_string(), Box::new(factory));
        if self.default.is_none() {
            self.default = Some(name.to_string());
        }
        tracing::debug!(server = name, "server registered");
        Ok(())
    }

    pub fn default_server(&self) -> Option<&str> {
        self.default.as_deref()
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    fn resolve<'n>(&'n self, name: Option<&'n str>) -> DbalResult<&'n str> {
        let name = match name {
            Some(name) => name,
            None => self
                .default
                .as_deref()
                .ok_or_else(|| DbalError::Registry("no servers have been defined".to_string()))?,
        };
        if !self.factories.contains_key(name) {
            return Err(DbalError::Registry(format!("unknown server '{name}'")));
        }
        Ok(name)
    }

    /// Shared connection for `name` (or the default), created on first request.
    pub fn get_instance(&self, name: Option<&str>) -> DbalResult<SharedSql> {
        let name = self.resolve(name)?;
        let mut instances = self.instances.lock();
        if let Some(existing) = instances.get(name) {
            return Ok(Arc::clone(existing));
        }

        let sql = Arc::new(Mutex::new(self.build(name)?));
        instances.insert(name.to_string(), Arc::clone(&sql));
        Ok(sql)
    }

    /// A fresh connection for `name` (or the default), not shared.
    pub fn new_instance(&self, name: Option<&str>) -> DbalResult<Sql> {
        let name = self.resolve(name)?;
        self.build(name)
    }

    fn build(&self, name: &str) -> DbalResult<Sql> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| DbalError::Registry(format!("unknown server '{name}'")))?;
        Ok(factory())
    }
}

impl std::fmt::Debug for ServerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerRegistry")
            .field("servers", &self.names())
            .field("default", &self.default)
            .finish()
    }
}
