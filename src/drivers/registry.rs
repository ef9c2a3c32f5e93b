use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{DbRsError, Result};
use crate::traits::Driver;

/// Drivers available to an engine, keyed by driver identifier.
#[derive(Clone, Default)]
pub struct DriverRegistry {
    drivers: HashMap<String, Arc<dyn Driver>>,
}

impl DriverRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every driver compiled in through cargo features.
    pub fn with_default_drivers() -> Self {
        #[allow(unused_mut)]
        let mut registry = Self::new();
        #[cfg(feature = "postgres")]
        registry.register(super::POSTGRES_DRIVER_ID, Arc::new(super::TokioPostgresDriver::new()));
        #[cfg(feature = "mysql")]
        registry.register(super::MYSQL_DRIVER_ID, Arc::new(super::SqlxMySqlDriver::new()));
        #[cfg(feature = "sqlite")]
        registry.register(super::SQLITE_DRIVER_ID, Arc::new(super::RusqliteDriver::new()));
        registry
    }

    /// Register a driver, replacing any driver previously registered under `id`.
    pub fn register(&mut self, id: impl Into<String>, driver: Arc<dyn Driver>) -> &mut Self {
        self.drivers.insert(id.into(), driver);
        self
    }

    /// Builder-style variant of [`register`](Self::register).
    pub fn with_driver(mut self, id: impl Into<String>, driver: Arc<dyn Driver>) -> Self {
        self.register(id, driver);
        self
    }

    /// Look up the driver for `id`, failing with `DriverNotFound`.
    pub fn resolve(&self, id: &str) -> Result<Arc<dyn Driver>> {
        self.drivers
            .get(id)
            .cloned()
            .ok_or_else(|| DbRsError::DriverNotFound(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.drivers.contains_key(id)
    }
}

impl fmt::Debug for DriverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<&str> = self.drivers.keys().map(String::as_str).collect();
        ids.sort_unstable();
        f.debug_struct("DriverRegistry").field("drivers", &ids).finish()
    }
}
