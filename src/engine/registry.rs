// SPDX-License-Identifier: Apache-2.0

//! Driver Registry
//!
//! Central registry for all available connectors, plus the process-wide
//! backend initialisation used at start-up.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use tracing::info;

use crate::engine::drivers::duckdb::DuckDbConnector;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::traits::Connector;

/// Registry that holds all available connectors
pub struct DriverRegistry {
    drivers: HashMap<String, Arc<dyn Connector>>,
}

impl DriverRegistry {
    /// Creates a new empty registry
    pub fn new() -> Self {
        Self {
            drivers: HashMap::new(),
        }
    }

    /// Creates a registry holding the built-in connectors
    pub fn with_builtin_drivers() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(DuckDbConnector::new()));
        registry
    }

    /// Registers a new connector
    ///
    /// The connector's `driver_id()` is used as the key; a later registration
    /// under the same id replaces the earlier one.
    pub fn register(&mut self, driver: Arc<dyn Connector>) {
        let id = driver.driver_id().to_string();
        self.drivers.insert(id, driver);
    }

    /// Gets a connector by its ID
    pub fn get(&self, driver_id: &str) -> Option<Arc<dyn Connector>> {
        self.drivers.get(driver_id).cloned()
    }

    /// Gets a connector by its ID, failing with `DriverNotFound`
    pub fn require(&self, driver_id: &str) -> EngineResult<Arc<dyn Connector>> {
        self.get(driver_id)
            .ok_or_else(|| EngineError::driver_not_found(driver_id))
    }

    /// Lists all registered driver IDs, sorted
    pub fn list(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.drivers.keys().map(|s| s.as_str()).collect();
        ids.sort_unstable();
        ids
    }

    /// Returns the number of registered drivers
    pub fn len(&self) -> usize {
        self.drivers.len()
    }

    /// Returns true if no drivers are registered
    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty()
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::new()
    }
}

static BACKEND: OnceLock<Arc<DriverRegistry>> = OnceLock::new();

/// Initialises the process-wide backend registry.
///
/// Call once during start-up. Repeated calls are no-ops and return the
/// registry created by the first call.
pub fn init_backend() -> Arc<DriverRegistry> {
    let registry = BACKEND.get_or_init(|| {
        let registry = DriverRegistry::with_builtin_drivers();
        info!(drivers = ?registry.list(), "Federation backend initialized");
        Arc::new(registry)
    });
    Arc::clone(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::traits::Connection;
    use crate::engine::types::ConnectionProperties;

    struct MockConnector {
        id: &'static str,
    }

    impl Connector for MockConnector {
        fn driver_id(&self) -> &'static str {
            self.id
        }

        fn driver_name(&self) -> &'static str {
            "Mock Connector"
        }

        fn connect(&self, _properties: &ConnectionProperties) -> EngineResult<Box<dyn Connection>> {
            Err(EngineError::not_supported("mock"))
        }
    }

    #[test]
    fn test_registry_basics() {
        let mut registry = DriverRegistry::new();
        assert!(registry.is_empty());

        registry.register(Arc::new(MockConnector { id: "mock1" }));
        assert_eq!(registry.len(), 1);
        assert!(!registry.is_empty());

        registry.register(Arc::new(MockConnector { id: "mock2" }));
        assert_eq!(registry.len(), 2);

        assert!(registry.get("mock1").is_some());
        assert!(registry.get("nonexistent").is_none());
        assert_eq!(registry.list(), vec!["mock1", "mock2"]);
    }

    #[test]
    fn require_reports_missing_driver() {
        let registry = DriverRegistry::new();
        let err = registry.require("oracle").err().unwrap();
        assert_eq!(err, EngineError::driver_not_found("oracle"));
    }

    #[test]
    fn init_backend_is_idempotent() {
        let first = init_backend();
        let second = init_backend();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(first.get("duckdb").is_some());
    }
}
