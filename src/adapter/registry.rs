use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use super::{Adapter, CustomerAdapter, EntryAdapter, FixedTableAdapter, PageAdapter, ReadOnlyAdapter};
use crate::config::ConnectionConfig;
use crate::core::{DriverError, Result};

/// Builds an adapter for one connection.
pub type AdapterFactory = fn(&ConnectionConfig) -> Result<Arc<dyn Adapter>>;

/// Adapter types by name, their aliases, and one instance per
/// `(type, connection)` pair.
#[derive(Default)]
pub struct AdapterRegistry {
    factories: HashMap<String, AdapterFactory>,
    aliases: HashMap<String, String>,
    instances: Mutex<HashMap<(String, String), Arc<dyn Adapter>>>,
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("types", &self.type_names())
            .field("aliases", &self.aliases)
            .finish_non_exhaustive()
    }
}

impl AdapterRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in adapter under its usual alias.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        let builtins: [(&str, AdapterFactory, &str); 8] = [
            ("ReadOnlyAdapter", |_| Ok(Arc::new(ReadOnlyAdapter)), "default"),
            ("EntryAdapter", |_| Ok(Arc::new(EntryAdapter)), "entry"),
            ("CustomerAdapter", |_| Ok(Arc::new(CustomerAdapter)), "customer"),
            ("PageAdapter", |_| Ok(Arc::new(PageAdapter)), "page"),
            ("FileAdapter", |_| Ok(Arc::new(FixedTableAdapter::FILE)), "file"),
            ("OrderAdapter", |_| Ok(Arc::new(FixedTableAdapter::ORDER)), "order"),
            ("NewsletterAdapter", |_| Ok(Arc::new(FixedTableAdapter::NEWSLETTER)), "newsletter"),
            ("SignupAdapter", |_| Ok(Arc::new(FixedTableAdapter::SIGNUP)), "signup"),
        ];
        for (type_name, factory, alias) in builtins {
            registry.factories.insert(type_name.to_string(), factory);
            registry.aliases.insert(alias.to_string(), type_name.to_string());
        }
        registry
    }

    /// Registers a new adapter type, optionally with an alias.
    pub fn register(
        &mut self,
        type_name: &str,
        factory: AdapterFactory,
        alias: Option<&str>,
    ) -> Result<&mut Self> {
        if self.factories.contains_key(type_name) {
            return Err(DriverError::configuration(format!(
                "Adapter [{type_name}] is already registered."
            )));
        }
        if let Some(alias) = alias.filter(|alias| self.aliases.contains_key(*alias)) {
            return Err(DriverError::configuration(format!(
                "Adapter alias [{alias}] is already registered."
            )));
        }
        self.factories.insert(type_name.to_string(), factory);
        if let Some(alias) = alias {
            self.alias(alias, type_name);
        }
        Ok(self)
    }

    /// Adds an alias; an existing alias is never replaced.
    pub fn alias(&mut self, alias: &str, type_name: &str) -> bool {
        if self.aliases.contains_key(alias) {
            return false;
        }
        self.aliases.insert(alias.to_string(), type_name.to_string());
        true
    }

    #[must_use]
    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Resolves an alias or type name for a connection.
    pub fn resolve(&self, name: &str, connection: &ConnectionConfig) -> Result<Arc<dyn Adapter>> {
        let type_name = self.aliases.get(name).map_or(name, String::as_str);
        let unresolved = |source: Option<DriverError>| DriverError::Configuration {
            message: format!(
                "Unable to resolve adapter [{name}] for connection [{}]",
                connection.name
            ),
            source: source.map(Box::new),
        };

        let Some(factory) = self.factories.get(type_name) else {
            return Err(unresolved(None));
        };

        let key = (type_name.to_string(), connection.name.clone());
        let mut instances = self.instances.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(adapter) = instances.get(&key) {
            return Ok(Arc::clone(adapter));
        }

        let adapter = factory(connection).map_err(|err| unresolved(Some(err)))?;
        debug!(adapter = type_name, connection = %connection.name, "adapter resolved");
        instances.insert(key, Arc::clone(&adapter));
        Ok(adapter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    fn connection(name: &str) -> ConnectionConfig {
        ConnectionConfig::new(name)
    }

    #[test]
    fn test_builtin_aliases() {
        let registry = AdapterRegistry::with_defaults();
        let default = connection("default");
        assert_eq!(registry.resolve("entry", &default).unwrap().name(), "entry");
        assert_eq!(registry.resolve("default", &default).unwrap().name(), "default");
        assert_eq!(registry.resolve("PageAdapter", &default).unwrap().name(), "page");
        assert_eq!(registry.resolve("signup", &default).unwrap().name(), "signup");
        assert_eq!(registry.type_names().len(), 8);
    }

    #[test]
    fn test_unknown_adapter_names_both() {
        let registry = AdapterRegistry::with_defaults();
        let err = registry.resolve("unknown", &connection("default")).unwrap_err();
        assert!(matches!(err, DriverError::Configuration { .. }));
        let message = err.to_string();
        assert!(message.contains("unknown"));
        assert!(message.contains("default"));
    }

    #[test]
    fn test_instances_cached_per_connection() {
        let registry = AdapterRegistry::with_defaults();
        let a = registry.resolve("entry", &connection("a")).unwrap();
        let again = registry.resolve("EntryAdapter", &connection("a")).unwrap();
        let b = registry.resolve("entry", &connection("b")).unwrap();
        assert!(Arc::ptr_eq(&a, &again));
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_register_and_alias_rules() {
        let mut registry = AdapterRegistry::with_defaults();
        assert!(
            registry
                .register("EntryAdapter", |_| Ok(Arc::new(ReadOnlyAdapter)), None)
                .is_err()
        );

        registry
            .register("ArchiveAdapter", |_| Ok(Arc::new(ReadOnlyAdapter)), Some("archive"))
            .unwrap();
        assert!(!registry.alias("archive", "EntryAdapter"));
        assert!(registry.alias("legacy", "ArchiveAdapter"));
        assert_eq!(registry.resolve("legacy", &connection("x")).unwrap().name(), "default");
    }

    #[test]
    fn test_register_rejects_taken_alias() {
        let mut registry = AdapterRegistry::with_defaults();
        let err = registry
            .register("OtherAdapter", |_| Ok(Arc::new(ReadOnlyAdapter)), Some("entry"))
            .unwrap_err();
        assert!(matches!(err, DriverError::Configuration { .. }));
        assert_eq!(err.to_string(), "Adapter alias [entry] is already registered.");
        assert!(!registry.type_names().contains(&"OtherAdapter"));
        assert_eq!(registry.resolve("entry", &connection("x")).unwrap().name(), "entry");
    }

    #[test]
    fn test_factory_failure_is_wrapped() {
        let mut registry = AdapterRegistry::new();
        registry
            .register(
                "BrokenAdapter",
                |_| Err(DriverError::configuration("missing credentials")),
                Some("broken"),
            )
            .unwrap();
        let err = registry.resolve("broken", &connection("main")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unable to resolve adapter [broken] for connection [main]"
        );
        assert_eq!(err.source().unwrap().to_string(), "missing credentials");
    }
}
