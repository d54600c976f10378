//! A minimal YANG module index: just enough of each module to map a namespace URI to the
//! module that owns it and to that module's own (canonical) prefix.

use crate::error::RegistryError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// The identity of a loaded YANG module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YangModule {
    /// Module name, e.g. `ietf-interfaces`.
    pub name: String,
    /// The `prefix` statement of the module. Submodules and broken modules may lack one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    /// The `namespace` statement of the module.
    pub namespace: String,
}

impl YangModule {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prefix: None,
            namespace: namespace.into(),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }
}

/// On-disk form of a registry: `{"modules": [{"name": .., "prefix": .., "namespace": ..}]}`.
#[derive(Debug, Serialize, Deserialize)]
struct RegistryDocument {
    modules: Vec<YangModule>,
}

/// Index of YANG modules keyed by namespace URI.
#[derive(Debug, Clone, Default)]
pub struct ModuleRegistry {
    modules: Vec<YangModule>,
    by_namespace: HashMap<String, usize>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style variant of [`ModuleRegistry::insert`].
    pub fn with_module(mut self, module: YangModule) -> Self {
        self.insert(module);
        self
    }

    /// Adds a module. A module already registered for the same namespace is replaced and
    /// returned.
    pub fn insert(&mut self, module: YangModule) -> Option<YangModule> {
        match self.by_namespace.get(&module.namespace) {
            Some(&index) => Some(std::mem::replace(&mut self.modules[index], module)),
            None => {
                self.by_namespace
                    .insert(module.namespace.clone(), self.modules.len());
                self.modules.push(module);
                None
            }
        }
    }

    /// Adds a module, refusing a second module for an already claimed namespace.
    pub fn add(&mut self, module: YangModule) -> Result<(), RegistryError> {
        if let Some(existing) = self.find_by_namespace(&module.namespace) {
            return Err(RegistryError::DuplicateNamespace {
                namespace: module.namespace,
                existing: existing.name.clone(),
                module: module.name,
            });
        }
        self.insert(module);
        Ok(())
    }

    pub fn find_by_namespace(&self, namespace: &str) -> Option<&YangModule> {
        self.by_namespace
            .get(namespace)
            .map(|&index| &self.modules[index])
    }

    pub fn find_by_name(&self, name: &str) -> Option<&YangModule> {
        self.modules.iter().find(|m| m.name == name)
    }

    pub fn modules(&self) -> impl Iterator<Item = &YangModule> + '_ {
        self.modules.iter()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn from_json_str(json: &str) -> Result<Self, RegistryError> {
        let document: RegistryDocument = serde_json::from_str(json)?;
        let mut registry = ModuleRegistry::new();
        for module in document.modules {
            registry.add(module)?;
        }
        log::debug!("Loaded module registry with {} modules", registry.len());
        Ok(registry)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn to_json_string(&self) -> Result<String, RegistryError> {
        let document = RegistryDocument {
            modules: self.modules.clone(),
        };
        Ok(serde_json::to_string_pretty(&document)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample_registry() -> ModuleRegistry {
        ModuleRegistry::new()
            .with_module(YangModule::new("example-a", "urn:example:a").with_prefix("ex"))
            .with_module(YangModule::new("example-b", "urn:example:b").with_prefix("b"))
    }

    #[test]
    fn test_lookup_by_namespace_and_name() {
        let registry = sample_registry();
        assert_eq!(registry.len(), 2);
        let module = registry.find_by_namespace("urn:example:a").unwrap();
        assert_eq!(module.name, "example-a");
        assert_eq!(module.prefix.as_deref(), Some("ex"));
        assert!(registry.find_by_namespace("urn:example:none").is_none());
        assert_eq!(
            registry.find_by_name("example-b").map(|m| m.namespace.as_str()),
            Some("urn:example:b")
        );
    }

    #[test]
    fn test_insert_replaces_same_namespace() {
        let mut registry = sample_registry();
        let replaced = registry.insert(YangModule::new("example-a2", "urn:example:a"));
        assert_eq!(replaced.map(|m| m.name), Some("example-a".to_string()));
        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry.find_by_namespace("urn:example:a").map(|m| m.name.as_str()),
            Some("example-a2")
        );
    }

    #[test]
    fn test_add_rejects_duplicate_namespace() {
        let mut registry = sample_registry();
        let err = registry
            .add(YangModule::new("other", "urn:example:b"))
            .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateNamespace { .. }));
        assert!(err.to_string().contains("example-b"));
    }

    #[test]
    fn test_json_round_trip() {
        let json = r#"{"modules": [
            {"name": "example-a", "prefix": "ex", "namespace": "urn:example:a"},
            {"name": "no-prefix", "namespace": "urn:example:np"}
        ]}"#;
        let registry = ModuleRegistry::from_json_str(json).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry.find_by_namespace("urn:example:np").unwrap().prefix,
            None
        );

        let reloaded = ModuleRegistry::from_json_str(&registry.to_json_string().unwrap()).unwrap();
        assert_eq!(
            reloaded.modules().collect::<Vec<_>>(),
            registry.modules().collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"modules": [{{"name": "example-a", "prefix": "ex", "namespace": "urn:example:a"}}]}}"#
        )
        .unwrap();
        let registry = ModuleRegistry::from_json_file(file.path()).unwrap();
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_invalid_json_is_reported() {
        let err = ModuleRegistry::from_json_str("{\"modules\": 3}").unwrap_err();
        assert!(matches!(err, RegistryError::Json(_)));
    }
}
