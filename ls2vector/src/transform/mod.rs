//! Plugin transformers and the registry that dispatches to them.
//!
//! Each built-in transformer module contributes its mappings with
//! `inventory::submit!`; [`TransformerRegistry::builtin`] collects that list
//! once and the resulting registry is only ever read afterwards.

use std::collections::BTreeMap;

use logstash_conf_core::{PluginDeclaration, Role};
use thiserror::Error;
use tracing::warn;

use crate::target::UnwiredComponent;

pub mod filters;
pub mod inputs;
pub mod outputs;
pub mod vrl;

/// Maps one source plugin onto one target component.
pub trait Transformer: Send + Sync {
    /// Whether this transformer handles plugins named `name`.
    fn supports(&self, name: &str) -> bool;

    /// Target component type this transformer emits.
    fn component_kind(&self) -> &'static str;

    /// Translate one declaration. Inputs are attached later by assembly.
    fn transform(&self, decl: &PluginDeclaration) -> Result<UnwiredComponent, TransformError>;
}

/// A single plugin that could not be translated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    #[error("{plugin}: setting '{key}' must be {expected}, found {found}")]
    InvalidSetting {
        plugin: String,
        key: String,
        expected: &'static str,
        found: String,
    },
    #[error("{plugin}: unsupported value '{value}' for '{key}'")]
    UnsupportedValue {
        plugin: String,
        key: String,
        value: String,
    },
}

impl TransformError {
    pub(crate) fn invalid(
        decl: &PluginDeclaration,
        key: &str,
        expected: &'static str,
        found: impl Into<String>,
    ) -> Self {
        Self::InvalidSetting {
            plugin: decl.name().to_string(),
            key: key.to_string(),
            expected,
            found: found.into(),
        }
    }

    pub(crate) fn unsupported(decl: &PluginDeclaration, key: &str, value: impl Into<String>) -> Self {
        Self::UnsupportedValue {
            plugin: decl.name().to_string(),
            key: key.to_string(),
            value: value.into(),
        }
    }
}

/// Registration rejected by [`TransformerRegistry::register`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("a transformer is already registered for {role} plugin '{name}'")]
    Duplicate { role: Role, name: String },
    #[error("transformer does not support {role} plugin '{name}'")]
    Unsupported { role: Role, name: String },
}

/// Compile-time registration entry submitted by transformer modules.
pub struct Registration {
    pub role: Role,
    pub name: &'static str,
    pub build: fn() -> Box<dyn Transformer>,
}

inventory::collect!(Registration);

/// Constructor usable in a [`Registration`] for any default-constructible transformer.
pub fn boxed<T: Transformer + Default + 'static>() -> Box<dyn Transformer> {
    Box::new(T::default())
}

/// Lookup table from `(role, plugin name)` to transformer.
#[derive(Default)]
pub struct TransformerRegistry {
    entries: BTreeMap<(Role, String), Box<dyn Transformer>>,
}

impl TransformerRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in transformer.
    pub fn builtin() -> Self {
        let mut registrations = inventory::iter::<Registration>
            .into_iter()
            .collect::<Vec<_>>();
        registrations.sort_by_key(|r| (r.role, r.name));

        let mut registry = Self::new();
        for registration in registrations {
            if let Err(err) =
                registry.register(registration.role, registration.name, (registration.build)())
            {
                warn!(error = %err, "skipping built-in transformer");
            }
        }
        registry
    }

    /// Add a transformer for `(role, name)`.
    pub fn register(
        &mut self,
        role: Role,
        name: &str,
        transformer: Box<dyn Transformer>,
    ) -> Result<(), RegistryError> {
        if !transformer.supports(name) {
            return Err(RegistryError::Unsupported {
                role,
                name: name.to_string(),
            });
        }
        let key = (role, name.to_string());
        if self.entries.contains_key(&key) {
            return Err(RegistryError::Duplicate {
                role,
                name: name.to_string(),
            });
        }
        self.entries.insert(key, transformer);
        Ok(())
    }

    pub fn lookup(&self, role: Role, name: &str) -> Option<&dyn Transformer> {
        self.entries
            .get(&(role, name.to_string()))
            .map(|transformer| transformer.as_ref())
    }

    /// Registered `(role, name, component kind)` triples, sorted by role then name.
    pub fn entries(&self) -> impl Iterator<Item = (Role, &str, &'static str)> + '_ {
        self.entries
            .iter()
            .map(|((role, name), transformer)| (*role, name.as_str(), transformer.component_kind()))
    }
}

#[cfg(test)]
mod tests {
    use logstash_conf_core::Role;

    use super::inputs::FileInput;
    use super::outputs::ElasticsearchOutput;
    use super::{boxed, RegistryError, TransformerRegistry};

    #[test]
    fn builtin_registry_covers_core_mappings() {
        let registry = TransformerRegistry::builtin();
        for (role, name) in [
            (Role::Input, "file"),
            (Role::Input, "beats"),
            (Role::Filter, "grok"),
            (Role::Filter, "mutate"),
            (Role::Filter, "date"),
            (Role::Output, "elasticsearch"),
            (Role::Output, "file"),
        ] {
            assert!(registry.lookup(role, name).is_some(), "{role} {name}");
        }
        assert!(registry.lookup(Role::Input, "kafka").is_none());
        assert!(registry.lookup(Role::Filter, "file").is_none());
    }

    #[test]
    fn register_rejects_duplicates() {
        let mut registry = TransformerRegistry::new();
        registry
            .register(Role::Input, "file", boxed::<FileInput>())
            .expect("first registration");
        let err = registry
            .register(Role::Input, "file", boxed::<FileInput>())
            .expect_err("duplicate");
        assert_eq!(
            err,
            RegistryError::Duplicate {
                role: Role::Input,
                name: "file".to_string()
            }
        );
    }

    #[test]
    fn register_rejects_unsupported_names() {
        let mut registry = TransformerRegistry::new();
        let err = registry
            .register(Role::Output, "kafka", boxed::<ElasticsearchOutput>())
            .expect_err("unsupported");
        assert!(matches!(err, RegistryError::Unsupported { .. }));
        assert_eq!(registry.entries().count(), 0);
    }

    #[test]
    fn entries_are_sorted_by_role_then_name() {
        let registry = TransformerRegistry::builtin();
        let entries = registry.entries().collect::<Vec<_>>();
        let mut sorted = entries.clone();
        sorted.sort();
        assert_eq!(entries, sorted);
        assert!(entries.contains(&(Role::Output, "elasticsearch", "elasticsearch")));
    }
}
