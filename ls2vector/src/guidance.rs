//! Manual-migration guidance for plugins without a built-in transformer.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use logstash_conf_core::Role;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const SOURCES_DOCS: &str = "https://vector.dev/docs/reference/configuration/sources/";
const TRANSFORMS_DOCS: &str = "https://vector.dev/docs/reference/configuration/transforms/";
const SINKS_DOCS: &str = "https://vector.dev/docs/reference/configuration/sinks/";
const VRL_DOCS: &str = "https://vector.dev/docs/reference/vrl/";

/// Prose and target alternatives for one plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Guidance {
    pub guidance: String,
    pub alternatives: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct PluginEntry {
    name: String,
    guidance: String,
    #[serde(default)]
    alternatives: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct GenericEntry {
    role: String,
    guidance: String,
    #[serde(default)]
    alternatives: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct GuidanceFile {
    #[serde(default)]
    plugin: Vec<PluginEntry>,
    #[serde(default)]
    generic: Vec<GenericEntry>,
}

/// Errors returned when loading guidance files.
#[derive(Debug, Error)]
pub enum GuidanceLoadError {
    #[error("failed to read guidance file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse guidance file {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("guidance file {path}: entry '{entry}' has empty guidance")]
    EmptyGuidance { path: String, entry: String },
    #[error("guidance file {path}: unknown role '{role}' in generic entry")]
    UnknownRole { path: String, role: String },
}

/// Plugin name to guidance, with a generic template per role for unknown names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuidanceCatalog {
    plugins: BTreeMap<String, Guidance>,
    generic: BTreeMap<Role, Guidance>,
}

impl Default for GuidanceCatalog {
    /// Catalog from the embedded guidance file, or the hard-coded fallback.
    fn default() -> Self {
        let embedded = include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/mappings/guidance.toml"
        ));
        match parse_catalog(embedded, "embedded guidance".to_string()) {
            Ok(catalog) if !catalog.plugins.is_empty() => catalog,
            _ => fallback_catalog(),
        }
    }
}

impl GuidanceCatalog {
    /// Load a catalog from a TOML file.
    ///
    /// Roles without a `[[generic]]` entry keep the built-in generic template.
    pub fn load(path: &Path) -> Result<Self, GuidanceLoadError> {
        let raw = fs::read_to_string(path).map_err(|source| GuidanceLoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        parse_catalog(&raw, path.display().to_string())
    }

    /// Guidance for `name` declared in `role`. Never empty.
    pub fn lookup(&self, role: Role, name: &str) -> Guidance {
        if let Some(found) = self.plugins.get(name) {
            return found.clone();
        }
        self.generic
            .get(&role)
            .cloned()
            .unwrap_or_else(|| generic_guidance(role))
    }

    /// Whether `name` has a dedicated entry.
    pub fn is_known(&self, name: &str) -> bool {
        self.plugins.contains_key(name)
    }
}

fn parse_catalog(raw: &str, path: String) -> Result<GuidanceCatalog, GuidanceLoadError> {
    let parsed: GuidanceFile = toml::from_str(raw).map_err(|source| GuidanceLoadError::Parse {
        path: path.clone(),
        source,
    })?;

    let mut plugins = BTreeMap::new();
    for entry in parsed.plugin {
        if entry.guidance.trim().is_empty() {
            return Err(GuidanceLoadError::EmptyGuidance {
                path,
                entry: entry.name,
            });
        }
        plugins.insert(
            entry.name,
            Guidance {
                guidance: entry.guidance,
                alternatives: entry.alternatives,
            },
        );
    }

    let mut generic = Role::ALL
        .iter()
        .map(|role| (*role, generic_guidance(*role)))
        .collect::<BTreeMap<_, _>>();
    for entry in parsed.generic {
        let role = Role::ALL
            .into_iter()
            .find(|role| role.keyword() == entry.role)
            .ok_or_else(|| GuidanceLoadError::UnknownRole {
                path: path.clone(),
                role: entry.role.clone(),
            })?;
        if entry.guidance.trim().is_empty() {
            return Err(GuidanceLoadError::EmptyGuidance {
                path,
                entry: entry.role,
            });
        }
        generic.insert(
            role,
            Guidance {
                guidance: entry.guidance,
                alternatives: entry.alternatives,
            },
        );
    }

    Ok(GuidanceCatalog { plugins, generic })
}

fn generic_guidance(role: Role) -> Guidance {
    match role {
        Role::Input => Guidance {
            guidance: format!("Search for equivalent Vector sources at:\n{SOURCES_DOCS}"),
            alternatives: vec![SOURCES_DOCS.to_string()],
        },
        Role::Filter => Guidance {
            guidance: format!(
                "Consider implementing this logic in Vector Remap Language (VRL).\nSee: {VRL_DOCS}"
            ),
            alternatives: vec![TRANSFORMS_DOCS.to_string()],
        },
        Role::Output => Guidance {
            guidance: format!("Search for equivalent Vector sinks at:\n{SINKS_DOCS}"),
            alternatives: vec![SINKS_DOCS.to_string()],
        },
    }
}

fn fallback_catalog() -> GuidanceCatalog {
    let plugin = |guidance: &str, alternatives: &[&str]| Guidance {
        guidance: guidance.to_string(),
        alternatives: alternatives.iter().map(|s| s.to_string()).collect(),
    };
    let plugins = [
        (
            "kafka",
            plugin(
                "The Logstash kafka plugin can be migrated to Vector's kafka source or sink.",
                &[
                    "kafka source: https://vector.dev/docs/reference/configuration/sources/kafka/",
                    "kafka sink: https://vector.dev/docs/reference/configuration/sinks/kafka/",
                ],
            ),
        ),
        (
            "syslog",
            plugin(
                "Vector has native syslog source support.",
                &["syslog source: https://vector.dev/docs/reference/configuration/sources/syslog/"],
            ),
        ),
        (
            "ruby",
            plugin(
                "Ruby filter logic should be reimplemented in Vector Remap Language (VRL).",
                &["remap transform: https://vector.dev/docs/reference/configuration/transforms/remap/"],
            ),
        ),
    ]
    .into_iter()
    .map(|(name, guidance)| (name.to_string(), guidance))
    .collect();

    GuidanceCatalog {
        plugins,
        generic: Role::ALL
            .iter()
            .map(|role| (*role, generic_guidance(*role)))
            .collect(),
    }
}
