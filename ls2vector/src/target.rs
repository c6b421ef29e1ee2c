//! Vector-side pipeline model.
//!
//! Components are built in two phases. Transformers produce an
//! [`UnwiredComponent`] that knows its type and settings but not its upstream
//! references; [`TargetDocument::assemble`] wires every component in one pass
//! and checks the graph invariants, so a [`TargetComponent`] is never observed
//! with inputs that contradict its role.

use std::collections::BTreeSet;
use std::fmt::{self, Display, Formatter};

use indexmap::IndexMap;
use logstash_conf_core::Role;
use serde::Serialize;
use thiserror::Error;
use toml::{Table, Value};

/// Which top-level Vector section a component lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentRole {
    Source,
    Transform,
    Sink,
}

impl ComponentRole {
    /// Component role produced for a plugin declared in `role`.
    pub fn for_plugin(role: Role) -> Self {
        match role {
            Role::Input => Self::Source,
            Role::Filter => Self::Transform,
            Role::Output => Self::Sink,
        }
    }

    /// Name of the TOML section holding components of this role.
    pub fn section(self) -> &'static str {
        match self {
            Self::Source => "sources",
            Self::Transform => "transforms",
            Self::Sink => "sinks",
        }
    }
}

impl Display for ComponentRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Source => "source",
            Self::Transform => "transform",
            Self::Sink => "sink",
        })
    }
}

/// A component before its `inputs` are known.
#[derive(Debug, Clone, PartialEq)]
pub struct UnwiredComponent {
    pub role: ComponentRole,
    /// Vector component type, e.g. `file`, `socket`, `remap`.
    pub component_kind: String,
    pub settings: Table,
    /// Comment lines emitted above the component.
    pub annotations: Vec<String>,
}

impl UnwiredComponent {
    pub fn new(role: ComponentRole, component_kind: impl Into<String>) -> Self {
        Self {
            role,
            component_kind: component_kind.into(),
            settings: Table::new(),
            annotations: Vec::new(),
        }
    }

    /// Set one target setting.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> &mut Self {
        self.settings.insert(key.to_string(), value.into());
        self
    }

    pub fn annotate(&mut self, line: impl Into<String>) -> &mut Self {
        self.annotations.push(line.into());
        self
    }

    /// Attach upstream references, enforcing the role/inputs invariant.
    fn wire(self, id: &str, inputs: Vec<String>) -> Result<TargetComponent, AssemblyError> {
        match (self.role, inputs.is_empty()) {
            (ComponentRole::Source, false) => {
                return Err(AssemblyError::SourceWithInputs { id: id.to_string() })
            }
            (ComponentRole::Transform | ComponentRole::Sink, true) => {
                return Err(AssemblyError::MissingInputs {
                    id: id.to_string(),
                    role: self.role,
                })
            }
            _ => {}
        }
        Ok(TargetComponent {
            role: self.role,
            component_kind: self.component_kind,
            settings: self.settings,
            inputs,
            annotations: self.annotations,
        })
    }
}

/// A wired component of the output pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetComponent {
    role: ComponentRole,
    component_kind: String,
    settings: Table,
    inputs: Vec<String>,
    annotations: Vec<String>,
}

impl TargetComponent {
    pub fn role(&self) -> ComponentRole {
        self.role
    }

    pub fn component_kind(&self) -> &str {
        &self.component_kind
    }

    pub fn settings(&self) -> &Table {
        &self.settings
    }

    /// Ids of the upstream components; empty exactly for sources.
    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    pub fn annotations(&self) -> &[String] {
        &self.annotations
    }
}

/// Graph invariant violations found while assembling a [`TargetDocument`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblyError {
    #[error("source component '{id}' must not have inputs")]
    SourceWithInputs { id: String },
    #[error("{role} component '{id}' has no inputs")]
    MissingInputs { id: String, role: ComponentRole },
    #[error("component id '{id}' is used more than once")]
    DuplicateId { id: String },
    #[error("component '{id}' references unknown input '{input}'")]
    UnknownInput { id: String, input: String },
    #[error("no source components produced")]
    NoSources,
    #[error("no sink components produced")]
    NoSinks,
}

/// One component waiting for assembly, with the inputs chosen by the wiring policy.
#[derive(Debug, Clone)]
pub struct PlannedComponent {
    pub id: String,
    pub component: UnwiredComponent,
    pub inputs: Vec<String>,
}

/// A translated Vector pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetDocument {
    sources: IndexMap<String, TargetComponent>,
    transforms: IndexMap<String, TargetComponent>,
    sinks: IndexMap<String, TargetComponent>,
}

impl TargetDocument {
    /// Wire planned components and check every document invariant.
    ///
    /// Components keep the order they are planned in. The document needs at
    /// least one source and one sink, ids must be unique, every input must
    /// name a source or transform, and inputs must match each role.
    pub fn assemble(
        planned: impl IntoIterator<Item = PlannedComponent>,
    ) -> Result<Self, AssemblyError> {
        let planned = planned.into_iter().collect::<Vec<_>>();

        let mut seen = BTreeSet::new();
        for item in &planned {
            if !seen.insert(item.id.as_str()) {
                return Err(AssemblyError::DuplicateId {
                    id: item.id.clone(),
                });
            }
        }
        let upstream = planned
            .iter()
            .filter(|item| item.component.role != ComponentRole::Sink)
            .map(|item| item.id.as_str())
            .collect::<BTreeSet<_>>();
        for item in &planned {
            if let Some(input) = item.inputs.iter().find(|i| !upstream.contains(i.as_str())) {
                return Err(AssemblyError::UnknownInput {
                    id: item.id.clone(),
                    input: input.clone(),
                });
            }
        }

        let mut doc = Self {
            sources: IndexMap::new(),
            transforms: IndexMap::new(),
            sinks: IndexMap::new(),
        };
        for PlannedComponent {
            id,
            component,
            inputs,
        } in planned
        {
            let wired = component.wire(&id, inputs)?;
            let section = match wired.role {
                ComponentRole::Source => &mut doc.sources,
                ComponentRole::Transform => &mut doc.transforms,
                ComponentRole::Sink => &mut doc.sinks,
            };
            section.insert(id, wired);
        }

        if doc.sources.is_empty() {
            return Err(AssemblyError::NoSources);
        }
        if doc.sinks.is_empty() {
            return Err(AssemblyError::NoSinks);
        }
        Ok(doc)
    }

    pub fn sources(&self) -> &IndexMap<String, TargetComponent> {
        &self.sources
    }

    pub fn transforms(&self) -> &IndexMap<String, TargetComponent> {
        &self.transforms
    }

    pub fn sinks(&self) -> &IndexMap<String, TargetComponent> {
        &self.sinks
    }

    /// Components of one role, in planned order.
    pub fn section(&self, role: ComponentRole) -> &IndexMap<String, TargetComponent> {
        match role {
            ComponentRole::Source => &self.sources,
            ComponentRole::Transform => &self.transforms,
            ComponentRole::Sink => &self.sinks,
        }
    }

    /// Every `(id, component)` pair: sources, then transforms, then sinks.
    pub fn components(&self) -> impl Iterator<Item = (&String, &TargetComponent)> {
        self.sources
            .iter()
            .chain(self.transforms.iter())
            .chain(self.sinks.iter())
    }

    /// Look up a component by id in any section.
    pub fn get(&self, id: &str) -> Option<&TargetComponent> {
        self.sources
            .get(id)
            .or_else(|| self.transforms.get(id))
            .or_else(|| self.sinks.get(id))
    }
}
