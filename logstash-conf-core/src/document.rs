use std::fmt::{self, Display, Formatter};

use serde::Serialize;

use crate::value::{SettingValue, Settings};

/// The block a plugin is declared in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Input,
    Filter,
    Output,
}

impl Role {
    /// All roles in pipeline order.
    pub const ALL: [Role; 3] = [Role::Input, Role::Filter, Role::Output];

    /// Block keyword for this role.
    pub fn keyword(self) -> &'static str {
        match self {
            Role::Input => "input",
            Role::Filter => "filter",
            Role::Output => "output",
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// One `name { ... }` plugin inside an input, filter, or output block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginDeclaration {
    role: Role,
    name: String,
    settings: Settings,
    line: usize,
    condition: Option<String>,
}

impl PluginDeclaration {
    /// Build a declaration. `line` is 1-based and is clamped to at least 1.
    pub fn new(role: Role, name: impl Into<String>, settings: Settings, line: usize) -> Self {
        Self {
            role,
            name: name.into(),
            settings,
            line: line.max(1),
            condition: None,
        }
    }

    /// Attach the conditional chain the plugin was declared under.
    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Line of the plugin name token.
    pub fn line(&self) -> usize {
        self.line
    }

    /// Text of the enclosing `if`/`else` chain, if any.
    pub fn condition(&self) -> Option<&str> {
        self.condition.as_deref()
    }

    /// Look up one setting by key.
    pub fn setting(&self, key: &str) -> Option<&SettingValue> {
        self.settings.get(key)
    }

    /// Look up a string setting by key.
    pub fn string_setting(&self, key: &str) -> Option<&str> {
        self.setting(key).and_then(SettingValue::as_str)
    }
}

/// A fully parsed pipeline configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceDocument {
    inputs: Vec<PluginDeclaration>,
    filters: Vec<PluginDeclaration>,
    outputs: Vec<PluginDeclaration>,
    #[serde(skip)]
    raw_text: String,
}

impl SourceDocument {
    pub(crate) fn new(
        inputs: Vec<PluginDeclaration>,
        filters: Vec<PluginDeclaration>,
        outputs: Vec<PluginDeclaration>,
        raw_text: String,
    ) -> Self {
        Self {
            inputs,
            filters,
            outputs,
            raw_text,
        }
    }

    pub fn inputs(&self) -> &[PluginDeclaration] {
        &self.inputs
    }

    pub fn filters(&self) -> &[PluginDeclaration] {
        &self.filters
    }

    pub fn outputs(&self) -> &[PluginDeclaration] {
        &self.outputs
    }

    /// Declarations for one role, in document order.
    pub fn plugins(&self, role: Role) -> &[PluginDeclaration] {
        match role {
            Role::Input => &self.inputs,
            Role::Filter => &self.filters,
            Role::Output => &self.outputs,
        }
    }

    /// Every declaration, inputs first, then filters, then outputs.
    pub fn all_plugins(&self) -> impl Iterator<Item = &PluginDeclaration> {
        self.inputs
            .iter()
            .chain(self.filters.iter())
            .chain(self.outputs.iter())
    }

    /// The text the document was parsed from.
    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }
}
