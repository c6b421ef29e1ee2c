use logstash_conf_core::{render_settings, Role, SourceDocument};
use serde::Serialize;

use crate::target::ComponentRole;
use crate::transform::TransformerRegistry;
use crate::translate::component_id;

/// How one plugin would be translated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InspectEntry {
    pub id: String,
    pub plugin: String,
    pub role: Role,
    pub line: usize,
    pub component: ComponentRole,
    /// Target type, or `None` when the plugin would become a placeholder.
    pub component_kind: Option<&'static str>,
    pub condition: Option<String>,
    pub settings: Vec<String>,
}

/// Preview the plugin to component mapping of `document` without translating it.
pub fn inspect(document: &SourceDocument, registry: &TransformerRegistry) -> Vec<InspectEntry> {
    let mut entries = Vec::new();
    for role in Role::ALL {
        for (index, decl) in document.plugins(role).iter().enumerate() {
            entries.push(InspectEntry {
                id: component_id(decl, index),
                plugin: decl.name().to_string(),
                role,
                line: decl.line(),
                component: ComponentRole::for_plugin(role),
                component_kind: registry
                    .lookup(role, decl.name())
                    .map(|transformer| transformer.component_kind()),
                condition: decl.condition().map(str::to_string),
                settings: render_settings(decl.settings(), "    "),
            });
        }
    }
    entries
}

/// Text rendering of [`inspect`] output, one line per plugin.
pub fn render_text(entries: &[InspectEntry], verbose: bool) -> String {
    let mut out = String::new();
    for entry in entries {
        let target = match entry.component_kind {
            Some(kind) => format!("{} {kind}", entry.component),
            None => format!("{} placeholder (manual migration)", entry.component),
        };
        out.push_str(&format!(
            "{:<6} {:<16} line {:<4} -> {} [{}]\n",
            entry.role.keyword(),
            entry.plugin,
            entry.line,
            target,
            entry.id
        ));
        if verbose {
            if let Some(condition) = &entry.condition {
                out.push_str(&format!("    when: {condition}\n"));
            }
            for line in &entry.settings {
                out.push_str(line);
                out.push('\n');
            }
        }
    }
    let supported = entries.iter().filter(|e| e.component_kind.is_some()).count();
    out.push_str(&format!(
        "\n{supported} of {} plugins have a built-in mapping\n",
        entries.len()
    ));
    out
}
