use crate::document::PluginDeclaration;
use crate::value::{SettingValue, Settings};

/// Render settings back to `key => value` lines, one per setting.
///
/// Hash values span several lines; every line is prefixed with `indent`.
pub fn render_settings(settings: &Settings, indent: &str) -> Vec<String> {
    let mut lines = Vec::new();
    for (key, value) in settings {
        match value {
            SettingValue::Map(map) => {
                lines.push(format!("{indent}{key} => {{"));
                for (k, v) in map {
                    lines.push(format!("{indent}  {} => {}", quote(k), quote(v)));
                }
                lines.push(format!("{indent}}}"));
            }
            other => lines.push(format!("{indent}{key} => {}", render_value(other))),
        }
    }
    lines
}

/// Render a single value on one line.
pub fn render_value(value: &SettingValue) -> String {
    match value {
        SettingValue::String(text) => quote(text),
        SettingValue::Integer(number) => number.to_string(),
        SettingValue::Boolean(flag) => flag.to_string(),
        SettingValue::List(items) => {
            let items = items.iter().map(|item| quote(item)).collect::<Vec<_>>();
            format!("[{}]", items.join(", "))
        }
        SettingValue::Map(map) => {
            let pairs = map
                .iter()
                .map(|(k, v)| format!("{} => {}", quote(k), quote(v)))
                .collect::<Vec<_>>();
            format!("{{ {} }}", pairs.join(" "))
        }
    }
}

/// Render a declaration as a `name { ... }` block.
pub fn render_declaration(decl: &PluginDeclaration) -> Vec<String> {
    if decl.settings().is_empty() {
        return vec![format!("{} {{}}", decl.name())];
    }
    let mut lines = vec![format!("{} {{", decl.name())];
    lines.extend(render_settings(decl.settings(), "  "));
    lines.push("}".to_string());
    lines
}

fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        // A lone backslash before anything else reads back unchanged.
        let escape = match ch {
            '"' => true,
            '\\' => matches!(chars.peek(), None | Some('"') | Some('\\')),
            _ => false,
        };
        if escape {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('"');
    out
}
