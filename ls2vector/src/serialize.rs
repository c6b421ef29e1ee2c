//! Vector TOML output.

use std::fs;
use std::path::Path;

use thiserror::Error;
use toml::{Table, Value};

use crate::target::{ComponentRole, TargetComponent, TargetDocument};

#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("failed to serialize component '{id}': {source}")]
    Toml {
        id: String,
        source: toml::ser::Error,
    },
    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

/// Render `document` as Vector TOML.
///
/// Sections come in the order sources, transforms, sinks. Each component's
/// annotations are written as `#` comments directly above its table header.
pub fn render(document: &TargetDocument, source: &Path) -> Result<String, SerializeError> {
    let mut out = String::new();
    out.push_str(&format!(
        "# Generated by ls2vector from {}\n",
        source.display()
    ));
    out.push_str("# Review TODO comments before deploying.\n");

    for role in [
        ComponentRole::Source,
        ComponentRole::Transform,
        ComponentRole::Sink,
    ] {
        for (id, component) in document.section(role) {
            out.push('\n');
            for annotation in component.annotations() {
                push_comment(&mut out, annotation);
            }
            out.push_str(&render_component(role, id, component)?);
        }
    }
    Ok(out)
}

/// Every line of `text` becomes its own comment line.
fn push_comment(out: &mut String, text: &str) {
    if text.is_empty() {
        out.push_str("#\n");
        return;
    }
    for line in text.lines() {
        if line.trim().is_empty() {
            out.push_str("#\n");
        } else {
            out.push_str(&format!("# {line}\n"));
        }
    }
}

fn render_component(
    role: ComponentRole,
    id: &str,
    component: &TargetComponent,
) -> Result<String, SerializeError> {
    let mut body = Table::new();
    body.insert(
        "type".to_string(),
        Value::String(component.component_kind().to_string()),
    );
    if role != ComponentRole::Source {
        body.insert(
            "inputs".to_string(),
            Value::Array(
                component
                    .inputs()
                    .iter()
                    .cloned()
                    .map(Value::String)
                    .collect(),
            ),
        );
    }
    for (key, value) in component.settings() {
        body.insert(key.clone(), value.clone());
    }

    let mut by_id = Table::new();
    by_id.insert(id.to_string(), Value::Table(body));
    let mut root = Table::new();
    root.insert(role.section().to_string(), Value::Table(by_id));

    toml::to_string(&root).map_err(|source| SerializeError::Toml {
        id: id.to_string(),
        source,
    })
}

/// Render `document` and write it to `path`.
pub fn write_document(
    document: &TargetDocument,
    source: &Path,
    path: &Path,
) -> Result<(), SerializeError> {
    let text = render(document, source)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| SerializeError::Io {
            path: parent.display().to_string(),
            source,
        })?;
    }
    fs::write(path, text).map_err(|source| SerializeError::Io {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use logstash_conf_core::parse;
    use toml::{Table, Value};

    use super::render;
    use crate::guidance::GuidanceCatalog;
    use crate::transform::TransformerRegistry;
    use crate::translate::{translate, MigrationPaths};

    fn rendered(text: &str) -> String {
        let doc = parse(text).expect("parse");
        let translation = translate(
            &doc,
            &TransformerRegistry::builtin(),
            &GuidanceCatalog::default(),
            &MigrationPaths::new("p.conf", "p.toml"),
        );
        let target = translation.document.expect("document");
        render(&target, Path::new("p.conf")).expect("render")
    }

    #[test]
    fn output_parses_back_as_toml() {
        let text = rendered(
            "input { file { path => \"/var/log/app.log\" } }\n\
             filter { mutate { remove_field => [\"tmp\"] } }\n\
             output { elasticsearch { index => \"logs-%{+YYYY}\" } }",
        );
        let parsed: Table = toml::from_str(&text).expect("valid toml");

        let source = &parsed["sources"]["file_input_0"];
        assert_eq!(source["type"].as_str(), Some("file"));
        assert!(source.get("inputs").is_none());

        let sink = &parsed["sinks"]["elasticsearch_output_0"];
        assert_eq!(
            sink["inputs"],
            Value::Array(vec![Value::String("mutate_filter_0".to_string())])
        );
        assert_eq!(sink["bulk"]["index"].as_str(), Some("logs-%Y"));
    }

    #[test]
    fn sections_are_ordered_and_annotated() {
        let text = rendered("input { kafka { topics => [\"a\"] } }\noutput { stdout {} }");
        assert!(text.starts_with("# Generated by ls2vector from p.conf\n"));

        let todo = text.find("# TODO: Manually migrate input plugin 'kafka'").expect("todo");
        let header = text.find("[sources.kafka_input_0]").expect("header");
        let sink = text.find("[sinks.stdout_output_0]").expect("sink");
        assert!(todo < header);
        assert!(header < sink);

        let between = &text[todo..header];
        assert!(between.lines().all(|line| line.starts_with('#')));
    }

    #[test]
    fn multi_line_settings_stay_commented() {
        let text = rendered(
            "input { stdin {} }\n\
             filter { ruby { code => \"\n  event.set('a', 1)\n  event.set('b', 2)\n\" } }\n\
             output { stdout {} }",
        );
        let parsed: Table = toml::from_str(&text).expect("valid toml");
        assert_eq!(
            parsed["transforms"]["ruby_filter_0"]["type"].as_str(),
            Some("remap")
        );

        let header = text.find("[transforms.ruby_filter_0]").expect("header");
        let todo = text.find("# TODO: Manually migrate filter plugin 'ruby'").expect("todo");
        assert!(text[todo..header].lines().all(|line| line.starts_with('#')));
        assert!(text.contains("#     event.set('a', 1)"));
    }
}
