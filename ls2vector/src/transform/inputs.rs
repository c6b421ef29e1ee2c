use logstash_conf_core::{PluginDeclaration, Role, SettingValue};
use toml::Value;

use super::{boxed, Registration, TransformError, Transformer};
use crate::target::{ComponentRole, UnwiredComponent};

const DEFAULT_FILE_INCLUDE: &str = "/var/log/*.log";
const DEFAULT_BEATS_HOST: &str = "0.0.0.0";
const DEFAULT_BEATS_PORT: i64 = 5044;

inventory::submit! {
    Registration { role: Role::Input, name: "file", build: boxed::<FileInput> }
}

inventory::submit! {
    Registration { role: Role::Input, name: "beats", build: boxed::<BeatsInput> }
}

inventory::submit! {
    Registration { role: Role::Input, name: "stdin", build: boxed::<StdinInput> }
}

/// `file` input to Vector `file` source.
#[derive(Debug, Default)]
pub struct FileInput;

impl Transformer for FileInput {
    fn supports(&self, name: &str) -> bool {
        name == "file"
    }

    fn component_kind(&self) -> &'static str {
        "file"
    }

    fn transform(&self, decl: &PluginDeclaration) -> Result<UnwiredComponent, TransformError> {
        let include = match decl.setting("path") {
            None => vec![DEFAULT_FILE_INCLUDE.to_string()],
            Some(value) => value
                .to_string_list()
                .ok_or_else(|| TransformError::invalid(decl, "path", "a string or list", value.type_name()))?,
        };

        let mut component = UnwiredComponent::new(ComponentRole::Source, self.component_kind());
        component.set("include", string_array(include));
        if let Some(value) = decl.setting("exclude") {
            let exclude = value.to_string_list().ok_or_else(|| {
                TransformError::invalid(decl, "exclude", "a string or list", value.type_name())
            })?;
            component.set("exclude", string_array(exclude));
        }

        let read_from = match decl.string_setting("start_position") {
            Some("beginning") => "beginning",
            _ => "end",
        };
        component.set("read_from", read_from);

        if decl.setting("sincedb_path").is_some() {
            component.annotate("sincedb_path dropped; Vector tracks checkpoints in its data_dir");
        }
        Ok(component)
    }
}

/// `beats` input to Vector `socket` source.
#[derive(Debug, Default)]
pub struct BeatsInput;

impl Transformer for BeatsInput {
    fn supports(&self, name: &str) -> bool {
        name == "beats"
    }

    fn component_kind(&self) -> &'static str {
        "socket"
    }

    fn transform(&self, decl: &PluginDeclaration) -> Result<UnwiredComponent, TransformError> {
        let host = decl.string_setting("host").unwrap_or(DEFAULT_BEATS_HOST);
        let port = match decl.setting("port") {
            None => DEFAULT_BEATS_PORT,
            Some(SettingValue::Integer(port)) => *port,
            Some(SettingValue::String(text)) => text
                .trim()
                .parse::<i64>()
                .map_err(|_| TransformError::invalid(decl, "port", "a port number", text.clone()))?,
            Some(other) => {
                return Err(TransformError::invalid(
                    decl,
                    "port",
                    "a port number",
                    other.type_name(),
                ))
            }
        };

        let mut component = UnwiredComponent::new(ComponentRole::Source, self.component_kind());
        component
            .set("address", format!("{host}:{port}"))
            .set("mode", "tcp")
            .annotate("Beats uses the Lumberjack protocol; a plain socket source does not speak it")
            .annotate("Point shippers at a Vector-compatible sink or use the vector source with Vector agents");
        Ok(component)
    }
}

/// `stdin` input to Vector `stdin` source.
#[derive(Debug, Default)]
pub struct StdinInput;

impl Transformer for StdinInput {
    fn supports(&self, name: &str) -> bool {
        name == "stdin"
    }

    fn component_kind(&self) -> &'static str {
        "stdin"
    }

    fn transform(&self, _decl: &PluginDeclaration) -> Result<UnwiredComponent, TransformError> {
        Ok(UnwiredComponent::new(
            ComponentRole::Source,
            self.component_kind(),
        ))
    }
}

pub(crate) fn string_array(items: Vec<String>) -> Value {
    Value::Array(items.into_iter().map(Value::String).collect())
}
