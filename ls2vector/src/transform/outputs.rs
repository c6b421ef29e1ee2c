use logstash_conf_core::{PluginDeclaration, Role, SettingValue};
use toml::{Table, Value};

use super::inputs::string_array;
use super::vrl::convert_sprintf;
use super::{boxed, Registration, TransformError, Transformer};
use crate::target::{ComponentRole, UnwiredComponent};

const DEFAULT_ES_ENDPOINT: &str = "http://localhost:9200";
const DEFAULT_ES_USER: &str = "elastic";
const DEFAULT_FILE_PATH: &str = "/var/log/vector-output.log";

inventory::submit! {
    Registration { role: Role::Output, name: "elasticsearch", build: boxed::<ElasticsearchOutput> }
}

inventory::submit! {
    Registration { role: Role::Output, name: "file", build: boxed::<FileOutput> }
}

inventory::submit! {
    Registration { role: Role::Output, name: "stdout", build: boxed::<StdoutOutput> }
}

/// Vector encoding codec for a Logstash output codec name.
fn encoding_codec(codec: Option<&str>) -> &'static str {
    match codec {
        Some("line" | "plain") => "text",
        _ => "json",
    }
}

fn encoding(codec: Option<&str>) -> Value {
    let mut table = Table::new();
    table.insert("codec".to_string(), Value::from(encoding_codec(codec)));
    Value::Table(table)
}

/// `elasticsearch` output to Vector `elasticsearch` sink.
#[derive(Debug, Default)]
pub struct ElasticsearchOutput;

impl Transformer for ElasticsearchOutput {
    fn supports(&self, name: &str) -> bool {
        name == "elasticsearch"
    }

    fn component_kind(&self) -> &'static str {
        "elasticsearch"
    }

    fn transform(&self, decl: &PluginDeclaration) -> Result<UnwiredComponent, TransformError> {
        let hosts = match decl.setting("hosts") {
            None => vec![DEFAULT_ES_ENDPOINT.to_string()],
            Some(value) => value.to_string_list().ok_or_else(|| {
                TransformError::invalid(decl, "hosts", "a string or list", value.type_name())
            })?,
        };
        let endpoints = hosts
            .into_iter()
            .map(|host| {
                if host.contains("://") {
                    host
                } else {
                    format!("http://{host}")
                }
            })
            .collect::<Vec<_>>();

        let mut component = UnwiredComponent::new(ComponentRole::Sink, self.component_kind());
        component
            .set("endpoints", string_array(endpoints))
            .set("mode", "bulk");

        if let Some(index) = decl.string_setting("index") {
            let (index, converted) = convert_sprintf(index);
            let mut bulk = Table::new();
            bulk.insert("index".to_string(), Value::String(index));
            component.set("bulk", Value::Table(bulk));
            if converted {
                component.annotate("index date and field references converted to Vector template syntax");
            }
        }

        let user = decl.string_setting("user");
        let password = decl.string_setting("password");
        if user.is_some() || password.is_some() {
            let mut auth = Table::new();
            auth.insert("strategy".to_string(), Value::from("basic"));
            auth.insert(
                "user".to_string(),
                Value::from(user.unwrap_or(DEFAULT_ES_USER)),
            );
            if let Some(password) = password {
                auth.insert("password".to_string(), Value::from(password));
            }
            component.set("auth", Value::Table(auth));
        }

        if matches!(decl.setting("ssl"), Some(SettingValue::Boolean(true))) {
            component.annotate("ssl was enabled; configure the tls table for the endpoints");
        }
        Ok(component)
    }
}

/// `file` output to Vector `file` sink.
#[derive(Debug, Default)]
pub struct FileOutput;

impl Transformer for FileOutput {
    fn supports(&self, name: &str) -> bool {
        name == "file"
    }

    fn component_kind(&self) -> &'static str {
        "file"
    }

    fn transform(&self, decl: &PluginDeclaration) -> Result<UnwiredComponent, TransformError> {
        let path = match decl.setting("path") {
            None => DEFAULT_FILE_PATH.to_string(),
            Some(SettingValue::String(path)) => path.clone(),
            Some(other) => {
                return Err(TransformError::invalid(
                    decl,
                    "path",
                    "a string",
                    other.type_name(),
                ))
            }
        };
        let (path, converted) = convert_sprintf(&path);

        let mut component = UnwiredComponent::new(ComponentRole::Sink, self.component_kind());
        component
            .set("path", path)
            .set("encoding", encoding(decl.string_setting("codec")));
        if converted {
            component.annotate("path date and field references converted to Vector template syntax");
        }
        Ok(component)
    }
}

/// `stdout` output to Vector `console` sink.
#[derive(Debug, Default)]
pub struct StdoutOutput;

impl Transformer for StdoutOutput {
    fn supports(&self, name: &str) -> bool {
        name == "stdout"
    }

    fn component_kind(&self) -> &'static str {
        "console"
    }

    fn transform(&self, decl: &PluginDeclaration) -> Result<UnwiredComponent, TransformError> {
        let mut component = UnwiredComponent::new(ComponentRole::Sink, self.component_kind());
        component.set("encoding", encoding(decl.string_setting("codec")));
        Ok(component)
    }
}
