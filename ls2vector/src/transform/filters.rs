use std::sync::LazyLock;

use indexmap::IndexMap;
use logstash_conf_core::{decode_value, render_value, PluginDeclaration, Role, SettingValue};
use regex::Regex;

use super::vrl::{joda_to_strftime, vrl_path, vrl_string};
use super::{boxed, Registration, TransformError, Transformer};
use crate::target::{ComponentRole, UnwiredComponent};

inventory::submit! {
    Registration { role: Role::Filter, name: "grok", build: boxed::<GrokFilter> }
}

inventory::submit! {
    Registration { role: Role::Filter, name: "mutate", build: boxed::<MutateFilter> }
}

inventory::submit! {
    Registration { role: Role::Filter, name: "date", build: boxed::<DateFilter> }
}

inventory::submit! {
    Registration { role: Role::Filter, name: "json", build: boxed::<JsonFilter> }
}

fn remap(lines: Vec<String>) -> UnwiredComponent {
    let mut component = UnwiredComponent::new(ComponentRole::Transform, "remap");
    component.set("source", lines.join("\n"));
    component
}

fn string_list(decl: &PluginDeclaration, key: &str) -> Result<Vec<String>, TransformError> {
    match decl.setting(key) {
        None => Ok(Vec::new()),
        Some(value) => value
            .to_string_list()
            .ok_or_else(|| TransformError::invalid(decl, key, "a string or list", value.type_name())),
    }
}

fn hash<'a>(
    decl: &'a PluginDeclaration,
    key: &str,
) -> Result<Option<&'a IndexMap<String, String>>, TransformError> {
    match decl.setting(key) {
        None => Ok(None),
        Some(SettingValue::Map(map)) => Ok(Some(map)),
        Some(other) => Err(TransformError::invalid(decl, key, "a hash", other.type_name())),
    }
}

/// `grok` filter to a `remap` transform calling `parse_groks!`.
#[derive(Debug, Default)]
pub struct GrokFilter;

impl Transformer for GrokFilter {
    fn supports(&self, name: &str) -> bool {
        name == "grok"
    }

    fn component_kind(&self) -> &'static str {
        "remap"
    }

    fn transform(&self, decl: &PluginDeclaration) -> Result<UnwiredComponent, TransformError> {
        let mut patterns: IndexMap<String, Vec<String>> = IndexMap::new();
        let mut unreadable = None;
        match decl.setting("match") {
            None => {}
            Some(SettingValue::Map(map)) => {
                for (field, pattern) in map {
                    patterns
                        .entry(field.clone())
                        .or_default()
                        .push(pattern.clone());
                }
            }
            // legacy form: [field, pattern, field, pattern, ...]
            Some(SettingValue::List(items)) if items.len() % 2 == 0 => {
                for pair in items.chunks(2) {
                    patterns
                        .entry(pair[0].clone())
                        .or_default()
                        .push(pair[1].clone());
                }
            }
            // hash with list values, kept raw by the value decoder
            Some(SettingValue::String(raw)) => {
                let entries = raw_match_entries(raw);
                if entries.is_empty() {
                    unreadable = Some(render_value(&SettingValue::String(raw.clone())));
                }
                for (field, list) in entries {
                    patterns.entry(field).or_default().extend(list);
                }
            }
            Some(other) => unreadable = Some(render_value(other)),
        }

        let mut lines = patterns
            .iter()
            .map(|(field, patterns)| {
                let patterns = patterns
                    .iter()
                    .map(|p| vrl_string(p))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!(
                    ". |= parse_groks!({}, patterns: [{patterns}])",
                    vrl_path(field)
                )
            })
            .collect::<Vec<_>>();
        if lines.is_empty() {
            lines.push("# TODO: add grok patterns".to_string());
        }

        let mut component = remap(lines);
        if let Some(raw) = unreadable {
            component.annotate(format!("grok match could not be translated: {raw}"));
        }
        if decl.setting("overwrite").is_some() {
            component.annotate("grok overwrite has no equivalent; parsed fields are merged into the event");
        }
        Ok(component)
    }
}

static HASH_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""((?:[^"\\]|\\.)*)"\s*=>\s*"#).expect("hash key pattern is valid")
});

/// Field and pattern entries of a raw `{ "field" => [...] }` hash.
fn raw_match_entries(raw: &str) -> Vec<(String, Vec<String>)> {
    let mut entries = Vec::new();
    let mut pos = 0;
    while let Some(caps) = HASH_KEY.captures_at(raw, pos) {
        let (Some(whole), Some(field)) = (caps.get(0), caps.get(1)) else {
            break;
        };
        let rest = &raw[whole.end()..];
        let Some(len) = value_len(rest) else {
            break;
        };
        let patterns = match decode_value(&rest[..len]) {
            SettingValue::List(items) => items,
            SettingValue::String(pattern) => vec![pattern],
            _ => Vec::new(),
        };
        if !patterns.is_empty() {
            entries.push((field.as_str().to_string(), patterns));
        }
        pos = whole.end() + len;
    }
    entries
}

/// Byte length of the quoted string or bracketed list starting `text`.
fn value_len(text: &str) -> Option<usize> {
    let quoted = match text.chars().next()? {
        '"' => true,
        '[' => false,
        _ => return None,
    };
    let mut in_string = quoted;
    let mut escaped = false;
    for (i, ch) in text.char_indices().skip(1) {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_string => escaped = true,
            '"' if quoted => return Some(i + 1),
            '"' => in_string = !in_string,
            ']' if !in_string => return Some(i + 1),
            _ => {}
        }
    }
    None
}

/// `mutate` filter to a `remap` transform, one VRL statement per operation.
#[derive(Debug, Default)]
pub struct MutateFilter;

impl MutateFilter {
    fn convert_fn(decl: &PluginDeclaration, kind: &str) -> Result<&'static str, TransformError> {
        match kind {
            "integer" | "int" => Ok("to_int"),
            "float" => Ok("to_float"),
            "string" => Ok("to_string"),
            "boolean" | "bool" => Ok("to_bool"),
            other => Err(TransformError::unsupported(decl, "convert", other)),
        }
    }
}

impl Transformer for MutateFilter {
    fn supports(&self, name: &str) -> bool {
        name == "mutate"
    }

    fn component_kind(&self) -> &'static str {
        "remap"
    }

    fn transform(&self, decl: &PluginDeclaration) -> Result<UnwiredComponent, TransformError> {
        let mut lines = Vec::new();

        if let Some(rename) = hash(decl, "rename")? {
            for (old, new) in rename {
                lines.push(format!("{} = del({})", vrl_path(new), vrl_path(old)));
            }
        }
        for key in ["update", "replace"] {
            if let Some(values) = hash(decl, key)? {
                for (field, value) in values {
                    lines.push(format!("{} = {}", vrl_path(field), vrl_string(value)));
                }
            }
        }
        if let Some(convert) = hash(decl, "convert")? {
            for (field, kind) in convert {
                let func = Self::convert_fn(decl, kind)?;
                let path = vrl_path(field);
                lines.push(format!("{path} = {func}!({path})"));
            }
        }
        let gsub = string_list(decl, "gsub")?;
        if gsub.len() % 3 != 0 {
            return Err(TransformError::invalid(
                decl,
                "gsub",
                "field/pattern/replacement triples",
                format!("{} items", gsub.len()),
            ));
        }
        for triple in gsub.chunks(3) {
            let path = vrl_path(&triple[0]);
            lines.push(format!(
                "{path} = replace(string!({path}), r'{}', {})",
                triple[1].replace('\'', "\\'"),
                vrl_string(&triple[2])
            ));
        }
        for (key, func) in [
            ("uppercase", "upcase"),
            ("lowercase", "downcase"),
            ("strip", "strip_whitespace"),
        ] {
            for field in string_list(decl, key)? {
                let path = vrl_path(&field);
                lines.push(format!("{path} = {func}!({path})"));
            }
        }
        for field in string_list(decl, "remove_field")? {
            lines.push(format!("del({})", vrl_path(&field)));
        }
        if let Some(add) = hash(decl, "add_field")? {
            for (field, value) in add {
                lines.push(format!("{} = {}", vrl_path(field), vrl_string(value)));
            }
        }

        if lines.is_empty() {
            lines.push("# TODO: add mutate operations".to_string());
        }
        Ok(remap(lines))
    }
}

/// `date` filter to a `remap` transform calling `parse_timestamp!`.
#[derive(Debug, Default)]
pub struct DateFilter;

impl DateFilter {
    fn parse_expr(path: &str, format: &str, timezone: Option<&str>, last: bool) -> String {
        let bang = if last { "!" } else { "" };
        match format {
            "UNIX" => format!("from_unix_timestamp{bang}(to_int!({path}))"),
            "UNIX_MS" => format!(
                "from_unix_timestamp{bang}(to_int!({path}), unit: \"milliseconds\")"
            ),
            other => {
                let strftime = if other == "ISO8601" {
                    "%+".to_string()
                } else {
                    joda_to_strftime(other)
                };
                let tz = timezone
                    .map(|tz| format!(", timezone: {}", vrl_string(tz)))
                    .unwrap_or_default();
                format!(
                    "parse_timestamp{bang}({path}, format: {}{tz})",
                    vrl_string(&strftime)
                )
            }
        }
    }
}

impl Transformer for DateFilter {
    fn supports(&self, name: &str) -> bool {
        name == "date"
    }

    fn component_kind(&self) -> &'static str {
        "remap"
    }

    fn transform(&self, decl: &PluginDeclaration) -> Result<UnwiredComponent, TransformError> {
        let matches = match decl.setting("match") {
            Some(SettingValue::List(items)) if items.len() >= 2 => items,
            _ => return Ok(remap(vec!["# TODO: configure date parsing".to_string()])),
        };

        let target = match decl.string_setting("target") {
            None | Some("@timestamp") => "timestamp",
            Some(target) => target,
        };
        let source = vrl_path(&matches[0]);
        let timezone = decl.string_setting("timezone");
        let formats = &matches[1..];
        let chain = formats
            .iter()
            .enumerate()
            .map(|(i, format)| Self::parse_expr(&source, format, timezone, i + 1 == formats.len()))
            .collect::<Vec<_>>()
            .join(" ?? ");

        let mut component = remap(vec![format!("{} = {chain}", vrl_path(target))]);
        if decl.setting("locale").is_some() {
            component.annotate("date locale is not supported by parse_timestamp; verify month and day names");
        }
        Ok(component)
    }
}

/// `json` filter to a `remap` transform calling `parse_json!`.
#[derive(Debug, Default)]
pub struct JsonFilter;

impl Transformer for JsonFilter {
    fn supports(&self, name: &str) -> bool {
        name == "json"
    }

    fn component_kind(&self) -> &'static str {
        "remap"
    }

    fn transform(&self, decl: &PluginDeclaration) -> Result<UnwiredComponent, TransformError> {
        let source = vrl_path(decl.string_setting("source").unwrap_or("message"));
        let line = match decl.string_setting("target") {
            Some(target) => format!("{} = parse_json!({source})", vrl_path(target)),
            None => format!(". |= object!(parse_json!({source}))"),
        };
        Ok(remap(vec![line]))
    }
}
