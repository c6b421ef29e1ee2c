use std::fmt::{self, Display, Formatter};
use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use serde::Serialize;

/// Ordered plugin settings, in the order the keys appear in the document.
pub type Settings = IndexMap<String, SettingValue>;

/// A decoded plugin setting value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SettingValue {
    /// Quoted literal, or any token that is not another recognised shape.
    String(String),
    /// Bare all-digit token.
    Integer(i64),
    /// `true` / `false`, any case.
    Boolean(bool),
    /// `[ ... ]` list, items unquoted.
    List(Vec<String>),
    /// `{ "k" => "v" ... }` hash with quoted keys and values.
    Map(IndexMap<String, String>),
}

impl SettingValue {
    /// Return the string payload for [`SettingValue::String`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, String>> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// View a string or a list as a list of strings.
    ///
    /// Many plugin options accept either `"x"` or `["x", "y"]`; this folds both
    /// shapes into one. Other shapes return `None`.
    pub fn to_string_list(&self) -> Option<Vec<String>> {
        match self {
            Self::String(value) => Some(vec![value.clone()]),
            Self::List(items) => Some(items.clone()),
            _ => None,
        }
    }

    /// Short name of the value shape, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Integer(_) => "integer",
            Self::Boolean(_) => "boolean",
            Self::List(_) => "list",
            Self::Map(_) => "hash",
        }
    }
}

impl Display for SettingValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(value) => write!(f, "{value}"),
            Self::Integer(value) => write!(f, "{value}"),
            Self::Boolean(value) => write!(f, "{value}"),
            Self::List(items) => write!(f, "[{}]", items.join(", ")),
            Self::Map(map) => {
                let pairs = map
                    .iter()
                    .map(|(k, v)| format!("{k} => {v}"))
                    .collect::<Vec<_>>();
                write!(f, "{{{}}}", pairs.join(", "))
            }
        }
    }
}

static MAP_PAIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?:"((?:[^"\\]|\\.)*)"|'((?:[^'\\]|\\.)*)')\s*=>\s*(?:"((?:[^"\\]|\\.)*)"|'((?:[^'\\]|\\.)*)')"#,
    )
    .expect("hash pair pattern is valid")
});

/// Decode the literal text of one setting value.
///
/// The text is trimmed and one trailing comma is dropped before the shape is
/// chosen from the first character.
pub fn decode_value(text: &str) -> SettingValue {
    let text = text.trim();
    let text = text.strip_suffix(',').unwrap_or(text).trim_end();

    match text.chars().next() {
        Some('"') | Some('\'') => SettingValue::String(unquote(text)),
        Some('[') => SettingValue::List(decode_list(text)),
        Some('{') => decode_map(text),
        _ => decode_scalar(text),
    }
}

fn decode_scalar(text: &str) -> SettingValue {
    if text.eq_ignore_ascii_case("true") {
        return SettingValue::Boolean(true);
    }
    if text.eq_ignore_ascii_case("false") {
        return SettingValue::Boolean(false);
    }
    if !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(number) = text.parse::<i64>() {
            return SettingValue::Integer(number);
        }
    }
    SettingValue::String(text.to_string())
}

fn decode_list(text: &str) -> Vec<String> {
    let inner = text.strip_prefix('[').unwrap_or(text);
    let inner = inner.strip_suffix(']').unwrap_or(inner);

    split_outside_quotes(inner, ',')
        .into_iter()
        .map(|item| {
            let item = item.trim();
            if item.starts_with('"') || item.starts_with('\'') {
                unquote(item)
            } else {
                item.to_string()
            }
        })
        .filter(|item| !item.is_empty())
        .collect()
}

fn decode_map(text: &str) -> SettingValue {
    let mut map = IndexMap::new();
    for caps in MAP_PAIR.captures_iter(text) {
        let key = caps.get(1).or_else(|| caps.get(2));
        let value = caps.get(3).or_else(|| caps.get(4));
        if let (Some(key), Some(value)) = (key, value) {
            map.insert(unescape(key.as_str()), unescape(value.as_str()));
        }
    }

    if map.is_empty() {
        SettingValue::String(text.to_string())
    } else {
        SettingValue::Map(map)
    }
}

/// Strip the surrounding quotes from a quoted literal and resolve escapes.
///
/// Text after the closing quote is ignored; an unterminated literal keeps
/// everything after the opening quote.
pub fn unquote(text: &str) -> String {
    let mut chars = text.chars();
    let Some(quote) = chars.next() else {
        return String::new();
    };

    let mut out = String::new();
    let mut escaped = false;
    for ch in chars {
        if escaped {
            if ch != quote && ch != '\\' {
                out.push('\\');
            }
            out.push(ch);
            escaped = false;
        } else if ch == '\\' {
            escaped = true;
        } else if ch == quote {
            return out;
        } else {
            out.push(ch);
        }
    }
    if escaped {
        out.push('\\');
    }
    out
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some(next @ ('"' | '\'' | '\\')) => out.push(next),
            Some(next) => {
                out.push('\\');
                out.push(next);
            }
            None => out.push('\\'),
        }
    }
    out
}

fn split_outside_quotes(text: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut start = 0;

    for (idx, ch) in text.char_indices() {
        if let Some(open) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == open {
                quote = None;
            }
            continue;
        }
        if ch == '"' || ch == '\'' {
            quote = Some(ch);
        } else if ch == separator {
            parts.push(&text[start..idx]);
            start = idx + ch.len_utf8();
        }
    }
    parts.push(&text[start..]);
    parts
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;

    use super::{decode_value, unquote, SettingValue};

    #[test]
    fn decodes_quoted_strings_with_escapes() {
        assert_eq!(
            decode_value(r#""/var/log/app.log""#),
            SettingValue::String("/var/log/app.log".to_string())
        );
        assert_eq!(
            decode_value(r#"'say \'hi\''"#),
            SettingValue::String("say 'hi'".to_string())
        );
        assert_eq!(unquote(r#""a\"b""#), "a\"b");
    }

    #[test]
    fn keeps_regex_escapes_inside_strings() {
        assert_eq!(
            decode_value(r#""\d+\s""#),
            SettingValue::String(r"\d+\s".to_string())
        );
    }

    #[test]
    fn decodes_lists_without_splitting_quoted_commas() {
        assert_eq!(
            decode_value(r#"["a, b", "c", 'd' ,]"#),
            SettingValue::List(vec!["a, b".to_string(), "c".to_string(), "d".to_string()])
        );
        assert_eq!(decode_value("[]"), SettingValue::List(Vec::new()));
    }

    #[test]
    fn decodes_quoted_hash_pairs() {
        let mut expected = IndexMap::new();
        expected.insert("message".to_string(), "%{COMBINEDAPACHELOG}".to_string());
        expected.insert("host".to_string(), "web-1".to_string());
        assert_eq!(
            decode_value(r#"{ "message" => "%{COMBINEDAPACHELOG}" 'host' => 'web-1' }"#),
            SettingValue::Map(expected)
        );
    }

    #[test]
    fn hash_without_quoted_pairs_keeps_raw_text() {
        assert_eq!(
            decode_value("{ env => prod }"),
            SettingValue::String("{ env => prod }".to_string())
        );
    }

    #[test]
    fn decodes_booleans_and_integers() {
        assert_eq!(decode_value("TRUE"), SettingValue::Boolean(true));
        assert_eq!(decode_value("false,"), SettingValue::Boolean(false));
        assert_eq!(decode_value("5044"), SettingValue::Integer(5044));
        assert_eq!(
            decode_value("-1"),
            SettingValue::String("-1".to_string())
        );
        assert_eq!(
            decode_value("99999999999999999999"),
            SettingValue::String("99999999999999999999".to_string())
        );
    }

    #[test]
    fn bare_words_stay_raw_strings() {
        assert_eq!(decode_value("json"), SettingValue::String("json".to_string()));
        assert_eq!(
            decode_value("json { charset => \"UTF-8\" }"),
            SettingValue::String("json { charset => \"UTF-8\" }".to_string())
        );
    }

    #[test]
    fn string_or_list_folds_into_list() {
        assert_eq!(
            decode_value(r#""/a""#).to_string_list(),
            Some(vec!["/a".to_string()])
        );
        assert_eq!(decode_value("3").to_string_list(), None);
    }
}
