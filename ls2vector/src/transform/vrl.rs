//! Helpers that render Logstash references as VRL and Vector template syntax.

use std::sync::LazyLock;

use regex::{Captures, Regex};

static BRACKET_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]").expect("segment pattern is valid"));

static SPRINTF_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"%\{([^}]+)\}").expect("sprintf pattern is valid"));

/// Render a Logstash field reference as a VRL path.
///
/// `[a][b]` becomes `.a.b`, `message` becomes `.message`, and segments that are
/// not plain identifiers are quoted (`@timestamp` becomes `."@timestamp"`).
pub fn vrl_path(field: &str) -> String {
    let field = field.trim();
    let segments = if field.starts_with('[') {
        BRACKET_SEGMENT
            .captures_iter(field)
            .map(|caps| caps[1].trim().to_string())
            .collect::<Vec<_>>()
    } else {
        vec![field.to_string()]
    };
    let segments = segments
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>();
    if segments.is_empty() {
        return ".".to_string();
    }
    segments
        .iter()
        .map(|segment| {
            if is_identifier(segment) {
                format!(".{segment}")
            } else {
                format!(".{}", vrl_string(segment))
            }
        })
        .collect()
}

/// Quote text as a VRL string literal.
pub fn vrl_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Convert a Joda-Time pattern into a strftime format string.
///
/// Quoted literals (`'T'`) are copied through; unknown letters are kept as-is.
pub fn joda_to_strftime(pattern: &str) -> String {
    let chars = pattern.chars().collect::<Vec<_>>();
    let mut out = String::new();
    let mut i = 0;
    while i < chars.len() {
        let ch = chars[i];
        if ch == '\'' {
            // '' is an escaped quote
            if chars.get(i + 1) == Some(&'\'') {
                out.push('\'');
                i += 2;
                continue;
            }
            i += 1;
            while i < chars.len() && chars[i] != '\'' {
                push_literal(&mut out, chars[i]);
                i += 1;
            }
            i += 1;
            continue;
        }
        if !ch.is_ascii_alphabetic() {
            push_literal(&mut out, ch);
            i += 1;
            continue;
        }
        let mut run = 1;
        while chars.get(i + run) == Some(&ch) {
            run += 1;
        }
        match joda_token(ch, run) {
            Some(spec) => out.push_str(spec),
            None => (0..run).for_each(|_| out.push(ch)),
        }
        i += run;
    }
    out
}

fn push_literal(out: &mut String, ch: char) {
    if ch == '%' {
        out.push_str("%%");
    } else {
        out.push(ch);
    }
}

fn joda_token(letter: char, run: usize) -> Option<&'static str> {
    let spec = match (letter, run) {
        ('y' | 'Y', 2) => "%y",
        ('y' | 'Y', _) => "%Y",
        ('M', 1) => "%-m",
        ('M', 2) => "%m",
        ('M', 3) => "%b",
        ('M', _) => "%B",
        ('d', 1) => "%-d",
        ('d', _) => "%d",
        ('D', _) => "%j",
        ('H', 1) => "%-H",
        ('H', _) => "%H",
        ('h', 1) => "%-I",
        ('h', _) => "%I",
        ('m', 1) => "%-M",
        ('m', _) => "%M",
        ('s', 1) => "%-S",
        ('s', _) => "%S",
        ('S', 1..=3) => "%3f",
        ('S', 4..=6) => "%6f",
        ('S', _) => "%9f",
        ('a', _) => "%p",
        ('E', 1..=3) => "%a",
        ('E', _) => "%A",
        ('Z', 1) => "%z",
        ('Z', 2) => "%:z",
        ('Z', _) => "%Z",
        ('z', _) => "%Z",
        ('w', _) => "%V",
        ('e', _) => "%u",
        _ => return None,
    };
    Some(spec)
}

/// Convert Logstash sprintf references to Vector template syntax.
///
/// `%{+YYYY.MM.dd}` becomes `%Y.%m.%d` and `%{host}` becomes `{{ host }}`.
/// Returns the converted text and whether anything changed.
pub fn convert_sprintf(text: &str) -> (String, bool) {
    let converted = SPRINTF_REF.replace_all(text, |caps: &Captures<'_>| {
        let inner = caps[1].trim();
        match inner.strip_prefix('+') {
            Some(joda) => joda_to_strftime(joda),
            None => format!("{{{{ {} }}}}", template_field(inner)),
        }
    });
    let changed = converted != text;
    (converted.into_owned(), changed)
}

fn template_field(field: &str) -> String {
    if field.starts_with('[') {
        let segments = BRACKET_SEGMENT
            .captures_iter(field)
            .map(|caps| caps[1].trim().to_string())
            .collect::<Vec<_>>();
        if !segments.is_empty() {
            return segments.join(".");
        }
    }
    field.to_string()
}

#[cfg(test)]
mod tests {
    use super::{convert_sprintf, joda_to_strftime, vrl_path, vrl_string};

    #[test]
    fn field_references_become_paths() {
        assert_eq!(vrl_path("message"), ".message");
        assert_eq!(vrl_path("[http][status]"), ".http.status");
        assert_eq!(vrl_path("@timestamp"), ".\"@timestamp\"");
        assert_eq!(vrl_path("[user agent]"), ".\"user agent\"");
        assert_eq!(vrl_path(""), ".");
    }

    #[test]
    fn strings_are_escaped() {
        assert_eq!(vrl_string(r#"a "b" \c"#), r#""a \"b\" \\c""#);
    }

    #[test]
    fn apache_timestamp_pattern_converts() {
        assert_eq!(
            joda_to_strftime("dd/MMM/yyyy:HH:mm:ss Z"),
            "%d/%b/%Y:%H:%M:%S %z"
        );
        assert_eq!(
            joda_to_strftime("yyyy-MM-dd'T'HH:mm:ss.SSSZZ"),
            "%Y-%m-%dT%H:%M:%S.%3f%:z"
        );
    }

    #[test]
    fn sprintf_references_convert() {
        assert_eq!(
            convert_sprintf("apache-%{+YYYY.MM.dd}"),
            ("apache-%Y.%m.%d".to_string(), true)
        );
        assert_eq!(
            convert_sprintf("/out/%{[host][name]}.log"),
            ("/out/{{ host.name }}.log".to_string(), true)
        );
        assert_eq!(convert_sprintf("plain"), ("plain".to_string(), false));
    }
}
