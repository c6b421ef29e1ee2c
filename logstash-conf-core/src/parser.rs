use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::document::{PluginDeclaration, Role, SourceDocument};
use crate::value::{decode_value, Settings};

/// Errors that can occur while parsing a pipeline configuration.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Failed to read input file.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    /// No plugin was declared inside any `input` block.
    #[error("at least one input plugin is required")]
    MissingInput,
    /// No plugin was declared inside any `output` block.
    #[error("at least one output plugin is required")]
    MissingOutput,
    /// An opening brace was never closed.
    #[error("unclosed {what} starting on line {line}")]
    Unclosed { what: String, line: usize },
}

impl ParseError {
    /// Source line the error points at, when it has one.
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::Unclosed { line, .. } => Some(*line),
            _ => None,
        }
    }
}

/// Parse pipeline configuration text into a [`SourceDocument`].
///
/// The whole document either parses or fails; no partial result is returned.
pub fn parse(text: &str) -> Result<SourceDocument, ParseError> {
    let bytes = text.as_bytes();
    let end = bytes.len();

    let mut inputs = Vec::new();
    let mut filters = Vec::new();
    let mut outputs = Vec::new();

    let mut i = 0;
    while i < end {
        let b = bytes[i];
        if b == b'#' {
            i = skip_comment(bytes, i, end);
            continue;
        }
        if b == b'"' || b == b'\'' {
            i = skip_string(bytes, i, end);
            continue;
        }
        if !is_ident_start(b) || (i > 0 && is_ident_byte(bytes[i - 1])) {
            i += 1;
            continue;
        }

        let word_end = scan_ident(bytes, i, end);
        let Some(role) = role_keyword(&text[i..word_end]) else {
            i = word_end;
            continue;
        };
        let brace = skip_whitespace(bytes, word_end, end);
        if brace >= end || bytes[brace] != b'{' {
            i = word_end;
            continue;
        }

        let close = matching_brace(bytes, brace, end).ok_or_else(|| ParseError::Unclosed {
            what: format!("{role} block"),
            line: line_of(text, i),
        })?;
        let target = match role {
            Role::Input => &mut inputs,
            Role::Filter => &mut filters,
            Role::Output => &mut outputs,
        };
        extract_plugins(text, role, brace + 1, close, None, target)?;
        i = close + 1;
    }

    if inputs.is_empty() {
        return Err(ParseError::MissingInput);
    }
    if outputs.is_empty() {
        return Err(ParseError::MissingOutput);
    }

    Ok(SourceDocument::new(inputs, filters, outputs, text.to_string()))
}

/// Parse a pipeline configuration file into a [`SourceDocument`].
pub fn parse_file(path: &Path) -> Result<SourceDocument, ParseError> {
    let text = fs::read_to_string(path)?;
    parse(&text)
}

/// Collect `name { ... }` declarations between `start` and `end`.
///
/// `if` / `else` branches are descended into and their plugins are recorded
/// with the branch condition attached.
fn extract_plugins(
    text: &str,
    role: Role,
    start: usize,
    end: usize,
    condition: Option<&str>,
    out: &mut Vec<PluginDeclaration>,
) -> Result<(), ParseError> {
    let bytes = text.as_bytes();
    let mut i = start;

    while i < end {
        i = skip_trivia(bytes, i, end);
        if i >= end {
            break;
        }
        let b = bytes[i];
        if b == b'"' || b == b'\'' {
            i = skip_string(bytes, i, end);
            continue;
        }
        if !is_ident_start(b) {
            i += 1;
            continue;
        }

        let name_start = i;
        let name_end = scan_ident(bytes, i, end);
        let name = &text[name_start..name_end];

        if name == "if" || name == "else" {
            let brace = find_open_brace(bytes, name_end, end).ok_or_else(|| {
                ParseError::Unclosed {
                    what: "conditional".to_string(),
                    line: line_of(text, name_start),
                }
            })?;
            let close = matching_brace(bytes, brace, end).ok_or_else(|| ParseError::Unclosed {
                what: "conditional".to_string(),
                line: line_of(text, name_start),
            })?;
            let branch = collapse_whitespace(&text[name_start..brace]);
            let chain = match condition {
                Some(outer) => format!("{outer} and {branch}"),
                None => branch,
            };
            extract_plugins(text, role, brace + 1, close, Some(&chain), out)?;
            i = close + 1;
            continue;
        }

        let brace = skip_whitespace(bytes, name_end, end);
        if brace >= end || bytes[brace] != b'{' {
            i = name_end;
            continue;
        }

        let line = line_of(text, name_start);
        let close = matching_brace(bytes, brace, end).ok_or_else(|| ParseError::Unclosed {
            what: format!("{role} plugin '{name}'"),
            line,
        })?;
        let settings = parse_settings(text, brace + 1, close);
        let mut decl = PluginDeclaration::new(role, name, settings, line);
        if let Some(condition) = condition {
            decl = decl.with_condition(condition);
        }
        out.push(decl);
        i = close + 1;
    }

    Ok(())
}

/// Split a plugin body into `key => value` pairs.
///
/// Keys are only recognised at nesting depth zero and outside strings, so a
/// nested hash such as `match => { "message" => "..." }` stays one value.
fn parse_settings(text: &str, start: usize, end: usize) -> Settings {
    let bytes = text.as_bytes();
    let mut keys: Vec<(usize, usize, usize)> = Vec::new();
    let mut depth = 0usize;
    let mut i = start;

    while i < end {
        let b = bytes[i];
        match b {
            b'#' => {
                i = skip_comment(bytes, i, end);
                continue;
            }
            b'"' | b'\'' => {
                i = skip_string(bytes, i, end);
                continue;
            }
            b'{' | b'[' => depth += 1,
            b'}' | b']' => depth = depth.saturating_sub(1),
            _ => {}
        }

        if depth == 0 && is_ident_start(b) && !is_ident_byte(bytes[i - 1]) {
            let key_end = scan_ident(bytes, i, end);
            let arrow = skip_whitespace(bytes, key_end, end);
            if arrow + 1 < end && bytes[arrow] == b'=' && bytes[arrow + 1] == b'>' {
                keys.push((i, key_end, arrow + 2));
                i = arrow + 2;
            } else {
                i = key_end;
            }
            continue;
        }
        i += 1;
    }

    let mut settings = Settings::new();
    for (idx, &(key_start, key_end, value_start)) in keys.iter().enumerate() {
        let value_end = keys
            .get(idx + 1)
            .map(|&(next_start, _, _)| next_start)
            .unwrap_or(end);
        let raw = strip_comments(&text[value_start..value_end]);
        settings.insert(
            text[key_start..key_end].to_string(),
            decode_value(&raw),
        );
    }
    settings
}

fn role_keyword(word: &str) -> Option<Role> {
    Role::ALL
        .into_iter()
        .find(|role| word.eq_ignore_ascii_case(role.keyword()))
}

/// Return the index of the `}` matching the `{` at `open`.
fn matching_brace(bytes: &[u8], open: usize, end: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = open;
    while i < end {
        match bytes[i] {
            b'#' => {
                i = skip_comment(bytes, i, end);
                continue;
            }
            b'"' | b'\'' => {
                i = skip_string(bytes, i, end);
                continue;
            }
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

fn find_open_brace(bytes: &[u8], from: usize, end: usize) -> Option<usize> {
    let mut i = from;
    while i < end {
        match bytes[i] {
            b'"' | b'\'' => {
                i = skip_string(bytes, i, end);
                continue;
            }
            b'{' => return Some(i),
            _ => {}
        }
        i += 1;
    }
    None
}

/// Skip a quoted literal starting at `i`; returns the index after its closing quote.
fn skip_string(bytes: &[u8], i: usize, end: usize) -> usize {
    let quote = bytes[i];
    let mut j = i + 1;
    while j < end {
        match bytes[j] {
            b'\\' => j += 2,
            b if b == quote => return j + 1,
            _ => j += 1,
        }
    }
    end
}

fn skip_comment(bytes: &[u8], i: usize, end: usize) -> usize {
    let mut j = i;
    while j < end && bytes[j] != b'\n' {
        j += 1;
    }
    j
}

fn skip_whitespace(bytes: &[u8], i: usize, end: usize) -> usize {
    let mut j = i;
    while j < end && bytes[j].is_ascii_whitespace() {
        j += 1;
    }
    j
}

fn skip_trivia(bytes: &[u8], i: usize, end: usize) -> usize {
    let mut j = i;
    loop {
        j = skip_whitespace(bytes, j, end);
        if j < end && bytes[j] == b'#' {
            j = skip_comment(bytes, j, end);
        } else {
            return j;
        }
    }
}

fn scan_ident(bytes: &[u8], i: usize, end: usize) -> usize {
    let mut j = i;
    while j < end && is_ident_byte(bytes[j]) {
        j += 1;
    }
    j
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn line_of(text: &str, offset: usize) -> usize {
    text.as_bytes()[..offset]
        .iter()
        .filter(|&&b| b == b'\n')
        .count()
        + 1
}

/// Drop `#` comments that sit outside quoted literals.
fn strip_comments(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut out = String::with_capacity(raw.len());
    let mut last = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'"' | b'\'' => i = skip_string(bytes, i, bytes.len()),
            b'#' => {
                out.push_str(&raw[last..i]);
                i = skip_comment(bytes, i, bytes.len());
                last = i;
            }
            _ => i += 1,
        }
    }
    out.push_str(&raw[last..]);
    out
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
