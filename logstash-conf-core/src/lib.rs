//! Generic Logstash pipeline configuration parsing primitives used by higher-level tools.
//!
//! The parser understands the block structure of a pipeline file (`input`,
//! `filter` and `output` blocks of `name { key => value }` plugins) and nothing
//! about what any plugin means.

pub mod document;
pub mod parser;
pub mod value;
pub mod writer;

pub use document::{PluginDeclaration, Role, SourceDocument};
pub use parser::{parse, parse_file, ParseError};
pub use value::{decode_value, SettingValue, Settings};
pub use writer::{render_declaration, render_settings, render_value};
