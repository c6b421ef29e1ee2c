//! Logstash to Vector pipeline configuration translation.
//!
//! A Logstash pipeline file is parsed by `logstash-conf-core` into plugin
//! declarations. Each declaration is mapped onto one Vector component by a
//! registered transformer; plugins without one become annotated placeholders
//! so the pipeline keeps its source to sink shape. Every run produces a
//! migration report describing what was translated and what needs manual work.
//!
//! # Modules
//!
//! ## Translation
//!
//! - [`transform`] - Transformer trait, registry, and the built-in mappings
//! - [`guidance`] - Manual migration notes for unmapped plugins
//! - [`translate`] - Orchestration and wiring of components
//! - [`target`] - Vector pipeline model and its invariants
//!
//! ## Output
//!
//! - [`report`] - Per-file and combined migration reports
//! - [`serialize`] - Vector TOML rendering
//! - [`inspect`] - Mapping preview without translating
//!
//! ## Files
//!
//! - [`discover`] - Recursive `.conf` discovery
//! - [`batch`] - Per-file and parallel batch migration
//! - [`path_guard`] - Overwrite protection
//! - [`validate`] - External `vector validate` runs
//!
//! # Examples
//!
//! ```ignore
//! use ls2vector::guidance::GuidanceCatalog;
//! use ls2vector::transform::TransformerRegistry;
//! use ls2vector::translate::{migrate_source, MigrationPaths};
//!
//! let registry = TransformerRegistry::builtin();
//! let catalog = GuidanceCatalog::default();
//! let text = std::fs::read_to_string("pipeline.conf")?;
//! let translation = migrate_source(
//!     &text,
//!     &MigrationPaths::new("pipeline.conf", "pipeline.toml"),
//!     &registry,
//!     &catalog,
//! );
//! println!("{}", translation.report.render_markdown());
//! ```

pub mod batch;
pub mod discover;
pub mod guidance;
pub mod inspect;
pub mod path_guard;
pub mod report;
pub mod serialize;
pub mod target;
pub mod transform;
pub mod translate;
pub mod validate;
