//! Translation of a parsed source document into a Vector pipeline.

use std::path::PathBuf;

use logstash_conf_core::{parse, render_declaration, PluginDeclaration, Role, SourceDocument};
use tracing::{debug, info};

use crate::guidance::{Guidance, GuidanceCatalog};
use crate::report::{
    ErrorKind, MigrationError, MigrationReport, ReportBuilder, SupportedRecord, UnsupportedRecord,
};
use crate::target::{ComponentRole, PlannedComponent, TargetDocument, UnwiredComponent};
use crate::transform::TransformerRegistry;

/// Source and target paths recorded in the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationPaths {
    pub source: PathBuf,
    pub target: PathBuf,
}

impl MigrationPaths {
    pub fn new(source: impl Into<PathBuf>, target: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

/// Output of one translation. `document` is `None` when the pipeline could not
/// be assembled; the report says why.
#[derive(Debug, Clone)]
pub struct Translation {
    pub document: Option<TargetDocument>,
    pub report: MigrationReport,
}

/// Deterministic component id: `<name>_<role>_<index>`.
pub fn component_id(decl: &PluginDeclaration, index: usize) -> String {
    format!("{}_{}_{}", decl.name(), decl.role(), index)
}

/// Parse `text` and translate it.
///
/// A parse failure yields a report with a single `parse_error` and no document.
pub fn migrate_source(
    text: &str,
    paths: &MigrationPaths,
    registry: &TransformerRegistry,
    catalog: &GuidanceCatalog,
) -> Translation {
    match parse(text) {
        Ok(document) => translate(&document, registry, catalog, paths),
        Err(err) => {
            info!(source = %paths.source.display(), error = %err, "parse failed");
            let mut builder = ReportBuilder::new(&paths.source, &paths.target);
            let mut error = MigrationError::new(ErrorKind::ParseError, err.to_string(), &paths.source);
            if let Some(line) = err.line() {
                error = error.at_line(line);
            }
            builder.error(error);
            Translation {
                document: None,
                report: builder.build(),
            }
        }
    }
}

/// Translate every plugin of `document` into one target pipeline.
pub fn translate(
    document: &SourceDocument,
    registry: &TransformerRegistry,
    catalog: &GuidanceCatalog,
    paths: &MigrationPaths,
) -> Translation {
    let mut builder = ReportBuilder::new(&paths.source, &paths.target);
    let mut planned = Vec::new();
    let mut input_ids: Vec<String> = Vec::new();
    let mut last_filter: Option<String> = None;

    for role in Role::ALL {
        for (index, decl) in document.plugins(role).iter().enumerate() {
            let id = component_id(decl, index);

            if let Some(condition) = decl.condition() {
                builder.warning(format!(
                    "{} ({}) at line {} is inside conditional `{}`; condition was not translated",
                    decl.name(),
                    role,
                    decl.line(),
                    condition
                ));
            }

            let mut component = match registry.lookup(role, decl.name()) {
                Some(transformer) => match transformer.transform(decl) {
                    Ok(component) => {
                        debug!(plugin = decl.name(), %role, id = %id, "translated");
                        let note = format!(
                            "Migrated to Vector {} {}",
                            component.component_kind, component.role
                        );
                        builder.supported(SupportedRecord::new(decl, vec![id.clone()], Some(note)));
                        component
                    }
                    Err(err) => {
                        debug!(plugin = decl.name(), %role, error = %err, "transform failed");
                        builder.error(
                            MigrationError::new(
                                ErrorKind::TransformationError,
                                err.to_string(),
                                &paths.source,
                            )
                            .at_line(decl.line()),
                        );
                        continue;
                    }
                },
                None => {
                    debug!(plugin = decl.name(), %role, id = %id, "no transformer, placeholder");
                    let guidance = catalog.lookup(role, decl.name());
                    let (component, record) = placeholder(decl, &id, guidance);
                    builder.unsupported(record);
                    component
                }
            };
            if let Some(condition) = decl.condition() {
                component.annotate(format!("Declared under conditional: {condition}"));
            }

            // linear wiring: the latest filter, or every input when no filter exists yet
            let inputs = match role {
                Role::Input => Vec::new(),
                Role::Filter | Role::Output => match &last_filter {
                    Some(filter) => vec![filter.clone()],
                    None => input_ids.clone(),
                },
            };
            match role {
                Role::Input => input_ids.push(id.clone()),
                Role::Filter => last_filter = Some(id.clone()),
                Role::Output => {}
            }
            planned.push(PlannedComponent {
                id,
                component,
                inputs,
            });
        }
    }

    let has_role = |role: ComponentRole| planned.iter().any(|p| p.component.role == role);
    let missing = [
        (ComponentRole::Source, "no source components produced"),
        (ComponentRole::Sink, "no sink components produced"),
    ]
    .into_iter()
    .filter(|(role, _)| !has_role(*role))
    .map(|(_, message)| message)
    .collect::<Vec<_>>();

    let document = if missing.is_empty() {
        match TargetDocument::assemble(planned) {
            Ok(document) => Some(document),
            Err(err) => {
                builder.error(MigrationError::new(
                    ErrorKind::TransformationError,
                    err.to_string(),
                    &paths.source,
                ));
                None
            }
        }
    } else {
        for message in missing {
            builder.error(MigrationError::new(
                ErrorKind::TransformationError,
                message,
                &paths.source,
            ));
        }
        None
    };

    let report = builder.build();
    info!(
        source = %paths.source.display(),
        supported = report.supported().len(),
        unsupported = report.unsupported().len(),
        errors = report.errors().len(),
        "translated document"
    );
    Translation { document, report }
}

fn placeholder(
    decl: &PluginDeclaration,
    id: &str,
    guidance: Guidance,
) -> (UnwiredComponent, UnsupportedRecord) {
    let role = ComponentRole::for_plugin(decl.role());
    let kind = match role {
        ComponentRole::Source => "stdin",
        ComponentRole::Transform => "remap",
        ComponentRole::Sink => "blackhole",
    };
    let original = render_declaration(decl);

    let mut component = UnwiredComponent::new(role, kind);
    component.annotate(format!(
        "TODO: Manually migrate {} plugin '{}' (line {})",
        decl.role(),
        decl.name(),
        decl.line()
    ));
    component.annotate("Original Logstash configuration:");
    for line in original.iter().flat_map(|line| line.lines()) {
        component.annotate(format!("  {line}"));
    }
    if !guidance.alternatives.is_empty() {
        component.annotate("Suggested alternatives:");
        for alternative in &guidance.alternatives {
            component.annotate(format!("  - {alternative}"));
        }
    }
    component.annotate("Migration guidance:");
    for line in guidance.guidance.lines() {
        component.annotate(format!("  {line}"));
    }

    let record = UnsupportedRecord {
        plugin_name: decl.name().to_string(),
        role: decl.role(),
        line: decl.line(),
        original_text: original.join("\n"),
        guidance: guidance.guidance,
        alternatives: guidance.alternatives,
        placeholder_id: id.to_string(),
    };
    (component, record)
}

#[cfg(test)]
mod tests {
    use logstash_conf_core::parse;
    use pretty_assertions::assert_eq;

    use super::{migrate_source, translate, MigrationPaths};
    use crate::guidance::GuidanceCatalog;
    use crate::report::ErrorKind;
    use crate::target::ComponentRole;
    use crate::transform::TransformerRegistry;

    fn paths() -> MigrationPaths {
        MigrationPaths::new("pipeline.conf", "pipeline.toml")
    }

    #[test]
    fn filters_chain_linearly() {
        let doc = parse(
            "input { file { path => \"/a\" } beats { port => 5044 } }\n\
             filter { grok { match => { \"message\" => \"%{WORD:w}\" } } date { match => [\"ts\", \"ISO8601\"] } }\n\
             output { file { path => \"/out\" } }",
        )
        .expect("parse");
        let translation = translate(
            &doc,
            &TransformerRegistry::builtin(),
            &GuidanceCatalog::default(),
            &paths(),
        );
        let target = translation.document.expect("document");

        let grok = target.get("grok_filter_0").expect("grok");
        assert_eq!(grok.inputs(), &["file_input_0".to_string(), "beats_input_1".to_string()]);
        let date = target.get("date_filter_1").expect("date");
        assert_eq!(date.inputs(), &["grok_filter_0".to_string()]);
        let sink = target.get("file_output_0").expect("sink");
        assert_eq!(sink.inputs(), &["date_filter_1".to_string()]);
        assert_eq!(translation.report.success_rate(), 1.0);
    }

    #[test]
    fn transform_errors_drop_the_plugin() {
        let doc = parse(
            "input { beats { port => \"abc\" } file { path => \"/a\" } }\noutput { stdout {} }",
        )
        .expect("parse");
        let translation = translate(
            &doc,
            &TransformerRegistry::builtin(),
            &GuidanceCatalog::default(),
            &paths(),
        );
        let target = translation.document.expect("document");
        assert!(target.get("beats_input_0").is_none());
        assert_eq!(target.sources().len(), 1);
        let errors = translation.report.errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::TransformationError);
        assert_eq!(errors[0].line, Some(1));
    }

    #[test]
    fn missing_sinks_yield_no_document() {
        let doc = parse("input { stdin {} }\noutput { elasticsearch { hosts => { \"a\" => \"b\" } } }")
            .expect("parse");
        let translation = translate(
            &doc,
            &TransformerRegistry::builtin(),
            &GuidanceCatalog::default(),
            &paths(),
        );
        assert!(translation.document.is_none());
        assert!(translation
            .report
            .errors()
            .iter()
            .any(|e| e.message == "no sink components produced"));
    }

    #[test]
    fn placeholders_use_role_specific_kinds() {
        let doc = parse("input { kafka { topics => [\"a\"] } }\nfilter { ruby { code => \"x\" } }\noutput { s3 { bucket => \"b\" } }")
            .expect("parse");
        let translation = translate(
            &doc,
            &TransformerRegistry::builtin(),
            &GuidanceCatalog::default(),
            &paths(),
        );
        let target = translation.document.expect("document");
        let kinds = target
            .components()
            .map(|(id, c)| (id.as_str(), c.component_kind(), c.role()))
            .collect::<Vec<_>>();
        assert_eq!(
            kinds,
            vec![
                ("kafka_input_0", "stdin", ComponentRole::Source),
                ("ruby_filter_0", "remap", ComponentRole::Transform),
                ("s3_output_0", "blackhole", ComponentRole::Sink),
            ]
        );
        let kafka = target.get("kafka_input_0").expect("kafka");
        assert!(kafka.settings().is_empty());
        assert!(kafka.annotations()[0].starts_with("TODO: Manually migrate input plugin 'kafka'"));
        assert!(kafka.annotations().iter().any(|a| a.contains("topics => [\"a\"]")));
        assert_eq!(translation.report.success_rate(), 0.0);
    }

    #[test]
    fn conditionals_produce_warnings() {
        let doc = parse(
            "input { stdin {} }\noutput { if [level] == \"error\" { stdout {} } }",
        )
        .expect("parse");
        let translation = translate(
            &doc,
            &TransformerRegistry::builtin(),
            &GuidanceCatalog::default(),
            &paths(),
        );
        assert_eq!(translation.report.warnings().len(), 1);
        assert!(translation.report.warnings()[0].contains("[level] == \"error\""));
    }

    #[test]
    fn parse_failures_become_report_errors() {
        let translation = migrate_source(
            "input { stdin {} }",
            &paths(),
            &TransformerRegistry::builtin(),
            &GuidanceCatalog::default(),
        );
        assert!(translation.document.is_none());
        assert_eq!(translation.report.errors()[0].kind, ErrorKind::ParseError);
    }
}
