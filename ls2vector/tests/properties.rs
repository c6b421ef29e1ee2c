use std::collections::BTreeSet;

use ls2vector::guidance::GuidanceCatalog;
use ls2vector::target::ComponentRole;
use ls2vector::transform::TransformerRegistry;
use ls2vector::translate::{migrate_source, MigrationPaths, Translation};
use proptest::prelude::*;

const INPUTS: &[&str] = &["stdin", "kafka", "redis", "syslog"];
const FILTERS: &[&str] = &["mutate", "json", "ruby", "aggregate"];
const OUTPUTS: &[&str] = &["stdout", "http", "tcp", "s3"];

fn pick(
    pool: &'static [&'static str],
    min: usize,
    max: usize,
) -> impl Strategy<Value = Vec<&'static str>> {
    proptest::collection::vec(proptest::sample::select(pool), min..=max)
}

fn block(role: &str, plugins: &[&str]) -> String {
    let mut out = format!("{role} {{\n");
    for (n, name) in plugins.iter().enumerate() {
        out.push_str(&format!("  {name} {{ label => \"{role}-{n}\" }}\n"));
    }
    out.push_str("}\n");
    out
}

fn pipeline(inputs: &[&str], filters: &[&str], outputs: &[&str]) -> String {
    let mut text = block("input", inputs);
    if !filters.is_empty() {
        text.push_str(&block("filter", filters));
    }
    text.push_str(&block("output", outputs));
    text
}

fn run(text: &str) -> Translation {
    migrate_source(
        text,
        &MigrationPaths::new("pipeline.conf", "pipeline.toml"),
        &TransformerRegistry::builtin(),
        &GuidanceCatalog::default(),
    )
}

proptest! {
    #[test]
    fn every_plugin_gets_a_unique_component(
        inputs in pick(INPUTS, 1, 4),
        filters in pick(FILTERS, 0, 4),
        outputs in pick(OUTPUTS, 1, 4),
    ) {
        let translation = run(&pipeline(&inputs, &filters, &outputs));
        let document = translation.document.expect("document");

        let ids = document.components().map(|(id, _)| id.clone()).collect::<Vec<_>>();
        let unique = ids.iter().collect::<BTreeSet<_>>();
        prop_assert_eq!(ids.len(), inputs.len() + filters.len() + outputs.len());
        prop_assert_eq!(unique.len(), ids.len());
    }

    #[test]
    fn wiring_follows_the_linear_policy(
        inputs in pick(INPUTS, 1, 4),
        filters in pick(FILTERS, 0, 4),
        outputs in pick(OUTPUTS, 1, 4),
    ) {
        let translation = run(&pipeline(&inputs, &filters, &outputs));
        let document = translation.document.expect("document");

        let source_ids = document.sources().keys().cloned().collect::<Vec<_>>();
        let transform_ids = document.transforms().keys().cloned().collect::<Vec<_>>();

        for (_, component) in document.components() {
            match component.role() {
                ComponentRole::Source => prop_assert!(component.inputs().is_empty()),
                _ => prop_assert!(!component.inputs().is_empty()),
            }
        }
        for (index, (_, transform)) in document.transforms().iter().enumerate() {
            let expected = match index {
                0 => source_ids.clone(),
                n => vec![transform_ids[n - 1].clone()],
            };
            prop_assert_eq!(transform.inputs(), expected.as_slice());
        }
        let feeding = match transform_ids.last() {
            Some(last) => vec![last.clone()],
            None => source_ids.clone(),
        };
        for (_, sink) in document.sinks() {
            prop_assert_eq!(sink.inputs(), feeding.as_slice());
        }
    }

    #[test]
    fn success_rate_stays_in_unit_interval(
        inputs in pick(INPUTS, 1, 4),
        filters in pick(FILTERS, 0, 4),
        outputs in pick(OUTPUTS, 1, 4),
    ) {
        let report = run(&pipeline(&inputs, &filters, &outputs)).report;
        let rate = report.success_rate();
        let total = report.supported().len() + report.unsupported().len();

        prop_assert!((0.0..=1.0).contains(&rate));
        prop_assert_eq!(total, inputs.len() + filters.len() + outputs.len());
        prop_assert!((rate - report.supported().len() as f64 / total as f64).abs() < 1e-9);
    }

    #[test]
    fn placeholders_carry_todo_and_original_settings(
        inputs in pick(INPUTS, 1, 4),
        filters in pick(FILTERS, 0, 4),
        outputs in pick(OUTPUTS, 1, 4),
    ) {
        let translation = run(&pipeline(&inputs, &filters, &outputs));
        let document = translation.document.expect("document");

        for record in translation.report.unsupported() {
            let placeholder = document.get(&record.placeholder_id).expect("placeholder");
            prop_assert!(placeholder.settings().is_empty());
            prop_assert!(placeholder.annotations().iter().any(|line| line.contains("TODO")));
            prop_assert!(placeholder
                .annotations()
                .iter()
                .any(|line| line.contains("label => ")));
            prop_assert!(!record.guidance.is_empty());
        }
    }
}
