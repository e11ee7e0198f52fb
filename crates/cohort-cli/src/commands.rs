use std::time::Instant;

use anyhow::{Context, Result};
use cohort_model::{EvaluationParams, LocationId};
use cohort_rules::{BatchEvaluator, CohortResults, default_registry};
use comfy_table::Table;
use tracing::{debug, info, info_span};

use cohort_cli::input::{load_input, load_settings};
use cohort_cli::logging::redact_value;

use crate::cli::EvaluateArgs;
use crate::summary::apply_table_style;

pub fn run_rules() -> Result<()> {
    let registry = default_registry();
    let mut table = Table::new();
    table.set_header(vec!["Rule", "Result", "Requires", "Description"]);
    apply_table_style(&mut table);
    for rule in registry.enabled() {
        table.add_row(vec![
            rule.id().to_string(),
            rule.output().to_string(),
            rule.required_parameters().join(", "),
            rule.description().to_string(),
        ]);
    }
    println!("{table}");
    Ok(())
}

pub fn run_evaluate(args: &EvaluateArgs) -> Result<Vec<CohortResults>> {
    let span = info_span!("run", input = %args.input.display());
    let _guard = span.enter();
    let start = Instant::now();

    let input = load_input(&args.input)?;
    let settings = load_settings(args.config.as_deref())?;
    let params = build_params(args);
    let cohort = input.subjects.cohort();
    info!(
        subjects = cohort.len(),
        concepts = input.dictionary.concept_count(),
        "cohort loaded"
    );

    let mut registry = default_registry();
    for id in &args.disable {
        if !registry.disable(id) {
            anyhow::bail!("cannot disable unknown rule {id:?}");
        }
    }
    let evaluator = BatchEvaluator::new(&registry, &input.dictionary, &input.subjects, &settings);
    let results = match &args.rule {
        Some(rule) => vec![
            evaluator
                .evaluate(&cohort, rule, &params)
                .with_context(|| format!("evaluate rule {rule}"))?,
        ],
        None => evaluator
            .evaluate_all(&cohort, &params)
            .context("evaluate rules")?,
    };

    for cohort_results in &results {
        for (subject, result) in cohort_results.results() {
            debug!(
                rule = cohort_results.rule(),
                subject = redact_value(subject.as_str()),
                %result,
                "result"
            );
        }
    }
    info!(
        rules = results.len(),
        duration_ms = start.elapsed().as_millis(),
        "run complete"
    );
    Ok(results)
}

fn build_params(args: &EvaluateArgs) -> EvaluationParams {
    let mut params = EvaluationParams::new(LocationId::new(args.location));
    if let Some(date) = args.on_or_before {
        params = params.with_on_or_before(date);
    }
    if let Some(date) = args.on_or_after {
        params = params.with_on_or_after(date);
    }
    for (name, value) in &args.flags {
        params = params.with_flag(name.clone(), *value);
    }
    params
}
