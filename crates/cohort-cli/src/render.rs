//! Machine-readable output of cohort results.
//!
//! Both renderers list only determined subjects; undetermined subjects are
//! absent rather than printed as empty cells.

use anyhow::{Context, Result};
use cohort_rules::CohortResults;
use serde::Serialize;

/// One row per (rule, subject): `rule,subject,result`.
///
/// Flags render as `true`/`false`, labels as their code.
pub fn render_csv(results: &[CohortResults]) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record(["rule", "subject", "result"])?;
    for cohort in results {
        for (subject, result) in cohort.results() {
            let value = match result.as_flag() {
                Some(flag) => flag.to_string(),
                None => result.to_string(),
            };
            writer.write_record([cohort.rule(), subject.as_str(), value.as_str()])?;
        }
    }
    let bytes = writer.into_inner().context("flush csv output")?;
    String::from_utf8(bytes).context("csv output is not UTF-8")
}

#[derive(Serialize)]
struct RunOutput<'a> {
    rules: &'a [CohortResults],
}

pub fn render_json(results: &[CohortResults]) -> Result<String> {
    serde_json::to_string_pretty(&RunOutput { rules: results }).context("serialize results")
}
