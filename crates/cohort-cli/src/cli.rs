//! Command-line arguments.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use cohort_model::parse_date;
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "cohort",
    version,
    about = "Classify patient cohorts from redundant clinical observations",
    long_about = "Evaluate cohort rules over subjects whose facts are reported by several\n\
                  clinical instruments. Reports are reconciled by date and instrument\n\
                  precedence before each rule decides."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format.
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow subject identifiers in log output.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Evaluate one rule, or every enabled rule, over a cohort file.
    Evaluate(EvaluateArgs),

    /// List the registered rules.
    Rules,
}

#[derive(Parser)]
pub struct EvaluateArgs {
    /// JSON file holding the concept dictionary and per-subject records.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Rule to evaluate (default: every enabled rule).
    #[arg(long = "rule", value_name = "ID")]
    pub rule: Option<String>,

    /// Rules to skip when evaluating every rule.
    #[arg(long = "disable", value_name = "ID")]
    pub disable: Vec<String>,

    /// Facility the cohort is drawn from.
    #[arg(long = "location", value_name = "ID")]
    pub location: u32,

    /// Reporting period end (YYYY-MM-DD).
    #[arg(long = "on-or-before", value_name = "DATE", value_parser = parse_date)]
    pub on_or_before: Option<NaiveDate>,

    /// Reporting period start (YYYY-MM-DD).
    #[arg(long = "on-or-after", value_name = "DATE", value_parser = parse_date)]
    pub on_or_after: Option<NaiveDate>,

    /// Additional rule flag, e.g. `countDispensations=false`.
    #[arg(long = "flag", value_name = "NAME=BOOL", value_parser = parse_flag)]
    pub flags: Vec<(String, bool)>,

    /// TOML file overriding rule thresholds.
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Output format.
    #[arg(long = "format", value_enum, default_value = "table")]
    pub format: OutputFormatArg,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormatArg {
    Table,
    Json,
    Csv,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

fn parse_flag(value: &str) -> Result<(String, bool), String> {
    let (name, raw) = value
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=BOOL, got {value:?}"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("flag name missing in {value:?}"));
    }
    let flag = match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => true,
        "false" | "no" | "0" => false,
        other => return Err(format!("{other:?} is not a boolean")),
    };
    Ok((name.to_string(), flag))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_parse_as_name_and_bool() {
        assert_eq!(
            parse_flag("countDispensations=false"),
            Ok(("countDispensations".to_string(), false))
        );
        assert_eq!(parse_flag(" x = YES"), Ok(("x".to_string(), true)));
        assert!(parse_flag("x").is_err());
        assert!(parse_flag("=true").is_err());
        assert!(parse_flag("x=maybe").is_err());
    }

    #[test]
    fn evaluate_arguments() {
        let cli = Cli::try_parse_from([
            "cohort",
            "evaluate",
            "cohort.json",
            "--location",
            "7",
            "--on-or-before",
            "2024-12-31",
            "--flag",
            "countDispensations=false",
            "--format",
            "csv",
        ])
        .unwrap();
        let Command::Evaluate(args) = cli.command else {
            panic!("expected evaluate");
        };
        assert_eq!(args.location, 7);
        assert_eq!(args.on_or_before, NaiveDate::from_ymd_opt(2024, 12, 31));
        assert_eq!(args.flags, vec![("countDispensations".to_string(), false)]);
        assert!(matches!(args.format, OutputFormatArg::Csv));
    }
}
