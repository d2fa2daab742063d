//! Cohort pipeline CLI.

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{ColorChoice, Parser};
use std::io::{self, IsTerminal};

use cohort_cli::logging::{LogConfig, LogFormat, init_logging};
use cohort_cli::pipeline::{
    run_all, run_conditions, run_encounters, run_medications, run_observations, run_patients,
};
use cohort_cli::summary::{print_link_summary, print_patient_summary, print_run_summary};
use cohort_model::{HypertensionDefinition, PipelineConfig};

mod cli;

use crate::cli::{Cli, Command, LogFormatArg, StageArgs};

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    if let Err(error) = init_logging(&log_config_from_cli(&cli)) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let exit_code = match run_command(&cli.command) {
        Ok(()) => 0,
        Err(error) => {
            eprintln!("error: {error:#}");
            1
        }
    };
    std::process::exit(exit_code);
}

fn run_command(command: &Command) -> Result<()> {
    match command {
        Command::Run(args) => {
            let config = build_config(args)?;
            let result = run_all(&config)?;
            print_run_summary(&result);
        }
        Command::Patients(args) => {
            let config = build_config(args)?;
            let report = run_patients(&config)?;
            print_patient_summary(&report);
        }
        Command::Conditions(args) => {
            let config = build_config(args)?;
            print_link_summary(&[run_conditions(&config)?]);
        }
        Command::Observations(args) => {
            let config = build_config(args)?;
            print_link_summary(&[run_observations(&config)?]);
        }
        Command::Medications(args) => {
            let config = build_config(args)?;
            print_link_summary(&[run_medications(&config)?]);
        }
        Command::Encounters(args) => {
            let config = build_config(args)?;
            print_link_summary(&[run_encounters(&config)?]);
        }
    }
    Ok(())
}

/// Build the run configuration from stage arguments. The as-of date
/// defaults to today here, at the outermost boundary; everything below the
/// CLI takes it as an explicit input.
fn build_config(args: &StageArgs) -> Result<PipelineConfig> {
    let as_of: NaiveDate = args.as_of.unwrap_or_else(|| Utc::now().date_naive());
    let hypertension = if args.hypertension_codes.is_empty() {
        HypertensionDefinition::from_version(&args.hypertension_cohort)
            .context("resolve hypertension cohort definition")?
    } else {
        HypertensionDefinition::custom("custom", args.hypertension_codes.iter().cloned())
            .context("build custom hypertension cohort definition")?
    };
    Ok(
        PipelineConfig::new(args.data_dir.clone(), args.output_dir.clone(), as_of)
            .with_hypertension(hypertension),
    )
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        use_env_filter: !cli.verbosity.is_present(),
        format: match cli.log_format {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Compact => LogFormat::Compact,
            LogFormatArg::Json => LogFormat::Json,
        },
        log_file: cli.log_file.clone(),
        with_ansi: match cli.color.color {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
        },
    }
}
