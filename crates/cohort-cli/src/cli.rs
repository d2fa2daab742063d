//! CLI argument definitions for the cohort pipeline.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "cohort",
    version,
    about = "Patient-record cleaning and cohort-linkage pipeline",
    long_about = "Clean raw patient, condition, observation, medication, and encounter\n\
                  tables against the SNOMED/LOINC/RXNORM reference dictionaries and link\n\
                  every table to the validated patient cohort.\n\n\
                  The patient stage must run (and persist its output) before any linker\n\
                  stage; `run` executes all five in order."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Log output format (pretty for human, json for machine parsing).
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
}

#[derive(Subcommand)]
pub enum Command {
    /// Run all five stages: patients, then the four linkers.
    Run(StageArgs),

    /// Clean the raw patient table into valid/excluded partitions.
    Patients(StageArgs),

    /// Link conditions to the persisted cohort (SNOMED-validated).
    Conditions(StageArgs),

    /// Link observations to the persisted cohort (LOINC-validated).
    Observations(StageArgs),

    /// Link medications to the persisted cohort (RXNORM-validated).
    Medications(StageArgs),

    /// Link encounters to the persisted cohort.
    Encounters(StageArgs),
}

#[derive(Parser)]
pub struct StageArgs {
    /// Directory holding the raw tables and reference dictionaries.
    #[arg(long = "data-dir", value_name = "DIR", default_value = "data/original")]
    pub data_dir: PathBuf,

    /// Directory the cleaned tables are written to.
    #[arg(
        long = "output-dir",
        value_name = "DIR",
        default_value = "data/processed"
    )]
    pub output_dir: PathBuf,

    /// The "current date" for age derivation (YYYY-MM-DD).
    ///
    /// Ages are a function of this date, so pin it to make re-runs
    /// reproducible. Defaults to today.
    #[arg(long = "as-of", value_name = "DATE")]
    pub as_of: Option<NaiveDate>,

    /// Versioned hypertension cohort definition to carry through the run.
    #[arg(
        long = "hypertension-cohort",
        value_name = "VERSION",
        default_value = "v3-extended"
    )]
    pub hypertension_cohort: String,

    /// Explicit SNOMED codes overriding the versioned definition
    /// (repeatable).
    #[arg(long = "hypertension-code", value_name = "CODE")]
    pub hypertension_codes: Vec<String>,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
