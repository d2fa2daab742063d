//! Stage orchestration with a file-based handoff contract.
//!
//! The patient cleaner runs first and persists the valid cohort; every
//! linker stage reloads that cohort from the cleaned patient file, so a
//! single stage can also run standalone against a previous run's output.
//! Stage order within a full run:
//!
//! 1. **Patients**: partition raw patients into valid/excluded files
//! 2. **Conditions / Observations / Medications / Encounters**: filter each
//!    raw table against the persisted cohort (and its dictionary, where one
//!    applies) and write the cleaned table
//!
//! Missing inputs and dictionaries abort the failing stage with no partial
//! output; per-row problems only ever show up in the aggregate counts.

use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{info, info_span, warn};

use cohort_clean::{
    CohortIds, clean_patients, link_conditions, link_encounters, link_medications,
    link_observations,
};
use cohort_ingest::{read_patients, read_typed, resolve_table_path, write_records};
use cohort_model::{
    HypertensionDefinition, LinkReport, PatientCleaningReport, PipelineConfig, RawCondition,
    RawEncounter, RawMedication, RawObservation,
};
use cohort_terminology::{CodeSet, CodeSystem, load_code_set};

use crate::types::RunResult;

/// Run the patient cleaning stage and persist both partitions.
pub fn run_patients(config: &PipelineConfig) -> Result<PatientCleaningReport> {
    let span = info_span!("patients");
    let _guard = span.enter();
    let start = Instant::now();

    let path = resolve_table_path(&config.data_dir, "patients").context("locate patient table")?;
    let rows = read_patients(&path).context("read patient table")?;
    let cleaning = clean_patients(&rows, config.as_of);
    write_records(&config.clean_patients_path(), &cleaning.valid)
        .context("write clean_patients")?;
    write_records(&config.excluded_patients_path(), &cleaning.excluded)
        .context("write excluded_patients")?;

    info!(
        initial = cleaning.report.initial,
        valid = cleaning.report.valid,
        excluded = cleaning.report.excluded,
        duration_ms = start.elapsed().as_millis(),
        "patient cleaning complete"
    );
    Ok(cleaning.report)
}

/// Reload the persisted valid cohort. Fails when the patient cleaner has
/// not run against this output directory yet.
fn load_cohort(config: &PipelineConfig) -> Result<CohortIds> {
    let cohort = CohortIds::load(&config.clean_patients_path())?;
    if cohort.is_empty() {
        warn!("valid cohort is empty; all linker stages will drop every row");
    }
    Ok(cohort)
}

pub fn run_conditions(config: &PipelineConfig) -> Result<LinkReport> {
    let span = info_span!("conditions");
    let _guard = span.enter();
    let start = Instant::now();

    let cohort = load_cohort(config)?;
    let snomed =
        load_code_set(&config.dictionaries.snomed, CodeSystem::Snomed).context("load SNOMED")?;
    let path =
        resolve_table_path(&config.data_dir, "conditions").context("locate condition table")?;
    let rows: Vec<RawCondition> = read_typed(&path).context("read condition table")?;
    let (cleaned, report) = link_conditions(&rows, &cohort, &snomed);
    write_records(&config.clean_conditions_path(), &cleaned).context("write clean_conditions")?;

    log_link_report(&report, start);
    Ok(report)
}

pub fn run_observations(config: &PipelineConfig) -> Result<LinkReport> {
    let span = info_span!("observations");
    let _guard = span.enter();
    let start = Instant::now();

    let cohort = load_cohort(config)?;
    let loinc =
        load_code_set(&config.dictionaries.loinc, CodeSystem::Loinc).context("load LOINC")?;
    let path =
        resolve_table_path(&config.data_dir, "observations").context("locate observation table")?;
    let rows: Vec<RawObservation> = read_typed(&path).context("read observation table")?;
    let (cleaned, report) = link_observations(&rows, &cohort, &loinc);
    write_records(&config.clean_observations_path(), &cleaned)
        .context("write clean_observations")?;

    log_link_report(&report, start);
    Ok(report)
}

pub fn run_medications(config: &PipelineConfig) -> Result<LinkReport> {
    let span = info_span!("medications");
    let _guard = span.enter();
    let start = Instant::now();

    let cohort = load_cohort(config)?;
    let rxnorm =
        load_code_set(&config.dictionaries.rxnorm, CodeSystem::Rxnorm).context("load RXNORM")?;
    let path =
        resolve_table_path(&config.data_dir, "medications").context("locate medication table")?;
    let rows: Vec<RawMedication> = read_typed(&path).context("read medication table")?;
    let (cleaned, report) = link_medications(&rows, &cohort, &rxnorm);
    write_records(&config.clean_medications_path(), &cleaned)
        .context("write clean_medications")?;

    log_link_report(&report, start);
    Ok(report)
}

pub fn run_encounters(config: &PipelineConfig) -> Result<LinkReport> {
    let span = info_span!("encounters");
    let _guard = span.enter();
    let start = Instant::now();

    let cohort = load_cohort(config)?;
    let path =
        resolve_table_path(&config.data_dir, "encounters").context("locate encounter table")?;
    let rows: Vec<RawEncounter> = read_typed(&path).context("read encounter table")?;
    let (cleaned, report) = link_encounters(&rows, &cohort);
    write_records(&config.clean_encounters_path(), &cleaned).context("write clean_encounters")?;

    log_link_report(&report, start);
    Ok(report)
}

/// Run the whole pipeline: patient cleaning, then the four independent
/// linker stages against the freshly persisted cohort.
pub fn run_all(config: &PipelineConfig) -> Result<RunResult> {
    let mut result = RunResult::new(config.output_dir.clone(), config.hypertension.clone());
    result.patients = Some(run_patients(config)?);

    // The definition is configuration, not a filter; an unknown code is
    // worth a warning because downstream cohort analytics will match
    // nothing on it.
    let snomed =
        load_code_set(&config.dictionaries.snomed, CodeSystem::Snomed).context("load SNOMED")?;
    check_hypertension_definition(&config.hypertension, &snomed);

    result.links.push(run_conditions(config)?);
    result.links.push(run_observations(config)?);
    result.links.push(run_medications(config)?);
    result.links.push(run_encounters(config)?);
    Ok(result)
}

fn check_hypertension_definition(definition: &HypertensionDefinition, snomed: &CodeSet) {
    for code in &definition.codes {
        if !snomed.contains(code) {
            warn!(
                version = %definition.version,
                code = %code,
                "hypertension cohort code is not in the SNOMED dictionary"
            );
        }
    }
}

fn log_link_report(report: &LinkReport, start: Instant) {
    info!(
        stage = report.stage.as_str(),
        input = report.input_rows,
        output = report.output_rows,
        dropped_unknown_patient = report.dropped_unknown_patient,
        dropped_unparseable_code = report.dropped_unparseable_code,
        dropped_unknown_code = report.dropped_unknown_code,
        dropped_missing_start = report.dropped_missing_start,
        unique_patients = report.unique_patients,
        unique_codes = report.unique_codes,
        duration_ms = start.elapsed().as_millis(),
        "linkage complete"
    );
}
