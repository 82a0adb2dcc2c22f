//! High-level pipeline API for workbook to form conversion.
//!
//! This module combines all steps: loading the workbook, indexing option
//! sets, building one form per sheet, and validating the result.
//!
//! # Example
//!
//! ```rust,ignore
//! use o3forms::{convert_workbook, write_forms, ConvertOptions};
//! use std::path::Path;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let forms = convert_workbook(Path::new("metadata.xlsx"), &ConvertOptions::default())?;
//!     let written = write_forms(&forms, Path::new("forms"))?;
//!     println!("Wrote {} forms", written.len());
//!     Ok(())
//! }
//! ```

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use super::form::build_form;
use super::question::{FormIssue, OptionSets, SkippedRow};
use crate::config::ConvertOptions;
use crate::error::{PipelineError, PipelineResult, ValidationError};
use crate::logs::{log_error, log_info, log_success, log_warning, log_warning_indent};
use crate::models::Form;
use crate::parser::Workbook;
use crate::validation::check_form;

/// One converted sheet.
#[derive(Debug, Clone)]
pub struct ConvertedForm {
    /// Sheet the form was built from
    pub sheet: String,
    pub form: Form,
    pub issues: Vec<FormIssue>,
    pub skipped: Vec<SkippedRow>,
    /// Schema violations, empty when valid or when validation was skipped
    pub validation_errors: Vec<String>,
}

impl ConvertedForm {
    pub fn is_valid(&self) -> bool {
        self.validation_errors.is_empty()
    }
}

/// Convert every form sheet of a workbook.
///
/// This is the main entry point for the pipeline. It:
/// 1. Opens the workbook (spreadsheet file or CSV directory)
/// 2. Indexes the option sets sheet
/// 3. Builds a form for every selected sheet
/// 4. Validates each form against the form schema
pub fn convert_workbook(path: &Path, options: &ConvertOptions) -> PipelineResult<Vec<ConvertedForm>> {
    log_info(format!("📖 Reading workbook {}", path.display()));
    let workbook = Workbook::open(path)?;
    log_success(format!("Found {} sheets", workbook.sheet_names().len()));

    convert_loaded(&workbook, options)
}

/// Convert an already loaded workbook.
pub fn convert_loaded(workbook: &Workbook, options: &ConvertOptions) -> PipelineResult<Vec<ConvertedForm>> {
    let option_sets = load_option_sets(workbook, options)?;
    let names = form_sheet_names(workbook, options)?;

    let mut forms = Vec::with_capacity(names.len());
    for name in &names {
        forms.push(convert_sheet(workbook, name, &option_sets, options)?);
    }

    let invalid = forms.iter().filter(|f| !f.is_valid()).count();
    if invalid > 0 {
        log_warning(format!("{} of {} forms failed validation", invalid, forms.len()));
    } else {
        log_success(format!("Converted {} forms", forms.len()));
    }

    Ok(forms)
}

/// Sheets to convert: the configured list, or every sheet except the
/// option sets sheet.
pub fn form_sheet_names(workbook: &Workbook, options: &ConvertOptions) -> PipelineResult<Vec<String>> {
    let names: Vec<String> = if options.sheets.is_empty() {
        workbook
            .sheet_names()
            .into_iter()
            .filter(|name| *name != options.option_sets_sheet)
            .map(str::to_string)
            .collect()
    } else {
        options.sheets.clone()
    };

    if names.is_empty() {
        return Err(PipelineError::NoFormSheets);
    }
    Ok(names)
}

/// Index the option sets sheet. A workbook without one converts with no
/// answers.
pub fn load_option_sets(workbook: &Workbook, options: &ConvertOptions) -> PipelineResult<OptionSets> {
    if !workbook.has_sheet(&options.option_sets_sheet) {
        log_warning(format!(
            "No '{}' sheet, coded questions will have no answers",
            options.option_sets_sheet
        ));
        return Ok(OptionSets::default());
    }

    let sheet = workbook.sheet(&options.option_sets_sheet, options.header_row)?;
    let option_sets = OptionSets::from_sheet(&sheet);
    log_success(format!(
        "Loaded {} option sets from '{}'",
        option_sets.len(),
        sheet.name
    ));
    Ok(option_sets)
}

/// Convert one sheet.
pub fn convert_sheet(
    workbook: &Workbook,
    name: &str,
    option_sets: &OptionSets,
    options: &ConvertOptions,
) -> PipelineResult<ConvertedForm> {
    log_info(format!("📝 Converting sheet '{}'", name));
    let sheet = workbook.sheet(name, options.header_row)?;

    let build = build_form(&sheet, option_sets, options);
    for issue in &build.issues {
        log_warning_indent(
            format!("{} row {}: {} ({})", name, issue.row, issue.message, issue.field),
            1,
        );
    }
    log_success(format!("{}: {}", name, build.summary()));

    let validation_errors = if options.skip_validation {
        Vec::new()
    } else {
        match check_form(&build.form) {
            Ok(()) => Vec::new(),
            Err(ValidationError::SchemaError { errors, .. }) => {
                log_error(format!("{}: {} schema errors", name, errors.len()));
                errors
            }
            Err(e) => return Err(e.into()),
        }
    };

    Ok(ConvertedForm {
        sheet: name.to_string(),
        form: build.form,
        issues: build.issues,
        skipped: build.skipped,
        validation_errors,
    })
}

/// Serialize a form with 4-space indentation.
pub fn form_to_json(form: &Form) -> PipelineResult<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    form.serialize(&mut ser)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Write every form to `<dir>/<sheet>.json`, creating the directory.
pub fn write_forms(forms: &[ConvertedForm], dir: &Path) -> PipelineResult<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;

    let mut written = Vec::with_capacity(forms.len());
    for converted in forms {
        let path = dir.join(format!("{}.json", converted.sheet));
        fs::write(&path, form_to_json(&converted.form)?)?;
        log_success(format!("Saved {}", path.display()));
        written.push(path);
    }
    Ok(written)
}
