//! Error types for the form conversion pipeline.
//!
//! This module defines the error hierarchy:
//!
//! - [`WorkbookError`] - Spreadsheet loading errors
//! - [`ExpressionError`] - Skip logic parsing errors
//! - [`ConfigError`] - Configuration file and environment errors
//! - [`ValidationError`] - Form schema validation errors
//! - [`PipelineError`] - Top-level orchestration errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.
//!
//! Per-row data problems are not errors: they surface as sentinel strings
//! or missing fields in the generated form and as warnings in the log.

use thiserror::Error;

// =============================================================================
// Workbook Errors
// =============================================================================

/// Errors while loading a metadata workbook.
#[derive(Debug, Error)]
pub enum WorkbookError {
    /// Failed to read a file or directory.
    #[error("Failed to read workbook: {0}")]
    IoError(#[from] std::io::Error),

    /// The spreadsheet library could not open the file.
    #[error("Cannot open workbook '{path}': {message}")]
    OpenError { path: String, message: String },

    /// A CSV sheet export could not be parsed.
    #[error("Invalid CSV sheet: {0}")]
    CsvError(#[from] csv::Error),

    /// The path is neither a supported spreadsheet nor a directory.
    #[error("Unsupported workbook format: {0}")]
    UnsupportedFormat(String),

    /// Requested sheet does not exist.
    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    /// The sheet has fewer rows than the configured header row.
    #[error("Sheet '{sheet}' has {rows} rows, header expected on row {header_row}")]
    HeaderRowOutOfRange {
        sheet: String,
        header_row: usize,
        rows: usize,
    },
}

// =============================================================================
// Skip Logic Errors
// =============================================================================

/// Errors while parsing a skip logic expression.
///
/// The `Display` text of each variant is the exact string embedded in the
/// generated form when the expression cannot be compiled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpressionError {
    /// The text does not have the `[question] op 'answer'` shape.
    #[error("Invalid expression format")]
    InvalidFormat,

    /// The operator is not the "different than" operator.
    #[error("Only conditional operator \"different than\" noted !== is supported")]
    UnsupportedOperator(String),
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors while loading conversion options.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("Cannot read config file: {0}")]
    IoError(#[from] std::io::Error),

    /// Config file is not valid JSON for the options.
    #[error("Invalid config file: {0}")]
    JsonError(#[from] serde_json::Error),

    /// An option value is out of range or unparseable.
    #[error("Invalid value for '{key}': {value}")]
    InvalidValue { key: String, value: String },
}

// =============================================================================
// Validation Errors
// =============================================================================

/// Errors during form validation.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Schema validation failed.
    #[error("Form '{form}' failed validation: {errors:?}")]
    SchemaError { form: String, errors: Vec<String> },

    /// The serialized form does not parse back as JSON.
    #[error("Form '{form}' is not valid JSON: {message}")]
    MalformedJson { form: String, message: String },
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
///
/// This is the error type returned by [`crate::transform::pipeline::convert_workbook`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Workbook loading error.
    #[error("Workbook error: {0}")]
    Workbook(#[from] WorkbookError),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Validation error.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Output could not be written.
    #[error("Output error: {0}")]
    Io(#[from] std::io::Error),

    /// The workbook has no sheet to turn into a form.
    #[error("No form sheets found in workbook")]
    NoFormSheets,
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for workbook operations.
pub type WorkbookResult<T> = Result<T, WorkbookError>;

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        let workbook_err = WorkbookError::SheetNotFound("OptionSets".into());
        let pipeline_err: PipelineError = workbook_err.into();
        assert!(pipeline_err.to_string().contains("OptionSets"));

        let config_err = ConfigError::InvalidValue {
            key: "header_row".into(),
            value: "0".into(),
        };
        let pipeline_err: PipelineError = config_err.into();
        assert!(pipeline_err.to_string().contains("header_row"));
    }

    #[test]
    fn test_expression_error_messages_are_sentinels() {
        assert_eq!(
            ExpressionError::InvalidFormat.to_string(),
            "Invalid expression format"
        );
        assert_eq!(
            ExpressionError::UnsupportedOperator("==".into()).to_string(),
            "Only conditional operator \"different than\" noted !== is supported"
        );
    }

    #[test]
    fn test_header_row_message() {
        let err = WorkbookError::HeaderRowOutOfRange {
            sheet: "F01".into(),
            header_row: 2,
            rows: 1,
        };
        let msg = err.to_string();
        assert!(msg.contains("F01"));
        assert!(msg.contains("row 2"));
    }
}
