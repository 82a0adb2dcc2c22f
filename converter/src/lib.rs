//! # o3forms - OpenMRS 3 forms from spreadsheet metadata
//!
//! o3forms turns a clinical metadata workbook (one sheet per form plus an
//! `OptionSets` sheet) into OpenMRS 3 form engine JSON, one file per sheet.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Workbook   │────▶│   Parser    │────▶│  Transform  │────▶│  Form JSON  │
//! │ (xlsx/csv)  │     │ (header row)│     │ (normalize) │     │ (validated) │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//!                                               │
//!                                  ┌────────────┴────────────┐
//!                                  ▼                         ▼
//!                           labels / ids              skip logic
//!                           (normalize)              (expression)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use o3forms::{convert_workbook, write_forms, ConvertOptions};
//! use std::path::Path;
//!
//! let forms = convert_workbook(Path::new("metadata.xlsx"), &ConvertOptions::default())?;
//! write_forms(&forms, Path::new("forms"))?;
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Form document models (Form, Page, Section, Question)
//! - [`parser`] - Workbook loading (calamine, CSV directories)
//! - [`normalize`] - Label and identifier normalization
//! - [`expression`] - Skip logic compilation
//! - [`transform`] - Question and form assembly, pipeline
//! - [`validation`] - Form schema validation
//! - [`report`] - Cross-form reference checks
//! - [`config`] - Conversion options
//! - [`logs`] - Leveled logging

// Core modules
pub mod error;
pub mod models;

// Parsing
pub mod parser;

// Text rules
pub mod expression;
pub mod normalize;

// Transformation
pub mod transform;

// Validation
pub mod report;
pub mod validation;

// Ambient
pub mod config;
pub mod logs;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ConfigError, ExpressionError, PipelineError, PipelineResult, ValidationError, WorkbookError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{Answer, Calculate, Form, Hide, Page, Question, QuestionOptions, Rendering, Section};

// =============================================================================
// Re-exports - Text rules
// =============================================================================

pub use expression::{compile_skip_expression, is_sentinel, Operator, SkipExpression};
pub use normalize::{camel_case, normalize_identifier, normalize_label, IdRole};

// =============================================================================
// Re-exports - Parsing
// =============================================================================

pub use parser::{Row, Sheet, Workbook};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::{
    build_form, build_question, convert_loaded, convert_workbook, form_to_json, write_forms,
    ConvertedForm, FormBuild, FormIssue, OptionSetLookup, OptionSets,
};

// =============================================================================
// Re-exports - Validation
// =============================================================================

pub use report::{check_references, ReferenceReport};
pub use validation::{check_form, check_form_text, is_valid_form, validate_form};

pub use config::ConvertOptions;
