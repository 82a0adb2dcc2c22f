//! Transformation module.
//!
//! This module handles metadata sheet to form transformation:
//! - Columns: Header names of the metadata sheets
//! - Question: One row to one question, with answers from option sets
//! - Form: Section grouping and form header
//! - Pipeline: Workbook loading, conversion, validation and output

pub mod columns;
pub mod form;
pub mod pipeline;
pub mod question;

pub use form::{build_form, FormBuild};
pub use pipeline::*;
pub use question::{
    build_answers, build_question, inspect_question, parse_validators, FormIssue,
    OptionSetLookup, OptionSets, SkippedRow,
};
