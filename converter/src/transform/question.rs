//! Build one form question from one metadata row.
//!
//! ```text
//! Sheet row                                   Question
//! ┌──────────────────────────────────┐        ┌──────────────────────────────────┐
//! │ Question:   1.4 Age group        │        │ label: "Age group"               │
//! │ Datatype:   Coded                │   →    │ id:    "ageGroup"                │
//! │ OptionSet:  age_groups           │        │ questionOptions.rendering: radio │
//! │ Skip logic: [Consent] <> 'Yes'   │        │ answers: [{"18-25", "18To25"}]   │
//! └──────────────────────────────────┘        │ hide: "consent !== 'yes'"        │
//!                                             └──────────────────────────────────┘
//! ```
//!
//! Missing optional cells fall back to documented defaults; nothing here
//! fails. Data problems are reported by [`inspect_question`] as issues.

use serde_json::Value;
use std::collections::HashMap;

use super::columns;
use crate::expression::{compile_skip_expression, is_sentinel};
use crate::models::{
    Answer, Calculate, Hide, Question, QuestionOptions, Rendering, OBS_QUESTION_TYPE,
};
use crate::normalize::{normalize_identifier, normalize_label, IdRole};
use crate::parser::{Row, Sheet};

/// Lookup of answer rows by option set name.
pub trait OptionSetLookup {
    /// Rows of the option set in sheet order, empty when unknown.
    fn options(&self, name: &str) -> Vec<&Row>;
}

/// Option sets indexed from the OptionSets sheet.
#[derive(Debug, Clone, Default)]
pub struct OptionSets {
    sets: HashMap<String, Vec<Row>>,
}

impl OptionSets {
    pub fn from_sheet(sheet: &Sheet) -> Self {
        Self::from_rows(sheet.rows.iter().cloned())
    }

    pub fn from_rows(rows: impl IntoIterator<Item = Row>) -> Self {
        let mut sets: HashMap<String, Vec<Row>> = HashMap::new();
        for row in rows {
            if let Some(name) = row.text(columns::OPTION_SET_NAME) {
                sets.entry(name).or_default().push(row);
            }
        }
        Self { sets }
    }

    /// Number of distinct option sets.
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}

impl OptionSetLookup for OptionSets {
    fn options(&self, name: &str) -> Vec<&Row> {
        self.sets
            .get(name)
            .map(|rows| rows.iter().collect())
            .unwrap_or_default()
    }
}

/// A data problem found on a row
#[derive(Debug, Clone, PartialEq)]
pub struct FormIssue {
    pub row: usize,
    pub field: String,
    pub message: String,
}

impl FormIssue {
    pub fn new(row: usize, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            row,
            field: field.into(),
            message: message.into(),
        }
    }
}

/// A row that produced no question
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRow {
    pub row: usize,
    pub reason: String,
}

/// Build the question for a row.
///
/// Returns `None` for empty rows and rows without a `Question` cell.
pub fn build_question<L>(row: &Row, option_sets: &L) -> Option<Question>
where
    L: OptionSetLookup + ?Sized,
{
    if row.is_blank() {
        return None;
    }
    let question_text = row.text(columns::QUESTION)?;

    let source_label = row
        .text(columns::LABEL_IF_DIFFERENT)
        .unwrap_or(question_text);
    let label = normalize_label(&source_label);
    let id = normalize_identifier(&source_label, IdRole::Question);

    let concept = row
        .text(columns::EXTERNAL_ID)
        .unwrap_or_else(|| id.clone());

    let datatype = row
        .text(columns::DATATYPE)
        .map(|d| d.to_lowercase())
        .unwrap_or_else(|| columns::DEFAULT_DATATYPE.to_string());

    let required = row
        .text(columns::MANDATORY)
        .is_some_and(|m| m.eq_ignore_ascii_case("true"));

    let validators = row
        .text(columns::VALIDATION_FORMAT)
        .and_then(|v| parse_validators(&v));

    let calculate = row
        .text(columns::CALCULATION)
        .map(|expr| Calculate {
            calculate_expression: expr,
        });

    let hide = row.text(columns::SKIP_LOGIC).map(|expr| Hide {
        hide_when_expression: compile_skip_expression(&expr),
    });

    let answers = row
        .text(columns::OPTION_SET_NAME)
        .map(|name| build_answers(&id, &option_sets.options(&name)));

    Some(Question {
        label: label.clone(),
        kind: OBS_QUESTION_TYPE.to_string(),
        required,
        id,
        question_options: QuestionOptions {
            rendering: Rendering::from_datatype(&datatype),
            concept,
            calculate,
            answers,
        },
        validators,
        default: row.text(columns::DEFAULT_VALUE),
        question_info: Some(label),
        hide,
    })
}

/// Build answers of a question from its option set rows.
///
/// Rows without an `Answers` cell are ignored.
pub fn build_answers(question_id: &str, rows: &[&Row]) -> Vec<Answer> {
    rows.iter()
        .filter_map(|row| {
            let answer = row.text(columns::ANSWERS)?;
            let label_source = row
                .text(columns::LABEL_IF_DIFFERENT)
                .unwrap_or_else(|| answer.clone());
            let concept = row.text(columns::EXTERNAL_ID).unwrap_or_else(|| {
                normalize_identifier(&answer, IdRole::Answer { question_id })
            });
            Some(Answer {
                label: normalize_label(&label_source),
                concept,
            })
        })
        .collect()
}

/// Parse the validation cell as JSON validators; anything else is `None`.
pub fn parse_validators(text: &str) -> Option<Value> {
    serde_json::from_str::<Value>(text)
        .ok()
        .filter(|v| !v.is_null())
}

/// Report data problems of a row whose question was built.
pub fn inspect_question(row: &Row, question: &Question) -> Vec<FormIssue> {
    let mut issues = Vec::new();

    if let Rendering::Other(datatype) = &question.question_options.rendering {
        issues.push(FormIssue::new(
            row.number,
            columns::DATATYPE,
            format!("Unknown datatype '{}', used as rendering", datatype),
        ));
    }

    if question.validators.is_none() {
        if let Some(text) = row.text(columns::VALIDATION_FORMAT) {
            issues.push(FormIssue::new(
                row.number,
                columns::VALIDATION_FORMAT,
                format!("'{}' is not JSON, validators left empty", text),
            ));
        }
    }

    if let Some(hide) = &question.hide {
        if is_sentinel(&hide.hide_when_expression) {
            issues.push(FormIssue::new(
                row.number,
                columns::SKIP_LOGIC,
                format!(
                    "{}: {}",
                    hide.hide_when_expression,
                    row.text(columns::SKIP_LOGIC).unwrap_or_default()
                ),
            ));
        }
    }

    if let Some(name) = row.text(columns::OPTION_SET_NAME) {
        if question
            .question_options
            .answers
            .as_ref()
            .is_some_and(|a| a.is_empty())
        {
            issues.push(FormIssue::new(
                row.number,
                columns::OPTION_SET_NAME,
                format!("Option set '{}' has no answers", name),
            ));
        }
    }

    if question.id.is_empty() {
        issues.push(FormIssue::new(
            row.number,
            columns::QUESTION,
            "Question text yields an empty id",
        ));
    }

    issues
}
