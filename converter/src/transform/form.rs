//! Assemble a complete form from one metadata sheet.
//!
//! Rows are grouped by their `Section` cell in order of first appearance.
//! Every group becomes its own page holding a single section:
//!
//! ```text
//! Section column         Form
//! ┌──────────────┐       pages[0]  "Page 1" ── section "Demographics"
//! │ Demographics │ ──┐                          ├── age
//! │ Demographics │   │                          └── sex
//! │ Assessment   │ ──┼─▶ pages[1]  "Page 2" ── section "Assessment"
//! │ Demographics │ ──┘                          └── score
//! └──────────────┘       (the 4th row joins "Demographics" on page 1)
//! ```

use std::collections::{HashMap, HashSet};

use super::columns;
use super::question::{build_question, inspect_question, FormIssue, OptionSetLookup, SkippedRow};
use crate::config::ConvertOptions;
use crate::models::{Form, Page, Question, Section};
use crate::parser::Sheet;

/// A form together with what went wrong building it.
#[derive(Debug, Clone)]
pub struct FormBuild {
    pub form: Form,
    pub issues: Vec<FormIssue>,
    pub skipped: Vec<SkippedRow>,
}

impl FormBuild {
    /// One-line summary for logs.
    pub fn summary(&self) -> String {
        format!(
            "{} questions on {} pages ({} rows skipped, {} issues)",
            self.form.question_count(),
            self.form.pages.len(),
            self.skipped.len(),
            self.issues.len()
        )
    }
}

/// Build the form for a sheet.
pub fn build_form<L>(sheet: &Sheet, option_sets: &L, options: &ConvertOptions) -> FormBuild
where
    L: OptionSetLookup + ?Sized,
{
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<Question>> = HashMap::new();
    let mut issues = Vec::new();
    let mut skipped = Vec::new();
    let mut seen_ids: HashSet<String> = HashSet::new();

    for row in &sheet.rows {
        let Some(question) = build_question(row, option_sets) else {
            if !row.is_blank() {
                skipped.push(SkippedRow {
                    row: row.number,
                    reason: format!("no '{}' cell", columns::QUESTION),
                });
            }
            continue;
        };

        issues.extend(inspect_question(row, &question));
        if !question.id.is_empty() && !seen_ids.insert(question.id.clone()) {
            issues.push(FormIssue::new(
                row.number,
                columns::QUESTION,
                format!("Duplicate question id '{}'", question.id),
            ));
        }

        let section = row.text(columns::SECTION).unwrap_or_default();
        if !groups.contains_key(&section) {
            order.push(section.clone());
        }
        groups.entry(section).or_default().push(question);
    }

    let is_expanded = options.section_expanded_flag();
    let pages = order
        .into_iter()
        .enumerate()
        .map(|(i, label)| {
            let questions = groups.remove(&label).unwrap_or_default();
            Page {
                label: format!("Page {}", i + 1),
                sections: vec![Section {
                    label,
                    is_expanded: is_expanded.clone(),
                    questions,
                }],
            }
        })
        .collect();

    let form = Form {
        name: sheet.name.clone(),
        description: format!("{} - {}", options.description_prefix, sheet.name),
        version: options.version.clone(),
        published: options.published,
        uuid: String::new(),
        processor: options.processor.clone(),
        encounter: options.encounter.clone(),
        retired: false,
        referenced_forms: Vec::new(),
        pages,
    };

    FormBuild { form, issues, skipped }
}
