//! Cross-reference checks over generated forms.
//!
//! Skip logic and calculations refer to other questions and answers by
//! their generated ids. A typo in the sheet silently produces an expression
//! that never matches, so the report lists:
//!
//! - question ids used in `hideWhenExpression` that the form does not define
//! - quoted tokens in `hideWhenExpression`/`calculateExpression` that match
//!   no question id or concept in any of the checked forms
//! - skip logic that failed to compile (sentinel messages)

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

use crate::expression::is_sentinel;
use crate::models::Form;

static QUOTED: Lazy<Regex> = Lazy::new(|| Regex::new(r"'([^']+)'").expect("quoted token regex"));

/// Question id on the left of a compiled visibility expression.
static HIDE_SUBJECT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*([A-Za-z0-9_\-]+)\s*!==").expect("hide subject regex"));

/// An unresolved reference and the label of the question using it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reference {
    pub token: String,
    pub used_in: String,
}

/// Findings for one form.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormReferences {
    pub form: String,
    pub missing_ids: Vec<Reference>,
    pub missing_concepts: Vec<Reference>,
    pub invalid_expressions: Vec<Reference>,
}

impl FormReferences {
    pub fn is_clean(&self) -> bool {
        self.missing_ids.is_empty()
            && self.missing_concepts.is_empty()
            && self.invalid_expressions.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReferenceReport {
    pub forms: Vec<FormReferences>,
}

impl ReferenceReport {
    pub fn is_clean(&self) -> bool {
        self.forms.iter().all(FormReferences::is_clean)
    }

    /// Total number of findings across forms.
    pub fn problem_count(&self) -> usize {
        self.forms
            .iter()
            .map(|f| f.missing_ids.len() + f.missing_concepts.len() + f.invalid_expressions.len())
            .sum()
    }
}

fn push_unique(list: &mut Vec<Reference>, token: &str, used_in: &str) {
    if !list.iter().any(|r| r.token == token) {
        list.push(Reference {
            token: token.to_string(),
            used_in: used_in.to_string(),
        });
    }
}

/// Check every form's expressions against the ids and concepts of all forms.
pub fn check_references(forms: &[Form]) -> ReferenceReport {
    let mut known: HashSet<&str> = HashSet::new();
    for question in forms.iter().flat_map(Form::questions) {
        known.insert(&question.id);
        known.insert(&question.question_options.concept);
        for answer in question.question_options.answers.iter().flatten() {
            known.insert(&answer.concept);
        }
    }

    let forms = forms
        .iter()
        .map(|form| {
            let form_ids: HashSet<&str> = form.questions().map(|q| q.id.as_str()).collect();
            let mut refs = FormReferences {
                form: form.name.clone(),
                ..FormReferences::default()
            };

            for question in form.questions() {
                if let Some(calc) = &question.question_options.calculate {
                    for caps in QUOTED.captures_iter(&calc.calculate_expression) {
                        if !known.contains(&caps[1]) {
                            push_unique(&mut refs.missing_concepts, &caps[1], &question.label);
                        }
                    }
                }

                let Some(hide) = &question.hide else {
                    continue;
                };
                let expr = &hide.hide_when_expression;
                if is_sentinel(expr) {
                    refs.invalid_expressions.push(Reference {
                        token: expr.clone(),
                        used_in: question.label.clone(),
                    });
                    continue;
                }

                if let Some(caps) = HIDE_SUBJECT.captures(expr) {
                    if !form_ids.contains(&caps[1]) {
                        push_unique(&mut refs.missing_ids, &caps[1], &question.label);
                    }
                }
                for caps in QUOTED.captures_iter(expr) {
                    if !known.contains(&caps[1]) {
                        push_unique(&mut refs.missing_concepts, &caps[1], &question.label);
                    }
                }
            }

            refs
        })
        .collect();

    ReferenceReport { forms }
}

impl fmt::Display for ReferenceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for form in &self.forms {
            writeln!(f, "Form: {}", form.form)?;

            if form.missing_concepts.is_empty() {
                writeln!(f, "  No missing concept IDs found.")?;
            } else {
                writeln!(f, "  Missing concept IDs:")?;
                for r in &form.missing_concepts {
                    writeln!(f, "    Concept ID '{}' not found, used in label '{}'", r.token, r.used_in)?;
                }
                writeln!(f, "  Total missing concept IDs: {}", form.missing_concepts.len())?;
            }

            if form.missing_ids.is_empty() {
                writeln!(f, "  No missing IDs in skip logic found.")?;
            } else {
                writeln!(f, "  Missing IDs in skip logic:")?;
                for r in &form.missing_ids {
                    writeln!(f, "    ID '{}' not found, used in label '{}'", r.token, r.used_in)?;
                }
                writeln!(f, "  Total missing IDs: {}", form.missing_ids.len())?;
            }

            for r in &form.invalid_expressions {
                writeln!(f, "  Invalid skip logic in label '{}': {}", r.used_in, r.token)?;
            }
        }
        Ok(())
    }
}
