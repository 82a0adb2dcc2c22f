//! Text normalization for labels and identifiers.
//!
//! Spreadsheet cells carry outline numbering ("1.2 Age at enrollment"),
//! free punctuation and parenthesized qualifiers. This module turns them into:
//!
//! - **labels**: display text shown by the form engine
//! - **identifiers**: lower camel case tokens used as question ids and
//!   fallback answer concepts
//!
//! ```text
//! "1.2 Age group (years)"  ──label──▶  "Age group (years)"
//!                          ──id─────▶  "ageGroup"
//! "18-25"                  ──id─────▶  "18To25"
//! "Other" (answer of ageGroup) ─id──▶  "ageGroupOther"
//! ```
//!
//! Numeric ranges ("18-25", "> 65", "3 - 5") look like outline prefixes and
//! hyphenated words, so they are detected first and handled separately.
//!
//! All functions are pure and never fail; bad input degrades to an empty or
//! partial token.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;

/// Outline numbering such as "1 ", "1.2 ", "3. " and a dangling " - " after it.
static OUTLINE_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+(\.\d+)*\.?\s*(-\s+)?").expect("outline prefix regex"));

static LEADING_RANGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+-\d+|> \d+|< \d+|\d+ - \d+)").expect("leading range regex"));

static RANGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+-\d+|> \d+|< \d+|\d+ - \d+").expect("range regex"));

static LABEL_DISALLOWED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-zA-Z0-9\s()\-_/.<>]").expect("label charset regex"));

static LEADING_DOT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\.\s*").expect("leading dot regex"));

static PARENTHETICAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*\(.*?\)").expect("parenthetical regex"));

static ID_DISALLOWED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-zA-Z0-9_-]").expect("identifier charset regex"));

static EDGE_UNDERSCORES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^_+|_+$").expect("edge underscore regex"));

static UNDERSCORE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"_+").expect("underscore regex"));

/// What an identifier is derived for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdRole<'a> {
    /// Question id (also used for skip logic question references).
    Question,
    /// Answer concept of the question with the given id.
    ///
    /// A bare "other" answer is prefixed with the question id so that
    /// free-text "Other" options of different questions do not collide.
    Answer { question_id: &'a str },
}

/// Check whether the text starts with a numeric range ("18-25", "> 65", "3 - 5").
pub fn starts_with_range(text: &str) -> bool {
    LEADING_RANGE.is_match(text)
}

/// Check whether the text contains a numeric range anywhere.
pub fn contains_range(text: &str) -> bool {
    RANGE.is_match(text)
}

/// Remove leading outline numbering unless the text starts with a range.
///
/// ```ignore
/// assert_eq!(strip_outline_prefix("1.2 Age"), "Age");
/// assert_eq!(strip_outline_prefix("18-25 years"), "18-25 years");
/// ```
pub fn strip_outline_prefix(text: &str) -> Cow<'_, str> {
    if starts_with_range(text) {
        Cow::Borrowed(text)
    } else {
        OUTLINE_PREFIX.replace(text, "")
    }
}

/// Normalize raw cell text into a display label.
///
/// Strips outline numbering, characters outside letters, digits, whitespace
/// and `( ) - _ / . < >`, then any leading ". " left behind by "3. Title".
pub fn normalize_label(text: &str) -> String {
    let text = strip_outline_prefix(text);
    let text = LABEL_DISALLOWED.replace_all(&text, "");
    LEADING_DOT.replace(&text, "").into_owned()
}

/// Normalize raw cell text into a lower camel case identifier.
///
/// Steps run in a fixed order; later steps rely on the earlier ones:
///
/// 1. strip outline numbering (ranges are kept)
/// 2. drop parenthesized qualifiers
/// 3. `/` becomes the word "Or"
/// 4. outside ranges, `-` and `_` separate words
/// 5. strip outline numbering again, steps 2 to 4 can expose a new one
/// 6. remaining `-` becomes "To", `<` "Less Than", `>` "More Than"
/// 7. drop characters outside `[A-Za-z0-9_-]` from every word, then drop
///    words left empty
/// 8. lower camel case the words
/// 9. trim and collapse underscores
/// 10. disambiguate "other" answers with the question id
///
/// The result is stable: normalizing an identifier again returns it
/// unchanged, unless it starts with a range ("18To25").
pub fn normalize_identifier(text: &str, role: IdRole<'_>) -> String {
    let text = strip_outline_prefix(text);
    let text = PARENTHETICAL.replace_all(&text, "");
    let mut text = text.replace('/', " Or ");

    if !contains_range(&text) {
        text = text.replace(|c: char| c == '-' || c == '_', " ");
    }

    let text = strip_outline_prefix(text.trim_start())
        .replace('-', " To ")
        .replace('<', " Less Than ")
        .replace('>', " More Than ");

    let words: Vec<String> = text
        .split_whitespace()
        .map(|word| ID_DISALLOWED.replace_all(word, "").into_owned())
        .filter(|word| !word.is_empty())
        .collect();

    let id = camel_case(&words.join(" "));
    let id = EDGE_UNDERSCORES.replace_all(&id, "");
    let id = UNDERSCORE_RUNS.replace_all(&id, "_").into_owned();

    match role {
        IdRole::Answer { question_id } if id.eq_ignore_ascii_case("other") => {
            format!("{}Other", question_id)
        }
        _ => id,
    }
}

/// Join whitespace separated words as lower camel case.
///
/// The first word is lowercased when its first letter is uppercase and
/// kept as is otherwise, so already camel cased ids pass through unchanged.
/// Following words get an uppercase first letter and lowercase rest.
pub fn camel_case(text: &str) -> String {
    let mut words = text.split_whitespace();
    let Some(first) = words.next() else {
        return String::new();
    };

    let starts_upper = first
        .chars()
        .find(|c| c.is_alphanumeric())
        .is_some_and(char::is_uppercase);
    let mut out = if starts_upper {
        first.to_lowercase()
    } else {
        first.to_string()
    };

    for word in words {
        out.push_str(&capitalize(word));
    }
    out
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question_id(text: &str) -> String {
        normalize_identifier(text, IdRole::Question)
    }

    #[test]
    fn test_label_strips_outline_prefix() {
        assert_eq!(normalize_label("1.2 Age at enrollment"), "Age at enrollment");
        assert_eq!(normalize_label("3. Marital status"), "Marital status");
        assert_eq!(normalize_label("12 Weight"), "Weight");
        assert_eq!(normalize_label("3 - Severe"), "Severe");
    }

    #[test]
    fn test_label_keeps_range_prefix() {
        assert_eq!(normalize_label("> 65 years"), "> 65 years");
        assert_eq!(normalize_label("< 18 years"), "< 18 years");
        assert_eq!(normalize_label("18-25"), "18-25");
        assert_eq!(normalize_label("3 - 5 times"), "3 - 5 times");
    }

    #[test]
    fn test_label_removes_disallowed_characters() {
        assert_eq!(normalize_label("Weight (kg)?"), "Weight (kg)");
        assert_eq!(normalize_label("Yes/No: *required*"), "Yes/No required");
        assert_eq!(normalize_label("Patient's name"), "Patients name");
    }

    #[test]
    fn test_label_empty() {
        assert_eq!(normalize_label(""), "");
        assert_eq!(normalize_label("1.1 "), "");
    }

    #[test]
    fn test_identifier_camel_case() {
        assert_eq!(question_id("mental health score"), "mentalHealthScore");
        assert_eq!(question_id("Age Group"), "ageGroup");
        assert_eq!(question_id("HIV status"), "hivStatus");
    }

    #[test]
    fn test_identifier_range_literal() {
        assert_eq!(question_id("18-25"), "18To25");
        assert_eq!(question_id("> 65"), "moreThan65");
        assert_eq!(question_id("< 18"), "lessThan18");
        assert_eq!(question_id("Age 18-25"), "age18To25");
    }

    #[test]
    fn test_identifier_drops_parenthetical_and_prefix() {
        assert_eq!(question_id("Age (years)"), "age");
        assert_eq!(question_id("1.2 Age at enrollment"), "ageAtEnrollment");
        assert_eq!(question_id("2. Weight (kg) today"), "weightToday");
    }

    #[test]
    fn test_identifier_separators() {
        assert_eq!(question_id("Yes/No"), "yesOrNo");
        assert_eq!(question_id("follow-up visit"), "followUpVisit");
        assert_eq!(question_id("main_complaint"), "mainComplaint");
        assert_eq!(question_id("Patient's name?"), "patientsName");
    }

    #[test]
    fn test_identifier_empty() {
        assert_eq!(question_id(""), "");
        assert_eq!(question_id("   "), "");
        assert_eq!(question_id("(not applicable)"), "");
    }

    #[test]
    fn test_identifier_other_disambiguation() {
        let answer = IdRole::Answer { question_id: "ageGroup" };
        assert_eq!(normalize_identifier("Other", answer), "ageGroupOther");
        assert_eq!(normalize_identifier("other", answer), "ageGroupOther");
        assert_eq!(normalize_identifier("Other (specify)", answer), "ageGroupOther");
        assert_eq!(question_id("Other"), "other");
        assert_eq!(normalize_identifier("Other reason", answer), "otherReason");
    }

    #[test]
    fn test_identifier_idempotent() {
        let samples = [
            "mental health score",
            "1.2 Age at enrollment",
            "Yes/No",
            "HIV status (last test)",
            "Other",
            "Patient's_main-complaint",
            "Number of children < 5",
        ];
        for sample in samples {
            let once = question_id(sample);
            assert_eq!(question_id(&once), once, "not idempotent for {:?}", sample);
        }
    }

    #[test]
    fn test_identifier_idempotent_after_cleanup() {
        let cases = [
            ("(Optional) 3 months follow up", "monthsFollowUp"),
            ("- 3 doses", "doses"),
            ("Ñ Apple", "apple"),
            ("¿ Pregnant (confirmed)", "pregnant"),
        ];
        for (sample, expected) in cases {
            let once = question_id(sample);
            assert_eq!(once, expected, "for {:?}", sample);
            assert_eq!(question_id(&once), once, "not idempotent for {:?}", sample);
        }
    }

    #[test]
    fn test_identifier_charset_invariant() {
        let samples = ["Héllo wörld", "a__b", "_x_", "Score: 1 + 2 = 3", "Q1/Q2 - total"];
        for sample in samples {
            let id = question_id(sample);
            assert!(id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-'));
            assert!(!id.starts_with('_') && !id.ends_with('_'));
            assert!(!id.contains("__"));
        }
    }

    #[test]
    fn test_range_detection() {
        assert!(starts_with_range("18-25 years"));
        assert!(starts_with_range("> 65"));
        assert!(!starts_with_range("1.2 Age"));
        assert!(!starts_with_range("Age 18-25"));
        assert!(contains_range("Age 18-25"));
        assert!(!contains_range("follow-up"));
    }
}
