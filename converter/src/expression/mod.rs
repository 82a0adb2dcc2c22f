//! Skip logic compiler.
//!
//! Metadata sheets write visibility rules as
//!
//! ```text
//! [Age Group] <> 'Other'
//! ```
//!
//! and the form engine expects a `hideWhenExpression` over question ids and
//! answer concepts:
//!
//! ```text
//! ageGroup !== 'ageGroupOther'
//! ```
//!
//! Only the "different than" operator is supported. A rule that cannot be
//! compiled is replaced by a sentinel message so the problem stays visible in
//! the generated form instead of aborting the whole conversion.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::normalize::{normalize_identifier, IdRole};

pub use crate::error::ExpressionError;

static SKIP_LOGIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[([^\]]+)\]\s*([=<>!]+)\s*'([^']*)'").expect("skip logic regex")
});

/// Comparison operator of a skip logic rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `!==`, also written `<>` in metadata sheets.
    NotEqual,
}

impl Operator {
    /// Parse an operator token as written in the sheet.
    pub fn parse(token: &str) -> Result<Self, ExpressionError> {
        match token {
            "<>" | "!==" => Ok(Operator::NotEqual),
            other => Err(ExpressionError::UnsupportedOperator(other.to_string())),
        }
    }

    /// Operator as written in the target expression.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::NotEqual => "!==",
        }
    }
}

/// A parsed skip logic rule, still holding the sheet's raw references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkipExpression {
    /// Question label or id between the brackets.
    pub question_ref: String,
    pub operator: Operator,
    /// Answer text between the quotes (may be empty).
    pub literal: String,
}

impl SkipExpression {
    /// Parse `[question] op 'answer'`.
    ///
    /// The rule must appear exactly once; compound rules are rejected as
    /// invalid rather than silently truncated to their first condition.
    pub fn parse(expression: &str) -> Result<Self, ExpressionError> {
        let mut matches = SKIP_LOGIC.captures_iter(expression);
        let caps = matches.next().ok_or(ExpressionError::InvalidFormat)?;
        if matches.next().is_some() {
            return Err(ExpressionError::InvalidFormat);
        }

        let operator = Operator::parse(&caps[2])?;

        Ok(Self {
            question_ref: caps[1].to_string(),
            operator,
            literal: caps[3].to_string(),
        })
    }

    /// Resolved question id.
    pub fn question_id(&self) -> String {
        normalize_identifier(&self.question_ref, IdRole::Question)
    }

    /// Render the target expression with normalized ids.
    ///
    /// The literal is normalized as an answer of the referenced question, so
    /// `'Other'` resolves to the same disambiguated concept as the answer.
    pub fn compile(&self) -> String {
        let question_id = self.question_id();
        let literal = normalize_identifier(
            &self.literal,
            IdRole::Answer {
                question_id: &question_id,
            },
        );
        format!("{} {} '{}'", question_id, self.operator.as_str(), literal)
    }
}

/// Compile a skip logic rule, returning a sentinel message on failure.
///
/// # Example
/// ```ignore
/// use o3forms::compile_skip_expression;
///
/// assert_eq!(
///     compile_skip_expression("[Age Group] <> 'Other'"),
///     "ageGroup !== 'ageGroupOther'"
/// );
/// assert_eq!(compile_skip_expression("age"), "Invalid expression format");
/// ```
pub fn compile_skip_expression(expression: &str) -> String {
    match SkipExpression::parse(expression) {
        Ok(parsed) => parsed.compile(),
        Err(e) => e.to_string(),
    }
}

/// Check whether a compiled expression is one of the failure sentinels.
pub fn is_sentinel(compiled: &str) -> bool {
    compiled == ExpressionError::InvalidFormat.to_string()
        || compiled == ExpressionError::UnsupportedOperator(String::new()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNSUPPORTED: &str = "Only conditional operator \"different than\" noted !== is supported";

    #[test]
    fn test_compile_not_equal_alias() {
        assert_eq!(
            compile_skip_expression("[Age Group] <> 'Other'"),
            "ageGroup !== 'ageGroupOther'"
        );
    }

    #[test]
    fn test_compile_canonical_operator() {
        assert_eq!(
            compile_skip_expression("[1.3 Referred by] !== 'Self referral'"),
            "referredBy !== 'selfReferral'"
        );
    }

    #[test]
    fn test_compile_range_literal() {
        assert_eq!(
            compile_skip_expression("[Age group] <> '18-25'"),
            "ageGroup !== '18To25'"
        );
    }

    #[test]
    fn test_compile_empty_literal() {
        assert_eq!(compile_skip_expression("[Comments] <> ''"), "comments !== ''");
    }

    #[test]
    fn test_unsupported_operator() {
        assert_eq!(compile_skip_expression("[Age Group] == 'Adult'"), UNSUPPORTED);
        assert_eq!(compile_skip_expression("[Score] > '5'"), UNSUPPORTED);
        assert_eq!(
            SkipExpression::parse("[Age] != 'x'"),
            Err(ExpressionError::UnsupportedOperator("!=".into()))
        );
    }

    #[test]
    fn test_invalid_format() {
        assert_eq!(compile_skip_expression("not an expression"), "Invalid expression format");
        assert_eq!(compile_skip_expression("[Age] <> Other"), "Invalid expression format");
        assert_eq!(compile_skip_expression(""), "Invalid expression format");
    }

    #[test]
    fn test_compound_rule_rejected() {
        assert_eq!(
            compile_skip_expression("[A] <> 'x' and [B] <> 'y'"),
            "Invalid expression format"
        );
    }

    #[test]
    fn test_surrounding_text_tolerated() {
        assert_eq!(
            compile_skip_expression("hide if [Sex] <> 'Female'"),
            "sex !== 'female'"
        );
    }

    #[test]
    fn test_parse_keeps_raw_references() {
        let parsed = SkipExpression::parse("[Age Group]   <>   'Other'").unwrap();
        assert_eq!(parsed.question_ref, "Age Group");
        assert_eq!(parsed.literal, "Other");
        assert_eq!(parsed.operator, Operator::NotEqual);
        assert_eq!(parsed.question_id(), "ageGroup");
    }

    #[test]
    fn test_sentinel_detection() {
        assert!(is_sentinel("Invalid expression format"));
        assert!(is_sentinel(UNSUPPORTED));
        assert!(!is_sentinel("ageGroup !== 'ageGroupOther'"));
    }
}
