//! Domain models for OpenMRS 3 form definitions.
//!
//! The structure follows the form engine's JSON schema:
//!
//! ```text
//! Form
//! └── pages[]            one page per sheet section ("Page 1", "Page 2", ...)
//!     └── sections[]     a single section carrying the section label
//!         └── questions[]
//!             ├── questionOptions { rendering, concept, calculate?, answers? }
//!             ├── validators      (parsed JSON or null)
//!             └── hide?           { hideWhenExpression }
//! ```
//!
//! Optional fields are OMITTED when absent, except `validators` which the
//! engine expects as an explicit `null`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A complete form document, one per metadata sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Form {
    pub name: String,
    pub description: String,
    pub version: String,
    pub published: bool,
    pub uuid: String,
    pub processor: String,
    pub encounter: String,
    pub retired: bool,
    #[serde(default)]
    pub referenced_forms: Vec<Value>,
    pub pages: Vec<Page>,
}

impl Form {
    /// Iterate over every question of the form, in page order.
    pub fn questions(&self) -> impl Iterator<Item = &Question> {
        self.pages
            .iter()
            .flat_map(|page| page.sections.iter())
            .flat_map(|section| section.questions.iter())
    }

    /// Number of questions across all pages.
    pub fn question_count(&self) -> usize {
        self.questions().count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub label: String,
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub label: String,
    /// The engine reads this flag as the string `"true"` or `"false"`.
    pub is_expanded: String,
    pub questions: Vec<Question>,
}

/// A single observation question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub label: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub required: bool,
    pub id: String,
    pub question_options: QuestionOptions,
    #[serde(default)]
    pub validators: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_info: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hide: Option<Hide>,
}

/// Question type for every generated question.
pub const OBS_QUESTION_TYPE: &str = "obs";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionOptions {
    pub rendering: Rendering,
    pub concept: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calculate: Option<Calculate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answers: Option<Vec<Answer>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub label: String,
    pub concept: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Calculate {
    pub calculate_expression: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hide {
    pub hide_when_expression: String,
}

/// Widget used by the form engine to display a question.
///
/// Datatypes without a known widget are carried through verbatim as
/// [`Rendering::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Rendering {
    Radio,
    Numeric,
    Text,
    Other(String),
}

impl Rendering {
    /// Map a sheet datatype (already lowercased) to a rendering.
    ///
    /// | Datatype | Rendering |
    /// |----------|-----------|
    /// | coded    | radio     |
    /// | boolean  | radio     |
    /// | numeric  | numeric   |
    /// | text     | text      |
    /// | radio    | radio     |
    /// | other    | unchanged |
    pub fn from_datatype(datatype: &str) -> Self {
        match datatype {
            "coded" | "boolean" | "radio" => Rendering::Radio,
            "numeric" => Rendering::Numeric,
            "text" => Rendering::Text,
            other => Rendering::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Rendering::Radio => "radio",
            Rendering::Numeric => "numeric",
            Rendering::Text => "text",
            Rendering::Other(s) => s,
        }
    }

    /// Whether the rendering came from the known datatype table.
    pub fn is_known(&self) -> bool {
        !matches!(self, Rendering::Other(_))
    }
}

impl fmt::Display for Rendering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Rendering {
    fn from(s: String) -> Self {
        Rendering::from_datatype(&s)
    }
}

impl From<Rendering> for String {
    fn from(r: Rendering) -> Self {
        r.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_question() -> Question {
        Question {
            label: "Age group".into(),
            kind: OBS_QUESTION_TYPE.into(),
            required: false,
            id: "ageGroup".into(),
            question_options: QuestionOptions {
                rendering: Rendering::Radio,
                concept: "ageGroup".into(),
                calculate: None,
                answers: Some(vec![Answer {
                    label: "Other".into(),
                    concept: "ageGroupOther".into(),
                }]),
            },
            validators: None,
            default: None,
            question_info: Some("Age group".into()),
            hide: None,
        }
    }

    #[test]
    fn test_rendering_table() {
        assert_eq!(Rendering::from_datatype("coded"), Rendering::Radio);
        assert_eq!(Rendering::from_datatype("boolean"), Rendering::Radio);
        assert_eq!(Rendering::from_datatype("numeric"), Rendering::Numeric);
        assert_eq!(Rendering::from_datatype("text"), Rendering::Text);
        assert_eq!(
            Rendering::from_datatype("date"),
            Rendering::Other("date".into())
        );
        assert!(!Rendering::from_datatype("date").is_known());
    }

    #[test]
    fn test_question_json_shape() {
        let value = serde_json::to_value(sample_question()).unwrap();

        assert_eq!(value["type"], "obs");
        assert_eq!(value["questionOptions"]["rendering"], "radio");
        assert_eq!(value["questionOptions"]["answers"][0]["concept"], "ageGroupOther");
        assert_eq!(value["questionInfo"], "Age group");

        // validators is always present, absent optionals are omitted
        assert!(value.get("validators").is_some_and(Value::is_null));
        assert!(value.get("default").is_none());
        assert!(value.get("hide").is_none());
        assert!(value["questionOptions"].get("calculate").is_none());
    }

    #[test]
    fn test_question_roundtrip_from_engine_json() {
        let value = json!({
            "label": "Weight",
            "type": "obs",
            "required": true,
            "id": "weight",
            "questionOptions": { "rendering": "number", "concept": "5089AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA" },
            "validators": [{ "type": "js_expression" }],
            "hide": { "hideWhenExpression": "sex !== 'female'" }
        });

        let question: Question = serde_json::from_value(value).unwrap();
        assert_eq!(question.question_options.rendering, Rendering::Other("number".into()));
        assert_eq!(
            question.hide.unwrap().hide_when_expression,
            "sex !== 'female'"
        );
        assert!(question.validators.is_some());
    }
}
