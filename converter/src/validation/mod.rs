//! JSON Schema validation for generated forms.
//!
//! Forms are checked against `schemas/o3-form.json` (JSON Schema Draft 7),
//! embedded at compile time. The schema covers the structure the form engine
//! needs: header fields, pages, sections, questions and their options.
//!
//! # Example
//!
//! ```rust,ignore
//! use serde_json::json;
//! use o3forms::validation::{validate_form, is_valid_form};
//!
//! let form = json!({ "name": "F01", "pages": [] });
//! assert!(!is_valid_form(&form));
//! assert!(validate_form(&form).unwrap_err().len() > 0);
//! ```

use once_cell::sync::Lazy;
use serde_json::Value;

use crate::error::ValidationError;
use crate::models::Form;

static FORM_SCHEMA: Lazy<Value> = Lazy::new(|| {
    serde_json::from_str(include_str!("../../schemas/o3-form.json"))
        .expect("Invalid embedded schema")
});

/// Validate a JSON value against a schema.
///
/// # Returns
/// * `Ok(())` when valid
/// * `Err(Vec<String>)` with one message per violation
pub fn validate(schema: &Value, data: &Value) -> Result<(), Vec<String>> {
    let validator =
        jsonschema::draft7::new(schema).map_err(|e| vec![format!("Invalid schema: {}", e)])?;

    let errors: Vec<String> = validator
        .iter_errors(data)
        .map(|e| e.to_string())
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Quick check, true/false only.
pub fn is_valid(schema: &Value, data: &Value) -> bool {
    jsonschema::draft7::is_valid(schema, data)
}

/// Validate against the form schema.
pub fn validate_form(data: &Value) -> Result<(), Vec<String>> {
    validate(&FORM_SCHEMA, data)
}

/// Quick check against the form schema.
pub fn is_valid_form(data: &Value) -> bool {
    is_valid(&FORM_SCHEMA, data)
}

/// Validate a form as it will be written: serialize, parse the text back,
/// then check it against the schema.
pub fn check_form(form: &Form) -> Result<(), ValidationError> {
    let malformed = |message: String| ValidationError::MalformedJson {
        form: form.name.clone(),
        message,
    };

    let text = serde_json::to_string(form).map_err(|e| malformed(e.to_string()))?;
    let value: Value = serde_json::from_str(&text).map_err(|e| malformed(e.to_string()))?;

    validate_form(&value).map_err(|errors| ValidationError::SchemaError {
        form: form.name.clone(),
        errors,
    })
}

/// Validate the text of a form file.
pub fn check_form_text(name: &str, text: &str) -> Result<(), ValidationError> {
    let value: Value = serde_json::from_str(text).map_err(|e| ValidationError::MalformedJson {
        form: name.to_string(),
        message: e.to_string(),
    })?;

    validate_form(&value).map_err(|errors| ValidationError::SchemaError {
        form: name.to_string(),
        errors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_form() -> Value {
        json!({
            "name": "F01",
            "description": "MSF Form - F01",
            "version": "1",
            "published": true,
            "uuid": "",
            "processor": "EncounterFormProcessor",
            "encounter": "Consultation",
            "retired": false,
            "referencedForms": [],
            "pages": [{
                "label": "Page 1",
                "sections": [{
                    "label": "Demographics",
                    "isExpanded": "false",
                    "questions": [{
                        "label": "Age group",
                        "type": "obs",
                        "required": false,
                        "id": "ageGroup",
                        "questionOptions": {
                            "rendering": "radio",
                            "concept": "ageGroup",
                            "answers": [{ "label": "Other", "concept": "ageGroupOther" }]
                        },
                        "validators": null,
                        "questionInfo": "Age group"
                    }]
                }]
            }]
        })
    }

    #[test]
    fn test_valid_form() {
        assert!(is_valid_form(&valid_form()));
        assert!(validate_form(&valid_form()).is_ok());
    }

    #[test]
    fn test_missing_header_field() {
        let mut form = valid_form();
        form.as_object_mut().unwrap().remove("processor");

        let errors = validate_form(&form).unwrap_err();
        assert!(errors.iter().any(|e| e.contains("processor")));
    }

    #[test]
    fn test_question_without_validators_key() {
        let mut form = valid_form();
        form["pages"][0]["sections"][0]["questions"][0]
            .as_object_mut()
            .unwrap()
            .remove("validators");
        assert!(!is_valid_form(&form));
    }

    #[test]
    fn test_bad_is_expanded() {
        let mut form = valid_form();
        form["pages"][0]["sections"][0]["isExpanded"] = json!(false);
        assert!(!is_valid_form(&form));
    }

    #[test]
    fn test_check_form_roundtrip() {
        let form: Form = serde_json::from_value(valid_form()).unwrap();
        assert!(check_form(&form).is_ok());
    }

    #[test]
    fn test_check_form_empty_id() {
        let mut form: Form = serde_json::from_value(valid_form()).unwrap();
        form.pages[0].sections[0].questions[0].id.clear();

        match check_form(&form) {
            Err(ValidationError::SchemaError { form, errors }) => {
                assert_eq!(form, "F01");
                assert!(!errors.is_empty());
            }
            other => panic!("expected schema error, got {:?}", other),
        }
    }

    #[test]
    fn test_check_form_text_malformed() {
        assert!(matches!(
            check_form_text("broken.json", "{ \"name\": "),
            Err(ValidationError::MalformedJson { .. })
        ));
    }
}
