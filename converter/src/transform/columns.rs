//! Column headers of the metadata sheets.

// Form sheets
pub const SECTION: &str = "Section";
pub const QUESTION: &str = "Question";
pub const LABEL_IF_DIFFERENT: &str = "Label if different";
pub const DATATYPE: &str = "Datatype";
pub const VALIDATION_FORMAT: &str = "Validation (format)";
pub const MANDATORY: &str = "Mandatory";
pub const DEFAULT_VALUE: &str = "Default value";
pub const CALCULATION: &str = "Calculation";
pub const SKIP_LOGIC: &str = "Skip logic";
pub const OPTION_SET_NAME: &str = "OptionSet name";
pub const EXTERNAL_ID: &str = "External ID";

// OptionSets sheet (also uses OPTION_SET_NAME, LABEL_IF_DIFFERENT, EXTERNAL_ID)
pub const ANSWERS: &str = "Answers";

/// Datatype assumed when the cell is empty.
pub const DEFAULT_DATATYPE: &str = "radio";
