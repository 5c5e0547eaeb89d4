//! User-facing error classification.
//!
//! Engine rejections and I/O failures fold into exactly two interrupting
//! categories; evaluation errors are never an interruption and map to a
//! literal marker in the display instead.

use std::fmt;

use crate::engine::{ContentError, Value};

/// Display text for a cell whose evaluation failed.
pub const FORMULA_ERROR_MARKER: &str = "FormulaError";

/// An error the user must acknowledge before continuing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EditError {
    /// The submitted content was unacceptable to the engine; the edit
    /// transaction was aborted and no state changed.
    InvalidContent(String),
    /// A save or load failed at the I/O boundary; document state is as it
    /// was before the attempt.
    Persistence(String),
}

impl fmt::Display for EditError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditError::InvalidContent(msg) => write!(f, "Invalid cell content: {}", msg),
            EditError::Persistence(msg) => write!(f, "File error: {}", msg),
        }
    }
}

impl std::error::Error for EditError {}

impl From<ContentError> for EditError {
    fn from(err: ContentError) -> Self {
        // Name, syntax, and cycle rejections are distinct engine kinds but
        // one user category: none of them mutates cell state.
        match err {
            ContentError::InvalidName(name) => EditError::InvalidContent(format!(
                "\"{}\" is not a cell; valid cells are A1 through Z99",
                name
            )),
            ContentError::Syntax(msg) => EditError::InvalidContent(msg),
            ContentError::Circular(msg) => EditError::InvalidContent(msg),
        }
    }
}

/// Textual form of an engine value for the grid display.
pub fn display_text(value: &Value) -> String {
    match value {
        Value::Number(n) => format_number(*n),
        Value::Text(s) => s.clone(),
        Value::Error => FORMULA_ERROR_MARKER.to_string(),
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_text_maps_error_to_marker() {
        assert_eq!(display_text(&Value::Error), "FormulaError");
    }

    #[test]
    fn test_display_text_numbers() {
        assert_eq!(display_text(&Value::Number(5.0)), "5");
        assert_eq!(display_text(&Value::Number(-3.0)), "-3");
        assert_eq!(display_text(&Value::Number(2.5)), "2.5");
    }

    #[test]
    fn test_display_text_passes_text_through() {
        assert_eq!(display_text(&Value::Text("total".into())), "total");
        assert_eq!(display_text(&Value::Text(String::new())), "");
    }

    #[test]
    fn test_all_content_errors_classify_as_invalid_content() {
        for err in [
            ContentError::InvalidName("A100".into()),
            ContentError::Syntax("unexpected end of formula".into()),
            ContentError::Circular("A1 would depend on itself".into()),
        ] {
            assert!(matches!(
                EditError::from(err),
                EditError::InvalidContent(_)
            ));
        }
    }
}
