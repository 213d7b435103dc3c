use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::document::DocumentType;
use crate::domain::errors::ValueObjectError;

pub const SERIES_PLACEHOLDER: &str = "{SERIE}";
pub const NUMBER_PLACEHOLDER: &str = "{NUMERO}";
pub const YEAR_PLACEHOLDER: &str = "{EJERCICIO}";

pub const DEFAULT_FORMAT_TEMPLATE: &str = "{SERIE}-{NUMERO}/{EJERCICIO}";
pub const DEFAULT_PADDING_WIDTH: usize = 5;

// Series code, e.g. F, A, P or RECT
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeriesCode(String);

impl SeriesCode {
  pub fn new(value: impl Into<String>) -> Result<Self, ValueObjectError> {
    let value = value.into().trim().to_uppercase();
    if value.is_empty() || value.len() > 10 {
      return Err(ValueObjectError::InvalidSeriesCode(
        "Series code must be between 1 and 10 characters".to_string(),
      ));
    }
    if !value.chars().all(|c| c.is_ascii_alphanumeric()) {
      return Err(ValueObjectError::InvalidSeriesCode(format!(
        "Series code must be alphanumeric: {}",
        value
      )));
    }
    Ok(Self(value))
  }

  pub fn default_for(document_type: DocumentType) -> Self {
    Self(document_type.default_series_code().to_string())
  }

  pub fn value(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for SeriesCode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

// Number format template with {SERIE}, {NUMERO} and {EJERCICIO} placeholders
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatTemplate(String);

impl FormatTemplate {
  pub fn new(value: impl Into<String>) -> Result<Self, ValueObjectError> {
    let value = value.into();
    if !value.contains(NUMBER_PLACEHOLDER) {
      return Err(ValueObjectError::InvalidFormatTemplate(format!(
        "Template must contain {}",
        NUMBER_PLACEHOLDER
      )));
    }
    if value.len() > 60 {
      return Err(ValueObjectError::InvalidFormatTemplate(
        "Template cannot exceed 60 characters".to_string(),
      ));
    }
    Ok(Self(value))
  }

  pub fn value(&self) -> &str {
    &self.0
  }

  pub fn render(&self, code: &SeriesCode, number: i64, fiscal_year: i32, width: usize) -> String {
    self
      .0
      .replace(SERIES_PLACEHOLDER, code.value())
      .replace(NUMBER_PLACEHOLDER, &format!("{:0width$}", number, width = width))
      .replace(YEAR_PLACEHOLDER, &fiscal_year.to_string())
  }
}

impl Default for FormatTemplate {
  fn default() -> Self {
    Self(DEFAULT_FORMAT_TEMPLATE.to_string())
  }
}

// Series state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesState {
  Active,
  Locked,
}

impl SeriesState {
  pub fn can_transition_to(&self, new_state: SeriesState) -> bool {
    match (self, new_state) {
      (SeriesState::Active, SeriesState::Locked) => true,
      // Locked is terminal
      _ => false,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      SeriesState::Active => "active",
      SeriesState::Locked => "locked",
    }
  }
}

impl FromStr for SeriesState {
  type Err = ValueObjectError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_lowercase().as_str() {
      "active" => Ok(SeriesState::Active),
      "locked" => Ok(SeriesState::Locked),
      _ => Err(ValueObjectError::InvalidStatus(format!(
        "Unknown series state: {}",
        s
      ))),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_default_template_renders() {
    let code = SeriesCode::new("f").unwrap();
    let rendered = FormatTemplate::default().render(&code, 1, 2024, DEFAULT_PADDING_WIDTH);
    assert_eq!(rendered, "F-00001/2024");
  }

  #[test]
  fn test_number_wider_than_padding_is_not_truncated() {
    let code = SeriesCode::new("A").unwrap();
    let rendered = FormatTemplate::default().render(&code, 1_234_567, 2025, 5);
    assert_eq!(rendered, "A-1234567/2025");
  }

  #[test]
  fn test_custom_template() {
    let template = FormatTemplate::new("{EJERCICIO}/{SERIE}{NUMERO}").unwrap();
    let code = SeriesCode::new("RECT").unwrap();
    assert_eq!(template.render(&code, 42, 2024, 3), "2024/RECT042");
  }

  #[test]
  fn test_template_requires_number_placeholder() {
    assert!(FormatTemplate::new("{SERIE}/{EJERCICIO}").is_err());
  }

  #[test]
  fn test_series_code_validation() {
    assert!(SeriesCode::new("").is_err());
    assert!(SeriesCode::new("F-1").is_err());
    assert!(SeriesCode::new("ABCDEFGHIJK").is_err());
  }

  #[test]
  fn test_locked_is_terminal() {
    assert!(SeriesState::Active.can_transition_to(SeriesState::Locked));
    assert!(!SeriesState::Locked.can_transition_to(SeriesState::Active));
    assert!(!SeriesState::Locked.can_transition_to(SeriesState::Locked));
    assert!(SeriesState::from_str("inactive").is_err());
  }
}
