use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::errors::ClosureError;
use crate::domain::errors::ValueObjectError;

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

// Closure record state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClosureState {
  Closed,
  Reopened,
}

impl ClosureState {
  pub fn as_str(&self) -> &'static str {
    match self {
      ClosureState::Closed => "closed",
      ClosureState::Reopened => "reopened",
    }
  }
}

impl FromStr for ClosureState {
  type Err = ValueObjectError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_lowercase().as_str() {
      "closed" => Ok(ClosureState::Closed),
      "reopened" => Ok(ClosureState::Reopened),
      _ => Err(ValueObjectError::InvalidStatus(format!(
        "Unknown closure state: {}",
        s
      ))),
    }
  }
}

impl fmt::Display for ClosureState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

// Mandatory justification for reopening a closed year
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReopenReason(String);

impl ReopenReason {
  pub fn new(value: impl Into<String>) -> Result<Self, ValueObjectError> {
    let value = value.into();
    let trimmed = value.trim();
    if trimmed.is_empty() {
      return Err(ValueObjectError::InvalidReason(
        "Reopen reason cannot be empty".to_string(),
      ));
    }
    if trimmed.chars().count() > 1000 {
      return Err(ValueObjectError::InvalidReason(
        "Reopen reason cannot exceed 1000 characters".to_string(),
      ));
    }
    Ok(Self(trimmed.to_string()))
  }

  pub fn value(&self) -> &str {
    &self.0
  }
}

/// One page of closure history, newest first.
///
/// `as_of` pins the highest insertion sequence visible to the first page so
/// later pages are not shifted by closures created in between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryQuery {
  pub page: u32,
  pub page_size: u32,
  pub fiscal_year: Option<i32>,
  pub as_of: Option<i64>,
}

impl HistoryQuery {
  pub fn new(
    page: u32,
    page_size: u32,
    fiscal_year: Option<i32>,
    as_of: Option<i64>,
  ) -> Result<Self, ClosureError> {
    if page == 0 {
      return Err(ClosureError::InvalidPage("page starts at 1".to_string()));
    }
    if page_size == 0 || page_size > MAX_PAGE_SIZE {
      return Err(ClosureError::InvalidPage(format!(
        "page_size must be between 1 and {}",
        MAX_PAGE_SIZE
      )));
    }
    Ok(Self {
      page,
      page_size,
      fiscal_year,
      as_of,
    })
  }

  pub fn offset(&self) -> u64 {
    u64::from(self.page - 1) * u64::from(self.page_size)
  }

  pub fn limit(&self) -> u64 {
    u64::from(self.page_size)
  }
}

impl Default for HistoryQuery {
  fn default() -> Self {
    Self {
      page: 1,
      page_size: DEFAULT_PAGE_SIZE,
      fiscal_year: None,
      as_of: None,
    }
  }
}
