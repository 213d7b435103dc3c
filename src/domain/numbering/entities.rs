use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::NumberingError;
use super::value_objects::{FormatTemplate, SeriesCode, SeriesState};
use crate::domain::document::DocumentType;

/// Natural key of a numbering series.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeriesKey {
  pub tenant_id: Uuid,
  pub code: SeriesCode,
  pub document_type: DocumentType,
  pub fiscal_year: i32,
}

impl SeriesKey {
  pub fn new(tenant_id: Uuid, code: SeriesCode, document_type: DocumentType, fiscal_year: i32) -> Self {
    Self {
      tenant_id,
      code,
      document_type,
      fiscal_year,
    }
  }

  /// Key of the series the default bootstrap creates for `document_type`.
  pub fn default_for(tenant_id: Uuid, document_type: DocumentType, fiscal_year: i32) -> Self {
    Self {
      tenant_id,
      code: SeriesCode::default_for(document_type),
      document_type,
      fiscal_year,
    }
  }
}

/// A reserved number. Once handed out it is never handed out again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllocatedNumber {
  pub series_id: Uuid,
  pub sequence: i64,
  pub formatted: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumberingSeries {
  pub id: Uuid,
  pub tenant_id: Uuid,
  pub code: SeriesCode,
  pub document_type: DocumentType,
  pub fiscal_year: i32,
  pub next_number: i64,
  pub format_template: FormatTemplate,
  pub padding_width: i32,
  pub state: SeriesState,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl NumberingSeries {
  pub fn new(key: SeriesKey, format_template: FormatTemplate, padding_width: usize) -> Self {
    let now = Utc::now();
    Self {
      id: Uuid::new_v4(),
      tenant_id: key.tenant_id,
      code: key.code,
      document_type: key.document_type,
      fiscal_year: key.fiscal_year,
      next_number: 1,
      format_template,
      padding_width: padding_width as i32,
      state: SeriesState::Active,
      created_at: now,
      updated_at: now,
    }
  }

  pub fn key(&self) -> SeriesKey {
    SeriesKey::new(
      self.tenant_id,
      self.code.clone(),
      self.document_type,
      self.fiscal_year,
    )
  }

  /// Hand out the current counter value and advance it.
  ///
  /// Must only run on a series read under a row lock in the caller's
  /// transaction; the counter never decreases.
  pub fn reserve(&mut self) -> Result<AllocatedNumber, NumberingError> {
    match self.state {
      SeriesState::Active => {}
      SeriesState::Locked => return Err(NumberingError::SeriesLocked(self.code.to_string())),
    }

    let sequence = self.next_number;
    self.next_number = sequence
      .checked_add(1)
      .ok_or_else(|| NumberingError::CounterOverflow(self.code.to_string()))?;
    self.updated_at = Utc::now();

    Ok(AllocatedNumber {
      series_id: self.id,
      sequence,
      formatted: self.format_template.render(
        &self.code,
        sequence,
        self.fiscal_year,
        self.padding_width.max(0) as usize,
      ),
    })
  }

  pub fn lock(&mut self) -> Result<(), NumberingError> {
    if self.state == SeriesState::Locked {
      return Ok(());
    }
    if !self.state.can_transition_to(SeriesState::Locked) {
      return Err(NumberingError::SeriesLocked(self.code.to_string()));
    }
    self.state = SeriesState::Locked;
    self.updated_at = Utc::now();
    Ok(())
  }
}
