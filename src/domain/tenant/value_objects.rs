use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::domain::errors::ValueObjectError;

// Legal tax identifier of a tenant (e.g. a Spanish NIF/CIF)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaxId(String);

impl TaxId {
  pub fn new(value: impl Into<String>) -> Result<Self, ValueObjectError> {
    let normalized: String = value
      .into()
      .trim()
      .chars()
      .filter(|c| !matches!(c, ' ' | '-' | '.'))
      .collect::<String>()
      .to_uppercase();

    if normalized.len() < 2 || normalized.len() > 20 {
      return Err(ValueObjectError::InvalidTaxId(
        "Tax ID must be between 2 and 20 characters".to_string(),
      ));
    }
    if !normalized.chars().all(|c| c.is_ascii_alphanumeric()) {
      return Err(ValueObjectError::InvalidTaxId(format!(
        "Tax ID contains invalid characters: {}",
        normalized
      )));
    }
    Ok(Self(normalized))
  }

  pub fn value(&self) -> &str {
    &self.0
  }

  /// Storage namespace derived from the tax ID.
  ///
  /// Deterministic, so re-provisioning a tenant always lands on the same
  /// namespace, and two tax IDs never share one in practice.
  pub fn namespace(&self) -> String {
    let digest = Sha256::digest(self.0.as_bytes());
    format!("t_{}", &hex::encode(digest)[..16])
  }
}

impl fmt::Display for TaxId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_tax_id_normalization() {
    let tax_id = TaxId::new(" b-1234 5678 ").unwrap();
    assert_eq!(tax_id.value(), "B12345678");
  }

  #[test]
  fn test_tax_id_rejects_garbage() {
    assert!(TaxId::new("").is_err());
    assert!(TaxId::new("A").is_err());
    assert!(TaxId::new("B1234/5678").is_err());
    assert!(TaxId::new("X".repeat(21)).is_err());
  }

  #[test]
  fn test_namespace_is_deterministic() {
    let a = TaxId::new("B12345678").unwrap();
    let b = TaxId::new("b-12345678").unwrap();
    let c = TaxId::new("A87654321").unwrap();

    assert_eq!(a.namespace(), b.namespace());
    assert_ne!(a.namespace(), c.namespace());
    assert!(a.namespace().starts_with("t_"));
    assert_eq!(a.namespace().len(), 18);
  }
}
