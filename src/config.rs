use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::{LoanError, Result};
use crate::types::{Currency, RepaymentFrequency};

/// lending configuration shared by applications and schedule generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub currency: Currency,
    /// frequency assigned to new applications
    pub default_frequency: RepaymentFrequency,
    /// frequencies the schedule generator accepts
    pub enabled_frequencies: Vec<RepaymentFrequency>,
    pub minimum_principal: Money,
    pub maximum_principal: Money,
    /// upper bound on installment count
    pub maximum_term: u16,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            currency: Currency::Inr,
            default_frequency: RepaymentFrequency::Weekly,
            enabled_frequencies: vec![RepaymentFrequency::Weekly],
            minimum_principal: Money::CENT,
            // 12 digits with 2 fraction digits
            maximum_principal: Money::from_minor(999_999_999_999),
            maximum_term: 520,
        }
    }
}

impl LedgerConfig {
    /// parse and validate a json configuration document
    pub fn from_json(json: &str) -> Result<Self> {
        let config: LedgerConfig =
            serde_json::from_str(json).map_err(|e| LoanError::InvalidConfiguration {
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.enabled_frequencies.is_empty() {
            return Err(LoanError::InvalidConfiguration {
                message: "at least one repayment frequency must be enabled".to_string(),
            });
        }

        if !self.supports(self.default_frequency) {
            return Err(LoanError::InvalidConfiguration {
                message: format!(
                    "default frequency {:?} is not enabled",
                    self.default_frequency
                ),
            });
        }

        if !self.minimum_principal.is_positive() || self.minimum_principal > self.maximum_principal
        {
            return Err(LoanError::InvalidConfiguration {
                message: format!(
                    "principal bounds [{}, {}] are invalid",
                    self.minimum_principal, self.maximum_principal
                ),
            });
        }

        if self.maximum_term == 0 {
            return Err(LoanError::InvalidConfiguration {
                message: "maximum term must be at least 1".to_string(),
            });
        }

        Ok(())
    }

    pub fn supports(&self, frequency: RepaymentFrequency) -> bool {
        self.enabled_frequencies.contains(&frequency)
    }

    /// check a requested principal and term against the configured bounds
    pub fn validate_terms(&self, principal: Money, term: u16) -> Result<()> {
        if !principal.is_positive() {
            return Err(LoanError::Validation {
                message: format!("principal must be positive, got {}", principal),
            });
        }

        if principal < self.minimum_principal || principal > self.maximum_principal {
            return Err(LoanError::Validation {
                message: format!(
                    "principal {} outside allowed range [{}, {}]",
                    principal, self.minimum_principal, self.maximum_principal
                ),
            });
        }

        if term == 0 || term > self.maximum_term {
            return Err(LoanError::Validation {
                message: format!("term must be between 1 and {}, got {}", self.maximum_term, term),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = LedgerConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.supports(RepaymentFrequency::Weekly));
        assert!(!config.supports(RepaymentFrequency::Monthly));
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let config = LedgerConfig::from_json(
            r#"{ "enabled_frequencies": [7, 30], "maximum_term": 24 }"#,
        )
        .unwrap();
        assert_eq!(config.maximum_term, 24);
        assert!(config.supports(RepaymentFrequency::Monthly));
        assert_eq!(config.default_frequency, RepaymentFrequency::Weekly);
    }

    #[test]
    fn test_from_json_rejects_unknown_frequency() {
        let err = LedgerConfig::from_json(r#"{ "enabled_frequencies": [9] }"#).unwrap_err();
        assert!(matches!(err, LoanError::InvalidConfiguration { .. }));
    }

    #[test]
    fn test_from_json_amounts_carry_two_fraction_digits() {
        let config = LedgerConfig::from_json(r#"{ "minimum_principal": "500" }"#).unwrap();
        assert_eq!(config.minimum_principal.to_string(), "500.00");

        let err =
            LedgerConfig::from_json(r#"{ "minimum_principal": "0.001" }"#).unwrap_err();
        assert!(matches!(err, LoanError::InvalidConfiguration { .. }));
    }

    #[test]
    fn test_default_frequency_must_be_enabled() {
        let config = LedgerConfig {
            default_frequency: RepaymentFrequency::Monthly,
            ..LedgerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_terms() {
        let config = LedgerConfig {
            maximum_term: 52,
            ..LedgerConfig::default()
        };
        assert!(config.validate_terms(Money::from_major(100), 5).is_ok());
        assert!(config.validate_terms(Money::ZERO, 5).is_err());
        assert!(config.validate_terms(Money::from_major(-5), 5).is_err());
        assert!(config.validate_terms(Money::from_major(100), 0).is_err());
        assert!(config.validate_terms(Money::from_major(100), 53).is_err());
    }
}
