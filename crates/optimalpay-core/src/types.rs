/// Core input types for the debt planning engine
///
/// All monetary values are decimal dollars and all rates are decimal
/// fractions (0.2499 for 24.99% APR). Debts are immutable input records;
/// the planner never mutates caller data.
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Balances at or below this are treated as already paid
pub const ACTIVE_BALANCE_FLOOR: Decimal = dec!(1);

/// Outstanding debt record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Debt {
    pub id: Uuid,
    #[validate(length(min = 1))]
    pub name: String,
    pub debt_type: DebtType,
    #[validate(custom(function = non_negative_amount))]
    pub original_amount: Decimal,
    #[validate(custom(function = non_negative_amount))]
    pub current_amount: Decimal,
    #[validate(custom(function = non_negative_amount))]
    pub annual_rate: Decimal,
    #[validate(custom(function = non_negative_amount))]
    pub minimum_payment: Decimal,
}

/// Types of debt for tier categorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DebtType {
    CreditCard,
    MedicalDebt,
    AutoLoan,
    StudentLoan,
    PersonalLoan,
    Mortgage,
    Other,
}

/// Priority tier a debt is planned under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Tier {
    High,
    Medium,
    Low,
}

impl Debt {
    /// Create a new debt record with a fresh id
    pub fn new(
        name: impl Into<String>,
        debt_type: DebtType,
        current_amount: Decimal,
        annual_rate: Decimal,
        minimum_payment: Decimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            debt_type,
            original_amount: current_amount,
            current_amount,
            annual_rate,
            minimum_payment,
        }
    }

    /// Monthly interest charge at the current balance
    pub fn monthly_interest(&self) -> Decimal {
        crate::numerics::monthly_interest(self.current_amount, self.annual_rate)
    }

    /// Whether the debt still needs payments
    pub fn is_active(&self) -> bool {
        self.current_amount > ACTIVE_BALANCE_FLOOR
    }
}

fn non_negative_amount(value: &Decimal) -> std::result::Result<(), ValidationError> {
    if value.is_sign_negative() {
        return Err(ValidationError::new("negative_amount"));
    }
    Ok(())
}

impl fmt::Display for DebtType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DebtType::CreditCard => write!(f, "Credit Card"),
            DebtType::MedicalDebt => write!(f, "Medical Debt"),
            DebtType::AutoLoan => write!(f, "Auto Loan"),
            DebtType::StudentLoan => write!(f, "Student Loan"),
            DebtType::PersonalLoan => write!(f, "Personal Loan"),
            DebtType::Mortgage => write!(f, "Mortgage"),
            DebtType::Other => write!(f, "Other"),
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::High => write!(f, "HIGH"),
            Tier::Medium => write!(f, "MEDIUM"),
            Tier::Low => write!(f, "LOW"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debt_creation() {
        let debt = Debt::new(
            "Test Credit Card",
            DebtType::CreditCard,
            dec!(5000),
            dec!(0.1899),
            dec!(100),
        );

        assert_eq!(debt.debt_type, DebtType::CreditCard);
        assert_eq!(debt.current_amount, dec!(5000));
        assert_eq!(debt.original_amount, dec!(5000));
        assert!(debt.is_active());
    }

    #[test]
    fn test_monthly_interest() {
        let debt = Debt::new(
            "Test Card",
            DebtType::CreditCard,
            dec!(1000),
            dec!(0.12),
            dec!(50),
        );
        // 12% annual = 1% monthly
        assert_eq!(debt.monthly_interest(), dec!(10));
    }

    #[test]
    fn test_active_floor() {
        let mut debt = Debt::new("Residual", DebtType::Other, dec!(0.75), dec!(0.1), dec!(25));
        assert!(!debt.is_active());
        debt.current_amount = dec!(1.01);
        assert!(debt.is_active());
    }

    #[test]
    fn test_validation_rejects_negative_amounts() {
        let mut debt = Debt::new("Bad", DebtType::Other, dec!(100), dec!(0.1), dec!(10));
        assert!(debt.validate().is_ok());

        debt.current_amount = dec!(-5);
        assert!(debt.validate().is_err());
    }

    #[test]
    fn test_debt_type_serde_names() {
        let json = serde_json::to_string(&DebtType::CreditCard).unwrap();
        assert_eq!(json, "\"CREDIT_CARD\"");
        let back: DebtType = serde_json::from_str("\"MEDICAL_DEBT\"").unwrap();
        assert_eq!(back, DebtType::MedicalDebt);
    }
}
