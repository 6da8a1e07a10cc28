/// Error handling for the debt planning engine
///
/// The taxonomy is small and closed: inputs are rejected up front with a
/// single terminal error, resource exhaustion is recovered internally (the
/// plan degrades to best-found), and a non-monotonic balance during the
/// final simulation is fatal because it indicates a bug.
use rust_decimal::Decimal;
use thiserror::Error;

/// Result type alias for planning operations
pub type Result<T> = std::result::Result<T, PlanError>;

/// Errors surfaced by `DebtPlanner::plan`
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlanError {
    /// The monthly budget cannot cover the sum of minimum payments
    #[error("monthly budget {budget} does not cover minimum payments totaling {required}")]
    InsufficientBudget { budget: Decimal, required: Decimal },

    /// A debt's minimum payment does not exceed its monthly interest,
    /// so the balance would never amortize
    #[error("debt '{debt_name}' has minimum payment {minimum} not exceeding monthly interest {monthly_interest}")]
    NegativeAmortization {
        debt_name: String,
        minimum: Decimal,
        monthly_interest: Decimal,
    },

    /// A debt record failed field validation
    #[error("invalid debt '{debt_name}': {reason}")]
    InvalidDebt { debt_name: String, reason: String },

    /// The simulator observed a balance increasing month over month
    #[error("calculation error in month {month} for debt '{debt_name}': balance rose from {previous} to {current}")]
    CalculationError {
        month: u32,
        debt_name: String,
        previous: Decimal,
        current: Decimal,
    },
}

impl PlanError {
    /// Check whether the error stems from caller input rather than a bug
    pub fn is_input_error(&self) -> bool {
        !matches!(self, PlanError::CalculationError { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_insufficient_budget_message() {
        let err = PlanError::InsufficientBudget {
            budget: dec!(800),
            required: dec!(900),
        };
        assert!(err.to_string().contains("800"));
        assert!(err.to_string().contains("900"));
        assert!(err.is_input_error());
    }

    #[test]
    fn test_calculation_error_is_not_input_error() {
        let err = PlanError::CalculationError {
            month: 4,
            debt_name: "Visa".to_string(),
            previous: dec!(100),
            current: dec!(101),
        };
        assert!(!err.is_input_error());
    }
}
