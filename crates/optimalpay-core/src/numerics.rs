/// Pure amortization arithmetic
///
/// Interest is charged monthly at annual_rate / 12 and rounded to cents so
/// that per-debt conservation (principal paid equals starting balance) holds
/// exactly across a full schedule.
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;

const MONTHS_PER_YEAR: Decimal = dec!(12);

/// One month of payment application to a single balance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaymentBreakdown {
    /// Payment actually applied (clamped to the payoff amount)
    pub payment: Decimal,
    pub interest: Decimal,
    pub principal: Decimal,
    pub new_balance: Decimal,
}

/// Monthly interest charge, rounded to cents
pub fn monthly_interest(balance: Decimal, annual_rate: Decimal) -> Decimal {
    (balance * annual_rate / MONTHS_PER_YEAR).round_dp(2)
}

/// Apply one monthly payment to a balance.
///
/// The payment is clamped to `balance + interest` so a debt is never
/// overpaid. A payment below the interest charge yields negative principal
/// and a growing balance; input validation rejects such debts before
/// planning, but the arithmetic stays well-defined.
pub fn apply_payment(balance: Decimal, annual_rate: Decimal, payment: Decimal) -> PaymentBreakdown {
    let interest = monthly_interest(balance, annual_rate);
    let applied = payment.min(balance + interest);
    let principal = applied - interest;
    let new_balance = if principal >= Decimal::ZERO {
        (balance - principal).max(Decimal::ZERO)
    } else {
        balance - principal
    };
    PaymentBreakdown {
        payment: applied,
        interest,
        principal,
        new_balance,
    }
}

/// Closed-form months to retire a balance at a fixed monthly payment.
///
/// Returns `None` when the payment does not exceed the monthly interest
/// charge (the balance never amortizes).
pub fn months_to_payoff(balance: Decimal, annual_rate: Decimal, payment: Decimal) -> Option<u32> {
    if balance <= Decimal::ZERO {
        return Some(0);
    }
    let monthly_rate = annual_rate / MONTHS_PER_YEAR;
    let interest = balance * monthly_rate;
    if payment <= interest {
        return None;
    }
    if monthly_rate.is_zero() {
        return (balance / payment).ceil().to_u32();
    }
    // n = -ln(1 - i*B/P) / ln(1 + i), standard amortization
    let inner = Decimal::ONE - interest / payment;
    (-(inner.ln()) / (Decimal::ONE + monthly_rate).ln())
        .ceil()
        .to_u32()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monthly_interest_rounds_to_cents() {
        // 24.99% APR on $1234.56 -> 1234.56 * 0.2499 / 12 = 25.70971...
        assert_eq!(monthly_interest(dec!(1234.56), dec!(0.2499)), dec!(25.71));
        assert_eq!(monthly_interest(dec!(1000), dec!(0.12)), dec!(10));
        assert_eq!(monthly_interest(dec!(0), dec!(0.30)), dec!(0));
    }

    #[test]
    fn test_apply_payment_splits_interest_and_principal() {
        let outcome = apply_payment(dec!(1000), dec!(0.12), dec!(150));
        assert_eq!(outcome.interest, dec!(10));
        assert_eq!(outcome.principal, dec!(140));
        assert_eq!(outcome.new_balance, dec!(860));
        assert_eq!(outcome.payment, dec!(150));
    }

    #[test]
    fn test_apply_payment_clamps_to_payoff() {
        let outcome = apply_payment(dec!(80), dec!(0.12), dec!(500));
        assert_eq!(outcome.interest, dec!(0.80));
        assert_eq!(outcome.payment, dec!(80.80));
        assert_eq!(outcome.principal, dec!(80));
        assert_eq!(outcome.new_balance, dec!(0));
    }

    #[test]
    fn test_apply_payment_negative_principal_grows_balance() {
        let outcome = apply_payment(dec!(10000), dec!(0.30), dec!(50));
        assert_eq!(outcome.interest, dec!(250));
        assert_eq!(outcome.principal, dec!(-200));
        assert_eq!(outcome.new_balance, dec!(10200));
    }

    #[test]
    fn test_months_to_payoff_zero_rate() {
        assert_eq!(months_to_payoff(dec!(1000), dec!(0), dec!(100)), Some(10));
        assert_eq!(months_to_payoff(dec!(1001), dec!(0), dec!(100)), Some(11));
    }

    #[test]
    fn test_months_to_payoff_matches_simulation() {
        let (balance, rate, payment) = (dec!(1000), dec!(0.20), dec!(200));
        let closed_form = months_to_payoff(balance, rate, payment).unwrap();

        let mut b = balance;
        let mut months = 0;
        while b > Decimal::ZERO {
            b = apply_payment(b, rate, payment).new_balance;
            months += 1;
        }
        assert_eq!(closed_form, months);
    }

    #[test]
    fn test_months_to_payoff_diverges_when_payment_too_small() {
        assert_eq!(months_to_payoff(dec!(10000), dec!(0.30), dec!(250)), None);
        assert_eq!(months_to_payoff(dec!(10000), dec!(0.30), dec!(50)), None);
    }

    #[test]
    fn test_months_to_payoff_zero_balance() {
        assert_eq!(months_to_payoff(dec!(0), dec!(0.20), dec!(50)), Some(0));
    }
}
