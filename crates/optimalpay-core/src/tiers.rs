/// Tier categorization and budget allocation
///
/// Debts are split into HIGH / MEDIUM / LOW tiers by a closed rule table,
/// and the monthly budget is split among the tiers by percentage rules.
/// HIGH and MEDIUM tiers are planned by search; LOW runs the hybrid
/// avalanche phase.
use crate::types::{Debt, DebtType, Tier};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Indices into the input debt slice, grouped by tier
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TierAssignment {
    pub high: Vec<usize>,
    pub medium: Vec<usize>,
    pub low: Vec<usize>,
}

/// Monthly budget available to each tier
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TierBudgets {
    pub high: Decimal,
    pub medium: Decimal,
    pub low: Decimal,
}

/// Categorize a single debt. First matching rule wins.
pub fn categorize(debt: &Debt) -> Tier {
    let balance = debt.current_amount;
    let rate = debt.annual_rate;
    match debt.debt_type {
        DebtType::Mortgage => Tier::Low,
        DebtType::CreditCard => Tier::High,
        DebtType::MedicalDebt => Tier::High,
        DebtType::AutoLoan if balance > dec!(30000) => Tier::Low,
        DebtType::AutoLoan => Tier::Medium,
        DebtType::StudentLoan if rate > dec!(0.08) => Tier::Medium,
        DebtType::StudentLoan => Tier::Low,
        DebtType::PersonalLoan if rate > dec!(0.12) => Tier::High,
        DebtType::PersonalLoan => Tier::Medium,
        DebtType::Other if balance > dec!(50000) && rate < dec!(0.08) => Tier::Low,
        DebtType::Other if rate > dec!(0.15) || balance < dec!(5000) => Tier::High,
        DebtType::Other => Tier::Medium,
    }
}

/// Group debt indices by tier, preserving input order within each tier
pub fn assign_tiers(debts: &[Debt]) -> TierAssignment {
    let mut assignment = TierAssignment::default();
    for (index, debt) in debts.iter().enumerate() {
        match categorize(debt) {
            Tier::High => assignment.high.push(index),
            Tier::Medium => assignment.medium.push(index),
            Tier::Low => assignment.low.push(index),
        }
    }
    assignment
}

/// Split the monthly budget among tiers.
///
/// Each tier receives its own minimums plus a percentage share of the extra
/// budget. The share table is closed; an empty tier's share is reassigned so
/// no budget is stranded. The allocator always yields a valid split.
pub fn allocate(debts: &[Debt], assignment: &TierAssignment, budget: Decimal) -> TierBudgets {
    let minimums = |indices: &[usize]| -> Decimal {
        indices.iter().map(|&i| debts[i].minimum_payment).sum()
    };
    let min_high = minimums(&assignment.high);
    let min_medium = minimums(&assignment.medium);
    let min_low = minimums(&assignment.low);
    let extra = (budget - min_high - min_medium - min_low).max(Decimal::ZERO);

    let has_high = !assignment.high.is_empty();
    let has_medium = !assignment.medium.is_empty();
    let has_low = !assignment.low.is_empty();
    let high_has_medical = assignment
        .high
        .iter()
        .any(|&i| debts[i].debt_type == DebtType::MedicalDebt);
    let medium_all_student = has_medium
        && assignment
            .medium
            .iter()
            .all(|&i| debts[i].debt_type == DebtType::StudentLoan);

    let (mut p_high, mut p_medium, mut p_low) = if high_has_medical {
        (dec!(0.9), dec!(0.1), Decimal::ZERO)
    } else if has_low && !has_high && !has_medium {
        (Decimal::ZERO, Decimal::ZERO, Decimal::ONE)
    } else if has_high && !has_medium && !has_low {
        (Decimal::ONE, Decimal::ZERO, Decimal::ZERO)
    } else if has_medium && !has_high && !has_low {
        (Decimal::ZERO, Decimal::ONE, Decimal::ZERO)
    } else if !has_medium {
        (dec!(0.8), Decimal::ZERO, dec!(0.2))
    } else if medium_all_student {
        let p_medium = dec!(0.3).min(dec!(0.2) + dec!(0.1));
        (Decimal::ONE - p_medium, p_medium, Decimal::ZERO)
    } else {
        (dec!(0.8), dec!(0.2), Decimal::ZERO)
    };

    // Reassign shares pointed at empty tiers: MEDIUM falls to LOW, LOW rises
    // to HIGH, HIGH falls to MEDIUM, each with the other tier as backstop.
    if !has_medium && p_medium > Decimal::ZERO {
        let share = std::mem::take(&mut p_medium);
        if has_low {
            p_low += share;
        } else {
            p_high += share;
        }
    }
    if !has_low && p_low > Decimal::ZERO {
        let share = std::mem::take(&mut p_low);
        if has_high {
            p_high += share;
        } else {
            p_medium += share;
        }
    }
    if !has_high && p_high > Decimal::ZERO {
        let share = std::mem::take(&mut p_high);
        if has_medium {
            p_medium += share;
        } else {
            p_low += share;
        }
    }

    let high = min_high + (p_high * extra).round_dp(2);
    let medium = min_medium + (p_medium * extra).round_dp(2);
    // Remainder keeps the three tier budgets summing exactly to the budget
    let low = budget - high - medium;
    TierBudgets { high, medium, low }
}
