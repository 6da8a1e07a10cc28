/// Candidate payment-vector generation
///
/// Each month the search considers a small ranked set of payment strategies
/// rather than the full combinatorial space. The eight generators are
/// variants of one flat sum type; a switch over the kind keeps the hot loop
/// free of dynamic dispatch.
use crate::numerics::{monthly_interest, months_to_payoff};
use crate::types::{Debt, ACTIVE_BALANCE_FLOOR};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::fmt;

/// The strategy family an action was generated by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    /// Minimum payment on every active debt
    MinimumsOnly,
    /// Retire every debt whose whole balance fits in this month's extra
    ImmediateLiberation,
    /// Push the one or two debts within three months of payoff over the line
    RapidLiberation,
    /// All extra to the largest monthly interest charge
    SmartAvalanche,
    /// All extra to the largest balance-to-minimum ratio
    Efficiency,
    /// All extra to the best cash-flow score (12·minimum + interest)
    CashFlowWeighted,
    /// 65/35 split across the top two combined-score debts
    Balanced,
    /// All extra to the smallest balance among meaningful minimums
    ProgressiveSnowball,
}

impl StrategyKind {
    pub fn priority(self) -> i32 {
        match self {
            StrategyKind::MinimumsOnly => 0,
            StrategyKind::ImmediateLiberation => 100,
            StrategyKind::RapidLiberation => 90,
            StrategyKind::SmartAvalanche => 80,
            StrategyKind::Efficiency => 75,
            StrategyKind::CashFlowWeighted => 70,
            StrategyKind::Balanced => 60,
            StrategyKind::ProgressiveSnowball => 50,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StrategyKind::MinimumsOnly => "Minimum Payments",
            StrategyKind::ImmediateLiberation => "Immediate Liberation",
            StrategyKind::RapidLiberation => "Rapid Liberation",
            StrategyKind::SmartAvalanche => "Smart Avalanche",
            StrategyKind::Efficiency => "Efficiency Targeting",
            StrategyKind::CashFlowWeighted => "Cash Flow Weighted",
            StrategyKind::Balanced => "Balanced 65/35",
            StrategyKind::ProgressiveSnowball => "Progressive Snowball",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One month's candidate payment vector
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    pub kind: StrategyKind,
    pub payments: Vec<Decimal>,
    pub priority: i32,
}

impl Action {
    fn new(kind: StrategyKind, payments: Vec<Decimal>) -> Self {
        Self {
            kind,
            payments,
            priority: kind.priority(),
        }
    }
}

/// Generate the ranked candidate actions for one month.
///
/// `balances` is aligned to `debts`; `budget` is the month's effective
/// budget. Every action pays at least the minimum on each active debt,
/// nothing on retired debts, and never exceeds the budget in total. The
/// result is deduplicated by payment vector and sorted by priority.
pub fn generate(debts: &[Debt], balances: &[Decimal], budget: Decimal) -> Vec<Action> {
    let n = debts.len();
    debug_assert_eq!(n, balances.len());

    let active: Vec<bool> = balances.iter().map(|&b| b > ACTIVE_BALANCE_FLOOR).collect();
    let interest: Vec<Decimal> = (0..n)
        .map(|i| {
            if active[i] {
                monthly_interest(balances[i], debts[i].annual_rate)
            } else {
                Decimal::ZERO
            }
        })
        .collect();
    let base: Vec<Decimal> = (0..n)
        .map(|i| {
            if active[i] {
                debts[i].minimum_payment
            } else {
                Decimal::ZERO
            }
        })
        .collect();
    let sum_minimums: Decimal = base.iter().copied().sum();
    let extra = budget - sum_minimums;

    let mut actions = vec![Action::new(StrategyKind::MinimumsOnly, base.clone())];
    if extra <= Decimal::ZERO {
        return finalize(actions, balances, &interest, &active);
    }

    let active_indices: Vec<usize> = (0..n).filter(|&i| active[i]).collect();

    // Immediate Liberation: one action retiring everything that fits in the
    // extra, in input order while the pool lasts
    let liberatable: Vec<usize> = active_indices
        .iter()
        .copied()
        .filter(|&i| balances[i] <= extra)
        .collect();
    if !liberatable.is_empty() {
        let mut payments = base.clone();
        let mut pool = extra;
        for &i in &liberatable {
            let need = (balances[i] + interest[i] - base[i]).max(Decimal::ZERO);
            let grant = need.min(pool);
            payments[i] += grant;
            pool -= grant;
            if pool <= Decimal::ZERO {
                break;
            }
        }
        actions.push(Action::new(StrategyKind::ImmediateLiberation, payments));
    }

    // Rapid Liberation: up to two near-payoff debts, largest freed cash flow
    // first, each funded to payoff while the pool lasts
    let mut rapid: Vec<usize> = active_indices
        .iter()
        .copied()
        .filter(|&i| {
            balances[i] <= extra * dec!(2.5)
                && months_to_payoff(
                    balances[i],
                    debts[i].annual_rate,
                    debts[i].minimum_payment + extra,
                )
                .is_some_and(|m| m <= 3)
        })
        .collect();
    rapid.sort_by(|&a, &b| {
        debts[b]
            .minimum_payment
            .cmp(&debts[a].minimum_payment)
            .then_with(|| a.cmp(&b))
    });
    rapid.truncate(2);
    if !rapid.is_empty() {
        let mut payments = base.clone();
        let mut pool = extra;
        for &i in &rapid {
            let need = (balances[i] + interest[i] - base[i]).max(Decimal::ZERO);
            let grant = need.min(pool);
            payments[i] += grant;
            pool -= grant;
        }
        actions.push(Action::new(StrategyKind::RapidLiberation, payments));
    }

    // Smart Avalanche
    if let Some(target) = arg_best(&active_indices, |i| interest[i]) {
        let mut payments = base.clone();
        payments[target] += extra;
        actions.push(Action::new(StrategyKind::SmartAvalanche, payments));
    }

    // Efficiency: balance-to-minimum ratio
    if let Some(target) = arg_best(&active_indices, |i| {
        balances[i] / debts[i].minimum_payment.max(dec!(0.01))
    }) {
        let mut payments = base.clone();
        payments[target] += extra;
        actions.push(Action::new(StrategyKind::Efficiency, payments));
    }

    // Cash-flow-weighted score
    if let Some(target) = arg_best(&active_indices, |i| {
        dec!(12) * debts[i].minimum_payment + interest[i]
    }) {
        let mut payments = base.clone();
        payments[target] += extra;
        actions.push(Action::new(StrategyKind::CashFlowWeighted, payments));
    }

    // Balanced 65/35 across the top two combined scores
    if extra >= dec!(100) && active_indices.len() >= 2 {
        let score = |i: usize| {
            interest[i]
                + dec!(3) * debts[i].minimum_payment
                + balances[i] / debts[i].minimum_payment.max(dec!(0.01)) / dec!(10)
        };
        let mut ranked = active_indices.clone();
        ranked.sort_by(|&a, &b| score(b).cmp(&score(a)).then_with(|| a.cmp(&b)));
        let major = (extra * dec!(0.65)).floor();
        let mut payments = base.clone();
        payments[ranked[0]] += major;
        payments[ranked[1]] += extra - major;
        actions.push(Action::new(StrategyKind::Balanced, payments));
    }

    // Progressive Snowball among debts with meaningful minimums
    let snowball_pool: Vec<usize> = active_indices
        .iter()
        .copied()
        .filter(|&i| debts[i].minimum_payment >= dec!(50))
        .collect();
    if let Some(target) = arg_best(&snowball_pool, |i| -balances[i]) {
        let mut payments = base.clone();
        payments[target] += extra;
        actions.push(Action::new(StrategyKind::ProgressiveSnowball, payments));
    }

    finalize(actions, balances, &interest, &active)
}

/// Index with the strictly largest key; earlier index wins ties
fn arg_best(indices: &[usize], key: impl Fn(usize) -> Decimal) -> Option<usize> {
    let mut best: Option<(usize, Decimal)> = None;
    for &i in indices {
        let k = key(i);
        match best {
            Some((_, best_k)) if k <= best_k => {}
            _ => best = Some((i, k)),
        }
    }
    best.map(|(i, _)| i)
}

/// Clamp to payoff amounts, zero retired debts, dedupe, sort by priority
fn finalize(
    mut actions: Vec<Action>,
    balances: &[Decimal],
    interest: &[Decimal],
    active: &[bool],
) -> Vec<Action> {
    for action in &mut actions {
        for i in 0..action.payments.len() {
            if !active[i] {
                action.payments[i] = Decimal::ZERO;
            } else {
                action.payments[i] = action.payments[i].min(balances[i] + interest[i]).round_dp(2);
            }
        }
    }
    actions.sort_by(|a, b| b.priority.cmp(&a.priority));
    let mut unique: Vec<Action> = Vec::with_capacity(actions.len());
    for action in actions {
        if !unique.iter().any(|u| u.payments == action.payments) {
            unique.push(action);
        }
    }
    unique
}
