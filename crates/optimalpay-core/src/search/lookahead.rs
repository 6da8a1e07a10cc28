/// Three-month lookahead scoring
///
/// The raw strategy priorities are static; the lookahead refines the top
/// candidates by simulating three months of self-repeated application on
/// discretized balances. Early full payoff earns a dominant reward so the
/// search closes out end-games aggressively.
use crate::numerics::apply_payment;
use crate::search::discretize::{snap, snap_all};
use crate::search::strategies::Action;
use crate::types::Debt;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::cmp::Ordering;

/// How many of the highest-priority actions get a simulated score
const SIMULATED_ACTIONS: usize = 3;

/// How many actions survive ranking into expansion
const MAX_SURVIVORS: usize = 4;

/// Balance level treated as fully paid inside the lookahead
const PAYOFF_EPSILON: Decimal = dec!(5);

/// An action paired with its lookahead score
#[derive(Debug, Clone)]
pub struct ScoredAction {
    pub action: Action,
    pub score: f64,
}

/// Score and rank candidate actions, keeping the best few.
///
/// The top three actions by priority are simulated; the rest inherit their
/// raw priority as score. Ordering is deterministic: score, then priority,
/// then generation order.
pub fn rank(mut actions: Vec<Action>, debts: &[Debt], balances: &[Decimal]) -> Vec<ScoredAction> {
    actions.sort_by(|a, b| b.priority.cmp(&a.priority));
    let mut scored: Vec<ScoredAction> = actions
        .into_iter()
        .enumerate()
        .map(|(index, action)| {
            let score = if index < SIMULATED_ACTIONS {
                simulate(&action, debts, balances)
            } else {
                action.priority as f64
            };
            ScoredAction { action, score }
        })
        .collect();
    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.action.priority.cmp(&a.action.priority))
    });
    scored.truncate(MAX_SURVIVORS);
    scored
}

/// Simulate three months of repeating this action on discretized balances
fn simulate(action: &Action, debts: &[Debt], balances: &[Decimal]) -> f64 {
    let mut work = snap_all(balances);
    let start_total: Decimal = work.iter().copied().sum();
    let mut principal_paid = Decimal::ZERO;
    let mut interest_paid = Decimal::ZERO;

    for month in 1..=3u32 {
        for i in 0..work.len() {
            let outcome = apply_payment(work[i], debts[i].annual_rate, action.payments[i]);
            principal_paid += outcome.principal;
            interest_paid += outcome.interest;
            work[i] = snap(outcome.new_balance);
        }
        if work.iter().all(|&b| b <= PAYOFF_EPSILON) {
            return (1000 - month) as f64;
        }
    }

    let end_total: Decimal = work.iter().copied().sum();
    let reduction = (start_total - end_total).to_f64().unwrap_or(0.0);
    let principal = principal_paid.to_f64().unwrap_or(0.0);
    let interest = interest_paid.to_f64().unwrap_or(0.0);
    10.0 * reduction + 5.0 * (principal / interest.max(1.0)) + principal
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::strategies::generate;
    use crate::types::DebtType;

    fn card(balance: Decimal, rate: Decimal, minimum: Decimal) -> Debt {
        Debt::new("card", DebtType::CreditCard, balance, rate, minimum)
    }

    #[test]
    fn test_completion_reward_dominates() {
        let debts = vec![card(dec!(150), dec!(0.20), dec!(25))];
        let balances = vec![dec!(150)];
        let actions = generate(&debts, &balances, dec!(200));
        let ranked = rank(actions, &debts, &balances);

        // paying off in month one scores 999, far above any gradual score
        assert!(ranked[0].score >= 999.0);
        assert!(ranked[0].action.payments[0] > dec!(100));
    }

    #[test]
    fn test_survivor_cap() {
        let debts = vec![
            card(dec!(300), dec!(0.26), dec!(60)),
            card(dec!(2500), dec!(0.22), dec!(75)),
            card(dec!(4800), dec!(0.19), dec!(140)),
            card(dec!(900), dec!(0.24), dec!(55)),
        ];
        let balances: Vec<Decimal> = debts.iter().map(|d| d.current_amount).collect();
        let actions = generate(&debts, &balances, dec!(700));
        assert!(actions.len() > MAX_SURVIVORS);

        let ranked = rank(actions, &debts, &balances);
        assert_eq!(ranked.len(), MAX_SURVIVORS);
    }

    #[test]
    fn test_unsimulated_actions_inherit_priority() {
        let debts = vec![
            card(dec!(2500), dec!(0.22), dec!(75)),
            card(dec!(4800), dec!(0.19), dec!(140)),
        ];
        let balances: Vec<Decimal> = debts.iter().map(|d| d.current_amount).collect();
        let actions = generate(&debts, &balances, dec!(400));
        let ranked = rank(actions, &debts, &balances);

        // actions beyond the simulated top three carry their raw priority
        for survivor in ranked.iter().filter(|s| s.score <= 100.0) {
            assert_eq!(survivor.score, survivor.action.priority as f64);
        }
    }

    #[test]
    fn test_bigger_extra_scores_higher() {
        let debts = vec![card(dec!(4000), dec!(0.22), dec!(120))];
        let balances = vec![dec!(4000)];

        let minimums = Action {
            kind: crate::search::strategies::StrategyKind::MinimumsOnly,
            payments: vec![dec!(120)],
            priority: 0,
        };
        let aggressive = Action {
            kind: crate::search::strategies::StrategyKind::SmartAvalanche,
            payments: vec![dec!(420)],
            priority: 80,
        };
        let low = simulate(&minimums, &debts, &balances);
        let high = simulate(&aggressive, &debts, &balances);
        assert!(high > low);
    }

    #[test]
    fn test_ranking_is_deterministic() {
        let debts = vec![
            card(dec!(2500), dec!(0.22), dec!(75)),
            card(dec!(900), dec!(0.24), dec!(55)),
        ];
        let balances: Vec<Decimal> = debts.iter().map(|d| d.current_amount).collect();
        let a = rank(generate(&debts, &balances, dec!(400)), &debts, &balances);
        let b = rank(generate(&debts, &balances, dec!(400)), &debts, &balances);

        let kinds_a: Vec<_> = a.iter().map(|s| s.action.kind).collect();
        let kinds_b: Vec<_> = b.iter().map(|s| s.action.kind).collect();
        assert_eq!(kinds_a, kinds_b);
    }
}
