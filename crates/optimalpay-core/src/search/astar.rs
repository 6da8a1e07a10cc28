/// Best-first search over discretized balance vectors
///
/// Each node is one month of the tier's future; an edge applies one
/// candidate payment vector. Nodes live in an arena and store only a parent
/// index, so path reconstruction is an index walk instead of per-expansion
/// path cloning. The search is resource-bounded: on cap exhaustion it
/// degrades to the best partial plan extended by a deterministic avalanche,
/// and reports that the result is no longer provably optimal.
use crate::numerics::{apply_payment, monthly_interest};
use crate::search::discretize::{grid_total, snap, snap_all, state_key};
use crate::search::frontier::{BoundedFrontier, EvictionPolicy, DEFAULT_CAPACITY};
use crate::search::lookahead::rank;
use crate::search::strategies::{generate, StrategyKind};
use crate::types::{Debt, ACTIVE_BALANCE_FLOOR};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::debug;

/// Balances at or below this count as retired for goal detection
const PAYOFF_TARGET: Decimal = dec!(5);

/// Wall-clock checks happen once per this many iterations
const DEADLINE_CHECK_INTERVAL: u64 = 20_000;

/// Resource caps for one tier search
#[derive(Debug, Clone)]
pub struct SearchLimits {
    pub max_iterations: u64,
    pub max_months: u32,
    pub deadline: Option<Duration>,
    pub frontier_capacity: usize,
    pub eviction_policy: EvictionPolicy,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            max_iterations: 8_000_000,
            max_months: 370,
            deadline: Some(Duration::from_secs(30)),
            frontier_capacity: DEFAULT_CAPACITY,
            eviction_policy: EvictionPolicy::default(),
        }
    }
}

impl SearchLimits {
    /// Set the expansion-iteration cap
    pub fn with_max_iterations(mut self, max_iterations: u64) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the relative-month horizon
    pub fn with_max_months(mut self, max_months: u32) -> Self {
        self.max_months = max_months;
        self
    }

    /// Set or disable the wall-clock deadline
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Set the open-set capacity
    pub fn with_frontier_capacity(mut self, capacity: usize) -> Self {
        self.frontier_capacity = capacity;
        self
    }

    /// Set the eviction mode used when the open set nears capacity
    pub fn with_eviction_policy(mut self, policy: EvictionPolicy) -> Self {
        self.eviction_policy = policy;
        self
    }
}

/// Counters describing how hard one search worked
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SearchDiagnostics {
    pub iterations: u64,
    pub expanded: u64,
    pub evicted: u64,
    pub cap_hit: bool,
}

impl SearchDiagnostics {
    pub fn merge(&mut self, other: &SearchDiagnostics) {
        self.iterations += other.iterations;
        self.expanded += other.expanded;
        self.evicted += other.evicted;
        self.cap_hit |= other.cap_hit;
    }
}

/// One planned month: a payment vector aligned to the tier's debts
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedMonth {
    pub payments: Vec<Decimal>,
    pub kind: StrategyKind,
}

/// A tier's complete month-by-month plan
#[derive(Debug, Clone, Default)]
pub struct TierPlan {
    pub schedule: Vec<PlannedMonth>,
    pub optimal: bool,
    pub diagnostics: SearchDiagnostics,
}

impl TierPlan {
    pub fn months(&self) -> u32 {
        self.schedule.len() as u32
    }

    pub fn first_kind(&self) -> Option<StrategyKind> {
        self.schedule.first().map(|m| m.kind)
    }
}

/// Arena node; `parent` is `u32::MAX` at the root
struct NodeRecord {
    parent: u32,
    payments: Vec<Decimal>,
    kind: StrategyKind,
    balances: Vec<Decimal>,
    g: u32,
}

const NO_PARENT: u32 = u32::MAX;

/// A* planner for one tier of debts
pub struct TierSearch {
    debts: Vec<Debt>,
    base_budget: Decimal,
    liberated_budget: Decimal,
    liberation_month: u32,
    start_month: u32,
    limits: SearchLimits,
}

impl TierSearch {
    pub fn new(debts: Vec<Debt>, base_budget: Decimal, limits: SearchLimits) -> Self {
        Self {
            debts,
            base_budget,
            liberated_budget: Decimal::ZERO,
            liberation_month: u32::MAX,
            start_month: 0,
            limits,
        }
    }

    /// Budget liberated by earlier tiers, available from `month` onward
    pub fn with_liberation(mut self, amount: Decimal, month: u32) -> Self {
        self.liberated_budget = amount;
        self.liberation_month = month;
        self
    }

    pub fn with_start_month(mut self, month: u32) -> Self {
        self.start_month = month;
        self
    }

    /// Effective budget for a relative month of this search
    fn effective_budget(&self, relative_month: u32) -> Decimal {
        if self.start_month.saturating_add(relative_month) >= self.liberation_month {
            self.base_budget + self.liberated_budget
        } else {
            self.base_budget
        }
    }

    /// Run the search to a complete tier plan
    pub fn run(&self) -> TierPlan {
        if self.debts.is_empty() {
            return TierPlan {
                optimal: true,
                ..TierPlan::default()
            };
        }

        let started = Instant::now();
        let initial = snap_all(
            &self
                .debts
                .iter()
                .map(|d| d.current_amount)
                .collect::<Vec<_>>(),
        );

        let mut arena: Vec<NodeRecord> = Vec::with_capacity(4096);
        arena.push(NodeRecord {
            parent: NO_PARENT,
            payments: Vec::new(),
            kind: StrategyKind::MinimumsOnly,
            balances: initial.clone(),
            g: 0,
        });

        let mut frontier =
            BoundedFrontier::new(self.limits.frontier_capacity, self.limits.eviction_policy);
        let mut closed: HashMap<u32, u32> = HashMap::with_capacity(1 << 16);
        let mut h_memo: HashMap<(u32, bool), f64> = HashMap::with_capacity(1 << 16);
        let mut diagnostics = SearchDiagnostics::default();

        let h0 = self.heuristic(&initial, self.effective_budget(0));
        frontier.push(h0.max(0.5), 0, 0);

        // lowest total debt reached, tie-break fewest months
        let mut best_partial: (i64, u32, u32) = (grid_total(&initial), 0, 0);
        let mut goal: Option<u32> = None;

        while let Some(entry) = frontier.pop() {
            diagnostics.iterations += 1;
            if diagnostics.iterations > self.limits.max_iterations {
                diagnostics.cap_hit = true;
                break;
            }
            if diagnostics.iterations % DEADLINE_CHECK_INTERVAL == 0 {
                if let Some(deadline) = self.limits.deadline {
                    if started.elapsed() >= deadline {
                        diagnostics.cap_hit = true;
                        break;
                    }
                }
            }

            let (node_g, node_balances) = {
                let node = &arena[entry.node as usize];
                (node.g, node.balances.clone())
            };

            if node_balances.iter().all(|&b| b <= PAYOFF_TARGET) {
                goal = Some(entry.node);
                break;
            }

            let key = state_key(&node_balances);
            if closed.get(&key).is_some_and(|&g| g <= node_g) {
                continue;
            }
            closed.insert(key, node_g);

            if node_g >= self.limits.max_months {
                continue;
            }
            diagnostics.expanded += 1;

            let budget = self.effective_budget(node_g);
            let ranked = rank(
                generate(&self.debts, &node_balances, budget),
                &self.debts,
                &node_balances,
            );

            let parent_total = grid_total(&node_balances);
            let g_next = node_g + 1;
            let liberated_next =
                self.start_month.saturating_add(g_next) >= self.liberation_month;

            for scored in ranked {
                let next: Vec<Decimal> = (0..self.debts.len())
                    .map(|i| {
                        snap(
                            apply_payment(
                                node_balances[i],
                                self.debts[i].annual_rate,
                                scored.action.payments[i],
                            )
                            .new_balance,
                        )
                    })
                    .collect();

                let next_total = grid_total(&next);
                if next_total >= parent_total {
                    continue;
                }
                let next_key = state_key(&next);
                if closed.get(&next_key).is_some_and(|&g| g <= g_next) {
                    continue;
                }

                let h = *h_memo.entry((next_key, liberated_next)).or_insert_with(|| {
                    self.heuristic(&next, self.effective_budget(g_next))
                });
                let bonus = (scored.score / 200.0).min(5.0);
                let f = g_next as f64 + (h - bonus).max(0.5);

                arena.push(NodeRecord {
                    parent: entry.node,
                    payments: scored.action.payments,
                    kind: scored.action.kind,
                    balances: next,
                    g: g_next,
                });
                let index = (arena.len() - 1) as u32;
                if next_total < best_partial.0
                    || (next_total == best_partial.0 && g_next < best_partial.1)
                {
                    best_partial = (next_total, g_next, index);
                }
                frontier.push(f, g_next, index);
            }
        }

        diagnostics.evicted = frontier.evictions();

        let plan = match goal {
            Some(index) => {
                let schedule = reconstruct(&arena, index);
                debug!(
                    months = schedule.len(),
                    iterations = diagnostics.iterations,
                    expanded = diagnostics.expanded,
                    "tier search reached payoff"
                );
                TierPlan {
                    schedule,
                    optimal: !diagnostics.cap_hit && diagnostics.evicted == 0,
                    diagnostics,
                }
            }
            None => {
                // best-found semantics: take the deepest progress and finish
                // it with the deterministic avalanche
                let (_, best_g, best_index) = best_partial;
                let mut schedule = reconstruct(&arena, best_index);
                let tail_start = best_g;
                let end_balances = arena[best_index as usize].balances.clone();
                schedule.extend(self.avalanche_from(&end_balances, tail_start));
                debug!(
                    months = schedule.len(),
                    iterations = diagnostics.iterations,
                    cap_hit = diagnostics.cap_hit,
                    "tier search degraded to best-found"
                );
                TierPlan {
                    schedule,
                    optimal: false,
                    diagnostics,
                }
            }
        };
        plan
    }

    /// Deterministic fallback: minimums plus all extra to the single debt
    /// with the highest monthly interest charge
    fn avalanche_from(&self, balances: &[Decimal], start_relative: u32) -> Vec<PlannedMonth> {
        let n = self.debts.len();
        let mut balances = balances.to_vec();
        let mut schedule = Vec::new();
        let mut relative = start_relative;

        while relative < self.limits.max_months
            && balances.iter().any(|&b| b > ACTIVE_BALANCE_FLOOR)
        {
            let budget = self.effective_budget(relative);
            let mut payments = vec![Decimal::ZERO; n];
            let mut spent = Decimal::ZERO;
            for i in 0..n {
                if balances[i] > ACTIVE_BALANCE_FLOOR {
                    let interest = monthly_interest(balances[i], self.debts[i].annual_rate);
                    payments[i] = self.debts[i].minimum_payment.min(balances[i] + interest);
                    spent += payments[i];
                }
            }
            let extra = (budget - spent).max(Decimal::ZERO);
            if extra > Decimal::ZERO {
                let target = (0..n)
                    .filter(|&i| balances[i] > ACTIVE_BALANCE_FLOOR)
                    .max_by(|&a, &b| {
                        monthly_interest(balances[a], self.debts[a].annual_rate)
                            .cmp(&monthly_interest(balances[b], self.debts[b].annual_rate))
                            .then_with(|| b.cmp(&a))
                    });
                if let Some(i) = target {
                    let interest = monthly_interest(balances[i], self.debts[i].annual_rate);
                    let need = (balances[i] + interest - payments[i]).max(Decimal::ZERO);
                    payments[i] += need.min(extra);
                }
            }

            for i in 0..n {
                balances[i] =
                    apply_payment(balances[i], self.debts[i].annual_rate, payments[i]).new_balance;
            }
            schedule.push(PlannedMonth {
                payments,
                kind: StrategyKind::SmartAvalanche,
            });
            relative += 1;
        }
        schedule
    }

    /// Remaining-months estimate with projected freed cash flow.
    ///
    /// Slightly inadmissible by design of the formula; the search accepts the
    /// quality/latency trade and reports best-found semantics when capped.
    fn heuristic(&self, balances: &[Decimal], budget: Decimal) -> f64 {
        let total: f64 = balances
            .iter()
            .map(|b| b.to_f64().unwrap_or(0.0))
            .sum();
        if total <= 0.0 {
            return 0.0;
        }
        let budget_f = budget.to_f64().unwrap_or(0.0);
        if budget_f <= 0.0 {
            return f64::from(self.limits.max_months);
        }

        let mut freed = 0.0;
        let mut heavy_debts = 0u32;
        for (i, &balance) in balances.iter().enumerate() {
            if balance <= ACTIVE_BALANCE_FLOOR {
                continue;
            }
            let b = balance.to_f64().unwrap_or(0.0);
            let r = monthly_interest(balance, self.debts[i].annual_rate)
                .to_f64()
                .unwrap_or(0.0);
            if b <= 3.0 * budget_f && budget_f - r > 0.0 && b / (budget_f - r) <= 3.0 {
                freed += self.debts[i].minimum_payment.to_f64().unwrap_or(0.0);
            }
            if self.debts[i].minimum_payment > dec!(100) {
                heavy_debts += 1;
            }
        }

        let enhanced = budget_f + 0.5 * freed;
        let mut h = (total / (0.75 * enhanced)).ceil();
        h += 0.3 * (heavy_debts.saturating_sub(1)) as f64;
        if freed > 100.0 {
            h -= 1.0;
        }
        h.max(0.0)
    }
}

/// Walk parent indices from a node back to the root
fn reconstruct(arena: &[NodeRecord], mut index: u32) -> Vec<PlannedMonth> {
    let mut schedule = Vec::new();
    while index != NO_PARENT {
        let node = &arena[index as usize];
        if node.parent == NO_PARENT {
            break;
        }
        schedule.push(PlannedMonth {
            payments: node.payments.clone(),
            kind: node.kind,
        });
        index = node.parent;
    }
    schedule.reverse();
    schedule
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DebtType;

    fn card(name: &str, balance: Decimal, rate: Decimal, minimum: Decimal) -> Debt {
        Debt::new(name, DebtType::CreditCard, balance, rate, minimum)
    }

    fn run_search(debts: Vec<Debt>, budget: Decimal) -> TierPlan {
        TierSearch::new(debts, budget, SearchLimits::default()).run()
    }

    #[test]
    fn test_empty_tier_is_trivially_optimal() {
        let plan = run_search(Vec::new(), dec!(500));
        assert!(plan.optimal);
        assert_eq!(plan.months(), 0);
    }

    #[test]
    fn test_single_card_pays_off() {
        let plan = run_search(vec![card("Visa", dec!(1000), dec!(0.20), dec!(50))], dec!(200));
        assert!(plan.optimal);
        assert!(plan.months() >= 5 && plan.months() <= 7, "months = {}", plan.months());
        // first month spends the whole budget
        let first: Decimal = plan.schedule[0].payments.iter().copied().sum();
        assert_eq!(first, dec!(200));
    }

    #[test]
    fn test_two_cards_small_one_retires_first() {
        let debts = vec![
            card("Big", dec!(2000), dec!(0.24), dec!(40)),
            card("Small", dec!(500), dec!(0.24), dec!(40)),
        ];
        let plan = run_search(debts.clone(), dec!(300));
        assert!(plan.months() > 0);

        // replay in the search's own snapped space and find retirement months
        let mut balances = snap_all(&debts.iter().map(|d| d.current_amount).collect::<Vec<_>>());
        let mut retired = [None::<u32>; 2];
        for (month, planned) in plan.schedule.iter().enumerate() {
            for i in 0..2 {
                balances[i] = snap(
                    apply_payment(balances[i], debts[i].annual_rate, planned.payments[i])
                        .new_balance,
                );
                if balances[i] <= PAYOFF_TARGET && retired[i].is_none() {
                    retired[i] = Some(month as u32);
                }
            }
        }
        let small = retired[1].expect("small card retires");
        let big = retired[0].expect("big card retires");
        assert!(small < big, "small {small} should beat big {big}");
    }

    #[test]
    fn test_schedule_respects_minimums_and_budget() {
        let debts = vec![
            card("A", dec!(1500), dec!(0.22), dec!(45)),
            card("B", dec!(700), dec!(0.18), dec!(35)),
        ];
        let budget = dec!(250);
        let plan = run_search(debts.clone(), budget);

        let mut balances = snap_all(&debts.iter().map(|d| d.current_amount).collect::<Vec<_>>());
        for planned in &plan.schedule {
            let total: Decimal = planned.payments.iter().copied().sum();
            assert!(total <= budget);
            for i in 0..2 {
                if balances[i] > ACTIVE_BALANCE_FLOOR {
                    let payoff = balances[i]
                        + monthly_interest(balances[i], debts[i].annual_rate);
                    assert!(
                        planned.payments[i] >= debts[i].minimum_payment.min(payoff),
                        "active debt must get its minimum"
                    );
                }
                balances[i] = snap(
                    apply_payment(balances[i], debts[i].annual_rate, planned.payments[i])
                        .new_balance,
                );
            }
        }
        assert!(balances.iter().all(|&b| b <= PAYOFF_TARGET));
    }

    #[test]
    fn test_iteration_cap_degrades_to_best_found() {
        let debts: Vec<Debt> = (0..10)
            .map(|i| {
                card(
                    &format!("Card {i}"),
                    dec!(1000) + Decimal::from(i * 250),
                    dec!(0.20),
                    dec!(80),
                )
            })
            .collect();
        // minimums total 800, extra 300: plenty of progress per expansion,
        // but the cap trips long before the goal depth
        let limits = SearchLimits::default().with_max_iterations(5);
        let plan = TierSearch::new(debts, dec!(1100), limits).run();

        assert!(!plan.optimal);
        assert!(plan.diagnostics.cap_hit);
        // the fallback still produces a complete schedule
        assert!(plan.months() > 0);
    }

    #[test]
    fn test_limits_builder() {
        let limits = SearchLimits::default()
            .with_max_iterations(1_000)
            .with_max_months(120)
            .with_deadline(None)
            .with_frontier_capacity(5_000)
            .with_eviction_policy(EvictionPolicy::Strict);

        assert_eq!(limits.max_iterations, 1_000);
        assert_eq!(limits.max_months, 120);
        assert!(limits.deadline.is_none());
        assert_eq!(limits.frontier_capacity, 5_000);
        assert_eq!(limits.eviction_policy, EvictionPolicy::Strict);
    }

    #[test]
    fn test_liberation_expands_effective_budget() {
        let search = TierSearch::new(
            vec![card("A", dec!(1000), dec!(0.20), dec!(50))],
            dec!(100),
            SearchLimits::default(),
        )
        .with_liberation(dec!(150), 4);
        assert_eq!(search.effective_budget(3), dec!(100));
        assert_eq!(search.effective_budget(4), dec!(250));
        assert_eq!(search.effective_budget(10), dec!(250));
    }

    #[test]
    fn test_liberation_shortens_payoff() {
        let debts = vec![card("A", dec!(4000), dec!(0.20), dec!(100))];
        let base = TierSearch::new(debts.clone(), dec!(150), SearchLimits::default()).run();
        let boosted = TierSearch::new(debts, dec!(150), SearchLimits::default())
            .with_liberation(dec!(300), 3)
            .run();
        assert!(boosted.months() < base.months());
    }

    #[test]
    fn test_determinism() {
        let debts = vec![
            card("A", dec!(2000), dec!(0.24), dec!(40)),
            card("B", dec!(500), dec!(0.24), dec!(40)),
        ];
        let a = run_search(debts.clone(), dec!(300));
        let b = run_search(debts, dec!(300));
        assert_eq!(a.schedule, b.schedule);
        assert_eq!(a.optimal, b.optimal);
    }
}
