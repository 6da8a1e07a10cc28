/// Hybrid avalanche phase for the LOW tier
///
/// Mortgages, large auto loans, and low-rate student loans do not justify
/// search: their schedules are dominated by waiting on liberated budget from
/// the upper tiers. The phase pays minimums until liberation arrives, then
/// turns all extra on the single debt with the highest monthly interest
/// charge. A retired debt's minimum joins the budget the following month,
/// preserving the causal order of liberation.
use crate::numerics::{apply_payment, monthly_interest};
use crate::search::astar::{PlannedMonth, SearchDiagnostics, TierPlan};
use crate::search::strategies::StrategyKind;
use crate::types::{Debt, ACTIVE_BALANCE_FLOOR};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::debug;

/// Hard stop for the phase, comfortably above a 30-year mortgage
const MAX_PHASE_MONTHS: u32 = 500;

/// Two candidates whose monthly interest differs by less than this are
/// considered tied and split on annual rate instead
const INTEREST_TIE_MARGIN: Decimal = dec!(5);

/// Month-by-month planner for the LOW tier
pub struct HybridAvalanche {
    debts: Vec<Debt>,
    base_budget: Decimal,
    liberated_budget: Decimal,
    liberation_month: u32,
}

impl HybridAvalanche {
    pub fn new(debts: Vec<Debt>, base_budget: Decimal) -> Self {
        Self {
            debts,
            base_budget,
            liberated_budget: Decimal::ZERO,
            liberation_month: u32::MAX,
        }
    }

    /// Budget liberated by the HIGH and MEDIUM tiers, available from `month`
    pub fn with_liberation(mut self, amount: Decimal, month: u32) -> Self {
        self.liberated_budget = amount;
        self.liberation_month = month;
        self
    }

    pub fn run(&self) -> TierPlan {
        let n = self.debts.len();
        if n == 0 {
            return TierPlan {
                optimal: true,
                ..TierPlan::default()
            };
        }

        let mut balances: Vec<Decimal> =
            self.debts.iter().map(|d| d.current_amount).collect();
        let mut schedule = Vec::new();
        let mut freed_available = Decimal::ZERO;
        let mut freed_next = Decimal::ZERO;
        let mut month = 0u32;

        while month < MAX_PHASE_MONTHS
            && balances.iter().any(|&b| b > ACTIVE_BALANCE_FLOOR)
        {
            freed_available += freed_next;
            freed_next = Decimal::ZERO;

            let active: Vec<bool> = balances
                .iter()
                .map(|&b| b > ACTIVE_BALANCE_FLOOR)
                .collect();
            let liberated = month >= self.liberation_month;

            let mut payments = vec![Decimal::ZERO; n];
            let mut spent = Decimal::ZERO;
            for i in 0..n {
                if active[i] {
                    let interest = monthly_interest(balances[i], self.debts[i].annual_rate);
                    payments[i] = self.debts[i].minimum_payment.min(balances[i] + interest);
                    spent += payments[i];
                }
            }

            if liberated {
                let effective = self.base_budget + self.liberated_budget + freed_available;
                let extra = (effective - spent).max(Decimal::ZERO);
                if extra > Decimal::ZERO {
                    if let Some(target) = self.select_target(&balances, &active) {
                        let interest =
                            monthly_interest(balances[target], self.debts[target].annual_rate);
                        let need =
                            (balances[target] + interest - payments[target]).max(Decimal::ZERO);
                        payments[target] += need.min(extra);
                    }
                }
            }

            for i in 0..n {
                let outcome =
                    apply_payment(balances[i], self.debts[i].annual_rate, payments[i]);
                balances[i] = outcome.new_balance;
                payments[i] = outcome.payment;
                if active[i] && balances[i] <= ACTIVE_BALANCE_FLOOR {
                    freed_next += self.debts[i].minimum_payment;
                }
            }

            schedule.push(PlannedMonth {
                payments,
                kind: if liberated {
                    StrategyKind::SmartAvalanche
                } else {
                    StrategyKind::MinimumsOnly
                },
            });
            month += 1;
        }

        let incomplete = balances.iter().any(|&b| b > ACTIVE_BALANCE_FLOOR);
        if incomplete {
            debug!(months = month, "hybrid avalanche stopped at month cap");
        }
        TierPlan {
            schedule,
            optimal: !incomplete,
            diagnostics: SearchDiagnostics {
                cap_hit: incomplete,
                ..SearchDiagnostics::default()
            },
        }
    }

    /// The month's single extra-budget target: the largest monthly interest
    /// charge, with the annual-rate tie-break applied to candidates within
    /// the margin of the leader
    fn select_target(&self, balances: &[Decimal], active: &[bool]) -> Option<usize> {
        let mut order: Vec<usize> = (0..self.debts.len()).filter(|&i| active[i]).collect();
        order.sort_by(|&a, &b| {
            monthly_interest(balances[b], self.debts[b].annual_rate)
                .cmp(&monthly_interest(balances[a], self.debts[a].annual_rate))
                .then_with(|| a.cmp(&b))
        });
        let &top = order.first()?;
        let top_interest = monthly_interest(balances[top], self.debts[top].annual_rate);
        order
            .iter()
            .copied()
            .take_while(|&i| {
                top_interest - monthly_interest(balances[i], self.debts[i].annual_rate)
                    < INTEREST_TIE_MARGIN
            })
            .max_by(|&a, &b| {
                self.debts[a]
                    .annual_rate
                    .cmp(&self.debts[b].annual_rate)
                    .then_with(|| b.cmp(&a))
            })
    }
}
