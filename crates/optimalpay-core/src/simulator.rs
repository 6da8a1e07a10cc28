/// True-balance replay of a merged payment plan
///
/// Tier plans are computed on discretized balances, so a planned schedule
/// can retire a debt a few dollars early or late against the real numbers.
/// The simulator replays every month in full precision, tops payments back
/// up to minimums or payoff where discretization left a gap (never exceeding
/// the monthly budget), and extends the schedule with a deterministic
/// avalanche if real balances outlive the plan. A balance that rises month
/// over month is a bug and aborts the run.
use crate::error::{PlanError, Result};
use crate::numerics::{apply_payment, monthly_interest};
use crate::types::{Debt, ACTIVE_BALANCE_FLOOR};
use rust_decimal::Decimal;
use tracing::warn;

/// Hard stop for the replay, comfortably above a 30-year mortgage
const MAX_SIMULATION_MONTHS: u32 = 500;

/// The minimums-only baseline gets a little more room (50 years)
const MAX_BASELINE_MONTHS: u32 = 600;

/// One debt's activity in one simulated month, aligned by debt index
#[derive(Debug, Clone, PartialEq)]
pub struct MonthRecord {
    pub payment: Decimal,
    pub interest: Decimal,
    pub principal: Decimal,
    pub balance_after: Decimal,
}

/// One simulated month across the portfolio
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedMonth {
    /// 1-based month number
    pub month: u32,
    pub records: Vec<MonthRecord>,
    pub total_remaining: Decimal,
    pub cumulative_interest: Decimal,
}

/// A debt retirement observed during simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayoffRecord {
    pub debt_index: usize,
    /// 1-based month the balance reached zero
    pub month: u32,
}

/// Complete result of a replay
#[derive(Debug, Clone, PartialEq)]
pub struct Simulation {
    pub months: Vec<SimulatedMonth>,
    pub total_interest: Decimal,
    pub payoffs: Vec<PayoffRecord>,
    /// True when the month cap stopped the replay with balances remaining
    pub truncated: bool,
}

impl Simulation {
    pub fn month_count(&self) -> u32 {
        self.months.len() as u32
    }
}

/// Replays payment schedules against real balances
pub struct Simulator<'a> {
    debts: &'a [Debt],
    monthly_budget: Decimal,
}

impl<'a> Simulator<'a> {
    pub fn new(debts: &'a [Debt], monthly_budget: Decimal) -> Self {
        Self {
            debts,
            monthly_budget,
        }
    }

    /// Replay a merged schedule, extending it if real balances outlive it
    pub fn run(&self, planned: &[Vec<Decimal>]) -> Result<Simulation> {
        let mut balances: Vec<Decimal> =
            self.debts.iter().map(|d| d.current_amount).collect();
        let mut simulation = Simulation {
            months: Vec::new(),
            total_interest: Decimal::ZERO,
            payoffs: Vec::new(),
            truncated: false,
        };

        for payments in planned {
            if balances.iter().all(|&b| b <= Decimal::ZERO) {
                break;
            }
            self.step(&mut balances, payments.clone(), &mut simulation)?;
        }

        while balances.iter().any(|&b| b > Decimal::ZERO) {
            if simulation.month_count() >= MAX_SIMULATION_MONTHS {
                warn!("simulation stopped at month cap with balances remaining");
                simulation.truncated = true;
                break;
            }
            let payments = self.avalanche_payments(&balances);
            self.step(&mut balances, payments, &mut simulation)?;
        }

        Ok(simulation)
    }

    /// Minimums-only baseline used for the savings comparison
    pub fn minimums_only(&self) -> Result<Simulation> {
        let mut balances: Vec<Decimal> =
            self.debts.iter().map(|d| d.current_amount).collect();
        let mut simulation = Simulation {
            months: Vec::new(),
            total_interest: Decimal::ZERO,
            payoffs: Vec::new(),
            truncated: false,
        };
        while balances.iter().any(|&b| b > Decimal::ZERO) {
            if simulation.month_count() >= MAX_BASELINE_MONTHS {
                simulation.truncated = true;
                break;
            }
            let payments = vec![Decimal::ZERO; self.debts.len()];
            // the repair pass inside step() raises each active debt to its
            // minimum (or payoff), which is exactly the baseline schedule
            self.step(&mut balances, payments, &mut simulation)?;
        }
        Ok(simulation)
    }

    fn step(
        &self,
        balances: &mut [Decimal],
        mut payments: Vec<Decimal>,
        simulation: &mut Simulation,
    ) -> Result<()> {
        let n = self.debts.len();
        let month = simulation.month_count() + 1;

        // Repair discretization gaps: every debt still carrying a balance
        // gets at least its minimum (or its payoff, below the active floor).
        // Funding comes first from whatever the plan left unspent this
        // month, then by reclaiming extras over-committed elsewhere, so a
        // debt the discretized plan believed retired keeps amortizing while
        // the monthly total never exceeds the budget.
        let mut targets = vec![Decimal::ZERO; n];
        for i in 0..n {
            if balances[i] <= Decimal::ZERO {
                payments[i] = Decimal::ZERO;
                continue;
            }
            let interest = monthly_interest(balances[i], self.debts[i].annual_rate);
            let payoff = balances[i] + interest;
            targets[i] = if balances[i] <= ACTIVE_BALANCE_FLOOR {
                payoff
            } else {
                self.debts[i].minimum_payment.min(payoff)
            };
        }
        let used: Decimal = payments.iter().copied().sum();
        let mut allowance = (self.monthly_budget - used).max(Decimal::ZERO);
        for i in 0..n {
            if payments[i] < targets[i] {
                let boost = (targets[i] - payments[i]).min(allowance);
                payments[i] += boost;
                allowance -= boost;
            }
        }
        let deficit: Decimal = (0..n)
            .map(|i| (targets[i] - payments[i]).max(Decimal::ZERO))
            .sum();
        if deficit > Decimal::ZERO {
            let mut surplus_order: Vec<usize> = (0..n)
                .filter(|&i| payments[i] > targets[i])
                .collect();
            surplus_order.sort_by(|&a, &b| {
                (payments[b] - targets[b])
                    .cmp(&(payments[a] - targets[a]))
                    .then_with(|| a.cmp(&b))
            });
            let mut remaining = deficit;
            for &j in &surplus_order {
                if remaining <= Decimal::ZERO {
                    break;
                }
                let take = (payments[j] - targets[j]).min(remaining);
                payments[j] -= take;
                remaining -= take;
            }
            for i in 0..n {
                if payments[i] < targets[i] {
                    payments[i] = targets[i];
                }
            }
        }

        let mut records = Vec::with_capacity(n);
        let mut total_remaining = Decimal::ZERO;
        for i in 0..n {
            let previous = balances[i];
            let outcome = apply_payment(previous, self.debts[i].annual_rate, payments[i]);
            if outcome.new_balance > previous {
                return Err(PlanError::CalculationError {
                    month,
                    debt_name: self.debts[i].name.clone(),
                    previous,
                    current: outcome.new_balance,
                });
            }
            balances[i] = outcome.new_balance;
            total_remaining += outcome.new_balance;
            simulation.total_interest += outcome.interest;
            if previous > Decimal::ZERO && outcome.new_balance <= Decimal::ZERO {
                simulation.payoffs.push(PayoffRecord {
                    debt_index: i,
                    month,
                });
            }
            records.push(MonthRecord {
                payment: outcome.payment,
                interest: outcome.interest,
                principal: outcome.principal,
                balance_after: outcome.new_balance,
            });
        }

        simulation.months.push(SimulatedMonth {
            month,
            records,
            total_remaining,
            cumulative_interest: simulation.total_interest,
        });
        Ok(())
    }

    /// Continuation months: minimums plus all slack to the single debt with
    /// the largest monthly interest charge
    fn avalanche_payments(&self, balances: &[Decimal]) -> Vec<Decimal> {
        let n = self.debts.len();
        let mut payments = vec![Decimal::ZERO; n];
        let mut spent = Decimal::ZERO;
        for i in 0..n {
            if balances[i] > Decimal::ZERO {
                let interest = monthly_interest(balances[i], self.debts[i].annual_rate);
                payments[i] = self.debts[i].minimum_payment.min(balances[i] + interest);
                spent += payments[i];
            }
        }
        let extra = (self.monthly_budget - spent).max(Decimal::ZERO);
        if extra > Decimal::ZERO {
            let target = (0..n)
                .filter(|&i| balances[i] > Decimal::ZERO)
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
        payments
    }
}
