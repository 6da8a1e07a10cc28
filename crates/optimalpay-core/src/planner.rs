/// Top-level planning orchestration
///
/// `DebtPlanner::plan` is the engine's single synchronous entry point. It
/// validates the inputs, splits debts into tiers, plans HIGH and MEDIUM by
/// search and LOW by the hybrid avalanche, wires budget liberation between
/// the phases, then replays the merged schedule on true balances to build
/// the report. The planner holds no state between calls.
use crate::avalanche::HybridAvalanche;
use crate::error::{PlanError, Result};
use crate::report::{
    DebtPaymentDetail, DebtTimeline, MonthlyPaymentRow, MonthlyProjection, PayoffEvent,
    PlanReport, PlannedPayment, SavingsSummary, PROJECTION_MONTHS, TIMELINE_ROWS,
};
use crate::search::astar::{SearchDiagnostics, SearchLimits, TierPlan, TierSearch};
use crate::simulator::{Simulation, Simulator};
use crate::tiers::{allocate, categorize, TierAssignment};
use crate::types::{Debt, Tier};
use chrono::{Months, NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::info;
use validator::Validate;

/// Debt elimination planner
pub struct DebtPlanner {
    monthly_budget: Decimal,
    start_date: NaiveDate,
    limits: SearchLimits,
}

impl DebtPlanner {
    /// Create a planner for a monthly cash budget
    pub fn new(monthly_budget: Decimal) -> Self {
        Self {
            monthly_budget,
            start_date: Utc::now().date_naive(),
            limits: SearchLimits::default(),
        }
    }

    /// Anchor payoff dates to a fixed first payment month
    pub fn with_start_date(mut self, start_date: NaiveDate) -> Self {
        self.start_date = start_date;
        self
    }

    /// Override the search resource caps
    pub fn with_limits(mut self, limits: SearchLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Produce the full payment plan and amortization report
    pub fn plan(&self, debts: &[Debt]) -> Result<PlanReport> {
        let active: Vec<usize> = debts
            .iter()
            .enumerate()
            .filter(|(_, d)| d.is_active())
            .map(|(i, _)| i)
            .collect();
        if active.is_empty() {
            return Ok(PlanReport::empty(self.start_date));
        }

        self.validate_inputs(debts, &active)?;

        let mut assignment = TierAssignment::default();
        for &i in &active {
            match categorize(&debts[i]) {
                Tier::High => assignment.high.push(i),
                Tier::Medium => assignment.medium.push(i),
                Tier::Low => assignment.low.push(i),
            }
        }
        let budgets = allocate(debts, &assignment, self.monthly_budget);
        info!(
            high = assignment.high.len(),
            medium = assignment.medium.len(),
            low = assignment.low.len(),
            "planning {} active debts",
            active.len()
        );

        let tier_debts =
            |indices: &[usize]| -> Vec<Debt> { indices.iter().map(|&i| debts[i].clone()).collect() };

        let high_plan =
            TierSearch::new(tier_debts(&assignment.high), budgets.high, self.limits.clone()).run();
        let medium_plan = TierSearch::new(
            tier_debts(&assignment.medium),
            budgets.medium,
            self.limits.clone(),
        )
        .with_liberation(budgets.high, high_plan.months())
        .run();
        let low_plan = HybridAvalanche::new(tier_debts(&assignment.low), budgets.low)
            .with_liberation(
                budgets.high + budgets.medium,
                high_plan.months().max(medium_plan.months()),
            )
            .run();

        let merged = merge_schedules(
            debts.len(),
            &[
                (&assignment.high, &high_plan),
                (&assignment.medium, &medium_plan),
                (&assignment.low, &low_plan),
            ],
        );

        let simulator = Simulator::new(debts, self.monthly_budget);
        let simulation = simulator.run(&merged)?;
        let baseline = simulator.minimums_only().ok();

        let mut diagnostics = SearchDiagnostics::default();
        diagnostics.merge(&high_plan.diagnostics);
        diagnostics.merge(&medium_plan.diagnostics);
        diagnostics.merge(&low_plan.diagnostics);

        let is_optimal = high_plan.optimal
            && medium_plan.optimal
            && low_plan.optimal
            && !simulation.truncated;
        let first_month_strategy = high_plan
            .first_kind()
            .or_else(|| medium_plan.first_kind())
            .or_else(|| low_plan.first_kind())
            .map(|kind| kind.label().to_string());

        let report = self.build_report(
            debts,
            &assignment,
            simulation,
            baseline,
            is_optimal,
            first_month_strategy,
            diagnostics,
        );
        info!(
            months = report.projected_months,
            optimal = report.is_optimal,
            "plan complete"
        );
        Ok(report)
    }

    fn validate_inputs(&self, debts: &[Debt], active: &[usize]) -> Result<()> {
        for &i in active {
            let debt = &debts[i];
            debt.validate().map_err(|e| PlanError::InvalidDebt {
                debt_name: debt.name.clone(),
                reason: e.to_string(),
            })?;
            let monthly_interest = debt.monthly_interest();
            if debt.minimum_payment < monthly_interest {
                return Err(PlanError::NegativeAmortization {
                    debt_name: debt.name.clone(),
                    minimum: debt.minimum_payment,
                    monthly_interest,
                });
            }
        }
        let required: Decimal = active.iter().map(|&i| debts[i].minimum_payment).sum();
        if self.monthly_budget < required {
            return Err(PlanError::InsufficientBudget {
                budget: self.monthly_budget,
                required,
            });
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn build_report(
        &self,
        debts: &[Debt],
        assignment: &TierAssignment,
        simulation: Simulation,
        baseline: Option<Simulation>,
        is_optimal: bool,
        first_month_strategy: Option<String>,
        diagnostics: SearchDiagnostics,
    ) -> PlanReport {
        let n = debts.len();
        let months = simulation.month_count();
        let debt_free_date = self.start_date + Months::new(months);

        let mut tier_of: Vec<Option<Tier>> = vec![None; n];
        for &i in &assignment.high {
            tier_of[i] = Some(Tier::High);
        }
        for &i in &assignment.medium {
            tier_of[i] = Some(Tier::Medium);
        }
        for &i in &assignment.low {
            tier_of[i] = Some(Tier::Low);
        }

        let planned_first_month_payments = simulation
            .months
            .first()
            .map(|first| {
                (0..n)
                    .filter(|&i| first.records[i].payment > Decimal::ZERO)
                    .map(|i| PlannedPayment {
                        debt_id: debts[i].id,
                        amount: first.records[i].payment,
                        minimum_payment: debts[i].minimum_payment,
                        extra_amount: (first.records[i].payment - debts[i].minimum_payment)
                            .max(Decimal::ZERO),
                        tier: tier_of[i].unwrap_or(Tier::Low),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let monthly_projection = simulation
            .months
            .iter()
            .take(PROJECTION_MONTHS)
            .map(|month| MonthlyProjection {
                month: month.month,
                total_debt_remaining: month.total_remaining,
                total_interest_paid: month.cumulative_interest,
                per_debt_payments: month
                    .records
                    .iter()
                    .enumerate()
                    .map(|(i, record)| DebtPaymentDetail {
                        debt_id: debts[i].id,
                        payment: record.payment,
                        interest: record.interest,
                        principal: record.principal,
                        new_balance: record.balance_after,
                    })
                    .collect(),
            })
            .collect();

        let payoff_month_of = |index: usize| -> u32 {
            simulation
                .payoffs
                .iter()
                .find(|p| p.debt_index == index)
                .map(|p| p.month)
                .unwrap_or(months)
        };

        let debt_timeline = (0..n)
            .filter(|&i| debts[i].current_amount > Decimal::ZERO)
            .map(|i| {
                let payoff_month = payoff_month_of(i);
                let mut rows = Vec::new();
                let mut total_interest = Decimal::ZERO;
                let mut total_paid = Decimal::ZERO;
                let mut principal_pct_sum = Decimal::ZERO;
                let mut paying_months = Decimal::ZERO;
                for month in &simulation.months {
                    let record = &month.records[i];
                    if month.month > payoff_month {
                        break;
                    }
                    total_interest += record.interest;
                    total_paid += record.payment;
                    if record.payment > Decimal::ZERO {
                        principal_pct_sum +=
                            record.principal / record.payment * Decimal::ONE_HUNDRED;
                        paying_months += Decimal::ONE;
                    }
                    if rows.len() < TIMELINE_ROWS {
                        rows.push(MonthlyPaymentRow {
                            month: month.month,
                            payment: record.payment,
                            interest: record.interest,
                            principal: record.principal,
                            remaining_balance: record.balance_after,
                        });
                    }
                }
                let avg_principal_pct = if paying_months > Decimal::ZERO {
                    (principal_pct_sum / paying_months).round_dp(2)
                } else {
                    Decimal::ZERO
                };
                DebtTimeline {
                    debt_id: debts[i].id,
                    debt_name: debts[i].name.clone(),
                    payoff_month,
                    payoff_date: self.start_date + Months::new(payoff_month),
                    total_interest,
                    total_paid,
                    avg_principal_pct,
                    monthly_payments: rows,
                }
            })
            .collect();

        let payoff_order = simulation
            .payoffs
            .iter()
            .map(|p| PayoffEvent {
                month: p.month,
                debt_id: debts[p.debt_index].id,
                debt_name: debts[p.debt_index].name.clone(),
                freed_cash_flow: debts[p.debt_index].minimum_payment,
            })
            .collect();

        let savings_vs_minimums = baseline.map(|b| SavingsSummary {
            baseline_months: b.month_count(),
            baseline_interest: b.total_interest,
            months_saved: b.month_count().saturating_sub(months),
            interest_saved: (b.total_interest - simulation.total_interest).max(Decimal::ZERO),
        });

        PlanReport {
            is_optimal,
            projected_months: months,
            total_interest_paid: simulation.total_interest,
            debt_free_date,
            first_month_strategy,
            planned_first_month_payments,
            monthly_projection,
            debt_timeline,
            payoff_order,
            savings_vs_minimums,
            diagnostics,
        }
    }
}

/// Overlay per-tier schedules into one full-width payment matrix
fn merge_schedules(debt_count: usize, plans: &[(&Vec<usize>, &TierPlan)]) -> Vec<Vec<Decimal>> {
    let total_months = plans
        .iter()
        .map(|(_, plan)| plan.schedule.len())
        .max()
        .unwrap_or(0);
    let mut merged = vec![vec![Decimal::ZERO; debt_count]; total_months];
    for (indices, plan) in plans {
        for (month, planned) in plan.schedule.iter().enumerate() {
            for (slot, &debt_index) in indices.iter().enumerate() {
                merged[month][debt_index] = planned.payments[slot];
            }
        }
    }
    merged
}
