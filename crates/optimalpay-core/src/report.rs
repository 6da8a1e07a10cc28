/// Plan report types
///
/// The report is the engine's only output: a first-month payment
/// instruction, a bounded monthly projection, per-debt payoff timelines,
/// and portfolio-wide totals. All fields serialize for downstream report
/// producers.
use crate::search::astar::SearchDiagnostics;
use crate::types::Tier;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Months of portfolio-wide projection carried on the report
pub const PROJECTION_MONTHS: usize = 36;

/// Per-debt schedule rows carried on each timeline entry
pub const TIMELINE_ROWS: usize = 24;

/// Complete output of one planning run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanReport {
    /// True iff every tier search completed without hitting a resource cap
    pub is_optimal: bool,
    pub projected_months: u32,
    pub total_interest_paid: Decimal,
    pub debt_free_date: NaiveDate,
    /// Label of the strategy chosen for the first month
    pub first_month_strategy: Option<String>,
    pub planned_first_month_payments: Vec<PlannedPayment>,
    pub monthly_projection: Vec<MonthlyProjection>,
    pub debt_timeline: Vec<DebtTimeline>,
    pub payoff_order: Vec<PayoffEvent>,
    pub savings_vs_minimums: Option<SavingsSummary>,
    pub diagnostics: SearchDiagnostics,
}

/// One debt's instructed payment for the first month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedPayment {
    pub debt_id: Uuid,
    pub amount: Decimal,
    pub minimum_payment: Decimal,
    pub extra_amount: Decimal,
    pub tier: Tier,
}

/// Portfolio-wide snapshot for one projected month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyProjection {
    pub month: u32,
    pub total_debt_remaining: Decimal,
    /// Cumulative interest paid through this month
    pub total_interest_paid: Decimal,
    pub per_debt_payments: Vec<DebtPaymentDetail>,
}

/// One debt's activity inside a projected month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtPaymentDetail {
    pub debt_id: Uuid,
    pub payment: Decimal,
    pub interest: Decimal,
    pub principal: Decimal,
    pub new_balance: Decimal,
}

/// Full payoff story for one debt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtTimeline {
    pub debt_id: Uuid,
    pub debt_name: String,
    pub payoff_month: u32,
    pub payoff_date: NaiveDate,
    pub total_interest: Decimal,
    pub total_paid: Decimal,
    pub avg_principal_pct: Decimal,
    pub monthly_payments: Vec<MonthlyPaymentRow>,
}

/// One row of a debt's amortization schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyPaymentRow {
    pub month: u32,
    pub payment: Decimal,
    pub interest: Decimal,
    pub principal: Decimal,
    pub remaining_balance: Decimal,
}

/// A retirement event and the cash flow it frees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoffEvent {
    pub month: u32,
    pub debt_id: Uuid,
    pub debt_name: String,
    pub freed_cash_flow: Decimal,
}

/// Comparison against the minimums-only baseline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsSummary {
    pub baseline_months: u32,
    pub baseline_interest: Decimal,
    pub months_saved: u32,
    pub interest_saved: Decimal,
}

impl PlanReport {
    /// Trivial report for an empty debt set
    pub fn empty(start_date: NaiveDate) -> Self {
        Self {
            is_optimal: true,
            projected_months: 0,
            total_interest_paid: Decimal::ZERO,
            debt_free_date: start_date,
            first_month_strategy: None,
            planned_first_month_payments: Vec::new(),
            monthly_projection: Vec::new(),
            debt_timeline: Vec::new(),
            payoff_order: Vec::new(),
            savings_vs_minimums: None,
            diagnostics: SearchDiagnostics::default(),
        }
    }
}
