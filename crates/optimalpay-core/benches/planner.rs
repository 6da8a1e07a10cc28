use chrono::NaiveDate;
use criterion::{criterion_group, criterion_main, Criterion};
use optimalpay_core::{Debt, DebtPlanner, DebtType};
use rust_decimal_macros::dec;

fn sample_portfolio() -> Vec<Debt> {
    vec![
        Debt::new("Visa", DebtType::CreditCard, dec!(4800), dec!(0.2499), dec!(120)),
        Debt::new("Mastercard", DebtType::CreditCard, dec!(2300), dec!(0.2199), dec!(60)),
        Debt::new("Hospital bill", DebtType::MedicalDebt, dec!(1800), dec!(0), dec!(75)),
        Debt::new("Car loan", DebtType::AutoLoan, dec!(14500), dec!(0.059), dec!(310)),
        Debt::new("Grad loan", DebtType::StudentLoan, dec!(22000), dec!(0.095), dec!(260)),
        Debt::new("Undergrad loan", DebtType::StudentLoan, dec!(18000), dec!(0.045), dec!(190)),
        Debt::new("Signature loan", DebtType::PersonalLoan, dec!(6000), dec!(0.145), dec!(170)),
        Debt::new("Mortgage", DebtType::Mortgage, dec!(240000), dec!(0.0625), dec!(1480)),
        Debt::new("Store card", DebtType::CreditCard, dec!(900), dec!(0.2699), dec!(35)),
        Debt::new("Dental", DebtType::MedicalDebt, dec!(650), dec!(0), dec!(50)),
    ]
}

fn bench_plan(c: &mut Criterion) {
    let debts = sample_portfolio();
    let planner = DebtPlanner::new(dec!(3400))
        .with_start_date(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());

    c.bench_function("plan_ten_debt_portfolio", |b| {
        b.iter(|| planner.plan(std::hint::black_box(&debts)).unwrap())
    });
}

criterion_group!(benches, bench_plan);
criterion_main!(benches);
