// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Period and category roll-ups over already-fetched records.
//!
//! Everything here is pure: records in, buckets out. Records whose period
//! could not be normalized are left out of period grouping.

use crate::models::{
    CategoryBucket, ExpenseRecord, IncomeRecord, Period, PeriodBucket, SavingRecord,
};
use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

pub const UNCATEGORIZED: &str = "(uncategorized)";

/// Rate applied when a taxable expense carries no explicit tax amount.
pub fn default_tax_rate() -> Decimal {
    Decimal::new(18, 2)
}

pub trait Amounted {
    fn period(&self) -> Option<Period>;
    fn amount(&self) -> Decimal;
    fn category(&self) -> Option<&str> {
        None
    }
}

impl Amounted for ExpenseRecord {
    fn period(&self) -> Option<Period> {
        ExpenseRecord::period(self)
    }
    fn amount(&self) -> Decimal {
        self.cost
    }
    fn category(&self) -> Option<&str> {
        Some(&self.category)
    }
}

impl Amounted for IncomeRecord {
    fn period(&self) -> Option<Period> {
        IncomeRecord::period(self)
    }
    fn amount(&self) -> Decimal {
        self.amount
    }
    fn category(&self) -> Option<&str> {
        Some(&self.source)
    }
}

impl Amounted for SavingRecord {
    fn period(&self) -> Option<Period> {
        SavingRecord::period(self)
    }
    fn amount(&self) -> Decimal {
        self.amount
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKey {
    Period,
    PeriodAndCategory,
    Category,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupId {
    pub period: Option<Period>,
    pub category: Option<String>,
}

/// Adds `amount` to `total` unless the sum leaves `Decimal`'s range, in
/// which case `total` is left as is and `false` is returned.
pub fn add_amount(total: &mut Decimal, amount: Decimal) -> bool {
    match total.checked_add(amount) {
        Some(v) => {
            *total = v;
            true
        }
        None => {
            tracing::warn!(%total, %amount, "sum out of range; amount left out");
            false
        }
    }
}

fn checked_sum<I: IntoIterator<Item = Decimal>>(amounts: I) -> Decimal {
    let mut total = Decimal::ZERO;
    for a in amounts {
        add_amount(&mut total, a);
    }
    total
}

fn category_label(raw: Option<&str>) -> String {
    match raw.map(str::trim) {
        Some(c) if !c.is_empty() => c.to_string(),
        _ => UNCATEGORIZED.to_string(),
    }
}

/// Sums `amount()` per composite key. Records lacking a period are skipped
/// for any key that includes one.
pub fn group_totals<R: Amounted>(records: &[R], key: GroupKey) -> BTreeMap<GroupId, Decimal> {
    let mut out: BTreeMap<GroupId, Decimal> = BTreeMap::new();
    let mut skipped = 0usize;
    for r in records {
        let id = match key {
            GroupKey::Period => match r.period() {
                Some(p) => GroupId {
                    period: Some(p),
                    category: None,
                },
                None => {
                    skipped += 1;
                    continue;
                }
            },
            GroupKey::PeriodAndCategory => match r.period() {
                Some(p) => GroupId {
                    period: Some(p),
                    category: Some(category_label(r.category())),
                },
                None => {
                    skipped += 1;
                    continue;
                }
            },
            GroupKey::Category => GroupId {
                period: None,
                category: Some(category_label(r.category())),
            },
        };
        add_amount(out.entry(id).or_insert(Decimal::ZERO), r.amount());
    }
    if skipped > 0 {
        tracing::warn!(skipped, "records without a usable month/year left out of grouping");
    }
    out
}

fn sums_by_period<R: Amounted>(records: &[R]) -> BTreeMap<Period, Decimal> {
    group_totals(records, GroupKey::Period)
        .into_iter()
        .filter_map(|(id, sum)| id.period.map(|p| (p, sum)))
        .collect()
}

pub fn in_period<R: Amounted>(record: &R, filter: Option<Period>) -> bool {
    match filter {
        Some(p) => record.period() == Some(p),
        None => true,
    }
}

/// Saturates at the ends of `Decimal`'s range.
pub fn balance(income: Decimal, expenses: Decimal, savings: Decimal) -> Decimal {
    income.saturating_sub(expenses.saturating_add(savings))
}

/// Share of `part` in `total` on a 0..100 scale, one decimal place.
pub fn percentage(part: Decimal, total: Decimal) -> Decimal {
    if total <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    part.checked_div(total)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .map(|p| p.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero))
        .unwrap_or(Decimal::ZERO)
}

pub fn tax_amount(expense: &ExpenseRecord) -> Decimal {
    if !expense.is_tax_app {
        return Decimal::ZERO;
    }
    if expense.tax_amount > Decimal::ZERO {
        return expense.tax_amount;
    }
    (expense.cost * default_tax_rate())
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

pub fn sort_periods_desc(buckets: &mut [PeriodBucket]) {
    buckets.sort_by(|a, b| b.period().cmp(&a.period()));
}

/// Monthly income/expense/savings buckets, newest first. Only years that
/// have income are walked, and months with no activity at all are not
/// emitted.
pub fn period_buckets(
    expenses: &[ExpenseRecord],
    income: &[IncomeRecord],
    savings: &[SavingRecord],
) -> Vec<PeriodBucket> {
    let exp = sums_by_period(expenses);
    let inc = sums_by_period(income);
    let sav = sums_by_period(savings);

    let years: BTreeSet<i32> = inc.keys().map(|p| p.year).collect();

    let mut out = Vec::new();
    for year in years {
        for month in 1..=12 {
            let p = Period { year, month };
            let e = exp.get(&p).copied().unwrap_or_default();
            let i = inc.get(&p).copied().unwrap_or_default();
            let s = sav.get(&p).copied().unwrap_or_default();
            if e.is_zero() && i.is_zero() && s.is_zero() {
                continue;
            }
            out.push(PeriodBucket {
                year,
                month: p.label(),
                month_number: month,
                income: i,
                expenses: e,
                savings: s,
                balance: balance(i, e, s),
            });
        }
    }
    sort_periods_desc(&mut out);
    out
}

/// Expense totals per category with each category's share of the whole,
/// largest first.
pub fn category_buckets(expenses: &[ExpenseRecord], filter: Option<Period>) -> Vec<CategoryBucket> {
    let selected: Vec<&ExpenseRecord> = expenses.iter().filter(|e| in_period(*e, filter)).collect();
    let mut totals: BTreeMap<String, Decimal> = BTreeMap::new();
    let mut grand = Decimal::ZERO;
    for e in &selected {
        let label = category_label(Some(&e.category));
        let current = totals.get(&label).copied().unwrap_or_default();
        // A cost counts towards both its category and the grand total, or neither.
        match (current.checked_add(e.cost), grand.checked_add(e.cost)) {
            (Some(t), Some(g)) => {
                totals.insert(label, t);
                grand = g;
            }
            _ => tracing::warn!(
                category = %label,
                cost = %e.cost,
                "category total out of range; expense left out"
            ),
        }
    }

    let mut out: Vec<CategoryBucket> = totals
        .into_iter()
        .map(|(category, total_cost)| CategoryBucket {
            percentage: percentage(total_cost, grand),
            category,
            total_cost,
        })
        .collect();
    out.sort_by(|a, b| {
        b.total_cost
            .cmp(&a.total_cost)
            .then_with(|| a.category.cmp(&b.category))
    });
    out
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaxLine {
    pub date: Option<NaiveDate>,
    pub category: String,
    pub product: String,
    pub cost: Decimal,
    pub tax: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaxSummary {
    pub taxable_count: usize,
    pub taxable_cost: Decimal,
    pub tax_total: Decimal,
    pub lines: Vec<TaxLine>,
}

pub fn tax_summary(expenses: &[ExpenseRecord], filter: Option<Period>) -> TaxSummary {
    let lines: Vec<TaxLine> = expenses
        .iter()
        .filter(|e| e.is_tax_app && in_period(*e, filter))
        .map(|e| TaxLine {
            date: e.p_date,
            category: category_label(Some(&e.category)),
            product: e.product.clone(),
            cost: e.cost,
            tax: tax_amount(e),
        })
        .collect();
    TaxSummary {
        taxable_count: lines.len(),
        taxable_cost: checked_sum(lines.iter().map(|l| l.cost)),
        tax_total: checked_sum(lines.iter().map(|l| l.tax)),
        lines,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearTotals {
    pub year: i32,
    pub income: Decimal,
    pub expenses: Decimal,
    pub savings: Decimal,
    pub balance: Decimal,
}

pub fn year_totals(buckets: &[PeriodBucket]) -> Vec<YearTotals> {
    let mut by_year: BTreeMap<i32, (Decimal, Decimal, Decimal)> = BTreeMap::new();
    for b in buckets {
        let entry = by_year
            .entry(b.year)
            .or_insert((Decimal::ZERO, Decimal::ZERO, Decimal::ZERO));
        add_amount(&mut entry.0, b.income);
        add_amount(&mut entry.1, b.expenses);
        add_amount(&mut entry.2, b.savings);
    }
    by_year
        .into_iter()
        .rev()
        .map(|(year, (income, expenses, savings))| YearTotals {
            year,
            income,
            expenses,
            savings,
            balance: balance(income, expenses, savings),
        })
        .collect()
}
