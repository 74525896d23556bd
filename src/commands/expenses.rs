// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{Context, warn_failures};
use crate::aggregate::tax_amount;
use crate::api::{Dataset, Fetcher, NewExpense, degrade};
use crate::models::{ExpenseRecord, Period};
use crate::utils::{
    Filter, fmt_money, json_flags, maybe_print_json, parse_date, parse_decimal, pretty_table,
};
use anyhow::{Context as _, Result, bail};
use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;

pub fn handle(ctx: &Context, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("list", sub)) => list(ctx, sub)?,
        Some(("add", sub)) => add(ctx, sub)?,
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            ctx.client.delete_expense(id)?;
            println!("Removed expense {}", id);
        }
        _ => {}
    }
    Ok(())
}

#[derive(Debug, Default)]
pub struct ExpenseQuery {
    pub filter: Filter,
    pub category: Option<String>,
    pub search: Option<Regex>,
    pub limit: Option<usize>,
}

impl ExpenseQuery {
    pub fn from_matches(sub: &clap::ArgMatches) -> Result<Self> {
        let search = match sub.get_one::<String>("search") {
            Some(p) => Some(
                Regex::new(p.trim()).with_context(|| format!("Invalid regex pattern '{}'", p))?,
            ),
            None => None,
        };
        Ok(Self {
            filter: Filter::from_matches(sub),
            category: sub.get_one::<String>("category").map(|s| s.trim().to_string()),
            search,
            limit: sub.get_one::<usize>("limit").copied(),
        })
    }

    pub fn matches(&self, e: &ExpenseRecord) -> bool {
        if !self.filter.matches(e.period()) {
            return false;
        }
        if let Some(cat) = &self.category {
            if !e.category.trim().eq_ignore_ascii_case(cat) {
                return false;
            }
        }
        if let Some(re) = &self.search {
            let hay = match &e.description {
                Some(d) => format!("{} {}", e.product, d),
                None => e.product.clone(),
            };
            if !re.is_match(&hay) {
                return false;
            }
        }
        true
    }
}

/// Newest first by purchase date, then id.
pub fn select(records: Vec<ExpenseRecord>, q: &ExpenseQuery) -> Vec<ExpenseRecord> {
    let mut out: Vec<ExpenseRecord> = records.into_iter().filter(|e| q.matches(e)).collect();
    out.sort_by(|a, b| b.p_date.cmp(&a.p_date).then_with(|| b.id.cmp(&a.id)));
    if let Some(n) = q.limit {
        out.truncate(n);
    }
    out
}

#[derive(Debug, Serialize)]
pub struct ExpenseRow {
    pub id: Option<i64>,
    pub date: String,
    pub category: String,
    pub product: String,
    pub cost: Decimal,
    pub tax: Decimal,
    pub description: String,
}

impl From<&ExpenseRecord> for ExpenseRow {
    fn from(e: &ExpenseRecord) -> Self {
        Self {
            id: e.id,
            date: e.p_date.map(|d| d.to_string()).unwrap_or_default(),
            category: e.category.clone(),
            product: e.product.clone(),
            cost: e.cost,
            tax: tax_amount(e),
            description: e.description.clone().unwrap_or_default(),
        }
    }
}

fn list(ctx: &Context, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = json_flags(sub);
    let query = ExpenseQuery::from_matches(sub)?;
    let user = ctx.user()?;
    let mut failures = Vec::new();
    let records = degrade(Dataset::Expenses, ctx.client.expenses(user), &mut failures);
    warn_failures(&failures);

    let data: Vec<ExpenseRow> = select(records, &query).iter().map(ExpenseRow::from).collect();
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                vec![
                    r.id.map(|i| i.to_string()).unwrap_or_default(),
                    r.date.clone(),
                    r.category.clone(),
                    r.product.clone(),
                    fmt_money(&r.cost),
                    fmt_money(&r.tax),
                    r.description.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Id", "Date", "Category", "Product", "Cost", "Tax", "Description"],
                rows,
            )
        );
    }
    Ok(())
}

pub fn new_expense(user_id: i64, sub: &clap::ArgMatches) -> Result<NewExpense> {
    let cost = parse_decimal(sub.get_one::<String>("cost").unwrap())?;
    if cost.is_sign_negative() {
        bail!("Cost must not be negative, got {}", cost);
    }
    let p_date = match sub.get_one::<String>("date") {
        Some(d) => parse_date(d)?,
        None => chrono::Local::now().date_naive(),
    };
    let period = Period::from_date(p_date)
        .with_context(|| format!("Date {} has no valid month/year", p_date))?;
    let is_tax_app = sub
        .get_one::<String>("tax")
        .is_some_and(|t| t.eq_ignore_ascii_case("yes"));
    let tax_amount = match sub.get_one::<String>("tax-amount") {
        Some(t) if is_tax_app => parse_decimal(t)?,
        Some(_) => bail!("--tax-amount needs --tax yes"),
        None => Decimal::ZERO,
    };
    Ok(NewExpense {
        user_id,
        category: sub.get_one::<String>("category").unwrap().trim().to_string(),
        product: sub.get_one::<String>("product").unwrap().trim().to_string(),
        cost,
        month: period.month,
        year: period.year,
        tax_amount,
        is_tax_app,
        p_date,
        description: sub.get_one::<String>("description").map(|s| s.to_string()),
    })
}

fn add(ctx: &Context, sub: &clap::ArgMatches) -> Result<()> {
    let expense = new_expense(ctx.user()?, sub)?;
    ctx.client.add_expense(&expense)?;
    let preview = ExpenseRecord {
        cost: expense.cost,
        tax_amount: expense.tax_amount,
        is_tax_app: expense.is_tax_app,
        ..Default::default()
    };
    println!(
        "Recorded {} for {} / {} on {} (tax {})",
        fmt_money(&expense.cost),
        expense.category,
        expense.product,
        expense.p_date,
        fmt_money(&tax_amount(&preview))
    );
    Ok(())
}
