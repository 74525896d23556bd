// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{Context, warn_failures};
use crate::aggregate::{self, TaxSummary, YearTotals};
use crate::api::{Fetcher, Snapshot, fetch_snapshot};
use crate::models::{CategoryBucket, ExpenseRecord, PeriodBucket};
use crate::utils::{Filter, fmt_money, json_flags, maybe_print_json, pretty_table};
use crate::view::{LatestView, Ticket};
use anyhow::Result;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

pub fn handle(ctx: &Context, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("monthly", sub)) => monthly(ctx, sub)?,
        Some(("categories", sub)) => categories(ctx, sub)?,
        Some(("tax", sub)) => tax(ctx, sub)?,
        Some(("yearly", sub)) => yearly(ctx, sub)?,
        Some(("watch", sub)) => watch(ctx, sub)?,
        _ => {}
    }
    Ok(())
}

/// Fetches everything the filter can narrow down on the server side.
pub fn load<F: Fetcher + Sync>(fetcher: &F, user: i64, filter: Filter) -> Snapshot {
    let snap = fetch_snapshot(fetcher, user, filter.period());
    warn_failures(&snap.failures);
    snap
}

pub fn monthly_buckets(snap: &Snapshot, year: Option<i32>) -> Vec<PeriodBucket> {
    let mut buckets = snap.period_buckets();
    if let Some(y) = year {
        buckets.retain(|b| b.year == y);
    }
    buckets
}

fn filtered_expenses(expenses: &[ExpenseRecord], filter: Filter) -> Vec<ExpenseRecord> {
    expenses
        .iter()
        .filter(|e| filter.matches(e.period()))
        .cloned()
        .collect()
}

pub fn category_report(expenses: &[ExpenseRecord], filter: Filter) -> Vec<CategoryBucket> {
    match filter.period() {
        Some(p) => aggregate::category_buckets(expenses, Some(p)),
        None => aggregate::category_buckets(&filtered_expenses(expenses, filter), None),
    }
}

pub fn tax_report(expenses: &[ExpenseRecord], filter: Filter) -> TaxSummary {
    match filter.period() {
        Some(p) => aggregate::tax_summary(expenses, Some(p)),
        None => aggregate::tax_summary(&filtered_expenses(expenses, filter), None),
    }
}

fn standing(balance: &Decimal) -> &'static str {
    if balance.is_sign_negative() && !balance.is_zero() {
        "deficit"
    } else {
        "surplus"
    }
}

pub fn monthly_rows(buckets: &[PeriodBucket]) -> Vec<Vec<String>> {
    buckets
        .iter()
        .map(|b| {
            vec![
                b.year.to_string(),
                b.month.to_string(),
                fmt_money(&b.income),
                fmt_money(&b.expenses),
                fmt_money(&b.savings),
                fmt_money(&b.balance.abs()),
                standing(&b.balance).to_string(),
            ]
        })
        .collect()
}

const MONTHLY_HEADERS: [&str; 7] = [
    "Year", "Month", "Income", "Expenses", "Savings", "Balance", "Standing",
];

fn monthly(ctx: &Context, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = json_flags(sub);
    let year = sub.get_one::<i32>("year").copied();
    let snap = load(&ctx.client, ctx.user()?, Filter::default());
    let data = monthly_buckets(&snap, year);
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        println!("{}", pretty_table(&MONTHLY_HEADERS, monthly_rows(&data)));
    }
    Ok(())
}

fn categories(ctx: &Context, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = json_flags(sub);
    let filter = Filter::from_matches(sub);
    let snap = load(&ctx.client, ctx.user()?, filter);
    let data = category_report(&snap.expenses, filter);
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows = data
            .iter()
            .map(|c| {
                vec![
                    c.category.clone(),
                    fmt_money(&c.total_cost),
                    format!("{:.1}%", c.percentage),
                ]
            })
            .collect();
        println!("{}", pretty_table(&["Category", "Spent", "Share"], rows));
    }
    Ok(())
}

fn tax(ctx: &Context, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = json_flags(sub);
    let filter = Filter::from_matches(sub);
    let snap = load(&ctx.client, ctx.user()?, filter);
    let summary = tax_report(&snap.expenses, filter);
    if !maybe_print_json(json_flag, jsonl_flag, &summary)? {
        let mut rows: Vec<Vec<String>> = summary
            .lines
            .iter()
            .map(|l| {
                vec![
                    l.date.map(|d| d.to_string()).unwrap_or_default(),
                    l.category.clone(),
                    l.product.clone(),
                    fmt_money(&l.cost),
                    fmt_money(&l.tax),
                ]
            })
            .collect();
        rows.push(vec![
            "Total".into(),
            format!("{} taxable", summary.taxable_count),
            String::new(),
            fmt_money(&summary.taxable_cost),
            fmt_money(&summary.tax_total),
        ]);
        println!(
            "{}",
            pretty_table(&["Date", "Category", "Product", "Cost", "Tax"], rows)
        );
    }
    Ok(())
}

pub fn yearly_rows(totals: &[YearTotals]) -> Vec<Vec<String>> {
    totals
        .iter()
        .map(|t| {
            vec![
                t.year.to_string(),
                fmt_money(&t.income),
                fmt_money(&t.expenses),
                fmt_money(&t.savings),
                fmt_money(&t.balance.abs()),
                standing(&t.balance).to_string(),
            ]
        })
        .collect()
}

fn yearly(ctx: &Context, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = json_flags(sub);
    let snap = load(&ctx.client, ctx.user()?, Filter::default());
    let data = aggregate::year_totals(&snap.period_buckets());
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        println!(
            "{}",
            pretty_table(
                &["Year", "Income", "Expenses", "Savings", "Balance", "Standing"],
                yearly_rows(&data),
            )
        );
    }
    Ok(())
}

fn watch(ctx: &Context, sub: &clap::ArgMatches) -> Result<()> {
    let interval = Duration::from_secs(*sub.get_one::<u64>("interval").unwrap_or(&30));
    let count = sub.get_one::<usize>("count").copied();
    let user = ctx.user()?;
    let client = Arc::new(crate::api::ApiClient::new(&ctx.settings)?);
    watch_loop(client, user, interval, count, |snap| {
        warn_failures(&snap.failures);
        println!(
            "{}",
            pretty_table(&MONTHLY_HEADERS, monthly_rows(&snap.period_buckets()))
        );
    });
    Ok(())
}

/// Refreshes in the background once per `interval` and hands each new
/// snapshot to `render`. A tick that finds the previous refresh still
/// running skips issuing another one. After the last of `count` ticks the
/// outstanding refresh is awaited and rendered too. Returns how many
/// snapshots were rendered.
pub fn watch_loop<F, R>(
    fetcher: Arc<F>,
    user: i64,
    interval: Duration,
    count: Option<usize>,
    mut render: R,
) -> usize
where
    F: Fetcher + Send + Sync + 'static,
    R: FnMut(&Snapshot),
{
    let view: Arc<LatestView<Snapshot>> = Arc::new(LatestView::new());
    let mut shown = None;
    let mut rendered = 0usize;
    let mut ticks = 0usize;
    let mut pending: Option<JoinHandle<()>> = None;

    let mut show_latest = |shown: &mut Option<Ticket>| {
        if view.ticket() != *shown {
            if let Some(snap) = view.current() {
                *shown = view.ticket();
                render(&snap);
                rendered += 1;
            }
        }
    };

    loop {
        if pending.as_ref().is_some_and(|w| w.is_finished()) {
            if let Some(w) = pending.take() {
                reap(w);
            }
        }
        if pending.is_none() {
            let ticket = view.begin();
            let (worker_fetcher, worker_view) = (Arc::clone(&fetcher), Arc::clone(&view));
            pending = Some(std::thread::spawn(move || {
                let snap = fetch_snapshot(worker_fetcher.as_ref(), user, None);
                worker_view.publish(ticket, snap);
            }));
        } else {
            tracing::debug!("previous refresh still running; skipping this tick");
        }
        ticks += 1;

        std::thread::sleep(interval);
        show_latest(&mut shown);
        if count.is_some_and(|c| ticks >= c) {
            break;
        }
    }
    if let Some(w) = pending.take() {
        reap(w);
    }
    show_latest(&mut shown);
    rendered
}

fn reap(worker: JoinHandle<()>) {
    if let Err(panic) = worker.join() {
        let reason = panic
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| panic.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".into());
        tracing::error!(%reason, "refresh worker panicked");
    }
}
