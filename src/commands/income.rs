// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{Context, warn_failures};
use crate::api::{Dataset, Fetcher, NewIncome, degrade};
use crate::models::{IncomeRecord, Period};
use crate::utils::{
    Filter, fmt_money, json_flags, maybe_print_json, parse_date, parse_decimal, pretty_table,
};
use anyhow::{Context as _, Result, bail};

pub fn handle(ctx: &Context, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("list", sub)) => list(ctx, sub)?,
        Some(("add", sub)) => add(ctx, sub)?,
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            ctx.client.delete_income(id)?;
            println!("Removed income {}", id);
        }
        _ => {}
    }
    Ok(())
}

/// A full month goes to the per-month endpoint; anything broader fetches
/// everything and filters locally.
pub fn load<F: Fetcher>(
    fetcher: &F,
    user: i64,
    filter: Filter,
) -> (Vec<IncomeRecord>, Vec<crate::api::DatasetFailure>) {
    let mut failures = Vec::new();
    let result = match filter.period() {
        Some(p) => fetcher.income_for(user, p),
        None => fetcher.income(user),
    };
    let mut records = degrade(Dataset::Income, result, &mut failures);
    records.retain(|r| filter.matches(r.period()));
    records.sort_by(|a, b| b.period().cmp(&a.period()).then_with(|| b.date.cmp(&a.date)));
    (records, failures)
}

fn list(ctx: &Context, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = json_flags(sub);
    let (records, failures) = load(&ctx.client, ctx.user()?, Filter::from_matches(sub));
    warn_failures(&failures);
    if !maybe_print_json(json_flag, jsonl_flag, &records)? {
        let rows = records
            .iter()
            .map(|r| {
                vec![
                    r.id.map(|i| i.to_string()).unwrap_or_default(),
                    r.period().map(|p| p.to_string()).unwrap_or_default(),
                    r.source.clone(),
                    fmt_money(&r.amount),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Id", "Month", "Source", "Amount"], rows)
        );
    }
    Ok(())
}

fn add(ctx: &Context, sub: &clap::ArgMatches) -> Result<()> {
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
    if amount.is_sign_negative() {
        bail!("Amount must not be negative, got {}", amount);
    }
    let date = match sub.get_one::<String>("date") {
        Some(d) => parse_date(d)?,
        None => chrono::Local::now().date_naive(),
    };
    let period =
        Period::from_date(date).with_context(|| format!("Date {} has no valid month/year", date))?;
    let income = NewIncome {
        user_id: ctx.user()?,
        source: sub.get_one::<String>("source").unwrap().trim().to_string(),
        amount,
        month: period.month,
        year: period.year,
        date,
    };
    ctx.client.add_income(&income)?;
    println!(
        "Recorded income {} from '{}' for {} {}",
        fmt_money(&income.amount),
        income.source,
        period.label(),
        period.year
    );
    Ok(())
}
