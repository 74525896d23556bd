// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{Context, warn_failures};
use crate::api::{Dataset, Fetcher, NewSaving, degrade};
use crate::utils::{
    Filter, fmt_money, json_flags, maybe_print_json, parse_date, parse_decimal, pretty_table,
};
use anyhow::{Result, bail};

pub fn handle(ctx: &Context, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("list", sub)) => list(ctx, sub)?,
        Some(("add", sub)) => add(ctx, sub)?,
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            ctx.client.delete_saving(id)?;
            println!("Removed saving {}", id);
        }
        _ => {}
    }
    Ok(())
}

fn list(ctx: &Context, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = json_flags(sub);
    let filter = Filter::from_matches(sub);
    let mut failures = Vec::new();
    let mut records = degrade(Dataset::Savings, ctx.client.savings(ctx.user()?), &mut failures);
    warn_failures(&failures);
    records.retain(|r| filter.matches(r.period()));
    records.sort_by(|a, b| b.date.cmp(&a.date));

    if !maybe_print_json(json_flag, jsonl_flag, &records)? {
        let rows = records
            .iter()
            .map(|r| {
                vec![
                    r.id.map(|i| i.to_string()).unwrap_or_default(),
                    r.date.map(|d| d.to_string()).unwrap_or_default(),
                    fmt_money(&r.amount),
                    r.note.clone().unwrap_or_default(),
                ]
            })
            .collect();
        println!("{}", pretty_table(&["Id", "Date", "Amount", "Note"], rows));
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
    let saving = NewSaving {
        user_id: ctx.user()?,
        amount,
        date,
        note: sub.get_one::<String>("note").map(|s| s.to_string()),
    };
    ctx.client.add_saving(&saving)?;
    println!("Saved {} on {}", fmt_money(&saving.amount), saving.date);
    Ok(())
}
