// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::Context;
use super::reports::{category_report, load, monthly_buckets};
use crate::utils::Filter;
use anyhow::{Context as _, Result, bail};
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Csv,
    Json,
}

impl Format {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_lowercase().as_str() {
            "csv" => Ok(Format::Csv),
            "json" => Ok(Format::Json),
            other => bail!("Unknown format: {} (use csv|json)", other),
        }
    }
}

pub fn handle(ctx: &Context, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("monthly", sub)) => {
            let (fmt, out) = target(sub)?;
            let snap = load(&ctx.client, ctx.user()?, Filter::default());
            let rows = monthly_buckets(&snap, sub.get_one::<i32>("year").copied());
            write_rows(&rows, fmt, out)?;
            println!("Exported {} months to {}", rows.len(), out.display());
        }
        Some(("categories", sub)) => {
            let (fmt, out) = target(sub)?;
            let filter = Filter::from_matches(sub);
            let snap = load(&ctx.client, ctx.user()?, filter);
            let rows = category_report(&snap.expenses, filter);
            write_rows(&rows, fmt, out)?;
            println!("Exported {} categories to {}", rows.len(), out.display());
        }
        _ => {}
    }
    Ok(())
}

fn target(sub: &clap::ArgMatches) -> Result<(Format, &Path)> {
    let fmt = Format::parse(sub.get_one::<String>("format").unwrap())?;
    let out = Path::new(sub.get_one::<String>("out").unwrap().trim());
    Ok((fmt, out))
}

pub fn write_rows<T: Serialize>(rows: &[T], fmt: Format, out: &Path) -> Result<()> {
    match fmt {
        Format::Csv => {
            let mut wtr = csv::Writer::from_path(out)
                .with_context(|| format!("Create {}", out.display()))?;
            for r in rows {
                wtr.serialize(r)?;
            }
            wtr.flush()?;
        }
        Format::Json => {
            std::fs::write(out, serde_json::to_string_pretty(rows)?)
                .with_context(|| format!("Write {}", out.display()))?;
        }
    }
    Ok(())
}
