// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::Period;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use comfy_table::{presets::UTF8_FULL, Cell, Table};
use rust_decimal::Decimal;
use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Logs go to stderr so `--json` output stays clean. `RUST_LOG` wins over
/// the verbosity flag when set.
pub fn init_tracing(verbose: u8) {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{EnvFilter, fmt};

        let default = match verbose {
            0 => "spendclip=warn",
            1 => "spendclip=info",
            _ => "spendclip=debug",
        };
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
        fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    });
}

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    s.trim()
        .parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}'", s))
}

pub fn fmt_money(d: &Decimal) -> String {
    format!("{:.2}", d.round_dp(2))
}

/// Month/year selection from the command line. A month always comes with
/// a year.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Filter {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

impl Filter {
    pub fn from_matches(sub: &clap::ArgMatches) -> Self {
        Self {
            year: sub.try_get_one::<i32>("year").ok().flatten().copied(),
            month: sub.try_get_one::<u32>("month").ok().flatten().copied(),
        }
    }

    pub fn period(&self) -> Option<Period> {
        match (self.year, self.month) {
            (Some(y), Some(m)) => Period::new(y as i64, m as i64),
            _ => None,
        }
    }

    pub fn matches(&self, period: Option<Period>) -> bool {
        match (self.year, self.month, period) {
            (None, None, _) => true,
            (_, _, None) => false,
            (Some(y), None, Some(p)) => p.year == y,
            (Some(y), Some(m), Some(p)) => p.year == y && p.month == m,
            (None, Some(m), Some(p)) => p.month == m,
        }
    }
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // If v is an array, stream each element; else stream single line
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}

pub fn json_flags(sub: &clap::ArgMatches) -> (bool, bool) {
    let flag = |id: &str| sub.try_get_one::<bool>(id).ok().flatten().copied().unwrap_or(false);
    (flag("json"), flag("jsonl"))
}
