// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::Context;
use crate::api::{Dataset, endpoints};
use crate::models::{ExpenseRecord, IncomeRecord, Period, SavingRecord, coerce_decimal};
use crate::utils::pretty_table;
use anyhow::Result;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Issue {
    pub dataset: Dataset,
    pub id: String,
    pub kind: &'static str,
    pub detail: String,
}

trait Inspectable: DeserializeOwned {
    const MONEY_FIELD: &'static str;
    fn period(&self) -> Option<Period>;
}

impl Inspectable for ExpenseRecord {
    const MONEY_FIELD: &'static str = "cost";
    fn period(&self) -> Option<Period> {
        ExpenseRecord::period(self)
    }
}

impl Inspectable for IncomeRecord {
    const MONEY_FIELD: &'static str = "amount";
    fn period(&self) -> Option<Period> {
        IncomeRecord::period(self)
    }
}

impl Inspectable for SavingRecord {
    const MONEY_FIELD: &'static str = "amount";
    fn period(&self) -> Option<Period> {
        SavingRecord::period(self)
    }
}

fn inspect<T: Inspectable>(dataset: Dataset, raw: &[Value]) -> Vec<Issue> {
    let mut out = Vec::new();
    for (idx, item) in raw.iter().enumerate() {
        let id = item
            .get("id")
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .unwrap_or_else(|| format!("#{}", idx));
        let record = match serde_json::from_value::<T>(item.clone()) {
            Ok(r) => r,
            Err(e) => {
                out.push(Issue {
                    dataset,
                    id,
                    kind: "malformed_record",
                    detail: e.to_string(),
                });
                continue;
            }
        };
        if record.period().is_none() {
            let shown = |k: &str| item.get(k).map(|v| v.to_string()).unwrap_or("-".into());
            out.push(Issue {
                dataset,
                id: id.clone(),
                kind: "no_period",
                detail: format!(
                    "month={} year={} date={}",
                    shown("month"),
                    shown("year"),
                    shown(if dataset == Dataset::Expenses { "p_date" } else { "date" })
                ),
            });
        }
        if let Some(v) = item.get(T::MONEY_FIELD) {
            if !v.is_null() && coerce_decimal(v).is_none() {
                out.push(Issue {
                    dataset,
                    id,
                    kind: "amount_read_as_zero",
                    detail: format!("{}={}", T::MONEY_FIELD, v),
                });
            }
        }
    }
    out
}

pub fn inspect_expenses(raw: &[Value]) -> Vec<Issue> {
    inspect::<ExpenseRecord>(Dataset::Expenses, raw)
}

pub fn inspect_income(raw: &[Value]) -> Vec<Issue> {
    inspect::<IncomeRecord>(Dataset::Income, raw)
}

pub fn inspect_savings(raw: &[Value]) -> Vec<Issue> {
    inspect::<SavingRecord>(Dataset::Savings, raw)
}

pub fn handle(ctx: &Context) -> Result<()> {
    let user = ctx.user()?;
    let mut rows = Vec::new();
    let checks: [(Dataset, String, fn(&[Value]) -> Vec<Issue>); 3] = [
        (Dataset::Expenses, endpoints::expenses(user), inspect_expenses),
        (Dataset::Income, endpoints::income(user), inspect_income),
        (Dataset::Savings, endpoints::savings(user), inspect_savings),
    ];
    for (dataset, path, check) in checks {
        match ctx.client.get_raw(&path) {
            Ok(raw) => {
                for issue in check(&raw) {
                    rows.push(vec![
                        issue.dataset.to_string(),
                        issue.id,
                        issue.kind.to_string(),
                        issue.detail,
                    ]);
                }
            }
            Err(err) => rows.push(vec![
                dataset.to_string(),
                String::new(),
                "fetch_failed".into(),
                err.to_string(),
            ]),
        }
    }

    if rows.is_empty() {
        println!("doctor: no issues found");
    } else {
        println!("{}", pretty_table(&["Dataset", "Id", "Issue", "Detail"], rows));
    }
    Ok(())
}
