// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Client for the hosted tracker API.
//!
//! Reads go through [`Fetcher`] so reports can run against any source.
//! [`fetch_snapshot`] pulls the three datasets side by side and degrades a
//! failed dataset to an empty list, recording the failure on the snapshot.

use crate::aggregate::{self, in_period};
use crate::config::Settings;
use crate::models::{
    Category, ExpenseRecord, IncomeRecord, Period, PeriodBucket, Product, SavingRecord,
};
use chrono::NaiveDate;
use reqwest::Method;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

const UA: &str = concat!(
    "spendclip/",
    env!("CARGO_PKG_VERSION"),
    " (+https://github.com/alphavelocity/spendclip)"
);

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("could not build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned HTTP {code}")]
    Status { code: u16, url: String },
    #[error("could not decode response from {url}: {reason}")]
    Decode { url: String, reason: String },
}

pub trait Fetcher {
    fn expenses(&self, user: i64) -> Result<Vec<ExpenseRecord>, FetchError>;
    fn income(&self, user: i64) -> Result<Vec<IncomeRecord>, FetchError>;
    fn income_for(&self, user: i64, period: Period) -> Result<Vec<IncomeRecord>, FetchError>;
    fn savings(&self, user: i64) -> Result<Vec<SavingRecord>, FetchError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Dataset {
    Expenses,
    Income,
    Savings,
}

impl std::fmt::Display for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Dataset::Expenses => "expenses",
            Dataset::Income => "income",
            Dataset::Savings => "savings",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetFailure {
    pub dataset: Dataset,
    pub reason: String,
}

/// Records for one user, fetched together.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub expenses: Vec<ExpenseRecord>,
    pub income: Vec<IncomeRecord>,
    pub savings: Vec<SavingRecord>,
    pub failures: Vec<DatasetFailure>,
}

impl Snapshot {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn period_buckets(&self) -> Vec<PeriodBucket> {
        aggregate::period_buckets(&self.expenses, &self.income, &self.savings)
    }
}

/// Unwraps a fetch result, logging and recording a failure instead of
/// propagating it.
pub fn degrade<T>(
    dataset: Dataset,
    result: Result<Vec<T>, FetchError>,
    failures: &mut Vec<DatasetFailure>,
) -> Vec<T> {
    match result {
        Ok(v) => v,
        Err(err) => {
            tracing::error!(%dataset, error = %err, "fetch failed; continuing with no records");
            failures.push(DatasetFailure {
                dataset,
                reason: err.to_string(),
            });
            Vec::new()
        }
    }
}

/// Fetches expenses, income and savings in parallel and combines them once
/// all three have resolved. With a `filter`, only that month is kept.
pub fn fetch_snapshot<F>(fetcher: &F, user: i64, filter: Option<Period>) -> Snapshot
where
    F: Fetcher + Sync,
{
    let (expenses, income, savings) = std::thread::scope(|scope| {
        let e = scope.spawn(|| fetcher.expenses(user));
        let i = scope.spawn(|| match filter {
            Some(p) => fetcher.income_for(user, p),
            None => fetcher.income(user),
        });
        let s = scope.spawn(|| fetcher.savings(user));
        (join(e), join(i), join(s))
    });

    let mut failures = Vec::new();
    let expenses = degrade(Dataset::Expenses, expenses, &mut failures);
    let income = degrade(Dataset::Income, income, &mut failures);
    let savings = degrade(Dataset::Savings, savings, &mut failures);
    let mut snap = Snapshot {
        expenses,
        income,
        savings,
        failures,
    };
    if filter.is_some() {
        snap.expenses.retain(|r| in_period(r, filter));
        snap.income.retain(|r| in_period(r, filter));
        snap.savings.retain(|r| in_period(r, filter));
    }
    tracing::debug!(
        user,
        expenses = snap.expenses.len(),
        income = snap.income.len(),
        savings = snap.savings.len(),
        failed = snap.failures.len(),
        "snapshot fetched"
    );
    snap
}

fn join<T>(handle: std::thread::ScopedJoinHandle<'_, T>) -> T {
    handle
        .join()
        .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
}

pub mod endpoints {
    pub fn expenses(user: i64) -> String {
        format!("getExpenseCost/{user}")
    }
    pub fn income(user: i64) -> String {
        format!("getSourceData/{user}")
    }
    pub fn income_for(user: i64, month: u32, year: i32) -> String {
        format!("getSource/{user}/{month}/{year}")
    }
    pub fn savings(user: i64) -> String {
        format!("getSaving/{user}")
    }
    pub fn categories(user: i64) -> String {
        format!("getCategory/{user}")
    }
    pub fn products(user: i64) -> String {
        format!("getProduct/{user}")
    }
    pub const ADD_EXPENSE: &str = "addExpense";
    pub const ADD_SOURCE: &str = "addSource";
    pub const ADD_SAVING: &str = "addSaving";
    pub const ADD_CATEGORY: &str = "addCategory";
    pub const ADD_PRODUCT: &str = "addProduct";
    pub fn delete_expense(id: i64) -> String {
        format!("deleteExpense/{id}")
    }
    pub fn delete_source(id: i64) -> String {
        format!("deleteSource/{id}")
    }
    pub fn delete_saving(id: i64) -> String {
        format!("deleteSaving/{id}")
    }
    pub fn delete_category(id: i64) -> String {
        format!("deleteCategory/{id}")
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NewExpense {
    pub user_id: i64,
    pub category: String,
    pub product: String,
    pub cost: Decimal,
    pub month: u32,
    pub year: i32,
    pub tax_amount: Decimal,
    #[serde(serialize_with = "crate::models::yes_no")]
    pub is_tax_app: bool,
    pub p_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewIncome {
    pub user_id: i64,
    pub source: String,
    pub amount: Decimal,
    pub month: u32,
    pub year: i32,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewSaving {
    pub user_id: i64,
    pub amount: Decimal,
    pub date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewCategory {
    pub user_id: i64,
    pub category: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewProduct {
    pub user_id: i64,
    pub category: String,
    pub product: String,
}

pub struct ApiClient {
    base: String,
    http: reqwest::blocking::Client,
}

impl ApiClient {
    pub fn new(settings: &Settings) -> Result<Self, FetchError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(UA)
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self::with_client(&settings.api_url, http))
    }

    pub fn with_client(api_url: &str, http: reqwest::blocking::Client) -> Self {
        Self {
            base: api_url.trim().trim_end_matches('/').to_string(),
            http,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base, path.trim_start_matches('/'))
    }

    fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<(String, reqwest::blocking::Response), FetchError> {
        let url = self.url(path);
        tracing::debug!(%method, %url, "request");
        let mut req = self.http.request(method, &url);
        if let Some(b) = body {
            req = req.json(b);
        }
        let resp = req.send().map_err(|source| FetchError::Transport {
            url: url.clone(),
            source,
        })?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                code: status.as_u16(),
                url,
            });
        }
        Ok((url, resp))
    }

    /// GETs a list endpoint as raw JSON values.
    ///
    /// A bare array, an object wrapping one under `data`, or `null` are all
    /// accepted.
    pub fn get_raw(&self, path: &str) -> Result<Vec<Value>, FetchError> {
        let (url, resp) = self.send(Method::GET, path, None)?;
        let text = resp.text().map_err(|source| FetchError::Transport {
            url: url.clone(),
            source,
        })?;
        let body: Value = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).map_err(|e| FetchError::Decode {
                url: url.clone(),
                reason: e.to_string(),
            })?
        };
        match body {
            Value::Array(items) => Ok(items),
            Value::Null => Ok(Vec::new()),
            Value::Object(mut obj) => match obj.remove("data") {
                Some(Value::Array(items)) => Ok(items),
                Some(Value::Null) | None if obj.is_empty() => Ok(Vec::new()),
                _ => Err(FetchError::Decode {
                    url,
                    reason: "expected a JSON array".into(),
                }),
            },
            _ => Err(FetchError::Decode {
                url,
                reason: "expected a JSON array".into(),
            }),
        }
    }

    /// Elements that are not record-shaped are skipped with a warning.
    pub fn get_list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, FetchError> {
        let raw = self.get_raw(path)?;
        let mut out = Vec::with_capacity(raw.len());
        for (idx, item) in raw.into_iter().enumerate() {
            match serde_json::from_value::<T>(item) {
                Ok(v) => out.push(v),
                Err(e) => tracing::warn!(path, idx, error = %e, "skipping malformed record"),
            }
        }
        Ok(out)
    }

    fn post<B: Serialize>(&self, path: &str, body: &B) -> Result<(), FetchError> {
        let url = self.url(path);
        let value = serde_json::to_value(body).map_err(|e| FetchError::Decode {
            url,
            reason: e.to_string(),
        })?;
        self.send(Method::POST, path, Some(&value))?;
        Ok(())
    }

    fn delete(&self, path: &str) -> Result<(), FetchError> {
        self.send(Method::DELETE, path, None)?;
        Ok(())
    }

    pub fn add_expense(&self, e: &NewExpense) -> Result<(), FetchError> {
        self.post(endpoints::ADD_EXPENSE, e)
    }
    pub fn delete_expense(&self, id: i64) -> Result<(), FetchError> {
        self.delete(&endpoints::delete_expense(id))
    }
    pub fn add_income(&self, i: &NewIncome) -> Result<(), FetchError> {
        self.post(endpoints::ADD_SOURCE, i)
    }
    pub fn delete_income(&self, id: i64) -> Result<(), FetchError> {
        self.delete(&endpoints::delete_source(id))
    }
    pub fn add_saving(&self, s: &NewSaving) -> Result<(), FetchError> {
        self.post(endpoints::ADD_SAVING, s)
    }
    pub fn delete_saving(&self, id: i64) -> Result<(), FetchError> {
        self.delete(&endpoints::delete_saving(id))
    }
    pub fn categories(&self, user: i64) -> Result<Vec<Category>, FetchError> {
        self.get_list(&endpoints::categories(user))
    }
    pub fn add_category(&self, c: &NewCategory) -> Result<(), FetchError> {
        self.post(endpoints::ADD_CATEGORY, c)
    }
    pub fn delete_category(&self, id: i64) -> Result<(), FetchError> {
        self.delete(&endpoints::delete_category(id))
    }
    pub fn products(&self, user: i64) -> Result<Vec<Product>, FetchError> {
        self.get_list(&endpoints::products(user))
    }
    pub fn add_product(&self, p: &NewProduct) -> Result<(), FetchError> {
        self.post(endpoints::ADD_PRODUCT, p)
    }
}

impl Fetcher for ApiClient {
    fn expenses(&self, user: i64) -> Result<Vec<ExpenseRecord>, FetchError> {
        self.get_list(&endpoints::expenses(user))
    }
    fn income(&self, user: i64) -> Result<Vec<IncomeRecord>, FetchError> {
        self.get_list(&endpoints::income(user))
    }
    fn income_for(&self, user: i64, period: Period) -> Result<Vec<IncomeRecord>, FetchError> {
        self.get_list(&endpoints::income_for(user, period.month, period.year))
    }
    fn savings(&self, user: i64) -> Result<Vec<SavingRecord>, FetchError> {
        self.get_list(&endpoints::savings(user))
    }
}
