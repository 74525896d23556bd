// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Records as the tracker API returns them, normalized at deserialization.
//!
//! The API is loose about types: money arrives as numbers or numeric
//! strings, periods as `3` or `"03"`. Everything is coerced here so the
//! aggregation code only ever compares integers and sums decimals.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// A (year, month) grouping key. Ordering is chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Period {
    pub year: i32,
    pub month: u32,
}

impl Period {
    pub fn new(year: i64, month: i64) -> Option<Self> {
        if !(1..=12).contains(&month) || !(1000..=9999).contains(&year) {
            return None;
        }
        Some(Self {
            year: year as i32,
            month: month as u32,
        })
    }

    pub fn from_date(date: NaiveDate) -> Option<Self> {
        Self::new(date.year() as i64, date.month() as i64)
    }

    pub fn label(&self) -> &'static str {
        MONTH_NAMES[(self.month - 1) as usize]
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

fn period_from_parts(
    year: Option<i64>,
    month: Option<i64>,
    date: Option<NaiveDate>,
) -> Option<Period> {
    match (year, month) {
        (Some(y), Some(m)) => Period::new(y, m),
        _ => date.and_then(Period::from_date),
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExpenseRecord {
    #[serde(default, deserialize_with = "lenient_int")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub category: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub product: String,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub cost: Decimal,
    #[serde(default, deserialize_with = "lenient_int")]
    pub month: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub year: Option<i64>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub tax_amount: Decimal,
    #[serde(
        default,
        deserialize_with = "lenient_flag",
        serialize_with = "yes_no"
    )]
    pub is_tax_app: bool,
    #[serde(default, deserialize_with = "lenient_date")]
    pub p_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing)]
    pub image: Option<String>,
}

impl ExpenseRecord {
    pub fn period(&self) -> Option<Period> {
        period_from_parts(self.year, self.month, self.p_date)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IncomeRecord {
    #[serde(default, deserialize_with = "lenient_int")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub source: String,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub amount: Decimal,
    #[serde(default, deserialize_with = "lenient_int")]
    pub month: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub year: Option<i64>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub date: Option<NaiveDate>,
}

impl IncomeRecord {
    pub fn period(&self) -> Option<Period> {
        period_from_parts(self.year, self.month, self.date)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SavingRecord {
    #[serde(default, deserialize_with = "lenient_int")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub amount: Decimal,
    #[serde(default, deserialize_with = "lenient_date")]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl SavingRecord {
    pub fn period(&self) -> Option<Period> {
        self.date.and_then(Period::from_date)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    #[serde(default, deserialize_with = "lenient_int")]
    pub id: Option<i64>,
    #[serde(
        default,
        alias = "category",
        alias = "category_name",
        deserialize_with = "lenient_string"
    )]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    #[serde(default, deserialize_with = "lenient_int")]
    pub id: Option<i64>,
    #[serde(
        default,
        alias = "product",
        alias = "product_name",
        deserialize_with = "lenient_string"
    )]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub category: String,
}

/// One month of activity. `balance` keeps its sign.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodBucket {
    pub year: i32,
    pub month: &'static str,
    pub month_number: u32,
    pub income: Decimal,
    pub expenses: Decimal,
    pub savings: Decimal,
    pub balance: Decimal,
}

impl PeriodBucket {
    pub fn period(&self) -> Period {
        Period {
            year: self.year,
            month: self.month_number,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryBucket {
    pub category: String,
    pub total_cost: Decimal,
    pub percentage: Decimal,
}

/// Reads a number the way `parseFloat` does: the longest numeric prefix
/// wins, and no prefix at all yields `None`.
pub fn parse_float_prefix(s: &str) -> Option<Decimal> {
    let t = s.trim_start().as_bytes();
    let mut i = 0;
    let mut mantissa = String::new();
    if i < t.len() && (t[i] == b'+' || t[i] == b'-') {
        if t[i] == b'-' {
            mantissa.push('-');
        }
        i += 1;
    }
    let int_start = i;
    while i < t.len() && t[i].is_ascii_digit() {
        i += 1;
    }
    let int_digits = &t[int_start..i];
    let mut frac_digits: &[u8] = &[];
    if i < t.len() && t[i] == b'.' {
        let frac_start = i + 1;
        let mut j = frac_start;
        while j < t.len() && t[j].is_ascii_digit() {
            j += 1;
        }
        frac_digits = &t[frac_start..j];
        if !int_digits.is_empty() || !frac_digits.is_empty() {
            i = j;
        }
    }
    if int_digits.is_empty() && frac_digits.is_empty() {
        return None;
    }
    if int_digits.is_empty() {
        mantissa.push('0');
    } else {
        mantissa.push_str(std::str::from_utf8(int_digits).ok()?);
    }
    if !frac_digits.is_empty() {
        mantissa.push('.');
        mantissa.push_str(std::str::from_utf8(frac_digits).ok()?);
    }

    if i < t.len() && (t[i] == b'e' || t[i] == b'E') {
        let mut j = i + 1;
        let mut exp = String::new();
        if j < t.len() && (t[j] == b'+' || t[j] == b'-') {
            if t[j] == b'-' {
                exp.push('-');
            }
            j += 1;
        }
        let exp_start = j;
        while j < t.len() && t[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_start {
            exp.push_str(std::str::from_utf8(&t[exp_start..j]).ok()?);
            return in_range(s, Decimal::from_scientific(&format!("{}e{}", mantissa, exp)));
        }
    }
    in_range(s, Decimal::from_str(&mantissa))
}

fn in_range(raw: &str, parsed: Result<Decimal, rust_decimal::Error>) -> Option<Decimal> {
    match parsed {
        Ok(d) => Some(d),
        Err(e) => {
            tracing::warn!(raw, error = %e, "number outside the decimal range; reading it as 0");
            None
        }
    }
}

pub fn coerce_decimal(v: &Value) -> Option<Decimal> {
    match v {
        Value::Number(n) => parse_float_prefix(&n.to_string()),
        Value::String(s) => parse_float_prefix(s),
        _ => None,
    }
}

pub fn coerce_int(v: &Value) -> Option<i64> {
    let whole = |f: f64| (f.is_finite() && f.fract() == 0.0).then_some(f as i64);
    match v {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(whole)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(whole))
        }
        _ => None,
    }
}

/// Accepts `YYYY-MM-DD` or any timestamp whose date part is one.
pub fn parse_api_date(s: &str) -> Option<NaiveDate> {
    let day = s.trim().split(['T', ' ']).next()?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

fn lenient_decimal<'de, D: Deserializer<'de>>(d: D) -> Result<Decimal, D::Error> {
    let v = Option::<Value>::deserialize(d)?;
    Ok(v.as_ref().and_then(coerce_decimal).unwrap_or(Decimal::ZERO))
}

fn lenient_int<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
    let v = Option::<Value>::deserialize(d)?;
    Ok(v.as_ref().and_then(coerce_int))
}

fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    let v = Option::<Value>::deserialize(d)?;
    Ok(match v {
        Some(Value::String(s)) => s,
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    })
}

fn lenient_date<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
    let v = Option::<Value>::deserialize(d)?;
    Ok(match v {
        Some(Value::String(s)) => parse_api_date(&s),
        _ => None,
    })
}

fn lenient_flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    let v = Option::<Value>::deserialize(d)?;
    Ok(match v {
        Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("yes"),
        Some(Value::Bool(b)) => b,
        _ => false,
    })
}

pub(crate) fn yes_no<S: Serializer>(flag: &bool, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(if *flag { "yes" } else { "no" })
}
