// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::Decimal;
use spendclip::api::{FetchError, Fetcher};
use spendclip::commands::reports::watch_loop;
use spendclip::models::{ExpenseRecord, IncomeRecord, Period, SavingRecord};
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::thread;
use std::time::Duration;

/// Answers after `delay`; each expenses call returns one record whose
/// cost is the call number.
struct SlowApi {
    delay: Duration,
    calls: AtomicI64,
}

impl SlowApi {
    fn new(delay_ms: u64) -> Arc<Self> {
        Arc::new(Self {
            delay: Duration::from_millis(delay_ms),
            calls: AtomicI64::new(0),
        })
    }
}

impl Fetcher for SlowApi {
    fn expenses(&self, _user: i64) -> Result<Vec<ExpenseRecord>, FetchError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        thread::sleep(self.delay);
        Ok(vec![ExpenseRecord {
            cost: Decimal::new(n, 0),
            month: Some(1),
            year: Some(2024),
            ..Default::default()
        }])
    }
    fn income(&self, _user: i64) -> Result<Vec<IncomeRecord>, FetchError> {
        Ok(Vec::new())
    }
    fn income_for(&self, _user: i64, _period: Period) -> Result<Vec<IncomeRecord>, FetchError> {
        Ok(Vec::new())
    }
    fn savings(&self, _user: i64) -> Result<Vec<SavingRecord>, FetchError> {
        Ok(Vec::new())
    }
}

#[test]
fn single_tick_slower_than_interval_still_renders() {
    let api = SlowApi::new(150);
    let mut seen = Vec::new();
    let rendered = watch_loop(
        Arc::clone(&api),
        1,
        Duration::from_millis(20),
        Some(1),
        |snap| seen.push(snap.expenses.len()),
    );
    assert_eq!(rendered, 1);
    assert_eq!(seen, vec![1]);
    assert_eq!(api.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn slow_refreshes_are_not_stacked_and_latest_is_shown() {
    let api = SlowApi::new(120);
    let mut costs = Vec::new();
    let ticks = 6;
    let rendered = watch_loop(
        Arc::clone(&api),
        1,
        Duration::from_millis(40),
        Some(ticks),
        |snap| costs.push(snap.expenses[0].cost),
    );
    let calls = api.calls.load(Ordering::SeqCst);
    assert!(calls < ticks as i64, "issued {calls} refreshes in {ticks} ticks");
    assert!(rendered >= 1);
    assert_eq!(rendered, costs.len());
    assert_eq!(costs.last().copied(), Some(Decimal::new(calls, 0)));
}

#[test]
fn fast_refreshes_render_every_tick() {
    let api = SlowApi::new(0);
    let rendered = watch_loop(
        Arc::clone(&api),
        1,
        Duration::from_millis(100),
        Some(3),
        |_| {},
    );
    assert_eq!(api.calls.load(Ordering::SeqCst), 3);
    assert_eq!(rendered, 3);
}
