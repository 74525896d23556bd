// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::Decimal;
use spendclip::api::{
    ApiClient, Dataset, FetchError, Fetcher, NewExpense, endpoints, fetch_snapshot,
};
use spendclip::models::{ExpenseRecord, IncomeRecord, Period, SavingRecord};
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::Mutex;
use std::thread;

#[derive(Default)]
struct Stub {
    expenses: Vec<ExpenseRecord>,
    income: Vec<IncomeRecord>,
    savings: Vec<SavingRecord>,
    fail_savings: bool,
    calls: Mutex<Vec<String>>,
}

impl Stub {
    fn log(&self, s: String) {
        self.calls.lock().unwrap().push(s);
    }
}

impl Fetcher for Stub {
    fn expenses(&self, user: i64) -> Result<Vec<ExpenseRecord>, FetchError> {
        self.log(format!("expenses/{user}"));
        Ok(self.expenses.clone())
    }
    fn income(&self, user: i64) -> Result<Vec<IncomeRecord>, FetchError> {
        self.log(format!("income/{user}"));
        Ok(self.income.clone())
    }
    fn income_for(&self, user: i64, period: Period) -> Result<Vec<IncomeRecord>, FetchError> {
        self.log(format!("income/{user}/{period}"));
        Ok(self.income.clone())
    }
    fn savings(&self, user: i64) -> Result<Vec<SavingRecord>, FetchError> {
        self.log(format!("savings/{user}"));
        if self.fail_savings {
            return Err(FetchError::Status {
                code: 503,
                url: "http://test/getSaving/1".into(),
            });
        }
        Ok(self.savings.clone())
    }
}

fn expense(cost: i64, month: i64, year: i64) -> ExpenseRecord {
    ExpenseRecord {
        cost: Decimal::new(cost, 0),
        month: Some(month),
        year: Some(year),
        ..Default::default()
    }
}

#[test]
fn failed_dataset_degrades_to_empty_and_is_reported() {
    let stub = Stub {
        expenses: vec![expense(20, 1, 2024)],
        income: vec![IncomeRecord {
            amount: Decimal::new(100, 0),
            month: Some(1),
            year: Some(2024),
            ..Default::default()
        }],
        fail_savings: true,
        ..Default::default()
    };
    let snap = fetch_snapshot(&stub, 1, None);
    assert!(!snap.is_complete());
    assert_eq!(snap.failures.len(), 1);
    assert_eq!(snap.failures[0].dataset, Dataset::Savings);
    assert!(snap.failures[0].reason.contains("503"));
    assert!(snap.savings.is_empty());

    let buckets = snap.period_buckets();
    assert_eq!(buckets.len(), 1);
    assert_eq!(buckets[0].balance, Decimal::new(80, 0));
}

#[test]
fn month_filter_uses_per_month_income_and_trims_other_months() {
    let stub = Stub {
        expenses: vec![expense(5, 2, 2024), expense(7, 3, 2024)],
        ..Default::default()
    };
    let snap = fetch_snapshot(&stub, 9, Period::new(2024, 3));
    assert!(snap.is_complete());
    assert_eq!(snap.expenses.len(), 1);
    assert_eq!(snap.expenses[0].cost, Decimal::new(7, 0));
    let calls = stub.calls.lock().unwrap();
    assert!(calls.contains(&"income/9/2024-03".to_string()));
    assert!(!calls.contains(&"income/9".to_string()));
}

fn find(hay: &[u8], needle: &[u8]) -> Option<usize> {
    hay.windows(needle.len()).position(|w| w == needle)
}

fn read_request(stream: &mut std::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = stream.read(&mut chunk).unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = find(&buf, b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buf[..pos]).to_lowercase();
            let len = head
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .map(|v| v.trim().parse::<usize>().unwrap())
                .unwrap_or(0);
            while buf.len() < pos + 4 + len {
                let n = stream.read(&mut chunk).unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
            }
            break;
        }
    }
    String::from_utf8_lossy(&buf).to_string()
}

/// Answers exactly one request and hands back what was received.
fn serve_once(status: &str, body: &str) -> (ApiClient, thread::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let request = read_request(&mut stream);
        stream.write_all(response.as_bytes()).unwrap();
        stream.flush().unwrap();
        request
    });
    let http = reqwest::blocking::Client::builder()
        .no_proxy()
        .build()
        .unwrap();
    (ApiClient::with_client(&format!("http://{}/", addr), http), handle)
}

#[test]
fn client_reads_expense_list_with_mixed_types() {
    let (client, server) = serve_once(
        "200 OK",
        r#"[{"id":1,"category":"Food","product":"Tea","cost":"4.50","month":"2","year":"2024","is_tax_app":"no"},
            {"id":2,"category":"Food","product":"Milk","cost":3,"month":2,"year":2024,"is_tax_app":"yes","tax_amount":0}]"#,
    );
    let records = client.expenses(42).unwrap();
    let request = server.join().unwrap();
    assert!(request.starts_with("GET /getExpenseCost/42 "));
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].cost, Decimal::new(450, 2));
    assert_eq!(records[1].period(), Period::new(2024, 2));
}

#[test]
fn client_accepts_data_wrapper_and_skips_malformed_items() {
    let (client, server) = serve_once(
        "200 OK",
        r#"{"data":[{"amount":"250","month":5,"year":2024,"source":"Salary"}, 17]}"#,
    );
    let records = client.income_for(3, Period::new(2024, 5).unwrap()).unwrap();
    let request = server.join().unwrap();
    assert!(request.starts_with("GET /getSource/3/5/2024 "));
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].amount, Decimal::new(250, 0));
}

#[test]
fn client_surfaces_http_status_as_error() {
    let (client, server) = serve_once("500 Internal Server Error", r#"{"error":"boom"}"#);
    let err = client.savings(1).unwrap_err();
    server.join().unwrap();
    match err {
        FetchError::Status { code, url } => {
            assert_eq!(code, 500);
            assert!(url.ends_with("/getSaving/1"));
        }
        other => panic!("unexpected error {other}"),
    }
}

#[test]
fn client_reports_non_array_body_as_decode_error() {
    let (client, server) = serve_once("200 OK", r#"{"message":"ok"}"#);
    let err = client.expenses(1).unwrap_err();
    server.join().unwrap();
    assert!(matches!(err, FetchError::Decode { .. }));
}

#[test]
fn add_expense_posts_json_body() {
    let (client, server) = serve_once("201 Created", "{}");
    let e = NewExpense {
        user_id: 5,
        category: "Tools".into(),
        product: "Drill".into(),
        cost: Decimal::new(12000, 2),
        month: 6,
        year: 2024,
        tax_amount: Decimal::ZERO,
        is_tax_app: true,
        p_date: chrono::NaiveDate::from_ymd_opt(2024, 6, 9).unwrap(),
        description: None,
    };
    client.add_expense(&e).unwrap();
    let request = server.join().unwrap();
    assert!(request.starts_with("POST /addExpense "));
    let body = &request[request.find("\r\n\r\n").unwrap() + 4..];
    let v: serde_json::Value = serde_json::from_str(body).unwrap();
    assert_eq!(v["user_id"], 5);
    assert_eq!(v["is_tax_app"], "yes");
    assert_eq!(v["p_date"], "2024-06-09");
    assert!(v.get("description").is_none());
}

#[test]
fn unreachable_server_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let http = reqwest::blocking::Client::builder()
        .no_proxy()
        .build()
        .unwrap();
    let client = ApiClient::with_client(&format!("http://{}", addr), http);
    let err = client.income(1).unwrap_err();
    assert!(matches!(err, FetchError::Transport { .. }));
}

#[test]
fn endpoint_paths() {
    assert_eq!(endpoints::expenses(4), "getExpenseCost/4");
    assert_eq!(endpoints::income(4), "getSourceData/4");
    assert_eq!(endpoints::income_for(4, 12, 2023), "getSource/4/12/2023");
}
