// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;
use spendclip::cli;
use spendclip::commands::{self, doctor, expenses, exporter, products, reports};
use spendclip::config::Settings;
use spendclip::models::{ExpenseRecord, PeriodBucket, Product};
use tempfile::tempdir;

fn leaf(args: &[&str]) -> clap::ArgMatches {
    let mut m = cli::build_cli().get_matches_from(args.iter().copied());
    while let Some((_, sub)) = m.subcommand() {
        let next = sub.clone();
        m = next;
    }
    m
}

#[test]
fn month_requires_year() {
    let res = cli::build_cli().try_get_matches_from([
        "spendclip", "report", "categories", "--month", "3",
    ]);
    assert!(res.is_err());
    let res = cli::build_cli().try_get_matches_from([
        "spendclip", "report", "categories", "--month", "13", "--year", "2024",
    ]);
    assert!(res.is_err());
}

#[test]
fn json_and_jsonl_conflict() {
    let res = cli::build_cli().try_get_matches_from([
        "spendclip", "report", "yearly", "--json", "--jsonl",
    ]);
    assert!(res.is_err());
}

#[test]
fn bad_search_pattern_is_reported() {
    let m = leaf(&["spendclip", "expense", "list", "--search", "(unclosed"]);
    let err = expenses::ExpenseQuery::from_matches(&m).unwrap_err();
    assert!(err.to_string().contains("Invalid regex pattern"));
}

fn record(id: i64, date: &str, category: &str, product: &str) -> ExpenseRecord {
    let p_date = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok();
    ExpenseRecord {
        id: Some(id),
        category: category.into(),
        product: product.into(),
        cost: Decimal::new(10, 0),
        p_date,
        ..Default::default()
    }
}

#[test]
fn expense_selection_filters_sorts_and_limits() {
    let records = vec![
        record(1, "2024-03-01", "Food", "Bread"),
        record(2, "2024-03-20", "food", "Butter"),
        record(3, "2024-03-20", "Food", "Bran flakes"),
        record(4, "2024-02-11", "Food", "Bagel"),
        record(5, "2024-03-25", "Fuel", "Diesel"),
    ];
    let m = leaf(&[
        "spendclip", "expense", "list", "--category", "FOOD", "--search", "^B", "--month", "3",
        "--year", "2024", "--limit", "2",
    ]);
    let q = expenses::ExpenseQuery::from_matches(&m).unwrap();
    let ids: Vec<Option<i64>> = expenses::select(records, &q).iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![Some(3), Some(2)]);
}

#[test]
fn expense_add_builds_payload_from_flags() {
    let m = leaf(&[
        "spendclip", "expense", "add", "--category", " Tools ", "--product", "Saw", "--cost",
        "45.90", "--date", "2024-02-10", "--tax", "yes", "--tax-amount", "3.5",
    ]);
    let e = expenses::new_expense(8, &m).unwrap();
    assert_eq!(e.user_id, 8);
    assert_eq!(e.category, "Tools");
    assert_eq!((e.month, e.year), (2, 2024));
    assert!(e.is_tax_app);
    assert_eq!(e.tax_amount, Decimal::new(35, 1));
    assert_eq!(e.cost, Decimal::new(4590, 2));
}

#[test]
fn expense_add_rejects_tax_amount_without_tax_and_negative_cost() {
    let m = leaf(&[
        "spendclip", "expense", "add", "--category", "A", "--product", "B", "--cost", "1",
        "--tax-amount", "2",
    ]);
    assert!(expenses::new_expense(1, &m).is_err());

    let m = leaf(&[
        "spendclip", "expense", "add", "--category", "A", "--product", "B", "--cost=-1",
    ]);
    assert!(expenses::new_expense(1, &m).is_err());
}

#[test]
fn export_with_unknown_format_writes_nothing() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("report.xml");
    let out_str = out.to_string_lossy().to_string();
    let matches = cli::build_cli().get_matches_from([
        "spendclip", "export", "monthly", "--format", "xml", "--out", &out_str,
    ]);
    let ctx = commands::Context::new(Settings {
        user_id: Some(1),
        ..Default::default()
    })
    .unwrap();
    if let Some(("export", export_m)) = matches.subcommand() {
        let err = exporter::handle(&ctx, export_m).unwrap_err();
        assert!(err.to_string().contains("Unknown format"));
    } else {
        panic!("no export subcommand");
    }
    assert!(!out.exists());
}

#[derive(Serialize)]
struct Row {
    month: &'static str,
    total: String,
}

#[test]
fn write_rows_emits_csv_and_json() {
    let dir = tempdir().unwrap();
    let rows = vec![
        Row {
            month: "March",
            total: "150.00".into(),
        },
        Row {
            month: "February",
            total: "-2.50".into(),
        },
    ];

    let csv_path = dir.path().join("out.csv");
    exporter::write_rows(&rows, exporter::Format::parse("CSV").unwrap(), &csv_path).unwrap();
    let csv = std::fs::read_to_string(&csv_path).unwrap();
    assert_eq!(csv, "month,total\nMarch,150.00\nFebruary,-2.50\n");

    let json_path = dir.path().join("out.json");
    exporter::write_rows(&rows, exporter::Format::Json, &json_path).unwrap();
    let parsed: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(
        parsed,
        json!([
            {"month": "March", "total": "150.00"},
            {"month": "February", "total": "-2.50"}
        ])
    );
}

#[test]
fn doctor_flags_records_reports_would_ignore() {
    let raw = vec![
        json!({"id": 1, "cost": "abc", "month": 1, "year": 2024}),
        json!({"id": 2, "cost": 5}),
        json!("oops"),
        json!({"id": 4, "cost": "7.5", "month": "2", "year": "2024"}),
    ];
    let issues = doctor::inspect_expenses(&raw);
    let kinds: Vec<(&str, &str)> = issues
        .iter()
        .map(|i| (i.id.as_str(), i.kind))
        .collect();
    assert_eq!(
        kinds,
        vec![
            ("1", "amount_read_as_zero"),
            ("2", "no_period"),
            ("#2", "malformed_record"),
        ]
    );

    let clean = vec![json!({"amount": 10, "date": "2024-05-01"})];
    assert!(doctor::inspect_savings(&clean).is_empty());
    let undated = vec![json!({"id": "s1", "amount": 10})];
    assert_eq!(doctor::inspect_savings(&undated)[0].kind, "no_period");
}

fn product(name: &str, category: &str) -> Product {
    serde_json::from_value(json!({"product": name, "category": category})).unwrap()
}

#[test]
fn products_filter_by_category_case_insensitively() {
    let all = vec![
        product("Taxi", "Travel"),
        product("Bus", "travel"),
        product("Rice", "Food"),
    ];
    let names: Vec<String> = products::in_category(all.clone(), Some("TRAVEL"))
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(names, vec!["Bus", "Taxi"]);
    assert_eq!(products::in_category(all, None)[0].name, "Rice");
}

#[test]
fn monthly_rows_show_magnitude_and_standing() {
    let buckets = vec![
        PeriodBucket {
            year: 2024,
            month: "March",
            month_number: 3,
            income: Decimal::new(100, 0),
            expenses: Decimal::new(110, 0),
            savings: Decimal::ZERO,
            balance: Decimal::new(-10, 0),
        },
        PeriodBucket {
            year: 2024,
            month: "February",
            month_number: 2,
            income: Decimal::new(100, 0),
            expenses: Decimal::new(40, 0),
            savings: Decimal::new(10, 0),
            balance: Decimal::new(50, 0),
        },
    ];
    let rows = reports::monthly_rows(&buckets);
    assert_eq!(rows[0][5], "10.00");
    assert_eq!(rows[0][6], "deficit");
    assert_eq!(rows[1][5], "50.00");
    assert_eq!(rows[1][6], "surplus");
}
