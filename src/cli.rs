// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, value_parser};

fn json_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print as pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print one JSON object per line"),
    )
}

fn period_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("month")
            .long("month")
            .value_parser(value_parser!(u32).range(1..=12))
            .requires("year")
            .help("Month number, 1-12"),
    )
    .arg(
        Arg::new("year")
            .long("year")
            .value_parser(value_parser!(i32).range(1000..=9999))
            .help("Four-digit year"),
    )
}

fn id_arg() -> Arg {
    Arg::new("id")
        .long("id")
        .required(true)
        .value_parser(value_parser!(i64))
}

fn format_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("format")
            .long("format")
            .required(true)
            .help("csv or json"),
    )
    .arg(Arg::new("out").long("out").required(true).help("Output path"))
}

pub fn build_cli() -> Command {
    Command::new("spendclip")
        .version(clap::crate_version!())
        .about("Expense, income and savings reports over the tracker API")
        .arg(
            Arg::new("api-url")
                .long("api-url")
                .global(true)
                .help("Base URL of the tracker API"),
        )
        .arg(
            Arg::new("user")
                .long("user")
                .global(true)
                .help("Numeric user id"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::Count)
                .help("Raise log verbosity (-v info, -vv debug)"),
        )
        .subcommand(
            Command::new("expense")
                .about("Expenses")
                .subcommand(json_args(period_args(
                    Command::new("list")
                        .arg(Arg::new("category").long("category"))
                        .arg(
                            Arg::new("search")
                                .long("search")
                                .help("Regex matched against product and description"),
                        )
                        .arg(
                            Arg::new("limit")
                                .long("limit")
                                .value_parser(value_parser!(usize)),
                        ),
                )))
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("category").long("category").required(true))
                        .arg(Arg::new("product").long("product").required(true))
                        .arg(Arg::new("cost").long("cost").required(true))
                        .arg(Arg::new("date").long("date").help("YYYY-MM-DD, default today"))
                        .arg(
                            Arg::new("tax")
                                .long("tax")
                                .value_parser(["yes", "no"])
                                .default_value("no"),
                        )
                        .arg(Arg::new("tax-amount").long("tax-amount"))
                        .arg(Arg::new("description").long("description")),
                )
                .subcommand(Command::new("rm").arg(id_arg())),
        )
        .subcommand(
            Command::new("income")
                .about("Income sources")
                .subcommand(json_args(period_args(Command::new("list"))))
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("source").long("source").required(true))
                        .arg(Arg::new("amount").long("amount").required(true))
                        .arg(Arg::new("date").long("date")),
                )
                .subcommand(Command::new("rm").arg(id_arg())),
        )
        .subcommand(
            Command::new("saving")
                .about("Savings")
                .subcommand(json_args(period_args(Command::new("list"))))
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("amount").long("amount").required(true))
                        .arg(Arg::new("date").long("date"))
                        .arg(Arg::new("note").long("note")),
                )
                .subcommand(Command::new("rm").arg(id_arg())),
        )
        .subcommand(
            Command::new("category")
                .about("Expense categories")
                .subcommand(json_args(Command::new("list")))
                .subcommand(Command::new("add").arg(Arg::new("name").long("name").required(true)))
                .subcommand(Command::new("rm").arg(id_arg())),
        )
        .subcommand(
            Command::new("product")
                .about("Products within categories")
                .subcommand(json_args(
                    Command::new("list").arg(Arg::new("category").long("category")),
                ))
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("category").long("category").required(true))
                        .arg(Arg::new("name").long("name").required(true)),
                ),
        )
        .subcommand(
            Command::new("report")
                .about("Aggregated views")
                .subcommand(json_args(
                    Command::new("monthly")
                        .about("Income, expenses, savings and balance per month")
                        .arg(
                            Arg::new("year")
                                .long("year")
                                .value_parser(value_parser!(i32).range(1000..=9999)),
                        ),
                ))
                .subcommand(json_args(period_args(
                    Command::new("categories").about("Expense share per category"),
                )))
                .subcommand(json_args(period_args(
                    Command::new("tax").about("Tax on taxable expenses"),
                )))
                .subcommand(json_args(Command::new("yearly").about("Totals per year")))
                .subcommand(
                    Command::new("watch")
                        .about("Refresh the monthly report on an interval")
                        .arg(
                            Arg::new("interval")
                                .long("interval")
                                .value_parser(value_parser!(u64).range(1..))
                                .default_value("30")
                                .help("Seconds between refreshes"),
                        )
                        .arg(
                            Arg::new("count")
                                .long("count")
                                .value_parser(value_parser!(usize))
                                .help("Stop after this many refreshes"),
                        ),
                ),
        )
        .subcommand(
            Command::new("export")
                .about("Write reports to a file")
                .subcommand(format_args(
                    Command::new("monthly").arg(
                        Arg::new("year")
                            .long("year")
                            .value_parser(value_parser!(i32).range(1000..=9999)),
                    ),
                ))
                .subcommand(format_args(period_args(Command::new("categories")))),
        )
        .subcommand(
            Command::new("config")
                .about("Show or change saved settings")
                .subcommand(Command::new("show"))
                .subcommand(
                    Command::new("set")
                        .about("Save --api-url / --user / --timeout")
                        .arg(
                            Arg::new("timeout")
                                .long("timeout")
                                .value_parser(value_parser!(u64).range(1..)),
                        ),
                ),
        )
        .subcommand(Command::new("doctor").about("Check fetched data for records reports ignore"))
}
