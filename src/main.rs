// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;

use spendclip::{cli, commands, utils};

fn main() -> Result<()> {
    let cli = cli::build_cli();
    let matches = cli.get_matches();

    utils::init_tracing(matches.get_count("verbose"));
    let api_url = matches.get_one::<String>("api-url").map(String::as_str);
    let user = matches.get_one::<String>("user").map(String::as_str);

    if let Some(("config", sub)) = matches.subcommand() {
        return commands::config::handle(sub, api_url, user);
    }

    let Some((name, sub)) = matches.subcommand() else {
        cli::build_cli().print_help()?;
        println!();
        return Ok(());
    };
    let ctx = commands::Context::from_overrides(api_url, user)?;
    match name {
        "expense" => commands::expenses::handle(&ctx, sub)?,
        "income" => commands::income::handle(&ctx, sub)?,
        "saving" => commands::savings::handle(&ctx, sub)?,
        "category" => commands::categories::handle(&ctx, sub)?,
        "product" => commands::products::handle(&ctx, sub)?,
        "report" => commands::reports::handle(&ctx, sub)?,
        "export" => commands::exporter::handle(&ctx, sub)?,
        "doctor" => commands::doctor::handle(&ctx)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
