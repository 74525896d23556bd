// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::Context;
use crate::api::NewCategory;
use crate::utils::{json_flags, maybe_print_json, pretty_table};
use anyhow::{Result, bail};

pub fn handle(ctx: &Context, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap().trim().to_string();
            if name.is_empty() {
                bail!("Category name must not be empty");
            }
            ctx.client.add_category(&NewCategory {
                user_id: ctx.user()?,
                category: name.clone(),
            })?;
            println!("Added category '{}'", name);
        }
        Some(("list", sub)) => {
            let (json_flag, jsonl_flag) = json_flags(sub);
            let mut cats = match ctx.client.categories(ctx.user()?) {
                Ok(c) => c,
                Err(err) => {
                    tracing::error!(error = %err, "category fetch failed");
                    eprintln!("warning: could not load categories: {}", err);
                    Vec::new()
                }
            };
            cats.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
            if !maybe_print_json(json_flag, jsonl_flag, &cats)? {
                let data = cats
                    .into_iter()
                    .map(|c| vec![c.id.map(|i| i.to_string()).unwrap_or_default(), c.name])
                    .collect();
                println!("{}", pretty_table(&["Id", "Category"], data));
            }
        }
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            ctx.client.delete_category(id)?;
            println!("Removed category {}", id);
        }
        _ => {}
    }
    Ok(())
}
