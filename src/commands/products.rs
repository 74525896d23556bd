// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::Context;
use crate::api::NewProduct;
use crate::models::Product;
use crate::utils::{json_flags, maybe_print_json, pretty_table};
use anyhow::{Result, bail};

pub fn handle(ctx: &Context, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let category = sub.get_one::<String>("category").unwrap().trim().to_string();
            let name = sub.get_one::<String>("name").unwrap().trim().to_string();
            if category.is_empty() || name.is_empty() {
                bail!("Product and category names must not be empty");
            }
            ctx.client.add_product(&NewProduct {
                user_id: ctx.user()?,
                category: category.clone(),
                product: name.clone(),
            })?;
            println!("Added product '{}' under '{}'", name, category);
        }
        Some(("list", sub)) => {
            let (json_flag, jsonl_flag) = json_flags(sub);
            let products = match ctx.client.products(ctx.user()?) {
                Ok(p) => p,
                Err(err) => {
                    tracing::error!(error = %err, "product fetch failed");
                    eprintln!("warning: could not load products: {}", err);
                    Vec::new()
                }
            };
            let data = in_category(products, sub.get_one::<String>("category").map(|s| s.as_str()));
            if !maybe_print_json(json_flag, jsonl_flag, &data)? {
                let rows = data
                    .into_iter()
                    .map(|p| vec![p.category, p.name])
                    .collect();
                println!("{}", pretty_table(&["Category", "Product"], rows));
            }
        }
        _ => {}
    }
    Ok(())
}

/// Case-insensitive category filter, sorted by category then name.
pub fn in_category(products: Vec<Product>, category: Option<&str>) -> Vec<Product> {
    let mut out: Vec<Product> = products
        .into_iter()
        .filter(|p| category.is_none_or(|c| p.category.trim().eq_ignore_ascii_case(c.trim())))
        .collect();
    out.sort_by(|a, b| {
        a.category
            .to_lowercase()
            .cmp(&b.category.to_lowercase())
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });
    out
}
