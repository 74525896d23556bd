// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config::{self, Settings, parse_user_id};
use crate::utils::pretty_table;
use anyhow::Result;
use std::path::Path;

pub fn handle(m: &clap::ArgMatches, api_url: Option<&str>, user: Option<&str>) -> Result<()> {
    let path = config::config_path()?;
    match m.subcommand() {
        Some(("show", _)) => {
            let mut settings = config::load()?;
            settings.apply_overrides(api_url, user)?;
            println!("{}", render(&settings, &path));
        }
        Some(("set", sub)) => {
            let timeout = sub.get_one::<u64>("timeout").copied();
            let saved = set(&path, api_url, user, timeout)?;
            println!("Saved settings to {}", path.display());
            println!("{}", render(&saved, &path));
        }
        _ => {}
    }
    Ok(())
}

/// Merges the given values into the file at `path`; values left as `None`
/// keep what was saved.
pub fn set(
    path: &Path,
    api_url: Option<&str>,
    user: Option<&str>,
    timeout: Option<u64>,
) -> Result<Settings> {
    if api_url.is_none() && user.is_none() && timeout.is_none() {
        anyhow::bail!("Nothing to set; pass --api-url, --user or --timeout");
    }
    let mut settings = config::load_from(path)?;
    if let Some(url) = api_url {
        settings.api_url = url.trim().trim_end_matches('/').to_string();
    }
    if let Some(raw) = user {
        settings.user_id = Some(parse_user_id(raw)?);
    }
    if let Some(t) = timeout {
        settings.timeout_secs = t;
    }
    config::save_to(path, &settings)?;
    Ok(settings)
}

fn render(settings: &Settings, path: &Path) -> comfy_table::Table {
    pretty_table(
        &["Setting", "Value"],
        vec![
            vec!["file".into(), path.display().to_string()],
            vec!["api_url".into(), settings.api_url.clone()],
            vec![
                "user".into(),
                settings
                    .user_id
                    .map(|u| u.to_string())
                    .unwrap_or_else(|| "(unset)".into()),
            ],
            vec!["timeout_secs".into(), settings.timeout_secs.to_string()],
        ],
    )
}
