// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod categories;
pub mod config;
pub mod doctor;
pub mod expenses;
pub mod exporter;
pub mod income;
pub mod products;
pub mod reports;
pub mod savings;

use crate::api::{ApiClient, DatasetFailure};
use crate::config::Settings;
use anyhow::Result;

/// Resolved settings plus the client built from them.
pub struct Context {
    pub settings: Settings,
    pub client: ApiClient,
}

impl Context {
    pub fn new(settings: Settings) -> Result<Self> {
        let client = ApiClient::new(&settings)?;
        Ok(Self { settings, client })
    }

    /// Saved settings, then environment, then the global flags.
    pub fn from_overrides(api_url: Option<&str>, user: Option<&str>) -> Result<Self> {
        let mut settings = crate::config::load()?;
        settings.apply_overrides(api_url, user)?;
        Self::new(settings)
    }

    pub fn user(&self) -> Result<i64> {
        Ok(self.settings.require_user()?)
    }
}

/// Tells the user which datasets are missing from what follows.
pub fn warn_failures(failures: &[DatasetFailure]) {
    for f in failures {
        eprintln!("warning: could not load {}: {}", f.dataset, f.reason);
    }
}
