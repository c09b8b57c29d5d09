// Copyright 2026 Reelsniff Contributors
// SPDX-License-Identifier: Apache-2.0

//! `reelsniff search <QUERY...>`: print lookup results.

use crate::cli::output;
use crate::config::RuntimeConfig;
use crate::lookup::TitleLookup;
use anyhow::Result;

/// Run the search command.
pub async fn run(config: &RuntimeConfig, query: &str, json: bool) -> Result<()> {
    let lookup = TitleLookup::new(config.lookup.clone());
    let mut candidates = lookup.search(query).await;
    candidates.truncate(config.lookup.max_results);

    if json {
        output::print_json(&serde_json::to_value(&candidates)?);
        return Ok(());
    }

    if candidates.is_empty() {
        println!("No results found");
        return Ok(());
    }
    for candidate in &candidates {
        println!("{:<12} {}", candidate.id, candidate.label);
    }
    Ok(())
}
