// Copyright 2026 Reelsniff Contributors
// SPDX-License-Identifier: Apache-2.0

//! `reelsniff sources`: list the source registry in attempt order.

use crate::cli::output;
use crate::config::RuntimeConfig;
use anyhow::Result;

/// Run the sources command.
pub fn run(config: &RuntimeConfig, json: bool) -> Result<()> {
    let sources = &config.sniff.sources;

    if json {
        output::print_json(&serde_json::to_value(sources)?);
        return Ok(());
    }

    if sources.is_empty() {
        println!("No sources configured.");
        return Ok(());
    }
    let width = sources.iter().map(|s| s.name.len()).max().unwrap_or(0);
    for (i, source) in sources.iter().enumerate() {
        println!("{:>2}. {:<width$}  {}", i + 1, source.name, source.url);
    }
    Ok(())
}
