// Copyright 2026 Reelsniff Contributors
// SPDX-License-Identifier: Apache-2.0

//! `reelsniff play`: search, pick, sniff, play.

use crate::cli::{output, select, sniff_cmd};
use crate::config::RuntimeConfig;
use crate::lookup::{display_title, TitleLookup};
use crate::player;
use anyhow::Result;

/// What to play: a free-text query, or a known identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayTarget {
    Query(String),
    Identifier(String),
}

/// Run the play command.
pub async fn run(config: &RuntimeConfig, target: PlayTarget, pick: Option<usize>) -> Result<()> {
    // No point sniffing a stream nobody can play.
    player::ensure_player_installed(&config.player)?;

    let (identifier, title) = match target {
        PlayTarget::Identifier(id) => (id.clone(), id),
        PlayTarget::Query(query) => {
            output::status("Searching IMDb...");
            let lookup = TitleLookup::new(config.lookup.clone());
            let mut candidates = lookup.search(&query).await;
            if candidates.is_empty() {
                println!("No results found");
                return Ok(());
            }
            candidates.truncate(config.lookup.max_results);

            select::print_candidates(&candidates);
            let Some(choice) = select::choose(&candidates, pick).await? else {
                tracing::debug!("selection cancelled");
                return Ok(());
            };
            (choice.id.clone(), display_title(&choice.label).to_string())
        }
    };

    match sniff_cmd::discover_stream(config, &identifier).await? {
        Some(stream) => player::play(&stream, &title, &config.player).await,
        // The spinner already reported "All sources failed."
        None => Ok(()),
    }
}

/// Prompt for a query when none was given on the command line.
///
/// Fails before prompting when the player is missing.
pub async fn prompt_query(config: &RuntimeConfig) -> Result<Option<String>> {
    player::ensure_player_installed(&config.player)?;
    Ok(select::prompt_line("Search Movie")
        .await?
        .filter(|q| !q.is_empty()))
}
