// Copyright 2026 Reelsniff Contributors
// SPDX-License-Identifier: Apache-2.0

//! Interactive prompts: the search query and the candidate number.

use crate::lookup::TitleCandidate;
use anyhow::{Context, Result};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

/// Read one line from the terminal. `None` on Ctrl+C or Ctrl+D.
pub async fn prompt_line(label: &str) -> Result<Option<String>> {
    let prompt = format!("{label}: ");
    tokio::task::spawn_blocking(move || {
        let mut rl = DefaultEditor::new()?;
        match rl.readline(&prompt) {
            Ok(line) => Ok(Some(line.trim().to_string())),
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(None),
            Err(err) => Err(err),
        }
    })
    .await
    .context("prompt task panicked")?
    .context("failed to read from terminal")
}

/// Turn a 1-based choice into an index into `count` candidates.
pub fn parse_choice(input: &str, count: usize) -> Option<usize> {
    let n: usize = input.trim().parse().ok()?;
    (1..=count).contains(&n).then(|| n - 1)
}

/// Print the numbered candidate list.
pub fn print_candidates(candidates: &[TitleCandidate]) {
    println!();
    println!("Select Movie:");
    for (i, candidate) in candidates.iter().enumerate() {
        println!("{}. {}", i + 1, candidate.label);
    }
}

/// Pick a candidate, from `--pick` if given or else by asking.
///
/// `None` means the selection was cancelled or invalid.
pub async fn choose(candidates: &[TitleCandidate], pick: Option<usize>) -> Result<Option<&TitleCandidate>> {
    let index = match pick {
        Some(n) => parse_choice(&n.to_string(), candidates.len()),
        None => match prompt_line("Number").await? {
            Some(input) => parse_choice(&input, candidates.len()),
            None => None,
        },
    };
    Ok(index.map(|i| &candidates[i]))
}
