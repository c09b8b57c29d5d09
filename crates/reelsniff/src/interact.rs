// Copyright 2026 Reelsniff Contributors
// SPDX-License-Identifier: Apache-2.0

//! Interaction heuristics that coax a player into requesting its stream.

use crate::config::SniffConfig;
use crate::error::{PageError, PageResult};
use crate::page::{within, BrowserPage};
use tokio::time::Instant;

/// What one round of interaction managed to do.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InteractionReport {
    pub center_clicked: bool,
    pub frames_seen: usize,
    pub scripts_run: usize,
    pub controls_clicked: usize,
    pub failures: usize,
}

/// Run one round: click the viewport center, then in every attached frame
/// try to start `<video>` playback and click one play-like control.
///
/// Each action fails independently. Only a fatal page error (the browser is
/// gone) is returned; everything else is counted and logged. Actions still
/// pending at `deadline` count as failures, so a page frozen by a dialog
/// costs one read budget per round rather than one CDP timeout per action.
pub async fn poke(
    page: &dyn BrowserPage,
    config: &SniffConfig,
    deadline: Instant,
) -> PageResult<InteractionReport> {
    let mut report = InteractionReport::default();

    match within(deadline, "center click", center_click(page)).await {
        Ok(()) => report.center_clicked = true,
        Err(e) => soft(e, "center click", &mut report)?,
    }

    let frames = match within(deadline, "frame listing", page.frames()).await {
        Ok(frames) => frames,
        Err(e) => {
            soft(e, "frame listing", &mut report)?;
            return Ok(report);
        }
    };
    report.frames_seen = frames.len();

    for frame in &frames {
        match within(
            deadline,
            "play script",
            page.evaluate_in_frame(frame, &config.play_script),
        )
        .await
        {
            Ok(()) => report.scripts_run += 1,
            Err(e) => soft(e, "play script", &mut report)?,
        }
        match within(
            deadline,
            "play control click",
            page.click_in_frame(frame, &config.play_selector, config.click_timeout()),
        )
        .await
        {
            Ok(true) => report.controls_clicked += 1,
            Ok(false) => {}
            Err(e) => soft(e, "play control click", &mut report)?,
        }
    }

    Ok(report)
}

async fn center_click(page: &dyn BrowserPage) -> PageResult<()> {
    let (width, height) = page.viewport().await?;
    page.click_at(width / 2.0, height / 2.0).await
}

fn soft(err: PageError, action: &str, report: &mut InteractionReport) -> PageResult<()> {
    if err.is_fatal() {
        return Err(err);
    }
    tracing::debug!("interaction: {action} failed: {err}");
    report.failures += 1;
    Ok(())
}
