// Copyright 2026 Reelsniff Contributors
// SPDX-License-Identifier: Apache-2.0

//! `reelsniff sniff <ID>`: run discovery only and print the stream.

use crate::cli::output;
use crate::config::RuntimeConfig;
use crate::renderer::chromium::ChromiumSession;
use anyhow::Result;
use reelsniff::{progress, Discovery, StreamDescriptor};

/// Launch a browser, walk the source registry for `identifier`, close the browser.
///
/// The browser is shut down whether or not discovery succeeded.
pub async fn discover_stream(config: &RuntimeConfig, identifier: &str) -> Result<Option<StreamDescriptor>> {
    output::status("Launching browser...");
    let session = ChromiumSession::launch(&config.browser).await?;
    let page = session.page();

    let (tx, rx) = progress::channel();
    let spinner = output::spawn_spinner(rx);
    let discovery = Discovery::new(config.sniff.clone()).with_progress(tx);

    let outcome = discovery.discover(&page, identifier).await;
    drop(discovery);
    let _ = spinner.await;

    drop(page);
    if let Err(e) = session.shutdown().await {
        tracing::warn!("browser shutdown: {e:#}");
    }

    Ok(outcome?)
}

/// Run the sniff command.
pub async fn run(config: &RuntimeConfig, identifier: &str, json: bool) -> Result<()> {
    let stream = discover_stream(config, identifier).await?;

    match (stream, json) {
        (Some(stream), true) => {
            let mut value = serde_json::to_value(&stream)?;
            value["kind"] = stream_kind(&stream).into();
            output::print_json(&value)
        }
        (Some(stream), false) => {
            println!("url:        {}", stream.url);
            println!("kind:       {}", stream_kind(&stream));
            println!("referer:    {}", or_dash(&stream.referer));
            println!("user-agent: {}", or_dash(&stream.user_agent));
            println!("cookie:     {}", or_dash(&stream.cookie));
        }
        (None, true) => output::print_json(&serde_json::json!({
            "identifier": identifier,
            "stream": null,
        })),
        (None, false) => anyhow::bail!("no stream found for {identifier}"),
    }
    Ok(())
}

fn stream_kind(stream: &StreamDescriptor) -> &'static str {
    if stream.is_playlist() {
        "hls"
    } else {
        "progressive"
    }
}

fn or_dash(value: &str) -> &str {
    if value.is_empty() {
        "-"
    } else {
        value
    }
}
