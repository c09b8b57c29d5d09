// Copyright 2026 Reelsniff Contributors
// SPDX-License-Identifier: Apache-2.0

//! Environment readiness check.

use crate::config::RuntimeConfig;
use crate::player;
use crate::renderer::find_chromium;
use anyhow::Result;
use std::path::Path;

/// Check the player binary, Chromium availability and the config in use.
pub async fn run(config: &RuntimeConfig, config_path: Option<&Path>) -> Result<()> {
    println!("Reelsniff Doctor");
    println!("================");
    println!();

    let os = std::env::consts::OS;
    let arch = std::env::consts::ARCH;
    println!("OS:   {os}");
    println!("Arch: {arch}");
    println!();

    let player_path = player::ensure_player_installed(&config.player).ok();
    match &player_path {
        Some(path) => println!("[OK] Player found: {}", path.display()),
        None => println!(
            "[!!] Player `{}` NOT found. Install mpv or set player.binary in the config.",
            config.player.binary
        ),
    }

    let chromium_path = config.browser.executable.clone().or_else(find_chromium);
    match &chromium_path {
        Some(path) => println!("[OK] Chromium found: {}", path.display()),
        None => println!("[!!] Chromium NOT found. Install Chrome/Chromium or set REELSNIFF_CHROMIUM_PATH."),
    }

    match config_path {
        Some(path) => println!("[OK] Config: {}", path.display()),
        None => println!("[OK] Config: built-in defaults"),
    }
    println!(
        "     Profile dir: {}",
        config.browser.profile_dir.display()
    );
    println!("     Sources: {}", config.sniff.sources.len());

    println!();
    if player_path.is_some() && chromium_path.is_some() {
        println!("Status: READY");
    } else {
        println!("Status: NOT READY");
    }

    Ok(())
}
