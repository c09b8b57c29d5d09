// Copyright 2026 Reelsniff Contributors
// SPDX-License-Identifier: Apache-2.0

//! Reelsniff runtime: Chromium page, title lookup, player hand-off and CLI.
//!
//! The discovery engine itself lives in the `reelsniff` crate; this crate
//! wires it to a real browser and to the outside world.

pub mod cli;
pub mod config;
pub mod lookup;
pub mod player;
pub mod renderer;
