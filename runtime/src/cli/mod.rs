// Copyright 2026 Reelsniff Contributors
// SPDX-License-Identifier: Apache-2.0

//! CLI subcommand implementations for the `reelsniff` binary.

pub mod doctor;
pub mod output;
pub mod play_cmd;
pub mod search_cmd;
pub mod select;
pub mod sniff_cmd;
pub mod sources_cmd;
