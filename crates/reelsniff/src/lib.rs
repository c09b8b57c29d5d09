// Copyright 2026 Reelsniff Contributors
// SPDX-License-Identifier: Apache-2.0

//! Reelsniff stream discovery engine.
//!
//! Drives one browser page through an ordered list of embed sources and
//! watches its network traffic and rendered content until a direct media
//! resource (HLS playlist or progressive file) shows up. The browser itself
//! is abstracted behind [`page::BrowserPage`] so the engine can run against
//! Chromium in production and a scripted page in tests.

pub mod attempt;
pub mod config;
pub mod discovery;
pub mod error;
pub mod interact;
pub mod page;
pub mod progress;
pub mod signal;
pub mod slot;
pub mod sources;
pub mod types;

pub use attempt::{AttemptController, AttemptState};
pub use config::SniffConfig;
pub use discovery::Discovery;
pub use error::{PageError, PageResult, SniffError};
pub use page::{BrowserPage, FrameHandle, FrameNavigation, ObservedRequest};
pub use signal::SignalDetector;
pub use slot::ResultSlot;
pub use sources::{default_sources, Source};
pub use types::{AttemptOutcome, StreamDescriptor};
