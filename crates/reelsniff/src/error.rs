// Copyright 2026 Reelsniff Contributors
// SPDX-License-Identifier: Apache-2.0

//! Error types for page access and discovery runs.
//!
//! Almost every page failure is soft: the attempt controller logs it and
//! treats it as "no signal this tick". Only a lost browser connection is
//! fatal and aborts the whole run.

/// A failed interaction with the browser page.
#[derive(thiserror::Error, Debug)]
pub enum PageError {
    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("{operation} timed out after {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },

    /// The page stopped answering, typically behind a modal dialog.
    #[error("{0} did not answer before the tick deadline")]
    Stalled(String),

    #[error("script evaluation failed: {0}")]
    Script(String),

    #[error("frame {0} is gone")]
    FrameDetached(String),

    #[error("page operation failed: {0}")]
    Protocol(String),

    /// The browser connection itself is gone.
    #[error("browser disconnected: {0}")]
    Disconnected(String),
}

impl PageError {
    /// Whether this error should abort the discovery run instead of being swallowed.
    pub fn is_fatal(&self) -> bool {
        matches!(self, PageError::Disconnected(_))
    }
}

pub type PageResult<T> = Result<T, PageError>;

/// Run-level failures surfaced to the caller of discovery.
#[derive(thiserror::Error, Debug)]
pub enum SniffError {
    #[error("browser lost while trying {source_name}: {cause}")]
    BrowserLost {
        source_name: String,
        #[source]
        cause: PageError,
    },

    #[error("config error: {0}")]
    Config(String),
}
