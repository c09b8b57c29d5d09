// Copyright 2026 Reelsniff Contributors
// SPDX-License-Identifier: Apache-2.0

//! Progress event types and broadcast channel for discovery runs.
//!
//! The orchestrator emits `ProgressEvent`s as it works through the source
//! registry. They flow through a `tokio::sync::broadcast` channel to any
//! subscriber (the CLI spinner, a JSON printer). With no subscriber the
//! events are dropped.

use serde::{Deserialize, Serialize};

/// A progress event emitted during discovery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// The discovery run this event belongs to.
    pub run_id: String,
    /// Monotonically increasing sequence number.
    pub seq: u64,
    pub event: ProgressEventKind,
}

/// The specific kind of progress event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ProgressEventKind {
    /// Discovery began for an identifier.
    DiscoveryStarted { identifier: String, sources: usize },
    /// A source is about to be attempted.
    SourceStarted {
        name: String,
        index: usize,
        total: usize,
    },
    /// A source ran out of ticks without yielding a stream.
    SourceFailed {
        name: String,
        ticks: u32,
        elapsed_ms: u64,
    },
    /// A source yielded a stream; discovery stops here.
    StreamFound {
        name: String,
        url: String,
        elapsed_ms: u64,
    },
    /// Every source was tried and none worked.
    DiscoveryExhausted { attempted: usize },
    /// A non-fatal warning occurred.
    Warning { message: String },
}

/// Sender handle for emitting progress events.
pub type ProgressSender = tokio::sync::broadcast::Sender<ProgressEvent>;

/// Receiver handle for consuming progress events.
pub type ProgressReceiver = tokio::sync::broadcast::Receiver<ProgressEvent>;

/// Create a new progress broadcast channel.
///
/// A run emits two events per source plus a couple of bookends, so 64 is plenty.
pub fn channel() -> (ProgressSender, ProgressReceiver) {
    tokio::sync::broadcast::channel(64)
}

/// Emit a progress event, ignoring send errors (no receivers listening).
pub fn emit(tx: &Option<ProgressSender>, run_id: &str, seq: &mut u64, event: ProgressEventKind) {
    if let Some(ref sender) = tx {
        *seq += 1;
        let _ = sender.send(ProgressEvent {
            run_id: run_id.to_string(),
            seq: *seq,
            event,
        });
    }
}
