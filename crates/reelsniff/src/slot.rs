// Copyright 2026 Reelsniff Contributors
// SPDX-License-Identifier: Apache-2.0

//! Single-assignment result slot shared by the request observer and the poll loop.

use crate::types::StreamDescriptor;
use std::time::Duration;
use tokio::sync::{Notify, OnceCell};

/// Holds the first stream any producer reports during one attempt.
///
/// The first `resolve` wins; later calls are discarded. There is a single
/// consumer (the poll loop), so `notify_one` is enough: a resolve that lands
/// before the consumer starts waiting leaves a permit behind.
#[derive(Debug, Default)]
pub struct ResultSlot {
    cell: OnceCell<StreamDescriptor>,
    notify: Notify,
}

impl ResultSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `stream` unless the slot already holds one. Returns `true` if this call won.
    pub fn resolve(&self, stream: StreamDescriptor) -> bool {
        let won = self.cell.set(stream).is_ok();
        if won {
            self.notify.notify_one();
        }
        won
    }

    /// The resolved stream, if any.
    pub fn get(&self) -> Option<StreamDescriptor> {
        self.cell.get().cloned()
    }

    pub fn is_resolved(&self) -> bool {
        self.cell.initialized()
    }

    /// Wait up to `window` for the slot to resolve.
    pub async fn wait_for(&self, window: Duration) -> Option<StreamDescriptor> {
        if let Some(found) = self.get() {
            return Some(found);
        }
        let _ = tokio::time::timeout(window, self.notify.notified()).await;
        self.get()
    }
}
