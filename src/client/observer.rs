// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Attempt progress reporting

/// Receives one notification per request attempt
pub trait AttemptObserver: Send + Sync {
    /// Called before attempt `attempt` of `max_attempts` is sent
    fn on_attempt(&self, attempt: u32, max_attempts: u32);
}

/// Observer that ignores every notification
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl AttemptObserver for NoopObserver {
    fn on_attempt(&self, _attempt: u32, _max_attempts: u32) {}
}

impl<F> AttemptObserver for F
where
    F: Fn(u32, u32) + Send + Sync,
{
    fn on_attempt(&self, attempt: u32, max_attempts: u32) {
        self(attempt, max_attempts)
    }
}
