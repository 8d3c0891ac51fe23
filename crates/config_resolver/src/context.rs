//! Per-resolution bookkeeping.
//!
//! One `ResolutionContext` exists per top-level `resolve()` call and is
//! owned exclusively by it. It carries the active recursion stack used
//! for cycle detection and the fetch log used for TTL-based re-merge
//! suppression. Nothing here is shared across resolutions: concurrent
//! callers each construct their own context, so cache state can never
//! bleed between unrelated resolutions.

use std::collections::HashMap;
use std::time::{Duration, Instant};

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;

/// Ephemeral state for one import resolution run.
#[derive(Debug, Default)]
pub struct ResolutionContext {
    /// Identities currently being resolved, in recursion order. An
    /// identity reappearing here is an import cycle.
    stack: Vec<String>,

    /// When each identity was last fetched during this resolution.
    fetch_log: HashMap<String, Instant>,
}

impl ResolutionContext {
    /// Creates a fresh context with an empty stack and fetch log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when the identity is on the active recursion path.
    pub fn is_active(&self, identity: &str) -> bool {
        self.stack.iter().any(|entry| entry == identity)
    }

    /// Pushes an identity onto the active recursion path.
    pub fn push(&mut self, identity: String) {
        self.stack.push(identity);
    }

    /// Pops the most recent identity off the active recursion path.
    pub fn pop(&mut self) {
        self.stack.pop();
    }

    /// Current nesting depth of the resolution.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// The full cycle chain for diagnostics: every active identity in
    /// order, closed with the repeated identity.
    pub fn cycle_chain(&self, repeated: &str) -> Vec<String> {
        let mut chain = self.stack.clone();
        chain.push(repeated.to_string());
        chain
    }

    /// Records that an identity was fetched now.
    pub fn record_fetch(&mut self, identity: String) {
        self.fetch_log.insert(identity, Instant::now());
    }

    /// Returns true when the identity was fetched less than `ttl` ago
    /// during this resolution.
    pub fn fetched_within(&self, identity: &str, ttl: Duration) -> bool {
        self.fetch_log
            .get(identity)
            .map(|fetched_at| fetched_at.elapsed() < ttl)
            .unwrap_or(false)
    }
}
