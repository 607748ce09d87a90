//! Concurrent provider resolution with last-request-wins semantics
//!
//! Every resolution is tagged with a sequence number taken from a
//! [`ProviderAggregator`]. Starting a new resolution makes every earlier one
//! stale; stale results are discarded where they would be applied rather
//! than cancelled, so providers always run to completion.

use futures::future::join_all;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::provider::{Provider, SearchContext};
use crate::types::CommandEntry;

/// A resolution that has been started but not yet run
pub struct ResolveRequest {
    seq: u64,
    context: SearchContext,
    providers: Vec<Arc<dyn Provider>>,
}

impl ResolveRequest {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn context(&self) -> &SearchContext {
        &self.context
    }

    /// Query every provider concurrently and merge in provider order.
    ///
    /// A failing provider contributes nothing.
    pub async fn run(self) -> ResolvedBatch {
        let results = join_all(self.providers.iter().map(|p| p.provide(&self.context))).await;

        let mut entries = Vec::new();
        let mut failures = Vec::new();
        for result in results {
            match result {
                Ok(found) => entries.extend(found),
                Err(e) => {
                    warn!(seq = self.seq, namespace = %self.context.namespace, error = %e, "Provider failed");
                    failures.push(e.to_string());
                }
            }
        }

        debug!(
            seq = self.seq,
            namespace = %self.context.namespace,
            entries = entries.len(),
            failures = failures.len(),
            "Resolution settled"
        );
        ResolvedBatch {
            seq: self.seq,
            context: self.context,
            entries,
            failures,
        }
    }
}

impl fmt::Debug for ResolveRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolveRequest")
            .field("seq", &self.seq)
            .field("context", &self.context)
            .field("providers", &self.providers.len())
            .finish()
    }
}

/// Merged output of one resolution
#[derive(Debug, Clone)]
pub struct ResolvedBatch {
    pub seq: u64,
    pub context: SearchContext,
    pub entries: Vec<CommandEntry>,
    /// Error messages of providers that failed
    pub failures: Vec<String>,
}

/// Issues sequence numbers and tells current resolutions from stale ones
#[derive(Debug, Default)]
pub struct ProviderAggregator {
    latest: u64,
}

impl ProviderAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a resolution over the providers answering `context.namespace`.
    ///
    /// Every resolution begun earlier becomes stale.
    pub fn begin(&mut self, context: SearchContext, providers: &[Arc<dyn Provider>]) -> ResolveRequest {
        self.latest += 1;
        let providers: Vec<Arc<dyn Provider>> = providers
            .iter()
            .filter(|p| p.namespace() == context.namespace)
            .cloned()
            .collect();
        debug!(
            seq = self.latest,
            namespace = %context.namespace,
            search = %context.search_value,
            providers = providers.len(),
            "Resolution started"
        );
        ResolveRequest {
            seq: self.latest,
            context,
            providers,
        }
    }

    /// Make every outstanding resolution stale without starting a new one
    pub fn invalidate(&mut self) {
        self.latest += 1;
    }

    pub fn is_current(&self, seq: u64) -> bool {
        seq == self.latest
    }

    pub fn latest(&self) -> u64 {
        self.latest
    }

    /// Pass `batch` through when it is current, drop it otherwise
    pub fn accept(&self, batch: ResolvedBatch) -> Option<ResolvedBatch> {
        if self.is_current(batch.seq) {
            Some(batch)
        } else {
            debug!(seq = batch.seq, latest = self.latest, "Stale resolution dropped");
            None
        }
    }

    /// Begin and run in one step
    pub async fn resolve(
        &mut self,
        context: SearchContext,
        providers: &[Arc<dyn Provider>],
    ) -> Option<ResolvedBatch> {
        let batch = self.begin(context, providers).run().await;
        self.accept(batch)
    }
}
