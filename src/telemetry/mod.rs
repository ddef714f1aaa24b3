//! Retrieval telemetry
//!
//! In-process collector of per-query events. The orchestrator records into it
//! when one is attached; the CLI prints the summary.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use crate::types::Source;

/// Events kept before the oldest are dropped; stats still count every event
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// Retrieval event types
#[derive(Debug, Clone)]
pub enum RetrievalEvent {
    RetrievalCompleted {
        documents: usize,
        latency_ms: f64,
        timestamp: Instant,
    },
    /// A source answered with no candidates
    SourceEmpty {
        source: Source,
        timestamp: Instant,
    },
    SourceTimedOut {
        source: Source,
        timeout_ms: u64,
        timestamp: Instant,
    },
    RerankerFallback {
        reason: String,
        timestamp: Instant,
    },
}

/// Aggregate counters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetrievalStats {
    pub retrievals: usize,
    pub documents_returned: usize,
    pub total_latency_ms: f64,
    pub graph_empty: usize,
    pub keyword_empty: usize,
    pub source_timeouts: usize,
    pub reranker_fallbacks: usize,
}

impl RetrievalStats {
    pub fn mean_latency_ms(&self) -> f64 {
        if self.retrievals == 0 {
            0.0
        } else {
            self.total_latency_ms / self.retrievals as f64
        }
    }
}

/// Telemetry collector, cheap to clone and share
#[derive(Clone)]
pub struct RetrievalTelemetry {
    events: Arc<Mutex<VecDeque<RetrievalEvent>>>,
    capacity: usize,
    stats: Arc<Mutex<RetrievalStats>>,
    start_time: Instant,
}

// A panic while recording leaves plain counters behind, still readable
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl RetrievalTelemetry {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_EVENT_CAPACITY)
    }

    /// Collector that keeps at most `capacity` recent events
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: Arc::new(Mutex::new(VecDeque::new())),
            capacity,
            stats: Arc::new(Mutex::new(RetrievalStats::default())),
            start_time: Instant::now(),
        }
    }

    /// Record an event
    pub fn record(&self, event: RetrievalEvent) {
        {
            let mut stats = lock(&self.stats);
            match &event {
                RetrievalEvent::RetrievalCompleted {
                    documents,
                    latency_ms,
                    ..
                } => {
                    stats.retrievals += 1;
                    stats.documents_returned += documents;
                    stats.total_latency_ms += latency_ms;
                }
                RetrievalEvent::SourceEmpty { source, .. } => match source {
                    Source::Graph => stats.graph_empty += 1,
                    Source::Keyword => stats.keyword_empty += 1,
                },
                RetrievalEvent::SourceTimedOut { .. } => {
                    stats.source_timeouts += 1;
                }
                RetrievalEvent::RerankerFallback { .. } => {
                    stats.reranker_fallbacks += 1;
                }
            }
        }

        let mut events = lock(&self.events);
        if self.capacity == 0 {
            return;
        }
        while events.len() >= self.capacity {
            events.pop_front();
        }
        events.push_back(event);
    }

    pub fn stats(&self) -> RetrievalStats {
        lock(&self.stats).clone()
    }

    pub fn elapsed(&self) -> std::time::Duration {
        self.start_time.elapsed()
    }

    pub fn event_count(&self) -> usize {
        lock(&self.events).len()
    }

    /// Get recent events (last n)
    pub fn recent_events(&self, n: usize) -> Vec<RetrievalEvent> {
        let events = lock(&self.events);
        let start = events.len().saturating_sub(n);
        events.iter().skip(start).cloned().collect()
    }

    /// Multi-line human readable summary
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Retrievals:         {}\n\
             Documents returned: {}\n\
             Mean latency:       {:.1} ms\n\
             Empty graph side:   {}\n\
             Empty keyword side: {}\n\
             Source timeouts:    {}\n\
             Reranker fallbacks: {}",
            stats.retrievals,
            stats.documents_returned,
            stats.mean_latency_ms(),
            stats.graph_empty,
            stats.keyword_empty,
            stats.source_timeouts,
            stats.reranker_fallbacks,
        )
    }
}

impl Default for RetrievalTelemetry {
    fn default() -> Self {
        Self::new()
    }
}
