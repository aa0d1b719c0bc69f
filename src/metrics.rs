//! Prometheus counters for dispatched events and rejected feed input

use prometheus::{IntCounter, IntCounterVec, Opts, Registry};

use crate::error::Result;
use crate::events::Event;

#[derive(Debug, Clone)]
pub struct EngineMetrics {
    events: IntCounterVec,
    rejected_inputs: IntCounter,
}

impl EngineMetrics {
    pub fn new() -> Result<Self> {
        Ok(Self {
            events: IntCounterVec::new(
                Opts::new("paper_maker_events_total", "Events dispatched by kind"),
                &["kind"],
            )?,
            rejected_inputs: IntCounter::new(
                "paper_maker_rejected_inputs_total",
                "Feed messages, levels or deltas dropped as malformed",
            )?,
        })
    }

    /// Register with `registry`, usually `prometheus::default_registry()`
    pub fn register(&self, registry: &Registry) -> Result<()> {
        registry.register(Box::new(self.events.clone()))?;
        registry.register(Box::new(self.rejected_inputs.clone()))?;
        Ok(())
    }

    pub fn observe(&self, event: &Event) {
        self.events.with_label_values(&[event.kind()]).inc();
    }

    pub fn reject_inputs(&self, count: u64) {
        self.rejected_inputs.inc_by(count);
    }

    pub fn events_total(&self, kind: &str) -> u64 {
        self.events.with_label_values(&[kind]).get()
    }

    pub fn rejected_total(&self) -> u64 {
        self.rejected_inputs.get()
    }
}
