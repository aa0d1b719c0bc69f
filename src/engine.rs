//! Run-to-completion dispatcher
//!
//! Owns the mailbox and every component. Each envelope is fully handled by
//! all components before the next one is taken, which is what keeps book,
//! inventory and slot mutation free of locks. Everything the components
//! publish while handling it is dispatched before the next envelope too, so
//! a quote can never land after a lifecycle event that was already queued.

use tokio::sync::broadcast;
use tracing::{info, info_span};

use crate::bus::{Envelope, EventBus, Mailbox};
use crate::config::Config;
use crate::error::Result;
use crate::events::Event;
use crate::metrics::EngineMetrics;
use crate::orderbook::ArbitrageAnalyzer;
use crate::quoting::{QuoteEngine, QuoteParams};
use crate::simulator::{LatencyModel, SimulatedOrderManager};

/// Cloneable handle for feeding the engine from outside
#[derive(Debug, Clone)]
pub struct EngineHandle {
    bus: EventBus,
}

impl EngineHandle {
    /// Submit a feed or lifecycle event
    pub fn submit(&self, event: Event) -> Result<()> {
        self.bus.submit(event)
    }

    /// Observe every dispatched event, external and produced
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Stop the engine once everything queued so far is dispatched
    pub fn shutdown(&self) -> Result<()> {
        self.bus.shutdown()
    }
}

pub struct Engine {
    bus: EventBus,
    mailbox: Mailbox,
    metrics: EngineMetrics,
    analyzer: ArbitrageAnalyzer,
    quoter: QuoteEngine,
    orders: SimulatedOrderManager,
}

impl Engine {
    pub fn new(config: &Config, metrics: EngineMetrics) -> (Self, EngineHandle) {
        let (bus, mailbox) = EventBus::new(config.event_buffer);

        let analyzer = ArbitrageAnalyzer::new(bus.clone(), info_span!("arbitrage"));
        let quoter = QuoteEngine::new(
            bus.clone(),
            info_span!("quoting"),
            QuoteParams {
                risk_factor: config.risk_factor,
                spread_margin: config.spread_margin,
            },
        );
        let orders = SimulatedOrderManager::new(
            bus.clone(),
            info_span!("simulator"),
            LatencyModel::new(config.latency_min_ms, config.latency_max_ms),
            config.order_size,
        );

        let handle = EngineHandle { bus: bus.clone() };
        let engine = Self {
            bus,
            mailbox,
            metrics,
            analyzer,
            quoter,
            orders,
        };
        (engine, handle)
    }

    /// Dispatch until shutdown is requested
    pub async fn run(mut self) -> Result<()> {
        info!("Engine started");
        while let Some(envelope) = self.mailbox.recv().await {
            if !self.dispatch(envelope) {
                break;
            }
        }
        info!("Engine stopped");
        Ok(())
    }

    /// Handle one envelope and its produced events; `false` once shutdown is reached
    fn dispatch(&mut self, envelope: Envelope) -> bool {
        match envelope {
            Envelope::Event(event) => self.dispatch_event(&event),
            Envelope::Timer(timer) => self.orders.on_timer(timer),
            Envelope::Shutdown => return false,
        }
        while let Some(event) = self.mailbox.next_produced() {
            self.dispatch_event(&event);
        }
        true
    }

    fn dispatch_event(&mut self, event: &Event) {
        self.metrics.observe(event);
        self.bus.notify_observers(event);
        self.analyzer.handle(event);
        self.quoter.handle(event);
        self.orders.handle(event);
    }
}
