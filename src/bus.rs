//! Event bus and cancellable timers
//!
//! External events, timers and shutdown share one FIFO inbox. Events that
//! components publish go to a separate produced queue, which the
//! [`Engine`](crate::engine::Engine) drains completely before it takes the
//! next inbox envelope. A handler still runs to completion before anything it
//! published is seen, but nothing from outside can overtake its output.

use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::task::AbortHandle;
use tracing::trace;

use crate::error::{EngineError, Result};
use crate::events::{Event, Role};

/// Timer continuation delivered back into the mailbox
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// Materialize the pending order of `role` tagged `generation`
    PlacementDue { role: Role, generation: u64 },
    /// Fill the resting order of `role` tagged `generation`
    FillDue { role: Role, generation: u64 },
}

/// Unit of work in the mailbox
#[derive(Debug)]
pub enum Envelope {
    Event(Event),
    Timer(TimerEvent),
    Shutdown,
}

/// Handle to a scheduled timer
#[derive(Debug)]
pub struct TaskHandle {
    abort: AbortHandle,
}

impl TaskHandle {
    /// Cancel the timer. A no-op once it has fired.
    pub fn cancel(&self) {
        self.abort.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.abort.is_finished()
    }
}

/// Injected publish/subscribe handle
#[derive(Debug, Clone)]
pub struct EventBus {
    inbox: mpsc::UnboundedSender<Envelope>,
    produced: mpsc::UnboundedSender<Event>,
    observers: broadcast::Sender<Event>,
}

/// Receiving end of the bus, owned by the dispatcher
#[derive(Debug)]
pub struct Mailbox {
    inbox: mpsc::UnboundedReceiver<Envelope>,
    produced: mpsc::UnboundedReceiver<Event>,
}

impl EventBus {
    /// Create a bus whose observers may lag by at most `capacity` events
    pub fn new(capacity: usize) -> (Self, Mailbox) {
        let (inbox_tx, inbox) = mpsc::unbounded_channel();
        let (produced_tx, produced) = mpsc::unbounded_channel();
        let (observers, _) = broadcast::channel(capacity.max(1));
        (
            Self {
                inbox: inbox_tx,
                produced: produced_tx,
                observers,
            },
            Mailbox { inbox, produced },
        )
    }

    /// Queue a produced event for dispatch right after the current handler
    pub fn publish(&self, event: Event) {
        if self.produced.send(event).is_err() {
            trace!("Mailbox closed, event dropped");
        }
    }

    /// Subscribe to every dispatched event
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.observers.subscribe()
    }

    /// Deliver `timer` into the mailbox after `delay`
    pub fn schedule(&self, delay: Duration, timer: TimerEvent) -> TaskHandle {
        let tx = self.inbox.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(Envelope::Timer(timer));
        });
        TaskHandle {
            abort: task.abort_handle(),
        }
    }

    /// Enqueue an externally sourced event, failing once the dispatcher is gone
    pub(crate) fn submit(&self, event: Event) -> Result<()> {
        self.inbox
            .send(Envelope::Event(event))
            .map_err(|_| EngineError::ChannelClosed)
    }

    pub(crate) fn shutdown(&self) -> Result<()> {
        self.inbox
            .send(Envelope::Shutdown)
            .map_err(|_| EngineError::ChannelClosed)
    }

    pub(crate) fn notify_observers(&self, event: &Event) {
        // No subscribers is not an error
        let _ = self.observers.send(event.clone());
    }
}

impl Mailbox {
    /// Next envelope, produced events first
    pub async fn recv(&mut self) -> Option<Envelope> {
        if let Some(event) = self.next_produced() {
            return Some(Envelope::Event(event));
        }
        self.inbox.recv().await
    }

    pub fn try_recv(&mut self) -> Option<Envelope> {
        match self.next_produced() {
            Some(event) => Some(Envelope::Event(event)),
            None => self.inbox.try_recv().ok(),
        }
    }

    /// Pop the oldest event published by a handler, if any
    pub fn next_produced(&mut self) -> Option<Event> {
        self.produced.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_timer_delivers_after_delay() {
        let (bus, mut mailbox) = EventBus::new(16);
        let timer = TimerEvent::PlacementDue {
            role: Role::Yes,
            generation: 1,
        };
        let _handle = bus.schedule(Duration::from_millis(30), timer);

        assert!(mailbox.try_recv().is_none());
        match mailbox.recv().await {
            Some(Envelope::Timer(fired)) => assert_eq!(fired, timer),
            other => panic!("Expected timer, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_timer_never_fires() {
        let (bus, mut mailbox) = EventBus::new(16);
        let handle = bus.schedule(
            Duration::from_millis(30),
            TimerEvent::FillDue {
                role: Role::No,
                generation: 7,
            },
        );
        handle.cancel();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(mailbox.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_publish_is_fifo() {
        let (bus, mut mailbox) = EventBus::new(16);
        bus.publish(Event::MarketExpired { slug: "a".into() });
        bus.publish(Event::MarketExpired { slug: "b".into() });

        let slugs: Vec<String> = std::iter::from_fn(|| mailbox.try_recv())
            .filter_map(|env| match env {
                Envelope::Event(Event::MarketExpired { slug }) => Some(slug),
                _ => None,
            })
            .collect();
        assert_eq!(slugs, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_produced_events_overtake_inbox() {
        let (bus, mut mailbox) = EventBus::new(16);
        bus.submit(Event::MarketExpired {
            slug: "external".into(),
        })
        .unwrap();
        bus.publish(Event::MarketExpired {
            slug: "produced".into(),
        });

        assert!(matches!(
            mailbox.next_produced(),
            Some(Event::MarketExpired { slug }) if slug == "produced"
        ));
        assert!(mailbox.next_produced().is_none());
        assert!(matches!(
            mailbox.recv().await,
            Some(Envelope::Event(Event::MarketExpired { slug })) if slug == "external"
        ));
    }
}
