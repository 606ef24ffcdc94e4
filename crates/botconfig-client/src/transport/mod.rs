//! Duplex message transport.
//!
//! A [`Connector`] opens a [`TransportLink`] for one connection attempt and
//! reports everything that happens on it through a [`TransportSink`]. Each
//! sink is tagged with the generation of the attempt, so the connection
//! actor can discard events from links it has already abandoned.

pub mod websocket;

#[cfg(test)]
pub(crate) mod mock;

use tokio::sync::mpsc;

pub use websocket::WsConnector;

/// Everything needed to open a link.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectRequest {
    /// Target URL.
    pub url: String,
    /// Extra headers sent on the upgrade request.
    pub headers: Vec<(String, String)>,
}

/// What happened on a link.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransportEvent {
    /// The link is open and can carry messages.
    Opened,
    /// A text frame arrived.
    Message(String),
    /// A transport-level failure. Followed by `Closed` when fatal.
    Error(String),
    /// The link is gone.
    Closed,
}

/// A [`TransportEvent`] together with the generation of its link.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaggedEvent {
    /// Generation of the connection attempt that produced the event.
    pub generation: u64,
    /// The event.
    pub event: TransportEvent,
}

/// Where a link reports its events.
#[derive(Clone, Debug)]
pub struct TransportSink {
    generation: u64,
    tx: mpsc::UnboundedSender<TaggedEvent>,
}

impl TransportSink {
    /// Sink tagging every event with `generation`.
    pub fn new(generation: u64, tx: mpsc::UnboundedSender<TaggedEvent>) -> Self {
        Self { generation, tx }
    }

    /// Generation of the owning link.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Report an event. Returns `false` once the receiver is gone.
    pub fn emit(&self, event: TransportEvent) -> bool {
        self.tx
            .send(TaggedEvent {
                generation: self.generation,
                event,
            })
            .is_ok()
    }
}

/// Handle to an open or opening link.
pub trait TransportLink: Send {
    /// Queue a text frame. Returns `false` if the link can no longer send.
    fn send(&self, text: String) -> bool;

    /// Close the link. Events emitted afterwards carry a stale generation.
    fn close(&mut self);
}

/// Opens links.
pub trait Connector: Send + Sync + 'static {
    /// Start opening a link. Completion or failure is reported via `sink`.
    fn open(&self, request: ConnectRequest, sink: TransportSink) -> Box<dyn TransportLink>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sink_tags_events() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sink = TransportSink::new(7, tx);
        assert_eq!(sink.generation(), 7);
        assert!(sink.emit(TransportEvent::Opened));
        assert_eq!(
            rx.recv().await,
            Some(TaggedEvent {
                generation: 7,
                event: TransportEvent::Opened,
            })
        );
    }

    #[test]
    fn sink_reports_dropped_receiver() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let sink = TransportSink::new(1, tx);
        assert!(!sink.emit(TransportEvent::Closed));
    }
}
