//! In-memory connector for driving the connection actor in tests.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;

use super::{ConnectRequest, Connector, TransportEvent, TransportLink, TransportSink};

/// One link opened through [`MockConnector`].
#[derive(Clone)]
pub(crate) struct MockLinkHandle {
    pub request: ConnectRequest,
    pub sink: TransportSink,
    sent: Arc<Mutex<Vec<String>>>,
    closed: Arc<Mutex<bool>>,
}

impl MockLinkHandle {
    pub fn emit(&self, event: TransportEvent) {
        let _ = self.sink.emit(event);
    }

    pub fn push(&self, frame: &Value) {
        self.emit(TransportEvent::Message(frame.to_string()));
    }

    /// Frames sent by the client, decoded.
    pub fn sent(&self) -> Vec<Value> {
        self.sent
            .lock()
            .iter()
            .map(|text| serde_json::from_str(text).unwrap())
            .collect()
    }

    /// Sent frames with the given op code.
    pub fn sent_with_op(&self, op: u64) -> Vec<Value> {
        self.sent()
            .into_iter()
            .filter(|frame| frame["op"] == op)
            .collect()
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.lock()
    }
}

struct MockLink {
    sent: Arc<Mutex<Vec<String>>>,
    closed: Arc<Mutex<bool>>,
}

impl TransportLink for MockLink {
    fn send(&self, text: String) -> bool {
        if *self.closed.lock() {
            return false;
        }
        self.sent.lock().push(text);
        true
    }

    fn close(&mut self) {
        *self.closed.lock() = true;
    }
}

/// Records every link it opens. Links never emit on their own.
#[derive(Clone, Default)]
pub(crate) struct MockConnector {
    links: Arc<Mutex<Vec<MockLinkHandle>>>,
}

impl MockConnector {
    pub fn open_count(&self) -> usize {
        self.links.lock().len()
    }

    pub fn last(&self) -> MockLinkHandle {
        self.links.lock().last().cloned().unwrap()
    }
}

impl Connector for MockConnector {
    fn open(&self, request: ConnectRequest, sink: TransportSink) -> Box<dyn TransportLink> {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let closed = Arc::new(Mutex::new(false));
        self.links.lock().push(MockLinkHandle {
            request,
            sink,
            sent: sent.clone(),
            closed: closed.clone(),
        });
        Box::new(MockLink { sent, closed })
    }
}
