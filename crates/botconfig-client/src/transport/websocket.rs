//! WebSocket transport over `tokio-tungstenite`.

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::http::{HeaderName, HeaderValue};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{ConnectRequest, Connector, TransportEvent, TransportLink, TransportSink};

/// Production [`Connector`].
#[derive(Clone, Copy, Debug, Default)]
pub struct WsConnector;

impl Connector for WsConnector {
    fn open(&self, request: ConnectRequest, sink: TransportSink) -> Box<dyn TransportLink> {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        drop(tokio::spawn(run_link(
            request,
            sink,
            outbound_rx,
            cancel.clone(),
        )));
        Box::new(WsLink {
            outbound: outbound_tx,
            cancel,
        })
    }
}

struct WsLink {
    outbound: mpsc::UnboundedSender<String>,
    cancel: CancellationToken,
}

impl TransportLink for WsLink {
    fn send(&self, text: String) -> bool {
        !self.cancel.is_cancelled() && self.outbound.send(text).is_ok()
    }

    fn close(&mut self) {
        self.cancel.cancel();
    }
}

impl Drop for WsLink {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

fn build_request(request: &ConnectRequest) -> Result<Request, String> {
    let mut upgrade = request
        .url
        .as_str()
        .into_client_request()
        .map_err(|e| format!("invalid url {}: {e}", request.url))?;
    for (name, value) in &request.headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| format!("invalid header name {name}: {e}"))?;
        let value =
            HeaderValue::from_str(value).map_err(|e| format!("invalid header value: {e}"))?;
        let _ = upgrade.headers_mut().insert(name, value);
    }
    Ok(upgrade)
}

/// Drive one link until it closes or is cancelled.
///
/// A local close emits nothing further; the owner has already moved on.
async fn run_link(
    request: ConnectRequest,
    sink: TransportSink,
    mut outbound: mpsc::UnboundedReceiver<String>,
    cancel: CancellationToken,
) {
    let generation = sink.generation();

    let upgrade = match build_request(&request) {
        Ok(upgrade) => upgrade,
        Err(message) => {
            let _ = sink.emit(TransportEvent::Error(message));
            let _ = sink.emit(TransportEvent::Closed);
            return;
        }
    };

    let connected = tokio::select! {
        result = connect_async(upgrade) => result,
        () = cancel.cancelled() => return,
    };
    let ws = match connected {
        Ok((ws, _response)) => ws,
        Err(e) => {
            debug!(generation, url = %request.url, error = %e, "websocket connect failed");
            let _ = sink.emit(TransportEvent::Error(e.to_string()));
            let _ = sink.emit(TransportEvent::Closed);
            return;
        }
    };

    debug!(generation, url = %request.url, "websocket open");
    let _ = sink.emit(TransportEvent::Opened);
    let (mut ws_tx, mut ws_rx) = ws.split();

    loop {
        tokio::select! {
            () = cancel.cancelled() => {
                let _ = ws_tx.send(Message::Close(None)).await;
                return;
            }
            text = outbound.recv() => {
                let Some(text) = text else {
                    let _ = ws_tx.send(Message::Close(None)).await;
                    return;
                };
                if let Err(e) = ws_tx.send(Message::Text(text.into())).await {
                    warn!(generation, error = %e, "websocket send failed");
                    let _ = sink.emit(TransportEvent::Error(e.to_string()));
                    break;
                }
            }
            frame = ws_rx.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    let _ = sink.emit(TransportEvent::Message(text.to_string()));
                }
                Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes.to_vec()) {
                    Ok(text) => {
                        let _ = sink.emit(TransportEvent::Message(text));
                    }
                    Err(_) => debug!(generation, "dropping non-utf8 binary frame"),
                },
                Some(Ok(Message::Close(frame))) => {
                    debug!(generation, ?frame, "websocket closed by server");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    let _ = sink.emit(TransportEvent::Error(e.to_string()));
                    break;
                }
                None => break,
            },
        }
    }

    let _ = sink.emit(TransportEvent::Closed);
}
