//! tokio-tungstenite connection task

use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use super::{LinkState, TransportEvent};
use crate::protocol::close::{CLOSE_ABNORMAL, CLOSE_NORMAL, CLOSE_NO_STATUS};

type Socket = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// Drive one connection from connect to close
pub(super) async fn run(
    endpoint: Url,
    state: Arc<Mutex<LinkState>>,
    mut outgoing: mpsc::UnboundedReceiver<String>,
    cancel: CancellationToken,
    events: mpsc::UnboundedSender<TransportEvent>,
) {
    info!("Connecting to {}", endpoint);

    let connecting = tokio_tungstenite::connect_async(endpoint.as_str());
    let mut ws = tokio::select! {
        _ = cancel.cancelled() => {
            info!("Connection to {} aborted before open", endpoint);
            finish(&state, &events, CLOSE_NORMAL);
            return;
        }
        result = connecting => match result {
            Ok((ws, response)) => {
                debug!("WebSocket handshake complete: status={}", response.status());
                ws
            }
            Err(e) => {
                warn!("Failed to connect to {}: {}", endpoint, e);
                let _ = events.send(TransportEvent::Error(e.to_string()));
                finish(&state, &events, CLOSE_ABNORMAL);
                return;
            }
        }
    };

    *state.lock() = LinkState::Open;
    info!("Connected to {}", endpoint);
    if events.send(TransportEvent::Opened).is_err() {
        debug!("Transport receiver dropped before open");
        let _ = ws.close(None).await;
        *state.lock() = LinkState::Closed;
        return;
    }

    let mut close_code: Option<u16> = None;
    let mut frames = 0usize;
    let mut closing = false;

    loop {
        tokio::select! {
            incoming = ws.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    frames += 1;
                    if events.send(TransportEvent::Frame(text)).is_err() {
                        debug!("Transport receiver dropped, closing");
                        let _ = ws.close(None).await;
                        break;
                    }
                }
                Some(Ok(Message::Binary(bytes))) => {
                    debug!("Dropping {} byte binary frame", bytes.len());
                }
                Some(Ok(Message::Close(frame))) => {
                    let code = frame
                        .as_ref()
                        .map(|f| u16::from(f.code))
                        .unwrap_or(CLOSE_NO_STATUS);
                    debug!("Close frame received: code={}", code);
                    if close_code.is_none() {
                        close_code = Some(code);
                    }
                }
                Some(Ok(_)) => {}
                Some(Err(WsError::ConnectionClosed | WsError::AlreadyClosed)) => break,
                Some(Err(e)) => {
                    warn!("WebSocket error on {}: {}", endpoint, e);
                    let _ = events.send(TransportEvent::Error(e.to_string()));
                    break;
                }
                None => break,
            },
            _ = cancel.cancelled(), if !closing => {
                closing = true;
                begin_close(&mut ws, &state).await;
            }
            text = outgoing.recv(), if !closing => match text {
                Some(text) => {
                    debug!("Sending frame: {} chars", text.len());
                    if let Err(e) = ws.send(Message::Text(text)).await {
                        warn!("Failed to send frame: {}", e);
                        let _ = events.send(TransportEvent::Error(e.to_string()));
                    }
                }
                None => {
                    closing = true;
                    begin_close(&mut ws, &state).await;
                }
            },
        }
    }

    let code = close_code.unwrap_or(CLOSE_ABNORMAL);
    info!(
        "Connection to {} closed: code={}, {} frames received",
        endpoint, code, frames
    );
    finish(&state, &events, code);
}

/// Stop accepting frames and start the close handshake with code 1000
async fn begin_close(ws: &mut Socket, state: &Mutex<LinkState>) {
    *state.lock() = LinkState::Closed;
    let frame = CloseFrame {
        code: CloseCode::Normal,
        reason: "".into(),
    };
    if let Err(e) = ws.close(Some(frame)).await {
        debug!("Close handshake failed: {}", e);
    }
}

fn finish(
    state: &Mutex<LinkState>,
    events: &mpsc::UnboundedSender<TransportEvent>,
    code: u16,
) {
    *state.lock() = LinkState::Closed;
    let _ = events.send(TransportEvent::Closed { code });
}

#[cfg(test)]
mod tests {
    use super::super::connect;
    use super::*;
    use crate::error::StreamError;

    #[tokio::test]
    async fn test_refused_connection_reports_error_then_close() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let url = Url::parse(&format!("ws://127.0.0.1:{}/", port)).unwrap();
        let (handle, mut events) = connect(url);
        assert_eq!(
            handle.send("x3d".to_string()),
            Err(StreamError::NotConnected)
        );

        assert!(matches!(
            events.recv().await,
            Some(TransportEvent::Error(_))
        ));
        assert_eq!(
            events.recv().await,
            Some(TransportEvent::Closed {
                code: CLOSE_ABNORMAL
            })
        );
        assert!(!handle.is_open());
    }

    #[tokio::test]
    async fn test_server_close_code_is_reported() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            let hello = ws.next().await.unwrap().unwrap();
            assert_eq!(hello, Message::Text("x3d".to_string()));
            ws.send(Message::Text("time: 5".to_string())).await.unwrap();
            ws.close(Some(CloseFrame {
                code: CloseCode::Away,
                reason: "".into(),
            }))
            .await
            .unwrap();
            // Drain until the client acknowledges the close
            while let Some(Ok(_)) = ws.next().await {}
        });

        let url = Url::parse(&format!("ws://127.0.0.1:{}/", port)).unwrap();
        let (handle, mut events) = connect(url);
        assert_eq!(events.recv().await, Some(TransportEvent::Opened));
        handle.send("x3d".to_string()).unwrap();
        assert_eq!(
            events.recv().await,
            Some(TransportEvent::Frame("time: 5".to_string()))
        );
        assert_eq!(
            events.recv().await,
            Some(TransportEvent::Closed { code: 1001 })
        );
        assert_eq!(
            handle.send("run".to_string()),
            Err(StreamError::NotConnected)
        );
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_close_after_open_is_normal() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            while let Some(Ok(_)) = ws.next().await {}
        });

        let url = Url::parse(&format!("ws://127.0.0.1:{}/", port)).unwrap();
        let (handle, mut events) = connect(url);
        assert_eq!(events.recv().await, Some(TransportEvent::Opened));
        handle.close();
        assert_eq!(
            events.recv().await,
            Some(TransportEvent::Closed { code: CLOSE_NORMAL })
        );
        assert!(!handle.is_open());
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_close_during_handshake_is_normal() {
        use tokio::io::AsyncReadExt;

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let (accepted_tx, accepted_rx) = tokio::sync::oneshot::channel();

        // Accept the socket but never answer the upgrade request
        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            accepted_tx.send(()).unwrap();
            let mut buf = [0u8; 1024];
            while let Ok(n) = stream.read(&mut buf).await {
                if n == 0 {
                    break;
                }
            }
        });

        let url = Url::parse(&format!("ws://127.0.0.1:{}/", port)).unwrap();
        let (handle, mut events) = connect(url);
        accepted_rx.await.unwrap();
        handle.close();

        assert_eq!(
            events.recv().await,
            Some(TransportEvent::Closed { code: CLOSE_NORMAL })
        );
        assert_eq!(events.recv().await, None);
        server.await.unwrap();
    }
}
