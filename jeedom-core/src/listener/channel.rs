//! WebSocket driver for the live channel.
//!
//! One task per connection attempt. The task translates what the socket
//! does into [`ChannelEvent`]s for the session and carries out the
//! socket-side effects (handshake, delivery). Mapping of transport outcomes:
//!
//! - connection failure → `TransportError`, then `Closed(1006)`
//! - read error before any close frame → `TransportError`, then `Closed(1006)`
//! - close frame with a code → `CloseReceived`, then `Closed(code)`
//! - close frame without a code → `Closed(1005)`
//! - stream end without a close frame → `Closed(1006)`

use futures_util::{SinkExt, StreamExt};
use jeedom_sdk::objects::{AuthFrame, WsCloseCode};
use tokio::sync::watch;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, warn};
use url::Url;

use super::machine::{ChannelEvent, Effect};
use super::EventListener;

/// Drive one connection until it closes or `shutdown` fires.
pub(crate) async fn run(
    listener: EventListener,
    generation: u64,
    url: Url,
    mut shutdown: watch::Receiver<bool>,
) {
    debug!(%url, generation, "Opening events socket");

    let connected = tokio::select! {
        biased;
        _ = shutdown.changed() => return,
        result = tokio_tungstenite::connect_async(url.as_str()) => result,
    };
    let ws = match connected {
        Ok((ws, _response)) => ws,
        Err(e) => {
            error!(error = %e, %url, "Error occurs on events socket");
            listener.dispatch(generation, ChannelEvent::TransportError);
            listener.dispatch(
                generation,
                ChannelEvent::Closed {
                    code: WsCloseCode::ABNORMAL,
                },
            );
            return;
        }
    };
    let (mut write, mut read) = ws.split();

    for effect in listener.dispatch(generation, ChannelEvent::Opened) {
        if effect != Effect::SendHandshake {
            continue;
        }
        let Some(api_key) = listener.inner.transport.api_key() else {
            warn!("API key vanished before the handshake");
            continue;
        };
        let frame = match serde_json::to_string(&AuthFrame {
            api_key: api_key.as_str(),
        }) {
            Ok(frame) => frame,
            Err(e) => {
                error!(error = %e, "Failed to encode handshake");
                continue;
            }
        };
        if let Err(e) = write.send(Message::Text(frame)).await {
            error!(error = %e, "Error occurs on events socket");
            listener.dispatch(generation, ChannelEvent::TransportError);
        }
    }

    let mut close_code: Option<u16> = None;
    loop {
        tokio::select! {
            biased;

            // Local teardown. The session already considers the socket
            // closed, so nothing is dispatched.
            _ = shutdown.changed() => {
                let frame = CloseFrame {
                    code: CloseCode::Normal,
                    reason: "".into(),
                };
                let _ = write.send(Message::Close(Some(frame))).await;
                debug!(generation, "Events socket closed locally");
                return;
            }

            message = read.next() => match message {
                Some(Ok(Message::Text(text))) => {
                    deliver(&listener, generation, &text).await;
                }
                Some(Ok(Message::Binary(bytes))) => match std::str::from_utf8(&bytes) {
                    Ok(text) => deliver(&listener, generation, text).await,
                    Err(e) => error!(error = %e, "Error during events parsing"),
                },
                Some(Ok(Message::Close(frame))) => {
                    let code = frame
                        .map(|f| u16::from(f.code))
                        .unwrap_or(WsCloseCode::NO_STATUS);
                    close_code = Some(code);
                    listener.dispatch(generation, ChannelEvent::CloseReceived);
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    if close_code.is_none() {
                        error!(error = %e, "Error occurs on events socket");
                        listener.dispatch(generation, ChannelEvent::TransportError);
                    }
                    break;
                }
                None => break,
            }
        }
    }

    listener.dispatch(
        generation,
        ChannelEvent::Closed {
            code: close_code.unwrap_or(WsCloseCode::ABNORMAL),
        },
    );
}

async fn deliver(listener: &EventListener, generation: u64, text: &str) {
    if listener
        .dispatch(generation, ChannelEvent::Message)
        .contains(&Effect::Deliver)
    {
        listener.deliver(text).await;
    }
}
