//! Per-connection WebSocket loop.
//!
//! One task per socket selects over the ping ticker, client frames and the
//! hub queue for this connection. The server pings every 5s and drops a
//! client that has been silent for 10s (shortened under test). However the
//! loop ends, the connection is removed from every room.

use std::sync::Arc;
use std::time::{Duration, Instant};

use actix_ws::{CloseCode, CloseReason, Closed, Message, MessageStream, ProtocolError, Session};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::time;
use tracing::{debug, warn};

use crate::domain::UserId;
use crate::domain::ports::user_channel;
use crate::inbound::ws::messages::{ClientFrame, ServerFrame};
use crate::outbound::realtime::{ConnectionId, NotificationHub};

#[cfg(not(test))]
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
#[cfg(test)]
const HEARTBEAT_INTERVAL: Duration = Duration::from_millis(50);

#[cfg(not(test))]
const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);
#[cfg(test)]
const CLIENT_TIMEOUT: Duration = Duration::from_millis(100);

pub(super) async fn handle_ws_session(
    hub: Arc<NotificationHub>,
    user_id: UserId,
    session: Session,
    stream: MessageStream,
) {
    let (connection, sender, queue) = NotificationHub::connect();
    let conn = Connection {
        hub,
        user_id,
        id: connection,
        sender,
    };
    conn.pump(session, stream, queue).await;
    conn.hub.leave(connection);
    debug!(user_id = %conn.user_id, %connection, "websocket disconnected");
}

/// Why a connection loop stopped.
#[derive(Debug)]
enum Ending {
    ClientClosed(Option<CloseReason>),
    StreamEnded,
    IdleTimeout,
    Protocol(ProtocolError),
    BadFrame,
    SendFailed(Closed),
}

impl Ending {
    /// Close frame to send back, if the socket is still writable.
    fn close_reason(self) -> Option<Option<CloseReason>> {
        let reason = |code, text: &str| {
            Some(Some(CloseReason {
                code,
                description: Some(text.to_owned()),
            }))
        };
        match self {
            Self::IdleTimeout => reason(CloseCode::Normal, "heartbeat timeout"),
            Self::Protocol(_) => reason(CloseCode::Protocol, "protocol error"),
            Self::BadFrame => reason(CloseCode::Policy, "invalid payload"),
            Self::ClientClosed(echo) => Some(echo),
            Self::StreamEnded | Self::SendFailed(_) => None,
        }
    }
}

struct Connection {
    hub: Arc<NotificationHub>,
    user_id: UserId,
    id: ConnectionId,
    sender: UnboundedSender<String>,
}

impl Connection {
    async fn pump(
        &self,
        mut session: Session,
        mut stream: MessageStream,
        mut queue: UnboundedReceiver<String>,
    ) {
        let mut seen = Instant::now();
        let mut ticker = time::interval(HEARTBEAT_INTERVAL);

        let ending = loop {
            let step = tokio::select! {
                _ = ticker.tick() => {
                    if seen.elapsed() > CLIENT_TIMEOUT {
                        Err(Ending::IdleTimeout)
                    } else {
                        session.ping(b"").await.map_err(Ending::SendFailed)
                    }
                }
                incoming = stream.recv() => match incoming {
                    None => Err(Ending::StreamEnded),
                    Some(Err(err)) => Err(Ending::Protocol(err)),
                    Some(Ok(message)) => {
                        seen = Instant::now();
                        self.on_message(&mut session, message).await
                    }
                },
                Some(frame) = queue.recv() => {
                    session.text(frame).await.map_err(Ending::SendFailed)
                }
            };
            if let Err(ending) = step {
                break ending;
            }
        };

        match &ending {
            Ending::IdleTimeout => warn!(user_id = %self.user_id, "websocket idle; closing"),
            Ending::Protocol(err) => warn!(error = %err, "websocket protocol error"),
            Ending::SendFailed(err) => warn!(error = %err, "websocket write failed"),
            Ending::BadFrame | Ending::ClientClosed(_) | Ending::StreamEnded => {
                debug!(?ending, "websocket loop finished");
            }
        }
        if let Some(reason) = ending.close_reason()
            && let Err(err) = session.close(reason).await
        {
            debug!(error = %err, "websocket already closed");
        }
    }

    async fn on_message(&self, session: &mut Session, message: Message) -> Result<(), Ending> {
        match message {
            Message::Ping(payload) => session.pong(&payload).await.map_err(Ending::SendFailed),
            Message::Text(text) => {
                let frame = serde_json::from_str::<ClientFrame>(&text).map_err(|err| {
                    warn!(error = %err, "malformed websocket frame");
                    Ending::BadFrame
                })?;
                let reply = self.reply_to(frame);
                send_json(session, &reply).await.map_err(Ending::SendFailed)
            }
            Message::Close(reason) => Err(Ending::ClientClosed(reason)),
            Message::Pong(_) | Message::Binary(_) | Message::Continuation(_) | Message::Nop => {
                Ok(())
            }
        }
    }

    /// Only the session's own room may be joined.
    fn reply_to(&self, frame: ClientFrame) -> ServerFrame {
        if frame.event != "join" {
            return ServerFrame::error(format!("Unsupported event '{}'", frame.event));
        }
        let Some(requested) = frame.user_id.as_deref().and_then(|raw| UserId::new(raw).ok())
        else {
            return ServerFrame::error("join requires a valid userId");
        };
        if requested != self.user_id {
            warn!(user_id = %self.user_id, %requested, "join refused for another user's room");
            return ServerFrame::error("Cannot join another user's room");
        }
        let room = user_channel(&self.user_id);
        self.hub.join(&room, self.id, self.sender.clone());
        ServerFrame::Joined { room }
    }
}

async fn send_json<T: serde::Serialize>(session: &mut Session, payload: &T) -> Result<(), Closed> {
    match serde_json::to_string(payload) {
        Ok(body) => session.text(body).await,
        Err(err) => {
            warn!(error = %err, "websocket reply not serialisable");
            Ok(())
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
