use crate::mirror::Role;
use crate::router::{ChannelHub, Command, Router};
use crate::server::protocol::{ClientMessage, ServerMessage, decode_client_message};
use crate::session::{CommandError, Envelope};
use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// A command waiting for this connection's worker
pub struct Job {
    pub router: Arc<Router>,
    pub request_id: Option<String>,
    pub command: Command,
}

/// What the socket loop should do with one inbound frame
pub enum Incoming {
    Reply(ServerMessage),
    Execute(Job),
}

/// Per-socket subscription state, independent of the socket itself
pub struct Connection {
    hub: Arc<ChannelHub>,
    router: Option<Arc<Router>>,
    role: Role,
    events: Option<broadcast::Receiver<Envelope>>,
    last_seq: u64,
}

impl Connection {
    pub fn new(hub: Arc<ChannelHub>) -> Self {
        Self {
            hub,
            router: None,
            role: Role::Audience,
            events: None,
            last_seq: 0,
        }
    }

    pub fn is_joined(&self) -> bool {
        self.events.is_some()
    }

    pub fn channel(&self) -> Option<&str> {
        self.router.as_ref().map(|r| r.channel())
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Receiver for the joined channel's events
    pub fn events_mut(&mut self) -> Option<&mut broadcast::Receiver<Envelope>> {
        self.events.as_mut()
    }

    /// Subscribe to `channel`, dropping any previous subscription
    pub fn join(&mut self, channel: &str, role: Role) -> Result<ServerMessage, CommandError> {
        let (router, snapshot, events) = self.hub.join(channel)?;
        self.leave();

        info!(channel = router.channel(), ?role, "connection joined");
        self.last_seq = snapshot.seq;
        self.events = Some(events);
        self.router = Some(router);
        self.role = role;
        Ok(ServerMessage::Snapshot { snapshot })
    }

    pub fn leave(&mut self) -> Option<ServerMessage> {
        self.events = None;
        self.last_seq = 0;
        let router = self.router.take()?;
        info!(channel = router.channel(), "connection left");
        Some(ServerMessage::Left {
            channel: router.channel().to_string(),
        })
    }

    /// Decode one text frame and decide how to answer it
    pub fn handle_text(&mut self, text: &str) -> Incoming {
        let message = match decode_client_message(text) {
            Ok(message) => message,
            Err((request_id, err)) => {
                debug!(%err, "rejected frame");
                return Incoming::Reply(ServerMessage::rejected(request_id, &err));
            }
        };

        match message {
            ClientMessage::Join { channel, role } => match self.join(&channel, role) {
                Ok(reply) => Incoming::Reply(reply),
                Err(err) => Incoming::Reply(ServerMessage::rejected(None, &err)),
            },
            ClientMessage::Leave => Incoming::Reply(self.leave().unwrap_or(ServerMessage::Ack {
                request_id: None,
            })),
            ClientMessage::Command {
                request_id,
                command,
            } => match self.driving_router() {
                Ok(router) => Incoming::Execute(Job {
                    router,
                    request_id,
                    command,
                }),
                Err(err) => Incoming::Reply(ServerMessage::rejected(request_id, &err)),
            },
        }
    }

    /// Turn a broadcast receive into the frame to forward, if any.
    ///
    /// Events already covered by the last snapshot are skipped; falling
    /// behind the channel buffer triggers a fresh snapshot.
    pub fn forward(&mut self, received: Result<Envelope, RecvError>) -> Option<ServerMessage> {
        match received {
            Ok(envelope) => {
                if envelope.seq <= self.last_seq {
                    return None;
                }
                self.last_seq = envelope.seq;
                Some(ServerMessage::Event { envelope })
            }
            Err(RecvError::Lagged(skipped)) => {
                let router = self.router.as_ref()?;
                warn!(channel = router.channel(), skipped, "subscriber lagged, resyncing");
                let snapshot = router.snapshot();
                self.last_seq = snapshot.seq;
                Some(ServerMessage::Snapshot { snapshot })
            }
            Err(RecvError::Closed) => {
                self.events = None;
                None
            }
        }
    }

    fn driving_router(&self) -> Result<Arc<Router>, CommandError> {
        let router = self.router.as_ref().ok_or_else(|| {
            CommandError::InvalidArgument("join a channel before issuing commands".to_string())
        })?;
        if !self.role.can_drive() {
            return Err(CommandError::InvalidArgument(
                "audience connections are read-only".to_string(),
            ));
        }
        Ok(Arc::clone(router))
    }
}

/// Run a connection's commands one at a time, in arrival order
pub async fn run_commands(mut jobs: mpsc::UnboundedReceiver<Job>, replies: mpsc::UnboundedSender<ServerMessage>) {
    while let Some(job) = jobs.recv().await {
        let name = job.command.name();
        let reply = match job.router.execute(job.command).await {
            Ok(()) => ServerMessage::Ack {
                request_id: job.request_id,
            },
            Err(err) => {
                debug!(command = name, %err, "command rejected");
                ServerMessage::rejected(job.request_id, &err)
            }
        };
        if replies.send(reply).is_err() {
            break;
        }
    }
}

async fn next_event(events: Option<&mut broadcast::Receiver<Envelope>>) -> Result<Envelope, RecvError> {
    match events {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

/// Drive one WebSocket until the client goes away
pub async fn handle_socket(socket: WebSocket, hub: Arc<ChannelHub>) {
    let (mut sink, mut stream) = socket.split();
    let (job_tx, job_rx) = mpsc::unbounded_channel();
    let (reply_tx, mut reply_rx) = mpsc::unbounded_channel();
    let worker = tokio::spawn(run_commands(job_rx, reply_tx));

    let mut conn = Connection::new(hub);

    loop {
        let outgoing = tokio::select! {
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Text(text))) => match conn.handle_text(&text) {
                    Incoming::Reply(reply) => Some(reply),
                    Incoming::Execute(job) => {
                        if job_tx.send(job).is_err() {
                            break;
                        }
                        None
                    }
                },
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => None,
            },
            received = next_event(conn.events_mut()), if conn.is_joined() => conn.forward(received),
            Some(reply) = reply_rx.recv() => Some(reply),
        };

        if let Some(message) = outgoing {
            let text = match serde_json::to_string(&message) {
                Ok(text) => text,
                Err(e) => {
                    warn!(error = %e, "failed to encode frame");
                    continue;
                }
            };
            if sink.send(Message::Text(text)).await.is_err() {
                break; // Client disconnected
            }
        }
    }

    conn.leave();
    drop(job_tx);
    // Let queued commands finish
    let _ = worker.await;
}
