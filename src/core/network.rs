use anyhow::{anyhow, bail, Result};
use iroh::endpoint::{Connection, Endpoint, RecvStream, SendStream};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::core::frame::{read_frame, write_frame};
use crate::core::session::{SessionId, SessionIdError};
use crate::core::transport::{PeerLink, TransportEvent};
use crate::rps::protocol::PeerMessage;

pub const ALPN: &[u8] = b"rpsterm/0";
const PROTOCOL_VERSION: u16 = 1;

/// First frames on a fresh stream, before any game traffic.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
enum Handshake {
    Hello { session: String, version: u16 },
    Welcome,
    Refused { reason: String },
}

#[derive(Debug)]
pub enum ConnectionError {
    InvalidSession(SessionIdError),
    Unreachable(String),
    Handshake(String),
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSession(e) => write!(f, "invalid session code: {}", e),
            Self::Unreachable(s) => write!(f, "host unreachable: {}", s),
            Self::Handshake(s) => write!(f, "handshake failed: {}", s),
        }
    }
}

impl std::error::Error for ConnectionError {}

/// Hosting side of a session: an endpoint bound under the session's key,
/// waiting for exactly one joiner.
pub struct Host {
    endpoint: Endpoint,
    session: SessionId,
}

impl Host {
    pub async fn bind() -> Result<Self> {
        let session = SessionId::generate(&mut rand::rng());
        let endpoint = Endpoint::builder()
            .secret_key(session.secret_key())
            .alpns(vec![ALPN.to_vec()])
            .bind()
            .await?;
        info!(session = %session, endpoint = %endpoint.id(), "hosting session");
        Ok(Self { endpoint, session })
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session
    }

    /// Waits for a joiner that completes the handshake. Connections that fail
    /// it are dropped and the wait continues.
    pub async fn accept(self) -> Result<PeerLink> {
        loop {
            let incoming = self.endpoint.accept().await.ok_or_else(|| anyhow!("endpoint closed"))?;
            let conn = match incoming.accept() {
                Ok(connecting) => match connecting.await {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, "incoming connection failed");
                        continue;
                    }
                },
                Err(e) => {
                    warn!(error = %e, "could not accept incoming connection");
                    continue;
                }
            };
            match greet(&conn, &self.session).await {
                Ok((send, recv)) => {
                    info!(remote = %conn.remote_id(), "opponent joined");
                    return Ok(spawn_link(self.endpoint, conn, send, recv));
                }
                Err(e) => {
                    warn!(error = %e, "rejected joiner");
                    conn.close(1u32.into(), b"handshake");
                }
            }
        }
    }
}

async fn greet(conn: &Connection, session: &SessionId) -> Result<(SendStream, RecvStream)> {
    let (mut send, mut recv) = conn.accept_bi().await?;
    let hello = read_frame(&mut recv)
        .await?
        .ok_or_else(|| anyhow!("joiner hung up during handshake"))?;
    let refusal = match postcard::from_bytes::<Handshake>(&hello)? {
        Handshake::Hello { version, .. } if version != PROTOCOL_VERSION => {
            format!("protocol version {} is not supported", version)
        }
        Handshake::Hello { session: asked, .. } if asked != session.as_str() => {
            format!("unknown session {}", asked)
        }
        Handshake::Hello { .. } => {
            write_frame(&mut send, &postcard::to_stdvec(&Handshake::Welcome)?).await?;
            return Ok((send, recv));
        }
        other => bail!("expected hello, got {:?}", other),
    };
    let reply = Handshake::Refused { reason: refusal.clone() };
    write_frame(&mut send, &postcard::to_stdvec(&reply)?).await?;
    bail!(refusal)
}

/// Connects to the host announced by `code`. Gives up after the configured
/// connect timeout; there is no retry.
pub async fn join(code: &str, config: &Config) -> Result<PeerLink, ConnectionError> {
    let session: SessionId = code.parse().map_err(ConnectionError::InvalidSession)?;
    match tokio::time::timeout(config.connect_timeout, dial(&session)).await {
        Ok(result) => result,
        Err(_) => Err(ConnectionError::Unreachable(format!(
            "no answer from session {} within {}s",
            session,
            config.connect_timeout.as_secs()
        ))),
    }
}

async fn dial(session: &SessionId) -> Result<PeerLink, ConnectionError> {
    let unreachable = |e: &dyn fmt::Display| ConnectionError::Unreachable(e.to_string());
    let handshake = |e: &dyn fmt::Display| ConnectionError::Handshake(e.to_string());

    let endpoint = Endpoint::builder()
        .alpns(vec![ALPN.to_vec()])
        .bind()
        .await
        .map_err(|e| unreachable(&e))?;
    let host = session.endpoint_id();
    info!(session = %session, %host, "dialing host");
    let conn = endpoint.connect(host, ALPN).await.map_err(|e| unreachable(&e))?;

    // the joiner opens the stream; the host sees it once hello is written
    let (mut send, mut recv) = conn.open_bi().await.map_err(|e| unreachable(&e))?;
    let hello = Handshake::Hello { session: session.to_string(), version: PROTOCOL_VERSION };
    let bytes = postcard::to_stdvec(&hello).map_err(|e| handshake(&e))?;
    write_frame(&mut send, &bytes).await.map_err(|e| handshake(&e))?;
    let reply = read_frame(&mut recv)
        .await
        .map_err(|e| handshake(&e))?
        .ok_or_else(|| ConnectionError::Handshake("host hung up".to_string()))?;
    match postcard::from_bytes::<Handshake>(&reply).map_err(|e| handshake(&e))? {
        Handshake::Welcome => {
            info!(session = %session, "joined session");
            Ok(spawn_link(endpoint, conn, send, recv))
        }
        Handshake::Refused { reason } => Err(ConnectionError::Handshake(reason)),
        other => Err(ConnectionError::Handshake(format!("unexpected reply {:?}", other))),
    }
}

fn spawn_link(endpoint: Endpoint, conn: Connection, send: SendStream, recv: RecvStream) -> PeerLink {
    let (outbox_tx, outbox_rx) = mpsc::unbounded_channel();
    let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
    tokio::spawn(read_loop(recv, inbox_tx));
    tokio::spawn(write_loop(endpoint, conn, send, outbox_rx));
    PeerLink::new(outbox_tx, inbox_rx)
}

async fn read_loop(mut recv: RecvStream, inbox: mpsc::UnboundedSender<TransportEvent>) {
    loop {
        match read_frame(&mut recv).await {
            Ok(Some(bytes)) => match PeerMessage::decode(&bytes) {
                Ok(msg) => {
                    debug!(?msg, "received");
                    if inbox.send(TransportEvent::Message(msg)).is_err() {
                        return;
                    }
                }
                Err(e) => warn!(error = %e, "dropping peer frame"),
            },
            Ok(None) => {
                debug!("peer finished its stream");
                break;
            }
            Err(e) => {
                debug!(error = %e, "peer stream failed");
                break;
            }
        }
    }
    let _ = inbox.send(TransportEvent::Closed);
}

async fn write_loop(
    endpoint: Endpoint,
    conn: Connection,
    mut send: SendStream,
    mut outbox: mpsc::UnboundedReceiver<PeerMessage>,
) {
    while let Some(msg) = outbox.recv().await {
        let bytes = match msg.encode() {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(error = %e, "dropping outgoing message");
                continue;
            }
        };
        if let Err(e) = write_frame(&mut send, &bytes).await {
            warn!(error = %e, "failed to send to peer");
            break;
        }
        debug!(?msg, "sent");
    }
    let _ = send.finish();
    conn.close(0u32.into(), b"bye");
    endpoint.close().await;
}
