use tokio::sync::mpsc;
use tracing::debug;

use crate::rps::protocol::PeerMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Host,
    Joiner,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportEvent {
    Message(PeerMessage),
    /// The other side is gone. Nothing follows.
    Closed,
}

/// One end of a two-party message channel. Messages from one sender arrive
/// in send order; nothing is promised across directions.
///
/// The actual carrier (QUIC stream, in-process channel) lives in background
/// tasks fed through the `outbox` and filling the `inbox`. Dropping the link
/// shuts the carrier down.
#[derive(Debug)]
pub struct PeerLink {
    outbox: mpsc::UnboundedSender<PeerMessage>,
    inbox: mpsc::UnboundedReceiver<TransportEvent>,
    closed: bool,
}

impl PeerLink {
    pub fn new(
        outbox: mpsc::UnboundedSender<PeerMessage>,
        inbox: mpsc::UnboundedReceiver<TransportEvent>,
    ) -> Self {
        Self { outbox, inbox, closed: false }
    }

    /// In-process pair. Needs a running tokio runtime.
    pub fn loopback() -> (PeerLink, PeerLink) {
        let (a_out, a_out_rx) = mpsc::unbounded_channel();
        let (b_out, b_out_rx) = mpsc::unbounded_channel();
        let (a_in_tx, a_in) = mpsc::unbounded_channel();
        let (b_in_tx, b_in) = mpsc::unbounded_channel();
        tokio::spawn(forward(a_out_rx, b_in_tx));
        tokio::spawn(forward(b_out_rx, a_in_tx));
        (PeerLink::new(a_out, a_in), PeerLink::new(b_out, b_in))
    }

    /// Queues a message; `false` when the carrier has already shut down.
    pub fn send(&self, msg: PeerMessage) -> bool {
        self.outbox.send(msg).is_ok()
    }

    pub async fn next_event(&mut self) -> TransportEvent {
        if self.closed {
            return TransportEvent::Closed;
        }
        match self.inbox.recv().await {
            Some(TransportEvent::Message(msg)) => TransportEvent::Message(msg),
            Some(TransportEvent::Closed) | None => {
                self.closed = true;
                TransportEvent::Closed
            }
        }
    }

    pub fn close(self) {
        debug!("closing peer link");
    }
}

async fn forward(mut from: mpsc::UnboundedReceiver<PeerMessage>, to: mpsc::UnboundedSender<TransportEvent>) {
    while let Some(msg) = from.recv().await {
        if to.send(TransportEvent::Message(msg)).is_err() {
            return;
        }
    }
    let _ = to.send(TransportEvent::Closed);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rps::moves::Move;

    #[tokio::test]
    async fn loopback_is_fifo_per_direction() {
        let (a, mut b) = PeerLink::loopback();
        assert!(a.send(PeerMessage::MoveCommitted));
        assert!(a.send(PeerMessage::MoveRevealed { mv: Move::Rock }));
        assert!(a.send(PeerMessage::RematchRequested));
        assert_eq!(b.next_event().await, TransportEvent::Message(PeerMessage::MoveCommitted));
        assert_eq!(
            b.next_event().await,
            TransportEvent::Message(PeerMessage::MoveRevealed { mv: Move::Rock })
        );
        assert_eq!(b.next_event().await, TransportEvent::Message(PeerMessage::RematchRequested));
    }

    #[tokio::test]
    async fn closing_one_end_closes_the_other() {
        let (a, mut b) = PeerLink::loopback();
        a.send(PeerMessage::MoveCommitted);
        a.close();
        assert_eq!(b.next_event().await, TransportEvent::Message(PeerMessage::MoveCommitted));
        assert_eq!(b.next_event().await, TransportEvent::Closed);
        assert_eq!(b.next_event().await, TransportEvent::Closed);
    }
}
