use crate::rps::moves::Move;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Messages exchanged between the two peers during a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PeerMessage {
    /// Sender has picked a move but is not showing it.
    MoveCommitted,
    MoveRevealed {
        #[serde(rename = "move")]
        mv: Move,
    },
    RematchRequested,
}

#[derive(Debug)]
pub enum ProtocolError {
    Encode(serde_json::Error),
    Decode(serde_json::Error),
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encode(e) => write!(f, "failed to encode peer message: {}", e),
            Self::Decode(e) => write!(f, "unrecognised peer message: {}", e),
        }
    }
}

impl std::error::Error for ProtocolError {}

impl PeerMessage {
    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(self).map_err(ProtocolError::Encode)
    }

    pub fn decode(bytes: &[u8]) -> Result<PeerMessage, ProtocolError> {
        serde_json::from_slice(bytes).map_err(ProtocolError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_shape() {
        let revealed = PeerMessage::MoveRevealed { mv: Move::Paper }.encode().unwrap();
        assert_eq!(revealed, br#"{"type":"MoveRevealed","move":"paper"}"#);
        assert_eq!(PeerMessage::RematchRequested.encode().unwrap(), br#"{"type":"RematchRequested"}"#);
        assert_eq!(PeerMessage::MoveCommitted.encode().unwrap(), br#"{"type":"MoveCommitted"}"#);
    }

    #[test]
    fn decodes_peer_json() {
        let msg = PeerMessage::decode(br#"{"move":"scissors","type":"MoveRevealed"}"#).unwrap();
        assert_eq!(msg, PeerMessage::MoveRevealed { mv: Move::Scissors });
    }

    #[test]
    fn rejects_unknown_or_garbled_messages() {
        assert!(PeerMessage::decode(br#"{"type":"Chat","text":"hi"}"#).is_err());
        assert!(PeerMessage::decode(br#"{"type":"MoveRevealed","move":"lizard"}"#).is_err());
        assert!(PeerMessage::decode(b"\x00\x01garbage").is_err());
    }
}
