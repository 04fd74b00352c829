use crate::error::SignalingError;
use crate::model::description::SessionDescription;
use crate::model::peer::PeerIdentity;
use crate::model::room::RoomId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One relay message: an event name and its JSON payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayFrame {
    pub event: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Messages this side emits through the relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum OutboundEvent {
    JoinRoom {
        self_id: PeerIdentity,
        room_id: RoomId,
    },
    CallUser {
        peer_id: PeerIdentity,
        offer: SessionDescription,
    },
    CallAccept {
        peer_id: PeerIdentity,
        answer: SessionDescription,
    },
    EndCall {
        peer_id: PeerIdentity,
    },
}

impl OutboundEvent {
    pub fn name(&self) -> &'static str {
        match self {
            OutboundEvent::JoinRoom { .. } => "join-room",
            OutboundEvent::CallUser { .. } => "call-user",
            OutboundEvent::CallAccept { .. } => "call-accept",
            OutboundEvent::EndCall { .. } => "end-call",
        }
    }

    pub fn encode(&self) -> Result<String, SignalingError> {
        serde_json::to_string(self).map_err(|source| SignalingError::Encode {
            event: self.name(),
            source,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InboundKind {
    JoinedRoom,
    UserJoined,
    IncomingCall,
    CallAccept,
    EndCall,
}

impl InboundKind {
    pub const ALL: [InboundKind; 5] = [
        InboundKind::JoinedRoom,
        InboundKind::UserJoined,
        InboundKind::IncomingCall,
        InboundKind::CallAccept,
        InboundKind::EndCall,
    ];

    pub fn name(self) -> &'static str {
        match self {
            InboundKind::JoinedRoom => "joined-room",
            InboundKind::UserJoined => "user-joined",
            InboundKind::IncomingCall => "incoming-call",
            InboundKind::CallAccept => "call-accept",
            InboundKind::EndCall => "end-call",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

impl fmt::Display for InboundKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Who terminated a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndedBy {
    Local,
    Peer(PeerIdentity),
    Unknown,
}

impl fmt::Display for EndedBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndedBy::Local => f.write_str("self"),
            EndedBy::Peer(peer) => write!(f, "{}", peer),
            EndedBy::Unknown => f.write_str("unknown"),
        }
    }
}

/// Validated messages delivered by the relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    JoinedRoom {
        room: RoomId,
    },
    UserJoined {
        peer: PeerIdentity,
    },
    IncomingCall {
        from: PeerIdentity,
        offer: SessionDescription,
    },
    CallAccept {
        from: Option<PeerIdentity>,
        answer: SessionDescription,
    },
    EndCall {
        ended_by: EndedBy,
    },
}

// Wire shape before validation. Aliases cover the field names used by the
// browser client (`emailId`, `ans`).
#[derive(Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
enum RawInbound {
    JoinedRoom {
        room_id: Option<String>,
    },
    UserJoined {
        #[serde(alias = "emailId")]
        peer_id: Option<String>,
    },
    IncomingCall {
        from: Option<String>,
        offer: Option<SessionDescription>,
    },
    CallAccept {
        from: Option<String>,
        #[serde(alias = "ans")]
        answer: Option<SessionDescription>,
    },
    EndCall {
        ended_by: Option<String>,
    },
}

impl InboundEvent {
    pub fn kind(&self) -> InboundKind {
        match self {
            InboundEvent::JoinedRoom { .. } => InboundKind::JoinedRoom,
            InboundEvent::UserJoined { .. } => InboundKind::UserJoined,
            InboundEvent::IncomingCall { .. } => InboundKind::IncomingCall,
            InboundEvent::CallAccept { .. } => InboundKind::CallAccept,
            InboundEvent::EndCall { .. } => InboundKind::EndCall,
        }
    }

    /// Parses and validates one relay frame.
    pub fn parse(text: &str) -> Result<Self, SignalingError> {
        let frame: RelayFrame = serde_json::from_str(text)
            .map_err(|e| SignalingError::malformed("<unknown>", e.to_string()))?;

        let kind = InboundKind::from_name(&frame.event)
            .ok_or_else(|| SignalingError::UnknownEvent(frame.event.clone()))?;

        let data = match frame.data {
            serde_json::Value::Null => serde_json::Value::Object(Default::default()),
            other => other,
        };
        let raw: RawInbound = serde_json::from_value(serde_json::json!({
            "event": frame.event,
            "data": data,
        }))
        .map_err(|e| SignalingError::malformed(kind.name(), e.to_string()))?;

        raw.validate(kind)
    }
}

impl RawInbound {
    fn validate(self, kind: InboundKind) -> Result<InboundEvent, SignalingError> {
        let event = kind.name();
        let missing = |field: &str| SignalingError::malformed(event, format!("missing `{field}`"));

        match self {
            RawInbound::JoinedRoom { room_id } => {
                let room = room_id
                    .as_deref()
                    .and_then(RoomId::parse)
                    .ok_or_else(|| missing("roomId"))?;
                Ok(InboundEvent::JoinedRoom { room })
            }
            RawInbound::UserJoined { peer_id } => {
                let peer = peer_id
                    .as_deref()
                    .and_then(PeerIdentity::parse)
                    .ok_or_else(|| missing("peerId"))?;
                Ok(InboundEvent::UserJoined { peer })
            }
            RawInbound::IncomingCall { from, offer } => {
                let from = from
                    .as_deref()
                    .and_then(PeerIdentity::parse)
                    .ok_or_else(|| missing("from"))?;
                let offer = offer.ok_or_else(|| missing("offer"))?;
                Ok(InboundEvent::IncomingCall { from, offer })
            }
            RawInbound::CallAccept { from, answer } => {
                let answer = answer.ok_or_else(|| missing("answer"))?;
                Ok(InboundEvent::CallAccept {
                    from: from.as_deref().and_then(PeerIdentity::parse),
                    answer,
                })
            }
            RawInbound::EndCall { ended_by } => {
                let ended_by = match ended_by.as_deref().and_then(PeerIdentity::parse) {
                    Some(peer) => EndedBy::Peer(peer),
                    None => EndedBy::Unknown,
                };
                Ok(InboundEvent::EndCall { ended_by })
            }
        }
    }
}
