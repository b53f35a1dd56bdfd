//! Signaling messages exchanged with remote peers.
//!
//! One [`CallMessage`] is one network send. ICE candidates are batched: a
//! single message carries every candidate produced in one engine callback.

use crate::types::{CallId, HangupType, OfferType};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferMessage {
    pub call_id: u64,
    pub sdp: Option<String>,
    pub offer_type: OfferType,
    pub opaque: Option<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerMessage {
    pub call_id: u64,
    pub sdp: Option<String>,
    pub opaque: Option<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusyMessage {
    pub call_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HangupMessage {
    pub call_id: u64,
    pub hangup_type: HangupType,
    pub device_id: u32,
    pub legacy: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceUpdateMessage {
    pub call_id: u64,
    pub opaque: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpaqueMessage {
    pub opaque: Vec<u8>,
    pub urgent: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallMessageBody {
    Offer(OfferMessage),
    Answer(AnswerMessage),
    Busy(BusyMessage),
    Hangup(HangupMessage),
    IceUpdate(Vec<IceUpdateMessage>),
    Opaque(OpaqueMessage),
}

/// A signaling message plus its delivery options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallMessage {
    pub body: CallMessageBody,
    /// The 1:1 call the send result is reported against; local only.
    #[serde(skip)]
    call_id: Option<CallId>,
    pub multi_ring: bool,
    /// `None` broadcasts to every device of the recipient.
    pub destination_device_id: Option<u32>,
}

impl CallMessage {
    fn new(
        body: CallMessageBody,
        call_id: Option<CallId>,
        multi_ring: bool,
        destination_device_id: Option<u32>,
    ) -> Self {
        Self {
            body,
            call_id,
            multi_ring,
            destination_device_id,
        }
    }

    pub fn for_offer(
        offer: OfferMessage,
        multi_ring: bool,
        destination_device_id: Option<u32>,
    ) -> Self {
        let call_id = Some(CallId::new(offer.call_id));
        Self::new(CallMessageBody::Offer(offer), call_id, multi_ring, destination_device_id)
    }

    pub fn for_answer(
        answer: AnswerMessage,
        multi_ring: bool,
        destination_device_id: Option<u32>,
    ) -> Self {
        let call_id = Some(CallId::new(answer.call_id));
        Self::new(CallMessageBody::Answer(answer), call_id, multi_ring, destination_device_id)
    }

    pub fn for_busy(busy: BusyMessage, multi_ring: bool, destination_device_id: Option<u32>) -> Self {
        let call_id = Some(CallId::new(busy.call_id));
        Self::new(CallMessageBody::Busy(busy), call_id, multi_ring, destination_device_id)
    }

    pub fn for_hangup(
        hangup: HangupMessage,
        multi_ring: bool,
        destination_device_id: Option<u32>,
    ) -> Self {
        let call_id = Some(CallId::new(hangup.call_id));
        Self::new(CallMessageBody::Hangup(hangup), call_id, multi_ring, destination_device_id)
    }

    /// A batch of candidates for `call_id`, reported against that call even when empty.
    pub fn for_ice_updates(
        call_id: CallId,
        updates: Vec<IceUpdateMessage>,
        multi_ring: bool,
        destination_device_id: Option<u32>,
    ) -> Self {
        Self::new(
            CallMessageBody::IceUpdate(updates),
            Some(call_id),
            multi_ring,
            destination_device_id,
        )
    }

    pub fn for_opaque(opaque: OpaqueMessage) -> Self {
        Self::new(CallMessageBody::Opaque(opaque), None, false, None)
    }

    pub fn kind(&self) -> &'static str {
        match self.body {
            CallMessageBody::Offer(_) => "offer",
            CallMessageBody::Answer(_) => "answer",
            CallMessageBody::Busy(_) => "busy",
            CallMessageBody::Hangup(_) => "hangup",
            CallMessageBody::IceUpdate(_) => "ice_update",
            CallMessageBody::Opaque(_) => "opaque",
        }
    }

    /// The 1:1 call this message belongs to; opaque group traffic has none.
    pub fn call_id(&self) -> Option<CallId> {
        self.call_id
    }

    pub fn is_broadcast(&self) -> bool {
        self.destination_device_id.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_id_and_kind() {
        let hangup = CallMessage::for_hangup(
            HangupMessage {
                call_id: 77,
                hangup_type: HangupType::Declined,
                device_id: 2,
                legacy: false,
            },
            true,
            Some(2),
        );
        assert_eq!(hangup.kind(), "hangup");
        assert_eq!(hangup.call_id(), Some(CallId::new(77)));
        assert!(!hangup.is_broadcast());

        let opaque = CallMessage::for_opaque(OpaqueMessage {
            opaque: vec![1, 2, 3],
            urgent: true,
        });
        assert_eq!(opaque.call_id(), None);
        assert!(opaque.is_broadcast());

        let empty_ice = CallMessage::for_ice_updates(CallId::new(9), vec![], true, None);
        assert_eq!(empty_ice.call_id(), Some(CallId::new(9)));
    }

    #[test]
    fn test_wire_shape_is_tagged_by_kind() {
        let busy = CallMessage::for_busy(BusyMessage { call_id: 5 }, true, None);
        let json = serde_json::to_value(&busy).unwrap();

        assert_eq!(json["body"]["busy"]["call_id"], 5);
        assert_eq!(json["destination_device_id"], serde_json::Value::Null);
    }
}
