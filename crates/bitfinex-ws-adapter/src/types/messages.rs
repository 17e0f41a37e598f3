/*
[INPUT]:  Subscription requests, auth data, command payloads, raw inbound JSON
[OUTPUT]: Wire messages for both feeds and classified inbound events
[POS]:    Data layer - JSON framing shared by the public and private feeds
[UPDATE]: When the wire envelope or event discriminators change
*/

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use super::enums::OpCode;

/// Parameters of a subscription (symbol, prec, freq, len, key, ...)
pub type ChannelParams = Map<String, Value>;

/// A subscription that has not been acknowledged yet
#[derive(Debug, Clone, PartialEq)]
pub struct SubscribeRequest {
    pub channel: String,
    pub params: ChannelParams,
}

impl SubscribeRequest {
    pub fn new(channel: impl Into<String>, params: ChannelParams) -> Self {
        Self {
            channel: channel.into(),
            params,
        }
    }

    /// `{"event":"subscribe","channel":...,...params}`
    pub fn to_message(&self) -> Value {
        let mut message = Map::with_capacity(self.params.len() + 2);
        message.insert("event".to_string(), Value::from("subscribe"));
        message.insert("channel".to_string(), Value::from(self.channel.as_str()));
        for (key, value) in &self.params {
            message.insert(key.clone(), value.clone());
        }
        Value::Object(message)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnsubscribeMessage {
    pub event: String,
    #[serde(rename = "chanId")]
    pub chan_id: u64,
}

impl UnsubscribeMessage {
    pub fn new(chan_id: u64) -> Self {
        Self {
            event: "unsubscribe".to_string(),
            chan_id,
        }
    }
}

/// Private feed handshake
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthMessage {
    pub api_key: String,
    pub auth_sig: String,
    pub auth_nonce: u64,
    pub auth_payload: String,
    pub event: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<Vec<String>>,
}

/// Private feed command, serialized as `[0, op, null, payload]`
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope<T> {
    pub op: OpCode,
    pub payload: T,
}

impl<T> Envelope<T> {
    pub fn new(op: OpCode, payload: T) -> Self {
        Self { op, payload }
    }
}

impl<T: Serialize> Serialize for Envelope<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (0u8, self.op, (), &self.payload).serialize(serializer)
    }
}

/// An acknowledged subscription
///
/// Holds the server-assigned channel id plus every parameter echoed in the ack.
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionRecord {
    pub chan_id: u64,
    pub channel: String,
    pub params: ChannelParams,
}

impl SubscriptionRecord {
    /// Build from a `subscribed` ack with the `event` key already removed
    pub fn from_ack(mut ack: Map<String, Value>) -> Option<Self> {
        let chan_id = ack.remove("chanId")?.as_u64()?;
        let channel = match ack.remove("channel")? {
            Value::String(channel) => channel,
            _ => return None,
        };
        Some(Self {
            chan_id,
            channel,
            params: ack,
        })
    }

    /// A fresh request for the same channel, without the old channel id
    pub fn to_request(&self) -> SubscribeRequest {
        SubscribeRequest::new(self.channel.clone(), self.params.clone())
    }
}

/// Inbound frames the public feed reacts to
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    /// `event: "subscribed"`, payload without the `event` key
    Subscribed(Map<String, Value>),
    /// `event: "unsubscribed"`
    Unsubscribed { chan_id: Option<u64>, ok: bool },
    /// Anything else: channel data, info, errors, heartbeats
    Other,
}

impl InboundEvent {
    pub fn classify(value: &Value) -> Self {
        let Some(object) = value.as_object() else {
            return InboundEvent::Other;
        };
        match object.get("event").and_then(Value::as_str) {
            Some("subscribed") => {
                let mut ack = object.clone();
                ack.remove("event");
                InboundEvent::Subscribed(ack)
            }
            Some("unsubscribed") => InboundEvent::Unsubscribed {
                chan_id: object.get("chanId").and_then(Value::as_u64),
                ok: object.get("status").and_then(Value::as_str) == Some("OK"),
            },
            _ => InboundEvent::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> ChannelParams {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_subscribe_message_is_flat() {
        let request = SubscribeRequest::new(
            "book",
            params(json!({ "symbol": "tBTCUSD", "prec": "P0", "freq": "F0", "len": 25 })),
        );
        assert_eq!(
            request.to_message().to_string(),
            r#"{"event":"subscribe","channel":"book","symbol":"tBTCUSD","prec":"P0","freq":"F0","len":25}"#
        );
    }

    #[test]
    fn test_unsubscribe_message() {
        let message = serde_json::to_string(&UnsubscribeMessage::new(17)).unwrap();
        assert_eq!(message, r#"{"event":"unsubscribe","chanId":17}"#);
    }

    #[test]
    fn test_auth_message_keys() {
        let message = AuthMessage {
            api_key: "k".into(),
            auth_sig: "s".into(),
            auth_nonce: 1,
            auth_payload: "AUTH1".into(),
            event: "auth".into(),
            filter: None,
        };
        assert_eq!(
            serde_json::to_string(&message).unwrap(),
            r#"{"apiKey":"k","authSig":"s","authNonce":1,"authPayload":"AUTH1","event":"auth"}"#
        );
    }

    #[test]
    fn test_envelope_shape() {
        let envelope = Envelope::new(OpCode::CancelOffer, json!({ "id": 5 }));
        assert_eq!(
            serde_json::to_string(&envelope).unwrap(),
            r#"[0,"foc",null,{"id":5}]"#
        );
    }

    #[test]
    fn test_classify_subscribed() {
        let frame = json!({
            "event": "subscribed",
            "channel": "ticker",
            "chanId": 224555,
            "symbol": "tBTCUSD",
            "pair": "BTCUSD"
        });
        let InboundEvent::Subscribed(ack) = InboundEvent::classify(&frame) else {
            panic!("expected subscribed");
        };
        assert!(ack.get("event").is_none());

        let record = SubscriptionRecord::from_ack(ack).unwrap();
        assert_eq!(record.chan_id, 224555);
        assert_eq!(record.channel, "ticker");
        assert_eq!(
            record.to_request().to_message(),
            json!({ "event": "subscribe", "channel": "ticker", "symbol": "tBTCUSD", "pair": "BTCUSD" })
        );
    }

    #[test]
    fn test_classify_unsubscribed_and_other() {
        assert_eq!(
            InboundEvent::classify(&json!({ "event": "unsubscribed", "status": "OK", "chanId": 3 })),
            InboundEvent::Unsubscribed { chan_id: Some(3), ok: true }
        );
        assert_eq!(
            InboundEvent::classify(&json!({ "event": "unsubscribed", "status": "FAILED", "chanId": 3 })),
            InboundEvent::Unsubscribed { chan_id: Some(3), ok: false }
        );
        assert_eq!(InboundEvent::classify(&json!([3, "hb"])), InboundEvent::Other);
        assert_eq!(
            InboundEvent::classify(&json!({ "event": "info", "version": 2 })),
            InboundEvent::Other
        );
    }

    #[test]
    fn test_record_requires_chan_id() {
        assert!(SubscriptionRecord::from_ack(params(json!({ "channel": "ticker" }))).is_none());
    }
}
