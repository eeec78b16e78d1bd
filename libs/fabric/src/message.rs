//! JSON-RPC 2.0 message shapes spoken by the Mopidy HTTP frontend.
//!
//! Outbound traffic is always a [`CallMessage`]. Inbound traffic is either a
//! reply correlated by [`RequestId`] or an unsolicited event; both arrive on
//! the same socket and are told apart by [`InboundMessage`].

use std::fmt;

use encore_core::EventKind;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Protocol version sent with every call.
pub const JSONRPC_VERSION: &str = "2.0";

/// Named call parameters.
pub type Params = Map<String, Value>;

/// Identifier correlating a call with its reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(u64);

impl From<u64> for RequestId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// An outgoing remote procedure call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallMessage {
    pub jsonrpc: &'static str,
    pub id: RequestId,
    pub method: String,
    pub params: Params,
}

impl CallMessage {
    pub fn new(id: RequestId, method: impl Into<String>, params: Params) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            method: method.into(),
            params,
        }
    }
}

/// JSON-RPC error object returned in place of a result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Reply to a call.
///
/// `id` is `None` when the server could not parse the request it answers.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultMessage {
    pub id: Option<RequestId>,
    pub outcome: Result<Value, RemoteError>,
}

/// Server-initiated notification.
#[derive(Debug, Clone, PartialEq)]
pub struct EventMessage {
    pub event: String,
    pub data: Map<String, Value>,
}

impl EventMessage {
    /// Recognized kind of this event, if the name is one the client knows.
    pub fn kind(&self) -> encore_core::Result<EventKind> {
        self.event.parse()
    }
}

/// Anything the server may send.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    Result(ResultMessage),
    Event(EventMessage),
}

impl<'de> Deserialize<'de> for InboundMessage {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let mut object = Map::<String, Value>::deserialize(deserializer)?;

        if let Some(event) = object.remove("event") {
            let Value::String(event) = event else {
                return Err(de::Error::custom("event name must be a string"));
            };
            return Ok(InboundMessage::Event(EventMessage {
                event,
                data: event_payload(object),
            }));
        }

        let Some(id) = object.remove("id") else {
            return Err(de::Error::custom("message carries neither `id` nor `event`"));
        };
        let id = Option::<RequestId>::deserialize(id).map_err(de::Error::custom)?;

        let outcome = match (object.remove("error"), object.remove("result")) {
            (Some(error), _) if !error.is_null() => {
                Err(RemoteError::deserialize(error).map_err(de::Error::custom)?)
            }
            (_, Some(result)) => Ok(result),
            (_, None) => {
                return Err(de::Error::custom(
                    "reply carries neither `result` nor `error`",
                ))
            }
        };

        Ok(InboundMessage::Result(ResultMessage { id, outcome }))
    }
}

/// Mopidy flattens event fields next to `event`; an explicit `data` envelope
/// is unwrapped when it is the only other field.
fn event_payload(mut rest: Map<String, Value>) -> Map<String, Value> {
    match rest.remove("data") {
        Some(Value::Object(data)) if rest.is_empty() => data,
        Some(other) => {
            rest.insert("data".to_string(), other);
            rest
        }
        None => rest,
    }
}
