use crate::config::AppInfo;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

/// Free-form event properties, serialized as a JSON object.
pub type Properties = Map<String, Value>;

/// Classifies how an event was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Track,
    Page,
    Screen,
    Identify,
    Connect,
    Disconnect,
    Chain,
    Signature,
    Transaction,
}

impl EventKind {
    /// True for kinds synthesized by auto-capture rather than explicit calls.
    pub fn is_autocapture(self) -> bool {
        matches!(
            self,
            EventKind::Connect
                | EventKind::Disconnect
                | EventKind::Chain
                | EventKind::Signature
                | EventKind::Transaction
        )
    }
}

/// The session identity snapshot attributed to an event at enqueue time.
///
/// `identify` updates the session before any subsequently queued event is
/// built, and already-queued events keep the context they were created with.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct EventContext {
    pub device_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app: Option<AppInfo>,
}

/// An immutable analytics event. Once queued it is never mutated or
/// reordered relative to other events from the same session.
#[derive(Debug, Clone, Serialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub name: String,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub properties: Properties,
    pub timestamp: DateTime<Utc>,
    pub context: EventContext,
}
