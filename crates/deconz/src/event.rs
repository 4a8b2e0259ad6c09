//! Push-notification frames from the gateway's websocket.
//!
//! Every frame is a JSON object `{e, r, id, ...}` where `e` names the kind
//! of change and `r` the resource collection it applies to. Unknown kinds
//! and collections must parse (new gateway firmware adds both), so both
//! enums carry an `Other` catch-all.

use serde::Deserialize;

use crate::api::{SensorConfig, SensorState};

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    Added,
    Changed,
    Deleted,
    SceneCalled,
    #[serde(other)]
    Other,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Groups,
    Lights,
    Sensors,
    #[serde(other)]
    Other,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct EventAttr {
    #[serde(default)]
    pub name: Option<String>,
}

/// A single push notification.
///
/// For light events the gateway includes a shallow `state` payload, but it
/// is not authoritative for the switch state; consumers re-read the light
/// over REST instead of interpreting it. For sensor events `state` and
/// `config` carry only the fields that changed.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct PushEvent {
    pub e: EventKind,
    pub r: ResourceKind,
    pub id: String,
    #[serde(default)]
    pub attr: Option<EventAttr>,
    #[serde(default)]
    pub state: Option<SensorState>,
    #[serde(default)]
    pub config: Option<SensorConfig>,
}
