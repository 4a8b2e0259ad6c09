//! REST resource types for the deCONZ gateway api.
//!
//! Field names follow the wire format verbatim (all lowercase, no
//! separators), matching what the gateway returns for `GET /lights`,
//! `GET /sensors` and `GET /config`.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::date_format;

/// A light as returned by `GET /lights` and `GET /lights/{id}`.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct Light {
    pub name: String,
    #[serde(default)]
    pub uniqueid: Option<String>,
    #[serde(default, rename = "type")]
    pub light_type: Option<String>,
    #[serde(default)]
    pub modelid: Option<String>,
    #[serde(default)]
    pub state: LightState,
}

/// On/off oriented slice of a light's state.
///
/// `on` stays absent for device types the gateway cannot report a switch
/// state for (e.g. range extenders), and until the gateway has actually
/// heard from the device.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct LightState {
    #[serde(default)]
    pub on: Option<bool>,
    #[serde(default)]
    pub reachable: Option<bool>,
}

/// A sensor as returned by `GET /sensors`.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct Sensor {
    pub name: String,
    #[serde(default, rename = "type")]
    pub sensor_type: Option<String>,
    #[serde(default)]
    pub modelid: Option<String>,
    #[serde(default)]
    pub config: SensorConfig,
    #[serde(default)]
    pub state: SensorState,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct SensorConfig {
    #[serde(default)]
    pub battery: Option<u8>,
    #[serde(default)]
    pub reachable: Option<bool>,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct SensorState {
    #[serde(default)]
    pub buttonevent: Option<u32>,
    #[serde(default, with = "date_format::last_updated")]
    pub lastupdated: Option<NaiveDateTime>,
}

/// The subset of `GET /config` the bridge needs: the push-event stream
/// lives on a separate port which is only discoverable here.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct GatewayConfig {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub apiversion: Option<String>,
    #[serde(default)]
    pub swversion: Option<String>,
    pub websocketport: u16,
}
