use std::num::NonZeroU32;

use camino::Utf8Path;
use config::{Config, ConfigError};
use serde::{Deserialize, Serialize};
use url::Url;

use deconz::button::PressFormat;

/// Connection settings for the deCONZ gateway.
#[derive(Clone, Debug, Deserialize, Serialize, Eq, PartialEq)]
pub struct DeconzServer {
    pub host: String,
    pub port: u16,
    pub api_key: String,
    /// Optional full-snapshot resync interval. Without it the cache is
    /// seeded on (re)connect and kept fresh by push events alone.
    pub poll_interval_secs: Option<NonZeroU32>,
    #[serde(default)]
    pub press_format: PressFormat,
}

/// Where to reach the show controller.
#[derive(Clone, Debug, Deserialize, Serialize, Eq, PartialEq)]
pub struct ControllerConfig {
    pub url: Url,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct AppConfig {
    pub deconz: DeconzServer,
    pub controller: ControllerConfig,
}

pub fn parse(filename: &Utf8Path) -> Result<AppConfig, ConfigError> {
    let settings = Config::builder()
        .set_default("deconz.port", 80)?
        .set_default("controller.url", "ws://127.0.0.1:12095")?
        .add_source(config::File::with_name(filename.as_str()))
        .build()?;

    settings.try_deserialize()
}
