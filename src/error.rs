use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Unified error type for the bridge.
///
/// Hub REST failures keep the operation name so a log line identifies the
/// endpoint without a backtrace. Everything else converts straight from the
/// underlying library error.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("hub request {operation} failed: {source}")]
    HubRequest {
        operation: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("hub request {operation} returned {status}")]
    HubStatus {
        operation: String,
        status: reqwest::StatusCode,
    },

    #[error("sensor {0} was never snapshotted and the event names no sensor")]
    UnresolvedSensorName(String),

    #[error("service error: {0}")]
    Service(String),

    /* conversion errors */
    #[error(transparent)]
    Websocket(#[from] tungstenite::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    UrlParse(#[from] url::ParseError),

    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Logger(#[from] log::SetLoggerError),

    #[error(transparent)]
    WatchClosed(#[from] tokio::sync::watch::error::RecvError),
}

impl ApiError {
    pub fn service_error(msg: impl Into<String>) -> Self {
        Self::Service(msg.into())
    }

    /// Wrap a reqwest failure with the hub operation it belongs to.
    pub fn hub_request(operation: impl Into<String>, source: reqwest::Error) -> Self {
        Self::HubRequest {
            operation: operation.into(),
            source,
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
