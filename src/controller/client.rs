//! Thin websocket adapter toward the show controller.
//!
//! Inbound frames update the desired port map; decoded presses and hub
//! connection status flow outward. Everything interesting happens on the
//! other side of the channel pair, so this stays a dumb pipe that any other
//! transport could replace.

use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::net::TcpStream;
use tokio::time::sleep;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use deconz::button::PressValue;

use crate::config::ControllerConfig;
use crate::controller::{AdapterHandles, PortMap};
use crate::error::{ApiError, ApiResult};
use crate::service::Service;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum ControllerFrame {
    Inputs {
        #[serde(default)]
        ports: PortMap,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum BridgeFrame<'a> {
    Event { name: &'a str, value: PressValue },
    Status { connected: bool },
}

pub struct ControllerLink {
    config: ControllerConfig,
    handles: AdapterHandles,
    ws: Option<WsStream>,
    retry_delay: Duration,
}

const RETRY_DELAY_MIN: Duration = Duration::from_secs(1);
const RETRY_DELAY_MAX: Duration = Duration::from_secs(60);

impl ControllerLink {
    #[must_use]
    pub const fn new(config: ControllerConfig, handles: AdapterHandles) -> Self {
        Self {
            config,
            handles,
            ws: None,
            retry_delay: RETRY_DELAY_MIN,
        }
    }

    async fn connect(&mut self) -> ApiResult<()> {
        let (mut socket, _response) = connect_async(self.config.url.as_str()).await?;

        // Late subscribers should not have to wait for the next status flip.
        let connected = *self.handles.connected.borrow();
        send_frame(&mut socket, &BridgeFrame::Status { connected }).await?;

        log::info!("Controller link established ({})", self.config.url);
        self.ws = Some(socket);
        self.retry_delay = RETRY_DELAY_MIN;
        Ok(())
    }

    fn handle_frame(&self, text: &str) {
        match serde_json::from_str(text) {
            Ok(ControllerFrame::Inputs { ports }) => {
                self.handles.ports.send_replace(ports);
            }
            Ok(ControllerFrame::Other) => {}
            Err(err) => log::warn!("Dropping malformed controller frame: {err}"),
        }
    }

    async fn event_loop(&mut self) -> ApiResult<()> {
        loop {
            if let Some(ws) = &mut self.ws {
                tokio::select! {
                    msg = ws.next() => match msg {
                        Some(Ok(Message::Text(text))) => self.handle_frame(&text),
                        Some(Ok(Message::Close(_))) | None => {
                            log::warn!("Controller closed the connection");
                            self.ws = None;
                        }
                        Some(Ok(_)) => {}
                        Some(Err(err)) => {
                            log::warn!("Controller connection lost: {err}");
                            self.ws = None;
                        }
                    },
                    event = self.handles.events.recv() => {
                        let Some(event) = event else {
                            return Err(ApiError::service_error("bridge event channel closed"));
                        };
                        let frame = BridgeFrame::Event {
                            name: &event.name,
                            value: event.value,
                        };
                        if let Err(err) = send_frame(ws, &frame).await {
                            log::warn!("Failed to forward {:?}: {err}", event.name);
                            self.ws = None;
                        }
                    },
                    changed = self.handles.connected.changed() => {
                        changed?;
                        let connected = *self.handles.connected.borrow_and_update();
                        if let Err(err) = send_frame(ws, &BridgeFrame::Status { connected }).await {
                            log::warn!("Failed to push status update: {err}");
                            self.ws = None;
                        }
                    },
                }
            } else {
                sleep(self.retry_delay).await;
                if let Err(err) = self.connect().await {
                    log::warn!(
                        "Controller connect failed (retrying in {:?}): {err}",
                        self.retry_delay
                    );
                    self.retry_delay = (self.retry_delay * 2).min(RETRY_DELAY_MAX);
                }
            }
        }
    }
}

async fn send_frame(ws: &mut WsStream, frame: &BridgeFrame<'_>) -> ApiResult<()> {
    let text = serde_json::to_string(frame)?;
    ws.send(Message::Text(text.into())).await?;
    Ok(())
}

#[async_trait]
impl Service for ControllerLink {
    type Error = ApiError;

    async fn run(&mut self) -> ApiResult<()> {
        self.event_loop().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inputs_frame_parses() {
        let frame: ControllerFrame = serde_json::from_str(
            r#"{"type": "inputs", "ports": {"Hall lamp": true, "Spot": false}}"#,
        )
        .unwrap();
        let ControllerFrame::Inputs { ports } = frame else {
            panic!("expected inputs frame");
        };
        assert_eq!(ports.get("Hall lamp"), Some(&true));
        assert_eq!(ports.get("Spot"), Some(&false));
    }

    #[test]
    fn unknown_frames_are_tolerated() {
        let frame: ControllerFrame =
            serde_json::from_str(r#"{"type": "heartbeat", "seq": 17}"#).unwrap();
        assert!(matches!(frame, ControllerFrame::Other));
    }

    #[test]
    fn outbound_frames_have_a_type_tag() {
        let json = serde_json::to_string(&BridgeFrame::Status { connected: true }).unwrap();
        assert_eq!(json, r#"{"type":"status","connected":true}"#);

        let json = serde_json::to_string(&BridgeFrame::Event {
            name: "Hall switch",
            value: PressValue::Toggle(false),
        })
        .unwrap();
        assert_eq!(json, r#"{"type":"event","name":"Hall switch","value":false}"#);
    }
}
