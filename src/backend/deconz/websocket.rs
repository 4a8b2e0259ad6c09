use futures::StreamExt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use deconz::event::PushEvent;

use crate::error::ApiResult;

/// The gateway's push-event stream.
pub struct DeconzWs {
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl DeconzWs {
    pub async fn connect(url: &str) -> ApiResult<Self> {
        let (socket, _response) = connect_async(url).await?;
        Ok(Self { socket })
    }

    /// Next decodable push event, or `None` once the stream is finished.
    ///
    /// Non-text frames are skipped and malformed JSON is dropped with a log
    /// line; neither closes the connection. Transport errors do.
    pub async fn next_event(&mut self) -> ApiResult<Option<PushEvent>> {
        loop {
            let Some(msg) = self.socket.next().await else {
                return Ok(None);
            };

            match msg? {
                Message::Text(text) => match serde_json::from_str::<PushEvent>(&text) {
                    Ok(event) => return Ok(Some(event)),
                    Err(err) => log::warn!("Dropping malformed push frame: {err}"),
                },
                Message::Close(_) => return Ok(None),
                _ => {}
            }
        }
    }
}
