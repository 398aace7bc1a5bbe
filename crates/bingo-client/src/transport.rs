//! Pluggable `WebSocket` transport.
//!
//! [`ClientSession`](crate::ClientSession) only needs text frames out and
//! text or close frames in, so the socket sits behind [`Connector`] and
//! [`Connection`]. [`WsConnector`] is the `tokio-tungstenite` backed
//! implementation; tests substitute an in-memory one.

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::error::ClientError;

/// An inbound frame the session cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A JSON text frame.
    Text(String),
    /// The peer closed the socket.
    Close {
        /// Close code, absent when the peer sent an empty close frame.
        code: Option<u16>,
        /// Close reason.
        reason: String,
    },
}

/// An open connection.
pub trait Connection: Send {
    /// Send one text frame.
    fn send(&mut self, text: String) -> impl Future<Output = Result<(), ClientError>> + Send;

    /// Next inbound frame. `None` once the stream ended without a close
    /// frame.
    fn recv(&mut self) -> impl Future<Output = Option<Result<Frame, ClientError>>> + Send;

    /// Close the connection normally.
    fn close(&mut self) -> impl Future<Output = Result<(), ClientError>> + Send;
}

/// Opens connections to a URL.
pub trait Connector: Send + Sync + 'static {
    /// Connection type produced.
    type Connection: Connection + 'static;

    /// Open a connection to `url`.
    fn connect(&self, url: &str) -> impl Future<Output = Result<Self::Connection, ClientError>> + Send;
}

/// Connector backed by `tokio-tungstenite`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

/// A `tokio-tungstenite` socket.
#[derive(Debug)]
pub struct WsConnection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl Connector for WsConnector {
    type Connection = WsConnection;

    async fn connect(&self, url: &str) -> Result<WsConnection, ClientError> {
        let (stream, _response) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| ClientError::Transport(format!("connect to {url} failed: {e}")))?;
        Ok(WsConnection { stream })
    }
}

impl Connection for WsConnection {
    async fn send(&mut self, text: String) -> Result<(), ClientError> {
        self.stream
            .send(Message::Text(text.into()))
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))
    }

    async fn recv(&mut self) -> Option<Result<Frame, ClientError>> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(Frame::Text(text.as_str().to_owned()))),
                Ok(Message::Close(frame)) => {
                    let (code, reason) = frame.map_or((None, String::new()), |f| {
                        (Some(u16::from(f.code)), f.reason.as_str().to_owned())
                    });
                    return Some(Ok(Frame::Close { code, reason }));
                }
                // Pings are answered by tungstenite; binary frames are not
                // part of the protocol.
                Ok(Message::Binary(_) | Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => {}
                Err(e) => return Some(Err(ClientError::Transport(e.to_string()))),
            }
        }
    }

    async fn close(&mut self) -> Result<(), ClientError> {
        self.stream
            .close(None)
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))
    }
}
