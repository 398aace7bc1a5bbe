//! Client side of the Buzzword Bingo coordinator.
//!
//! - [`BingoApi`] wraps the REST surface (create, join, status, leave,
//!   kick, settings).
//! - [`ClientSession`] keeps a room `WebSocket` alive: heartbeats, an
//!   offline send queue, linear-backoff reconnects, and a [`LocalView`] of
//!   the room rebuilt from server pushes.
//!
//! The socket is abstracted behind [`Connector`] so the session logic can
//! be driven without a network.

pub mod api;
pub mod config;
pub mod error;
pub mod session;
pub mod transport;
pub mod view;

pub use api::BingoApi;
pub use config::ClientConfig;
pub use error::ClientError;
pub use session::{
    CLOSE_NORMAL, ClientSession, ConnectionStatus, MAX_ATTEMPTS_ERROR, NoopHandler, SessionHandle,
    SessionHandler,
};
pub use transport::{Connection, Connector, Frame, WsConnection, WsConnector};
pub use view::LocalView;
