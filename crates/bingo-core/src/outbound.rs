//! Frames a room actor pushes to a live connection.

use bingo_types::{ConnectionId, ServerMessage};
use tokio::sync::mpsc;

/// Close code for an orderly close (leave, kick, room closed, replaced).
/// Clients do not reconnect after it.
pub const CLOSE_NORMAL: u16 = 1000;

/// One frame for the transport writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outgoing {
    /// A serialized [`ServerMessage`].
    Text(String),
    /// Close the connection with this code and reason.
    Close {
        /// `WebSocket` close code.
        code: u16,
        /// Human-readable reason.
        reason: String,
    },
}

impl Outgoing {
    /// Serialize a message into a text frame.
    pub fn message(message: &ServerMessage) -> Result<Self, serde_json::Error> {
        serde_json::to_string(message).map(Self::Text)
    }
}

/// The room side of one attached connection.
#[derive(Debug, Clone)]
pub struct ConnectionSink {
    /// Connection identity; detaches must present it.
    pub id: ConnectionId,
    /// Bounded queue drained by the transport writer.
    pub tx: mpsc::Sender<Outgoing>,
}

impl ConnectionSink {
    /// A sink with a fresh id and a queue of `buffer` frames.
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<Outgoing>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (
            Self {
                id: ConnectionId::new(),
                tx,
            },
            rx,
        )
    }

    /// Queue a frame without waiting. Returns `false` if the frame was
    /// dropped because the queue is full or the writer is gone.
    pub fn push(&self, frame: Outgoing) -> bool {
        match self.tx.try_send(frame) {
            Ok(()) => true,
            Err(err) => {
                tracing::debug!(connection_id = %self.id, error = %err, "Dropped outbound frame");
                false
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use super::*;

    #[test]
    fn full_queue_drops_without_blocking() {
        let (sink, mut rx) = ConnectionSink::channel(1);
        assert!(sink.push(Outgoing::Text(String::from("a"))));
        assert!(!sink.push(Outgoing::Text(String::from("b"))));
        assert_eq!(rx.try_recv().unwrap(), Outgoing::Text(String::from("a")));
    }

    #[test]
    fn message_frames_are_json() {
        let frame = Outgoing::message(&ServerMessage::Heartbeat { timestamp: Utc::now() }).unwrap();
        assert!(matches!(&frame, Outgoing::Text(text) if text.contains("\"type\":\"HEARTBEAT\"")));
    }
}
