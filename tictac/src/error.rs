use std::net::IpAddr;

use futures::io;
use thiserror::Error;

use tictac_protocol as protocol;
use tictac_protocol::PacketType;

/// An error that ended a TACACS+ session.
///
/// Every variant closes the connection the session was running on; none of them
/// are reported to the peer beyond that.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SessionError {
    /// An error occurred when reading/writing a packet.
    #[error(transparent)]
    IOError(#[from] io::Error),

    /// The connection ended before a full packet was received.
    #[error("connection closed in the middle of a packet")]
    Truncated,

    /// The peer did not send anything within the configured read timeout.
    #[error("timed out waiting for a packet from the client")]
    TimedOut,

    /// The session was cancelled by connection teardown or server shutdown.
    #[error("session was cancelled")]
    Cancelled,

    /// No shared secret is configured for the peer.
    #[error("no shared secret configured for {0}")]
    NoSecretForPeer(IpAddr),

    /// Invalid packet received from a client.
    ///
    /// A [`WrongBodyBufferSize`](protocol::DeserializeError::WrongBodyBufferSize) inner error
    /// usually means the client and server disagree on the shared secret.
    #[error("invalid packet received from client: {0}")]
    InvalidPacketReceived(#[from] protocol::DeserializeError),

    /// Error when serializing a reply to the wire.
    #[error(transparent)]
    SerializeError(#[from] protocol::SerializeError),

    /// The declared body length exceeded the configured maximum.
    #[error("packet body of {length} bytes exceeds maximum of {max}")]
    BodyTooLarge {
        /// The body length declared in the packet header.
        length: u32,
        /// The maximum body length accepted by the server.
        max: u32,
    },

    /// A packet with a cleartext body was received, but those are not allowed.
    #[error("unencrypted packet received but unencrypted sessions are disabled")]
    UnencryptedPacket,

    /// The session id changed in the middle of a session.
    #[error("session id mismatch: expected {expected:#x}, got {actual:#x}")]
    SessionIdMismatch {
        /// The session id pinned by the first packet of the connection.
        expected: u32,
        /// The session id of the offending packet.
        actual: u32,
    },

    /// Sequence number in a client packet did not match what was expected.
    #[error("sequence number mismatch: expected {expected}, got {actual}")]
    SequenceNumberMismatch {
        /// The packet sequence number expected from the client.
        expected: u8,
        /// The actual packet sequence number received from the client.
        actual: u8,
    },

    /// Sequence number overflowed in session.
    ///
    /// This termination is required per [section 4.1 of RFC8907].
    ///
    /// [section 4.1 of RFC8907]: https://www.rfc-editor.org/rfc/rfc8907.html#section-4.1-13.2.1
    #[error("sequence number overflowed maximum, so session was terminated")]
    SequenceNumberOverflow,

    /// A packet type other than authentication was received.
    #[error("{0} packets are not supported")]
    UnsupportedPacketType(PacketType),

    /// A packet arrived that does not fit the current point of the exchange.
    #[error("unexpected message while {state}")]
    UnexpectedMessage {
        /// A description of what the session was doing at the time.
        state: &'static str,
    },
}
