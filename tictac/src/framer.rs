//! Reading & writing whole packets on a connection.

use byteorder::{ByteOrder, NetworkEndian};
use futures::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tictac_protocol::{obfuscate_body, HeaderInfo, Packet, PacketFlags, PacketType};
use tictac_protocol::{Deserialize, DeserializeError, PacketBody, Serialize, SerializeError};

use super::SessionError;


/// A packet as read off the wire, with its body still obfuscated until [`RawPacket::obfuscate`] is called.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawPacket {
    header: HeaderInfo,
    packet_type: PacketType,
    body: Vec<u8>,
}

impl RawPacket {
    pub(crate) fn header(&self) -> &HeaderInfo {
        &self.header
    }

    pub(crate) fn packet_type(&self) -> PacketType {
        self.packet_type
    }

    pub(crate) fn body(&self) -> &[u8] {
        &self.body
    }

    /// Whether the body of this packet was sent in cleartext.
    pub(crate) fn is_unencrypted(&self) -> bool {
        self.header.flags().contains(PacketFlags::UNENCRYPTED)
    }

    /// Obfuscates or deobfuscates the body in place, which are the same operation.
    ///
    /// Nothing happens for packets with the `UNENCRYPTED` flag set.
    pub(crate) fn obfuscate(&mut self, secret_key: &[u8]) {
        if !self.is_unencrypted() {
            obfuscate_body(&self.header, secret_key, &mut self.body);
        }
    }

    /// Parses the (already deobfuscated) body as a `B`.
    pub(crate) fn decode_body<'raw, B>(&'raw self) -> Result<B, DeserializeError>
    where
        B: PacketBody + Deserialize<'raw>,
    {
        if self.packet_type != B::TYPE {
            return Err(DeserializeError::PacketTypeMismatch {
                expected: B::TYPE,
                actual: self.packet_type,
            });
        }

        B::deserialize_from_buffer(&self.body)
    }
}

/// Serializes a packet, obfuscating its body unless its header has the `UNENCRYPTED` flag set.
pub(crate) fn encode_packet<B: PacketBody + Serialize>(
    packet: Packet<B>,
    secret_key: &[u8],
) -> Result<Vec<u8>, SerializeError> {
    // allocate zero-filled buffer large enough to hold packet
    let mut packet_buffer = vec![0; packet.wire_size()];

    let length = if packet.header().flags().contains(PacketFlags::UNENCRYPTED) {
        packet.serialize_unobfuscated(&mut packet_buffer)?
    } else {
        packet.serialize(secret_key, &mut packet_buffer)?
    };

    packet_buffer.truncate(length);
    Ok(packet_buffer)
}

/// Reads exactly one packet from a connection.
///
/// The header is validated before any of the body is read, and bodies longer than
/// `max_body_length` are rejected without being read at all.
pub(crate) async fn read_packet<S>(
    connection: &mut S,
    max_body_length: u32,
) -> Result<RawPacket, SessionError>
where
    S: AsyncRead + Unpin,
{
    let mut header_buffer = [0; HeaderInfo::HEADER_SIZE_BYTES];
    read_full(connection, &mut header_buffer).await?;

    let header = HeaderInfo::try_from(header_buffer.as_slice())?;
    let packet_type = HeaderInfo::extract_packet_type(&header_buffer)?;

    // read rest of body based on length reported in header
    let body_length = NetworkEndian::read_u32(&header_buffer[8..12]);
    if body_length > max_body_length {
        return Err(SessionError::BodyTooLarge {
            length: body_length,
            max: max_body_length,
        });
    }

    let mut body = vec![0; body_length as usize];
    read_full(connection, &mut body).await?;

    Ok(RawPacket {
        header,
        packet_type,
        body,
    })
}

/// Writes a serialized packet to a connection.
pub(crate) async fn write_packet<S>(connection: &mut S, packet: &[u8]) -> Result<(), SessionError>
where
    S: AsyncWrite + Unpin,
{
    connection.write_all(packet).await?;
    connection.flush().await.map_err(Into::into)
}

/// Fills `buffer` from the connection, reporting an early EOF as a truncated packet.
async fn read_full<S>(connection: &mut S, buffer: &mut [u8]) -> Result<(), SessionError>
where
    S: AsyncRead + Unpin,
{
    connection
        .read_exact(buffer)
        .await
        .map_err(|err| match err.kind() {
            futures::io::ErrorKind::UnexpectedEof => SessionError::Truncated,
            _ => SessionError::IOError(err),
        })
}
