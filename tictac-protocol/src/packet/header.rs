use getset::{CopyGetters, MutGetters};

use super::{PacketFlags, PacketType};
use crate::cursor::{ReadCursor, WriteCursor};
use crate::{DeserializeError, SerializeError, Version};

/// Information included in a TACACS+ packet header.
#[derive(PartialEq, Eq, Debug, Clone, CopyGetters, MutGetters)]
pub struct HeaderInfo {
    #[getset(get_copy = "pub", get_mut = "pub(crate)")]
    /// The protocol major and minor version.
    version: Version,

    #[getset(get_copy = "pub")]
    /// The sequence number of the packet. This should be odd for client packets, and even for server packets.
    sequence_number: u8,

    #[getset(get_copy = "pub", get_mut = "pub(crate)")]
    /// Session/packet flags.
    flags: PacketFlags,

    #[getset(get_copy = "pub")]
    /// ID of the current session.
    session_id: u32,
}

impl HeaderInfo {
    /// Size of a full TACACS+ packet header.
    pub const HEADER_SIZE_BYTES: usize = 12;

    /// Offset of the packet type byte within the header.
    const TYPE_OFFSET: usize = 1;

    /// Offset of the body length field within the header.
    const LENGTH_OFFSET: usize = 8;

    /// Bundles some information to be put in the header of a TACACS+ packet.
    pub fn new(version: Version, sequence_number: u8, flags: PacketFlags, session_id: u32) -> Self {
        Self {
            version,
            sequence_number,
            flags,
            session_id,
        }
    }

    /// Whether the client offered to multiplex sessions over this connection.
    pub fn single_connection(&self) -> bool {
        self.flags.contains(PacketFlags::SINGLE_CONNECTION)
    }

    /// Serializes the information stored in a `HeaderInfo` struct, along with the supplemented information to form a complete header.
    pub fn serialize(
        &self,
        buffer: &mut [u8],
        packet_type: PacketType,
        body_length: u32,
    ) -> Result<usize, SerializeError> {
        let mut cursor = WriteCursor::new(buffer);

        cursor.write_u8(self.version.into())?;
        cursor.write_u8(packet_type as u8)?;
        cursor.write_u8(self.sequence_number)?;
        cursor.write_u8(self.flags.bits())?;

        // session id is middle 4 bytes of header, body length the last 4
        cursor.write_u32(self.session_id)?;
        cursor.write_u32(body_length)?;

        Ok(cursor.position())
    }

    /// Reads the packet type from a serialized header.
    pub fn extract_packet_type(buffer: &[u8]) -> Result<PacketType, DeserializeError> {
        let type_byte = *buffer
            .get(Self::TYPE_OFFSET)
            .ok_or(DeserializeError::UnexpectedEnd)?;

        PacketType::try_from(type_byte).map_err(Into::into)
    }

    /// Reads the declared body length from a serialized header.
    pub fn extract_body_length(buffer: &[u8]) -> Result<u32, DeserializeError> {
        let length_field = buffer
            .get(Self::LENGTH_OFFSET..Self::HEADER_SIZE_BYTES)
            .ok_or(DeserializeError::UnexpectedEnd)?;

        ReadCursor::new(length_field)
            .read_u32()
            .map_err(Into::into)
    }
}

impl TryFrom<&[u8]> for HeaderInfo {
    type Error = DeserializeError;

    fn try_from(buffer: &[u8]) -> Result<Self, Self::Error> {
        if buffer.len() < Self::HEADER_SIZE_BYTES {
            return Err(DeserializeError::UnexpectedEnd);
        }

        let mut cursor = ReadCursor::new(buffer);

        // version is validated before anything else in the header is trusted
        let version = Version::try_from(cursor.read_u8()?)?;
        let _packet_type = cursor.read_u8()?;
        let sequence_number = cursor.read_u8()?;

        let flag_byte = cursor.read_u8()?;
        let flags =
            PacketFlags::from_bits(flag_byte).ok_or(DeserializeError::InvalidHeaderFlags(flag_byte))?;

        let session_id = cursor.read_u32()?;

        Ok(Self {
            version,
            sequence_number,
            flags,
            session_id,
        })
    }
}
