use core::fmt;

use bitflags::bitflags;
use getset::Getters;
use num_enum::{TryFromPrimitive, TryFromPrimitiveError};

use super::obfuscation::obfuscate_body;
use super::{Deserialize, DeserializeError, PacketBody, Serialize, SerializeError};

pub(super) mod header;
use header::HeaderInfo;

#[cfg(test)]
mod tests;

/// Header flags describing how a packet (or its connection) is to be handled.
#[repr(transparent)]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct PacketFlags(u8);

bitflags! {
    impl PacketFlags: u8 {
        /// The body is sent in cleartext.
        ///
        /// RFC8907 deprecates this: it "**MUST NOT** be used in production" ([section 4.5]).
        ///
        /// [section 4.5]: https://www.rfc-editor.org/rfc/rfc8907.html#section-4.5-16
        const UNENCRYPTED       = 0x01;

        /// The client offers to multiplex sessions over one connection.
        const SINGLE_CONNECTION = 0x04;
    }
}

crate::util::flag_names_display! { PacketFlags }

/// Which of the three TACACS+ sub-protocols a packet belongs to.
#[repr(u8)]
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, TryFromPrimitive)]
pub enum PacketType {
    /// Authentication (AUTHEN).
    Authentication = 0x1,

    /// Authorization (AUTHOR).
    Authorization = 0x2,

    /// Accounting (ACCT).
    Accounting = 0x3,
}

impl fmt::Display for PacketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Authentication => "authentication",
            Self::Authorization => "authorization",
            Self::Accounting => "accounting",
        };

        f.write_str(name)
    }
}

#[doc(hidden)]
impl From<TryFromPrimitiveError<PacketType>> for DeserializeError {
    fn from(value: TryFromPrimitiveError<PacketType>) -> Self {
        Self::InvalidPacketType(value.number)
    }
}

/// A header together with a body of some type.
#[derive(Getters, Debug, PartialEq, Eq)]
pub struct Packet<B: PacketBody> {
    /// Gets the header of the packet.
    #[getset(get = "pub")]
    header: HeaderInfo,

    /// Gets the body of the packet.
    #[getset(get = "pub")]
    body: B,
}

impl<B: PacketBody> Packet<B> {
    /// Index of the first body byte in a serialized packet.
    pub(super) const BODY_START: usize = HeaderInfo::HEADER_SIZE_BYTES;

    /// Pairs a header with a body.
    ///
    /// If the body only makes sense under a particular minor version (e.g. a start
    /// packet for PAP), the header's minor version is overwritten with it.
    pub fn new(mut header: HeaderInfo, body: B) -> Self {
        if let Some(minor) = body.required_minor_version() {
            header.version_mut().1 = minor;
        }

        Self { header, body }
    }

    /// Splits a packet into its header and body.
    pub fn into_parts(self) -> (HeaderInfo, B) {
        (self.header, self.body)
    }
}

impl<B: PacketBody + Serialize> Packet<B> {
    /// Number of bytes the serialized packet takes up.
    pub fn wire_size(&self) -> usize {
        Self::BODY_START + self.body.wire_size()
    }

    /// Writes the packet to `buffer` with an obfuscated body, returning the number of bytes written.
    ///
    /// The [`UNENCRYPTED`](PacketFlags::UNENCRYPTED) flag is cleared in the written header.
    pub fn serialize<K: AsRef<[u8]>>(
        mut self,
        secret_key: K,
        buffer: &mut [u8],
    ) -> Result<usize, SerializeError> {
        self.header.flags_mut().remove(PacketFlags::UNENCRYPTED);

        let written = self.write_to(buffer)?;
        obfuscate_body(
            &self.header,
            secret_key.as_ref(),
            &mut buffer[Self::BODY_START..written],
        );

        Ok(written)
    }

    /// Writes the packet to `buffer` with a cleartext body, returning the number of bytes written.
    ///
    /// The [`UNENCRYPTED`](PacketFlags::UNENCRYPTED) flag is set in the written header.
    pub fn serialize_unobfuscated(mut self, buffer: &mut [u8]) -> Result<usize, SerializeError> {
        self.header.flags_mut().insert(PacketFlags::UNENCRYPTED);
        self.write_to(buffer)
    }

    fn write_to(&self, buffer: &mut [u8]) -> Result<usize, SerializeError> {
        let total_size = self.wire_size();
        let packet_buffer = buffer
            .get_mut(..total_size)
            .ok_or(SerializeError::NotEnoughSpace)?;
        let (header_buffer, body_buffer) = packet_buffer.split_at_mut(Self::BODY_START);

        // the length field can only be filled in once the body is written
        let body_length = self.body.serialize_into_buffer(body_buffer)?;
        let header_length = self
            .header
            .serialize(header_buffer, B::TYPE, u32::try_from(body_length)?)?;

        Ok(header_length + body_length)
    }
}

impl<'raw, B: PacketBody + Deserialize<'raw>> Packet<B> {
    /// Parses a packet with an obfuscated body, deobfuscating it in place with `secret_key`.
    ///
    /// Packets with the [`UNENCRYPTED`](PacketFlags::UNENCRYPTED) flag set are rejected.
    pub fn deserialize<K: AsRef<[u8]>>(
        secret_key: K,
        buffer: &'raw mut [u8],
    ) -> Result<Self, DeserializeError> {
        let header = HeaderInfo::try_from(&*buffer)?;
        if header.flags().contains(PacketFlags::UNENCRYPTED) {
            return Err(DeserializeError::IncorrectUnencryptedFlag);
        }

        let body_end = Self::body_end(buffer)?;
        obfuscate_body(
            &header,
            secret_key.as_ref(),
            &mut buffer[Self::BODY_START..body_end],
        );

        // the body borrows from the now-deobfuscated buffer for the rest of its life
        let buffer: &'raw [u8] = buffer;
        let body = B::deserialize_from_buffer(&buffer[Self::BODY_START..body_end])?;

        Ok(Self { header, body })
    }

    /// Parses a packet with a cleartext body.
    ///
    /// Packets without the [`UNENCRYPTED`](PacketFlags::UNENCRYPTED) flag set are rejected.
    pub fn deserialize_unobfuscated(buffer: &'raw [u8]) -> Result<Self, DeserializeError> {
        let header = HeaderInfo::try_from(buffer)?;
        if !header.flags().contains(PacketFlags::UNENCRYPTED) {
            return Err(DeserializeError::IncorrectUnencryptedFlag);
        }

        let body_end = Self::body_end(buffer)?;
        let body = B::deserialize_from_buffer(&buffer[Self::BODY_START..body_end])?;

        Ok(Self { header, body })
    }

    /// Validates the type & declared length in a serialized header, returning where the body ends.
    fn body_end(buffer: &[u8]) -> Result<usize, DeserializeError> {
        let actual = HeaderInfo::extract_packet_type(buffer)?;
        if actual != B::TYPE {
            return Err(DeserializeError::PacketTypeMismatch {
                expected: B::TYPE,
                actual,
            });
        }

        let body_length = HeaderInfo::extract_body_length(buffer)? as usize;
        let available = buffer.len() - Self::BODY_START;

        if body_length <= available {
            Ok(Self::BODY_START + body_length)
        } else {
            Err(DeserializeError::UnexpectedEnd)
        }
    }
}
