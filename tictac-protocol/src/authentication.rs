//! Bodies of the authentication (AUTHEN) packets.

use core::fmt;

use bitflags::bitflags;
use byteorder::{ByteOrder, NetworkEndian};
use getset::{CopyGetters, Getters};
use num_enum::{TryFromPrimitive, TryFromPrimitiveError};

use super::fields::check_u8_length;
use super::{
    AuthenticationContext, DeserializeError, MinorVersion, PacketBody, PacketType, Serialize,
    SerializeError, UserInformation,
};
use crate::cursor::{ReadCursor, WriteCursor};
use crate::Deserialize;


#[cfg(feature = "std")]
mod owned;

#[cfg(feature = "std")]
pub use owned::{ContinueOwned, ReplyOwned, StartOwned};

/// What a client wants to do, as stated in the start packet.
#[repr(u8)]
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, TryFromPrimitive)]
pub enum Action {
    /// Login request.
    Login = 0x01,

    /// Change the user's password.
    ChangePassword = 0x02,

    /// Request to send a password to a remote system.
    #[deprecated = "SENDPASS was removed from RFC-8907."]
    SendPassword = 0x03,

    /// Have the server authenticate the client to a third party.
    #[deprecated = "RFC-8907 deprecates outbound authentication for security reasons."]
    SendAuth = 0x04,
}

impl fmt::Display for Action {
    #[allow(deprecated)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Login => "login",
                Self::ChangePassword => "change password",
                Self::SendPassword => "send password",
                Self::SendAuth => "send auth",
            }
        )
    }
}

#[doc(hidden)]
impl From<TryFromPrimitiveError<Action>> for DeserializeError {
    fn from(value: TryFromPrimitiveError<Action>) -> Self {
        Self::InvalidAction(value.number)
    }
}

/// The status a server puts in an authentication reply.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive)]
pub enum Status {
    /// The user is authenticated.
    Pass = 0x01,

    /// The user could not be authenticated.
    Fail = 0x02,

    /// The server needs more data, with the prompt in the server message.
    GetData = 0x03,

    /// Request for username.
    GetUser = 0x04,

    /// Request for password.
    GetPassword = 0x05,

    /// The client should start over, possibly with another authentication type.
    Restart = 0x06,

    /// Something went wrong on the server side.
    Error = 0x07,

    /// The client should ask another server.
    #[deprecated = "RFC-8907 deprecates redirection to other servers."]
    Follow = 0x21,
}

impl Status {
    /// Whether this status ends an authentication session.
    #[allow(deprecated)]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Pass | Self::Fail | Self::Error | Self::Follow)
    }
}

impl fmt::Display for Status {
    #[allow(deprecated)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Pass => "PASS",
                Self::Fail => "FAIL",
                Self::GetData => "GETDATA",
                Self::GetUser => "GETUSER",
                Self::GetPassword => "GETPASS",
                Self::Restart => "RESTART",
                Self::Error => "ERROR",
                Self::Follow => "FOLLOW",
            }
        )
    }
}

#[doc(hidden)]
impl From<TryFromPrimitiveError<Status>> for DeserializeError {
    fn from(value: TryFromPrimitiveError<Status>) -> Self {
        Self::InvalidStatus(value.number)
    }
}

/// Reports a length mismatch between a body buffer & the lengths declared within it.
fn check_body_length(expected: usize, buffer: &[u8]) -> Result<(), DeserializeError> {
    if expected == buffer.len() {
        Ok(())
    } else {
        Err(DeserializeError::WrongBodyBufferSize {
            expected,
            buffer_size: buffer.len(),
        })
    }
}

/// Rejects a body too short to hold its fixed fields, before any declared length is read.
///
/// A body cut off inside its fixed fields is reported like any other truncation.
fn check_fixed_fields(required: usize, buffer: &[u8]) -> Result<(), DeserializeError> {
    if buffer.len() < required {
        Err(DeserializeError::WrongBodyBufferSize {
            expected: required,
            buffer_size: buffer.len(),
        })
    } else {
        Ok(())
    }
}

/// Ensures a field's length fits in a two-byte length prefix.
fn check_u16_length(field: &'static str, value: &[u8]) -> Result<(), SerializeError> {
    if u16::try_from(value.len()).is_ok() {
        Ok(())
    } else {
        Err(SerializeError::FieldTooLong {
            field,
            length: value.len(),
            max: u16::MAX.into(),
        })
    }
}

/// Cuts a human-readable message down to what a two-byte length prefix can represent.
fn truncate_message(message: &[u8]) -> &[u8] {
    &message[..message.len().min(u16::MAX.into())]
}

/// Ensures serialization filled exactly the number of bytes reported by `wire_size`.
fn check_written_length(expected: usize, actual: usize) -> Result<usize, SerializeError> {
    if expected == actual {
        Ok(actual)
    } else {
        Err(SerializeError::LengthMismatch { expected, actual })
    }
}

/// The body that opens an authentication session.
#[derive(Debug, PartialEq, Eq, Clone, Getters, CopyGetters)]
pub struct Start<'packet> {
    /// Gets the action requested by the client.
    #[getset(get_copy = "pub")]
    action: Action,

    /// Gets the privilege level, authentication type & service of the request.
    #[getset(get = "pub")]
    authentication: AuthenticationContext,

    /// Gets information about the user connected to the client.
    #[getset(get = "pub")]
    user_information: UserInformation<'packet>,

    /// Gets the authentication data, whose meaning depends on the authentication type.
    #[getset(get_copy = "pub")]
    data: &'packet [u8],
}

impl<'packet> Start<'packet> {
    /// Initializes a new start packet, ensuring the data field fits in its single-byte length.
    pub fn new(
        action: Action,
        authentication: AuthenticationContext,
        user_information: UserInformation<'packet>,
        data: &'packet [u8],
    ) -> Result<Self, SerializeError> {
        check_u8_length("data", data)?;

        Ok(Self {
            action,
            authentication,
            user_information,
            data,
        })
    }
}

impl PacketBody for Start<'_> {
    const TYPE: PacketType = PacketType::Authentication;

    // action + authentication context + 4 single-byte field lengths
    const REQUIRED_FIELDS_LENGTH: usize =
        1 + AuthenticationContext::WIRE_SIZE + UserInformation::HEADER_INFORMATION_SIZE + 1;

    fn required_minor_version(&self) -> Option<MinorVersion> {
        Some(self.authentication.authentication_type.required_minor_version())
    }
}

impl Serialize for Start<'_> {
    fn wire_size(&self) -> usize {
        1 + AuthenticationContext::WIRE_SIZE
            + self.user_information.wire_size()
            + 1 // data length
            + self.data.len()
    }

    fn serialize_into_buffer(&self, buffer: &mut [u8]) -> Result<usize, SerializeError> {
        let wire_size = self.wire_size();
        if buffer.len() < wire_size {
            return Err(SerializeError::NotEnoughSpace);
        }

        let mut cursor = WriteCursor::new(&mut buffer[..wire_size]);

        cursor.write_u8(self.action as u8)?;
        self.authentication.serialize(&mut cursor)?;
        self.user_information.serialize_field_lengths(&mut cursor)?;
        cursor.write_u8(self.data.len().try_into()?)?;

        self.user_information.serialize_field_values(&mut cursor)?;
        cursor.write_bytes(self.data)?;

        check_written_length(wire_size, cursor.position())
    }
}

// internal; bodies are deserialized through Packet or TryFrom
#[doc(hidden)]
impl<'raw> Deserialize<'raw> for Start<'raw> {
    fn deserialize_from_buffer(buffer: &'raw [u8]) -> Result<Self, DeserializeError> {
        check_fixed_fields(Self::REQUIRED_FIELDS_LENGTH, buffer)?;

        // lengths are validated against the whole buffer before any variable field is read
        let declared_lengths = &buffer[4..Self::REQUIRED_FIELDS_LENGTH];
        let expected_length = Self::REQUIRED_FIELDS_LENGTH
            + declared_lengths
                .iter()
                .map(|&length| usize::from(length))
                .sum::<usize>();
        check_body_length(expected_length, buffer)?;

        let mut cursor = ReadCursor::new(buffer);

        let action = Action::try_from(cursor.read_u8()?)?;
        let authentication = AuthenticationContext::deserialize(&mut cursor)?;

        let user_length = cursor.read_u8()?;
        let port_length = cursor.read_u8()?;
        let remote_address_length = cursor.read_u8()?;
        let data_length = cursor.read_u8()?;

        let user = cursor.read_bytes(user_length.into())?;
        let port = cursor.read_bytes(port_length.into())?;
        let remote_address = cursor.read_bytes(remote_address_length.into())?;
        let data = cursor.read_bytes(data_length.into())?;

        Ok(Self {
            action,
            authentication,
            user_information: UserInformation::from_wire(user, port, remote_address),
            data,
        })
    }
}

impl<'raw> TryFrom<&'raw [u8]> for Start<'raw> {
    type Error = DeserializeError;

    fn try_from(buffer: &'raw [u8]) -> Result<Self, Self::Error> {
        Self::deserialize_from_buffer(buffer)
    }
}

/// Flags of an authentication reply.
#[repr(transparent)]
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub struct ReplyFlags(u8);

bitflags! {
    impl ReplyFlags: u8 {
        /// The client must not echo what the user types in response.
        const NO_ECHO = 0x01;
    }
}

crate::util::flag_names_display! { ReplyFlags }

/// An authentication reply packet sent by the server.
#[derive(Debug, PartialEq, Eq, Clone, Getters, CopyGetters)]
pub struct Reply<'packet> {
    /// Gets the status of this authentication exchange.
    #[getset(get_copy = "pub")]
    status: Status,

    /// Gets the flags sent as part of this authentication exchange.
    #[getset(get_copy = "pub")]
    flags: ReplyFlags,

    /// Gets the message the client shows to the user, e.g. a prompt.
    #[getset(get_copy = "pub")]
    server_message: &'packet [u8],

    /// Gets data for the client itself, which is never shown to the user.
    #[getset(get_copy = "pub")]
    data: &'packet [u8],
}

impl<'packet> Reply<'packet> {
    /// Where the server message starts within the body.
    const SERVER_MESSAGE_OFFSET: usize = 6;

    /// Assembles a reply body.
    ///
    /// A server message longer than 65535 bytes is truncated, while an oversized
    /// data field is an error.
    pub fn new(
        status: Status,
        flags: ReplyFlags,
        server_message: &'packet [u8],
        data: &'packet [u8],
    ) -> Result<Self, SerializeError> {
        check_u16_length("data", data)?;

        Ok(Self {
            status,
            flags,
            server_message: truncate_message(server_message),
            data,
        })
    }

    /// Attempts to extract the claimed reply packet body length from a buffer.
    pub fn extract_total_length(buffer: &[u8]) -> Result<u32, DeserializeError> {
        if buffer.len() < Self::REQUIRED_FIELDS_LENGTH {
            return Err(DeserializeError::UnexpectedEnd);
        }

        let server_message_length = NetworkEndian::read_u16(&buffer[2..4]);
        let data_length = NetworkEndian::read_u16(&buffer[4..6]);

        // the required fields length is a small constant, so this cannot overflow a u32
        Ok(Self::SERVER_MESSAGE_OFFSET as u32
            + u32::from(server_message_length)
            + u32::from(data_length))
    }
}

impl PacketBody for Reply<'_> {
    const TYPE: PacketType = PacketType::Authentication;

    // status + flags + 2 bytes each for lengths of server message & data
    const REQUIRED_FIELDS_LENGTH: usize = 6;
}

impl Serialize for Reply<'_> {
    fn wire_size(&self) -> usize {
        Self::REQUIRED_FIELDS_LENGTH + self.server_message.len() + self.data.len()
    }

    fn serialize_into_buffer(&self, buffer: &mut [u8]) -> Result<usize, SerializeError> {
        let wire_size = self.wire_size();
        if buffer.len() < wire_size {
            return Err(SerializeError::NotEnoughSpace);
        }

        let mut cursor = WriteCursor::new(&mut buffer[..wire_size]);

        cursor.write_u8(self.status as u8)?;
        cursor.write_u8(self.flags.bits())?;
        cursor.write_u16(self.server_message.len().try_into()?)?;
        cursor.write_u16(self.data.len().try_into()?)?;
        cursor.write_bytes(self.server_message)?;
        cursor.write_bytes(self.data)?;

        check_written_length(wire_size, cursor.position())
    }
}

// internal; bodies are deserialized through Packet or TryFrom
#[doc(hidden)]
impl<'raw> Deserialize<'raw> for Reply<'raw> {
    fn deserialize_from_buffer(buffer: &'raw [u8]) -> Result<Self, DeserializeError> {
        check_fixed_fields(Self::REQUIRED_FIELDS_LENGTH, buffer)?;
        let total_length = Self::extract_total_length(buffer)?;
        check_body_length(total_length as usize, buffer)?;

        let mut cursor = ReadCursor::new(buffer);

        let status = Status::try_from(cursor.read_u8()?)?;
        let flag_byte = cursor.read_u8()?;
        let flags =
            ReplyFlags::from_bits(flag_byte).ok_or(DeserializeError::InvalidBodyFlags(flag_byte))?;

        let server_message_length = cursor.read_u16()?;
        let data_length = cursor.read_u16()?;
        let server_message = cursor.read_bytes(server_message_length.into())?;
        let data = cursor.read_bytes(data_length.into())?;

        Ok(Self {
            status,
            flags,
            server_message,
            data,
        })
    }
}

impl<'raw> TryFrom<&'raw [u8]> for Reply<'raw> {
    type Error = DeserializeError;

    fn try_from(buffer: &'raw [u8]) -> Result<Self, Self::Error> {
        Self::deserialize_from_buffer(buffer)
    }
}

/// Flags sent as part of an authentication continue packet.
#[repr(transparent)]
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub struct ContinueFlags(u8);

bitflags! {
    impl ContinueFlags: u8 {
        /// The client gives up on the session.
        const ABORT = 0b00000001;
    }
}

crate::util::flag_names_display! { ContinueFlags }

/// A continue packet sent by the client in response to a server prompt.
#[derive(Debug, PartialEq, Eq, Clone, CopyGetters)]
pub struct Continue<'packet> {
    /// Returns the user's response to the server prompt, e.g. a password.
    #[getset(get_copy = "pub")]
    user_message: &'packet [u8],

    /// Returns the domain-specific data sent by the client.
    #[getset(get_copy = "pub")]
    data: &'packet [u8],

    /// Gets the flags set by the client.
    #[getset(get_copy = "pub")]
    flags: ContinueFlags,
}

impl<'packet> Continue<'packet> {
    /// Offset of the user message within a continue packet body.
    const USER_MESSAGE_OFFSET: usize = 5;

    /// Constructs a continue packet.
    ///
    /// The user message is truncated to 65535 bytes if necessary; an oversized data field is an error.
    pub fn new(
        user_message: &'packet [u8],
        data: &'packet [u8],
        flags: ContinueFlags,
    ) -> Result<Self, SerializeError> {
        check_u16_length("data", data)?;

        Ok(Self {
            user_message: truncate_message(user_message),
            data,
            flags,
        })
    }

    /// Whether the client requested the session to be aborted.
    pub fn is_abort(&self) -> bool {
        self.flags.contains(ContinueFlags::ABORT)
    }
}

impl PacketBody for Continue<'_> {
    const TYPE: PacketType = PacketType::Authentication;

    // two 16-bit lengths and the flags byte
    const REQUIRED_FIELDS_LENGTH: usize = 5;
}

impl Serialize for Continue<'_> {
    fn wire_size(&self) -> usize {
        Self::REQUIRED_FIELDS_LENGTH + self.user_message.len() + self.data.len()
    }

    fn serialize_into_buffer(&self, buffer: &mut [u8]) -> Result<usize, SerializeError> {
        let wire_size = self.wire_size();
        if buffer.len() < wire_size {
            return Err(SerializeError::NotEnoughSpace);
        }

        let mut cursor = WriteCursor::new(&mut buffer[..wire_size]);

        cursor.write_u16(self.user_message.len().try_into()?)?;
        cursor.write_u16(self.data.len().try_into()?)?;
        cursor.write_u8(self.flags.bits())?;
        cursor.write_bytes(self.user_message)?;
        cursor.write_bytes(self.data)?;

        check_written_length(wire_size, cursor.position())
    }
}

// internal; bodies are deserialized through Packet or TryFrom
#[doc(hidden)]
impl<'raw> Deserialize<'raw> for Continue<'raw> {
    fn deserialize_from_buffer(buffer: &'raw [u8]) -> Result<Self, DeserializeError> {
        check_fixed_fields(Self::REQUIRED_FIELDS_LENGTH, buffer)?;

        let user_message_length = NetworkEndian::read_u16(&buffer[..2]);
        let data_length = NetworkEndian::read_u16(&buffer[2..4]);
        check_body_length(
            Self::USER_MESSAGE_OFFSET + usize::from(user_message_length) + usize::from(data_length),
            buffer,
        )?;

        let mut cursor = ReadCursor::new(&buffer[4..]);

        let flag_byte = cursor.read_u8()?;
        let flags = ContinueFlags::from_bits(flag_byte)
            .ok_or(DeserializeError::InvalidBodyFlags(flag_byte))?;

        let user_message = cursor.read_bytes(user_message_length.into())?;
        let data = cursor.read_bytes(data_length.into())?;

        Ok(Self {
            user_message,
            data,
            flags,
        })
    }
}

impl<'raw> TryFrom<&'raw [u8]> for Continue<'raw> {
    type Error = DeserializeError;

    fn try_from(buffer: &'raw [u8]) -> Result<Self, Self::Error> {
        Self::deserialize_from_buffer(buffer)
    }
}
