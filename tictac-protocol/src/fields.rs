use core::fmt;

use getset::CopyGetters;
use num_enum::{TryFromPrimitive, TryFromPrimitiveError};

use crate::cursor::{ReadCursor, WriteCursor};
use crate::{DeserializeError, MinorVersion, SerializeError};


/// The privilege level requested by a client, between 0 and 15.
#[repr(transparent)]
#[derive(Debug, PartialEq, Eq, Clone, Copy, PartialOrd, Ord, Hash)]
pub struct PrivilegeLevel(u8);

impl PrivilegeLevel {
    /// The highest privilege level, also known as root.
    pub const MAX: Self = Self(15);

    /// Wraps `level` if it does not exceed [`PrivilegeLevel::MAX`].
    ///
    /// # Examples
    /// ```
    /// use tictac_protocol::PrivilegeLevel;
    ///
    /// assert!(PrivilegeLevel::new(15).is_some());
    /// assert!(PrivilegeLevel::new(16).is_none());
    /// ```
    pub fn new(level: u8) -> Option<Self> {
        if level <= Self::MAX.0 {
            Some(Self(level))
        } else {
            None
        }
    }
}

impl Default for PrivilegeLevel {
    /// The unprivileged level 0.
    fn default() -> Self {
        Self(0)
    }
}

impl From<PrivilegeLevel> for u8 {
    fn from(value: PrivilegeLevel) -> Self {
        value.0
    }
}

impl fmt::Display for PrivilegeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The authentication method a client uses for a session.
///
/// RFC-8907 partitions these by supported minor version: [`Ascii`](AuthenticationType::Ascii) requires [`MinorVersion::Default`](crate::MinorVersion::Default), while the rest require [`MinorVersion::V1`](crate::MinorVersion::V1).
///
/// *Note:* TACACS+ as a protocol does not meet modern standards of security; access to the data lines must be protected. See [RFC-8907 Section 10.1]
///
/// [RFC-8907 Section 10.1]: https://datatracker.ietf.org/doc/html/rfc8907#section-10.1.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, TryFromPrimitive)]
pub enum AuthenticationType {
    /// Interactive prompts for the username and password.
    Ascii = 0x01,

    /// PAP ([RFC-1334](https://www.rfc-editor.org/rfc/rfc1334.html)), with the password in the start packet.
    Pap = 0x02,

    /// CHAP ([RFC-1334](https://www.rfc-editor.org/rfc/rfc1334.html)).
    Chap = 0x03,

    /// AppleTalk Remote Access Protocol.
    #[deprecated = "ARAP was removed from RFC-8907."]
    Arap = 0x04,

    /// MS-CHAP version 1.
    MsChap = 0x05,

    /// MS-CHAP version 2.
    MsChapV2 = 0x06,
}

impl AuthenticationType {
    /// Returns the required minor version for this `AuthenticationType`.
    pub const fn required_minor_version(&self) -> MinorVersion {
        match self {
            AuthenticationType::Ascii => MinorVersion::Default,
            _ => MinorVersion::V1,
        }
    }
}

impl fmt::Display for AuthenticationType {
    #[allow(deprecated)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Ascii => "ASCII",
                Self::Pap => "PAP",
                Self::Chap => "CHAP",
                Self::Arap => "ARAP",
                Self::MsChap => "MSCHAP",
                Self::MsChapV2 => "MSCHAPv2",
            }
        )
    }
}

#[doc(hidden)]
impl From<TryFromPrimitiveError<AuthenticationType>> for DeserializeError {
    fn from(value: TryFromPrimitiveError<AuthenticationType>) -> Self {
        Self::InvalidAuthenticationType(value.number)
    }
}

/// The service a user is authenticating for.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, TryFromPrimitive)]
pub enum AuthenticationService {
    /// No particular service.
    None = 0x00,

    /// Login to the device itself.
    Login = 0x01,

    /// Privilege escalation, like `enable` on many routers.
    Enable = 0x02,

    /// PPP.
    Ppp = 0x03,

    /// AppleTalk Remote Access.
    #[deprecated = "ARAP was removed from RFC-8907."]
    Arap = 0x04,

    /// PT authentication (the acronym is not expanded anywhere).
    Pt = 0x05,

    /// The r-commands, e.g. `rlogin(1)`.
    RCommand = 0x06,

    /// [X.25 suite](https://en.wikipedia.org/wiki/X.25), potentially its NetWare flavor.
    X25 = 0x07,

    /// NASI.
    Nasi = 0x08,

    /// Firewall proxy
    FwProxy = 0x09,
}

impl fmt::Display for AuthenticationService {
    #[allow(deprecated)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::None => "none",
                Self::Login => "login",
                Self::Enable => "enable",
                Self::Ppp => "PPP",
                Self::Arap => "ARAP",
                Self::Pt => "PT",
                Self::RCommand => "r-command",
                Self::X25 => "X25",
                Self::Nasi => "NASI",
                Self::FwProxy => "firewall proxy",
            }
        )
    }
}

#[doc(hidden)]
impl From<TryFromPrimitiveError<AuthenticationService>> for DeserializeError {
    fn from(value: TryFromPrimitiveError<AuthenticationService>) -> Self {
        Self::InvalidService(value.number)
    }
}

/// The privilege level, method & service of an authentication request.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub struct AuthenticationContext {
    /// The privilege level the user asks for.
    pub privilege_level: PrivilegeLevel,

    /// How the user authenticates.
    pub authentication_type: AuthenticationType,

    /// What the user authenticates for.
    pub service: AuthenticationService,
}

impl AuthenticationContext {
    /// One byte per field.
    pub(super) const WIRE_SIZE: usize = 3;

    /// Writes the three context bytes.
    pub(super) fn serialize(&self, cursor: &mut WriteCursor<'_>) -> Result<(), SerializeError> {
        cursor.write_u8(self.privilege_level.0)?;
        cursor.write_u8(self.authentication_type as u8)?;
        cursor.write_u8(self.service as u8)?;
        Ok(())
    }

    /// Reads authentication context information from a packet body "header."
    pub(super) fn deserialize(cursor: &mut ReadCursor<'_>) -> Result<Self, DeserializeError> {
        let level = cursor.read_u8()?;
        let privilege_level =
            PrivilegeLevel::new(level).ok_or(DeserializeError::InvalidPrivilegeLevel(level))?;

        Ok(Self {
            privilege_level,
            authentication_type: AuthenticationType::try_from(cursor.read_u8()?)?,
            service: AuthenticationService::try_from(cursor.read_u8()?)?,
        })
    }
}

/// Who is authenticating, and from where.
///
/// All three fields are opaque byte strings on the wire, each at most 255 bytes long.
#[derive(Clone, Debug, PartialEq, Eq, Hash, CopyGetters)]
pub struct UserInformation<'info> {
    /// The username, which may be empty if the server is to ask for it.
    #[getset(get_copy = "pub")]
    user: &'info [u8],

    /// The client port the user is on, e.g. `tty0`.
    #[getset(get_copy = "pub")]
    port: &'info [u8],

    /// Where the user is connecting to the client from.
    #[getset(get_copy = "pub")]
    remote_address: &'info [u8],
}

impl<'info> UserInformation<'info> {
    /// The three single-byte length prefixes.
    pub(super) const HEADER_INFORMATION_SIZE: usize = 3;

    /// Length prefixes plus field contents.
    pub(super) fn wire_size(&self) -> usize {
        Self::HEADER_INFORMATION_SIZE
            + self.user.len()
            + self.port.len()
            + self.remote_address.len()
    }

    /// Bundles together information about a TACACS+ client user, checking that every field fits in a single-byte length.
    pub fn new(
        user: &'info [u8],
        port: &'info [u8],
        remote_address: &'info [u8],
    ) -> Result<Self, SerializeError> {
        check_u8_length("user", user)?;
        check_u8_length("port", port)?;
        check_u8_length("remote address", remote_address)?;

        Ok(Self {
            user,
            port,
            remote_address,
        })
    }

    /// Bundles fields read from the wire, whose lengths are bounded by their single-byte prefixes.
    pub(super) fn from_wire(
        user: &'info [u8],
        port: &'info [u8],
        remote_address: &'info [u8],
    ) -> Self {
        Self {
            user,
            port,
            remote_address,
        }
    }

    /// Writes the user, port & remote address lengths, in that order.
    pub(super) fn serialize_field_lengths(
        &self,
        cursor: &mut WriteCursor<'_>,
    ) -> Result<(), SerializeError> {
        cursor.write_u8(self.user.len().try_into()?)?;
        cursor.write_u8(self.port.len().try_into()?)?;
        cursor.write_u8(self.remote_address.len().try_into()?)?;
        Ok(())
    }

    /// Writes the user, port & remote address themselves.
    pub(super) fn serialize_field_values(
        &self,
        cursor: &mut WriteCursor<'_>,
    ) -> Result<(), SerializeError> {
        // no delimiters; the lengths were written earlier in the body
        cursor.write_bytes(self.user)?;
        cursor.write_bytes(self.port)?;
        cursor.write_bytes(self.remote_address)?;
        Ok(())
    }
}

/// Ensures a field's length fits in the single byte used to encode it.
pub(super) fn check_u8_length(field: &'static str, value: &[u8]) -> Result<(), SerializeError> {
    if u8::try_from(value.len()).is_ok() {
        Ok(())
    } else {
        Err(SerializeError::FieldTooLong {
            field,
            length: value.len(),
            max: u8::MAX.into(),
        })
    }
}
