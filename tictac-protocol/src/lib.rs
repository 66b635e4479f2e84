//! # tictac-protocol
//!
//! Server-side TACACS+ ([RFC8907](https://www.rfc-editor.org/rfc/rfc8907)) packet
//! de/serialization: the common header, body obfuscation and the authentication
//! packet bodies.
//!
//! The crate is `no_std` and does not allocate; owned variants of the packet
//! bodies are available with the `std` feature (enabled by default).

#![no_std]
#![cfg_attr(feature = "docsrs", feature(doc_auto_cfg))]
#![warn(missing_docs)]
#![warn(clippy::cast_lossless)]
#![warn(clippy::cast_possible_truncation)]

#[cfg(feature = "std")]
extern crate std;

use core::{fmt, num::TryFromIntError};

pub mod authentication;
pub mod cursor;

mod fields;
pub use fields::*;

mod obfuscation;
pub use obfuscation::{obfuscate_body, MD5_OUTPUT_SIZE};

mod packet;
pub use packet::header::HeaderInfo;
pub use packet::{Packet, PacketFlags, PacketType};

#[cfg(feature = "std")]
mod owned;
#[cfg(feature = "std")]
pub use owned::FromBorrowedBody;

mod util;

/// The TCP port TACACS+ servers listen on by default.
pub const DEFAULT_PORT: u16 = 49;

/// Failure to write a packet, or part of one, in its wire format.
#[non_exhaustive]
#[derive(Debug, PartialEq, Eq)]
pub enum SerializeError {
    /// The output buffer is too small for the serialized object.
    NotEnoughSpace,

    /// The length of the packet body exceeded the maximum value encodeable in the header.
    LengthOverflow,

    /// A variable-length field was longer than its length prefix can represent.
    FieldTooLong {
        /// The name of the offending field.
        field: &'static str,
        /// The length of the field that was provided.
        length: usize,
        /// The maximum length representable on the wire.
        max: usize,
    },

    /// A body wrote a different number of bytes than its `wire_size` promised.
    LengthMismatch {
        /// The number of bytes `wire_size` reported.
        expected: usize,
        /// The number of bytes that were actually written.
        actual: usize,
    },
}

impl fmt::Display for SerializeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotEnoughSpace => write!(f, "output buffer too small"),
            Self::LengthOverflow => write!(f, "packet body length overflowed header field"),
            Self::FieldTooLong { field, length, max } => {
                write!(f, "{field} field too long: {length} > {max}")
            }
            Self::LengthMismatch { expected, actual } => write!(
                f,
                "wrote {actual} bytes but expected to write {expected}"
            ),
        }
    }
}

impl From<TryFromIntError> for SerializeError {
    fn from(_value: TryFromIntError) -> Self {
        Self::LengthOverflow
    }
}

impl From<cursor::OutOfBounds> for SerializeError {
    fn from(_value: cursor::OutOfBounds) -> Self {
        Self::NotEnoughSpace
    }
}

/// Failure to parse a packet, or part of one, from its wire format.
#[non_exhaustive]
#[derive(Debug, PartialEq, Eq)]
pub enum DeserializeError {
    /// Invalid binary status representation in reply.
    InvalidStatus(u8),

    /// Unknown packet type byte in a header.
    InvalidPacketType(u8),

    /// Unknown bits set in the header flags.
    InvalidHeaderFlags(u8),

    /// Unknown bits set in the flags of a body.
    InvalidBodyFlags(u8),

    /// The major version in the header was not the one defined by RFC8907.
    BadMajorVersion(u8),

    /// Invalid authentication action in a start body.
    InvalidAction(u8),

    /// Invalid authentication type in a start body.
    InvalidAuthenticationType(u8),

    /// Invalid authentication service in a start body.
    InvalidService(u8),

    /// Privilege level outside of the range 0-15.
    InvalidPrivilegeLevel(u8),

    /// The header names a different packet type than the body being parsed.
    PacketTypeMismatch {
        /// The type of the body being parsed.
        expected: PacketType,

        /// The type declared in the header.
        actual: PacketType,
    },

    /// The unencrypted flag was not what was expected for the chosen deserialization method.
    IncorrectUnencryptedFlag,

    /// The body length did not match the sum of its declared field lengths.
    ///
    /// This happens for truncated or padded bodies, but also when the
    /// body was deobfuscated with the wrong shared secret.
    WrongBodyBufferSize {
        /// The length the body should have according to its length fields.
        expected: usize,
        /// The length of the body that was actually received.
        buffer_size: usize,
    },

    /// The buffer ended before a fixed-size part of the object.
    UnexpectedEnd,
}

impl fmt::Display for DeserializeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidStatus(num) => write!(f, "unknown reply status {num:#x}"),
            Self::InvalidPacketType(num) => write!(f, "unknown packet type {num:#x}"),
            Self::InvalidHeaderFlags(num) => write!(f, "unknown header flags {num:#x}"),
            Self::InvalidBodyFlags(num) => write!(f, "unknown body flags {num:#x}"),
            Self::BadMajorVersion(num) => write!(
                f,
                "invalid major version {:#x} (expected {:#x})",
                num >> 4, // major version is 4 upper bits of byte
                MajorVersion::RFC8907 as u8
            ),
            Self::InvalidAction(num) => write!(f, "invalid authentication action: {num:#x}"),
            Self::InvalidAuthenticationType(num) => {
                write!(f, "invalid authentication type: {num:#x}")
            }
            Self::InvalidService(num) => write!(f, "invalid authentication service: {num:#x}"),
            Self::InvalidPrivilegeLevel(num) => write!(f, "privilege level {num} out of range"),
            Self::PacketTypeMismatch { expected, actual } => write!(
                f,
                "expected {expected} packet but header says {actual}"
            ),
            Self::IncorrectUnencryptedFlag => write!(f, "unencrypted flag had unexpected value"),
            Self::WrongBodyBufferSize {
                expected,
                buffer_size,
            } => write!(
                f,
                "body length mismatch (malformed packet or wrong key): expected {expected}, got {buffer_size}"
            ),
            Self::UnexpectedEnd => write!(f, "buffer ended in the middle of an object"),
        }
    }
}

impl From<cursor::OutOfBounds> for DeserializeError {
    fn from(_value: cursor::OutOfBounds) -> Self {
        Self::UnexpectedEnd
    }
}

// core::error::Error isn't stable on the supported toolchains
#[cfg(feature = "std")]
mod error_impls {
    use std::error::Error;

    use super::{cursor::OutOfBounds, DeserializeError, SerializeError};

    impl Error for DeserializeError {}
    impl Error for SerializeError {}
    impl Error for OutOfBounds {}
}

// keeps PacketBody implementable only by the bodies defined here
mod sealed {
    use super::authentication;

    pub trait Sealed {}

    impl Sealed for authentication::Start<'_> {}
    impl Sealed for authentication::Continue<'_> {}
    impl Sealed for authentication::Reply<'_> {}
}

/// Major version of the protocol, the upper nibble of the first header byte.
#[repr(u8)]
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MajorVersion {
    /// `0xc`, the only major version RFC8907 defines.
    RFC8907 = 0xc,
}

/// Minor version of the protocol, which depends on the authentication type in use.
///
/// Minor versions other than the two RFC8907 assigns are kept as-is, so a header
/// always reserializes to the byte it was parsed from.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MinorVersion {
    /// `0x0`, used for ASCII logins.
    Default,
    /// `0x1`, used for PAP and the CHAP variants.
    V1,
    /// Any other minor version nibble (`0x2..=0xf`).
    Other(u8),
}

impl MinorVersion {
    /// Interprets the low nibble of `value` as a minor version.
    pub fn from_nibble(value: u8) -> Self {
        match value & 0xf {
            0 => Self::Default,
            1 => Self::V1,
            other => Self::Other(other),
        }
    }
}

impl From<MinorVersion> for u8 {
    fn from(value: MinorVersion) -> Self {
        match value {
            MinorVersion::Default => 0x0,
            MinorVersion::V1 => 0x1,
            MinorVersion::Other(nibble) => nibble & 0xf,
        }
    }
}

/// A major & minor version pair, as packed into the first header byte.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub struct Version(MajorVersion, MinorVersion);

impl Version {
    /// Pairs a major and minor version.
    pub fn new(major: MajorVersion, minor: MinorVersion) -> Self {
        Self(major, minor)
    }

    /// The major version.
    pub fn major(&self) -> MajorVersion {
        self.0
    }

    /// The minor version.
    pub fn minor(&self) -> MinorVersion {
        self.1
    }
}

impl Default for Version {
    fn default() -> Self {
        Self(MajorVersion::RFC8907, MinorVersion::Default)
    }
}

impl TryFrom<u8> for Version {
    type Error = DeserializeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        // major version is checked first so a foreign protocol is reported as such
        if value >> 4 != MajorVersion::RFC8907 as u8 {
            return Err(DeserializeError::BadMajorVersion(value));
        }

        Ok(Self(MajorVersion::RFC8907, MinorVersion::from_nibble(value)))
    }
}

impl From<Version> for u8 {
    fn from(value: Version) -> Self {
        ((value.0 as u8) << 4) | u8::from(value.1)
    }
}

/// A body that can be carried in a [`Packet`].
///
/// This trait is sealed; only the bodies in this crate implement it.
pub trait PacketBody: sealed::Sealed {
    /// The header packet type for this body.
    const TYPE: PacketType;

    /// Size of the fixed part of the body, before any variable-length fields.
    const REQUIRED_FIELDS_LENGTH: usize;

    /// The minor version this body has to be sent with, if it matters.
    ///
    /// This is used since [`AuthenticationType`]s are partitioned by protocol minor version.
    fn required_minor_version(&self) -> Option<MinorVersion> {
        None
    }
}

/// Something with a wire format that can be written to a buffer.
pub trait Serialize {
    /// Number of bytes the wire format takes up.
    fn wire_size(&self) -> usize;

    /// Writes the wire format to the start of `buffer`, returning the number of bytes written.
    fn serialize_into_buffer(&self, buffer: &mut [u8]) -> Result<usize, SerializeError>;
}

/// Something that can be deserialized from a binary format, borrowing from the buffer.
pub trait Deserialize<'raw>: Sized {
    /// Attempts to deserialize an object from a buffer.
    ///
    /// The buffer must hold exactly one object; trailing or missing bytes are an error.
    fn deserialize_from_buffer(buffer: &'raw [u8]) -> Result<Self, DeserializeError>;
}
