use std::borrow::ToOwned;
use std::vec;
use std::vec::Vec;

use super::{Action, Continue, ContinueFlags, Reply, ReplyFlags, Start, Status};
use crate::owned::FromBorrowedBody;
use crate::sealed::Sealed;
use crate::{AuthenticationContext, Serialize, SerializeError, UserInformation};

/// Serializes a body into a freshly allocated buffer of exactly its wire size.
fn serialize_to_vec<S: Serialize>(body: &S) -> Result<Vec<u8>, SerializeError> {
    let mut buffer = vec![0; body.wire_size()];
    let written = body.serialize_into_buffer(&mut buffer)?;
    buffer.truncate(written);
    Ok(buffer)
}

/// An authentication start packet with owned fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartOwned {
    /// The action requested by the client.
    pub action: Action,

    /// The privilege level, authentication type & service of the request.
    pub authentication: AuthenticationContext,

    /// The user connected to the client.
    pub user: Vec<u8>,

    /// The port the user is connected to.
    pub port: Vec<u8>,

    /// The remote address the user is connecting from.
    pub remote_address: Vec<u8>,

    /// The authentication data included in the start packet.
    pub data: Vec<u8>,
}

impl StartOwned {
    /// Serializes this body into its wire format.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SerializeError> {
        let user_information = UserInformation::new(&self.user, &self.port, &self.remote_address)?;
        let start = Start::new(
            self.action,
            self.authentication,
            user_information,
            &self.data,
        )?;
        serialize_to_vec(&start)
    }
}

impl Sealed for StartOwned {}

impl FromBorrowedBody for StartOwned {
    type Borrowed<'b> = Start<'b>;

    fn from_borrowed(borrowed: &Self::Borrowed<'_>) -> Self {
        StartOwned {
            action: borrowed.action,
            authentication: borrowed.authentication,
            user: borrowed.user_information.user().to_owned(),
            port: borrowed.user_information.port().to_owned(),
            remote_address: borrowed.user_information.remote_address().to_owned(),
            data: borrowed.data.to_owned(),
        }
    }
}

/// An authentication reply packet with owned fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyOwned {
    /// The status, as returned by the server.
    pub status: Status,

    /// The flags set in the server response.
    pub flags: ReplyFlags,

    /// The message to be displayed to the user.
    pub server_message: Vec<u8>,

    /// The domain-specific data included in the reply.
    pub data: Vec<u8>,
}

impl ReplyOwned {
    /// Serializes this body into its wire format, truncating an oversized server message.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SerializeError> {
        let reply = Reply::new(self.status, self.flags, &self.server_message, &self.data)?;
        serialize_to_vec(&reply)
    }
}

impl Sealed for ReplyOwned {}

impl FromBorrowedBody for ReplyOwned {
    type Borrowed<'b> = Reply<'b>;

    fn from_borrowed(borrowed: &Self::Borrowed<'_>) -> Self {
        ReplyOwned {
            status: borrowed.status,
            flags: borrowed.flags,
            server_message: borrowed.server_message.to_owned(),
            data: borrowed.data.to_owned(),
        }
    }
}

/// An authentication continue packet with owned fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContinueOwned {
    /// The user's response to the server prompt.
    pub user_message: Vec<u8>,

    /// The domain-specific data sent by the client.
    pub data: Vec<u8>,

    /// The flags set by the client.
    pub flags: ContinueFlags,
}

impl ContinueOwned {
    /// Serializes this body into its wire format, truncating an oversized user message.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SerializeError> {
        let continue_body = Continue::new(&self.user_message, &self.data, self.flags)?;
        serialize_to_vec(&continue_body)
    }
}

impl Sealed for ContinueOwned {}

impl FromBorrowedBody for ContinueOwned {
    type Borrowed<'b> = Continue<'b>;

    fn from_borrowed(borrowed: &Self::Borrowed<'_>) -> Self {
        ContinueOwned {
            user_message: borrowed.user_message.to_owned(),
            data: borrowed.data.to_owned(),
            flags: borrowed.flags,
        }
    }
}
