use super::sealed::Sealed;
use super::{Deserialize, DeserializeError, PacketBody, PacketType};

/// A packet body that owns its fields, built from the borrowed body of the same kind.
///
/// Owned bodies are handy when a body has to outlive the buffer it was read from, e.g.
/// when it is kept around across awaits. `ToOwned` isn't used since the borrowed bodies
/// can't implement the `Borrow` relationship it requires.
///
/// Every implementor is also [`Deserialize`] and [`PacketBody`] through blanket impls.
pub trait FromBorrowedBody: Sealed {
    /// The borrowed body type this is converted from.
    type Borrowed<'b>: PacketBody;

    /// Copies the fields of a borrowed body into an owned one.
    fn from_borrowed(borrowed: &Self::Borrowed<'_>) -> Self;
}

impl<'raw, O> Deserialize<'raw> for O
where
    O: FromBorrowedBody,
    O::Borrowed<'raw>: Deserialize<'raw>,
{
    fn deserialize_from_buffer(buffer: &'raw [u8]) -> Result<Self, DeserializeError> {
        <O::Borrowed<'raw> as Deserialize<'raw>>::deserialize_from_buffer(buffer)
            .map(|borrowed| O::from_borrowed(&borrowed))
    }
}

// NOTE: required_minor_version keeps its default, since owned bodies only come from
// deserialization where the header minor version is already fixed
impl<O: FromBorrowedBody> PacketBody for O {
    const TYPE: PacketType = <O::Borrowed<'static> as PacketBody>::TYPE;
    const REQUIRED_FIELDS_LENGTH: usize =
        <O::Borrowed<'static> as PacketBody>::REQUIRED_FIELDS_LENGTH;
}
