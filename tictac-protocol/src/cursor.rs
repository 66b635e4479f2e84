//! Big-endian cursors over byte buffers.
//!
//! Every codec in this crate reads and writes through these, so an out-of-range
//! access surfaces as an [`OutOfBounds`] error instead of a panic.

use core::fmt;

use byteorder::{ByteOrder, NetworkEndian};


/// A read or write went past the end of the underlying buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutOfBounds {
    /// The number of bytes the operation needed.
    pub needed: usize,

    /// The number of bytes that were left in the buffer.
    pub remaining: usize,
}

impl fmt::Display for OutOfBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cursor out of bounds: needed {} bytes but only {} remain",
            self.needed, self.remaining
        )
    }
}

/// Reads network-order integers and byte runs sequentially from a buffer.
#[derive(Debug, Clone)]
pub struct ReadCursor<'buf> {
    buffer: &'buf [u8],
    position: usize,
}

impl<'buf> ReadCursor<'buf> {
    /// Starts a cursor at the beginning of `buffer`.
    pub fn new(buffer: &'buf [u8]) -> Self {
        Self {
            buffer,
            position: 0,
        }
    }

    /// The number of bytes consumed so far.
    pub fn position(&self) -> usize {
        self.position
    }

    /// The number of bytes left to read.
    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.position
    }

    /// Consumes the next `length` bytes, returning them as a slice of the underlying buffer.
    pub fn read_bytes(&mut self, length: usize) -> Result<&'buf [u8], OutOfBounds> {
        let remaining = self.remaining();
        if length > remaining {
            return Err(OutOfBounds {
                needed: length,
                remaining,
            });
        }

        let bytes = &self.buffer[self.position..self.position + length];
        self.position += length;
        Ok(bytes)
    }

    /// Reads a single byte.
    pub fn read_u8(&mut self) -> Result<u8, OutOfBounds> {
        self.read_bytes(1).map(|bytes| bytes[0])
    }

    /// Reads a big-endian `u16`.
    pub fn read_u16(&mut self) -> Result<u16, OutOfBounds> {
        self.read_bytes(2).map(NetworkEndian::read_u16)
    }

    /// Reads a big-endian `u32`.
    pub fn read_u32(&mut self) -> Result<u32, OutOfBounds> {
        self.read_bytes(4).map(NetworkEndian::read_u32)
    }

    /// Reads a big-endian `u64`.
    pub fn read_u64(&mut self) -> Result<u64, OutOfBounds> {
        self.read_bytes(8).map(NetworkEndian::read_u64)
    }
}

/// Writes network-order integers and byte runs sequentially into a buffer.
#[derive(Debug)]
pub struct WriteCursor<'buf> {
    buffer: &'buf mut [u8],
    position: usize,
}

impl<'buf> WriteCursor<'buf> {
    /// Starts a cursor at the beginning of `buffer`.
    pub fn new(buffer: &'buf mut [u8]) -> Self {
        Self {
            buffer,
            position: 0,
        }
    }

    /// The number of bytes written so far.
    pub fn position(&self) -> usize {
        self.position
    }

    /// The number of bytes that can still be written.
    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.position
    }

    /// Reserves the next `length` bytes of the buffer for writing.
    fn advance(&mut self, length: usize) -> Result<&mut [u8], OutOfBounds> {
        let remaining = self.remaining();
        if length > remaining {
            return Err(OutOfBounds {
                needed: length,
                remaining,
            });
        }

        let start = self.position;
        self.position += length;
        Ok(&mut self.buffer[start..start + length])
    }

    /// Copies `bytes` into the buffer.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), OutOfBounds> {
        self.advance(bytes.len())?.copy_from_slice(bytes);
        Ok(())
    }

    /// Writes a single byte.
    pub fn write_u8(&mut self, value: u8) -> Result<(), OutOfBounds> {
        self.advance(1)?[0] = value;
        Ok(())
    }

    /// Writes a big-endian `u16`.
    pub fn write_u16(&mut self, value: u16) -> Result<(), OutOfBounds> {
        NetworkEndian::write_u16(self.advance(2)?, value);
        Ok(())
    }

    /// Writes a big-endian `u32`.
    pub fn write_u32(&mut self, value: u32) -> Result<(), OutOfBounds> {
        NetworkEndian::write_u32(self.advance(4)?, value);
        Ok(())
    }

    /// Writes a big-endian `u64`.
    pub fn write_u64(&mut self, value: u64) -> Result<(), OutOfBounds> {
        NetworkEndian::write_u64(self.advance(8)?, value);
        Ok(())
    }
}
