use md5::{Digest, Md5};

use crate::HeaderInfo;


/// MD5 hash output size, in bytes.
pub const MD5_OUTPUT_SIZE: usize = 16;

/// The chained MD5 keystream for one packet.
///
/// Block `n` is `MD5(session id || key || version || sequence number || block n-1)`,
/// where block -1 is empty.
struct PseudoPad {
    /// Hash state after the part of the input that is shared by every block.
    prefix: Md5,
    previous: Option<[u8; MD5_OUTPUT_SIZE]>,
}

impl PseudoPad {
    fn new(header: &HeaderInfo, secret_key: &[u8]) -> Self {
        let mut prefix = Md5::new();
        prefix.update(header.session_id().to_be_bytes());
        prefix.update(secret_key);
        prefix.update([u8::from(header.version()), header.sequence_number()]);

        Self {
            prefix,
            previous: None,
        }
    }

    fn next_block(&mut self) -> [u8; MD5_OUTPUT_SIZE] {
        let mut hasher = self.prefix.clone();
        if let Some(previous) = &self.previous {
            hasher.update(previous);
        }

        let mut block = [0; MD5_OUTPUT_SIZE];
        block.copy_from_slice(&hasher.finalize());

        self.previous = Some(block);
        block
    }
}

/// (De)obfuscates the body of a packet in place, as specified in [RFC8907 section 4.5].
///
/// The body is XORed with a keystream derived from the secret key and the session id,
/// version & sequence number of `header`, so applying this twice restores the original body.
/// Bodies that aren't a multiple of 16 bytes use a prefix of the last keystream block.
///
/// Callers are responsible for honoring the [`UNENCRYPTED`](crate::PacketFlags::UNENCRYPTED) flag.
///
/// [RFC8907 section 4.5]: https://www.rfc-editor.org/rfc/rfc8907.html#name-data-obfuscation
pub fn obfuscate_body(header: &HeaderInfo, secret_key: &[u8], body_buffer: &mut [u8]) {
    let mut pad = PseudoPad::new(header, secret_key);

    for chunk in body_buffer.chunks_mut(MD5_OUTPUT_SIZE) {
        let block = pad.next_block();
        chunk
            .iter_mut()
            .zip(block)
            .for_each(|(byte, pad_byte)| *byte ^= pad_byte);
    }
}
