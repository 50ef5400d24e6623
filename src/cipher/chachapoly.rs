//! The combined `chacha20-poly1305@openssh.com` construction.
//!
//! Two independent 256 bit ChaCha20 keys are carved out of the 64 byte key
//! material: the first encrypts packet payloads, the second only the 4 byte
//! length field, so a receiver can frame the stream before authenticating.
//! Per packet, the Poly1305 key is the first 32 bytes of the payload cipher's
//! keystream block 0 and the payload itself starts at keystream offset 64.
//! The MAC covers the whole wire packet, encrypted length included.

use chacha20::ChaCha20Legacy;
use cipher::{KeyInit, KeyIvInit, StreamCipher, StreamCipherSeek};
use poly1305::Poly1305;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use super::{CipherDesc, Tag, LENFIELD_SIZE};
use crate::error::{Result, SealError};

#[derive(Zeroize, ZeroizeOnDrop)]
pub(super) struct ChachaPolyState {
    main_key: [u8; 32],
    header_key: [u8; 32],
}

/// Per-packet cipher setup derived from the session keys and the packet
/// sequence number.
struct PacketCiphers {
    main: ChaCha20Legacy,
    header: ChaCha20Legacy,
    poly_key: Zeroizing<[u8; 32]>,
}

impl ChachaPolyState {
    pub(super) fn init(desc: &CipherDesc, key: &[u8]) -> Result<Self> {
        if key.len() != desc.key_size() {
            log::trace!("chacha20-poly1305 setup: got {} key bytes", key.len());
            return Err(SealError::BackendFailure(format!(
                "invalid key length for {}",
                desc.name
            )));
        }
        let mut state = Self {
            main_key: [0u8; 32],
            header_key: [0u8; 32],
        };
        state.main_key.copy_from_slice(&key[..32]);
        state.header_key.copy_from_slice(&key[32..]);
        Ok(state)
    }

    fn packet_setup(&self, seq: u64) -> PacketCiphers {
        let nonce = seq.to_be_bytes();

        let mut main = ChaCha20Legacy::new((&self.main_key).into(), (&nonce).into());
        let header = ChaCha20Legacy::new((&self.header_key).into(), (&nonce).into());

        // Poly1305 key is keystream block 0; payload starts at block 1.
        let mut poly_key = Zeroizing::new([0u8; 32]);
        main.apply_keystream(&mut *poly_key);
        main.seek(64u64);

        PacketCiphers {
            main,
            header,
            poly_key,
        }
    }

    /// Seals one packet: length field under the header key, payload under the
    /// main key, then a MAC over the entire encrypted packet.
    pub(super) fn seal(&self, packet: &[u8], seq: u64) -> Result<(Vec<u8>, Tag)> {
        if packet.len() < LENFIELD_SIZE {
            return Err(SealError::InvalidBuffer(packet.len()));
        }
        let mut ciphers = self.packet_setup(seq);
        let mut out = packet.to_vec();
        let (lenfield, payload) = out.split_at_mut(LENFIELD_SIZE);
        ciphers.header.apply_keystream(lenfield);
        ciphers.main.apply_keystream(payload);

        let mac = Poly1305::new((&*ciphers.poly_key).into());
        let tag = mac.compute_unpadded(&out);
        Ok((out, tag.into()))
    }

    /// Decrypts a length field in isolation, without touching any packet
    /// state. Used to frame the stream before the full packet has arrived.
    pub(super) fn open_length(&self, lenfield: &[u8], seq: u64) -> Result<[u8; 4]> {
        if lenfield.len() != LENFIELD_SIZE {
            return Err(SealError::InvalidBuffer(lenfield.len()));
        }
        let mut ciphers = self.packet_setup(seq);
        let mut out = [0u8; 4];
        out.copy_from_slice(lenfield);
        ciphers.header.apply_keystream(&mut out);
        Ok(out)
    }

    /// Opens one packet. The tag is recomputed over the received ciphertext
    /// and compared in constant time before a single byte is decrypted.
    pub(super) fn open(&self, packet: &[u8], tag: &Tag, seq: u64) -> Result<Vec<u8>> {
        if packet.len() < LENFIELD_SIZE {
            return Err(SealError::InvalidBuffer(packet.len()));
        }
        let mut ciphers = self.packet_setup(seq);

        let mac = Poly1305::new((&*ciphers.poly_key).into());
        let expected = mac.compute_unpadded(packet);
        if !bool::from(expected.ct_eq(tag)) {
            log::debug!("chacha20-poly1305 tag verification failed");
            return Err(SealError::AuthenticationFailure);
        }

        let mut out = packet.to_vec();
        let (lenfield, payload) = out.split_at_mut(LENFIELD_SIZE);
        ciphers.header.apply_keystream(lenfield);
        ciphers.main.apply_keystream(payload);
        Ok(out)
    }
}

#[cfg(test)]
mod test {
    use super::ChachaPolyState;
    use crate::cipher::lookup;
    use crate::util::test::assert_bytes_eq;

    fn state() -> ChachaPolyState {
        let desc = lookup("chacha20-poly1305@openssh.com").unwrap();
        let key: Vec<u8> = (0u8..64).collect();
        ChachaPolyState::init(desc, &key).unwrap()
    }

    #[test]
    fn length_decryption_matches_full_open() {
        let state = state();
        let mut packet = vec![0, 0, 0, 12];
        packet.extend_from_slice(b"twelve bytes");

        let (sealed, tag) = state.seal(&packet, 3).unwrap();
        let lenfield = state.open_length(&sealed[..4], 3).unwrap();
        let opened = state.open(&sealed, &tag, 3).unwrap();

        assert_bytes_eq(&lenfield, &opened[..4]);
        assert_bytes_eq(&opened, &packet);
    }

    #[test]
    fn sequence_number_binds_the_packet() {
        let state = state();
        let packet = [0, 0, 0, 4, 1, 2, 3, 4];
        let (sealed, tag) = state.seal(&packet, 7).unwrap();
        assert!(state.open(&sealed, &tag, 8).is_err());
        assert!(state.open(&sealed, &tag, 7).is_ok());
    }
}
