//! AES-GCM packet sealing with an authenticated-but-clear length field.
//!
//! The 4 byte packet length prefix travels unencrypted so the peer can frame
//! the stream, but it is fed to GCM as associated data and therefore covered
//! by the tag. The session owns a 12 byte invocation IV whose trailing 64 bit
//! counter is incremented after every successfully sealed or opened packet.

use aes_gcm::{
    aead::AeadInPlace, Aes128Gcm, Aes256Gcm, Key, KeyInit, Nonce, Tag as GcmTag,
};

use super::{CipherDesc, Tag, LENFIELD_SIZE};
use crate::error::{Result, SealError};
use crate::util::uint64_inc;

enum GcmCipher {
    Aes128(Box<Aes128Gcm>),
    Aes256(Box<Aes256Gcm>),
}

pub(super) struct GcmState {
    cipher: GcmCipher,
    last_iv: [u8; 12],
}

impl GcmState {
    pub(super) fn init(desc: &CipherDesc, key: &[u8], iv: &[u8]) -> Result<Self> {
        if key.len() != desc.key_size() || iv.len() != desc.iv_size {
            log::trace!(
                "gcm setup for {}: got {} key / {} iv bytes",
                desc.name,
                key.len(),
                iv.len()
            );
            return Err(SealError::BackendFailure(format!(
                "invalid key or IV length for {}",
                desc.name
            )));
        }
        let cipher = match desc.key_size_bits {
            128 => GcmCipher::Aes128(Box::new(Aes128Gcm::new(Key::<Aes128Gcm>::from_slice(key)))),
            256 => GcmCipher::Aes256(Box::new(Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key)))),
            _ => {
                return Err(SealError::BackendFailure(format!(
                    "no GCM variant for {}",
                    desc.name
                )))
            }
        };
        let mut last_iv = [0u8; 12];
        last_iv.copy_from_slice(iv);
        Ok(Self { cipher, last_iv })
    }

    /// Seals one packet. The input must start with the 4 byte length field;
    /// the output repeats it verbatim, followed by the ciphertext.
    pub(super) fn seal(&mut self, packet: &[u8]) -> Result<(Vec<u8>, Tag)> {
        let (lenfield, payload) = split_lenfield(packet)?;
        let mut out = packet.to_vec();
        let nonce = Nonce::from_slice(&self.last_iv);
        let body = &mut out[LENFIELD_SIZE..];
        let tag = match &self.cipher {
            GcmCipher::Aes128(cipher) => cipher.encrypt_in_place_detached(nonce, lenfield, body),
            GcmCipher::Aes256(cipher) => cipher.encrypt_in_place_detached(nonce, lenfield, body),
        }
        .map_err(|_| SealError::BackendFailure("AES-GCM encryption failed".to_string()))?;
        debug_assert_eq!(payload.len(), body.len());
        uint64_inc(&mut self.last_iv[4..]);
        Ok((out, tag.into()))
    }

    /// Opens one packet, verifying the tag over the length field and the
    /// ciphertext before any plaintext is produced. The IV only advances on
    /// success, so a tampered packet can be retried after rekeying.
    pub(super) fn open(&mut self, packet: &[u8], tag: &Tag) -> Result<Vec<u8>> {
        let (lenfield, _) = split_lenfield(packet)?;
        let mut out = packet.to_vec();
        let nonce = Nonce::from_slice(&self.last_iv);
        let body = &mut out[LENFIELD_SIZE..];
        let result = match &self.cipher {
            GcmCipher::Aes128(cipher) => {
                cipher.decrypt_in_place_detached(nonce, lenfield, body, GcmTag::from_slice(tag))
            }
            GcmCipher::Aes256(cipher) => {
                cipher.decrypt_in_place_detached(nonce, lenfield, body, GcmTag::from_slice(tag))
            }
        };
        if result.is_err() {
            log::debug!("AES-GCM tag verification failed");
            return Err(SealError::AuthenticationFailure);
        }
        uint64_inc(&mut self.last_iv[4..]);
        Ok(out)
    }
}

fn split_lenfield(packet: &[u8]) -> Result<(&[u8], &[u8])> {
    if packet.len() < LENFIELD_SIZE {
        return Err(SealError::InvalidBuffer(packet.len()));
    }
    Ok(packet.split_at(LENFIELD_SIZE))
}
