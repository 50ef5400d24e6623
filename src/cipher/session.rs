//! Per-direction cipher sessions.
//!
//! A [`CipherSession`] binds a registry descriptor to live key material for
//! exactly one direction of one connection. Block-mode sessions mutate
//! internal chaining state on every call, so packets must be processed in
//! wire order. AEAD sessions additionally consume the packet sequence number
//! (ChaCha20-Poly1305) or an internal invocation counter (AES-GCM).

use super::block::BlockState;
use super::chachapoly::ChachaPolyState;
use super::gcm::GcmState;
use super::{CipherDesc, CipherFamily, Tag, LENFIELD_SIZE};
use crate::error::{Result, SealError};

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
enum Direction {
    Encrypt,
    Decrypt,
}

enum SessionInner {
    Block(BlockState),
    Gcm(GcmState),
    ChachaPoly(ChachaPolyState),
    Null,
}

/// One direction of a packet cipher, holding all mutable cipher state.
pub struct CipherSession {
    desc: &'static CipherDesc,
    direction: Direction,
    inner: SessionInner,
}

impl CipherSession {
    /// Sets up the sending half of a cipher.
    pub fn init_encrypt(desc: &'static CipherDesc, key: &[u8], iv: &[u8]) -> Result<Self> {
        Self::init(desc, Direction::Encrypt, key, iv)
    }

    /// Sets up the receiving half of a cipher.
    pub fn init_decrypt(desc: &'static CipherDesc, key: &[u8], iv: &[u8]) -> Result<Self> {
        Self::init(desc, Direction::Decrypt, key, iv)
    }

    fn init(
        desc: &'static CipherDesc,
        direction: Direction,
        key: &[u8],
        iv: &[u8],
    ) -> Result<Self> {
        if key.len() != desc.key_size() || iv.len() != desc.iv_size {
            log::trace!(
                "cipher init for {}: got {} key / {} iv bytes",
                desc.name,
                key.len(),
                iv.len()
            );
            return Err(SealError::BackendFailure(format!(
                "invalid key or IV length for {}",
                desc.name
            )));
        }
        let inner = match desc.family {
            CipherFamily::BlockCbc | CipherFamily::BlockCtr => match direction {
                Direction::Encrypt => SessionInner::Block(BlockState::init_encrypt(desc, key, iv)?),
                Direction::Decrypt => SessionInner::Block(BlockState::init_decrypt(desc, key, iv)?),
            },
            CipherFamily::AeadGcm => SessionInner::Gcm(GcmState::init(desc, key, iv)?),
            CipherFamily::ChachaPoly => SessionInner::ChachaPoly(ChachaPolyState::init(desc, key)?),
            CipherFamily::Null => SessionInner::Null,
        };
        Ok(Self {
            desc,
            direction,
            inner,
        })
    }

    /// Descriptor this session was built from.
    pub fn desc(&self) -> &'static CipherDesc {
        self.desc
    }

    fn check_direction(&self, wanted: Direction) -> Result<()> {
        if self.direction != wanted {
            return Err(SealError::BackendFailure(format!(
                "{} session used in the wrong direction",
                self.desc.name
            )));
        }
        Ok(())
    }

    /// Encrypts `data` in place. Only valid for non-AEAD ciphers; the buffer
    /// must be a whole number of blocks.
    pub fn encrypt(&mut self, data: &mut [u8]) -> Result<()> {
        self.check_direction(Direction::Encrypt)?;
        match &mut self.inner {
            SessionInner::Block(state) => {
                self.desc.check_buffer(data.len())?;
                state.apply(data)
            }
            SessionInner::Null => Ok(()),
            SessionInner::Gcm(_) | SessionInner::ChachaPoly(_) => Err(SealError::BackendFailure(
                format!("{} requires the AEAD interface", self.desc.name),
            )),
        }
    }

    /// Decrypts `data` in place. Only valid for non-AEAD ciphers.
    pub fn decrypt(&mut self, data: &mut [u8]) -> Result<()> {
        self.check_direction(Direction::Decrypt)?;
        match &mut self.inner {
            SessionInner::Block(state) => {
                self.desc.check_buffer(data.len())?;
                state.apply(data)
            }
            SessionInner::Null => Ok(()),
            SessionInner::Gcm(_) | SessionInner::ChachaPoly(_) => Err(SealError::BackendFailure(
                format!("{} requires the AEAD interface", self.desc.name),
            )),
        }
    }

    /// Seals a whole packet, length field included, and returns the wire
    /// bytes plus the detached authentication tag.
    ///
    /// `seq` is the packet sequence number; AES-GCM ignores it and advances
    /// its own invocation counter instead.
    pub fn aead_encrypt(&mut self, packet: &[u8], seq: u64) -> Result<(Vec<u8>, Tag)> {
        self.check_direction(Direction::Encrypt)?;
        match &mut self.inner {
            SessionInner::Gcm(state) => state.seal(packet),
            SessionInner::ChachaPoly(state) => state.seal(packet, seq),
            SessionInner::Block(_) | SessionInner::Null => Err(SealError::BackendFailure(format!(
                "{} is not an AEAD cipher",
                self.desc.name
            ))),
        }
    }

    /// Opens a whole packet, verifying `tag` before any plaintext is
    /// released. Cipher state only advances on success.
    pub fn aead_decrypt(&mut self, packet: &[u8], tag: &Tag, seq: u64) -> Result<Vec<u8>> {
        self.check_direction(Direction::Decrypt)?;
        match &mut self.inner {
            SessionInner::Gcm(state) => state.open(packet, tag),
            SessionInner::ChachaPoly(state) => state.open(packet, tag, seq),
            SessionInner::Block(_) | SessionInner::Null => Err(SealError::BackendFailure(format!(
                "{} is not an AEAD cipher",
                self.desc.name
            ))),
        }
    }

    /// Recovers the cleartext 4 byte length field of an incoming AEAD packet
    /// without consuming any per-packet state, so the caller can frame the
    /// stream before the rest of the packet has arrived.
    pub fn decrypt_length(&self, lenfield: &[u8], seq: u64) -> Result<[u8; 4]> {
        self.check_direction(Direction::Decrypt)?;
        match &self.inner {
            // the length travels in clear, only covered by the tag
            SessionInner::Gcm(_) => {
                if lenfield.len() != LENFIELD_SIZE {
                    return Err(SealError::InvalidBuffer(lenfield.len()));
                }
                let mut out = [0u8; 4];
                out.copy_from_slice(lenfield);
                Ok(out)
            }
            SessionInner::ChachaPoly(state) => state.open_length(lenfield, seq),
            SessionInner::Block(_) | SessionInner::Null => Err(SealError::BackendFailure(format!(
                "{} has no separate length field",
                self.desc.name
            ))),
        }
    }
}

impl CipherDesc {
    fn check_buffer(&self, len: usize) -> Result<()> {
        if len % self.block_size != 0 {
            log::trace!(
                "misaligned buffer for {}: {len} bytes, block size {}",
                self.name,
                self.block_size
            );
            return Err(SealError::InvalidBuffer(len));
        }
        Ok(())
    }
}
