//! Typed key objects and their container encodings.
//!
//! Only `ssh-ed25519` is registered. The public blob is the standard
//! `string name, string key` encoding; inside a private section the key
//! additionally carries the 64 byte `seed || public` private half whose
//! trailing 32 bytes must repeat the public key.

use ed25519_dalek::SigningKey;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{Result, SealError};
use crate::wire::{WireReader, WireWriter};

pub(crate) const ED25519_NAME: &str = "ssh-ed25519";

/// A public key parsed from or destined for a container.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum PublicKey {
    Ed25519([u8; 32]),
}

impl PublicKey {
    /// Protocol algorithm name.
    pub fn algorithm(&self) -> &'static str {
        match self {
            Self::Ed25519(_) => ED25519_NAME,
        }
    }

    pub(crate) fn to_blob(&self) -> Vec<u8> {
        let mut writer = WireWriter::new();
        match self {
            Self::Ed25519(public) => {
                writer.write_string(ED25519_NAME.as_bytes());
                writer.write_string(public);
            }
        }
        writer.into_inner()
    }

    pub(crate) fn from_blob(blob: &[u8]) -> Result<Self> {
        let mut reader = WireReader::new(blob);
        let name = reader.read_utf8()?;
        if name != ED25519_NAME {
            log::trace!("unknown public key type {name}");
            return Err(SealError::MalformedContainer);
        }
        let raw = reader.read_string()?;
        if raw.len() != 32 || !reader.is_empty() {
            return Err(SealError::MalformedContainer);
        }
        let mut public = [0u8; 32];
        public.copy_from_slice(raw);
        Ok(Self::Ed25519(public))
    }
}

/// Ed25519 private half, zeroed when dropped.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Ed25519PrivateKey {
    seed: [u8; 32],
    public: [u8; 32],
}

impl Ed25519PrivateKey {
    /// Derives the public half from a 32 byte seed.
    pub fn from_seed(seed: [u8; 32]) -> Self {
        let public = SigningKey::from_bytes(&seed).verifying_key().to_bytes();
        Self { seed, public }
    }

    pub fn seed(&self) -> &[u8; 32] {
        &self.seed
    }

    pub fn public(&self) -> &[u8; 32] {
        &self.public
    }
}

/// A private key parsed from or destined for a container.
#[derive(Zeroize, ZeroizeOnDrop)]
pub enum PrivateKey {
    Ed25519(Ed25519PrivateKey),
}

impl PrivateKey {
    /// The corresponding public key.
    pub fn public_key(&self) -> PublicKey {
        match self {
            Self::Ed25519(key) => PublicKey::Ed25519(*key.public()),
        }
    }

    /// Encodes the key the way it appears inside a decrypted private
    /// section, after the checkints and before the comment.
    pub(crate) fn encode_private(&self, writer: &mut WireWriter) {
        match self {
            Self::Ed25519(key) => {
                writer.write_string(ED25519_NAME.as_bytes());
                writer.write_string(key.public());
                let mut private = zeroize::Zeroizing::new([0u8; 64]);
                private[..32].copy_from_slice(key.seed());
                private[32..].copy_from_slice(key.public());
                writer.write_string(private.as_ref());
            }
        }
    }

    /// Decodes a key from a decrypted private section.
    pub(crate) fn decode_private(reader: &mut WireReader<'_>) -> Result<Self> {
        let name = reader.read_utf8()?;
        if name != ED25519_NAME {
            log::trace!("unknown private key type {name}");
            return Err(SealError::MalformedContainer);
        }
        let public_raw = reader.read_string()?;
        let private_raw = reader.read_string()?;
        if public_raw.len() != 32 || private_raw.len() != 64 || &private_raw[32..] != public_raw {
            log::trace!("inconsistent ed25519 key halves");
            return Err(SealError::MalformedContainer);
        }
        let mut seed = [0u8; 32];
        seed.copy_from_slice(&private_raw[..32]);
        let mut public = [0u8; 32];
        public.copy_from_slice(public_raw);
        Ok(Self::Ed25519(Ed25519PrivateKey { seed, public }))
    }
}
