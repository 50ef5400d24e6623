//! Packet cipher registry and per-direction cipher sessions.
//!
//! The registry is a fixed table of [`CipherDesc`] entries, one per protocol
//! cipher name. A descriptor never changes after initialization; encrypting
//! or decrypting requires constructing a [`CipherSession`] from a descriptor
//! and caller-supplied key material.

mod block;
mod chachapoly;
mod gcm;
mod session;

pub use session::CipherSession;

/// Authentication tag attached to AEAD packets.
///
/// Both supported AEAD constructions (AES-GCM and ChaCha20-Poly1305) use
/// 16 byte tags.
pub type Tag = [u8; 16];

/// Size of the packet length field for AEAD ciphers, in bytes.
pub(crate) const LENFIELD_SIZE: usize = 4;

/// Cipher families supported by the packet engine.
///
/// Dispatch is a match over this closed set; a family carries only the
/// operations it implements, so there is no way to invoke e.g. the combined
/// AEAD path on a plain block cipher.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum CipherFamily {
    /// chained block mode, no padding, chain state carried across packets
    BlockCbc,
    /// counter mode, keystream position carried across packets
    BlockCtr,
    /// AES-GCM with the length field sent in clear but authenticated
    AeadGcm,
    /// combined ChaCha20 stream cipher with per-packet Poly1305 MAC
    ChachaPoly,
    /// identity transform, used by unencrypted key containers
    Null,
}

/// Immutable descriptor of one registered cipher.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct CipherDesc {
    /// protocol identifier, e.g. `aes256-ctr`
    pub name: &'static str,
    pub family: CipherFamily,
    /// cipher block size in bytes (8 for stream-only constructions)
    pub block_size: usize,
    pub key_size_bits: usize,
    /// IV/nonce size consumed by session setup
    pub iv_size: usize,
    /// authentication tag size, 0 for non-AEAD ciphers
    pub tag_size: usize,
    /// size of the packet length field handled separately by AEAD ciphers
    pub lenfield_size: usize,
}

impl CipherDesc {
    /// Key size in bytes.
    pub fn key_size(&self) -> usize {
        self.key_size_bits / 8
    }

    /// Amount of key material a KDF must produce for this cipher: the key
    /// followed by the IV.
    pub fn key_material_len(&self) -> usize {
        self.key_size() + self.iv_size
    }

    /// Returns true if packets carry an authentication tag.
    pub fn is_aead(&self) -> bool {
        self.tag_size != 0
    }
}

static CIPHER_TABLE: &[CipherDesc] = &[
    CipherDesc {
        name: "aes128-ctr",
        family: CipherFamily::BlockCtr,
        block_size: 16,
        key_size_bits: 128,
        iv_size: 16,
        tag_size: 0,
        lenfield_size: 0,
    },
    CipherDesc {
        name: "aes192-ctr",
        family: CipherFamily::BlockCtr,
        block_size: 16,
        key_size_bits: 192,
        iv_size: 16,
        tag_size: 0,
        lenfield_size: 0,
    },
    CipherDesc {
        name: "aes256-ctr",
        family: CipherFamily::BlockCtr,
        block_size: 16,
        key_size_bits: 256,
        iv_size: 16,
        tag_size: 0,
        lenfield_size: 0,
    },
    CipherDesc {
        name: "aes128-cbc",
        family: CipherFamily::BlockCbc,
        block_size: 16,
        key_size_bits: 128,
        iv_size: 16,
        tag_size: 0,
        lenfield_size: 0,
    },
    CipherDesc {
        name: "aes192-cbc",
        family: CipherFamily::BlockCbc,
        block_size: 16,
        key_size_bits: 192,
        iv_size: 16,
        tag_size: 0,
        lenfield_size: 0,
    },
    CipherDesc {
        name: "aes256-cbc",
        family: CipherFamily::BlockCbc,
        block_size: 16,
        key_size_bits: 256,
        iv_size: 16,
        tag_size: 0,
        lenfield_size: 0,
    },
    CipherDesc {
        name: "aes128-gcm@openssh.com",
        family: CipherFamily::AeadGcm,
        block_size: 16,
        key_size_bits: 128,
        iv_size: 12,
        tag_size: 16,
        // not encrypted, but authenticated
        lenfield_size: LENFIELD_SIZE,
    },
    CipherDesc {
        name: "aes256-gcm@openssh.com",
        family: CipherFamily::AeadGcm,
        block_size: 16,
        key_size_bits: 256,
        iv_size: 12,
        tag_size: 16,
        lenfield_size: LENFIELD_SIZE,
    },
    CipherDesc {
        name: "chacha20-poly1305@openssh.com",
        family: CipherFamily::ChachaPoly,
        block_size: 8,
        // two independent 256 bit ChaCha20 keys
        key_size_bits: 512,
        iv_size: 0,
        tag_size: 16,
        lenfield_size: LENFIELD_SIZE,
    },
    CipherDesc {
        name: "none",
        family: CipherFamily::Null,
        block_size: 8,
        key_size_bits: 0,
        iv_size: 0,
        tag_size: 0,
        lenfield_size: 0,
    },
];

/// Looks up a cipher descriptor by its protocol name.
///
/// A cipher missing from this build is indistinguishable from one that never
/// existed: both return [`SealError::UnsupportedCipher`].
///
/// [`SealError::UnsupportedCipher`]: crate::error::SealError::UnsupportedCipher
pub fn lookup(name: &str) -> crate::error::Result<&'static CipherDesc> {
    CIPHER_TABLE
        .iter()
        .find(|desc| desc.name == name)
        .ok_or_else(|| {
            log::trace!("unsupported cipher {name}");
            crate::error::SealError::UnsupportedCipher(name.to_string())
        })
}

#[cfg(test)]
mod test {
    use super::{lookup, CipherFamily};
    use crate::error::SealError;
    use test_case::test_case;

    #[test_case("aes128-ctr", CipherFamily::BlockCtr, 16, 16; "aes128 ctr")]
    #[test_case("aes192-ctr", CipherFamily::BlockCtr, 24, 16; "aes192 ctr")]
    #[test_case("aes256-ctr", CipherFamily::BlockCtr, 32, 16; "aes256 ctr")]
    #[test_case("aes128-cbc", CipherFamily::BlockCbc, 16, 16; "aes128 cbc")]
    #[test_case("aes192-cbc", CipherFamily::BlockCbc, 24, 16; "aes192 cbc")]
    #[test_case("aes256-cbc", CipherFamily::BlockCbc, 32, 16; "aes256 cbc")]
    #[test_case("aes128-gcm@openssh.com", CipherFamily::AeadGcm, 16, 12; "aes128 gcm")]
    #[test_case("aes256-gcm@openssh.com", CipherFamily::AeadGcm, 32, 12; "aes256 gcm")]
    #[test_case("chacha20-poly1305@openssh.com", CipherFamily::ChachaPoly, 64, 0; "chacha20 poly1305")]
    fn registry_entries(name: &str, family: CipherFamily, key_size: usize, iv_size: usize) {
        let desc = lookup(name).unwrap();
        assert_eq!(desc.name, name);
        assert_eq!(desc.family, family);
        assert_eq!(desc.key_size(), key_size);
        assert_eq!(desc.iv_size, iv_size);
        assert_eq!(desc.key_material_len(), key_size + iv_size);
    }

    #[test]
    fn aead_entries_carry_tag_and_length_field() {
        for name in [
            "aes128-gcm@openssh.com",
            "aes256-gcm@openssh.com",
            "chacha20-poly1305@openssh.com",
        ] {
            let desc = lookup(name).unwrap();
            assert!(desc.is_aead());
            assert_eq!(desc.tag_size, 16);
            assert_eq!(desc.lenfield_size, 4);
        }
    }

    #[test]
    fn unknown_cipher_is_rejected() {
        assert_eq!(
            lookup("blowfish-cbc"),
            Err(SealError::UnsupportedCipher("blowfish-cbc".to_string()))
        );
    }
}
