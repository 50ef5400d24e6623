//! Key derivation for encrypted key containers.
//!
//! The OpenSSH v1 container only ever uses bcrypt. Its parameters travel as
//! an opaque kdf-options string (`string salt, uint32 rounds`) parsed here;
//! derivation produces one contiguous secret the caller splits into cipher
//! key and IV.

use bcrypt_pbkdf::bcrypt_pbkdf;
use zeroize::Zeroizing;

use crate::error::{Result, SealError};
use crate::wire::{WireReader, WireWriter};

/// Upper bound on derived key material per derivation.
///
/// No registered cipher needs more than 64 bytes of key plus 16 of IV; the
/// bound exists so a forged container cannot request an absurd amount of
/// bcrypt work.
pub(crate) const KEY_MATERIAL_MAX: usize = 128;

/// Upper bound on passphrase length accepted from a provider.
pub const PASSPHRASE_MAX: usize = 128;

/// bcrypt parameters of one encrypted container.
#[derive(Debug, PartialEq, Eq)]
pub struct KdfParams {
    pub salt: Vec<u8>,
    pub rounds: u32,
}

impl KdfParams {
    /// Parses a kdf-options blob. The blob must contain exactly the salt and
    /// the round count, with nothing trailing.
    pub(crate) fn parse(options: &[u8]) -> Result<Self> {
        let mut reader = WireReader::new(options);
        let salt = reader.read_string()?.to_vec();
        let rounds = reader.read_u32()?;
        if !reader.is_empty() || rounds == 0 {
            log::trace!("kdf options rejected: rounds {rounds}, trailing {}", reader.remaining());
            return Err(SealError::MalformedContainer);
        }
        Ok(Self { salt, rounds })
    }

    pub(crate) fn encode(&self) -> Vec<u8> {
        let mut writer = WireWriter::new();
        writer.write_string(&self.salt);
        writer.write_u32(self.rounds);
        writer.into_inner()
    }

    /// Derives `out_len` bytes of key material from a passphrase.
    ///
    /// Deterministic for fixed inputs. The result is the cipher key followed
    /// by the IV.
    pub fn derive(&self, passphrase: &[u8], out_len: usize) -> Result<Zeroizing<Vec<u8>>> {
        if out_len > KEY_MATERIAL_MAX {
            log::trace!("derivation of {out_len} bytes refused");
            return Err(SealError::KeyMaterialTooLarge);
        }
        let mut material = Zeroizing::new(vec![0u8; out_len]);
        bcrypt_pbkdf(passphrase, &self.salt, self.rounds, &mut material)
            .map_err(|err| SealError::BackendFailure(format!("bcrypt kdf failed: {err}")))?;
        Ok(material)
    }
}

/// Source of passphrases for containers that turn out to be encrypted when
/// the caller did not supply one up front.
pub trait PassphraseProvider {
    /// Returns the passphrase, at most `max_len` bytes. Declining to provide
    /// one should return [`SealError::PassphraseRequired`].
    fn request_passphrase(&mut self, prompt: &str, max_len: usize) -> Result<Zeroizing<Vec<u8>>>;
}

#[cfg(test)]
mod test {
    use super::{KdfParams, KEY_MATERIAL_MAX};
    use crate::error::SealError;

    #[test]
    fn options_roundtrip() {
        let params = KdfParams {
            salt: vec![0x5a; 16],
            rounds: 16,
        };
        let parsed = KdfParams::parse(&params.encode()).unwrap();
        assert_eq!(parsed, params);
    }

    #[test]
    fn zero_rounds_is_malformed() {
        let params = KdfParams {
            salt: vec![1, 2, 3, 4],
            rounds: 0,
        };
        assert_eq!(
            KdfParams::parse(&params.encode()),
            Err(SealError::MalformedContainer)
        );
    }

    #[test]
    fn trailing_garbage_is_malformed() {
        let mut encoded = KdfParams {
            salt: vec![1, 2, 3, 4],
            rounds: 8,
        }
        .encode();
        encoded.push(0);
        assert_eq!(
            KdfParams::parse(&encoded),
            Err(SealError::MalformedContainer)
        );
    }

    #[test]
    fn derivation_is_deterministic_and_salted() {
        // low round count, this is a correctness test not a benchmark
        let params = KdfParams {
            salt: vec![7u8; 16],
            rounds: 4,
        };
        let first = params.derive(b"tallship", 48).unwrap();
        let second = params.derive(b"tallship", 48).unwrap();
        assert_eq!(*first, *second);

        let other_salt = KdfParams {
            salt: vec![8u8; 16],
            rounds: 4,
        };
        assert_ne!(*first, *other_salt.derive(b"tallship", 48).unwrap());
        assert_ne!(*first, *params.derive(b"tallships", 48).unwrap());
    }

    #[test]
    fn derived_material_zeroizes() {
        use zeroize::{Zeroize, Zeroizing};

        let params = KdfParams {
            salt: vec![7u8; 16],
            rounds: 4,
        };
        // the annotation pins the wrapper type
        let mut material: Zeroizing<Vec<u8>> = params.derive(b"tallship", 32).unwrap();
        assert!(material.iter().any(|byte| *byte != 0));
        material.zeroize();
        // zeroizing a Vec wipes and empties it
        assert!(material.is_empty());
    }

    #[test]
    fn oversized_request_is_refused() {
        let params = KdfParams {
            salt: vec![7u8; 16],
            rounds: 4,
        };
        assert!(matches!(
            params.derive(b"x", KEY_MATERIAL_MAX + 1),
            Err(SealError::KeyMaterialTooLarge)
        ));
    }
}
