//! Block-mode packet ciphers: AES in CBC and CTR mode.
//!
//! Packets are always a whole number of blocks and no padding is ever added
//! or removed. CBC chaining state and the CTR keystream position both carry
//! over from one packet to the next, so a session must see every packet of
//! its direction exactly once and in order.

use aes::{Aes128, Aes192, Aes256};
use cipher::{
    generic_array::GenericArray, BlockDecryptMut, BlockEncryptMut, KeyIvInit, StreamCipher,
};
use ctr::Ctr128BE;

use super::{CipherDesc, CipherFamily};
use crate::error::{Result, SealError};

pub(super) enum BlockState {
    Cbc128Enc(cbc::Encryptor<Aes128>),
    Cbc192Enc(cbc::Encryptor<Aes192>),
    Cbc256Enc(cbc::Encryptor<Aes256>),
    Cbc128Dec(cbc::Decryptor<Aes128>),
    Cbc192Dec(cbc::Decryptor<Aes192>),
    Cbc256Dec(cbc::Decryptor<Aes256>),
    Ctr128(Ctr128BE<Aes128>),
    Ctr192(Ctr128BE<Aes192>),
    Ctr256(Ctr128BE<Aes256>),
}

fn setup_failed(desc: &CipherDesc) -> SealError {
    log::trace!("cipher setup failed for {}", desc.name);
    SealError::BackendFailure(format!("invalid key or IV length for {}", desc.name))
}

impl BlockState {
    pub(super) fn init_encrypt(desc: &CipherDesc, key: &[u8], iv: &[u8]) -> Result<Self> {
        let state = match (desc.family, desc.key_size_bits) {
            (CipherFamily::BlockCbc, 128) => Self::Cbc128Enc(
                cbc::Encryptor::new_from_slices(key, iv).map_err(|_| setup_failed(desc))?,
            ),
            (CipherFamily::BlockCbc, 192) => Self::Cbc192Enc(
                cbc::Encryptor::new_from_slices(key, iv).map_err(|_| setup_failed(desc))?,
            ),
            (CipherFamily::BlockCbc, 256) => Self::Cbc256Enc(
                cbc::Encryptor::new_from_slices(key, iv).map_err(|_| setup_failed(desc))?,
            ),
            _ => return Self::init_ctr(desc, key, iv),
        };
        Ok(state)
    }

    pub(super) fn init_decrypt(desc: &CipherDesc, key: &[u8], iv: &[u8]) -> Result<Self> {
        let state = match (desc.family, desc.key_size_bits) {
            (CipherFamily::BlockCbc, 128) => Self::Cbc128Dec(
                cbc::Decryptor::new_from_slices(key, iv).map_err(|_| setup_failed(desc))?,
            ),
            (CipherFamily::BlockCbc, 192) => Self::Cbc192Dec(
                cbc::Decryptor::new_from_slices(key, iv).map_err(|_| setup_failed(desc))?,
            ),
            (CipherFamily::BlockCbc, 256) => Self::Cbc256Dec(
                cbc::Decryptor::new_from_slices(key, iv).map_err(|_| setup_failed(desc))?,
            ),
            _ => return Self::init_ctr(desc, key, iv),
        };
        Ok(state)
    }

    // counter mode is its own inverse, both directions share one setup path
    fn init_ctr(desc: &CipherDesc, key: &[u8], iv: &[u8]) -> Result<Self> {
        let state = match (desc.family, desc.key_size_bits) {
            (CipherFamily::BlockCtr, 128) => {
                Self::Ctr128(Ctr128BE::new_from_slices(key, iv).map_err(|_| setup_failed(desc))?)
            }
            (CipherFamily::BlockCtr, 192) => {
                Self::Ctr192(Ctr128BE::new_from_slices(key, iv).map_err(|_| setup_failed(desc))?)
            }
            (CipherFamily::BlockCtr, 256) => {
                Self::Ctr256(Ctr128BE::new_from_slices(key, iv).map_err(|_| setup_failed(desc))?)
            }
            _ => return Err(setup_failed(desc)),
        };
        Ok(state)
    }

    /// Transforms `data` in place. The caller has already verified block
    /// alignment; output length always equals input length.
    pub(super) fn apply(&mut self, data: &mut [u8]) -> Result<()> {
        match self {
            Self::Cbc128Enc(state) => cbc_encrypt_blocks(state, data),
            Self::Cbc192Enc(state) => cbc_encrypt_blocks(state, data),
            Self::Cbc256Enc(state) => cbc_encrypt_blocks(state, data),
            Self::Cbc128Dec(state) => cbc_decrypt_blocks(state, data),
            Self::Cbc192Dec(state) => cbc_decrypt_blocks(state, data),
            Self::Cbc256Dec(state) => cbc_decrypt_blocks(state, data),
            Self::Ctr128(state) => state.apply_keystream(data),
            Self::Ctr192(state) => state.apply_keystream(data),
            Self::Ctr256(state) => state.apply_keystream(data),
        }
        Ok(())
    }
}

fn cbc_encrypt_blocks<C>(state: &mut cbc::Encryptor<C>, data: &mut [u8])
where
    C: BlockEncryptMut + cipher::BlockCipher,
    cbc::Encryptor<C>: BlockEncryptMut,
{
    for chunk in data.chunks_exact_mut(cbc_block_len::<C>()) {
        state.encrypt_block_mut(GenericArray::from_mut_slice(chunk));
    }
}

fn cbc_decrypt_blocks<C>(state: &mut cbc::Decryptor<C>, data: &mut [u8])
where
    C: BlockDecryptMut + cipher::BlockCipher,
    cbc::Decryptor<C>: BlockDecryptMut,
{
    for chunk in data.chunks_exact_mut(cbc_block_len::<C>()) {
        state.decrypt_block_mut(GenericArray::from_mut_slice(chunk));
    }
}

fn cbc_block_len<C: cipher::BlockSizeUser>() -> usize {
    <C as cipher::BlockSizeUser>::block_size()
}
