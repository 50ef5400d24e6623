/// Represents either success(T) or a failure ([`SealError`])
pub type Result<T> = std::result::Result<T, SealError>;

/// Represents an error which has occured in the sshseal library
#[derive(PartialEq, Eq, Debug, thiserror::Error)]
pub enum SealError {
    /// the cipher is not present in the registry of this build
    #[error("cipher '{0}' is not supported")]
    UnsupportedCipher(String),

    /// the key container names a key derivation function other than bcrypt
    #[error("key derivation function '{0}' is not supported")]
    UnsupportedKdf(String),

    /// the key container is structurally invalid or the passphrase was wrong;
    /// the two cases are intentionally not distinguished
    #[error("invalid key container or wrong passphrase")]
    MalformedContainer,

    /// AEAD or Poly1305 tag verification failed for a packet
    #[error("packet authentication failed")]
    AuthenticationFailure,

    /// derived key and IV material would not fit the staging buffer
    #[error("derived key material exceeds the staging buffer")]
    KeyMaterialTooLarge,

    /// an encrypted container was opened without a passphrase or callback
    #[error("a passphrase is required to decrypt this key")]
    PassphraseRequired,

    /// buffer was too small or not aligned for the requested operation
    #[error("buffer with size {0} is too small or misaligned")]
    InvalidBuffer(usize),

    /// the crypto backend rejected a key, IV or operation
    #[error("crypto backend failure: {0}")]
    BackendFailure(String),
}
