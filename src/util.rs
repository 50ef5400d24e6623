#[cfg(test)]
use std::fmt::Write;

#[cfg(test)]
pub(crate) fn bin2string(bin: &[u8]) -> String {
    bin.iter().fold(String::new(), |mut output, x| {
        let _ = write!(output, "{x:02x} ");
        output
    })
}

/// Increments the 64 bit big endian invocation counter stored in the trailing
/// 8 bytes of a 12 byte AES-GCM nonce.
pub(crate) fn uint64_inc(nonce_tail: &mut [u8]) {
    debug_assert_eq!(nonce_tail.len(), 8);
    let mut word = [0u8; 8];
    word.copy_from_slice(nonce_tail);
    let ctr = u64::from_be_bytes(word).wrapping_add(1);
    nonce_tail.copy_from_slice(&ctr.to_be_bytes());
}
