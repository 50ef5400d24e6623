//! Minimal SSH wire codec: big endian `uint32`, single bytes and
//! length-prefixed byte strings, the field kinds the OpenSSH key container
//! is built from.

use crate::error::{Result, SealError};

/// Sequential reader over a borrowed byte slice.
///
/// Every truncated or inconsistent read maps to
/// [`SealError::MalformedContainer`]; callers parsing packets or containers
/// therefore fail closed without tracking offsets themselves.
pub(crate) struct WireReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub(crate) fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub(crate) fn read_exact(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.remaining() < len {
            log::trace!(
                "wire underrun: wanted {len} bytes, {} left",
                self.remaining()
            );
            return Err(SealError::MalformedContainer);
        }
        let out = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(out)
    }

    pub(crate) fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_exact(1)?[0])
    }

    pub(crate) fn read_u32(&mut self) -> Result<u32> {
        let bytes = self.read_exact(4)?;
        let mut word = [0u8; 4];
        word.copy_from_slice(bytes);
        Ok(u32::from_be_bytes(word))
    }

    /// Reads a length-prefixed byte string.
    pub(crate) fn read_string(&mut self) -> Result<&'a [u8]> {
        let len = self.read_u32()? as usize;
        self.read_exact(len)
    }

    /// Reads a length-prefixed string which must be valid UTF-8.
    pub(crate) fn read_utf8(&mut self) -> Result<&'a str> {
        let raw = self.read_string()?;
        std::str::from_utf8(raw).map_err(|_| SealError::MalformedContainer)
    }
}

/// Growable writer producing the same field kinds.
#[derive(Default)]
pub(crate) struct WireWriter {
    buf: Vec<u8>,
}

impl WireWriter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub(crate) fn write_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub(crate) fn write_raw(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub(crate) fn write_string(&mut self, bytes: &[u8]) {
        self.write_u32(bytes.len() as u32);
        self.write_raw(bytes);
    }

    pub(crate) fn len(&self) -> usize {
        self.buf.len()
    }

    pub(crate) fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}

#[cfg(test)]
mod test {
    use super::{WireReader, WireWriter};
    use crate::error::SealError;
    use crate::util::test::assert_bytes_eq;

    #[test]
    fn roundtrip_mixed_fields() {
        let mut w = WireWriter::new();
        w.write_u32(0xdead_beef);
        w.write_string(b"ssh-ed25519");
        w.write_u8(7);
        let encoded = w.into_inner();

        let mut r = WireReader::new(&encoded);
        assert_eq!(r.read_u32().unwrap(), 0xdead_beef);
        assert_bytes_eq(r.read_string().unwrap(), b"ssh-ed25519");
        assert_eq!(r.read_u8().unwrap(), 7);
        assert!(r.is_empty());
    }

    #[test]
    fn truncated_string_is_malformed() {
        // declared length 8, only 3 bytes present
        let data = [0, 0, 0, 8, b'a', b'b', b'c'];
        let mut r = WireReader::new(&data);
        assert_eq!(r.read_string(), Err(SealError::MalformedContainer));
    }

    #[test]
    fn non_utf8_name_is_malformed() {
        let mut w = WireWriter::new();
        w.write_string(&[0xff, 0xfe]);
        let encoded = w.into_inner();
        let mut r = WireReader::new(&encoded);
        assert_eq!(r.read_utf8(), Err(SealError::MalformedContainer));
    }
}
