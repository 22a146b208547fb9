//! Unidirectional cipher stream wrappers.
//!
//! [`CipherReader`] decrypts on read; [`CipherWriter`] encrypts on write.
//! Splitting the two directions into distinct types (instead of one stream
//! with a mode flag) makes cross-use unrepresentable: a single cipher state
//! driven from both directions would desynchronize its keystream and
//! silently corrupt data, and neither type offers the method that would let
//! that happen. Neither type implements `Seek`; a streaming cipher has no
//! meaningful random access.
//!
//! Both wrappers apply the transform synchronously per call with no
//! internal queue, so `flush` has nothing local to do beyond forwarding.

use std::io::{self, Read, Write};

use super::{ENCRYPTION_HEADER_LEN, StreamCipher, ZipCrypto};

/// A reader that decrypts bytes pulled from the underlying stream.
#[derive(Debug)]
pub struct CipherReader<R, C> {
    inner: R,
    cipher: C,
    scratch: Vec<u8>,
}

impl<R: Read, C: StreamCipher> CipherReader<R, C> {
    /// Wraps a stream of ciphertext with a pre-initialized cipher.
    pub fn new(inner: R, cipher: C) -> Self {
        Self {
            inner,
            cipher,
            scratch: Vec::new(),
        }
    }

    /// Returns a reference to the underlying stream.
    pub fn inner(&self) -> &R {
        &self.inner
    }

    /// Consumes the wrapper and returns the underlying stream.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> CipherReader<R, ZipCrypto> {
    /// Reads and verifies the 12-byte encryption header that precedes an
    /// encrypted entry's data.
    ///
    /// Must be called before the first [`read`](Read::read); on success the
    /// cipher is positioned at the entry data. A check-byte mismatch is
    /// reported as the recoverable [`WrongPassword`](crate::Error::WrongPassword)
    /// condition so callers can prompt for another password.
    pub fn read_encryption_header(
        &mut self,
        check_byte: u8,
        entry_name: Option<&str>,
    ) -> crate::Result<()> {
        let mut header = [0u8; ENCRYPTION_HEADER_LEN];
        self.inner.read_exact(&mut header)?;
        self.cipher.decrypt_header(&header, check_byte, entry_name)
    }
}

impl<R: Read, C: StreamCipher> Read for CipherReader<R, C> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        self.scratch.resize(buf.len(), 0);
        let n = self.inner.read(&mut self.scratch)?;

        // A short read decrypts only the valid prefix; decrypting the rest
        // of the scratch space would advance the keystream past the data.
        let decrypted = self.cipher.decrypt_block(&self.scratch[..n]);
        buf[..n].copy_from_slice(&decrypted);
        Ok(n)
    }
}

/// A writer that encrypts bytes before forwarding them to the underlying
/// stream.
#[derive(Debug)]
pub struct CipherWriter<W, C> {
    inner: W,
    cipher: C,
}

impl<W: Write, C: StreamCipher> CipherWriter<W, C> {
    /// Wraps a destination stream with a pre-initialized cipher.
    pub fn new(inner: W, cipher: C) -> Self {
        Self { inner, cipher }
    }

    /// Returns a reference to the underlying stream.
    pub fn inner(&self) -> &W {
        &self.inner
    }

    /// Flushes and returns the underlying stream.
    pub fn finish(mut self) -> io::Result<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

impl<W: Write> CipherWriter<W, ZipCrypto> {
    /// Writes the 12-byte encryption header for an entry.
    ///
    /// Must be called before the first [`write`](Write::write);
    /// `check_byte` is the high byte of the entry's CRC-32.
    pub fn write_encryption_header(&mut self, check_byte: u8) -> io::Result<()> {
        let header = self.cipher.encrypt_header(check_byte);
        self.inner.write_all(&header)
    }
}

impl<W: Write, C: StreamCipher> Write for CipherWriter<W, C> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        // The keystream has already advanced over the whole input, so the
        // ciphertext must be forwarded in full; a partial forward would
        // desync the stream.
        let ciphertext = self.cipher.encrypt_block(buf);
        self.inner.write_all(&ciphertext)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
