//! Traditional PKZIP (ZipCrypto) encryption support.
//!
//! This module implements the stream cipher described in the PKWARE
//! APPNOTE: a 96-bit key schedule (three 32-bit keys) derived from the
//! password, advanced one byte at a time through CRC-32 and a linear
//! congruential step. The cipher is symmetric and keystream-based, so it
//! transforms arbitrary-length byte ranges without padding and without
//! needing the whole plaintext in memory.
//!
//! ZipCrypto is historically weak and provided for interoperability with
//! the vast body of existing archives, not for protecting secrets against
//! a determined attacker.
//!
//! # Pipeline placement
//!
//! Encryption sits *underneath* compression: the archive writer compresses
//! entry bytes, then pushes the compressed stream through a
//! [`CipherWriter`]; the reader pulls through a [`CipherReader`] before
//! decompressing. Each wrapper works in exactly one direction, so a
//! decrypting stream cannot be written to, by construction.
//!
//! # Example
//!
//! ```rust
//! use zipline::crypto::{Password, StreamCipher, ZipCrypto};
//!
//! let password = Password::new("secret");
//! let mut enc = ZipCrypto::from_password(&password);
//! let mut dec = ZipCrypto::from_password(&password);
//!
//! let ciphertext = enc.encrypt_block(b"attack at dawn");
//! assert_eq!(dec.decrypt_block(&ciphertext), b"attack at dawn");
//! ```

mod password;
mod stream;

use crc32fast::Hasher;

use crate::{Error, Result};

pub use password::Password;
pub use stream::{CipherReader, CipherWriter};

/// Length of the encryption header preceding each encrypted entry.
pub const ENCRYPTION_HEADER_LEN: usize = 12;

/// Initial values of the three key registers, per the PKWARE APPNOTE.
const KEY0_INIT: u32 = 0x12345678;
const KEY1_INIT: u32 = 0x23456789;
const KEY2_INIT: u32 = 0x34567890;

/// Multiplier of the key-1 linear congruential step.
const KEY1_MULTIPLIER: u32 = 134_775_813;

/// One raw CRC-32 register step, as the key schedule requires.
///
/// `crc32fast` conditions the register (complement in, complement out) on
/// every call, while the cipher needs the bare table step, so both sides
/// are complemented to cancel the conditioning.
fn crc32_step(crc: u32, byte: u8) -> u32 {
    let mut hasher = Hasher::new_with_initial(!crc);
    hasher.update(&[byte]);
    !hasher.finalize()
}

/// A streaming symmetric cipher operating on arbitrary-length byte ranges.
///
/// Both operations advance the keystream by exactly the input length, so a
/// message split across calls in any chunking produces the same bytes as
/// one call over the whole message. Encrypting with one instance and
/// decrypting with another built from the same secret reproduces the
/// original bytes exactly.
pub trait StreamCipher {
    /// Encrypts `plaintext`, returning the ciphertext.
    fn encrypt_block(&mut self, plaintext: &[u8]) -> Vec<u8>;

    /// Decrypts `ciphertext`, returning the plaintext.
    fn decrypt_block(&mut self, ciphertext: &[u8]) -> Vec<u8>;
}

/// The traditional PKZIP cipher state.
///
/// Holds the three key registers, initialized from a password and mutated
/// byte-by-byte as data flows through. One instance drifts out of sync if
/// used for both directions of the same session; construct one per
/// direction.
#[derive(Clone)]
pub struct ZipCrypto {
    keys: [u32; 3],
}

impl std::fmt::Debug for ZipCrypto {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Key registers are secret material
        f.debug_struct("ZipCrypto").finish_non_exhaustive()
    }
}

impl ZipCrypto {
    /// Derives the key schedule from a password.
    pub fn from_password(password: &Password) -> Self {
        let mut cipher = Self {
            keys: [KEY0_INIT, KEY1_INIT, KEY2_INIT],
        };
        for &byte in password.as_bytes() {
            cipher.update_keys(byte);
        }
        cipher
    }

    fn update_keys(&mut self, byte: u8) {
        self.keys[0] = crc32_step(self.keys[0], byte);
        self.keys[1] = self.keys[1]
            .wrapping_add(self.keys[0] & 0xFF)
            .wrapping_mul(KEY1_MULTIPLIER)
            .wrapping_add(1);
        self.keys[2] = crc32_step(self.keys[2], (self.keys[1] >> 24) as u8);
    }

    /// The next keystream byte, derived from key 2.
    fn keystream_byte(&self) -> u8 {
        let t = (self.keys[2] | 2) & 0xFFFF;
        (t.wrapping_mul(t ^ 1) >> 8) as u8
    }

    fn encrypt_byte(&mut self, plain: u8) -> u8 {
        let cipher = plain ^ self.keystream_byte();
        // The schedule always advances on the plaintext byte.
        self.update_keys(plain);
        cipher
    }

    fn decrypt_byte(&mut self, cipher: u8) -> u8 {
        let plain = cipher ^ self.keystream_byte();
        self.update_keys(plain);
        plain
    }

    /// Produces the 12-byte encryption header for an entry.
    ///
    /// The header is eleven filler bytes plus `check_byte` (the high byte
    /// of the entry's CRC-32), encrypted through this cipher. The filler
    /// comes from weak entropy (system time and thread id); supply bytes
    /// from a CSPRNG via [`encrypt_header_with`](Self::encrypt_header_with)
    /// where unpredictability matters. ZipCrypto itself offers no real
    /// protection either way.
    pub fn encrypt_header(&mut self, check_byte: u8) -> [u8; ENCRYPTION_HEADER_LEN] {
        let mut filler = [0u8; ENCRYPTION_HEADER_LEN - 1];
        weak_entropy(&mut filler);
        self.encrypt_header_with(filler, check_byte)
    }

    /// Produces the 12-byte encryption header from caller-supplied filler.
    pub fn encrypt_header_with(
        &mut self,
        filler: [u8; ENCRYPTION_HEADER_LEN - 1],
        check_byte: u8,
    ) -> [u8; ENCRYPTION_HEADER_LEN] {
        let mut header = [0u8; ENCRYPTION_HEADER_LEN];
        for (out, &byte) in header.iter_mut().zip(filler.iter()) {
            *out = self.encrypt_byte(byte);
        }
        header[ENCRYPTION_HEADER_LEN - 1] = self.encrypt_byte(check_byte);
        header
    }

    /// Decrypts an entry's 12-byte encryption header and verifies the
    /// password against the expected check byte.
    ///
    /// On success the cipher state is positioned to decrypt the entry data
    /// that follows the header. On mismatch the password is wrong (or, one
    /// time in 256, right but unlucky; the entry CRC catches that case) and
    /// [`Error::WrongPassword`] is returned.
    pub fn decrypt_header(
        &mut self,
        header: &[u8; ENCRYPTION_HEADER_LEN],
        check_byte: u8,
        entry_name: Option<&str>,
    ) -> Result<()> {
        let mut last = 0u8;
        for &byte in header {
            last = self.decrypt_byte(byte);
        }
        if last != check_byte {
            log::debug!(
                "encryption header check byte mismatch: expected {:#04x}, got {:#04x}",
                check_byte,
                last
            );
            return Err(Error::WrongPassword {
                entry_name: entry_name.map(str::to_owned),
            });
        }
        Ok(())
    }
}

impl StreamCipher for ZipCrypto {
    fn encrypt_block(&mut self, plaintext: &[u8]) -> Vec<u8> {
        plaintext.iter().map(|&b| self.encrypt_byte(b)).collect()
    }

    fn decrypt_block(&mut self, ciphertext: &[u8]) -> Vec<u8> {
        ciphertext.iter().map(|&b| self.decrypt_byte(b)).collect()
    }
}

/// Fills `buf` from weak entropy sources (system time and thread id).
///
/// Not a CSPRNG. The header filler only needs to differ between entries;
/// callers wanting real unpredictability pass CSPRNG bytes explicitly.
fn weak_entropy(buf: &mut [u8]) {
    use std::hash::{Hash, Hasher as _};
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);

    let thread_hash = {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        std::thread::current().id().hash(&mut hasher);
        hasher.finish()
    };

    for (i, byte) in buf.iter_mut().enumerate() {
        let time_byte = (now >> ((i % 16) * 8)) as u8;
        let thread_byte = (thread_hash >> ((i % 8) * 8)) as u8;
        *byte = time_byte ^ thread_byte ^ (i as u8).wrapping_mul(0x9D);
    }
}
