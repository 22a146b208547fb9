//! Property-based tests using proptest.
//!
//! These tests verify invariants of the streaming pipeline using randomly
//! generated inputs: cipher round-trips under arbitrary chunking, counting
//! arithmetic, and timestamp conversions.

use proptest::prelude::*;
use std::io::{Cursor, Read, Write};

use zipline::Timestamp;
use zipline::count::CountingStream;
use zipline::crypto::{CipherReader, CipherWriter, Password, StreamCipher, ZipCrypto};

fn cipher(password: &str) -> ZipCrypto {
    ZipCrypto::from_password(&Password::new(password))
}

/// Splits `data` into chunks whose sizes follow `cuts`.
fn chunked<'a>(data: &'a [u8], cuts: &[usize]) -> Vec<&'a [u8]> {
    let mut out = Vec::new();
    let mut rest = data;
    for &cut in cuts.iter().cycle() {
        if rest.is_empty() {
            break;
        }
        let take = (cut % 32 + 1).min(rest.len());
        let (head, tail) = rest.split_at(take);
        out.push(head);
        rest = tail;
    }
    out
}

proptest! {
    /// Encrypting then decrypting with the same password restores the
    /// original bytes, for any data and any password.
    #[test]
    fn cipher_roundtrip(data in proptest::collection::vec(any::<u8>(), 0..2048),
                        password in "[ -~]{0,40}") {
        let mut enc = cipher(&password);
        let mut dec = cipher(&password);
        let ciphertext = enc.encrypt_block(&data);
        prop_assert_eq!(dec.decrypt_block(&ciphertext), data);
    }

    /// Chunk boundaries are invisible: any split of the input produces the
    /// same ciphertext as a single call.
    #[test]
    fn cipher_chunking_invariant(data in proptest::collection::vec(any::<u8>(), 1..1024),
                                 cuts in proptest::collection::vec(1usize..64, 1..16)) {
        let mut whole = cipher("pw");
        let expected = whole.encrypt_block(&data);

        let mut split = cipher("pw");
        let mut actual = Vec::new();
        for chunk in chunked(&data, &cuts) {
            actual.extend_from_slice(&split.encrypt_block(chunk));
        }
        prop_assert_eq!(actual, expected);
    }

    /// The stream wrappers agree with the raw cipher for any chunking on
    /// both the write and the read side.
    #[test]
    fn stream_wrappers_roundtrip(data in proptest::collection::vec(any::<u8>(), 0..1024),
                                 cuts in proptest::collection::vec(1usize..64, 1..8)) {
        let mut writer = CipherWriter::new(Cursor::new(Vec::new()), cipher("pw"));
        for chunk in chunked(&data, &cuts) {
            writer.write_all(chunk).unwrap();
        }
        let encrypted = writer.finish().unwrap().into_inner();
        prop_assert_eq!(encrypted.len(), data.len());

        let mut reader = CipherReader::new(Cursor::new(encrypted), cipher("pw"));
        let mut decrypted = Vec::new();
        reader.read_to_end(&mut decrypted).unwrap();
        prop_assert_eq!(decrypted, data);
    }

    /// Bytes written is exactly the sum of all writes, independent of how
    /// the input is chunked, and the computed position starts from the
    /// initial offset.
    #[test]
    fn counting_is_additive(data in proptest::collection::vec(any::<u8>(), 0..1024),
                            cuts in proptest::collection::vec(1usize..64, 1..8),
                            offset in 0u64..1_000_000) {
        let mut counted = CountingStream::with_initial_offset(Cursor::new(Vec::new()), offset);
        for chunk in chunked(&data, &cuts) {
            counted.write_all(chunk).unwrap();
        }
        prop_assert_eq!(counted.bytes_written(), data.len() as u64);
        prop_assert_eq!(counted.computed_position(), offset + data.len() as u64);
    }

    /// Adjusting by any amount up to the written total moves the computed
    /// position back by exactly that amount.
    #[test]
    fn adjust_moves_position_back(len in 1usize..512, fraction in 0.0f64..=1.0) {
        let data = vec![0xA5u8; len];
        let mut counted = CountingStream::new(Cursor::new(Vec::new()));
        counted.write_all(&data).unwrap();

        let delta = (len as f64 * fraction) as u64;
        counted.adjust(delta);
        prop_assert_eq!(counted.computed_position(), len as u64 - delta);
    }

    /// Unix and FILETIME representations agree for any second count in the
    /// representable range.
    #[test]
    fn timestamp_unix_roundtrip(secs in 0i64..253_402_300_799) {
        let ts = Timestamp::from_unix_secs(secs).unwrap();
        prop_assert_eq!(ts.as_unix_secs(), secs);
    }

    /// DOS date/time packing survives a round-trip for any instant in the
    /// DOS-representable range, up to the format's two-second resolution.
    #[test]
    fn timestamp_dos_roundtrip(secs in 315_532_800i64..4_354_819_199) {
        let even = secs - secs % 2;
        let ts = Timestamp::from_unix_secs(even).unwrap();
        let (date, time) = ts.to_dos_date_time().unwrap();
        let back = Timestamp::from_dos_date_time(date, time).unwrap();
        prop_assert_eq!(back.as_unix_secs(), even);
    }
}
