//! Byte-counting stream wrappers for position tracking.
//!
//! Some destinations cannot report their own position: a socket, a pipe, or
//! any write-only sink an application hands in as the archive destination.
//! The zip format still needs the offset of every local header recorded in
//! the trailing central directory, so the writer wraps the destination in a
//! [`CountingStream`] and asks it for a [computed position] instead of
//! seeking.
//!
//! The classic scenario is a self-extracting archive: the application
//! writes a stub executable first, then the archive body. Wrapping the
//! destination before writing the stub makes the stub bytes part of the
//! count, so entry offsets come out right without the destination ever
//! supporting `Seek`.
//!
//! # Adjustment and nesting
//!
//! Archive writers sometimes rewrite an entry's local header after its data
//! has gone out, which means bytes already counted must be logically
//! discarded. [`CountingStream::adjust`] rolls the written count back.
//! Counting wrappers can be nested (an archive-level counter around a
//! region-level counter); wrappers built with [`CountingStream::stacked`]
//! share one adjustment ledger, so a single `adjust` call is observed by
//! every layer of the chain without any layer inspecting what it wraps.
//!
//! [computed position]: CountingStream::computed_position
//!
//! # Example
//!
//! ```rust
//! use std::io::{Cursor, Write};
//! use zipline::count::CountingStream;
//!
//! let mut out = CountingStream::new(Cursor::new(Vec::new()));
//! out.write_all(b"local header")?;
//! assert_eq!(out.bytes_written(), 12);
//! assert_eq!(out.computed_position(), 12);
//! # Ok::<(), std::io::Error>(())
//! ```

use std::io::{self, Read, Seek, SeekFrom, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Shared roll-back accumulator for a chain of counting wrappers.
///
/// Relaxed ordering is sufficient: the pipeline contract is single-threaded
/// and the atomic exists only so the ledger can be shared through `Arc`.
#[derive(Debug, Default)]
struct AdjustLedger {
    discarded: AtomicU64,
}

impl AdjustLedger {
    fn discarded(&self) -> u64 {
        self.discarded.load(Ordering::Relaxed)
    }

    fn discard(&self, delta: u64) {
        self.discarded.fetch_add(delta, Ordering::Relaxed);
    }
}

/// A decorator stream that counts the bytes passing through it.
///
/// Wraps any underlying stream and forwards every operation transparently
/// while keeping monotonic read/written counters. The wrapper never alters
/// bytes, only observes them.
///
/// The counters live for the lifetime of the instance and are never reset;
/// [`adjust`](Self::adjust) is the only way the logical written count can
/// decrease.
#[derive(Debug)]
pub struct CountingStream<S> {
    inner: S,
    raw_written: u64,
    bytes_read: u64,
    initial_offset: u64,
    ledger: Arc<AdjustLedger>,
    /// Ledger value when this wrapper was created; discards before that
    /// point belong to other layers and do not affect this one.
    discard_base: u64,
}

impl<S> CountingStream<S> {
    /// Wraps a stream whose current position is unknown or irrelevant.
    ///
    /// The initial offset is zero; use [`from_seekable`](Self::from_seekable)
    /// when the destination can report where it already is, or
    /// [`with_initial_offset`](Self::with_initial_offset) when the caller
    /// knows the length of what was written before wrapping.
    pub fn new(inner: S) -> Self {
        Self::with_initial_offset(inner, 0)
    }

    /// Wraps a stream with a caller-supplied initial offset.
    ///
    /// Useful when the destination cannot report a position but the caller
    /// knows how many bytes precede the wrapped region (e.g. the size of a
    /// self-extractor stub already sent to the sink).
    pub fn with_initial_offset(inner: S, initial_offset: u64) -> Self {
        Self {
            inner,
            raw_written: 0,
            bytes_read: 0,
            initial_offset,
            ledger: Arc::new(AdjustLedger::default()),
            discard_base: 0,
        }
    }

    /// The count of bytes written through this wrapper, after adjustments.
    ///
    /// # Panics
    ///
    /// Panics if an [`adjust`](Self::adjust) issued elsewhere in a stacked
    /// chain discarded more bytes than this layer ever wrote. That is a bug
    /// in the caller's offset bookkeeping, not an I/O condition.
    pub fn bytes_written(&self) -> u64 {
        let discarded = self.ledger.discarded() - self.discard_base;
        self.raw_written
            .checked_sub(discarded)
            .expect("byte counter driven negative by adjust")
    }

    /// The count of bytes read through this wrapper.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// The offset the wrapped stream was at when this wrapper was created.
    pub fn initial_offset(&self) -> u64 {
        self.initial_offset
    }

    /// The logical position of the output: initial offset plus bytes
    /// written.
    ///
    /// Once all wrapped bytes are flushed this equals the true position of
    /// the destination, whether or not the destination can report one.
    pub fn computed_position(&self) -> u64 {
        self.initial_offset + self.bytes_written()
    }

    /// Subtracts `delta` from the count of bytes written.
    ///
    /// Needed when content already counted is logically discarded, as when
    /// an entry's local header is rewritten in place after the entry data
    /// went out. Every wrapper sharing this ledger (see
    /// [`stacked`](Self::stacked)) observes the same adjustment.
    ///
    /// # Panics
    ///
    /// Panics if `delta` exceeds [`bytes_written`](Self::bytes_written).
    pub fn adjust(&mut self, delta: u64) {
        assert!(
            delta <= self.bytes_written(),
            "adjust({}) exceeds bytes_written ({})",
            delta,
            self.bytes_written(),
        );
        self.ledger.discard(delta);
    }

    /// Returns a reference to the wrapped stream.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Returns a mutable reference to the wrapped stream.
    ///
    /// Bytes moved through the returned reference bypass the counters.
    pub fn inner_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    /// Consumes the wrapper and returns the wrapped stream.
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: Seek> CountingStream<S> {
    /// Wraps a seekable stream, capturing its current position as the
    /// initial offset.
    ///
    /// A destination that fails the position query is treated as being at
    /// offset zero, matching the behavior for wholly unseekable sinks.
    pub fn from_seekable(mut inner: S) -> Self {
        let initial_offset = inner.stream_position().unwrap_or(0);
        Self::with_initial_offset(inner, initial_offset)
    }
}

impl<S> CountingStream<CountingStream<S>> {
    /// Wraps another counting stream, joining its adjustment ledger.
    ///
    /// The outer wrapper starts at the inner wrapper's computed position,
    /// and an [`adjust`](Self::adjust) on either layer rolls back both.
    pub fn stacked(inner: CountingStream<S>) -> Self {
        let initial_offset = inner.computed_position();
        let ledger = Arc::clone(&inner.ledger);
        let discard_base = ledger.discarded();
        Self {
            inner,
            raw_written: 0,
            bytes_read: 0,
            initial_offset,
            ledger,
            discard_base,
        }
    }
}

impl<S: Read> Read for CountingStream<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.bytes_read += n as u64;
        Ok(n)
    }
}

impl<S: Write> Write for CountingStream<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        // A zero-length write must not reach the underlying stream; some
        // sinks treat any write call as a side effect.
        if buf.is_empty() {
            return Ok(0);
        }
        let n = self.inner.write(buf)?;
        // Counted only after the forward succeeds so a failed write cannot
        // corrupt the counter.
        self.raw_written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<S: Seek> Seek for CountingStream<S> {
    /// Forwards the seek without touching the counters; callers that seek
    /// back and rewrite are responsible for [`adjust`](Self::adjust)ing.
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// A sink that fails the test if it ever sees a zero-length write.
    struct NoEmptyWrites(Vec<u8>);

    impl Write for NoEmptyWrites {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            assert!(!buf.is_empty(), "zero-length write reached the sink");
            self.0.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_counts_bytes() {
        let mut stream = CountingStream::new(Cursor::new(Vec::new()));
        stream.write_all(b"hello").unwrap();
        stream.write_all(b" world").unwrap();

        assert_eq!(stream.bytes_written(), 11);
        assert_eq!(stream.computed_position(), 11);
        assert_eq!(stream.into_inner().into_inner(), b"hello world");
    }

    #[test]
    fn test_zero_length_writes_forward_nothing() {
        let mut stream = CountingStream::new(NoEmptyWrites(Vec::new()));
        for _ in 0..16 {
            assert_eq!(stream.write(&[]).unwrap(), 0);
        }
        assert_eq!(stream.bytes_written(), 0);
        assert_eq!(stream.bytes_read(), 0);
    }

    #[test]
    fn test_read_counts_actual_bytes() {
        let mut stream = CountingStream::new(Cursor::new(b"abcdef".to_vec()));
        let mut buf = [0u8; 4];
        assert_eq!(stream.read(&mut buf).unwrap(), 4);
        // Short read: only two bytes remain
        assert_eq!(stream.read(&mut buf).unwrap(), 2);
        assert_eq!(stream.bytes_read(), 6);
        assert_eq!(stream.bytes_written(), 0);
    }

    #[test]
    fn test_initial_offset_scenario() {
        // Memory buffer standing in for a sink with 100 bytes already sent.
        let mut stream = CountingStream::with_initial_offset(Cursor::new(Vec::new()), 100);
        stream.write_all(&[0u8; 50]).unwrap();
        assert_eq!(stream.computed_position(), 150);
    }

    #[test]
    fn test_from_seekable_captures_position() {
        let mut cursor = Cursor::new(vec![0u8; 32]);
        cursor.seek(SeekFrom::Start(10)).unwrap();

        let mut stream = CountingStream::from_seekable(cursor);
        assert_eq!(stream.initial_offset(), 10);

        stream.write_all(b"abc").unwrap();
        assert_eq!(stream.computed_position(), 13);
    }

    #[test]
    fn test_adjust_rolls_back() {
        let mut stream = CountingStream::new(Cursor::new(Vec::new()));
        stream.write_all(&[0u8; 40]).unwrap();

        stream.adjust(15);
        assert_eq!(stream.bytes_written(), 25);
        assert_eq!(stream.computed_position(), 25);

        // Down to exactly zero is legal
        stream.adjust(25);
        assert_eq!(stream.bytes_written(), 0);
    }

    #[test]
    #[should_panic(expected = "exceeds bytes_written")]
    fn test_adjust_past_zero_panics() {
        let mut stream = CountingStream::new(Cursor::new(Vec::new()));
        stream.write_all(&[0u8; 10]).unwrap();
        stream.adjust(11);
    }

    #[test]
    fn test_stacked_shares_adjustments() {
        let inner = CountingStream::new(Cursor::new(Vec::new()));
        let mut outer = CountingStream::stacked(inner);

        outer.write_all(&[0u8; 30]).unwrap();
        assert_eq!(outer.bytes_written(), 30);
        assert_eq!(outer.inner().bytes_written(), 30);

        // One adjust call is observed at every layer of the chain.
        outer.adjust(12);
        assert_eq!(outer.bytes_written(), 18);
        assert_eq!(outer.inner().bytes_written(), 18);
        assert_eq!(outer.inner().computed_position(), 18);
    }

    #[test]
    fn test_stacked_starts_at_inner_position() {
        let mut inner = CountingStream::with_initial_offset(Cursor::new(Vec::new()), 7);
        inner.write_all(&[0u8; 3]).unwrap();

        let outer = CountingStream::stacked(inner);
        assert_eq!(outer.initial_offset(), 10);
        assert_eq!(outer.computed_position(), 10);
    }

    #[test]
    fn test_stacked_adjust_ignores_prior_discards() {
        let mut inner = CountingStream::new(Cursor::new(Vec::new()));
        inner.write_all(&[0u8; 20]).unwrap();
        inner.adjust(5);

        let mut outer = CountingStream::stacked(inner);
        assert_eq!(outer.bytes_written(), 0);

        outer.write_all(&[0u8; 8]).unwrap();
        outer.adjust(8);
        assert_eq!(outer.bytes_written(), 0);
        // The inner layer saw 20 direct bytes plus the 8 forwarded through
        // the outer layer, minus both adjustments.
        assert_eq!(outer.inner().bytes_written(), 20 + 8 - 5 - 8);
    }

    #[test]
    fn test_seek_does_not_touch_counters() {
        let mut stream = CountingStream::new(Cursor::new(vec![0u8; 64]));
        stream.write_all(&[1u8; 8]).unwrap();
        stream.seek(SeekFrom::Start(0)).unwrap();
        assert_eq!(stream.bytes_written(), 8);
    }
}
