//! # zipline
//!
//! Streaming I/O pipeline primitives for the zip archive format.
//!
//! This crate provides the three mechanisms a zip reader/writer is built
//! on, independent of container-format parsing:
//!
//! - **Position tracking** ([`count`]): a [`CountingStream`] wrapper that
//!   counts bytes through any stream and reports a computed position, so
//!   central-directory offsets stay correct even when the destination
//!   cannot report its own position.
//! - **Transparent encryption** ([`crypto`]): the traditional PKZIP
//!   stream cipher behind a [`StreamCipher`](crypto::StreamCipher)
//!   capability trait, applied by unidirectional
//!   [`CipherReader`](crypto::CipherReader) /
//!   [`CipherWriter`](crypto::CipherWriter) wrappers layered underneath
//!   compression.
//! - **Entry selection** ([`select`]): a boolean expression tree over
//!   timestamp metadata, evaluated against live files or stored archive
//!   entries, deciding which entries participate in an operation.
//!
//! ## Composing a pipeline
//!
//! The caller wraps the terminal stream in a [`CountingStream`],
//! optionally layers a cipher wrapper on top, and hands the composed
//! stream to the archive logic, which also consults a selection predicate
//! per entry:
//!
//! ```rust
//! use std::io::{Cursor, Write};
//! use zipline::count::CountingStream;
//! use zipline::crypto::{CipherWriter, Password, ZipCrypto};
//!
//! fn main() -> zipline::Result<()> {
//!     let destination = Cursor::new(Vec::new());
//!     let counted = CountingStream::new(destination);
//!
//!     let cipher = ZipCrypto::from_password(&Password::new("secret"));
//!     let mut output = CipherWriter::new(counted, cipher);
//!
//!     output.write_encryption_header(0x9B)?;
//!     output.write_all(b"compressed entry bytes")?;
//!
//!     let counted = output.finish()?;
//!     // 12-byte encryption header + 22 payload bytes
//!     assert_eq!(counted.computed_position(), 34);
//!     Ok(())
//! }
//! ```
//!
//! ## Selecting entries
//!
//! ```rust
//! use zipline::select::{ComparisonOperator, SelectionCriterion, TimeAttribute, TimeCriterion};
//! use zipline::Timestamp;
//!
//! let cutoff = Timestamp::from_unix_secs(1_700_000_000).unwrap();
//! let predicate = SelectionCriterion::time(TimeCriterion::new(
//!     TimeAttribute::Modified,
//!     ComparisonOperator::Ge,
//!     cutoff,
//! ));
//! assert_eq!(predicate.to_string(), "mtime >= 2023-11-14-22:13:20");
//! ```
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T>`], an alias for
//! `std::result::Result<T, Error>`. The one recoverable condition is
//! [`Error::WrongPassword`]; see the [`error`] module for the full
//! taxonomy and for which faults are deliberately unrepresentable.
//!
//! ## Concurrency
//!
//! The pipeline is single-threaded and synchronous: every call blocks
//! exactly as long as the wrapped terminal stream does, and no component
//! buffers beyond the scratch space a cipher transform needs. The caller
//! owns the terminal stream's lifecycle.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod count;
pub mod crypto;
pub mod error;
pub mod select;
pub mod timestamp;

pub use count::CountingStream;
pub use error::{Error, Result};
pub use timestamp::Timestamp;

pub use crypto::Password;

// Re-export the selection API at the crate root for convenience
pub use select::{EntryMetadata, EntryTimestamps, SelectionCriterion, TimeCriterion};
