//! Error types for the zip I/O pipeline.
//!
//! This module provides the [`Error`] enum covering the failure modes of the
//! stream and predicate primitives, along with a convenient [`Result<T>`]
//! type alias.
//!
//! # Error Categories
//!
//! | Category | Variants | Typical Cause |
//! |----------|----------|---------------|
//! | I/O | [`Io`][Error::Io] | Underlying stream operations |
//! | Secret | [`WrongPassword`][Error::WrongPassword] | Incorrect password for an encrypted entry |
//! | Metadata | [`MetadataUnavailable`][Error::MetadataUnavailable] | Filesystem cannot supply a timestamp |
//!
//! Two classes of fault from older zip libraries are deliberately absent:
//!
//! - **Direction misuse** (reading from an encrypting stream, writing to a
//!   decrypting one, seeking a cipher stream) cannot be expressed: the
//!   cipher wrappers are split into [`CipherReader`](crate::crypto::CipherReader)
//!   and [`CipherWriter`](crate::crypto::CipherWriter), which implement only
//!   the trait for their one direction.
//! - **Counter underflow** in [`CountingStream::adjust`](crate::count::CountingStream::adjust)
//!   is a bug in the caller's offset bookkeeping, not a recoverable
//!   condition, and panics.
//!
//! # Recovering from a Wrong Password
//!
//! [`Error::WrongPassword`] is the one recoverable condition in this crate:
//! callers can prompt for a different password and retry instead of
//! aborting the whole operation.
//!
//! ```rust,no_run
//! use zipline::Error;
//!
//! fn report(error: &Error) {
//!     match error {
//!         Error::WrongPassword { .. } => println!("Incorrect password. Please try again."),
//!         Error::Io(e) => println!("I/O error: {}", e),
//!         other => println!("Error: {}", other),
//!     }
//! }
//! ```

use std::io;
use std::path::PathBuf;

use crate::select::TimeAttribute;

/// The main error type for zip pipeline operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An I/O error from the underlying stream or the filesystem.
    ///
    /// Faults propagate unchanged from the wrapped terminal stream; no
    /// retry or suppression happens at this layer.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The password failed verification against an entry's encryption header.
    ///
    /// The traditional zip encryption header carries a check byte derived
    /// from the entry's CRC. A mismatch after decrypting the header almost
    /// always means the wrong password was supplied (one in 256 wrong
    /// passwords passes the check byte and only fails the full CRC later).
    ///
    /// This is a recoverable condition: callers may prompt for a different
    /// password and retry the entry.
    #[error("{}", WrongPasswordDisplay { entry_name: entry_name.as_deref() })]
    WrongPassword {
        /// Name of the entry the password was rejected for, if known.
        entry_name: Option<String>,
    },

    /// The filesystem could not supply the timestamp a selection criterion
    /// needs for a live file.
    ///
    /// Attribute resolution must be total: a predicate that cannot resolve
    /// its attribute faults rather than silently excluding or including
    /// the file. Typical cause is a platform without creation-time support.
    #[error("cannot read {attribute} for {}: {source}", path.display())]
    MetadataUnavailable {
        /// The timestamp attribute that could not be resolved.
        attribute: TimeAttribute,
        /// The file whose metadata was being queried.
        path: PathBuf,
        /// The underlying filesystem error.
        #[source]
        source: io::Error,
    },
}

/// Helper struct for formatting WrongPassword error messages.
struct WrongPasswordDisplay<'a> {
    entry_name: Option<&'a str>,
}

impl std::fmt::Display for WrongPasswordDisplay<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Wrong password")?;
        if let Some(name) = self.entry_name {
            write!(f, " for entry '{}'", name)?;
        }
        Ok(())
    }
}

/// A convenient Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
