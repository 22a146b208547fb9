//! Entry selection predicates.
//!
//! Archive operations rarely apply to every entry: "add files modified
//! since last week", "extract everything created before the cutoff". This
//! module provides a boolean expression tree over timestamp metadata that
//! decides which entries or files participate in an operation.
//!
//! A [`SelectionCriterion`] is either a [`TimeCriterion`] leaf comparing
//! one timestamp attribute against a reference instant, or an `And`/`Or`/
//! `Not` combinator over child criteria. Evaluation is a pure structural
//! recursion over an immutable tree; the same tree can be evaluated
//! against a live filesystem path (OS metadata, normalized to UTC) or an
//! archive entry's stored metadata (already UTC in this crate's
//! [`Timestamp`] representation), and both resolutions compare
//! like-for-like.
//!
//! # Example
//!
//! ```rust
//! use zipline::select::{ComparisonOperator, EntryMetadata, SelectionCriterion, TimeAttribute, TimeCriterion};
//! use zipline::Timestamp;
//!
//! let cutoff = Timestamp::from_unix_secs(1_700_000_000).unwrap();
//! let recent = SelectionCriterion::time(TimeCriterion::new(
//!     TimeAttribute::Modified,
//!     ComparisonOperator::Ge,
//!     cutoff,
//! ));
//!
//! assert_eq!(recent.to_string(), "mtime >= 2023-11-14-22:13:20");
//!
//! let entry = EntryMetadata {
//!     accessed: cutoff,
//!     modified: Timestamp::from_unix_secs(1_700_000_001).unwrap(),
//!     created: cutoff,
//! };
//! assert!(recent.evaluate_entry(&entry));
//! ```

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use crate::error::{Error, Result};
use crate::timestamp::Timestamp;

/// Which stored timestamp a criterion examines.
///
/// `Display` uses the traditional zip-tool spellings (`atime`, `mtime`,
/// `ctime`), which is also how criteria render in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeAttribute {
    /// Last access time (`atime`).
    Accessed,
    /// Last modification time (`mtime`).
    Modified,
    /// Creation time (`ctime`).
    Created,
}

impl fmt::Display for TimeAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Accessed => f.write_str("atime"),
            Self::Modified => f.write_str("mtime"),
            Self::Created => f.write_str("ctime"),
        }
    }
}

/// Comparison operator of a time criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOperator {
    /// Strictly before the reference time.
    Lt,
    /// At or before the reference time.
    Le,
    /// Exactly the reference time.
    Eq,
    /// Any time other than the reference time.
    Ne,
    /// At or after the reference time.
    Ge,
    /// Strictly after the reference time.
    Gt,
}

impl ComparisonOperator {
    /// Applies the operator to an ordered pair.
    fn compare<T: Ord>(&self, lhs: T, rhs: T) -> bool {
        match self {
            Self::Lt => lhs < rhs,
            Self::Le => lhs <= rhs,
            Self::Eq => lhs == rhs,
            Self::Ne => lhs != rhs,
            Self::Ge => lhs >= rhs,
            Self::Gt => lhs > rhs,
        }
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lt => f.write_str("<"),
            Self::Le => f.write_str("<="),
            Self::Eq => f.write_str("="),
            Self::Ne => f.write_str("!="),
            Self::Ge => f.write_str(">="),
            Self::Gt => f.write_str(">"),
        }
    }
}

/// Stored timestamp metadata of an archive entry.
///
/// The seam between the selection engine and the archive format layer:
/// whatever parses the container implements this for its entry type. All
/// three values are UTC [`Timestamp`]s, so entry evaluation is total and
/// compares in the same reference frame as filesystem evaluation.
pub trait EntryTimestamps {
    /// The entry's stored last access time.
    fn accessed(&self) -> Timestamp;
    /// The entry's stored last modification time.
    fn modified(&self) -> Timestamp;
    /// The entry's stored creation time.
    fn created(&self) -> Timestamp;
}

/// A plain bundle of entry timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryMetadata {
    /// Last access time.
    pub accessed: Timestamp,
    /// Last modification time.
    pub modified: Timestamp,
    /// Creation time.
    pub created: Timestamp,
}

impl EntryTimestamps for EntryMetadata {
    fn accessed(&self) -> Timestamp {
        self.accessed
    }

    fn modified(&self) -> Timestamp {
        self.modified
    }

    fn created(&self) -> Timestamp {
        self.created
    }
}

/// A leaf criterion: one timestamp attribute compared against a reference
/// instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeCriterion {
    /// Which timestamp to examine.
    pub attribute: TimeAttribute,
    /// How to compare it.
    pub operator: ComparisonOperator,
    /// The reference instant (UTC).
    pub reference: Timestamp,
}

impl TimeCriterion {
    /// Creates a time criterion.
    pub fn new(attribute: TimeAttribute, operator: ComparisonOperator, reference: Timestamp) -> Self {
        Self {
            attribute,
            operator,
            reference,
        }
    }

    /// Evaluates the criterion against a live file's OS metadata.
    ///
    /// The attribute is resolved through [`fs::metadata`] and normalized to
    /// UTC. Resolution must be total: a platform that cannot supply the
    /// requested timestamp faults with
    /// [`Error::MetadataUnavailable`] instead of silently excluding the
    /// file.
    pub fn evaluate_path(&self, path: &Path) -> Result<bool> {
        let metadata = fs::metadata(path)?;
        let system_time = match self.attribute {
            TimeAttribute::Accessed => metadata.accessed(),
            TimeAttribute::Modified => metadata.modified(),
            TimeAttribute::Created => metadata.created(),
        }
        .map_err(|source| self.unavailable(path, source))?;

        let resolved = Timestamp::from_system_time(system_time).ok_or_else(|| {
            self.unavailable(
                path,
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    "timestamp outside the representable range",
                ),
            )
        })?;
        Ok(self.matches(resolved))
    }

    /// Evaluates the criterion against an archive entry's stored metadata.
    pub fn evaluate_entry<E: EntryTimestamps + ?Sized>(&self, entry: &E) -> bool {
        let resolved = match self.attribute {
            TimeAttribute::Accessed => entry.accessed(),
            TimeAttribute::Modified => entry.modified(),
            TimeAttribute::Created => entry.created(),
        };
        self.matches(resolved)
    }

    /// Applies the operator to an already-resolved timestamp.
    pub fn matches(&self, resolved: Timestamp) -> bool {
        self.operator.compare(resolved, self.reference)
    }

    fn unavailable(&self, path: &Path, source: io::Error) -> Error {
        log::warn!(
            "cannot resolve {} for {}: {}",
            self.attribute,
            path.display(),
            source
        );
        Error::MetadataUnavailable {
            attribute: self.attribute,
            path: path.to_path_buf(),
            source,
        }
    }
}

impl fmt::Display for TimeCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.attribute,
            self.operator,
            self.reference.format_sortable()
        )
    }
}

/// A node in the selection expression tree.
///
/// Leaves are [`TimeCriterion`]s; combinators compose child criteria with
/// boolean logic. The tree is immutable once built and evaluated by
/// structural recursion with no shared state. `And` of no children is
/// true, `Or` of no children is false (the boolean neutral elements).
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionCriterion {
    /// A timestamp comparison leaf.
    Time(TimeCriterion),
    /// True when every child is true.
    And(Vec<SelectionCriterion>),
    /// True when any child is true.
    Or(Vec<SelectionCriterion>),
    /// Inverts its child.
    Not(Box<SelectionCriterion>),
}

impl SelectionCriterion {
    /// Wraps a time criterion as a leaf node.
    pub fn time(criterion: TimeCriterion) -> Self {
        Self::Time(criterion)
    }

    /// Conjunction of `self` and `other`.
    pub fn and(self, other: SelectionCriterion) -> Self {
        match self {
            Self::And(mut children) => {
                children.push(other);
                Self::And(children)
            }
            first => Self::And(vec![first, other]),
        }
    }

    /// Disjunction of `self` and `other`.
    pub fn or(self, other: SelectionCriterion) -> Self {
        match self {
            Self::Or(mut children) => {
                children.push(other);
                Self::Or(children)
            }
            first => Self::Or(vec![first, other]),
        }
    }

    /// Negation of `self`.
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// Evaluates the tree against a live file's OS metadata.
    ///
    /// Metadata resolution faults propagate out of the recursion unchanged;
    /// a malformed or unresolvable criterion never silently decides.
    pub fn evaluate_path(&self, path: &Path) -> Result<bool> {
        match self {
            Self::Time(criterion) => criterion.evaluate_path(path),
            Self::And(children) => {
                for child in children {
                    if !child.evaluate_path(path)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Self::Or(children) => {
                for child in children {
                    if child.evaluate_path(path)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Self::Not(child) => Ok(!child.evaluate_path(path)?),
        }
    }

    /// Evaluates the tree against an archive entry's stored metadata.
    pub fn evaluate_entry<E: EntryTimestamps + ?Sized>(&self, entry: &E) -> bool {
        match self {
            Self::Time(criterion) => criterion.evaluate_entry(entry),
            Self::And(children) => children.iter().all(|c| c.evaluate_entry(entry)),
            Self::Or(children) => children.iter().any(|c| c.evaluate_entry(entry)),
            Self::Not(child) => !child.evaluate_entry(entry),
        }
    }
}

impl From<TimeCriterion> for SelectionCriterion {
    fn from(criterion: TimeCriterion) -> Self {
        Self::Time(criterion)
    }
}

impl fmt::Display for SelectionCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(
            f: &mut fmt::Formatter<'_>,
            children: &[SelectionCriterion],
            connective: &str,
            empty: &str,
        ) -> fmt::Result {
            if children.is_empty() {
                return f.write_str(empty);
            }
            f.write_str("(")?;
            for (i, child) in children.iter().enumerate() {
                if i > 0 {
                    write!(f, " {} ", connective)?;
                }
                write!(f, "{}", child)?;
            }
            f.write_str(")")
        }

        match self {
            Self::Time(criterion) => write!(f, "{}", criterion),
            Self::And(children) => join(f, children, "AND", "TRUE"),
            Self::Or(children) => join(f, children, "OR", "FALSE"),
            Self::Not(child) => write!(f, "NOT ({})", child),
        }
    }
}
