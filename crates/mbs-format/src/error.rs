use core::fmt;

use crate::fourcc::FourCC;

/// The tags that were legal at a grammar position, used in [`DecodeErrorKind::UnexpectedTag`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagList(pub Vec<FourCC>);

impl fmt::Display for TagList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, tag) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{tag}")?;
        }
        Ok(())
    }
}

/// Chain of record tags enclosing the point of failure, outermost first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagPath(pub Vec<FourCC>);

impl fmt::Display for TagPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<top level>");
        }
        for (idx, tag) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str("/")?;
            }
            write!(f, "{tag}")?;
        }
        Ok(())
    }
}

/// What went wrong while decoding.
///
/// Every kind is fatal: the decoder validates a reverse-engineered grammar and
/// never recovers from a mismatch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeErrorKind {
    #[error("truncated input: need {needed} bytes, but only {available} remain")]
    TruncatedInput { needed: usize, available: usize },

    #[error("{tag} declares {length} payload bytes, but only {available} remain after its header")]
    TruncatedPayload {
        tag: FourCC,
        length: u32,
        available: usize,
    },

    #[error("unexpected tag {found}, expected one of [{expected}]")]
    UnexpectedTag { found: FourCC, expected: TagList },

    #[error("{tag} payload length {length} is not a multiple of 4")]
    MisalignedLength { tag: FourCC, length: u32 },

    #[error("{what}: declared {declared}, but decoded {found}")]
    CountMismatch {
        what: &'static str,
        declared: u32,
        found: usize,
    },

    #[error("{field}: expected {expected:#x}, found {found:#x}")]
    InvariantViolation {
        field: &'static str,
        expected: u32,
        found: u32,
    },

    #[error("{field}: code {code} is not in the known table")]
    UnmappedCode { field: &'static str, code: u32 },

    #[error("{remaining} bytes left unconsumed")]
    TrailingData { remaining: usize },

    #[error("records nested deeper than {limit} levels")]
    ContainerTooDeep { limit: usize },
}

/// A fatal decode failure with the location of the offending record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} (at byte offset {offset}, in {path})")]
pub struct DecodeError {
    pub kind: DecodeErrorKind,
    /// Absolute byte offset into the decoded buffer.
    pub offset: usize,
    pub path: TagPath,
}
