//! Per-decode format context.
//!
//! The module format version is read from the first word of an `MBS2` payload and
//! selects between structurally different sub-grammars further down the tree. It
//! is passed by value through every nested decode call, so sibling modules (e.g.
//! the `MBSX` entries of a kernel library) each see their own version.

/// First module version that uses the current grammar revision.
pub const CURRENT_GRAMMAR_MIN_VERSION: u32 = 13;

/// Module version whose compiled entries carry a debug name string.
pub const DEBUG_NAME_VERSION: u32 = 13;

/// Module version whose `BFRE` record starts with an extra word.
pub const RESERVATION_PREFIX_VERSION: u32 = 18;

/// Which revision of the record grammar applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrammarRevision {
    /// Module versions below [`CURRENT_GRAMMAR_MIN_VERSION`]: no `TPPO` type records and
    /// `TPGE` without an interpolation qualifier word.
    Legacy,
    /// Module versions from [`CURRENT_GRAMMAR_MIN_VERSION`] on.
    Current,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormatContext {
    module_version: Option<u32>,
}

impl FormatContext {
    /// Context for records decoded outside any module.
    pub const fn new() -> Self {
        Self {
            module_version: None,
        }
    }

    /// Returns a copy of this context for the body of a module with `version`.
    pub const fn with_module_version(self, version: u32) -> Self {
        Self {
            module_version: Some(version),
        }
    }

    pub const fn module_version(&self) -> Option<u32> {
        self.module_version
    }

    /// Records decoded outside any module follow the current grammar.
    pub fn revision(&self) -> GrammarRevision {
        match self.module_version {
            Some(v) if v < CURRENT_GRAMMAR_MIN_VERSION => GrammarRevision::Legacy,
            _ => GrammarRevision::Current,
        }
    }

    pub fn has_debug_name(&self) -> bool {
        self.module_version == Some(DEBUG_NAME_VERSION)
    }

    pub fn has_reservation_prefix(&self) -> bool {
        self.module_version == Some(RESERVATION_PREFIX_VERSION)
    }
}
