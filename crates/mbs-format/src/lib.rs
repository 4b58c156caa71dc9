//! A strict decoder for the `MBS` family of GPU shader containers.
//!
//! The containers are nested tag-length-value records (`MPB1`, `MBS2`, `CLCC`
//! streams) holding per-stage symbol tables, type layouts, compiled code and
//! scheduling descriptors. Decoding produces both a typed tree and an ordered list
//! of [`ReportLine`]s that [`report::render`] turns into a GLSL-like listing.
//!
//! Every structural constant the format is known to carry is validated; any
//! mismatch aborts with a [`DecodeError`] naming the byte offset and the chain of
//! enclosing tags. Payloads of tags without a semantic decoder are dumped as raw
//! words.

#![forbid(unsafe_code)]

/// Compiled entries (`EBIN`) and their scheduling/object records.
pub mod binary;
/// Top-level containers and stage wrappers.
pub mod container;
mod context;
mod decoder;
mod error;
mod fourcc;
/// Input detection and hex pre-decoding.
pub mod input;
/// Kernel descriptors (`KERN`).
pub mod kernel;
mod line;
mod record;
/// Rendering of output lines.
pub mod report;
/// Symbols and common sections.
pub mod symbol;
mod tables;
/// The type record family.
pub mod types;

/// Helpers for building synthetic record buffers in tests.
///
/// Only available for this crate's own tests or with the `test-utils` feature.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use container::{
    decode_kernel_library, decode_module, decode_program_binary, Container, Report,
};
pub use context::{FormatContext, GrammarRevision};
pub use decoder::{DecodedRecord, Decoder, RecordKind, RecordValue, MAX_DEPTH};
pub use error::{DecodeError, DecodeErrorKind, TagList, TagPath};
pub use fourcc::FourCC;
pub use input::{decode_input, InputError, InputFormat};
pub use line::{Line, ReportLine};
pub use record::{read_record, Cursor, Record, RECORD_HEADER_LEN};
pub use tables::{es_language_version, sampler_name};
