//! Record dispatcher and sequence decoder.
//!
//! [`Decoder`] reads one record at a time, checks its tag against the tags that are
//! legal at the current grammar position, emits the record boundary line and hands
//! the payload to the tag's semantic decoder. Tags without a semantic decoder are
//! dumped as raw words.

use tracing::trace;

use crate::binary::{BufferReservation, CompiledEntry, StageSchedule};
use crate::container::{Annotation, LibraryModule, Module, ProgramBinary, StageSection};
use crate::context::FormatContext;
use crate::error::{DecodeError, DecodeErrorKind, TagList, TagPath};
use crate::fourcc::FourCC;
use crate::kernel::{Kernel, KernelParam};
use crate::line::{Line, ReportLine};
use crate::record::{read_record, Cursor};
use crate::symbol::{CommonSection, LanguageVersion, Symbol, SymbolGroup};
use crate::types::{StructField, Type};

/// Nesting limit for corrupt input. Real files nest about 8 levels deep.
pub const MAX_DEPTH: usize = 64;

/// The semantic decoder registered for a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    ProgramBinary,
    StageWrapper,
    Module,
    HardwareVersion,
    StageSection,
    Common,
    LanguageVersion,
    SymbolGroup,
    Symbol,
    String,
    Type,
    Scalar,
    Array,
    Matrix,
    InterfaceBlock,
    Struct,
    StructField,
    Pointer,
    SamplerOrImage,
    AtomicCounter,
    CompiledEntry,
    ObjectCode,
    FormatHeader,
    BufferReservation,
    Schedule,
    Kernel,
    KernelParam,
    WorkGroupSize,
    Annotations,
    LibraryModule,
    StringTable,
}

impl RecordKind {
    /// Returns `None` for tags whose payload is only dumped.
    pub fn from_tag(tag: FourCC) -> Option<Self> {
        let kind = match tag {
            FourCC::MPB1 => Self::ProgramBinary,
            FourCC::COMP | FourCC::VERT | FourCC::FRAG => Self::StageWrapper,
            FourCC::MBS2 => Self::Module,
            FourCC::VEHW => Self::HardwareVersion,
            FourCC::CCOM | FourCC::CVER | FourCC::CFRA => Self::StageSection,
            FourCC::CMMN => Self::Common,
            FourCC::VELA => Self::LanguageVersion,
            FourCC::SSYM => Self::SymbolGroup,
            FourCC::SYMB => Self::Symbol,
            FourCC::STRI => Self::String,
            FourCC::TYPE => Self::Type,
            FourCC::TPGE => Self::Scalar,
            FourCC::TPAR => Self::Array,
            FourCC::TPMA => Self::Matrix,
            FourCC::TPIB => Self::InterfaceBlock,
            FourCC::TPST => Self::Struct,
            FourCC::TPSE => Self::StructField,
            FourCC::TPPO => Self::Pointer,
            FourCC::TPSA => Self::SamplerOrImage,
            FourCC::TPAC => Self::AtomicCounter,
            FourCC::EBIN => Self::CompiledEntry,
            FourCC::OBJC => Self::ObjectCode,
            FourCC::FSHA => Self::FormatHeader,
            FourCC::BFRE => Self::BufferReservation,
            FourCC::SPDC | FourCC::SPDV | FourCC::SPDF => Self::Schedule,
            FourCC::KERN => Self::Kernel,
            FourCC::KPAR => Self::KernelParam,
            FourCC::KWGS => Self::WorkGroupSize,
            FourCC::BATT => Self::Annotations,
            FourCC::MBSX => Self::LibraryModule,
            FourCC::STRT => Self::StringTable,
            _ => return None,
        };
        Some(kind)
    }
}

/// The decoded payload of one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordValue {
    /// Payload of a tag without a semantic decoder.
    Raw(Vec<u32>),
    ProgramBinary(ProgramBinary),
    /// `COMP`/`VERT`/`FRAG`: a stage wrapping one module.
    Stage(Module),
    Module(Module),
    HardwareVersion([u32; 3]),
    StageSection(StageSection),
    Common(CommonSection),
    LanguageVersion(LanguageVersion),
    SymbolGroup(SymbolGroup),
    Symbol(Symbol),
    String(String),
    Type(Type),
    Field(StructField),
    CompiledEntry(CompiledEntry),
    Object(Vec<u32>),
    FormatHeader([u32; 6]),
    BufferReservation(BufferReservation),
    Schedule(StageSchedule),
    Kernel(Kernel),
    KernelParam(KernelParam),
    WorkGroupSize([u32; 3]),
    Annotations(Vec<Annotation>),
    LibraryModule(LibraryModule),
    StringTable(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedRecord {
    pub tag: FourCC,
    /// Absolute offset of the record header.
    pub offset: usize,
    pub value: RecordValue,
}

/// A decode session: collects output lines and tracks the enclosing tags.
#[derive(Debug, Default)]
pub struct Decoder {
    lines: Vec<ReportLine>,
    path: Vec<FourCC>,
}

impl Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[ReportLine] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<ReportLine> {
        self.lines
    }

    /// Decodes the record at the front of `cur`, which must carry one of `allowed`.
    pub fn decode_one<'a>(
        &mut self,
        cur: Cursor<'a>,
        allowed: &[FourCC],
        ctx: FormatContext,
    ) -> Result<(DecodedRecord, Cursor<'a>), DecodeError> {
        let (record, rest) = read_record(cur).map_err(|kind| self.error(kind, cur.offset()))?;
        let offset = record.offset();

        if !allowed.contains(&record.tag) {
            return Err(self.error(
                DecodeErrorKind::UnexpectedTag {
                    found: record.tag,
                    expected: TagList(allowed.to_vec()),
                },
                offset,
            ));
        }
        if record.tag != FourCC::STRT && record.length % 4 != 0 {
            return Err(self.error(
                DecodeErrorKind::MisalignedLength {
                    tag: record.tag,
                    length: record.length,
                },
                offset,
            ));
        }
        if self.path.len() >= MAX_DEPTH {
            return Err(self.error(
                DecodeErrorKind::ContainerTooDeep { limit: MAX_DEPTH },
                offset,
            ));
        }

        trace!(tag = %record.tag, length = record.length, offset, depth = self.path.len(), "record");
        self.emit(Line::Record {
            tag: record.tag,
            length: record.length,
        });

        self.path.push(record.tag);
        let value = self.dispatch(record.tag, record.payload, ctx);
        self.path.pop();

        Ok((
            DecodedRecord {
                tag: record.tag,
                offset,
                value: value?,
            },
            rest,
        ))
    }

    /// Decodes records until `cur` is exhausted.
    ///
    /// Callers that declare a child count compare it with the length of the result.
    pub fn decode_all(
        &mut self,
        mut cur: Cursor<'_>,
        allowed: &[FourCC],
        ctx: FormatContext,
    ) -> Result<Vec<DecodedRecord>, DecodeError> {
        let mut out = Vec::new();
        while !cur.is_empty() {
            let (record, rest) = self.decode_one(cur, allowed, ctx)?;
            out.push(record);
            cur = rest;
        }
        Ok(out)
    }

    fn dispatch(
        &mut self,
        tag: FourCC,
        payload: Cursor<'_>,
        ctx: FormatContext,
    ) -> Result<RecordValue, DecodeError> {
        let Some(kind) = RecordKind::from_tag(tag) else {
            let words = self.all_words(payload)?;
            self.dump(&words);
            return Ok(RecordValue::Raw(words));
        };

        Ok(match kind {
            RecordKind::ProgramBinary => {
                RecordValue::ProgramBinary(self.program_binary(payload, ctx)?)
            }
            RecordKind::StageWrapper => RecordValue::Stage(self.stage_wrapper(payload, ctx)?),
            RecordKind::Module => RecordValue::Module(self.module(payload, ctx)?),
            RecordKind::HardwareVersion => {
                RecordValue::HardwareVersion(self.hardware_version(payload)?)
            }
            RecordKind::StageSection => {
                RecordValue::StageSection(self.stage_section(tag, payload, ctx)?)
            }
            RecordKind::Common => RecordValue::Common(self.common_section(payload, ctx)?),
            RecordKind::LanguageVersion => {
                RecordValue::LanguageVersion(self.language_version(payload)?)
            }
            RecordKind::SymbolGroup => RecordValue::SymbolGroup(self.symbol_group(payload, ctx)?),
            RecordKind::Symbol => RecordValue::Symbol(self.symbol(payload, ctx)?),
            RecordKind::String => RecordValue::String(self.string(payload)),
            RecordKind::Type => RecordValue::Type(self.type_record(payload, ctx)?),
            RecordKind::Scalar => RecordValue::Type(Type::Scalar(self.scalar(payload, ctx)?)),
            RecordKind::Array => RecordValue::Type(self.array(payload, ctx)?),
            RecordKind::Matrix => RecordValue::Type(self.matrix(payload, ctx)?),
            RecordKind::InterfaceBlock => RecordValue::Type(self.interface_block(payload, ctx)?),
            RecordKind::Struct => RecordValue::Type(self.struct_type(payload, ctx)?),
            RecordKind::StructField => RecordValue::Field(self.struct_field(payload, ctx)?),
            RecordKind::Pointer => RecordValue::Type(self.pointer(payload, ctx)?),
            RecordKind::SamplerOrImage => RecordValue::Type(self.sampler(payload)?),
            RecordKind::AtomicCounter => RecordValue::Type(self.atomic_counter(payload)?),
            RecordKind::CompiledEntry => {
                RecordValue::CompiledEntry(self.compiled_entry(payload, ctx)?)
            }
            RecordKind::ObjectCode => RecordValue::Object(self.object_code(payload)?),
            RecordKind::FormatHeader => RecordValue::FormatHeader(self.format_header(payload)?),
            RecordKind::BufferReservation => {
                RecordValue::BufferReservation(self.buffer_reservation(payload, ctx)?)
            }
            RecordKind::Schedule => RecordValue::Schedule(self.schedule(tag, payload)?),
            RecordKind::Kernel => RecordValue::Kernel(self.kernel(payload, ctx)?),
            RecordKind::KernelParam => RecordValue::KernelParam(self.kernel_param(payload, ctx)?),
            RecordKind::WorkGroupSize => RecordValue::WorkGroupSize(self.work_group_size(payload)?),
            RecordKind::Annotations => RecordValue::Annotations(self.annotations(payload, ctx)?),
            RecordKind::LibraryModule => {
                RecordValue::LibraryModule(self.library_module(payload, ctx)?)
            }
            RecordKind::StringTable => RecordValue::StringTable(self.string_table(payload)),
        })
    }

    /// Decodes one record and extracts the value a grammar position requires.
    pub(crate) fn expect<'a, T>(
        &mut self,
        cur: Cursor<'a>,
        allowed: &[FourCC],
        ctx: FormatContext,
        extract: impl FnOnce(RecordValue) -> Option<T>,
    ) -> Result<(T, Cursor<'a>), DecodeError> {
        let (record, rest) = self.decode_one(cur, allowed, ctx)?;
        match extract(record.value) {
            Some(value) => Ok((value, rest)),
            None => Err(self.error(
                DecodeErrorKind::UnexpectedTag {
                    found: record.tag,
                    expected: TagList(allowed.to_vec()),
                },
                record.offset,
            )),
        }
    }

    /// Decodes consecutive `tag` records from the front of `cur`.
    ///
    /// Stops at the first record with another tag, so callers check the declared
    /// count against what was actually present.
    pub(crate) fn expect_run<'a, T>(
        &mut self,
        mut cur: Cursor<'a>,
        tag: FourCC,
        ctx: FormatContext,
        mut extract: impl FnMut(RecordValue) -> Option<T>,
    ) -> Result<(Vec<T>, Cursor<'a>), DecodeError> {
        let mut out = Vec::new();
        while cur.starts_with(tag) {
            let (value, rest) = self.expect(cur, &[tag], ctx, &mut extract)?;
            out.push(value);
            cur = rest;
        }
        Ok((out, cur))
    }

    pub(crate) fn expect_string<'a>(
        &mut self,
        cur: Cursor<'a>,
        ctx: FormatContext,
    ) -> Result<(String, Cursor<'a>), DecodeError> {
        self.expect(cur, &[FourCC::STRI], ctx, |v| match v {
            RecordValue::String(s) => Some(s),
            _ => None,
        })
    }

    pub(crate) fn expect_type<'a>(
        &mut self,
        cur: Cursor<'a>,
        ctx: FormatContext,
    ) -> Result<(Type, Cursor<'a>), DecodeError> {
        self.expect(cur, &[FourCC::TYPE], ctx, |v| match v {
            RecordValue::Type(ty) => Some(ty),
            _ => None,
        })
    }

    /// Decodes one record of a tag that has no semantic decoder.
    pub(crate) fn expect_raw<'a>(
        &mut self,
        cur: Cursor<'a>,
        tag: FourCC,
        ctx: FormatContext,
    ) -> Result<(Vec<u32>, Cursor<'a>), DecodeError> {
        self.expect(cur, &[tag], ctx, |v| match v {
            RecordValue::Raw(words) => Some(words),
            _ => None,
        })
    }

    pub(crate) fn error(&self, kind: DecodeErrorKind, offset: usize) -> DecodeError {
        DecodeError {
            kind,
            offset,
            path: TagPath(self.path.clone()),
        }
    }

    /// Appends a line at the current nesting depth.
    pub(crate) fn emit(&mut self, line: Line) {
        let depth = self.path.len();
        self.lines.push(ReportLine::new(depth, line));
    }

    pub(crate) fn emit_text(&mut self, text: impl Into<String>) {
        self.emit(Line::Text(text.into()));
    }

    /// Dumps words verbatim, or an empty marker when there are none.
    pub(crate) fn dump(&mut self, words: &[u32]) {
        if words.is_empty() {
            self.emit(Line::Empty);
            return;
        }
        for &word in words {
            self.emit(Line::Word(word));
        }
    }

    pub(crate) fn take_word<'a>(&self, cur: Cursor<'a>) -> Result<(u32, Cursor<'a>), DecodeError> {
        cur.read_u32().ok_or_else(|| {
            self.error(
                DecodeErrorKind::TruncatedInput {
                    needed: 4,
                    available: cur.len(),
                },
                cur.offset(),
            )
        })
    }

    pub(crate) fn take_words<'a, const N: usize>(
        &self,
        cur: Cursor<'a>,
    ) -> Result<([u32; N], Cursor<'a>), DecodeError> {
        if cur.len() < N * 4 {
            return Err(self.error(
                DecodeErrorKind::TruncatedInput {
                    needed: N * 4,
                    available: cur.len(),
                },
                cur.offset(),
            ));
        }
        let mut out = [0u32; N];
        let mut rest = cur;
        for slot in out.iter_mut() {
            let (word, tail) = self.take_word(rest)?;
            *slot = word;
            rest = tail;
        }
        Ok((out, rest))
    }

    /// Reads a payload that must hold exactly `N` words.
    pub(crate) fn exact_words<const N: usize>(
        &self,
        cur: Cursor<'_>,
        field: &'static str,
    ) -> Result<[u32; N], DecodeError> {
        if cur.len() != N * 4 {
            return Err(self.error(
                DecodeErrorKind::InvariantViolation {
                    field,
                    expected: N as u32,
                    found: (cur.len() / 4) as u32,
                },
                cur.offset(),
            ));
        }
        let (words, _) = self.take_words::<N>(cur)?;
        Ok(words)
    }

    /// Reads a whole payload as words.
    pub(crate) fn all_words(&self, cur: Cursor<'_>) -> Result<Vec<u32>, DecodeError> {
        let mut out = Vec::with_capacity(cur.len() / 4);
        let mut rest = cur;
        while !rest.is_empty() {
            let (word, tail) = self.take_word(rest)?;
            out.push(word);
            rest = tail;
        }
        Ok(out)
    }

    /// Fails if any bytes of a payload are left over.
    pub(crate) fn finish(&self, cur: Cursor<'_>) -> Result<(), DecodeError> {
        if cur.is_empty() {
            return Ok(());
        }
        Err(self.error(
            DecodeErrorKind::TrailingData {
                remaining: cur.len(),
            },
            cur.offset(),
        ))
    }

    pub(crate) fn check(
        &self,
        field: &'static str,
        expected: u32,
        found: u32,
        offset: usize,
    ) -> Result<(), DecodeError> {
        if expected == found {
            return Ok(());
        }
        Err(self.error(
            DecodeErrorKind::InvariantViolation {
                field,
                expected,
                found,
            },
            offset,
        ))
    }

    pub(crate) fn check_count(
        &self,
        what: &'static str,
        declared: u32,
        found: usize,
        offset: usize,
    ) -> Result<(), DecodeError> {
        if usize::try_from(declared).is_ok_and(|d| d == found) {
            return Ok(());
        }
        Err(self.error(
            DecodeErrorKind::CountMismatch {
                what,
                declared,
                found,
            },
            offset,
        ))
    }
}
