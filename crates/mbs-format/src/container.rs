//! Top-level containers and their wrappers.
//!
//! Three entry formats are known:
//!
//! * program binaries (`MPB1`), as returned by `glGetProgramBinary`;
//! * standalone modules (`MBS2`), e.g. the compiler's built-in shader library;
//! * kernel libraries, a bare `CLCC` record followed by `MBSX`/`KRNL` pairs, a
//!   `STRT` string table and a literal `TERM\0`.

use crate::context::FormatContext;
use crate::decoder::{Decoder, RecordValue};
use crate::error::{DecodeError, DecodeErrorKind};
use crate::fourcc::FourCC;
use crate::kernel::Kernel;
use crate::line::{Line, ReportLine};
use crate::record::Cursor;
use crate::symbol::CommonSection;

/// Bytes that end a kernel library.
pub const KERNEL_LIBRARY_TERMINATOR: &[u8; 5] = b"TERM\0";

const PROGRAM_BINARY_HEADER: [u32; 2] = [2, 0];
const HARDWARE_VERSION: [u32; 3] = [11, 0, 0];

const PROGRAM_ENTRY_TAGS: &[FourCC] = &[
    FourCC::COMP,
    FourCC::VERT,
    FourCC::FRAG,
    FourCC::GEOM,
    FourCC::CTRL,
    FourCC::EVAL,
    FourCC::BATT,
];

const STAGE_SECTION_TAGS: &[FourCC] = &[FourCC::CCOM, FourCC::CVER, FourCC::CFRA];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Compute,
    Vertex,
    Fragment,
    Geometry,
    TessControl,
    TessEval,
}

impl Stage {
    pub fn from_tag(tag: FourCC) -> Option<Self> {
        match tag {
            FourCC::COMP => Some(Self::Compute),
            FourCC::VERT => Some(Self::Vertex),
            FourCC::FRAG => Some(Self::Fragment),
            FourCC::GEOM => Some(Self::Geometry),
            FourCC::CTRL => Some(Self::TessControl),
            FourCC::EVAL => Some(Self::TessEval),
            _ => None,
        }
    }
}

/// One `BATT` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub name: String,
    pub flag: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgramEntry {
    Stage { stage: Stage, module: Module },
    /// Geometry and tessellation stages are not decoded.
    Opaque { stage: Stage, words: Vec<u32> },
    Annotations(Vec<Annotation>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramBinary {
    pub header: [u32; 2],
    pub entries: Vec<ProgramEntry>,
}

impl ProgramBinary {
    pub fn modules(&self) -> impl Iterator<Item = (Stage, &Module)> {
        self.entries.iter().filter_map(|e| match e {
            ProgramEntry::Stage { stage, module } => Some((*stage, module)),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageSection {
    Compute {
        common: CommonSection,
        kernel: Kernel,
    },
    Vertex {
        common: CommonSection,
    },
    Fragment {
        common: CommonSection,
    },
}

impl StageSection {
    pub fn common(&self) -> &CommonSection {
        match self {
            Self::Compute { common, .. } | Self::Vertex { common } | Self::Fragment { common } => {
                common
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    pub version: u32,
    pub hardware_version: [u32; 3],
    pub stage: StageSection,
}

/// `MBSX`: a module inside a kernel library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryModule {
    /// Two leading words; meaning unknown.
    pub flags: [u32; 2],
    pub module: Module,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryEntry {
    pub module: LibraryModule,
    /// Raw `KRNL` payload following the module.
    pub kernel: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelLibrary {
    /// Raw `CLCC` payload.
    pub header: Vec<u32>,
    pub entries: Vec<LibraryEntry>,
    pub strings: Vec<String>,
}

/// Any of the three top-level containers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Container {
    ProgramBinary(ProgramBinary),
    Module(Module),
    KernelLibrary(KernelLibrary),
}

/// A decoded container together with its output lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report<T> {
    pub value: T,
    pub lines: Vec<ReportLine>,
}

impl<T> Report<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Report<U> {
        Report {
            value: f(self.value),
            lines: self.lines,
        }
    }
}

/// Decodes a program binary (top record `MPB1`). The whole buffer must be consumed.
pub fn decode_program_binary(bytes: &[u8]) -> Result<Report<ProgramBinary>, DecodeError> {
    decode_top_level(bytes, FourCC::MPB1, |v| match v {
        RecordValue::ProgramBinary(p) => Some(p),
        _ => None,
    })
}

/// Decodes a standalone module (top record `MBS2`). The whole buffer must be consumed.
pub fn decode_module(bytes: &[u8]) -> Result<Report<Module>, DecodeError> {
    decode_top_level(bytes, FourCC::MBS2, |v| match v {
        RecordValue::Module(m) => Some(m),
        _ => None,
    })
}

/// Decodes a kernel library (`CLCC` stream).
pub fn decode_kernel_library(bytes: &[u8]) -> Result<Report<KernelLibrary>, DecodeError> {
    let mut dec = Decoder::new();
    let ctx = FormatContext::new();

    let (header, mut rest) = dec.expect_raw(Cursor::new(bytes), FourCC::CLCC, ctx)?;

    let mut entries = Vec::new();
    while rest.starts_with(FourCC::MBSX) {
        let (module, tail) = dec.expect(rest, &[FourCC::MBSX], ctx, |v| match v {
            RecordValue::LibraryModule(m) => Some(m),
            _ => None,
        })?;
        let (kernel, tail) = dec.expect_raw(tail, FourCC::KRNL, ctx)?;
        entries.push(LibraryEntry { module, kernel });
        rest = tail;
    }

    let (strings, rest) = dec.expect(rest, &[FourCC::STRT], ctx, |v| match v {
        RecordValue::StringTable(strings) => Some(strings),
        _ => None,
    })?;

    dec.terminator(rest)?;

    Ok(Report {
        value: KernelLibrary {
            header,
            entries,
            strings,
        },
        lines: dec.into_lines(),
    })
}

fn decode_top_level<T>(
    bytes: &[u8],
    tag: FourCC,
    extract: impl FnOnce(RecordValue) -> Option<T>,
) -> Result<Report<T>, DecodeError> {
    let mut dec = Decoder::new();
    let (value, rest) = dec.expect(Cursor::new(bytes), &[tag], FormatContext::new(), extract)?;
    dec.finish(rest)?;
    Ok(Report {
        value,
        lines: dec.into_lines(),
    })
}

impl Decoder {
    pub(crate) fn program_binary(
        &mut self,
        payload: Cursor<'_>,
        ctx: FormatContext,
    ) -> Result<ProgramBinary, DecodeError> {
        let (header, rest) = self.take_words::<2>(payload)?;
        self.dump(&header);
        self.check("MPB1 word 0", PROGRAM_BINARY_HEADER[0], header[0], payload.offset())?;
        self.check("MPB1 word 1", PROGRAM_BINARY_HEADER[1], header[1], payload.offset() + 4)?;

        let entries = self
            .decode_all(rest, PROGRAM_ENTRY_TAGS, ctx)?
            .into_iter()
            .filter_map(|r| match (Stage::from_tag(r.tag), r.value) {
                (Some(stage), RecordValue::Stage(module)) => {
                    Some(ProgramEntry::Stage { stage, module })
                }
                (Some(stage), RecordValue::Raw(words)) => {
                    Some(ProgramEntry::Opaque { stage, words })
                }
                (None, RecordValue::Annotations(annotations)) => {
                    Some(ProgramEntry::Annotations(annotations))
                }
                _ => None,
            })
            .collect();

        Ok(ProgramBinary { header, entries })
    }

    pub(crate) fn stage_wrapper(
        &mut self,
        payload: Cursor<'_>,
        ctx: FormatContext,
    ) -> Result<Module, DecodeError> {
        let (module, rest) = self.expect(payload, &[FourCC::MBS2], ctx, |v| match v {
            RecordValue::Module(m) => Some(m),
            _ => None,
        })?;
        self.finish(rest)?;
        Ok(module)
    }

    pub(crate) fn module(
        &mut self,
        payload: Cursor<'_>,
        ctx: FormatContext,
    ) -> Result<Module, DecodeError> {
        let (version, rest) = self.take_word(payload)?;
        self.dump(&[version]);
        let ctx = ctx.with_module_version(version);

        let (hardware_version, rest) = self.expect(rest, &[FourCC::VEHW], ctx, |v| match v {
            RecordValue::HardwareVersion(hw) => Some(hw),
            _ => None,
        })?;
        let (stage, rest) = self.expect(rest, STAGE_SECTION_TAGS, ctx, |v| match v {
            RecordValue::StageSection(s) => Some(s),
            _ => None,
        })?;
        self.finish(rest)?;

        Ok(Module {
            version,
            hardware_version,
            stage,
        })
    }

    pub(crate) fn hardware_version(&mut self, payload: Cursor<'_>) -> Result<[u32; 3], DecodeError> {
        let words = self.all_words(payload)?;
        self.dump(&words);
        let words: [u32; 3] = words.try_into().map_err(|w: Vec<u32>| {
            self.error(
                DecodeErrorKind::InvariantViolation {
                    field: "VEHW word count",
                    expected: 3,
                    found: w.len() as u32,
                },
                payload.offset(),
            )
        })?;
        let fields = ["VEHW word 0", "VEHW word 1", "VEHW word 2"];
        for (i, field) in fields.into_iter().enumerate() {
            self.check(field, HARDWARE_VERSION[i], words[i], payload.offset() + 4 * i)?;
        }
        Ok(words)
    }

    pub(crate) fn stage_section(
        &mut self,
        tag: FourCC,
        payload: Cursor<'_>,
        ctx: FormatContext,
    ) -> Result<StageSection, DecodeError> {
        let (common, rest) = self.expect(payload, &[FourCC::CMMN], ctx, |v| match v {
            RecordValue::Common(c) => Some(c),
            _ => None,
        })?;
        let (section, rest) = match tag {
            FourCC::CCOM => {
                let (kernel, rest) = self.expect(rest, &[FourCC::KERN], ctx, |v| match v {
                    RecordValue::Kernel(k) => Some(k),
                    _ => None,
                })?;
                (StageSection::Compute { common, kernel }, rest)
            }
            FourCC::CVER => (StageSection::Vertex { common }, rest),
            _ => (StageSection::Fragment { common }, rest),
        };
        self.finish(rest)?;
        Ok(section)
    }

    pub(crate) fn annotations(
        &mut self,
        payload: Cursor<'_>,
        ctx: FormatContext,
    ) -> Result<Vec<Annotation>, DecodeError> {
        let (count, mut rest) = self.take_word(payload)?;
        let mut annotations = Vec::new();
        while rest.starts_with(FourCC::STRI) {
            let (name, tail) = self.expect_string(rest, ctx)?;
            let (flag, tail) = self.take_word(tail)?;
            self.dump(&[flag]);
            annotations.push(Annotation { name, flag });
            rest = tail;
        }
        self.check_count("BATT annotations", count, annotations.len(), payload.offset())?;
        self.finish(rest)?;
        Ok(annotations)
    }

    /// Checks the literal that ends a kernel library.
    fn terminator(&self, rest: Cursor<'_>) -> Result<(), DecodeError> {
        let [t0, t1, t2, t3, nul] = *KERNEL_LIBRARY_TERMINATOR;
        let Some((tag, tail)) = rest.read_u32() else {
            return Err(self.truncated_terminator(rest));
        };
        self.check(
            "CLCC terminator tag",
            u32::from_le_bytes([t0, t1, t2, t3]),
            tag,
            rest.offset(),
        )?;
        let Some((&found, _)) = tail.bytes().split_first() else {
            return Err(self.truncated_terminator(rest));
        };
        self.check("CLCC terminator NUL", nul.into(), found.into(), tail.offset())?;
        let Some((_, tail)) = tail.split(1) else {
            return Err(self.truncated_terminator(rest));
        };
        self.finish(tail)
    }

    fn truncated_terminator(&self, rest: Cursor<'_>) -> DecodeError {
        self.error(
            DecodeErrorKind::TruncatedInput {
                needed: KERNEL_LIBRARY_TERMINATOR.len(),
                available: rest.len(),
            },
            rest.offset(),
        )
    }

    pub(crate) fn library_module(
        &mut self,
        payload: Cursor<'_>,
        ctx: FormatContext,
    ) -> Result<LibraryModule, DecodeError> {
        let (flags, rest) = self.take_words::<2>(payload)?;
        self.dump(&flags);
        let (module, rest) = self.expect(rest, &[FourCC::MBS2], ctx, |v| match v {
            RecordValue::Module(m) => Some(m),
            _ => None,
        })?;
        self.finish(rest)?;
        Ok(LibraryModule { flags, module })
    }

    pub(crate) fn string_table(&mut self, payload: Cursor<'_>) -> Vec<String> {
        let strings: Vec<String> = payload
            .bytes()
            .split(|&b| b == 0)
            .map(|piece| String::from_utf8_lossy(piece).into_owned())
            .collect();
        for s in &strings {
            self.emit(Line::Text(s.clone()));
        }
        strings
    }
}
