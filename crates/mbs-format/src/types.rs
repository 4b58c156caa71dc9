//! Type records (`TYPE` and the `TP**` family).
//!
//! A `TYPE` record wraps exactly one of:
//!
//! | tag    | type                         |
//! |--------|------------------------------|
//! | `TPGE` | scalar or vector             |
//! | `TPAR` | array                        |
//! | `TPMA` | matrix                       |
//! | `TPST` | struct                       |
//! | `TPIB` | interface block              |
//! | `TPPO` | pointer (current grammar)    |
//! | `TPSA` | sampler or image             |
//! | `TPAC` | atomic counter               |

use core::fmt;

use tracing::debug;

use crate::context::{FormatContext, GrammarRevision};
use crate::decoder::{Decoder, RecordValue};
use crate::error::{DecodeError, DecodeErrorKind};
use crate::fourcc::FourCC;
use crate::line::Line;
use crate::record::Cursor;
use crate::tables::sampler_name;

const TYPE_CHILDREN_LEGACY: &[FourCC] = &[
    FourCC::TPGE,
    FourCC::TPMA,
    FourCC::TPAR,
    FourCC::TPST,
    FourCC::TPIB,
    FourCC::TPSA,
    FourCC::TPAC,
];

const TYPE_CHILDREN_CURRENT: &[FourCC] = &[
    FourCC::TPGE,
    FourCC::TPMA,
    FourCC::TPAR,
    FourCC::TPST,
    FourCC::TPIB,
    FourCC::TPPO,
    FourCC::TPSA,
    FourCC::TPAC,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Float,
    Int,
    Uint,
    Bool,
}

impl ScalarKind {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Float),
            2 => Some(Self::Int),
            3 => Some(Self::Uint),
            4 => Some(Self::Bool),
            _ => None,
        }
    }

    fn scalar_name(self) -> &'static str {
        match self {
            Self::Float => "float",
            Self::Int => "int",
            Self::Uint => "uint",
            Self::Bool => "bool",
        }
    }

    fn vector_prefix(self) -> &'static str {
        match self {
            Self::Float => "vec",
            Self::Int => "ivec",
            Self::Uint => "uvec",
            Self::Bool => "bvec",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    /// No precision qualifier.
    Default,
    High,
    Medium,
    Low,
}

impl Precision {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Default),
            1 => Some(Self::High),
            2 => Some(Self::Medium),
            3 => Some(Self::Low),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "",
            Self::High => "highp",
            Self::Medium => "mediump",
            Self::Low => "lowp",
        }
    }
}

/// Interpolation qualifier carried in the low byte of `TPGE` word 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpolation {
    /// Code 8; meaning unknown.
    Unknown,
    Smooth,
    Flat,
    SmoothCentroid,
    FlatCentroid,
    SmoothSample,
    FlatSample,
}

impl Interpolation {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            8 => Some(Self::Unknown),
            9 => Some(Self::Smooth),
            10 => Some(Self::Flat),
            17 => Some(Self::SmoothCentroid),
            18 => Some(Self::FlatCentroid),
            33 => Some(Self::SmoothSample),
            34 => Some(Self::FlatSample),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "?",
            Self::Smooth => "smooth",
            Self::Flat => "flat",
            Self::SmoothCentroid => "smooth centroid",
            Self::FlatCentroid => "flat centroid",
            Self::SmoothSample => "smooth sample",
            Self::FlatSample => "flat sample",
        }
    }
}

/// A scalar or vector type (`TPGE`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScalarType {
    pub kind: ScalarKind,
    /// 1 for a plain scalar, 2..=4 for vectors.
    pub width: u8,
    pub precision: Precision,
    /// `None` in the legacy grammar, which has no qualifier word.
    pub qualifier: Option<Interpolation>,
    /// Word 1; meaning unknown.
    pub unknown: u32,
}

impl ScalarType {
    /// Decodes word 0: low byte kind, next byte width, top byte precision.
    pub fn parse_layout_word(
        word: u32,
    ) -> Result<(ScalarKind, u8, Precision), DecodeErrorKind> {
        let kind_code = (word & 0xff) as u8;
        let width = ((word >> 8) & 0xff) as u8;
        let precision_code = ((word >> 24) & 0xff) as u8;

        let kind = ScalarKind::from_code(kind_code).ok_or(DecodeErrorKind::UnmappedCode {
            field: "TPGE scalar kind",
            code: kind_code.into(),
        })?;
        if !(1..=4).contains(&width) {
            return Err(DecodeErrorKind::UnmappedCode {
                field: "TPGE vector width",
                code: width.into(),
            });
        }
        let precision =
            Precision::from_code(precision_code).ok_or(DecodeErrorKind::UnmappedCode {
                field: "TPGE precision",
                code: precision_code.into(),
            })?;
        Ok((kind, width, precision))
    }

    pub fn parse_qualifier_word(word: u32) -> Result<Interpolation, DecodeErrorKind> {
        let code = (word & 0xff) as u8;
        Interpolation::from_code(code).ok_or(DecodeErrorKind::UnmappedCode {
            field: "TPGE interpolation qualifier",
            code: code.into(),
        })
    }

    /// Decodes a current-grammar `TPGE` payload.
    pub fn from_words(words: [u32; 3]) -> Result<Self, DecodeErrorKind> {
        let (kind, width, precision) = Self::parse_layout_word(words[0])?;
        let qualifier = Self::parse_qualifier_word(words[2])?;
        Ok(Self {
            kind,
            width,
            precision,
            qualifier: Some(qualifier),
            unknown: words[1],
        })
    }

    /// GLSL type name, e.g. `float` or `uvec4`.
    pub fn glsl_name(&self) -> String {
        if self.width == 1 {
            self.kind.scalar_name().to_owned()
        } else {
            format!("{}{}", self.kind.vector_prefix(), self.width)
        }
    }
}

impl fmt::Display for ScalarType {
    /// Qualifier, precision and type name, skipping empty parts.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.glsl_name();
        let parts = [
            self.qualifier.map_or("", Interpolation::as_str),
            self.precision.as_str(),
            name.as_str(),
        ];
        let mut first = true;
        for part in parts.into_iter().filter(|p| !p.is_empty()) {
            if !first {
                f.write_str(" ")?;
            }
            f.write_str(part)?;
            first = false;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixLayout {
    ColumnMajor,
    RowMajor,
}

impl MatrixLayout {
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            0 => Some(Self::ColumnMajor),
            1 => Some(Self::RowMajor),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ColumnMajor => "column_major",
            Self::RowMajor => "row_major",
        }
    }
}

/// Interface block layout, low byte of `TPIB` word 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockLayout {
    /// Codes 0..=3; meaning unknown.
    Reserved(u8),
    Shared,
    Packed,
    Std140,
    Std430,
}

impl BlockLayout {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0..=3 => Some(Self::Reserved(code)),
            4 => Some(Self::Shared),
            5 => Some(Self::Packed),
            6 => Some(Self::Std140),
            7 => Some(Self::Std430),
            _ => None,
        }
    }
}

impl fmt::Display for BlockLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reserved(code) => write!(f, "unknown ({code})"),
            Self::Shared => f.write_str("shared"),
            Self::Packed => f.write_str("packed"),
            Self::Std140 => f.write_str("std140"),
            Self::Std430 => f.write_str("std430"),
        }
    }
}

/// A member of a struct or interface block (`TPSE`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructField {
    pub name: String,
    pub offset: u32,
    /// Two words of unknown meaning, kept verbatim.
    pub unknown: [u32; 2],
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceBlock {
    pub layout: BlockLayout,
    /// Second byte of word 0; not interpreted.
    pub is_global: u8,
    pub total_size: u32,
    pub fields: Vec<StructField>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructType {
    pub total_size: u32,
    pub field_count: u32,
    pub name: String,
    pub fields: Vec<StructField>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    Scalar(ScalarType),
    Array {
        element_count: u32,
        element: Box<Type>,
    },
    Matrix {
        columns: u16,
        layout: MatrixLayout,
        /// Word 1; meaning unknown.
        unknown: u32,
        element: ScalarType,
    },
    InterfaceBlock(InterfaceBlock),
    Struct(StructType),
    Pointer {
        /// Leading word; meaning unknown.
        unknown: u32,
        inner: Box<Type>,
    },
    /// `name` is `None` for codes missing from the sampler table.
    SamplerOrImage { code: u32, name: Option<&'static str> },
    AtomicCounter { offset: u32 },
}

impl Decoder {
    pub(crate) fn type_record(
        &mut self,
        payload: Cursor<'_>,
        ctx: FormatContext,
    ) -> Result<Type, DecodeError> {
        let allowed = match ctx.revision() {
            GrammarRevision::Legacy => TYPE_CHILDREN_LEGACY,
            GrammarRevision::Current => TYPE_CHILDREN_CURRENT,
        };
        let (ty, rest) = self.expect(payload, allowed, ctx, |v| match v {
            RecordValue::Type(ty) => Some(ty),
            _ => None,
        })?;
        self.finish(rest)?;
        Ok(ty)
    }

    pub(crate) fn scalar(
        &mut self,
        payload: Cursor<'_>,
        ctx: FormatContext,
    ) -> Result<ScalarType, DecodeError> {
        let (layout, unknown, qualifier_word) = match ctx.revision() {
            GrammarRevision::Current => {
                let w = self.exact_words::<3>(payload, "TPGE word count")?;
                self.dump(&w);
                (w[0], w[1], Some(w[2]))
            }
            GrammarRevision::Legacy => {
                let w = self.exact_words::<2>(payload, "TPGE word count")?;
                self.dump(&w);
                (w[0], w[1], None)
            }
        };

        let (kind, width, precision) = ScalarType::parse_layout_word(layout)
            .map_err(|kind| self.error(kind, payload.offset()))?;
        let qualifier = qualifier_word
            .map(ScalarType::parse_qualifier_word)
            .transpose()
            .map_err(|kind| self.error(kind, payload.offset() + 8))?;

        let scalar = ScalarType {
            kind,
            width,
            precision,
            qualifier,
            unknown,
        };
        self.emit_text(scalar.to_string());
        Ok(scalar)
    }

    pub(crate) fn array(
        &mut self,
        payload: Cursor<'_>,
        ctx: FormatContext,
    ) -> Result<Type, DecodeError> {
        let (element_count, rest) = self.take_word(payload)?;
        self.emit(Line::Field {
            label: "element count",
            value: element_count,
        });
        let (element, rest) = self.expect_type(rest, ctx)?;
        self.finish(rest)?;
        Ok(Type::Array {
            element_count,
            element: Box::new(element),
        })
    }

    pub(crate) fn matrix(
        &mut self,
        payload: Cursor<'_>,
        ctx: FormatContext,
    ) -> Result<Type, DecodeError> {
        let ([shape, unknown], rest) = self.take_words::<2>(payload)?;
        let columns = (shape & 0xffff) as u16;
        let layout_code = (shape >> 16) as u16;
        let layout = MatrixLayout::from_code(layout_code).ok_or_else(|| {
            self.error(
                DecodeErrorKind::UnmappedCode {
                    field: "TPMA layout",
                    code: layout_code.into(),
                },
                payload.offset(),
            )
        })?;
        self.emit_text(format!("layout({})", layout.as_str()));
        // Row count is not encoded anywhere we know of.
        self.emit_text(format!("mat{columns}x?"));
        self.emit(Line::Hex(vec![unknown]));

        let (element, rest) = self.expect(rest, &[FourCC::TPGE], ctx, |v| match v {
            RecordValue::Type(Type::Scalar(s)) => Some(s),
            _ => None,
        })?;
        self.finish(rest)?;
        Ok(Type::Matrix {
            columns,
            layout,
            unknown,
            element,
        })
    }

    pub(crate) fn interface_block(
        &mut self,
        payload: Cursor<'_>,
        ctx: FormatContext,
    ) -> Result<Type, DecodeError> {
        let (header, rest) = self.take_words::<3>(payload)?;
        self.dump(&header);

        let layout_code = (header[0] & 0xff) as u8;
        let is_global = ((header[0] >> 8) & 0xff) as u8;
        let layout = BlockLayout::from_code(layout_code).ok_or_else(|| {
            self.error(
                DecodeErrorKind::UnmappedCode {
                    field: "TPIB layout",
                    code: layout_code.into(),
                },
                payload.offset(),
            )
        })?;
        self.emit_text(format!("layout({layout})"));
        let total_size = header[1];
        self.emit(Line::Field {
            label: "total size",
            value: total_size,
        });

        let field_count = header[2];
        let (fields, mut rest) = self.expect_run(rest, FourCC::TPSE, ctx, |v| match v {
            RecordValue::Field(field) => Some(field),
            _ => None,
        })?;
        self.check_count("TPIB fields", field_count, fields.len(), payload.offset() + 8)?;

        let name = if rest.is_empty() {
            None
        } else {
            let (name, tail) = self.expect_string(rest, ctx)?;
            rest = tail;
            Some(name)
        };
        self.finish(rest)?;

        Ok(Type::InterfaceBlock(InterfaceBlock {
            layout,
            is_global,
            total_size,
            fields,
            name,
        }))
    }

    pub(crate) fn struct_type(
        &mut self,
        payload: Cursor<'_>,
        ctx: FormatContext,
    ) -> Result<Type, DecodeError> {
        let ([total_size, field_count], rest) = self.take_words::<2>(payload)?;
        self.emit(Line::Field {
            label: "total size",
            value: total_size,
        });
        self.emit(Line::Field {
            label: "element count",
            value: field_count,
        });
        let (name, rest) = self.expect_string(rest, ctx)?;

        let records = self.decode_all(rest, &[FourCC::TPSE], ctx)?;
        self.check_count("TPST fields", field_count, records.len(), payload.offset() + 4)?;
        let fields = records
            .into_iter()
            .filter_map(|r| match r.value {
                RecordValue::Field(field) => Some(field),
                _ => None,
            })
            .collect();

        Ok(Type::Struct(StructType {
            total_size,
            field_count,
            name,
            fields,
        }))
    }

    pub(crate) fn struct_field(
        &mut self,
        payload: Cursor<'_>,
        ctx: FormatContext,
    ) -> Result<StructField, DecodeError> {
        let (name, rest) = self.expect_string(payload, ctx)?;
        let ([offset, unknown0, unknown1], rest) = self.take_words::<3>(rest)?;
        self.emit(Line::Field {
            label: "offset in struct",
            value: offset,
        });
        self.emit(Line::Hex(vec![unknown0, unknown1]));
        let (ty, rest) = self.expect_type(rest, ctx)?;
        self.finish(rest)?;
        Ok(StructField {
            name,
            offset,
            unknown: [unknown0, unknown1],
            ty,
        })
    }

    pub(crate) fn pointer(
        &mut self,
        payload: Cursor<'_>,
        ctx: FormatContext,
    ) -> Result<Type, DecodeError> {
        let (unknown, rest) = self.take_word(payload)?;
        self.dump(&[unknown]);
        let (inner, rest) = self.expect_type(rest, ctx)?;
        self.finish(rest)?;
        Ok(Type::Pointer {
            unknown,
            inner: Box::new(inner),
        })
    }

    pub(crate) fn sampler(&mut self, payload: Cursor<'_>) -> Result<Type, DecodeError> {
        let [code] = self.exact_words::<1>(payload, "TPSA word count")?;
        let name = sampler_name(code);
        match name {
            Some(name) => self.emit_text(name),
            None => {
                debug!(code, "unknown sampler code, dumping raw");
                self.dump(&[code]);
            }
        }
        Ok(Type::SamplerOrImage { code, name })
    }

    pub(crate) fn atomic_counter(&mut self, payload: Cursor<'_>) -> Result<Type, DecodeError> {
        let [offset] = self.exact_words::<1>(payload, "TPAC word count")?;
        self.emit_text(format!("layout(offset = {offset}) atomic_uint"));
        Ok(Type::AtomicCounter { offset })
    }
}
