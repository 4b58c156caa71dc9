use crate::fourcc::FourCC;

/// One semantic output line.
///
/// The decoder only produces these; [`crate::report::render`] turns them into text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    /// Record boundary: tag and payload byte length.
    Record { tag: FourCC, length: u32 },
    /// One payload word, dumped verbatim.
    Word(u32),
    /// A dump of an empty payload.
    Empty,
    /// Rendered value: a GLSL-like declaration, qualifier or name.
    Text(String),
    /// Labelled number, e.g. `total size: 16`.
    Field { label: &'static str, value: u32 },
    /// Opaque words printed as hex, space separated.
    Hex(Vec<u32>),
    /// Four object-code words, printed most-significant word first.
    ObjectRow([u32; 4]),
}

/// A [`Line`] with its nesting depth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportLine {
    pub depth: usize,
    pub line: Line,
}

impl ReportLine {
    pub fn new(depth: usize, line: Line) -> Self {
        Self { depth, line }
    }
}
