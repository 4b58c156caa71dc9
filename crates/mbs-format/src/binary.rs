//! Compiled entries (`EBIN`) and their parts.

use tracing::debug;

use crate::context::FormatContext;
use crate::decoder::{Decoder, RecordValue};
use crate::error::{DecodeError, DecodeErrorKind};
use crate::fourcc::FourCC;
use crate::line::Line;
use crate::record::Cursor;
use crate::symbol::Relocation;

/// Word between the relocations and `FSHA`.
const RELOCATION_SENTINEL: u32 = 0xffff_ffff;

/// Usual value of `EBIN` word 1.
const EXPECTED_ENTRY_WORD1: u32 = 0xffff_ffff;

/// Stage scheduling descriptor (`SPDc`/`SPDv`/`SPDf`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageSchedule {
    Compute(u32),
    Vertex(u32),
    Fragment([u32; 2]),
}

/// `BFRE`: buffer reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferReservation {
    /// Only present in module version 18.
    pub leading: Option<u32>,
    pub schedule: StageSchedule,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledEntry {
    /// Words 0..=3. Word 2 is the relocation count.
    pub header: [u32; 4],
    pub relocations: Vec<Relocation>,
    /// `FSHA` words.
    pub format_header: [u32; 6],
    /// Only present in module version 13.
    pub debug_name: Option<String>,
    pub reservation: BufferReservation,
    /// `OBJC` words.
    pub object: Vec<u32>,
}

impl Decoder {
    pub(crate) fn compiled_entry(
        &mut self,
        payload: Cursor<'_>,
        ctx: FormatContext,
    ) -> Result<CompiledEntry, DecodeError> {
        let (header, rest) = self.take_words::<4>(payload)?;
        self.dump(&header);
        self.check("EBIN word 0", 0, header[0], payload.offset())?;
        if header[1] != EXPECTED_ENTRY_WORD1 {
            debug!(word1 = header[1], "EBIN word 1 differs from the usual value");
        }
        self.check("EBIN word 3", 0, header[3], payload.offset() + 12)?;

        let (relocations, rest) = self.relocations(rest, ctx)?;
        self.check_count("EBIN relocations", header[2], relocations.len(), payload.offset() + 8)?;

        let (sentinel, rest) = self.take_word(rest)?;
        self.check(
            "EBIN relocation sentinel",
            RELOCATION_SENTINEL,
            sentinel,
            rest.offset() - 4,
        )?;

        let (format_header, mut rest) = self.expect(rest, &[FourCC::FSHA], ctx, |v| match v {
            RecordValue::FormatHeader(words) => Some(words),
            _ => None,
        })?;

        let debug_name = if ctx.has_debug_name() {
            let (name, tail) = self.expect_string(rest, ctx)?;
            rest = tail;
            Some(name)
        } else {
            None
        };

        let (reservation, rest) = self.expect(rest, &[FourCC::BFRE], ctx, |v| match v {
            RecordValue::BufferReservation(r) => Some(r),
            _ => None,
        })?;
        let (object, rest) = self.expect(rest, &[FourCC::OBJC], ctx, |v| match v {
            RecordValue::Object(words) => Some(words),
            _ => None,
        })?;
        self.finish(rest)?;

        Ok(CompiledEntry {
            header,
            relocations,
            format_header,
            debug_name,
            reservation,
            object,
        })
    }

    pub(crate) fn format_header(&mut self, payload: Cursor<'_>) -> Result<[u32; 6], DecodeError> {
        let words = self.all_words(payload)?;
        self.dump(&words);
        let words: [u32; 6] = words.try_into().map_err(|w: Vec<u32>| {
            self.error(
                DecodeErrorKind::InvariantViolation {
                    field: "FSHA word count",
                    expected: 6,
                    found: w.len() as u32,
                },
                payload.offset(),
            )
        })?;
        self.check("FSHA word 0", 0, words[0], payload.offset())?;
        self.check("FSHA word 1", 0, words[1], payload.offset() + 4)?;
        Ok(words)
    }

    pub(crate) fn buffer_reservation(
        &mut self,
        payload: Cursor<'_>,
        ctx: FormatContext,
    ) -> Result<BufferReservation, DecodeError> {
        let (leading, rest) = if ctx.has_reservation_prefix() {
            let (word, rest) = self.take_word(payload)?;
            self.dump(&[word]);
            (Some(word), rest)
        } else {
            (None, payload)
        };

        let (schedule, rest) = self.expect(
            rest,
            &[FourCC::SPDC, FourCC::SPDV, FourCC::SPDF],
            ctx,
            |v| match v {
                RecordValue::Schedule(s) => Some(s),
                _ => None,
            },
        )?;
        self.finish(rest)?;
        Ok(BufferReservation { leading, schedule })
    }

    pub(crate) fn schedule(
        &mut self,
        tag: FourCC,
        payload: Cursor<'_>,
    ) -> Result<StageSchedule, DecodeError> {
        let words = self.all_words(payload)?;
        self.dump(&words);
        let (expected, field) = match tag {
            FourCC::SPDF => (2, "SPDf word count"),
            FourCC::SPDV => (1, "SPDv word count"),
            _ => (1, "SPDc word count"),
        };
        if words.len() != expected {
            return Err(self.error(
                DecodeErrorKind::InvariantViolation {
                    field,
                    expected: expected as u32,
                    found: words.len() as u32,
                },
                payload.offset(),
            ));
        }
        Ok(match tag {
            FourCC::SPDF => StageSchedule::Fragment([words[0], words[1]]),
            FourCC::SPDV => StageSchedule::Vertex(words[0]),
            _ => StageSchedule::Compute(words[0]),
        })
    }

    pub(crate) fn object_code(&mut self, payload: Cursor<'_>) -> Result<Vec<u32>, DecodeError> {
        let words = self.all_words(payload)?;
        if words.len() % 4 != 0 {
            return Err(self.error(
                DecodeErrorKind::MisalignedLength {
                    tag: FourCC::OBJC,
                    length: payload.len() as u32,
                },
                payload.offset(),
            ));
        }
        for row in words.chunks_exact(4) {
            self.emit(Line::ObjectRow([row[0], row[1], row[2], row[3]]));
        }
        Ok(words)
    }
}
