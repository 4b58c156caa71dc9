//! Symbols and the per-stage common section (`CMMN`).

use tracing::debug;

use crate::binary::CompiledEntry;
use crate::context::FormatContext;
use crate::decoder::{Decoder, RecordValue};
use crate::error::DecodeError;
use crate::fourcc::FourCC;
use crate::record::Cursor;
use crate::tables::es_language_version;
use crate::types::Type;

/// Binding and location fields use this value for "not assigned".
pub const UNBOUND: u16 = 0xffff;

/// Number of `SSYM` groups in a common section.
pub const SYMBOL_GROUP_COUNT: usize = 6;

/// Splits `SYMB` word 3 into `(binding, location)`, mapping [`UNBOUND`] to `None`.
pub fn binding_location(word: u32) -> (Option<u16>, Option<u16>) {
    let assigned = |v: u16| (v != UNBOUND).then_some(v);
    let binding = (word & 0xffff) as u16;
    let location = (word >> 16) as u16;
    (assigned(binding), assigned(location))
}

/// Opaque relocation record (`RLOC`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relocation {
    pub words: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    /// Words 0..=2 after the name; meaning unknown.
    pub header: [u32; 3],
    pub binding: Option<u16>,
    pub location: Option<u16>,
    pub ty: Type,
    pub relocations: Vec<Relocation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SymbolGroup {
    pub symbols: Vec<Symbol>,
}

/// `VELA`: the shading language version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageVersion {
    pub code: u32,
    /// `None` if the code is not a known ESSL version.
    pub es_version: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommonSection {
    pub language: LanguageVersion,
    /// Always [`SYMBOL_GROUP_COUNT`] groups, in file order.
    pub groups: Vec<SymbolGroup>,
    /// Raw `UBUF` payload.
    pub uniform_buffers: Vec<u32>,
    pub entries: Vec<CompiledEntry>,
}

impl CommonSection {
    pub fn inputs(&self) -> &SymbolGroup {
        &self.groups[0]
    }

    pub fn outputs(&self) -> &SymbolGroup {
        &self.groups[1]
    }

    pub fn uniforms(&self) -> &SymbolGroup {
        &self.groups[2]
    }
}

impl Decoder {
    pub(crate) fn string(&mut self, payload: Cursor<'_>) -> String {
        let text = String::from_utf8_lossy(payload.bytes())
            .trim_matches('\0')
            .to_owned();
        self.emit_text(text.clone());
        text
    }

    pub(crate) fn language_version(
        &mut self,
        payload: Cursor<'_>,
    ) -> Result<LanguageVersion, DecodeError> {
        let [code] = self.exact_words::<1>(payload, "VELA word count")?;
        let es_version = es_language_version(code);
        match es_version {
            Some(v) => self.emit_text(format!("#version {v} es")),
            None => {
                debug!(code, "unknown language version, dumping raw");
                self.dump(&[code]);
            }
        }
        Ok(LanguageVersion { code, es_version })
    }

    pub(crate) fn symbol(
        &mut self,
        payload: Cursor<'_>,
        ctx: FormatContext,
    ) -> Result<Symbol, DecodeError> {
        let (name, rest) = self.expect_string(payload, ctx)?;
        let (header, rest) = self.take_words::<3>(rest)?;
        self.dump(&header);
        let (slots, rest) = self.take_word(rest)?;
        let (binding, location) = binding_location(slots);
        if let Some(binding) = binding {
            self.emit_text(format!("layout(binding = {binding})"));
        }
        if let Some(location) = location {
            self.emit_text(format!("layout(location = {location})"));
        }

        let (ty, rest) = self.expect_type(rest, ctx)?;
        let count_offset = rest.offset();
        let (reloc_count, rest) = self.take_word(rest)?;
        let (relocations, rest) = self.relocations(rest, ctx)?;
        self.check_count("SYMB relocations", reloc_count, relocations.len(), count_offset)?;

        let [trailer] = self.exact_words::<1>(rest, "SYMB trailing word count")?;
        self.check("SYMB trailing word", 0, trailer, rest.offset())?;

        Ok(Symbol {
            name,
            header,
            binding,
            location,
            ty,
            relocations,
        })
    }

    /// Consecutive `RLOC` records.
    pub(crate) fn relocations<'a>(
        &mut self,
        cur: Cursor<'a>,
        ctx: FormatContext,
    ) -> Result<(Vec<Relocation>, Cursor<'a>), DecodeError> {
        self.expect_run(cur, FourCC::RLOC, ctx, |v| match v {
            RecordValue::Raw(words) => Some(Relocation { words }),
            _ => None,
        })
    }

    pub(crate) fn symbol_group(
        &mut self,
        payload: Cursor<'_>,
        ctx: FormatContext,
    ) -> Result<SymbolGroup, DecodeError> {
        let (count, rest) = self.take_word(payload)?;
        let records = self.decode_all(rest, &[FourCC::SYMB], ctx)?;
        self.check_count("SSYM symbols", count, records.len(), payload.offset())?;
        let symbols = records
            .into_iter()
            .filter_map(|r| match r.value {
                RecordValue::Symbol(symbol) => Some(symbol),
                _ => None,
            })
            .collect();
        Ok(SymbolGroup { symbols })
    }

    pub(crate) fn common_section(
        &mut self,
        payload: Cursor<'_>,
        ctx: FormatContext,
    ) -> Result<CommonSection, DecodeError> {
        let (language, mut rest) = self.expect(payload, &[FourCC::VELA], ctx, |v| match v {
            RecordValue::LanguageVersion(lang) => Some(lang),
            _ => None,
        })?;

        let mut groups = Vec::with_capacity(SYMBOL_GROUP_COUNT);
        for _ in 0..SYMBOL_GROUP_COUNT {
            let (group, tail) = self.expect(rest, &[FourCC::SSYM], ctx, |v| match v {
                RecordValue::SymbolGroup(group) => Some(group),
                _ => None,
            })?;
            groups.push(group);
            rest = tail;
        }

        let (uniform_buffers, rest) = self.expect_raw(rest, FourCC::UBUF, ctx)?;

        let (entry_count, entries_cur) = self.take_word(rest)?;
        let records = self.decode_all(entries_cur, &[FourCC::EBIN], ctx)?;
        self.check_count("CMMN compiled entries", entry_count, records.len(), rest.offset())?;
        let entries = records
            .into_iter()
            .filter_map(|r| match r.value {
                RecordValue::CompiledEntry(entry) => Some(entry),
                _ => None,
            })
            .collect();

        Ok(CommonSection {
            language,
            groups,
            uniform_buffers,
            entries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DecodeErrorKind;
    use crate::line::{Line, ReportLine};
    use crate::test_utils::{common_payload, record, scalar_type, words, PayloadBuilder};

    fn symbol_record(name: &str, slots: u32, relocs: &[&[u32]], trailer: &[u32]) -> Vec<u8> {
        let mut b = PayloadBuilder::new()
            .string(name)
            .words(&[1, 2, 3, slots])
            .bytes(&scalar_type(0x0100_0401, 9))
            .word(relocs.len() as u32);
        for r in relocs {
            b = b.record(FourCC::RLOC, &words(r));
        }
        record(FourCC::SYMB, &b.words(trailer).finish())
    }

    fn texts(lines: &[ReportLine]) -> Vec<&str> {
        lines
            .iter()
            .filter_map(|l| match &l.line {
                Line::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn binding_and_location_split() {
        assert_eq!(binding_location(0x0000_ffff), (None, Some(0)));
        assert_eq!(binding_location(0xffff_ffff), (None, None));
        assert_eq!(binding_location(0xffff_0003), (Some(3), None));
        assert_eq!(binding_location(0x0002_0001), (Some(1), Some(2)));
    }

    #[test]
    fn symbol_renders_layout_and_type() {
        let bytes = symbol_record("a_position", 0x0000_ffff, &[&[7, 8]], &[0]);
        let mut dec = Decoder::new();
        let (symbol, _) = dec
            .expect(Cursor::new(&bytes), &[FourCC::SYMB], FormatContext::new(), |v| match v {
                RecordValue::Symbol(s) => Some(s),
                _ => None,
            })
            .unwrap();
        assert_eq!(symbol.name, "a_position");
        assert_eq!(symbol.header, [1, 2, 3]);
        assert_eq!(symbol.binding, None);
        assert_eq!(symbol.location, Some(0));
        assert_eq!(symbol.relocations, vec![Relocation { words: vec![7, 8] }]);
        assert_eq!(
            texts(dec.lines()),
            vec!["a_position", "layout(location = 0)", "smooth highp vec4"]
        );
    }

    #[test]
    fn unbound_symbol_has_no_layout_lines() {
        let bytes = symbol_record("u", 0xffff_ffff, &[], &[0]);
        let mut dec = Decoder::new();
        dec.decode_one(Cursor::new(&bytes), &[FourCC::SYMB], FormatContext::new())
            .unwrap();
        assert!(!texts(dec.lines()).iter().any(|t| t.starts_with("layout(")));
    }

    #[test]
    fn symbol_trailer_must_be_a_single_zero() {
        let bytes = symbol_record("u", 0xffff_ffff, &[], &[5]);
        let err = Decoder::new()
            .decode_one(Cursor::new(&bytes), &[FourCC::SYMB], FormatContext::new())
            .unwrap_err();
        assert_eq!(
            err.kind,
            DecodeErrorKind::InvariantViolation {
                field: "SYMB trailing word",
                expected: 0,
                found: 5
            }
        );

        let bytes = symbol_record("u", 0xffff_ffff, &[], &[0, 0]);
        let err = Decoder::new()
            .decode_one(Cursor::new(&bytes), &[FourCC::SYMB], FormatContext::new())
            .unwrap_err();
        assert_eq!(
            err.kind,
            DecodeErrorKind::InvariantViolation {
                field: "SYMB trailing word count",
                expected: 1,
                found: 2
            }
        );
    }

    #[test]
    fn symbol_relocation_count_must_match() {
        let mut bytes = symbol_record("u", 0xffff_ffff, &[&[1], &[2]], &[0]);
        // SYMB header, "u" STRI, four words, TYPE { TPGE }.
        let count_offset = 8 + 12 + 16 + 28;
        bytes[count_offset..count_offset + 4].copy_from_slice(&3u32.to_le_bytes());
        let err = Decoder::new()
            .decode_one(Cursor::new(&bytes), &[FourCC::SYMB], FormatContext::new())
            .unwrap_err();
        assert_eq!(
            err.kind,
            DecodeErrorKind::CountMismatch {
                what: "SYMB relocations",
                declared: 3,
                found: 2
            }
        );
        assert_eq!(err.offset, count_offset);
        assert_eq!(err.path.0, vec![FourCC::SYMB]);
    }

    #[test]
    fn symbol_group_count_must_match() {
        let payload = PayloadBuilder::new()
            .word(2)
            .bytes(&symbol_record("a", 0xffff_ffff, &[], &[0]))
            .finish();
        let bytes = record(FourCC::SSYM, &payload);
        let err = Decoder::new()
            .decode_one(Cursor::new(&bytes), &[FourCC::SSYM], FormatContext::new())
            .unwrap_err();
        assert_eq!(
            err.kind,
            DecodeErrorKind::CountMismatch {
                what: "SSYM symbols",
                declared: 2,
                found: 1
            }
        );
        assert_eq!(err.path.0, vec![FourCC::SSYM]);
    }

    #[test]
    fn language_version_falls_back_to_raw() {
        let bytes = record(FourCC::VELA, &words(&[4]));
        let mut dec = Decoder::new();
        dec.decode_one(Cursor::new(&bytes), &[FourCC::VELA], FormatContext::new())
            .unwrap();
        assert_eq!(texts(dec.lines()), vec!["#version 310 es"]);

        let bytes = record(FourCC::VELA, &words(&[3]));
        let mut dec = Decoder::new();
        let (rec, _) = dec
            .decode_one(Cursor::new(&bytes), &[FourCC::VELA], FormatContext::new())
            .unwrap();
        assert_eq!(
            rec.value,
            RecordValue::LanguageVersion(LanguageVersion {
                code: 3,
                es_version: None
            })
        );
        assert_eq!(dec.lines()[1], ReportLine::new(1, Line::Word(3)));
    }

    #[test]
    fn common_section_has_six_positional_groups() {
        let bytes = record(FourCC::CMMN, &common_payload(2, &[]));
        let mut dec = Decoder::new();
        let (rec, rest) = dec
            .decode_one(Cursor::new(&bytes), &[FourCC::CMMN], FormatContext::new())
            .unwrap();
        assert!(rest.is_empty());
        let RecordValue::Common(common) = rec.value else {
            panic!("expected common section");
        };
        assert_eq!(common.language.es_version, Some(300));
        assert_eq!(common.groups.len(), SYMBOL_GROUP_COUNT);
        assert!(common.inputs().symbols.is_empty());
        assert!(common.uniform_buffers.is_empty());
        assert!(common.entries.is_empty());
    }

    #[test]
    fn group_accessors_follow_file_order() {
        let group = |name: Option<&str>| match name {
            Some(name) => {
                let payload = PayloadBuilder::new()
                    .word(1)
                    .bytes(&symbol_record(name, 0xffff_ffff, &[], &[0]))
                    .finish();
                record(FourCC::SSYM, &payload)
            }
            None => record(FourCC::SSYM, &words(&[0])),
        };
        let mut payload = PayloadBuilder::new().record(FourCC::VELA, &words(&[2]));
        for name in [Some("a_pos"), Some("frag_color"), Some("u_mvp"), None, None, None] {
            payload = payload.bytes(&group(name));
        }
        let bytes = record(
            FourCC::CMMN,
            &payload.record(FourCC::UBUF, &[]).word(0).finish(),
        );

        let (rec, _) = Decoder::new()
            .decode_one(Cursor::new(&bytes), &[FourCC::CMMN], FormatContext::new())
            .unwrap();
        let RecordValue::Common(common) = rec.value else {
            panic!("expected common section");
        };
        assert_eq!(common.inputs().symbols[0].name, "a_pos");
        assert_eq!(common.outputs().symbols[0].name, "frag_color");
        assert_eq!(common.uniforms().symbols[0].name, "u_mvp");
    }

    #[test]
    fn common_section_entry_count_must_match() {
        let mut payload = common_payload(1, &[]);
        // Bump the declared entry count (the last word) to 1.
        let n = payload.len();
        payload[n - 4..].copy_from_slice(&1u32.to_le_bytes());
        let bytes = record(FourCC::CMMN, &payload);
        let err = Decoder::new()
            .decode_one(Cursor::new(&bytes), &[FourCC::CMMN], FormatContext::new())
            .unwrap_err();
        assert_eq!(
            err.kind,
            DecodeErrorKind::CountMismatch {
                what: "CMMN compiled entries",
                declared: 1,
                found: 0
            }
        );
        assert_eq!(err.offset, bytes.len() - 4);
    }

    #[test]
    fn common_section_requires_all_groups() {
        let payload = PayloadBuilder::new()
            .record(FourCC::VELA, &words(&[1]))
            .record(FourCC::SSYM, &words(&[0]))
            .record(FourCC::UBUF, &[])
            .word(0)
            .finish();
        let bytes = record(FourCC::CMMN, &payload);
        let err = Decoder::new()
            .decode_one(Cursor::new(&bytes), &[FourCC::CMMN], FormatContext::new())
            .unwrap_err();
        assert!(matches!(
            err.kind,
            DecodeErrorKind::UnexpectedTag { found: FourCC::UBUF, .. }
        ));
    }

    #[test]
    fn string_strips_padding() {
        let bytes = record(FourCC::STRI, b"main\0\0\0\0");
        let mut dec = Decoder::new();
        let (rec, _) = dec
            .decode_one(Cursor::new(&bytes), &[FourCC::STRI], FormatContext::new())
            .unwrap();
        assert_eq!(rec.value, RecordValue::String("main".to_owned()));
    }
}
