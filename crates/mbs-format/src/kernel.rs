//! Compute kernel descriptors (`KERN`, `KPAR`, `KWGS`).

use crate::context::FormatContext;
use crate::decoder::{Decoder, RecordValue};
use crate::error::DecodeError;
use crate::fourcc::FourCC;
use crate::record::Cursor;

/// Value of the single word that ends every `KPAR`.
const KERNEL_PARAM_MARKER: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelParam {
    /// The two `STRI` records, in file order.
    pub names: [String; 2],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Kernel {
    pub name: String,
    pub params: Vec<KernelParam>,
    /// Two words after the parameters; always zero so far.
    pub reserved: [u32; 2],
    /// `local_size_{x,y,z}`.
    pub work_group_size: Option<[u32; 3]>,
}

impl Decoder {
    pub(crate) fn kernel(
        &mut self,
        payload: Cursor<'_>,
        ctx: FormatContext,
    ) -> Result<Kernel, DecodeError> {
        let (name, rest) = self.expect_string(payload, ctx)?;
        let count_offset = rest.offset();
        let (param_count, rest) = self.take_word(rest)?;

        let (params, rest) = self.expect_run(rest, FourCC::KPAR, ctx, |v| match v {
            RecordValue::KernelParam(p) => Some(p),
            _ => None,
        })?;
        self.check_count("KERN params", param_count, params.len(), count_offset)?;

        let (reserved, rest) = self.take_words::<2>(rest)?;
        self.dump(&reserved);
        self.check("KERN reserved word 0", 0, reserved[0], rest.offset() - 8)?;
        self.check("KERN reserved word 1", 0, reserved[1], rest.offset() - 4)?;

        // Only seen on kernels without parameters. The real condition is unknown.
        let (work_group_size, rest) = if param_count == 0 {
            let (size, tail) = self.expect(rest, &[FourCC::KWGS], ctx, |v| match v {
                RecordValue::WorkGroupSize(size) => Some(size),
                _ => None,
            })?;
            (Some(size), tail)
        } else {
            (None, rest)
        };
        self.finish(rest)?;

        Ok(Kernel {
            name,
            params,
            reserved,
            work_group_size,
        })
    }

    pub(crate) fn kernel_param(
        &mut self,
        payload: Cursor<'_>,
        ctx: FormatContext,
    ) -> Result<KernelParam, DecodeError> {
        let (first, rest) = self.expect_string(payload, ctx)?;
        let (second, rest) = self.expect_string(rest, ctx)?;
        let [marker] = self.exact_words::<1>(rest, "KPAR trailing word count")?;
        self.check("KPAR trailing word", KERNEL_PARAM_MARKER, marker, rest.offset())?;
        Ok(KernelParam {
            names: [first, second],
        })
    }

    pub(crate) fn work_group_size(&mut self, payload: Cursor<'_>) -> Result<[u32; 3], DecodeError> {
        let [x, y, z] = self.exact_words::<3>(payload, "KWGS word count")?;
        self.emit_text(format!("layout(local_size_x = {x},"));
        self.emit_text(format!("       local_size_y = {y},"));
        self.emit_text(format!("       local_size_z = {z}) in;"));
        Ok([x, y, z])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DecodeErrorKind;
    use crate::line::Line;
    use crate::test_utils::{record, words, PayloadBuilder};

    fn kpar(a: &str, b: &str, marker: u32) -> Vec<u8> {
        let payload = PayloadBuilder::new().string(a).string(b).word(marker).finish();
        record(FourCC::KPAR, &payload)
    }

    fn decode_kernel(bytes: &[u8]) -> Result<(Kernel, Decoder), DecodeError> {
        let mut dec = Decoder::new();
        let (kernel, rest) =
            dec.expect(Cursor::new(bytes), &[FourCC::KERN], FormatContext::new(), |v| match v {
                RecordValue::Kernel(k) => Some(k),
                _ => None,
            })?;
        assert!(rest.is_empty());
        Ok((kernel, dec))
    }

    #[test]
    fn kernel_without_params_has_work_group_size() {
        let payload = PayloadBuilder::new()
            .string("fill")
            .word(0)
            .words(&[0, 0])
            .record(FourCC::KWGS, &words(&[64, 1, 1]))
            .finish();
        let (kernel, dec) = decode_kernel(&record(FourCC::KERN, &payload)).unwrap();
        assert_eq!(kernel.name, "fill");
        assert_eq!(kernel.work_group_size, Some([64, 1, 1]));
        let texts: Vec<_> = dec
            .lines()
            .iter()
            .filter_map(|l| match &l.line {
                Line::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(
            texts,
            vec![
                "fill",
                "layout(local_size_x = 64,",
                "       local_size_y = 1,",
                "       local_size_z = 1) in;",
            ]
        );
    }

    /// Known uncertainty: `KWGS` is only read when the kernel has no parameters.
    /// Kernels with parameters that also carry a `KWGS` are rejected as trailing data.
    #[test]
    fn work_group_size_is_tied_to_zero_params() {
        let with_params = PayloadBuilder::new()
            .string("copy")
            .word(2)
            .bytes(&kpar("dst", "global int*", 1))
            .bytes(&kpar("src", "global int*", 1))
            .words(&[0, 0])
            .finish();
        let (kernel, _) = decode_kernel(&record(FourCC::KERN, &with_params)).unwrap();
        assert_eq!(kernel.params.len(), 2);
        assert_eq!(kernel.params[1].names, ["src".to_owned(), "global int*".to_owned()]);
        assert_eq!(kernel.work_group_size, None);

        let mut with_both = with_params;
        with_both.extend(record(FourCC::KWGS, &words(&[8, 8, 1])));
        let err = decode_kernel(&record(FourCC::KERN, &with_both)).unwrap_err();
        assert_eq!(err.kind, DecodeErrorKind::TrailingData { remaining: 20 });

        let missing = PayloadBuilder::new().string("fill").word(0).words(&[0, 0]).finish();
        let err = decode_kernel(&record(FourCC::KERN, &missing)).unwrap_err();
        assert!(matches!(err.kind, DecodeErrorKind::TruncatedInput { .. }));
    }

    #[test]
    fn kernel_param_marker_must_be_one() {
        let payload = PayloadBuilder::new()
            .string("k")
            .word(1)
            .bytes(&kpar("a", "int", 2))
            .words(&[0, 0])
            .finish();
        let err = decode_kernel(&record(FourCC::KERN, &payload)).unwrap_err();
        assert_eq!(
            err.kind,
            DecodeErrorKind::InvariantViolation {
                field: "KPAR trailing word",
                expected: 1,
                found: 2
            }
        );
        assert_eq!(err.path.0, vec![FourCC::KERN, FourCC::KPAR]);
    }

    #[test]
    fn kernel_reserved_words_must_be_zero() {
        let payload = PayloadBuilder::new()
            .string("k")
            .word(0)
            .words(&[0, 7])
            .record(FourCC::KWGS, &words(&[1, 1, 1]))
            .finish();
        let err = decode_kernel(&record(FourCC::KERN, &payload)).unwrap_err();
        assert_eq!(
            err.kind,
            DecodeErrorKind::InvariantViolation {
                field: "KERN reserved word 1",
                expected: 0,
                found: 7
            }
        );
    }

    #[test]
    fn param_count_mismatch() {
        let payload = PayloadBuilder::new()
            .string("k")
            .word(2)
            .bytes(&kpar("a", "int", 1))
            .words(&[0, 0])
            .finish();
        let bytes = record(FourCC::KERN, &payload);
        let err = decode_kernel(&bytes).unwrap_err();
        assert_eq!(
            err.kind,
            DecodeErrorKind::CountMismatch {
                what: "KERN params",
                declared: 2,
                found: 1
            }
        );
        assert_eq!(err.path.0, vec![FourCC::KERN]);
        // KERN header, then the "k" STRI record.
        assert_eq!(err.offset, 8 + 12);

        let payload = PayloadBuilder::new()
            .string("k")
            .word(1)
            .bytes(&kpar("a", "int", 1))
            .bytes(&kpar("b", "int", 1))
            .words(&[0, 0])
            .finish();
        let err = decode_kernel(&record(FourCC::KERN, &payload)).unwrap_err();
        assert_eq!(
            err.kind,
            DecodeErrorKind::CountMismatch {
                what: "KERN params",
                declared: 1,
                found: 2
            }
        );
    }
}
