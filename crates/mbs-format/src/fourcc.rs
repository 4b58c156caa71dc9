use core::fmt;

/// A four-character record tag (e.g. `MBS2`, `TYPE`, `SPDf`).
///
/// Tags are compared byte-for-byte; `SPDc` and `SPDC` are different tags.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    pub const MPB1: FourCC = FourCC(*b"MPB1");
    pub const COMP: FourCC = FourCC(*b"COMP");
    pub const VERT: FourCC = FourCC(*b"VERT");
    pub const FRAG: FourCC = FourCC(*b"FRAG");
    pub const GEOM: FourCC = FourCC(*b"GEOM");
    pub const CTRL: FourCC = FourCC(*b"CTRL");
    pub const EVAL: FourCC = FourCC(*b"EVAL");
    pub const BATT: FourCC = FourCC(*b"BATT");

    pub const MBS2: FourCC = FourCC(*b"MBS2");
    pub const VEHW: FourCC = FourCC(*b"VEHW");
    pub const CCOM: FourCC = FourCC(*b"CCOM");
    pub const CVER: FourCC = FourCC(*b"CVER");
    pub const CFRA: FourCC = FourCC(*b"CFRA");

    pub const CMMN: FourCC = FourCC(*b"CMMN");
    pub const VELA: FourCC = FourCC(*b"VELA");
    pub const SSYM: FourCC = FourCC(*b"SSYM");
    pub const SYMB: FourCC = FourCC(*b"SYMB");
    pub const STRI: FourCC = FourCC(*b"STRI");
    pub const UBUF: FourCC = FourCC(*b"UBUF");
    pub const RLOC: FourCC = FourCC(*b"RLOC");

    pub const TYPE: FourCC = FourCC(*b"TYPE");
    pub const TPGE: FourCC = FourCC(*b"TPGE");
    pub const TPAR: FourCC = FourCC(*b"TPAR");
    pub const TPMA: FourCC = FourCC(*b"TPMA");
    pub const TPIB: FourCC = FourCC(*b"TPIB");
    pub const TPST: FourCC = FourCC(*b"TPST");
    pub const TPSE: FourCC = FourCC(*b"TPSE");
    pub const TPPO: FourCC = FourCC(*b"TPPO");
    pub const TPSA: FourCC = FourCC(*b"TPSA");
    pub const TPAC: FourCC = FourCC(*b"TPAC");

    pub const EBIN: FourCC = FourCC(*b"EBIN");
    pub const FSHA: FourCC = FourCC(*b"FSHA");
    pub const BFRE: FourCC = FourCC(*b"BFRE");
    pub const SPDC: FourCC = FourCC(*b"SPDc");
    pub const SPDV: FourCC = FourCC(*b"SPDv");
    pub const SPDF: FourCC = FourCC(*b"SPDf");
    pub const OBJC: FourCC = FourCC(*b"OBJC");

    pub const KERN: FourCC = FourCC(*b"KERN");
    pub const KPAR: FourCC = FourCC(*b"KPAR");
    pub const KWGS: FourCC = FourCC(*b"KWGS");

    pub const CLCC: FourCC = FourCC(*b"CLCC");
    pub const MBSX: FourCC = FourCC(*b"MBSX");
    pub const KRNL: FourCC = FourCC(*b"KRNL");
    pub const STRT: FourCC = FourCC(*b"STRT");

    /// Returns the raw tag bytes.
    pub const fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let printable = self
            .0
            .iter()
            .copied()
            .all(|b| b.is_ascii_graphic() || b == b' ');
        if printable {
            let s = core::str::from_utf8(&self.0).unwrap_or("????");
            write!(f, "{s}")
        } else {
            write!(
                f,
                "0x{:02x}{:02x}{:02x}{:02x}",
                self.0[0], self.0[1], self.0[2], self.0[3]
            )
        }
    }
}

impl fmt::Debug for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
