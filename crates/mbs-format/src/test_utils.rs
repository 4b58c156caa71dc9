use crate::FourCC;

/// Encodes one record: tag, little-endian payload length, payload.
pub fn record(tag: FourCC, payload: &[u8]) -> Vec<u8> {
    let len = u32::try_from(payload.len()).expect("record payload does not fit in u32");
    let mut out = Vec::with_capacity(8 + payload.len());
    out.extend_from_slice(&tag.0);
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(payload);
    out
}

/// Encodes words as little-endian bytes.
pub fn words(words: &[u32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(words.len() * 4);
    for w in words {
        out.extend_from_slice(&w.to_le_bytes());
    }
    out
}

/// Encodes a `STRI` record, NUL-padded to a multiple of 4 bytes.
pub fn string(s: &str) -> Vec<u8> {
    let mut payload = s.as_bytes().to_vec();
    payload.push(0);
    while payload.len() % 4 != 0 {
        payload.push(0);
    }
    record(FourCC::STRI, &payload)
}

/// Concatenates payload pieces.
///
/// ```ignore
/// let payload = PayloadBuilder::new().word(1).record(FourCC::UBUF, &[]).finish();
/// ```
#[derive(Debug, Default, Clone)]
pub struct PayloadBuilder {
    bytes: Vec<u8>,
}

impl PayloadBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn word(mut self, w: u32) -> Self {
        self.bytes.extend_from_slice(&w.to_le_bytes());
        self
    }

    pub fn words(mut self, ws: &[u32]) -> Self {
        self.bytes.extend(words(ws));
        self
    }

    pub fn record(mut self, tag: FourCC, payload: &[u8]) -> Self {
        self.bytes.extend(record(tag, payload));
        self
    }

    pub fn string(mut self, s: &str) -> Self {
        self.bytes.extend(string(s));
        self
    }

    pub fn bytes(mut self, b: &[u8]) -> Self {
        self.bytes.extend_from_slice(b);
        self
    }

    pub fn finish(self) -> Vec<u8> {
        self.bytes
    }
}

/// `TYPE { TPGE }` with the current-revision three-word scalar payload.
pub fn scalar_type(word0: u32, qualifier: u32) -> Vec<u8> {
    record(
        FourCC::TYPE,
        &record(FourCC::TPGE, &words(&[word0, 0, qualifier])),
    )
}

/// A `CMMN` payload with the given language code, six empty symbol groups, an
/// empty `UBUF` and the given compiled entries.
pub fn common_payload(language: u32, entries: &[Vec<u8>]) -> Vec<u8> {
    let mut b = PayloadBuilder::new().record(FourCC::VELA, &words(&[language]));
    for _ in 0..6 {
        b = b.record(FourCC::SSYM, &words(&[0]));
    }
    b = b
        .record(FourCC::UBUF, &[])
        .word(u32::try_from(entries.len()).expect("too many entries"));
    for entry in entries {
        b = b.bytes(entry);
    }
    b.finish()
}

/// An `MBS2` record for a non-compute stage section (`CVER` or `CFRA`).
pub fn module(version: u32, section: FourCC, common: &[u8]) -> Vec<u8> {
    let payload = PayloadBuilder::new()
        .word(version)
        .record(FourCC::VEHW, &words(&[11, 0, 0]))
        .record(section, &record(FourCC::CMMN, common))
        .finish();
    record(FourCC::MBS2, &payload)
}
