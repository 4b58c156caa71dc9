//! Input detection and pre-decoding.

use crate::container::{
    decode_kernel_library, decode_module, decode_program_binary, Container, Report,
};
use crate::error::DecodeError;
use crate::fourcc::FourCC;

#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("unrecognized input: expected a .hex program binary dump, or data starting with MBS2 or CLCC")]
    UnrecognizedFormat,

    #[error("hex dump is not valid UTF-8")]
    InvalidText(#[from] core::str::Utf8Error),

    #[error("invalid hex dump: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// How an input file is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// Newline-separated hex text of a program binary.
    ProgramBinaryHex,
    /// Raw bytes of a standalone `MBS2` module.
    Module,
    /// Raw bytes of a `CLCC` kernel library.
    KernelLibrary,
}

impl InputFormat {
    /// The `.hex` extension wins over content sniffing.
    pub fn detect(file_name: &str, bytes: &[u8]) -> Result<Self, InputError> {
        if file_name.ends_with(".hex") {
            Ok(Self::ProgramBinaryHex)
        } else if bytes.starts_with(&FourCC::MBS2.0) {
            Ok(Self::Module)
        } else if bytes.starts_with(&FourCC::CLCC.0) {
            Ok(Self::KernelLibrary)
        } else {
            Err(InputError::UnrecognizedFormat)
        }
    }
}

/// Joins the lines of a textual hex dump and decodes them.
pub fn decode_hex_dump(text: &str) -> Result<Vec<u8>, InputError> {
    let joined: String = text.lines().map(str::trim).collect();
    Ok(hex::decode(joined)?)
}

/// Decodes `bytes` as `format`.
pub fn decode_as(format: InputFormat, bytes: &[u8]) -> Result<Report<Container>, InputError> {
    let report = match format {
        InputFormat::ProgramBinaryHex => {
            let text = core::str::from_utf8(bytes)?;
            let binary = decode_hex_dump(text)?;
            decode_program_binary(&binary)?.map(Container::ProgramBinary)
        }
        InputFormat::Module => decode_module(bytes)?.map(Container::Module),
        InputFormat::KernelLibrary => decode_kernel_library(bytes)?.map(Container::KernelLibrary),
    };
    Ok(report)
}

/// Detects the format of a file and decodes it.
pub fn decode_input(file_name: &str, bytes: &[u8]) -> Result<Report<Container>, InputError> {
    let format = InputFormat::detect(file_name, bytes)?;
    decode_as(format, bytes)
}
