use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::builder::RangedU64ValueParser;
use clap::{Parser, ValueEnum};
use mbs_format::input::{decode_as, decode_input, InputFormat};
use mbs_format::report::{render_with, RenderOptions, MAX_INDENT};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    /// Detect from the file name and magic bytes
    Auto,
    /// Hex text dump of an MPB1 program binary
    Hex,
    /// Raw MBS2 module
    Module,
    /// Raw CLCC kernel library
    Library,
}

impl FormatArg {
    fn input_format(self) -> Option<InputFormat> {
        match self {
            Self::Auto => None,
            Self::Hex => Some(InputFormat::ProgramBinaryHex),
            Self::Module => Some(InputFormat::Module),
            Self::Library => Some(InputFormat::KernelLibrary),
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "mbs-dump",
    about = "Dump MBS shader containers (program binaries, modules, kernel libraries) as annotated text."
)]
struct Args {
    /// Input file (`.hex` program binary dump, or raw MBS2/CLCC data)
    input: PathBuf,

    /// Input format (overrides detection)
    #[arg(long, value_enum, default_value_t = FormatArg::Auto)]
    format: FormatArg,

    /// Spaces per nesting level
    #[arg(
        long,
        value_name = "N",
        default_value_t = RenderOptions::default().indent,
        value_parser = RangedU64ValueParser::<usize>::new().range(0..=MAX_INDENT as u64)
    )]
    indent: usize,

    /// Write the report to this path instead of stdout
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    run(Args::parse())
}

fn run(args: Args) -> anyhow::Result<()> {
    let bytes =
        fs::read(&args.input).with_context(|| format!("read input {}", args.input.display()))?;
    let file_name = args
        .input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    tracing::info!(path = %args.input.display(), len = bytes.len(), format = ?args.format, "decoding");
    let report = match args.format.input_format() {
        Some(format) => decode_as(format, &bytes),
        None => decode_input(&file_name, &bytes),
    }
    .with_context(|| format!("decode {}", args.input.display()))?;

    let text = render_with(
        &report.lines,
        &RenderOptions {
            indent: args.indent,
        },
    );

    match &args.output {
        Some(path) => {
            fs::write(path, text).with_context(|| format!("write report {}", path.display()))?
        }
        None => io::stdout()
            .lock()
            .write_all(text.as_bytes())
            .context("write report to stdout")?,
    }
    Ok(())
}
