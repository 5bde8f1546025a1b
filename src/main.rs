//! Reference embedder for the `um32` core: a thin command-line wrapper that picks
//! the program image and host byte streams and otherwise stays out of the way. The
//! interpreter itself has no notion of files, flags, or exit codes — all of that
//! lives here, per the core's explicit scope boundary.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{error, info};
use thiserror::Error;

use um32::{load_program, Machine, UmError};

/// Run a Universal Machine program image.
#[derive(Parser, Debug)]
#[command(name = "um32", version, about)]
struct Args {
    /// Path to the program image (a flat file of big-endian 32-bit words).
    image: PathBuf,

    /// Read opcode 11 input from this file instead of standard input.
    #[arg(long)]
    input: Option<PathBuf>,

    /// Write opcode 10 output to this file instead of standard output.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Pre-reserve this many array-table slots up front, for programs that
    /// allocate heavily. Purely a performance hint; has no effect on behavior.
    #[arg(long, default_value_t = 0)]
    array_pool_hint: usize,
}

#[derive(Debug, Error)]
enum EmbedderError {
    #[error("failed to open image {path}: {source}")]
    OpenImage { path: PathBuf, source: io::Error },

    #[error("failed to open input {path}: {source}")]
    OpenInput { path: PathBuf, source: io::Error },

    #[error("failed to open output {path}: {source}")]
    OpenOutput { path: PathBuf, source: io::Error },

    #[error(transparent)]
    Machine(#[from] UmError),
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            eprintln!("um32: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), EmbedderError> {
    let image = File::open(&args.image).map_err(|source| EmbedderError::OpenImage {
        path: args.image.clone(),
        source,
    })?;
    let program = load_program(image, 0)?;
    info!("loaded {} word program from {}", program.len(), args.image.display());

    let input: Box<dyn Read> = match &args.input {
        Some(path) => Box::new(File::open(path).map_err(|source| EmbedderError::OpenInput {
            path: path.clone(),
            source,
        })?),
        None => Box::new(io::stdin()),
    };

    let output: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(File::create(path).map_err(|source| EmbedderError::OpenOutput {
            path: path.clone(),
            source,
        })?),
        None => Box::new(io::stdout()),
    };

    let mut machine = if args.array_pool_hint > 0 {
        Machine::with_array_capacity_hint(program, input, output, args.array_pool_hint)
    } else {
        Machine::new(program, input, output)
    };

    machine.run()?;
    Ok(())
}
