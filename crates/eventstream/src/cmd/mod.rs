use clap::{Args, Subcommand};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::PathBuf;

use eventstream_codec::{
    DecoderConfig, Limits, ReaderConfig, DEFAULT_INITIAL_BUFFER_CAPACITY, DEFAULT_READ_CHUNK_SIZE,
    MAX_HEADERS_LENGTH, MAX_PAYLOAD_LENGTH,
};

use crate::exit::{io_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod decode;
pub mod inspect;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Decode a captured event stream and print each message.
    Decode(DecodeArgs),
    /// Walk the frames of a captured event stream and print their preludes and checksums.
    Inspect(InspectArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Decode(args) => decode::run(args, format),
        Command::Inspect(args) => inspect::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Where the stream bytes come from and which bounds apply to them.
#[derive(Args, Debug)]
pub struct InputArgs {
    /// File holding the raw stream. Reads stdin when omitted or `-`.
    pub input: Option<PathBuf>,
    /// Maximum header region length accepted in a prelude.
    #[arg(long, default_value_t = MAX_HEADERS_LENGTH, env = "EVENTSTREAM_MAX_HEADERS")]
    pub max_headers: u32,
    /// Maximum payload length accepted in a prelude.
    #[arg(long, default_value_t = MAX_PAYLOAD_LENGTH, env = "EVENTSTREAM_MAX_PAYLOAD")]
    pub max_payload: u32,
}

impl InputArgs {
    pub fn limits(&self) -> Limits {
        Limits {
            max_headers_length: self.max_headers,
            max_payload_length: self.max_payload,
        }
    }

    pub fn open(&self) -> CliResult<Box<dyn Read>> {
        match &self.input {
            Some(path) if path.as_os_str() != "-" => {
                let file = File::open(path)
                    .map_err(|err| io_error(&format!("open {} failed", path.display()), err))?;
                Ok(Box::new(BufReader::new(file)))
            }
            _ => Ok(Box::new(std::io::stdin().lock())),
        }
    }

    /// Display name of the input for diagnostics.
    pub fn name(&self) -> String {
        match &self.input {
            Some(path) if path.as_os_str() != "-" => path.display().to_string(),
            _ => "<stdin>".to_string(),
        }
    }
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Only print messages whose `:event-type` header matches (comma-separated).
    #[arg(long, value_delimiter = ',')]
    pub event_types: Option<Vec<String>>,
    /// Exit after printing N messages.
    #[arg(long)]
    pub count: Option<usize>,
    /// Bytes requested from the input per read.
    #[arg(long, default_value_t = DEFAULT_READ_CHUNK_SIZE)]
    pub chunk_size: usize,
    /// Initial capacity of the decoder's frame buffer.
    #[arg(long, default_value_t = DEFAULT_INITIAL_BUFFER_CAPACITY)]
    pub initial_buffer: usize,
}

impl DecodeArgs {
    pub fn reader_config(&self) -> CliResult<ReaderConfig> {
        if self.chunk_size == 0 {
            return Err(CliError::new(USAGE, "--chunk-size must be at least 1"));
        }
        Ok(ReaderConfig {
            decoder: DecoderConfig {
                initial_buffer_capacity: self.initial_buffer,
                limits: self.input.limits(),
            },
            read_chunk_size: self.chunk_size,
        })
    }
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    #[command(flatten)]
    pub input: InputArgs,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
