mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "eventstream", version, about = "Event-stream decoding CLI")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "warn", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_decode_subcommand() {
        let cli = Cli::try_parse_from([
            "eventstream",
            "decode",
            "/tmp/capture.bin",
            "--event-types",
            "Records,End",
            "--count",
            "3",
        ])
        .expect("decode args should parse");

        let Command::Decode(args) = cli.command else {
            panic!("expected decode");
        };
        assert_eq!(
            args.event_types,
            Some(vec!["Records".to_string(), "End".to_string()])
        );
        assert_eq!(args.count, Some(3));
        assert_eq!(args.chunk_size, eventstream_codec::DEFAULT_READ_CHUNK_SIZE);
    }

    #[test]
    fn decode_reads_stdin_by_default() {
        let cli = Cli::try_parse_from(["eventstream", "decode"]).expect("decode should parse");
        let Command::Decode(args) = cli.command else {
            panic!("expected decode");
        };
        assert_eq!(args.input.name(), "<stdin>");
    }

    #[test]
    fn zero_chunk_size_is_a_usage_error() {
        let cli = Cli::try_parse_from(["eventstream", "decode", "--chunk-size", "0"])
            .expect("decode should parse");
        let Command::Decode(args) = cli.command else {
            panic!("expected decode");
        };
        let err = args.reader_config().expect_err("zero chunk size");
        assert_eq!(err.code, exit::USAGE);
    }

    #[test]
    fn parses_inspect_with_limits() {
        let cli = Cli::try_parse_from([
            "eventstream",
            "inspect",
            "-",
            "--max-headers",
            "64",
            "--format",
            "pretty",
        ])
        .expect("inspect args should parse");

        assert!(matches!(cli.format, Some(OutputFormat::Pretty)));
        let Command::Inspect(args) = cli.command else {
            panic!("expected inspect");
        };
        assert_eq!(args.input.limits().max_headers_length, 64);
    }

    #[test]
    fn rejects_unknown_format() {
        let err = Cli::try_parse_from(["eventstream", "version", "--format", "yaml"])
            .expect_err("unknown format should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
    }
}
