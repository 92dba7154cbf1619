use std::io::Read;

use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use eventstream_codec::{Limits, Message, Prelude, PRELUDE_LENGTH, PRELUDE_LENGTH_WITH_CRC};
use serde::Serialize;

use crate::cmd::InspectArgs;
use crate::exit::{io_error, CliResult, DATA_INVALID, SUCCESS};
use crate::output::OutputFormat;

#[derive(Debug, Serialize)]
struct FrameReport {
    offset: usize,
    total_length: u32,
    headers_length: u32,
    payload_length: u32,
    prelude_crc: String,
    message_crc: String,
    header_count: usize,
    event_type: Option<String>,
}

#[derive(Debug, Serialize)]
struct InspectOutput {
    schema_id: &'static str,
    input: String,
    bytes: usize,
    frames: Vec<FrameReport>,
    error: Option<String>,
}

pub fn run(args: InspectArgs, format: OutputFormat) -> CliResult<i32> {
    let name = args.input.name();
    let mut data = Vec::new();
    args.input
        .open()?
        .read_to_end(&mut data)
        .map_err(|err| io_error(&format!("read {name} failed"), err))?;

    let (frames, error) = walk(&data, &args.input.limits());
    if let Some(error) = &error {
        tracing::warn!(input = %name, frames = frames.len(), %error, "stream is not well formed");
    }

    let out = InspectOutput {
        schema_id: "https://schemas.3leaps.dev/eventstream/cli/v1/stream-inspect.schema.json",
        input: name,
        bytes: data.len(),
        frames,
        error,
    };
    print_report(&out, format);

    Ok(if out.error.is_some() {
        DATA_INVALID
    } else {
        SUCCESS
    })
}

/// Walk consecutive frames until the data runs out or a frame fails validation.
fn walk(data: &[u8], limits: &Limits) -> (Vec<FrameReport>, Option<String>) {
    let mut frames = Vec::new();
    let mut offset = 0;

    while offset < data.len() {
        let rest = &data[offset..];
        let prelude = match Prelude::decode_with_limits(rest, limits) {
            Ok(prelude) => prelude,
            Err(err) => return (frames, Some(format!("frame at offset {offset}: {err}"))),
        };
        let message = match Message::decode(&prelude, rest) {
            Ok(message) => message,
            Err(err) => return (frames, Some(format!("frame at offset {offset}: {err}"))),
        };

        let total = prelude.total_length() as usize;
        frames.push(FrameReport {
            offset,
            total_length: prelude.total_length(),
            headers_length: prelude.headers_length(),
            payload_length: prelude.payload_length(),
            prelude_crc: be_hex(&rest[PRELUDE_LENGTH..PRELUDE_LENGTH_WITH_CRC]),
            message_crc: be_hex(&rest[total - 4..total]),
            header_count: message.headers().len(),
            event_type: message.event_type().map(str::to_string),
        });
        offset += total;
    }

    (frames, None)
}

fn be_hex(raw: &[u8]) -> String {
    format!("0x{}", hex::encode(raw))
}

fn print_report(out: &InspectOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json | OutputFormat::Raw => {
            println!(
                "{}",
                serde_json::to_string(out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec![
                    "OFFSET",
                    "TOTAL",
                    "HEADERS",
                    "PAYLOAD",
                    "PRELUDE CRC",
                    "MESSAGE CRC",
                    "EVENT TYPE",
                ]);
            for frame in &out.frames {
                table.add_row(vec![
                    frame.offset.to_string(),
                    frame.total_length.to_string(),
                    format!("{} ({})", frame.headers_length, frame.header_count),
                    frame.payload_length.to_string(),
                    frame.prelude_crc.clone(),
                    frame.message_crc.clone(),
                    frame.event_type.clone().unwrap_or_else(|| "-".to_string()),
                ]);
            }
            println!("{table}");
            if let Some(error) = &out.error {
                println!("error: {error}");
            }
        }
        OutputFormat::Pretty => {
            println!("{}: {} bytes, {} frames", out.input, out.bytes, out.frames.len());
            for frame in &out.frames {
                println!(
                    "  @{} total={} headers={} payload={} crc={}/{} event={}",
                    frame.offset,
                    frame.total_length,
                    frame.headers_length,
                    frame.payload_length,
                    frame.prelude_crc,
                    frame.message_crc,
                    frame.event_type.as_deref().unwrap_or("-")
                );
            }
            if let Some(error) = &out.error {
                println!("  error: {error}");
            }
        }
    }
}
