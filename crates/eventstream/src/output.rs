use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use eventstream_codec::{HeaderValue, Message};
use serde::Serialize;
use serde_json::Value;

const PREVIEW_LIMIT: usize = 64;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct HeaderOutput<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    value_type: &'static str,
    value: Value,
}

#[derive(Serialize)]
struct MessageOutput<'a> {
    schema_id: &'a str,
    index: usize,
    message_type: Option<&'a str>,
    event_type: Option<&'a str>,
    headers: Vec<HeaderOutput<'a>>,
    payload_size: usize,
    payload_encoding: &'static str,
    payload: String,
}

pub fn print_message(message: &Message, index: usize, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let (payload_encoding, payload) = payload_text(message.payload());
            let out = MessageOutput {
                schema_id: "https://schemas.3leaps.dev/eventstream/cli/v1/message-decoded.schema.json",
                index,
                message_type: message.message_type(),
                event_type: message.event_type(),
                headers: message
                    .headers()
                    .iter()
                    .map(|(name, value)| HeaderOutput {
                        name,
                        value_type: value.header_type().name(),
                        value: header_json(value),
                    })
                    .collect(),
                payload_size: message.payload().len(),
                payload_encoding,
                payload,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["#", "HEADER", "TYPE", "VALUE"]);
            for (name, value) in message.headers() {
                table.add_row(vec![
                    index.to_string(),
                    name.clone(),
                    value.header_type().name().to_string(),
                    value.to_string(),
                ]);
            }
            table.add_row(vec![
                index.to_string(),
                "<payload>".to_string(),
                format!("{} bytes", message.payload().len()),
                payload_preview(message.payload()),
            ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            let headers: Vec<String> = message
                .headers()
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect();
            println!(
                "#{} headers=[{}] size={} payload={}",
                index,
                headers.join(", "),
                message.payload().len(),
                payload_preview(message.payload())
            );
        }
        OutputFormat::Raw => {
            print_raw(message.payload());
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

pub fn header_json(value: &HeaderValue) -> Value {
    match value {
        HeaderValue::Bool(v) => Value::from(*v),
        HeaderValue::Byte(v) => Value::from(*v),
        HeaderValue::Short(v) => Value::from(*v),
        HeaderValue::Integer(v) => Value::from(*v),
        HeaderValue::Long(v) => Value::from(*v),
        HeaderValue::ByteArray(raw) => Value::from(hex::encode(raw)),
        HeaderValue::String(v) => Value::from(v.as_str()),
        HeaderValue::Timestamp(_) | HeaderValue::Uuid(_) => Value::from(value.to_string()),
    }
}

/// Full payload as UTF-8 text, or hex when it is binary.
fn payload_text(payload: &[u8]) -> (&'static str, String) {
    match std::str::from_utf8(payload) {
        Ok(text) => ("utf8", text.to_string()),
        Err(_) => ("hex", hex::encode(payload)),
    }
}

pub fn payload_preview(payload: &[u8]) -> String {
    match std::str::from_utf8(payload) {
        Ok(text) if text.chars().count() <= PREVIEW_LIMIT => text.to_string(),
        Ok(text) => {
            let head: String = text.chars().take(PREVIEW_LIMIT).collect();
            format!("{head}…")
        }
        Err(_) if payload.len() <= PREVIEW_LIMIT / 2 => {
            format!("<binary {} bytes: {}>", payload.len(), hex::encode(payload))
        }
        Err(_) => format!(
            "<binary {} bytes: {}…>",
            payload.len(),
            hex::encode(&payload[..PREVIEW_LIMIT / 2])
        ),
    }
}
