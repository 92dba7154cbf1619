//! Decode a captured event stream from a file and print each message.
//!
//! Run with:
//!   cargo run --example decode-file -- capture.bin
//!
//! Without an argument a small stream is encoded in memory and decoded in
//! 7-byte chunks to show incremental feeding.

use std::fs::File;
use std::io::BufReader;

use eventstream::codec::{names, HeaderValue, Headers, Message, MessageDecoder, MessageReader};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Some(path) = std::env::args().nth(1) {
        let reader = MessageReader::new(BufReader::new(File::open(&path)?));
        for (index, message) in reader.enumerate() {
            print(index, &message?);
        }
        return Ok(());
    }

    let mut stream = Vec::new();
    for (event, body) in [("Records", "{\"n\":1}"), ("Stats", "{\"bytes\":7}"), ("End", "")] {
        let mut headers = Headers::new();
        headers.insert(names::MESSAGE_TYPE.into(), HeaderValue::from("event"));
        headers.insert(names::EVENT_TYPE.into(), HeaderValue::from(event));
        stream.extend_from_slice(&Message::new(headers, body.as_bytes().to_vec()).encode()?);
    }

    let mut decoder = MessageDecoder::new();
    let mut index = 0;
    for chunk in stream.chunks(7) {
        for message in decoder.feed(chunk)? {
            print(index, &message);
            index += 1;
        }
    }
    decoder.finish()?;

    Ok(())
}

fn print(index: usize, message: &Message) {
    println!(
        "#{index} {} ({} bytes): {}",
        message.event_type().unwrap_or("-"),
        message.payload().len(),
        String::from_utf8_lossy(message.payload())
    );
}
