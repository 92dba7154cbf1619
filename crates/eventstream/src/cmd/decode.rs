use eventstream_codec::{Message, MessageReader};

use crate::cmd::DecodeArgs;
use crate::exit::{codec_error, CliResult, SUCCESS};
use crate::output::{print_message, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let config = args.reader_config()?;
    let name = args.input.name();
    let mut reader = MessageReader::with_config(args.input.open()?, config);

    let mut decoded = 0usize;
    let mut printed = 0usize;

    while let Some(message) = reader
        .read_message()
        .map_err(|err| codec_error(&format!("decode {name} failed"), err))?
    {
        decoded += 1;

        if !wanted(&message, args.event_types.as_deref()) {
            continue;
        }

        print_message(&message, decoded - 1, format);
        printed = printed.saturating_add(1);

        if let Some(count) = args.count {
            if printed >= count {
                break;
            }
        }
    }

    tracing::info!(input = %name, decoded, printed, "event stream decoded");
    Ok(SUCCESS)
}

fn wanted(message: &Message, event_types: Option<&[String]>) -> bool {
    match event_types {
        None => true,
        Some(wanted) => message
            .event_type()
            .is_some_and(|event| wanted.iter().any(|w| w == event)),
    }
}

#[cfg(test)]
mod tests {
    use eventstream_codec::{names, HeaderValue, Headers};

    use super::*;

    fn event(name: &str) -> Message {
        let mut headers = Headers::new();
        headers.insert(names::EVENT_TYPE.into(), HeaderValue::from(name));
        Message::new(headers, Vec::<u8>::new())
    }

    #[test]
    fn no_filter_keeps_everything() {
        assert!(wanted(&event("Records"), None));
        assert!(wanted(&Message::default(), None));
    }

    #[test]
    fn filter_matches_event_type() {
        let filter = vec!["Records".to_string(), "End".to_string()];
        assert!(wanted(&event("Records"), Some(&filter)));
        assert!(!wanted(&event("Stats"), Some(&filter)));
        assert!(!wanted(&Message::default(), Some(&filter)));
    }
}
