//! Server-Sent Events framing for streamed synthesis responses.

use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt};

use super::SynthesisError;

/// Splits a chunked byte stream into SSE `data:` payloads.
///
/// Comments, empty lines, `event:`/`id:` fields and `[DONE]` markers are
/// dropped. A transport error is yielded once and ends the stream.
pub fn data_lines<S, E>(byte_stream: S) -> impl Stream<Item = Result<String, SynthesisError>> + Send
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Into<SynthesisError> + Send + 'static,
{
    futures::stream::unfold(
        (Box::pin(byte_stream), BytesMut::with_capacity(8192), false),
        |(mut stream, mut buffer, done)| async move {
            if done {
                return None;
            }

            loop {
                if let Some(newline) = buffer.iter().position(|&b| b == b'\n') {
                    let mut line = buffer.split_to(newline + 1);
                    line.truncate(line.len() - 1);
                    if line.last() == Some(&b'\r') {
                        line.truncate(line.len() - 1);
                    }

                    let Ok(line) = std::str::from_utf8(&line) else {
                        tracing::warn!("skipping non UTF-8 SSE line");
                        continue;
                    };
                    if let Some(data) = extract_data(line) {
                        return Some((Ok(data), (stream, buffer, false)));
                    }
                    continue;
                }

                match stream.next().await {
                    Some(Ok(chunk)) => buffer.extend_from_slice(&chunk),
                    Some(Err(err)) => return Some((Err(err.into()), (stream, buffer, true))),
                    None => {
                        if buffer.is_empty() {
                            return None;
                        }
                        let rest = std::mem::take(&mut buffer);
                        let data = std::str::from_utf8(&rest)
                            .ok()
                            .and_then(|line| extract_data(line.trim()));
                        return data.map(|data| (Ok(data), (stream, buffer, true)));
                    }
                }
            }
        },
    )
}

fn extract_data(line: &str) -> Option<String> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with(':') {
        return None;
    }

    let data = trimmed.strip_prefix("data:")?.trim_start();
    if data.is_empty() || data == "[DONE]" {
        return None;
    }
    Some(data.to_string())
}
