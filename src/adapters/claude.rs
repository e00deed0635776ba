use crate::events::Event;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

use super::DecodeError;

/// Decodes the line-delimited `stream-json` output of the Claude CLI.
///
/// Whole `assistant` messages decode without state. Incremental
/// `content_block_delta` records are buffered and released one complete
/// sentence at a time, so a decoder instance belongs to exactly one stream.
#[derive(Debug, Default)]
pub struct StreamDecoder {
    text_buffer: String,
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decode_line(&mut self, line: &str) -> Result<Vec<Event>, DecodeError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Vec::new());
        }

        let value: Value = serde_json::from_str(line)?;
        if !value.is_object() {
            return Err(DecodeError::NotAnObject);
        }

        Ok(self.decode_record(&value))
    }

    /// Flushes any partial sentence still buffered at end of stream.
    pub fn finish(&mut self) -> Vec<Event> {
        self.flush_remaining().into_iter().collect()
    }

    fn decode_record(&mut self, value: &Value) -> Vec<Event> {
        let record_type = value.get("type").and_then(|v| v.as_str()).unwrap_or("");

        match record_type {
            "assistant" => assistant_events(value),
            "user" => tool_result_events(value),
            "result" => vec![completion_event(value)],
            "error" => vec![error_event(value)],
            "stream_event" => match value.get("event") {
                Some(inner) => self.decode_record(inner),
                None => Vec::new(),
            },
            "content_block_start" => {
                let block = value.get("content_block").unwrap_or(&Value::Null);
                match block_type(block) {
                    "tool_use" => vec![tool_use_event(block)],
                    _ => Vec::new(),
                }
            }
            "content_block_delta" => {
                let delta = value.get("delta").unwrap_or(&Value::Null);
                if block_type(delta) == "text_delta" {
                    if let Some(text) = delta.get("text").and_then(|v| v.as_str()) {
                        self.text_buffer.push_str(text);
                    }
                    self.drain_sentences()
                } else {
                    Vec::new()
                }
            }
            "content_block_stop" => self.flush_remaining().into_iter().collect(),
            _ => Vec::new(),
        }
    }

    fn drain_sentences(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        while let Some(end) = sentence_end().find(&self.text_buffer).map(|m| m.end()) {
            let rest = self.text_buffer.split_off(end);
            let sentence = std::mem::replace(&mut self.text_buffer, rest);
            let sentence = sentence.trim();
            if !sentence.is_empty() {
                events.push(Event::text(sentence));
            }
        }
        events
    }

    fn flush_remaining(&mut self) -> Option<Event> {
        let text = std::mem::take(&mut self.text_buffer);
        let text = text.trim();
        if text.is_empty() {
            None
        } else {
            Some(Event::text(text))
        }
    }
}

/// Decodes a single self-contained record without incremental state.
pub fn parse_event(line: &str) -> Result<Vec<Event>, DecodeError> {
    StreamDecoder::new().decode_line(line)
}

fn sentence_end() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[.!?]\s+").expect("static sentence regex"))
}

fn block_type(value: &Value) -> &str {
    value.get("type").and_then(|v| v.as_str()).unwrap_or("")
}

fn content_blocks(value: &Value) -> &[Value] {
    value
        .pointer("/message/content")
        .and_then(|v| v.as_array())
        .map(|v| v.as_slice())
        .unwrap_or(&[])
}

fn assistant_events(value: &Value) -> Vec<Event> {
    content_blocks(value)
        .iter()
        .filter_map(|block| match block_type(block) {
            "text" => {
                let text = block.get("text").and_then(|v| v.as_str())?.trim();
                if text.is_empty() {
                    None
                } else {
                    Some(Event::text(text))
                }
            }
            "tool_use" => Some(tool_use_event(block)),
            _ => None,
        })
        .collect()
}

fn tool_use_event(block: &Value) -> Event {
    let name = block
        .get("name")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();
    let input = block.get("input").cloned().unwrap_or(Value::Null);
    Event::ToolUse { name, input }
}

fn tool_result_events(value: &Value) -> Vec<Event> {
    content_blocks(value)
        .iter()
        .filter(|block| block_type(block) == "tool_result")
        .map(|block| Event::ToolResult {
            tool_use_id: block
                .get("tool_use_id")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string()),
            is_error: block
                .get("is_error")
                .and_then(|v| v.as_bool())
                .unwrap_or(false),
            content: tool_result_text(block.get("content")),
        })
        .collect()
}

fn tool_result_text(content: Option<&Value>) -> Option<String> {
    match content? {
        Value::String(text) => Some(text.clone()),
        Value::Array(parts) => {
            let joined: Vec<&str> = parts
                .iter()
                .filter_map(|part| part.get("text").and_then(|v| v.as_str()))
                .collect();
            if joined.is_empty() {
                None
            } else {
                Some(joined.join("\n"))
            }
        }
        _ => None,
    }
}

fn completion_event(value: &Value) -> Event {
    let subtype_error = value
        .get("subtype")
        .and_then(|v| v.as_str())
        .map(|s| s.starts_with("error"))
        .unwrap_or(false);
    let flagged = value
        .get("is_error")
        .and_then(|v| v.as_bool())
        .or_else(|| value.pointer("/result/is_error").and_then(|v| v.as_bool()))
        .unwrap_or(false);

    Event::Completion {
        is_error: flagged || subtype_error,
        result: value
            .get("result")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string()),
        session_id: value
            .get("session_id")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string()),
    }
}

fn error_event(value: &Value) -> Event {
    let message = value
        .pointer("/error/message")
        .and_then(|v| v.as_str())
        .or_else(|| value.get("error").and_then(|v| v.as_str()))
        .or_else(|| value.get("message").and_then(|v| v.as_str()))
        .unwrap_or("unknown error");
    Event::error(message)
}
