use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    AssistantMessage,
    ToolUse,
    ToolResult,
    Error,
    Completion,
}

/// One step reported by the coding agent on its structured output stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Event {
    AssistantMessage {
        text: String,
    },
    ToolUse {
        name: String,
        #[serde(default)]
        input: serde_json::Value,
    },
    ToolResult {
        tool_use_id: Option<String>,
        is_error: bool,
        content: Option<String>,
    },
    Error {
        message: String,
    },
    Completion {
        is_error: bool,
        result: Option<String>,
        session_id: Option<String>,
    },
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::AssistantMessage { .. } => EventKind::AssistantMessage,
            Event::ToolUse { .. } => EventKind::ToolUse,
            Event::ToolResult { .. } => EventKind::ToolResult,
            Event::Error { .. } => EventKind::Error,
            Event::Completion { .. } => EventKind::Completion,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Event::AssistantMessage { text: text.into() }
    }

    pub fn tool(name: impl Into<String>, input: serde_json::Value) -> Self {
        Event::ToolUse {
            name: name.into(),
            input,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Event::Error {
            message: message.into(),
        }
    }

    /// True when the event reports a failure of the agent run.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Event::Error { .. } | Event::Completion { is_error: true, .. }
        )
    }

    /// Short one-line description used for transcript and debug output.
    pub fn summary(&self) -> String {
        match self {
            Event::AssistantMessage { text } => text.chars().take(100).collect(),
            Event::ToolUse { name, .. } => format!("tool {name}"),
            Event::ToolResult { is_error, .. } => {
                if *is_error {
                    "tool result (error)".to_string()
                } else {
                    "tool result".to_string()
                }
            }
            Event::Error { message } => format!("error: {message}"),
            Event::Completion { is_error, .. } => {
                if *is_error {
                    "completed with error".to_string()
                } else {
                    "completed".to_string()
                }
            }
        }
    }
}
