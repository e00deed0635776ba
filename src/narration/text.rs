//! Turns raw assistant prose into something worth saying out loud.

use regex::Regex;
use std::sync::OnceLock;

struct Patterns {
    code_fence: Regex,
    bold: Regex,
    italic: Regex,
    inline_code: Regex,
    header: Regex,
    bullet: Regex,
    numbered: Regex,
    file_path: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        code_fence: Regex::new(r"```[\s\S]*?```").expect("code fence regex"),
        bold: Regex::new(r"\*\*([^*]+)\*\*").expect("bold regex"),
        italic: Regex::new(r"\*([^*]+)\*").expect("italic regex"),
        inline_code: Regex::new(r"`([^`]+)`").expect("inline code regex"),
        header: Regex::new(r"#{1,6}\s*").expect("header regex"),
        bullet: Regex::new(r"(?m)^\s*[-*•]\s+").expect("bullet regex"),
        numbered: Regex::new(r"(?m)^\s*\d+\.\s+").expect("numbered list regex"),
        file_path: Regex::new(r"^[\w/\\.-]+\.(py|js|ts|json|md|txt|yaml|yml|rs|toml|html|css)$")
            .expect("file path regex"),
    })
}

/// Returns the speakable form of `text`, or `None` when it is code, data,
/// a bare path, or mostly symbols.
pub fn speakable(text: &str, max_chars: usize) -> Option<String> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if text.starts_with("```") || text.ends_with("```") {
        return None;
    }

    let p = patterns();
    let without_code = p.code_fence.replace_all(text, " ");
    let trimmed = without_code.trim();

    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return None;
    }

    if p.file_path.is_match(trimmed) {
        return None;
    }

    let cleaned = clean_markdown(trimmed);
    if cleaned.is_empty() {
        return None;
    }

    let total = cleaned.chars().count();
    let wordy = cleaned
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
        .count();
    if wordy * 2 < total {
        return None;
    }

    Some(truncate_for_speech(&cleaned, max_chars))
}

/// Strips markdown emphasis, headers, list markers, and inline code ticks,
/// then collapses whitespace.
pub fn clean_markdown(text: &str) -> String {
    let p = patterns();
    let text = p.bullet.replace_all(text, "");
    let text = p.numbered.replace_all(&text, "");
    let text = p.bold.replace_all(&text, "$1");
    let text = p.italic.replace_all(&text, "$1");
    let text = p.inline_code.replace_all(&text, "$1");
    let text = p.header.replace_all(&text, "");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Caps `text` at `max_chars`, preferring to end on a sentence boundary.
pub fn truncate_for_speech(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let limit = text
        .char_indices()
        .nth(max_chars)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len());
    let window = &text[..limit];

    if let Some(idx) = window.rfind(". ") {
        if window[..idx].chars().count() > 100 {
            return window[..=idx].to_string();
        }
    }

    let keep = max_chars.saturating_sub(3);
    let mut cut: String = text.chars().take(keep).collect();
    cut.push_str("...");
    cut
}
