//! Text helpers shared by transports

/// Maximum number of characters of user text written to logs
pub const MAX_LOG_TEXT_LENGTH: usize = 50;

/// Telegram message character limit
pub const TELEGRAM_MESSAGE_LIMIT: usize = 4096;

/// Patterns that indicate potentially sensitive content
pub const SENSITIVE_PATTERNS: &[&str] = &[
    "password",
    "passwd",
    "secret",
    "token",
    "api_key",
    "apikey",
    "api-key",
    "bearer",
    "authorization",
    "credential",
    "private",
    "ssh",
    "-----begin",
];

/// Mask potentially sensitive text for logging
///
/// Text containing a sensitive pattern is replaced entirely; anything else
/// is cut to [`MAX_LOG_TEXT_LENGTH`] characters.
///
/// # Examples
/// ```
/// use pincer_channels::util::mask_for_logging;
///
/// assert!(mask_for_logging("my password is hunter2").contains("REDACTED"));
/// assert_eq!(mask_for_logging("calc 2+2"), "calc 2+2");
/// ```
#[must_use]
pub fn mask_for_logging(text: &str) -> String {
    let lower = text.to_lowercase();
    if SENSITIVE_PATTERNS.iter().any(|p| lower.contains(p)) {
        return "[REDACTED - potentially sensitive content]".to_string();
    }

    match text.char_indices().nth(MAX_LOG_TEXT_LENGTH) {
        Some((cut, _)) => format!("{}...[truncated]", &text[..cut]),
        None => text.to_string(),
    }
}

/// Escape text for Telegram's HTML parse mode
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Convert the Markdown subset models usually emit to Telegram HTML.
///
/// Handles fenced code blocks, inline code and `**bold**`; everything else
/// is escaped and passed through.
#[must_use]
pub fn markdown_to_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 16);
    let mut in_fence = false;

    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }
        if line.trim_start().starts_with("```") {
            out.push_str(if in_fence { "</pre>" } else { "<pre>" });
            in_fence = !in_fence;
        } else if in_fence {
            out.push_str(&escape_html(line));
        } else {
            inline_to_html(line, &mut out);
        }
    }

    if in_fence {
        out.push_str("</pre>");
    }
    out
}

fn inline_to_html(line: &str, out: &mut String) {
    let mut rest = line;
    while let Some(ch) = rest.chars().next() {
        if let Some(after) = rest.strip_prefix("**") {
            if let Some(end) = after.find("**").filter(|&end| end > 0) {
                out.push_str("<b>");
                out.push_str(&escape_html(&after[..end]));
                out.push_str("</b>");
                rest = &after[end + 2..];
                continue;
            }
        } else if let Some(after) = rest.strip_prefix('`') {
            if let Some(end) = after.find('`').filter(|&end| end > 0) {
                out.push_str("<code>");
                out.push_str(&escape_html(&after[..end]));
                out.push_str("</code>");
                rest = &after[end + 1..];
                continue;
            }
        }

        out.push_str(&escape_html(&rest[..ch.len_utf8()]));
        rest = &rest[ch.len_utf8()..];
    }
}

/// Split text into chunks of at most `limit` characters, preferring line breaks.
#[must_use]
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    let mut chunks = Vec::new();
    let mut rest = text;

    while let Some((cut, _)) = rest.char_indices().nth(limit) {
        let window = &rest[..cut];
        let split = window.rfind('\n').filter(|&i| i > 0).unwrap_or(cut);
        chunks.push(window[..split].to_string());
        rest = rest[split..].trim_start_matches('\n');
    }

    if !rest.is_empty() || chunks.is_empty() {
        chunks.push(rest.to_string());
    }
    chunks
}
