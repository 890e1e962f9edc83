//! Text rendering helpers for Telegram replies.
//!
//! Uses the `lazy-regex` crate: patterns are validated at compile time
//! and initialized on first use.

use lazy_regex::lazy_regex;

/// Match fenced code blocks with optional language: ```lang\ncode```
static RE_FENCE: lazy_regex::Lazy<regex::Regex> = lazy_regex!(r"```(\w+)?\n?([\s\S]*?)```");

/// Match bullet points at start of line: *
static RE_BULLET: lazy_regex::Lazy<regex::Regex> = lazy_regex!(r"(?m)^\* ");

/// Match bold text: **text**
static RE_BOLD: lazy_regex::Lazy<regex::Regex> = lazy_regex!(r"\*\*(.*?)\*\*");

/// Match italic text: *text*
static RE_ITALIC: lazy_regex::Lazy<regex::Regex> = lazy_regex!(r"\*(.*?)\*");

/// Match inline code: `code`
static RE_INLINE_CODE: lazy_regex::Lazy<regex::Regex> = lazy_regex!(r"`([^`]*)`");

/// Match 3+ consecutive newlines
static RE_MULTI_NEWLINE: lazy_regex::Lazy<regex::Regex> = lazy_regex!(r"\n{3,}");

/// Render a non-code segment: HTML-escape it, then apply the inline
/// Markdown patterns. Escaping first means the regex replacements only
/// ever insert tags we chose.
fn render_inline(text: &str) -> String {
    let mut out = html_escape::encode_text(text).to_string();
    out = RE_BULLET.replace_all(&out, "• ").to_string();
    out = RE_BOLD.replace_all(&out, "<b>$1</b>").to_string();
    out = RE_ITALIC.replace_all(&out, "<i>$1</i>").to_string();
    out = RE_INLINE_CODE.replace_all(&out, "<code>$1</code>").to_string();
    out
}

/// Formats markdown-like text into Telegram-compatible HTML.
///
/// Supported formatting:
/// - Code blocks: ` ```lang\ncode``` ` -> `<pre><code class="lang">code</code></pre>`
/// - Bullets: `* ` at the start of a line -> `• `
/// - Bold: `**text**` -> `<b>text</b>`
/// - Italic: `*text*` -> `<i>text</i>`
/// - Inline code: `` `code` `` -> `<code>code</code>`
/// - Multiple newlines (3+) are collapsed into two.
///
/// # Examples
///
/// ```
/// use gemini_tg::utils::format_text;
/// let input = "**Bold** and *italic* with `code`";
/// assert_eq!(format_text(input), "<b>Bold</b> and <i>italic</i> with <code>code</code>");
/// ```
#[must_use]
pub fn format_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_end = 0;

    for caps in RE_FENCE.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        out.push_str(&render_inline(&text[last_end..whole.start()]));

        let lang = caps.get(1).map_or("", |m| m.as_str());
        let code = caps.get(2).map_or("", |m| m.as_str()).trim();
        let escaped_code = html_escape::encode_text(code);
        out.push_str(&format!("<pre><code class=\"{lang}\">{escaped_code}</code></pre>"));

        last_end = whole.end();
    }
    out.push_str(&render_inline(&text[last_end..]));

    let out = RE_MULTI_NEWLINE.replace_all(&out, "\n\n");
    out.trim().to_string()
}

/// Safely truncates a string to a maximum character length (not bytes).
///
/// # Examples
///
/// ```
/// use gemini_tg::utils::truncate_str;
/// assert_eq!(truncate_str("Привет, мир!", 6), "Привет");
/// ```
#[must_use]
pub fn truncate_str(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((pos, _)) => s[..pos].to_string(),
        None => s.to_string(),
    }
}
