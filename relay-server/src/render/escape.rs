//! HTML escaping for user-supplied text.

use std::borrow::Cow;

/// Escape text for embedding in HTML element content or a quoted attribute.
pub fn escape_html(input: &str) -> Cow<'_, str> {
    if !input.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(input);
    }

    let mut out = String::with_capacity(input.len() + 16);
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Escape multi-line text, keeping line breaks visible.
pub fn escape_multiline(input: &str) -> String {
    escape_html(input)
        .replace("\r\n", "\n")
        .replace('\n', "<br>\n")
}

/// Subject lines go into a mail header: collapse control characters.
pub fn header_safe(input: &str) -> String {
    input
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
