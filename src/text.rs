/// Marker appended when a string is cut at a word boundary.
pub const ELLIPSIS: char = '…';

/// Cuts `text` down to at most `max_length` characters.
///
/// Text within budget comes back unchanged. Longer text is cut at the last
/// word boundary that leaves room for [`ELLIPSIS`]; when the first word alone
/// overflows the budget the text is hard-cut at `max_length` instead.
/// Lengths are counted in `char`s, never bytes.
pub fn truncate(text: &str, max_length: usize) -> String {
    if text.chars().count() <= max_length {
        return text.to_string();
    }
    if max_length == 0 {
        return String::new();
    }

    let budget = max_length - 1;
    let head: String = text.chars().take(budget).collect();
    let boundary = if text.chars().nth(budget).is_some_and(char::is_whitespace) {
        Some(head.len())
    } else {
        head.rfind(char::is_whitespace)
    };

    let kept = boundary
        .map(|i| head[..i].trim_end_matches(|c: char| c.is_whitespace() || ",;:-|.".contains(c)))
        .filter(|s| !s.is_empty());

    match kept {
        Some(kept) => format!("{kept}{ELLIPSIS}"),
        None => text.chars().take(max_length).collect(),
    }
}

/// Trimmed value, or `None` when missing or whitespace-only.
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Reduces catalog HTML to a single line of plain text.
pub fn strip_html(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => {
                in_tag = true;
                out.push(' ');
            }
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    collapse_whitespace(&decode_entities(&out))
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
