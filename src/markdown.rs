/// Escape characters that break Markdown link text: `[`, `]`, `(`, `)`.
pub(crate) fn escape_md_link(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '[' | ']' | '(' | ')' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

/// Flattens text onto one line so it can sit in a heading or list item.
pub(crate) fn sanitize_heading(s: &str) -> String {
    s.chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect()
}

/// Table cells cannot hold pipes or line breaks.
pub(crate) fn escape_table_cell(s: &str) -> String {
    sanitize_heading(s).replace('|', r"\|")
}

/// Cuts `s` to at most `max` bytes on a char boundary, marking the cut with `...`.
pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let end = s.floor_char_boundary(max);
    format!("{}...", s[..end].trim_end())
}
