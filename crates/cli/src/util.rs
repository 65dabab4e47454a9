use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Display width of a string, accounting for CJK double-width, emoji, etc.
pub(crate) fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Truncate a string to fit within `width` display columns, ending in ".."
/// when cut. Columns narrower than 3 get as much of the string as fits.
pub(crate) fn truncate_display(s: &str, width: usize) -> String {
    if display_width(s) <= width {
        return s.to_string();
    }
    if width < 3 {
        return take_width(s, width).to_string();
    }
    format!("{}..", take_width(s, width - 2))
}

/// Pad or truncate a string to exactly `width` display columns.
pub(crate) fn pad_right(s: &str, width: usize) -> String {
    let cut = truncate_display(s, width);
    let used = display_width(&cut);
    format!("{}{}", cut, " ".repeat(width.saturating_sub(used)))
}

/// Longest suffix of `s` that fits in `width` columns. Keeps the end of a
/// long prompt line (where the cursor usually is) on screen.
pub(crate) fn tail_to_width(s: &str, width: usize) -> &str {
    let mut used = 0;
    let mut start = s.len();
    for (i, ch) in s.char_indices().rev() {
        let cw = ch.width().unwrap_or(0);
        if used + cw > width {
            break;
        }
        used += cw;
        start = i;
    }
    &s[start..]
}

/// Longest prefix of `s` that fits in `width` columns.
fn take_width(s: &str, width: usize) -> &str {
    let mut used = 0;
    for (i, ch) in s.char_indices() {
        let cw = ch.width().unwrap_or(0);
        if used + cw > width {
            return &s[..i];
        }
        used += cw;
    }
    s
}
