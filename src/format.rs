use unicode_width::UnicodeWidthChar;

/// `MM:SS`, or `H:MM:SS` once an hour has passed
pub fn format_clock(total: u64) -> String {
    let (h, m, s) = split_hms(total);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m:02}:{s:02}")
    }
}

/// Always `HH:MM:SS`, for the session summary
pub fn format_hms(total: u64) -> String {
    let (h, m, s) = split_hms(total);
    format!("{h:02}:{m:02}:{s:02}")
}

fn split_hms(total: u64) -> (u64, u64, u64) {
    (total / 3600, (total % 3600) / 60, total % 60)
}

/// Cut `name` to at most `max_width` terminal columns, marking the cut with `...`
pub fn truncate_name(name: &str, max_width: usize) -> String {
    let mut width = 0;
    let mut out = String::new();
    for c in name.chars() {
        let w = c.width().unwrap_or(0);
        if width + w > max_width {
            out.push_str("...");
            return out;
        }
        width += w;
        out.push(c);
    }
    out
}
