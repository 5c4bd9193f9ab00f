//! mIRC color markup for directional sentiment in figures.

/// Color-start marker for green (positive / increase).
pub const GREEN: &str = "\x033";
/// Color-start marker for red (negative / decrease).
pub const RED: &str = "\x034";
/// Formatting reset.
pub const RESET: &str = "\x0F";

/// Wrap `text` in the given color marker.
pub fn paint(text: &str, color: &str) -> String {
    format!("{color}{text}{RESET}")
}

/// Color a change figure red when it carries a minus sign, green otherwise.
pub fn paint_change(change: &str) -> String {
    if change.contains('-') {
        paint(change, RED)
    } else {
        paint(change, GREEN)
    }
}

/// Color a change figure green only when it carries an explicit plus sign.
///
/// Index pages render unchanged values without a sign; those read as red
/// under this scheme, which is the quote-strip convention.
pub fn paint_change_strict(change: &str) -> String {
    if change.contains('+') {
        paint(change, GREEN)
    } else {
        paint(change, RED)
    }
}

/// Render a numeric change as `{sign}{text}`: green with a `+` prefix when
/// positive, red when negative, unstyled when exactly zero.
pub fn signed_colored(value: f64, text: impl std::fmt::Display) -> String {
    if value > 0.0 {
        format!("{GREEN}+{text}{RESET}")
    } else if value < 0.0 {
        format!("{RED}{text}{RESET}")
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paint_change_polarity() {
        assert_eq!(paint_change("-1.2%"), "\x034-1.2%\x0F");
        assert_eq!(paint_change("+0.5%"), "\x033+0.5%\x0F");
        // No sign reads as green under the minus-is-red scheme.
        assert_eq!(paint_change("0.00%"), "\x0330.00%\x0F");
    }

    #[test]
    fn strict_polarity_requires_plus() {
        assert_eq!(paint_change_strict("+0.65%"), "\x033+0.65%\x0F");
        assert_eq!(paint_change_strict("UNCH"), "\x034UNCH\x0F");
        assert_eq!(paint_change_strict("-0.65%"), "\x034-0.65%\x0F");
    }

    #[test]
    fn signed_colored_zero_is_plain() {
        assert_eq!(signed_colored(0.0, "0.00"), "0.00");
        assert_eq!(signed_colored(1.5, "1.50"), "\x033+1.50\x0F");
        assert_eq!(signed_colored(-1.5, "-1.50"), "\x034-1.50\x0F");
    }
}
