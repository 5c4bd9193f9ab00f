//! Byte-budget truncation and multi-part splitting.
//!
//! The transport rejects lines over its payload budget, so long bodies are
//! delivered as consecutive parts of at most `max` bytes. Splits prefer to
//! land just after sentence-ending punctuation and never leave a part
//! starting with a comma.

/// Largest prefix of `s` that fits in `max` bytes, cut on a char boundary.
pub fn truncate_to_bytes(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Enforce a hard byte cap: if `s` encodes to `threshold` bytes or more,
/// keep `keep` bytes and append `"..."`.
pub fn cap_with_ellipsis(s: &str, threshold: usize, keep: usize) -> String {
    if s.len() >= threshold {
        let mut capped = truncate_to_bytes(s, keep).to_string();
        capped.push_str("...");
        capped
    } else {
        s.to_string()
    }
}

/// Strip carriage returns and line feeds; the transport treats them as
/// message terminators.
pub fn strip_newlines(s: &str) -> String {
    s.replace(['\r', '\n'], "")
}

/// Split `s` into parts of at most `max` bytes each.
///
/// Within a part, the split point backs up to just after the last
/// sentence-ending punctuation (`.`, `!`, `?` followed by a space) when one
/// exists; otherwise the part is cut at the byte budget. A continuation part
/// never starts with a comma; the cut backs off one char instead. Leading
/// whitespace on continuations is dropped.
pub fn split_message(s: &str, max: usize) -> Vec<String> {
    let mut parts = Vec::new();
    let mut rest = s.trim();

    while rest.len() > max {
        let mut cut = truncate_to_bytes(rest, max).len();
        if cut == 0 {
            // max smaller than the first char; emit whole remainder rather
            // than loop forever
            break;
        }

        if let Some(p) = last_sentence_end(&rest[..cut]) {
            cut = p;
        }

        // Never start the continuation with a comma.
        if rest[cut..].starts_with(',') {
            if let Some(prev) = rest[..cut].chars().next_back() {
                let stepped = cut - prev.len_utf8();
                if stepped > 0 {
                    cut = stepped;
                }
            }
        }

        parts.push(rest[..cut].trim_end().to_string());
        rest = rest[cut..].trim_start();
    }

    if !rest.is_empty() {
        parts.push(rest.to_string());
    }

    parts
}

/// Byte position just past the last `.`/`!`/`?` that is followed by a space,
/// if any. Punctuation at the very start does not count, since a one-char
/// part would stall the splitter.
fn last_sentence_end(chunk: &str) -> Option<usize> {
    let mut found = None;
    for (i, c) in chunk.char_indices() {
        if matches!(c, '.' | '!' | '?') {
            let after = i + c.len_utf8();
            if i > 0 && chunk[after..].starts_with(' ') {
                found = Some(after);
            }
        }
    }
    found
}
