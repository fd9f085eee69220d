#[derive(Clone)]
pub(super) enum State {
    Normal,
    SingleQuoted,
    DoubleQuoted,
    LineComment,
    BlockComment(u32),
    DollarQuoted(String),
}

/// True when the `?` at `idx` is already numbered (`?1`) or is part of a
/// two-character operator such as Postgres' `?|` / `?&`.
pub(super) fn is_bare_question_mark(bytes: &[u8], idx: usize) -> bool {
    match bytes.get(idx + 1) {
        Some(next) => !(next.is_ascii_digit() || *next == b'|' || *next == b'&'),
        None => true,
    }
}

pub(super) fn starts_with_at(bytes: &[u8], idx: usize, pat: &[u8]) -> bool {
    bytes.get(idx..idx + pat.len()) == Some(pat)
}

/// Parse a `$tag$` opener at `start`, returning the tag and the index of its
/// closing `$`.
pub(super) fn dollar_quote_tag(bytes: &[u8], start: usize) -> Option<(String, usize)> {
    let rest = bytes.get(start + 1..)?;
    let len = rest
        .iter()
        .position(|b| !(b.is_ascii_alphanumeric() || *b == b'_'))?;
    if rest[len] != b'$' || rest.first().is_some_and(u8::is_ascii_digit) {
        return None;
    }
    let tag = std::str::from_utf8(&rest[..len]).ok()?.to_string();
    Some((tag, start + 1 + len))
}

/// True when `bytes[idx..]` closes a `$tag$` block.
pub(super) fn closes_dollar_quote(bytes: &[u8], idx: usize, tag: &str) -> bool {
    bytes[idx] == b'$'
        && starts_with_at(bytes, idx + 1, tag.as_bytes())
        && bytes.get(idx + 1 + tag.len()) == Some(&b'$')
}
