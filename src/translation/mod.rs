use std::borrow::Cow;

mod scanner;

use scanner::{State, closes_dollar_quote, dollar_quote_tag, is_bare_question_mark, starts_with_at};

/// Placeholder syntax expected by a backend driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderStyle {
    /// Bare `?`, bound left to right (SQLite).
    Positional,
    /// Numbered `$1..$N` (Postgres).
    Numbered,
}

/// Number bare `?` placeholders as `$1..$N` in left-to-right order.
///
/// Quoted strings, comments and dollar-quoted blocks are skipped, as are
/// already-numbered `?N` placeholders and the `?|`/`?&` operators. Returns a
/// borrowed `Cow` when nothing changed or when `style` is positional.
///
/// ```rust
/// use db_engine::translation::{PlaceholderStyle, number_placeholders};
///
/// let sql = "UPDATE t SET a=?, b=?  WHERE id = ? AND note <> '?'";
/// assert_eq!(
///     number_placeholders(sql, PlaceholderStyle::Numbered),
///     "UPDATE t SET a=$1, b=$2  WHERE id = $3 AND note <> '?'"
/// );
/// ```
#[must_use]
pub fn number_placeholders(sql: &str, style: PlaceholderStyle) -> Cow<'_, str> {
    if style == PlaceholderStyle::Positional || !sql.contains('?') {
        return Cow::Borrowed(sql);
    }

    let bytes = sql.as_bytes();
    let mut out: Option<String> = None;
    let mut state = State::Normal;
    let mut next_index = 1usize;
    // start of the not-yet-copied span of `sql`
    let mut copied = 0usize;
    let mut idx = 0usize;

    while idx < bytes.len() {
        let b = bytes[idx];
        match state {
            State::Normal => match b {
                b'\'' => state = State::SingleQuoted,
                b'"' => state = State::DoubleQuoted,
                b'-' if starts_with_at(bytes, idx, b"--") => state = State::LineComment,
                b'/' if starts_with_at(bytes, idx, b"/*") => {
                    state = State::BlockComment(1);
                    idx += 1;
                }
                b'$' => {
                    if let Some((tag, close)) = dollar_quote_tag(bytes, idx) {
                        state = State::DollarQuoted(tag);
                        idx = close;
                    }
                }
                b'?' if is_bare_question_mark(bytes, idx) => {
                    let buf = out.get_or_insert_with(|| String::with_capacity(sql.len() + 8));
                    buf.push_str(&sql[copied..idx]);
                    buf.push('$');
                    buf.push_str(&next_index.to_string());
                    next_index += 1;
                    copied = idx + 1;
                }
                _ => {}
            },
            State::SingleQuoted => {
                if b == b'\'' {
                    if bytes.get(idx + 1) == Some(&b'\'') {
                        idx += 1;
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::DoubleQuoted => {
                if b == b'"' {
                    if bytes.get(idx + 1) == Some(&b'"') {
                        idx += 1;
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::LineComment => {
                if b == b'\n' {
                    state = State::Normal;
                }
            }
            State::BlockComment(depth) => {
                if starts_with_at(bytes, idx, b"/*") {
                    state = State::BlockComment(depth + 1);
                    idx += 1;
                } else if starts_with_at(bytes, idx, b"*/") {
                    state = if depth == 1 {
                        State::Normal
                    } else {
                        State::BlockComment(depth - 1)
                    };
                    idx += 1;
                }
            }
            State::DollarQuoted(ref tag) => {
                if closes_dollar_quote(bytes, idx, tag) {
                    idx += tag.len() + 1;
                    state = State::Normal;
                }
            }
        }
        idx += 1;
    }

    match out {
        Some(mut buf) => {
            buf.push_str(&sql[copied..]);
            Cow::Owned(buf)
        }
        None => Cow::Borrowed(sql),
    }
}
