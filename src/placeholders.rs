//! Positional `?` placeholder scanning.
//!
//! Quoted strings, quoted identifiers and comments are skipped, so a `?`
//! inside `'what?'` or `-- why?` is left alone. The same scanner backs
//! keyword lookups and trailing-comment trimming.

use std::borrow::Cow;

#[derive(Clone, Copy, PartialEq, Eq)]
enum State {
    Normal,
    SingleQuoted,
    DoubleQuoted,
    Backticked,
    LineComment,
    BlockComment,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Segment {
    Code,
    Quoted,
    Comment,
}

/// Visit every byte offset of `sql` with the kind of text it belongs to.
/// Quote characters count as quoted text, comment markers as comment.
fn scan(sql: &str, mut visit: impl FnMut(usize, Segment)) {
    let bytes = sql.as_bytes();
    let mut state = State::Normal;
    let mut idx = 0;

    while idx < bytes.len() {
        let b = bytes[idx];
        let next = bytes.get(idx + 1).copied();
        let (next_state, segment, width) = match state {
            State::Normal => match b {
                b'\'' => (State::SingleQuoted, Segment::Quoted, 1),
                b'"' => (State::DoubleQuoted, Segment::Quoted, 1),
                b'`' => (State::Backticked, Segment::Quoted, 1),
                b'-' if next == Some(b'-') => (State::LineComment, Segment::Comment, 2),
                b'/' if next == Some(b'*') => (State::BlockComment, Segment::Comment, 2),
                _ => (State::Normal, Segment::Code, 1),
            },
            // doubled quotes are an escaped quote; leaving and re-entering handles them
            State::SingleQuoted if b == b'\'' => (State::Normal, Segment::Quoted, 1),
            State::DoubleQuoted if b == b'"' => (State::Normal, Segment::Quoted, 1),
            State::Backticked if b == b'`' => (State::Normal, Segment::Quoted, 1),
            State::SingleQuoted | State::DoubleQuoted | State::Backticked => {
                (state, Segment::Quoted, 1)
            }
            State::LineComment if b == b'\n' => (State::Normal, Segment::Comment, 1),
            State::BlockComment if b == b'*' && next == Some(b'/') => {
                (State::Normal, Segment::Comment, 2)
            }
            State::LineComment | State::BlockComment => (state, Segment::Comment, 1),
        };

        for offset in idx..(idx + width).min(bytes.len()) {
            visit(offset, segment);
        }
        state = next_state;
        idx += width;
    }
}

/// Visit the byte offset of every positional placeholder in `sql`.
fn scan_placeholders(sql: &str, mut on_placeholder: impl FnMut(usize)) {
    let bytes = sql.as_bytes();
    scan(sql, |idx, segment| {
        if segment == Segment::Code && bytes[idx] == b'?' {
            on_placeholder(idx);
        }
    });
}

/// Number of positional placeholders in `sql`.
pub fn count(sql: &str) -> usize {
    let mut n = 0;
    scan_placeholders(sql, |_| n += 1);
    n
}

/// Rewrite `?` placeholders to PostgreSQL-style `$1, $2, ...`.
/// Returns a borrowed `Cow` when the statement has no placeholders.
pub fn to_numbered(sql: &str) -> Cow<'_, str> {
    let mut positions = Vec::new();
    scan_placeholders(sql, |idx| positions.push(idx));
    if positions.is_empty() {
        return Cow::Borrowed(sql);
    }

    let mut out = String::with_capacity(sql.len() + positions.len() * 2);
    let mut last = 0;
    for (n, pos) in positions.into_iter().enumerate() {
        out.push_str(&sql[last..pos]);
        out.push('$');
        out.push_str(&(n + 1).to_string());
        last = pos + 1;
    }
    out.push_str(&sql[last..]);
    Cow::Owned(out)
}

/// Whether `keyword` appears as a whole word outside literals, quoted
/// identifiers and comments. Case-insensitive.
pub fn contains_keyword(sql: &str, keyword: &str) -> bool {
    let bytes = sql.as_bytes();
    let mut code = vec![b' '; bytes.len()];
    scan(sql, |idx, segment| {
        if segment == Segment::Code {
            code[idx] = bytes[idx];
        }
    });

    // a multi-byte character never straddles a segment boundary
    String::from_utf8_lossy(&code)
        .split(|c: char| !(c.is_alphanumeric() || c == '_' || c == '$'))
        .any(|word| word.eq_ignore_ascii_case(keyword))
}

/// Length of `sql` once trailing whitespace, semicolons and comments are cut.
pub fn statement_len(sql: &str) -> usize {
    let bytes = sql.as_bytes();
    let mut end = 0;
    scan(sql, |idx, segment| match segment {
        Segment::Quoted => end = idx + 1,
        Segment::Code if !bytes[idx].is_ascii_whitespace() && bytes[idx] != b';' => {
            end = idx + 1
        }
        _ => {}
    });
    end
}
