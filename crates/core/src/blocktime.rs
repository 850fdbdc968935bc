//! Locates the block's `"blockTime":<int>` field and captures its digits
//! verbatim, without numeric conversion.

const KEY: &[u8] = b"\"blockTime\":";

/// Scan `buf` for `"blockTime":` and return the raw text of the value that
/// follows, up to (but not including) the next `,` or closing delimiter.
///
/// Returns `None` if the key is absent; callers treat that as a
/// per-block-recoverable condition (warn, fall back to an empty prefix in
/// signatures).
pub fn extract(buf: &[u8]) -> Option<&str> {
    let key_pos = find(buf, KEY)?;
    let value_start = key_pos + KEY.len();

    let mut end = value_start;
    while end < buf.len() {
        match buf[end] {
            b',' | b'}' | b']' => break,
            _ => end += 1,
        }
    }

    std::str::from_utf8(&buf[value_start..end]).ok()
}

fn find(buf: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || buf.len() < needle.len() {
        return None;
    }
    buf.windows(needle.len()).position(|w| w == needle)
}
