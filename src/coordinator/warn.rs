use crate::coordinator::util::char_prefix;

/// Longest value kept in one `key=value` field.
const MAX_VALUE_CHARS: usize = 160;

/// One token per value: whitespace runs and `=` collapse to `_`, anything
/// outside printable ASCII is dropped.
fn sanitize_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len().min(MAX_VALUE_CHARS));
    for ch in value.chars() {
        let separator = ch.is_ascii_whitespace() || ch == '=';
        if separator {
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
        } else if ch.is_ascii_graphic() {
            out.push(ch);
        }
    }
    let trimmed = char_prefix(out.trim_matches('_'), MAX_VALUE_CHARS);
    if trimmed.is_empty() {
        "na".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Report a failure that is logged and then swallowed.
pub fn emit(code: &str, stage: &str, action: &str, reason: &str, err: &str) {
    eprintln!(
        "PAGEBRIEF_WARN code={} stage={} action={} reason={} err={}",
        sanitize_value(code),
        sanitize_value(stage),
        sanitize_value(action),
        sanitize_value(reason),
        sanitize_value(err),
    );
}
