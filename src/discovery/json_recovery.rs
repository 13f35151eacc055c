//! Recovers a JSON object embedded in a log line.
//!
//! Client log lines wrap the payload in unrelated text, typically trailing
//! metadata right after the closing brace. This is a targeted recovery for
//! that shape, not a general JSON repair pass: anything invalid *inside* the
//! braces stays invalid.

use serde_json::Value;

/// Return the first JSON object embeddable in `line`, or `None`.
///
/// Scans from the first `{` to the last `}`, then walks the end position back
/// one character at a time until the slice parses. Only the first `{` is ever
/// used as a start, so multiple objects on one line yield only the first.
pub fn recover_json(line: &str) -> Option<Value> {
    let start = line.find('{')?;
    let last = line.rfind('}')?;
    if last < start {
        return None;
    }

    let tail = &line[start..=last];
    let mut end = tail.len();
    while end > 1 {
        if tail.is_char_boundary(end) {
            if let Ok(value) = serde_json::from_str::<Value>(&tail[..end]) {
                return Some(value);
            }
        }
        end -= 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_object_with_trailing_garbage() {
        let line = r#"{"url":"https://example.com/a"} [info] request done in 3ms"#;
        assert_eq!(
            recover_json(line),
            Some(json!({"url": "https://example.com/a"}))
        );
    }

    #[test]
    fn test_object_with_leading_and_trailing_garbage() {
        let line = r#"2024-06-01 12:00:00 [net] {"url":"https://example.com/a","ok":true} code=200"#;
        assert_eq!(
            recover_json(line),
            Some(json!({"url": "https://example.com/a", "ok": true}))
        );
    }

    #[test]
    fn test_nested_braces_yield_outer_object() {
        let line = r#"{"a":{"b":1}} trailing"#;
        assert_eq!(recover_json(line), Some(json!({"a": {"b": 1}})));
    }

    #[test]
    fn test_no_braces_returns_none() {
        assert_eq!(recover_json("plain log line, nothing here"), None);
    }

    #[test]
    fn test_close_before_open_returns_none() {
        assert_eq!(recover_json("} oops {"), None);
    }

    #[test]
    fn test_truncated_json_is_not_repaired() {
        // Invalid inside the braces: recovery never fixes it.
        assert_eq!(recover_json(r#"{"url": "unterminated"#), None);
    }

    #[test]
    fn test_multibyte_trailing_text() {
        let line = "{\"url\":\"https://example.com/a\"} 抽卡记录已打开";
        assert_eq!(
            recover_json(line),
            Some(json!({"url": "https://example.com/a"}))
        );
    }
}
