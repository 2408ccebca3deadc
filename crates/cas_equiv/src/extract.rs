//! Final-answer extraction from verbose model output.

use once_cell::sync::Lazy;
use regex::Regex;

static ANSWER_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:the\s+)?(?:final\s+)?(?:answer|result)(?:\s*(?:[:\-]|is)\s*)(.+)$")
        .expect("invalid answer marker regex")
});

/// Pull the final answer out of `text`.
///
/// A `\boxed{...}` (or `\fbox{...}`) group wins; otherwise an
/// "answer is ..." / "result: ..." marker; otherwise `text` is returned as is.
pub fn extract_answer(text: &str) -> String {
    extract_answer_with(text, std::slice::from_ref(&*ANSWER_MARKER))
}

/// [`extract_answer`] with caller-supplied marker patterns, tried in order.
/// Each pattern's first capture group is the answer.
pub fn extract_answer_with(text: &str, patterns: &[Regex]) -> String {
    if !text.contains("boxed") && !text.contains("fbox") {
        let candidate = text.trim_end();
        for pattern in patterns {
            if let Some(answer) = pattern.captures(candidate).and_then(|c| c.get(1)) {
                return answer.as_str().trim().to_string();
            }
        }
        return text.to_string();
    }
    boxed_content(text).unwrap_or_else(|| text.to_string())
}

/// Inner content of the last `\boxed{...}` or, failing that, `\fbox{...}`.
fn boxed_content(text: &str) -> Option<String> {
    let (start, command) = match text.rfind("\\boxed") {
        Some(i) => (i, "\\boxed"),
        None => (text.rfind("\\fbox")?, "\\fbox"),
    };

    let mut depth = 0usize;
    let mut close = None;
    for (i, c) in text[start..].char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    close = Some(start + i);
                    break;
                }
            }
            _ => {}
        }
    }

    let group = &text[start..=close?];
    let inner = group.strip_prefix(command)?.strip_prefix('{')?.strip_suffix('}')?;
    Some(inner.trim().to_string())
}
