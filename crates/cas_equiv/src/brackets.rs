//! Interval rewriting and bracketed-tuple comparison.

use crate::stage::StageVerdict;
use once_cell::sync::Lazy;
use regex::Regex;

static INTERVAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^Interval(?:\.(Ropen|Lopen|open))?\((.*)\)$").expect("invalid interval regex")
});

/// `Interval(a, b)` -> `[a, b]`, `Interval.Ropen(a, b)` -> `[a, b)`,
/// `Interval.Lopen(a, b)` -> `(a, b]`, `Interval.open(a, b)` -> `(a, b)`.
pub fn rewrite_interval(s: &str) -> String {
    let Some(caps) = INTERVAL.captures(s) else {
        return s.to_string();
    };
    let inner = caps.get(2).map_or("", |m| m.as_str());
    let (open, close) = match caps.get(1).map(|m| m.as_str()) {
        None => ('[', ']'),
        Some("Ropen") => ('[', ')'),
        Some("Lopen") => ('(', ']'),
        Some(_) => ('(', ')'),
    };
    format!("{}{}{}", open, inner, close)
}

fn is_open(c: char) -> bool {
    matches!(c, '(' | '[' | '{')
}

fn is_close(c: char) -> bool {
    matches!(c, ')' | ']' | '}')
}

/// Remove one enclosing bracket layer when the opening bracket closes at the
/// very end. Bracket kinds are not matched against each other.
pub fn strip_enclosing(s: &str) -> &str {
    let s = s.trim();
    let (Some(first), Some(last)) = (s.chars().next(), s.chars().last()) else {
        return s;
    };
    if s.len() < 2 || !is_open(first) || !is_close(last) {
        return s;
    }
    let mut depth = 0usize;
    for (i, c) in s.char_indices() {
        if is_open(c) {
            depth += 1;
        } else if is_close(c) {
            depth = depth.saturating_sub(1);
            if depth == 0 {
                if i + c.len_utf8() == s.len() {
                    return s[first.len_utf8()..i].trim();
                }
                return s;
            }
        }
    }
    s
}

/// Split at commas outside any bracket.
pub fn split_top_level(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        if is_open(c) {
            depth += 1;
        } else if is_close(c) {
            depth = depth.saturating_sub(1);
        } else if c == ',' && depth == 0 {
            parts.push(s[start..i].trim());
            start = i + 1;
        }
    }
    parts.push(s[start..].trim());
    parts
}

/// Compare two bracketed collections element by element.
///
/// `elements_equal` decides each pair of elements; it must not consult the
/// oracle. Mismatches are reported as `Failed`, never `NotEqual`.
pub fn compare_bracketed<F>(a: &str, b: &str, elements_equal: F) -> StageVerdict
where
    F: Fn(&str, &str) -> bool,
{
    let body_a = strip_enclosing(a);
    let body_b = strip_enclosing(b);

    let parts_a = split_top_level(body_a);
    let parts_b = split_top_level(body_b);
    if parts_a.len() > 1 || parts_b.len() > 1 {
        if parts_a.len() == parts_b.len()
            && parts_a
                .iter()
                .zip(&parts_b)
                .all(|(x, y)| elements_equal(x, y))
        {
            return StageVerdict::Success;
        }
        return StageVerdict::Failed;
    }

    if body_a == body_b {
        StageVerdict::Success
    } else {
        StageVerdict::Failed
    }
}
