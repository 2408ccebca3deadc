//! Text normalization of answer strings.
//!
//! Rewrites LaTeX and prose decorations (units, currency, `\text{}` wrappers,
//! brace-less fractions, mixed numbers) into one canonical spelling so that the
//! cheaper comparison stages can decide as many pairs as possible.
//!
//! Each step is fail-open: a step that does not apply returns its input.
//! Deletion steps (sizing commands, symbols, unit words) run to their own
//! fixed point, so nested matches such as `cccmmm` vanish in one pass. The
//! whole pipeline is then repeated until it reaches a fixed point.

use once_cell::sync::Lazy;
use regex::Regex;

/// Upper bound on pipeline passes; real inputs settle in two or three.
const MAX_PASSES: usize = 16;

/// Integers at or above this magnitude are not exact in f64.
const MAX_EXACT_INTEGER: f64 = 1e15;

static LEFT_RIGHT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\left|\\right").expect("invalid left/right regex"));

static TEXT_CONJUNCTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\s*\\text\{\s*(?:or|and)\s*\}\s*").expect("invalid text conjunction regex")
});

static DOUBLE_COMMA: Lazy<Regex> = Lazy::new(|| Regex::new(r",\s*,").expect("invalid comma regex"));

static TEXT_OPEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\text\s*\{\s*").expect("invalid text-open regex"));

static TEXT_GROUP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\text\{([^}]+)\}").expect("invalid text-group regex"));

static MEMBERSHIP: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\in\b").expect("invalid \\in regex"));

static DEGREE_MARK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\^\s*(?:\{\s*\\circ\s*\}|\\circ)").expect("invalid degree regex")
});

static UNIT_WORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:centimeter|degree|meter|mile|second|minute|hour|week|month|year|foot|feet|inch|yard|cm|a\.m\.|p\.m\.|\bAM\b|\bPM\b)(?:es)?s?\s*(?:\^[0-9]+)?",
    )
    .expect("invalid unit regex")
});

static DAY_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"days?").expect("invalid day regex"));

static SQRT_BARE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\sqrt(\s*\w+)").expect("invalid sqrt regex"));

static DASH_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"-\s*").expect("invalid dash regex"));

static MIXED_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([0-9]) +([0-9])").expect("invalid mixed number regex"));

static MIXED_FRACTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d+)\s*\\frac\{(\d+)\}\{(\d+)\}").expect("invalid mixed fraction regex")
});

static THOUSANDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d),(\d{3})($|\D)").expect("invalid thousands regex"));

const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Longest names first so `\text` does not eat the prefix of `\textbf`.
const WRAPPERS: [&str; 5] = ["textbf", "textit", "mathrm", "mathcal", "text"];

/// Normalize an answer string into its canonical comparison text.
pub fn normalize(input: &str) -> String {
    let mut current = input.to_string();
    for pass in 0..MAX_PASSES {
        let next = normalize_once(&current);
        if next == current {
            return next;
        }
        tracing::trace!(
            target: "normalize",
            pass,
            from = %current,
            to = %next,
            "normalize_pass"
        );
        current = next;
    }
    current
}

/// [`normalize`] that passes absence through.
pub fn normalize_optional(input: Option<&str>) -> Option<String> {
    input.map(normalize)
}

fn normalize_once(input: &str) -> String {
    let s = delete_all(&LEFT_RIGHT, input);
    let s = collapse_text_conjunctions(&s);
    let s = remove_trailing_units(&s);
    let s = strip_membership(&s);
    let s = unwrap_wrappers(&s);
    let s = strip_symbols(&s);
    let s = s.replace(" or ", ",").replace(" and ", ",");
    let s = s
        .replace("million", "*10^6")
        .replace("billion", "*10^9")
        .replace("trillion", "*10^12");
    let s = strip_decorations(&s);
    let s = strip_enclosing_braces(&s);
    let s = SQRT_BARE.replace_all(&s, r"\sqrt{${1}}");
    let s = fix_fracs(&s);
    let s = DASH_SPACE.replace_all(&s, "-");
    let s = MIXED_NUMBER.replace_all(&s, "${1}+${2}");
    let s = MIXED_FRACTION.replace_all(&s, "${1}+${2}/${3}");
    let s: String = s.chars().filter(|c| !c.is_whitespace()).collect();
    canonical_integer(&s).unwrap_or(s)
}

fn collapse_text_conjunctions(s: &str) -> String {
    let s = TEXT_CONJUNCTION.replace_all(s, ",");
    DOUBLE_COMMA.replace_all(&s, ",").into_owned()
}

/// `10 \text{ cm}` keeps the part before the annotation.
fn remove_trailing_units(s: &str) -> String {
    if s.contains("\\text") {
        let parts: Vec<&str> = TEXT_OPEN.split(s).collect();
        if parts.len() == 2 && !matches!(parts[0], "" | "(") {
            return parts[0].to_string();
        }
    }
    if s.contains("\\text{") {
        return TEXT_GROUP.replace_all(s, "${1}").into_owned();
    }
    if s.contains("\\mbox{") {
        let parts: Vec<&str> = s.split("\\mbox{").collect();
        if parts.len() == 2 {
            return parts[0].to_string();
        }
    }
    s.to_string()
}

/// `x \in [0, 1]` keeps the set after the last `\in`.
fn strip_membership(s: &str) -> String {
    match MEMBERSHIP.find_iter(s).last() {
        Some(m) => s[m.end()..].trim().to_string(),
        None => s.to_string(),
    }
}

fn unwrap_wrappers(s: &str) -> String {
    WRAPPERS
        .iter()
        .fold(s.to_string(), |acc, name| unwrap_command(&acc, name))
}

/// Replace every `\name{X}` by `X` and drop bare `\name` tokens.
fn unwrap_command(s: &str, name: &str) -> String {
    let command = format!("\\{}", name);
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(pos) = rest.find(&command) {
        let after = &rest[pos + command.len()..];
        if after.starts_with(|c: char| c.is_ascii_alphabetic()) {
            // a longer command sharing the prefix
            out.push_str(&rest[..pos + command.len()]);
            rest = after;
            continue;
        }
        out.push_str(&rest[..pos]);
        let body = after.trim_start();
        if body.starts_with('{') {
            if let Some(close) = matching_brace(body) {
                out.push_str(&body[1..close]);
                rest = &body[close + 1..];
                continue;
            }
        }
        rest = after;
    }
    out.push_str(rest);
    out
}

/// Byte index of the `}` closing the `{` that starts `s`.
fn matching_brace(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Remove every match of `re`, including matches formed by earlier removals.
fn delete_all(re: &Regex, s: &str) -> String {
    let mut current = s.to_string();
    loop {
        let next = re.replace_all(&current, "");
        if next == current {
            return current;
        }
        current = next.into_owned();
    }
}

/// Apply a shrinking rewrite until the text stops changing.
fn settle(s: &str, step: impl Fn(&str) -> String) -> String {
    let mut current = s.to_string();
    loop {
        let next = step(&current);
        if next.len() >= current.len() {
            return if next == current { current } else { next };
        }
        current = next;
    }
}

/// Sizing commands, symbols and unit words together, since removing one kind
/// can expose another (`\lecmft`).
fn strip_decorations(s: &str) -> String {
    settle(s, |s| {
        let s = delete_all(&LEFT_RIGHT, s);
        let s = strip_symbols(&s);
        strip_unit_words(&s)
    })
}

/// Thin spaces, percent, currency and degree markers.
fn strip_symbols(s: &str) -> String {
    let s = s
        .replace("\\!", "")
        .replace("\\%", "%")
        .replace('%', "")
        .replace("\\$", "")
        .replace('$', "");
    DEGREE_MARK.replace_all(&s, "").into_owned()
}

fn strip_unit_words(s: &str) -> String {
    let s = delete_all(&UNIT_WORD, s);
    if s.contains("day") && !WEEKDAYS.iter().any(|day| s.contains(day)) {
        return delete_all(&DAY_WORD, &s);
    }
    s
}

fn strip_enclosing_braces(s: &str) -> String {
    let mut s = s;
    while s.starts_with('{') && matching_brace(s) == Some(s.len() - 1) {
        s = &s[1..s.len() - 1];
    }
    s.to_string()
}

/// `\frac12` -> `\frac{1}{2}`, `\frac1{2}` -> `\frac{1}{2}`.
fn fix_fracs(s: &str) -> String {
    let mut s = s.to_string();
    while s.contains("\\frac ") {
        s = s.replace("\\frac ", "\\frac");
    }
    let mut segments = s.split("\\frac");
    let mut out = segments.next().unwrap_or("").to_string();
    for segment in segments {
        out.push_str("\\frac");
        if segment.starts_with('{') {
            out.push_str(segment);
            continue;
        }
        let mut chars = segment.chars();
        let (Some(a), Some(b)) = (chars.next(), chars.next()) else {
            return s;
        };
        let post = chars.as_str();
        if b == '{' {
            out.push_str(&format!("{{{}}}{{{}", a, post));
        } else {
            out.push_str(&format!("{{{}}}{{{}}}{}", a, b, post));
        }
    }
    out
}

/// Remove `,` thousands separators that sit between well-formed digit groups.
pub(crate) fn strip_thousands_separators(s: &str) -> String {
    let mut current = s.to_string();
    loop {
        let next = THOUSANDS.replace_all(&current, "${1}${2}${3}").into_owned();
        if next == current {
            return next;
        }
        current = next;
    }
}

/// Decimal string of the integer `s` denotes, if it denotes one.
fn canonical_integer(s: &str) -> Option<String> {
    let plain = strip_thousands_separators(s);
    let value: f64 = plain.parse().ok()?;
    if !value.is_finite() || value.abs() >= MAX_EXACT_INTEGER {
        return None;
    }
    let rounded = value.round();
    if (value - rounded).abs() > 1e-7 {
        return None;
    }
    Some(format!("{}", rounded as i64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_sizing_and_text_units() {
        assert_eq!(normalize("\\left( 1, 2 \\right)"), "(1,2)");
        assert_eq!(normalize("10 \\text{ cm}"), "10");
        assert_eq!(normalize("\\text{(A)}"), "(A)");
        assert_eq!(normalize("5 \\text{ or } 6"), "5,6");
        assert_eq!(normalize("4 \\mbox{ apples}"), "4");
    }

    #[test]
    fn membership_keeps_the_set() {
        assert_eq!(normalize("x \\in [0, 1]"), "[0,1]");
        assert_eq!(normalize("x \\in (-\\infty, 2)"), "(-\\infty,2)");
    }

    #[test]
    fn unwraps_formatting_commands() {
        assert_eq!(normalize("\\textbf{42}"), "42");
        assert_eq!(normalize("\\mathrm{x}+1"), "x+1");
        assert_eq!(normalize("\\textit{\\mathcal{A}}"), "A");
    }

    #[test]
    fn removes_currency_percent_and_degrees() {
        assert_eq!(normalize("\\$1,000"), "1000");
        assert_eq!(normalize("50\\%"), "50");
        assert_eq!(normalize("45^\\circ"), "45");
        assert_eq!(normalize("90^{\\circ}"), "90");
        assert_eq!(normalize("2\\!3"), "23");
    }

    #[test]
    fn scales_and_units() {
        assert_eq!(normalize("3 million"), "3*10^6");
        assert_eq!(normalize("12 hours"), "12");
        assert_eq!(normalize("5 days"), "5");
        assert_eq!(normalize("Monday"), "Monday");
        assert_eq!(normalize("3 cm^2"), "3");
        assert_eq!(normalize("7 PM"), "7");
    }

    #[test]
    fn braces_sqrt_and_fractions() {
        assert_eq!(normalize("{x+1}"), "x+1");
        assert_eq!(normalize("{{7}}"), "7");
        assert_eq!(normalize("{1}{2}"), "{1}{2}");
        assert_eq!(normalize("\\sqrt 2"), "\\sqrt{2}");
        assert_eq!(normalize("\\sqrtx"), "\\sqrt{x}");
        assert_eq!(normalize("\\frac12"), "\\frac{1}{2}");
        assert_eq!(normalize("\\frac1{2}"), "\\frac{1}{2}");
        assert_eq!(normalize("\\frac{3}{4}"), "\\frac{3}{4}");
        assert_eq!(normalize("\\frac1"), "\\frac1");
    }

    #[test]
    fn mixed_numbers_become_sums() {
        assert_eq!(normalize("7 3/4"), "7+3/4");
        assert_eq!(normalize("7 \\frac{3}{4}"), "7+3/4");
        assert_eq!(normalize("- 5"), "-5");
    }

    #[test]
    fn integer_canonicalization() {
        assert_eq!(normalize("2.0"), "2");
        assert_eq!(normalize("1e3"), "1000");
        assert_eq!(normalize("12,345,678"), "12345678");
        assert_eq!(normalize("2.000001"), "2.000001");
        assert_eq!(normalize("10,20"), "10,20");
        assert_eq!(normalize("1e20"), "1e20");
        assert_eq!(normalize("inf"), "inf");
    }

    #[test]
    fn empty_and_absent() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize_optional(None), None);
        assert_eq!(normalize_optional(Some(" 3 ")), Some("3".to_string()));
    }

    #[test]
    fn idempotent_on_samples() {
        for s in [
            "\\frac 1 2",
            "{\\text{5}}",
            "\\boxed{x}",
            "1 2 3",
            "{\\sqrt x}",
            "x \\in \\left[1,2\\right)",
            "\\text{\\text{cm}}",
            "\\lecmft",
            "dacmys",
        ] {
            let once = normalize(s);
            assert_eq!(normalize(&once), once, "input {:?}", s);
        }
    }

    #[test]
    fn nested_unit_words_vanish_in_one_call() {
        let s = format!("{}{}", "c".repeat(20), "m".repeat(20));
        assert_eq!(normalize(&s), "");
        assert_eq!(normalize("7 \\le\\left\\right\\rightft"), "7");
        for s in ["\\\\!!", "\\\\$!", "^\\ci^\\circrc"] {
            let once = normalize(s);
            assert_eq!(normalize(&once), once, "input {:?}", s);
        }
    }
}
