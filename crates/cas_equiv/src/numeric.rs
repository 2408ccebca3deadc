//! Plain-decimal comparison.

use crate::normalize::strip_thousands_separators;
use crate::stage::StageVerdict;
use cas_math::relative_close;
use once_cell::sync::Lazy;
use regex::Regex;

static PLAIN_DECIMAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?$").expect("invalid decimal regex")
});

static GROUPED_DECIMAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?\d{1,3}(?:,\d{3})+(?:\.\d*)?(?:[eE][+-]?\d+)?$")
        .expect("invalid grouped decimal regex")
});

/// Value of `s` when it is a plain decimal literal.
///
/// `{,}` separators are dropped; `,` is accepted only in well-formed
/// thousands groups (`12,345.5`).
pub fn parse_decimal(s: &str) -> Option<f64> {
    let s = s.trim().replace("{,}", "");
    let s = if s.contains(',') {
        if !GROUPED_DECIMAL.is_match(&s) {
            return None;
        }
        strip_thousands_separators(&s)
    } else {
        s
    };
    if !PLAIN_DECIMAL.is_match(&s) {
        return None;
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Both sides decimal: close within `tolerance` or not. Otherwise `Failed`.
pub fn compare_decimals(a: &str, b: &str, tolerance: f64) -> StageVerdict {
    match (parse_decimal(a), parse_decimal(b)) {
        (Some(x), Some(y)) if relative_close(x, y, tolerance) => StageVerdict::Success,
        (Some(_), Some(_)) => StageVerdict::NotEqual,
        _ => StageVerdict::Failed,
    }
}
