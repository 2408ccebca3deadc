//! Normalizer and cascade properties.
//!
//! Fixed case counts keep CI stable.

use cas_equiv::{normalize, EquivConfig, EquivalenceEngine, Stage, StageVerdict, Verdict};
use proptest::prelude::*;

/// Fragments that exercise the interesting normalizer steps when glued
/// together in random order.
const FRAGMENTS: &[&str] = &[
    "\\frac", "{", "}", "1", "2", "34", " ", "x", "\\text{ cm}", "\\text", "million", ",", "000",
    "\\sqrt", "-", "\\left(", "\\right)", "\\in ", "\\$", "\\%", "^\\circ", ".5", "e3", "hours",
    "days", "\\mathrm{", "\\!", " or ", "\\mbox{", "(", ")", "[", "]", "&", "\\\\",
];

fn arb_fragmented() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(FRAGMENTS), 0..12).prop_map(|parts| parts.concat())
}

/// Deletable tokens split in two; nesting them builds inputs where each
/// removal exposes the next match.
const SPLIT_DECORATIONS: &[(&str, &str)] = &[
    ("c", "m"),
    ("ho", "urs"),
    ("\\le", "ft"),
    ("\\rig", "ht"),
    ("^\\ci", "rc"),
    ("\\", "!"),
    ("da", "ys"),
    ("\\", "%"),
];

fn arb_nested_decorations() -> impl Strategy<Value = String> {
    (
        prop::collection::vec(prop::sample::select(SPLIT_DECORATIONS), 0..32),
        prop::sample::select(&["", "7", "x+1", "\\frac12", "3 cm"][..]),
    )
        .prop_map(|(layers, core)| {
            layers.iter().fold(core.to_string(), |inner, (head, tail)| {
                format!("{}{}{}", head, inner, tail)
            })
        })
}

/// A pool of answers in many spellings; pairs drawn from it mix equal and
/// unequal values.
const ANSWERS: &[&str] = &[
    "5",
    "5.0",
    "\\frac{10}{2}",
    "\\boxed{5}",
    "2.5",
    "\\frac{5}{2}",
    "2 \\frac{1}{2}",
    "x + x",
    "2*x",
    "x^2",
    "(1, 2)",
    "[1,2]",
    "Interval.open(1, 2)",
    "\\begin{pmatrix}1&2\\\\3&4\\end{pmatrix}",
    "Matrix([[1,2],[3,4]])",
    "sqrt(2)",
    "1.41421356",
    "y = 2x",
    "2x = y",
    "pi",
    "",
];

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn normalize_is_idempotent_on_ascii(s in "[ -~]{0,24}") {
        let once = normalize(&s);
        prop_assert_eq!(normalize(&once), once);
    }

    #[test]
    fn normalize_is_idempotent_on_latex_fragments(s in arb_fragmented()) {
        let once = normalize(&s);
        prop_assert_eq!(normalize(&once), once);
    }

    #[test]
    fn normalize_is_idempotent_on_nested_decorations(s in arb_nested_decorations()) {
        let once = normalize(&s);
        prop_assert_eq!(normalize(&once), once);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn comparison_is_reflexive(s in "[ -~]{0,24}") {
        let engine = EquivalenceEngine::offline(EquivConfig::default());
        let result = engine.compare_deterministic(&s, &s);
        prop_assert_eq!(result.verdict, Verdict::Equal);
        prop_assert_eq!(result.stages(), vec![(Stage::String, StageVerdict::Success)]);
    }

    #[test]
    fn deterministic_verdict_is_symmetric(
        a in prop::sample::select(ANSWERS),
        b in prop::sample::select(ANSWERS),
    ) {
        let engine = EquivalenceEngine::offline(EquivConfig::default());
        let ab = engine.compare_deterministic(a, b);
        let ba = engine.compare_deterministic(b, a);
        prop_assert_eq!(ab.verdict, ba.verdict);
        prop_assert_eq!(ab.decided_by(), ba.decided_by());
    }

    #[test]
    fn full_verdict_is_symmetric_offline(
        a in prop::sample::select(ANSWERS),
        b in prop::sample::select(ANSWERS),
    ) {
        let engine = EquivalenceEngine::offline(EquivConfig::default());
        let ab = futures::executor::block_on(engine.compare(a, b));
        let ba = futures::executor::block_on(engine.compare(b, a));
        prop_assert_eq!(ab.verdict, ba.verdict);
    }
}
