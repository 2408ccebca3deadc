//! Computer-algebra comparison.
//!
//! Both sides are parsed (plain syntax first, LaTeX second) and compared by,
//! in order:
//! 1. rational normal form of the difference,
//! 2. structural canonical keys,
//! 3. equation zero-forms (equal or proportional),
//! 4. numeric evaluation, at deterministic sample points when free
//!    variables remain.

use crate::stage::StageVerdict;
use cas_ast::{Context, DisplayExpr, Equation, ExprId};
use cas_math::{
    collect_variables, difference_is_zero, equation_relation, eval_f64, numerically_close,
    structurally_equal, EquationRelation, PolyBudget,
};
use cas_parser::Statement;
use std::collections::{BTreeSet, HashMap};

/// Longer inputs are left to the oracle.
const MAX_INPUT_LEN: usize = 2000;

/// Values assigned to free variables; irrational-looking so that distinct
/// expressions rarely agree by accident.
const SAMPLE_VALUES: [f64; 7] = [
    0.577_215_664_9,
    1.324_717_957_2,
    2.718_281_828_5,
    0.318_309_886_2,
    1.618_033_988_7,
    3.141_592_653_6,
    0.707_106_781_2,
];

const SAMPLE_POINTS: usize = 6;

/// Parse with the plain parser, falling back to the LaTeX parser.
pub fn parse_answer(ctx: &mut Context, s: &str) -> Option<Statement> {
    if s.is_empty() || s.len() > MAX_INPUT_LEN {
        return None;
    }
    match cas_parser::parse_statement(s, ctx) {
        Ok(statement) => Some(statement),
        Err(plain_err) => match cas_parser::parse_latex_statement(ctx, s) {
            Ok(statement) => Some(statement),
            Err(latex_err) => {
                tracing::debug!(
                    target: "equiv",
                    input = s,
                    plain = %plain_err,
                    latex = %latex_err,
                    "symbolic_parse_failed"
                );
                None
            }
        },
    }
}

/// [`parse_answer`] restricted to expressions.
pub fn parse_expression(ctx: &mut Context, s: &str) -> Option<ExprId> {
    match parse_answer(ctx, s)? {
        Statement::Expression(id) => Some(id),
        Statement::Equation(_) => None,
    }
}

/// Verdict of the symbolic stage plus which check produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolicOutcome {
    pub verdict: StageVerdict,
    pub detail: Option<&'static str>,
}

impl SymbolicOutcome {
    fn new(verdict: StageVerdict, detail: &'static str) -> Self {
        Self {
            verdict,
            detail: Some(detail),
        }
    }
}

pub fn compare_symbolic(a: &str, b: &str, tolerance: f64) -> SymbolicOutcome {
    let mut ctx = Context::new();
    let (Some(sa), Some(sb)) = (parse_answer(&mut ctx, a), parse_answer(&mut ctx, b)) else {
        return SymbolicOutcome {
            verdict: StageVerdict::Failed,
            detail: None,
        };
    };
    let budget = PolyBudget::default();
    match (sa, sb) {
        (Statement::Expression(x), Statement::Expression(y)) => {
            compare_expressions(&ctx, x, y, tolerance, &budget)
        }
        (Statement::Equation(p), Statement::Equation(q)) => compare_equations(&ctx, p, q, &budget),
        _ => SymbolicOutcome::new(StageVerdict::NotEqual, "equation vs expression"),
    }
}

fn compare_expressions(
    ctx: &Context,
    a: ExprId,
    b: ExprId,
    tolerance: f64,
    budget: &PolyBudget,
) -> SymbolicOutcome {
    tracing::debug!(
        target: "equiv",
        a = %DisplayExpr::new(ctx, a),
        b = %DisplayExpr::new(ctx, b),
        "symbolic_expressions"
    );
    match difference_is_zero(ctx, a, b, budget) {
        Ok(true) => return SymbolicOutcome::new(StageVerdict::Success, "rational form"),
        Ok(false) => {}
        Err(e) => tracing::debug!(target: "equiv", error = %e, "rational_form_skipped"),
    }
    if structurally_equal(ctx, a, b) {
        return SymbolicOutcome::new(StageVerdict::Success, "canonical form");
    }
    if numeric_agreement(ctx, a, b, tolerance) {
        SymbolicOutcome::new(StageVerdict::Success, "numeric")
    } else {
        SymbolicOutcome::new(StageVerdict::NotEqual, "numeric")
    }
}

fn compare_equations(
    ctx: &Context,
    p: Equation,
    q: Equation,
    budget: &PolyBudget,
) -> SymbolicOutcome {
    tracing::debug!(
        target: "equiv",
        a = %format_args!("{} = {}", DisplayExpr::new(ctx, p.lhs), DisplayExpr::new(ctx, p.rhs)),
        b = %format_args!("{} = {}", DisplayExpr::new(ctx, q.lhs), DisplayExpr::new(ctx, q.rhs)),
        "symbolic_equations"
    );
    if structurally_equal(ctx, p.lhs, q.lhs) && structurally_equal(ctx, p.rhs, q.rhs) {
        return SymbolicOutcome::new(StageVerdict::Success, "canonical form");
    }
    match equation_relation(ctx, p, q, budget) {
        Ok(EquationRelation::Same) => SymbolicOutcome::new(StageVerdict::Success, "equation"),
        Ok(EquationRelation::Proportional(_)) => {
            SymbolicOutcome::new(StageVerdict::Success, "proportional equation")
        }
        Ok(EquationRelation::Unrelated) => SymbolicOutcome::new(StageVerdict::NotEqual, "equation"),
        Err(e) => {
            tracing::debug!(target: "equiv", error = %e, "equation_relation_failed");
            SymbolicOutcome::new(StageVerdict::NotEqual, "equation")
        }
    }
}

fn sample_point(vars: &BTreeSet<String>, k: usize) -> HashMap<String, f64> {
    vars.iter()
        .enumerate()
        .map(|(i, name)| {
            let magnitude = SAMPLE_VALUES[(k + 3 * i) % SAMPLE_VALUES.len()];
            let value = if (k + i) % 2 == 1 { -magnitude } else { magnitude };
            (name.clone(), value)
        })
        .collect()
}

/// Closed expressions must evaluate and agree. With free variables, every
/// sample where both sides evaluate must agree, and at least one must.
fn numeric_agreement(ctx: &Context, a: ExprId, b: ExprId, tolerance: f64) -> bool {
    let mut vars = collect_variables(ctx, a);
    vars.extend(collect_variables(ctx, b));

    if vars.is_empty() {
        let none = HashMap::new();
        return match (eval_f64(ctx, a, &none), eval_f64(ctx, b, &none)) {
            (Some(x), Some(y)) => numerically_close(x, y, tolerance),
            _ => false,
        };
    }

    let mut evaluated = 0;
    for k in 0..SAMPLE_POINTS {
        let point = sample_point(&vars, k);
        if let (Some(x), Some(y)) = (eval_f64(ctx, a, &point), eval_f64(ctx, b, &point)) {
            if !numerically_close(x, y, tolerance) {
                return false;
            }
            evaluated += 1;
        }
    }
    evaluated > 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verdict(a: &str, b: &str) -> StageVerdict {
        compare_symbolic(a, b, 1e-5).verdict
    }

    #[test]
    fn exact_rational_forms() {
        assert_eq!(verdict("x + x", "2*x"), StageVerdict::Success);
        assert_eq!(verdict("\\frac{10}{2}", "5"), StageVerdict::Success);
        assert_eq!(verdict("7+3/4", "7.75"), StageVerdict::Success);
        assert_eq!(verdict("sqrt(25)", "5"), StageVerdict::Success);
        assert_eq!(verdict("(x+1)^2", "x^2+2*x+1"), StageVerdict::Success);
        assert_eq!(
            compare_symbolic("x + x", "2*x", 1e-5).detail,
            Some("rational form")
        );
    }

    #[test]
    fn towering_constant_powers_stay_cheap() {
        let start = std::time::Instant::now();
        assert_ne!(verdict("(9^4096)^4096", "1"), StageVerdict::Success);
        assert!(start.elapsed() < std::time::Duration::from_secs(5));
    }

    #[test]
    fn canonical_form_beyond_the_budget() {
        let outcome = compare_symbolic("(a+b)^40 * c", "c * (b+a)^40", 1e-5);
        assert_eq!(outcome.verdict, StageVerdict::Success);
        assert_eq!(outcome.detail, Some("canonical form"));
    }

    #[test]
    fn numeric_fallback() {
        assert_eq!(verdict("sin(pi/6)", "0.5"), StageVerdict::Success);
        assert_eq!(verdict("2.000001", "2.0"), StageVerdict::Success);
        assert_eq!(verdict("sin(x)^2 + cos(x)^2", "1"), StageVerdict::Success);
        assert_eq!(verdict("sin(x)", "cos(x)"), StageVerdict::NotEqual);
        assert_eq!(verdict("2*pi", "6.28"), StageVerdict::NotEqual);
    }

    #[test]
    fn equations() {
        assert_eq!(verdict("y = 2*x + 1", "2*x + 1 = y"), StageVerdict::Success);
        assert_eq!(verdict("2*y = 4*x", "y = 2*x"), StageVerdict::Success);
        assert_eq!(verdict("y = x", "y = 2*x"), StageVerdict::NotEqual);
        assert_eq!(verdict("y = x", "x"), StageVerdict::NotEqual);
    }

    #[test]
    fn unparseable_input_fails() {
        assert_eq!(verdict("Theexpressionis4.3", "Theexpressionis2+2.3"), StageVerdict::Failed);
        assert_eq!(verdict("", "0"), StageVerdict::Failed);
        assert_eq!(verdict(&"(".repeat(3000), "1"), StageVerdict::Failed);
    }
}
