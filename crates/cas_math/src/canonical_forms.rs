//! Structural canonical keys.
//!
//! A canonical key is a string that is identical for expressions that differ
//! only by commutativity, associativity, grouping of numeric coefficients and
//! merging of repeated factors: `x*y + 1`, `1 + y*x` and `(2*y*x + 2)/2` all
//! share a key. Sums and products are flattened and sorted, like terms and
//! like factors are combined, but nothing is expanded, so the key stays cheap
//! for expressions that are too large to turn into polynomials.
//!
//! Integer exponents distribute over products, `sqrt`/`root` become rational
//! exponents, and non-integer exponents are never merged into an inner power
//! (`(x^2)^(1/2)` is not `x`).

use crate::numeric::rational_pow;
use cas_ast::{Context, Expr, ExprId};
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Zero};
use std::collections::BTreeMap;

const MAX_DEPTH: usize = 200;

/// Product key -> coefficient
type Terms = BTreeMap<String, BigRational>;

/// Factors of a single product term.
#[derive(Default)]
struct Product {
    coef: BigRational,
    /// Base key -> exponent
    factors: BTreeMap<String, BigRational>,
    /// Numeric bases with non-integer accumulated exponents (`sqrt(2)`)
    radicals: BTreeMap<BigRational, BigRational>,
}

/// Canonical key of `id`.
pub fn canonical_key(ctx: &Context, id: ExprId) -> String {
    canonical_key_depth(ctx, id, MAX_DEPTH)
}

/// True when `a` and `b` have the same canonical key.
pub fn structurally_equal(ctx: &Context, a: ExprId, b: ExprId) -> bool {
    a == b || canonical_key(ctx, a) == canonical_key(ctx, b)
}

fn canonical_key_depth(ctx: &Context, id: ExprId, depth: usize) -> String {
    let mut terms = Terms::new();
    collect_sum(ctx, id, &BigRational::one(), &mut terms, depth);
    render_sum(&terms)
}

/// Fallback key once the depth budget is spent. Ids are hash-consed, so
/// identical subtrees in one context still get identical keys.
fn fallback_key(id: ExprId) -> String {
    format!("#{}", id.index())
}

fn number_key(n: &BigRational) -> String {
    n.to_string()
}

fn collect_sum(ctx: &Context, id: ExprId, sign: &BigRational, terms: &mut Terms, depth: usize) {
    if depth == 0 {
        add_term(terms, fallback_key(id), sign.clone());
        return;
    }
    match ctx.get(id) {
        Expr::Add(l, r) => {
            collect_sum(ctx, *l, sign, terms, depth - 1);
            collect_sum(ctx, *r, sign, terms, depth - 1);
        }
        Expr::Sub(l, r) => {
            collect_sum(ctx, *l, sign, terms, depth - 1);
            collect_sum(ctx, *r, &-sign.clone(), terms, depth - 1);
        }
        Expr::Neg(inner) => collect_sum(ctx, *inner, &-sign.clone(), terms, depth - 1),
        _ => {
            if let Some((scale, inner)) = split_scalar(ctx, id) {
                collect_sum(ctx, inner, &(sign * scale), terms, depth - 1);
                return;
            }
            let product = collect_product(ctx, id, depth - 1);
            let key = render_product(&product.factors);
            add_term(terms, key, sign * product.coef);
        }
    }
}

/// `k * inner`, `inner * k` or `inner / k` with a numeric `k`, so that a
/// scaled sum distributes: `(2*x + 2)/2` is `x + 1`.
fn split_scalar(ctx: &Context, id: ExprId) -> Option<(BigRational, ExprId)> {
    match ctx.get(id) {
        Expr::Mul(l, r) => match (ctx.get(*l), ctx.get(*r)) {
            (Expr::Number(k), _) => Some((k.clone(), *r)),
            (_, Expr::Number(k)) => Some((k.clone(), *l)),
            _ => None,
        },
        Expr::Div(l, r) => match ctx.get(*r) {
            Expr::Number(k) if !k.is_zero() => Some((k.recip(), *l)),
            _ => None,
        },
        _ => None,
    }
}

/// Exponent that is a literal rational: `3`, `-2`, `1/2`, `-(1/3)`
fn numeric_exponent(ctx: &Context, id: ExprId) -> Option<BigRational> {
    match ctx.get(id) {
        Expr::Number(n) => Some(n.clone()),
        Expr::Neg(inner) => numeric_exponent(ctx, *inner).map(|n| -n),
        Expr::Div(l, r) => {
            let num = numeric_exponent(ctx, *l)?;
            let den = numeric_exponent(ctx, *r)?;
            if den.is_zero() {
                None
            } else {
                Some(num / den)
            }
        }
        _ => None,
    }
}

fn add_term(terms: &mut Terms, key: String, coef: BigRational) {
    let entry = terms.entry(key).or_insert_with(BigRational::zero);
    *entry = &*entry + coef;
}

fn collect_product(ctx: &Context, id: ExprId, depth: usize) -> Product {
    let mut product = Product {
        coef: BigRational::one(),
        ..Product::default()
    };
    multiply_into(ctx, id, &BigRational::one(), &mut product, depth);

    for (base, exp) in std::mem::take(&mut product.radicals) {
        match rational_pow(&base, &exp) {
            Some(value) => product.coef = &product.coef * value,
            None => push_factor(&mut product, number_key(&base), &exp),
        }
    }
    product.factors.retain(|_, e| !e.is_zero());
    if product.coef.is_zero() {
        product.factors.clear();
    }
    product
}

fn push_factor(product: &mut Product, key: String, exp: &BigRational) {
    let entry = product
        .factors
        .entry(key)
        .or_insert_with(BigRational::zero);
    *entry = &*entry + exp;
}

/// Multiply `id^exp` into `product`.
fn multiply_into(ctx: &Context, id: ExprId, exp: &BigRational, product: &mut Product, depth: usize) {
    if depth == 0 {
        push_factor(product, fallback_key(id), exp);
        return;
    }
    match ctx.get(id) {
        Expr::Mul(l, r) => {
            multiply_into(ctx, *l, exp, product, depth - 1);
            multiply_into(ctx, *r, exp, product, depth - 1);
        }
        Expr::Div(l, r) => {
            multiply_into(ctx, *l, exp, product, depth - 1);
            multiply_into(ctx, *r, &-exp.clone(), product, depth - 1);
        }
        Expr::Neg(inner) if exp.is_integer() => {
            if exp.to_integer() % BigInt::from(2) != BigInt::zero() {
                product.coef = -product.coef.clone();
            }
            multiply_into(ctx, *inner, exp, product, depth - 1);
        }
        Expr::Number(n) => {
            if exp.is_integer() {
                if let Some(value) = rational_pow(n, exp) {
                    product.coef = &product.coef * value;
                    return;
                }
            }
            let entry = product
                .radicals
                .entry(n.clone())
                .or_insert_with(BigRational::zero);
            *entry = &*entry + exp;
        }
        Expr::Pow(base, e) if exp.is_integer() => match numeric_exponent(ctx, *e) {
            Some(k) => multiply_into(ctx, *base, &(exp * k), product, depth - 1),
            None => push_factor(product, opaque_key(ctx, id, depth - 1), exp),
        },
        Expr::Function(name, args) if exp.is_integer() || ctx.sym_name(*name) == "sqrt" => {
            match (ctx.sym_name(*name), args.as_slice()) {
                ("sqrt", [arg]) => {
                    let half = BigRational::new(BigInt::from(1), BigInt::from(2));
                    multiply_into(ctx, *arg, &(exp * half), product, depth - 1)
                }
                ("root", [arg, index]) if root_index(ctx, *index).is_some() => {
                    let n = root_index(ctx, *index).unwrap_or_else(BigRational::one);
                    multiply_into(ctx, *arg, &(exp / n), product, depth - 1)
                }
                _ => push_factor(product, opaque_key(ctx, id, depth - 1), exp),
            }
        }
        _ => push_factor(product, opaque_key(ctx, id, depth - 1), exp),
    }
}

/// Positive integer index of `root(x, n)`
fn root_index(ctx: &Context, index: ExprId) -> Option<BigRational> {
    match ctx.get(index) {
        Expr::Number(n) if n.is_integer() && *n >= BigRational::one() => Some(n.clone()),
        _ => None,
    }
}

/// Key of a node that is a single factor (not a product or quotient).
fn opaque_key(ctx: &Context, id: ExprId, depth: usize) -> String {
    if depth == 0 {
        return fallback_key(id);
    }
    match ctx.get(id) {
        Expr::Number(n) => number_key(n),
        Expr::Constant(c) => format!("#{}", c.name()),
        Expr::Variable(sym) => ctx.sym_name(*sym).to_string(),
        Expr::Function(name, args) => {
            let arg_keys: Vec<String> = args
                .iter()
                .map(|a| canonical_key_depth(ctx, *a, depth - 1))
                .collect();
            format!("{}({})", ctx.sym_name(*name), arg_keys.join(","))
        }
        Expr::Pow(base, exp) => format!(
            "{{^ {}, {}}}",
            canonical_key_depth(ctx, *base, depth - 1),
            canonical_key_depth(ctx, *exp, depth - 1)
        ),
        Expr::Matrix { rows, cols, data } => {
            let cells: Vec<String> = data
                .iter()
                .map(|c| canonical_key_depth(ctx, *c, depth - 1))
                .collect();
            format!("[{}x{}: {}]", rows, cols, cells.join(","))
        }
        // Sums, products and negations nested inside a factor
        _ => canonical_key_depth(ctx, id, depth - 1),
    }
}

fn render_product(factors: &BTreeMap<String, BigRational>) -> String {
    let mut parts = factors.iter();
    match (parts.next(), parts.next()) {
        (None, _) => "1".to_string(),
        (Some((key, exp)), None) if exp.is_one() => key.clone(),
        _ => {
            let joined: Vec<String> = factors
                .iter()
                .map(|(key, exp)| format!("{}^{}", key, exp))
                .collect();
            format!("{{* {}}}", joined.join(" "))
        }
    }
}

fn render_sum(terms: &Terms) -> String {
    let live: Vec<(&String, &BigRational)> = terms.iter().filter(|(_, c)| !c.is_zero()).collect();
    match live.as_slice() {
        [] => "0".to_string(),
        [(key, coef)] if key.as_str() == "1" => number_key(coef),
        [(key, coef)] if coef.is_one() => (*key).clone(),
        _ => {
            let joined: Vec<String> = live
                .iter()
                .map(|(key, coef)| format!("{}*{}", coef, key))
                .collect();
            format!("{{+ {}}}", joined.join(" "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cas_parser::parse;

    fn same(a: &str, b: &str) -> bool {
        let mut ctx = Context::new();
        let ea = parse(a, &mut ctx).unwrap();
        let eb = parse(b, &mut ctx).unwrap();
        structurally_equal(&ctx, ea, eb)
    }

    #[test]
    fn commutative_forms_match() {
        assert!(same("x*y + 1", "1 + y*x"));
        assert!(same("x + x", "2*x"));
        assert!(same("(2*y*x + 2)/2", "x*y + 1"));
        assert!(same("a - b", "-b + a"));
    }

    #[test]
    fn factors_merge() {
        assert!(same("x*x*x", "x^3"));
        assert!(same("sqrt(x)*sqrt(x)", "x"));
        assert!(same("sqrt(2)*sqrt(2)", "2"));
        assert!(same("sqrt(25)", "5"));
        assert!(same("(x*y)^2", "x^2*y^2"));
        assert!(same("x/x", "1"));
    }

    #[test]
    fn fractional_powers_match_roots() {
        assert!(same("x^(1/2)", "sqrt(x)"));
        assert!(same("8^(1/3)", "2"));
        assert!(same("x^-1", "1/x"));
    }

    #[test]
    fn function_arguments_are_canonical() {
        assert!(same("sin(2*x)", "sin(x*2)"));
        assert!(!same("sin(x)", "cos(x)"));
    }

    #[test]
    fn no_unsound_merges() {
        assert!(!same("(x^2)^(1/2)", "x"));
        assert!(!same("x + 1", "x + 2"));
        // not expanded
        assert!(!same("(x+1)^2", "x^2 + 2*x + 1"));
    }

    #[test]
    fn zero_sum() {
        let mut ctx = Context::new();
        let e = parse("x - x", &mut ctx).unwrap();
        assert_eq!(canonical_key(&ctx, e), "0");
    }
}
