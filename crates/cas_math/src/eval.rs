//! Numeric evaluation of expressions using f64 values.
//!
//! Used by the equivalence checker as a last exact-arithmetic fallback:
//! closed expressions are evaluated directly, expressions with free
//! variables at sample points.

use cas_ast::{Constant, Context, Expr, ExprId};
use num_traits::ToPrimitive;
use std::collections::HashMap;

/// Absolute slack below which two values count as equal regardless of scale,
/// so `sin(pi)` matches `0`.
pub const ABS_EPSILON: f64 = 1e-12;

/// Evaluate an expression numerically with f64 values.
/// Has a depth limit of 200 to prevent stack overflow on deeply nested expressions.
/// Returns None for unbound variables, complex values, poles and NaN.
pub fn eval_f64(ctx: &Context, expr: ExprId, var_map: &HashMap<String, f64>) -> Option<f64> {
    eval_f64_depth(ctx, expr, var_map, 200)
}

fn eval_f64_depth(
    ctx: &Context,
    expr: ExprId,
    var_map: &HashMap<String, f64>,
    depth: usize,
) -> Option<f64> {
    if depth == 0 {
        return None;
    }

    let value = match ctx.get(expr) {
        Expr::Number(n) => n.to_f64()?,
        Expr::Constant(Constant::Pi) => std::f64::consts::PI,
        Expr::Constant(Constant::E) => std::f64::consts::E,
        Expr::Constant(Constant::Infinity) => f64::INFINITY,
        Expr::Constant(Constant::I) => return None,
        Expr::Variable(sym_id) => *var_map.get(ctx.sym_name(*sym_id))?,
        Expr::Add(l, r) => {
            eval_f64_depth(ctx, *l, var_map, depth - 1)?
                + eval_f64_depth(ctx, *r, var_map, depth - 1)?
        }
        Expr::Sub(l, r) => {
            eval_f64_depth(ctx, *l, var_map, depth - 1)?
                - eval_f64_depth(ctx, *r, var_map, depth - 1)?
        }
        Expr::Mul(l, r) => {
            eval_f64_depth(ctx, *l, var_map, depth - 1)?
                * eval_f64_depth(ctx, *r, var_map, depth - 1)?
        }
        Expr::Div(l, r) => {
            let b = eval_f64_depth(ctx, *r, var_map, depth - 1)?;
            if b == 0.0 {
                return None;
            }
            eval_f64_depth(ctx, *l, var_map, depth - 1)? / b
        }
        Expr::Pow(b, e) => {
            let base = eval_f64_depth(ctx, *b, var_map, depth - 1)?;
            let exp = eval_f64_depth(ctx, *e, var_map, depth - 1)?;
            real_pow(base, exp, odd_root_exponent(ctx, *e))
        }
        Expr::Neg(e) => -eval_f64_depth(ctx, *e, var_map, depth - 1)?,
        Expr::Function(name, args) => {
            let values = args
                .iter()
                .map(|a| eval_f64_depth(ctx, *a, var_map, depth - 1))
                .collect::<Option<Vec<f64>>>()?;
            eval_function(ctx.sym_name(*name), &values)?
        }
        Expr::Matrix { .. } => return None,
    };

    if value.is_nan() {
        None
    } else {
        Some(value)
    }
}

/// For `p/q` exponents with odd `q`, the parity of `p`; lets `(-8)^(1/3)` be `-2`.
fn odd_root_exponent(ctx: &Context, exp: ExprId) -> Option<bool> {
    let (p, q) = match ctx.get(exp) {
        Expr::Number(n) => (n.numer().clone(), n.denom().clone()),
        Expr::Div(a, b) => match (ctx.get(*a), ctx.get(*b)) {
            (Expr::Number(p), Expr::Number(q)) if p.is_integer() && q.is_integer() => {
                (p.to_integer(), q.to_integer())
            }
            _ => return None,
        },
        _ => return None,
    };
    let q = q.to_i64()?;
    if q % 2 == 0 {
        return None;
    }
    let p = p.to_i64()?;
    Some(p % 2 != 0)
}

fn real_pow(base: f64, exp: f64, odd_root: Option<bool>) -> f64 {
    if base < 0.0 && exp.fract() != 0.0 {
        if let Some(odd_numerator) = odd_root {
            let magnitude = (-base).powf(exp);
            return if odd_numerator { -magnitude } else { magnitude };
        }
    }
    base.powf(exp)
}

fn eval_function(name: &str, args: &[f64]) -> Option<f64> {
    let value = match (name, args) {
        ("sin", [x]) => x.sin(),
        ("cos", [x]) => x.cos(),
        ("tan", [x]) => x.tan(),
        ("cot", [x]) => 1.0 / x.tan(),
        ("sec", [x]) => 1.0 / x.cos(),
        ("csc", [x]) => 1.0 / x.sin(),
        ("arcsin" | "asin", [x]) => x.asin(),
        ("arccos" | "acos", [x]) => x.acos(),
        ("arctan" | "atan", [x]) => x.atan(),
        ("sinh", [x]) => x.sinh(),
        ("cosh", [x]) => x.cosh(),
        ("tanh", [x]) => x.tanh(),
        ("ln" | "log", [x]) if *x > 0.0 => x.ln(),
        ("log", [x, b]) if *x > 0.0 && *b > 0.0 && *b != 1.0 => x.ln() / b.ln(),
        ("log10", [x]) if *x > 0.0 => x.log10(),
        ("log2", [x]) if *x > 0.0 => x.log2(),
        ("exp", [x]) => x.exp(),
        ("sqrt", [x]) if *x >= 0.0 => x.sqrt(),
        ("root", [x, n]) if *n != 0.0 => {
            let odd = n.fract() == 0.0 && (*n as i64) % 2 != 0;
            if *x < 0.0 && odd {
                -(-x).powf(1.0 / n)
            } else {
                x.powf(1.0 / n)
            }
        }
        ("abs", [x]) => x.abs(),
        ("floor", [x]) => x.floor(),
        ("ceiling" | "ceil", [x]) => x.ceil(),
        ("factorial", [x]) if *x >= 0.0 && x.fract() == 0.0 && *x <= 170.0 => {
            (1..=(*x as u32)).map(f64::from).product()
        }
        _ => return None,
    };
    Some(value)
}

/// Relative closeness: `|a - b| <= tol * max(|a|, |b|)`; exact equality is always close.
pub fn relative_close(a: f64, b: f64, tol: f64) -> bool {
    if a == b {
        return true;
    }
    if !a.is_finite() || !b.is_finite() {
        return false;
    }
    (a - b).abs() <= tol * a.abs().max(b.abs())
}

/// Relative closeness with an absolute floor of [`ABS_EPSILON`].
pub fn numerically_close(a: f64, b: f64, tol: f64) -> bool {
    relative_close(a, b, tol) || (a.is_finite() && b.is_finite() && (a - b).abs() <= ABS_EPSILON)
}
