// =============================================================================
// Numerical Helpers (exact rational arithmetic on Number nodes)
// =============================================================================

use crate::multipoly::const_pow_fits;
use cas_ast::{Context, Expr, ExprId};
use num_bigint::BigInt;
use num_integer::Roots;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};

/// Get a reference to the Number without cloning.
/// Use for inspection only; the reference is tied to the Context's lifetime.
#[inline]
pub fn as_number(ctx: &Context, id: ExprId) -> Option<&BigRational> {
    match ctx.get(id) {
        Expr::Number(n) => Some(n),
        _ => None,
    }
}

/// Try to extract an i64 value from a Number expression (without cloning).
/// Returns None if not a Number, not an integer, or doesn't fit in i64.
#[inline]
pub fn as_i64(ctx: &Context, id: ExprId) -> Option<i64> {
    match ctx.get(id) {
        Expr::Number(n) if n.is_integer() => n.to_integer().to_i64(),
        _ => None,
    }
}

fn exact_int_root(value: &BigInt, n: u32) -> Option<BigInt> {
    if value.is_negative() {
        if n % 2 == 0 {
            return None;
        }
        return exact_int_root(&-value, n).map(|r| -r);
    }
    let root = value.nth_root(n);
    if num_traits::pow(root.clone(), n as usize) == *value {
        Some(root)
    } else {
        None
    }
}

/// Exact `n`-th root of a rational, if it is itself rational.
/// `exact_root(9/4, 2) == Some(3/2)`, `exact_root(2, 2) == None`.
pub fn exact_root(value: &BigRational, n: u32) -> Option<BigRational> {
    if n == 0 {
        return None;
    }
    if n == 1 || value.is_zero() {
        return Some(value.clone());
    }
    let numer = exact_int_root(value.numer(), n)?;
    let denom = exact_int_root(value.denom(), n)?;
    Some(BigRational::new(numer, denom))
}

/// `base^exp` when the result is rational and the exponent is small enough to compute.
pub fn rational_pow(base: &BigRational, exp: &BigRational) -> Option<BigRational> {
    if exp.is_integer() {
        let e = exp.to_integer().to_i64()?;
        if !const_pow_fits(base, e.unsigned_abs()) {
            return None;
        }
        if e < 0 && base.is_zero() {
            return None;
        }
        let magnitude = num_traits::pow(base.clone(), e.unsigned_abs() as usize);
        return Some(if e < 0 { magnitude.recip() } else { magnitude });
    }
    let q = exp.denom().to_u32()?;
    if q > 64 {
        return None;
    }
    let root = exact_root(base, q)?;
    rational_pow(&root, &BigRational::from_integer(exp.numer().clone()))
}

/// n! for small non-negative integers
pub fn factorial(n: &BigRational) -> Option<BigRational> {
    if !n.is_integer() || n.is_negative() {
        return None;
    }
    let k = n.to_integer().to_u32()?;
    if k > 1000 {
        return None;
    }
    let value = (1..=k).fold(BigInt::one(), |acc, i| acc * BigInt::from(i));
    Some(BigRational::from_integer(value))
}
