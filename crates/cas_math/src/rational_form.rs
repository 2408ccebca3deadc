//! Rational normal form: `num / den` with polynomial numerator and denominator.
//!
//! Everything that is not a rational operation on known quantities becomes an
//! opaque atom keyed by its canonical key, so `sin(x)/sin(x)` reduces to `1`
//! and `(x^2 - 1)/(x - 1)` is recognised as equal to `x + 1` by
//! cross-multiplication, without any polynomial GCD.

use crate::canonical_forms::canonical_key;
use crate::multipoly::{MultiPoly, PolyBudget, PolyError};
use crate::numeric::{exact_root, factorial, rational_pow};
use crate::opaque_atoms::AtomTable;
use cas_ast::{Constant, Context, Expr, ExprId};
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};

const MAX_DEPTH: usize = 200;

/// Largest root index folded exactly (`root(x, n)`, `x^(p/n)`).
const MAX_ROOT_INDEX: u32 = 64;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RationalForm {
    pub num: MultiPoly,
    /// Never zero; monic in its leading coefficient
    pub den: MultiPoly,
}

impl RationalForm {
    pub fn constant(c: BigRational) -> Self {
        Self {
            num: MultiPoly::from_const(c),
            den: MultiPoly::one(),
        }
    }

    pub fn atom(idx: usize) -> Self {
        Self {
            num: MultiPoly::from_var(idx),
            den: MultiPoly::one(),
        }
    }

    fn from_parts(num: MultiPoly, den: MultiPoly) -> Result<Self, PolyError> {
        if den.is_zero() {
            return Err(PolyError::DivisionByZero);
        }
        if num.is_zero() {
            return Ok(Self::constant(BigRational::zero()));
        }
        let lead = den
            .leading_coeff()
            .cloned()
            .unwrap_or_else(BigRational::one);
        if lead.is_one() {
            return Ok(Self { num, den });
        }
        Ok(Self {
            num: num.mul_scalar(&lead.recip()),
            den: den.mul_scalar(&lead.recip()),
        })
    }

    pub fn is_zero(&self) -> bool {
        self.num.is_zero()
    }

    pub fn constant_value(&self) -> Option<BigRational> {
        let n = self.num.constant_value()?;
        let d = self.den.constant_value()?;
        if d.is_zero() {
            None
        } else {
            Some(n / d)
        }
    }

    pub fn neg(&self) -> Self {
        Self {
            num: self.num.neg(),
            den: self.den.clone(),
        }
    }

    pub fn add(&self, other: &Self, budget: &PolyBudget) -> Result<Self, PolyError> {
        if self.den == other.den {
            let num = self.num.add(&other.num, budget)?;
            return Self::from_parts(num, self.den.clone());
        }
        let left = self.num.mul(&other.den, budget)?;
        let right = other.num.mul(&self.den, budget)?;
        let num = left.add(&right, budget)?;
        let den = self.den.mul(&other.den, budget)?;
        Self::from_parts(num, den)
    }

    pub fn sub(&self, other: &Self, budget: &PolyBudget) -> Result<Self, PolyError> {
        self.add(&other.neg(), budget)
    }

    pub fn mul(&self, other: &Self, budget: &PolyBudget) -> Result<Self, PolyError> {
        let num = self.num.mul(&other.num, budget)?;
        let den = self.den.mul(&other.den, budget)?;
        Self::from_parts(num, den)
    }

    pub fn div(&self, other: &Self, budget: &PolyBudget) -> Result<Self, PolyError> {
        if other.is_zero() {
            return Err(PolyError::DivisionByZero);
        }
        let num = self.num.mul(&other.den, budget)?;
        let den = self.den.mul(&other.num, budget)?;
        Self::from_parts(num, den)
    }

    pub fn pow(&self, exp: i64, budget: &PolyBudget) -> Result<Self, PolyError> {
        let e = u32::try_from(exp.unsigned_abs()).map_err(|_| PolyError::BadExponent)?;
        if exp >= 0 {
            Self::from_parts(self.num.pow(e, budget)?, self.den.pow(e, budget)?)
        } else {
            if self.is_zero() {
                return Err(PolyError::DivisionByZero);
            }
            Self::from_parts(self.den.pow(e, budget)?, self.num.pow(e, budget)?)
        }
    }

    /// `self == other` as rational functions (cross-multiplication).
    pub fn same_value(&self, other: &Self, budget: &PolyBudget) -> Result<bool, PolyError> {
        if self == other {
            return Ok(true);
        }
        let left = self.num.mul(&other.den, budget)?;
        let right = other.num.mul(&self.den, budget)?;
        Ok(left == right)
    }

    /// `Some(k)` when `self == k * other` for a non-zero rational `k`.
    pub fn constant_ratio(
        &self,
        other: &Self,
        budget: &PolyBudget,
    ) -> Result<Option<BigRational>, PolyError> {
        let left = self.num.mul(&other.den, budget)?;
        let right = other.num.mul(&self.den, budget)?;
        Ok(left.scalar_ratio(&right))
    }
}

/// Convert `id` to rational normal form, interning atoms in `atoms`.
///
/// Forms that will be compared must share one `AtomTable`.
pub fn rational_form(
    ctx: &Context,
    id: ExprId,
    atoms: &mut AtomTable,
    budget: &PolyBudget,
) -> Result<RationalForm, PolyError> {
    let mut converter = Converter { ctx, atoms, budget };
    converter.convert(id, MAX_DEPTH)
}

struct Converter<'a> {
    ctx: &'a Context,
    atoms: &'a mut AtomTable,
    budget: &'a PolyBudget,
}

impl Converter<'_> {
    fn convert(&mut self, id: ExprId, depth: usize) -> Result<RationalForm, PolyError> {
        if depth == 0 {
            return Err(PolyError::BudgetExceeded);
        }
        let ctx = self.ctx;
        let budget = self.budget;
        match ctx.get(id) {
            Expr::Number(n) => Ok(RationalForm::constant(n.clone())),
            Expr::Constant(Constant::Infinity) => Err(PolyError::NonPolynomial),
            Expr::Constant(_) | Expr::Variable(_) => Ok(self.opaque(id)),
            Expr::Add(l, r) => {
                let a = self.convert(*l, depth - 1)?;
                let b = self.convert(*r, depth - 1)?;
                a.add(&b, budget)
            }
            Expr::Sub(l, r) => {
                let a = self.convert(*l, depth - 1)?;
                let b = self.convert(*r, depth - 1)?;
                a.sub(&b, budget)
            }
            Expr::Mul(l, r) => {
                let a = self.convert(*l, depth - 1)?;
                let b = self.convert(*r, depth - 1)?;
                a.mul(&b, budget)
            }
            Expr::Div(l, r) => {
                let a = self.convert(*l, depth - 1)?;
                let b = self.convert(*r, depth - 1)?;
                a.div(&b, budget)
            }
            Expr::Neg(inner) => Ok(self.convert(*inner, depth - 1)?.neg()),
            Expr::Pow(base, exp) => self.convert_pow(id, *base, *exp, depth),
            Expr::Function(name, args) => {
                match (ctx.sym_name(*name), args.as_slice()) {
                    ("sqrt", [arg]) => self.convert_root(id, *arg, 2, depth),
                    ("root", [arg, index]) => match self.constant_of(*index, depth) {
                        Some(n) if n.is_integer() && n.is_positive() => {
                            match n.to_integer().to_u32() {
                                Some(q) if q <= MAX_ROOT_INDEX => {
                                    self.convert_root(id, *arg, q, depth)
                                }
                                _ => Ok(self.opaque(id)),
                            }
                        }
                        _ => Ok(self.opaque(id)),
                    },
                    ("abs", [arg]) => match self.constant_of(*arg, depth) {
                        Some(c) => Ok(RationalForm::constant(c.abs())),
                        None => Ok(self.opaque(id)),
                    },
                    ("factorial", [arg]) => {
                        match self.constant_of(*arg, depth).and_then(|c| factorial(&c)) {
                            Some(v) => Ok(RationalForm::constant(v)),
                            None => Ok(self.opaque(id)),
                        }
                    }
                    _ => Ok(self.opaque(id)),
                }
            }
            Expr::Matrix { .. } => Err(PolyError::NonPolynomial),
        }
    }

    fn opaque(&mut self, id: ExprId) -> RationalForm {
        let key = canonical_key(self.ctx, id);
        RationalForm::atom(self.atoms.intern(&key))
    }

    /// Rational value of `id`, if it converts to a constant.
    fn constant_of(&mut self, id: ExprId, depth: usize) -> Option<BigRational> {
        self.convert(id, depth - 1).ok()?.constant_value()
    }

    fn convert_pow(
        &mut self,
        id: ExprId,
        base: ExprId,
        exp: ExprId,
        depth: usize,
    ) -> Result<RationalForm, PolyError> {
        let Some(k) = self.constant_of(exp, depth) else {
            return Ok(self.opaque(id));
        };
        let base_form = self.convert(base, depth - 1)?;

        if let Some(c) = base_form.constant_value() {
            if let Some(value) = rational_pow(&c, &k) {
                return Ok(RationalForm::constant(value));
            }
            if k.is_integer() {
                return Err(if c.is_zero() {
                    PolyError::DivisionByZero
                } else {
                    PolyError::BudgetExceeded
                });
            }
            return Ok(self.opaque(id));
        }

        if !k.is_integer() {
            return Ok(self.opaque(id));
        }
        let e = k.to_integer().to_i64().ok_or(PolyError::BadExponent)?;
        if e.unsigned_abs() > u64::from(self.budget.max_pow_exp) {
            return Err(PolyError::BudgetExceeded);
        }
        base_form.pow(e, self.budget)
    }

    fn convert_root(
        &mut self,
        id: ExprId,
        arg: ExprId,
        index: u32,
        depth: usize,
    ) -> Result<RationalForm, PolyError> {
        let value = self.constant_of(arg, depth);
        match value.and_then(|c| exact_root(&c, index)) {
            Some(root) => Ok(RationalForm::constant(root)),
            None => Ok(self.opaque(id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cas_parser::parse;

    fn forms_equal(a: &str, b: &str) -> Result<bool, PolyError> {
        let mut ctx = Context::new();
        let ea = parse(a, &mut ctx).unwrap();
        let eb = parse(b, &mut ctx).unwrap();
        let budget = PolyBudget::default();
        let mut atoms = AtomTable::new();
        let fa = rational_form(&ctx, ea, &mut atoms, &budget)?;
        let fb = rational_form(&ctx, eb, &mut atoms, &budget)?;
        fa.same_value(&fb, &budget)
    }

    #[test]
    fn numbers_fold_exactly() {
        assert_eq!(forms_equal("10/2", "5"), Ok(true));
        assert_eq!(forms_equal("7 + 3/4", "7.75"), Ok(true));
        assert_eq!(forms_equal("sqrt(25)", "5"), Ok(true));
        assert_eq!(forms_equal("2^-2", "0.25"), Ok(true));
        assert_eq!(forms_equal("5!", "120"), Ok(true));
        assert_eq!(forms_equal("3", "3.01"), Ok(false));
    }

    #[test]
    fn polynomial_identities() {
        assert_eq!(forms_equal("x + x", "2*x"), Ok(true));
        assert_eq!(forms_equal("(x+1)^2", "x^2 + 2x + 1"), Ok(true));
        assert_eq!(forms_equal("(x^2 - 1)/(x - 1)", "x + 1"), Ok(true));
        assert_eq!(forms_equal("1/x + 1/y", "(x + y)/(x*y)"), Ok(true));
        assert_eq!(forms_equal("(x+1)^2", "x^2 + 1"), Ok(false));
    }

    #[test]
    fn atoms_are_canonical() {
        assert_eq!(forms_equal("sin(2x)/sin(x*2)", "1"), Ok(true));
        assert_eq!(forms_equal("2*pi*r", "r*pi*2"), Ok(true));
        assert_eq!(forms_equal("sqrt(2)*3", "3*2^(1/2)"), Ok(true));
    }

    #[test]
    fn failures_are_reported() {
        assert_eq!(forms_equal("1/0", "1"), Err(PolyError::DivisionByZero));
        assert_eq!(forms_equal("(x+1)^100", "1"), Err(PolyError::BudgetExceeded));
        assert_eq!(forms_equal("oo", "1"), Err(PolyError::NonPolynomial));
    }

    #[test]
    fn constant_ratio_of_forms() {
        let mut ctx = Context::new();
        let a = parse("2y - 4x - 2", &mut ctx).unwrap();
        let b = parse("y - 2x - 1", &mut ctx).unwrap();
        let budget = PolyBudget::default();
        let mut atoms = AtomTable::new();
        let fa = rational_form(&ctx, a, &mut atoms, &budget).unwrap();
        let fb = rational_form(&ctx, b, &mut atoms, &budget).unwrap();
        assert_eq!(
            fa.constant_ratio(&fb, &budget),
            Ok(Some(BigRational::from_integer(2.into())))
        );
    }
}
