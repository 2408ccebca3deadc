//! Sparse Multivariate Polynomial over Q
//!
//! Representation: terms stored as (coefficient, monomial) pairs.
//! Monomial = sorted sparse list of (variable index, exponent), exponents > 0.
//! Variable indices come from an [`AtomTable`](crate::opaque_atoms::AtomTable),
//! so two polynomials built against the same table can be combined directly.
//! Uses BTreeMap internally for normalization, Vec for storage.

use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};
use std::collections::BTreeMap;

// =============================================================================
// Types
// =============================================================================

pub type VarIdx = usize;
pub type Exp = u32;

/// Sparse monomial, sorted by variable index, no zero exponents.
/// The empty monomial is the constant term.
pub type Monomial = Vec<(VarIdx, Exp)>;

/// Term: (coeff != 0, monomial)
pub type Term = (BigRational, Monomial);

/// Limits to avoid explosion during conversion/operations
#[derive(Clone, Debug)]
pub struct PolyBudget {
    pub max_terms: usize,
    pub max_total_degree: u32,
    pub max_pow_exp: u32,
}

impl Default for PolyBudget {
    fn default() -> Self {
        Self {
            max_terms: 200,
            max_total_degree: 32,
            max_pow_exp: 24,
        }
    }
}

/// Largest exponent applied to a rational constant exactly.
pub const MAX_CONST_POW_EXP: u32 = 4096;

/// Bit-size ceiling for the result of an exact constant power.
pub const MAX_CONST_POW_BITS: u64 = 1 << 16;

/// Whether `base^exp` stays within [`MAX_CONST_POW_EXP`] and [`MAX_CONST_POW_BITS`].
/// Zero and unit bases always fit.
pub fn const_pow_fits(base: &BigRational, exp: u64) -> bool {
    if base.is_zero() || base.abs().is_one() {
        return true;
    }
    let bits = base.numer().bits() + base.denom().bits();
    exp <= u64::from(MAX_CONST_POW_EXP) && bits.saturating_mul(exp) <= MAX_CONST_POW_BITS
}

/// Error types for polynomial operations
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PolyError {
    NonPolynomial,
    BadExponent,
    DivisionByZero,
    BudgetExceeded,
}

impl std::fmt::Display for PolyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PolyError::NonPolynomial => write!(f, "expression is not a rational function over Q"),
            PolyError::BadExponent => write!(f, "exponent is not a usable integer"),
            PolyError::DivisionByZero => write!(f, "division by zero"),
            PolyError::BudgetExceeded => write!(f, "budget exceeded"),
        }
    }
}

impl std::error::Error for PolyError {}

// =============================================================================
// MultiPoly struct
// =============================================================================

/// Sparse multivariate polynomial over Q
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct MultiPoly {
    /// Terms in ascending monomial order, no zero coefficients
    terms: Vec<Term>,
}

impl MultiPoly {
    /// Create zero polynomial
    pub fn zero() -> Self {
        Self { terms: Vec::new() }
    }

    /// Create constant 1
    pub fn one() -> Self {
        Self::from_const(BigRational::one())
    }

    /// Create from constant
    pub fn from_const(c: BigRational) -> Self {
        if c.is_zero() {
            Self::zero()
        } else {
            Self {
                terms: vec![(c, Vec::new())],
            }
        }
    }

    /// Create monomial x_i (single variable with exp 1)
    pub fn from_var(var: VarIdx) -> Self {
        Self {
            terms: vec![(BigRational::one(), vec![(var, 1)])],
        }
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// Check if zero
    pub fn is_zero(&self) -> bool {
        self.terms.is_empty()
    }

    /// Check if constant (possibly 0)
    pub fn is_constant(&self) -> bool {
        self.terms.is_empty() || (self.terms.len() == 1 && self.terms[0].1.is_empty())
    }

    /// Get constant value if constant
    pub fn constant_value(&self) -> Option<BigRational> {
        match self.terms.as_slice() {
            [] => Some(BigRational::zero()),
            [(c, m)] if m.is_empty() => Some(c.clone()),
            _ => None,
        }
    }

    /// Total degree (max sum of exponents)
    pub fn total_degree(&self) -> u32 {
        self.terms
            .iter()
            .map(|(_, m)| monomial_degree(m))
            .max()
            .unwrap_or(0)
    }

    /// Number of terms
    pub fn num_terms(&self) -> usize {
        self.terms.len()
    }

    /// Coefficient of the largest monomial
    pub fn leading_coeff(&self) -> Option<&BigRational> {
        self.terms.last().map(|(c, _)| c)
    }
}

fn monomial_degree(m: &Monomial) -> u32 {
    m.iter().map(|&(_, e)| e).sum()
}

/// Product of two sparse monomials (merge on variable index)
fn monomial_mul(a: &Monomial, b: &Monomial) -> Monomial {
    let mut out = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        let (va, ea) = a[i];
        let (vb, eb) = b[j];
        if va == vb {
            out.push((va, ea + eb));
            i += 1;
            j += 1;
        } else if va < vb {
            out.push((va, ea));
            i += 1;
        } else {
            out.push((vb, eb));
            j += 1;
        }
    }
    out.extend_from_slice(&a[i..]);
    out.extend_from_slice(&b[j..]);
    out
}

// =============================================================================
// Normalization (combine like terms, remove zeros, sort)
// =============================================================================

impl MultiPoly {
    /// Build from BTreeMap (map has Monomial as key, coeff as value)
    pub fn from_map(map: BTreeMap<Monomial, BigRational>) -> Self {
        let terms: Vec<Term> = map
            .into_iter()
            .filter(|(_, c)| !c.is_zero())
            .map(|(m, c)| (c, m)) // Convert to (coeff, mono) for Term
            .collect();
        Self { terms }
    }

    /// Convert to BTreeMap for operations (key=Monomial, value=coeff)
    pub fn to_map(&self) -> BTreeMap<Monomial, BigRational> {
        self.terms
            .iter()
            .map(|(c, m)| (m.clone(), c.clone()))
            .collect()
    }
}

// =============================================================================
// Arithmetic
// =============================================================================

impl MultiPoly {
    /// Negate
    pub fn neg(&self) -> Self {
        let terms = self
            .terms
            .iter()
            .map(|(c, m)| (-c.clone(), m.clone()))
            .collect();
        Self { terms }
    }

    /// Add two polynomials
    pub fn add(&self, other: &Self, budget: &PolyBudget) -> Result<Self, PolyError> {
        let mut map = self.to_map();
        for (c, m) in &other.terms {
            let entry = map.entry(m.clone()).or_insert_with(BigRational::zero);
            *entry = entry.clone() + c.clone();
        }
        let sum = Self::from_map(map);
        if sum.num_terms() > budget.max_terms {
            return Err(PolyError::BudgetExceeded);
        }
        Ok(sum)
    }

    /// Subtract
    pub fn sub(&self, other: &Self, budget: &PolyBudget) -> Result<Self, PolyError> {
        self.add(&other.neg(), budget)
    }

    /// Multiply by scalar
    pub fn mul_scalar(&self, k: &BigRational) -> Self {
        if k.is_zero() {
            return Self::zero();
        }
        let terms = self.terms.iter().map(|(c, m)| (c * k, m.clone())).collect();
        Self { terms }
    }

    /// Multiply two polynomials with budget
    pub fn mul(&self, other: &Self, budget: &PolyBudget) -> Result<Self, PolyError> {
        if self.is_zero() || other.is_zero() {
            return Ok(Self::zero());
        }

        let mut map: BTreeMap<Monomial, BigRational> = BTreeMap::new();

        for (c1, m1) in &self.terms {
            for (c2, m2) in &other.terms {
                let new_coeff = c1 * c2;
                let new_mono = monomial_mul(m1, m2);

                // Check total degree
                if monomial_degree(&new_mono) > budget.max_total_degree {
                    return Err(PolyError::BudgetExceeded);
                }

                let entry = map.entry(new_mono).or_insert_with(BigRational::zero);
                *entry = entry.clone() + new_coeff;

                // Check term count
                if map.len() > budget.max_terms {
                    return Err(PolyError::BudgetExceeded);
                }
            }
        }

        Ok(Self::from_map(map))
    }

    /// Raise to a non-negative integer power by repeated squaring
    pub fn pow(&self, exp: u32, budget: &PolyBudget) -> Result<Self, PolyError> {
        if let Some(c) = self.constant_value() {
            if !const_pow_fits(&c, u64::from(exp)) {
                return Err(PolyError::BudgetExceeded);
            }
            return Ok(Self::from_const(num_traits::pow(c, exp as usize)));
        }
        if exp > budget.max_pow_exp {
            return Err(PolyError::BudgetExceeded);
        }

        let mut result = Self::one();
        let mut base = self.clone();
        let mut e = exp;
        while e > 0 {
            if e & 1 == 1 {
                result = result.mul(&base, budget)?;
            }
            e >>= 1;
            if e > 0 {
                base = base.mul(&base, budget)?;
            }
        }
        Ok(result)
    }
}

// =============================================================================
// Content / scalar relations
// =============================================================================

/// GCD of two BigRational (as fractions)
fn gcd_bigrational(a: &BigRational, b: &BigRational) -> BigRational {
    if a.is_zero() {
        return b.abs();
    }
    if b.is_zero() {
        return a.abs();
    }
    // gcd of numerators / lcm of denominators
    let num_gcd = a.numer().gcd(b.numer());
    let den_lcm = lcm_bigint(a.denom(), b.denom());
    BigRational::new(num_gcd, den_lcm)
}

fn lcm_bigint(a: &BigInt, b: &BigInt) -> BigInt {
    if a.is_zero() || b.is_zero() {
        return BigInt::zero();
    }
    let g = a.gcd(b);
    (a / &g) * b
}

impl MultiPoly {
    /// Content: GCD of all coefficients (positive)
    pub fn content(&self) -> BigRational {
        self.terms
            .iter()
            .fold(BigRational::zero(), |g, (c, _)| gcd_bigrational(&g, c))
    }

    /// Divide by scalar (exact)
    pub fn div_scalar_exact(&self, k: &BigRational) -> Option<Self> {
        if k.is_zero() {
            return None;
        }
        let terms = self.terms.iter().map(|(c, m)| (c / k, m.clone())).collect();
        Some(Self { terms })
    }

    /// Primitive part: self / content
    pub fn primitive_part(&self) -> (BigRational, Self) {
        let c = self.content();
        if c.is_zero() || c.is_one() {
            return (c, self.clone());
        }
        let pp = self.div_scalar_exact(&c).unwrap_or_else(|| self.clone());
        (c, pp)
    }

    /// `Some(k)` when `self == k * other` for a non-zero rational `k`.
    pub fn scalar_ratio(&self, other: &Self) -> Option<BigRational> {
        if self.is_zero() || other.is_zero() || self.terms.len() != other.terms.len() {
            return None;
        }
        let mut ratio: Option<BigRational> = None;
        for ((c1, m1), (c2, m2)) in self.terms.iter().zip(other.terms.iter()) {
            if m1 != m2 {
                return None;
            }
            let k = c1 / c2;
            match &ratio {
                Some(r) if *r != k => return None,
                Some(_) => {}
                None => ratio = Some(k),
            }
        }
        ratio
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(n: i64) -> BigRational {
        BigRational::from_integer(BigInt::from(n))
    }

    /// x + 1 with x at index 0
    fn x_plus_one() -> MultiPoly {
        MultiPoly::from_var(0)
            .add(&MultiPoly::one(), &PolyBudget::default())
            .unwrap()
    }

    #[test]
    fn test_mul_expands_square() {
        let budget = PolyBudget::default();
        let p = x_plus_one();
        let sq = p.mul(&p, &budget).unwrap();
        // x^2 + 2x + 1
        assert_eq!(sq.num_terms(), 3);
        assert_eq!(sq.total_degree(), 2);
        assert_eq!(sq, p.pow(2, &budget).unwrap());
    }

    #[test]
    fn test_sub_cancels() {
        let budget = PolyBudget::default();
        let p = x_plus_one();
        assert!(p.sub(&p, &budget).unwrap().is_zero());
    }

    #[test]
    fn test_sparse_monomials_merge() {
        let budget = PolyBudget::default();
        let x = MultiPoly::from_var(0);
        let y = MultiPoly::from_var(3);
        let xy = x.mul(&y, &budget).unwrap();
        let yx = y.mul(&x, &budget).unwrap();
        assert_eq!(xy, yx);
        assert_eq!(xy.terms()[0].1, vec![(0, 1), (3, 1)]);
    }

    #[test]
    fn test_budget_exceeded() {
        let budget = PolyBudget {
            max_terms: 5,
            max_total_degree: 32,
            max_pow_exp: 24,
        };
        let p = x_plus_one();
        assert_eq!(p.pow(10, &budget), Err(PolyError::BudgetExceeded));
        assert_eq!(
            p.pow(100, &PolyBudget::default()),
            Err(PolyError::BudgetExceeded)
        );
    }

    #[test]
    fn test_constant_pow_is_exact() {
        let budget = PolyBudget::default();
        let two = MultiPoly::from_const(q(2));
        let big = two.pow(100, &budget).unwrap();
        assert_eq!(big.constant_value(), Some(num_traits::pow(q(2), 100)));
        assert!(two.pow(1_000_000, &budget).is_err());
    }

    #[test]
    fn test_constant_pow_bounds_result_size() {
        let budget = PolyBudget::default();
        let nine = MultiPoly::from_const(q(9));
        let big = nine.pow(4096, &budget).unwrap();
        assert_eq!(big.pow(4096, &budget), Err(PolyError::BudgetExceeded));
        let one = MultiPoly::from_const(q(-1));
        assert!(one.pow(1_000_000, &budget).is_ok());
    }

    #[test]
    fn test_scalar_ratio() {
        let p = x_plus_one();
        let three_p = p.mul_scalar(&q(3));
        assert_eq!(three_p.scalar_ratio(&p), Some(q(3)));
        assert_eq!(p.scalar_ratio(&MultiPoly::from_var(0)), None);
        assert_eq!(three_p.content(), q(3));
        assert_eq!(three_p.primitive_part().1, p);
    }
}
