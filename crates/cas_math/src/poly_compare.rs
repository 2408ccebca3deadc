//! Rational-form comparison helpers for equivalence checks.
//!
//! These utilities compare expressions by converting to [`RationalForm`]
//! against one shared atom table, instead of relying on AST shape.

use crate::multipoly::{PolyBudget, PolyError};
use crate::opaque_atoms::AtomTable;
use crate::rational_form::{rational_form, RationalForm};
use cas_ast::{Context, Equation, ExprId};
use num_rational::BigRational;

/// Relation between the zero-forms `lhs - rhs` of two equations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EquationRelation {
    /// Identical zero-forms
    Same,
    /// One zero-form is a non-zero constant multiple of the other
    Proportional(BigRational),
    Unrelated,
}

/// `a - b == 0` as rational functions.
pub fn difference_is_zero(
    ctx: &Context,
    a: ExprId,
    b: ExprId,
    budget: &PolyBudget,
) -> Result<bool, PolyError> {
    let mut atoms = AtomTable::new();
    let fa = rational_form(ctx, a, &mut atoms, budget)?;
    let fb = rational_form(ctx, b, &mut atoms, budget)?;
    fa.same_value(&fb, budget)
}

fn zero_form(
    ctx: &Context,
    eq: Equation,
    atoms: &mut AtomTable,
    budget: &PolyBudget,
) -> Result<RationalForm, PolyError> {
    let lhs = rational_form(ctx, eq.lhs, atoms, budget)?;
    let rhs = rational_form(ctx, eq.rhs, atoms, budget)?;
    lhs.sub(&rhs, budget)
}

/// Compare two equations by their zero-forms.
pub fn equation_relation(
    ctx: &Context,
    a: Equation,
    b: Equation,
    budget: &PolyBudget,
) -> Result<EquationRelation, PolyError> {
    let mut atoms = AtomTable::new();
    let za = zero_form(ctx, a, &mut atoms, budget)?;
    let zb = zero_form(ctx, b, &mut atoms, budget)?;

    if za.same_value(&zb, budget)? {
        return Ok(EquationRelation::Same);
    }
    match za.constant_ratio(&zb, budget)? {
        Some(k) => Ok(EquationRelation::Proportional(k)),
        None => Ok(EquationRelation::Unrelated),
    }
}
