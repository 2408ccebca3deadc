pub mod canonical_forms;
pub mod eval;
pub mod matrix;
pub mod multipoly;
pub mod numeric;
pub mod opaque_atoms;
pub mod poly_compare;
pub mod rational_form;
pub mod variables;

pub use canonical_forms::{canonical_key, structurally_equal};
pub use eval::{eval_f64, numerically_close, relative_close};
pub use multipoly::{MultiPoly, PolyBudget, PolyError};
pub use opaque_atoms::AtomTable;
pub use poly_compare::{difference_is_zero, equation_relation, EquationRelation};
pub use rational_form::{rational_form, RationalForm};
pub use variables::collect_variables;
