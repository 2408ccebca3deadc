pub mod display;
pub mod error;
pub mod expression;
pub mod symbol;

pub use display::DisplayExpr;
pub use error::AstError;
pub use expression::{Constant, Context, Expr, ExprId};
pub use symbol::{SymbolId, SymbolTable};

/// An equation `lhs = rhs` whose sides live in a [`Context`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Equation {
    pub lhs: ExprId, // Left Hand Side
    pub rhs: ExprId, // Right Hand Side
}
