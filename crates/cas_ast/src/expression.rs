//! Arena-backed expression tree.
//!
//! Expressions are stored in a [`Context`] and referenced by [`ExprId`].
//! Nodes are hash-consed: adding a structurally identical node twice returns
//! the same id, so `ExprId` equality implies structural equality.

use crate::error::AstError;
use crate::symbol::{SymbolId, SymbolTable};
use num_bigint::BigInt;
use num_rational::BigRational;
use rustc_hash::FxHashMap;

/// Handle to a node stored in a [`Context`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExprId(u32);

impl ExprId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Constant {
    Pi,
    E,
    /// Imaginary unit
    I,
    Infinity,
}

impl Constant {
    pub fn name(self) -> &'static str {
        match self {
            Constant::Pi => "pi",
            Constant::E => "e",
            Constant::I => "i",
            Constant::Infinity => "oo",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expr {
    Number(BigRational),
    Constant(Constant),
    Variable(SymbolId),
    Add(ExprId, ExprId),
    Sub(ExprId, ExprId),
    Mul(ExprId, ExprId),
    Div(ExprId, ExprId),
    Pow(ExprId, ExprId),
    Neg(ExprId),
    Function(SymbolId, Vec<ExprId>), // e.g., sin(x), log(x, 10)
    /// Row-major storage, `data.len() == rows * cols`
    Matrix {
        rows: usize,
        cols: usize,
        data: Vec<ExprId>,
    },
}

/// Owner of every expression node and interned symbol.
#[derive(Debug, Clone, Default)]
pub struct Context {
    nodes: Vec<Expr>,
    interned: FxHashMap<Expr, ExprId>,
    symbols: SymbolTable,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node, reusing the existing id when an identical node exists.
    pub fn add(&mut self, expr: Expr) -> ExprId {
        if let Some(&id) = self.interned.get(&expr) {
            return id;
        }
        let id = ExprId(self.nodes.len() as u32);
        self.nodes.push(expr.clone());
        self.interned.insert(expr, id);
        id
    }

    /// # Panics
    /// Panics if `id` was not produced by this context.
    #[inline]
    pub fn get(&self, id: ExprId) -> &Expr {
        &self.nodes[id.index()]
    }

    pub fn num(&mut self, n: i64) -> ExprId {
        self.add(Expr::Number(BigRational::from_integer(BigInt::from(n))))
    }

    pub fn rational(&mut self, r: BigRational) -> ExprId {
        self.add(Expr::Number(r))
    }

    pub fn constant(&mut self, c: Constant) -> ExprId {
        self.add(Expr::Constant(c))
    }

    pub fn var(&mut self, name: &str) -> ExprId {
        let sym = self.symbols.intern(name);
        self.add(Expr::Variable(sym))
    }

    pub fn call(&mut self, name: &str, args: Vec<ExprId>) -> ExprId {
        let sym = self.symbols.intern(name);
        self.add(Expr::Function(sym, args))
    }

    /// Build a matrix node, validating that `data` fills `rows x cols`.
    pub fn matrix(
        &mut self,
        rows: usize,
        cols: usize,
        data: Vec<ExprId>,
    ) -> Result<ExprId, AstError> {
        if rows == 0 || cols == 0 {
            return Err(AstError::InvalidMatrix {
                reason: "matrix must have at least one row and one column".to_string(),
            });
        }
        if rows * cols != data.len() {
            return Err(AstError::InvalidMatrix {
                reason: format!(
                    "{}x{} matrix needs {} elements, got {}",
                    rows,
                    cols,
                    rows * cols,
                    data.len()
                ),
            });
        }
        Ok(self.add(Expr::Matrix { rows, cols, data }))
    }

    #[inline]
    pub fn sym_name(&self, id: SymbolId) -> &str {
        self.symbols.resolve(id)
    }

    pub fn intern_symbol(&mut self, name: &str) -> SymbolId {
        self.symbols.intern(name)
    }

    /// Name of the function called at `id`, if `id` is a function call.
    pub fn function_name(&self, id: ExprId) -> Option<&str> {
        match self.get(id) {
            Expr::Function(sym, _) => Some(self.sym_name(*sym)),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_nodes_share_an_id() {
        let mut ctx = Context::new();
        let x1 = ctx.var("x");
        let x2 = ctx.var("x");
        assert_eq!(x1, x2);

        let two = ctx.num(2);
        let a = ctx.add(Expr::Mul(two, x1));
        let b = ctx.add(Expr::Mul(two, x2));
        assert_eq!(a, b);
        assert_eq!(ctx.len(), 3);
    }

    #[test]
    fn matrix_rejects_bad_dimensions() {
        let mut ctx = Context::new();
        let one = ctx.num(1);
        let err = ctx.matrix(2, 2, vec![one, one, one]).unwrap_err();
        assert!(matches!(err, AstError::InvalidMatrix { .. }));
        assert!(ctx.matrix(0, 0, vec![]).is_err());
        assert!(ctx.matrix(1, 3, vec![one, one, one]).is_ok());
    }

    #[test]
    fn function_name_resolves() {
        let mut ctx = Context::new();
        let x = ctx.var("x");
        let s = ctx.call("sin", vec![x]);
        assert_eq!(ctx.function_name(s), Some("sin"));
        assert_eq!(ctx.function_name(x), None);
    }
}
