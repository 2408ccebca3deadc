//! Plain-text rendering of expressions.
//!
//! The output re-parses with `cas_parser::parse` to an equivalent tree, which
//! the equivalence engine relies on when logging parsed answers.

use crate::expression::{Context, Expr, ExprId};
use num_traits::Signed;
use std::fmt;

/// Borrowing wrapper that implements `Display` for an expression in a context.
pub struct DisplayExpr<'a> {
    pub context: &'a Context,
    pub id: ExprId,
}

impl<'a> DisplayExpr<'a> {
    pub fn new(context: &'a Context, id: ExprId) -> Self {
        Self { context, id }
    }

    fn child(&self, id: ExprId) -> DisplayExpr<'a> {
        DisplayExpr {
            context: self.context,
            id,
        }
    }
}

fn precedence(ctx: &Context, id: ExprId) -> u8 {
    match ctx.get(id) {
        Expr::Add(_, _) | Expr::Sub(_, _) => 1,
        Expr::Mul(_, _) | Expr::Div(_, _) => 2,
        Expr::Number(n) if n.is_negative() => 1,
        Expr::Number(n) if !n.is_integer() => 2,
        Expr::Neg(_) => 3,
        Expr::Pow(_, _) => 4,
        _ => 5,
    }
}

impl DisplayExpr<'_> {
    /// Write `id`, parenthesized when its precedence is below `min`.
    fn write_operand(&self, f: &mut fmt::Formatter<'_>, id: ExprId, min: u8) -> fmt::Result {
        if precedence(self.context, id) < min {
            write!(f, "({})", self.child(id))
        } else {
            write!(f, "{}", self.child(id))
        }
    }
}

impl fmt::Display for DisplayExpr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ctx = self.context;
        match ctx.get(self.id) {
            Expr::Number(n) => {
                if n.is_integer() {
                    write!(f, "{}", n.numer())
                } else {
                    write!(f, "{}/{}", n.numer(), n.denom())
                }
            }
            Expr::Constant(c) => write!(f, "{}", c.name()),
            Expr::Variable(sym) => write!(f, "{}", ctx.sym_name(*sym)),
            Expr::Add(l, r) => {
                self.write_operand(f, *l, 1)?;
                write!(f, " + ")?;
                self.write_operand(f, *r, 2)
            }
            Expr::Sub(l, r) => {
                self.write_operand(f, *l, 1)?;
                write!(f, " - ")?;
                // a - (b - c) keeps its parens
                self.write_operand(f, *r, 2)
            }
            Expr::Mul(l, r) => {
                self.write_operand(f, *l, 2)?;
                write!(f, " * ")?;
                self.write_operand(f, *r, 3)
            }
            Expr::Div(l, r) => {
                self.write_operand(f, *l, 2)?;
                write!(f, " / ")?;
                self.write_operand(f, *r, 3)
            }
            Expr::Pow(b, e) => {
                self.write_operand(f, *b, 5)?;
                write!(f, "^")?;
                self.write_operand(f, *e, 5)
            }
            Expr::Neg(e) => {
                write!(f, "-")?;
                self.write_operand(f, *e, 4)
            }
            Expr::Function(name, args) => {
                write!(f, "{}(", ctx.sym_name(*name))?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", self.child(*arg))?;
                }
                write!(f, ")")
            }
            Expr::Matrix { rows, cols, data } => {
                write!(f, "[")?;
                for r in 0..*rows {
                    if r > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "[")?;
                    for c in 0..*cols {
                        if c > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{}", self.child(data[r * cols + c]))?;
                    }
                    write!(f, "]")?;
                }
                write!(f, "]")
            }
        }
    }
}
