//! Free-variable collection.

use cas_ast::{Context, Expr, ExprId};
use std::collections::BTreeSet;

/// Names of all variables under `root`, sorted.
pub fn collect_variables(ctx: &Context, root: ExprId) -> BTreeSet<String> {
    let mut vars = BTreeSet::new();
    let mut stack = vec![root];
    let mut seen = BTreeSet::new();

    while let Some(id) = stack.pop() {
        // Shared subtrees are visited once
        if !seen.insert(id) {
            continue;
        }
        match ctx.get(id) {
            Expr::Variable(sym) => {
                vars.insert(ctx.sym_name(*sym).to_string());
            }
            Expr::Number(_) | Expr::Constant(_) => {}
            Expr::Add(l, r)
            | Expr::Sub(l, r)
            | Expr::Mul(l, r)
            | Expr::Div(l, r)
            | Expr::Pow(l, r) => {
                stack.push(*l);
                stack.push(*r);
            }
            Expr::Neg(e) => stack.push(*e),
            Expr::Function(_, args) => stack.extend(args.iter().copied()),
            Expr::Matrix { data, .. } => stack.extend(data.iter().copied()),
        }
    }
    vars
}

#[cfg(test)]
mod tests {
    use super::*;
    use cas_parser::parse;

    #[test]
    fn collects_sorted_unique_names() {
        let mut ctx = Context::new();
        let e = parse("y*sin(x) + x^2 + pi", &mut ctx).unwrap();
        let vars: Vec<String> = collect_variables(&ctx, e).into_iter().collect();
        assert_eq!(vars, vec!["x".to_string(), "y".to_string()]);
    }
}
