//! Matrix answers: LaTeX environments and CAS matrix literals.

use crate::normalize::normalize;
use crate::stage::StageVerdict;
use crate::symbolic::parse_expression;
use cas_ast::{Context, ExprId};
use cas_math::matrix::Matrix;
use cas_math::{difference_is_zero, eval_f64, relative_close, structurally_equal, PolyBudget};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

static ENVIRONMENT_BEGIN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\begin\{(pmatrix|bmatrix|vmatrix|Bmatrix|matrix)\}")
        .expect("invalid matrix environment regex")
});

static ROW_SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\\\+").expect("invalid row separator regex"));

/// Parse `s` as a matrix: a LaTeX matrix environment or a `Matrix([[..]])` /
/// `[[..]]` literal.
pub fn parse_matrix(ctx: &mut Context, s: &str) -> Option<Matrix> {
    if let Some(body) = environment_body(s) {
        return parse_environment_body(ctx, body);
    }
    let id = parse_expression(ctx, s)?;
    Matrix::from_expr(ctx, id)
}

/// Text between the first `\begin{name}` that has a later `\end{name}` and
/// the nearest such `\end`. Other environments' `\end`s are skipped.
fn environment_body(s: &str) -> Option<&str> {
    ENVIRONMENT_BEGIN.captures_iter(s).find_map(|caps| {
        let begin = caps.get(0)?;
        let end_tag = format!("\\end{{{}}}", caps.get(1)?.as_str());
        let rest = &s[begin.end()..];
        rest.find(&end_tag).map(|close| &rest[..close])
    })
}

fn parse_environment_body(ctx: &mut Context, body: &str) -> Option<Matrix> {
    let mut rows = Vec::new();
    for row in ROW_SEPARATOR.split(body.trim()) {
        let row = row.trim();
        if row.is_empty() {
            continue;
        }
        let cells = row
            .split('&')
            .map(|cell| parse_expression(ctx, &normalize(cell)))
            .collect::<Option<Vec<ExprId>>>()?;
        rows.push(cells);
    }
    Matrix::from_rows(rows)
}

/// Same shape and every element equal, exactly or within `tolerance`.
/// Any parse failure or mismatch is `Failed`.
pub fn compare_matrices(a: &str, b: &str, tolerance: f64) -> StageVerdict {
    let mut ctx = Context::new();
    let (Some(ma), Some(mb)) = (parse_matrix(&mut ctx, a), parse_matrix(&mut ctx, b)) else {
        return StageVerdict::Failed;
    };
    let Some(cells) = ma.zip_cells(&mb) else {
        return StageVerdict::Failed;
    };

    let budget = PolyBudget::default();
    let exact = cells.iter().all(|&(x, y)| {
        structurally_equal(&ctx, x, y)
            || difference_is_zero(&ctx, x, y, &budget).unwrap_or(false)
    });
    if exact {
        return StageVerdict::Success;
    }

    let no_vars = HashMap::new();
    let close = cells.iter().all(|&(x, y)| {
        match (eval_f64(&ctx, x, &no_vars), eval_f64(&ctx, y, &no_vars)) {
            (Some(u), Some(v)) => relative_close(u, v, tolerance),
            _ => false,
        }
    });
    if close {
        StageVerdict::Success
    } else {
        StageVerdict::Failed
    }
}
