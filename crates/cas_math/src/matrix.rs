use cas_ast::{Context, Expr, ExprId};

/// Matrix view over an `Expr::Matrix` node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matrix {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<ExprId>,
}

impl Matrix {
    /// Create a Matrix from an Expr::Matrix
    pub fn from_expr(ctx: &Context, id: ExprId) -> Option<Self> {
        if let Expr::Matrix { rows, cols, data } = ctx.get(id) {
            Some(Matrix {
                rows: *rows,
                cols: *cols,
                data: data.clone(),
            })
        } else {
            None
        }
    }

    /// Build from row-major rows; None when rows are ragged or empty
    pub fn from_rows(rows: Vec<Vec<ExprId>>) -> Option<Self> {
        let cols = rows.first()?.len();
        if cols == 0 || rows.iter().any(|r| r.len() != cols) {
            return None;
        }
        Some(Matrix {
            rows: rows.len(),
            cols,
            data: rows.into_iter().flatten().collect(),
        })
    }

    /// Convert Matrix back to Expr::Matrix
    pub fn to_expr(&self, ctx: &mut Context) -> Option<ExprId> {
        ctx.matrix(self.rows, self.cols, self.data.clone()).ok()
    }

    pub fn same_shape(&self, other: &Self) -> bool {
        self.rows == other.rows && self.cols == other.cols
    }

    pub fn get(&self, row: usize, col: usize) -> Option<ExprId> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.data.get(row * self.cols + col).copied()
    }

    /// Element pairs in row-major order; None when shapes differ
    pub fn zip_cells(&self, other: &Self) -> Option<Vec<(ExprId, ExprId)>> {
        if !self.same_shape(other) {
            return None;
        }
        Some(
            self.data
                .iter()
                .copied()
                .zip(other.data.iter().copied())
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cas_parser::parse;

    #[test]
    fn view_of_parsed_matrix() {
        let mut ctx = Context::new();
        let id = parse("[[1, 2], [3, 4]]", &mut ctx).unwrap();
        let m = Matrix::from_expr(&ctx, id).unwrap();
        assert_eq!((m.rows, m.cols), (2, 2));
        let three = ctx.num(3);
        assert_eq!(m.get(1, 0), Some(three));
        assert_eq!(m.get(2, 0), None);
        assert_eq!(m.to_expr(&mut ctx), Some(id));
    }

    #[test]
    fn ragged_rows_rejected() {
        let mut ctx = Context::new();
        let one = ctx.num(1);
        assert!(Matrix::from_rows(vec![vec![one, one], vec![one]]).is_none());
        assert!(Matrix::from_rows(vec![]).is_none());
        let m = Matrix::from_rows(vec![vec![one], vec![one]]).unwrap();
        let row = Matrix::from_rows(vec![vec![one, one]]).unwrap();
        assert!(m.zip_cells(&row).is_none());
        assert_eq!(m.zip_cells(&m).map(|c| c.len()), Some(2));
    }
}
