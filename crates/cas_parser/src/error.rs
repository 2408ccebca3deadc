use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Parse error: {0}")]
    NomError(String),
    #[error("Unconsumed input: {0}")]
    UnconsumedInput(String),
    #[error("Empty input")]
    EmptyInput,
    #[error("Invalid matrix: {0}")]
    InvalidMatrix(String),
    #[error("Failed to tokenize at: '{0}'")]
    Tokenize(String),
    #[error("LaTeX parse error: {0}")]
    Latex(String),
    /// A run of letters that reads as words rather than a product of symbols
    #[error("Text is not an expression: {0}")]
    ProseText(String),
}

impl From<cas_ast::AstError> for ParseError {
    fn from(err: cas_ast::AstError) -> Self {
        ParseError::InvalidMatrix(err.to_string())
    }
}
