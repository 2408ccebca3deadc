pub mod error;
pub mod latex_parser;
pub mod parser;

pub use error::ParseError;
pub use latex_parser::{parse_latex, parse_latex_statement};
pub use parser::{parse, parse_statement, Statement};
