//! LaTeX to Expression Parser
//!
//! Parses LaTeX answer strings (`\frac{10}{2}`, `2\sqrt{3}`, `\sin^{2}x`) into
//! Expr trees. Uses a hybrid approach: nom-based tokenizer + recursive descent parser.
//!
//! Letters are single-character symbols, so `xy` is `x * y`. A run of three or
//! more letters that is not a known function name is treated as prose and
//! rejected, which keeps sentences from being read as long products.
//!
//! # Example
//! ```ignore
//! let ctx = &mut Context::new();
//! let expr_id = parse_latex(ctx, "\\frac{1}{2}")?;
//! // expr_id now represents Div(1, 2)
//! ```

use crate::error::ParseError;
use crate::parser::{decimal_to_rational, nesting_depth, Statement, MAX_NESTING};
use cas_ast::{Constant, Context, Equation, Expr, ExprId};
use nom::{
    branch::alt,
    bytes::complete::take_while1,
    character::complete::{anychar, char, digit0, digit1},
    combinator::{map, opt},
    sequence::{pair, preceded},
    IResult,
};

// ============================================================================
// Token Definition
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    Number(String), // "123", "7.75"
    Var(String),    // "x", "alpha"
    Func(String),   // "sin", "ln", ...

    // Operators
    Plus,       // +
    Minus,      // -
    Times,      // *, \cdot, \times
    Divide,     // /, \div
    Caret,      // ^
    Underscore, // _
    Bang,       // !
    Pipe,       // |
    Equals,     // =

    // Grouping
    LBrace,   // {
    RBrace,   // }
    LParen,   // (
    RParen,   // )
    LBracket, // [
    RBracket, // ]

    // LaTeX Commands
    Frac,  // \frac, \dfrac, \tfrac
    Sqrt,  // \sqrt
    Pi,    // \pi
    Infty, // \infty
    Text,  // \text (followed by content in braces)
    Skip,  // \left, \right, \displaystyle, spacing commands
}

/// Multi-letter words read as function names when they appear bare.
const FUNCTION_WORDS: &[&str] = &[
    "sin", "cos", "tan", "cot", "sec", "csc", "arcsin", "arccos", "arctan", "sinh", "cosh",
    "tanh", "ln", "log", "exp", "sqrt", "abs",
];

fn command_token(name: &str) -> Option<Token> {
    let token = match name {
        "frac" | "dfrac" | "tfrac" => Token::Frac,
        "sqrt" => Token::Sqrt,
        "pi" => Token::Pi,
        "infty" => Token::Infty,
        "cdot" | "times" => Token::Times,
        "div" => Token::Divide,
        "text" | "textbf" | "textit" | "textrm" | "mbox" => Token::Text,
        "left" | "right" | "displaystyle" | "mathrm" | "mathbf" | "mathit" | "operatorname"
        | "quad" | "qquad" => Token::Skip,
        "sin" | "cos" | "tan" | "cot" | "sec" | "csc" | "arcsin" | "arccos" | "arctan"
        | "sinh" | "cosh" | "tanh" | "ln" | "log" | "exp" => Token::Func(name.to_string()),
        _ => return None,
    };
    Some(token)
}

// ============================================================================
// Tokenizer (using nom)
// ============================================================================

fn is_alpha(c: char) -> bool {
    c.is_ascii_alphabetic()
}

/// Parse a LaTeX command like \frac, \sqrt, \sin, etc.
///
/// Whitespace is gone after normalization, so `\sin x` arrives as `\sinx`.
/// An unknown command is split at its longest known prefix; with no known
/// prefix it becomes a named variable (`\alpha`).
fn latex_command(input: &str) -> IResult<&str, Token> {
    let (after_slash, _) = char('\\')(input)?;

    if let Ok((rest, c)) = anychar::<_, nom::error::Error<&str>>(after_slash) {
        match c {
            ',' | ';' | ':' | '!' | ' ' => return Ok((rest, Token::Skip)),
            '{' => return Ok((rest, Token::LBrace)),
            '}' => return Ok((rest, Token::RBrace)),
            _ => {}
        }
    }

    let (rest, cmd) = take_while1(is_alpha)(after_slash)?;
    if let Some(token) = command_token(cmd) {
        return Ok((rest, token));
    }

    let prefix = (1..cmd.len())
        .rev()
        .find_map(|len| command_token(&cmd[..len]).map(|token| (len, token)));
    match prefix {
        Some((len, token)) => Ok((&after_slash[len..], token)),
        None => Ok((rest, Token::Var(cmd.to_string()))),
    }
}

/// Parse a decimal number: 12, 7.75, 3.
fn number(input: &str) -> IResult<&str, Token> {
    map(
        pair(digit1, opt(preceded(char('.'), digit0))),
        |(int_part, frac): (&str, Option<&str>)| match frac {
            Some(frac) if !frac.is_empty() => Token::Number(format!("{}.{}", int_part, frac)),
            _ => Token::Number(int_part.to_string()),
        },
    )(input)
}

/// Parse a single-character operator or grouping symbol
fn operator_or_grouping(input: &str) -> IResult<&str, Token> {
    alt((
        map(char('+'), |_| Token::Plus),
        map(char('-'), |_| Token::Minus),
        map(char('*'), |_| Token::Times),
        map(char('/'), |_| Token::Divide),
        map(char('^'), |_| Token::Caret),
        map(char('_'), |_| Token::Underscore),
        map(char('!'), |_| Token::Bang),
        map(char('|'), |_| Token::Pipe),
        map(char('='), |_| Token::Equals),
        map(char('{'), |_| Token::LBrace),
        map(char('}'), |_| Token::RBrace),
        map(char('('), |_| Token::LParen),
        map(char(')'), |_| Token::RParen),
        map(char('['), |_| Token::LBracket),
        map(char(']'), |_| Token::RBracket),
    ))(input)
}

/// Parse a single token (whitespace already skipped)
fn token(input: &str) -> IResult<&str, Token> {
    alt((latex_command, number, operator_or_grouping))(input)
}

/// Classify a bare run of letters.
fn push_word(word: &str, tokens: &mut Vec<Token>) -> Result<(), ParseError> {
    if FUNCTION_WORDS.contains(&word) {
        tokens.push(Token::Func(word.to_string()));
        return Ok(());
    }
    if word.len() >= 3 {
        return Err(ParseError::ProseText(word.to_string()));
    }
    tokens.extend(word.chars().map(|c| Token::Var(c.to_string())));
    Ok(())
}

/// Tokenize entire LaTeX string
pub fn tokenize(input: &str) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();
    let mut remaining = input;

    loop {
        // Skip whitespace
        remaining = remaining.trim_start();
        if remaining.is_empty() {
            break;
        }

        if let Ok((rest, word)) = take_while1::<_, _, nom::error::Error<&str>>(is_alpha)(remaining)
        {
            push_word(word, &mut tokens)?;
            remaining = rest;
            continue;
        }

        match token(remaining) {
            Ok((rest, Token::Text)) => {
                // Skip the { content } after \text (labels, not math)
                remaining = skip_braced(rest);
            }
            Ok((rest, Token::Skip)) => remaining = rest,
            Ok((rest, tok)) => {
                tokens.push(tok);
                remaining = rest;
            }
            Err(_) => {
                let shown: String = remaining.chars().take(20).collect();
                return Err(ParseError::Tokenize(shown));
            }
        }
    }

    Ok(tokens)
}

/// Drop a leading `{...}` group (balanced), if present.
fn skip_braced(input: &str) -> &str {
    let trimmed = input.trim_start();
    if !trimmed.starts_with('{') {
        return input;
    }
    let mut depth = 0usize;
    for (i, c) in trimmed.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return &trimmed[i + 1..];
                }
            }
            _ => {}
        }
    }
    input
}

// ============================================================================
// Parser (Recursive Descent)
// ============================================================================

pub struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    ctx: &'a mut Context,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token], ctx: &'a mut Context) -> Self {
        Self {
            tokens,
            pos: 0,
            ctx,
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&Token> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, expected: &Token) -> Result<(), ParseError> {
        match self.advance() {
            Some(tok) if tok == expected => Ok(()),
            Some(tok) => Err(ParseError::Latex(format!(
                "Expected {:?}, got {:?}",
                expected, tok
            ))),
            None => Err(ParseError::Latex(format!(
                "Expected {:?}, got EOF",
                expected
            ))),
        }
    }

    fn is_finished(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Parse expression (lowest precedence: addition/subtraction)
    pub fn parse_expr(&mut self) -> Result<ExprId, ParseError> {
        let mut left = self.parse_term()?;

        while let Some(tok) = self.peek() {
            match tok {
                Token::Plus => {
                    self.advance();
                    let right = self.parse_term()?;
                    left = self.ctx.add(Expr::Add(left, right));
                }
                Token::Minus => {
                    self.advance();
                    let right = self.parse_term()?;
                    left = self.ctx.add(Expr::Sub(left, right));
                }
                _ => break,
            }
        }

        Ok(left)
    }

    /// Parse term (multiplication - implicit or explicit with \cdot, division with / or \div)
    fn parse_term(&mut self) -> Result<ExprId, ParseError> {
        let mut left = self.parse_unary()?;

        while let Some(tok) = self.peek() {
            match tok {
                Token::Times => {
                    self.advance();
                    let right = self.parse_unary()?;
                    left = self.ctx.add(Expr::Mul(left, right));
                }
                Token::Divide => {
                    self.advance();
                    let right = self.parse_unary()?;
                    left = self.ctx.add(Expr::Div(left, right));
                }
                // Implicit multiplication: two atoms next to each other
                Token::Var(_)
                | Token::Number(_)
                | Token::Func(_)
                | Token::Frac
                | Token::Sqrt
                | Token::Pi
                | Token::Infty
                | Token::LBrace
                | Token::LParen => {
                    let right = self.parse_power()?;
                    left = self.ctx.add(Expr::Mul(left, right));
                }
                _ => break,
            }
        }

        Ok(left)
    }

    /// Parse unary (negation); `-3` folds into the literal
    fn parse_unary(&mut self) -> Result<ExprId, ParseError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.advance();
                let inner = self.parse_unary()?;
                Ok(self.negate(inner))
            }
            Some(Token::Plus) => {
                self.advance();
                self.parse_unary()
            }
            _ => self.parse_power(),
        }
    }

    fn negate(&mut self, inner: ExprId) -> ExprId {
        if let Expr::Number(n) = self.ctx.get(inner) {
            let negated = -n.clone();
            return self.ctx.rational(negated);
        }
        self.ctx.add(Expr::Neg(inner))
    }

    /// Parse power (exponentiation with ^, right associative)
    fn parse_power(&mut self) -> Result<ExprId, ParseError> {
        let base = self.parse_postfix()?;

        if let Some(Token::Caret) = self.peek() {
            self.advance();
            let exp = self.parse_exponent()?;
            Ok(self.ctx.add(Expr::Pow(base, exp)))
        } else {
            Ok(base)
        }
    }

    /// Exponent is typically in braces; a bare exponent takes one (signed) atom
    fn parse_exponent(&mut self) -> Result<ExprId, ParseError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.advance();
                let inner = self.parse_exponent()?;
                Ok(self.negate(inner))
            }
            _ => self.parse_power(),
        }
    }

    /// Factorial: n!
    fn parse_postfix(&mut self) -> Result<ExprId, ParseError> {
        let mut atom = self.parse_atom()?;
        while let Some(Token::Bang) = self.peek() {
            self.advance();
            atom = self.ctx.call("factorial", vec![atom]);
        }
        Ok(atom)
    }

    /// Braced group, or a single atom for `\frac12`-style shorthand
    fn parse_argument(&mut self) -> Result<ExprId, ParseError> {
        if let Some(Token::LBrace) = self.peek() {
            self.advance();
            let expr = self.parse_expr()?;
            self.expect(&Token::RBrace)?;
            Ok(expr)
        } else {
            self.parse_atom()
        }
    }

    /// Subscript text after `_`: `x_1`, `x_{12}`, `a_{n}`
    fn parse_subscript(&mut self) -> Result<String, ParseError> {
        match self.advance().cloned() {
            Some(Token::Number(s)) | Some(Token::Var(s)) => Ok(s),
            Some(Token::LBrace) => {
                let mut text = String::new();
                loop {
                    match self.advance().cloned() {
                        Some(Token::RBrace) => break,
                        Some(Token::Number(s)) | Some(Token::Var(s)) => text.push_str(&s),
                        other => {
                            return Err(ParseError::Latex(format!(
                                "Unsupported subscript token: {:?}",
                                other
                            )))
                        }
                    }
                }
                Ok(text)
            }
            other => Err(ParseError::Latex(format!(
                "Unsupported subscript token: {:?}",
                other
            ))),
        }
    }

    /// `\sin x`, `\sin(x)`, `\sin^{2}x`, `\log_{2}(8)`
    fn parse_function(&mut self, name: String) -> Result<ExprId, ParseError> {
        let mut base = None;
        if name == "log" {
            if let Some(Token::Underscore) = self.peek() {
                self.advance();
                base = Some(self.parse_argument()?);
            }
        }

        let mut power = None;
        if let Some(Token::Caret) = self.peek() {
            self.advance();
            power = Some(self.parse_exponent()?);
        }

        let arg = match self.peek() {
            Some(Token::LParen) | Some(Token::LBrace) => self.parse_atom()?,
            _ => self.parse_power()?,
        };

        let call = match (name.as_str(), base) {
            ("exp", _) => {
                let e = self.ctx.constant(Constant::E);
                self.ctx.add(Expr::Pow(e, arg))
            }
            (_, Some(b)) => self.ctx.call(&name, vec![arg, b]),
            (_, None) => self.ctx.call(&name, vec![arg]),
        };

        Ok(match power {
            Some(p) => self.ctx.add(Expr::Pow(call, p)),
            None => call,
        })
    }

    /// Parse atom (numbers, variables, braced groups, fractions, etc.)
    fn parse_atom(&mut self) -> Result<ExprId, ParseError> {
        match self.advance().cloned() {
            Some(Token::Number(s)) => {
                let (int_part, frac_part) = s.split_once('.').unwrap_or((s.as_str(), ""));
                let value = decimal_to_rational(int_part, frac_part);
                Ok(self.ctx.rational(value))
            }
            Some(Token::Var(name)) => {
                if let Some(Token::Underscore) = self.peek() {
                    self.advance();
                    let sub = self.parse_subscript()?;
                    return Ok(self.ctx.var(&format!("{}_{}", name, sub)));
                }
                Ok(match name.as_str() {
                    "e" => self.ctx.constant(Constant::E),
                    "i" => self.ctx.constant(Constant::I),
                    _ => self.ctx.var(&name),
                })
            }
            Some(Token::Pi) => Ok(self.ctx.constant(Constant::Pi)),
            Some(Token::Infty) => Ok(self.ctx.constant(Constant::Infinity)),
            Some(Token::LBrace) => {
                let expr = self.parse_expr()?;
                self.expect(&Token::RBrace)?;
                Ok(expr)
            }
            Some(Token::LParen) => {
                let expr = self.parse_expr()?;
                self.expect(&Token::RParen)?;
                Ok(expr)
            }
            Some(Token::LBracket) => {
                let expr = self.parse_expr()?;
                self.expect(&Token::RBracket)?;
                Ok(expr)
            }
            Some(Token::Pipe) => {
                let expr = self.parse_expr()?;
                self.expect(&Token::Pipe)?;
                Ok(self.ctx.call("abs", vec![expr]))
            }
            Some(Token::Frac) => {
                let numer = self.parse_argument()?;
                let denom = self.parse_argument()?;
                Ok(self.ctx.add(Expr::Div(numer, denom)))
            }
            Some(Token::Sqrt) => {
                // Check for optional index: \sqrt[n]{...}
                if let Some(Token::LBracket) = self.peek() {
                    self.advance();
                    let index = self.parse_expr()?;
                    self.expect(&Token::RBracket)?;
                    let radicand = self.parse_argument()?;
                    Ok(self.ctx.call("root", vec![radicand, index]))
                } else {
                    let radicand = self.parse_argument()?;
                    Ok(self.ctx.call("sqrt", vec![radicand]))
                }
            }
            Some(Token::Func(name)) => self.parse_function(name),
            Some(tok) => Err(ParseError::Latex(format!(
                "Unexpected token in atom: {:?}",
                tok
            ))),
            None => Err(ParseError::Latex("Unexpected end of input".to_string())),
        }
    }
}

// ============================================================================
// Public API
// ============================================================================

fn prepare(latex: &str) -> Result<Vec<Token>, ParseError> {
    if nesting_depth(latex) > MAX_NESTING {
        return Err(ParseError::Latex(format!(
            "nesting deeper than {} levels",
            MAX_NESTING
        )));
    }
    // {,} is a thousands separator inside numbers
    let tokens = tokenize(&latex.replace("{,}", ""))?;
    if tokens.is_empty() {
        return Err(ParseError::EmptyInput);
    }
    Ok(tokens)
}

fn parse_tokens(ctx: &mut Context, tokens: &[Token]) -> Result<ExprId, ParseError> {
    if tokens.is_empty() {
        return Err(ParseError::EmptyInput);
    }
    let mut parser = Parser::new(tokens, ctx);
    let result = parser.parse_expr()?;

    // Ensure all tokens were consumed
    if !parser.is_finished() {
        return Err(ParseError::UnconsumedInput(format!(
            "{:?}",
            &parser.tokens[parser.pos..]
        )));
    }

    Ok(result)
}

/// Parse a LaTeX string into an expression
pub fn parse_latex(ctx: &mut Context, latex: &str) -> Result<ExprId, ParseError> {
    let tokens = prepare(latex)?;
    parse_tokens(ctx, &tokens)
}

/// Parse a LaTeX equation `lhs = rhs`, or a plain LaTeX expression.
pub fn parse_latex_statement(ctx: &mut Context, latex: &str) -> Result<Statement, ParseError> {
    let tokens = prepare(latex)?;
    let equals: Vec<usize> = tokens
        .iter()
        .enumerate()
        .filter(|(_, t)| **t == Token::Equals)
        .map(|(i, _)| i)
        .collect();

    match equals.as_slice() {
        [] => parse_tokens(ctx, &tokens).map(Statement::Expression),
        [at] => {
            let lhs = parse_tokens(ctx, &tokens[..*at])?;
            let rhs = parse_tokens(ctx, &tokens[at + 1..])?;
            Ok(Statement::Equation(Equation { lhs, rhs }))
        }
        _ => Err(ParseError::Latex("chained equalities are not supported".to_string())),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use cas_ast::DisplayExpr;

    /// Helper: test parsing works and return plain-text output
    fn test_parse(latex: &str) -> String {
        let mut ctx = Context::new();
        let expr_id = parse_latex(&mut ctx, latex)
            .unwrap_or_else(|e| panic!("Failed to parse {}: {}", latex, e));
        DisplayExpr::new(&ctx, expr_id).to_string()
    }

    // Level 1: Numbers and Variables
    #[test]
    fn test_parse_number() {
        assert_eq!(test_parse("5"), "5");
        assert_eq!(test_parse("7.75"), "31/4");
        assert_eq!(test_parse("1{,}000"), "1000");
    }

    #[test]
    fn test_parse_negative() {
        assert_eq!(test_parse("-3"), "-3");
        assert_eq!(test_parse("-x"), "-x");
    }

    // Level 2: Basic Operations
    #[test]
    fn test_parse_fraction() {
        assert_eq!(test_parse("\\frac{10}{2}"), "10 / 2");
        assert_eq!(test_parse("\\dfrac{a}{b}"), "a / b");
    }

    #[test]
    fn test_parse_power() {
        assert_eq!(test_parse("{x}^{2}"), "x^2");
        assert_eq!(test_parse("e^{i\\pi}"), "e^(i * pi)");
        assert_eq!(test_parse("2^-1"), "2^(-1)");
    }

    #[test]
    fn test_parse_sqrt() {
        assert_eq!(test_parse("\\sqrt{x}"), "sqrt(x)");
        assert_eq!(test_parse("\\sqrt[3]{8}"), "root(8, 3)");
        assert_eq!(test_parse("2\\sqrt{3}"), "2 * sqrt(3)");
    }

    // Level 3: Constants and Functions
    #[test]
    fn test_parse_trig() {
        assert_eq!(test_parse("\\sin(x)"), "sin(x)");
        assert_eq!(test_parse("\\sinx"), "sin(x)");
        assert_eq!(test_parse("\\cos^{2}x"), "cos(x)^2");
        assert_eq!(test_parse("\\log_{2}(8)"), "log(8, 2)");
    }

    #[test]
    fn test_parse_implicit_mult() {
        assert_eq!(test_parse("xy"), "x * y");
        assert_eq!(test_parse("2x"), "2 * x");
        assert_eq!(test_parse("\\pir^{2}"), "pi * r^2");
        assert_eq!(test_parse("(x+1)(x-1)"), "(x + 1) * (x - 1)");
    }

    #[test]
    fn test_parse_explicit_mult() {
        assert_eq!(test_parse("2\\cdot 3"), "2 * 3");
        assert_eq!(test_parse("6\\div3"), "6 / 3");
    }

    #[test]
    fn test_subscripts_and_spacing() {
        assert_eq!(test_parse("x_{1}+x_2"), "x_1 + x_2");
        assert_eq!(test_parse("\\left(1\\right)"), "1");
        assert_eq!(test_parse("3\\,\\text{cm}"), "3");
        assert_eq!(test_parse("|x-1|"), "abs(x - 1)");
        assert_eq!(test_parse("\\alpha+1"), "alpha + 1");
    }

    #[test]
    fn test_prose_is_rejected() {
        let mut ctx = Context::new();
        assert!(matches!(
            parse_latex(&mut ctx, "Theexpressionis4.3"),
            Err(ParseError::ProseText(_))
        ));
        assert!(matches!(
            parse_latex(&mut ctx, "a\\\\b"),
            Err(ParseError::Tokenize(_))
        ));
        assert_eq!(parse_latex(&mut ctx, ""), Err(ParseError::EmptyInput));
    }

    #[test]
    fn test_parse_statement() {
        let mut ctx = Context::new();
        match parse_latex_statement(&mut ctx, "y=\\frac{x}{2}").unwrap() {
            Statement::Equation(eq) => {
                assert_eq!(DisplayExpr::new(&ctx, eq.lhs).to_string(), "y");
                assert_eq!(DisplayExpr::new(&ctx, eq.rhs).to_string(), "x / 2");
            }
            other => panic!("expected equation, got {:?}", other),
        }
        assert!(parse_latex_statement(&mut ctx, "a=b=c").is_err());
    }

    // Tokenizer tests
    #[test]
    fn test_tokenize_simple() {
        let tokens = tokenize("x + y").unwrap();
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0], Token::Var("x".to_string()));
        assert_eq!(tokens[1], Token::Plus);
        assert_eq!(tokens[2], Token::Var("y".to_string()));
    }

    #[test]
    fn test_tokenize_frac() {
        let tokens = tokenize("\\frac{1}{2}").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Frac,
                Token::LBrace,
                Token::Number("1".to_string()),
                Token::RBrace,
                Token::LBrace,
                Token::Number("2".to_string()),
                Token::RBrace,
            ]
        );
    }
}
