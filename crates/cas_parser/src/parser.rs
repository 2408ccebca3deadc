use crate::error::ParseError;
use cas_ast::{Constant, Context, Equation, Expr, ExprId};
use nom::{
    branch::alt,
    bytes::complete::{tag, take_while},
    character::complete::multispace0,
    combinator::{map, opt},
    multi::{fold_many0, separated_list0, separated_list1},
    sequence::{delimited, pair, preceded},
    IResult,
};
use num_bigint::BigInt;
use num_rational::BigRational;

/// Deepest bracket nesting accepted before recursion would get dangerous.
pub(crate) const MAX_NESTING: usize = 200;

// ============================================================================
// Unicode Math Helpers
// ============================================================================

/// Convert a superscript digit character to its numeric value
fn superscript_to_digit(c: char) -> Option<u32> {
    match c {
        '⁰' => Some(0),
        '¹' => Some(1),
        '²' => Some(2),
        '³' => Some(3),
        '⁴' => Some(4),
        '⁵' => Some(5),
        '⁶' => Some(6),
        '⁷' => Some(7),
        '⁸' => Some(8),
        '⁹' => Some(9),
        _ => None,
    }
}

/// Parse a sequence of superscript digits into a number
/// Returns the number and the remaining string
fn parse_superscript_number(input: &str) -> Option<(u64, &str)> {
    let mut value: u64 = 0;
    let mut byte_len = 0;

    for c in input.chars() {
        match superscript_to_digit(c) {
            Some(digit) => {
                value = value.saturating_mul(10).saturating_add(digit as u64);
                byte_len += c.len_utf8();
            }
            None => break,
        }
    }

    if byte_len > 0 {
        Some((value, &input[byte_len..]))
    } else {
        None
    }
}

/// Get the root index from a Unicode root symbol (√, ∛, ∜)
fn parse_unicode_root_prefix(input: &str) -> Option<(u64, &str)> {
    if let Some(rest) = input.strip_prefix('∛') {
        return Some((3, rest));
    }
    if let Some(rest) = input.strip_prefix('∜') {
        return Some((4, rest));
    }
    if let Some(rest) = input.strip_prefix('√') {
        return Some((2, rest));
    }
    None
}

/// Deepest bracket nesting in `input`, counting all bracket kinds alike.
pub(crate) fn nesting_depth(input: &str) -> usize {
    let mut depth: usize = 0;
    let mut max_depth = 0;
    for c in input.chars() {
        match c {
            '(' | '[' | '{' => {
                depth += 1;
                max_depth = max_depth.max(depth);
            }
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    max_depth
}

// Intermediate AST for parsing
#[derive(Debug, Clone)]
enum ParseNode {
    Number(BigRational),
    Constant(Constant),
    Variable(String),
    Add(Box<ParseNode>, Box<ParseNode>),
    Sub(Box<ParseNode>, Box<ParseNode>),
    Mul(Box<ParseNode>, Box<ParseNode>),
    Div(Box<ParseNode>, Box<ParseNode>),
    Pow(Box<ParseNode>, Box<ParseNode>),
    Neg(Box<ParseNode>),
    Function(String, Vec<ParseNode>),
    Matrix(Vec<Vec<ParseNode>>), // 2D structure for validation during parsing
}

impl ParseNode {
    fn lower(self, ctx: &mut Context) -> Result<ExprId, ParseError> {
        let id = match self {
            ParseNode::Number(n) => ctx.add(Expr::Number(n)),
            ParseNode::Constant(c) => ctx.add(Expr::Constant(c)),
            ParseNode::Variable(s) => ctx.var(&s),
            ParseNode::Add(l, r) => {
                let lid = l.lower(ctx)?;
                let rid = r.lower(ctx)?;
                ctx.add(Expr::Add(lid, rid))
            }
            ParseNode::Sub(l, r) => {
                let lid = l.lower(ctx)?;
                let rid = r.lower(ctx)?;
                ctx.add(Expr::Sub(lid, rid))
            }
            ParseNode::Mul(l, r) => {
                let lid = l.lower(ctx)?;
                let rid = r.lower(ctx)?;
                ctx.add(Expr::Mul(lid, rid))
            }
            ParseNode::Div(l, r) => {
                let lid = l.lower(ctx)?;
                let rid = r.lower(ctx)?;
                ctx.add(Expr::Div(lid, rid))
            }
            ParseNode::Pow(b, e) => {
                let bid = b.lower(ctx)?;
                let eid = e.lower(ctx)?;
                ctx.add(Expr::Pow(bid, eid))
            }
            // -<literal> folds into the literal
            ParseNode::Neg(inner) => match *inner {
                ParseNode::Number(n) => ctx.add(Expr::Number(-n)),
                other => {
                    let eid = other.lower(ctx)?;
                    ctx.add(Expr::Neg(eid))
                }
            },
            ParseNode::Function(name, args) => {
                let arg_ids = args
                    .into_iter()
                    .map(|a| a.lower(ctx))
                    .collect::<Result<Vec<_>, _>>()?;
                ctx.call(&name, arg_ids)
            }
            ParseNode::Matrix(rows) => {
                // Flatten 2D structure to row-major storage
                let num_rows = rows.len();
                let num_cols = rows.first().map_or(0, Vec::len);
                let mut data = Vec::with_capacity(num_rows * num_cols);
                for row in rows {
                    for elem in row {
                        data.push(elem.lower(ctx)?);
                    }
                }
                ctx.matrix(num_rows, num_cols, data)?
            }
        };
        Ok(id)
    }
}

/// Convert a decimal string to BigRational.
/// Supports: "8.2" → 41/5, ".5" → 1/2, "8." → 8, "123" → 123
/// Algorithm: For "A.B", num = A*10^k + B, den = 10^k (where k = len(B))
pub(crate) fn decimal_to_rational(integer_part: &str, fractional_part: &str) -> BigRational {
    let k = fractional_part.len();

    let int_val: BigInt = if integer_part.is_empty() {
        BigInt::from(0)
    } else {
        integer_part.parse().unwrap_or_else(|_| BigInt::from(0))
    };

    if k == 0 {
        return BigRational::from_integer(int_val);
    }

    let denominator = num_traits::pow(BigInt::from(10), k);
    let frac_val: BigInt = fractional_part.parse().unwrap_or_else(|_| BigInt::from(0));

    // BigRational::new reduces the fraction (gcd)
    BigRational::new(int_val * &denominator + frac_val, denominator)
}

/// Scale `value` by `10^exponent`.
fn scale_by_power_of_ten(value: BigRational, exponent: i32) -> BigRational {
    let factor = num_traits::pow(BigInt::from(10), exponent.unsigned_abs() as usize);
    if exponent >= 0 {
        value * BigRational::from_integer(factor)
    } else {
        value / BigRational::from_integer(factor)
    }
}

/// Scientific-notation suffix: `e5`, `E-3`, `e+12`.
/// Returns the input untouched with exponent 0 when no complete suffix is present,
/// so `2e` stays `2` followed by the constant `e`.
fn parse_exponent_suffix(input: &str) -> (&str, i32) {
    let Some(rest) = input.strip_prefix(['e', 'E']) else {
        return (input, 0);
    };
    let (sign, rest) = match rest.strip_prefix('-') {
        Some(r) => (-1, r),
        None => (1, rest.strip_prefix('+').unwrap_or(rest)),
    };
    let digits = rest.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 || digits > 3 {
        return (input, 0);
    }
    let followed_by_word = rest[digits..]
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if followed_by_word {
        return (input, 0);
    }
    match rest[..digits].parse::<i32>() {
        Ok(value) => (&rest[digits..], sign * value),
        Err(_) => (input, 0),
    }
}

// Parser for numeric literals
// Supports: 123, 8.2, .5, 8., 1.5e3
fn parse_number(input: &str) -> IResult<&str, ParseNode> {
    fn is_digit(c: char) -> bool {
        c.is_ascii_digit()
    }

    let (remaining, (int_part, maybe_frac)) = pair(
        take_while(is_digit),
        opt(pair(tag("."), take_while(is_digit))),
    )(input)?;

    let frac_str = maybe_frac.map_or("", |(_, frac)| frac);

    // Must have at least some digits somewhere; a lone "." is not a number
    if int_part.is_empty() && frac_str.is_empty() {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Digit,
        )));
    }

    let rational = decimal_to_rational(int_part, frac_str);
    let (remaining, exponent) = parse_exponent_suffix(remaining);
    Ok((
        remaining,
        ParseNode::Number(scale_by_power_of_ten(rational, exponent)),
    ))
}

fn is_word_boundary(remaining: &str) -> bool {
    remaining
        .chars()
        .next()
        .map_or(true, |c| !c.is_ascii_alphanumeric() && c != '_')
}

// Parser for constants with word boundary check
// 'e' and 'pi' should not match prefixes of longer identifiers (e.g., 'exact', 'pivot')
fn parse_constant(input: &str) -> IResult<&str, ParseNode> {
    const WORDS: [(&str, Constant); 6] = [
        ("pi", Constant::Pi),
        ("oo", Constant::Infinity),
        ("e", Constant::E),
        ("E", Constant::E),
        ("I", Constant::I),
        ("π", Constant::Pi),
    ];

    for (word, constant) in WORDS {
        if let Some(rest) = input.strip_prefix(word) {
            if is_word_boundary(rest) {
                return Ok((rest, ParseNode::Constant(constant)));
            }
        }
    }

    Err(nom::Err::Error(nom::error::Error::new(
        input,
        nom::error::ErrorKind::Tag,
    )))
}

// Parser for identifiers (variable/function names)
// Identifiers start with letter or underscore, then allow letters, digits, underscores
// Examples: x, x1, theta3, _tmp, x_1
fn parse_identifier(input: &str) -> IResult<&str, &str> {
    let starts_identifier = input
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if !starts_identifier {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Alpha,
        )));
    }

    let len = input
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
        .map(char::len_utf8)
        .sum();

    Ok((&input[len..], &input[..len]))
}

// Parser for variables
// Note: "i" (imaginary unit) is recognized as Constant::I, not a variable
fn parse_variable(input: &str) -> IResult<&str, ParseNode> {
    map(parse_identifier, |s: &str| {
        if s == "i" {
            ParseNode::Constant(Constant::I)
        } else {
            ParseNode::Variable(s.to_string())
        }
    })(input)
}

// Parser for parentheses
fn parse_parens(input: &str) -> IResult<&str, ParseNode> {
    delimited(
        preceded(multispace0, tag("(")),
        parse_expr,
        preceded(multispace0, tag(")")),
    )(input)
}

// Parser for function calls
fn parse_function(input: &str) -> IResult<&str, ParseNode> {
    let (input, name) = parse_identifier(input)?;
    let (input, _) = preceded(multispace0, tag("("))(input)?;
    let (input, mut args) =
        separated_list0(preceded(multispace0, tag(",")), parse_expr)(input)?;
    let (input, _) = preceded(multispace0, tag(")"))(input)?;

    if args.len() == 1 {
        match name {
            // exp(x) -> e^x
            "exp" => {
                let arg = args.remove(0);
                return Ok((
                    input,
                    ParseNode::Pow(
                        Box::new(ParseNode::Constant(Constant::E)),
                        Box::new(arg),
                    ),
                ));
            }
            // Matrix([[1, 2], [3, 4]]) is the matrix literal itself
            "Matrix" if matches!(args[0], ParseNode::Matrix(_)) => {
                return Ok((input, args.remove(0)));
            }
            "Abs" => return Ok((input, ParseNode::Function("abs".to_string(), args))),
            _ => {}
        }
    }

    Ok((input, ParseNode::Function(name.to_string(), args)))
}

fn parse_abs(input: &str) -> IResult<&str, ParseNode> {
    delimited(
        preceded(multispace0, tag("|")),
        parse_expr,
        preceded(multispace0, tag("|")),
    )(input)
    .map(|(next_input, expr)| {
        (
            next_input,
            ParseNode::Function("abs".to_string(), vec![expr]),
        )
    })
}

// A bracketed row: [a, b, c]
fn parse_bracket_row(input: &str) -> IResult<&str, Vec<ParseNode>> {
    delimited(
        preceded(multispace0, tag("[")),
        separated_list1(preceded(multispace0, tag(",")), parse_expr),
        preceded(multispace0, tag("]")),
    )(input)
}

// Parser for matrices and vectors
// Matrices: [[a, b], [c, d]]
// Vectors: [x, y, z] (column vector, nx1)
fn parse_matrix(input: &str) -> IResult<&str, ParseNode> {
    let (rest, rows) = delimited(
        preceded(multispace0, tag("[")),
        separated_list1(
            preceded(multispace0, tag(",")),
            alt((parse_bracket_row, map(parse_expr, |e| vec![e]))),
        ),
        preceded(multispace0, tag("]")),
    )(input)?;

    // Validate: all rows must have same length
    let cols = rows.first().map_or(0, Vec::len);
    if cols == 0 || rows.iter().any(|row| row.len() != cols) {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Verify,
        )));
    }

    Ok((rest, ParseNode::Matrix(rows)))
}

// Parser for Unicode root symbols: √, ∛, ∜ followed by expression
// Examples: √(x), ∛8, √2
fn parse_unicode_root(input: &str) -> IResult<&str, ParseNode> {
    let (index, after_prefix) = parse_unicode_root_prefix(input).ok_or_else(|| {
        nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Tag))
    })?;

    let (remaining, arg) = alt((parse_parens, parse_factorial))(after_prefix)?;

    let node = if index == 2 {
        ParseNode::Function("sqrt".to_string(), vec![arg])
    } else {
        let index_node = ParseNode::Number(BigRational::from_integer(BigInt::from(index)));
        ParseNode::Function("root".to_string(), vec![arg, index_node])
    };
    Ok((remaining, node))
}

// Atom
fn parse_atom(input: &str) -> IResult<&str, ParseNode> {
    preceded(
        multispace0,
        alt((
            parse_unicode_root,
            parse_number,
            parse_function,
            parse_constant,
            parse_variable,
            parse_matrix, // Try matrix before parens (since [ ] syntax)
            parse_parens,
            parse_abs,
        )),
    )(input)
}

// Factorial (postfix) and superscript exponents: n!, x²
fn parse_factorial(input: &str) -> IResult<&str, ParseNode> {
    let (input, atom) = parse_atom(input)?;

    let (input, with_factorial) = fold_many0(
        preceded(multispace0, tag("!")),
        move || atom.clone(),
        |acc, _| ParseNode::Function("factorial".to_string(), vec![acc]),
    )(input)?;

    // No whitespace allowed before superscript (it's attached to the base)
    if let Some((exp_value, remaining)) = parse_superscript_number(input) {
        let exp_node = ParseNode::Number(BigRational::from_integer(BigInt::from(exp_value)));
        return Ok((
            remaining,
            ParseNode::Pow(Box::new(with_factorial), Box::new(exp_node)),
        ));
    }

    Ok((input, with_factorial))
}

// Power - right associative: 2^3^4 = 2^(3^4), not (2^3)^4
// Both ^ and ** are accepted.
fn parse_power(input: &str) -> IResult<&str, ParseNode> {
    let (input, base) = parse_factorial(input)?;

    let try_caret = preceded::<_, _, _, nom::error::Error<&str>, _, _>(
        multispace0,
        alt((tag("**"), tag("^"))),
    )(input);

    if let Ok((input, _)) = try_caret {
        let (input, exp) = parse_power_exponent(input)?;
        Ok((input, ParseNode::Pow(Box::new(base), Box::new(exp))))
    } else {
        Ok((input, base))
    }
}

// Parser for exponents: allows sign prefix (-2, +3) then recurses for chained powers
fn parse_power_exponent(input: &str) -> IResult<&str, ParseNode> {
    preceded(
        multispace0,
        alt((
            map(pair(alt((tag("-"), tag("−"))), parse_power_exponent), |(_, expr)| {
                ParseNode::Neg(Box::new(expr))
            }),
            map(pair(tag("+"), parse_power_exponent), |(_, expr)| expr),
            parse_power,
        )),
    )(input)
}

// Unary
fn parse_unary(input: &str) -> IResult<&str, ParseNode> {
    alt((
        map(
            pair(preceded(multispace0, alt((tag("-"), tag("−")))), parse_unary),
            |(_, expr)| ParseNode::Neg(Box::new(expr)),
        ),
        map(pair(preceded(multispace0, tag("+")), parse_unary), |(_, expr)| expr),
        parse_power,
    ))(input)
}

// Term - handles explicit * and / operators
// Also handles implicit multiplication: 2x → 2*x, 3(x+y) → 3*(x+y)
fn parse_term(input: &str) -> IResult<&str, ParseNode> {
    let (input, init) = parse_unary(input)?;

    let (input, result) = fold_many0(
        pair(
            preceded(
                multispace0,
                alt((tag("*"), tag("·"), tag("×"), tag("/"), tag("÷"))),
            ),
            parse_unary,
        ),
        move || init.clone(),
        |acc, (op, val)| match op {
            "/" | "÷" => ParseNode::Div(Box::new(acc), Box::new(val)),
            _ => ParseNode::Mul(Box::new(acc), Box::new(val)),
        },
    )(input)?;

    parse_implicit_mul_chain(input, result)
}

// Parse implicit multiplication chain: 2xy → 2*xy, 2x → 2*x, 2(x+1) → 2*(x+1)
// Only applies directly after a number-like factor and without whitespace.
fn parse_implicit_mul_chain(input: &str, acc: ParseNode) -> IResult<&str, ParseNode> {
    let starts_factor = input
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '(' || c == 'π');

    if starts_factor && can_implicit_mul(&acc) {
        if let Ok((remaining, next_factor)) = parse_power(input) {
            let new_acc = ParseNode::Mul(Box::new(acc), Box::new(next_factor));
            return parse_implicit_mul_chain(remaining, new_acc);
        }
    }
    Ok((input, acc))
}

// Check if a ParseNode can be followed by implicit multiplication
fn can_implicit_mul(node: &ParseNode) -> bool {
    match node {
        ParseNode::Number(_) => true,
        ParseNode::Pow(base, _) => matches!(**base, ParseNode::Number(_)),
        ParseNode::Mul(_, right) | ParseNode::Div(_, right) => can_implicit_mul(right),
        _ => false,
    }
}

// Expr
fn parse_expr(input: &str) -> IResult<&str, ParseNode> {
    let (input, init) = parse_term(input)?;
    fold_many0(
        pair(
            preceded(multispace0, alt((tag("+"), tag("-"), tag("−")))),
            parse_term,
        ),
        move || init.clone(),
        |acc, (op, val)| match op {
            "+" => ParseNode::Add(Box::new(acc), Box::new(val)),
            _ => ParseNode::Sub(Box::new(acc), Box::new(val)),
        },
    )(input)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Statement {
    Expression(ExprId),
    Equation(Equation),
}

// Parser for equations: lhs = rhs (also lhs == rhs)
fn parse_equation(input: &str) -> IResult<&str, (ParseNode, ParseNode)> {
    let (input, lhs) = parse_expr(input)?;
    let (input, _) = preceded(multispace0, alt((tag("=="), tag("="))))(input)?;
    let (input, rhs) = parse_expr(input)?;
    Ok((input, (lhs, rhs)))
}

fn check_input(input: &str) -> Result<(), ParseError> {
    if input.trim().is_empty() {
        return Err(ParseError::EmptyInput);
    }
    if nesting_depth(input) > MAX_NESTING {
        return Err(ParseError::NomError(format!(
            "nesting deeper than {} levels",
            MAX_NESTING
        )));
    }
    Ok(())
}

/// Parse a plain-text expression such as `2*x^2 + sqrt(3)`.
pub fn parse(input: &str, ctx: &mut Context) -> Result<ExprId, ParseError> {
    check_input(input)?;

    let (remaining, expr_node) =
        parse_expr(input).map_err(|e| ParseError::NomError(format!("{}", e)))?;

    let remaining = remaining.trim();
    if !remaining.is_empty() {
        return Err(ParseError::UnconsumedInput(remaining.to_string()));
    }

    expr_node.lower(ctx)
}

/// Parse either an equation `lhs = rhs` or a plain expression.
pub fn parse_statement(input: &str, ctx: &mut Context) -> Result<Statement, ParseError> {
    check_input(input)?;

    if let Ok((remaining, (lhs, rhs))) = parse_equation(input) {
        if remaining.trim().is_empty() {
            let lhs = lhs.lower(ctx)?;
            let rhs = rhs.lower(ctx)?;
            return Ok(Statement::Equation(Equation { lhs, rhs }));
        }
    }

    parse(input, ctx).map(Statement::Expression)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cas_ast::DisplayExpr;

    fn show(input: &str) -> String {
        let mut ctx = Context::new();
        let e = parse(input, &mut ctx).unwrap_or_else(|err| panic!("{}: {}", input, err));
        DisplayExpr::new(&ctx, e).to_string()
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(show("123"), "123");
    }

    #[test]
    fn test_parse_decimal_literals() {
        let cases = [
            ("8.2", "41/5"),
            ("0.5", "1/2"),
            (".5", "1/2"),
            ("8.", "8"),
            ("0.125", "1/8"),
            ("1.25", "5/4"),
            ("100.001", "100001/1000"),
            ("7.75", "31/4"),
        ];

        for (input, expected) in cases {
            assert_eq!(show(input), expected, "input {}", input);
        }
    }

    #[test]
    fn test_parse_scientific_notation() {
        assert_eq!(show("1.5e3"), "1500");
        assert_eq!(show("2E-2"), "1/50");
        // "2e" is two times Euler's number, not a malformed literal
        assert_eq!(show("2e"), "2 * e");
    }

    #[test]
    fn test_parse_negative_decimal() {
        assert_eq!(show("-0.125"), "-1/8");
    }

    #[test]
    fn test_parse_arithmetic() {
        assert_eq!(show("1 + 2 * x"), "1 + 2 * x");
        assert_eq!(show("(1 + 2) * x"), "(1 + 2) * x");
        assert_eq!(show("x^2 * y"), "x^2 * y");
        assert_eq!(show("x**2"), "x^2");
        assert_eq!(show("2^3^4"), "2^(3^4)");
    }

    #[test]
    fn test_implicit_multiplication() {
        assert_eq!(show("2x"), "2 * x");
        assert_eq!(show("3(x+1)"), "3 * (x + 1)");
        assert_eq!(show("2pi"), "2 * pi");
    }

    #[test]
    fn test_constants_and_functions() {
        assert_eq!(show("pi"), "pi");
        assert_eq!(show("pivot"), "pivot");
        assert_eq!(show("sqrt(25)"), "sqrt(25)");
        assert_eq!(show("exp(x)"), "e^x");
        assert_eq!(show("|x|"), "abs(x)");
        assert_eq!(show("3+4i"), "3 + 4 * i");
        assert_eq!(show("x²"), "x^2");
        assert_eq!(show("√2"), "sqrt(2)");
        assert_eq!(show("5!"), "factorial(5)");
    }

    #[test]
    fn test_parse_vector() {
        let mut ctx = Context::new();
        let e = parse("[1, 2, 3]", &mut ctx).unwrap();
        if let Expr::Matrix { rows, cols, .. } = ctx.get(e) {
            assert_eq!(*rows, 3);
            assert_eq!(*cols, 1);
        } else {
            panic!("Expected Matrix variant");
        }
    }

    #[test]
    fn test_parse_matrix_literal() {
        let mut ctx = Context::new();
        let e = parse("Matrix([[1,2],[3,4]])", &mut ctx).unwrap();
        if let Expr::Matrix { rows, cols, data } = ctx.get(e) {
            assert_eq!((*rows, *cols), (2, 2));
            assert_eq!(DisplayExpr::new(&ctx, data[2]).to_string(), "3");
        } else {
            panic!("Expected Matrix variant");
        }
        assert!(parse("[[1, 2], [3]]", &mut ctx).is_err());
    }

    #[test]
    fn test_prose_is_rejected() {
        let mut ctx = Context::new();
        assert!(matches!(
            parse("Theexpressionis4.3", &mut ctx),
            Err(ParseError::UnconsumedInput(_))
        ));
        assert_eq!(parse("   ", &mut ctx), Err(ParseError::EmptyInput));
        assert!(parse("\\frac{1}{2}", &mut ctx).is_err());
    }

    #[test]
    fn test_parse_statement_equation() {
        let mut ctx = Context::new();
        match parse_statement("y = 2x + 1", &mut ctx).unwrap() {
            Statement::Equation(eq) => {
                assert_eq!(DisplayExpr::new(&ctx, eq.lhs).to_string(), "y");
                assert_eq!(DisplayExpr::new(&ctx, eq.rhs).to_string(), "2 * x + 1");
            }
            other => panic!("expected equation, got {:?}", other),
        }
        assert!(matches!(
            parse_statement("x + 1", &mut ctx).unwrap(),
            Statement::Expression(_)
        ));
    }

    #[test]
    fn test_deep_nesting_is_refused() {
        let mut ctx = Context::new();
        let input = format!("{}1{}", "(".repeat(300), ")".repeat(300));
        assert!(parse(&input, &mut ctx).is_err());
    }
}
