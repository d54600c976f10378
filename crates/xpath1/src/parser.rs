//! A `nom`-based parser for the XPath 1.0 expression language.

use super::ast::*;
use crate::error::XPathError;
use crate::tree::print::print;
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while},
    character::complete::{char, multispace0, satisfy},
    combinator::{map, not, opt, peek, recognize, value},
    multi::{many0, separated_list0},
    sequence::{delimited, pair, preceded, terminated},
};

// --- Main Public Parser ---

/// Parses an XPath 1.0 expression into its syntax tree.
///
/// Empty (or all-whitespace) input is rejected with [`XPathError::EmptyExpression`];
/// any other malformed input yields [`XPathError::Syntax`] with the 1-based line and
/// column where parsing stopped.
pub fn parse_expression(input: &str) -> Result<Expression, XPathError> {
    if input.trim().is_empty() {
        return Err(XPathError::EmptyExpression);
    }
    match expression(input) {
        Ok(("", expr)) => {
            log::trace!("Parsed XPath '{}':\n{}", input, print(&expr));
            Ok(expr)
        }
        Ok((rem, _)) => Err(syntax_error(input, rem)),
        Err(nom::Err::Error(e) | nom::Err::Failure(e)) => Err(syntax_error(input, e.input)),
        Err(nom::Err::Incomplete(_)) => Err(syntax_error(input, "")),
    }
}

fn syntax_error(xpath: &str, rest: &str) -> XPathError {
    let offset = xpath.len().saturating_sub(rest.len());
    let consumed = xpath.get(..offset).unwrap_or(xpath);
    let line = consumed.matches('\n').count() + 1;
    let column = consumed
        .rsplit('\n')
        .next()
        .map_or(0, |last| last.chars().count())
        + 1;
    let message = if rest.trim().is_empty() {
        "unexpected end of expression".to_string()
    } else {
        format!(
            "unexpected '{}'",
            rest.trim_start().chars().take(16).collect::<String>()
        )
    };
    log::warn!("XPath syntax error on line {}: {} in '{}'", line, message, xpath);
    XPathError::Syntax {
        xpath: xpath.to_string(),
        line,
        column,
        message,
    }
}

// --- Combinators & Helpers ---

fn ws<'a, F, O, E>(inner: F) -> impl Parser<&'a str, Output = O, Error = E>
where
    F: Parser<&'a str, Output = O, Error = E>,
    E: nom::error::ParseError<&'a str>,
{
    delimited(multispace0, inner, multispace0)
}

fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-' || c == '.'
}

/// Matches an operator name such as `and` or `div`, but not the start of a longer name.
fn keyword<'a>(kw: &'static str, input: &'a str) -> IResult<&'a str, &'a str> {
    terminated(tag(kw), not(satisfy(is_name_char))).parse(input)
}

fn build_binary_expr_parser<'a, F, G>(
    sub_expr_parser: F,
    op_parser: G,
) -> impl FnMut(&'a str) -> IResult<&'a str, Expression>
where
    F: Parser<&'a str, Output = Expression, Error = nom::error::Error<&'a str>> + Clone,
    G: Parser<&'a str, Output = BinaryOperator, Error = nom::error::Error<&'a str>> + Clone,
{
    move |input: &str| {
        let (input, mut left) = sub_expr_parser.clone().parse(input)?;
        let (input, remainder) =
            many0(pair(ws(op_parser.clone()), sub_expr_parser.clone())).parse(input)?;

        for (op, right) in remainder {
            left = Expression::binary(left, op, right);
        }
        Ok((input, left))
    }
}

// --- Expression Parsers (in order of precedence) ---

fn expression(input: &str) -> IResult<&str, Expression> {
    or_expr(input)
}

fn or_op(input: &str) -> IResult<&str, BinaryOperator> {
    let (i, _) = keyword("or", input)?;
    Ok((i, BinaryOperator::Or))
}

fn and_op(input: &str) -> IResult<&str, BinaryOperator> {
    let (i, _) = keyword("and", input)?;
    Ok((i, BinaryOperator::And))
}

fn or_expr(input: &str) -> IResult<&str, Expression> {
    build_binary_expr_parser(and_expr, or_op)(input)
}

fn and_expr(input: &str) -> IResult<&str, Expression> {
    build_binary_expr_parser(equality_expr, and_op)(input)
}

fn equality_op(input: &str) -> IResult<&str, BinaryOperator> {
    alt((
        value(BinaryOperator::Equals, tag("=")),
        value(BinaryOperator::NotEquals, tag("!=")),
    ))
    .parse(input)
}

fn relational_op(input: &str) -> IResult<&str, BinaryOperator> {
    alt((
        value(BinaryOperator::LessThanOrEqual, tag("<=")),
        value(BinaryOperator::LessThanOrEqual, tag("&lt;=")),
        value(BinaryOperator::GreaterThanOrEqual, tag(">=")),
        value(BinaryOperator::GreaterThanOrEqual, tag("&gt;=")),
        value(BinaryOperator::LessThan, tag("<")),
        value(BinaryOperator::LessThan, tag("&lt;")),
        value(BinaryOperator::GreaterThan, tag(">")),
        value(BinaryOperator::GreaterThan, tag("&gt;")),
    ))
    .parse(input)
}

fn additive_op(input: &str) -> IResult<&str, BinaryOperator> {
    alt((
        value(BinaryOperator::Plus, char('+')),
        value(BinaryOperator::Minus, char('-')),
    ))
    .parse(input)
}

fn multiplicative_op(input: &str) -> IResult<&str, BinaryOperator> {
    if let Ok((i, _)) = char::<&str, nom::error::Error<&str>>('*').parse(input) {
        return Ok((i, BinaryOperator::Multiply));
    }
    if let Ok((i, _)) = keyword("div", input) {
        return Ok((i, BinaryOperator::Divide));
    }
    let (i, _) = keyword("mod", input)?;
    Ok((i, BinaryOperator::Modulo))
}

fn union_op(input: &str) -> IResult<&str, BinaryOperator> {
    value(BinaryOperator::Union, char('|')).parse(input)
}

fn equality_expr(input: &str) -> IResult<&str, Expression> {
    build_binary_expr_parser(relational_expr, equality_op)(input)
}

fn relational_expr(input: &str) -> IResult<&str, Expression> {
    build_binary_expr_parser(additive_expr, relational_op)(input)
}

fn additive_expr(input: &str) -> IResult<&str, Expression> {
    build_binary_expr_parser(multiplicative_expr, additive_op)(input)
}

fn multiplicative_expr(input: &str) -> IResult<&str, Expression> {
    build_binary_expr_parser(unary_expr, multiplicative_op)(input)
}

fn unary_expr(input: &str) -> IResult<&str, Expression> {
    if let Ok((i, _)) = ws(char::<&str, nom::error::Error<&str>>('-')).parse(input) {
        let (i, expr) = unary_expr(i)?;
        return Ok((
            i,
            Expression::UnaryOp {
                op: UnaryOperator::Minus,
                expr: Box::new(expr),
            },
        ));
    }
    union_expr(input)
}

// The union operator `|` binds tighter than the others, but only applies to paths.
fn union_expr(input: &str) -> IResult<&str, Expression> {
    build_binary_expr_parser(path_expr, union_op)(input)
}

/// Handles the ambiguity between location paths and primary expressions that may be
/// followed by predicates and a path.
fn path_expr(input: &str) -> IResult<&str, Expression> {
    // Primary expressions go first: `position()` would otherwise be read as a step
    // named `position` before the function call parser sees the `()`.
    ws(alt((
        filter_path,
        map(location_path, Expression::LocationPath),
    )))
    .parse(input)
}

fn filter_path(input: &str) -> IResult<&str, Expression> {
    let (i, primary) = primary_expr(input)?;
    let (i, predicates) = many0(predicate).parse(i)?;
    let filtered = if predicates.is_empty() {
        primary
    } else {
        Expression::Filter {
            primary: Box::new(primary),
            predicates,
        }
    };

    let (i, remainder) = many0(pair(ws(path_separator), step)).parse(i)?;
    if remainder.is_empty() {
        return Ok((i, filtered));
    }

    let mut steps = Vec::with_capacity(remainder.len());
    push_steps(&mut steps, remainder);
    Ok((
        i,
        Expression::LocationPath(LocationPath {
            start_point: Some(Box::new(filtered)),
            is_absolute: false,
            steps,
        }),
    ))
}

fn primary_expr(input: &str) -> IResult<&str, Expression> {
    alt((
        variable_reference,
        number_literal,
        map(string_literal, Expression::Literal),
        function_call,
        delimited(ws(char('(')), expression, ws(char(')'))),
    ))
    .parse(input)
}

// --- Literal Parsers ---

fn string_literal(input: &str) -> IResult<&str, String> {
    map(
        alt((
            delimited(char('\''), take_while(|c| c != '\''), char('\'')),
            delimited(char('"'), take_while(|c| c != '"'), char('"')),
        )),
        |s: &str| s.to_string(),
    )
    .parse(input)
}

/// `Digits ('.' Digits?)? | '.' Digits`. XPath 1.0 has no exponent notation.
///
/// Sliced by hand so a fraction running to the end of the input is never cut short.
fn number_literal(input: &str) -> IResult<&str, Expression> {
    let digits = |s: &str| s.bytes().take_while(u8::is_ascii_digit).count();
    let int_len = digits(input);
    let mut end = int_len;
    let mut frac_len = 0;
    if input[end..].starts_with('.') {
        frac_len = digits(&input[end + 1..]);
        if int_len > 0 || frac_len > 0 {
            end += 1 + frac_len;
        }
    }
    if int_len == 0 && frac_len == 0 {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Digit,
        )));
    }
    let text = &input[..end];
    let value = text.parse::<f64>().map_err(|_| {
        nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Float))
    })?;
    Ok((
        &input[end..],
        Expression::Number(NumberLiteral {
            value,
            text: text.to_string(),
        }),
    ))
}

// --- Variable Reference Parser ---

fn variable_reference(input: &str) -> IResult<&str, Expression> {
    map(preceded(char('$'), q_name), |(prefix, local)| {
        Expression::Variable(join_qname(prefix, local))
    })
    .parse(input)
}

// --- Name and NodeTest Parsers ---

fn nc_name(input: &str) -> IResult<&str, &str> {
    recognize(pair(satisfy(is_name_start), take_while(is_name_char))).parse(input)
}

fn q_name(input: &str) -> IResult<&str, (Option<&str>, &str)> {
    map(
        pair(nc_name, opt(preceded(char(':'), nc_name))),
        |(first, second)| match second {
            Some(local) => (Some(first), local),
            None => (None, first),
        },
    )
    .parse(input)
}

fn join_qname(prefix: Option<&str>, local: &str) -> String {
    match prefix {
        Some(p) => format!("{}:{}", p, local),
        None => local.to_string(),
    }
}

fn is_node_type_name(name: &str) -> bool {
    matches!(
        name,
        "text" | "node" | "comment" | "processing-instruction"
    )
}

fn node_type_test(input: &str) -> IResult<&str, NodeTest> {
    let (i, name) = alt((
        tag("processing-instruction"),
        tag("comment"),
        tag("text"),
        tag("node"),
    ))
    .parse(input)?;
    let (i, _) = ws(char('(')).parse(i)?;

    let (i, test) = if name == "processing-instruction" {
        let (i, target) = opt(terminated(string_literal, multispace0)).parse(i)?;
        (i, NodeTypeTest::ProcessingInstruction(target))
    } else if name == "comment" {
        (i, NodeTypeTest::Comment)
    } else if name == "text" {
        (i, NodeTypeTest::Text)
    } else {
        (i, NodeTypeTest::Node)
    };
    let (i, _) = char(')').parse(i)?;
    Ok((i, NodeTest::NodeType(test)))
}

pub fn node_test(input: &str) -> IResult<&str, NodeTest> {
    alt((
        value(NodeTest::Wildcard { prefix: None }, char('*')),
        map(terminated(nc_name, tag(":*")), |prefix: &str| {
            NodeTest::Wildcard {
                prefix: Some(prefix.to_string()),
            }
        }),
        node_type_test,
        map(q_name, |(prefix, local)| NodeTest::name(prefix, local)),
    ))
    .parse(input)
}

// --- Path Parsers ---

fn axis_specifier(input: &str) -> IResult<&str, Axis> {
    let (i, name) = nc_name(input)?;
    let (i, _) = ws(tag("::")).parse(i)?;
    match Axis::from_name(name) {
        Some(axis) => Ok((i, axis)),
        None => Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Verify,
        ))),
    }
}

fn predicate(input: &str) -> IResult<&str, Expression> {
    delimited(ws(char('[')), expression, ws(char(']'))).parse(input)
}

fn abbreviated_step(input: &str) -> IResult<&str, Step> {
    alt((
        value(Step::new(Axis::Parent, NodeTest::NodeType(NodeTypeTest::Node)), tag("..")),
        value(
            Step::new(Axis::SelfAxis, NodeTest::NodeType(NodeTypeTest::Node)),
            terminated(char('.'), not(peek(char('.')))),
        ),
    ))
    .parse(input)
}

fn full_step(input: &str) -> IResult<&str, Step> {
    let (i, axis) = opt(alt((
        value(Axis::Attribute, terminated(char('@'), multispace0)),
        axis_specifier,
    )))
    .parse(input)?;
    let (i, node_test) = node_test(i)?;
    let (i, predicates) = many0(predicate).parse(i)?;
    Ok((
        i,
        Step {
            axis: axis.unwrap_or(Axis::Child),
            node_test,
            predicates,
        },
    ))
}

fn step(input: &str) -> IResult<&str, Step> {
    alt((abbreviated_step, full_step)).parse(input)
}

fn path_separator(input: &str) -> IResult<&str, &str> {
    alt((tag("//"), tag("/"))).parse(input)
}

/// Appends `(separator, step)` pairs, expanding `//` into its descendant-or-self step.
fn push_steps(steps: &mut Vec<Step>, remainder: Vec<(&str, Step)>) {
    for (sep, next_step) in remainder {
        if sep == "//" {
            steps.push(Step::descendant_or_self_node());
        }
        steps.push(next_step);
    }
}

fn relative_location_path(input: &str) -> IResult<&str, Vec<Step>> {
    let (i, first) = step(input)?;
    // After the first step, subsequent steps MUST be preceded by / or //.
    let (i, remainder) = many0(pair(ws(path_separator), step)).parse(i)?;
    let mut steps = vec![first];
    push_steps(&mut steps, remainder);
    Ok((i, steps))
}

fn absolute_location_path(input: &str) -> IResult<&str, LocationPath> {
    if let Ok((rem, _)) = tag::<&str, &str, nom::error::Error<&str>>("//").parse(input) {
        let (rem, steps) = relative_location_path(rem)?;
        let mut all = vec![Step::descendant_or_self_node()];
        all.extend(steps);
        return Ok((rem, LocationPath::absolute(all)));
    }

    let (rem, _) = char('/').parse(input)?;
    match relative_location_path(rem) {
        Ok((rem, steps)) => Ok((rem, LocationPath::absolute(steps))),
        // A lone "/" selects the root node.
        Err(nom::Err::Error(_)) => Ok((rem, LocationPath::absolute(vec![]))),
        Err(e) => Err(e),
    }
}

fn location_path(input: &str) -> IResult<&str, LocationPath> {
    alt((
        absolute_location_path,
        map(relative_location_path, LocationPath::relative),
    ))
    .parse(input)
}

// --- Function Call Parser ---

fn function_call(input: &str) -> IResult<&str, Expression> {
    // A function call must be a QName followed by '('. This lookahead avoids
    // parsing a simple step name (like 'foo' in 'foo/bar') as a function.
    let (i, (prefix, local)) = q_name(input)?;
    let (i, _) = peek(ws(char('('))).parse(i)?;

    // Node-type tests like text() are not functions. They are handled by the step parser.
    if prefix.is_none() && is_node_type_name(local) {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Verify,
        )));
    }

    let (i, _) = multispace0(i)?;
    let (i, args) = delimited(
        char('('),
        separated_list0(ws(char(',')), expression),
        ws(char(')')),
    )
    .parse(i)?;

    Ok((
        i,
        Expression::FunctionCall {
            name: join_qname(prefix, local),
            args,
        },
    ))
}
