//! Turns an expression tree back into XPath text.
//!
//! Parentheses are inserted only where precedence needs them, abbreviated syntax is
//! used wherever it exists (`@`, `.`, `..`, `//`, implicit `child::`), and parsing the
//! output again gives back an equal tree.

use crate::ast::{Axis, BinaryOperator, Expression, LocationPath, NodeTest, NodeTypeTest, Step};
use itertools::Itertools;
use std::fmt;

pub fn unparse(expr: &Expression) -> String {
    expr.to_string()
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Literal(s) => write_literal(f, s),
            Expression::Number(n) => f.write_str(&n.text),
            Expression::Variable(name) => write!(f, "${}", name),
            Expression::FunctionCall { name, args } => {
                write!(f, "{}({})", name, args.iter().join(", "))
            }
            Expression::BinaryOp { left, op, right } => {
                let precedence = op.precedence();
                let left_parens = left.precedence() < precedence || is_root_only(left);
                write_operand(f, left, left_parens)?;
                if is_compact(*op) {
                    f.write_str(op.symbol())?;
                } else {
                    write!(f, " {} ", op.symbol())?;
                }
                write_operand(f, right, right.precedence() <= precedence)
            }
            Expression::UnaryOp { expr, .. } => {
                f.write_str("-")?;
                write_operand(f, expr, expr.precedence() < self.precedence())
            }
            Expression::Filter {
                primary,
                predicates,
            } => {
                write_operand(f, primary, primary.precedence() < 10)?;
                write_predicates(f, predicates)
            }
            Expression::LocationPath(lp) => write_location_path(f, lp),
            Expression::Capture(inner) => inner.fmt(f),
        }
    }
}

impl fmt::Display for NodeTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeTest::Name {
                prefix: Some(p),
                local,
            } => write!(f, "{}:{}", p, local),
            NodeTest::Name { prefix: None, local } => f.write_str(local),
            NodeTest::Wildcard { prefix: Some(p) } => write!(f, "{}:*", p),
            NodeTest::Wildcard { prefix: None } => f.write_str("*"),
            NodeTest::NodeType(NodeTypeTest::ProcessingInstruction(Some(target))) => {
                write!(f, "processing-instruction(")?;
                write_literal(f, target)?;
                f.write_str(")")
            }
            NodeTest::NodeType(ntt) => write!(f, "{}()", ntt.name()),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_node_step(Axis::SelfAxis) {
            return f.write_str(".");
        }
        if self.is_node_step(Axis::Parent) {
            return f.write_str("..");
        }
        match self.axis {
            Axis::Child => write!(f, "{}", self.node_test)?,
            Axis::Attribute => write!(f, "@{}", self.node_test)?,
            axis => write!(f, "{}::{}", axis.name(), self.node_test)?,
        }
        write_predicates(f, &self.predicates)
    }
}

fn write_literal(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    if s.contains('\'') {
        write!(f, "\"{}\"", s)
    } else {
        write!(f, "'{}'", s)
    }
}

fn write_operand(f: &mut fmt::Formatter<'_>, expr: &Expression, parens: bool) -> fmt::Result {
    if parens {
        write!(f, "({})", expr)
    } else {
        write!(f, "{}", expr)
    }
}

fn write_predicates(f: &mut fmt::Formatter<'_>, predicates: &[Expression]) -> fmt::Result {
    for predicate in predicates {
        write!(f, "[{}]", predicate)?;
    }
    Ok(())
}

/// Comparison and union operators are written without surrounding spaces. The others
/// need them: `and`, `or`, `div` and `mod` are names, and `-` may be part of one.
fn is_compact(op: BinaryOperator) -> bool {
    matches!(op.precedence(), 3 | 4 | 8)
}

/// A lone `/` followed by an operator such as `*` would read as a step.
fn is_root_only(expr: &Expression) -> bool {
    matches!(
        expr,
        Expression::LocationPath(LocationPath {
            start_point: None,
            is_absolute: true,
            steps,
        }) if steps.is_empty()
    )
}

fn write_location_path(f: &mut fmt::Formatter<'_>, lp: &LocationPath) -> fmt::Result {
    if let Some(start) = &lp.start_point {
        let bare = matches!(**start, Expression::Filter { .. }) || start.precedence() == 10;
        write_operand(f, start, !bare)?;
    } else if lp.is_absolute && lp.steps.is_empty() {
        return f.write_str("/");
    }

    // A relative path cannot begin with `//`.
    let leading_separator = lp.is_absolute || lp.start_point.is_some();
    let mut after_double_slash = false;
    for (i, step) in lp.steps.iter().enumerate() {
        let separated = i > 0 || leading_separator;
        let has_next = i + 1 < lp.steps.len();
        if separated
            && has_next
            && !after_double_slash
            && step.is_node_step(Axis::DescendantOrSelf)
        {
            f.write_str("//")?;
            after_double_slash = true;
            continue;
        }
        if separated && !after_double_slash {
            f.write_str("/")?;
        }
        after_double_slash = false;
        write!(f, "{}", step)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::UnaryOperator;
    use crate::parser::parse_expression;

    fn round_trip(xpath: &str) -> String {
        let parsed = parse_expression(xpath).unwrap();
        let text = unparse(&parsed);
        let reparsed = parse_expression(&text)
            .unwrap_or_else(|e| panic!("unparsed '{}' from '{}' fails: {}", text, xpath, e));
        assert_eq!(parsed, reparsed, "'{}' unparsed as '{}'", xpath, text);
        text
    }

    #[test]
    fn test_unparse_abbreviations() {
        assert_eq!(round_trip("/a/b"), "/a/b");
        assert_eq!(round_trip("//a"), "//a");
        assert_eq!(round_trip("a//b"), "a//b");
        assert_eq!(round_trip("child::a/attribute::id"), "a/@id");
        assert_eq!(round_trip("self::node()/parent::node()"), "./..");
        assert_eq!(round_trip("/"), "/");
        assert_eq!(round_trip("ancestor-or-self::x:item"), "ancestor-or-self::x:item");
        assert_eq!(round_trip("x:*/text()"), "x:*/text()");
        assert_eq!(
            round_trip("processing-instruction('pi')"),
            "processing-instruction('pi')"
        );
    }

    #[test]
    fn test_unparse_unabbreviated_node_steps_survive() {
        // Not at the start of a relative path, and not as the last step.
        assert_eq!(
            round_trip("descendant-or-self::node()/a"),
            "descendant-or-self::node()/a"
        );
        assert_eq!(round_trip("a/descendant-or-self::node()"), "a/descendant-or-self::node()");
        assert_eq!(round_trip("self::node()[1]"), "self::node()[1]");
    }

    #[test]
    fn test_unparse_operators_and_precedence() {
        assert_eq!(round_trip("a = 1 and b != 'x'"), "a=1 and b!='x'");
        assert_eq!(round_trip("(1 + 2) * 3"), "(1 + 2) * 3");
        assert_eq!(round_trip("1 + 2 * 3"), "1 + 2 * 3");
        assert_eq!(round_trip("1 - (2 - 3)"), "1 - (2 - 3)");
        assert_eq!(round_trip("(1 - 2) - 3"), "1 - 2 - 3");
        assert_eq!(round_trip("a or b and c"), "a or b and c");
        assert_eq!(round_trip("(a or b) and c"), "(a or b) and c");
        // Union binds tighter than unary minus, so no parentheses are needed.
        assert_eq!(round_trip("-(a | b)"), "-a|b");
        assert_eq!(round_trip("-a | b"), "-a|b");
        assert_eq!(round_trip("--1"), "--1");
        assert_eq!(round_trip("6 div 2 mod 4"), "6 div 2 mod 4");
        assert_eq!(round_trip("a &lt; 3"), "a<3");
    }

    #[test]
    fn test_unparse_primaries_and_filters() {
        assert_eq!(round_trip("concat('a', \"it's\", 1.50)"), "concat('a', \"it's\", 1.50)");
        assert_eq!(round_trip("$v[2]/a"), "$v[2]/a");
        assert_eq!(round_trip("(//a)[last()]"), "(//a)[last()]");
        assert_eq!(round_trip("(/a)/b"), "(/a)/b");
        assert_eq!(round_trip("current()/../x"), "current()/../x");
        assert_eq!(round_trip("re-match(., '[a-z]+')"), "re-match(., '[a-z]+')");
        assert_eq!(round_trip("a[b][2]/@c[. = 'd']"), "a[b][2]/@c[.='d']");
    }

    #[test]
    fn test_unparse_built_trees() {
        let root_times_two = Expression::binary(
            Expression::LocationPath(LocationPath::absolute(vec![])),
            BinaryOperator::Multiply,
            Expression::number(2.0),
        );
        assert_eq!(unparse(&root_times_two), "(/) * 2");

        let negated = Expression::UnaryOp {
            op: UnaryOperator::Minus,
            expr: Box::new(Expression::binary(
                Expression::number(1.0),
                BinaryOperator::Plus,
                Expression::number(2.0),
            )),
        };
        assert_eq!(unparse(&negated), "-(1 + 2)");

        let captured = Expression::Capture(Box::new(Expression::literal("x")));
        assert_eq!(unparse(&captured), "'x'");
    }
}
