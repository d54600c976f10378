//! An indented dump of an expression tree, for diagnostics.
//!
//! One line per node, three spaces of indentation per level: the node kind, its quoted
//! string payloads, then its axis or operator. The output is not meant to be parsed.

use super::TreeNode;
use crate::ast::{Expression, NodeTest, NodeTypeTest};
use std::fmt::Write;

pub fn print(expr: &Expression) -> String {
    let mut out = String::new();
    print_node(TreeNode::Expression(expr), 0, &mut out);
    out
}

fn print_node(node: TreeNode<'_>, level: usize, out: &mut String) {
    let _ = write!(out, "{:width$}{}:", "", node.kind_name(), width = level * 3);
    match node {
        TreeNode::Expression(expr) => match expr {
            Expression::Literal(s) | Expression::Variable(s) => quoted(out, s),
            Expression::Number(n) => quoted(out, &n.text),
            Expression::FunctionCall { name, .. } => quoted(out, name),
            Expression::BinaryOp { op, .. } => out.push_str(op.symbol()),
            Expression::UnaryOp { .. } => out.push('-'),
            Expression::LocationPath(_) | Expression::Filter { .. } | Expression::Capture(_) => {}
        },
        TreeNode::Step(step) => {
            match &step.node_test {
                NodeTest::Name { prefix, local } => {
                    if let Some(p) = prefix {
                        quoted(out, p);
                    }
                    quoted(out, local);
                }
                NodeTest::Wildcard { prefix } => {
                    if let Some(p) = prefix {
                        quoted(out, p);
                    }
                    quoted(out, "*");
                }
                NodeTest::NodeType(ntt) => {
                    quoted(out, ntt.name());
                    if let NodeTypeTest::ProcessingInstruction(Some(target)) = ntt {
                        quoted(out, target);
                    }
                }
            }
            out.push_str(step.axis.name());
        }
    }
    out.push('\n');
    for child in node.children() {
        print_node(child, level + 1, out);
    }
}

fn quoted(out: &mut String, payload: &str) {
    let _ = write!(out, "\"{}\" ", payload);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_expression;

    #[test]
    fn test_print_path_with_predicate() {
        let expr = parse_expression("/x:a[b = 'k']").unwrap();
        let expected = "\
abslocpath:
   step:\"x\" \"a\" child
      eqexpr:=
         rellocpath:
            step:\"b\" child
         primaryexpr str:\"k\" 
";
        assert_eq!(print(&expr), expected);
    }

    #[test]
    fn test_print_function_and_operators() {
        let expr = parse_expression("count(//text()) * -2.50").unwrap();
        let dump = print(&expr);
        let lines: Vec<&str> = dump.lines().collect();
        assert_eq!(lines[0], "mulexpr:*");
        assert_eq!(lines[1], "   primaryexpr fn:\"count\" ");
        assert_eq!(lines[2], "      abslocpath:");
        assert_eq!(lines[3], "         step:\"node\" descendant-or-self");
        assert_eq!(lines[4], "         step:\"text\" child");
        assert_eq!(lines[5], "   unaryexpr:-");
        assert_eq!(lines[6], "      primaryexpr nr:\"2.50\" ");
    }
}
