//! Defines the Abstract Syntax Tree (AST) for XPath 1.0 expressions.
//!
//! The tree is produced once by the parser and then shared read-only by the evaluator,
//! the printer and the pattern matcher. The canonicalizer is the only consumer that
//! mutates it, and it only ever rewrites node-test prefixes.

use crate::context::format_number;

/// The top-level expression that can be evaluated.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(String),
    Number(NumberLiteral),
    LocationPath(LocationPath),
    Variable(String),
    FunctionCall {
        name: String,
        args: Vec<Expression>,
    },
    BinaryOp {
        left: Box<Expression>,
        op: BinaryOperator,
        right: Box<Expression>,
    },
    UnaryOp {
        op: UnaryOperator,
        expr: Box<Expression>,
    },
    /// A primary expression followed by predicates, e.g. `$nodes[2]` or `(a|b)[last()]`.
    Filter {
        primary: Box<Expression>,
        predicates: Vec<Expression>,
    },
    /// Pattern marker used by [`crate::tree::pattern`]. Evaluates as the wrapped expression.
    Capture(Box<Expression>),
}

/// A numeric literal. The source spelling is kept so that unparsing reproduces it.
#[derive(Debug, Clone, PartialEq)]
pub struct NumberLiteral {
    pub value: f64,
    pub text: String,
}

impl NumberLiteral {
    pub fn new(value: f64) -> Self {
        Self {
            value,
            text: format_number(value),
        }
    }
}

impl Expression {
    /// Checks if the expression is a `LocationPath` variant.
    pub fn is_location_path(&self) -> bool {
        matches!(self, Expression::LocationPath(_))
    }

    /// Checks if the expression is a `BinaryOp` variant.
    pub fn is_binary_op(&self) -> bool {
        matches!(self, Expression::BinaryOp { .. })
    }

    pub fn number(value: f64) -> Self {
        Expression::Number(NumberLiteral::new(value))
    }

    pub fn literal(value: impl Into<String>) -> Self {
        Expression::Literal(value.into())
    }

    pub fn binary(left: Expression, op: BinaryOperator, right: Expression) -> Self {
        Expression::BinaryOp {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    /// Short tag naming the kind of node, used by the debug printer.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Expression::Literal(_) => "primaryexpr str",
            Expression::Number(_) => "primaryexpr nr",
            Expression::Variable(_) => "varref",
            Expression::FunctionCall { .. } => "primaryexpr fn",
            Expression::BinaryOp { op, .. } => op.kind_name(),
            Expression::UnaryOp { .. } => "unaryexpr",
            Expression::Filter { .. } => "filterexpr",
            Expression::LocationPath(lp) => {
                if lp.start_point.is_some() {
                    "pathexpr"
                } else if lp.is_absolute {
                    "abslocpath"
                } else {
                    "rellocpath"
                }
            }
            Expression::Capture(_) => "capture",
        }
    }

    /// Binding strength of the expression's outermost construct. Higher binds tighter;
    /// used to decide where the unparser needs parentheses.
    pub fn precedence(&self) -> u8 {
        match self {
            Expression::BinaryOp { op, .. } => op.precedence(),
            Expression::UnaryOp { .. } => 7,
            Expression::LocationPath(_) | Expression::Filter { .. } => 9,
            Expression::Capture(inner) => inner.precedence(),
            Expression::Literal(_)
            | Expression::Number(_)
            | Expression::Variable(_)
            | Expression::FunctionCall { .. } => 10,
        }
    }

    /// Visits every node test in the tree, outermost first, together with the axis of its
    /// step. Stops at the first error returned by `f`.
    pub fn try_for_each_node_test_mut<E, F>(&mut self, f: &mut F) -> Result<(), E>
    where
        F: FnMut(Axis, &mut NodeTest) -> Result<(), E>,
    {
        match self {
            Expression::Literal(_) | Expression::Number(_) | Expression::Variable(_) => Ok(()),
            Expression::FunctionCall { args, .. } => {
                for arg in args {
                    arg.try_for_each_node_test_mut(f)?;
                }
                Ok(())
            }
            Expression::BinaryOp { left, right, .. } => {
                left.try_for_each_node_test_mut(f)?;
                right.try_for_each_node_test_mut(f)
            }
            Expression::UnaryOp { expr, .. } => expr.try_for_each_node_test_mut(f),
            Expression::Capture(inner) => inner.try_for_each_node_test_mut(f),
            Expression::Filter {
                primary,
                predicates,
            } => {
                primary.try_for_each_node_test_mut(f)?;
                for predicate in predicates {
                    predicate.try_for_each_node_test_mut(f)?;
                }
                Ok(())
            }
            Expression::LocationPath(lp) => {
                if let Some(start) = lp.start_point.as_deref_mut() {
                    start.try_for_each_node_test_mut(f)?;
                }
                for step in &mut lp.steps {
                    f(step.axis, &mut step.node_test)?;
                    for predicate in &mut step.predicates {
                        predicate.try_for_each_node_test_mut(f)?;
                    }
                }
                Ok(())
            }
        }
    }
}

/// A unary operator used in an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Minus,
}

/// A binary operator used in an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    // Logical
    Or,
    And,
    // Equality
    Equals,
    NotEquals,
    // Relational
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    // Additive
    Plus,
    Minus,
    // Multiplicative
    Multiply,
    Divide,
    Modulo,
    // Set
    Union,
}

impl BinaryOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOperator::Or => "or",
            BinaryOperator::And => "and",
            BinaryOperator::Equals => "=",
            BinaryOperator::NotEquals => "!=",
            BinaryOperator::LessThan => "<",
            BinaryOperator::LessThanOrEqual => "<=",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::GreaterThanOrEqual => ">=",
            BinaryOperator::Plus => "+",
            BinaryOperator::Minus => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "div",
            BinaryOperator::Modulo => "mod",
            BinaryOperator::Union => "|",
        }
    }

    pub fn precedence(self) -> u8 {
        match self {
            BinaryOperator::Or => 1,
            BinaryOperator::And => 2,
            BinaryOperator::Equals | BinaryOperator::NotEquals => 3,
            BinaryOperator::LessThan
            | BinaryOperator::LessThanOrEqual
            | BinaryOperator::GreaterThan
            | BinaryOperator::GreaterThanOrEqual => 4,
            BinaryOperator::Plus | BinaryOperator::Minus => 5,
            BinaryOperator::Multiply | BinaryOperator::Divide | BinaryOperator::Modulo => 6,
            BinaryOperator::Union => 8,
        }
    }

    pub fn kind_name(self) -> &'static str {
        match self.precedence() {
            1 => "orexpr",
            2 => "andexpr",
            3 => "eqexpr",
            4 => "relexpr",
            5 => "addexpr",
            6 => "mulexpr",
            _ => "unionexpr",
        }
    }
}

/// Represents a full location path, like `/child::foo`, `descendant::bar[1]`, or `$var/item`.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationPath {
    /// An optional starting expression, for paths like `$var/foo` or `func()/foo`.
    /// If `None`, the path starts from the context node or root.
    pub start_point: Option<Box<Expression>>,
    /// True if the path starts from the document root (e.g., `/foo`).
    /// Meaningless if `start_point` is `Some`.
    pub is_absolute: bool,
    pub steps: Vec<Step>,
}

impl LocationPath {
    pub fn relative(steps: Vec<Step>) -> Self {
        Self {
            start_point: None,
            is_absolute: false,
            steps,
        }
    }

    pub fn absolute(steps: Vec<Step>) -> Self {
        Self {
            start_point: None,
            is_absolute: true,
            steps,
        }
    }
}

/// Represents a single step in a location path, like `child::foo[position() > 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub axis: Axis,
    pub node_test: NodeTest,
    pub predicates: Vec<Expression>,
}

impl Step {
    pub fn new(axis: Axis, node_test: NodeTest) -> Self {
        Self {
            axis,
            node_test,
            predicates: vec![],
        }
    }

    pub fn child(local: &str) -> Self {
        Self::new(Axis::Child, NodeTest::name(None, local))
    }

    /// The step that `//` abbreviates.
    pub fn descendant_or_self_node() -> Self {
        Self::new(
            Axis::DescendantOrSelf,
            NodeTest::NodeType(NodeTypeTest::Node),
        )
    }

    pub fn with_predicate(mut self, predicate: Expression) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub(crate) fn is_node_step(&self, axis: Axis) -> bool {
        self.axis == axis
            && self.node_test == NodeTest::NodeType(NodeTypeTest::Node)
            && self.predicates.is_empty()
    }
}

/// The axis of movement from the context node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Ancestor,
    AncestorOrSelf,
    Attribute,
    Child,
    Descendant,
    DescendantOrSelf,
    Following,
    FollowingSibling,
    Namespace,
    Parent,
    Preceding,
    PrecedingSibling,
    SelfAxis,
}

impl Axis {
    pub const ALL: [Axis; 13] = [
        Axis::Ancestor,
        Axis::AncestorOrSelf,
        Axis::Attribute,
        Axis::Child,
        Axis::Descendant,
        Axis::DescendantOrSelf,
        Axis::Following,
        Axis::FollowingSibling,
        Axis::Namespace,
        Axis::Parent,
        Axis::Preceding,
        Axis::PrecedingSibling,
        Axis::SelfAxis,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Axis::Ancestor => "ancestor",
            Axis::AncestorOrSelf => "ancestor-or-self",
            Axis::Attribute => "attribute",
            Axis::Child => "child",
            Axis::Descendant => "descendant",
            Axis::DescendantOrSelf => "descendant-or-self",
            Axis::Following => "following",
            Axis::FollowingSibling => "following-sibling",
            Axis::Namespace => "namespace",
            Axis::Parent => "parent",
            Axis::Preceding => "preceding",
            Axis::PrecedingSibling => "preceding-sibling",
            Axis::SelfAxis => "self",
        }
    }

    pub fn from_name(name: &str) -> Option<Axis> {
        Axis::ALL.into_iter().find(|axis| axis.name() == name)
    }

    /// Reverse axes number their nodes in reverse document order for `position()`.
    pub fn is_reverse(self) -> bool {
        matches!(
            self,
            Axis::Ancestor | Axis::AncestorOrSelf | Axis::Preceding | Axis::PrecedingSibling
        )
    }
}

/// A test to apply to nodes on a given axis to see if they should be included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeTest {
    /// A qualified name test (e.g., `foo`, `if:name`).
    Name {
        prefix: Option<String>,
        local: String,
    },
    /// A wildcard test, `*` or `prefix:*`.
    Wildcard { prefix: Option<String> },
    /// A node type test (e.g., `text()`, `node()`).
    NodeType(NodeTypeTest),
}

impl NodeTest {
    pub fn name(prefix: Option<&str>, local: &str) -> Self {
        NodeTest::Name {
            prefix: prefix.map(str::to_string),
            local: local.to_string(),
        }
    }

    pub fn prefix(&self) -> Option<&str> {
        match self {
            NodeTest::Name { prefix, .. } | NodeTest::Wildcard { prefix } => prefix.as_deref(),
            NodeTest::NodeType(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeTypeTest {
    Text,
    Node,
    Comment,
    /// `processing-instruction()` with its optional target literal.
    ProcessingInstruction(Option<String>),
}

impl NodeTypeTest {
    pub fn name(&self) -> &'static str {
        match self {
            NodeTypeTest::Text => "text",
            NodeTypeTest::Node => "node",
            NodeTypeTest::Comment => "comment",
            NodeTypeTest::ProcessingInstruction(_) => "processing-instruction",
        }
    }
}
