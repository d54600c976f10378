//! An XPath 1.0 engine for YANG-modeled configuration trees.
//!
//! Expressions are parsed once with [`parse_expression`] into an [`Expression`] tree and
//! evaluated with [`evaluate`] against any tree that implements [`DataSourceNode`].
//! Besides the XPath 1.0 core library, the YANG functions `current()` and `re-match()`
//! are available. [`canonicalize`] rewrites prefixes to those of the owning YANG
//! modules, and the [`tree`] module prints, unparses and pattern-matches expressions.

pub mod ast;
pub mod axes;
pub mod canonical;
pub mod context;
pub mod datasource;
pub mod engine;
pub mod error;
pub mod functions;
pub mod operators;
pub mod parser;
pub mod tree;

pub use ast::{
    Axis, BinaryOperator, Expression, LocationPath, NodeTest, NodeTypeTest, NumberLiteral, Step,
    UnaryOperator,
};
pub use canonical::{Canonicalized, canonicalize};
pub use context::{EvaluationContext, XPathValue, format_number, string_to_number};
pub use datasource::{DataSourceNode, NodeType, QName};
pub use engine::evaluate;
pub use tree::pattern::{Match, Pattern, tree_match};
pub use tree::print::print;
pub use tree::unparse::unparse;
pub use tree::{TreeNode, traverse};

// Re-export test utilities for integration testing in downstream crates
pub use datasource::tests;
pub use error::XPathError;
pub use parser::parse_expression;
