use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum XPathError {
    #[error("XPath expression is empty")]
    EmptyExpression,

    #[error("XPath syntax error on line {line}, column {column} in '{xpath}': {message}")]
    Syntax {
        xpath: String,
        line: usize,
        column: usize,
        message: String,
    },

    #[error("Function '{function}' error: {message}")]
    FunctionError { function: String, message: String },

    #[error("Type error: {0}")]
    TypeError(String),

    #[error("No namespace bound to prefix '{0}'")]
    UnresolvedPrefix(String),

    #[error("Variable '{0}' not found")]
    UnknownVariable(String),

    #[error("Unsupported XPath feature: {0}")]
    Unsupported(String),
}

impl XPathError {
    /// Line of a syntax error, 1-based.
    pub fn line(&self) -> Option<usize> {
        match self {
            XPathError::Syntax { line, .. } => Some(*line),
            _ => None,
        }
    }
}
