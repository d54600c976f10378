use thiserror::Error;

#[derive(Error, Debug)]
pub enum XmlError {
    #[error("Malformed XML: {0}")]
    Parse(#[from] roxmltree::Error),

    #[error("Prefix '{0}' is not bound to a namespace")]
    UnboundPrefix(String),

    #[error("Node {0} cannot have children or attributes")]
    NotAnElement(u32),
}
