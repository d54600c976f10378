use netxpath_types::RegistryError;
use netxpath_xml::XmlError;
use netxpath_xpath1::XPathError;
use thiserror::Error;

/// Errors surfaced by the query API and the command-line tool.
#[derive(Error, Debug)]
pub enum NetXPathError {
    #[error(transparent)]
    XPath(#[from] XPathError),

    #[error("XML error: {0}")]
    Xml(#[from] XmlError),

    #[error("Module registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl NetXPathError {
    /// The XPath syntax error line, for reporting to the peer that sent the expression.
    pub fn syntax_line(&self) -> Option<usize> {
        match self {
            NetXPathError::XPath(e) => e.line(),
            _ => None,
        }
    }
}
