use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Failed to read module registry: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid module registry document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Namespace '{namespace}' is claimed by both module '{existing}' and module '{module}'")]
    DuplicateNamespace {
        namespace: String,
        existing: String,
        module: String,
    },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown node flag '{0}'")]
pub struct UnknownFlagError(pub String);
