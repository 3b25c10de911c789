use std::path::Path;

/// Errors surfaced while validating a module directory.
///
/// `Parse`, `Init` and `Schema` are fatal for the directory they occur in;
/// the orchestrator treats them as fatal for the root module only and as a
/// logged skip for submodules. Schema lookup misses are not errors at all,
/// they are logged and the entity contributes zero findings.
#[derive(Debug, thiserror::Error)]
pub enum ValidatorError {
    #[error("failed to parse {file}: {message}")]
    Parse { file: String, message: String },

    #[error("terraform init failed in {dir}: {message}")]
    Init { dir: String, message: String },

    #[error("failed to retrieve provider schema in {dir}: {message}")]
    Schema { dir: String, message: String },

    #[error("no terraform configuration found in {dir}")]
    MissingConfiguration { dir: String },

    #[error("i/o error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("validation cancelled")]
    Cancelled,
}

impl ValidatorError {
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        ValidatorError::Io { path: path.display().to_string(), source }
    }
}
