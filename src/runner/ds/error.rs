use std::result;

use thiserror::Error;

pub type Result<T, E = ContainerError> = result::Result<T, E>;

/// Fatal conditions raised by container operations. Recoverable conditions are reported as
/// [`Diagnostic`](crate::runner::ds::diagnostic::Diagnostic)s instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ContainerError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Illegal offset type: {0}")]
    IllegalOffset(String),

    #[error("Cannot access non-public property {class}::${name}")]
    InaccessibleProperty { class: String, name: String },

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("{0} is not yet supported")]
    NotImplemented(String),

    #[error("Class \"{0}\" not found")]
    UnknownClass(String),

    #[error("Nesting level exceeds {0}")]
    NestingTooDeep(usize),

    #[error("Config error: {0}")]
    Config(String),
}

impl ContainerError {
    pub fn malformed<S: Into<String>>(message: S) -> Self {
        ContainerError::MalformedPayload(message.into())
    }
}
