//! Page rendering errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PageError {
    /// Template failed to parse at startup
    #[error("Invalid template '{0}': {1}")]
    InvalidTemplate(String, String),

    /// Template rendering error
    #[error("Template error: {0}")]
    TemplateError(String),
}
