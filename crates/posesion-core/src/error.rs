use thiserror::Error;

/// Errors raised while loading or validating a layout registry.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Failed to read layout file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse layout: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid layout: {0}")]
    Invalid(String),
}

/// Errors raised while rendering an estate case into the template.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to load template PDF: {0}")]
    Template(String),

    #[error("Template has {found} pages, layout expects at least {expected}")]
    PageCount { expected: usize, found: usize },

    #[error("PDF assembly failed: {0}")]
    Assembly(String),
}
