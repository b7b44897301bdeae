use thiserror::Error;

/// Error kinds surfaced by the preview runtime.
///
/// `Clone` is load-bearing: a shared in-flight bundle load fans its failure
/// out to every awaiting caller.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PreviewError {
    /// The requested or default preview type is not registered, the component
    /// identity could not be resolved from the location, or the bundle failed
    /// to load or did not expose the requested preview type's sub-module.
    #[error("preview not found: {0}")]
    PreviewNotFound(String),

    /// A registered rendering-context provider failed during context
    /// construction.
    #[error("rendering context provider failed: {message}")]
    ContextProviderFailure { message: String },

    /// The preview definition's own render function failed.
    #[error("render of preview type {preview_type} failed: {message}")]
    RenderFunctionFailure {
        preview_type: String,
        message: String,
    },
}

impl PreviewError {
    pub fn not_found(preview_type: impl Into<String>) -> Self {
        Self::PreviewNotFound(preview_type.into())
    }
}
