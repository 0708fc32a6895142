use thiserror::Error;

/// Errors surfaced by a render root.
///
/// Errors raised anywhere in a pass abort the pass and reach the caller of the root entry point
/// unchanged; there are no per-subtree boundaries and no retries.
#[derive(Debug, Error)]
pub enum RenderError {
    /// No container to mount into.
    #[error("no container was supplied to mount into")]
    InvalidContainer,
    /// The root description is null. Interior nulls render nothing, a null root is a caller error.
    #[error("the root element is null")]
    NullRoot,
    /// A component function failed. The component's own error is passed through untouched.
    #[error(transparent)]
    ComponentInvocation(#[from] anyhow::Error),
}
