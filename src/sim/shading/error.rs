use thiserror::Error;

/// Errors that abort a shade benefit analysis.
///
/// Raised through `anyhow`; use `err.downcast_ref::<ShadeError>()` to branch on the category.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ShadeError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Simulation data does not match geometry: {0}")]
    DataMismatch(String),

    /// Recoverable; reported through logs and the skipped polygon count.
    #[error("Degenerate geometry: {0}")]
    GeometryDegenerate(String),

    #[error("Ray intersection worker failed: {0}")]
    WorkerFailure(String),
}
