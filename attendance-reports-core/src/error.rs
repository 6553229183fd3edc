use thiserror::Error;

use crate::contract::StoreError;
use crate::render::RenderError;

/// Failures surfaced by the report pipeline and the roster operations.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("{operation} failed: {source}")]
    Upstream {
        operation: &'static str,
        #[source]
        source: StoreError,
    },

    #[error("invalid request: {0}")]
    Validation(String),

    #[error("rendering failed: {0}")]
    Render(#[from] RenderError),
}

impl ReportError {
    pub fn student_not_found(id: &str) -> Self {
        ReportError::NotFound {
            entity: "student",
            id: id.to_string(),
        }
    }

    /// Adapter for `map_err` on collaborator calls.
    pub fn upstream(operation: &'static str) -> impl FnOnce(StoreError) -> Self {
        move |source| ReportError::Upstream { operation, source }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ReportError::NotFound { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ReportError::Validation(_))
    }
}
