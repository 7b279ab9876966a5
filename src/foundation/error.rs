/// Convenience result type used across the harness.
pub type RenderTestResult<T> = Result<T, RenderTestError>;

/// Top-level error taxonomy for the driver, scheduler and collaborators.
#[derive(thiserror::Error, Debug)]
pub enum RenderTestError {
    /// The connector identifier does not resolve to a usable display connector.
    #[error("connector unavailable: {0}")]
    ConnectorUnavailable(String),

    /// No renderer could be instantiated for the connector's device.
    #[error("renderer unavailable: {0}")]
    RendererUnavailable(String),

    /// A renderer call was issued out of bind/begin/end/unbind order.
    #[error("invalid pipeline state: {op} while {state}")]
    InvalidPipelineState {
        /// Operation that was attempted.
        op: &'static str,
        /// Pipeline state the operation was attempted in.
        state: &'static str,
    },

    /// Presenting the connector's buffer failed.
    #[error("presentation error: {0}")]
    Presentation(String),

    /// Invalid user-provided settings.
    #[error("validation error: {0}")]
    Validation(String),

    /// A collaborator reported a failure outside the categories above.
    #[error("backend error: {0}")]
    Backend(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RenderTestError {
    /// Build a [`RenderTestError::ConnectorUnavailable`] value.
    pub fn connector_unavailable(msg: impl Into<String>) -> Self {
        Self::ConnectorUnavailable(msg.into())
    }

    /// Build a [`RenderTestError::RendererUnavailable`] value.
    pub fn renderer_unavailable(msg: impl Into<String>) -> Self {
        Self::RendererUnavailable(msg.into())
    }

    /// Build a [`RenderTestError::InvalidPipelineState`] value.
    pub fn invalid_pipeline(op: &'static str, state: &'static str) -> Self {
        Self::InvalidPipelineState { op, state }
    }

    /// Build a [`RenderTestError::Presentation`] value.
    pub fn presentation(msg: impl Into<String>) -> Self {
        Self::Presentation(msg.into())
    }

    /// Build a [`RenderTestError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`RenderTestError::Backend`] value.
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    /// Whether a scheduled render loop may keep going after this error.
    ///
    /// Only a failed present qualifies: the next frame simply presents again.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Presentation(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
