//! Typed failure categories for bundle builds and deployments.
//!
//! Filesystem and codec failures travel as plain [`anyhow::Error`] chains
//! with the offending path attached via context; the variants here are the
//! faults callers may want to match on. They stay downcastable inside an
//! `anyhow` chain.

use thiserror::Error;

/// Faults raised by the build and deploy pipeline.
#[derive(Debug, Error)]
pub enum GantryError {
    /// A descriptor or referenced build input is malformed or missing.
    ///
    /// Raised before any archive is produced.
    #[error("invalid bundle input: {0}")]
    Input(String),

    /// The compiler collaborator rejected a component.
    ///
    /// Fatal to the whole bundle build; no partial bundle is written.
    #[error("component '{classname}' failed to compile: {diagnostics}")]
    Compile {
        classname: String,
        diagnostics: String,
    },
}

impl GantryError {
    /// Shorthand for an [`GantryError::Input`] fault.
    pub fn input(message: impl Into<String>) -> Self {
        Self::Input(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_error_carries_classname_and_diagnostics() {
        let err = GantryError::Compile {
            classname: "OrderModule".to_string(),
            diagnostics: "missing symbol Order".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("OrderModule"));
        assert!(message.contains("missing symbol Order"));
    }

    #[test]
    fn input_error_survives_anyhow_downcast() {
        let err: anyhow::Error = GantryError::input("application name is empty").into();
        let input = err
            .downcast_ref::<GantryError>()
            .expect("should downcast back to GantryError");
        assert!(matches!(input, GantryError::Input(_)));
    }
}
