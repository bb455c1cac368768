use thiserror::Error;

use inventra_core::errors::{ApplicationError, DomainError};
use inventra_core::pipeline::PipelineTransitionError;
use inventra_db::repositories::RepositoryError;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("classification failed: {0}")]
    Classification(#[source] anyhow::Error),
    #[error("decision failed: {0}")]
    Decision(#[source] anyhow::Error),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Transition(#[from] PipelineTransitionError),
}

impl From<PipelineError> for ApplicationError {
    fn from(error: PipelineError) -> Self {
        match error {
            PipelineError::Classification(_) | PipelineError::Decision(_) => {
                Self::Integration(error.to_string())
            }
            PipelineError::Repository(_) => Self::Persistence(error.to_string()),
            PipelineError::Transition(error) => Self::Domain(DomainError::PipelineTransition(error)),
        }
    }
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;

    use inventra_core::errors::{ApplicationError, InterfaceError};
    use inventra_db::repositories::RepositoryError;

    use super::PipelineError;

    #[test]
    fn model_failures_surface_as_unavailable() {
        let error = ApplicationError::from(PipelineError::Decision(anyhow!("timeout")));
        assert_eq!(error, ApplicationError::Integration("decision failed: timeout".to_string()));
        assert!(matches!(error.into_interface("q-1"), InterfaceError::ServiceUnavailable { .. }));
    }

    #[test]
    fn repository_failures_map_to_persistence() {
        let error = ApplicationError::from(PipelineError::from(RepositoryError::Decode(
            "bad price".to_string(),
        )));
        assert_eq!(error, ApplicationError::Persistence("decode error: bad price".to_string()));
    }
}
