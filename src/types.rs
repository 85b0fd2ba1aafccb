use reqwest::StatusCode;
use thiserror::Error;

/// Errors surfaced by the job API client and the wizard actions.
#[derive(Debug, Error)]
pub enum WizardError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("{message}")]
    Rejected {
        path: String,
        status: StatusCode,
        message: String,
    },

    #[error("{0}")]
    Validation(String),

    #[error("no credentials stored, enter login and password first")]
    MissingCredentials,

    #[error("job service not ready: {0}")]
    NotReady(String),
}

impl WizardError {
    /// True when the server answered 404, i.e. the endpoint does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            WizardError::Rejected { status, .. } if *status == StatusCode::NOT_FOUND
        )
    }
}
