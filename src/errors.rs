// src/errors.rs
use crate::validation::FormErrors;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CarscanError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid form: {0}")]
    InvalidForm(FormErrors),

    #[error("Analysis failed: {0}")]
    AnalysisFailed(String),

    #[error("History unavailable: {0}")]
    HistoryUnavailable(String),

    #[error("Image processing error: {0}")]
    ImageProcessing(String),

    #[error("Authentication error: {0}")]
    Auth(String),
}

impl From<FormErrors> for CarscanError {
    fn from(errors: FormErrors) -> Self {
        CarscanError::InvalidForm(errors)
    }
}
