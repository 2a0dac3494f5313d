//! Error types.
//!
//! `AppError` is what the pipeline and the binary deal with: a message plus the
//! process exit code. Lower-level modules return their own `thiserror` enums and
//! are converted at the boundary.
//!
//! Exit codes:
//! - 2: configuration / input problems (bad flags, missing response table, bad images)
//! - 3: model cache I/O
//! - 4: numerical failures while building the model

use crate::fit::FitError;
use crate::io::cache::CacheError;
use crate::models::ResponseError;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    /// Shorthand for exit code 2.
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(2, message)
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

impl From<ResponseError> for AppError {
    fn from(err: ResponseError) -> Self {
        AppError::new(2, format!("Response table error: {err}"))
    }
}

impl From<CacheError> for AppError {
    fn from(err: CacheError) -> Self {
        AppError::new(3, format!("Model cache error: {err}"))
    }
}

impl From<FitError> for AppError {
    fn from(err: FitError) -> Self {
        AppError::new(2, format!("Fit error: {err}"))
    }
}
