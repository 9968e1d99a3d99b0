use thiserror::Error;

/// Error taxonomy for the analysis core.
///
/// `Syntax` failures are per-file and isolated: the offending file is skipped
/// and the batch continues. `Validation` failures record malformed input to a
/// core operation; the operation continues with that input's contribution
/// omitted. `System` failures are fatal signals from outside the core and
/// abort the batch.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("syntax error in {file}: {message}")]
    Syntax { file: String, message: String },
    #[error("validation error: {message}")]
    Validation { message: String },
    #[error("system error: {message}")]
    System { message: String },
}

impl AnalysisError {
    pub fn syntax(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Syntax {
            file: file.into(),
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn system(message: impl Into<String>) -> Self {
        Self::System {
            message: message.into(),
        }
    }
}
