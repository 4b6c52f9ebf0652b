use thiserror::Error;

#[derive(Error, Debug)]
pub enum LabelError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("Page request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Bad input from the operator; fix and rerun.
    Low,
    /// Remote side misbehaved; rerunning later may help.
    Medium,
    /// Local environment problem (disk, permissions).
    High,
}

impl LabelError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            LabelError::HttpError(_) => ErrorSeverity::Medium,
            LabelError::IoError(_) | LabelError::ZipError(_) | LabelError::CsvError(_) => {
                ErrorSeverity::High
            }
            _ => ErrorSeverity::Low,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            LabelError::HttpError(_) => {
                "Check the session cookie and network access, then rerun"
            }
            LabelError::IoError(_) | LabelError::ZipError(_) => {
                "Check that the output directory exists and is writable"
            }
            LabelError::CsvError(_) | LabelError::SerializationError(_) => {
                "The orders file may be corrupt; collect orders again"
            }
            LabelError::TomlError(_)
            | LabelError::UrlError(_)
            | LabelError::InvalidConfigValueError { .. }
            | LabelError::MissingConfigError { .. } => "Fix the configuration and rerun",
            LabelError::ProcessingError { .. } => "Rerun with --verbose for details",
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 1,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, LabelError>;
