use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiscountError {
    #[error("CSV parse error: {message}")]
    ParseError { message: String },

    #[error("{message}")]
    TransformError { message: String },

    #[error("{message}")]
    ValidationError { message: String },

    #[error("Remote API request failed: {message}")]
    RemoteProtocolError { message: String },

    #[error("{}", .messages.join(", "))]
    RemoteValidationError { messages: Vec<String> },

    #[error("Unrecognized response format: {message}")]
    ResponseFormatError { message: String },

    #[error("Nothing to export: {message}")]
    EmptyExportError { message: String },

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Row,
    Remote,
    Export,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl DiscountError {
    pub fn parse(message: impl Into<String>) -> Self {
        Self::ParseError {
            message: message.into(),
        }
    }

    pub fn transform(message: impl Into<String>) -> Self {
        Self::TransformError {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
        }
    }

    pub fn remote(message: impl Into<String>) -> Self {
        Self::RemoteProtocolError {
            message: message.into(),
        }
    }

    pub fn response_format(message: impl Into<String>) -> Self {
        Self::ResponseFormatError {
            message: message.into(),
        }
    }

    pub fn empty_export(message: impl Into<String>) -> Self {
        Self::EmptyExportError {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ParseError { .. } | Self::CsvError(_) => ErrorCategory::Input,
            Self::TransformError { .. } | Self::ValidationError { .. } => ErrorCategory::Row,
            Self::RemoteProtocolError { .. }
            | Self::RemoteValidationError { .. }
            | Self::ResponseFormatError { .. }
            | Self::HttpError(_) => ErrorCategory::Remote,
            Self::EmptyExportError { .. } | Self::ZipError(_) => ErrorCategory::Export,
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            Self::IoError(_) | Self::SerializationError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Row => ErrorSeverity::Low,
            ErrorCategory::Remote => ErrorSeverity::Medium,
            ErrorCategory::Input | ErrorCategory::Export | ErrorCategory::Configuration => {
                ErrorSeverity::High
            }
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// 給使用者看的簡短訊息
    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::ParseError { .. } | Self::CsvError(_) => {
                format!("The uploaded CSV could not be read: {}", self)
            }
            Self::EmptyExportError { .. } => format!("Export failed: {}", self),
            Self::MissingConfigError { field } => {
                format!("Required setting '{}' was not provided", field)
            }
            Self::InvalidConfigValueError { field, reason, .. } => {
                format!("Setting '{}' is invalid: {}", field, reason)
            }
            _ => self.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Input => {
                "Check that the file is UTF-8 CSV with a header row and balanced quotes"
            }
            ErrorCategory::Row => "Fix the affected rows and run the batch again",
            ErrorCategory::Remote => {
                "Check the shop domain, access token and API version, then retry"
            }
            ErrorCategory::Export => "Run a generation batch that produces results before exporting",
            ErrorCategory::Configuration => "Review the command line flags and the TOML config file",
            ErrorCategory::System => "Check file permissions and available disk space",
        }
    }
}

pub type Result<T> = std::result::Result<T, DiscountError>;
