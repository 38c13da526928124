use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("Store rejected request (HTTP {status}): {message}")]
    StoreError { status: u16, message: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Spreadsheet error: {message}")]
    SpreadsheetError { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Unsupported file format: {extension}")]
    UnsupportedFormat { extension: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::SpreadsheetError {
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Store,
    Input,
    Configuration,
    Data,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ImportError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ImportError::ApiError(_) => ErrorCategory::Network,
            ImportError::StoreError { .. } => ErrorCategory::Store,
            ImportError::CsvError(_)
            | ImportError::SpreadsheetError { .. }
            | ImportError::FileNotFound { .. }
            | ImportError::UnsupportedFormat { .. } => ErrorCategory::Input,
            ImportError::ConfigError { .. }
            | ImportError::ConfigValidationError { .. }
            | ImportError::InvalidConfigValueError { .. }
            | ImportError::MissingConfigError { .. } => ErrorCategory::Configuration,
            ImportError::SerializationError(_) | ImportError::ValidationError { .. } => {
                ErrorCategory::Data
            }
            ImportError::IoError(_) => ErrorCategory::System,
        }
    }

    /// 嚴重程度，CLI 以此決定結束碼
    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network | ErrorCategory::Store => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::Data => ErrorSeverity::High,
            ErrorCategory::Input | ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            ImportError::ApiError(_) => "Check network connectivity and the store URL",
            ImportError::StoreError { status, .. } if *status == 401 || *status == 403 => {
                "Check the store access key and the table's row level security policies"
            }
            ImportError::StoreError { status, .. } if *status == 404 => {
                "Check the table name and that the record id exists"
            }
            ImportError::StoreError { .. } => {
                "Inspect the store error message; failed batches can be resubmitted"
            }
            ImportError::CsvError(_) | ImportError::SpreadsheetError { .. } => {
                "Make sure the file is a valid spreadsheet with a header row on the first sheet"
            }
            ImportError::FileNotFound { .. } => "Check the file path",
            ImportError::UnsupportedFormat { .. } => "Use an .xlsx, .xls, .ods or .csv file",
            ImportError::IoError(_) => "Check file permissions and available disk space",
            ImportError::SerializationError(_) => "Report the record that could not be encoded",
            ImportError::ConfigError { .. }
            | ImportError::ConfigValidationError { .. }
            | ImportError::InvalidConfigValueError { .. } => {
                "Fix the configuration file or command line flags"
            }
            ImportError::MissingConfigError { .. } => {
                "Set SUPABASE_URL / SUPABASE_ANON_KEY or pass --store-url / --store-key"
            }
            ImportError::ValidationError { .. } => "Fix the input data and retry",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            ImportError::FileNotFound { path } => format!("Cannot find file '{}'", path),
            ImportError::UnsupportedFormat { extension } => {
                format!("Files of type '{}' cannot be imported", extension)
            }
            ImportError::StoreError { status, message } => {
                format!("The player store refused the request ({}): {}", status, message)
            }
            ImportError::ApiError(_) => "Could not reach the player store".to_string(),
            ImportError::MissingConfigError { field } => {
                format!("Missing required setting: {}", field)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ImportError>;
