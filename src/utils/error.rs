use crate::domain::metadata::InvalidMetadataValue;
use crate::domain::model::RunSummary;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssemblyInfoError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("XML error: {0}")]
    XmlError(#[from] quick_xml::Error),

    #[error(transparent)]
    MetadataError(#[from] InvalidMetadataValue),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for '{field}': '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Source directory does not exist: {path}")]
    SourceDirectoryNotFound { path: String },

    #[error("No files found for: {patterns}")]
    NoFilesFound { patterns: String },

    #[error("{} file(s) could not be updated", .summary.failed.len())]
    FilesFailed { summary: Box<RunSummary> },

    #[error("Processing error: {message}")]
    ProcessingError { message: String },

    #[error("{count} warning(s) raised while fail-on-warning is enabled")]
    WarningsAsErrors { count: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Io,
    Configuration,
    Metadata,
    Parsing,
    Discovery,
    Processing,
    Policy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    /// 依嚴重程度決定退出碼
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorSeverity::Low => 0,      // 警告，但成功
            ErrorSeverity::Medium => 2,   // 警告視為錯誤
            ErrorSeverity::High => 1,     // 處理錯誤
            ErrorSeverity::Critical => 3, // 系統錯誤
        }
    }
}

impl AssemblyInfoError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::IoError(_) => ErrorCategory::Io,
            Self::SerializationError(_) | Self::XmlError(_) => ErrorCategory::Parsing,
            Self::MetadataError(_) => ErrorCategory::Metadata,
            Self::ConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. }
            | Self::ConfigValidationError { .. } => ErrorCategory::Configuration,
            Self::SourceDirectoryNotFound { .. } | Self::NoFilesFound { .. } => {
                ErrorCategory::Discovery
            }
            Self::ProcessingError { .. } | Self::FilesFailed { .. } => ErrorCategory::Processing,
            Self::WarningsAsErrors { .. } => ErrorCategory::Policy,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Policy => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::Metadata | ErrorCategory::Discovery => {
                ErrorSeverity::High
            }
            ErrorCategory::Parsing | ErrorCategory::Processing => ErrorSeverity::High,
            ErrorCategory::Io => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::IoError(_) => "Check that the files are writable and not locked by another process",
            Self::SerializationError(_) => "Try a different output format",
            Self::XmlError(_) => "Make sure the project file is well-formed XML",
            Self::MetadataError(_) => {
                "Versions need 2-4 numeric parts (wildcards only in build/revision) and cultures look like 'en-GB'"
            }
            Self::ConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. }
            | Self::ConfigValidationError { .. } => "Review the command line arguments or the TOML file",
            Self::SourceDirectoryNotFound { .. } => "Point --path at an existing source directory",
            Self::NoFilesFound { .. } => "Check the file patterns, e.g. '**/AssemblyInfo.cs' or '**/*.csproj'",
            Self::FilesFailed { .. } => "Fix the files listed above; the other files were updated",
            Self::ProcessingError { .. } => "Run again with --log-level verbose for details",
            Self::WarningsAsErrors { .. } => "Fix the warnings above or disable --fail-on-warning",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::MetadataError(e) => format!("Invalid {}: {}", e.field, e.reason),
            Self::SourceDirectoryNotFound { path } => format!("Source directory not found: {}", path),
            Self::NoFilesFound { patterns } => format!("Nothing to update, no files matched {}", patterns),
            Self::FilesFailed { summary } => {
                let paths: Vec<&str> = summary.failed.iter().map(|f| f.path.as_str()).collect();
                format!("Could not update: {}", paths.join(", "))
            }
            Self::WarningsAsErrors { count } => {
                format!("Run failed because {} warning(s) were raised", count)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AssemblyInfoError>;
