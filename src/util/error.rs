// LogNorm - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// All errors preserve the causal chain for diagnostic logging.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type for a LogNorm run.
/// Errors are categorised by the subsystem that produced them.
#[derive(Debug)]
pub enum LogNormError {
    /// A raw record could not be transformed.
    Transform(TransformError),

    /// Input file discovery failed.
    Discovery(DiscoveryError),

    /// Reading an input file failed.
    Input(InputError),

    /// Writing the consolidated output failed.
    Export(ExportError),

    /// Configuration loading failed.
    Config(ConfigError),
}

impl fmt::Display for LogNormError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transform(e) => write!(f, "Transform error: {e}"),
            Self::Discovery(e) => write!(f, "Discovery error: {e}"),
            Self::Input(e) => write!(f, "Input error: {e}"),
            Self::Export(e) => write!(f, "Output error: {e}"),
            Self::Config(e) => write!(f, "Configuration error: {e}"),
        }
    }
}

impl std::error::Error for LogNormError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Transform(e) => Some(e),
            Self::Discovery(e) => Some(e),
            Self::Input(e) => Some(e),
            Self::Export(e) => Some(e),
            Self::Config(e) => Some(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Registry errors
// ---------------------------------------------------------------------------

/// Reasons an app code source could not be used.
///
/// `AppCodeRegistry::load` never surfaces these; it logs them and degrades to
/// an empty registry. They are returned by `AppCodeRegistry::parse` and
/// `try_load` so the reason stays inspectable.
#[derive(Debug)]
pub enum RegistryError {
    /// The source file does not exist.
    NotFound { path: PathBuf },

    /// The source file exists but could not be read.
    Io { path: PathBuf, source: io::Error },

    /// A non-blank line is neither a comment, a section header nor `key=value`.
    MalformedLine { line_number: usize, line: String },

    /// A `key=value` line has nothing before the `=`.
    EmptyKey { line_number: usize },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { path } => {
                write!(f, "App code file '{}' does not exist", path.display())
            }
            Self::Io { path, source } => {
                write!(f, "Cannot read app code file '{}': {source}", path.display())
            }
            Self::MalformedLine { line_number, line } => {
                write!(f, "line {line_number}: expected 'key = value', got '{line}'")
            }
            Self::EmptyKey { line_number } => write!(f, "line {line_number}: empty key"),
        }
    }
}

impl std::error::Error for RegistryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Transform errors
// ---------------------------------------------------------------------------

/// Errors raised while converting one raw record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformError {
    /// A required identifying field is absent from the raw record.
    MissingRequiredField {
        record_id: u64,
        field: &'static str,
    },
}

impl fmt::Display for TransformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingRequiredField { record_id, field } => {
                write!(f, "record {record_id}: missing required field '{field}'")
            }
        }
    }
}

impl std::error::Error for TransformError {}

impl From<TransformError> for LogNormError {
    fn from(e: TransformError) -> Self {
        Self::Transform(e)
    }
}

// ---------------------------------------------------------------------------
// Discovery errors
// ---------------------------------------------------------------------------

/// Errors related to input file discovery.
#[derive(Debug)]
pub enum DiscoveryError {
    /// The data directory does not exist or is not accessible.
    RootNotFound { path: PathBuf },

    /// The data path is not a directory.
    NotADirectory { path: PathBuf },

    /// Permission denied accessing the data directory.
    PermissionDenied { path: PathBuf, source: io::Error },
}

impl fmt::Display for DiscoveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RootNotFound { path } => {
                write!(f, "Data directory '{}' does not exist", path.display())
            }
            Self::NotADirectory { path } => {
                write!(f, "Data path '{}' is not a directory", path.display())
            }
            Self::PermissionDenied { path, source } => {
                write!(
                    f,
                    "Permission denied accessing '{}': {source}",
                    path.display()
                )
            }
        }
    }
}

impl std::error::Error for DiscoveryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::PermissionDenied { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<DiscoveryError> for LogNormError {
    fn from(e: DiscoveryError) -> Self {
        Self::Discovery(e)
    }
}

// ---------------------------------------------------------------------------
// Input errors
// ---------------------------------------------------------------------------

/// Errors reading a delimited input file.
#[derive(Debug)]
pub enum InputError {
    /// The file could not be opened.
    Open { path: PathBuf, source: io::Error },

    /// The header row or a data row could not be read.
    Csv { path: PathBuf, source: csv::Error },
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open { path, source } => {
                write!(f, "Cannot open '{}': {source}", path.display())
            }
            Self::Csv { path, source } => {
                write!(f, "Cannot read '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for InputError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Open { source, .. } => Some(source),
            Self::Csv { source, .. } => Some(source),
        }
    }
}

impl From<InputError> for LogNormError {
    fn from(e: InputError) -> Self {
        Self::Input(e)
    }
}

// ---------------------------------------------------------------------------
// Export errors
// ---------------------------------------------------------------------------

/// Errors related to writing the consolidated output.
#[derive(Debug)]
pub enum ExportError {
    /// I/O error creating or flushing the output.
    Io { path: PathBuf, source: io::Error },

    /// CSV serialisation error.
    Csv { path: PathBuf, source: csv::Error },

    /// JSON serialisation error (run summary).
    Json { source: serde_json::Error },
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "Output I/O error '{}': {source}", path.display())
            }
            Self::Csv { path, source } => {
                write!(f, "CSV write error '{}': {source}", path.display())
            }
            Self::Json { source } => write!(f, "Summary serialisation error: {source}"),
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Csv { source, .. } => Some(source),
            Self::Json { source } => Some(source),
        }
    }
}

impl From<ExportError> for LogNormError {
    fn from(e: ExportError) -> Self {
        Self::Export(e)
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// Errors related to configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    /// TOML parsing failed.
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// A config value is not one of the accepted values.
    InvalidValue {
        field: &'static str,
        value: String,
        expected: String,
    },

    /// I/O error reading config file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TomlParse { path, source } => {
                write!(f, "Config parse error '{}': {source}", path.display())
            }
            Self::InvalidValue {
                field,
                value,
                expected,
            } => write!(
                f,
                "Config '{field}' = '{value}' is not valid. Expected: {expected}"
            ),
            Self::Io { path, source } => {
                write!(f, "Config I/O error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TomlParse { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ConfigError> for LogNormError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

/// Convenience type alias for LogNorm results.
pub type Result<T> = std::result::Result<T, LogNormError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_message_names_record() {
        let err = TransformError::MissingRequiredField {
            record_id: 7,
            field: "app",
        };
        assert_eq!(err.to_string(), "record 7: missing required field 'app'");

        let top: LogNormError = err.into();
        assert!(top.to_string().contains("record 7"));
        assert!(std::error::Error::source(&top).is_some());
    }

    #[test]
    fn test_input_error_keeps_io_source() {
        let err = InputError::Open {
            path: PathBuf::from("data/a.log"),
            source: io::Error::new(io::ErrorKind::NotFound, "gone"),
        };
        let msg = err.to_string();
        assert!(msg.contains("data/a.log"), "got: {msg}");
        assert!(std::error::Error::source(&err).is_some());
    }
}
