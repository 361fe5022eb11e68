// LogNorm - platform/config.rs
//
// Platform config directory resolution and config.toml loading with
// startup validation.
//
// Uses the `directories` crate for XDG (Linux), AppData (Windows),
// Library (macOS) compliance.

use crate::core::model::{OnInvalidRecord, RequiredFields};
use crate::util::constants;
use crate::util::error::ConfigError;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Resolved platform paths for LogNorm configuration.
#[derive(Debug, Clone)]
pub struct PlatformPaths {
    /// Configuration directory (e.g. ~/.config/lognorm/ or %APPDATA%\LogNorm\config\)
    pub config_dir: PathBuf,
}

impl PlatformPaths {
    /// Resolve platform-appropriate paths.
    ///
    /// Falls back to current directory if platform dirs cannot be determined.
    pub fn resolve() -> Self {
        if let Some(proj_dirs) = ProjectDirs::from("", "", constants::APP_ID) {
            let config_dir = proj_dirs.config_dir().to_path_buf();
            tracing::debug!(config = %config_dir.display(), "Platform paths resolved");
            Self { config_dir }
        } else {
            tracing::warn!("Could not determine platform directories, using current directory");
            Self {
                config_dir: PathBuf::from("."),
            }
        }
    }

    /// Default location of config.toml.
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(constants::CONFIG_FILE_NAME)
    }
}

// =============================================================================
// config.toml loading and validation
// =============================================================================

/// Raw deserialisable shape of config.toml.
///
/// Unknown keys are silently ignored for forward compatibility.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RawConfig {
    /// `[input]` section.
    pub input: InputSection,
    /// `[registry]` section.
    pub registry: RegistrySection,
    /// `[output]` section.
    pub output: OutputSection,
    /// `[transform]` section.
    pub transform: TransformSection,
    /// `[logging]` section.
    pub logging: LoggingSection,
}

/// `[input]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct InputSection {
    /// Directory scanned for input files.
    pub data_dir: Option<String>,
    /// Include glob patterns.
    pub include_patterns: Option<Vec<String>>,
    /// Exclude glob patterns.
    pub exclude_patterns: Option<Vec<String>>,
    /// Maximum directory recursion depth.
    pub max_depth: Option<usize>,
}

/// `[registry]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RegistrySection {
    /// App code key=value file.
    pub app_codes: Option<String>,
}

/// `[output]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct OutputSection {
    /// Output CSV path, `-` for stdout.
    pub path: Option<String>,
}

/// `[transform]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct TransformSection {
    /// "strict" or "app_only".
    pub required_fields: Option<String>,
    /// "abort" or "skip".
    pub on_invalid_record: Option<String>,
    /// Fold third-party single-issue tags onto vocabulary tags.
    pub consolidate_aliases: Option<bool>,
}

/// `[logging]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub level: Option<String>,
}

/// Validated run configuration derived from `config.toml`.
///
/// Invalid values produce actionable warnings and fall back to defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    // -- Input --
    pub data_dir: PathBuf,
    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
    pub max_depth: usize,

    // -- Registry / output --
    pub app_codes: PathBuf,
    pub output: PathBuf,

    // -- Transform --
    pub required_fields: RequiredFields,
    pub on_invalid_record: OnInvalidRecord,
    pub consolidate_aliases: bool,

    // -- Logging --
    /// Logging level string (for init before tracing is available).
    pub log_level: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(constants::DEFAULT_DATA_DIR),
            include_patterns: constants::DEFAULT_INCLUDE_PATTERNS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            exclude_patterns: constants::DEFAULT_EXCLUDE_PATTERNS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            max_depth: constants::DEFAULT_MAX_DEPTH,
            app_codes: PathBuf::from(constants::DEFAULT_APP_CODES_FILE),
            output: PathBuf::from(constants::DEFAULT_OUTPUT_FILE),
            required_fields: RequiredFields::default(),
            on_invalid_record: OnInvalidRecord::default(),
            consolidate_aliases: false,
            log_level: None,
        }
    }
}

/// Load and validate `config.toml` at `config_path`.
///
/// `explicit` is true when the user named the file with `--config`. An
/// explicit file that is missing, unreadable or unparseable is an error. The
/// implicit platform file falls back to defaults: absent silently, broken with
/// a warning.
///
/// Returns the validated config and a list of non-fatal warnings.
pub fn load_config(
    config_path: &Path,
    explicit: bool,
) -> Result<(AppConfig, Vec<String>), ConfigError> {
    let mut warnings: Vec<String> = Vec::new();

    if !explicit && !config_path.exists() {
        tracing::debug!(path = %config_path.display(), "No config.toml found; using defaults");
        return Ok((AppConfig::default(), warnings));
    }

    let parsed = std::fs::read_to_string(config_path)
        .map_err(|e| ConfigError::Io {
            path: config_path.to_path_buf(),
            source: e,
        })
        .and_then(|content| {
            toml::from_str::<RawConfig>(&content).map_err(|e| ConfigError::TomlParse {
                path: config_path.to_path_buf(),
                source: e,
            })
        });

    let raw = match parsed {
        Ok(raw) => raw,
        Err(e) if explicit => return Err(e),
        Err(e) => {
            let msg = format!("{e}. Using defaults.");
            tracing::warn!("{}", msg);
            warnings.push(msg);
            return Ok((AppConfig::default(), warnings));
        }
    };

    tracing::info!(path = %config_path.display(), "Loaded config.toml");

    let config = validate(raw, &mut warnings);

    if !warnings.is_empty() {
        tracing::warn!(
            count = warnings.len(),
            "Config validation produced warnings"
        );
    }

    Ok((config, warnings))
}

/// Validate each field, accumulating all problems as warnings.
fn validate(raw: RawConfig, warnings: &mut Vec<String>) -> AppConfig {
    let mut config = AppConfig::default();

    // -- Input --
    if let Some(dir) = raw.input.data_dir.filter(|d| !d.is_empty()) {
        config.data_dir = PathBuf::from(dir);
    }
    if let Some(patterns) = raw.input.include_patterns {
        config.include_patterns = patterns;
    }
    if let Some(patterns) = raw.input.exclude_patterns {
        config.exclude_patterns = patterns;
    }
    if let Some(depth) = raw.input.max_depth {
        if (1..=constants::ABSOLUTE_MAX_DEPTH).contains(&depth) {
            config.max_depth = depth;
        } else {
            warnings.push(
                ConfigError::InvalidValue {
                    field: "[input] max_depth",
                    value: depth.to_string(),
                    expected: format!(
                        "1-{}; using default ({})",
                        constants::ABSOLUTE_MAX_DEPTH,
                        constants::DEFAULT_MAX_DEPTH
                    ),
                }
                .to_string(),
            );
        }
    }

    // -- Registry / output --
    if let Some(path) = raw.registry.app_codes.filter(|p| !p.is_empty()) {
        config.app_codes = PathBuf::from(path);
    }
    if let Some(path) = raw.output.path.filter(|p| !p.is_empty()) {
        config.output = PathBuf::from(path);
    }

    // -- Transform --
    if let Some(ref value) = raw.transform.required_fields {
        match RequiredFields::parse(value) {
            Some(policy) => config.required_fields = policy,
            None => warnings.push(
                ConfigError::InvalidValue {
                    field: "[transform] required_fields",
                    value: value.clone(),
                    expected: "\"strict\" or \"app_only\"; using default (strict)".to_string(),
                }
                .to_string(),
            ),
        }
    }
    if let Some(ref value) = raw.transform.on_invalid_record {
        match OnInvalidRecord::parse(value) {
            Some(policy) => config.on_invalid_record = policy,
            None => warnings.push(
                ConfigError::InvalidValue {
                    field: "[transform] on_invalid_record",
                    value: value.clone(),
                    expected: "\"abort\" or \"skip\"; using default (abort)".to_string(),
                }
                .to_string(),
            ),
        }
    }
    if let Some(consolidate) = raw.transform.consolidate_aliases {
        config.consolidate_aliases = consolidate;
    }

    // -- Logging --
    if let Some(ref level) = raw.logging.level {
        if constants::VALID_LOG_LEVELS.contains(&level.to_lowercase().as_str()) {
            config.log_level = Some(level.to_lowercase());
        } else {
            warnings.push(
                ConfigError::InvalidValue {
                    field: "[logging] level",
                    value: level.clone(),
                    expected: format!(
                        "one of {}; using default ({})",
                        constants::VALID_LOG_LEVELS.join(", "),
                        constants::DEFAULT_LOG_LEVEL
                    ),
                }
                .to_string(),
            );
        }
    }

    config
}
