// LogNorm - util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "LogNorm";

/// Application identifier used for the platform config directory.
pub const APP_ID: &str = "LogNorm";

/// Current application version.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Default locations
// =============================================================================

/// Directory scanned for input files when none is given.
pub const DEFAULT_DATA_DIR: &str = "data";

/// App identifier -> app code mapping file.
pub const DEFAULT_APP_CODES_FILE: &str = "appCodes.ini";

/// Consolidated output file. `-` means stdout.
pub const DEFAULT_OUTPUT_FILE: &str = "output.csv";

/// Output path value that selects stdout.
pub const STDOUT_PATH: &str = "-";

// =============================================================================
// Discovery
// =============================================================================

/// Hard upper bound on discovery depth.
pub const ABSOLUTE_MAX_DEPTH: usize = 32;

/// Default recursion depth: the whole data tree, up to the hard bound.
/// 1 would mean files directly inside the data directory only.
pub const DEFAULT_MAX_DEPTH: usize = ABSOLUTE_MAX_DEPTH;

/// Default include glob patterns for input discovery.
pub const DEFAULT_INCLUDE_PATTERNS: &[&str] = &["*.log"];

/// Default exclude glob patterns for input discovery.
pub const DEFAULT_EXCLUDE_PATTERNS: &[&str] = &[];

// =============================================================================
// Record format
// =============================================================================

/// Separator between tags inside the raw `tags` field.
pub const TAG_SEPARATOR: char = '|';

/// Raw `deviceTokenStatus` value meaning the device is contactable.
pub const CONTACTABLE_STATUS: &str = "1";

/// Raw input field names consumed by the transformer.
pub const FIELD_APP: &str = "app";
pub const FIELD_DEVICE_TOKEN: &str = "deviceToken";
pub const FIELD_DEVICE_TOKEN_STATUS: &str = "deviceTokenStatus";
pub const FIELD_TAGS: &str = "tags";

/// Output header, in serialisation order.
pub const OUTPUT_HEADER: [&str; 7] = [
    "id",
    "appCode",
    "deviceId",
    "contactable",
    "subscription_status",
    "has_downloaded_free_product_status",
    "has_downloaded_iap_product_status",
];

// =============================================================================
// Logging
// =============================================================================

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Accepted values for `[logging] level`.
pub const VALID_LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

// =============================================================================
// Configuration
// =============================================================================

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.toml";
