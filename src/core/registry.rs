// LogNorm - core/registry.rs
//
// App identifier -> app code lookup, loaded once per run from an INI-style
// key=value file.
//
// Loading degrades instead of failing: a missing, unreadable or malformed
// source gives an empty registry, and every lookup then passes the raw
// identifier through unchanged.

use crate::util::error::RegistryError;
use std::collections::HashMap;
use std::path::Path;

/// Immutable mapping from raw app identifier to app code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppCodeRegistry {
    codes: HashMap<String, String>,
}

impl AppCodeRegistry {
    /// Load from `path`. Never fails; problems are logged and yield an empty registry.
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(registry) => {
                tracing::info!(
                    path = %path.display(),
                    entries = registry.len(),
                    "Loaded app code registry"
                );
                registry
            }
            Err(e) => {
                tracing::info!(
                    path = %path.display(),
                    reason = %e,
                    "App code registry unavailable; app identifiers pass through unchanged"
                );
                Self::default()
            }
        }
    }

    /// Load from `path`, reporting why the source could not be used.
    pub fn try_load(path: &Path) -> Result<Self, RegistryError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                RegistryError::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                RegistryError::Io {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;
        Self::parse(&content)
    }

    /// Parse INI-style `key = value` content.
    ///
    /// Blank lines and `;`/`#` comments are skipped, `[section]` headers are
    /// ignored (keys are flattened), values lose one pair of matching quotes
    /// and unquoted values drop a trailing `; comment`.
    /// Any other line without `=` rejects the whole source. Later keys win.
    pub fn parse(content: &str) -> Result<Self, RegistryError> {
        let mut codes = HashMap::new();

        for (idx, raw_line) in content.lines().enumerate() {
            let line_number = idx + 1;
            let line = raw_line.trim();

            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }
            if line.starts_with('[') && line.ends_with(']') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                return Err(RegistryError::MalformedLine {
                    line_number,
                    line: line.to_string(),
                });
            };

            let key = key.trim();
            if key.is_empty() {
                return Err(RegistryError::EmptyKey { line_number });
            }

            codes.insert(key.to_string(), parse_value(value).to_string());
        }

        Ok(Self { codes })
    }

    /// Mapped code for `raw_app_id`, or `raw_app_id` itself when unmapped.
    pub fn lookup<'a>(&'a self, raw_app_id: &'a str) -> &'a str {
        self.codes
            .get(raw_app_id)
            .map(String::as_str)
            .unwrap_or(raw_app_id)
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for AppCodeRegistry
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            codes: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Extract the value part of a `key = value` line.
///
/// A quoted value is taken up to its closing quote, `;` included. An unquoted
/// value ends at the first `;`, which starts an inline comment.
fn parse_value(value: &str) -> &str {
    let value = value.trim();
    for quote in ['"', '\''] {
        if let Some(rest) = value.strip_prefix(quote) {
            if let Some(end) = rest.find(quote) {
                return &rest[..end];
            }
        }
    }
    match value.split_once(';') {
        Some((before, _comment)) => before.trim_end(),
        None => value,
    }
}
