// LogNorm - core/model.rs
//
// Core data model types. Pure data definitions with no I/O.
//
// These types are the shared vocabulary across all layers.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;

// =============================================================================
// Raw record (one input row)
// =============================================================================

/// One row of a third-party log file, keyed by the file's header row.
///
/// Fields missing from a short row are absent rather than empty, so the
/// transformer can tell "not supplied" apart from "supplied as empty".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    fields: HashMap<String, String>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Value of `key`, or `None` when the field is absent.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for RawRecord
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

// =============================================================================
// Tags
// =============================================================================

/// A recognised vocabulary tag.
///
/// Raw tags that do not map onto one of these are ignored by classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    ActiveSubscriber,
    ExpiredSubscriber,
    NeverSubscribed,
    HasDownloadedFreeProduct,
    NotDownloadedFreeProduct,
    HasDownloadedIapProduct,
}

impl Tag {
    /// Returns all variants in vocabulary order.
    pub fn all() -> &'static [Tag] {
        &[
            Tag::ActiveSubscriber,
            Tag::ExpiredSubscriber,
            Tag::NeverSubscribed,
            Tag::HasDownloadedFreeProduct,
            Tag::NotDownloadedFreeProduct,
            Tag::HasDownloadedIapProduct,
        ]
    }

    /// The tag exactly as it appears in (normalised) input.
    pub fn as_str(&self) -> &'static str {
        match self {
            Tag::ActiveSubscriber => "active_subscriber",
            Tag::ExpiredSubscriber => "expired_subscriber",
            Tag::NeverSubscribed => "never_subscribed",
            Tag::HasDownloadedFreeProduct => "has_downloaded_free_product",
            Tag::NotDownloadedFreeProduct => "not_downloaded_free_product",
            Tag::HasDownloadedIapProduct => "has_downloaded_iap_product",
        }
    }

    /// Exact vocabulary lookup. `normalized` must already be trimmed and lowercased.
    pub fn from_vocabulary(normalized: &str) -> Option<Tag> {
        Tag::all().iter().copied().find(|t| t.as_str() == normalized)
    }

    /// Consolidation of third-party single-issue tags onto vocabulary tags.
    pub fn from_alias(normalized: &str) -> Option<Tag> {
        match normalized {
            "downloaded_free_single_issue_while_no_sub"
            | "downloaded_free_single_issue_while_active_sub" => {
                Some(Tag::HasDownloadedFreeProduct)
            }
            "purchased_single_issue_while_no_sub"
            | "purchased_single_issue_while_active_sub"
            | "purchased_single_issue_while_expired_sub" => Some(Tag::HasDownloadedIapProduct),
            _ => None,
        }
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Category statuses
// =============================================================================

/// Resolved `subscription_status` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubscriptionStatus {
    Active,
    Expired,
    NeverSubscribed,
    Unknown,
}

impl SubscriptionStatus {
    pub fn label(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active_subscriber",
            SubscriptionStatus::Expired => "expired_subscriber",
            SubscriptionStatus::NeverSubscribed => "never_subscribed",
            SubscriptionStatus::Unknown => "subscription_unknown",
        }
    }
}

/// Resolved `has_downloaded_free_product_status` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FreeProductStatus {
    Downloaded,
    NotDownloaded,
    Unknown,
}

impl FreeProductStatus {
    pub fn label(&self) -> &'static str {
        match self {
            FreeProductStatus::Downloaded => "has_downloaded_free_product",
            FreeProductStatus::NotDownloaded => "not_downloaded_free_product",
            FreeProductStatus::Unknown => "downloaded_free_product_unknown",
        }
    }
}

/// Resolved `has_downloaded_iap_product_status` column.
///
/// `NotDownloadedFreeProduct` is the free-product tag accepted as an IAP
/// signal; it serialises as `not_downloaded_free_product`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IapProductStatus {
    Downloaded,
    NotDownloadedFreeProduct,
    Unknown,
}

impl IapProductStatus {
    pub fn label(&self) -> &'static str {
        match self {
            IapProductStatus::Downloaded => "has_downloaded_iap_product",
            IapProductStatus::NotDownloadedFreeProduct => "not_downloaded_free_product",
            IapProductStatus::Unknown => "downloaded_iap_product_unknown",
        }
    }
}

macro_rules! impl_display_via_label {
    ($($ty:ty),*) => {
        $(
            impl std::fmt::Display for $ty {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    f.write_str(self.label())
                }
            }
        )*
    };
}

impl_display_via_label!(SubscriptionStatus, FreeProductStatus, IapProductStatus);

// =============================================================================
// Normalised record (one output row)
// =============================================================================

/// A fully resolved output row. Field order matches the output header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRecord {
    /// Run-wide, 1-based, strictly increasing record id.
    pub id: u64,

    /// Mapped app code, or the raw app identifier when unmapped.
    pub app_code: String,

    pub device_id: String,

    /// `true` only when `deviceTokenStatus` was exactly `"1"`.
    pub contactable: bool,

    pub subscription_status: SubscriptionStatus,
    pub free_product_status: FreeProductStatus,
    pub iap_product_status: IapProductStatus,
}

impl NormalizedRecord {
    /// Cells in output-header order.
    pub fn to_row(&self) -> [String; 7] {
        [
            self.id.to_string(),
            self.app_code.clone(),
            self.device_id.clone(),
            u8::from(self.contactable).to_string(),
            self.subscription_status.label().to_string(),
            self.free_product_status.label().to_string(),
            self.iap_product_status.label().to_string(),
        ]
    }
}

// =============================================================================
// Run policies
// =============================================================================

/// Which identifying fields must be present on every raw record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RequiredFields {
    /// `app` and `deviceToken`.
    #[default]
    Strict,
    /// `app` only; an absent `deviceToken` becomes an empty device id.
    AppOnly,
}

impl RequiredFields {
    /// Config-file spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            RequiredFields::Strict => "strict",
            RequiredFields::AppOnly => "app_only",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "strict" => Some(RequiredFields::Strict),
            "app_only" => Some(RequiredFields::AppOnly),
            _ => None,
        }
    }
}

/// What the batch driver does when a record fails to transform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OnInvalidRecord {
    /// Stop the whole run on the first failing record.
    #[default]
    Abort,
    /// Log and drop the record without consuming a record id.
    Skip,
}

impl OnInvalidRecord {
    /// Config-file spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            OnInvalidRecord::Abort => "abort",
            OnInvalidRecord::Skip => "skip",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "abort" => Some(OnInvalidRecord::Abort),
            "skip" => Some(OnInvalidRecord::Skip),
            _ => None,
        }
    }
}

// =============================================================================
// Discovered file
// =============================================================================

/// An input file found during discovery.
#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    pub path: PathBuf,

    /// File size in bytes.
    pub size: u64,

    /// Last-modified time, if the platform reports one.
    pub modified: Option<DateTime<Utc>>,
}

// =============================================================================
// Batch summary
// =============================================================================

/// Outcome of a completed batch run.
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    /// Input files read, in processing order.
    pub files: Vec<PathBuf>,

    /// Rows written to the output (equals the last assigned id).
    pub records: u64,

    /// Rows dropped under the skip policy.
    pub skipped: u64,

    /// Total size of the input files, in bytes.
    pub input_bytes: u64,

    /// Output destination (`-` for stdout).
    pub output: PathBuf,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}
