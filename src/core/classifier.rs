// LogNorm - core/classifier.rs
//
// Tag normalisation and per-category status resolution.
//
// Each category is a closed enum with a fallback member. A category resolves
// to the first tag, in the order the tags appear in the raw field, that is a
// member of that category. Vocabulary order plays no part: given
// "never_subscribed|active_subscriber" the result is never_subscribed.

use crate::core::model::{FreeProductStatus, IapProductStatus, SubscriptionStatus, Tag};
use crate::util::constants::TAG_SEPARATOR;

// =============================================================================
// Categories
// =============================================================================

/// One independent status dimension resolved per record.
pub trait Category: Copy + 'static {
    /// Value used when no tag in the record belongs to this category.
    const FALLBACK: Self;

    /// The category member a tag stands for, if the tag belongs here.
    fn from_tag(tag: Tag) -> Option<Self>;
}

impl Category for SubscriptionStatus {
    const FALLBACK: Self = SubscriptionStatus::Unknown;

    fn from_tag(tag: Tag) -> Option<Self> {
        match tag {
            Tag::ActiveSubscriber => Some(SubscriptionStatus::Active),
            Tag::ExpiredSubscriber => Some(SubscriptionStatus::Expired),
            Tag::NeverSubscribed => Some(SubscriptionStatus::NeverSubscribed),
            _ => None,
        }
    }
}

impl Category for FreeProductStatus {
    const FALLBACK: Self = FreeProductStatus::Unknown;

    fn from_tag(tag: Tag) -> Option<Self> {
        match tag {
            Tag::HasDownloadedFreeProduct => Some(FreeProductStatus::Downloaded),
            Tag::NotDownloadedFreeProduct => Some(FreeProductStatus::NotDownloaded),
            _ => None,
        }
    }
}

impl Category for IapProductStatus {
    const FALLBACK: Self = IapProductStatus::Unknown;

    // not_downloaded_free_product is accepted here as well as in the
    // free-product category. Pending confirmation from the owners of the
    // categorisation rules; see DESIGN.md.
    fn from_tag(tag: Tag) -> Option<Self> {
        match tag {
            Tag::HasDownloadedIapProduct => Some(IapProductStatus::Downloaded),
            Tag::NotDownloadedFreeProduct => Some(IapProductStatus::NotDownloadedFreeProduct),
            _ => None,
        }
    }
}

/// Resolve one category over `tags`, first match in source order wins.
pub fn resolve_category<C: Category>(tags: &[Tag]) -> C {
    tags.iter()
        .find_map(|&tag| C::from_tag(tag))
        .unwrap_or(C::FALLBACK)
}

/// The three resolved statuses for one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub subscription: SubscriptionStatus,
    pub free_product: FreeProductStatus,
    pub iap_product: IapProductStatus,
}

/// Resolve every category over the same tag list.
pub fn classify(tags: &[Tag]) -> Classification {
    Classification {
        subscription: resolve_category(tags),
        free_product: resolve_category(tags),
        iap_product: resolve_category(tags),
    }
}

// =============================================================================
// Tag normalisation
// =============================================================================

/// Trim surrounding whitespace and lowercase. No other transformation.
pub fn normalize_tag(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Maps normalised raw tags onto the recognised vocabulary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TagVocabulary {
    /// Also fold third-party single-issue tags onto vocabulary tags.
    pub consolidate_aliases: bool,
}

impl TagVocabulary {
    /// Exact vocabulary only.
    pub fn strict() -> Self {
        Self {
            consolidate_aliases: false,
        }
    }

    /// Vocabulary plus alias consolidation.
    pub fn with_aliases() -> Self {
        Self {
            consolidate_aliases: true,
        }
    }

    /// Recognise a single normalised tag.
    pub fn recognise(&self, normalized: &str) -> Option<Tag> {
        Tag::from_vocabulary(normalized).or_else(|| {
            if self.consolidate_aliases {
                Tag::from_alias(normalized)
            } else {
                None
            }
        })
    }

    /// Split a raw `tags` field and keep the recognised tags in source order.
    ///
    /// An absent or empty field yields no tags. Unrecognised tokens are dropped.
    pub fn parse_tags(&self, raw: Option<&str>) -> Vec<Tag> {
        let Some(raw) = raw else {
            return Vec::new();
        };
        if raw.trim().is_empty() {
            return Vec::new();
        }
        raw.split(TAG_SEPARATOR)
            .filter_map(|token| self.recognise(&normalize_tag(token)))
            .collect()
    }
}
