// LogNorm - core/transform.rs
//
// Raw record + record id -> normalised record.
// Pure: no I/O, no state carried between calls. The caller owns the id counter.

use crate::core::classifier::{classify, TagVocabulary};
use crate::core::model::{NormalizedRecord, RawRecord, RequiredFields};
use crate::core::registry::AppCodeRegistry;
use crate::util::constants::{
    CONTACTABLE_STATUS, FIELD_APP, FIELD_DEVICE_TOKEN, FIELD_DEVICE_TOKEN_STATUS, FIELD_TAGS,
};
use crate::util::error::TransformError;

/// Converts raw records using a loaded registry and tag vocabulary.
#[derive(Debug, Clone)]
pub struct RowTransformer {
    registry: AppCodeRegistry,
    vocabulary: TagVocabulary,
    required: RequiredFields,
}

impl RowTransformer {
    pub fn new(
        registry: AppCodeRegistry,
        vocabulary: TagVocabulary,
        required: RequiredFields,
    ) -> Self {
        Self {
            registry,
            vocabulary,
            required,
        }
    }

    /// Transform one raw record into the output shape with `id = record_id`.
    ///
    /// Fails with `MissingRequiredField` when `app` is absent, or when
    /// `deviceToken` is absent under `RequiredFields::Strict`. A field present
    /// with an empty value counts as present.
    pub fn transform(
        &self,
        raw: &RawRecord,
        record_id: u64,
    ) -> Result<NormalizedRecord, TransformError> {
        let app = require(raw, FIELD_APP, record_id)?;
        let device_id = match self.required {
            RequiredFields::Strict => require(raw, FIELD_DEVICE_TOKEN, record_id)?,
            RequiredFields::AppOnly => raw.get(FIELD_DEVICE_TOKEN).unwrap_or_default(),
        };

        let contactable = raw.get(FIELD_DEVICE_TOKEN_STATUS) == Some(CONTACTABLE_STATUS);

        let tags = self.vocabulary.parse_tags(raw.get(FIELD_TAGS));
        let classification = classify(&tags);

        Ok(NormalizedRecord {
            id: record_id,
            app_code: self.registry.lookup(app).to_string(),
            device_id: device_id.to_string(),
            contactable,
            subscription_status: classification.subscription,
            free_product_status: classification.free_product,
            iap_product_status: classification.iap_product,
        })
    }
}

fn require<'a>(
    raw: &'a RawRecord,
    field: &'static str,
    record_id: u64,
) -> Result<&'a str, TransformError> {
    raw.get(field)
        .ok_or(TransformError::MissingRequiredField { record_id, field })
}
