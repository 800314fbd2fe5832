//! GeoJSON-shaped import and export of the entity collection.
//!
//! Export writes a standard `FeatureCollection` document from the live
//! features; import validates the same shape and hands the features to the
//! engine, which replaces the layer's feature set wholesale.

#[cfg(test)]
#[path = "io_test.rs"]
mod io_test;

use serde::{Deserialize, Serialize};

use crate::layer::EntityFeature;

const COLLECTION_TYPE: &str = "FeatureCollection";

/// Error returned by the import/export functions.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// The document was not valid JSON for this shape.
    #[error("failed to parse feature collection: {0}")]
    Parse(#[from] serde_json::Error),
    /// The document parsed but its `type` is not `FeatureCollection`.
    #[error("expected a FeatureCollection document, got {0:?}")]
    NotACollection(String),
}

/// A GeoJSON feature collection of entity features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    /// `"FeatureCollection"` on valid documents.
    #[serde(rename = "type")]
    pub collection_type: String,
    /// The features themselves.
    pub features: Vec<EntityFeature>,
}

impl FeatureCollection {
    /// Wrap features in a collection envelope.
    #[must_use]
    pub fn new(features: Vec<EntityFeature>) -> Self {
        Self { collection_type: COLLECTION_TYPE.to_string(), features }
    }
}

/// Serialize features as a GeoJSON document.
///
/// # Errors
///
/// [`ImportError::Parse`] when serialization fails (it should not for these
/// types; the `Result` is kept for the caller's error chain).
pub fn to_geojson(features: &[EntityFeature]) -> Result<String, ImportError> {
    Ok(serde_json::to_string(&FeatureCollection::new(features.to_vec()))?)
}

/// Parse and validate an imported document. The `eid` of every feature is
/// forced back to its `id` on the way in, so the rule join key always
/// matches regardless of what the document carried.
///
/// # Errors
///
/// [`ImportError::Parse`] on malformed JSON or a non-point geometry,
/// [`ImportError::NotACollection`] when the document's `type` is wrong.
pub fn from_geojson(raw: &str) -> Result<Vec<EntityFeature>, ImportError> {
    let collection: FeatureCollection = serde_json::from_str(raw)?;
    if collection.collection_type != COLLECTION_TYPE {
        return Err(ImportError::NotACollection(collection.collection_type));
    }
    let mut features = collection.features;
    for feature in &mut features {
        feature.eid = feature.id.clone();
    }
    Ok(features)
}
