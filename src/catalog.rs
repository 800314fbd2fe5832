//! Palette catalog: the read-only set of placeable markers, organized into
//! named groups (vehicles, people, barriers, incidents).
//!
//! The catalog is built once at startup from a static JSON asset. Items are
//! immutable; the engine only ever reads them.

#[cfg(test)]
#[path = "catalog_test.rs"]
mod catalog_test;

use serde::{Deserialize, Serialize};

/// Error returned by [`Catalog::from_json`].
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The asset was not valid catalog JSON.
    #[error("failed to parse catalog JSON: {0}")]
    Parse(#[from] serde_json::Error),
    /// The asset parsed but contained no groups.
    #[error("catalog has no groups")]
    Empty,
}

/// A single placeable marker in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaletteItem {
    /// Stable catalog id, unique across groups.
    pub id: String,
    /// Display label; also the base for generated feature names.
    pub label: String,
    /// Asset path or URL of the marker image.
    pub icon: String,
    /// Owning group, stamped at load time so a dragged item carries its
    /// provenance through the transfer payload.
    #[serde(default, rename = "groupId", skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
}

/// A named group of catalog items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaletteGroup {
    /// Stable group id.
    pub id: String,
    /// Display label of the group.
    pub label: String,
    /// The group's items, in display order.
    pub items: Vec<PaletteItem>,
}

/// The whole marker catalog. Loaded once, process-wide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    /// All groups, in display order.
    pub groups: Vec<PaletteGroup>,
}

impl Catalog {
    /// Parse a catalog from its JSON asset and stamp each item with its
    /// owning group id.
    ///
    /// # Errors
    ///
    /// [`CatalogError::Parse`] on malformed JSON, [`CatalogError::Empty`]
    /// when no groups are present.
    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        let mut catalog: Self = serde_json::from_str(raw)?;
        if catalog.groups.is_empty() {
            return Err(CatalogError::Empty);
        }
        for group in &mut catalog.groups {
            for item in &mut group.items {
                item.group_id = Some(group.id.clone());
            }
        }
        Ok(catalog)
    }

    /// Look up an item by id across all groups.
    #[must_use]
    pub fn item(&self, id: &str) -> Option<&PaletteItem> {
        self.groups.iter().flat_map(|g| g.items.iter()).find(|i| i.id == id)
    }

    /// Total number of items across all groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.iter().map(|g| g.items.len()).sum()
    }

    /// Returns `true` if no group contains any item.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
