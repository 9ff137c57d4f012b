// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Catalog files: a compiled model stored as JSON

use ili2_model::{Error, ModelCatalog, ModelReader, Result};

/// Loads a [`ModelCatalog`] serialized with serde_json
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonCatalogReader;

impl JsonCatalogReader {
    /// Parse a catalog from JSON text
    pub fn parse(json: &str) -> Result<ModelCatalog> {
        serde_json::from_str(json).map_err(|e| Error::invalid_model(e.to_string()))
    }
}

impl ModelReader for JsonCatalogReader {
    fn read_model(&self, path: &str) -> Result<ModelCatalog> {
        let json = std::fs::read_to_string(path).map_err(|e| Error::open_failed(path, e))?;
        let catalog = Self::parse(&json)?;
        log::debug!(
            "Loaded model catalog {} ({} models, {} tables)",
            path,
            catalog.models().len(),
            catalog.table_count()
        );
        Ok(catalog)
    }
}
