// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Collaborator traits
//!
//! The container controller only orchestrates. Model parsing, transfer body
//! parsing and feature encoding are supplied through these traits so that
//! different backends can be plugged in.

use crate::{Feature, FeatureDefnInfo, ModelCatalog, ModelDescriptor, Result, ScannedLayer};
use std::io::{Read, Write};

/// Reads a model description file into a catalog
///
/// # Example
///
/// ```ignore
/// use ili2_model::ModelReader;
///
/// let catalog = reader.read_model("models/Bodenbedeckung.json")?;
/// println!("{} tables", catalog.table_count());
/// ```
pub trait ModelReader: Send + Sync {
    /// Load the catalog described by the file at `path`
    fn read_model(&self, path: &str) -> Result<ModelCatalog>;
}

/// Parses a complete transfer body into layers
///
/// Readers perform a whole-document scan: every layer they return is fully
/// materialized and ready to iterate.
pub trait TransferReader: Send {
    /// Scan `source` and return layers in discovery order
    ///
    /// # Arguments
    /// * `source` - The transfer file content
    /// * `catalog` - Resolved model, if a model file was given
    fn read_layers(
        &mut self,
        source: &mut dyn Read,
        catalog: Option<&ModelCatalog>,
    ) -> Result<Vec<ScannedLayer>>;

    /// Model descriptors found in the transfer header during the last scan
    fn header_models(&self) -> &[ModelDescriptor] {
        &[]
    }
}

/// Instantiates transfer readers
///
/// Returning `None` means the reader backend is unavailable in this build;
/// the container treats that as a fatal configuration error.
pub trait ReaderFactory: Send + Sync {
    fn create_reader(&self) -> Option<Box<dyn TransferReader>>;
}

/// Serializes one feature into the open basket
pub trait FeatureEncoder: Send + Sync {
    /// Write `feature`, which belongs to the table described by `schema`
    fn encode(&self, out: &mut dyn Write, schema: &FeatureDefnInfo, feature: &Feature)
        -> Result<()>;
}
