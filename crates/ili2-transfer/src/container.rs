// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Transfer container: one opened or created transfer file
//!
//! A container is either read-only, with every layer materialized by a full
//! scan at open time, or write-only, with an output stream positioned inside
//! the open basket. Write containers append layers on demand and route
//! features to the encoder. Closing writes the footer exactly once.

use crate::capability;
use crate::registry::{LayerRecord, LayerRegistry, WriteLayer};
use crate::writer::TransferWriter;
use ili2_model::{
    Error, Feature, FeatureDefnInfo, FeatureEncoder, GeomFieldDefn, ModelCatalog,
    ModelDescriptor, Result, ScannedLayer, TransferReader,
};
use std::sync::Arc;

/// Access mode of a container
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Read,
    Write,
}

/// Identity of a container: where it lives and how it was opened
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContainerHandle {
    /// Address as passed to open or create
    pub address: String,
    /// Data file read from, or destination written to
    pub data_path: String,
    /// Model file, if any
    pub model_path: Option<String>,
    pub mode: Mode,
}

/// An opened INTERLIS 2 transfer
pub struct TransferContainer {
    handle: ContainerHandle,
    catalog: Option<ModelCatalog>,
    header_models: Vec<ModelDescriptor>,
    reader: Option<Box<dyn TransferReader>>,
    writer: Option<TransferWriter>,
    encoder: Option<Arc<dyn FeatureEncoder>>,
    registry: LayerRegistry,
    closed: bool,
}

impl TransferContainer {
    /// Read container over fully scanned layers
    pub(crate) fn for_read(
        handle: ContainerHandle,
        catalog: Option<ModelCatalog>,
        reader: Box<dyn TransferReader>,
        layers: Vec<ScannedLayer>,
    ) -> Self {
        let header_models = reader.header_models().to_vec();
        Self {
            handle,
            catalog,
            header_models,
            reader: Some(reader),
            writer: None,
            encoder: None,
            registry: LayerRegistry::from_scanned(layers),
            closed: false,
        }
    }

    /// Write container; `writer` must already have written the header
    pub(crate) fn for_write(
        handle: ContainerHandle,
        catalog: ModelCatalog,
        writer: TransferWriter,
        encoder: Arc<dyn FeatureEncoder>,
    ) -> Self {
        Self {
            handle,
            catalog: Some(catalog),
            header_models: Vec::new(),
            reader: None,
            writer: Some(writer),
            encoder: Some(encoder),
            registry: LayerRegistry::new(),
            closed: false,
        }
    }

    /// Container name: the data file read from, or the resolved destination
    pub fn name(&self) -> &str {
        &self.handle.data_path
    }

    pub fn handle(&self) -> &ContainerHandle {
        &self.handle
    }

    pub fn mode(&self) -> Mode {
        self.handle.mode
    }

    /// Model catalog, if a model file was given
    pub fn catalog(&self) -> Option<&ModelCatalog> {
        self.catalog.as_ref()
    }

    /// Model descriptors found in the transfer header (read mode)
    pub fn header_models(&self) -> &[ModelDescriptor] {
        &self.header_models
    }

    /// Models of this transfer
    ///
    /// The catalog's models when a model file was given, otherwise those
    /// listed in the transfer header.
    pub fn models(&self) -> &[ModelDescriptor] {
        match &self.catalog {
            Some(catalog) if !catalog.models().is_empty() => catalog.models(),
            _ => &self.header_models,
        }
    }

    /// Whether layers and features can still be written
    pub fn is_writable(&self) -> bool {
        self.writer.as_ref().is_some_and(TransferWriter::is_open)
    }

    /// Create a write layer and return its index
    ///
    /// The schema comes from the catalog. A table the catalog does not know
    /// gets an ad-hoc schema holding only the requested geometry field.
    /// Creation options are accepted and ignored. Returns `None` when the
    /// container is not open for writing.
    pub fn create_layer(
        &mut self,
        name: &str,
        geom_field: Option<&GeomFieldDefn>,
        _options: &[(&str, &str)],
    ) -> Option<usize> {
        if !self.is_writable() {
            return None;
        }

        let known = self
            .catalog
            .as_ref()
            .and_then(|catalog| catalog.feature_defn_info(name))
            .cloned();
        let (schema, adhoc) = match known {
            Some(info) => (info, false),
            None => {
                log::warn!("Table {} not found in model, creating ad-hoc layer", name);
                (FeatureDefnInfo::adhoc(name, geom_field), true)
            }
        };

        if self.registry.position(name).is_some() {
            log::warn!("Layer {} already exists, creating another one", name);
        }

        let index = self
            .registry
            .push(LayerRecord::Write(WriteLayer::new(schema, adhoc)));
        log::debug!("Created layer {} at index {}", name, index);
        Some(index)
    }

    /// Test a capability by name
    pub fn test_capability(&self, name: &str) -> bool {
        capability::test_capability(name)
    }

    pub fn layer_count(&self) -> usize {
        self.registry.len()
    }

    /// Layer at `index`, `None` when out of range
    pub fn layer(&self, index: usize) -> Option<&LayerRecord> {
        self.registry.get(index)
    }

    pub fn layer_mut(&mut self, index: usize) -> Option<&mut LayerRecord> {
        self.registry.get_mut(index)
    }

    /// First layer named `name`
    pub fn layer_by_name(&self, name: &str) -> Option<&LayerRecord> {
        self.registry.by_name(name)
    }

    /// Layers in creation or discovery order
    pub fn layers(&self) -> impl Iterator<Item = &LayerRecord> {
        self.registry.iter()
    }

    /// Rewind every read layer
    pub fn reset_reading(&mut self) {
        self.registry.iter_mut().for_each(LayerRecord::reset_reading);
    }

    /// Encode `feature` into the open basket as a member of layer `index`
    ///
    /// Bytes already written are never reverted; a failed feature leaves the
    /// framing intact.
    pub fn write_feature(&mut self, index: usize, feature: &Feature) -> Result<()> {
        let not_writable = || Error::NotWritable(self.handle.data_path.clone());
        let (Some(writer), Some(encoder)) = (self.writer.as_mut(), self.encoder.as_deref()) else {
            return Err(not_writable());
        };
        let Some(LayerRecord::Write(layer)) = self.registry.get_mut(index) else {
            return Err(Error::LayerNotFound(index));
        };
        let out = writer.stream().ok_or_else(not_writable)?;

        encoder.encode(out, layer.schema(), feature)?;
        layer.record_write();
        Ok(())
    }

    /// Write the footer, release the output stream and drop all layers
    pub fn close(mut self) -> Result<()> {
        self.finalize()
    }

    fn finalize(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let finished = match self.writer.as_mut() {
            Some(writer) => writer.finish(),
            None => Ok(()),
        };
        self.registry.clear();
        self.reader = None;
        self.encoder = None;

        if finished.is_ok() {
            log::debug!("Closed {}", self.handle.data_path);
        }
        finished.map_err(Error::from)
    }
}

impl Drop for TransferContainer {
    fn drop(&mut self) {
        if let Err(e) = self.finalize() {
            log::error!("Failed to close {}: {}", self.handle.data_path, e);
        }
    }
}

impl std::fmt::Debug for TransferContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransferContainer")
            .field("handle", &self.handle)
            .field("layers", &self.registry.len())
            .field("closed", &self.closed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{road_catalog, StaticModelReader};
    use crate::vfs::testing::MemoryFs;
    use crate::{Ili2Driver, OpenOptions};
    use ili2_model::{FieldValue, GeometryKind, GeometryType};

    fn driver(fs: &MemoryFs) -> Ili2Driver {
        Ili2Driver::new()
            .with_sender("test")
            .with_file_system(fs.clone())
            .with_model_reader(StaticModelReader::new(road_catalog()))
    }

    #[test]
    fn test_create_layer_from_catalog() {
        let fs = MemoryFs::new();
        let mut container = driver(&fs).create("out.xtf,model.json").unwrap();

        let index = container
            .create_layer("RoadsSimple.RoadsTopic.LandCover", None, &[])
            .unwrap();
        let layer = container.layer(index).unwrap();
        assert!(!layer.as_write().unwrap().is_adhoc());
        assert_eq!(layer.defn().fields.len(), 1);
    }

    #[test]
    fn test_fallback_determinism() {
        let fs = MemoryFs::new();
        let mut container = driver(&fs).create("out.xtf,model.json").unwrap();
        let geom = GeomFieldDefn::new("Shape", GeometryType::new(GeometryKind::LineString));

        let index = container
            .create_layer("Unknown.Table", Some(&geom), &[("IGNORED", "yes")])
            .unwrap();
        let layer = container.layer(index).unwrap();
        assert!(layer.as_write().unwrap().is_adhoc());
        assert!(layer.defn().fields.is_empty());
        assert_eq!(layer.defn().geom_fields, vec![geom]);

        let bare = container.create_layer("Other.Table", None, &[]).unwrap();
        let bare = container.layer(bare).unwrap();
        assert!(bare.defn().geom_fields.is_empty());
        assert_eq!(bare.defn().geometry_type(), GeometryType::NONE);
    }

    #[test]
    fn test_index_stability() {
        let fs = MemoryFs::new();
        let mut container = driver(&fs).create("out.xtf,model.json").unwrap();
        let names = ["A", "B", "RoadsSimple.RoadsTopic.LandCover", "A"];

        let indices: Vec<_> = names
            .iter()
            .map(|name| container.create_layer(name, None, &[]).unwrap())
            .collect();
        assert_eq!(indices, [0, 1, 2, 3]);

        for (i, name) in names.iter().enumerate() {
            assert_eq!(container.layer(i).unwrap().name(), *name);
        }
        assert_eq!(container.layer_count(), 4);
        assert!(container.layer(4).is_none());
        assert_eq!(container.layers().count(), 4);
    }

    #[test]
    fn test_write_feature() {
        let fs = MemoryFs::new();
        let mut container = driver(&fs).create("out.xtf,model.json").unwrap();
        let index = container
            .create_layer("RoadsSimple.RoadsTopic.LandCover", None, &[])
            .unwrap();

        let mut feature = Feature::new().with_fid("16");
        feature.set_field("Type", FieldValue::String("water".into()));
        container.write_feature(index, &feature).unwrap();
        assert_eq!(container.layer(index).unwrap().feature_count(), 1);

        assert!(matches!(
            container.write_feature(7, &feature),
            Err(Error::LayerNotFound(7))
        ));
        container.close().unwrap();

        let content = fs.read("out.xtf").unwrap();
        let object = "<RoadsSimple.RoadsTopic.LandCover TID=\"16\">\n\
<Type>water</Type>\n\
</RoadsSimple.RoadsTopic.LandCover>\n\
</RoadsSimple.RoadsTopic>\n";
        assert!(content.contains(object));
    }

    #[test]
    fn test_read_container_rejects_writes() {
        let fs = MemoryFs::new().with_file("in.xtf", crate::testing::SAMPLE_XTF);
        let mut container = Ili2Driver::new()
            .with_file_system(fs)
            .open("in.xtf", &OpenOptions::new())
            .unwrap()
            .unwrap();

        assert_eq!(container.mode(), Mode::Read);
        assert!(!container.is_writable());
        assert!(container.create_layer("X", None, &[]).is_none());
        assert!(matches!(
            container.write_feature(0, &Feature::new()),
            Err(Error::NotWritable(_))
        ));
    }

    #[test]
    fn test_capabilities() {
        let fs = MemoryFs::new();
        let container = driver(&fs).create("out.xtf,model.json").unwrap();
        assert!(container.test_capability("CreateLayer"));
        assert!(container.test_capability("zgeometries"));
        assert!(!container.test_capability("DeleteFeature"));
    }

    #[test]
    fn test_drop_writes_footer() {
        let fs = MemoryFs::new();
        {
            let mut container = driver(&fs).create("out.xtf,model.json").unwrap();
            container.create_layer("A", None, &[]);
        }
        let content = fs.read("out.xtf").unwrap();
        assert!(content.ends_with("</DATASECTION>\n</TRANSFER>\n"));
        assert_eq!(content.matches("</TRANSFER>").count(), 1);
    }
}
