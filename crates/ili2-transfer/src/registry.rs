// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Layer registry
//!
//! One ordered, append-only collection serves both indexed and iterator
//! access. Index positions reflect creation (write) or discovery (read)
//! order and never change.

use ili2_model::{Feature, FeatureDefn, FeatureDefnInfo, ScannedLayer};

/// Write-side layer: schema plus per-layer write statistics
#[derive(Clone, Debug)]
pub struct WriteLayer {
    schema: FeatureDefnInfo,
    adhoc: bool,
    features_written: u64,
}

impl WriteLayer {
    pub fn new(schema: FeatureDefnInfo, adhoc: bool) -> Self {
        Self {
            schema,
            adhoc,
            features_written: 0,
        }
    }

    pub fn schema(&self) -> &FeatureDefnInfo {
        &self.schema
    }

    /// Whether the schema was synthesized because the model lacks the table
    pub fn is_adhoc(&self) -> bool {
        self.adhoc
    }

    pub fn features_written(&self) -> u64 {
        self.features_written
    }

    pub(crate) fn record_write(&mut self) {
        self.features_written += 1;
    }
}

/// A feature layer exposed by a container
#[derive(Clone, Debug)]
pub enum LayerRecord {
    /// Materialized by a full-document scan
    Read(ScannedLayer),
    /// Created for writing
    Write(WriteLayer),
}

impl LayerRecord {
    pub fn name(&self) -> &str {
        self.schema().name()
    }

    /// Resolved or synthesized schema; always present
    pub fn schema(&self) -> &FeatureDefnInfo {
        match self {
            LayerRecord::Read(layer) => layer.schema(),
            LayerRecord::Write(layer) => layer.schema(),
        }
    }

    pub fn defn(&self) -> &FeatureDefn {
        &self.schema().table
    }

    pub fn is_writable(&self) -> bool {
        matches!(self, LayerRecord::Write(_))
    }

    /// Rewind the read cursor; no-op for write layers
    pub fn reset_reading(&mut self) {
        if let LayerRecord::Read(layer) = self {
            layer.reset_reading();
        }
    }

    /// Next feature under the read cursor; write layers yield nothing
    pub fn next_feature(&mut self) -> Option<&Feature> {
        match self {
            LayerRecord::Read(layer) => layer.next_feature(),
            LayerRecord::Write(_) => None,
        }
    }

    /// Features available for reading, or features written so far
    pub fn feature_count(&self) -> u64 {
        match self {
            LayerRecord::Read(layer) => layer.feature_count() as u64,
            LayerRecord::Write(layer) => layer.features_written,
        }
    }

    pub fn as_read(&self) -> Option<&ScannedLayer> {
        match self {
            LayerRecord::Read(layer) => Some(layer),
            LayerRecord::Write(_) => None,
        }
    }

    pub fn as_write(&self) -> Option<&WriteLayer> {
        match self {
            LayerRecord::Write(layer) => Some(layer),
            LayerRecord::Read(_) => None,
        }
    }
}

/// Ordered collection of layers
#[derive(Debug, Default)]
pub struct LayerRegistry {
    layers: Vec<LayerRecord>,
}

impl LayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding scanned layers in discovery order
    pub fn from_scanned(layers: Vec<ScannedLayer>) -> Self {
        Self {
            layers: layers.into_iter().map(LayerRecord::Read).collect(),
        }
    }

    /// Append a layer and return its index
    pub fn push(&mut self, layer: LayerRecord) -> usize {
        self.layers.push(layer);
        self.layers.len() - 1
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Layer at `index`, or `None` when out of range
    pub fn get(&self, index: usize) -> Option<&LayerRecord> {
        self.layers.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut LayerRecord> {
        self.layers.get_mut(index)
    }

    /// Index of the first layer named `name`
    pub fn position(&self, name: &str) -> Option<usize> {
        self.layers.iter().position(|l| l.name() == name)
    }

    /// First layer named `name`
    pub fn by_name(&self, name: &str) -> Option<&LayerRecord> {
        self.position(name).and_then(|i| self.get(i))
    }

    pub fn iter(&self) -> impl Iterator<Item = &LayerRecord> {
        self.layers.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut LayerRecord> {
        self.layers.iter_mut()
    }

    /// Drop every layer
    pub(crate) fn clear(&mut self) {
        self.layers.clear();
    }
}
