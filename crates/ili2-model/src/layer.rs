// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Materialized read layers

use crate::{Feature, FeatureDefn, FeatureDefnInfo};

/// A layer produced by a full-document scan
///
/// All features are held in memory. Iteration goes through a cursor which
/// [`reset_reading`](Self::reset_reading) moves back to the first record.
#[derive(Clone, Debug)]
pub struct ScannedLayer {
    schema: FeatureDefnInfo,
    features: Vec<Feature>,
    cursor: usize,
}

impl ScannedLayer {
    /// Create an empty layer bound to `schema`
    pub fn new(schema: FeatureDefnInfo) -> Self {
        Self {
            schema,
            features: Vec::new(),
            cursor: 0,
        }
    }

    /// Layer name
    pub fn name(&self) -> &str {
        self.schema.name()
    }

    pub fn schema(&self) -> &FeatureDefnInfo {
        &self.schema
    }

    pub fn defn(&self) -> &FeatureDefn {
        &self.schema.table
    }

    /// Append a feature (scan time only)
    pub fn push_feature(&mut self, feature: Feature) {
        self.features.push(feature);
    }

    /// Rewind the read cursor
    pub fn reset_reading(&mut self) {
        self.cursor = 0;
    }

    /// Current cursor position
    pub fn position(&self) -> usize {
        self.cursor
    }

    /// Return the feature under the cursor and advance
    pub fn next_feature(&mut self) -> Option<&Feature> {
        let feature = self.features.get(self.cursor)?;
        self.cursor += 1;
        Some(feature)
    }

    /// Number of features in the layer
    pub fn feature_count(&self) -> usize {
        self.features.len()
    }

    /// Find a feature by transfer identifier
    pub fn get_feature(&self, fid: &str) -> Option<&Feature> {
        self.features
            .iter()
            .find(|f| f.fid.as_deref() == Some(fid))
    }

    /// All features in scan order
    pub fn features(&self) -> &[Feature] {
        &self.features
    }
}
