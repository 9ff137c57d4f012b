// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Model catalog: model descriptors and resolved table schemas
//!
//! A catalog is produced once by a [`ModelReader`](crate::ModelReader) and is
//! read-only afterwards. It is shared by the read and write paths of a
//! container for the container's lifetime.

use crate::{FeatureDefn, GeomFieldDefn};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Model descriptor as listed in the transfer header
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub name: String,
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub version: String,
}

impl ModelDescriptor {
    pub fn new(
        name: impl Into<String>,
        uri: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            uri: uri.into(),
            version: version.into(),
        }
    }
}

/// INTERLIS-specific information about one geometry field
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct GeomFieldInfo {
    /// INTERLIS geometry type name (e.g. `COORD`, `POLYLINE`, `SURFACE`)
    pub ili_geom_type: String,
    /// Side table holding the geometry, if the model stores it separately
    #[serde(default)]
    pub geom_table: Option<String>,
}

/// Resolved schema for one table
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct FeatureDefnInfo {
    pub table: FeatureDefn,
    #[serde(default)]
    pub geom_field_infos: BTreeMap<String, GeomFieldInfo>,
}

impl FeatureDefnInfo {
    /// Wrap a table schema without INTERLIS geometry info
    pub fn new(table: FeatureDefn) -> Self {
        Self {
            table,
            geom_field_infos: BTreeMap::new(),
        }
    }

    /// Ad-hoc schema for a table absent from the catalog
    pub fn adhoc(name: impl Into<String>, geom_field: Option<&GeomFieldDefn>) -> Self {
        Self::new(FeatureDefn::adhoc(name, geom_field))
    }

    /// Attach INTERLIS info for a geometry field
    pub fn with_geom_field_info(mut self, field: impl Into<String>, info: GeomFieldInfo) -> Self {
        self.geom_field_infos.insert(field.into(), info);
        self
    }

    /// Table name
    pub fn name(&self) -> &str {
        &self.table.name
    }
}

/// Resolved model metadata for one container
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ModelCatalog {
    /// Model descriptors in declaration order
    #[serde(default)]
    models: Vec<ModelDescriptor>,
    /// Name (and BID) of the basket written by this container
    #[serde(default)]
    main_basket_name: String,
    /// Table name -> resolved schema
    #[serde(default)]
    tables: FxHashMap<String, FeatureDefnInfo>,
}

impl ModelCatalog {
    /// Create an empty catalog with the given main basket name
    pub fn new(main_basket_name: impl Into<String>) -> Self {
        Self {
            models: Vec::new(),
            main_basket_name: main_basket_name.into(),
            tables: FxHashMap::default(),
        }
    }

    /// Add a model descriptor
    pub fn with_model(mut self, model: ModelDescriptor) -> Self {
        self.models.push(model);
        self
    }

    /// Add a table schema, keyed by its name
    pub fn with_table(mut self, info: FeatureDefnInfo) -> Self {
        self.tables.insert(info.table.name.clone(), info);
        self
    }

    /// Model descriptors in declaration order
    pub fn models(&self) -> &[ModelDescriptor] {
        &self.models
    }

    /// Basket element name used for writing
    pub fn main_basket_name(&self) -> &str {
        &self.main_basket_name
    }

    /// Look up the schema of a table
    pub fn feature_defn_info(&self, table: &str) -> Option<&FeatureDefnInfo> {
        self.tables.get(table)
    }

    /// Table names, sorted
    pub fn table_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tables.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of tables
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }
}
