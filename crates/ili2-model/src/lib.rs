// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ili2-model - Schema types and collaborator traits for INTERLIS 2 transfers
//!
//! This crate provides the data model shared by the transfer container and the
//! pluggable backends that parse models, scan transfer bodies and encode
//! features.
//!
//! # Architecture
//!
//! - [`ModelCatalog`] - Model descriptors and per-table schemas
//! - [`FeatureDefnInfo`] - Resolved schema of one table
//! - [`ScannedLayer`] - A fully materialized read layer with a cursor
//! - [`ModelReader`], [`TransferReader`], [`ReaderFactory`], [`FeatureEncoder`] -
//!   Collaborator interfaces
//!
//! # Example
//!
//! ```ignore
//! use ili2_model::{FeatureDefnInfo, GeomFieldDefn, GeometryKind, GeometryType, ModelCatalog};
//!
//! let catalog: ModelCatalog = model_reader.read_model("model.json")?;
//! let schema = catalog
//!     .feature_defn_info("Model.Topic.Table")
//!     .cloned()
//!     .unwrap_or_else(|| FeatureDefnInfo::adhoc("Model.Topic.Table", None));
//! ```

pub mod catalog;
pub mod error;
pub mod layer;
pub mod traits;
pub mod types;

// Re-export all public types
pub use catalog::*;
pub use error::*;
pub use layer::*;
pub use traits::*;
pub use types::*;
