// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Object element encoder

use crate::writer::escape;
use ili2_model::{Feature, FeatureDefnInfo, FeatureEncoder, FieldValue, Result};
use std::io::Write;

/// Writes one object element per feature
///
/// Fields declared by the schema come first, in declaration order, followed
/// by any extra fields the feature carries. Null values are omitted.
/// Geometry fragments are written verbatim.
#[derive(Clone, Copy, Debug, Default)]
pub struct XtfEncoder;

impl FeatureEncoder for XtfEncoder {
    fn encode(&self, out: &mut dyn Write, schema: &FeatureDefnInfo, feature: &Feature) -> Result<()> {
        let table = schema.name();
        match &feature.fid {
            Some(fid) => writeln!(out, "<{table} TID=\"{}\">", escape(fid))?,
            None => writeln!(out, "<{table}>")?,
        }

        let declared = schema.table.fields.iter().map(|f| f.name.as_str());
        let extra = feature
            .fields
            .iter()
            .map(|(name, _)| name.as_str())
            .filter(|name| schema.table.field(name).is_none());
        for name in declared.chain(extra) {
            match feature.field(name) {
                None | Some(FieldValue::Null) => {}
                Some(value) => {
                    writeln!(out, "<{name}>{}</{name}>", escape(&value.to_string()))?
                }
            }
        }

        for (name, geometry) in &feature.geometries {
            writeln!(out, "<{name}>{}</{name}>", geometry.0)?;
        }

        writeln!(out, "</{table}>")?;
        Ok(())
    }
}
