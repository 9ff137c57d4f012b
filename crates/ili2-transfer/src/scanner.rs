// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Basket scanner: a minimal whole-document transfer reader
//!
//! Walks the data section once and groups object elements into layers by
//! element name, in discovery order. Attribute elements holding plain text
//! become field values; attribute elements with nested markup (coordinates,
//! polylines, structures) are kept verbatim as geometry fragments.

use crate::tokenizer::{attribute_value, unescape, XmlEvent, XmlEvents};
use ili2_model::{
    Error, Feature, FeatureDefnInfo, FieldDefn, FieldType, FieldValue, GeomFieldDefn,
    GeometryKind, GeometryType, ModelCatalog, ModelDescriptor, RawGeometry, ReaderFactory,
    Result, ScannedLayer, TransferReader,
};
use memchr::memmem;
use rustc_hash::FxHashMap;
use std::io::{self, Read};

/// Whole-document transfer reader
#[derive(Debug, Default)]
pub struct BasketScanner {
    header_models: Vec<ModelDescriptor>,
}

impl BasketScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan transfer content into layers
    pub fn scan(&mut self, content: &str, catalog: Option<&ModelCatalog>) -> Result<Vec<ScannedLayer>> {
        self.header_models = parse_header_models(content)?;

        let data_start = memmem::find(content.as_bytes(), b"<DATASECTION")
            .ok_or_else(|| Error::invalid_transfer("missing DATASECTION element"))?;

        let mut events = XmlEvents::at(content, data_start);
        match events.next() {
            Some(Ok(XmlEvent::Start {
                name: "DATASECTION",
                empty,
                ..
            })) => {
                if empty {
                    return Ok(Vec::new());
                }
            }
            Some(Err(e)) => return Err(Error::InvalidTransfer(e)),
            _ => return Err(Error::invalid_transfer("malformed DATASECTION element")),
        }

        let mut builder = LayerBuilder::new(catalog);
        // Open elements below DATASECTION: basket, object, attribute, nested
        let mut depth = 0usize;
        let mut object: Option<(&str, Feature)> = None;
        let mut attr: Option<PendingAttribute<'_>> = None;

        for event in events {
            match event.map_err(Error::InvalidTransfer)? {
                XmlEvent::Start {
                    name,
                    attributes,
                    empty,
                    span,
                } => {
                    match depth {
                        0 => {
                            log::debug!(
                                "Scanning basket {} ({})",
                                name,
                                attribute_value(&attributes, "BID").unwrap_or_default()
                            );
                        }
                        1 => {
                            let mut feature = Feature::new();
                            feature.fid = attribute_value(&attributes, "TID").map(|t| t.into_owned());
                            object = Some((name, feature));
                        }
                        2 => {
                            attr = Some(PendingAttribute {
                                name,
                                content_start: span.1,
                                nested: false,
                                text: String::new(),
                                reference: attribute_value(&attributes, "REF")
                                    .map(|r| r.into_owned()),
                            });
                        }
                        _ => {
                            if let Some(pending) = attr.as_mut() {
                                pending.nested = true;
                            }
                        }
                    }

                    if empty {
                        close_level(depth, span.1, content, &mut object, &mut attr, &mut builder);
                    } else {
                        depth += 1;
                    }
                }
                XmlEvent::End { span, .. } => {
                    if depth == 0 {
                        // </DATASECTION>
                        break;
                    }
                    depth -= 1;
                    close_level(depth, span.0, content, &mut object, &mut attr, &mut builder);
                }
                XmlEvent::Text { text, cdata, .. } => {
                    if depth == 3 {
                        if let Some(pending) = attr.as_mut().filter(|a| !a.nested) {
                            if cdata {
                                pending.text.push_str(text);
                            } else {
                                pending.text.push_str(&unescape(text));
                            }
                        }
                    }
                }
            }
        }

        if depth != 0 {
            return Err(Error::invalid_transfer("unterminated DATASECTION"));
        }

        Ok(builder.finish())
    }
}

impl TransferReader for BasketScanner {
    fn read_layers(
        &mut self,
        source: &mut dyn Read,
        catalog: Option<&ModelCatalog>,
    ) -> Result<Vec<ScannedLayer>> {
        let mut content = String::new();
        source.read_to_string(&mut content).map_err(|e| match e.kind() {
            io::ErrorKind::InvalidData => Error::invalid_transfer("transfer is not valid UTF-8"),
            _ => Error::Io(e),
        })?;
        self.scan(&content, catalog)
    }

    fn header_models(&self) -> &[ModelDescriptor] {
        &self.header_models
    }
}

/// Creates [`BasketScanner`] readers
#[derive(Clone, Copy, Debug, Default)]
pub struct ScannerFactory;

impl ReaderFactory for ScannerFactory {
    fn create_reader(&self) -> Option<Box<dyn TransferReader>> {
        Some(Box::new(BasketScanner::new()))
    }
}

/// Attribute element being read
struct PendingAttribute<'a> {
    name: &'a str,
    content_start: usize,
    nested: bool,
    text: String,
    reference: Option<String>,
}

/// Finish the element that was open at `level`
fn close_level<'a>(
    level: usize,
    content_end: usize,
    content: &'a str,
    object: &mut Option<(&'a str, Feature)>,
    attr: &mut Option<PendingAttribute<'a>>,
    builder: &mut LayerBuilder<'_>,
) {
    match level {
        1 => {
            if let Some((table, feature)) = object.take() {
                builder.push(table, feature);
            }
        }
        2 => {
            let (Some(pending), Some((table, feature))) = (attr.take(), object.as_mut()) else {
                return;
            };
            let table: &str = table;
            if pending.nested {
                let raw = content[pending.content_start..content_end].trim();
                builder.note_geometry(table, pending.name);
                feature.set_geometry(pending.name, RawGeometry(raw.to_string()));
            } else if let Some(reference) = pending.reference {
                builder.note_field(table, pending.name);
                feature.set_field(pending.name, FieldValue::String(reference));
            } else {
                let value = builder.convert(table, pending.name, pending.text.trim());
                builder.note_field(table, pending.name);
                feature.set_field(pending.name, value);
            }
        }
        _ => {}
    }
}

/// Layer under construction
struct PendingLayer {
    schema: FeatureDefnInfo,
    from_catalog: bool,
    features: Vec<Feature>,
}

/// Collects features into layers in discovery order
struct LayerBuilder<'c> {
    catalog: Option<&'c ModelCatalog>,
    layers: Vec<PendingLayer>,
    index: FxHashMap<String, usize>,
}

impl<'c> LayerBuilder<'c> {
    fn new(catalog: Option<&'c ModelCatalog>) -> Self {
        Self {
            catalog,
            layers: Vec::new(),
            index: FxHashMap::default(),
        }
    }

    fn layer_mut(&mut self, table: &str) -> &mut PendingLayer {
        let idx = match self.index.get(table) {
            Some(&idx) => idx,
            None => {
                let catalog_schema = self
                    .catalog
                    .and_then(|catalog| catalog.feature_defn_info(table))
                    .cloned();
                let from_catalog = catalog_schema.is_some();
                if !from_catalog && self.catalog.is_some() {
                    log::debug!("Table {} not found in model, collecting schema from data", table);
                }
                self.layers.push(PendingLayer {
                    schema: catalog_schema.unwrap_or_else(|| FeatureDefnInfo::adhoc(table, None)),
                    from_catalog,
                    features: Vec::new(),
                });
                let idx = self.layers.len() - 1;
                self.index.insert(table.to_string(), idx);
                idx
            }
        };
        &mut self.layers[idx]
    }

    fn push(&mut self, table: &str, feature: Feature) {
        self.layer_mut(table).features.push(feature);
    }

    /// Record an attribute field for a table whose schema comes from data
    fn note_field(&mut self, table: &str, field: &str) {
        let layer = self.layer_mut(table);
        if layer.from_catalog || layer.schema.table.field(field).is_some() {
            return;
        }
        layer
            .schema
            .table
            .fields
            .push(FieldDefn::new(field, FieldType::String));
    }

    /// Record a geometry field for a table whose schema comes from data
    fn note_geometry(&mut self, table: &str, field: &str) {
        let layer = self.layer_mut(table);
        if layer.from_catalog || layer.schema.table.geom_field(field).is_some() {
            return;
        }
        layer.schema.table.geom_fields.push(GeomFieldDefn::new(
            field,
            GeometryType::new(GeometryKind::Unknown),
        ));
    }

    /// Type a text value according to the catalog
    fn convert(&self, table: &str, field: &str, text: &str) -> FieldValue {
        if text.is_empty() {
            return FieldValue::Null;
        }
        let field_type = self
            .catalog
            .and_then(|catalog| catalog.feature_defn_info(table))
            .and_then(|info| info.table.field(field))
            .map(|f| f.field_type)
            .unwrap_or_default();

        match field_type {
            FieldType::Integer => lexical_core::parse::<i64>(text.as_bytes())
                .map(FieldValue::Integer)
                .unwrap_or_else(|_| FieldValue::String(text.to_string())),
            FieldType::Real => lexical_core::parse::<f64>(text.as_bytes())
                .map(FieldValue::Real)
                .unwrap_or_else(|_| FieldValue::String(text.to_string())),
            FieldType::Boolean => match text {
                "true" => FieldValue::Boolean(true),
                "false" => FieldValue::Boolean(false),
                _ => FieldValue::String(text.to_string()),
            },
            _ => FieldValue::String(text.to_string()),
        }
    }

    fn finish(self) -> Vec<ScannedLayer> {
        self.layers
            .into_iter()
            .map(|pending| {
                let mut layer = ScannedLayer::new(pending.schema);
                for feature in pending.features {
                    layer.push_feature(feature);
                }
                layer
            })
            .collect()
    }
}

/// Parse the `MODELS` block of the header section
pub fn parse_header_models(content: &str) -> Result<Vec<ModelDescriptor>> {
    let bytes = content.as_bytes();
    let Some(start) = memmem::find(bytes, b"<HEADERSECTION") else {
        return Ok(Vec::new());
    };
    let end = memmem::find(&bytes[start..], b"</HEADERSECTION>")
        .map(|offset| start + offset)
        .unwrap_or(content.len());

    let mut models = Vec::new();
    for event in XmlEvents::new(&content[start..end]) {
        if let XmlEvent::Start {
            name: "MODEL",
            attributes,
            ..
        } = event.map_err(Error::InvalidTransfer)?
        {
            models.push(ModelDescriptor::new(
                attribute_value(&attributes, "NAME").unwrap_or_default(),
                attribute_value(&attributes, "URI").unwrap_or_default(),
                attribute_value(&attributes, "VERSION").unwrap_or_default(),
            ));
        }
    }
    Ok(models)
}
