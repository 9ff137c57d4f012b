// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Core types for feature schemas and feature records
//!
//! These types describe tables (fields and geometry fields) and the feature
//! records flowing in and out of a transfer container. Geometry values are
//! carried as opaque encoded fragments; no geometry algebra lives here.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Geometry kind of a geometry field
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize, Default)]
pub enum GeometryKind {
    /// No geometry
    #[default]
    None,
    /// Any geometry
    Unknown,
    Point,
    LineString,
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
    CircularString,
    CompoundCurve,
    CurvePolygon,
    MultiCurve,
    MultiSurface,
}

impl GeometryKind {
    /// Name without dimension suffix
    pub fn name(&self) -> &'static str {
        match self {
            GeometryKind::None => "None",
            GeometryKind::Unknown => "Unknown",
            GeometryKind::Point => "Point",
            GeometryKind::LineString => "LineString",
            GeometryKind::Polygon => "Polygon",
            GeometryKind::MultiPoint => "MultiPoint",
            GeometryKind::MultiLineString => "MultiLineString",
            GeometryKind::MultiPolygon => "MultiPolygon",
            GeometryKind::CircularString => "CircularString",
            GeometryKind::CompoundCurve => "CompoundCurve",
            GeometryKind::CurvePolygon => "CurvePolygon",
            GeometryKind::MultiCurve => "MultiCurve",
            GeometryKind::MultiSurface => "MultiSurface",
        }
    }

    /// Whether this kind may contain circular arcs
    pub fn is_curve(&self) -> bool {
        matches!(
            self,
            GeometryKind::CircularString
                | GeometryKind::CompoundCurve
                | GeometryKind::CurvePolygon
                | GeometryKind::MultiCurve
                | GeometryKind::MultiSurface
        )
    }

    const ALL: [GeometryKind; 13] = [
        GeometryKind::None,
        GeometryKind::Unknown,
        GeometryKind::Point,
        GeometryKind::LineString,
        GeometryKind::Polygon,
        GeometryKind::MultiPoint,
        GeometryKind::MultiLineString,
        GeometryKind::MultiPolygon,
        GeometryKind::CircularString,
        GeometryKind::CompoundCurve,
        GeometryKind::CurvePolygon,
        GeometryKind::MultiCurve,
        GeometryKind::MultiSurface,
    ];
}

/// Geometry type of a geometry field: kind plus Z dimension flag
///
/// There is no "undefined" geometry type. A table without geometry uses
/// [`GeometryType::NONE`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize, Default)]
pub struct GeometryType {
    pub kind: GeometryKind,
    #[serde(default)]
    pub has_z: bool,
}

impl GeometryType {
    /// No geometry
    pub const NONE: GeometryType = GeometryType {
        kind: GeometryKind::None,
        has_z: false,
    };

    /// Create a 2D geometry type
    pub const fn new(kind: GeometryKind) -> Self {
        Self { kind, has_z: false }
    }

    /// Return the same kind with a Z dimension
    pub const fn with_z(mut self) -> Self {
        self.has_z = true;
        self
    }

    /// Check for "no geometry"
    pub fn is_none(&self) -> bool {
        self.kind == GeometryKind::None
    }

    /// Whether values of this type may contain circular arcs
    pub fn is_curve(&self) -> bool {
        self.kind.is_curve()
    }
}

impl fmt::Display for GeometryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.has_z && !self.is_none() {
            write!(f, "{}Z", self.kind.name())
        } else {
            f.write_str(self.kind.name())
        }
    }
}

impl FromStr for GeometryType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (base, has_z) = match s.strip_suffix(['Z', 'z']) {
            Some(base) if !base.is_empty() && !base.eq_ignore_ascii_case("none") => (base, true),
            _ => (s, false),
        };

        GeometryKind::ALL
            .iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(base))
            .map(|&kind| GeometryType { kind, has_z })
            .ok_or_else(|| format!("unknown geometry type: {s}"))
    }
}

/// Attribute field type
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize, Default)]
pub enum FieldType {
    #[default]
    String,
    Integer,
    Real,
    Boolean,
    Date,
    DateTime,
    Time,
}

/// Attribute field definition
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct FieldDefn {
    pub name: String,
    #[serde(default)]
    pub field_type: FieldType,
}

impl FieldDefn {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
        }
    }
}

/// Geometry field definition
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct GeomFieldDefn {
    pub name: String,
    pub geometry_type: GeometryType,
}

impl GeomFieldDefn {
    pub fn new(name: impl Into<String>, geometry_type: GeometryType) -> Self {
        Self {
            name: name.into(),
            geometry_type,
        }
    }
}

/// Table schema: attribute fields and geometry fields in declaration order
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct FeatureDefn {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldDefn>,
    #[serde(default)]
    pub geom_fields: Vec<GeomFieldDefn>,
}

impl FeatureDefn {
    /// Create an empty schema
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            geom_fields: Vec::new(),
        }
    }

    /// Synthesize a minimal schema for a table the model does not know
    ///
    /// The result carries no attribute fields and at most one geometry field
    /// of the requested type.
    pub fn adhoc(name: impl Into<String>, geom_field: Option<&GeomFieldDefn>) -> Self {
        let mut defn = Self::new(name);
        if let Some(geom) = geom_field.filter(|g| !g.geometry_type.is_none()) {
            defn.geom_fields.push(geom.clone());
        }
        defn
    }

    /// Add an attribute field
    pub fn with_field(mut self, field: FieldDefn) -> Self {
        self.fields.push(field);
        self
    }

    /// Add a geometry field
    pub fn with_geom_field(mut self, field: GeomFieldDefn) -> Self {
        self.geom_fields.push(field);
        self
    }

    /// Look up an attribute field by name
    pub fn field(&self, name: &str) -> Option<&FieldDefn> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Look up a geometry field by name
    pub fn geom_field(&self, name: &str) -> Option<&GeomFieldDefn> {
        self.geom_fields.iter().find(|f| f.name == name)
    }

    /// Geometry type of the first geometry field, or `NONE`
    pub fn geometry_type(&self) -> GeometryType {
        self.geom_fields
            .first()
            .map(|g| g.geometry_type)
            .unwrap_or(GeometryType::NONE)
    }
}

/// Attribute value of a feature
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub enum FieldValue {
    #[default]
    Null,
    String(String),
    Integer(i64),
    Real(f64),
    Boolean(bool),
}

impl FieldValue {
    /// Try to get as string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as integer
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get as float (integers are widened)
    pub fn as_real(&self) -> Option<f64> {
        match self {
            FieldValue::Real(f) => Some(*f),
            FieldValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Check if this is a null value
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => Ok(()),
            FieldValue::String(s) => f.write_str(s),
            FieldValue::Integer(i) => write!(f, "{i}"),
            FieldValue::Real(r) => write!(f, "{r}"),
            FieldValue::Boolean(b) => f.write_str(if *b { "true" } else { "false" }),
        }
    }
}

/// Encoded geometry fragment, kept verbatim
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawGeometry(pub String);

/// One feature record
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Feature {
    /// Transfer identifier (TID)
    pub fid: Option<String>,
    /// Attribute values in encounter order
    pub fields: Vec<(String, FieldValue)>,
    /// Geometry values in encounter order
    pub geometries: Vec<(String, RawGeometry)>,
}

impl Feature {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the transfer identifier
    pub fn with_fid(mut self, fid: impl Into<String>) -> Self {
        self.fid = Some(fid.into());
        self
    }

    /// Set an attribute value, replacing an existing one of the same name
    pub fn set_field(&mut self, name: impl Into<String>, value: FieldValue) {
        let name = name.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Set a geometry value, replacing an existing one of the same name
    pub fn set_geometry(&mut self, name: impl Into<String>, geometry: RawGeometry) {
        let name = name.into();
        match self.geometries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = geometry,
            None => self.geometries.push((name, geometry)),
        }
    }

    /// Get attribute value by name
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Get geometry value by name
    pub fn geometry(&self, name: &str) -> Option<&RawGeometry> {
        self.geometries.iter().find(|(n, _)| n == name).map(|(_, g)| g)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometry_type_display_and_parse() {
        let t = GeometryType::new(GeometryKind::CompoundCurve).with_z();
        assert_eq!(t.to_string(), "CompoundCurveZ");
        assert_eq!("CompoundCurveZ".parse::<GeometryType>().unwrap(), t);
        assert_eq!("polygon".parse::<GeometryType>().unwrap().kind, GeometryKind::Polygon);
        assert_eq!("None".parse::<GeometryType>().unwrap(), GeometryType::NONE);
        assert!("Blob".parse::<GeometryType>().is_err());
    }

    #[test]
    fn test_curve_kinds() {
        assert!(GeometryType::new(GeometryKind::MultiSurface).is_curve());
        assert!(!GeometryType::new(GeometryKind::Polygon).is_curve());
    }

    #[test]
    fn test_adhoc_schema_has_only_geometry() {
        let geom = GeomFieldDefn::new("Geometrie", GeometryType::new(GeometryKind::Point));
        let defn = FeatureDefn::adhoc("Unknown.Table", Some(&geom));
        assert!(defn.fields.is_empty());
        assert_eq!(defn.geom_fields.len(), 1);
        assert_eq!(defn.geometry_type().kind, GeometryKind::Point);

        let bare = FeatureDefn::adhoc("Bare", None);
        assert!(bare.geom_fields.is_empty());
        assert_eq!(bare.geometry_type(), GeometryType::NONE);
    }

    #[test]
    fn test_adhoc_schema_skips_none_geometry() {
        let geom = GeomFieldDefn::new("Geometrie", GeometryType::NONE);
        let defn = FeatureDefn::adhoc("T", Some(&geom));
        assert!(defn.geom_fields.is_empty());
    }

    #[test]
    fn test_feature_set_field_replaces() {
        let mut feature = Feature::new().with_fid("1");
        feature.set_field("Name", FieldValue::String("a".into()));
        feature.set_field("Name", FieldValue::String("b".into()));
        assert_eq!(feature.fields.len(), 1);
        assert_eq!(feature.field("Name").and_then(|v| v.as_str()), Some("b"));
    }

    #[test]
    fn test_field_value_display() {
        assert_eq!(FieldValue::Integer(42).to_string(), "42");
        assert_eq!(FieldValue::Boolean(true).to_string(), "true");
        assert_eq!(FieldValue::Null.to_string(), "");
    }
}
