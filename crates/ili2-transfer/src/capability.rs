// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Container capabilities

use std::fmt;

/// Capabilities a transfer container advertises
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Capability {
    /// Layers can be created
    CreateLayer,
    /// Geometry fields may hold circular arcs
    CurveGeometries,
    /// Geometry fields may carry Z coordinates
    ZGeometries,
}

impl Capability {
    pub const ALL: [Capability; 3] = [
        Capability::CreateLayer,
        Capability::CurveGeometries,
        Capability::ZGeometries,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Capability::CreateLayer => "CreateLayer",
            Capability::CurveGeometries => "CurveGeometries",
            Capability::ZGeometries => "ZGeometries",
        }
    }

    /// Case-insensitive lookup by capability name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|cap| cap.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Test a capability by name; unknown names are unsupported
pub fn test_capability(name: &str) -> bool {
    Capability::from_name(name).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recognized_capabilities() {
        assert!(test_capability("CreateLayer"));
        assert!(test_capability("curvegeometries"));
        assert!(test_capability("ZGEOMETRIES"));
    }

    #[test]
    fn test_unknown_capabilities() {
        assert!(!test_capability("DeleteLayer"));
        assert!(!test_capability("Transactions"));
        assert!(!test_capability(""));
    }

    #[test]
    fn test_names_round_trip() {
        for cap in Capability::ALL {
            assert_eq!(Capability::from_name(cap.name()), Some(cap));
        }
    }
}
