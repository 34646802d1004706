//! Mapping from GraphQL scalar names to JSON Schema kinds

use std::{collections::HashMap, str::FromStr};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The JSON Schema kind a scalar is presented as
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ScalarKind {
    #[default]
    String,
    Number,
    Integer,
    Boolean,
    Object,
}

/// Custom scalar kinds, keyed by scalar name.
///
/// Entries here take precedence over the built-in scalars, so `ID` can be
/// presented as an integer for backends that use numeric identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(transparent)]
pub struct CustomScalarMap(HashMap<String, ScalarKind>);

impl CustomScalarMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, scalar: impl Into<String>, kind: ScalarKind) -> Self {
        self.0.insert(scalar.into(), kind);
        self
    }

    pub fn get(&self, scalar: &str) -> Option<ScalarKind> {
        self.0.get(scalar).copied()
    }

    /// The kind for a scalar, falling back to the built-in mapping and then to string
    pub fn kind_for(&self, scalar: &str) -> ScalarKind {
        self.get(scalar).unwrap_or(match scalar {
            "Int" => ScalarKind::Integer,
            "Float" => ScalarKind::Number,
            "Boolean" => ScalarKind::Boolean,
            _ => ScalarKind::String,
        })
    }
}

impl FromStr for CustomScalarMap {
    type Err = serde_json::Error;

    fn from_str(string_custom_scalar_file: &str) -> Result<Self, Self::Err> {
        serde_json::from_str(string_custom_scalar_file)
    }
}

impl FromIterator<(String, ScalarKind)> for CustomScalarMap {
    fn from_iter<I: IntoIterator<Item = (String, ScalarKind)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("Int", ScalarKind::Integer)]
    #[case("Float", ScalarKind::Number)]
    #[case("Boolean", ScalarKind::Boolean)]
    #[case("String", ScalarKind::String)]
    #[case("ID", ScalarKind::String)]
    #[case("DateTime", ScalarKind::String)]
    fn built_in_and_unmapped_scalars(#[case] scalar: &str, #[case] expected: ScalarKind) {
        assert_eq!(CustomScalarMap::new().kind_for(scalar), expected);
    }

    #[test]
    fn configured_kinds_override_built_ins() {
        let map = CustomScalarMap::new()
            .with("ID", ScalarKind::Integer)
            .with("JSON", ScalarKind::Object);

        assert_eq!(map.kind_for("ID"), ScalarKind::Integer);
        assert_eq!(map.kind_for("JSON"), ScalarKind::Object);
        assert_eq!(map.kind_for("Int"), ScalarKind::Integer);
    }

    #[test]
    fn parses_from_json() {
        let map: CustomScalarMap = r#"{ "Long": "integer", "Decimal": "number" }"#
            .parse()
            .unwrap();

        assert_eq!(map.get("Long"), Some(ScalarKind::Integer));
        assert_eq!(map.get("Decimal"), Some(ScalarKind::Number));
        assert_eq!(map.get("Date"), None);
    }

    #[test]
    fn rejects_unknown_kinds() {
        let result = r#"{ "Long": "bigint" }"#.parse::<CustomScalarMap>();
        assert!(result.unwrap_err().to_string().contains("unknown variant"));
    }
}
