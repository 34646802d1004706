//! JSON Schema generation utilities
//!
//! Tool parameters are described by a flat object schema. A
//! [`ParameterSchemaBuilder`] is appended to while an operation is walked and
//! frozen into a [`ParameterSchema`] once the walk is done.

use serde::{
    Serialize, Serializer,
    ser::{SerializeMap, SerializeStruct},
};
use serde_json::Value;

use crate::custom_scalar_map::ScalarKind;

pub(crate) mod type_mapper;

pub use type_mapper::{TypeMapper, unwrap_non_null};

/// The shape of a single parameter value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Shape {
    String {
        #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
        values: Option<Vec<String>>,
    },
    Number,
    Integer,
    Boolean,
    Object,
    Array {
        items: Box<TypeDescriptor>,
    },
}

/// Schema of a single parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeDescriptor {
    #[serde(flatten)]
    pub shape: Shape,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TypeDescriptor {
    pub fn new(shape: Shape) -> Self {
        Self {
            shape,
            description: None,
        }
    }

    pub fn scalar(kind: ScalarKind) -> Self {
        Self::new(match kind {
            ScalarKind::String => Shape::String { values: None },
            ScalarKind::Number => Shape::Number,
            ScalarKind::Integer => Shape::Integer,
            ScalarKind::Boolean => Shape::Boolean,
            ScalarKind::Object => Shape::Object,
        })
    }

    pub fn enumeration(values: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::new(Shape::String {
            values: Some(values.into_iter().map(Into::into).collect()),
        })
    }

    pub fn array(items: TypeDescriptor) -> Self {
        Self::new(Shape::Array {
            items: Box::new(items),
        })
    }

    /// Attach a description, keeping any description already present
    pub fn with_description(mut self, description: Option<String>) -> Self {
        if self.description.is_none() {
            self.description = description;
        }
        self
    }
}

/// Properties in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Properties(Vec<(String, TypeDescriptor)>);

impl Serialize for Properties {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, descriptor) in &self.0 {
            map.serialize_entry(name, descriptor)?;
        }
        map.end()
    }
}

/// The object schema describing all parameters of a tool
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterSchema {
    properties: Properties,
    required: Vec<String>,
}

impl ParameterSchema {
    pub fn properties(&self) -> impl Iterator<Item = (&str, &TypeDescriptor)> {
        self.properties
            .0
            .iter()
            .map(|(name, descriptor)| (name.as_str(), descriptor))
    }

    pub fn property(&self, name: &str) -> Option<&TypeDescriptor> {
        self.properties().find(|(n, _)| *n == name).map(|(_, d)| d)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.property(name).is_some()
    }

    pub fn required(&self) -> &[String] {
        &self.required
    }

    pub fn len(&self) -> usize {
        self.properties.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.0.is_empty()
    }

    /// A copy of this schema without the parameters matching `hidden`
    pub fn without(&self, hidden: impl Fn(&str) -> bool) -> ParameterSchema {
        ParameterSchema {
            properties: Properties(
                self.properties
                    .0
                    .iter()
                    .filter(|(name, _)| !hidden(name))
                    .cloned()
                    .collect(),
            ),
            required: self
                .required
                .iter()
                .filter(|name| !hidden(name))
                .cloned()
                .collect(),
        }
    }

    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

impl Serialize for ParameterSchema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut schema = serializer.serialize_struct("ParameterSchema", 3)?;
        schema.serialize_field("type", "object")?;
        schema.serialize_field("properties", &self.properties)?;
        schema.serialize_field("required", &self.required)?;
        schema.end()
    }
}

/// Append-only builder for a [`ParameterSchema`]
#[derive(Debug, Default)]
pub struct ParameterSchemaBuilder {
    schema: ParameterSchema,
}

impl ParameterSchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter. A name that is already present is overwritten in place.
    pub fn insert(&mut self, name: impl Into<String>, descriptor: TypeDescriptor, required: bool) {
        let name = name.into();
        let properties = &mut self.schema.properties.0;
        match properties.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, existing)) => *existing = descriptor,
            None => properties.push((name.clone(), descriptor)),
        }

        self.schema.required.retain(|existing| *existing != name);
        if required {
            self.schema.required.push(name);
        }
    }

    pub fn len(&self) -> usize {
        self.schema.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schema.is_empty()
    }

    pub fn build(self) -> ParameterSchema {
        self.schema
    }
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;

    use super::*;

    #[test]
    fn serializes_in_insertion_order() {
        let mut builder = ParameterSchemaBuilder::new();
        builder.insert(
            "zip",
            TypeDescriptor::scalar(ScalarKind::String).with_description(Some("Postal code".into())),
            true,
        );
        builder.insert(
            "days",
            TypeDescriptor::array(TypeDescriptor::scalar(ScalarKind::Integer)),
            false,
        );
        builder.insert("unit", TypeDescriptor::enumeration(["C", "F"]), false);

        let schema = builder.build();

        assert_snapshot!(
            serde_json::to_string(&schema).unwrap(),
            @r#"{"type":"object","properties":{"zip":{"type":"string","description":"Postal code"},"days":{"type":"array","items":{"type":"integer"}},"unit":{"type":"string","enum":["C","F"]}},"required":["zip"]}"#
        );
    }

    #[test]
    fn later_inserts_win() {
        let mut builder = ParameterSchemaBuilder::new();
        builder.insert("id", TypeDescriptor::scalar(ScalarKind::String), true);
        builder.insert("first", TypeDescriptor::scalar(ScalarKind::Integer), false);
        builder.insert("id", TypeDescriptor::scalar(ScalarKind::Integer), false);

        let schema = builder.build();

        assert_eq!(schema.len(), 2);
        assert_eq!(
            schema.properties().map(|(name, _)| name).collect::<Vec<_>>(),
            ["id", "first"]
        );
        assert_eq!(
            schema.property("id"),
            Some(&TypeDescriptor::scalar(ScalarKind::Integer))
        );
        assert!(schema.required().is_empty());
    }

    #[test]
    fn without_drops_properties_and_required_entries() {
        let mut builder = ParameterSchemaBuilder::new();
        builder.insert("customerid", TypeDescriptor::scalar(ScalarKind::String), true);
        builder.insert("first", TypeDescriptor::scalar(ScalarKind::Integer), true);
        let schema = builder.build();

        let visible = schema.without(|name| name == "customerid");

        assert!(!visible.contains("customerid"));
        assert_eq!(visible.required(), ["first"]);
        assert_eq!(schema.required(), ["customerid", "first"]);
    }

    #[test]
    fn converts_to_a_json_value() {
        let mut builder = ParameterSchemaBuilder::new();
        builder.insert("customerid", TypeDescriptor::scalar(ScalarKind::String), true);

        let value = builder.build().to_value().unwrap();

        assert_eq!(
            value,
            serde_json::json!({
                "type": "object",
                "properties": { "customerid": { "type": "string" } },
                "required": ["customerid"],
            })
        );
    }

    #[test]
    fn existing_descriptions_are_kept() {
        let descriptor = TypeDescriptor::scalar(ScalarKind::Boolean)
            .with_description(Some("own".into()))
            .with_description(Some("resolved".into()));
        assert_eq!(descriptor.description.as_deref(), Some("own"));
    }
}
