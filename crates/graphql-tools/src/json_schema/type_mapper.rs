use apollo_compiler::{Schema, ast::Type, schema::ExtendedType};

use super::TypeDescriptor;
use crate::{custom_scalar_map::CustomScalarMap, errors::UnsupportedType};

/// Strip one non-null wrapper, reporting whether it was present
pub fn unwrap_non_null(ty: &Type) -> (Type, bool) {
    match ty {
        Type::NonNullNamed(name) => (Type::Named(name.clone()), true),
        Type::NonNullList(inner) => (Type::List(inner.clone()), true),
        other => (other.clone(), false),
    }
}

/// Maps GraphQL input types to parameter descriptors
#[derive(Clone, Copy)]
pub struct TypeMapper<'a> {
    schema: &'a Schema,
    custom_scalar_map: &'a CustomScalarMap,
}

impl<'a> TypeMapper<'a> {
    pub fn new(schema: &'a Schema, custom_scalar_map: &'a CustomScalarMap) -> Self {
        Self {
            schema,
            custom_scalar_map,
        }
    }

    pub fn map(&self, ty: &Type) -> Result<TypeDescriptor, UnsupportedType> {
        match ty {
            Type::List(inner) | Type::NonNullList(inner) => {
                let (item, _) = unwrap_non_null(inner);
                Ok(TypeDescriptor::array(self.map(&item)?))
            }
            Type::Named(name) | Type::NonNullNamed(name) => {
                let unsupported = |reason| UnsupportedType {
                    type_name: name.to_string(),
                    reason,
                };
                match self.schema.types.get(name) {
                    Some(ExtendedType::Scalar(_)) => Ok(TypeDescriptor::scalar(
                        self.custom_scalar_map.kind_for(name.as_str()),
                    )),
                    Some(ExtendedType::Enum(enum_type)) => Ok(TypeDescriptor::enumeration(
                        enum_type.values.values().map(|value| value.value.to_string()),
                    )),
                    Some(ExtendedType::InputObject(_)) => Err(unsupported(
                        "input objects are only supported as flattened arguments",
                    )),
                    Some(
                        ExtendedType::Object(_)
                        | ExtendedType::Interface(_)
                        | ExtendedType::Union(_),
                    ) => Err(unsupported("output types cannot be used as parameters")),
                    None => Err(unsupported("type is not defined in the schema")),
                }
            }
        }
    }
}
