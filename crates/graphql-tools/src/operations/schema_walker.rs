//! Generate tools by walking a schema's root fields
//!
//! Every root field becomes one operation. The walker renders two text
//! fragments in the same pass: the variable declarations that go in the
//! operation header, and the body with argument bindings and the selection
//! set. Input object arguments are flattened into one variable per input
//! field, so the parameter schema handed to a model is always flat.

use std::collections::HashMap;

use apollo_compiler::{
    Name, Node, Schema,
    ast::{FieldDefinition, Type},
    schema::{ExtendedType, InputObjectType, ObjectType},
};
use tracing::{debug, warn};

use super::{
    OperationFilter, OperationKind, ToolOperation,
    context::{TraversalContext, flat_name},
};
use crate::{
    config::Config,
    description::{node_start, resolve},
    errors::{TraversalError, UnsupportedType},
    json_schema::{ParameterSchemaBuilder, TypeMapper, unwrap_non_null},
    signature::{PrintedSignature, SignatureRenderer},
    tools::ToolDefinition,
};

/// Default maximum nesting of object selections
pub const DEFAULT_MAX_DEPTH: usize = 5;

/// Why a field was left out of its parent's selection
#[derive(Debug)]
enum Skip {
    Cycle,
    Depth,
    Unsupported(UnsupportedType),
}

/// The result of visiting one field
#[derive(Debug)]
enum Visit {
    Skipped(Skip),
    Rendered(Fragments),
}

/// Text rendered for one field
#[derive(Debug, Default)]
struct Fragments {
    /// Variable declarations, each but the operation's first preceded by `, `
    params: String,
    /// The field with its arguments and selection set
    body: String,
    /// Number of variables declared by this field and its children
    arg_count: usize,
}

/// Variables declared so far by one operation
#[derive(Debug, Default)]
struct Declarations {
    schema: ParameterSchemaBuilder,
    /// Declared type signature of each flat name
    signatures: HashMap<String, String>,
}

/// Walks the root fields of a schema and renders one [`ToolOperation`] for each
pub struct SchemaWalker<'a> {
    schema: &'a Schema,
    source: &'a str,
    type_mapper: TypeMapper<'a>,
    renderer: Box<dyn SignatureRenderer + 'a>,
    max_depth: usize,
}

impl<'a> SchemaWalker<'a> {
    /// `source` is the SDL the schema was parsed from, used to recover comments
    pub fn new(schema: &'a Schema, source: &'a str, config: &'a Config) -> Self {
        Self {
            schema,
            source,
            type_mapper: TypeMapper::new(schema, &config.custom_scalars),
            renderer: Box::new(PrintedSignature),
            max_depth: config.max_depth,
        }
    }

    pub fn with_renderer(mut self, renderer: impl SignatureRenderer + 'a) -> Self {
        self.renderer = Box::new(renderer);
        self
    }

    /// Convert every accepted root field. Fields that fail to convert are logged and left out.
    #[tracing::instrument(skip_all, fields(max_depth = self.max_depth))]
    pub fn operations(&self, filter: &dyn OperationFilter) -> Vec<ToolOperation> {
        [OperationKind::Query, OperationKind::Mutation]
            .into_iter()
            .filter_map(|kind| {
                self.schema
                    .root_operation(kind.into())
                    .and_then(|root| self.schema.get_object(root))
                    .map(|root| (kind, root))
            })
            .flat_map(|(kind, root)| root.fields.values().map(move |field| (kind, root, field)))
            .filter(|(kind, _, field)| {
                let accepted = filter.accept(*kind, field.name.as_str());
                if !accepted {
                    debug!(kind = %kind, field = %field.name, "Root field rejected by the operation filter");
                }
                accepted
            })
            .map(|(kind, root, field)| self.operation(kind, root, &field.node))
            .filter_map(|result| {
                result
                    .inspect_err(|e| warn!(operation = e.operation(), "Skipping operation: {e}"))
                    .ok()
            })
            .collect()
    }

    /// Convert a single root field of `root`
    pub fn operation(
        &self,
        kind: OperationKind,
        root: &Node<ObjectType>,
        field: &Node<FieldDefinition>,
    ) -> Result<ToolOperation, TraversalError> {
        let context = TraversalContext::root(kind);
        let operation = context.operation_path(&field.name);
        let mut declarations = Declarations::default();

        let fragments = match self.visit(field, &mut declarations, &context)? {
            Visit::Rendered(fragments) => fragments,
            Visit::Skipped(Skip::Unsupported(source)) => {
                return Err(TraversalError::UnsupportedType { operation, source });
            }
            Visit::Skipped(Skip::Cycle | Skip::Depth) => {
                return Err(TraversalError::EmptySelection { operation });
            }
        };

        let mut query = format!("{kind} {}", field.name);
        if !fragments.params.is_empty() {
            query.push('(');
            query.push_str(&fragments.params);
            query.push(')');
        }
        query.push_str(" { ");
        query.push_str(&fragments.body);
        query.push_str(" }");

        let description = field
            .description
            .as_ref()
            .map(|description| description.to_string())
            .or_else(|| resolve(self.source, node_start(field), node_start(root)));

        debug!(%operation, %query, "Rendered operation");
        Ok(ToolOperation {
            kind,
            definition: ToolDefinition {
                name: field.name.to_string(),
                description,
                parameters: declarations.schema.build(),
            },
            query,
        })
    }

    fn visit(
        &self,
        field: &Node<FieldDefinition>,
        declarations: &mut Declarations,
        context: &TraversalContext,
    ) -> Result<Visit, TraversalError> {
        let operation = context.operation_path(&field.name);
        let return_type = field.ty.inner_named_type();

        let object = match self.schema.types.get(return_type) {
            Some(ExtendedType::Object(object)) => {
                if context.has_visited(return_type) {
                    debug!(%operation, type_name = %return_type, "Cycle detected, skipping field");
                    return Ok(Visit::Skipped(Skip::Cycle));
                }
                if context.depth() + 1 > self.max_depth {
                    debug!(%operation, max_depth = self.max_depth, "Maximum depth reached, skipping field");
                    return Ok(Visit::Skipped(Skip::Depth));
                }
                Some(object)
            }
            Some(ExtendedType::Scalar(_) | ExtendedType::Enum(_)) => None,
            Some(ExtendedType::Interface(_) | ExtendedType::Union(_)) => {
                warn!(%operation, type_name = %return_type, "Abstract return types are not supported, skipping field");
                return Ok(Visit::Skipped(Skip::Unsupported(UnsupportedType {
                    type_name: return_type.to_string(),
                    reason: "interface and union selections are not supported",
                })));
            }
            Some(ExtendedType::InputObject(_)) | None => {
                warn!(%operation, type_name = %return_type, "Unknown return type, skipping field");
                return Ok(Visit::Skipped(Skip::Unsupported(UnsupportedType {
                    type_name: return_type.to_string(),
                    reason: "not an output type of the schema",
                })));
            }
        };

        let mut fragments = Fragments {
            body: field.name.to_string(),
            ..Default::default()
        };
        self.visit_arguments(field, declarations, context, &operation, &mut fragments)?;

        if let Some(object) = object {
            let mut rendered = 0;
            fragments.body.push_str(" {");
            for child in object.fields.values() {
                let child_context = context.nested(
                    &field.name,
                    &object.name,
                    context.num_args() + fragments.arg_count,
                );
                match self.visit(&child.node, declarations, &child_context)? {
                    Visit::Rendered(child) => {
                        rendered += 1;
                        fragments.params.push_str(&child.params);
                        fragments.arg_count += child.arg_count;
                        fragments.body.push(' ');
                        fragments.body.push_str(&child.body);
                    }
                    Visit::Skipped(_) => {}
                }
            }
            if rendered == 0 {
                return Err(TraversalError::EmptySelection { operation });
            }
            fragments.body.push_str(" }");
        }

        Ok(Visit::Rendered(fragments))
    }

    fn visit_arguments(
        &self,
        field: &Node<FieldDefinition>,
        declarations: &mut Declarations,
        context: &TraversalContext,
        operation: &str,
        fragments: &mut Fragments,
    ) -> Result<(), TraversalError> {
        if field.arguments.is_empty() {
            return Ok(());
        }

        let prefix = context.prefix();
        fragments.body.push('(');
        for (index, argument) in field.arguments.iter().enumerate() {
            if index > 0 {
                fragments.body.push_str(", ");
            }
            fragments.body.push_str(&argument.name);
            fragments.body.push_str(": ");

            if let Some(input) = self.input_object(&argument.ty) {
                fragments.body.push_str("{ ");
                for (position, input_field) in input.fields.values().enumerate() {
                    if position > 0 {
                        fragments.body.push_str(", ");
                    }
                    fragments.body.push_str(&input_field.name);
                    fragments.body.push_str(": ");
                    let description = input_field
                        .description
                        .as_ref()
                        .map(|description| description.to_string())
                        .or_else(|| {
                            resolve(self.source, node_start(&input_field.node), node_start(input))
                        });
                    let variable = Variable {
                        flat_name: flat_name(prefix, &input_field.name),
                        name: &input_field.name,
                        ty: &input_field.ty,
                        description,
                    };
                    self.declare(variable, declarations, context, operation, fragments)?;
                }
                fragments.body.push_str(" }");
            } else {
                let description = argument
                    .description
                    .as_ref()
                    .map(|description| description.to_string())
                    .or_else(|| resolve(self.source, node_start(argument), node_start(field)));
                let variable = Variable {
                    flat_name: flat_name(prefix, &argument.name),
                    name: &argument.name,
                    ty: &argument.ty,
                    description,
                };
                self.declare(variable, declarations, context, operation, fragments)?;
            }
        }
        fragments.body.push(')');

        Ok(())
    }

    /// Declare one variable: add it to the parameter schema, the header, and bind it in the body.
    ///
    /// A flat name already declared with the same signature is bound again without a
    /// second declaration. A different signature under the same name fails the operation.
    fn declare(
        &self,
        variable: Variable<'_>,
        declarations: &mut Declarations,
        context: &TraversalContext,
        operation: &str,
        fragments: &mut Fragments,
    ) -> Result<(), TraversalError> {
        let (ty, required) = unwrap_non_null(variable.ty);
        let descriptor = self
            .type_mapper
            .map(&ty)
            .map_err(|source| TraversalError::UnsupportedType {
                operation: operation.to_string(),
                source,
            })?
            .with_description(variable.description);
        let signature = self
            .renderer
            .render(variable.name, variable.ty)
            .map_err(|source| TraversalError::Signature {
                operation: operation.to_string(),
                source,
            })?;

        fragments.body.push('$');
        fragments.body.push_str(&variable.flat_name);

        if let Some(declared) = declarations.signatures.get(&variable.flat_name) {
            if *declared != signature {
                return Err(TraversalError::ConflictingVariable {
                    operation: operation.to_string(),
                    name: variable.flat_name,
                    declared: declared.clone(),
                    conflicting: signature,
                });
            }
            warn!(%operation, variable = %variable.flat_name, "Variable name is shared by several arguments, reusing its declaration");
            return Ok(());
        }

        if context.num_args() + fragments.arg_count > 0 {
            fragments.params.push_str(", ");
        }
        fragments.params.push('$');
        fragments.params.push_str(&variable.flat_name);
        fragments.params.push_str(": ");
        fragments.params.push_str(&signature);
        fragments.arg_count += 1;

        declarations
            .signatures
            .insert(variable.flat_name.clone(), signature);
        declarations
            .schema
            .insert(variable.flat_name, descriptor, required);
        Ok(())
    }

    fn input_object(&self, ty: &Type) -> Option<&'a Node<InputObjectType>> {
        match ty {
            Type::Named(name) | Type::NonNullNamed(name) => match self.schema.types.get(name) {
                Some(ExtendedType::InputObject(input)) => Some(input),
                _ => None,
            },
            Type::List(_) | Type::NonNullList(_) => None,
        }
    }
}

/// A variable about to be declared
struct Variable<'v> {
    flat_name: String,
    name: &'v Name,
    ty: &'v Type,
    description: Option<String>,
}
