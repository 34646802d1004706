//! Operations
//!
//! This module includes transformation utilities that convert a GraphQL schema,
//! or a document of written operations, into tool definitions and query text.

mod context;
mod operation_document;
mod operation_filter;
mod schema_walker;

use std::fmt;

use apollo_compiler::{Schema, ast::OperationType, validation::Valid};

pub use context::TraversalContext;
pub use operation_document::RawDocument;
pub use operation_filter::{AcceptAll, ExcludePrefixes, MutationMode, OperationFilter};
pub use schema_walker::{DEFAULT_MAX_DEPTH, SchemaWalker};

use crate::{errors::SchemaError, tools::ToolDefinition};

/// The kind of a GraphQL operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Query,
    Mutation,
    /// Never turned into a tool
    Subscription,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Query => "query",
            OperationKind::Mutation => "mutation",
            OperationKind::Subscription => "subscription",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<OperationType> for OperationKind {
    fn from(operation_type: OperationType) -> Self {
        match operation_type {
            OperationType::Query => OperationKind::Query,
            OperationType::Mutation => OperationKind::Mutation,
            OperationType::Subscription => OperationKind::Subscription,
        }
    }
}

impl From<OperationKind> for OperationType {
    fn from(kind: OperationKind) -> Self {
        match kind {
            OperationKind::Query => OperationType::Query,
            OperationKind::Mutation => OperationType::Mutation,
            OperationKind::Subscription => OperationType::Subscription,
        }
    }
}

/// A tool definition together with the GraphQL document it runs
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOperation {
    pub kind: OperationKind,
    pub definition: ToolDefinition,
    pub query: String,
}

/// Parse and validate SDL, requiring a query root
pub fn parse_schema(sdl: &str) -> Result<Valid<Schema>, SchemaError> {
    let schema = Schema::parse_and_validate(sdl, "schema.graphql")
        .map_err(|errors| SchemaError::GraphQLSchema(Box::new(errors)))?;

    if schema.root_operation(OperationType::Query).is_none() {
        return Err(SchemaError::NoQueryRoot);
    }
    Ok(schema)
}
