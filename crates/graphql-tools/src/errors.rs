use apollo_compiler::{Schema, ast::Document, validation::WithErrors};
use std::fmt;

/// A wrapper around WithErrors that provides safe UTF-8 formatting
/// This avoids the ariadne UTF-8 multibyte character bug
struct SafeWithErrors<'a, T>(&'a WithErrors<T>);

impl<T> fmt::Display for SafeWithErrors<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let errors = &self.0.errors;

        if errors.is_empty() {
            return write!(f, "Unknown error");
        }

        writeln!(f, "GraphQL validation errors:")?;
        for (i, diagnostic) in errors.iter().enumerate() {
            write!(f, "  {}. {}", i + 1, diagnostic.error)?;
            writeln!(f)?;
        }

        Ok(())
    }
}

fn source_prefix(source_path: &Option<String>) -> String {
    source_path
        .as_ref()
        .map(|s| format!("{}: ", s))
        .unwrap_or_default()
}

/// A GraphQL type that cannot be expressed as a tool parameter
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unsupported type `{type_name}`: {reason}")]
pub struct UnsupportedType {
    pub type_name: String,
    pub reason: &'static str,
}

/// The printed form of a type could not be recovered
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Could not render the type signature of `{0}`")]
pub struct SignatureError(pub String);

/// An error converting one schema operation into a tool
#[derive(Debug, thiserror::Error)]
pub enum TraversalError {
    #[error("{operation}: {source}")]
    UnsupportedType {
        operation: String,
        source: UnsupportedType,
    },

    #[error("{operation}: selection has no fields left after cycle and depth pruning")]
    EmptySelection { operation: String },

    #[error("{operation}: {source}")]
    Signature {
        operation: String,
        source: SignatureError,
    },

    #[error("{operation}: variable `${name}` is declared as `{declared}` and again as `{conflicting}`")]
    ConflictingVariable {
        operation: String,
        name: String,
        declared: String,
        conflicting: String,
    },
}

impl TraversalError {
    /// The dotted path of the operation being converted
    pub fn operation(&self) -> &str {
        match self {
            TraversalError::UnsupportedType { operation, .. }
            | TraversalError::EmptySelection { operation }
            | TraversalError::Signature { operation, .. }
            | TraversalError::ConflictingVariable { operation, .. } => operation,
        }
    }
}

/// An error loading a GraphQL schema
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("Could not parse GraphQL schema: {}", SafeWithErrors(.0.as_ref()))]
    GraphQLSchema(Box<WithErrors<Schema>>),

    #[error("The schema does not define a query root type")]
    NoQueryRoot,
}

/// An error in operation document parsing
#[derive(Debug, thiserror::Error)]
pub enum OperationError {
    #[error("{}Could not parse GraphQL document: {}", source_prefix(.source_path), SafeWithErrors(.errors.as_ref()))]
    GraphQLDocument {
        source_path: Option<String>,
        errors: Box<WithErrors<Document>>,
    },

    #[error("{}No operations defined", source_prefix(.source_path))]
    NoOperations { source_path: Option<String> },

    #[error("{}Expected only operations but found a {kind}", source_prefix(.source_path))]
    NotAnOperation {
        source_path: Option<String>,
        kind: &'static str,
    },

    #[error("{}Subscriptions are not supported: {operation}", source_prefix(.source_path))]
    Subscription {
        source_path: Option<String>,
        operation: String,
    },

    #[error("{}Operation is missing its required name: {operation}", source_prefix(.source_path))]
    MissingName {
        source_path: Option<String>,
        operation: String,
    },
}

/// An error reported by an executor
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Execution failed: {0}")]
pub struct ExecutorError(pub String);

/// An error constructing or running a tool
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Tool `{name}` was rejected by the executor: {reason}")]
    Construction { name: String, reason: String },

    #[error(transparent)]
    Execution(#[from] ExecutorError),
}

/// An error turning a schema or document into a set of tools
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Operation(#[from] OperationError),

    #[error(transparent)]
    Tool(#[from] ToolError),
}

/// An error installing the logging subscriber
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Invalid log filter directive: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),

    #[error("Could not install the global subscriber: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
}
