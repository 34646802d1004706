#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Turn GraphQL schemas and operation documents into tools for LLM function calling.
//!
//! Every tool pairs a JSON Schema describing its parameters with the exact GraphQL
//! document to send, once arguments are validated, to an [`tools::Executor`].

pub mod config;
pub mod custom_scalar_map;
pub mod description;
pub mod errors;
pub mod json_schema;
pub mod logging;
pub mod operations;
pub mod signature;
pub mod tools;

pub use config::Config;
pub use errors::{ConversionError, OperationError, SchemaError, ToolError, TraversalError};
pub use operations::{OperationKind, RawDocument, SchemaWalker, ToolOperation};
pub use tools::{DryRunExecutor, Executor, Tool, ToolDefinition, ToolFactory};
