//! The seam between tools and whatever actually runs GraphQL

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde_json::{Value, json};
use tracing::error;

use super::{JsonObject, ToolDefinition};
use crate::errors::ExecutorError;

#[allow(clippy::expect_used)]
static TOOL_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]{1,64}$").expect("regex pattern compiles"));

/// Runs the GraphQL document of a tool.
///
/// The validation hooks have defaults that apply the rules most function
/// calling harnesses enforce. Implementations with stricter requirements
/// override them.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Check that a definition is acceptable before a tool is built from it
    fn validate_definition(&self, definition: &ToolDefinition) -> Result<(), String> {
        validate_definition(definition)
    }

    /// Check arguments against the definition's parameter schema
    fn validate_arguments(
        &self,
        definition: &ToolDefinition,
        arguments: &JsonObject,
    ) -> Result<(), String> {
        validate_arguments(definition, arguments)
    }

    async fn execute(&self, query: &str, variables: &JsonObject) -> Result<String, ExecutorError>;
}

/// Function names must be 1 to 64 characters of `[a-zA-Z0-9_-]`, and every
/// required parameter must be declared
pub fn validate_definition(definition: &ToolDefinition) -> Result<(), String> {
    if !TOOL_NAME.is_match(&definition.name) {
        return Err(format!(
            "function name `{}` must match {}",
            definition.name,
            TOOL_NAME.as_str()
        ));
    }

    let undeclared: Vec<&str> = definition
        .parameters
        .required()
        .iter()
        .map(String::as_str)
        .filter(|name| !definition.parameters.contains(name))
        .collect();
    if !undeclared.is_empty() {
        return Err(format!(
            "required parameters are not declared: {}",
            undeclared.join(", ")
        ));
    }

    Ok(())
}

/// Validate arguments with JSON Schema, reporting every violation
pub fn validate_arguments(definition: &ToolDefinition, arguments: &JsonObject) -> Result<(), String> {
    let schema = definition.parameters.to_value().map_err(|e| {
        error!(tool = %definition.name, error = %e, "Could not serialize parameter schema");
        format!("parameter schema could not be serialized: {e}")
    })?;
    let validator = jsonschema::validator_for(&schema)
        .map_err(|e| format!("invalid parameter schema: {e}"))?;

    let instance = Value::Object(arguments.clone());
    let errors: Vec<String> = validator
        .iter_errors(&instance)
        .map(|error| error.to_string())
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors.join("; "))
    }
}

/// Performs no I/O. Returns the request it would have sent as JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunExecutor;

#[async_trait]
impl Executor for DryRunExecutor {
    async fn execute(&self, query: &str, variables: &JsonObject) -> Result<String, ExecutorError> {
        serde_json::to_string(&json!({
            "query": query,
            "variables": variables,
        }))
        .map_err(|e| ExecutorError(e.to_string()))
    }
}
