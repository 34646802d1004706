//! Tools bind a definition and its GraphQL document to an [`Executor`]

mod executor;

use std::{collections::BTreeSet, fmt, sync::Arc};

use apollo_compiler::Schema;
use serde::{Serialize, Serializer, ser::SerializeStruct};
use serde_json::Value;
use tracing::{debug, info, warn};

pub use executor::{DryRunExecutor, Executor, validate_arguments, validate_definition};

use crate::{
    config::Config,
    errors::{ConversionError, ToolError},
    json_schema::ParameterSchema,
    operations::{OperationFilter, RawDocument, SchemaWalker, ToolOperation, parse_schema},
};

/// Arguments and context values, keyed by name
pub type JsonObject = serde_json::Map<String, Value>;

/// What a model sees of a tool: its name, what it does, and what it takes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDefinition {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub parameters: ParameterSchema,
}

/// A callable tool
pub struct Tool {
    definition: ToolDefinition,
    context_keys: BTreeSet<String>,
    query: String,
    executor: Arc<dyn Executor>,
}

impl Tool {
    /// The full definition, context keys included
    pub fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Context keys, lowercased
    pub fn context_keys(&self) -> impl Iterator<Item = &str> {
        self.context_keys.iter().map(String::as_str)
    }

    fn is_context_key(&self, name: &str) -> bool {
        self.context_keys.contains(&name.to_lowercase())
    }

    /// The definition to hand to a model, with context keys removed
    pub fn model_function(&self) -> ToolDefinition {
        ToolDefinition {
            parameters: self
                .definition
                .parameters
                .without(|name| self.is_context_key(name)),
            ..self.definition.clone()
        }
    }

    /// Overlay the context keys found in `context` onto `arguments`.
    ///
    /// Context values are stored under the parameter's own name, whatever
    /// casing the context map uses.
    fn with_context(&self, mut arguments: JsonObject, context: &JsonObject) -> JsonObject {
        for (key, value) in context {
            if !self.is_context_key(key) {
                continue;
            }
            let lowercase = key.to_lowercase();
            let name = self
                .definition
                .parameters
                .properties()
                .map(|(name, _)| name)
                .find(|name| name.to_lowercase() == lowercase)
                .unwrap_or(key.as_str());
            arguments.insert(name.to_string(), value.clone());
        }
        arguments
    }

    /// Run the tool without validating arguments
    #[tracing::instrument(skip_all, fields(tool = %self.definition.name))]
    pub async fn execute(
        &self,
        arguments: JsonObject,
        context: &JsonObject,
    ) -> Result<String, ToolError> {
        let variables = self.with_context(arguments, context);
        debug!(variables = variables.len(), "Executing tool");
        Ok(self.executor.execute(&self.query, &variables).await?)
    }

    /// Validate arguments, then run the tool.
    ///
    /// Invalid arguments are not an error: the returned text asks the model to
    /// correct them and try again.
    #[tracing::instrument(skip_all, fields(tool = %self.definition.name))]
    pub async fn validate_and_execute(
        &self,
        arguments: JsonObject,
        context: &JsonObject,
    ) -> Result<String, ToolError> {
        let variables = self.with_context(arguments, context);
        if let Err(error) = self
            .executor
            .validate_arguments(&self.definition, &variables)
        {
            warn!(%error, "Invalid tool arguments");
            return Ok(format!(
                "Invalid arguments for tool '{}': {error}. Please correct the arguments and try again.",
                self.definition.name
            ));
        }

        Ok(self.executor.execute(&self.query, &variables).await?)
    }

    /// Like [`Tool::validate_and_execute`], for arguments still encoded as JSON text
    pub async fn validate_and_execute_from_str(
        &self,
        arguments: &str,
        context: &JsonObject,
    ) -> Result<String, ToolError> {
        let arguments = match serde_json::from_str::<Value>(arguments) {
            Ok(Value::Object(arguments)) => arguments,
            Ok(other) => {
                return Ok(self.malformed(format!("expected a JSON object, found {other}")));
            }
            Err(error) => return Ok(self.malformed(error)),
        };

        self.validate_and_execute(arguments, context).await
    }

    fn malformed(&self, error: impl fmt::Display) -> String {
        warn!(tool = %self.definition.name, %error, "Malformed tool arguments");
        format!(
            "Malformed JSON arguments for tool '{}': {error}. Please provide valid JSON and try again.",
            self.definition.name
        )
    }
}

impl fmt::Debug for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tool")
            .field("definition", &self.definition)
            .field("context_keys", &self.context_keys)
            .field("query", &self.query)
            .finish_non_exhaustive()
    }
}

impl Serialize for Tool {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tool = serializer.serialize_struct("Tool", 3)?;
        tool.serialize_field("function", &self.definition)?;
        tool.serialize_field("contextKeys", &self.context_keys)?;
        tool.serialize_field("apiQuery", &self.query)?;
        tool.end()
    }
}

/// Builds tools that share one executor
#[derive(Clone)]
pub struct ToolFactory {
    executor: Arc<dyn Executor>,
}

impl ToolFactory {
    pub fn new(executor: impl Executor + 'static) -> Self {
        Self {
            executor: Arc::new(executor),
        }
    }

    /// Build a tool, once the executor accepts its definition
    pub fn create(
        &self,
        definition: ToolDefinition,
        query: impl Into<String>,
        context_keys: impl IntoIterator<Item = impl AsRef<str>>,
    ) -> Result<Tool, ToolError> {
        self.executor
            .validate_definition(&definition)
            .map_err(|reason| ToolError::Construction {
                name: definition.name.clone(),
                reason,
            })?;

        Ok(Tool {
            definition,
            context_keys: context_keys
                .into_iter()
                .map(|key| key.as_ref().to_lowercase())
                .collect(),
            query: query.into(),
            executor: self.executor.clone(),
        })
    }

    /// One tool per accepted root field of the schema
    #[tracing::instrument(skip_all)]
    pub fn tools_from_schema(&self, sdl: &str, config: &Config) -> Result<Vec<Tool>, ConversionError> {
        let schema = parse_schema(sdl)?;
        let operations = SchemaWalker::new(&schema, sdl, config).operations(&config.operation_filter());
        let tools = self.create_all(operations, config)?;
        info!(tools = tools.len(), "Created tools from schema");
        Ok(tools)
    }

    /// One tool per operation of the document.
    ///
    /// The operation filter sees each operation's name in place of a root field name.
    #[tracing::instrument(skip_all, fields(source_path = ?document.source_path))]
    pub fn tools_from_operations(
        &self,
        document: &RawDocument,
        schema: &Schema,
        config: &Config,
    ) -> Result<Vec<Tool>, ConversionError> {
        let filter = config.operation_filter();
        let operations = document
            .into_operations(schema, &config.custom_scalars)?
            .into_iter()
            .filter(|operation| filter.accept(operation.kind, &operation.definition.name))
            .collect();
        let tools = self.create_all(operations, config)?;
        info!(tools = tools.len(), "Created tools from operations");
        Ok(tools)
    }

    fn create_all(
        &self,
        operations: Vec<ToolOperation>,
        config: &Config,
    ) -> Result<Vec<Tool>, ToolError> {
        operations
            .into_iter()
            .map(|operation| self.create(operation.definition, operation.query, &config.context_keys))
            .collect()
    }
}

impl fmt::Debug for ToolFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolFactory").finish_non_exhaustive()
    }
}
