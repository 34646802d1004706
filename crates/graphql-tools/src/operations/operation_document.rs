use apollo_compiler::{
    Node, Schema,
    ast::{Definition, OperationDefinition, OperationType},
    parser::Parser,
};
use tracing::{debug, warn};

use super::{OperationKind, ToolOperation};
use crate::{
    custom_scalar_map::CustomScalarMap,
    description::{content_end, node_start, resolve, strip_comments},
    errors::{OperationError, UnsupportedType},
    json_schema::{ParameterSchemaBuilder, TypeMapper, unwrap_non_null},
    tools::ToolDefinition,
};

/// A document of hand-written operations, before parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDocument {
    pub source_text: String,
    pub source_path: Option<String>,
}

impl From<String> for RawDocument {
    fn from(source_text: String) -> Self {
        Self {
            source_text,
            source_path: None,
        }
    }
}

impl From<&str> for RawDocument {
    fn from(source_text: &str) -> Self {
        source_text.to_string().into()
    }
}

impl From<(String, Option<String>)> for RawDocument {
    fn from((source_text, source_path): (String, Option<String>)) -> Self {
        Self {
            source_text,
            source_path,
        }
    }
}

impl RawDocument {
    /// Turn every operation of the document into a [`ToolOperation`], in document order.
    ///
    /// An operation with a variable that cannot be expressed as a parameter is
    /// logged and left out. Anything else that is not a named query or mutation
    /// fails the whole document.
    #[tracing::instrument(skip_all, fields(source_path = ?self.source_path))]
    pub fn into_operations(
        &self,
        schema: &Schema,
        custom_scalars: &CustomScalarMap,
    ) -> Result<Vec<ToolOperation>, OperationError> {
        if strip_comments(&self.source_text).trim().is_empty() {
            return Err(OperationError::NoOperations {
                source_path: self.source_path.clone(),
            });
        }

        let document = Parser::new()
            .parse_ast(
                self.source_text.as_str(),
                self.source_path.as_deref().unwrap_or("operation.graphql"),
            )
            .map_err(|errors| OperationError::GraphQLDocument {
                source_path: self.source_path.clone(),
                errors: Box::new(errors),
            })?;

        let type_mapper = TypeMapper::new(schema, custom_scalars);
        let mut operations = Vec::with_capacity(document.definitions.len());
        let mut previous_end = 0;

        for definition in &document.definitions {
            let operation = match definition {
                Definition::OperationDefinition(operation) => operation,
                Definition::FragmentDefinition(_) => {
                    return Err(self.not_an_operation("fragment"));
                }
                _ => return Err(self.not_an_operation("type system definition")),
            };

            let description =
                resolve(&self.source_text, node_start(operation), Some(previous_end));
            if let Some(location) = operation.location() {
                previous_end =
                    content_end(&self.source_text, location.offset()..location.end_offset());
            }

            match self.operation(operation, &type_mapper, description)? {
                Ok(tool_operation) => {
                    debug!(operation = %tool_operation.definition.name, "Loaded operation");
                    operations.push(tool_operation);
                }
                Err((name, source)) => {
                    warn!(operation = %name, "Skipping operation: {source}");
                }
            }
        }

        Ok(operations)
    }

    fn not_an_operation(&self, kind: &'static str) -> OperationError {
        OperationError::NotAnOperation {
            source_path: self.source_path.clone(),
            kind,
        }
    }

    /// The outer error fails the document; the inner one only skips this operation
    #[allow(clippy::type_complexity)]
    fn operation(
        &self,
        operation: &Node<OperationDefinition>,
        type_mapper: &TypeMapper<'_>,
        description: Option<String>,
    ) -> Result<Result<ToolOperation, (String, UnsupportedType)>, OperationError> {
        let query = self.query_text(operation);

        let Some(name) = &operation.name else {
            return Err(OperationError::MissingName {
                source_path: self.source_path.clone(),
                operation: query.lines().next().unwrap_or_default().to_string(),
            });
        };
        if operation.operation_type == OperationType::Subscription {
            return Err(OperationError::Subscription {
                source_path: self.source_path.clone(),
                operation: name.to_string(),
            });
        }

        let mut builder = ParameterSchemaBuilder::new();
        for variable in &operation.variables {
            let (ty, non_null) = unwrap_non_null(&variable.ty);
            let descriptor = match type_mapper.map(&ty) {
                Ok(descriptor) => descriptor,
                Err(source) => return Ok(Err((name.to_string(), source))),
            };
            let description =
                resolve(&self.source_text, node_start(variable), node_start(operation));
            builder.insert(
                variable.name.as_str(),
                descriptor.with_description(description),
                non_null && variable.default_value.is_none(),
            );
        }

        Ok(Ok(ToolOperation {
            kind: OperationKind::from(operation.operation_type),
            definition: ToolDefinition {
                name: name.to_string(),
                description,
                parameters: builder.build(),
            },
            query,
        }))
    }

    /// The operation as written, without comments or blank lines
    fn query_text(&self, operation: &Node<OperationDefinition>) -> String {
        let written = operation
            .location()
            .and_then(|location| {
                self.source_text
                    .get(location.offset()..location.end_offset())
            })
            .map(str::to_string)
            .unwrap_or_else(|| operation.to_string());

        strip_comments(&written).trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::LazyLock;

    use apollo_compiler::validation::Valid;
    use tracing_test::traced_test;

    use super::*;
    use crate::{custom_scalar_map::ScalarKind, operations::parse_schema};

    static SCHEMA: LazyLock<Valid<Schema>> = LazyLock::new(|| {
        parse_schema(
            r#"
            type Query {
                forecast(city: String!, days: Int): [Forecast]
                current(city: String!): Conditions
                search(filter: Filter): [String]
            }
            type Mutation { subscribe(city: String!): Boolean }
            type Subscription { alerts: String }
            input Filter { text: String }
            type Forecast { high: Float low: Float }
            type Conditions { summary: String }
            "#,
        )
        .unwrap()
    });

    const WEATHER: &str = "# Highest temperatures for a city
query HighTemps($city: String!, $days: Int = 3) {
  forecast(city: $city, days: $days) { high }
}

# Current conditions
query Current(
  # City name
  $city: String!
) {
  current(city: $city) { summary } # trailing
}
";

    fn operations(source: &str) -> Result<Vec<ToolOperation>, OperationError> {
        RawDocument::from(source).into_operations(&SCHEMA, &CustomScalarMap::default())
    }

    #[test]
    fn operations_are_loaded_in_document_order() {
        let operations = operations(WEATHER).unwrap();

        let names: Vec<_> = operations
            .iter()
            .map(|operation| operation.definition.name.as_str())
            .collect();
        assert_eq!(names, ["HighTemps", "Current"]);
        assert!(operations.iter().all(|operation| operation.kind == OperationKind::Query));
    }

    #[test]
    fn variables_become_parameters() {
        let operations = operations(WEATHER).unwrap();
        let high_temps = &operations[0].definition;

        assert_eq!(high_temps.parameters.required(), ["city"]);
        assert!(high_temps.parameters.contains("days"));

        let current = &operations[1].definition;
        assert_eq!(
            current.parameters.property("city").unwrap().description.as_deref(),
            Some("City name")
        );
    }

    #[test]
    fn comments_above_operations_become_descriptions() {
        let operations = operations(WEATHER).unwrap();

        assert_eq!(
            operations[0].definition.description.as_deref(),
            Some("Highest temperatures for a city")
        );
        assert_eq!(
            operations[1].definition.description.as_deref(),
            Some("Current conditions")
        );
    }

    #[test]
    fn query_text_drops_comments() {
        let operations = operations(WEATHER).unwrap();

        assert_eq!(
            operations[1].query,
            "query Current(\n  $city: String!\n) {\n  current(city: $city) { summary }\n}"
        );
    }

    #[test]
    fn query_text_survives_reparsing() {
        for operation in operations(WEATHER).unwrap() {
            let reparsed = operations(&operation.query).unwrap();
            assert_eq!(reparsed.len(), 1);
            assert_eq!(reparsed[0].query, operation.query);
        }
    }

    #[test]
    fn hash_inside_strings_is_not_a_comment() {
        let operations =
            operations(r##"query Tagged { current(city: "#1 city") { summary } }"##).unwrap();
        assert_eq!(
            operations[0].query,
            r##"query Tagged { current(city: "#1 city") { summary } }"##
        );
    }

    #[test]
    fn mutations_keep_their_kind() {
        let operations =
            operations("mutation Follow($city: String!) { subscribe(city: $city) }").unwrap();
        assert_eq!(operations[0].kind, OperationKind::Mutation);
    }

    #[test]
    fn empty_documents_have_no_operations() {
        assert!(matches!(
            operations("  \n# nothing here\n"),
            Err(OperationError::NoOperations { .. })
        ));
    }

    #[test]
    fn syntax_errors_are_reported() {
        assert!(matches!(
            operations("query Broken {"),
            Err(OperationError::GraphQLDocument { .. })
        ));
    }

    #[test]
    fn subscriptions_are_rejected() {
        let error = operations("subscription Alerts { alerts }").unwrap_err();
        assert!(matches!(
            &error,
            OperationError::Subscription { operation, .. } if operation == "Alerts"
        ));
    }

    #[test]
    fn fragments_are_rejected() {
        let error = operations(
            "query HighTemps { forecast(city: \"Oslo\") { ...Temps } }\nfragment Temps on Forecast { high low }",
        )
        .unwrap_err();
        assert_eq!(
            error.to_string(),
            "Expected only operations but found a fragment"
        );
    }

    #[test]
    fn anonymous_operations_are_rejected() {
        let document = RawDocument::from((
            "{ current(city: \"Oslo\") { summary } }".to_string(),
            Some("ops.graphql".to_string()),
        ));
        let error = document
            .into_operations(&SCHEMA, &CustomScalarMap::default())
            .unwrap_err();
        assert_eq!(
            error.to_string(),
            "ops.graphql: Operation is missing its required name: { current(city: \"Oslo\") { summary } }"
        );
    }

    #[test]
    #[traced_test]
    fn unsupported_variables_skip_their_operation() {
        let operations = operations(
            "query Search($filter: Filter) { search(filter: $filter) }\nquery Now { current(city: \"Oslo\") { summary } }",
        )
        .unwrap();

        assert_eq!(operations.len(), 1);
        assert_eq!(operations[0].definition.name, "Now");
        assert!(logs_contain("Skipping operation"));
    }

    #[test]
    fn custom_scalars_apply_to_variables() {
        let schema =
            parse_schema("scalar Date type Query { history(since: Date!): [Float] }").unwrap();
        let scalars = CustomScalarMap::new().with("Date", ScalarKind::Integer);
        let operations = RawDocument::from("query History($since: Date!) { history(since: $since) }")
            .into_operations(&schema, &scalars)
            .unwrap();

        assert_eq!(
            serde_json::to_string(&operations[0].definition.parameters).unwrap(),
            r#"{"type":"object","properties":{"since":{"type":"integer"}},"required":["since"]}"#
        );
    }
}
