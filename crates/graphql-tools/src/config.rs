//! Configuration for tool generation
//!
//! Read from a YAML file, with any value overridable from `GRAPHQL_TOOLS_`
//! prefixed environment variables. Nested options use `__` as a separator, so
//! `GRAPHQL_TOOLS_LOGGING__LEVEL=debug` sets `logging.level`.

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use schemars::JsonSchema;
use serde::Deserialize;

use crate::{
    custom_scalar_map::CustomScalarMap,
    logging::Logging,
    operations::{DEFAULT_MAX_DEPTH, ExcludePrefixes, MutationMode, OperationFilter, OperationKind},
};

/// Prefix of the environment variables read into the configuration
const ENV_PREFIX: &str = "GRAPHQL_TOOLS_";

/// Separator to use when drilling down into nested options in the env figment
const ENV_NESTED_SEPARATOR: &str = "__";

/// Configuration for turning a GraphQL schema into tools
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Config {
    /// How many object selections deep a generated query may nest
    pub max_depth: usize,

    /// JSON Schema kinds for custom scalars, keyed by scalar name. Unlisted custom scalars are strings.
    pub custom_scalars: CustomScalarMap,

    /// Root fields starting with any of these prefixes are not turned into tools. Matching ignores case.
    pub exclude_prefixes: Vec<String>,

    /// Whether mutations are turned into tools
    pub mutation_mode: MutationMode,

    /// Parameters hidden from the model and supplied from the execution context instead
    pub context_keys: Vec<String>,

    pub logging: Logging,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            custom_scalars: CustomScalarMap::default(),
            exclude_prefixes: Vec::new(),
            mutation_mode: MutationMode::default(),
            context_keys: Vec::new(),
            logging: Logging::default(),
        }
    }
}

impl Config {
    /// The filter deciding which root fields become tools
    pub fn operation_filter(&self) -> impl OperationFilter + use<> {
        let excluded = ExcludePrefixes::new(&self.exclude_prefixes);
        let mutation_mode = self.mutation_mode;
        move |kind: OperationKind, field_name: &str| {
            mutation_mode.accept(kind, field_name) && excluded.accept(kind, field_name)
        }
    }

    /// JSON Schema of the configuration file
    pub fn schema() -> schemars::Schema {
        schemars::schema_for!(Config)
    }
}

/// Read configuration from environment variables only
#[allow(clippy::result_large_err)]
pub fn read_config_from_env() -> Result<Config, figment::Error> {
    Figment::new()
        .join(Env::prefixed(ENV_PREFIX).split(ENV_NESTED_SEPARATOR))
        .extract()
}

/// Read in a config from a YAML file, filling in any missing values from the environment.
/// Environment variables take precedence over the file.
#[allow(clippy::result_large_err)]
pub fn read_config(yaml_path: impl AsRef<Path>) -> Result<Config, figment::Error> {
    Figment::new()
        .join(Env::prefixed(ENV_PREFIX).split(ENV_NESTED_SEPARATOR))
        .join(Yaml::file(yaml_path))
        .extract()
}
