use schemars::JsonSchema;
use serde::Deserialize;

use super::OperationKind;

/// Decides which root fields of a schema become tools
pub trait OperationFilter: Send + Sync {
    fn accept(&self, kind: OperationKind, field_name: &str) -> bool;
}

impl<F> OperationFilter for F
where
    F: Fn(OperationKind, &str) -> bool + Send + Sync,
{
    fn accept(&self, kind: OperationKind, field_name: &str) -> bool {
        self(kind, field_name)
    }
}

/// Accepts every root field
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl OperationFilter for AcceptAll {
    fn accept(&self, _kind: OperationKind, _field_name: &str) -> bool {
        true
    }
}

/// Rejects root fields whose name starts with one of the prefixes, ignoring case
#[derive(Debug, Clone, Default)]
pub struct ExcludePrefixes {
    prefixes: Vec<String>,
}

impl ExcludePrefixes {
    pub fn new(prefixes: impl IntoIterator<Item = impl AsRef<str>>) -> Self {
        Self {
            prefixes: prefixes
                .into_iter()
                .map(|prefix| prefix.as_ref().to_lowercase())
                .filter(|prefix| !prefix.is_empty())
                .collect(),
        }
    }
}

impl OperationFilter for ExcludePrefixes {
    fn accept(&self, _kind: OperationKind, field_name: &str) -> bool {
        let field_name = field_name.to_lowercase();
        !self
            .prefixes
            .iter()
            .any(|prefix| field_name.starts_with(prefix.as_str()))
    }
}

/// Whether mutations are exposed as tools
#[derive(Debug, Deserialize, Default, Copy, Clone, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MutationMode {
    /// Don't allow any mutations
    None,

    /// Allow all mutations
    #[default]
    All,
}

impl OperationFilter for MutationMode {
    fn accept(&self, kind: OperationKind, _field_name: &str) -> bool {
        match kind {
            OperationKind::Query => true,
            OperationKind::Mutation => *self == MutationMode::All,
            OperationKind::Subscription => false,
        }
    }
}
