//! Normalized metadata handed over by the harvesting adapters.

mod identifiers;
mod index;

pub use identifiers::{file_extension, url_host, url_scheme, IdentifierScheme};
pub use index::MetadataIndex;

use serde::{Deserialize, Deserializer, Serialize};

/// One atomic fact about the evaluated object, e.g. `creators.creator/name = "Alice Smith"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataStatement {
    pub schema: String,
    pub term: String,
    #[serde(default, deserialize_with = "deserialize_qualifier")]
    pub qualifier: Option<String>,
    pub value: String,
}

impl MetadataStatement {
    pub fn new(
        schema: impl Into<String>,
        term: impl Into<String>,
        qualifier: Option<&str>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            schema: schema.into(),
            term: term.into(),
            qualifier: normalize_qualifier(qualifier.map(str::to_string)),
            value: value.into(),
        }
    }
}

fn normalize_qualifier(qualifier: Option<String>) -> Option<String> {
    qualifier.filter(|value| !value.trim().is_empty())
}

fn deserialize_qualifier<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(normalize_qualifier(raw))
}

/// Where the metadata came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvestInfo {
    pub item_id: String,
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl HarvestInfo {
    pub fn new(item_id: impl Into<String>, endpoint: Option<&str>) -> Self {
        Self {
            item_id: item_id.into(),
            endpoint: endpoint.map(str::to_string),
        }
    }

    /// Access protocol used by the harvester, taken from the endpoint URL scheme.
    pub fn protocol(&self) -> Option<String> {
        self.endpoint
            .as_deref()
            .and_then(url_scheme)
    }
}

/// Ordered statements produced once per evaluation. Immutable after construction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataCollection {
    harvest: HarvestInfo,
    #[serde(default)]
    statements: Vec<MetadataStatement>,
}

impl MetadataCollection {
    pub fn new(harvest: HarvestInfo, statements: Vec<MetadataStatement>) -> Self {
        Self {
            harvest,
            statements,
        }
    }

    pub fn harvest(&self) -> &HarvestInfo {
        &self.harvest
    }

    pub fn statements(&self) -> &[MetadataStatement] {
        &self.statements
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}
